//! Error types for the memoization cache.

use std::fmt;

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for pool and manager operations.
///
/// Every failure is scoped to the call that triggered it. Nothing here is
/// fatal to the process and nothing is retried by the cache itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The hash secret could not be decoded.
    ///
    /// Raised when:
    /// - The secret is not valid hexadecimal
    /// - The decoded secret is not exactly 32 bytes
    ///
    /// **Recovery:** Fix the configured secret and rebuild the manager.
    InvalidSecretFormat(String),

    /// Digest derivation failed.
    ///
    /// The keyed hash primitive rejected its key, or an argument value could
    /// not be converted to its canonical representation.
    HashDerivationError(String),

    /// The caller-supplied data producer failed.
    ///
    /// The cache is left unmodified when a producer fails; no negative
    /// result is stored.
    ProducerError(String),

    /// Cache miss or expired entry.
    ///
    /// Only used by internal read helpers. `remember` treats it as
    /// "proceed to compute" and never returns it.
    NotFound,

    /// Invalid configuration (zero sweep interval, TTL past the clock range).
    ConfigError(String),

    /// Lifecycle violation, e.g. starting a sweeper twice or after shutdown.
    InvalidState(String),

    /// Generic error with custom message.
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidSecretFormat(msg) => write!(f, "Invalid secret format: {}", msg),
            Error::HashDerivationError(msg) => write!(f, "Hash derivation error: {}", msg),
            Error::ProducerError(msg) => write!(f, "Producer error: {}", msg),
            Error::NotFound => write!(f, "Not found"),
            Error::ConfigError(msg) => write!(f, "Config error: {}", msg),
            Error::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            Error::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ============================================================================
// Conversions from other error types
// ============================================================================

impl From<hex::FromHexError> for Error {
    fn from(e: hex::FromHexError) -> Self {
        Error::InvalidSecretFormat(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::HashDerivationError(e.to_string())
    }
}

impl From<String> for Error {
    fn from(e: String) -> Self {
        Error::Other(e)
    }
}

impl From<&str> for Error {
    fn from(e: &str) -> Self {
        Error::Other(e.to_string())
    }
}
