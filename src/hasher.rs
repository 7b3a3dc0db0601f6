//! Keyed digest derivation for (logical key, arguments) pairs.
//!
//! The digest is the canonical identity of a cache entry inside a pool. It
//! is computed with HMAC-SHA256 under a pre-shared 32-byte secret, so two
//! deployments with different secrets never agree on entry identities.

use crate::args::Args;
use crate::error::{Error, Result};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;

type HmacSha256 = Hmac<Sha256>;

/// Length in bytes of a decoded hash secret.
pub const SECRET_LEN: usize = 32;

/// Default hash secret, hex encoded.
///
/// Use your own secret in production via `ManagerConfig::with_hash_secret`.
pub const DEFAULT_HASH_SECRET: &str =
    "000102030405060708090A0B0C0D0E0FF0E0D0C0B0A090807060504030201000";

/// Fixed-length lowercase hex digest identifying one (key, args) pair.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest(String);

impl Digest {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Digest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Deterministic keyed hasher.
///
/// Stateless once built: the MAC is keyed at construction and cloned for
/// every digest, so one instance can be shared by any number of pools.
///
/// # Example
///
/// ```
/// use memo_kit::{Args, KeyedHasher, hasher::DEFAULT_HASH_SECRET};
///
/// let hasher = KeyedHasher::from_hex(DEFAULT_HASH_SECRET).unwrap();
/// let args = Args::new().with(1, "x");
/// let a = hasher.digest("report", &args).unwrap();
/// let b = hasher.digest("report", &args).unwrap();
/// assert_eq!(a, b);
/// assert_eq!(a.as_str().len(), 64);
/// ```
#[derive(Clone)]
pub struct KeyedHasher {
    mac: HmacSha256,
}

impl KeyedHasher {
    /// Build a hasher from a hex-encoded 32-byte secret.
    ///
    /// # Errors
    /// Returns `Error::InvalidSecretFormat` if the secret is not hex or
    /// does not decode to exactly 32 bytes.
    pub fn from_hex(secret: &str) -> Result<Self> {
        let bytes = hex::decode(secret.trim())?;
        if bytes.len() != SECRET_LEN {
            return Err(Error::InvalidSecretFormat(format!(
                "expected {} bytes, got {}",
                SECRET_LEN,
                bytes.len()
            )));
        }
        Self::from_bytes(&bytes)
    }

    /// Build a hasher from raw secret bytes.
    ///
    /// # Errors
    /// Returns `Error::HashDerivationError` if the MAC rejects the key.
    pub fn from_bytes(secret: &[u8]) -> Result<Self> {
        let mac = <HmacSha256 as Mac>::new_from_slice(secret)
            .map_err(|e| Error::HashDerivationError(e.to_string()))?;
        Ok(KeyedHasher { mac })
    }

    /// Derive the digest of `key` and `args`.
    ///
    /// The key is length-prefixed before the canonical argument bytes so
    /// that a key/argument boundary can never shift between inputs.
    ///
    /// # Errors
    /// Returns `Error::HashDerivationError` if the arguments cannot be
    /// converted to their canonical form.
    pub fn digest(&self, key: &str, args: &Args) -> Result<Digest> {
        let canonical = args.canonical_bytes()?;

        let mut mac = self.mac.clone();
        mac.update(&(key.len() as u64).to_be_bytes());
        mac.update(key.as_bytes());
        mac.update(&canonical);

        Ok(Digest(hex::encode(mac.finalize().into_bytes())))
    }
}

impl fmt::Debug for KeyedHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedHasher").finish_non_exhaustive()
    }
}
