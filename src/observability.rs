//! Observability hooks for pool operations.
//!
//! Implement [`CacheMetrics`] to feed pool activity into your monitoring
//! system, then hand it to the manager:
//!
//! ```ignore
//! use memo_kit::observability::CacheMetrics;
//! use std::time::Duration;
//!
//! struct PrometheusMetrics;
//!
//! impl CacheMetrics for PrometheusMetrics {
//!     fn record_hit(&self, pool: &str, _digest: &str, _duration: Duration) {
//!         // counter!("memo_hits", "pool" => pool).inc();
//!     }
//!     // ... implement other methods
//! }
//!
//! let manager =
//!     PoolManager::<String>::with_metrics(ManagerConfig::default(), Arc::new(PrometheusMetrics))?;
//! ```
//!
//! The trait's default methods log through the `log` crate; the manager
//! uses the silent [`NoOpMetrics`] unless told otherwise.
//!
//! Hooks report pool-level events only. No per-entry access statistics are
//! kept.

use std::time::Duration;

/// Trait for pool metrics collection.
pub trait CacheMetrics: Send + Sync {
    /// Record a live entry served without invoking the producer.
    fn record_hit(&self, pool: &str, digest: &str, duration: Duration) {
        debug!("Pool {} HIT: {} took {:?}", pool, digest, duration);
    }

    /// Record a miss (absent, expired or forced) that led to a produce.
    fn record_miss(&self, pool: &str, digest: &str, duration: Duration) {
        debug!("Pool {} MISS: {} took {:?}", pool, digest, duration);
    }

    /// Record a freshly produced value being stored.
    fn record_set(&self, pool: &str, digest: &str, duration: Duration) {
        debug!("Pool {} SET: {} took {:?}", pool, digest, duration);
    }

    /// Record an explicit forget.
    fn record_delete(&self, pool: &str, digest: &str) {
        debug!("Pool {} DELETE: {}", pool, digest);
    }

    /// Record a sweep pass and how many entries it evicted.
    fn record_sweep(&self, pool: &str, evicted: usize) {
        debug!("Pool {} SWEEP: {} evicted", pool, evicted);
    }

    /// Record a failed operation.
    fn record_error(&self, pool: &str, key: &str, error: &str) {
        warn!("Pool {} ERROR for {}: {}", pool, key, error);
    }
}

/// Default metrics implementation (no-op).
#[derive(Clone, Default)]
pub struct NoOpMetrics;

impl CacheMetrics for NoOpMetrics {
    fn record_hit(&self, _pool: &str, _digest: &str, _duration: Duration) {}
    fn record_miss(&self, _pool: &str, _digest: &str, _duration: Duration) {}
    fn record_set(&self, _pool: &str, _digest: &str, _duration: Duration) {}
    fn record_delete(&self, _pool: &str, _digest: &str) {}
    fn record_sweep(&self, _pool: &str, _evicted: usize) {}
    fn record_error(&self, _pool: &str, _key: &str, _error: &str) {}
}

/// Metrics sink that logs every event at debug level.
#[derive(Clone, Default)]
pub struct LogMetrics;

impl CacheMetrics for LogMetrics {}
