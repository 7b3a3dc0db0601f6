//! A single named cache pool (thread-safe, async).
//!
//! A pool maps digests to values with an absolute expiry instant and owns
//! the only lock that guards that mapping. Reads take the shared lock;
//! a miss upgrades to the exclusive lock, double-checks, and invokes the
//! producer while still holding it.

use crate::args::Args;
use crate::error::{Error, Result};
use crate::hasher::{Digest, KeyedHasher};
use crate::observability::{CacheMetrics, NoOpMetrics};
use crate::producer::DataProducer;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// Stored value with its absolute expiry.
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Per-call options for [`Pool::remember_with`].
///
/// # Example
///
/// ```
/// use memo_kit::RememberOptions;
/// use std::time::Duration;
///
/// let options = RememberOptions::minutes(5).force();
/// assert_eq!(options.ttl, Duration::from_secs(300));
/// assert!(options.force_refresh);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RememberOptions {
    /// Entry lifetime, measured from the moment the value is stored.
    pub ttl: Duration,

    /// Skip the cache read and always invoke the producer.
    pub force_refresh: bool,
}

impl RememberOptions {
    pub fn new(ttl: Duration) -> Self {
        RememberOptions {
            ttl,
            force_refresh: false,
        }
    }

    /// TTL expressed in whole minutes.
    pub fn minutes(minutes: u64) -> Self {
        Self::new(Duration::from_secs(minutes.saturating_mul(60)))
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_force_refresh(mut self, force_refresh: bool) -> Self {
        self.force_refresh = force_refresh;
        self
    }

    /// Shorthand for `with_force_refresh(true)`.
    pub fn force(self) -> Self {
        self.with_force_refresh(true)
    }
}

struct PoolInner<V> {
    name: String,
    entries: RwLock<HashMap<Digest, CacheEntry<V>>>,
    hasher: KeyedHasher,
    metrics: Arc<dyn CacheMetrics>,
}

/// Independently-locked memoization pool.
///
/// `Pool` is a cheap handle: clones share the same entries and lock.
///
/// # Example
///
/// ```no_run
/// use memo_kit::{Args, KeyedHasher, Pool, hasher::DEFAULT_HASH_SECRET};
///
/// #[tokio::main]
/// async fn main() -> memo_kit::Result<()> {
///     let pool: Pool<String> = Pool::new("reports", KeyedHasher::from_hex(DEFAULT_HASH_SECRET)?);
///     let args = Args::new().with(1, "eu");
///
///     let report = pool
///         .remember("monthly", 5, &args, false, &|_: &Args| async {
///             Ok::<_, memo_kit::Error>("expensive".to_string())
///         })
///         .await?;
///     assert_eq!(report, "expensive");
///     Ok(())
/// }
/// ```
pub struct Pool<V> {
    inner: Arc<PoolInner<V>>,
}

impl<V> Clone for Pool<V> {
    fn clone(&self) -> Self {
        Pool {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V> Pool<V>
where
    V: Clone + Send + Sync,
{
    /// Create an empty pool with silent metrics.
    pub fn new(name: impl Into<String>, hasher: KeyedHasher) -> Self {
        Self::with_metrics(name, hasher, Arc::new(NoOpMetrics))
    }

    /// Create an empty pool reporting to `metrics`.
    pub fn with_metrics(
        name: impl Into<String>,
        hasher: KeyedHasher,
        metrics: Arc<dyn CacheMetrics>,
    ) -> Self {
        Pool {
            inner: Arc::new(PoolInner {
                name: name.into(),
                entries: RwLock::new(HashMap::new()),
                hasher,
                metrics,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Derive the digest this pool would store `key` + `args` under.
    ///
    /// # Errors
    /// Returns `Error::HashDerivationError` if the arguments have no
    /// canonical form.
    pub fn digest(&self, key: &str, args: &Args) -> Result<Digest> {
        self.inner.hasher.digest(key, args)
    }

    /// Return the memoized value for `key` + `args`, producing it on a miss.
    ///
    /// Equivalent to [`remember_with`](Self::remember_with) with a TTL of
    /// `ttl_minutes` minutes.
    ///
    /// # Errors
    ///
    /// - `Error::HashDerivationError`: digest derivation failed
    /// - `Error::ConfigError`: the TTL overflows the clock
    /// - any error returned by the producer, unchanged
    pub async fn remember<P>(
        &self,
        key: &str,
        ttl_minutes: u64,
        args: &Args,
        force_refresh: bool,
        producer: &P,
    ) -> Result<V>
    where
        P: DataProducer<V>,
    {
        let options = RememberOptions::minutes(ttl_minutes).with_force_refresh(force_refresh);
        self.remember_with(key, args, options, producer).await
    }

    /// Return the memoized value for `key` + `args` using explicit options.
    ///
    /// Flow:
    /// 1. Reject a TTL the clock cannot represent, derive the digest
    /// 2. Unless forced: shared lock, return a live entry if present
    /// 3. Exclusive lock, double-check (unless forced)
    /// 4. Invoke the producer; on success store `now + ttl`
    ///
    /// Callers that miss in step 2 queue on the exclusive lock and usually
    /// find the winner's entry in step 3, but requests are not coalesced:
    /// forced refreshes always produce and the last writer wins. Producer
    /// failures store nothing.
    ///
    /// # Errors
    /// Same as [`remember`](Self::remember).
    pub async fn remember_with<P>(
        &self,
        key: &str,
        args: &Args,
        options: RememberOptions,
        producer: &P,
    ) -> Result<V>
    where
        P: DataProducer<V>,
    {
        let start = Instant::now();
        let name = self.name();

        if start.checked_add(options.ttl).is_none() {
            let err = Error::ConfigError(format!("ttl {:?} is out of range", options.ttl));
            self.inner.metrics.record_error(name, key, &err.to_string());
            return Err(err);
        }

        let digest = self.digest(key, args).map_err(|e| {
            self.inner.metrics.record_error(name, key, &e.to_string());
            e
        })?;

        if !options.force_refresh {
            match self.lookup(&digest).await {
                Ok(value) => {
                    debug!("✓ Pool[{}] REMEMBER {} -> HIT", name, digest);
                    self.inner
                        .metrics
                        .record_hit(name, digest.as_str(), start.elapsed());
                    return Ok(value);
                }
                Err(Error::NotFound) => {}
                Err(e) => return Err(e),
            }
        }

        let mut entries = self.inner.entries.write().await;

        if !options.force_refresh {
            if let Some(entry) = entries.get(&digest) {
                if entry.is_live(Instant::now()) {
                    debug!("✓ Pool[{}] REMEMBER {} -> HIT (after lock)", name, digest);
                    self.inner
                        .metrics
                        .record_hit(name, digest.as_str(), start.elapsed());
                    return Ok(entry.value.clone());
                }
            }
        }

        self.inner
            .metrics
            .record_miss(name, digest.as_str(), start.elapsed());

        let value = producer.produce(args).await.map_err(|e| {
            self.inner
                .metrics
                .record_error(name, digest.as_str(), &e.to_string());
            e
        })?;

        let expires_at = Instant::now().checked_add(options.ttl).ok_or_else(|| {
            Error::ConfigError(format!("ttl {:?} is out of range", options.ttl))
        })?;

        entries.insert(
            digest.clone(),
            CacheEntry {
                value: value.clone(),
                expires_at,
            },
        );
        drop(entries);

        debug!(
            "✓ Pool[{}] REMEMBER {} -> STORED (TTL: {:?}, forced: {})",
            name, digest, options.ttl, options.force_refresh
        );
        self.inner
            .metrics
            .record_set(name, digest.as_str(), start.elapsed());

        Ok(value)
    }

    /// Read a live entry under the shared lock.
    ///
    /// Returns `Error::NotFound` when the entry is absent or expired.
    async fn lookup(&self, digest: &Digest) -> Result<V> {
        let entries = self.inner.entries.read().await;
        match entries.get(digest) {
            Some(entry) if entry.is_live(Instant::now()) => Ok(entry.value.clone()),
            _ => Err(Error::NotFound),
        }
    }

    /// Remove the entry for `key` + `args`. Absent entries are a no-op.
    ///
    /// # Errors
    /// Returns `Error::HashDerivationError` if digest derivation fails.
    pub async fn forget(&self, key: &str, args: &Args) -> Result<()> {
        let digest = self.digest(key, args)?;
        self.forget_by_digest(&digest).await;
        Ok(())
    }

    /// Remove the entry stored under an already-known digest.
    pub async fn forget_by_digest(&self, digest: &Digest) {
        let removed = self.inner.entries.write().await.remove(digest).is_some();
        debug!(
            "✓ Pool[{}] FORGET {} (present: {})",
            self.name(),
            digest,
            removed
        );
        if removed {
            self.inner.metrics.record_delete(self.name(), digest.as_str());
        }
    }

    /// Drop every entry in the pool.
    pub async fn flush(&self) {
        let mut entries = self.inner.entries.write().await;
        *entries = HashMap::new();
        debug!("✓ Pool[{}] FLUSH", self.name());
    }

    /// Evict every expired entry, returning how many were removed.
    ///
    /// Holds the exclusive lock for one pass over the mapping.
    pub async fn sweep(&self) -> usize {
        let mut entries = self.inner.entries.write().await;
        let now = Instant::now();
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live(now));
        let evicted = before - entries.len();
        drop(entries);

        if evicted > 0 {
            debug!("✓ Pool[{}] SWEEP evicted {} entries", self.name(), evicted);
        }
        self.inner.metrics.record_sweep(self.name(), evicted);
        evicted
    }

    /// Check whether a live entry exists for `key` + `args`.
    ///
    /// # Errors
    /// Returns `Error::HashDerivationError` if digest derivation fails.
    pub async fn contains(&self, key: &str, args: &Args) -> Result<bool> {
        let digest = self.digest(key, args)?;
        match self.lookup(&digest).await {
            Ok(_) => Ok(true),
            Err(Error::NotFound) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Number of stored entries, expired ones included until swept.
    pub async fn len(&self) -> usize {
        self.inner.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.entries.read().await.is_empty()
    }

    /// Get pool-level entry counts.
    pub async fn stats(&self) -> PoolStats {
        let entries = self.inner.entries.read().await;
        let now = Instant::now();
        PoolStats {
            total_entries: entries.len(),
            expired_entries: entries.values().filter(|e| !e.is_live(now)).count(),
        }
    }

    /// Print pool statistics to debug log.
    pub async fn log_stats(&self) {
        let stats = self.stats().await;
        debug!(
            "Pool[{}] Stats: {} entries ({} expired)",
            self.name(),
            stats.total_entries,
            stats.expired_entries
        );
    }
}

/// Pool statistics.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolStats {
    pub total_entries: usize,
    pub expired_entries: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hasher::DEFAULT_HASH_SECRET;
    use std::sync::atomic::{AtomicU64, Ordering};

    fn pool() -> Pool<u64> {
        Pool::new(
            "test",
            KeyedHasher::from_hex(DEFAULT_HASH_SECRET).expect("valid secret"),
        )
    }

    /// Producer returning a strictly increasing counter.
    #[derive(Default)]
    struct Counter {
        calls: AtomicU64,
    }

    impl Counter {
        fn calls(&self) -> u64 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl DataProducer<u64> for Counter {
        fn produce(&self, _args: &Args) -> impl std::future::Future<Output = Result<u64>> + Send {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move { Ok(n) }
        }
    }

    #[tokio::test]
    async fn test_remember_memoizes() {
        let pool = pool();
        let counter = Counter::default();
        let args = Args::new().with(1, "x");

        let first = pool
            .remember("k", 5, &args, false, &counter)
            .await
            .expect("first remember");
        let second = pool
            .remember("k", 5, &args, false, &counter)
            .await
            .expect("second remember");

        assert_eq!(first, second);
        assert_eq!(counter.calls(), 1);
    }

    #[tokio::test]
    async fn test_force_refresh_recomputes() {
        let pool = pool();
        let counter = Counter::default();
        let args = Args::new().with(1, "x");

        let first = pool
            .remember("k", 5, &args, false, &counter)
            .await
            .expect("first remember");
        let second = pool
            .remember("k", 5, &args, true, &counter)
            .await
            .expect("forced remember");

        assert_ne!(first, second);
        assert_eq!(counter.calls(), 2);

        // The forced value replaced the stored one.
        let third = pool
            .remember("k", 5, &args, false, &counter)
            .await
            .expect("third remember");
        assert_eq!(third, second);
    }

    #[tokio::test]
    async fn test_different_args_are_separate_entries() {
        let pool = pool();
        let counter = Counter::default();

        let a = pool
            .remember("k", 5, &Args::new().with(1, "AA"), false, &counter)
            .await
            .expect("remember a");
        let b = pool
            .remember("k", 5, &Args::new().with(1, "BB"), false, &counter)
            .await
            .expect("remember b");

        assert_ne!(a, b);
        assert_eq!(pool.len().await, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_is_recomputed() {
        let pool = pool();
        let counter = Counter::default();
        let args = Args::new();

        pool.remember("k", 1, &args, false, &counter)
            .await
            .expect("remember");
        tokio::time::advance(Duration::from_secs(61)).await;

        assert!(!pool.contains("k", &args).await.expect("contains"));
        let value = pool
            .remember("k", 1, &args, false, &counter)
            .await
            .expect("remember after expiry");
        assert_eq!(value, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_ttl_never_hits() {
        let pool = pool();
        let counter = Counter::default();
        let args = Args::new();

        pool.remember("k", 0, &args, false, &counter)
            .await
            .expect("remember");
        pool.remember("k", 0, &args, false, &counter)
            .await
            .expect("remember");

        assert_eq!(counter.calls(), 2);
    }

    #[tokio::test]
    async fn test_producer_error_stores_nothing() {
        let pool = pool();
        let failing =
            |_: &Args| async { Err::<u64, _>(Error::ProducerError("db down".to_string())) };

        let err = pool
            .remember("k", 5, &Args::new(), false, &failing)
            .await
            .unwrap_err();

        assert_eq!(err, Error::ProducerError("db down".to_string()));
        assert!(pool.is_empty().await);
    }

    #[tokio::test]
    async fn test_producer_error_keeps_previous_value_on_forced_refresh() {
        let pool = pool();
        let counter = Counter::default();
        let args = Args::new();

        pool.remember("k", 5, &args, false, &counter)
            .await
            .expect("remember");

        let failing = |_: &Args| async { Err::<u64, _>(Error::ProducerError("boom".to_string())) };
        assert!(pool.remember("k", 5, &args, true, &failing).await.is_err());

        let value = pool
            .remember("k", 5, &args, false, &counter)
            .await
            .expect("remember");
        assert_eq!(value, 1);
        assert_eq!(counter.calls(), 1);
    }

    #[tokio::test]
    async fn test_ttl_overflow_is_config_error() {
        let pool = pool();
        let counter = Counter::default();

        let err = pool
            .remember_with("k", &Args::new(), RememberOptions::new(Duration::MAX), &counter)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::ConfigError(_)));
        assert_eq!(counter.calls(), 0);
        assert!(pool.is_empty().await);
    }

    #[tokio::test]
    async fn test_forget_invalidates() {
        let pool = pool();
        let counter = Counter::default();
        let args = Args::new().with(1, "x");

        pool.remember("k", 5, &args, false, &counter)
            .await
            .expect("remember");
        pool.forget("k", &args).await.expect("forget");
        pool.remember("k", 5, &args, false, &counter)
            .await
            .expect("remember");

        assert_eq!(counter.calls(), 2);
    }

    #[tokio::test]
    async fn test_forget_absent_is_noop() {
        let pool = pool();
        pool.forget("missing", &Args::new())
            .await
            .expect("forget absent");
        assert!(pool.is_empty().await);
    }

    #[tokio::test]
    async fn test_forget_by_digest() {
        let pool = pool();
        let counter = Counter::default();
        let args = Args::new().with(1, "x");

        pool.remember("k", 5, &args, false, &counter)
            .await
            .expect("remember");
        let digest = pool.digest("k", &args).expect("digest");
        pool.forget_by_digest(&digest).await;

        assert!(pool.is_empty().await);
    }

    #[derive(Default)]
    struct DeleteCounter {
        deletes: AtomicU64,
    }

    impl CacheMetrics for DeleteCounter {
        fn record_delete(&self, _pool: &str, _digest: &str) {
            self.deletes.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_delete_metric_only_counts_removals() {
        let metrics = Arc::new(DeleteCounter::default());
        let pool: Pool<u64> = Pool::with_metrics(
            "test",
            KeyedHasher::from_hex(DEFAULT_HASH_SECRET).expect("valid secret"),
            metrics.clone(),
        );
        let counter = Counter::default();
        let args = Args::new().with(1, "x");

        pool.forget("k", &args).await.expect("forget absent");
        assert_eq!(metrics.deletes.load(Ordering::SeqCst), 0);

        pool.remember("k", 5, &args, false, &counter)
            .await
            .expect("remember");
        pool.forget("k", &args).await.expect("forget");
        pool.forget("k", &args).await.expect("forget again");
        assert_eq!(metrics.deletes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_flush() {
        let pool = pool();
        let counter = Counter::default();

        for i in 0..5 {
            pool.remember("k", 5, &Args::new().with(1, i), false, &counter)
                .await
                .expect("remember");
        }
        assert_eq!(pool.len().await, 5);

        pool.flush().await;
        assert!(pool.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_removes_only_expired() {
        let pool = pool();
        let counter = Counter::default();

        for (i, ttl) in [1u64, 1, 10, 10, 10].iter().enumerate() {
            pool.remember("k", *ttl, &Args::new().with(1, i as i64), false, &counter)
                .await
                .expect("remember");
        }

        tokio::time::advance(Duration::from_secs(5 * 60)).await;
        assert_eq!(
            pool.stats().await,
            PoolStats {
                total_entries: 5,
                expired_entries: 2
            }
        );

        assert_eq!(pool.sweep().await, 2);
        assert_eq!(pool.len().await, 3);
        for i in 2..5i64 {
            assert!(pool
                .contains("k", &Args::new().with(1, i))
                .await
                .expect("contains"));
        }
    }

    #[tokio::test]
    async fn test_clone_shares_entries() {
        let pool1 = pool();
        let pool2 = pool1.clone();
        let counter = Counter::default();

        pool1
            .remember("k", 5, &Args::new(), false, &counter)
            .await
            .expect("remember");

        assert_eq!(pool2.len().await, 1);
        assert_eq!(pool2.name(), "test");
    }
}
