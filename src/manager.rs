//! Named pool registry with a background expiry sweep.
//!
//! The manager's lock only protects the name → pool mapping. Callers look a
//! pool up (brief shared lock), get a [`Pool`] handle back, and then work on
//! the pool under the pool's own lock, so a slow producer in one pool never
//! holds up the registry or any other pool.

use crate::error::{Error, Result};
use crate::hasher::{KeyedHasher, DEFAULT_HASH_SECRET};
use crate::observability::{CacheMetrics, NoOpMetrics};
use crate::pool::Pool;
use crate::sweeper::{Sweep, Sweeper};
use futures::future::join_all;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{watch, RwLock};

/// Default interval between background sweep passes.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// Pool manager configuration.
#[derive(Clone)]
pub struct ManagerConfig {
    /// Hex-encoded 32-byte secret shared by every pool for key derivation.
    pub hash_secret: String,

    /// Interval between background sweep passes.
    pub sweep_interval: Duration,

    /// Start the sweeper from [`PoolManager::start`].
    pub auto_sweep: bool,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            hash_secret: DEFAULT_HASH_SECRET.to_string(),
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            auto_sweep: true,
        }
    }
}

impl ManagerConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the hex-encoded hash secret
    pub fn with_hash_secret(mut self, secret: impl Into<String>) -> Self {
        self.hash_secret = secret.into();
        self
    }

    /// Set the sweep interval
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Set auto sweep enabled/disabled
    pub fn with_auto_sweep(mut self, enabled: bool) -> Self {
        self.auto_sweep = enabled;
        self
    }
}

impl fmt::Debug for ManagerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagerConfig")
            .field("hash_secret", &"<redacted>")
            .field("sweep_interval", &self.sweep_interval)
            .field("auto_sweep", &self.auto_sweep)
            .finish()
    }
}

/// Manager lifecycle.
///
/// `Created → SweeperRunning → Stopped`, or `Created → Stopped` when shut
/// down without ever sweeping. `Stopped` is terminal for the sweeper only;
/// pool operations keep working.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ManagerState {
    Created,
    SweeperRunning,
    Stopped,
}

impl fmt::Display for ManagerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManagerState::Created => write!(f, "Created"),
            ManagerState::SweeperRunning => write!(f, "SweeperRunning"),
            ManagerState::Stopped => write!(f, "Stopped"),
        }
    }
}

struct ManagerInner<V> {
    pools: RwLock<HashMap<String, Pool<V>>>,
    hasher: KeyedHasher,
    metrics: Arc<dyn CacheMetrics>,
    config: ManagerConfig,
    state: watch::Sender<ManagerState>,
    sweeper: Mutex<Option<Sweeper>>,
}

impl<V> Sweep for ManagerInner<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn sweep(&self) -> impl Future<Output = usize> + Send {
        async move {
            // Snapshot the handles so the registry lock is released before
            // waiting on any pool lock.
            let pools: Vec<Pool<V>> = self.pools.read().await.values().cloned().collect();
            let evicted = join_all(pools.iter().map(|pool| pool.sweep())).await;
            evicted.into_iter().sum()
        }
    }
}

/// Registry of independently-locked pools.
///
/// `PoolManager` is `Clone`; clones share the same registry and sweeper.
/// The sweeper is cancelled when the last clone is dropped.
///
/// # Example
///
/// ```no_run
/// use memo_kit::{Args, ManagerConfig, PoolManager};
///
/// #[tokio::main]
/// async fn main() -> memo_kit::Result<()> {
///     // Sweeps expired entries every second in the background
///     let manager: PoolManager<String> = PoolManager::start(ManagerConfig::default())?;
///     manager.add_pool("reports").await;
///
///     if let Some(pool) = manager.get_pool("reports").await {
///         let args = Args::new().with(1, "eu");
///         let value = pool
///             .remember("monthly", 5, &args, false, &|_: &Args| async {
///                 Ok::<_, memo_kit::Error>("expensive".to_string())
///             })
///             .await?;
///         println!("{}", value);
///     }
///
///     manager.shutdown().await;
///     Ok(())
/// }
/// ```
pub struct PoolManager<V> {
    inner: Arc<ManagerInner<V>>,
}

impl<V> Clone for PoolManager<V> {
    fn clone(&self) -> Self {
        PoolManager {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V> PoolManager<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Create a manager without starting the sweeper.
    ///
    /// # Errors
    /// Returns `Error::InvalidSecretFormat` if `config.hash_secret` is not
    /// a hex-encoded 32-byte secret.
    pub fn new(config: ManagerConfig) -> Result<Self> {
        Self::with_metrics(config, Arc::new(NoOpMetrics))
    }

    /// Create a manager whose pools report to `metrics`.
    ///
    /// # Errors
    /// Same as [`new`](Self::new).
    pub fn with_metrics(config: ManagerConfig, metrics: Arc<dyn CacheMetrics>) -> Result<Self> {
        let hasher = KeyedHasher::from_hex(&config.hash_secret)?;
        let (state, _) = watch::channel(ManagerState::Created);

        Ok(PoolManager {
            inner: Arc::new(ManagerInner {
                pools: RwLock::new(HashMap::new()),
                hasher,
                metrics,
                config,
                state,
                sweeper: Mutex::new(None),
            }),
        })
    }

    /// Create a manager and start the sweeper if `config.auto_sweep` is set.
    ///
    /// Must be called from within a tokio runtime when auto sweep is on.
    ///
    /// # Errors
    /// - `Error::InvalidSecretFormat`: bad hash secret
    /// - `Error::ConfigError`: zero sweep interval
    /// - `Error::InvalidState`: no tokio runtime available
    pub fn start(config: ManagerConfig) -> Result<Self> {
        let auto_sweep = config.auto_sweep;
        let interval = config.sweep_interval;
        let manager = Self::new(config)?;
        if auto_sweep {
            manager.start_sweeper(interval)?;
        }
        Ok(manager)
    }

    /// Get the manager configuration
    pub fn config(&self) -> &ManagerConfig {
        &self.inner.config
    }

    /// Create an empty pool under `name` and return its handle.
    ///
    /// An existing pool with the same name is replaced and its entries are
    /// lost. Handles to the old pool keep working but are detached from the
    /// manager.
    pub async fn add_pool(&self, name: &str) -> Pool<V> {
        let pool = Pool::with_metrics(
            name,
            self.inner.hasher.clone(),
            Arc::clone(&self.inner.metrics),
        );

        let replaced = self
            .inner
            .pools
            .write()
            .await
            .insert(name.to_string(), pool.clone())
            .is_some();

        if replaced {
            warn!("⚠ Pool {} replaced - previous entries discarded", name);
        } else {
            info!("Pool {} added", name);
        }
        pool
    }

    /// Remove the pool under `name`. Returns whether a pool was removed.
    pub async fn remove_pool(&self, name: &str) -> bool {
        let removed = self.inner.pools.write().await.remove(name).is_some();
        if removed {
            info!("Pool {} removed", name);
        }
        removed
    }

    /// Look up the pool under `name`.
    ///
    /// The manager lock is released before this returns; all further work
    /// happens on the pool's own lock.
    pub async fn get_pool(&self, name: &str) -> Option<Pool<V>> {
        self.inner.pools.read().await.get(name).cloned()
    }

    /// Drop every pool.
    pub async fn flush_all(&self) {
        let mut pools = self.inner.pools.write().await;
        *pools = HashMap::new();
        warn!("⚠ FLUSH_ALL executed - all pools removed!");
    }

    /// Names of all registered pools, sorted.
    pub async fn pool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.pools.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    pub async fn pool_count(&self) -> usize {
        self.inner.pools.read().await.len()
    }

    /// Manually run one sweep pass over every pool (in addition to the
    /// background sweeper). Returns the total number of evicted entries.
    pub async fn sweep_all(&self) -> usize {
        self.inner.sweep().await
    }

    /// Start the background sweeper.
    ///
    /// # Errors
    /// - `Error::ConfigError`: `interval` is zero
    /// - `Error::InvalidState`: the sweeper is already running, the manager
    ///   was shut down, or no tokio runtime is available
    pub fn start_sweeper(&self, interval: Duration) -> Result<()> {
        let mut slot = self
            .inner
            .sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        match self.state() {
            ManagerState::Created => {}
            state => {
                return Err(Error::InvalidState(format!(
                    "cannot start sweeper in state {}",
                    state
                )))
            }
        }

        let sweeper = Sweeper::spawn(interval, Arc::downgrade(&self.inner))?;
        *slot = Some(sweeper);
        self.inner.state.send_replace(ManagerState::SweeperRunning);
        Ok(())
    }

    /// Stop the background sweeper.
    ///
    /// Waits for an in-flight sweep pass to finish. Idempotent; pools stay
    /// usable afterwards.
    pub async fn shutdown(&self) {
        let sweeper = {
            let mut slot = self
                .inner
                .sweeper
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            self.inner.state.send_replace(ManagerState::Stopped);
            slot.take()
        };

        if let Some(sweeper) = sweeper {
            sweeper.stop().await;
        }
    }

    /// Get current lifecycle state
    pub fn state(&self) -> ManagerState {
        *self.inner.state.borrow()
    }

    /// Subscribe to lifecycle state changes
    pub fn state_receiver(&self) -> watch::Receiver<ManagerState> {
        self.inner.state.subscribe()
    }
}
