//! # memo-kit
//!
//! Named-pool, time-to-live memoization cache for async Rust.
//!
//! Wrap an expensive computation (a *producer*) behind a logical key plus a
//! set of positional arguments. Repeated calls with the same key and
//! arguments inside the TTL window return the stored value instead of
//! recomputing it.
//!
//! ## Features
//!
//! - **Argument-aware keys:** Entries are identified by an HMAC-SHA256 digest of the key and its arguments
//! - **Independent pools:** Every named pool owns its own lock; pools never contend with each other
//! - **Background expiry:** A cancellable sweeper evicts expired entries across all pools
//! - **Opaque producers:** Any async closure or [`DataProducer`] implementation can fill the cache
//! - **Observable:** Built-in logging and pluggable [`CacheMetrics`](observability::CacheMetrics) hooks
//!
//! ## Quick Start
//!
//! ```no_run
//! use memo_kit::{Args, ManagerConfig, PoolManager, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     // 1. Create the manager (sweeps every second)
//!     let manager: PoolManager<String> = PoolManager::start(ManagerConfig::default())?;
//!
//!     // 2. Register a pool
//!     let reports = manager.add_pool("reports").await;
//!
//!     // 3. Memoize a computation for 5 minutes
//!     let args = Args::new().with(1, "eu").with(2, 2024);
//!     let report = reports
//!         .remember("yearly", 5, &args, false, &|args: &Args| {
//!             let region = args.get(1).cloned();
//!             async move { Ok::<_, memo_kit::Error>(format!("report for {:?}", region)) }
//!         })
//!         .await?;
//!     println!("{}", report);
//!
//!     // 4. Invalidate when the source changes
//!     reports.forget("yearly", &args).await?;
//!
//!     manager.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Concurrency
//!
//! A miss takes the pool's exclusive lock and invokes the producer while
//! holding it, double-checking first. Concurrent misses usually find the
//! first caller's entry on the double-check, but there is no request
//! coalescing: this is best-effort deduplication, not single-flight.

#[macro_use]
extern crate log;

pub mod args;
pub mod error;
pub mod hasher;
pub mod manager;
pub mod observability;
pub mod pool;
pub mod producer;
pub mod sweeper;

// Re-exports for convenience
pub use args::Args;
pub use error::{Error, Result};
pub use hasher::{Digest, KeyedHasher};
pub use manager::{ManagerConfig, ManagerState, PoolManager};
pub use pool::{Pool, PoolStats, RememberOptions};
pub use producer::DataProducer;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
