//! Data producer trait for the computation behind a memoized call.
//!
//! The `DataProducer` trait decouples the cache from whatever the expensive
//! work is: a database query, an HTTP call, a heavy computation. The cache
//! never stores the producer; it is handed in on every `remember` call and
//! only invoked on a miss or a forced refresh.
//!
//! # Implementing DataProducer
//!
//! Closures returning a future implement the trait automatically:
//!
//! ```
//! use memo_kit::{Args, Error};
//!
//! let producer = |args: &Args| {
//!     let region = args.get(1).cloned();
//!     async move {
//!         match region {
//!             Some(r) => Ok(format!("report for {}", r)),
//!             None => Err(Error::ProducerError("missing region".to_string())),
//!         }
//!     }
//! };
//! # let _ = producer;
//! ```
//!
//! Implement it on a struct when the producer owns a client or pool:
//!
//! ```ignore
//! struct ReportProducer { db: PgPool }
//!
//! impl DataProducer<Report> for ReportProducer {
//!     fn produce(&self, args: &Args) -> impl Future<Output = Result<Report>> + Send {
//!         let region = args.get(1).cloned();
//!         async move { load_report(&self.db, region).await }
//!     }
//! }
//! ```
//!
//! # Error Handling
//!
//! Whatever `Error` the producer returns is passed back to the caller
//! unchanged and nothing is cached. `Error::ProducerError` is the
//! conventional variant for producer-side failures.

use crate::args::Args;
use crate::error::Result;
use std::future::Future;

/// Trait for data producer implementations.
pub trait DataProducer<V>: Send + Sync {
    /// Compute the value for `args`.
    ///
    /// Called with the pool's exclusive lock held, so producer latency
    /// blocks other operations on the same pool.
    ///
    /// # Errors
    /// Any error is returned verbatim by `remember`.
    fn produce(&self, args: &Args) -> impl Future<Output = Result<V>> + Send;
}

impl<V, F, Fut> DataProducer<V> for F
where
    F: Fn(&Args) -> Fut + Send + Sync,
    Fut: Future<Output = Result<V>> + Send,
{
    fn produce(&self, args: &Args) -> impl Future<Output = Result<V>> + Send {
        self(args)
    }
}
