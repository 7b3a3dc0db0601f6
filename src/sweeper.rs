//! Background expiry sweeper.
//!
//! A `Sweeper` owns one tokio task that ticks at a fixed interval and runs a
//! sweep pass on its target. The task only holds a [`Weak`] reference, so it
//! exits on its own once the target is dropped, and it can be cancelled
//! explicitly through a `watch` channel. Dropping the `Sweeper` handle also
//! signals cancellation; nothing is left running detached.

use crate::error::{Error, Result};
use std::future::Future;
use std::sync::Weak;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Something that can evict its expired entries in one pass.
pub trait Sweep: Send + Sync {
    /// Run one pass and return how many entries were evicted.
    fn sweep(&self) -> impl Future<Output = usize> + Send;
}

/// Handle to a running periodic sweep task.
pub struct Sweeper {
    interval: Duration,
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl Sweeper {
    /// Spawn a periodic sweep of `target` on the current tokio runtime.
    ///
    /// The first pass runs one `interval` after spawning. A cancellation
    /// signal stops future ticks; a pass already in flight completes.
    ///
    /// # Errors
    /// - `Error::ConfigError`: `interval` is zero
    /// - `Error::InvalidState`: called outside a tokio runtime
    pub fn spawn<T>(interval: Duration, target: Weak<T>) -> Result<Self>
    where
        T: Sweep + 'static,
    {
        if interval.is_zero() {
            return Err(Error::ConfigError(
                "sweep interval must be greater than zero".to_string(),
            ));
        }

        let handle = tokio::runtime::Handle::try_current()
            .map_err(|e| Error::InvalidState(format!("sweeper needs a tokio runtime: {}", e)))?;

        let (shutdown, mut shutdown_rx) = watch::channel(false);

        let task = handle.spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;

                    _ = shutdown_rx.changed() => {
                        debug!("Sweeper received shutdown signal");
                        break;
                    }
                    _ = ticker.tick() => {
                        let Some(target) = target.upgrade() else {
                            debug!("Sweeper target dropped, exiting");
                            break;
                        };

                        let evicted = target.sweep().await;
                        if evicted > 0 {
                            debug!("Sweeper tick evicted {} expired entries", evicted);
                        }
                    }
                }
            }
        });

        info!("Sweeper started (interval: {:?})", interval);

        Ok(Sweeper {
            interval,
            shutdown,
            task: Some(task),
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether the background task is still alive.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Signal cancellation and wait for the task to finish.
    pub async fn stop(mut self) {
        let _ = self.shutdown.send(true);

        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    error!("Sweeper task failed: {}", e);
                }
            }
        }

        info!("Sweeper stopped");
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
    }
}
