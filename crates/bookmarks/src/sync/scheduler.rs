//! Fixed-interval sync scheduler
//!
//! Runs one tick at startup and then one per interval. Ticks never overlap:
//! the next interval is only awaited after the previous tick returned.
//! Ticks block (HTTP and backoff sleeps), so each one runs on the blocking
//! thread pool.

use std::time::Duration;

use log::{debug, error, info};
use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;

use super::engine::{SyncEngine, TickReport};
use crate::error::SyncError;

/// Why the scheduler stopped without a fatal error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerExit {
    /// Shutdown was requested while idle
    Shutdown,
    /// Shutdown was requested while a tick was running; the tick was abandoned
    ShutdownDuringTick,
}

/// Drives a [`SyncEngine`] on a fixed interval
pub struct Scheduler {
    engine: SyncEngine,
    interval: Duration,
}

impl Scheduler {
    pub fn new(engine: SyncEngine, interval: Duration) -> Self {
        Self { engine, interval }
    }

    /// Run until shutdown or a fatal error.
    ///
    /// `shutdown` fires (or its sender is dropped) when the process should
    /// stop. Shutdown is observed while idle and while a tick is running;
    /// a running tick is not waited for.
    ///
    /// # Errors
    /// Returns the [`SyncError`] of the first tick that failed fatally.
    pub async fn run(
        self,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<SchedulerExit, SyncError> {
        info!("Starting sync scheduler (interval {:?})", self.interval);

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut engine = self.engine;
        let mut tick_number: u64 = 0;

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    info!("Received shutdown signal");
                    return Ok(SchedulerExit::Shutdown);
                }
                _ = ticker.tick() => {}
            }

            tick_number += 1;
            debug!(
                "Tick {} starting from checkpoint {}",
                tick_number,
                engine.checkpoint()
            );

            let task = tokio::task::spawn_blocking(move || {
                let result = engine.run_tick();
                (engine, result)
            });

            let (returned, result) = tokio::select! {
                _ = shutdown.recv() => {
                    info!("Received shutdown signal during tick {}; abandoning it", tick_number);
                    return Ok(SchedulerExit::ShutdownDuringTick);
                }
                joined = task => match joined {
                    Ok(pair) => pair,
                    Err(e) => {
                        error!("Tick {} aborted: {}", tick_number, e);
                        return Err(SyncError::TickAborted(e.to_string()));
                    }
                },
            };

            match result {
                Ok(report) => log_report(tick_number, &report),
                Err(e) => {
                    error!("Tick {} failed fatally: {}", tick_number, e);
                    return Err(e);
                }
            }

            engine = returned;
        }
    }
}

fn log_report(tick_number: u64, report: &TickReport) {
    debug!(
        "Tick {} done in {}ms: window since {}, advanced={}",
        tick_number,
        (chrono::Utc::now() - report.started_at).num_milliseconds(),
        report.window_start,
        report.advanced()
    );
}
