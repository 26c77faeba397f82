//! Incremental sync engine
//!
//! Owns the checkpoint and runs one fetch-then-push tick at a time.
//! The checkpoint only advances when every item in the window was pushed,
//! so a failed window is fetched again on the next tick (at-least-once).

use chrono::{DateTime, Utc};
use log::{error, info, warn};

use super::traits::{FetchOutcome, ItemSink, ItemSource};
use crate::error::{SinkError, SourceError, SyncError};
use crate::models::Checkpoint;

/// How a tick ended, short of a fatal error
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// The source had nothing new
    NoNewData,
    /// Every fetched item was pushed
    Completed,
    /// Some pushes failed; the window will be retried
    PartialFailure { failures: Vec<SinkError> },
    /// The fetch itself failed; the window will be retried
    SourceFailed(SourceError),
}

/// Summary of one tick
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub started_at: DateTime<Utc>,
    /// Checkpoint the tick fetched from
    pub window_start: Checkpoint,
    /// Number of items the source returned
    pub items_seen: usize,
    /// Number of items successfully pushed
    pub items_pushed: usize,
    /// Checkpoint the next tick will use
    pub checkpoint: Checkpoint,
    pub outcome: TickOutcome,
}

impl TickReport {
    /// Whether the checkpoint moved past the tick's window start
    pub fn advanced(&self) -> bool {
        self.checkpoint != self.window_start
    }

    pub fn items_failed(&self) -> usize {
        match &self.outcome {
            TickOutcome::PartialFailure { failures } => failures.len(),
            _ => 0,
        }
    }
}

/// Sync engine for one source/sink pair
pub struct SyncEngine {
    source: Box<dyn ItemSource>,
    sink: Box<dyn ItemSink>,
    checkpoint: Checkpoint,
}

impl SyncEngine {
    pub fn new(
        source: Box<dyn ItemSource>,
        sink: Box<dyn ItemSink>,
        checkpoint: Checkpoint,
    ) -> Self {
        Self {
            source,
            sink,
            checkpoint,
        }
    }

    /// Checkpoint the next tick will fetch from
    pub fn checkpoint(&self) -> Checkpoint {
        self.checkpoint
    }

    /// Run one fetch-then-push cycle.
    ///
    /// # Errors
    /// Returns a [`SyncError`] only when credentials are rejected by either
    /// side; the caller should stop scheduling ticks. All other failures are
    /// reported in the [`TickReport`] and leave the checkpoint unchanged.
    pub fn run_tick(&mut self) -> Result<TickReport, SyncError> {
        let started_at = Utc::now();
        let window_start = self.checkpoint;

        let fetched = match self.source.fetch(window_start) {
            Ok(fetched) => fetched,
            Err(SourceError::Unauthorized) => {
                error!("Source rejected credentials; stopping sync");
                return Err(SyncError::SourceUnauthorized);
            }
            Err(e) => {
                warn!("Failed to fetch items since {}: {}", window_start, e);
                return Ok(self.finish(TickReport {
                    started_at,
                    window_start,
                    items_seen: 0,
                    items_pushed: 0,
                    checkpoint: window_start,
                    outcome: TickOutcome::SourceFailed(e),
                }));
            }
        };

        let (items, cursor) = match fetched {
            FetchOutcome::NoNewData { cursor } => {
                info!("No new items");
                self.checkpoint = self.checkpoint.advanced_to(cursor);
                return Ok(self.finish(TickReport {
                    started_at,
                    window_start,
                    items_seen: 0,
                    items_pushed: 0,
                    checkpoint: self.checkpoint,
                    outcome: TickOutcome::NoNewData,
                }));
            }
            FetchOutcome::Items { items, cursor } => (items, cursor),
        };

        let mut pushed = 0;
        let mut failures = Vec::new();

        for item in &items {
            info!("Processing {}", item);
            match self.sink.push(item) {
                Ok(()) => {
                    pushed += 1;
                    info!("Added {}", item);
                }
                Err(SinkError::Unauthorized) => {
                    error!(
                        "Sink rejected credentials while pushing {}; checkpoint stays at {}",
                        item, self.checkpoint
                    );
                    log_summary(items.len(), pushed, failures.len(), self.checkpoint);
                    return Err(SyncError::SinkUnauthorized {
                        url: item.clone(),
                        seen: items.len(),
                        pushed,
                    });
                }
                Err(e) => {
                    error!("{}", e);
                    failures.push(e);
                }
            }
        }

        let outcome = if failures.is_empty() {
            self.checkpoint = self.checkpoint.advanced_to(cursor);
            TickOutcome::Completed
        } else {
            warn!(
                "{} of {} items failed; window since {} will be retried",
                failures.len(),
                items.len(),
                window_start
            );
            TickOutcome::PartialFailure { failures }
        };

        Ok(self.finish(TickReport {
            started_at,
            window_start,
            items_seen: items.len(),
            items_pushed: pushed,
            checkpoint: self.checkpoint,
            outcome,
        }))
    }

    fn finish(&self, report: TickReport) -> TickReport {
        log_summary(
            report.items_seen,
            report.items_pushed,
            report.items_failed(),
            report.checkpoint,
        );
        report
    }
}

fn log_summary(seen: usize, pushed: usize, failed: usize, checkpoint: Checkpoint) {
    info!(
        "Tick summary: seen={} pushed={} failed={} next_checkpoint={}",
        seen, pushed, failed, checkpoint
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Item;
    use crate::transport::TransportError;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    struct FakeSource {
        outcomes: Mutex<VecDeque<Result<FetchOutcome, SourceError>>>,
        calls: Arc<Mutex<Vec<Checkpoint>>>,
    }

    impl ItemSource for FakeSource {
        fn fetch(&self, since: Checkpoint) -> Result<FetchOutcome, SourceError> {
            self.calls.lock().unwrap().push(since);
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(FetchOutcome::NoNewData { cursor: since }))
        }
    }

    /// Sink that fails for configured URLs
    struct FakeSink {
        failing: Vec<(String, SinkError)>,
        pushed: Arc<Mutex<Vec<String>>>,
    }

    impl ItemSink for FakeSink {
        fn push(&self, item: &Item) -> Result<(), SinkError> {
            self.pushed.lock().unwrap().push(item.url().to_string());
            match self.failing.iter().find(|(url, _)| url == item.url()) {
                Some((_, err)) => Err(err.clone()),
                None => Ok(()),
            }
        }
    }

    struct Harness {
        engine: SyncEngine,
        fetches: Arc<Mutex<Vec<Checkpoint>>>,
        pushed: Arc<Mutex<Vec<String>>>,
    }

    fn harness(
        outcomes: Vec<Result<FetchOutcome, SourceError>>,
        failing: Vec<(String, SinkError)>,
        start: i64,
    ) -> Harness {
        let fetches = Arc::new(Mutex::new(Vec::new()));
        let pushed = Arc::new(Mutex::new(Vec::new()));
        let source = FakeSource {
            outcomes: Mutex::new(outcomes.into()),
            calls: fetches.clone(),
        };
        let sink = FakeSink {
            failing,
            pushed: pushed.clone(),
        };
        Harness {
            engine: SyncEngine::new(Box::new(source), Box::new(sink), Checkpoint::from_secs(start)),
            fetches,
            pushed,
        }
    }

    fn items(urls: &[&str], cursor: i64) -> Result<FetchOutcome, SourceError> {
        Ok(FetchOutcome::Items {
            items: urls.iter().map(|u| Item::new(*u)).collect(),
            cursor: Checkpoint::from_secs(cursor),
        })
    }

    fn per_item_failure(url: &str) -> (String, SinkError) {
        (
            url.to_string(),
            SinkError::Failed {
                url: Item::new(url),
                source: TransportError::Status {
                    status: 500,
                    detail: None,
                },
            },
        )
    }

    #[test]
    fn test_no_new_data_advances_to_server_cursor() {
        let mut h = harness(
            vec![Ok(FetchOutcome::NoNewData {
                cursor: Checkpoint::from_secs(200),
            })],
            vec![],
            100,
        );

        let report = h.engine.run_tick().unwrap();

        assert_eq!(report.outcome, TickOutcome::NoNewData);
        assert_eq!(report.checkpoint, Checkpoint::from_secs(200));
        assert!(report.advanced());
        assert!(h.pushed.lock().unwrap().is_empty());
        assert_eq!(h.engine.checkpoint(), Checkpoint::from_secs(200));
    }

    #[test]
    fn test_all_pushes_succeed_advances_checkpoint() {
        let mut h = harness(vec![items(&["https://a", "https://b", "https://c"], 300)], vec![], 100);

        let report = h.engine.run_tick().unwrap();

        assert_eq!(report.outcome, TickOutcome::Completed);
        assert_eq!(report.items_seen, 3);
        assert_eq!(report.items_pushed, 3);
        assert_eq!(h.engine.checkpoint(), Checkpoint::from_secs(300));
    }

    #[test]
    fn test_per_item_failure_keeps_checkpoint_and_continues() {
        let mut h = harness(
            vec![items(&["https://a", "https://b", "https://c"], 300)],
            vec![per_item_failure("https://b")],
            100,
        );

        let report = h.engine.run_tick().unwrap();

        assert_eq!(report.items_seen, 3);
        assert_eq!(report.items_pushed, 2);
        assert_eq!(report.items_failed(), 1);
        assert!(!report.advanced());
        assert_eq!(h.engine.checkpoint(), Checkpoint::from_secs(100));
        // Every item was attempted despite the failure
        assert_eq!(h.pushed.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_failed_window_is_refetched() {
        let mut h = harness(
            vec![
                items(&["https://a", "https://b"], 300),
                items(&["https://a", "https://b"], 310),
            ],
            vec![per_item_failure("https://a")],
            100,
        );

        h.engine.run_tick().unwrap();
        h.engine.run_tick().unwrap();

        let fetches = h.fetches.lock().unwrap();
        assert_eq!(*fetches, vec![Checkpoint::from_secs(100), Checkpoint::from_secs(100)]);
    }

    #[test]
    fn test_sink_unauthorized_aborts_tick() {
        let mut h = harness(
            vec![items(&["https://1", "https://2", "https://3", "https://4", "https://5"], 300)],
            vec![],
            100,
        );
        // Whichever item is pushed second gets the 401
        h.engine.sink = Box::new(UnauthorizedAfter {
            allowed: 1,
            pushed: h.pushed.clone(),
        });

        let err = h.engine.run_tick().unwrap_err();

        assert_eq!(
            err,
            SyncError::SinkUnauthorized {
                url: Item::new(h.pushed.lock().unwrap()[1].clone()),
                seen: 5,
                pushed: 1,
            }
        );
        assert_eq!(h.pushed.lock().unwrap().len(), 2);
        assert_eq!(h.engine.checkpoint(), Checkpoint::from_secs(100));
    }

    struct UnauthorizedAfter {
        allowed: usize,
        pushed: Arc<Mutex<Vec<String>>>,
    }

    impl ItemSink for UnauthorizedAfter {
        fn push(&self, item: &Item) -> Result<(), SinkError> {
            let mut pushed = self.pushed.lock().unwrap();
            pushed.push(item.url().to_string());
            if pushed.len() > self.allowed {
                Err(SinkError::Unauthorized)
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn test_source_error_keeps_checkpoint() {
        let mut h = harness(
            vec![Err(SourceError::Application("Something Went Wrong".into()))],
            vec![],
            100,
        );

        let report = h.engine.run_tick().unwrap();

        assert_eq!(
            report.outcome,
            TickOutcome::SourceFailed(SourceError::Application("Something Went Wrong".into()))
        );
        assert_eq!(h.engine.checkpoint(), Checkpoint::from_secs(100));
        assert!(h.pushed.lock().unwrap().is_empty());
    }

    #[test]
    fn test_source_unauthorized_is_fatal() {
        let mut h = harness(vec![Err(SourceError::Unauthorized)], vec![], 100);

        assert_eq!(h.engine.run_tick().unwrap_err(), SyncError::SourceUnauthorized);
        assert_eq!(h.engine.checkpoint(), Checkpoint::from_secs(100));
    }

    #[test]
    fn test_checkpoint_never_moves_backwards() {
        let mut h = harness(vec![items(&["https://a"], 50)], vec![], 100);

        let report = h.engine.run_tick().unwrap();

        assert_eq!(report.outcome, TickOutcome::Completed);
        assert_eq!(h.engine.checkpoint(), Checkpoint::from_secs(100));
    }

    #[test]
    fn test_duplicate_urls_are_pushed_twice() {
        let mut h = harness(vec![items(&["https://a", "https://a"], 300)], vec![], 100);

        let report = h.engine.run_tick().unwrap();

        assert_eq!(report.items_pushed, 2);
        assert_eq!(h.pushed.lock().unwrap().len(), 2);
    }
}
