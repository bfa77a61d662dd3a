use std::num::NonZeroU64;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::core::glacier::{ClientError, GlacierClient};
use crate::core::report::{ProgressEvent, ProgressReporter};

/// Result of deleting one archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeletionOutcome {
    Succeeded,
    Failed(String),
}

impl From<Result<(), ClientError>> for DeletionOutcome {
    fn from(result: Result<(), ClientError>) -> Self {
        match result {
            Ok(()) => Self::Succeeded,
            Err(e) => Self::Failed(e.to_string()),
        }
    }
}

/// Running counters for one vault. `succeeded + failed == processed` at all times.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeletionTally {
    pub processed: u64,
    pub succeeded: u64,
    pub failed: u64,
    /// Stopped at a throttle pause because the run was cancelled.
    pub interrupted: bool,
}

impl DeletionTally {
    fn record(&mut self, outcome: &DeletionOutcome) {
        match outcome {
            DeletionOutcome::Succeeded => self.succeeded += 1,
            DeletionOutcome::Failed(_) => self.failed += 1,
        }
        self.processed += 1;
    }

    /// Every one of `total` archives was processed and deleted.
    pub fn is_clean(&self, total: u64) -> bool {
        !self.interrupted && self.failed == 0 && self.succeeded == total
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleSettings {
    pub pause_every: NonZeroU64,
    pub pause: Duration,
    pub progress_every: NonZeroU64,
}

impl ThrottleSettings {
    /// `None` when either cadence is zero.
    pub fn new(pause_every: u64, pause: Duration, progress_every: u64) -> Option<Self> {
        Some(Self {
            pause_every: NonZeroU64::new(pause_every)?,
            pause,
            progress_every: NonZeroU64::new(progress_every)?,
        })
    }
}

impl Default for ThrottleSettings {
    fn default() -> Self {
        Self {
            pause_every: NonZeroU64::new(100).unwrap_or(NonZeroU64::MIN),
            pause: Duration::from_secs(1),
            progress_every: NonZeroU64::new(10_000).unwrap_or(NonZeroU64::MIN),
        }
    }
}

/// Deletes archives one at a time, in inventory order.
///
/// A failure on one archive is reported and counted, never propagated: batches run
/// into the millions and transient errors at that scale are expected.
pub struct DeletionEngine {
    client: Arc<dyn GlacierClient>,
    reporter: Arc<dyn ProgressReporter>,
    throttle: ThrottleSettings,
}

impl DeletionEngine {
    pub fn new(
        client: Arc<dyn GlacierClient>,
        reporter: Arc<dyn ProgressReporter>,
        throttle: ThrottleSettings,
    ) -> Self {
        Self {
            client,
            reporter,
            throttle,
        }
    }

    pub async fn delete_all(
        &self,
        vault: &str,
        archive_ids: &[String],
        cancel: &CancellationToken,
    ) -> DeletionTally {
        let mut tally = DeletionTally::default();

        for (index, archive_id) in archive_ids.iter().enumerate() {
            let index = index as u64;
            let outcome = DeletionOutcome::from(self.client.delete_archive(vault, archive_id).await);

            match &outcome {
                DeletionOutcome::Succeeded => self.reporter.report(ProgressEvent::ArchiveDeleted {
                    index,
                    archive_id: archive_id.clone(),
                }),
                DeletionOutcome::Failed(reason) => {
                    self.reporter.report(ProgressEvent::ArchiveDeleteFailed {
                        index,
                        archive_id: archive_id.clone(),
                        reason: reason.clone(),
                    })
                }
            }
            tally.record(&outcome);

            if tally.processed % self.throttle.progress_every.get() == 0 {
                self.reporter.report(ProgressEvent::Progress {
                    vault: vault.to_string(),
                    processed: tally.processed,
                });
            }

            if tally.processed % self.throttle.pause_every.get() == 0 {
                self.reporter.report(ProgressEvent::Throttled {
                    vault: vault.to_string(),
                    processed: tally.processed,
                    pause: self.throttle.pause,
                });

                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        tally.interrupted = true;
                        break;
                    }
                    _ = tokio::time::sleep(self.throttle.pause) => {}
                }
            }
        }

        tally
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{GlacierCall, SimulatedGlacier};
    use crate::core::report::testing::RecordingReporter;

    fn engine(
        glacier: Arc<SimulatedGlacier>,
        reporter: Arc<RecordingReporter>,
    ) -> DeletionEngine {
        DeletionEngine::new(
            glacier,
            reporter,
            ThrottleSettings {
                pause_every: NonZeroU64::new(100).unwrap(),
                pause: Duration::ZERO,
                progress_every: NonZeroU64::new(10_000).unwrap(),
            },
        )
    }

    fn synthetic(glacier: &SimulatedGlacier, vault: &str) -> Vec<String> {
        glacier.archives(vault).unwrap()
    }

    fn progress_lines(reporter: &RecordingReporter) -> usize {
        reporter.count(|e| matches!(e, ProgressEvent::Progress { .. }))
    }

    fn pauses(reporter: &RecordingReporter) -> usize {
        reporter.count(|e| matches!(e, ProgressEvent::Throttled { .. }))
    }

    #[tokio::test]
    async fn deletes_in_inventory_order() {
        let glacier = Arc::new(SimulatedGlacier::new().with_vault("v", ["a1", "a2", "a3"]));
        let reporter = Arc::new(RecordingReporter::default());
        let ids: Vec<String> = vec!["a1".into(), "a2".into(), "a3".into()];

        let tally = engine(glacier.clone(), reporter)
            .delete_all("v", &ids, &CancellationToken::new())
            .await;

        let deletes: Vec<String> = glacier
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                GlacierCall::DeleteArchive { archive_id, .. } => Some(archive_id),
                _ => None,
            })
            .collect();
        assert_eq!(deletes, vec!["a1", "a2", "a3"]);
        assert_eq!(
            tally,
            DeletionTally {
                processed: 3,
                succeeded: 3,
                failed: 0,
                interrupted: false
            }
        );
        assert!(tally.is_clean(3));
    }

    #[tokio::test]
    async fn failures_are_counted_and_the_batch_continues() {
        let glacier = Arc::new(SimulatedGlacier::new().with_vault("v", ["a1", "a2", "a3", "a4"]));
        glacier.fail_archive("a2");
        let reporter = Arc::new(RecordingReporter::default());
        // a5 is not in the vault at all
        let ids: Vec<String> = ["a1", "a2", "a3", "a5", "a4"].map(String::from).to_vec();

        let tally = engine(glacier.clone(), reporter.clone())
            .delete_all("v", &ids, &CancellationToken::new())
            .await;

        assert_eq!(tally.processed, 5);
        assert_eq!(tally.succeeded, 3);
        assert_eq!(tally.failed, 2);
        assert_eq!(tally.succeeded + tally.failed, tally.processed);
        assert!(!tally.is_clean(5));
        assert_eq!(glacier.archives("v").unwrap(), vec!["a2"]);

        let failed_indexes: Vec<u64> = reporter
            .events()
            .into_iter()
            .filter_map(|e| match e {
                ProgressEvent::ArchiveDeleteFailed { index, .. } => Some(index),
                _ => None,
            })
            .collect();
        assert_eq!(failed_indexes, vec![1, 3]);
    }

    #[tokio::test]
    async fn counters_add_up_for_any_length() {
        for n in [0usize, 1, 99, 100, 101, 357] {
            let glacier = Arc::new(SimulatedGlacier::new().with_synthetic_vault("v", n));
            let ids = synthetic(&glacier, "v");
            for id in ids.iter().step_by(7) {
                glacier.fail_archive(id);
            }
            let reporter = Arc::new(RecordingReporter::default());

            let tally = engine(glacier, reporter.clone())
                .delete_all("v", &ids, &CancellationToken::new())
                .await;

            assert_eq!(tally.processed, n as u64);
            assert_eq!(tally.succeeded + tally.failed, n as u64);
            assert_eq!(tally.failed, n.div_ceil(7) as u64);
            assert_eq!(pauses(&reporter), n / 100);
        }
    }

    #[tokio::test]
    async fn progress_is_logged_on_multiples_of_cadence() {
        for (n, expected) in [(9_999usize, 0usize), (10_000, 1), (10_001, 1), (20_000, 2)] {
            let glacier = Arc::new(SimulatedGlacier::new().with_synthetic_vault("v", n));
            let ids = synthetic(&glacier, "v");
            let reporter = Arc::new(RecordingReporter::default());

            engine(glacier, reporter.clone())
                .delete_all("v", &ids, &CancellationToken::new())
                .await;

            assert_eq!(progress_lines(&reporter), expected, "n = {n}");
        }
    }

    #[tokio::test]
    async fn throttle_pauses_every_hundred() {
        let glacier = Arc::new(SimulatedGlacier::new().with_synthetic_vault("v", 250));
        let ids = synthetic(&glacier, "v");
        let reporter = Arc::new(RecordingReporter::default());

        engine(glacier, reporter.clone())
            .delete_all("v", &ids, &CancellationToken::new())
            .await;

        let at: Vec<u64> = reporter
            .events()
            .into_iter()
            .filter_map(|e| match e {
                ProgressEvent::Throttled { processed, .. } => Some(processed),
                _ => None,
            })
            .collect();
        assert_eq!(at, vec![100, 200]);
    }

    #[test]
    fn zero_cadences_are_rejected() {
        assert!(ThrottleSettings::new(0, Duration::ZERO, 10_000).is_none());
        assert!(ThrottleSettings::new(100, Duration::ZERO, 0).is_none());

        let settings = ThrottleSettings::new(100, Duration::from_secs(1), 10_000).unwrap();
        assert_eq!(settings, ThrottleSettings::default());
    }

    #[tokio::test]
    async fn cancellation_stops_at_the_next_pause() {
        let glacier = Arc::new(SimulatedGlacier::new().with_synthetic_vault("v", 250));
        let ids = synthetic(&glacier, "v");
        let reporter = Arc::new(RecordingReporter::default());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let engine = DeletionEngine::new(
            glacier.clone(),
            reporter,
            ThrottleSettings {
                pause_every: NonZeroU64::new(100).unwrap(),
                pause: Duration::from_secs(60),
                progress_every: NonZeroU64::new(10_000).unwrap(),
            },
        );
        let tally = engine.delete_all("v", &ids, &cancel).await;

        assert!(tally.interrupted);
        assert_eq!(tally.processed, 100);
        assert_eq!(tally.succeeded + tally.failed, tally.processed);
        assert_eq!(glacier.archives("v").unwrap().len(), 150);
        assert!(!tally.is_clean(250));
    }
}
