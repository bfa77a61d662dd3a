//! Progress narration and the end-of-drain report.
//!
//! Workflow components never log on their own. They are handed a [`ProgressReporter`]
//! when constructed and describe what happens through [`ProgressEvent`]s. The binary
//! wires in [`TracingReporter`], which renders events through `tracing`.

use chrono::{DateTime, Local};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Summary of one vault drain.
#[derive(Debug, Clone, PartialEq)]
pub struct DrainReport {
    pub drain_id: String,
    pub vault_name: String,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    /// Archives actually processed (attempted), successful or not.
    pub archives_processed: u64,
    pub succeeded: u64,
    pub failed: u64,
    /// Wall-clock time for the whole drain.
    pub elapsed: Duration,
    /// Time from the start of the drain until the inventory job completed.
    pub inventory_elapsed: Duration,
    pub vault_deleted: bool,
    /// The deletion loop stopped early because the run was cancelled.
    pub interrupted: bool,
}

impl DrainReport {
    pub fn archives_per_second(&self) -> f64 {
        archives_per_second(self.archives_processed, self.elapsed)
    }

    /// Time spent outside the inventory job, mostly issuing deletes.
    pub fn deletion_elapsed(&self) -> Duration {
        self.elapsed.saturating_sub(self.inventory_elapsed)
    }
}

/// Deletion throughput. A zero elapsed time reports 0.0 rather than dividing by zero.
pub fn archives_per_second(archives: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        archives as f64 / secs
    } else {
        0.0
    }
}

/// Render a duration as `1h02m03.456s`.
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    let millis = duration.subsec_millis();
    format!("{hours}h{minutes:02}m{seconds:02}.{millis:03}s")
}

/// Things worth telling an operator while a vault drains.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    DrainStarted {
        vault: String,
        started_at: DateTime<Local>,
    },
    VaultMissing {
        vault: String,
    },
    VaultCheckFailed {
        vault: String,
        error: String,
    },
    JobSubmitted {
        vault: String,
        job_id: String,
    },
    JobResumed {
        vault: String,
        job_id: String,
    },
    JobPolled {
        vault: String,
        job_id: String,
        completed: bool,
    },
    InventoryLoaded {
        vault: String,
        archive_count: usize,
    },
    ArchiveDeleted {
        index: u64,
        archive_id: String,
    },
    ArchiveDeleteFailed {
        index: u64,
        archive_id: String,
        reason: String,
    },
    Progress {
        vault: String,
        processed: u64,
    },
    Throttled {
        vault: String,
        processed: u64,
        pause: Duration,
    },
    VaultDeleted {
        vault: String,
    },
    VaultDeleteFailed {
        vault: String,
        error: String,
    },
    DrainFinished(DrainReport),
}

pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// Reporter writing events to the process log sink.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ProgressReporter for TracingReporter {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::DrainStarted { vault, started_at } => {
                info!("#######################################################################################");
                info!(vault = %vault, started_at = %started_at, "Starting process to delete archives and vault");
            }
            ProgressEvent::VaultMissing { vault } => {
                error!(vault = %vault, "Vault does not exist, skipping");
            }
            ProgressEvent::VaultCheckFailed { vault, error } => {
                error!(vault = %vault, error = %error, "Error checking vault existence");
            }
            ProgressEvent::JobSubmitted { vault, job_id } => {
                info!(vault = %vault, job_id = %job_id, "Inventory retrieval job submitted");
            }
            ProgressEvent::JobResumed { vault, job_id } => {
                info!(vault = %vault, job_id = %job_id, "Resuming earlier inventory retrieval job");
            }
            ProgressEvent::JobPolled {
                vault,
                job_id,
                completed,
            } => {
                info!(
                    vault = %vault,
                    job_id = %job_id,
                    completed,
                    "Checking job status as of {}",
                    Local::now()
                );
            }
            ProgressEvent::InventoryLoaded {
                vault,
                archive_count,
            } => {
                info!(vault = %vault, archive_count, "Inventory retrieved, processing deletions");
            }
            ProgressEvent::ArchiveDeleted { index, archive_id } => {
                debug!(index, archive_id = %archive_id, "Delete SUCCEEDED");
            }
            ProgressEvent::ArchiveDeleteFailed {
                index,
                archive_id,
                reason,
            } => {
                error!(index, archive_id = %archive_id, reason = %reason, "Delete FAILED");
            }
            ProgressEvent::Progress { vault, processed } => {
                info!(vault = %vault, processed, "Progress: {} processed as of {}", processed, Local::now());
            }
            ProgressEvent::Throttled {
                vault,
                processed,
                pause,
            } => {
                debug!(vault = %vault, processed, pause_ms = pause.as_millis() as u64, "Pausing to stay under request rate");
            }
            ProgressEvent::VaultDeleted { vault } => {
                info!(vault = %vault, "Vault deleted");
            }
            ProgressEvent::VaultDeleteFailed { vault, error } => {
                warn!(vault = %vault, error = %error, "Vault could not be deleted yet");
            }
            ProgressEvent::DrainFinished(report) => {
                info!(vault = %report.vault_name, "Total Archives: {}", report.archives_processed);
                info!(vault = %report.vault_name, "Total SUCCESS: {}", report.succeeded);
                info!(vault = %report.vault_name, "Total FAIL: {}", report.failed);
                info!(
                    drain_id = %report.drain_id,
                    vault = %report.vault_name,
                    interrupted = report.interrupted,
                    vault_deleted = report.vault_deleted,
                    "Elapsed time for {} containing {} archives was {} including Glacier job time of {} (deleting: {}). Deletion rate: {:.4} archives/second.",
                    report.vault_name,
                    report.archives_processed,
                    format_duration(report.elapsed),
                    format_duration(report.inventory_elapsed),
                    format_duration(report.deletion_elapsed()),
                    report.archives_per_second()
                );
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn report(processed: u64, elapsed: Duration, inventory: Duration) -> DrainReport {
        let now = Local::now();
        DrainReport {
            drain_id: "drain-1".to_string(),
            vault_name: "photos".to_string(),
            started_at: now,
            finished_at: now,
            archives_processed: processed,
            succeeded: processed,
            failed: 0,
            elapsed,
            inventory_elapsed: inventory,
            vault_deleted: false,
            interrupted: false,
        }
    }

    #[test]
    fn zero_elapsed_yields_zero_rate() {
        assert_eq!(archives_per_second(500, Duration::ZERO), 0.0);
        assert_eq!(report(0, Duration::ZERO, Duration::ZERO).archives_per_second(), 0.0);
    }

    #[test]
    fn rate_is_archives_over_seconds() {
        let r = report(1_000, Duration::from_secs(250), Duration::from_secs(200));
        assert!((r.archives_per_second() - 4.0).abs() < f64::EPSILON);
        assert_eq!(r.deletion_elapsed(), Duration::from_secs(50));
    }

    #[test]
    fn deletion_elapsed_never_underflows() {
        let r = report(1, Duration::from_secs(1), Duration::from_secs(2));
        assert_eq!(r.deletion_elapsed(), Duration::ZERO);
    }

    #[test]
    fn durations_are_human_readable() {
        assert_eq!(format_duration(Duration::ZERO), "0h00m00.000s");
        assert_eq!(
            format_duration(Duration::from_millis(3_723_456)),
            "1h02m03.456s"
        );
        assert_eq!(format_duration(Duration::from_secs(30 * 3600)), "30h00m00.000s");
    }
}
