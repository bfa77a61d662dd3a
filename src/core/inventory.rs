//! Inventory retrieval through the storage tier's asynchronous job protocol.
//!
//! Listing a vault is never synchronous: a retrieval job is submitted, polled until
//! the service marks it complete (typically hours later), and its output is then
//! downloaded in one piece and decoded.

use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::core::glacier::{GlacierClient, JobStatus};
use crate::core::report::{ProgressEvent, ProgressReporter};
use crate::error::DrainError;

/// Byte range covering the whole job output.
pub const FULL_OUTPUT_RANGE: &str = "bytes=0-";

/// Decoded inventory-retrieval output.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Inventory {
    #[serde(rename = "VaultARN", default)]
    pub vault_arn: Option<String>,
    #[serde(default)]
    pub inventory_date: Option<String>,
    pub archive_list: Vec<ArchiveRecord>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ArchiveRecord {
    pub archive_id: String,
    #[serde(default)]
    pub archive_description: Option<String>,
    #[serde(default)]
    pub creation_date: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

impl Inventory {
    pub fn parse(payload: &[u8]) -> Result<Self, DrainError> {
        Ok(serde_json::from_slice(payload)?)
    }

    /// Archive ids in the order the service listed them.
    pub fn archive_ids(&self) -> Vec<String> {
        self.archive_list
            .iter()
            .map(|a| a.archive_id.clone())
            .collect()
    }

    pub fn total_size(&self) -> u64 {
        self.archive_list.iter().filter_map(|a| a.size).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    /// `None` polls until the job completes, however long that takes.
    pub max_wait: Option<Duration>,
}

pub struct InventoryCoordinator {
    client: Arc<dyn GlacierClient>,
    reporter: Arc<dyn ProgressReporter>,
    poll: PollSettings,
}

impl InventoryCoordinator {
    pub fn new(
        client: Arc<dyn GlacierClient>,
        reporter: Arc<dyn ProgressReporter>,
        poll: PollSettings,
    ) -> Self {
        Self {
            client,
            reporter,
            poll,
        }
    }

    pub async fn submit(&self, vault: &str) -> Result<String, DrainError> {
        let job_id = self
            .client
            .initiate_inventory_job(vault)
            .await
            .map_err(|source| DrainError::JobSubmission {
                vault: vault.to_string(),
                source,
            })?;

        self.reporter.report(ProgressEvent::JobSubmitted {
            vault: vault.to_string(),
            job_id: job_id.clone(),
        });
        Ok(job_id)
    }

    /// Whether an earlier job is still known to the service and can be reused.
    pub async fn can_resume(&self, vault: &str, job_id: &str) -> Result<bool, DrainError> {
        match self.client.describe_job(vault, job_id).await {
            Ok(description) if description.status == JobStatus::Failed => Ok(false),
            Ok(_) => {
                self.reporter.report(ProgressEvent::JobResumed {
                    vault: vault.to_string(),
                    job_id: job_id.to_string(),
                });
                Ok(true)
            }
            Err(e) if e.is_not_found() => Ok(false),
            Err(source) => Err(DrainError::JobPolling {
                vault: vault.to_string(),
                job_id: job_id.to_string(),
                source,
            }),
        }
    }

    /// Poll until the job completes, sleeping `interval` between checks.
    ///
    /// Cancellation is honored while sleeping. With a `max_wait`, the last sleep is
    /// clipped to the deadline and one final check is made before giving up.
    pub async fn wait_for_completion(
        &self,
        vault: &str,
        job_id: &str,
        cancel: &CancellationToken,
    ) -> Result<(), DrainError> {
        let started = Instant::now();

        loop {
            let description = self.client.describe_job(vault, job_id).await.map_err(|source| {
                DrainError::JobPolling {
                    vault: vault.to_string(),
                    job_id: job_id.to_string(),
                    source,
                }
            })?;

            self.reporter.report(ProgressEvent::JobPolled {
                vault: vault.to_string(),
                job_id: job_id.to_string(),
                completed: description.completed,
            });

            if description.completed {
                if description.status == JobStatus::Failed {
                    return Err(DrainError::JobFailed {
                        vault: vault.to_string(),
                        job_id: job_id.to_string(),
                        message: description
                            .status_message
                            .unwrap_or_else(|| "no status message".to_string()),
                    });
                }
                return Ok(());
            }

            let mut pause = self.poll.interval;
            if let Some(max_wait) = self.poll.max_wait {
                let waited = started.elapsed();
                if waited >= max_wait {
                    return Err(DrainError::PollDeadlineExceeded {
                        vault: vault.to_string(),
                        job_id: job_id.to_string(),
                        waited,
                    });
                }
                pause = pause.min(max_wait - waited);
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(DrainError::Cancelled(vault.to_string())),
                _ = tokio::time::sleep(pause) => {}
            }
        }
    }

    pub async fn fetch(&self, vault: &str, job_id: &str) -> Result<Inventory, DrainError> {
        let payload = self
            .client
            .get_job_output(vault, job_id, FULL_OUTPUT_RANGE)
            .await
            .map_err(|source| DrainError::InventoryFetch {
                job_id: job_id.to_string(),
                source,
            })?;

        let inventory = Inventory::parse(&payload)?;
        self.reporter.report(ProgressEvent::InventoryLoaded {
            vault: vault.to_string(),
            archive_count: inventory.archive_list.len(),
        });
        Ok(inventory)
    }
}
