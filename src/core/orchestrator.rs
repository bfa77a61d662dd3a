use chrono::{DateTime, Local};
use std::path::Path;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::context::AppContext;
use crate::core::deletion::{DeletionEngine, ThrottleSettings};
use crate::core::inventory::{InventoryCoordinator, PollSettings};
use crate::core::models::DrainStatus;
use crate::core::notifications::DrainEvent;
use crate::core::report::{DrainReport, ProgressEvent};
use crate::core::vault::vault_exists;
use crate::db;
use crate::error::DrainError;
use crate::vault_list;

/// Outcome counts for a run over a vault list.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub drained: usize,
    pub skipped: usize,
    pub failed: usize,
    pub cancelled: bool,
}

/// Drains vaults one after another:
/// existence check → inventory job → deletion loop → optional vault delete → report.
pub struct Orchestrator {
    ctx: AppContext,
    coordinator: InventoryCoordinator,
    engine: DeletionEngine,
}

impl Orchestrator {
    pub fn new(ctx: AppContext) -> Self {
        let poll = PollSettings {
            interval: ctx.config.polling.interval(),
            max_wait: ctx.config.polling.max_wait(),
        };
        // AppConfig::validate rejects zero cadences before we get here.
        let throttle = ThrottleSettings::new(
            ctx.config.throttle.pause_every,
            ctx.config.throttle.pause(),
            ctx.config.throttle.progress_every,
        )
        .unwrap_or_default();

        Self {
            coordinator: InventoryCoordinator::new(ctx.client.clone(), ctx.reporter.clone(), poll),
            engine: DeletionEngine::new(ctx.client.clone(), ctx.reporter.clone(), throttle),
            ctx,
        }
    }

    /// Drain every vault named in the list at `path`. A missing or empty list is
    /// logged and nothing is contacted.
    pub async fn run_list(&self, path: &Path, cancel: &CancellationToken) -> RunSummary {
        match vault_list::load_for_run(path) {
            Some(vaults) => self.run(&vaults, cancel).await,
            None => RunSummary::default(),
        }
    }

    /// Drain every listed vault. A failing vault is logged and the next one started;
    /// nothing new is started once `cancel` fires.
    pub async fn run(&self, vaults: &[String], cancel: &CancellationToken) -> RunSummary {
        let mut summary = RunSummary::default();

        for vault in vaults {
            if cancel.is_cancelled() {
                warn!(vault = %vault, "Run cancelled, not starting remaining vaults");
                summary.cancelled = true;
                break;
            }

            info!(vault = %vault, "Processing vault");
            match self.drain_vault(vault, cancel).await {
                Ok(report) => {
                    summary.drained += 1;
                    summary.cancelled |= report.interrupted;
                }
                Err(DrainError::VaultNotFound(_)) => summary.skipped += 1,
                Err(e) => {
                    error!(vault = %vault, error = %e, "Drain aborted");
                    summary.failed += 1;
                    summary.cancelled |= matches!(e, DrainError::Cancelled(_));
                }
            }
        }

        info!(
            drained = summary.drained,
            skipped = summary.skipped,
            failed = summary.failed,
            cancelled = summary.cancelled,
            "Run finished"
        );
        summary
    }

    pub async fn drain_vault(
        &self,
        vault: &str,
        cancel: &CancellationToken,
    ) -> Result<DrainReport, DrainError> {
        let drain_id = Uuid::now_v7().to_string();
        let started_at = Local::now();
        let clock = Instant::now();

        self.ctx.reporter.report(ProgressEvent::DrainStarted {
            vault: vault.to_string(),
            started_at,
        });
        self.ledger(
            &drain_id,
            db::drains::create(&self.ctx.db, drain_id.clone(), vault.to_string()).await,
        );

        if !vault_exists(self.ctx.client.as_ref(), self.ctx.reporter.as_ref(), vault).await {
            self.ctx.reporter.report(ProgressEvent::VaultMissing {
                vault: vault.to_string(),
            });
            self.ledger(
                &drain_id,
                db::drains::update_status(
                    &self.ctx.db,
                    drain_id.clone(),
                    DrainStatus::Skipped,
                    Some("Vault does not exist".to_string()),
                )
                .await,
            );
            return Err(DrainError::VaultNotFound(vault.to_string()));
        }

        self.notify(DrainEvent::Started {
            drain_id: drain_id.clone(),
            vault: vault.to_string(),
        })
        .await;

        let result = self
            .drain_existing(&drain_id, vault, started_at, clock, cancel)
            .await;

        match &result {
            Ok(report) => {
                self.ledger(
                    &drain_id,
                    db::drains::record_result(&self.ctx.db, report).await,
                );
                self.notify(DrainEvent::Completed {
                    drain_id: drain_id.clone(),
                    vault: vault.to_string(),
                    archives: report.archives_processed,
                    failed: report.failed,
                    duration_secs: report.elapsed.as_secs(),
                    vault_deleted: report.vault_deleted,
                    interrupted: report.interrupted,
                })
                .await;
            }
            Err(e) => {
                self.ledger(
                    &drain_id,
                    db::drains::update_status(
                        &self.ctx.db,
                        drain_id.clone(),
                        DrainStatus::Failed,
                        Some(format!("{}: {}", e.kind(), e)),
                    )
                    .await,
                );
                self.notify(DrainEvent::Failed {
                    drain_id: drain_id.clone(),
                    vault: vault.to_string(),
                    error: e.to_string(),
                })
                .await;
            }
        }

        result
    }

    async fn drain_existing(
        &self,
        drain_id: &str,
        vault: &str,
        started_at: DateTime<Local>,
        clock: Instant,
        cancel: &CancellationToken,
    ) -> Result<DrainReport, DrainError> {
        let job_id = self.obtain_job(drain_id, vault).await?;
        self.coordinator
            .wait_for_completion(vault, &job_id, cancel)
            .await?;

        let inventory_elapsed = clock.elapsed();
        let inventory = self.coordinator.fetch(vault, &job_id).await?;
        let archive_ids = inventory.archive_ids();

        self.ledger(
            drain_id,
            db::drains::update_status(
                &self.ctx.db,
                drain_id.to_string(),
                DrainStatus::Deleting,
                Some(format!("{} archives", archive_ids.len())),
            )
            .await,
        );

        let tally = self.engine.delete_all(vault, &archive_ids, cancel).await;

        let vault_deleted =
            if self.ctx.config.delete_vault && tally.is_clean(archive_ids.len() as u64) {
                self.delete_vault(vault).await
            } else {
                false
            };

        let report = DrainReport {
            drain_id: drain_id.to_string(),
            vault_name: vault.to_string(),
            started_at,
            finished_at: Local::now(),
            archives_processed: tally.processed,
            succeeded: tally.succeeded,
            failed: tally.failed,
            elapsed: clock.elapsed(),
            inventory_elapsed,
            vault_deleted,
            interrupted: tally.interrupted,
        };
        self.ctx
            .reporter
            .report(ProgressEvent::DrainFinished(report.clone()));

        Ok(report)
    }

    /// Reuse a still-valid inventory job from an earlier, unfinished drain of this
    /// vault, or submit a new one.
    async fn obtain_job(&self, drain_id: &str, vault: &str) -> Result<String, DrainError> {
        let previous = match db::drains::find_resumable_job(&self.ctx.db, vault.to_string()).await
        {
            Ok(previous) => previous,
            Err(e) => {
                warn!(vault = %vault, error = %e, "Could not consult drain ledger");
                None
            }
        };

        let resumable = match previous {
            Some(job_id) => {
                if self.coordinator.can_resume(vault, &job_id).await? {
                    Some(job_id)
                } else {
                    None
                }
            }
            None => None,
        };

        let job_id = match resumable {
            Some(job_id) => job_id,
            None => self.coordinator.submit(vault).await?,
        };

        self.ledger(
            drain_id,
            db::drains::set_job(&self.ctx.db, drain_id.to_string(), job_id.clone()).await,
        );
        Ok(job_id)
    }

    async fn delete_vault(&self, vault: &str) -> bool {
        match self.ctx.client.delete_vault(vault).await {
            Ok(()) => {
                self.ctx.reporter.report(ProgressEvent::VaultDeleted {
                    vault: vault.to_string(),
                });
                true
            }
            Err(e) => {
                self.ctx.reporter.report(ProgressEvent::VaultDeleteFailed {
                    vault: vault.to_string(),
                    error: e.to_string(),
                });
                false
            }
        }
    }

    async fn notify(&self, event: DrainEvent) {
        if let Some(notifier) = &self.ctx.notifier {
            if let Err(e) = notifier.notify(event).await {
                warn!(error = %e, "Failed to send notification");
            }
        }
    }

    /// Ledger writes are bookkeeping; a failed write never stops a drain.
    fn ledger(&self, drain_id: &str, result: anyhow::Result<()>) {
        if let Err(e) = result {
            warn!(drain_id = %drain_id, error = %e, "Failed to update drain ledger");
        }
    }
}
