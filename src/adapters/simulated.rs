use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;

use crate::core::glacier::{ClientError, GlacierClient, JobDescription, JobStatus};

/// A request the simulator received, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GlacierCall {
    DescribeVault { vault: String },
    InitiateJob { vault: String },
    DescribeJob { job_id: String },
    GetJobOutput { job_id: String, range: String },
    DeleteArchive { vault: String, archive_id: String },
    DeleteVault { vault: String },
}

struct SimulatedVault {
    /// Upload order, which is also inventory order.
    archives: Vec<String>,
    live: HashSet<String>,
}

impl SimulatedVault {
    fn new(archives: Vec<String>) -> Self {
        let live = archives.iter().cloned().collect();
        Self { archives, live }
    }

    fn remaining(&self) -> Vec<String> {
        self.archives
            .iter()
            .filter(|id| self.live.contains(*id))
            .cloned()
            .collect()
    }
}

struct SimulatedJob {
    vault: String,
    /// Inventory as of job submission; later deletes do not show up in it.
    snapshot: Vec<String>,
    polls_remaining: u32,
    fails: bool,
}

#[derive(Default)]
struct State {
    vaults: BTreeMap<String, SimulatedVault>,
    jobs: HashMap<String, SimulatedJob>,
    failing_archives: HashSet<String>,
    describe_vault_error: Option<ClientError>,
    polls_until_complete: u32,
    fail_jobs: bool,
    next_job: u64,
    calls: Vec<GlacierCall>,
}

/// In-memory stand-in for the storage tier.
///
/// Jobs complete after a configurable number of status polls (immediately by
/// default) and individual archives can be made to fail on delete.
#[derive(Default)]
pub struct SimulatedGlacier {
    state: Mutex<State>,
}

impl SimulatedGlacier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vault<I, S>(mut self, name: &str, archives: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let archives = archives.into_iter().map(Into::into).collect();
        self.state
            .get_mut()
            .unwrap_or_else(|e| e.into_inner())
            .vaults
            .insert(name.to_string(), SimulatedVault::new(archives));
        self
    }

    /// Add a vault holding `count` generated archive ids.
    pub fn with_synthetic_vault(self, name: &str, count: usize) -> Self {
        let archives: Vec<String> = (0..count)
            .map(|i| format!("{name}-archive-{i:08}"))
            .collect();
        self.with_vault(name, archives)
    }

    pub fn fail_archive(&self, archive_id: &str) {
        self.lock().failing_archives.insert(archive_id.to_string());
    }

    pub fn fail_describe_vault(&self, error: ClientError) {
        self.lock().describe_vault_error = Some(error);
    }

    /// Jobs submitted from now on report incomplete for `polls` status checks.
    pub fn set_polls_until_complete(&self, polls: u32) {
        self.lock().polls_until_complete = polls;
    }

    /// Jobs submitted from now on complete with a failed status.
    pub fn fail_jobs(&self) {
        self.lock().fail_jobs = true;
    }

    /// Forget every job, as the service does once job output expires.
    pub fn expire_jobs(&self) {
        self.lock().jobs.clear();
    }

    /// Let every outstanding job complete at its next status check.
    pub fn complete_jobs(&self) {
        for job in self.lock().jobs.values_mut() {
            job.polls_remaining = 0;
        }
    }

    pub fn calls(&self) -> Vec<GlacierCall> {
        self.lock().calls.clone()
    }

    pub fn count_calls(&self, predicate: impl Fn(&GlacierCall) -> bool) -> usize {
        self.lock().calls.iter().filter(|c| predicate(c)).count()
    }

    /// Archives still stored in `vault`, or `None` when the vault is gone.
    pub fn archives(&self, vault: &str) -> Option<Vec<String>> {
        self.lock().vaults.get(vault).map(SimulatedVault::remaining)
    }

    pub fn has_vault(&self, vault: &str) -> bool {
        self.lock().vaults.contains_key(vault)
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn not_found(what: impl std::fmt::Display) -> ClientError {
    ClientError::NotFound(what.to_string())
}

/// Start offset of a `bytes=START-[END]` range.
fn range_start(range: &str) -> Result<usize, ClientError> {
    range
        .strip_prefix("bytes=")
        .and_then(|r| r.split('-').next())
        .and_then(|start| start.parse().ok())
        .ok_or_else(|| ClientError::Service {
            code: "InvalidParameterValueException".to_string(),
            message: format!("invalid range: {range}"),
        })
}

fn inventory_payload(vault: &str, archives: &[String]) -> Vec<u8> {
    let created = Utc::now().to_rfc3339();
    let list: Vec<_> = archives
        .iter()
        .map(|id| {
            json!({
                "ArchiveId": id,
                "ArchiveDescription": "",
                "CreationDate": created,
                "Size": 1024,
                "SHA256TreeHash": "0000000000000000000000000000000000000000000000000000000000000000"
            })
        })
        .collect();

    json!({
        "VaultARN": format!("arn:aws:glacier:us-east-1:000000000000:vaults/{vault}"),
        "InventoryDate": created,
        "ArchiveList": list
    })
    .to_string()
    .into_bytes()
}

#[async_trait]
impl GlacierClient for SimulatedGlacier {
    async fn describe_vault(&self, vault: &str) -> Result<(), ClientError> {
        let mut state = self.lock();
        state.calls.push(GlacierCall::DescribeVault {
            vault: vault.to_string(),
        });

        if let Some(err) = state.describe_vault_error.clone() {
            return Err(err);
        }
        if state.vaults.contains_key(vault) {
            Ok(())
        } else {
            Err(not_found(format_args!("vault {vault}")))
        }
    }

    async fn initiate_inventory_job(&self, vault: &str) -> Result<String, ClientError> {
        let mut state = self.lock();
        state.calls.push(GlacierCall::InitiateJob {
            vault: vault.to_string(),
        });

        let snapshot = state
            .vaults
            .get(vault)
            .map(SimulatedVault::remaining)
            .ok_or_else(|| not_found(format_args!("vault {vault}")))?;

        state.next_job += 1;
        let job_id = format!("sim-job-{:04}", state.next_job);
        let job = SimulatedJob {
            vault: vault.to_string(),
            snapshot,
            polls_remaining: state.polls_until_complete,
            fails: state.fail_jobs,
        };
        state.jobs.insert(job_id.clone(), job);
        Ok(job_id)
    }

    async fn describe_job(&self, vault: &str, job_id: &str) -> Result<JobDescription, ClientError> {
        let mut state = self.lock();
        state.calls.push(GlacierCall::DescribeJob {
            job_id: job_id.to_string(),
        });

        let job = state
            .jobs
            .get_mut(job_id)
            .filter(|job| job.vault == vault)
            .ok_or_else(|| not_found(format_args!("job {job_id}")))?;

        if job.polls_remaining > 0 {
            job.polls_remaining -= 1;
            return Ok(JobDescription {
                completed: false,
                status: JobStatus::InProgress,
                status_message: None,
            });
        }

        Ok(if job.fails {
            JobDescription {
                completed: true,
                status: JobStatus::Failed,
                status_message: Some("Inventory is not yet available".to_string()),
            }
        } else {
            JobDescription {
                completed: true,
                status: JobStatus::Succeeded,
                status_message: Some("Succeeded".to_string()),
            }
        })
    }

    async fn get_job_output(
        &self,
        vault: &str,
        job_id: &str,
        range: &str,
    ) -> Result<Vec<u8>, ClientError> {
        let mut state = self.lock();
        state.calls.push(GlacierCall::GetJobOutput {
            job_id: job_id.to_string(),
            range: range.to_string(),
        });

        let start = range_start(range)?;
        let job = state
            .jobs
            .get(job_id)
            .filter(|job| job.vault == vault)
            .ok_or_else(|| not_found(format_args!("job {job_id}")))?;

        if job.polls_remaining > 0 || job.fails {
            return Err(ClientError::Service {
                code: "InvalidParameterValueException".to_string(),
                message: format!("job {job_id} has no output"),
            });
        }

        let payload = inventory_payload(vault, &job.snapshot);
        Ok(payload.get(start..).unwrap_or_default().to_vec())
    }

    async fn delete_archive(&self, vault: &str, archive_id: &str) -> Result<(), ClientError> {
        let mut state = self.lock();
        state.calls.push(GlacierCall::DeleteArchive {
            vault: vault.to_string(),
            archive_id: archive_id.to_string(),
        });

        if state.failing_archives.contains(archive_id) {
            return Err(ClientError::Service {
                code: "RequestTimeoutException".to_string(),
                message: format!("timed out deleting {archive_id}"),
            });
        }

        let stored = state
            .vaults
            .get_mut(vault)
            .ok_or_else(|| not_found(format_args!("vault {vault}")))?;

        if stored.live.remove(archive_id) {
            Ok(())
        } else {
            Err(not_found(format_args!("archive {archive_id}")))
        }
    }

    async fn delete_vault(&self, vault: &str) -> Result<(), ClientError> {
        let mut state = self.lock();
        state.calls.push(GlacierCall::DeleteVault {
            vault: vault.to_string(),
        });

        let stored = state
            .vaults
            .get(vault)
            .ok_or_else(|| not_found(format_args!("vault {vault}")))?;

        if !stored.live.is_empty() {
            return Err(ClientError::Service {
                code: "InvalidParameterValueException".to_string(),
                message: "Vault not empty or recently inventoried".to_string(),
            });
        }

        state.vaults.remove(vault);
        Ok(())
    }
}
