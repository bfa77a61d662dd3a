use std::path::PathBuf;
use std::time::Duration;

use crate::core::glacier::ClientError;

/// Failures that end the drain of a whole vault, or the whole run for `VaultList`.
///
/// Failures scoped to a single archive never show up here; they are recorded as
/// `DeletionOutcome::Failed` and the batch carries on.
#[derive(Debug, thiserror::Error)]
pub enum DrainError {
    #[error("cannot read vault list {}: {source}", path.display())]
    VaultList {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("vault {0} does not exist or could not be described")]
    VaultNotFound(String),

    #[error("failed to submit inventory job for vault {vault}: {source}")]
    JobSubmission {
        vault: String,
        #[source]
        source: ClientError,
    },

    #[error("failed to poll inventory job {job_id} for vault {vault}: {source}")]
    JobPolling {
        vault: String,
        job_id: String,
        #[source]
        source: ClientError,
    },

    #[error("inventory job {job_id} for vault {vault} failed: {message}")]
    JobFailed {
        vault: String,
        job_id: String,
        message: String,
    },

    #[error("inventory job {job_id} for vault {vault} still incomplete after {waited:?}")]
    PollDeadlineExceeded {
        vault: String,
        job_id: String,
        waited: Duration,
    },

    #[error("failed to fetch inventory output for job {job_id}: {source}")]
    InventoryFetch {
        job_id: String,
        #[source]
        source: ClientError,
    },

    #[error("failed to decode inventory payload: {0}")]
    InventoryDecode(#[from] serde_json::Error),

    #[error("drain of vault {0} was cancelled")]
    Cancelled(String),
}

impl DrainError {
    /// Short status label stored in the drain ledger.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::VaultList { .. } => "VaultList",
            Self::VaultNotFound(_) => "VaultNotFound",
            Self::JobSubmission { .. } => "JobSubmission",
            Self::JobPolling { .. } => "JobPolling",
            Self::JobFailed { .. } => "JobFailed",
            Self::PollDeadlineExceeded { .. } => "PollDeadlineExceeded",
            Self::InventoryFetch { .. } => "InventoryFetch",
            Self::InventoryDecode(_) => "InventoryDecode",
            Self::Cancelled(_) => "Cancelled",
        }
    }
}
