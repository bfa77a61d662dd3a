use async_trait::async_trait;

/// Service error code the storage tier uses for unknown vaults, jobs and archives.
pub const RESOURCE_NOT_FOUND: &str = "ResourceNotFoundException";

/// Failure of a single storage-tier request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    #[error("resource not found: {0}")]
    NotFound(String),
    #[error("{code}: {message}")]
    Service { code: String, message: String },
    #[error("request failed: {0}")]
    Transport(String),
}

impl ClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    InProgress,
    Succeeded,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "InProgress",
            Self::Succeeded => "Succeeded",
            Self::Failed => "Failed",
        }
    }
}

/// Snapshot of an asynchronous job as reported by the storage tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDescription {
    pub completed: bool,
    pub status: JobStatus,
    pub status_message: Option<String>,
}

/// Operations the drain workflow needs from the cold-storage service.
///
/// Implementations must be safe to share: a single client is reused for every
/// vault and every request in a run.
#[async_trait]
pub trait GlacierClient: Send + Sync {
    /// Succeeds when the vault exists. A missing vault is `ClientError::NotFound`.
    async fn describe_vault(&self, vault: &str) -> Result<(), ClientError>;

    /// Submit an inventory-retrieval job and return its job id.
    async fn initiate_inventory_job(&self, vault: &str) -> Result<String, ClientError>;

    async fn describe_job(&self, vault: &str, job_id: &str) -> Result<JobDescription, ClientError>;

    /// Fetch the output of a completed job. `range` is an HTTP byte range such as `bytes=0-`.
    async fn get_job_output(
        &self,
        vault: &str,
        job_id: &str,
        range: &str,
    ) -> Result<Vec<u8>, ClientError>;

    async fn delete_archive(&self, vault: &str, archive_id: &str) -> Result<(), ClientError>;

    /// Remove the vault itself. The service refuses while its inventory still lists archives.
    async fn delete_vault(&self, vault: &str) -> Result<(), ClientError>;
}
