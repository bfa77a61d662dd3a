/// Lifecycle of a drain as recorded in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainStatus {
    Started,
    Skipped,
    InventoryRequested,
    Deleting,
    Complete,
    /// Deletion stopped early by cancellation. Some archives remain.
    Interrupted,
    Failed,
}

impl DrainStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Started => "Started",
            Self::Skipped => "Skipped",
            Self::InventoryRequested => "InventoryRequested",
            Self::Deleting => "Deleting",
            Self::Complete => "Complete",
            Self::Interrupted => "Interrupted",
            Self::Failed => "Failed",
        }
    }
}

/// A drain row joined with its latest status, as shown by `history`.
#[derive(Debug, Clone)]
pub struct DrainRecord {
    pub id: String,
    pub vault_name: String,
    pub job_id: Option<String>,
    pub archives_processed: Option<i64>,
    pub archives_succeeded: Option<i64>,
    pub archives_failed: Option<i64>,
    pub vault_deleted: bool,
    pub created_at: String,
    pub status: String,
}
