pub mod deletion;
pub mod glacier;
pub mod inventory;
pub mod models;
pub mod notifications;
pub mod orchestrator;
pub mod report;
pub mod vault;

pub use deletion::{DeletionEngine, DeletionOutcome, DeletionTally, ThrottleSettings};
pub use glacier::{ClientError, GlacierClient, JobDescription, JobStatus};
pub use inventory::{ArchiveRecord, Inventory, InventoryCoordinator, PollSettings};
pub use models::{DrainRecord, DrainStatus};
pub use orchestrator::{Orchestrator, RunSummary};
pub use report::{DrainReport, ProgressEvent, ProgressReporter, TracingReporter};
pub use vault::vault_exists;
