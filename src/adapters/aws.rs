//! # Amazon S3 Glacier client
//!
//! Implements [`GlacierClient`] on top of the AWS SDK. Credentials come from the
//! default provider chain (environment, shared profile, instance/role metadata).

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_glacier::Client;
use aws_sdk_glacier::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_glacier::types::{JobParameters, StatusCode};
use tracing::{debug, info};

use crate::core::glacier::{
    ClientError, GlacierClient, JobDescription, JobStatus, RESOURCE_NOT_FOUND,
};

pub struct AwsGlacierClient {
    client: Client,
    account_id: String,
    region: String,
}

impl std::fmt::Debug for AwsGlacierClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsGlacierClient")
            .field("account_id", &self.account_id)
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}

impl AwsGlacierClient {
    pub async fn new(region: &str, account_id: &str) -> Self {
        info!(region = %region, account_id = %account_id, "Creating Glacier client");

        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_config::Region::new(region.to_string()))
            .load()
            .await;

        Self {
            client: Client::new(&sdk_config),
            account_id: account_id.to_string(),
            region: region.to_string(),
        }
    }
}

/// Map an SDK failure onto the workflow's error kinds.
fn classify<E, R>(err: SdkError<E, R>) -> ClientError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    match err.code() {
        Some(RESOURCE_NOT_FOUND) => {
            ClientError::NotFound(err.message().unwrap_or(RESOURCE_NOT_FOUND).to_string())
        }
        Some(code) => ClientError::Service {
            code: code.to_string(),
            message: err.message().unwrap_or_default().to_string(),
        },
        None => ClientError::Transport(DisplayErrorContext(&err).to_string()),
    }
}

#[async_trait]
impl GlacierClient for AwsGlacierClient {
    async fn describe_vault(&self, vault: &str) -> Result<(), ClientError> {
        let output = self
            .client
            .describe_vault()
            .account_id(&self.account_id)
            .vault_name(vault)
            .send()
            .await
            .map_err(classify)?;

        debug!(
            vault = %vault,
            archives = ?output.number_of_archives(),
            size_bytes = ?output.size_in_bytes(),
            last_inventory = output.last_inventory_date().unwrap_or("never"),
            "Described vault"
        );
        Ok(())
    }

    async fn initiate_inventory_job(&self, vault: &str) -> Result<String, ClientError> {
        let parameters = JobParameters::builder()
            .r#type("inventory-retrieval")
            .format("JSON")
            .build();

        let output = self
            .client
            .initiate_job()
            .account_id(&self.account_id)
            .vault_name(vault)
            .job_parameters(parameters)
            .send()
            .await
            .map_err(classify)?;

        output
            .job_id()
            .map(str::to_string)
            .ok_or_else(|| ClientError::Service {
                code: "MissingJobId".to_string(),
                message: format!("initiate-job for {vault} returned no job id"),
            })
    }

    async fn describe_job(&self, vault: &str, job_id: &str) -> Result<JobDescription, ClientError> {
        let output = self
            .client
            .describe_job()
            .account_id(&self.account_id)
            .vault_name(vault)
            .job_id(job_id)
            .send()
            .await
            .map_err(classify)?;

        let status = match output.status_code() {
            Some(StatusCode::Succeeded) => JobStatus::Succeeded,
            Some(StatusCode::Failed) => JobStatus::Failed,
            _ => JobStatus::InProgress,
        };

        Ok(JobDescription {
            completed: output.completed(),
            status,
            status_message: output.status_message().map(str::to_string),
        })
    }

    async fn get_job_output(
        &self,
        vault: &str,
        job_id: &str,
        range: &str,
    ) -> Result<Vec<u8>, ClientError> {
        let output = self
            .client
            .get_job_output()
            .account_id(&self.account_id)
            .vault_name(vault)
            .job_id(job_id)
            .range(range)
            .send()
            .await
            .map_err(classify)?;

        let body = output
            .body
            .collect()
            .await
            .map_err(|e| ClientError::Transport(format!("reading job output: {e}")))?;

        Ok(body.into_bytes().to_vec())
    }

    async fn delete_archive(&self, vault: &str, archive_id: &str) -> Result<(), ClientError> {
        self.client
            .delete_archive()
            .account_id(&self.account_id)
            .vault_name(vault)
            .archive_id(archive_id)
            .send()
            .await
            .map_err(classify)?;
        Ok(())
    }

    async fn delete_vault(&self, vault: &str) -> Result<(), ClientError> {
        self.client
            .delete_vault()
            .account_id(&self.account_id)
            .vault_name(vault)
            .send()
            .await
            .map_err(classify)?;
        Ok(())
    }
}
