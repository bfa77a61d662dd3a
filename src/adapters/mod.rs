use std::sync::Arc;

use crate::config::AppConfig;
use crate::core::glacier::GlacierClient;

pub mod aws;
pub mod simulated;

pub use simulated::{GlacierCall, SimulatedGlacier};

/// Archives generated for each listed vault in simulation mode.
const SIMULATED_ARCHIVES_PER_VAULT: usize = 250;

pub async fn get_client(config: &AppConfig, vaults: &[String]) -> Arc<dyn GlacierClient> {
    if config.simulation {
        let glacier = vaults.iter().fold(SimulatedGlacier::new(), |glacier, vault| {
            glacier.with_synthetic_vault(vault, SIMULATED_ARCHIVES_PER_VAULT)
        });
        return Arc::new(glacier);
    }

    Arc::new(aws::AwsGlacierClient::new(&config.region, &config.account_id).await)
}
