use glacier_drain::adapters;
use glacier_drain::config::AppConfig;
use glacier_drain::core::inventory::FULL_OUTPUT_RANGE;
use glacier_drain::core::{GlacierClient, Inventory};

fn simulation_config() -> AppConfig {
    AppConfig {
        simulation: true,
        ..AppConfig::default()
    }
}

#[tokio::test]
async fn simulation_seeds_listed_vaults() {
    let vaults = vec!["alpha".to_string(), "beta".to_string()];
    let client = adapters::get_client(&simulation_config(), &vaults).await;

    client.describe_vault("alpha").await.unwrap();
    client.describe_vault("beta").await.unwrap();
    let err = client.describe_vault("gamma").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn simulated_inventory_decodes() {
    let vaults = vec!["alpha".to_string()];
    let client = adapters::get_client(&simulation_config(), &vaults).await;

    let job_id = client.initiate_inventory_job("alpha").await.unwrap();
    let job = client.describe_job("alpha", &job_id).await.unwrap();
    assert!(job.completed);

    let payload = client
        .get_job_output("alpha", &job_id, FULL_OUTPUT_RANGE)
        .await
        .unwrap();
    let inventory = Inventory::parse(&payload).unwrap();

    assert_eq!(inventory.archive_list.len(), 250);
    assert!(inventory.vault_arn.unwrap().ends_with("vaults/alpha"));
    assert_eq!(inventory.archive_list[0].archive_id, "alpha-archive-00000000");
}

#[tokio::test]
async fn unknown_job_is_not_found() {
    let vaults = vec!["alpha".to_string()];
    let client = adapters::get_client(&simulation_config(), &vaults).await;

    let err = client.describe_job("alpha", "no-such-job").await.unwrap_err();
    assert!(err.is_not_found());
}
