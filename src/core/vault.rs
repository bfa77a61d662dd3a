use crate::core::glacier::GlacierClient;
use crate::core::report::{ProgressEvent, ProgressReporter};

/// Whether `vault` can be drained.
///
/// Any error other than "not found" is reported and also answers `false`: a
/// multi-hour drain is never started against a vault in an unknown state.
pub async fn vault_exists(
    client: &dyn GlacierClient,
    reporter: &dyn ProgressReporter,
    vault: &str,
) -> bool {
    match client.describe_vault(vault).await {
        Ok(()) => true,
        Err(e) if e.is_not_found() => false,
        Err(e) => {
            reporter.report(ProgressEvent::VaultCheckFailed {
                vault: vault.to_string(),
                error: e.to_string(),
            });
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::simulated::SimulatedGlacier;
    use crate::core::glacier::ClientError;
    use crate::core::report::testing::RecordingReporter;

    #[tokio::test]
    async fn existing_vault_is_found() {
        let glacier = SimulatedGlacier::new().with_vault("photos", ["a1"]);
        let reporter = RecordingReporter::default();

        assert!(vault_exists(&glacier, &reporter, "photos").await);
        assert!(reporter.events().is_empty());
    }

    #[tokio::test]
    async fn missing_vault_is_not_an_error_event() {
        let glacier = SimulatedGlacier::new();
        let reporter = RecordingReporter::default();

        assert!(!vault_exists(&glacier, &reporter, "photos").await);
        assert!(reporter.events().is_empty());
    }

    #[tokio::test]
    async fn unexpected_errors_are_reported_and_treated_as_missing() {
        let glacier = SimulatedGlacier::new().with_vault("photos", ["a1"]);
        glacier.fail_describe_vault(ClientError::Service {
            code: "AccessDeniedException".to_string(),
            message: "not authorized".to_string(),
        });
        let reporter = RecordingReporter::default();

        assert!(!vault_exists(&glacier, &reporter, "photos").await);
        assert_eq!(
            reporter.count(|e| matches!(e, ProgressEvent::VaultCheckFailed { .. })),
            1
        );
    }
}
