mod slack;

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::config::{NotificationChannelType, NotificationConfig};

/// Events that trigger notifications
#[derive(Debug, Clone)]
pub enum DrainEvent {
    Started {
        drain_id: String,
        vault: String,
    },
    Completed {
        drain_id: String,
        vault: String,
        archives: u64,
        failed: u64,
        duration_secs: u64,
        vault_deleted: bool,
        /// Deletion was cancelled before every archive was processed.
        interrupted: bool,
    },
    Failed {
        drain_id: String,
        vault: String,
        error: String,
    },
}

/// Trait for notification channel implementations (Slack, Discord, etc.)
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    async fn notify(&self, event: DrainEvent) -> Result<()>;
}

/// Factory function to create a notifier based on config
pub fn create_notifier(config: &NotificationConfig) -> Option<Arc<dyn NotificationChannel>> {
    match &config.channel {
        NotificationChannelType::None => None,
        NotificationChannelType::Slack => {
            let webhook = config.slack_webhook.as_ref()?;
            if webhook.is_empty() {
                return None;
            }
            Some(Arc::new(slack::SlackNotifier::new(webhook.clone())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_notifier_without_webhook() {
        let config = NotificationConfig {
            channel: NotificationChannelType::Slack,
            slack_webhook: None,
        };
        assert!(create_notifier(&config).is_none());

        let config = NotificationConfig {
            channel: NotificationChannelType::Slack,
            slack_webhook: Some(String::new()),
        };
        assert!(create_notifier(&config).is_none());
    }

    #[test]
    fn slack_notifier_when_configured() {
        let config = NotificationConfig {
            channel: NotificationChannelType::Slack,
            slack_webhook: Some("https://hooks.slack.com/services/T/B/X".to_string()),
        };
        assert!(create_notifier(&config).is_some());
        assert!(create_notifier(&NotificationConfig::default()).is_none());
    }
}
