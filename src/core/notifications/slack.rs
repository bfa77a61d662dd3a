use super::{DrainEvent, NotificationChannel};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;

use crate::core::report::archives_per_second;

pub struct SlackNotifier {
    webhook_url: String,
    client: reqwest::Client,
}

impl SlackNotifier {
    pub fn new(webhook_url: String) -> Self {
        Self {
            webhook_url,
            client: reqwest::Client::new(),
        }
    }

    fn format_message(&self, event: &DrainEvent) -> serde_json::Value {
        match event {
            DrainEvent::Started { drain_id, vault } => {
                let short_id = &drain_id[..8.min(drain_id.len())];
                json!({
                    "blocks": [
                        {
                            "type": "header",
                            "text": {
                                "type": "plain_text",
                                "text": "Vault Drain Started",
                                "emoji": true
                            }
                        },
                        {
                            "type": "section",
                            "fields": [
                                {
                                    "type": "mrkdwn",
                                    "text": format!("*Vault:*\n{}", vault)
                                },
                                {
                                    "type": "mrkdwn",
                                    "text": format!("*Drain ID:*\n`{}`", short_id)
                                }
                            ]
                        }
                    ]
                })
            }
            DrainEvent::Completed {
                drain_id,
                vault,
                archives,
                failed,
                duration_secs,
                vault_deleted,
                interrupted,
            } => {
                let short_id = &drain_id[..8.min(drain_id.len())];
                let rate = archives_per_second(
                    *archives,
                    std::time::Duration::from_secs(*duration_secs),
                );
                let header = if *interrupted {
                    "Vault Drain Interrupted"
                } else if *failed == 0 {
                    "Vault Drain Complete"
                } else {
                    "Vault Drain Complete With Failures"
                };
                json!({
                    "blocks": [
                        {
                            "type": "header",
                            "text": {
                                "type": "plain_text",
                                "text": header,
                                "emoji": true
                            }
                        },
                        {
                            "type": "section",
                            "fields": [
                                {
                                    "type": "mrkdwn",
                                    "text": format!("*Vault:*\n{}", vault)
                                },
                                {
                                    "type": "mrkdwn",
                                    "text": format!("*Drain ID:*\n`{}`", short_id)
                                },
                                {
                                    "type": "mrkdwn",
                                    "text": format!("*Archives:*\n{} ({} failed)", archives, failed)
                                },
                                {
                                    "type": "mrkdwn",
                                    "text": format!("*Duration:*\n{}s ({:.4} archives/s)", duration_secs, rate)
                                },
                                {
                                    "type": "mrkdwn",
                                    "text": format!("*Vault deleted:*\n{}", if *vault_deleted { "yes" } else { "no" })
                                }
                            ]
                        }
                    ]
                })
            }
            DrainEvent::Failed {
                drain_id,
                vault,
                error,
            } => {
                let short_id = &drain_id[..8.min(drain_id.len())];
                json!({
                    "blocks": [
                        {
                            "type": "header",
                            "text": {
                                "type": "plain_text",
                                "text": "Vault Drain Failed",
                                "emoji": true
                            }
                        },
                        {
                            "type": "section",
                            "fields": [
                                {
                                    "type": "mrkdwn",
                                    "text": format!("*Vault:*\n{}", vault)
                                },
                                {
                                    "type": "mrkdwn",
                                    "text": format!("*Drain ID:*\n`{}`", short_id)
                                }
                            ]
                        },
                        {
                            "type": "section",
                            "text": {
                                "type": "mrkdwn",
                                "text": format!("*Error:*\n```{}```", error)
                            }
                        }
                    ]
                })
            }
        }
    }
}

#[async_trait]
impl NotificationChannel for SlackNotifier {
    async fn notify(&self, event: DrainEvent) -> Result<()> {
        let payload = self.format_message(&event);
        self.client
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
