use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::reconcile::Notification;

use super::notifier::NotificationSink;

const NEW_EPISODES_COLOR: &str = "#36a64f";
const STATUS_CHANGE_COLOR: &str = "#439FE0";
const FOOTER: &str = "episode-watch";

#[derive(Debug, Serialize)]
struct SlackMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attachments: Vec<Attachment>,
}

#[derive(Debug, Serialize)]
struct Attachment {
    color: &'static str,
    title: String,
    title_link: String,
    text: String,
    fields: Vec<Field>,
    footer: &'static str,
    ts: i64,
}

#[derive(Debug, Serialize)]
struct Field {
    title: &'static str,
    value: String,
    short: bool,
}

/// Posts notifications to a Slack-compatible incoming webhook. The webhook
/// is fixed at construction; `None` means notifications are not configured.
pub struct SlackClient {
    client: Client,
    webhook_url: Option<String>,
}

impl SlackClient {
    pub fn new(webhook_url: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");
        Self {
            client,
            webhook_url,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.webhook_url.is_some()
    }

    pub async fn send_test(&self) -> Result<()> {
        self.post(&SlackMessage {
            text: Some(
                "episode-watch test notification\nIf you can read this, the webhook is configured correctly."
                    .to_string(),
            ),
            attachments: Vec::new(),
        })
        .await
    }

    async fn post(&self, message: &SlackMessage) -> Result<()> {
        let Some(webhook_url) = &self.webhook_url else {
            return Err(AppError::Webhook("webhook not configured".to_string()));
        };

        let response = self.client.post(webhook_url).json(message).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Webhook(format!("HTTP {status}: {body}")));
        }

        Ok(())
    }
}

#[async_trait]
impl NotificationSink for SlackClient {
    async fn deliver(&self, notification: &Notification) -> Result<()> {
        self.post(&build_message(notification, chrono::Utc::now().timestamp()))
            .await
    }
}

fn build_message(notification: &Notification, ts: i64) -> SlackMessage {
    let attachment = match notification {
        Notification::NewEpisodes { name, episodes, url } => Attachment {
            color: NEW_EPISODES_COLOR,
            title: format!("{name} has new episodes!"),
            title_link: url.clone(),
            text: format!("{} new episode(s) found", episodes.len()),
            fields: vec![
                Field {
                    title: "Series",
                    value: name.clone(),
                    short: true,
                },
                Field {
                    title: "New episodes",
                    value: episodes.join(", "),
                    short: false,
                },
            ],
            footer: FOOTER,
            ts,
        },
        Notification::StatusChange {
            name,
            old_status,
            new_status,
            url,
        } => Attachment {
            color: STATUS_CHANGE_COLOR,
            title: format!("{name} {new_status}"),
            title_link: url.clone(),
            text: format!("{name} was updated: {new_status}"),
            fields: vec![
                Field {
                    title: "Series",
                    value: name.clone(),
                    short: true,
                },
                Field {
                    title: "Previous status",
                    value: old_status.clone(),
                    short: true,
                },
                Field {
                    title: "New status",
                    value: new_status.clone(),
                    short: true,
                },
            ],
            footer: FOOTER,
            ts,
        },
    };

    SlackMessage {
        text: None,
        attachments: vec![attachment],
    }
}
