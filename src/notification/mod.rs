//! # Notification Service
//!
//! Delivers threshold alerts to the configured channels.
//!
//! ## Core Components
//!
//! - **`AlertNotifier`**: The seam the engine sends alerts through.
//! - **`NotificationService`**: Fans every alert out to Telegram, Discord and
//!   a generic webhook, whichever are configured. Each channel is a
//!   `WebhookNotifier` paired with the `WebhookPayloadBuilder` producing its
//!   JSON shape.
//!
//! Every channel is attempted even when an earlier one fails; the failures
//! are reported together.

use std::sync::Arc;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use reqwest_middleware::ClientWithMiddleware;
use url::Url;

use crate::{
    config::{HttpRetryConfig, NotifierConfig},
    http_client::create_retryable_http_client,
    models::IntervalStat,
};

pub mod error;
pub mod payload_builder;
mod webhook;

pub use error::NotificationError;
use payload_builder::{
    AlertMessage, DiscordPayloadBuilder, GenericWebhookPayloadBuilder, TelegramPayloadBuilder,
    WebhookPayloadBuilder,
};
pub use webhook::WebhookNotifier;

/// Delivers a fired alert.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AlertNotifier: Send + Sync {
    /// Sends an alert of `alert_type` triggered at `trigger_value`, with the
    /// interval summary it was computed from.
    async fn notify(
        &self,
        alert_type: &str,
        trigger_value: &str,
        snapshot: &IntervalStat,
    ) -> Result<(), NotificationError>;
}

/// One delivery channel.
struct Channel {
    name: &'static str,
    notifier: WebhookNotifier,
    builder: Box<dyn WebhookPayloadBuilder>,
}

/// Sends alerts to every configured channel.
#[derive(Default)]
pub struct NotificationService {
    channels: Vec<Channel>,
}

impl NotificationService {
    /// Builds the service with a retrying HTTP client.
    pub fn from_config(
        config: &NotifierConfig,
        retry_config: &HttpRetryConfig,
    ) -> Result<Self, NotificationError> {
        let client = create_retryable_http_client(retry_config, reqwest::Client::new());
        Self::with_client(config, Arc::new(client))
    }

    /// Builds the service on top of an existing HTTP client.
    pub fn with_client(
        config: &NotifierConfig,
        client: Arc<ClientWithMiddleware>,
    ) -> Result<Self, NotificationError> {
        let mut channels = Vec::new();

        if let Some(telegram) = &config.telegram {
            let url = parse_url("telegram", &telegram.send_message_url())?;
            channels.push(Channel {
                name: "telegram",
                notifier: WebhookNotifier::new(url, None, &Default::default(), client.clone())?,
                builder: Box::new(TelegramPayloadBuilder { chat_id: telegram.chat_id.clone() }),
            });
        }

        if let Some(discord) = &config.discord {
            channels.push(Channel {
                name: "discord",
                notifier: WebhookNotifier::new(
                    discord.webhook_url.clone(),
                    None,
                    &Default::default(),
                    client.clone(),
                )?,
                builder: Box::new(DiscordPayloadBuilder),
            });
        }

        if let Some(webhook) = &config.webhook {
            channels.push(Channel {
                name: "webhook",
                notifier: WebhookNotifier::new(
                    webhook.url.clone(),
                    webhook.secret.clone(),
                    &webhook.headers,
                    client,
                )?,
                builder: Box::new(GenericWebhookPayloadBuilder),
            });
        }

        Ok(Self { channels })
    }

    /// Names of the configured channels, in delivery order.
    pub fn channel_names(&self) -> Vec<&'static str> {
        self.channels.iter().map(|channel| channel.name).collect()
    }
}

fn parse_url(channel: &str, raw: &str) -> Result<Url, NotificationError> {
    Url::parse(raw)
        .map_err(|e| NotificationError::ConfigError(format!("Invalid {channel} URL: {e}")))
}

#[async_trait]
impl AlertNotifier for NotificationService {
    async fn notify(
        &self,
        alert_type: &str,
        trigger_value: &str,
        snapshot: &IntervalStat,
    ) -> Result<(), NotificationError> {
        if self.channels.is_empty() {
            tracing::warn!(alert_type, trigger_value, "Alert fired but no notifier is configured.");
            return Ok(());
        }

        let message = AlertMessage { alert_type, trigger_value, snapshot };
        let text = message.text()?;

        let mut failures = Vec::new();
        for channel in &self.channels {
            let payload = channel.builder.build_payload(&text, &message);
            match channel.notifier.notify_json(&payload).await {
                Ok(()) => tracing::info!(channel = channel.name, alert_type, "Alert delivered."),
                Err(e) => {
                    tracing::warn!(
                        channel = channel.name,
                        alert_type,
                        error = %e,
                        "Alert delivery failed."
                    );
                    failures.push(format!("{}: {e}", channel.name));
                }
            }
        }

        if failures.is_empty() { Ok(()) } else { Err(NotificationError::DeliveryFailed(failures)) }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use mockito::Matcher;
    use serde_json::json;

    use super::*;
    use crate::{
        config::{DiscordConfig, GenericWebhookConfig, TelegramConfig},
        test_helpers::create_test_http_client,
    };

    fn snapshot() -> IntervalStat {
        IntervalStat { sent_messages: 4, missing_reception: 4, ..Default::default() }
    }

    #[test]
    fn test_channels_follow_config() {
        let config = NotifierConfig {
            telegram: Some(TelegramConfig {
                token: "123:abc".into(),
                chat_id: "42".into(),
                api_url: "https://api.telegram.org".into(),
            }),
            discord: None,
            webhook: Some(GenericWebhookConfig {
                url: Url::parse("https://hooks.example.com").unwrap(),
                secret: None,
                headers: HashMap::new(),
            }),
        };
        let service = NotificationService::with_client(&config, create_test_http_client()).unwrap();
        assert_eq!(service.channel_names(), vec!["telegram", "webhook"]);
    }

    #[tokio::test]
    async fn test_no_channels_is_not_an_error() {
        let service = NotificationService::default();
        service.notify("Missing Reception", "4", &snapshot()).await.unwrap();
    }

    #[tokio::test]
    async fn test_every_channel_is_attempted() {
        let mut server = mockito::Server::new_async().await;
        let telegram = server
            .mock("POST", "/bot123:abc/sendMessage")
            .match_body(Matcher::PartialJson(json!({ "chat_id": "42" })))
            .with_status(500)
            .expect(1)
            .create_async()
            .await;
        let discord = server
            .mock("POST", "/discord")
            .match_body(Matcher::Regex("Alert: Missing Reception at 4".to_string()))
            .with_status(204)
            .expect(1)
            .create_async()
            .await;

        let config = NotifierConfig {
            telegram: Some(TelegramConfig {
                token: "123:abc".into(),
                chat_id: "42".into(),
                api_url: server.url(),
            }),
            discord: Some(DiscordConfig {
                webhook_url: Url::parse(&format!("{}/discord", server.url())).unwrap(),
            }),
            webhook: None,
        };
        let service = NotificationService::with_client(&config, create_test_http_client()).unwrap();

        let err = service.notify("Missing Reception", "4", &snapshot()).await.unwrap_err();
        match err {
            NotificationError::DeliveryFailed(failures) => {
                assert_eq!(failures.len(), 1);
                assert!(failures[0].starts_with("telegram"));
            }
            other => panic!("Expected DeliveryFailed, got {other:?}"),
        }
        telegram.assert();
        discord.assert();
    }
}
