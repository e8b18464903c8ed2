use std::collections::HashMap;

use serde::Deserialize;
use url::Url;

fn default_telegram_api_url() -> String {
    "https://api.telegram.org".to_string()
}

/// Alert delivery channels. Every configured channel receives every alert.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct NotifierConfig {
    /// Telegram bot delivery.
    pub telegram: Option<TelegramConfig>,
    /// Discord incoming webhook delivery.
    pub discord: Option<DiscordConfig>,
    /// Arbitrary JSON webhook delivery.
    pub webhook: Option<GenericWebhookConfig>,
}

impl NotifierConfig {
    /// Returns true if no channel is configured.
    pub fn is_empty(&self) -> bool {
        self.telegram.is_none() && self.discord.is_none() && self.webhook.is_none()
    }
}

/// Telegram bot settings.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct TelegramConfig {
    /// Bot token.
    pub token: String,
    /// Target chat.
    pub chat_id: String,
    /// Bot API base URL.
    #[serde(default = "default_telegram_api_url")]
    pub api_url: String,
}

/// Discord webhook settings.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct DiscordConfig {
    /// Incoming webhook URL.
    pub webhook_url: Url,
}

/// Generic webhook settings.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct GenericWebhookConfig {
    /// Endpoint receiving the alert as a JSON POST.
    pub url: Url,
    /// When set, the payload is signed with HMAC-SHA256.
    #[serde(default)]
    pub secret: Option<String>,
    /// Extra request headers.
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl TelegramConfig {
    /// Endpoint of the bot's `sendMessage` method.
    pub fn send_message_url(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_url.trim_end_matches('/'), self.token)
    }
}
