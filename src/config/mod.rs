//! Configuration loading and validation.

mod alerts;
mod app_config;
mod contracts;
mod helpers;
mod http_retry;
mod notifiers;
mod rpc_retry;
mod server;

pub use alerts::AlertThresholds;
pub use app_config::{AppConfig, ConfigurationError, ENV_PREFIX};
pub use contracts::{ContractsConfig, DEFAULT_INBOX_ADDRESS, DEFAULT_MESSENGER_ADDRESS};
pub use helpers::{
    deserialize_duration_from_ms, deserialize_duration_from_seconds, deserialize_urls,
    serialize_duration_to_ms, serialize_duration_to_seconds,
};
pub use http_retry::{HttpRetryConfig, JitterSetting};
pub use notifiers::{DiscordConfig, GenericWebhookConfig, NotifierConfig, TelegramConfig};
pub use rpc_retry::RpcRetryConfig;
pub use server::ServerConfig;
