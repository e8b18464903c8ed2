use std::{path::Path, time::Duration};

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use super::{
    AlertThresholds, ContractsConfig, HttpRetryConfig, NotifierConfig, RpcRetryConfig,
    ServerConfig, deserialize_duration_from_ms, deserialize_duration_from_seconds,
    deserialize_urls,
};

/// Prefix of the environment variables overriding file values, e.g.
/// `INTEROP_MONITOR__SERVER__LISTEN_ADDRESS`.
pub const ENV_PREFIX: &str = "INTEROP_MONITOR";

fn default_polling_interval() -> Duration {
    Duration::from_millis(1000)
}

fn default_aggregate_block_amount() -> u64 {
    10
}

fn default_purge_old_messages() -> bool {
    true
}

fn default_log_channel_capacity() -> usize {
    1024
}

fn default_shutdown_timeout() -> Duration {
    Duration::from_secs(30)
}

/// Errors raised while loading or validating the configuration.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// The configuration sources could not be read or deserialized.
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ConfigError),

    /// A required value is absent or empty.
    #[error("Missing required configuration value: {0}")]
    Missing(&'static str),

    /// A value is present but unusable.
    #[error("Invalid configuration value for {field}: {reason}")]
    Invalid {
        /// The offending field.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}

/// Application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// RPC endpoints of the sender chain.
    #[serde(default, deserialize_with = "deserialize_urls")]
    pub sender_rpc_urls: Vec<Url>,

    /// RPC endpoints of the receiver chain.
    #[serde(default, deserialize_with = "deserialize_urls")]
    pub receiver_rpc_urls: Vec<Url>,

    /// Delay between two log fetches of the same contract.
    #[serde(
        default = "default_polling_interval",
        deserialize_with = "deserialize_duration_from_ms"
    )]
    pub polling_interval_ms: Duration,

    /// Aggregation window `W`, in blocks.
    #[serde(default = "default_aggregate_block_amount")]
    pub aggregate_block_amount: u64,

    /// Purge per-block statistics older than twice the window.
    #[serde(default)]
    pub purge_old_blocks: bool,

    /// Purge unmatched pending messages older than twice the window.
    #[serde(default = "default_purge_old_messages")]
    pub purge_old_messages: bool,

    /// Alert thresholds.
    #[serde(default)]
    pub alerts: AlertThresholds,

    /// Alert delivery channels.
    #[serde(default)]
    pub notifiers: NotifierConfig,

    /// Monitored contract addresses.
    #[serde(default)]
    pub contracts: ContractsConfig,

    /// Query server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// RPC transport retry policy.
    #[serde(default)]
    pub rpc_retry_config: RpcRetryConfig,

    /// Retry policy for alert deliveries.
    #[serde(default)]
    pub http_retry_config: HttpRetryConfig,

    /// Capacity of each fetcher-to-correlator log channel.
    #[serde(default = "default_log_channel_capacity")]
    pub log_channel_capacity: usize,

    /// The maximum time in seconds to wait for graceful shutdown.
    #[serde(
        default = "default_shutdown_timeout",
        deserialize_with = "deserialize_duration_from_seconds"
    )]
    pub shutdown_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            sender_rpc_urls: Vec::new(),
            receiver_rpc_urls: Vec::new(),
            polling_interval_ms: default_polling_interval(),
            aggregate_block_amount: default_aggregate_block_amount(),
            purge_old_blocks: false,
            purge_old_messages: default_purge_old_messages(),
            alerts: AlertThresholds::default(),
            notifiers: NotifierConfig::default(),
            contracts: ContractsConfig::default(),
            server: ServerConfig::default(),
            rpc_retry_config: RpcRetryConfig::default(),
            http_retry_config: HttpRetryConfig::default(),
            log_channel_capacity: default_log_channel_capacity(),
            shutdown_timeout: default_shutdown_timeout(),
        }
    }
}

impl AppConfig {
    /// Loads the configuration from `path` layered with `INTEROP_MONITOR__*`
    /// environment variables, then validates it.
    pub fn load(path: &Path) -> Result<Self, ConfigurationError> {
        let settings = Config::builder()
            .add_source(File::from(path))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;
        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the invariants deserialization cannot express.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.sender_rpc_urls.is_empty() {
            return Err(ConfigurationError::Missing("sender_rpc_urls"));
        }
        if self.receiver_rpc_urls.is_empty() {
            return Err(ConfigurationError::Missing("receiver_rpc_urls"));
        }
        if self.aggregate_block_amount == 0 {
            return Err(ConfigurationError::Invalid {
                field: "aggregate_block_amount",
                reason: "must be greater than zero".into(),
            });
        }
        if self.log_channel_capacity == 0 {
            return Err(ConfigurationError::Invalid {
                field: "log_channel_capacity",
                reason: "must be greater than zero".into(),
            });
        }
        let latency = self.alerts.avg_latency_min;
        if !latency.is_finite() || latency < 0.0 {
            return Err(ConfigurationError::Invalid {
                field: "alerts.avg_latency_min",
                reason: format!("{latency} is not a non-negative number"),
            });
        }
        if let Some(telegram) = &self.notifiers.telegram {
            if telegram.token.is_empty() {
                return Err(ConfigurationError::Missing("notifiers.telegram.token"));
            }
            if telegram.chat_id.is_empty() {
                return Err(ConfigurationError::Missing("notifiers.telegram.chat_id"));
            }
        }
        Ok(())
    }

    /// Horizon span used for purging: twice the aggregation window.
    pub fn retention_span(&self) -> u64 {
        self.aggregate_block_amount.saturating_mul(2)
    }

    /// Creates a new `AppConfigBuilder` for testing purposes.
    #[cfg(test)]
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }
}

/// A builder for creating `AppConfig` instances for testing.
#[cfg(test)]
#[derive(Default)]
pub struct AppConfigBuilder {
    config: AppConfig,
}

#[cfg(test)]
impl AppConfigBuilder {
    pub fn sender_rpc_urls(mut self, urls: Vec<Url>) -> Self {
        self.config.sender_rpc_urls = urls;
        self
    }

    pub fn receiver_rpc_urls(mut self, urls: Vec<Url>) -> Self {
        self.config.receiver_rpc_urls = urls;
        self
    }

    pub fn aggregate_block_amount(mut self, window: u64) -> Self {
        self.config.aggregate_block_amount = window;
        self
    }

    pub fn alerts(mut self, alerts: AlertThresholds) -> Self {
        self.config.alerts = alerts;
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TelegramConfig;

    const MINIMAL_CONFIG: &str = r#"
        sender_rpc_urls:
          - "http://localhost:9545"
        receiver_rpc_urls:
          - "http://localhost:9546"
    "#;

    fn write_config(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("app.yaml");
        std::fs::write(&path, contents).unwrap();
        (temp_dir, path)
    }

    fn valid_config() -> AppConfig {
        AppConfig::builder()
            .sender_rpc_urls(vec![Url::parse("http://localhost:9545").unwrap()])
            .receiver_rpc_urls(vec![Url::parse("http://localhost:9546").unwrap()])
            .build()
    }

    #[test]
    fn test_minimal_file_uses_defaults() {
        let (_dir, path) = write_config(MINIMAL_CONFIG);
        let config = AppConfig::load(&path).unwrap();

        assert_eq!(config.sender_rpc_urls.len(), 1);
        assert_eq!(config.receiver_rpc_urls.len(), 1);
        assert_eq!(config.polling_interval_ms, Duration::from_millis(1000));
        assert_eq!(config.aggregate_block_amount, 10);
        assert!(!config.purge_old_blocks);
        assert!(config.purge_old_messages);
        assert_eq!(config.alerts, AlertThresholds::default());
        assert!(config.notifiers.is_empty());
        assert_eq!(config.contracts, ContractsConfig::default());
        assert!(config.server.enabled);
        assert_eq!(config.log_channel_capacity, 1024);
        assert_eq!(config.shutdown_timeout, Duration::from_secs(30));
        assert_eq!(config.retention_span(), 20);
    }

    #[test]
    fn test_full_file() {
        let (_dir, path) = write_config(
            r#"
            sender_rpc_urls: ["http://sender:8545"]
            receiver_rpc_urls: ["http://receiver:8545"]
            polling_interval_ms: 250
            aggregate_block_amount: 32
            purge_old_blocks: true
            purge_old_messages: false
            alerts:
              avg_latency_min: 12.5
              missing_relay_min: 3
            notifiers:
              telegram:
                token: "123:abc"
                chat_id: "-1001"
              webhook:
                url: "https://hooks.example.com/alerts"
                secret: "s3cr3t"
            contracts:
              messenger_address: "0x00000000000000000000000000000000000000aa"
            "#,
        );
        let config = AppConfig::load(&path).unwrap();

        assert_eq!(config.polling_interval_ms, Duration::from_millis(250));
        assert_eq!(config.aggregate_block_amount, 32);
        assert!(config.purge_old_blocks);
        assert!(!config.purge_old_messages);
        assert_eq!(config.alerts.avg_latency_min, 12.5);
        assert_eq!(config.alerts.missing_relay_min, 3);
        assert_eq!(config.alerts.missing_reception_min, 0);
        let telegram = config.notifiers.telegram.unwrap();
        assert_eq!(telegram.api_url, "https://api.telegram.org");
        assert_eq!(config.notifiers.webhook.unwrap().secret.as_deref(), Some("s3cr3t"));
        let messenger = alloy::primitives::Address::with_last_byte(0xaa);
        assert_eq!(config.contracts.messenger_address, messenger);
        assert_eq!(config.contracts.inbox_address, crate::config::DEFAULT_INBOX_ADDRESS);
    }

    #[test]
    fn test_env_var_overrides_file() {
        let (_dir, path) = write_config(MINIMAL_CONFIG);

        unsafe {
            std::env::set_var("INTEROP_MONITOR__SERVER__LISTEN_ADDRESS", "127.0.0.1:9900");
        }
        let config = AppConfig::load(&path);
        unsafe {
            std::env::remove_var("INTEROP_MONITOR__SERVER__LISTEN_ADDRESS");
        }

        assert_eq!(config.unwrap().server.listen_address, "127.0.0.1:9900");
    }

    #[test]
    fn test_missing_file_is_a_load_error() {
        let result = AppConfig::load(Path::new("/nonexistent/app.yaml"));
        assert!(matches!(result, Err(ConfigurationError::Load(_))));
    }

    #[test]
    fn test_missing_sender_urls_rejected() {
        let (_dir, path) = write_config("receiver_rpc_urls: [\"http://localhost:9546\"]");
        let result = AppConfig::load(&path);
        assert!(matches!(result, Err(ConfigurationError::Missing("sender_rpc_urls"))));
    }

    #[test]
    fn test_missing_receiver_urls_rejected() {
        let mut config = valid_config();
        config.receiver_rpc_urls.clear();
        assert!(matches!(config.validate(), Err(ConfigurationError::Missing("receiver_rpc_urls"))));
    }

    #[test]
    fn test_zero_window_rejected() {
        let config = AppConfig { aggregate_block_amount: 0, ..valid_config() };
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::Invalid { field: "aggregate_block_amount", .. })
        ));
    }

    #[test]
    fn test_negative_latency_threshold_rejected() {
        let config = AppConfig::builder()
            .sender_rpc_urls(valid_config().sender_rpc_urls)
            .receiver_rpc_urls(valid_config().receiver_rpc_urls)
            .alerts(AlertThresholds { avg_latency_min: -1.0, ..Default::default() })
            .build();
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::Invalid { field: "alerts.avg_latency_min", .. })
        ));
    }

    #[test]
    fn test_telegram_without_chat_id_rejected() {
        let mut config = valid_config();
        config.notifiers.telegram = Some(TelegramConfig {
            token: "123:abc".into(),
            chat_id: String::new(),
            api_url: "https://api.telegram.org".into(),
        });
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::Missing("notifiers.telegram.chat_id"))
        ));
    }
}
