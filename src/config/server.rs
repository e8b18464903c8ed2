use serde::Deserialize;

/// Configuration for the statistics query server.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Whether the query server is started at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Address and port for the HTTP server to listen on.
    #[serde(default = "default_listen_address")]
    pub listen_address: String,
}

fn default_enabled() -> bool {
    true
}

fn default_listen_address() -> String {
    "0.0.0.0:8800".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { enabled: default_enabled(), listen_address: default_listen_address() }
    }
}
