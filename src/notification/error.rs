//! Error types for alert delivery.

use thiserror::Error;

/// Defines the possible errors that can occur while delivering an alert.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// A channel is configured with unusable values.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The endpoint rejected the request or the request could not be built.
    #[error("Notification failed: {0}")]
    NotifyFailed(String),

    /// The alert could not be serialized.
    #[error("Failed to serialize alert: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// An error from the underlying `reqwest` or `reqwest_middleware`
    /// libraries.
    #[error("Request error: {0}")]
    RequestError(#[from] reqwest_middleware::Error),

    /// One or more channels failed. The remaining channels were still
    /// attempted.
    #[error("Alert delivery failed: {}", .0.join("; "))]
    DeliveryFailed(Vec<String>),
}
