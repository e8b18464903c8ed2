//! Webhook notification implementation.
//!
//! Posts a JSON payload to an endpoint, optionally signed with an HMAC so
//! the receiver can authenticate it.

use std::{collections::HashMap, sync::Arc};

use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest_middleware::ClientWithMiddleware;
use sha2::Sha256;
use url::Url;

use super::error::NotificationError;

/// HMAC SHA256 type alias
type HmacSha256 = Hmac<Sha256>;

/// Sends JSON payloads to a single endpoint.
#[derive(Debug)]
pub struct WebhookNotifier {
    /// Endpoint receiving the payloads
    url: Url,
    /// Configured HTTP client for webhook requests with retry capabilities
    client: Arc<ClientWithMiddleware>,
    /// Secret used to sign the payload, if any
    secret: Option<String>,
    /// Extra headers sent with every request
    headers: HeaderMap,
}

impl WebhookNotifier {
    /// Creates a new notifier. Fails if a header name or value is not valid
    /// HTTP.
    pub fn new(
        url: Url,
        secret: Option<String>,
        headers: &HashMap<String, String>,
        client: Arc<ClientWithMiddleware>,
    ) -> Result<Self, NotificationError> {
        let mut header_map = HeaderMap::new();
        header_map.insert(
            HeaderName::from_static("content-type"),
            HeaderValue::from_static("application/json"),
        );
        for (key, value) in headers {
            let header_name = HeaderName::from_bytes(key.as_bytes()).map_err(|e| {
                NotificationError::ConfigError(format!("Invalid header name: {key}: {e}"))
            })?;
            let header_value = HeaderValue::from_str(value).map_err(|e| {
                NotificationError::ConfigError(format!(
                    "Invalid header value for {key}: {value}: {e}"
                ))
            })?;
            header_map.insert(header_name, header_value);
        }
        Ok(Self { url, client, secret, headers: header_map })
    }

    /// Signs `payload` with `secret`. Returns the hex signature and the
    /// millisecond timestamp that was signed along with the payload.
    pub fn sign_payload(
        &self,
        secret: &str,
        payload: &serde_json::Value,
    ) -> Result<(String, String), NotificationError> {
        // `new_from_slice` accepts empty keys.
        if secret.is_empty() {
            return Err(NotificationError::ConfigError(
                "Invalid secret: cannot be empty.".to_string(),
            ));
        }

        let timestamp = Utc::now().timestamp_millis();
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| NotificationError::ConfigError(format!("Invalid secret: {e}")))?;

        let serialized_payload = serde_json::to_string(payload)?;
        mac.update(format!("{serialized_payload}{timestamp}").as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());

        Ok((signature, timestamp.to_string()))
    }

    /// Posts `payload` to the endpoint.
    pub async fn notify_json(&self, payload: &serde_json::Value) -> Result<(), NotificationError> {
        let mut headers = self.headers.clone();

        if let Some(secret) = &self.secret {
            let (signature, timestamp) = self.sign_payload(secret, payload)?;
            headers.insert(
                HeaderName::from_static("x-signature"),
                HeaderValue::from_str(&signature).map_err(|e| {
                    NotificationError::NotifyFailed(format!("Invalid signature value: {e}"))
                })?,
            );
            headers.insert(
                HeaderName::from_static("x-timestamp"),
                HeaderValue::from_str(&timestamp).map_err(|e| {
                    NotificationError::NotifyFailed(format!("Invalid timestamp value: {e}"))
                })?,
            );
        }

        let response =
            self.client.post(self.url.clone()).headers(headers).json(payload).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotificationError::NotifyFailed(format!(
                "Webhook request failed with status: {status}"
            )));
        }

        Ok(())
    }
}
