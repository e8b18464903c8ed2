//! # Webhook Payload Builder
//!
//! Each alert channel expects its own JSON shape. The builders here turn an
//! [`AlertMessage`] into the body posted to that channel.

use serde_json::json;

use crate::models::IntervalStat;

/// An alert about to be delivered.
#[derive(Debug, Clone, Copy)]
pub struct AlertMessage<'a> {
    /// Which threshold was crossed, e.g. `"Missing Relay"`.
    pub alert_type: &'a str,
    /// The value that crossed it, already formatted.
    pub trigger_value: &'a str,
    /// The interval summary the alert was computed from.
    pub snapshot: &'a IntervalStat,
}

impl AlertMessage<'_> {
    /// The human-readable text shared by all channels:
    /// `Alert: <type> at <value>` followed by the summary as JSON.
    pub fn text(&self) -> Result<String, serde_json::Error> {
        let stats = serde_json::to_string(self.snapshot)?;
        Ok(format!("Alert: {} at {}\n\n{}", self.alert_type, self.trigger_value, stats))
    }
}

/// A trait for building channel-specific webhook payloads.
pub trait WebhookPayloadBuilder: Send + Sync {
    /// Builds the JSON body for `message`, whose rendered text is `text`.
    fn build_payload(&self, text: &str, message: &AlertMessage<'_>) -> serde_json::Value;
}

/// A payload builder for Discord notifications.
///
/// Discord uses a simple `content` field for standard markdown-formatted messages.
pub struct DiscordPayloadBuilder;

impl WebhookPayloadBuilder for DiscordPayloadBuilder {
    fn build_payload(&self, text: &str, _message: &AlertMessage<'_>) -> serde_json::Value {
        json!({ "content": text })
    }
}

/// A payload builder for the Telegram Bot API `sendMessage` method.
pub struct TelegramPayloadBuilder {
    /// The chat ID to send the message to.
    pub chat_id: String,
}

impl WebhookPayloadBuilder for TelegramPayloadBuilder {
    fn build_payload(&self, text: &str, _message: &AlertMessage<'_>) -> serde_json::Value {
        json!({
            "chat_id": self.chat_id,
            "text": text,
        })
    }
}

/// A payload builder for generic webhooks.
///
/// Carries the rendered text under `content`, plus the structured alert for
/// receivers that parse it.
pub struct GenericWebhookPayloadBuilder;

impl WebhookPayloadBuilder for GenericWebhookPayloadBuilder {
    fn build_payload(&self, text: &str, message: &AlertMessage<'_>) -> serde_json::Value {
        json!({
            "content": text,
            "alertType": message.alert_type,
            "triggerValue": message.trigger_value,
            "stats": message.snapshot,
        })
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::U256;

    use super::*;

    fn snapshot() -> IntervalStat {
        IntervalStat {
            message_count: 2,
            total_latency: U256::from(70),
            avg_latency: 35.0,
            sent_messages: 5,
            received_messages: 2,
            missing_relay: 0,
            missing_reception: 3,
        }
    }

    fn message(snapshot: &IntervalStat) -> AlertMessage<'_> {
        AlertMessage { alert_type: "Missing Reception", trigger_value: "3", snapshot }
    }

    #[test]
    fn test_alert_text_format() {
        let snapshot = snapshot();
        let text = message(&snapshot).text().unwrap();

        let (headline, stats) = text.split_once("\n\n").unwrap();
        assert_eq!(headline, "Alert: Missing Reception at 3");
        let stats: serde_json::Value = serde_json::from_str(stats).unwrap();
        assert_eq!(stats["missingReception"], 3);
        assert_eq!(stats["totalLatency"], "70");
    }

    #[test]
    fn test_discord_payload() {
        let snapshot = snapshot();
        let payload = DiscordPayloadBuilder.build_payload("hello", &message(&snapshot));
        assert_eq!(payload, json!({ "content": "hello" }));
    }

    #[test]
    fn test_telegram_payload() {
        let snapshot = snapshot();
        let builder = TelegramPayloadBuilder { chat_id: "-1001".to_string() };
        let payload = builder.build_payload("hello", &message(&snapshot));
        assert_eq!(payload, json!({ "chat_id": "-1001", "text": "hello" }));
    }

    #[test]
    fn test_generic_payload_carries_structured_alert() {
        let snapshot = snapshot();
        let payload = GenericWebhookPayloadBuilder.build_payload("hello", &message(&snapshot));
        assert_eq!(payload["content"], "hello");
        assert_eq!(payload["alertType"], "Missing Reception");
        assert_eq!(payload["triggerValue"], "3");
        assert_eq!(payload["stats"]["sentMessages"], 5);
    }
}
