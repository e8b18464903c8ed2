use alloy::primitives::{Address, address};
use serde::Deserialize;

/// Predeploy address of the messenger contract on the sender chain.
pub const DEFAULT_MESSENGER_ADDRESS: Address =
    address!("4200000000000000000000000000000000000023");

/// Predeploy address of the inbox contract on the receiver chain.
pub const DEFAULT_INBOX_ADDRESS: Address = address!("4200000000000000000000000000000000000022");

/// Addresses of the two monitored contracts.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct ContractsConfig {
    /// Messenger contract emitting `SentMessage` on the sender chain.
    pub messenger_address: Address,
    /// Inbox contract emitting `ExecutingMessage` on the receiver chain.
    pub inbox_address: Address,
}

impl Default for ContractsConfig {
    fn default() -> Self {
        Self { messenger_address: DEFAULT_MESSENGER_ADDRESS, inbox_address: DEFAULT_INBOX_ADDRESS }
    }
}
