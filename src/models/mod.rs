//! This module contains the data models shared across the monitor.

pub mod identifier;
pub mod log;
pub mod stats;

use std::fmt;

pub use identifier::Identifier;
pub use log::Log;
pub use stats::{BlockStat, IntervalStat, PrettyStat};

/// Which side of the monitored pair a chain plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainRole {
    /// The chain emitting outgoing messages.
    Sender,
    /// The chain executing (receiving) the messages.
    Receiver,
}

impl fmt::Display for ChainRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainRole::Sender => write!(f, "sender"),
            ChainRole::Receiver => write!(f, "receiver"),
        }
    }
}

/// The contract a stream of logs comes from. Used to key the event decoder
/// registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContractRole {
    /// The cross-domain messenger on the sender chain (emits `SentMessage`).
    Messenger,
    /// The cross-L2 inbox on the receiver chain (emits `ExecutingMessage`).
    Inbox,
}

impl ContractRole {
    /// The chain on which this contract is watched.
    pub fn chain(&self) -> ChainRole {
        match self {
            ContractRole::Messenger => ChainRole::Sender,
            ContractRole::Inbox => ChainRole::Receiver,
        }
    }
}

impl fmt::Display for ContractRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContractRole::Messenger => write!(f, "messenger"),
            ContractRole::Inbox => write!(f, "inbox"),
        }
    }
}
