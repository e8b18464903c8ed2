//! The contract log as seen by the correlation engine.

use alloy::{
    primitives::{Address, B256, Bytes},
    rpc::types::Log as AlloyLog,
};
use serde::{Deserialize, Serialize};

/// A log fetched from either chain. Wraps the RPC type so the engine only
/// depends on the handful of fields it correlates on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Log(pub AlloyLog);

impl Log {
    /// The emitting contract.
    pub fn address(&self) -> Address {
        self.0.address()
    }

    /// Indexed topics, the event selector first.
    pub fn topics(&self) -> &[B256] {
        self.0.topics()
    }

    /// The event selector, absent for anonymous events.
    pub fn event_selector(&self) -> Option<B256> {
        self.topics().first().copied()
    }

    /// ABI-encoded non-indexed parameters.
    pub fn data(&self) -> &Bytes {
        &self.0.data().data
    }

    /// Block the log was emitted in. Missing only for pending logs.
    pub fn block_number(&self) -> Option<u64> {
        self.0.block_number
    }

    /// Position of the log within its block. Missing only for pending logs.
    pub fn log_index(&self) -> Option<u64> {
        self.0.log_index
    }
}

impl From<AlloyLog> for Log {
    fn from(log: AlloyLog) -> Self {
        Self(log)
    }
}
