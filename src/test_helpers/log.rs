//! Builders for creating `Log` instances for testing.

use alloy::{
    dyn_abi::DynSolValue,
    primitives::{Address, B256, Bytes, LogData, U256, keccak256},
    rpc::types::Log as AlloyLog,
};

use crate::models::{Identifier, Log};

/// Canonical signature of the messenger's `SentMessage` event.
pub const SENT_MESSAGE_SIGNATURE: &str = "SentMessage(uint256,address,uint256,address,bytes)";

/// Canonical signature of the inbox's `ExecutingMessage` event.
pub const EXECUTING_MESSAGE_SIGNATURE: &str =
    "ExecutingMessage(bytes32,(address,uint256,uint256,uint256,uint256))";

/// A builder for creating `Log` instances for testing.
#[derive(Debug, Clone, Default)]
pub struct LogBuilder {
    address: Address,
    topics: Vec<B256>,
    data: Bytes,
    transaction_hash: Option<B256>,
    block_number: Option<u64>,
    log_index: Option<u64>,
}

impl LogBuilder {
    /// Creates a new `LogBuilder`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the address of the contract that emitted the log.
    pub fn address(mut self, address: Address) -> Self {
        self.address = address;
        self
    }

    /// Adds a topic to the log.
    pub fn topic(mut self, topic: B256) -> Self {
        self.topics.push(topic);
        self
    }

    /// Sets the data of the log.
    pub fn data(mut self, data: Bytes) -> Self {
        self.data = data;
        self
    }

    /// Sets the transaction hash of the log.
    pub fn transaction_hash(mut self, hash: B256) -> Self {
        self.transaction_hash = Some(hash);
        self
    }

    /// Sets the block number of the log.
    pub fn block_number(mut self, number: u64) -> Self {
        self.block_number = Some(number);
        self
    }

    /// Sets the log index of the log.
    pub fn log_index(mut self, index: u64) -> Self {
        self.log_index = Some(index);
        self
    }

    /// Builds the `Log` with the provided values.
    pub fn build(self) -> Log {
        AlloyLog {
            inner: alloy::primitives::Log {
                address: self.address,
                data: LogData::new_unchecked(self.topics, self.data),
            },
            transaction_hash: self.transaction_hash,
            block_number: self.block_number,
            log_index: self.log_index,
            ..Default::default()
        }
        .into()
    }
}

/// Builds a `SentMessage` log emitted by `messenger` at the given position.
pub fn sent_message_log(messenger: Address, block_number: u64, log_index: u64) -> Log {
    let body = DynSolValue::Tuple(vec![
        DynSolValue::Address(Address::repeat_byte(0x11)),
        DynSolValue::Bytes(vec![0xde, 0xad, 0xbe, 0xef]),
    ]);

    LogBuilder::new()
        .address(messenger)
        .topic(keccak256(SENT_MESSAGE_SIGNATURE))
        .topic(U256::from(902).into())
        .topic(Address::repeat_byte(0x22).into_word())
        .topic(U256::from(log_index).into())
        .data(body.abi_encode_params().into())
        .block_number(block_number)
        .log_index(log_index)
        .build()
}

/// Builds an `ExecutingMessage` log emitted by `inbox` that executes the
/// message named by `id`.
pub fn executing_message_log(
    inbox: Address,
    block_number: u64,
    log_index: u64,
    id: &Identifier,
) -> Log {
    let body = DynSolValue::Tuple(vec![id.to_sol_value()]);

    LogBuilder::new()
        .address(inbox)
        .topic(keccak256(EXECUTING_MESSAGE_SIGNATURE))
        .topic(keccak256(id.block_number.to_be_bytes()))
        .data(body.abi_encode_params().into())
        .block_number(block_number)
        .log_index(log_index)
        .build()
}
