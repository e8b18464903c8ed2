//! This module defines the interface for reading data from an EVM-compatible
//! blockchain.

use alloy::primitives::Address;
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use thiserror::Error;

use crate::models::Log;

/// Custom error type for chain reader operations.
#[derive(Error, Debug)]
pub enum ChainReaderError {
    /// Error when interacting with the provider.
    #[error("Provider error: {0}")]
    Provider(#[from] Box<dyn std::error::Error + Send + Sync>),

    /// Indicates that the requested block was not found.
    #[error("Block not found: {0}")]
    BlockNotFound(u64),
}

/// A trait for a source of chain data used by the monitor.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Fetches the chain id.
    async fn chain_id(&self) -> Result<u64, ChainReaderError>;

    /// Fetches the current block number.
    async fn current_block_number(&self) -> Result<u64, ChainReaderError>;

    /// Fetches every log emitted by `address` from `from_block` up to the
    /// chain head, in the order returned by the node.
    async fn fetch_logs(
        &self,
        address: Address,
        from_block: u64,
    ) -> Result<Vec<Log>, ChainReaderError>;

    /// Fetches the timestamp of a block.
    async fn block_timestamp(&self, block_number: u64) -> Result<u64, ChainReaderError>;
}
