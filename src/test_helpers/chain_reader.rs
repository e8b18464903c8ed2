//! An in-memory `ChainReader` for tests.

use std::{
    collections::HashMap,
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use alloy::primitives::Address;
use async_trait::async_trait;

use crate::{
    models::Log,
    providers::{ChainReader, ChainReaderError},
};

#[derive(Debug, Default)]
struct ChainState {
    current_block: u64,
    timestamps: HashMap<u64, u64>,
    logs: Vec<Log>,
    failing_fetches: usize,
}

/// A `ChainReader` serving a fixed set of timestamps and logs.
///
/// Timestamps not registered with [`StaticChainReader::with_timestamp`]
/// resolve to `BlockNotFound`.
#[derive(Debug, Default)]
pub struct StaticChainReader {
    chain_id: u64,
    state: Mutex<ChainState>,
    timestamp_calls: AtomicUsize,
    fetch_calls: AtomicUsize,
}

impl StaticChainReader {
    /// Creates an empty chain with the given id.
    pub fn new(chain_id: u64) -> Self {
        Self { chain_id, ..Default::default() }
    }

    /// Sets the chain head.
    pub fn with_current_block(self, block_number: u64) -> Self {
        self.set_current_block(block_number);
        self
    }

    /// Registers the timestamp of a block.
    pub fn with_timestamp(self, block_number: u64, timestamp: u64) -> Self {
        self.insert_timestamp(block_number, timestamp);
        self
    }

    /// Sets the chain head.
    pub fn set_current_block(&self, block_number: u64) {
        self.lock().current_block = block_number;
    }

    /// Registers the timestamp of a block.
    pub fn insert_timestamp(&self, block_number: u64, timestamp: u64) {
        self.lock().timestamps.insert(block_number, timestamp);
    }

    /// Appends a log to the chain.
    pub fn push_log(&self, log: Log) {
        self.lock().logs.push(log);
    }

    /// Makes the next `count` calls to `fetch_logs` fail.
    pub fn fail_next_fetches(&self, count: usize) {
        self.lock().failing_fetches = count;
    }

    /// Number of `block_timestamp` calls served so far.
    pub fn timestamp_calls(&self) -> usize {
        self.timestamp_calls.load(Ordering::SeqCst)
    }

    /// Number of `fetch_logs` calls served so far.
    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ChainState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ChainReader for StaticChainReader {
    async fn chain_id(&self) -> Result<u64, ChainReaderError> {
        Ok(self.chain_id)
    }

    async fn current_block_number(&self) -> Result<u64, ChainReaderError> {
        Ok(self.lock().current_block)
    }

    async fn fetch_logs(
        &self,
        address: Address,
        from_block: u64,
    ) -> Result<Vec<Log>, ChainReaderError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.lock();
        if state.failing_fetches > 0 {
            state.failing_fetches -= 1;
            return Err(ChainReaderError::Provider("injected fetch failure".into()));
        }
        Ok(state
            .logs
            .iter()
            .filter(|log| log.address() == address)
            .filter(|log| log.block_number().is_some_and(|block| block >= from_block))
            .cloned()
            .collect())
    }

    async fn block_timestamp(&self, block_number: u64) -> Result<u64, ChainReaderError> {
        self.timestamp_calls.fetch_add(1, Ordering::SeqCst);
        self.lock()
            .timestamps
            .get(&block_number)
            .copied()
            .ok_or(ChainReaderError::BlockNotFound(block_number))
    }
}
