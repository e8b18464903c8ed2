//! Memoized block-timestamp lookups for one chain.

use std::{collections::BTreeMap, sync::Arc};

use thiserror::Error;

use crate::{
    models::ChainRole,
    providers::{ChainReader, ChainReaderError},
};

/// A timestamp could not be resolved.
#[derive(Debug, Error)]
#[error("Failed to resolve timestamp of {chain} block {block_number}: {source}")]
pub struct ResolutionError {
    /// Chain the block belongs to.
    pub chain: ChainRole,
    /// Block whose timestamp was requested.
    pub block_number: u64,
    /// Underlying reader failure.
    #[source]
    pub source: ChainReaderError,
}

/// Resolves block timestamps of a single chain, fetching each block at most
/// once while it stays cached.
pub struct TimestampResolver {
    chain: ChainRole,
    reader: Arc<dyn ChainReader>,
    cache: BTreeMap<u64, u64>,
}

impl TimestampResolver {
    /// Creates a resolver for `chain` backed by `reader`.
    pub fn new(chain: ChainRole, reader: Arc<dyn ChainReader>) -> Self {
        Self { chain, reader, cache: BTreeMap::new() }
    }

    /// The chain this resolver serves.
    pub fn chain(&self) -> ChainRole {
        self.chain
    }

    /// Returns the timestamp of `block_number`, fetching it on first use.
    pub async fn timestamp(&mut self, block_number: u64) -> Result<u64, ResolutionError> {
        if let Some(timestamp) = self.cache.get(&block_number) {
            return Ok(*timestamp);
        }

        let timestamp = self.reader.block_timestamp(block_number).await.map_err(|source| {
            ResolutionError { chain: self.chain, block_number, source }
        })?;
        tracing::trace!(chain = %self.chain, block_number, timestamp, "Resolved block timestamp.");
        self.cache.insert(block_number, timestamp);
        Ok(timestamp)
    }

    /// Drops every cached block at or below `highest_cached - span`.
    pub fn retain_recent(&mut self, span: u64) {
        let Some((&highest, _)) = self.cache.last_key_value() else {
            return;
        };
        let Some(horizon) = highest.checked_sub(span) else {
            return;
        };
        self.cache = self.cache.split_off(&(horizon + 1));
    }

    /// Number of cached timestamps.
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }
}
