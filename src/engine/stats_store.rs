//! Per-block counters keyed by sender block number.

use std::{collections::BTreeMap, num::NonZeroU64};

use alloy::primitives::U256;

use crate::models::{BlockStat, IntervalStat, PrettyStat, stats::BinStat};

/// Ordered per-block statistics plus the highest block observed on either
/// stream.
#[derive(Debug, Default)]
pub struct BlockStatsStore {
    blocks: BTreeMap<u64, BlockStat>,
    latest_block: u64,
}

impl BlockStatsStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Highest block number observed so far.
    pub fn latest_block(&self) -> u64 {
        self.latest_block
    }

    /// Raises the latest block to `block_number` if it is higher. Returns the
    /// resulting latest block.
    pub fn observe_block(&mut self, block_number: u64) -> u64 {
        self.latest_block = self.latest_block.max(block_number);
        self.latest_block
    }

    /// Counts a `SentMessage` emitted in `block_number`.
    pub fn record_sent(&mut self, block_number: u64) {
        self.blocks.entry(block_number).or_default().sent_messages += 1;
    }

    /// Counts an execution of a message sent in `block_number`.
    pub fn record_received(&mut self, block_number: u64) {
        self.blocks.entry(block_number).or_default().received_messages += 1;
    }

    /// Counts a matched pair whose send happened in `block_number`.
    pub fn record_match(&mut self, block_number: u64, latency: u64) {
        let stat = self.blocks.entry(block_number).or_default();
        stat.message_count += 1;
        stat.total_latency = stat.total_latency.saturating_add(U256::from(latency));
    }

    /// Counters of a single block.
    pub fn get(&self, block_number: u64) -> Option<&BlockStat> {
        self.blocks.get(&block_number)
    }

    /// Number of blocks with counters.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Returns true if no block has counters.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Every block at or after `from_block`.
    pub fn all_from(&self, from_block: u64) -> BTreeMap<u64, PrettyStat> {
        self.blocks.range(from_block..).map(|(block, stat)| (*block, stat.pretty())).collect()
    }

    /// Blocks at or after `from_block` grouped into bins of `bin_size`
    /// blocks, keyed by the first block of each bin.
    pub fn binned(&self, from_block: u64, bin_size: NonZeroU64) -> BTreeMap<u64, PrettyStat> {
        let size = bin_size.get();
        let mut bins: BTreeMap<u64, BinStat> = BTreeMap::new();
        for (block, stat) in self.blocks.range(from_block..) {
            bins.entry(block - block % size).or_default().add(stat);
        }
        bins.into_iter().map(|(bin, stat)| (bin, stat.pretty())).collect()
    }

    /// Summary of the blocks in `[latest - count, latest]`. A window reaching
    /// below block zero covers every block from zero.
    pub fn aggregate_latest(&self, count: u64) -> IntervalStat {
        let lower = self.latest_block.saturating_sub(count);
        IntervalStat::from_blocks(self.blocks.range(lower..=self.latest_block).map(|(_, s)| s))
    }

    /// Deletes every block at or below `horizon`. Returns how many were
    /// deleted.
    pub fn purge_through(&mut self, horizon: u64) -> usize {
        let before = self.blocks.len();
        self.blocks = match horizon.checked_add(1) {
            Some(first_kept) => self.blocks.split_off(&first_kept),
            None => BTreeMap::new(),
        };
        before - self.blocks.len()
    }
}
