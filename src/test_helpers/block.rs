//! Block fixtures for provider tests.

use alloy::rpc::types::{Block, BlockTransactions, Header};

/// A header-only block, as returned by `eth_getBlockByNumber` without full
/// transactions. Only the fields the timestamp lookup reads are set.
pub fn block_with_timestamp(number: u64, timestamp: u64) -> Block {
    let mut header: Header = Header::default();
    header.number = number;
    header.timestamp = timestamp;

    Block {
        header,
        transactions: BlockTransactions::Hashes(Vec::new()),
        uncles: Vec::new(),
        withdrawals: None,
    }
}
