//! A set of helpers for testing

mod block;
mod chain_reader;
mod http_client;
mod log;

pub use block::block_with_timestamp;
pub use chain_reader::StaticChainReader;
pub use http_client::create_test_http_client;
pub use log::{
    EXECUTING_MESSAGE_SIGNATURE, LogBuilder, SENT_MESSAGE_SIGNATURE, executing_message_log,
    sent_message_log,
};
