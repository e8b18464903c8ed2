#![warn(missing_docs)]
//! Interop Monitor tracks cross-chain message delivery between a sender and a
//! receiver chain: it pairs every sent message with its execution on the
//! receiver, measures delivery latency and reports messages that were never
//! relayed or never matched to a send.

pub mod abi;
pub mod config;
pub mod engine;
pub mod http_client;
pub mod http_server;
pub mod models;
pub mod notification;
pub mod providers;
pub mod supervisor;
pub mod test_helpers;
