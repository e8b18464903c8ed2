//! Chain data providers.

pub mod rpc;
pub mod traits;

pub use rpc::{EvmRpcSource, ProviderError, create_provider};
pub use traits::{ChainReader, ChainReaderError};
