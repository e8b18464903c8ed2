//! This module provides functionality to create a provider for EVM RPC requests
//! with retry logic and backoff strategies.

use std::num::NonZeroUsize;

use alloy::{
    primitives::Address,
    providers::{Provider, ProviderBuilder, layers::CallBatchLayer},
    rpc::{client::RpcClient, types::Filter},
    transports::{
        http::{Http, reqwest::Url},
        layers::{FallbackLayer, RetryBackoffLayer},
    },
};
use async_trait::async_trait;
use tower::ServiceBuilder;

use super::traits::{ChainReader, ChainReaderError};
use crate::{config::RpcRetryConfig, models::Log};

/// A `ChainReader` implementation that reads from an EVM RPC endpoint.
pub struct EvmRpcSource<P> {
    provider: P,
}

impl<P> EvmRpcSource<P>
where
    P: Provider,
{
    /// Creates a new `EvmRpcSource`.
    #[tracing::instrument(skip(provider), level = "debug")]
    pub fn new(provider: P) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<P> ChainReader for EvmRpcSource<P>
where
    P: Provider + Send + Sync,
{
    #[tracing::instrument(skip(self), level = "debug")]
    async fn chain_id(&self) -> Result<u64, ChainReaderError> {
        self.provider.get_chain_id().await.map_err(|e| ChainReaderError::Provider(Box::new(e)))
    }

    #[tracing::instrument(skip(self), level = "debug")]
    async fn current_block_number(&self) -> Result<u64, ChainReaderError> {
        tracing::debug!("Fetching current block number from RPC.");
        let block_number = self
            .provider
            .get_block_number()
            .await
            .map_err(|e| ChainReaderError::Provider(Box::new(e)))?;
        tracing::debug!(current_block = block_number, "Successfully fetched current block number.");
        Ok(block_number)
    }

    #[tracing::instrument(skip(self), level = "debug")]
    async fn fetch_logs(
        &self,
        address: Address,
        from_block: u64,
    ) -> Result<Vec<Log>, ChainReaderError> {
        let filter = Filter::new().address(address).from_block(from_block);
        let logs = self
            .provider
            .get_logs(&filter)
            .await
            .map_err(|e| ChainReaderError::Provider(Box::new(e)))?;
        tracing::debug!(%address, from_block, log_count = logs.len(), "Fetched contract logs.");
        Ok(logs.into_iter().map(Log::from).collect())
    }

    #[tracing::instrument(skip(self), level = "debug")]
    async fn block_timestamp(&self, block_number: u64) -> Result<u64, ChainReaderError> {
        let block = self
            .provider
            .get_block_by_number(block_number.into())
            .await
            .map_err(|e| ChainReaderError::Provider(Box::new(e)))?
            .ok_or(ChainReaderError::BlockNotFound(block_number))?;
        Ok(block.header.timestamp)
    }
}

/// Custom error type for provider operations.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Error when creating the provider.
    #[error("Provider creation failed: {0}")]
    CreationError(String),
}

/// Creates a new provider with the given RPC URLs.
pub fn create_provider(
    urls: Vec<Url>,
    retry_config: RpcRetryConfig,
) -> Result<impl Provider, ProviderError> {
    let Some(transport_count) = NonZeroUsize::new(urls.len()) else {
        return Err(ProviderError::CreationError("RPC URL list cannot be empty".into()));
    };

    let fallback_layer = FallbackLayer::default().with_active_transport_count(transport_count);

    let transports: Vec<_> = urls.into_iter().map(Http::new).collect();

    let retry_layer = RetryBackoffLayer::new(
        retry_config.max_retry,
        retry_config.backoff_ms,
        retry_config.compute_units_per_second,
    );

    let service =
        ServiceBuilder::new().layer(retry_layer).layer(fallback_layer).service(transports);

    let client = RpcClient::builder().transport(service, false);
    let provider = ProviderBuilder::new().layer(CallBatchLayer::new()).connect_client(client);
    Ok(provider)
}
