//! Polls one contract's logs and feeds them to the correlation service.

use std::{ops::ControlFlow, sync::Arc, time::Duration};

use alloy::primitives::Address;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::PipelineError;
use crate::{
    models::{ContractRole, Log},
    providers::ChainReader,
};

/// Fetches the logs of a single contract from a moving block cursor.
///
/// Logs are forwarded in the order the reader returns them. The channel is
/// bounded, so a lagging consumer slows the fetcher down. The cursor only
/// moves past blocks whose logs were handed over.
pub struct LogFetcher {
    contract: ContractRole,
    address: Address,
    reader: Arc<dyn ChainReader>,
    cursor: u64,
    polling_interval: Duration,
    logs_tx: mpsc::Sender<Log>,
    errors_tx: mpsc::Sender<PipelineError>,
    cancellation_token: CancellationToken,
}

impl LogFetcher {
    /// Creates a fetcher starting at `start_block`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        contract: ContractRole,
        address: Address,
        reader: Arc<dyn ChainReader>,
        start_block: u64,
        polling_interval: Duration,
        logs_tx: mpsc::Sender<Log>,
        errors_tx: mpsc::Sender<PipelineError>,
        cancellation_token: CancellationToken,
    ) -> Self {
        Self {
            contract,
            address,
            reader,
            cursor: start_block,
            polling_interval,
            logs_tx,
            errors_tx,
            cancellation_token,
        }
    }

    /// The next block to fetch from.
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Starts the long-running polling loop.
    pub async fn run(mut self) {
        let token = self.cancellation_token.clone();
        tracing::info!(
            contract = %self.contract,
            address = %self.address,
            start_block = self.cursor,
            "Log fetcher started."
        );

        loop {
            let flow = tokio::select! {
                biased;

                _ = token.cancelled() => ControlFlow::Break(()),
                flow = self.poll_once() => flow,
            };
            if flow.is_break() {
                break;
            }

            tokio::select! {
                biased;

                _ = token.cancelled() => break,
                _ = tokio::time::sleep(self.polling_interval) => {}
            }
        }
        tracing::info!(contract = %self.contract, cursor = self.cursor, "Log fetcher shut down.");
    }

    /// One fetch cycle. Breaks when the consumer has gone away.
    async fn poll_once(&mut self) -> ControlFlow<()> {
        let logs = match self.reader.fetch_logs(self.address, self.cursor).await {
            Ok(logs) => logs,
            Err(source) => {
                let error = PipelineError::Fetch { contract: self.contract, source };
                if self.errors_tx.send(error).await.is_err() {
                    tracing::warn!(contract = %self.contract, "Error channel closed.");
                }
                return ControlFlow::Continue(());
            }
        };

        if !logs.is_empty() {
            tracing::debug!(
                contract = %self.contract,
                from_block = self.cursor,
                log_count = logs.len(),
                "Forwarding logs."
            );
        }
        for log in logs {
            let block_number = log.block_number();
            if self.logs_tx.send(log).await.is_err() {
                tracing::warn!(contract = %self.contract, "Log channel closed, stopping fetcher.");
                return ControlFlow::Break(());
            }
            if let Some(block_number) = block_number {
                self.cursor = self.cursor.max(block_number.saturating_add(1));
            }
        }
        ControlFlow::Continue(())
    }
}
