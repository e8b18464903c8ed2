//! The correlation engine: log ingestion, message pairing, windowed
//! statistics and alert evaluation.
//!
//! Data flows one way. A `LogFetcher` per contract polls its chain and
//! pushes logs over a bounded channel to the `CorrelationService`, the only
//! owner of correlation state. Everything else (the query server, the
//! `AggregationScheduler`) talks to it through a `StatsHandle`.

pub mod aggregation_scheduler;
pub mod alert_evaluator;
pub mod correlation_service;
pub mod correlator;
pub mod log_fetcher;
pub mod stats_store;
pub mod timestamp_resolver;

use thiserror::Error;
use tokio::sync::mpsc;

use crate::{models::ContractRole, providers::ChainReaderError};
use correlator::CorrelationError;

/// Recoverable failures of the running pipeline. They are reported and the
/// pipeline keeps going.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Fetching a contract's logs failed; the fetch is retried from the same
    /// cursor on the next cycle.
    #[error("Failed to fetch {contract} logs: {source}")]
    Fetch {
        /// The contract whose logs were requested.
        contract: ContractRole,
        /// The reader failure.
        #[source]
        source: ChainReaderError,
    },

    /// A log could not be correlated and was dropped.
    #[error("Failed to correlate {contract} log: {source}")]
    Correlation {
        /// The contract that emitted the log.
        contract: ContractRole,
        /// What went wrong.
        #[source]
        source: CorrelationError,
    },
}

/// Logs every pipeline error until all producers are gone.
pub async fn report_errors(mut errors_rx: mpsc::Receiver<PipelineError>) {
    while let Some(error) = errors_rx.recv().await {
        match &error {
            PipelineError::Fetch { contract, .. } => {
                tracing::warn!(%contract, error = %error, "Log fetch failed, retrying next cycle.");
            }
            PipelineError::Correlation { contract, .. } => {
                tracing::error!(%contract, error = %error, "Dropped uncorrelatable log.");
            }
        }
    }
    tracing::debug!("Pipeline error reporter has shut down.");
}
