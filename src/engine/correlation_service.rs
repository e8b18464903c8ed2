//! The task owning all correlation state, and the handle used to query it.

use std::{collections::BTreeMap, num::NonZeroU64};

use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;

use super::{PipelineError, correlator::MessageCorrelator};
use crate::models::{ContractRole, IntervalStat, Log, PrettyStat};

/// Result of one aggregation cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    /// Latest block at the time of the cycle.
    pub latest_block: u64,
    /// Summary of the latest window.
    pub summary: IntervalStat,
}

/// A request to the correlation service. Each carries its reply channel.
#[derive(Debug)]
pub enum StatsQuery {
    /// Every block at or after `from_block`.
    AllBlockStats {
        /// First block included.
        from_block: u64,
        /// Reply channel.
        reply: oneshot::Sender<BTreeMap<u64, PrettyStat>>,
    },
    /// Blocks at or after `from_block`, grouped into bins.
    BinnedStats {
        /// First block included.
        from_block: u64,
        /// Blocks per bin.
        bin_size: NonZeroU64,
        /// Reply channel.
        reply: oneshot::Sender<BTreeMap<u64, PrettyStat>>,
    },
    /// Summary of the latest `count` blocks.
    LatestIntervalStats {
        /// Window length in blocks.
        count: u64,
        /// Reply channel.
        reply: oneshot::Sender<IntervalStat>,
    },
    /// Summarize the latest window and apply retention.
    AggregationCycle {
        /// Reply channel.
        reply: oneshot::Sender<CycleReport>,
    },
}

/// The correlation service is no longer running.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("Correlation service is unavailable")]
pub struct StatsHandleError;

/// Cloneable client of the correlation service.
#[derive(Debug, Clone)]
pub struct StatsHandle {
    queries_tx: mpsc::Sender<StatsQuery>,
    latest_rx: watch::Receiver<u64>,
}

impl StatsHandle {
    async fn request<T>(
        &self,
        query: impl FnOnce(oneshot::Sender<T>) -> StatsQuery,
    ) -> Result<T, StatsHandleError> {
        let (reply, response) = oneshot::channel();
        self.queries_tx.send(query(reply)).await.map_err(|_| StatsHandleError)?;
        response.await.map_err(|_| StatsHandleError)
    }

    /// Per-block statistics from `from_block` on.
    pub async fn all_block_stats(
        &self,
        from_block: u64,
    ) -> Result<BTreeMap<u64, PrettyStat>, StatsHandleError> {
        self.request(|reply| StatsQuery::AllBlockStats { from_block, reply }).await
    }

    /// Binned statistics from `from_block` on.
    pub async fn binned_stats(
        &self,
        from_block: u64,
        bin_size: NonZeroU64,
    ) -> Result<BTreeMap<u64, PrettyStat>, StatsHandleError> {
        self.request(|reply| StatsQuery::BinnedStats { from_block, bin_size, reply }).await
    }

    /// Summary of the latest `count` blocks.
    pub async fn latest_interval_stats(
        &self,
        count: u64,
    ) -> Result<IntervalStat, StatsHandleError> {
        self.request(|reply| StatsQuery::LatestIntervalStats { count, reply }).await
    }

    /// Runs an aggregation cycle.
    pub async fn aggregation_cycle(&self) -> Result<CycleReport, StatsHandleError> {
        self.request(|reply| StatsQuery::AggregationCycle { reply }).await
    }

    /// The latest block published by the service.
    pub fn latest_block(&self) -> u64 {
        *self.latest_rx.borrow()
    }

    /// A receiver notified whenever the latest block advances.
    pub fn subscribe_latest(&self) -> watch::Receiver<u64> {
        self.latest_rx.clone()
    }

    /// Returns true once the service has stopped.
    pub fn is_closed(&self) -> bool {
        self.queries_tx.is_closed()
    }
}

/// Single writer of the correlation state.
pub struct CorrelationService {
    correlator: MessageCorrelator,
    sent_rx: mpsc::Receiver<Log>,
    executed_rx: mpsc::Receiver<Log>,
    queries_rx: mpsc::Receiver<StatsQuery>,
    latest_tx: watch::Sender<u64>,
    errors_tx: mpsc::Sender<PipelineError>,
    cancellation_token: CancellationToken,
}

impl CorrelationService {
    /// Creates the service and the handle used to query it.
    pub fn new(
        correlator: MessageCorrelator,
        sent_rx: mpsc::Receiver<Log>,
        executed_rx: mpsc::Receiver<Log>,
        errors_tx: mpsc::Sender<PipelineError>,
        query_capacity: usize,
        cancellation_token: CancellationToken,
    ) -> (Self, StatsHandle) {
        let (queries_tx, queries_rx) = mpsc::channel(query_capacity.max(1));
        let (latest_tx, latest_rx) = watch::channel(correlator.latest_block());
        let service = Self {
            correlator,
            sent_rx,
            executed_rx,
            queries_rx,
            latest_tx,
            errors_tx,
            cancellation_token,
        };
        (service, StatsHandle { queries_tx, latest_rx })
    }

    /// Starts the long-running service loop.
    pub async fn run(mut self) {
        tracing::info!("Correlation service started.");
        loop {
            tokio::select! {
                biased;

                _ = self.cancellation_token.cancelled() => {
                    tracing::info!("Correlation service cancellation received, shutting down.");
                    break;
                }

                Some(query) = self.queries_rx.recv() => self.answer(query),

                Some(log) = self.sent_rx.recv() => {
                    self.handle_log(ContractRole::Messenger, log).await;
                }

                Some(log) = self.executed_rx.recv() => {
                    self.handle_log(ContractRole::Inbox, log).await;
                }
            }
        }
        tracing::info!(
            latest_block = self.correlator.latest_block(),
            pending_sends = self.correlator.pending_sends(),
            pending_executions = self.correlator.pending_executions(),
            "Correlation service has shut down."
        );
    }

    async fn handle_log(&mut self, contract: ContractRole, log: Log) {
        let result = match contract {
            ContractRole::Messenger => self.correlator.add_sent_message(log).await,
            ContractRole::Inbox => self.correlator.add_executing_message(log).await,
        };

        let latest = self.correlator.latest_block();
        self.latest_tx.send_if_modified(|current| {
            if *current < latest {
                *current = latest;
                true
            } else {
                false
            }
        });

        match result {
            Ok(outcome) => tracing::trace!(%contract, ?outcome, "Log correlated."),
            Err(source) => {
                let error = PipelineError::Correlation { contract, source };
                if self.errors_tx.send(error).await.is_err() {
                    tracing::warn!("Error channel closed.");
                }
            }
        }
    }

    fn answer(&mut self, query: StatsQuery) {
        // A dropped reply receiver only means the caller gave up.
        match query {
            StatsQuery::AllBlockStats { from_block, reply } => {
                let _ = reply.send(self.correlator.stats().all_from(from_block));
            }
            StatsQuery::BinnedStats { from_block, bin_size, reply } => {
                let _ = reply.send(self.correlator.stats().binned(from_block, bin_size));
            }
            StatsQuery::LatestIntervalStats { count, reply } => {
                let _ = reply.send(self.correlator.aggregate_latest(count));
            }
            StatsQuery::AggregationCycle { reply } => {
                let latest_block = self.correlator.latest_block();
                let summary = self.correlator.aggregation_cycle();
                let _ = reply.send(CycleReport { latest_block, summary });
            }
        }
    }
}
