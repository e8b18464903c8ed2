//! The Supervisor manages the lifecycle of the monitor.
//!
//! It owns every long-running service and wires them together:
//!
//! - two `LogFetcher`s, one for the messenger on the sender chain and one for
//!   the inbox on the receiver chain, both starting at the chain head;
//! - the `CorrelationService`, the single owner of correlation state;
//! - the `AggregationScheduler`, which summarizes each window and fires
//!   alerts;
//! - the pipeline error reporter and, when enabled, the HTTP query server.
//!
//! SIGINT or SIGTERM cancels a shared token. Every service exits on its own
//! and the supervisor waits for them up to `shutdown_timeout` before aborting
//! what is left. A panicking service also triggers a full shutdown.

mod builder;

use std::sync::Arc;

pub use builder::SupervisorBuilder;
use thiserror::Error;
use tokio::{signal, sync::mpsc, task::JoinSet};
use tokio_util::sync::CancellationToken;

use crate::{
    abi::EventDecoder,
    config::AppConfig,
    engine::{
        PipelineError,
        aggregation_scheduler::AggregationScheduler,
        alert_evaluator::AlertEvaluator,
        correlation_service::CorrelationService,
        correlator::{CorrelatorSettings, MessageCorrelator},
        log_fetcher::LogFetcher,
        report_errors,
    },
    http_server,
    models::{ChainRole, ContractRole, Log},
    notification::AlertNotifier,
    providers::{ChainReader, ChainReaderError},
};

/// Errors that can occur while building or running the supervisor.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// A required configuration was not provided to the `SupervisorBuilder`.
    #[error("Missing configuration for Supervisor")]
    MissingConfig,

    /// A sender chain reader was not provided to the `SupervisorBuilder`.
    #[error("Missing sender chain reader for Supervisor")]
    MissingSenderReader,

    /// A receiver chain reader was not provided to the `SupervisorBuilder`.
    #[error("Missing receiver chain reader for Supervisor")]
    MissingReceiverReader,

    /// An event decoder was not provided to the `SupervisorBuilder`.
    #[error("Missing event decoder for Supervisor")]
    MissingDecoder,

    /// An alert notifier was not provided to the `SupervisorBuilder`.
    #[error("Missing alert notifier for Supervisor")]
    MissingNotifier,

    /// The event decoder cannot decode one of the monitored contracts.
    #[error("Event decoder has no ABI registered for the {0}")]
    UnregisteredContract(ContractRole),

    /// A chain could not be queried during startup.
    #[error("Failed to query the {chain} chain during startup: {source}")]
    Startup {
        /// The chain that failed.
        chain: ChainRole,
        /// The reader failure.
        #[source]
        source: ChainReaderError,
    },
}

/// The primary runtime manager for the application.
pub struct Supervisor {
    /// Shared application configuration.
    config: Arc<AppConfig>,

    /// Reader for the chain the messenger lives on.
    sender_reader: Arc<dyn ChainReader>,

    /// Reader for the chain the inbox lives on.
    receiver_reader: Arc<dyn ChainReader>,

    /// Decoder for both contracts' events.
    decoder: Arc<EventDecoder>,

    /// Destination of threshold alerts.
    notifier: Arc<dyn AlertNotifier>,

    /// Chain id of the sender chain, fetched once at build time.
    sender_chain_id: u64,

    /// A token used to signal a graceful shutdown to all supervised tasks.
    cancellation_token: CancellationToken,

    /// A set of all spawned tasks that the supervisor is actively managing.
    join_set: JoinSet<()>,
}

impl Supervisor {
    /// Creates a supervisor from already validated components.
    pub fn new(
        config: AppConfig,
        sender_reader: Arc<dyn ChainReader>,
        receiver_reader: Arc<dyn ChainReader>,
        decoder: Arc<EventDecoder>,
        notifier: Arc<dyn AlertNotifier>,
        sender_chain_id: u64,
    ) -> Self {
        Self {
            config: Arc::new(config),
            sender_reader,
            receiver_reader,
            decoder,
            notifier,
            sender_chain_id,
            cancellation_token: CancellationToken::new(),
            join_set: JoinSet::new(),
        }
    }

    /// Returns a new `SupervisorBuilder` instance.
    pub fn builder() -> SupervisorBuilder {
        SupervisorBuilder::new()
    }

    /// The token that shuts the supervisor down when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    /// Starts every service and blocks until shutdown.
    ///
    /// Fails only if the initial chain heads cannot be read. Once the services
    /// are running, failures are reported and retried rather than returned.
    pub async fn run(mut self) -> Result<(), SupervisorError> {
        let sender_head = self.sender_reader.current_block_number().await.map_err(|source| {
            SupervisorError::Startup { chain: ChainRole::Sender, source }
        })?;
        let receiver_head =
            self.receiver_reader.current_block_number().await.map_err(|source| {
                SupervisorError::Startup { chain: ChainRole::Receiver, source }
            })?;
        tracing::info!(
            sender_chain_id = self.sender_chain_id,
            sender_head,
            receiver_head,
            window = self.config.aggregate_block_amount,
            retention_span = self.config.retention_span(),
            "Starting interop monitor."
        );
        if !self.config.alerts.is_disabled() && self.config.notifiers.is_empty() {
            tracing::warn!("Alert thresholds are set but no notifier is configured.");
        }

        self.spawn_signal_handler();

        // --- Channels ---

        let capacity = self.config.log_channel_capacity;
        let (sent_tx, sent_rx) = mpsc::channel::<Log>(capacity);
        let (executed_tx, executed_rx) = mpsc::channel::<Log>(capacity);
        let (errors_tx, errors_rx) = mpsc::channel::<PipelineError>(capacity);

        // --- Task Spawning ---

        let settings = CorrelatorSettings::from_config(&self.config, self.sender_chain_id);
        let correlator = MessageCorrelator::new(
            settings,
            Arc::clone(&self.decoder),
            Arc::clone(&self.sender_reader),
            Arc::clone(&self.receiver_reader),
        );
        let (correlation_service, stats_handle) = CorrelationService::new(
            correlator,
            sent_rx,
            executed_rx,
            errors_tx.clone(),
            capacity,
            self.cancellation_token.clone(),
        );
        self.join_set.spawn(correlation_service.run());

        let messenger_fetcher = LogFetcher::new(
            ContractRole::Messenger,
            self.config.contracts.messenger_address,
            Arc::clone(&self.sender_reader),
            sender_head,
            self.config.polling_interval_ms,
            sent_tx,
            errors_tx.clone(),
            self.cancellation_token.clone(),
        );
        self.join_set.spawn(messenger_fetcher.run());

        let inbox_fetcher = LogFetcher::new(
            ContractRole::Inbox,
            self.config.contracts.inbox_address,
            Arc::clone(&self.receiver_reader),
            receiver_head,
            self.config.polling_interval_ms,
            executed_tx,
            errors_tx,
            self.cancellation_token.clone(),
        );
        self.join_set.spawn(inbox_fetcher.run());

        self.join_set.spawn(report_errors(errors_rx));

        let evaluator = AlertEvaluator::new(self.config.alerts, Arc::clone(&self.notifier));
        let scheduler = AggregationScheduler::new(
            stats_handle.clone(),
            evaluator,
            self.config.aggregate_block_amount,
            self.cancellation_token.clone(),
        );
        self.join_set.spawn(scheduler.run());

        if self.config.server.enabled {
            let config = Arc::clone(&self.config);
            let token = self.cancellation_token.clone();
            self.join_set.spawn(async move {
                if let Err(e) = http_server::run_server_from_config(config, stats_handle, token).await
                {
                    tracing::error!(error = %e, "HTTP server stopped.");
                }
            });
        }

        // --- Main Supervisor Loop ---

        loop {
            tokio::select! {
                maybe_result = self.join_set.join_next() => {
                    match maybe_result {
                        Some(Ok(())) => {}
                        Some(Err(e)) => {
                            tracing::error!("A critical task failed: {:?}. Initiating shutdown.", e);
                            self.cancellation_token.cancel();
                        }
                        None => break,
                    }
                }
                _ = self.cancellation_token.cancelled() => break,
            }
        }

        // --- Graceful Shutdown ---

        let shutdown_timeout = self.config.shutdown_timeout;
        let drain = async {
            while let Some(result) = self.join_set.join_next().await {
                if let Err(e) = result {
                    tracing::error!("A task failed during shutdown: {:?}", e);
                }
            }
        };
        if tokio::time::timeout(shutdown_timeout, drain).await.is_err() {
            tracing::warn!(
                "Tasks did not stop within the timeout of {:?}. Aborting the rest.",
                shutdown_timeout
            );
            self.join_set.shutdown().await;
        } else {
            tracing::info!("All supervised tasks have completed.");
        }

        tracing::info!("Supervisor shutdown complete.");
        Ok(())
    }

    fn spawn_signal_handler(&mut self) {
        let cancellation_token = self.cancellation_token.clone();
        self.join_set.spawn(async move {
            let ctrl_c = signal::ctrl_c();
            #[cfg(unix)]
            let terminate = async {
                signal::unix::signal(signal::unix::SignalKind::terminate())
                    .expect("Failed to register SIGTERM handler")
                    .recv()
                    .await;
            };
            #[cfg(not(unix))]
            let terminate = std::future::pending::<()>();

            tokio::select! {
                _ = cancellation_token.cancelled() => return,
                _ = ctrl_c => tracing::info!("SIGINT (Ctrl+C) received, initiating graceful shutdown."),
                _ = terminate => tracing::info!("SIGTERM received, initiating graceful shutdown."),
            }

            cancellation_token.cancel();
        });
    }
}
