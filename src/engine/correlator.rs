//! Pairs sent messages with their executions and maintains the per-block
//! statistics.
//!
//! Sends and executions arrive on independent streams with no ordering
//! guarantee between them. Whichever side of a pair shows up first waits in
//! a pending buffer keyed by the message `Identifier` until the other side
//! arrives (or until retention purges it, which makes it permanently
//! missing).

use std::{collections::HashMap, sync::Arc};

use alloy::primitives::Address;
use thiserror::Error;

use super::{
    stats_store::BlockStatsStore,
    timestamp_resolver::{ResolutionError, TimestampResolver},
};
use crate::{
    abi::{DecodeError, EXECUTING_MESSAGE_EVENT, EventDecoder, SENT_MESSAGE_EVENT},
    config::AppConfig,
    models::{ChainRole, ContractRole, Identifier, IntervalStat, Log},
    providers::ChainReader,
};

/// Errors raised while correlating a single log.
#[derive(Debug, Error)]
pub enum CorrelationError {
    /// The log could not be decoded.
    #[error("Failed to decode log: {0}")]
    Decode(#[from] DecodeError),

    /// A block timestamp needed for the pairing could not be resolved.
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
}

/// What happened to a log handed to the correlator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrelationOutcome {
    /// The log is not a tracked event, or belongs to another sender/receiver
    /// pair.
    Ignored,
    /// The log is buffered until its counterpart arrives.
    Pending,
    /// The log completed a pair.
    Matched {
        /// Seconds between the send block and the execution block.
        latency: u64,
    },
}

/// Counts of what a retention pass deleted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetentionReport {
    /// Per-block statistics entries removed.
    pub purged_blocks: usize,
    /// Unmatched sends removed.
    pub purged_sends: usize,
    /// Unmatched executions removed.
    pub purged_executions: usize,
}

/// Static settings of a correlator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrelatorSettings {
    /// Chain id of the sender chain. Executions of messages from other
    /// chains are ignored.
    pub sender_chain_id: u64,
    /// Messenger contract whose messages are tracked.
    pub messenger_address: Address,
    /// Aggregation window `W`, in blocks.
    pub window: u64,
    /// Whether retention purges per-block statistics.
    pub purge_old_blocks: bool,
    /// Whether retention purges unmatched pending messages.
    pub purge_old_messages: bool,
}

impl CorrelatorSettings {
    /// Derives the settings from the application configuration.
    pub fn from_config(config: &AppConfig, sender_chain_id: u64) -> Self {
        Self {
            sender_chain_id,
            messenger_address: config.contracts.messenger_address,
            window: config.aggregate_block_amount,
            purge_old_blocks: config.purge_old_blocks,
            purge_old_messages: config.purge_old_messages,
        }
    }

    /// Entries at or below `latest - retention_span` are purged.
    pub fn retention_span(&self) -> u64 {
        self.window.saturating_mul(2)
    }
}

/// The correlation state machine. Owned by a single task.
pub struct MessageCorrelator {
    settings: CorrelatorSettings,
    decoder: Arc<EventDecoder>,
    sender_timestamps: TimestampResolver,
    receiver_timestamps: TimestampResolver,
    /// Sends waiting for their execution.
    outbox: HashMap<Identifier, Log>,
    /// Executions waiting for their send.
    inbox: HashMap<Identifier, Log>,
    stats: BlockStatsStore,
}

impl MessageCorrelator {
    /// Creates an empty correlator.
    pub fn new(
        settings: CorrelatorSettings,
        decoder: Arc<EventDecoder>,
        sender_reader: Arc<dyn ChainReader>,
        receiver_reader: Arc<dyn ChainReader>,
    ) -> Self {
        Self {
            settings,
            decoder,
            sender_timestamps: TimestampResolver::new(ChainRole::Sender, sender_reader),
            receiver_timestamps: TimestampResolver::new(ChainRole::Receiver, receiver_reader),
            outbox: HashMap::new(),
            inbox: HashMap::new(),
            stats: BlockStatsStore::new(),
        }
    }

    /// The correlator's settings.
    pub fn settings(&self) -> &CorrelatorSettings {
        &self.settings
    }

    /// Per-block statistics.
    pub fn stats(&self) -> &BlockStatsStore {
        &self.stats
    }

    /// Highest block observed on either stream.
    pub fn latest_block(&self) -> u64 {
        self.stats.latest_block()
    }

    /// Number of sends waiting for their execution.
    pub fn pending_sends(&self) -> usize {
        self.outbox.len()
    }

    /// Number of executions waiting for their send.
    pub fn pending_executions(&self) -> usize {
        self.inbox.len()
    }

    /// Handles a log emitted by the messenger on the sender chain.
    pub async fn add_sent_message(
        &mut self,
        log: Log,
    ) -> Result<CorrelationOutcome, CorrelationError> {
        let block_number = log.block_number().ok_or(DecodeError::MissingBlockNumber)?;
        self.stats.observe_block(block_number);

        let decoded =
            self.decoder.decode_log(ContractRole::Messenger, &log).map_err(DecodeError::from)?;
        if decoded.name != SENT_MESSAGE_EVENT {
            tracing::trace!(event = %decoded.name, block_number, "Ignoring messenger event.");
            return Ok(CorrelationOutcome::Ignored);
        }
        let log_index = log.log_index().ok_or(DecodeError::MissingLogIndex)?;

        self.stats.record_sent(block_number);

        let sent_at = self.sender_timestamps.timestamp(block_number).await?;
        let id = Identifier {
            origin: log.address(),
            block_number,
            log_index,
            timestamp: sent_at,
            chain_id: self.settings.sender_chain_id,
        };

        let Some(execution) = self.inbox.get(&id) else {
            tracing::debug!(block_number, log_index, "Sent message awaiting execution.");
            self.outbox.insert(id, log);
            return Ok(CorrelationOutcome::Pending);
        };

        let executed_in = execution.block_number().ok_or(DecodeError::MissingBlockNumber)?;
        let latency = self.latency(id.block_number, executed_in).await?;
        self.inbox.remove(&id);
        self.stats.record_match(id.block_number, latency);
        tracing::debug!(
            block_number,
            log_index,
            latency,
            "Matched sent message with earlier execution."
        );
        Ok(CorrelationOutcome::Matched { latency })
    }

    /// Handles a log emitted by the inbox on the receiver chain.
    ///
    /// Executions of messages from another chain id or another origin contract
    /// are ignored and never counted in `received_messages`, so they cannot
    /// show up as missing relays.
    pub async fn add_executing_message(
        &mut self,
        log: Log,
    ) -> Result<CorrelationOutcome, CorrelationError> {
        let block_number = log.block_number().ok_or(DecodeError::MissingBlockNumber)?;
        self.stats.observe_block(block_number);

        let decoded =
            self.decoder.decode_log(ContractRole::Inbox, &log).map_err(DecodeError::from)?;
        if decoded.name != EXECUTING_MESSAGE_EVENT {
            tracing::trace!(event = %decoded.name, block_number, "Ignoring inbox event.");
            return Ok(CorrelationOutcome::Ignored);
        }
        let id_value = decoded.param("id").ok_or_else(|| DecodeError::MissingField {
            event: decoded.name.clone(),
            field: "id",
        })?;
        let id = Identifier::try_from(id_value)?;

        if id.chain_id != self.settings.sender_chain_id
            || id.origin != self.settings.messenger_address
        {
            tracing::trace!(
                chain_id = id.chain_id,
                origin = %id.origin,
                "Ignoring execution of a message from an untracked sender."
            );
            return Ok(CorrelationOutcome::Ignored);
        }

        self.stats.record_received(id.block_number);

        if !self.outbox.contains_key(&id) {
            tracing::debug!(
                sent_in = id.block_number,
                executed_in = block_number,
                "Execution awaiting its sent message."
            );
            self.inbox.insert(id, log);
            return Ok(CorrelationOutcome::Pending);
        }

        let latency = self.latency(id.block_number, block_number).await?;
        self.outbox.remove(&id);
        self.stats.record_match(id.block_number, latency);
        tracing::debug!(
            sent_in = id.block_number,
            executed_in = block_number,
            latency,
            "Matched execution with earlier sent message."
        );
        Ok(CorrelationOutcome::Matched { latency })
    }

    /// Seconds between the two blocks' timestamps. Receiver clocks running
    /// behind the sender's yield zero.
    async fn latency(&mut self, sent_in: u64, executed_in: u64) -> Result<u64, ResolutionError> {
        let sent_at = self.sender_timestamps.timestamp(sent_in).await?;
        let executed_at = self.receiver_timestamps.timestamp(executed_in).await?;
        Ok(executed_at.checked_sub(sent_at).unwrap_or_else(|| {
            tracing::warn!(
                sent_in,
                sent_at,
                executed_in,
                executed_at,
                "Execution timestamp precedes send timestamp, recording zero latency."
            );
            0
        }))
    }

    /// Summary of the latest `count` blocks.
    pub fn aggregate_latest(&self, count: u64) -> IntervalStat {
        self.stats.aggregate_latest(count)
    }

    /// Deletes state at or below `latest - 2W`, as enabled by the purge
    /// flags, and trims the timestamp caches to the same span.
    pub fn run_retention(&mut self) -> RetentionReport {
        let span = self.settings.retention_span();
        self.sender_timestamps.retain_recent(span);
        self.receiver_timestamps.retain_recent(span);

        let Some(horizon) = self.stats.latest_block().checked_sub(span) else {
            return RetentionReport::default();
        };

        let mut report = RetentionReport::default();
        if self.settings.purge_old_blocks {
            report.purged_blocks = self.stats.purge_through(horizon);
        }
        if self.settings.purge_old_messages {
            let sends = self.outbox.len();
            self.outbox.retain(|id, _| id.block_number > horizon);
            report.purged_sends = sends - self.outbox.len();

            let executions = self.inbox.len();
            self.inbox.retain(|id, _| id.block_number > horizon);
            report.purged_executions = executions - self.inbox.len();
        }

        if report != RetentionReport::default() {
            tracing::info!(
                horizon,
                purged_blocks = report.purged_blocks,
                purged_sends = report.purged_sends,
                purged_executions = report.purged_executions,
                "Purged state beyond the retention horizon."
            );
        }
        report
    }

    /// One aggregation cycle: summarizes the latest window, then applies
    /// retention.
    pub fn aggregation_cycle(&mut self) -> IntervalStat {
        let summary = self.stats.aggregate_latest(self.settings.window);
        self.run_retention();
        summary
    }
}
