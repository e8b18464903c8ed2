//! This module provides the `SupervisorBuilder` for constructing a `Supervisor`.

use std::sync::Arc;

use super::{Supervisor, SupervisorError};
use crate::{
    abi::EventDecoder,
    config::AppConfig,
    models::{ChainRole, ContractRole},
    notification::AlertNotifier,
    providers::ChainReader,
};

/// A builder for creating a `Supervisor` instance.
#[derive(Default)]
pub struct SupervisorBuilder {
    config: Option<AppConfig>,
    sender_reader: Option<Arc<dyn ChainReader>>,
    receiver_reader: Option<Arc<dyn ChainReader>>,
    decoder: Option<Arc<EventDecoder>>,
    notifier: Option<Arc<dyn AlertNotifier>>,
}

impl SupervisorBuilder {
    /// Creates a new, empty `SupervisorBuilder`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the application configuration for the `Supervisor`.
    pub fn config(mut self, config: AppConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the reader for the chain the messenger lives on.
    pub fn sender_reader(mut self, reader: Arc<dyn ChainReader>) -> Self {
        self.sender_reader = Some(reader);
        self
    }

    /// Sets the reader for the chain the inbox lives on.
    pub fn receiver_reader(mut self, reader: Arc<dyn ChainReader>) -> Self {
        self.receiver_reader = Some(reader);
        self
    }

    /// Sets the event decoder.
    pub fn decoder(mut self, decoder: Arc<EventDecoder>) -> Self {
        self.decoder = Some(decoder);
        self
    }

    /// Sets the destination of threshold alerts.
    pub fn notifier(mut self, notifier: Arc<dyn AlertNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Checks that every component was provided, that the decoder knows both
    /// contracts, and resolves the sender chain id.
    pub async fn build(self) -> Result<Supervisor, SupervisorError> {
        let config = self.config.ok_or(SupervisorError::MissingConfig)?;
        let sender_reader = self.sender_reader.ok_or(SupervisorError::MissingSenderReader)?;
        let receiver_reader = self.receiver_reader.ok_or(SupervisorError::MissingReceiverReader)?;
        let decoder = self.decoder.ok_or(SupervisorError::MissingDecoder)?;
        let notifier = self.notifier.ok_or(SupervisorError::MissingNotifier)?;

        for role in [ContractRole::Messenger, ContractRole::Inbox] {
            if !decoder.is_registered(role) {
                return Err(SupervisorError::UnregisteredContract(role));
            }
        }

        let sender_chain_id = sender_reader
            .chain_id()
            .await
            .map_err(|source| SupervisorError::Startup { chain: ChainRole::Sender, source })?;
        tracing::debug!(sender_chain_id, "Resolved sender chain id.");

        Ok(Supervisor::new(
            config,
            sender_reader,
            receiver_reader,
            decoder,
            notifier,
            sender_chain_id,
        ))
    }
}
