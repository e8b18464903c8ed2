//! This module contains the `EventDecoder`, a registry of contract ABIs keyed
//! by the role the contract plays in the monitored pair.
//!
//! The decoder is built once at startup and handed explicitly to the
//! components that need it. ABIs are loaded at runtime from JSON, so the
//! `sol!` macro is not used.

mod definitions;

use std::collections::HashMap;

use alloy::{
    dyn_abi::{self, DynSolValue, EventExt},
    json_abi::{Event, JsonAbi},
    primitives::B256,
};
use thiserror::Error;

pub use definitions::{
    EXECUTING_MESSAGE_EVENT, INBOX_EVENTS_JSON, MESSENGER_EVENTS_JSON, SENT_MESSAGE_EVENT,
};

use crate::models::{ContractRole, Log};

/// A pre-processed, cached representation of a contract's events.
#[derive(Debug, Clone, Default)]
struct CachedContract {
    /// A map from an event's 32-byte topic hash to its `Event` definition.
    events: HashMap<B256, Event>,
}

impl From<&JsonAbi> for CachedContract {
    fn from(abi: &JsonAbi) -> Self {
        let events = abi
            .events()
            .map(|event| (event.selector(), event.clone()))
            .collect::<HashMap<B256, Event>>();

        Self { events }
    }
}

/// Custom error type for the `EventDecoder`.
#[derive(Error, Debug)]
pub enum AbiError {
    /// Returned when no ABI is registered for the given contract role
    #[error("No ABI registered for the {0} contract")]
    AbiNotFound(ContractRole),

    /// Returned when an event signature (topic hash) is not found in the contract ABI
    #[error("Unknown event signature: {0}")]
    UnknownEvent(B256),

    /// Returned when a log has no topics and thus cannot be identified as an event
    #[error("Log has no topics, cannot identify event")]
    LogHasNoTopics,

    /// Returned when an embedded ABI definition cannot be parsed
    #[error("Invalid ABI definition: {0}")]
    InvalidAbi(#[from] serde_json::Error),

    /// Wrapper for decoding errors from the underlying ABI decoding library
    #[error("Failed to decode data: {0}")]
    DecodingError(#[from] dyn_abi::Error),
}

/// Errors raised while turning a log into correlation data.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The log could not be decoded against the registered ABI.
    #[error(transparent)]
    Abi(#[from] AbiError),

    /// The log carries no block number (pending log).
    #[error("Log is missing its block number")]
    MissingBlockNumber,

    /// The log carries no log index (pending log).
    #[error("Log is missing its log index")]
    MissingLogIndex,

    /// A decoded event lacks an expected field.
    #[error("Event {event} has no field `{field}`")]
    MissingField {
        /// The decoded event name.
        event: String,
        /// The expected field.
        field: &'static str,
    },

    /// A field is present but has an unexpected type or value.
    #[error("Invalid field `{field}`: {reason}")]
    InvalidField {
        /// The offending field.
        field: &'static str,
        /// What was wrong with it.
        reason: String,
    },
}

/// Represents a decoded event log.
#[derive(Debug, Clone)]
pub struct DecodedLog {
    /// The name of the decoded event.
    pub name: String,
    /// The decoded parameters of the event, in ABI order.
    pub params: Vec<(String, DynSolValue)>,
}

impl DecodedLog {
    /// Returns the value of the named parameter.
    pub fn param(&self, name: &str) -> Option<&DynSolValue> {
        self.params.iter().find(|(param, _)| param == name).map(|(_, value)| value)
    }
}

/// A registry of event ABIs keyed by contract role.
#[derive(Debug, Default)]
pub struct EventDecoder {
    contracts: HashMap<ContractRole, CachedContract>,
}

impl EventDecoder {
    /// Creates an empty decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a decoder loaded with the messenger and inbox event ABIs.
    pub fn with_default_abis() -> Result<Self, AbiError> {
        let messenger: JsonAbi = serde_json::from_str(MESSENGER_EVENTS_JSON)?;
        let inbox: JsonAbi = serde_json::from_str(INBOX_EVENTS_JSON)?;

        let mut decoder = Self::new();
        decoder.register(ContractRole::Messenger, &messenger);
        decoder.register(ContractRole::Inbox, &inbox);
        Ok(decoder)
    }

    /// Registers (or replaces) the ABI for a contract role.
    pub fn register(&mut self, role: ContractRole, abi: &JsonAbi) {
        self.contracts.insert(role, CachedContract::from(abi));
    }

    /// Checks if an ABI is registered for the given role.
    pub fn is_registered(&self, role: ContractRole) -> bool {
        self.contracts.contains_key(&role)
    }

    /// Returns the topic hash of the named event of a contract role.
    pub fn event_selector(&self, role: ContractRole, name: &str) -> Option<B256> {
        self.contracts
            .get(&role)?
            .events
            .iter()
            .find(|(_, event)| event.name == name)
            .map(|(selector, _)| *selector)
    }

    /// Decodes an event log emitted by the contract playing `role`.
    pub fn decode_log(&self, role: ContractRole, log: &Log) -> Result<DecodedLog, AbiError> {
        let contract = self.contracts.get(&role).ok_or(AbiError::AbiNotFound(role))?;

        let selector = log.event_selector().ok_or(AbiError::LogHasNoTopics)?;
        let event = contract.events.get(&selector).ok_or(AbiError::UnknownEvent(selector))?;

        let decoded = event.decode_log_parts(log.topics().iter().copied(), log.data().as_ref())?;

        let mut indexed = decoded.indexed.into_iter();
        let mut body = decoded.body.into_iter();
        let params: Vec<(String, DynSolValue)> = event
            .inputs
            .iter()
            .filter_map(|input| {
                let value = if input.indexed { indexed.next() } else { body.next() };
                value.map(|value| (input.name.clone(), value))
            })
            .collect();

        tracing::trace!(event = %event.name, params = params.len(), %role, "Decoded event.");

        Ok(DecodedLog { name: event.name.clone(), params })
    }
}
