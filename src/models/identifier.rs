//! The identifier of a cross-chain message.

use alloy::{
    dyn_abi::DynSolValue,
    primitives::{Address, U256},
};
use serde::{Deserialize, Serialize};

use crate::abi::DecodeError;

/// Uniquely names a cross-chain message by the sender-side log that emitted
/// it.
///
/// The delivery event on the receiver chain embeds this value in its `id`
/// field, which makes it the key used to pair the two streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identifier {
    /// The contract that emitted the initiating log.
    pub origin: Address,
    /// The sender-chain block containing the initiating log.
    pub block_number: u64,
    /// The index of the initiating log within its block.
    pub log_index: u64,
    /// The timestamp of `block_number` on the sender chain.
    pub timestamp: u64,
    /// The chain id of the sender chain.
    pub chain_id: u64,
}

impl Identifier {
    /// Encodes the identifier as the ABI tuple
    /// `(address,uint256,uint256,uint256,uint256)`.
    pub fn to_sol_value(&self) -> DynSolValue {
        DynSolValue::Tuple(vec![
            DynSolValue::Address(self.origin),
            DynSolValue::Uint(U256::from(self.block_number), 256),
            DynSolValue::Uint(U256::from(self.log_index), 256),
            DynSolValue::Uint(U256::from(self.timestamp), 256),
            DynSolValue::Uint(U256::from(self.chain_id), 256),
        ])
    }
}

fn uint_field(value: &DynSolValue, field: &'static str) -> Result<u64, DecodeError> {
    match value {
        DynSolValue::Uint(v, _) => u64::try_from(*v).map_err(|_| DecodeError::InvalidField {
            field,
            reason: format!("value {v} does not fit in 64 bits"),
        }),
        other => Err(DecodeError::InvalidField {
            field,
            reason: format!("expected uint, got {other:?}"),
        }),
    }
}

impl TryFrom<&DynSolValue> for Identifier {
    type Error = DecodeError;

    fn try_from(value: &DynSolValue) -> Result<Self, Self::Error> {
        let fields = match value {
            DynSolValue::Tuple(fields) => fields.as_slice(),
            DynSolValue::CustomStruct { tuple, .. } => tuple.as_slice(),
            other => {
                return Err(DecodeError::InvalidField {
                    field: "id",
                    reason: format!("expected tuple, got {other:?}"),
                });
            }
        };

        let [origin, block_number, log_index, timestamp, chain_id] = fields else {
            return Err(DecodeError::InvalidField {
                field: "id",
                reason: format!("expected 5 components, got {}", fields.len()),
            });
        };

        let origin = match origin {
            DynSolValue::Address(address) => *address,
            other => {
                return Err(DecodeError::InvalidField {
                    field: "origin",
                    reason: format!("expected address, got {other:?}"),
                });
            }
        };

        Ok(Self {
            origin,
            block_number: uint_field(block_number, "blockNumber")?,
            log_index: uint_field(log_index, "logIndex")?,
            timestamp: uint_field(timestamp, "timestamp")?,
            chain_id: uint_field(chain_id, "chainId")?,
        })
    }
}
