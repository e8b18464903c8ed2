//! Statistics tracked per sender block and derived over block ranges.

use alloy::primitives::U256;
use serde::{Deserialize, Serialize, Serializer};

/// Serializes a `U256` as a decimal string.
fn serialize_u256_decimal<S>(value: &U256, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.to_string())
}

fn average_latency(total_latency: U256, message_count: u64) -> f64 {
    if message_count == 0 {
        return 0.0;
    }
    let total = u128::try_from(total_latency).unwrap_or(u128::MAX);
    total as f64 / message_count as f64
}

/// Counters for a single sender-chain block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockStat {
    /// Number of sent messages from this block that were matched with their
    /// execution.
    pub message_count: u64,
    /// Sum of the delivery latencies (seconds) of the matched messages.
    #[serde(serialize_with = "serialize_u256_decimal")]
    pub total_latency: U256,
    /// Number of `SentMessage` events seen in this block.
    pub sent_messages: u64,
    /// Number of executions whose identifier points at this block.
    pub received_messages: u64,
}

impl BlockStat {
    /// Sent messages never observed as executed.
    pub fn missing_reception(&self) -> u64 {
        self.sent_messages.saturating_sub(self.message_count)
    }

    /// Executions whose send was never observed.
    pub fn missing_relay(&self) -> u64 {
        self.received_messages.saturating_sub(self.message_count)
    }

    /// Unmatched events of both sides, each counted once.
    pub fn missing_part(&self) -> u64 {
        (self.received_messages + self.sent_messages).saturating_sub(2 * self.message_count)
    }

    /// The compact representation served by the query API.
    pub fn pretty(&self) -> PrettyStat {
        PrettyStat {
            message_count: self.message_count,
            avg_latency: average_latency(self.total_latency, self.message_count),
            missing_part: self.missing_part(),
            missing_reception: self.missing_reception(),
            missing_relay: self.missing_relay(),
        }
    }
}

/// The per-block (or per-bin) view returned by range queries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrettyStat {
    /// Matched messages.
    pub message_count: u64,
    /// Average latency of the matched messages, `0` when nothing matched.
    pub avg_latency: f64,
    /// `(received + sent) - 2 * matched`.
    #[serde(rename = "missingMessages")]
    pub missing_part: u64,
    /// Sent but never executed.
    pub missing_reception: u64,
    /// Executed but never seen as sent.
    pub missing_relay: u64,
}

/// Running sums for one bin of a binned range query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BinStat {
    /// Matched messages in the bin.
    pub message_count: u64,
    /// Summed latency of the matched messages.
    pub total_latency: U256,
    /// Summed `missing_part` of the blocks in the bin.
    pub missing_part: u64,
    /// Summed `missing_reception` of the blocks in the bin.
    pub missing_reception: u64,
    /// Summed `missing_relay` of the blocks in the bin.
    pub missing_relay: u64,
}

impl BinStat {
    /// Folds one block into the bin.
    pub fn add(&mut self, block: &BlockStat) {
        self.message_count += block.message_count;
        self.total_latency = self.total_latency.saturating_add(block.total_latency);
        self.missing_part += block.missing_part();
        self.missing_reception += block.missing_reception();
        self.missing_relay += block.missing_relay();
    }

    /// The compact representation served by the query API.
    pub fn pretty(&self) -> PrettyStat {
        PrettyStat {
            message_count: self.message_count,
            avg_latency: average_latency(self.total_latency, self.message_count),
            missing_part: self.missing_part,
            missing_reception: self.missing_reception,
            missing_relay: self.missing_relay,
        }
    }
}

/// Summary over a range of sender blocks. Derived on demand, never stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntervalStat {
    /// Matched messages.
    pub message_count: u64,
    /// Sum of the latencies of the matched messages.
    #[serde(serialize_with = "serialize_u256_decimal")]
    pub total_latency: U256,
    /// `total_latency / message_count`, or `0` when nothing matched.
    pub avg_latency: f64,
    /// Sent messages in the range.
    pub sent_messages: u64,
    /// Executions attributed to the range.
    pub received_messages: u64,
    /// `received_messages - message_count`.
    pub missing_relay: u64,
    /// `sent_messages - message_count`.
    pub missing_reception: u64,
}

impl IntervalStat {
    /// Sums the given block counters into an interval summary.
    pub fn from_blocks<'a, I>(blocks: I) -> Self
    where
        I: IntoIterator<Item = &'a BlockStat>,
    {
        let mut stat = Self::default();
        for block in blocks {
            stat.message_count += block.message_count;
            stat.total_latency = stat.total_latency.saturating_add(block.total_latency);
            stat.sent_messages += block.sent_messages;
            stat.received_messages += block.received_messages;
        }
        stat.missing_relay = stat.received_messages.saturating_sub(stat.message_count);
        stat.missing_reception = stat.sent_messages.saturating_sub(stat.message_count);
        stat.avg_latency = average_latency(stat.total_latency, stat.message_count);
        stat
    }
}
