use serde::Deserialize;

/// Thresholds checked at the end of every aggregation cycle.
///
/// A zero threshold disables its check.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq)]
#[serde(default)]
pub struct AlertThresholds {
    /// Fires when the interval's average latency (seconds) exceeds this value.
    pub avg_latency_min: f64,
    /// Fires when the interval's missing-relay count exceeds this value.
    pub missing_relay_min: u64,
    /// Fires when the interval's missing-reception count exceeds this value.
    pub missing_reception_min: u64,
}

impl AlertThresholds {
    /// Returns true if no check is enabled.
    pub fn is_disabled(&self) -> bool {
        self.avg_latency_min == 0.0
            && self.missing_relay_min == 0
            && self.missing_reception_min == 0
    }
}
