//! Periodic aggregation and alerting, driven by chain progress.

use tokio_util::sync::CancellationToken;

use super::{alert_evaluator::AlertEvaluator, correlation_service::StatsHandle};

/// Runs an aggregation cycle, dispatches its alerts, then waits until the
/// latest block has advanced by a full window before the next cycle.
pub struct AggregationScheduler {
    handle: StatsHandle,
    evaluator: AlertEvaluator,
    window: u64,
    cancellation_token: CancellationToken,
}

impl AggregationScheduler {
    /// Creates a scheduler cycling every `window` blocks.
    pub fn new(
        handle: StatsHandle,
        evaluator: AlertEvaluator,
        window: u64,
        cancellation_token: CancellationToken,
    ) -> Self {
        Self { handle, evaluator, window, cancellation_token }
    }

    /// Starts the long-running scheduling loop.
    pub async fn run(self) {
        let mut latest_rx = self.handle.subscribe_latest();

        loop {
            let report = tokio::select! {
                biased;

                _ = self.cancellation_token.cancelled() => break,
                report = self.handle.aggregation_cycle() => report,
            };
            let report = match report {
                Ok(report) => report,
                Err(e) => {
                    tracing::error!(error = %e, "Aggregation cycle failed, stopping scheduler.");
                    break;
                }
            };

            let summary = &report.summary;
            tracing::info!(
                latest_block = report.latest_block,
                message_count = summary.message_count,
                avg_latency = summary.avg_latency,
                missing_reception = summary.missing_reception,
                missing_relay = summary.missing_relay,
                "Aggregated latest window."
            );
            self.evaluator.dispatch(summary).await;

            let next_cycle_at = report.latest_block.saturating_add(self.window);
            tokio::select! {
                biased;

                _ = self.cancellation_token.cancelled() => break,
                changed = latest_rx.wait_for(|latest| *latest >= next_cycle_at) => {
                    if changed.is_err() {
                        tracing::warn!("Latest block feed closed, stopping scheduler.");
                        break;
                    }
                }
            }
        }
        tracing::info!("Aggregation scheduler has shut down.");
    }
}
