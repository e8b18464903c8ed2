//! Threshold checks over an interval summary.

use std::{fmt, sync::Arc};

use crate::{config::AlertThresholds, models::IntervalStat, notification::AlertNotifier};

/// The kinds of alert the monitor raises.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertType {
    /// Average delivery latency above its threshold.
    AverageLatency,
    /// Too many sends without an execution.
    MissingReception,
    /// Too many executions without a send.
    MissingRelay,
}

impl AlertType {
    /// The label used in alert messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::AverageLatency => "Average Latency",
            AlertType::MissingReception => "Missing Reception",
            AlertType::MissingRelay => "Missing Relay",
        }
    }
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A threshold crossing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    /// Which threshold was crossed.
    pub alert_type: AlertType,
    /// The offending value, formatted for display.
    pub trigger_value: String,
}

/// Compares interval summaries against the configured thresholds and sends
/// the resulting alerts.
pub struct AlertEvaluator {
    thresholds: AlertThresholds,
    notifier: Arc<dyn AlertNotifier>,
}

impl AlertEvaluator {
    /// Creates an evaluator.
    pub fn new(thresholds: AlertThresholds, notifier: Arc<dyn AlertNotifier>) -> Self {
        Self { thresholds, notifier }
    }

    /// Alerts fired by `stat`. A zero threshold never fires; otherwise the
    /// value must be strictly above the threshold.
    pub fn evaluate(&self, stat: &IntervalStat) -> Vec<Alert> {
        let thresholds = &self.thresholds;
        let mut alerts = Vec::new();

        if thresholds.avg_latency_min != 0.0 && stat.avg_latency > thresholds.avg_latency_min {
            alerts.push(Alert {
                alert_type: AlertType::AverageLatency,
                trigger_value: format!("{:.6}", stat.avg_latency),
            });
        }
        if thresholds.missing_reception_min != 0
            && stat.missing_reception > thresholds.missing_reception_min
        {
            alerts.push(Alert {
                alert_type: AlertType::MissingReception,
                trigger_value: stat.missing_reception.to_string(),
            });
        }
        if thresholds.missing_relay_min != 0 && stat.missing_relay > thresholds.missing_relay_min {
            alerts.push(Alert {
                alert_type: AlertType::MissingRelay,
                trigger_value: stat.missing_relay.to_string(),
            });
        }

        alerts
    }

    /// Evaluates `stat` and sends every fired alert. Delivery failures are
    /// logged. Returns the alerts that fired.
    pub async fn dispatch(&self, stat: &IntervalStat) -> Vec<Alert> {
        let alerts = self.evaluate(stat);
        for alert in &alerts {
            tracing::warn!(
                alert_type = %alert.alert_type,
                value = %alert.trigger_value,
                "Alert threshold crossed."
            );
            let result =
                self.notifier.notify(alert.alert_type.as_str(), &alert.trigger_value, stat).await;
            if let Err(e) = result {
                tracing::error!(alert_type = %alert.alert_type, error = %e, "Alert not delivered.");
            }
        }
        alerts
    }
}

#[cfg(test)]
mod tests {
    use mockall::predicate::{always, function};

    use super::*;
    use crate::notification::{MockAlertNotifier, NotificationError};

    fn stat(avg_latency: f64, missing_reception: u64, missing_relay: u64) -> IntervalStat {
        IntervalStat { avg_latency, missing_reception, missing_relay, ..Default::default() }
    }

    fn evaluator(thresholds: AlertThresholds) -> AlertEvaluator {
        AlertEvaluator::new(thresholds, Arc::new(MockAlertNotifier::new()))
    }

    #[test]
    fn test_zero_thresholds_never_fire() {
        let evaluator = evaluator(AlertThresholds::default());
        assert!(evaluator.evaluate(&stat(1e9, u64::MAX, u64::MAX)).is_empty());
    }

    #[test]
    fn test_threshold_is_strict() {
        let evaluator = evaluator(AlertThresholds {
            avg_latency_min: 30.0,
            missing_relay_min: 2,
            missing_reception_min: 2,
        });
        assert!(evaluator.evaluate(&stat(30.0, 2, 2)).is_empty());
    }

    #[test]
    fn test_several_alerts_fire_together() {
        let evaluator = evaluator(AlertThresholds {
            avg_latency_min: 10.0,
            missing_relay_min: 1,
            missing_reception_min: 1,
        });
        let alerts = evaluator.evaluate(&stat(12.5, 3, 2));

        assert_eq!(
            alerts,
            vec![
                Alert { alert_type: AlertType::AverageLatency, trigger_value: "12.500000".into() },
                Alert { alert_type: AlertType::MissingReception, trigger_value: "3".into() },
                Alert { alert_type: AlertType::MissingRelay, trigger_value: "2".into() },
            ]
        );
    }

    #[tokio::test]
    async fn test_dispatch_sends_fired_alerts() {
        let mut notifier = MockAlertNotifier::new();
        notifier
            .expect_notify()
            .with(
                function(|alert_type: &str| alert_type == "Missing Relay"),
                function(|value: &str| value == "5"),
                always(),
            )
            .times(1)
            .returning(|_, _, _| Ok(()));

        let evaluator = AlertEvaluator::new(
            AlertThresholds { missing_relay_min: 4, ..Default::default() },
            Arc::new(notifier),
        );
        let alerts = evaluator.dispatch(&stat(0.0, 0, 5)).await;
        assert_eq!(alerts.len(), 1);
    }

    #[tokio::test]
    async fn test_dispatch_survives_delivery_failure() {
        let mut notifier = MockAlertNotifier::new();
        notifier
            .expect_notify()
            .times(2)
            .returning(|_, _, _| Err(NotificationError::NotifyFailed("down".into())));

        let evaluator = AlertEvaluator::new(
            AlertThresholds {
                missing_relay_min: 1,
                missing_reception_min: 1,
                ..Default::default()
            },
            Arc::new(notifier),
        );
        let alerts = evaluator.dispatch(&stat(0.0, 2, 2)).await;
        assert_eq!(alerts.len(), 2);
    }
}
