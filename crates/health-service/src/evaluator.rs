//! One sweep over a monitor list.

use crate::metrics::HealthGauge;
use crate::monitor::MonitorRef;
use crate::state::StatusFilter;
use crate::types::{AggregateStatus, HEALTHY, IS_HEALTHY, IS_UNHEALTHY, SERVICE_HEALTH, UNHEALTHY};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Outcome of a single evaluation pass
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// Monitors that reported unhealthy, in evaluation order
    pub failed: Vec<MonitorRef>,

    /// Aggregate verdict of the pass
    pub status: AggregateStatus,

    /// Whether the verdict differed from the previous pass
    pub transitioned: bool,
}

/// Runs monitors and publishes their verdicts.
///
/// Passes are serialized: the evaluation lock is held from the first
/// monitor invocation until the state-change comparison, so gauge writes
/// of concurrent callers never interleave.
pub struct HealthEvaluator {
    node_name: String,
    gauge: Arc<dyn HealthGauge>,
    filter: Mutex<StatusFilter>,
}

impl HealthEvaluator {
    /// Create a new evaluator publishing under `node_name`
    pub fn new(node_name: impl Into<String>, gauge: Arc<dyn HealthGauge>) -> Self {
        Self {
            node_name: node_name.into(),
            gauge,
            filter: Mutex::new(StatusFilter::new()),
        }
    }

    /// Node label used for every gauge
    pub fn node_name(&self) -> &str {
        &self.node_name
    }

    /// Last narrated aggregate status
    pub async fn last_status(&self) -> Option<AggregateStatus> {
        self.filter.lock().await.last().cloned()
    }

    /// Check every monitor in order and publish the results.
    pub async fn evaluate(&self, force_check: bool, monitors: &[MonitorRef]) -> Evaluation {
        let mut filter = self.filter.lock().await;

        let mut failed = Vec::new();
        let mut description = String::new();

        for monitor in monitors {
            let monitor_name = monitor.monitor_name();
            let metric_name = monitor.metric_name();

            let healthy = match monitor.is_healthy(force_check).await {
                Ok(healthy) => healthy,
                Err(e) => {
                    warn!(
                        monitor = monitor_name,
                        error = %e,
                        "Health monitor failed, counting as unhealthy"
                    );
                    false
                }
            };

            if healthy {
                description.push_str(monitor_name);
                description.push_str(IS_HEALTHY);
                self.gauge.set(HEALTHY, &self.node_name, metric_name);
            } else {
                description.push_str(monitor_name);
                description.push_str(IS_UNHEALTHY);
                self.gauge.set(UNHEALTHY, &self.node_name, metric_name);
                failed.push(monitor.clone());
            }
        }

        let status = if failed.is_empty() {
            AggregateStatus::healthy(description)
        } else {
            AggregateStatus::unhealthy(description)
        };
        self.gauge.set(status.gauge_value(), &self.node_name, SERVICE_HEALTH);

        let transitioned = filter.observe(&status);
        debug!(
            force = force_check,
            checked = monitors.len(),
            failed = failed.len(),
            "Health evaluation pass complete"
        );

        Evaluation {
            failed,
            status,
            transitioned,
        }
    }
}
