//! Bounded retry escalation before a restart is requested.

use crate::error::{HealthError, Result};
use crate::evaluator::HealthEvaluator;
use crate::monitor::MonitorRef;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Decides whether persistent failures warrant a restart.
///
/// The first pass covers every monitor without forcing. Each retry then
/// force-checks only the monitors that failed the previous pass and ask
/// for a restart on failure, so the candidate set can only shrink. A
/// restart is requested once `threshold + 1` passes have failed.
pub struct RetryEscalator {
    evaluator: Arc<HealthEvaluator>,
    threshold: u32,
    interval: Duration,
}

impl RetryEscalator {
    /// Create an escalator retrying up to `threshold` times, `interval` apart
    pub fn new(evaluator: Arc<HealthEvaluator>, threshold: u32, interval: Duration) -> Self {
        Self {
            evaluator,
            threshold,
            interval,
        }
    }

    /// Run the escalation over `monitors`.
    ///
    /// Cancelling `interrupt` aborts a pending retry wait with
    /// [`HealthError::Interrupted`].
    pub async fn needs_restart(
        &self,
        monitors: &[MonitorRef],
        interrupt: &CancellationToken,
    ) -> Result<bool> {
        let mut candidates = monitors.to_vec();
        let mut force_check = false;
        let mut attempts: u32 = 0;

        loop {
            let evaluation = self.evaluator.evaluate(force_check, &candidates).await;
            candidates = evaluation
                .failed
                .into_iter()
                .filter(|monitor| monitor.needs_restart_on_failure())
                .collect();
            attempts += 1;

            if candidates.is_empty() {
                debug!(attempts, "No restart-eligible monitor is failing");
                return Ok(false);
            }

            if attempts > self.threshold {
                warn!(
                    attempts,
                    failing = candidates.len(),
                    "Restart-eligible monitors still failing after retries"
                );
                return Ok(true);
            }

            debug!(
                attempt = attempts,
                failing = candidates.len(),
                "Retrying failing monitors"
            );
            force_check = true;

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = interrupt.cancelled() => return Err(HealthError::Interrupted),
            }
        }
    }
}
