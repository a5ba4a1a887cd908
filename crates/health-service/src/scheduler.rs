//! Background scheduling of health escalation and restart callbacks.

use crate::error::{HealthError, Result};
use crate::escalator::RetryEscalator;
use crate::evaluator::{Evaluation, HealthEvaluator};
use crate::metrics::HealthGauge;
use crate::monitor::MonitorRef;
use crate::registry;
use crate::types::HealthServiceConfig;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, trace, warn};

/// Restart hook invoked when escalation decides the process is unhealthy.
///
/// Runs on the blocking thread pool, so an implementation may block.
#[cfg_attr(test, mockall::automock)]
pub trait RestartCallback: Send + Sync {
    /// Attempt a restart. Returning true stops the scheduler.
    fn perform_restart(&self) -> bool;
}

impl<F> RestartCallback for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn perform_restart(&self) -> bool {
        self()
    }
}

/// Handle to the running background worker
struct SchedulerTask {
    handle: JoinHandle<()>,
    /// Stops scheduling new ticks
    stop: CancellationToken,
    /// Interrupts an in-flight retry wait
    interrupt: CancellationToken,
}

/// Result of one scheduled tick
enum TickOutcome {
    Continue,
    Restarted,
}

struct Inner {
    config: HealthServiceConfig,
    monitors: RwLock<Arc<Vec<MonitorRef>>>,
    evaluator: Arc<HealthEvaluator>,
    escalator: RetryEscalator,
    started: AtomicBool,
    callback: RwLock<Option<Arc<dyn RestartCallback>>>,
    task: Mutex<Option<SchedulerTask>>,
}

/// Health aggregation service.
///
/// Owns the working set of monitors, a single background worker that
/// periodically runs the retry escalation, and the restart callback.
/// Cloning yields another handle to the same service.
#[derive(Clone)]
pub struct HealthService {
    inner: Arc<Inner>,
}

impl HealthService {
    /// Create a service with an empty monitor set
    pub fn new(config: HealthServiceConfig, gauge: Arc<dyn HealthGauge>) -> Self {
        let evaluator = Arc::new(HealthEvaluator::new(config.node_name.clone(), gauge));
        let escalator = RetryEscalator::new(
            evaluator.clone(),
            config.failure_retry_threshold,
            config.failure_retry_interval,
        );

        Self {
            inner: Arc::new(Inner {
                config,
                monitors: RwLock::new(Arc::new(Vec::new())),
                evaluator,
                escalator,
                started: AtomicBool::new(false),
                callback: RwLock::new(None),
                task: Mutex::new(None),
            }),
        }
    }

    /// Service configuration
    pub fn config(&self) -> &HealthServiceConfig {
        &self.inner.config
    }

    /// Replace the working set with the enabled subset of `monitors`.
    ///
    /// On a duplicate metric name the previous working set is kept.
    pub async fn initialize<I>(&self, monitors: I) -> Result<()>
    where
        I: IntoIterator<Item = MonitorRef>,
    {
        let enabled = registry::enabled_monitors(monitors)?;
        info!(count = enabled.len(), "Health monitors registered");
        *self.inner.monitors.write().await = Arc::new(enabled);
        Ok(())
    }

    /// Snapshot of the current working set
    pub async fn monitors(&self) -> Arc<Vec<MonitorRef>> {
        self.inner.monitors.read().await.clone()
    }

    /// Evaluate `monitors` once, publishing gauges and narrating transitions
    pub async fn check_health(&self, force_check: bool, monitors: &[MonitorRef]) -> Evaluation {
        self.inner.evaluator.evaluate(force_check, monitors).await
    }

    /// Forced pass over every enabled monitor, outside the schedule.
    ///
    /// Returns the monitors that failed. Does not retry and does not start
    /// the background worker.
    pub async fn trigger_initial_check(&self) -> Vec<MonitorRef> {
        let monitors = self.monitors().await;
        let failed = self.inner.evaluator.evaluate(true, &monitors).await.failed;

        if failed.is_empty() {
            info!("Initial health check has passed");
        } else {
            error!(failed = failed.len(), "Initial health check failed");
        }
        failed
    }

    /// Run the retry escalation over the working set.
    ///
    /// Marks the service as started.
    pub async fn needs_restart(&self, interrupt: &CancellationToken) -> Result<bool> {
        self.inner.needs_restart(interrupt).await
    }

    /// Register the restart callback, replacing any previous one
    pub async fn register_callback(&self, callback: Arc<dyn RestartCallback>) {
        *self.inner.callback.write().await = Some(callback);
        info!("Registered health service callback");
    }

    /// True once a scheduled escalation has run and until the service stops
    pub fn is_started(&self) -> bool {
        self.inner.started.load(Ordering::Acquire)
    }

    /// True while a background worker is alive
    pub async fn is_scheduled(&self) -> bool {
        self.inner
            .task
            .lock()
            .await
            .as_ref()
            .is_some_and(|task| !task.handle.is_finished())
    }

    /// Start the background worker. No-op if it is already running.
    ///
    /// Waits for a concurrent `close` to finish first.
    pub async fn start(&self) {
        let mut task = self.inner.task.lock().await;
        if task.as_ref().is_some_and(|t| !t.handle.is_finished()) {
            return;
        }

        let stop = CancellationToken::new();
        let interrupt = CancellationToken::new();
        let inner = self.inner.clone();
        let handle = tokio::spawn(Inner::run(inner, stop.clone(), interrupt.clone()));

        info!(
            initial_delay_ms = self.inner.config.initial_delay.as_millis(),
            interval_ms = self.inner.config.retry_interval.as_millis(),
            "Health service scheduler started"
        );
        *task = Some(SchedulerTask {
            handle,
            stop,
            interrupt,
        });
    }

    /// Stop the background worker.
    ///
    /// Stops scheduling, waits `shutdown_buffer` for the current tick, then
    /// interrupts and aborts it and waits once more. Returns false if the
    /// worker still had not terminated, in which case the worker stays in
    /// its slot and the service stays marked as started. The task slot
    /// stays locked throughout, so `start` cannot spawn a second worker
    /// while this one winds down.
    pub async fn close(&self) -> bool {
        let mut slot = self.inner.task.lock().await;
        let Some(task) = slot.take() else {
            return true;
        };

        let grace = self.inner.config.shutdown_buffer;
        let SchedulerTask {
            mut handle,
            stop,
            interrupt,
        } = task;

        info!("Shutting down health service scheduler");
        stop.cancel();

        let mut terminated = timeout(grace, &mut handle).await.is_ok();
        if !terminated {
            info!(
                "Shutting down health service scheduler forcefully, \
                 it has not responded to graceful shutdown"
            );
            interrupt.cancel();
            handle.abort();
            terminated = timeout(grace, &mut handle).await.is_ok();
            if !terminated {
                error!(
                    wait_ms = grace.as_millis(),
                    "Health service scheduler not closed after waiting"
                );
            }
        }

        if terminated {
            self.inner.started.store(false, Ordering::Release);
        } else {
            *slot = Some(SchedulerTask {
                handle,
                stop,
                interrupt,
            });
        }
        terminated
    }
}

impl Inner {
    async fn needs_restart(&self, interrupt: &CancellationToken) -> Result<bool> {
        self.started.store(true, Ordering::Release);
        let monitors = self.monitors.read().await.clone();
        self.escalator.needs_restart(&monitors, interrupt).await
    }

    async fn tick(&self, interrupt: &CancellationToken) -> Result<TickOutcome> {
        if !self.needs_restart(interrupt).await? {
            return Ok(TickOutcome::Continue);
        }

        let Some(callback) = self.callback.read().await.clone() else {
            error!("Restart needed but no health service callback is registered");
            return Ok(TickOutcome::Continue);
        };

        match tokio::task::spawn_blocking(move || callback.perform_restart()).await {
            Ok(true) => Ok(TickOutcome::Restarted),
            Ok(false) => {
                trace!("Service is unhealthy. Continuing health check without restart");
                Ok(TickOutcome::Continue)
            }
            Err(e) => {
                error!(error = %e, "Health service callback failed");
                Ok(TickOutcome::Continue)
            }
        }
    }

    async fn run(self: Arc<Self>, stop: CancellationToken, interrupt: CancellationToken) {
        tokio::select! {
            _ = sleep(self.config.initial_delay) => {}
            _ = stop.cancelled() => return,
        }

        loop {
            match AssertUnwindSafe(self.tick(&interrupt)).catch_unwind().await {
                Ok(Ok(TickOutcome::Continue)) => {}
                Ok(Ok(TickOutcome::Restarted)) => {
                    info!("Restart performed, stopping health service scheduler");
                    stop.cancel();
                    self.started.store(false, Ordering::Release);
                    return;
                }
                Ok(Err(HealthError::Interrupted)) => {
                    error!("Health service tick interrupted");
                    return;
                }
                Ok(Err(e)) => {
                    error!(error = %e, "Error while executing health service tick");
                }
                Err(panic) => {
                    let reason = panic
                        .downcast_ref::<&str>()
                        .map(|s| s.to_string())
                        .or_else(|| panic.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "unknown panic".to_string());
                    error!(reason = %reason, "Health service tick panicked");
                }
            }

            tokio::select! {
                _ = sleep(self.config.retry_interval) => {}
                _ = stop.cancelled() => {
                    warn!("Health service scheduler stopping");
                    return;
                }
            }
        }
    }
}
