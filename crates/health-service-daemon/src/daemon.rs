//! Wiring of configured monitors into a running health service.

use crate::config::{Config, TcpMonitorSettings};
use common::{Error, Result};
use health_service::{HealthService, MonitorRef, PrometheusHealthGauge, TcpMonitor};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::{debug, error, info, warn};

/// Why the daemon stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// Shutdown was requested externally
    Shutdown,
    /// The health service asked for a process restart
    RestartRequested,
}

/// Outcome of a daemon run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    pub reason: ExitReason,
    /// Whether the scheduler stopped within its grace period
    pub clean_shutdown: bool,
}

/// Health service daemon
pub struct Daemon {
    config: Config,
}

impl Daemon {
    /// Create a new daemon
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Build one monitor per configured TCP endpoint
    pub fn build_monitors(&self) -> Vec<MonitorRef> {
        self.config.monitors.iter().map(tcp_monitor).collect()
    }

    /// Run until interrupted by ctrl-c or a restart request
    pub async fn run(self) -> Result<RunOutcome> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Run until `shutdown` completes or a restart is requested
    pub async fn run_until<F>(self, shutdown: F) -> Result<RunOutcome>
    where
        F: Future<Output = ()>,
    {
        let gauge = Arc::new(PrometheusHealthGauge::new());
        let service = HealthService::new(self.config.health.clone(), gauge.clone());

        service
            .initialize(self.build_monitors())
            .await
            .map_err(Error::health)?;

        let failed = service.trigger_initial_check().await;
        for monitor in &failed {
            warn!(monitor = monitor.monitor_name(), "Monitor unhealthy at startup");
        }

        let restart_requested = Arc::new(Notify::new());
        let notify = restart_requested.clone();
        service
            .register_callback(Arc::new(move || {
                error!("Health service requested a restart");
                notify.notify_one();
                true
            }))
            .await;
        service.start().await;

        info!(node = %self.config.health.node_name, "Health service daemon running");

        let reason = tokio::select! {
            _ = shutdown => ExitReason::Shutdown,
            _ = restart_requested.notified() => ExitReason::RestartRequested,
        };
        info!(reason = ?reason, "Health service daemon stopping");

        let clean_shutdown = service.close().await;
        match gauge.encode() {
            Ok(metrics) => debug!(metrics = %metrics, "Final health metrics"),
            Err(e) => warn!(error = %e, "Failed to encode health metrics"),
        }

        Ok(RunOutcome {
            reason,
            clean_shutdown,
        })
    }
}

fn tcp_monitor(settings: &TcpMonitorSettings) -> MonitorRef {
    Arc::new(
        TcpMonitor::new(
            settings.name.clone(),
            settings.metric_name.clone(),
            settings.address,
            settings.timeout,
        )
        .with_cache_ttl(settings.cache_ttl)
        .with_restart_on_failure(settings.restart_on_failure)
        .with_enabled(settings.enabled),
    )
}
