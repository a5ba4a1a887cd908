//! Built-in monitor implementations.

use crate::monitor::HealthMonitor;
use async_trait::async_trait;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::{Instant, timeout};
use tracing::{debug, warn};

/// Monitor that reports healthy while a TCP endpoint accepts connections.
///
/// Unforced checks reuse a verdict younger than `cache_ttl`.
pub struct TcpMonitor {
    name: String,
    metric_name: String,
    target: SocketAddr,
    timeout_duration: Duration,
    cache_ttl: Duration,
    restart_on_failure: bool,
    enabled: bool,
    last_probe: Mutex<Option<(Instant, bool)>>,
}

impl TcpMonitor {
    /// Create a new TCP monitor
    pub fn new(
        name: impl Into<String>,
        metric_name: impl Into<String>,
        target: SocketAddr,
        timeout_duration: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            metric_name: metric_name.into(),
            target,
            timeout_duration,
            cache_ttl: Duration::ZERO,
            restart_on_failure: false,
            enabled: true,
            last_probe: Mutex::new(None),
        }
    }

    /// Reuse probe results for `ttl` unless a forced check is requested
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Mark failures of this monitor as restart-worthy
    pub fn with_restart_on_failure(mut self, restart: bool) -> Self {
        self.restart_on_failure = restart;
        self
    }

    /// Enable or disable the monitor
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    async fn probe(&self) -> bool {
        let start = Instant::now();

        match timeout(self.timeout_duration, TcpStream::connect(self.target)).await {
            Ok(Ok(_stream)) => {
                debug!(
                    target = %self.target,
                    duration_ms = start.elapsed().as_millis(),
                    "TCP probe successful"
                );
                true
            }
            Ok(Err(e)) => {
                warn!(target = %self.target, error = %e, "TCP probe failed");
                false
            }
            Err(_) => {
                warn!(target = %self.target, "TCP probe timed out");
                false
            }
        }
    }
}

#[async_trait]
impl HealthMonitor for TcpMonitor {
    async fn is_healthy(&self, force_check: bool) -> anyhow::Result<bool> {
        let mut last_probe = self.last_probe.lock().await;

        if !force_check {
            if let Some((at, healthy)) = *last_probe {
                if at.elapsed() < self.cache_ttl {
                    return Ok(healthy);
                }
            }
        }

        let healthy = self.probe().await;
        *last_probe = Some((Instant::now(), healthy));
        Ok(healthy)
    }

    fn monitor_name(&self) -> &str {
        &self.name
    }

    fn metric_name(&self) -> &str {
        &self.metric_name
    }

    fn needs_restart_on_failure(&self) -> bool {
        self.restart_on_failure
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_tcp_monitor_listening_endpoint() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let monitor = TcpMonitor::new("listener", "LISTENER", addr, Duration::from_millis(500));
        assert!(monitor.is_healthy(false).await.unwrap());
    }

    #[tokio::test]
    async fn test_tcp_monitor_closed_port() {
        let monitor = TcpMonitor::new(
            "closed",
            "CLOSED",
            "127.0.0.1:1".parse().unwrap(),
            Duration::from_millis(100),
        );
        assert!(!monitor.is_healthy(true).await.unwrap());
    }

    #[tokio::test]
    async fn test_force_check_bypasses_cache() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let monitor = TcpMonitor::new("cached", "CACHED", addr, Duration::from_millis(500))
            .with_cache_ttl(Duration::from_secs(60));
        assert!(monitor.is_healthy(false).await.unwrap());

        drop(listener);

        // Cached verdict is still served to unforced checks
        assert!(monitor.is_healthy(false).await.unwrap());
        assert!(!monitor.is_healthy(true).await.unwrap());
    }

    #[test]
    fn test_builder_flags() {
        let monitor = TcpMonitor::new(
            "db",
            "DB",
            "127.0.0.1:5432".parse().unwrap(),
            Duration::from_secs(1),
        )
        .with_restart_on_failure(true)
        .with_enabled(false);

        assert_eq!(monitor.monitor_name(), "db");
        assert_eq!(monitor.metric_name(), "DB");
        assert!(monitor.needs_restart_on_failure());
        assert!(!monitor.is_enabled());
    }
}
