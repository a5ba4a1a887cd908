//! In-process health aggregation for long-running services.
//!
//! This crate polls a set of pluggable health monitors, decides whether the
//! hosting process is healthy enough to keep running, and reports that
//! decision through gauges, logs and an optional restart callback.
//!
//! # Components
//!
//! - **Registry**: filters out disabled monitors and rejects duplicate
//!   metric names among the enabled ones
//! - **Evaluator**: one serialized pass over a monitor list, publishing a
//!   gauge per monitor and one for the aggregate
//! - **Status filter**: narrates the aggregate status only when it changes
//! - **Escalator**: bounded forced retries of the restart-eligible failures
//! - **Scheduler**: a single background worker running the escalation and
//!   invoking the restart callback
//!
//! # Example
//!
//! ```no_run
//! use health_service::{
//!     HealthService, HealthServiceConfig, MonitorRef, PrometheusHealthGauge, TcpMonitor,
//! };
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let gauge = Arc::new(PrometheusHealthGauge::new());
//! let service = HealthService::new(HealthServiceConfig::default(), gauge);
//!
//! let database: MonitorRef = Arc::new(
//!     TcpMonitor::new("database", "DATABASE", "127.0.0.1:5432".parse()?, Duration::from_secs(1))
//!         .with_restart_on_failure(true),
//! );
//! service.initialize(vec![database]).await?;
//!
//! let failed = service.trigger_initial_check().await;
//! assert!(failed.is_empty());
//!
//! service.register_callback(Arc::new(|| true)).await;
//! service.start().await;
//! # Ok(())
//! # }
//! ```

pub mod checkers;
pub mod error;
pub mod escalator;
pub mod evaluator;
pub mod metrics;
pub mod monitor;
pub mod registry;
pub mod scheduler;
pub mod state;
pub mod types;

pub use checkers::TcpMonitor;
pub use error::{HealthError, Result};
pub use escalator::RetryEscalator;
pub use evaluator::{Evaluation, HealthEvaluator};
pub use metrics::{HealthGauge, PrometheusHealthGauge};
pub use monitor::{HealthMonitor, MonitorRef};
pub use scheduler::{HealthService, RestartCallback};
pub use state::StatusFilter;
pub use tokio_util::sync::CancellationToken;
pub use types::{AggregateStatus, HealthServiceConfig, HEALTHY, SERVICE_HEALTH, UNHEALTHY};

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_default_config() {
        let config = HealthServiceConfig::default();
        assert_eq!(config.node_name, "localhost");
        assert_eq!(config.failure_retry_threshold, 10);
        assert_eq!(config.failure_retry_interval, Duration::from_millis(50));
        assert_eq!(config.retry_interval, Duration::from_millis(100));
        assert_eq!(config.shutdown_buffer, Duration::from_millis(2000));
        assert_eq!(config.initial_delay, Duration::from_millis(300_000));
    }

    #[test]
    fn test_aggregate_status_equality() {
        assert_eq!(AggregateStatus::healthy("a"), AggregateStatus::healthy("a"));
        assert_ne!(AggregateStatus::healthy("a"), AggregateStatus::unhealthy("a"));
        assert_ne!(AggregateStatus::healthy("a"), AggregateStatus::healthy("b"));
    }

    #[test]
    fn test_aggregate_status_gauge_value() {
        assert_eq!(AggregateStatus::healthy("").gauge_value(), HEALTHY);
        assert_eq!(AggregateStatus::unhealthy("").gauge_value(), UNHEALTHY);
        assert_eq!(
            AggregateStatus::unhealthy("db is unhealthy;").to_string(),
            "unhealthy; desc: db is unhealthy;"
        );
    }

    #[test]
    fn test_duplicate_metric_error_display() {
        let err = HealthError::DuplicateMetricKey {
            metric: "X".to_string(),
            monitor: "second".to_string(),
            existing: "first".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Two health monitors second and first cannot have same metric name X"
        );
    }
}
