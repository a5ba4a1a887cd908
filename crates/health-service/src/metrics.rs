//! Gauge sink for per-monitor and aggregate health.

use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::encoding::text::encode;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;
use std::sync::atomic::AtomicU64;

/// Name of the gauge family carrying health values
pub const HEALTH_GAUGE_NAME: &str = "service_health_metric";

/// Gauge-style sink for health values.
///
/// Values are `HEALTHY` (0.0) or `UNHEALTHY` (1.0).
#[cfg_attr(test, mockall::automock)]
pub trait HealthGauge: Send + Sync {
    /// Publish `value` for the monitor identified by `metric` on `node`
    fn set(&self, value: f64, node: &str, metric: &str);
}

/// Labels for health gauges
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct HealthLabels {
    /// Node identity
    pub node: String,
    /// Monitor metric name, or SERVICE_HEALTH for the aggregate
    pub monitorname: String,
}

/// Prometheus-backed health gauge
pub struct PrometheusHealthGauge {
    /// Prometheus registry
    pub registry: Registry,

    health: Family<HealthLabels, Gauge<f64, AtomicU64>>,
}

impl PrometheusHealthGauge {
    /// Create a gauge registered in a fresh registry
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let health = Family::<HealthLabels, Gauge<f64, AtomicU64>>::default();
        registry.register(
            HEALTH_GAUGE_NAME,
            "Service health by node and monitor (0=healthy, 1=unhealthy)",
            health.clone(),
        );

        Self { registry, health }
    }

    /// Current value for a label pair, if it was ever set
    pub fn value(&self, node: &str, metric: &str) -> Option<f64> {
        let labels = HealthLabels {
            node: node.to_string(),
            monitorname: metric.to_string(),
        };
        self.health.get(&labels).map(|gauge| gauge.get())
    }

    /// Render the registry in the Prometheus text format
    pub fn encode(&self) -> Result<String, std::fmt::Error> {
        let mut buffer = String::new();
        encode(&mut buffer, &self.registry)?;
        Ok(buffer)
    }
}

impl Default for PrometheusHealthGauge {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthGauge for PrometheusHealthGauge {
    fn set(&self, value: f64, node: &str, metric: &str) {
        self.health
            .get_or_create(&HealthLabels {
                node: node.to_string(),
                monitorname: metric.to_string(),
            })
            .set(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{HEALTHY, SERVICE_HEALTH, UNHEALTHY};

    #[test]
    fn test_gauge_records_latest_value() {
        let gauge = PrometheusHealthGauge::new();
        assert_eq!(gauge.value("localhost", "db"), None);

        gauge.set(UNHEALTHY, "localhost", "db");
        assert_eq!(gauge.value("localhost", "db"), Some(UNHEALTHY));

        gauge.set(HEALTHY, "localhost", "db");
        assert_eq!(gauge.value("localhost", "db"), Some(HEALTHY));
    }

    #[test]
    fn test_labels_are_independent() {
        let gauge = PrometheusHealthGauge::new();
        gauge.set(UNHEALTHY, "node-a", SERVICE_HEALTH);
        gauge.set(HEALTHY, "node-b", SERVICE_HEALTH);

        assert_eq!(gauge.value("node-a", SERVICE_HEALTH), Some(UNHEALTHY));
        assert_eq!(gauge.value("node-b", SERVICE_HEALTH), Some(HEALTHY));
    }

    #[test]
    fn test_encode_contains_family() {
        let gauge = PrometheusHealthGauge::new();
        gauge.set(UNHEALTHY, "localhost", SERVICE_HEALTH);

        let text = gauge.encode().unwrap();
        let line = text
            .lines()
            .find(|l| {
                l.starts_with(HEALTH_GAUGE_NAME) && l.contains("monitorname=\"SERVICE_HEALTH\"")
            })
            .expect("aggregate sample missing");
        assert!(line.contains("node=\"localhost\""));
        let value: f64 = line.split_whitespace().last().unwrap().parse().unwrap();
        assert_eq!(value, UNHEALTHY);
    }
}
