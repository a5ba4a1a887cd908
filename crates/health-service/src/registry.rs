//! Validation of the registered monitor set.

use crate::error::{HealthError, Result};
use crate::monitor::MonitorRef;
use std::collections::HashMap;
use tracing::{error, info};

/// Filter `monitors` down to the enabled ones, in input order.
///
/// Fails with [`HealthError::DuplicateMetricKey`] on the first enabled
/// monitor whose metric name was already claimed by an earlier enabled
/// monitor. Disabled monitors never take part in the uniqueness check.
pub fn enabled_monitors<I>(monitors: I) -> Result<Vec<MonitorRef>>
where
    I: IntoIterator<Item = MonitorRef>,
{
    let mut metric_owners: HashMap<String, String> = HashMap::new();
    let mut enabled = Vec::new();

    for monitor in monitors {
        let monitor_name = monitor.monitor_name();

        if !monitor.is_enabled() {
            info!(monitor = monitor_name, "Health monitor is disabled");
            continue;
        }

        let metric_name = monitor.metric_name();
        if let Some(existing) = metric_owners.get(metric_name) {
            error!(
                monitor = monitor_name,
                existing = %existing,
                metric = metric_name,
                "Two health monitors cannot have same metric name"
            );
            return Err(HealthError::DuplicateMetricKey {
                metric: metric_name.to_string(),
                monitor: monitor_name.to_string(),
                existing: existing.clone(),
            });
        }

        info!(monitor = monitor_name, "Health monitor is enabled");
        metric_owners.insert(metric_name.to_string(), monitor_name.to_string());
        enabled.push(monitor);
    }

    Ok(enabled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::HealthMonitor;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct Static {
        name: &'static str,
        metric: &'static str,
        enabled: bool,
    }

    #[async_trait]
    impl HealthMonitor for Static {
        async fn is_healthy(&self, _force_check: bool) -> anyhow::Result<bool> {
            Ok(true)
        }

        fn monitor_name(&self) -> &str {
            self.name
        }

        fn metric_name(&self) -> &str {
            self.metric
        }

        fn needs_restart_on_failure(&self) -> bool {
            false
        }

        fn is_enabled(&self) -> bool {
            self.enabled
        }
    }

    fn monitor(name: &'static str, metric: &'static str, enabled: bool) -> MonitorRef {
        Arc::new(Static { name, metric, enabled })
    }

    #[test]
    fn test_empty_input() {
        assert!(enabled_monitors(Vec::new()).unwrap().is_empty());
    }

    #[test]
    fn test_disabled_monitors_are_dropped_in_order() {
        let enabled = enabled_monitors(vec![
            monitor("a", "A", true),
            monitor("b", "B", false),
            monitor("c", "C", true),
        ])
        .unwrap();

        let names: Vec<_> = enabled.iter().map(|m| m.monitor_name()).collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[test]
    fn test_duplicate_metric_among_enabled_fails() {
        let err = enabled_monitors(vec![monitor("first", "X", true), monitor("second", "X", true)])
            .unwrap_err();

        assert_eq!(
            err,
            HealthError::DuplicateMetricKey {
                metric: "X".to_string(),
                monitor: "second".to_string(),
                existing: "first".to_string(),
            }
        );
    }

    #[test]
    fn test_duplicate_metric_with_disabled_is_allowed() {
        let enabled =
            enabled_monitors(vec![monitor("first", "X", false), monitor("second", "X", true)])
                .unwrap();

        assert_eq!(enabled.len(), 1);
        assert_eq!(enabled[0].monitor_name(), "second");
    }
}
