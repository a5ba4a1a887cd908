//! Shared monitors for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use health_service::{HealthMonitor, HealthServiceConfig, MonitorRef};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// How a scripted monitor answers
#[derive(Clone, Copy)]
pub enum Behavior {
    Healthy,
    Unhealthy,
    /// Unhealthy until the n-th forced check, healthy from then on
    RecoversOnForced(usize),
    /// Panics on the first call, healthy afterwards
    PanicsOnce,
    /// Never completes
    Hangs,
    /// Blocks the worker thread, ignoring cancellation
    Blocks(Duration),
}

pub struct ScriptedMonitor {
    name: String,
    metric: String,
    behavior: Behavior,
    restart: bool,
    enabled: bool,
    calls: AtomicUsize,
    forced: AtomicUsize,
}

impl ScriptedMonitor {
    pub fn new(name: &str, behavior: Behavior) -> Self {
        Self {
            name: name.to_string(),
            metric: name.to_string(),
            behavior,
            restart: false,
            enabled: true,
            calls: AtomicUsize::new(0),
            forced: AtomicUsize::new(0),
        }
    }

    pub fn metric(mut self, metric: &str) -> Self {
        self.metric = metric.to_string();
        self
    }

    pub fn restart(mut self) -> Self {
        self.restart = true;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn build(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn forced_calls(&self) -> usize {
        self.forced.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HealthMonitor for ScriptedMonitor {
    async fn is_healthy(&self, force_check: bool) -> anyhow::Result<bool> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let forced = if force_check {
            self.forced.fetch_add(1, Ordering::SeqCst) + 1
        } else {
            self.forced.load(Ordering::SeqCst)
        };

        match self.behavior {
            Behavior::Healthy => Ok(true),
            Behavior::Unhealthy => Ok(false),
            Behavior::RecoversOnForced(n) => Ok(forced >= n),
            Behavior::PanicsOnce => {
                if call == 1 {
                    panic!("monitor exploded");
                }
                Ok(true)
            }
            Behavior::Hangs => {
                std::future::pending::<()>().await;
                Ok(true)
            }
            Behavior::Blocks(duration) => {
                std::thread::sleep(duration);
                Ok(true)
            }
        }
    }

    fn monitor_name(&self) -> &str {
        &self.name
    }

    fn metric_name(&self) -> &str {
        &self.metric
    }

    fn needs_restart_on_failure(&self) -> bool {
        self.restart
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}

pub fn as_refs(monitors: &[Arc<ScriptedMonitor>]) -> Vec<MonitorRef> {
    monitors
        .iter()
        .map(|m| m.clone() as MonitorRef)
        .collect()
}

pub fn fast_config(threshold: u32) -> HealthServiceConfig {
    HealthServiceConfig {
        failure_retry_threshold: threshold,
        failure_retry_interval: Duration::from_millis(10),
        retry_interval: Duration::from_millis(100),
        shutdown_buffer: Duration::from_millis(200),
        initial_delay: Duration::ZERO,
        ..HealthServiceConfig::default()
    }
}
