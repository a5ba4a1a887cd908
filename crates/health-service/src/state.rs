//! Suppression of repeated status narration.

use crate::types::AggregateStatus;
use tracing::{error, info};

/// Remembers the last narrated aggregate status.
///
/// Only transitions are logged; gauges are updated by the evaluator on
/// every pass regardless.
#[derive(Debug, Default)]
pub struct StatusFilter {
    last: Option<AggregateStatus>,
}

impl StatusFilter {
    /// Create a filter that has not observed anything yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Last status that was narrated
    pub fn last(&self) -> Option<&AggregateStatus> {
        self.last.as_ref()
    }

    /// Record `status`, logging it if it differs from the previous one.
    ///
    /// Returns true when a transition was narrated.
    pub fn observe(&mut self, status: &AggregateStatus) -> bool {
        if self.last.as_ref() == Some(status) {
            return false;
        }

        if status.healthy {
            info!(desc = %status.description, "Health status :: healthy");
        } else {
            error!(desc = %status.description, "Health status :: unhealthy");
        }

        self.last = Some(status.clone());
        true
    }
}
