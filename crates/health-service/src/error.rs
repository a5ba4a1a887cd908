//! Error types for the health service.

/// A specialized Result type for health service operations.
pub type Result<T> = std::result::Result<T, HealthError>;

/// Errors surfaced by the health service.
///
/// Unhealthy monitors are not errors; they are ordinary results handled by
/// the retry escalation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HealthError {
    /// Two enabled monitors publish the same metric. Fatal at startup.
    #[error("Two health monitors {monitor} and {existing} cannot have same metric name {metric}")]
    DuplicateMetricKey {
        metric: String,
        monitor: String,
        existing: String,
    },

    /// A blocking retry wait was cancelled.
    #[error("Health check interrupted while waiting to retry")]
    Interrupted,
}
