//! Error types for the port layer.

use warbot_model::ThreadId;

/// Errors reported by store, channel, and audit implementations.
///
/// The engine only cares about one distinction: can the caller try again?
/// See [`PortError::is_retryable`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum PortError {
    /// A conditional ticket write lost the race. The stored version no
    /// longer matches the version the writer read (`None` = no record).
    #[error("write conflict on {thread_id}: expected version {expected}, found {found:?}")]
    Conflict {
        thread_id: ThreadId,
        expected: u64,
        found: Option<u64>,
    },

    /// The backing service failed in a way that may succeed on retry
    /// (timeout, connection reset, rate limit).
    #[error("transient failure: {0}")]
    Transient(String),

    /// The target (thread, channel) is gone or cannot be acted on.
    #[error("unavailable: {0}")]
    Unavailable(String),
}

impl PortError {
    /// Returns `true` if repeating the operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict { .. } | Self::Transient(_))
    }
}
