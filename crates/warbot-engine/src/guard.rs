//! Thread lifecycle guard: closes a war's thread once the war is over.
//!
//! Runs after the terminal state is committed, so nothing here may fail
//! the operation. Each step is attempted on its own and failures are
//! only logged.

use warbot_model::ThreadId;
use warbot_ports::ChannelGuard;

/// Which closing steps went through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GuardReport {
    pub restricted: bool,
    pub noticed: bool,
    pub archived: bool,
}

/// Closes a war's thread once the war is over.
///
/// Holds the closing notice from
/// [`WarConfig::closing_notice`](crate::WarConfig::closing_notice). Every
/// ticket actor of a desk shares one guard.
#[derive(Debug, Clone)]
pub struct ThreadGuard {
    notice: String,
}

impl ThreadGuard {
    /// Creates a guard that posts `notice` into each thread it closes.
    pub fn new(notice: impl Into<String>) -> Self {
        Self {
            notice: notice.into(),
        }
    }

    /// Revokes posting rights, posts the closing notice, and archives the
    /// thread if it is open and unlocked.
    ///
    /// # Returns
    /// A [`GuardReport`] of the steps that went through. Never an error:
    /// a failed step is logged at `warn` and the next one still runs.
    pub async fn restrict<C: ChannelGuard>(&self, channels: &C, thread_id: ThreadId) -> GuardReport {
        let mut report = GuardReport::default();

        match channels.restrict_everyone(thread_id).await {
            Ok(()) => report.restricted = true,
            Err(e) => tracing::warn!(%thread_id, error = %e, "failed to restrict thread"),
        }

        match channels.post_notice(thread_id, &self.notice).await {
            Ok(()) => report.noticed = true,
            Err(e) => tracing::warn!(%thread_id, error = %e, "failed to post closing notice"),
        }

        match channels.describe(thread_id).await {
            Ok(info) if info.can_archive() => match channels.archive(thread_id).await {
                Ok(()) => report.archived = true,
                Err(e) => tracing::warn!(%thread_id, error = %e, "failed to archive thread"),
            },
            Ok(info) => {
                tracing::debug!(%thread_id, ?info, "thread not archivable, leaving as is");
            }
            Err(e) => tracing::warn!(%thread_id, error = %e, "failed to inspect thread"),
        }

        report
    }
}
