//! Chat-side effects: thread moderation and the audit log.

use std::future::Future;

use warbot_model::{EntityRef, MemberId, ThreadId};

use crate::PortError;

/// What the platform reports about a thread before we archive it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadInfo {
    pub archived: bool,
    pub locked: bool,
}

impl ThreadInfo {
    /// Only open, unlocked threads are archived by the bot.
    pub fn can_archive(&self) -> bool {
        !self.archived && !self.locked
    }
}

/// Moderation operations on a war's discussion thread.
pub trait ChannelGuard: Send + Sync + 'static {
    /// Revokes the default role's permission to post in the thread.
    fn restrict_everyone(
        &self,
        thread_id: ThreadId,
    ) -> impl Future<Output = Result<(), PortError>> + Send;

    /// Posts a plain-text notice into the thread.
    fn post_notice(
        &self,
        thread_id: ThreadId,
        text: &str,
    ) -> impl Future<Output = Result<(), PortError>> + Send;

    /// Reports whether the thread is already archived or locked.
    fn describe(
        &self,
        thread_id: ThreadId,
    ) -> impl Future<Output = Result<ThreadInfo, PortError>> + Send;

    /// Archives the thread. Only called when [`ThreadInfo::can_archive`]
    /// says so.
    fn archive(
        &self,
        thread_id: ThreadId,
    ) -> impl Future<Output = Result<(), PortError>> + Send;
}

/// The record posted to the audit channel when a dodge is declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DodgeNotice {
    pub thread_id: ThreadId,
    pub dodging: EntityRef,
    pub winner: EntityRef,
    pub declared_by: MemberId,
}

/// Destination for staff-facing audit messages.
///
/// Implementations usually post into a dedicated staff channel, configured
/// on the host side (see `BotConfig::audit_channel` in the `warbot` crate).
pub trait AuditSink: Send + Sync + 'static {
    /// Posts a dodge record for staff review.
    ///
    /// Best-effort: the engine logs an `Err` and carries on, since the
    /// dodge itself is already committed.
    fn post_dodge_notice(
        &self,
        notice: &DodgeNotice,
    ) -> impl Future<Output = Result<(), PortError>> + Send;
}
