//! Permission hook for deciding who may act on a war.
//!
//! The war bot doesn't know how the chat platform models roles. That's the
//! host's job: it may check administrator flags, a moderator role, a
//! score-operator role, or something else entirely.
//!
//! Instead, the bot defines the [`PermissionOracle`] trait with the two
//! questions the engine asks. The host implements it, tests implement it
//! with a fixed table ([`MemoryPermissions`](crate::MemoryPermissions)),
//! and the engine never changes.

use std::future::Future;

use warbot_model::{EntityRef, MemberId};

use crate::PortError;

/// Answers role questions about an acting member.
///
/// # Example
///
/// ```rust
/// use warbot_model::{EntityRef, MemberId};
/// use warbot_ports::{PermissionOracle, PortError};
///
/// /// Treats one hard-coded member as staff and nobody as a leader.
/// struct SingleAdmin(MemberId);
///
/// impl PermissionOracle for SingleAdmin {
///     async fn is_staff(&self, actor: MemberId) -> Result<bool, PortError> {
///         Ok(actor == self.0)
///     }
///
///     async fn is_leader_or_co_leader(
///         &self,
///         _actor: MemberId,
///         _entity: &EntityRef,
///     ) -> Result<bool, PortError> {
///         Ok(false)
///     }
/// }
/// ```
pub trait PermissionOracle: Send + Sync + 'static {
    /// `true` for administrators and members holding a configured
    /// moderator or score-operator role.
    fn is_staff(
        &self,
        actor: MemberId,
    ) -> impl Future<Output = Result<bool, PortError>> + Send;

    /// `true` if `actor` leads (or co-leads) `entity`.
    fn is_leader_or_co_leader(
        &self,
        actor: MemberId,
        entity: &EntityRef,
    ) -> impl Future<Output = Result<bool, PortError>> + Send;
}
