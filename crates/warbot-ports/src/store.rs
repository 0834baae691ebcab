//! Persistence interfaces for tickets, entities, and profiles.
//!
//! The war bot doesn't own a database. These traits describe the three
//! record kinds it reads and writes; the surrounding bot supplies the
//! implementations (document store, SQL, in-memory for tests).
//!
//! Every method returns a `Send` future so the engine can call it from
//! inside a spawned Tokio task.

use std::future::Future;

use warbot_model::{Entity, EntityKind, MemberId, Profile, ThreadId, WarTicket};

use crate::PortError;

/// Durable record of active wars, keyed by thread.
pub trait TicketStore: Send + Sync + 'static {
    /// Loads the ticket for `thread_id`, if one exists.
    fn get(
        &self,
        thread_id: ThreadId,
    ) -> impl Future<Output = Result<Option<WarTicket>, PortError>> + Send;

    /// Conditionally writes `ticket`.
    ///
    /// The write succeeds only if the stored record's version equals
    /// `ticket.version` (a ticket with version 0 may only be created when
    /// no record exists). On success the stored copy carries
    /// `version + 1` and is returned.
    ///
    /// # Errors
    /// - [`PortError::Conflict`]: someone else wrote first
    /// - [`PortError::Transient`]: the write did not happen; retry
    fn put(
        &self,
        ticket: WarTicket,
    ) -> impl Future<Output = Result<WarTicket, PortError>> + Send;

    /// Removes the ticket. Deleting a missing ticket is not an error.
    fn delete(
        &self,
        thread_id: ThreadId,
    ) -> impl Future<Output = Result<(), PortError>> + Send;
}

/// Guild and team records.
///
/// # Trait bounds
///
/// - `Send + Sync`: one store is shared by every ticket actor, and Tokio
///   may poll those actors on different worker threads.
/// - `'static`: the store lives as long as the desk that owns it.
pub trait EntityStore: Send + Sync + 'static {
    /// Looks an entity up by its display name.
    ///
    /// Names are matched case-insensitively, as members type them.
    ///
    /// # Arguments
    /// - `name`: the entity's name as stored on a ticket
    /// - `kind`: guilds and teams live in separate namespaces
    ///
    /// # Returns
    /// - `Ok(Some(entity))`: found
    /// - `Ok(None)`: no such entity; score propagation skips it
    /// - `Err(PortError)`: the lookup itself failed
    fn get_by_name(
        &self,
        name: &str,
        kind: EntityKind,
    ) -> impl Future<Output = Result<Option<Entity>, PortError>> + Send;

    /// Replaces the stored entity with `entity` (matched by kind and
    /// name). Unconditional: callers serialize their own read-modify-write.
    fn save(
        &self,
        entity: Entity,
    ) -> impl Future<Output = Result<(), PortError>> + Send;
}

/// Per-member personal records.
pub trait ProfileStore: Send + Sync + 'static {
    /// Loads the profile, creating a zeroed one if the member has none.
    fn get_or_create(
        &self,
        member_id: MemberId,
    ) -> impl Future<Output = Result<Profile, PortError>> + Send;

    /// Replaces the member's stored profile.
    ///
    /// A `Transient` error means nothing was written, so the caller may
    /// re-read and try again without counting a result twice.
    fn save(
        &self,
        profile: Profile,
    ) -> impl Future<Output = Result<(), PortError>> + Send;
}
