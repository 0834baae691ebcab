//! The bundle of ports the engine runs against.

use std::sync::Arc;

use warbot_model::{ChannelId, RoleId};

use crate::{
    AuditSink, ChannelGuard, EntityStore, MemoryAuditSink, MemoryChannelGuard,
    MemoryEntityStore, MemoryPermissions, MemoryProfileStore, MemoryTicketStore,
    PermissionOracle, ProfileStore, TicketStore,
};

/// Every external collaborator the engine needs, grouped under one type.
///
/// Each associated type defines one seam:
/// - `Tickets`: active war records
/// - `Entities`: guilds and teams
/// - `Profiles`: member personal scores
/// - `Channels`: thread moderation
/// - `Audit`: staff audit log
/// - `Permissions`: staff / leadership checks
///
/// The engine is generic over one `Backend` rather than six separate
/// parameters.
pub trait Backend: Send + Sync + 'static {
    type Tickets: TicketStore;
    type Entities: EntityStore;
    type Profiles: ProfileStore;
    type Channels: ChannelGuard;
    type Audit: AuditSink;
    type Permissions: PermissionOracle;

    fn tickets(&self) -> &Self::Tickets;
    fn entities(&self) -> &Self::Entities;
    fn profiles(&self) -> &Self::Profiles;
    fn channels(&self) -> &Self::Channels;
    fn audit(&self) -> &Self::Audit;
    fn permissions(&self) -> &Self::Permissions;
}

/// A [`Backend`] built entirely from the in-memory ports.
#[derive(Debug)]
pub struct MemoryBackend {
    pub tickets: MemoryTicketStore,
    pub entities: Arc<MemoryEntityStore>,
    pub profiles: MemoryProfileStore,
    pub channels: MemoryChannelGuard,
    pub audit: MemoryAuditSink,
    pub permissions: MemoryPermissions,
}

impl MemoryBackend {
    /// Creates an empty backend. Members holding any of `staff_roles`
    /// count as staff.
    pub fn new(staff_roles: impl IntoIterator<Item = RoleId>) -> Self {
        let entities = Arc::new(MemoryEntityStore::new());
        Self {
            tickets: MemoryTicketStore::new(),
            permissions: MemoryPermissions::new(staff_roles, Arc::clone(&entities)),
            entities,
            profiles: MemoryProfileStore::new(),
            channels: MemoryChannelGuard::new(),
            audit: MemoryAuditSink::new(),
        }
    }
}

impl MemoryBackend {
    /// Points the audit sink at `channel`.
    pub fn with_audit_channel(mut self, channel: Option<ChannelId>) -> Self {
        self.audit = MemoryAuditSink::with_channel(channel);
        self
    }
}

impl Default for MemoryBackend {
    /// A backend where only administrators count as staff.
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Backend for MemoryBackend {
    type Tickets = MemoryTicketStore;
    type Entities = MemoryEntityStore;
    type Profiles = MemoryProfileStore;
    type Channels = MemoryChannelGuard;
    type Audit = MemoryAuditSink;
    type Permissions = MemoryPermissions;

    fn tickets(&self) -> &MemoryTicketStore {
        &self.tickets
    }

    fn entities(&self) -> &MemoryEntityStore {
        &self.entities
    }

    fn profiles(&self) -> &MemoryProfileStore {
        &self.profiles
    }

    fn channels(&self) -> &MemoryChannelGuard {
        &self.channels
    }

    fn audit(&self) -> &MemoryAuditSink {
        &self.audit
    }

    fn permissions(&self) -> &MemoryPermissions {
        &self.permissions
    }
}
