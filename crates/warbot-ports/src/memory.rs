//! In-memory implementations of every port.
//!
//! These back the test suites and the demo binary. Each one can be told to
//! fail, so the engine's retry and best-effort paths can be exercised
//! without a real database or chat platform.
//!
//! # Concurrency note
//!
//! State sits behind `tokio::sync::Mutex`. No lock is ever held across
//! a call into another store, so the stores can't deadlock each other.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use tokio::sync::Mutex;
use warbot_model::{
    ChannelId, Entity, EntityKind, EntityRef, MemberId, Profile, RoleId, ThreadId, WarTicket,
};

use crate::{
    AuditSink, ChannelGuard, DodgeNotice, EntityStore, PermissionOracle, PortError,
    ProfileStore, ThreadInfo, TicketStore,
};

/// Consumes one unit from a "fail the next N calls" budget.
fn take_failure(budget: &AtomicU32) -> bool {
    budget
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

// ---------------------------------------------------------------------------
// Tickets
// ---------------------------------------------------------------------------

/// Versioned ticket map with conditional writes.
#[derive(Debug, Default)]
pub struct MemoryTicketStore {
    tickets: Mutex<HashMap<ThreadId, WarTicket>>,
    failing_puts: AtomicU32,
}

impl MemoryTicketStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` calls to `put` fail with a transient error.
    pub fn fail_next_puts(&self, count: u32) {
        self.failing_puts.store(count, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.tickets.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tickets.lock().await.is_empty()
    }
}

impl TicketStore for MemoryTicketStore {
    async fn get(&self, thread_id: ThreadId) -> Result<Option<WarTicket>, PortError> {
        Ok(self.tickets.lock().await.get(&thread_id).cloned())
    }

    async fn put(&self, mut ticket: WarTicket) -> Result<WarTicket, PortError> {
        if take_failure(&self.failing_puts) {
            return Err(PortError::Transient("ticket store write timed out".into()));
        }

        let mut tickets = self.tickets.lock().await;
        let found = tickets.get(&ticket.thread_id).map(|t| t.version);
        let matches = match found {
            Some(version) => version == ticket.version,
            None => ticket.version == 0,
        };
        if !matches {
            return Err(PortError::Conflict {
                thread_id: ticket.thread_id,
                expected: ticket.version,
                found,
            });
        }

        ticket.version += 1;
        tickets.insert(ticket.thread_id, ticket.clone());
        Ok(ticket)
    }

    async fn delete(&self, thread_id: ThreadId) -> Result<(), PortError> {
        self.tickets.lock().await.remove(&thread_id);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// Guilds and teams keyed by `(kind, lowercase name)`.
#[derive(Debug, Default)]
pub struct MemoryEntityStore {
    entities: Mutex<HashMap<(EntityKind, String), Entity>>,
    failing_saves: AtomicU32,
}

impl MemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces an entity directly (setup helper).
    pub async fn insert(&self, entity: impl Into<Entity>) {
        let entity = entity.into();
        let key = (entity.kind(), entity.name().to_lowercase());
        self.entities.lock().await.insert(key, entity);
    }

    /// Makes the next `count` calls to `save` fail with a transient error.
    pub fn fail_next_saves(&self, count: u32) {
        self.failing_saves.store(count, Ordering::SeqCst);
    }
}

impl EntityStore for MemoryEntityStore {
    async fn get_by_name(
        &self,
        name: &str,
        kind: EntityKind,
    ) -> Result<Option<Entity>, PortError> {
        let key = (kind, name.to_lowercase());
        Ok(self.entities.lock().await.get(&key).cloned())
    }

    async fn save(&self, entity: Entity) -> Result<(), PortError> {
        if take_failure(&self.failing_saves) {
            return Err(PortError::Transient("entity store write timed out".into()));
        }
        self.insert(entity).await;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Profiles
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MemoryProfileStore {
    profiles: Mutex<HashMap<MemberId, Profile>>,
    /// Members whose saves always fail.
    broken: Mutex<HashSet<MemberId>>,
    failing_saves: AtomicU32,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored profile without creating one.
    pub async fn peek(&self, member_id: MemberId) -> Option<Profile> {
        self.profiles.lock().await.get(&member_id).cloned()
    }

    /// Every save for `member_id` fails from now on.
    pub async fn break_member(&self, member_id: MemberId) {
        self.broken.lock().await.insert(member_id);
    }

    /// Makes the next `count` saves (for any member) fail transiently.
    pub fn fail_next_saves(&self, count: u32) {
        self.failing_saves.store(count, Ordering::SeqCst);
    }
}

impl ProfileStore for MemoryProfileStore {
    async fn get_or_create(&self, member_id: MemberId) -> Result<Profile, PortError> {
        let mut profiles = self.profiles.lock().await;
        Ok(profiles
            .entry(member_id)
            .or_insert_with(|| Profile::new(member_id))
            .clone())
    }

    async fn save(&self, profile: Profile) -> Result<(), PortError> {
        if self.broken.lock().await.contains(&profile.member_id) {
            return Err(PortError::Transient(format!(
                "profile {} is locked by another writer",
                profile.member_id
            )));
        }
        if take_failure(&self.failing_saves) {
            return Err(PortError::Transient("profile store write timed out".into()));
        }
        self.profiles.lock().await.insert(profile.member_id, profile);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Threads
// ---------------------------------------------------------------------------

/// What the in-memory guard has done to one thread.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThreadRecord {
    pub restricted: bool,
    pub archived: bool,
    pub locked: bool,
    pub notices: Vec<String>,
}

#[derive(Debug, Default)]
pub struct MemoryChannelGuard {
    threads: Mutex<HashMap<ThreadId, ThreadRecord>>,
    offline: AtomicBool,
}

impl MemoryChannelGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// When `true`, every operation fails as if the platform were down.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Marks a thread locked by a moderator (it will not be archived).
    pub async fn lock_thread(&self, thread_id: ThreadId) {
        self.threads.lock().await.entry(thread_id).or_default().locked = true;
    }

    pub async fn record(&self, thread_id: ThreadId) -> ThreadRecord {
        self.threads
            .lock()
            .await
            .get(&thread_id)
            .cloned()
            .unwrap_or_default()
    }

    fn check_online(&self) -> Result<(), PortError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(PortError::Unavailable("chat platform unreachable".into()));
        }
        Ok(())
    }
}

impl ChannelGuard for MemoryChannelGuard {
    async fn restrict_everyone(&self, thread_id: ThreadId) -> Result<(), PortError> {
        self.check_online()?;
        self.threads.lock().await.entry(thread_id).or_default().restricted = true;
        Ok(())
    }

    async fn post_notice(&self, thread_id: ThreadId, text: &str) -> Result<(), PortError> {
        self.check_online()?;
        self.threads
            .lock()
            .await
            .entry(thread_id)
            .or_default()
            .notices
            .push(text.to_string());
        Ok(())
    }

    async fn describe(&self, thread_id: ThreadId) -> Result<ThreadInfo, PortError> {
        self.check_online()?;
        let threads = self.threads.lock().await;
        let record = threads.get(&thread_id).cloned().unwrap_or_default();
        Ok(ThreadInfo {
            archived: record.archived,
            locked: record.locked,
        })
    }

    async fn archive(&self, thread_id: ThreadId) -> Result<(), PortError> {
        self.check_online()?;
        self.threads.lock().await.entry(thread_id).or_default().archived = true;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Audit
// ---------------------------------------------------------------------------

/// Collects dodge notices. Stands in for a staff channel, optionally
/// identified by a [`ChannelId`].
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    channel: Option<ChannelId>,
    notices: Mutex<Vec<DodgeNotice>>,
    offline: AtomicBool,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink posting "into" `channel`.
    pub fn with_channel(channel: Option<ChannelId>) -> Self {
        Self {
            channel,
            ..Self::default()
        }
    }

    /// The channel notices are posted to, if one was configured.
    pub fn channel(&self) -> Option<ChannelId> {
        self.channel
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub async fn notices(&self) -> Vec<DodgeNotice> {
        self.notices.lock().await.clone()
    }
}

impl AuditSink for MemoryAuditSink {
    async fn post_dodge_notice(&self, notice: &DodgeNotice) -> Result<(), PortError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(PortError::Unavailable("audit channel missing".into()));
        }
        tracing::debug!(
            channel = ?self.channel,
            thread_id = %notice.thread_id,
            "dodge notice recorded"
        );
        self.notices.lock().await.push(notice.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Permissions
// ---------------------------------------------------------------------------

/// Role table plus entity lookups for leadership checks.
#[derive(Debug)]
pub struct MemoryPermissions {
    staff_roles: HashSet<RoleId>,
    admins: Mutex<HashSet<MemberId>>,
    member_roles: Mutex<HashMap<MemberId, HashSet<RoleId>>>,
    entities: Arc<MemoryEntityStore>,
}

impl MemoryPermissions {
    /// `staff_roles` are the moderator / score-operator roles that count
    /// as staff in addition to administrators.
    pub fn new(
        staff_roles: impl IntoIterator<Item = RoleId>,
        entities: Arc<MemoryEntityStore>,
    ) -> Self {
        Self {
            staff_roles: staff_roles.into_iter().collect(),
            admins: Mutex::new(HashSet::new()),
            member_roles: Mutex::new(HashMap::new()),
            entities,
        }
    }

    pub async fn make_admin(&self, member_id: MemberId) {
        self.admins.lock().await.insert(member_id);
    }

    pub async fn grant_role(&self, member_id: MemberId, role: RoleId) {
        self.member_roles
            .lock()
            .await
            .entry(member_id)
            .or_default()
            .insert(role);
    }
}

impl PermissionOracle for MemoryPermissions {
    async fn is_staff(&self, actor: MemberId) -> Result<bool, PortError> {
        if self.admins.lock().await.contains(&actor) {
            return Ok(true);
        }
        let roles = self.member_roles.lock().await;
        Ok(roles
            .get(&actor)
            .is_some_and(|held| held.iter().any(|r| self.staff_roles.contains(r))))
    }

    async fn is_leader_or_co_leader(
        &self,
        actor: MemberId,
        entity: &EntityRef,
    ) -> Result<bool, PortError> {
        let found = self.entities.get_by_name(&entity.name, entity.kind).await?;
        Ok(found.is_some_and(|e| e.is_leadership(actor)))
    }
}

#[cfg(test)]
mod tests {
    use warbot_model::{Guild, Score};

    use super::*;

    fn ticket(id: u64) -> WarTicket {
        WarTicket::new(
            ThreadId(id),
            EntityRef::guild("Ember"),
            EntityRef::guild("Frost"),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_ticket_put_bumps_version() {
        let store = MemoryTicketStore::new();
        let stored = store.put(ticket(1)).await.unwrap();
        assert_eq!(stored.version, 1);
        let again = store.put(stored).await.unwrap();
        assert_eq!(again.version, 2);
    }

    #[tokio::test]
    async fn test_ticket_put_rejects_stale_version() {
        let store = MemoryTicketStore::new();
        let first = store.put(ticket(1)).await.unwrap();
        store.put(first.clone()).await.unwrap();

        let result = store.put(first).await;
        assert!(matches!(
            result,
            Err(PortError::Conflict { expected: 1, found: Some(2), .. })
        ));
    }

    #[tokio::test]
    async fn test_ticket_create_twice_conflicts() {
        let store = MemoryTicketStore::new();
        store.put(ticket(1)).await.unwrap();
        assert!(store.put(ticket(1)).await.is_err());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_ticket_injected_failure_is_transient() {
        let store = MemoryTicketStore::new();
        store.fail_next_puts(1);
        let err = store.put(ticket(1)).await.unwrap_err();
        assert!(err.is_retryable());
        assert!(store.put(ticket(1)).await.is_ok());
    }

    #[tokio::test]
    async fn test_entity_lookup_is_case_insensitive() {
        let store = MemoryEntityStore::new();
        store
            .insert(Guild {
                name: "Ember".into(),
                leader: MemberId(1),
                co_leader: None,
                members: vec![],
                score: Score::default(),
            })
            .await;
        let found = store.get_by_name("EMBER", EntityKind::Guild).await.unwrap();
        assert!(found.is_some());
        let wrong_kind = store.get_by_name("Ember", EntityKind::Team).await.unwrap();
        assert!(wrong_kind.is_none());
    }

    #[tokio::test]
    async fn test_profile_get_or_create_starts_at_zero() {
        let store = MemoryProfileStore::new();
        assert!(store.peek(MemberId(5)).await.is_none());
        let profile = store.get_or_create(MemberId(5)).await.unwrap();
        assert_eq!(profile.personal_score, Score::default());
        assert!(store.peek(MemberId(5)).await.is_some());
    }

    #[tokio::test]
    async fn test_broken_member_save_fails() {
        let store = MemoryProfileStore::new();
        store.break_member(MemberId(5)).await;
        let result = store.save(Profile::new(MemberId(5))).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_permissions_staff_by_role_or_admin() {
        let entities = Arc::new(MemoryEntityStore::new());
        let perms = MemoryPermissions::new([RoleId(100)], entities);
        perms.make_admin(MemberId(1)).await;
        perms.grant_role(MemberId(2), RoleId(100)).await;
        perms.grant_role(MemberId(3), RoleId(200)).await;

        assert!(perms.is_staff(MemberId(1)).await.unwrap());
        assert!(perms.is_staff(MemberId(2)).await.unwrap());
        assert!(!perms.is_staff(MemberId(3)).await.unwrap());
        assert!(!perms.is_staff(MemberId(4)).await.unwrap());
    }

    #[tokio::test]
    async fn test_permissions_leadership_reads_entity_store() {
        let entities = Arc::new(MemoryEntityStore::new());
        entities
            .insert(Guild {
                name: "Frost".into(),
                leader: MemberId(7),
                co_leader: Some(MemberId(8)),
                members: vec![MemberId(9)],
                score: Score::default(),
            })
            .await;
        let perms = MemoryPermissions::new(Vec::new(), Arc::clone(&entities));
        let frost = EntityRef::guild("Frost");

        assert!(perms.is_leader_or_co_leader(MemberId(7), &frost).await.unwrap());
        assert!(perms.is_leader_or_co_leader(MemberId(8), &frost).await.unwrap());
        assert!(!perms.is_leader_or_co_leader(MemberId(9), &frost).await.unwrap());
    }

    #[tokio::test]
    async fn test_channel_guard_offline() {
        let guard = MemoryChannelGuard::new();
        guard.set_offline(true);
        assert!(guard.restrict_everyone(ThreadId(1)).await.is_err());
        guard.set_offline(false);
        guard.restrict_everyone(ThreadId(1)).await.unwrap();
        assert!(guard.record(ThreadId(1)).await.restricted);
    }
}
