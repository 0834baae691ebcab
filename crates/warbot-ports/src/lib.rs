//! External collaborators of the war engine.
//!
//! The engine reads and writes state it does not own. This crate defines
//! the seams:
//!
//! 1. **Stores**: [`TicketStore`], [`EntityStore`], [`ProfileStore`]
//! 2. **Chat side effects**: [`ChannelGuard`], [`AuditSink`]
//! 3. **Authorization**: [`PermissionOracle`]
//!
//! [`Backend`] bundles all six so the engine takes a single type
//! parameter, and [`MemoryBackend`] provides a complete in-memory set for
//! tests and demos.
//!
//! # How it fits in the stack
//!
//! ```text
//! Engine (above)  ← calls ports to load, persist, and notify
//!     ↕
//! Ports (this crate)  ← traits + in-memory implementations
//!     ↕
//! Model (below)  ← WarTicket, Entity, Profile
//! ```

#![allow(async_fn_in_trait)]

mod backend;
mod channel;
mod error;
mod memory;
mod permission;
mod store;

pub use backend::{Backend, MemoryBackend};
pub use channel::{AuditSink, ChannelGuard, DodgeNotice, ThreadInfo};
pub use error::PortError;
pub use memory::{
    MemoryAuditSink, MemoryChannelGuard, MemoryEntityStore, MemoryPermissions,
    MemoryProfileStore, MemoryTicketStore, ThreadRecord,
};
pub use permission::PermissionOracle;
pub use store::{EntityStore, ProfileStore, TicketStore};
