//! Domain model for the war bot.
//!
//! - **Identifiers** ([`MemberId`], [`ThreadId`], [`RoleId`], [`ChannelId`])
//! - **Entities** ([`Entity`], [`Guild`], [`Team`]) and the [`Competitor`]
//!   capability used by score propagation
//! - **Tickets** ([`WarTicket`], [`TicketStatus`]): the per-war record
//!
//! # Architecture
//!
//! ```text
//! Facade (warbot) → Engine (transitions) → Ports (stores) → Model (this crate)
//! ```
//!
//! Nothing here performs I/O. Every type is serializable so store
//! implementations can persist it however they like.

mod entity;
mod error;
mod ticket;
mod types;

pub use entity::{Competitor, Entity, EntityKind, EntityRef, Guild, Profile, Team};
pub use error::ModelError;
pub use ticket::{TicketStatus, WarTicket};
pub use types::{ChannelId, MemberId, RoleId, Score, ThreadId, WarResult};
