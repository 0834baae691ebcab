//! War ticket engine.
//!
//! Drives one war from acceptance to conclusion:
//!
//! - [`rules`]: pure transitions (acceptance gate, round adjudicator,
//!   dodge resolver)
//! - [`ScorePropagator`]: writes a decided war into entity and profile
//!   records
//! - [`ThreadGuard`]: closes the war's thread afterwards
//! - [`WarDesk`]: routes operations to one actor per ticket
//!   ([`TicketHandle`]), so writes to a ticket never interleave
//!
//! # Key types
//!
//! - [`WarConfig`]: best-of-N rules, retry policy, buffer sizes
//! - [`EngineError`]: rejections and store failures, with a
//!   [`RejectionKind`] for user-facing replies
//! - [`WarEvent`]: `ScorePropagated` / `TicketResolved` notifications

mod config;
mod desk;
mod error;
mod events;
mod guard;
mod propagation;
mod retry;
pub mod rules;
mod ticket;

pub use config::{InvalidConfig, RetryPolicy, WarConfig};
pub use desk::WarDesk;
pub use error::{EngineError, RejectionKind};
pub use events::{FinalScore, Resolution, SideScore, WarEvent};
pub use guard::{GuardReport, ThreadGuard};
pub use propagation::{PropagationReport, ScorePropagator};
pub use rules::{Action, Clearance, RoundOutcome};
pub use ticket::{DodgeReport, RoundReport, TicketHandle};
