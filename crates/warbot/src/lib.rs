//! # Warbot
//!
//! War adjudication for a community chat bot.
//!
//! Two guilds or teams open a war in a thread; the enemy side accepts,
//! staff report round results until one side takes the best-of-N, or staff
//! declare a dodge. The bot then updates entity and member scores and
//! closes the thread.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use warbot::prelude::*;
//!
//! # async fn run() -> Result<(), WarBotError> {
//! let bot = WarBot::builder().build_in_memory()?;
//! bot.open_war(ThreadId(1), EntityRef::guild("Ember"), EntityRef::team("Rooks"))
//!     .await?;
//!
//! let reply = bot
//!     .handle(Interaction {
//!         thread_id: ThreadId(1),
//!         actor: MemberId(42),
//!         action: WarAction::Accept,
//!     })
//!     .await;
//! println!("{}", reply.render());
//! # Ok(())
//! # }
//! ```

mod bot;
mod config;
mod error;
mod handler;
pub mod telemetry;

pub use bot::{WarBot, WarBotBuilder};
pub use config::{BotConfig, ConfigError, StaffRoles};
pub use error::WarBotError;
pub use handler::{Interaction, Reply, WarAction};

/// Re-exports for the common case.
pub mod prelude {
    pub use crate::{
        BotConfig, ConfigError, Interaction, Reply, StaffRoles, WarAction, WarBot,
        WarBotBuilder, WarBotError,
    };

    pub use warbot_engine::{
        EngineError, FinalScore, RejectionKind, Resolution, WarConfig, WarDesk, WarEvent,
    };
    pub use warbot_model::{
        ChannelId, Entity, EntityKind, EntityRef, Guild, MemberId, Profile, RoleId, Score,
        Team, ThreadId, TicketStatus, WarTicket,
    };
    pub use warbot_ports::{Backend, MemoryBackend};
}
