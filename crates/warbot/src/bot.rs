//! `WarBot` builder and entry points.
//!
//! This is what a chat integration embeds. It ties the layers together:
//! interaction → handler → desk → ticket actor → ports.

use std::sync::Arc;

use tokio::sync::broadcast;
use warbot_engine::{WarConfig, WarDesk, WarEvent};
use warbot_model::{EntityRef, ThreadId, WarTicket};
use warbot_ports::{Backend, MemoryBackend};

use crate::handler::{Interaction, Reply, dispatch};
use crate::{BotConfig, WarBotError};

/// Builder for configuring a [`WarBot`].
///
/// # Example
///
/// ```rust,ignore
/// use warbot::prelude::*;
///
/// let bot = WarBot::builder()
///     .config(BotConfig::from_path("warbot.toml".as_ref())?)
///     .build(Arc::new(my_backend))?;
/// let reply = bot.handle(interaction).await;
/// post(reply.render());
/// ```
#[derive(Debug, Clone, Default)]
pub struct WarBotBuilder {
    config: BotConfig,
}

impl WarBotBuilder {
    /// Creates a builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: BotConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces only the war rules.
    pub fn war_config(mut self, war: WarConfig) -> Self {
        self.config.war = war;
        self
    }

    /// Builds a bot over `backend`.
    ///
    /// The backend's permission oracle decides who is staff and its audit
    /// sink decides where notices go; the staff roles and audit channel in
    /// the config are applied by [`build_in_memory`](Self::build_in_memory)
    /// and are otherwise for the host to wire into its own adapters.
    pub fn build<B: Backend>(self, backend: Arc<B>) -> Result<WarBot<B>, WarBotError> {
        self.config.validate()?;
        let desk = WarDesk::new(backend, self.config.war.clone())?;
        tracing::info!(
            rounds_to_win = self.config.war.rounds_to_win,
            max_rounds = self.config.war.max_rounds,
            audit_channel = ?self.config.audit_channel,
            "war bot ready"
        );
        Ok(WarBot {
            desk,
            config: self.config,
        })
    }

    /// Builds a bot over a fresh [`MemoryBackend`] whose staff are the
    /// configured staff roles and whose audit sink posts to the configured
    /// audit channel.
    pub fn build_in_memory(self) -> Result<WarBot<MemoryBackend>, WarBotError> {
        let backend = MemoryBackend::new(self.config.staff.roles())
            .with_audit_channel(self.config.audit_channel);
        self.build(Arc::new(backend))
    }
}

/// A running war bot.
pub struct WarBot<B: Backend> {
    desk: WarDesk<B>,
    config: BotConfig,
}

impl WarBot<MemoryBackend> {
    /// Creates a new builder.
    pub fn builder() -> WarBotBuilder {
        WarBotBuilder::new()
    }
}

impl<B: Backend> WarBot<B> {
    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    pub fn backend(&self) -> &Arc<B> {
        self.desk.backend()
    }

    pub fn desk(&self) -> &WarDesk<B> {
        &self.desk
    }

    /// Subscribes to score and resolution events.
    pub fn subscribe(&self) -> broadcast::Receiver<WarEvent> {
        self.desk.subscribe()
    }

    /// Handles one interaction. Rejections come back as
    /// [`Reply::Rejected`], never as an error.
    pub async fn handle(&self, interaction: Interaction) -> Reply {
        dispatch(&self.desk, interaction).await
    }

    /// Opens a war awaiting acceptance by `enemy`.
    pub async fn open_war(
        &self,
        thread_id: ThreadId,
        your: EntityRef,
        enemy: EntityRef,
    ) -> Result<WarTicket, WarBotError> {
        let ticket = self.desk.open(thread_id, your, enemy).await?;
        Ok(ticket)
    }

    /// Stops all ticket actors. Pending interactions are answered first.
    pub async fn shutdown(&self) {
        self.desk.shutdown().await;
    }
}
