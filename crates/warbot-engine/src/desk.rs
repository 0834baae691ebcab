//! War desk: routes ticket operations to per-thread actors.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, broadcast};
use warbot_model::{EntityRef, MemberId, ThreadId, WarTicket};
use warbot_ports::Backend;

use crate::ticket::{Context, spawn_ticket};
use crate::{
    DodgeReport, EngineError, InvalidConfig, RoundReport, ScorePropagator, ThreadGuard,
    TicketHandle, WarConfig, WarEvent,
};

/// Entry point for war operations.
///
/// Keeps one actor per thread that has seen traffic and spawns actors on
/// demand. The desk itself holds no ticket state: a restarted desk picks
/// up exactly where the ticket store left off.
pub struct WarDesk<B: Backend> {
    ctx: Arc<Context<B>>,

    /// Running actors, keyed by thread. At most one per thread.
    actors: Mutex<HashMap<ThreadId, TicketHandle>>,
}

impl<B: Backend> WarDesk<B> {
    /// Creates a desk over `backend`.
    ///
    /// # Errors
    /// Returns [`InvalidConfig`] if `config` fails validation.
    pub fn new(backend: Arc<B>, config: WarConfig) -> Result<Self, InvalidConfig> {
        config.validate()?;
        let (events, _) = broadcast::channel(config.event_buffer);
        let ctx = Context {
            backend,
            propagator: ScorePropagator::new(config.retry),
            guard: ThreadGuard::new(config.closing_notice.clone()),
            config,
            events,
        };
        Ok(Self {
            ctx: Arc::new(ctx),
            actors: Mutex::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &WarConfig {
        &self.ctx.config
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.ctx.backend
    }

    /// Subscribes to [`WarEvent`]s published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<WarEvent> {
        self.ctx.events.subscribe()
    }

    /// Returns the actor for `thread_id`, spawning one if none is running.
    pub async fn handle(&self, thread_id: ThreadId) -> TicketHandle {
        let mut actors = self.actors.lock().await;
        if let Some(handle) = actors.get(&thread_id) {
            if !handle.is_closed() {
                return handle.clone();
            }
        }
        let handle = spawn_ticket(thread_id, Arc::clone(&self.ctx));
        actors.insert(thread_id, handle.clone());
        handle
    }

    /// Opens a war in `thread_id`. Stands in for the ticket creation flow.
    pub async fn open(
        &self,
        thread_id: ThreadId,
        your_entity: EntityRef,
        enemy_entity: EntityRef,
    ) -> Result<WarTicket, EngineError> {
        self.handle(thread_id)
            .await
            .open(your_entity, enemy_entity)
            .await
    }

    /// Acceptance gate: staff or an enemy leader accepts the war.
    pub async fn accept(
        &self,
        thread_id: ThreadId,
        actor: MemberId,
    ) -> Result<WarTicket, EngineError> {
        self.handle(thread_id).await.accept(actor).await
    }

    /// Round adjudicator: staff reports who won `round`.
    pub async fn report_round(
        &self,
        thread_id: ThreadId,
        actor: MemberId,
        winner: &str,
        round: u32,
    ) -> Result<RoundReport, EngineError> {
        let report = self
            .handle(thread_id)
            .await
            .report_round(actor, winner, round)
            .await?;
        if report.resolution.is_some() {
            self.retire(thread_id).await;
        }
        Ok(report)
    }

    /// Dodge resolver: staff declares that `dodging` forfeited.
    pub async fn declare_dodge(
        &self,
        thread_id: ThreadId,
        actor: MemberId,
        dodging: &str,
    ) -> Result<DodgeReport, EngineError> {
        let report = self
            .handle(thread_id)
            .await
            .declare_dodge(actor, dodging)
            .await?;
        self.retire(thread_id).await;
        Ok(report)
    }

    /// Stops the actor of a resolved ticket. Commands already queued on it
    /// are still answered (with `TicketNotFound`).
    async fn retire(&self, thread_id: ThreadId) {
        let handle = self.actors.lock().await.remove(&thread_id);
        if let Some(handle) = handle {
            let _ = handle.shutdown().await;
            tracing::debug!(%thread_id, "ticket actor retired");
        }
    }

    /// Number of actors currently registered.
    pub async fn actor_count(&self) -> usize {
        self.actors.lock().await.len()
    }

    /// Stops every actor. Queued commands are answered first.
    pub async fn shutdown(&self) {
        let handles: Vec<TicketHandle> = self.actors.lock().await.drain().map(|(_, h)| h).collect();
        for handle in handles {
            let _ = handle.shutdown().await;
        }
        tracing::info!("war desk shut down");
    }
}
