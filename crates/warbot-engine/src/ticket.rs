//! Ticket actor: the single writer for one war ticket.
//!
//! Every command for a given thread goes through one Tokio task, so the
//! read-validate-write cycle on a ticket never interleaves with another
//! command for the same ticket. Two staff members clicking "round 2 won"
//! at the same moment are handled one after the other; the second sees
//! round 3 and is rejected as stale.
//!
//! The actor holds no ticket state between commands. It loads the ticket
//! from the store, applies a pure transition from [`rules`](crate::rules),
//! commits with a conditional write, and only then runs side effects.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot};
use warbot_model::{EntityRef, MemberId, ThreadId, WarTicket};
use warbot_ports::{
    AuditSink, Backend, DodgeNotice, PermissionOracle, PortError, TicketStore,
};

use crate::retry::with_retry;
use crate::rules::{self, Clearance, RoundOutcome};
use crate::{
    EngineError, FinalScore, Resolution, ScorePropagator, ThreadGuard, WarConfig, WarEvent,
};

/// Reply channel for one command.
type Reply<T> = oneshot::Sender<Result<T, EngineError>>;

/// Commands sent to a ticket actor through its channel.
pub(crate) enum TicketCommand {
    /// Store a fresh ticket awaiting acceptance.
    Open {
        your_entity: EntityRef,
        enemy_entity: EntityRef,
        reply: Reply<WarTicket>,
    },

    Accept {
        actor: MemberId,
        reply: Reply<WarTicket>,
    },

    ReportRound {
        actor: MemberId,
        winner: String,
        round: u32,
        reply: Reply<RoundReport>,
    },

    DeclareDodge {
        actor: MemberId,
        dodging: String,
        reply: Reply<DodgeReport>,
    },

    /// Stop after the commands already queued.
    Shutdown,
}

/// Result of a successful round submission.
#[derive(Debug, Clone)]
pub struct RoundReport {
    /// The ticket as committed (terminal if the war ended).
    pub ticket: WarTicket,
    pub outcome: RoundOutcome,
    /// Set when the round ended the war.
    pub resolution: Option<Resolution>,
}

/// Result of a successful dodge declaration.
#[derive(Debug, Clone)]
pub struct DodgeReport {
    pub ticket: WarTicket,
    pub winner: EntityRef,
    /// The side that dodged.
    pub loser: EntityRef,
}

/// Everything a ticket actor needs, shared by all actors of one desk.
pub(crate) struct Context<B: Backend> {
    pub(crate) backend: Arc<B>,
    pub(crate) config: WarConfig,
    pub(crate) propagator: ScorePropagator,
    pub(crate) guard: ThreadGuard,
    pub(crate) events: broadcast::Sender<WarEvent>,
}

/// Handle to a running ticket actor.
///
/// Cheap to clone; it wraps an `mpsc::Sender`.
#[derive(Clone)]
pub struct TicketHandle {
    thread_id: ThreadId,
    sender: mpsc::Sender<TicketCommand>,
}

impl TicketHandle {
    /// The thread (and ticket) this actor serves.
    pub fn thread_id(&self) -> ThreadId {
        self.thread_id
    }

    /// `true` once the actor has stopped accepting commands.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Sends one command and waits for its reply.
    ///
    /// Both halves map to `Unavailable`: a send fails once the actor has
    /// closed its mailbox, and a reply is dropped only if the actor stops
    /// mid-command.
    async fn request<T>(
        &self,
        build: impl FnOnce(Reply<T>) -> TicketCommand,
    ) -> Result<T, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(build(reply_tx))
            .await
            .map_err(|_| EngineError::Unavailable(self.thread_id))?;
        reply_rx
            .await
            .map_err(|_| EngineError::Unavailable(self.thread_id))?
    }

    /// Creates the ticket for this thread, awaiting acceptance.
    ///
    /// # Errors
    /// - `AlreadyOpen`: a war is already running in the thread
    /// - `Model`: the two sides are the same entity or share a name
    pub async fn open(
        &self,
        your_entity: EntityRef,
        enemy_entity: EntityRef,
    ) -> Result<WarTicket, EngineError> {
        self.request(|reply| TicketCommand::Open {
            your_entity,
            enemy_entity,
            reply,
        })
        .await
    }

    /// Acceptance gate. Staff, or a leader or co-leader of the enemy
    /// entity, may accept.
    ///
    /// # Returns
    /// - `Ok(ticket)`: the committed ticket, now `Accepted` on round 1
    /// - `Err(InvalidState)`: the ticket is not awaiting acceptance
    /// - `Err(Unauthorized)`: the actor may not accept for the enemy
    /// - `Err(Store)`: nothing was committed; retry
    pub async fn accept(&self, actor: MemberId) -> Result<WarTicket, EngineError> {
        self.request(|reply| TicketCommand::Accept { actor, reply })
            .await
    }

    /// Round adjudicator. Staff record that `winner` took `round`.
    ///
    /// # Arguments
    /// - `winner`: a side's name, matched case-insensitively
    /// - `round`: must equal the ticket's current round, so a repeated
    ///   click on an already-recorded round is rejected as `StaleRound`
    ///
    /// # Returns
    /// A [`RoundReport`]. When the round ends the war, its `resolution` is
    /// set and scores, thread closing, and ticket deletion have already
    /// run.
    pub async fn report_round(
        &self,
        actor: MemberId,
        winner: impl Into<String>,
        round: u32,
    ) -> Result<RoundReport, EngineError> {
        let winner = winner.into();
        self.request(|reply| TicketCommand::ReportRound {
            actor,
            winner,
            round,
            reply,
        })
        .await
    }

    /// Dodge resolver. Staff declare that `dodging` forfeits; the other
    /// side is awarded the win. Allowed before or after acceptance, never
    /// once the war has ended.
    pub async fn declare_dodge(
        &self,
        actor: MemberId,
        dodging: impl Into<String>,
    ) -> Result<DodgeReport, EngineError> {
        let dodging = dodging.into();
        self.request(|reply| TicketCommand::DeclareDodge {
            actor,
            dodging,
            reply,
        })
        .await
    }

    /// Tells the actor to stop once its queue is drained.
    pub async fn shutdown(&self) -> Result<(), EngineError> {
        self.sender
            .send(TicketCommand::Shutdown)
            .await
            .map_err(|_| EngineError::Unavailable(self.thread_id))
    }
}

/// The internal actor state. Runs inside a Tokio task.
struct TicketActor<B: Backend> {
    thread_id: ThreadId,
    ctx: Arc<Context<B>>,
    receiver: mpsc::Receiver<TicketCommand>,
}

impl<B: Backend> TicketActor<B> {
    /// Processes commands until shutdown, channel close, or idle timeout.
    async fn run(mut self) {
        tracing::debug!(thread_id = %self.thread_id, "ticket actor started");
        let idle = self.ctx.config.idle_timeout();

        loop {
            let next = match idle {
                Some(limit) => match tokio::time::timeout(limit, self.receiver.recv()).await {
                    Ok(cmd) => cmd,
                    Err(_) => {
                        tracing::debug!(thread_id = %self.thread_id, "ticket actor idle, stopping");
                        self.drain().await;
                        break;
                    }
                },
                None => self.receiver.recv().await,
            };

            match next {
                Some(TicketCommand::Shutdown) => {
                    self.drain().await;
                    break;
                }
                Some(cmd) => self.dispatch(cmd).await,
                None => break,
            }
        }

        tracing::debug!(thread_id = %self.thread_id, "ticket actor stopped");
    }

    /// Refuses new commands and answers the ones already queued.
    async fn drain(&mut self) {
        self.receiver.close();
        while let Some(cmd) = self.receiver.recv().await {
            if !matches!(cmd, TicketCommand::Shutdown) {
                self.dispatch(cmd).await;
            }
        }
    }

    async fn dispatch(&self, cmd: TicketCommand) {
        match cmd {
            TicketCommand::Open {
                your_entity,
                enemy_entity,
                reply,
            } => {
                let _ = reply.send(self.handle_open(your_entity, enemy_entity).await);
            }
            TicketCommand::Accept { actor, reply } => {
                let _ = reply.send(self.handle_accept(actor).await);
            }
            TicketCommand::ReportRound {
                actor,
                winner,
                round,
                reply,
            } => {
                let _ = reply.send(self.handle_round(actor, &winner, round).await);
            }
            TicketCommand::DeclareDodge {
                actor,
                dodging,
                reply,
            } => {
                let _ = reply.send(self.handle_dodge(actor, &dodging).await);
            }
            TicketCommand::Shutdown => {}
        }
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    /// Stores a fresh ticket. Fails with `AlreadyOpen` while a war is
    /// running in the thread; a leftover terminal ticket is overwritten.
    async fn handle_open(
        &self,
        your_entity: EntityRef,
        enemy_entity: EntityRef,
    ) -> Result<WarTicket, EngineError> {
        let mut ticket = WarTicket::new(self.thread_id, your_entity, enemy_entity)?;

        // A terminal ticket still in the store means a previous war's
        // cleanup stopped before the delete. Its result was already
        // committed, so the thread is free for a new war.
        if let Some(existing) = self.ctx.backend.tickets().get(self.thread_id).await? {
            if !existing.status.is_terminal() {
                return Err(EngineError::AlreadyOpen(self.thread_id));
            }
            tracing::warn!(
                thread_id = %self.thread_id,
                status = %existing.status,
                "replacing resolved ticket whose cleanup never finished"
            );
            ticket.version = existing.version;
        }

        let stored = self.commit(ticket).await.map_err(|e| match e {
            EngineError::Store(PortError::Conflict { .. }) => {
                EngineError::AlreadyOpen(self.thread_id)
            }
            other => other,
        })?;
        tracing::info!(
            thread_id = %self.thread_id,
            your = %stored.your_entity,
            enemy = %stored.enemy_entity,
            "war ticket opened"
        );
        Ok(stored)
    }

    async fn handle_accept(&self, actor: MemberId) -> Result<WarTicket, EngineError> {
        let ticket = self.load().await?;
        let clearance = self.clearance(actor, Some(&ticket.enemy_entity)).await?;
        let next = rules::accept(&ticket, clearance).inspect_err(|e| self.rejected(actor, e))?;
        let stored = self.commit(next).await?;
        tracing::info!(thread_id = %self.thread_id, %actor, "war accepted");
        Ok(stored)
    }

    async fn handle_round(
        &self,
        actor: MemberId,
        winner: &str,
        round: u32,
    ) -> Result<RoundReport, EngineError> {
        let ticket = self.load().await?;
        let clearance = self.clearance(actor, None).await?;
        let (next, outcome) =
            rules::submit_round(&ticket, clearance, winner, round, &self.ctx.config)
                .inspect_err(|e| self.rejected(actor, e))?;
        let stored = self.commit(next).await?;
        tracing::info!(
            thread_id = %self.thread_id,
            %actor,
            round,
            winner = %winner,
            ?outcome,
            "round recorded"
        );

        let resolution = match &outcome {
            RoundOutcome::Continue => None,
            RoundOutcome::MatchWon { winner, loser } => Some(Resolution::Won {
                winner: winner.clone(),
                loser: loser.clone(),
                score: FinalScore::of(&stored, winner),
            }),
            RoundOutcome::Unresolved => Some(Resolution::Unresolved {
                score: FinalScore::of(&stored, &stored.your_entity),
            }),
        };
        if let Some(resolution) = &resolution {
            self.finish(resolution, None).await;
        }

        Ok(RoundReport {
            ticket: stored,
            outcome,
            resolution,
        })
    }

    async fn handle_dodge(
        &self,
        actor: MemberId,
        dodging: &str,
    ) -> Result<DodgeReport, EngineError> {
        let ticket = self.load().await?;
        let clearance = self.clearance(actor, None).await?;
        let (next, winner, loser) = rules::declare_dodge(&ticket, clearance, dodging)
            .inspect_err(|e| self.rejected(actor, e))?;
        let stored = self.commit(next).await?;
        tracing::info!(
            thread_id = %self.thread_id,
            %actor,
            dodging = %loser,
            "dodge declared"
        );

        let notice = DodgeNotice {
            thread_id: self.thread_id,
            dodging: loser.clone(),
            winner: winner.clone(),
            declared_by: actor,
        };
        let resolution = Resolution::Dodged {
            winner: winner.clone(),
            loser: loser.clone(),
        };
        self.finish(&resolution, Some(notice)).await;

        Ok(DodgeReport {
            ticket: stored,
            winner,
            loser,
        })
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    async fn load(&self) -> Result<WarTicket, EngineError> {
        self.ctx
            .backend
            .tickets()
            .get(self.thread_id)
            .await?
            .ok_or(EngineError::TicketNotFound(self.thread_id))
    }

    /// Conditional write. The ticket counts as changed only after this
    /// returns `Ok`.
    async fn commit(&self, ticket: WarTicket) -> Result<WarTicket, EngineError> {
        self.ctx
            .backend
            .tickets()
            .put(ticket)
            .await
            .inspect_err(|e| {
                tracing::warn!(thread_id = %self.thread_id, error = %e, "ticket write failed");
            })
            .map_err(EngineError::from)
    }

    /// Looks up the actor's roles. The leadership check only runs when
    /// `enemy` is given and the actor isn't already staff.
    async fn clearance(
        &self,
        actor: MemberId,
        enemy: Option<&EntityRef>,
    ) -> Result<Clearance, EngineError> {
        let permissions = self.ctx.backend.permissions();
        let staff = permissions.is_staff(actor).await?;
        let enemy_leader = match enemy {
            Some(entity) if !staff => permissions.is_leader_or_co_leader(actor, entity).await?,
            _ => false,
        };
        Ok(Clearance {
            actor,
            staff,
            enemy_leader,
        })
    }

    fn rejected(&self, actor: MemberId, error: &EngineError) {
        tracing::debug!(thread_id = %self.thread_id, %actor, %error, "request rejected");
    }

    /// Side effects of a committed terminal transition, in order: scores,
    /// audit notice, thread closing, ticket deletion, resolution event.
    /// Nothing here can undo the committed result.
    async fn finish(&self, resolution: &Resolution, notice: Option<DodgeNotice>) {
        let backend = self.ctx.backend.as_ref();

        if let Some((winner, loser)) = resolution.decided() {
            self.ctx.propagator.propagate(backend, winner, loser).await;
            let _ = self.ctx.events.send(WarEvent::ScorePropagated {
                thread_id: self.thread_id,
                winner: winner.clone(),
                loser: loser.clone(),
            });
        }

        if let Some(notice) = notice {
            if let Err(e) = backend.audit().post_dodge_notice(&notice).await {
                tracing::warn!(thread_id = %self.thread_id, error = %e, "audit notice failed");
            }
        }

        self.ctx.guard.restrict(backend.channels(), self.thread_id).await;

        let tickets = backend.tickets();
        let deleted = with_retry(&self.ctx.config.retry, "ticket delete", || {
            tickets.delete(self.thread_id)
        })
        .await;
        if let Err(e) = deleted {
            tracing::error!(
                thread_id = %self.thread_id,
                error = %e,
                "terminal ticket could not be deleted"
            );
        }

        tracing::info!(thread_id = %self.thread_id, ?resolution, "war resolved");
        let _ = self.ctx.events.send(WarEvent::TicketResolved {
            thread_id: self.thread_id,
            resolution: resolution.clone(),
        });
    }
}

/// Spawns a ticket actor and returns a handle to it.
pub(crate) fn spawn_ticket<B: Backend>(thread_id: ThreadId, ctx: Arc<Context<B>>) -> TicketHandle {
    let (tx, rx) = mpsc::channel(ctx.config.command_buffer);

    let actor = TicketActor {
        thread_id,
        ctx,
        receiver: rx,
    };

    tokio::spawn(actor.run());

    TicketHandle {
        thread_id,
        sender: tx,
    }
}
