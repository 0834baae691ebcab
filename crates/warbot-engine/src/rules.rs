//! Pure ticket transitions: acceptance, round adjudication, and dodges.
//!
//! Nothing in this module performs I/O. Each function takes the ticket as
//! it was read, plus whatever the caller already established about the
//! actor, and returns the next ticket (or the reason it was refused). The
//! ticket actor persists the result and runs the side effects afterwards.
//!
//! Checks always run in the same order: status, then permission, then the
//! request's own arguments. A request that fails more than one check is
//! reported by the first.

use std::fmt;

use warbot_model::{EntityRef, MemberId, TicketStatus, WarTicket};

use crate::{EngineError, WarConfig};

/// The actions an actor can take on a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Accept,
    ReportRound,
    DeclareDodge,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accept => write!(f, "accept the war"),
            Self::ReportRound => write!(f, "report a round result"),
            Self::DeclareDodge => write!(f, "declare a dodge"),
        }
    }
}

/// What the caller learned about the actor before applying a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clearance {
    pub actor: MemberId,
    /// Administrator, moderator, or score operator.
    pub staff: bool,
    /// Leader or co-leader of the ticket's enemy entity.
    pub enemy_leader: bool,
}

impl Clearance {
    pub fn staff(actor: MemberId) -> Self {
        Self {
            actor,
            staff: true,
            enemy_leader: false,
        }
    }

    pub fn nobody(actor: MemberId) -> Self {
        Self {
            actor,
            staff: false,
            enemy_leader: false,
        }
    }
}

/// Result of adjudicating one round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundOutcome {
    /// No side has won yet; the next round is expected.
    Continue,
    /// A side reached the required round wins.
    MatchWon { winner: EntityRef, loser: EntityRef },
    /// All rounds were played without a side reaching the required wins.
    Unresolved,
}

impl RoundOutcome {
    pub fn is_final(&self) -> bool {
        !matches!(self, Self::Continue)
    }
}

fn require_status(
    ticket: &WarTicket,
    action: Action,
    allowed: &[TicketStatus],
) -> Result<(), EngineError> {
    if allowed.contains(&ticket.status) {
        Ok(())
    } else {
        Err(EngineError::InvalidState {
            thread_id: ticket.thread_id,
            status: ticket.status,
            action,
        })
    }
}

fn require(granted: bool, clearance: Clearance, action: Action) -> Result<(), EngineError> {
    if granted {
        Ok(())
    } else {
        Err(EngineError::Unauthorized {
            actor: clearance.actor,
            action,
        })
    }
}

fn resolve_side(ticket: &WarTicket, name: &str) -> Result<EntityRef, EngineError> {
    ticket
        .side(name)
        .cloned()
        .ok_or_else(|| EngineError::UnknownEntity(name.trim().to_string()))
}

/// Acceptance gate.
///
/// Staff, or a leader/co-leader of the enemy entity, may accept a ticket
/// that is awaiting acceptance. The round counter restarts at 1.
pub fn accept(ticket: &WarTicket, clearance: Clearance) -> Result<WarTicket, EngineError> {
    require_status(ticket, Action::Accept, &[TicketStatus::AwaitingAcceptance])?;
    require(
        clearance.staff || clearance.enemy_leader,
        clearance,
        Action::Accept,
    )?;

    let mut next = ticket.clone();
    next.status = TicketStatus::Accepted;
    next.current_round = 1;
    Ok(next)
}

/// Round adjudicator.
///
/// `claimed_round` must equal the ticket's current round; it is what stops
/// a duplicate or late submission from counting twice.
pub fn submit_round(
    ticket: &WarTicket,
    clearance: Clearance,
    winner_name: &str,
    claimed_round: u32,
    config: &WarConfig,
) -> Result<(WarTicket, RoundOutcome), EngineError> {
    require_status(ticket, Action::ReportRound, &[TicketStatus::Accepted])?;
    require(clearance.staff, clearance, Action::ReportRound)?;
    if claimed_round != ticket.current_round {
        return Err(EngineError::StaleRound {
            claimed: claimed_round,
            current: ticket.current_round,
        });
    }
    let winner = resolve_side(ticket, winner_name)?;

    let mut next = ticket.clone();
    *next.round_scores.entry(winner.name.clone()).or_insert(0) += 1;
    next.current_round += 1;

    let outcome = if next.rounds_won(&winner) >= config.rounds_to_win {
        let loser = next.opponent_of(&winner).clone();
        RoundOutcome::MatchWon { winner, loser }
    } else if next.current_round > config.max_rounds {
        RoundOutcome::Unresolved
    } else {
        RoundOutcome::Continue
    };

    if outcome.is_final() {
        next.status = TicketStatus::Concluded;
    }
    Ok((next, outcome))
}

/// Dodge resolver. Staff only; returns `(ticket, winner, loser)` where the
/// loser is the side that dodged.
pub fn declare_dodge(
    ticket: &WarTicket,
    clearance: Clearance,
    dodging_name: &str,
) -> Result<(WarTicket, EntityRef, EntityRef), EngineError> {
    require_status(
        ticket,
        Action::DeclareDodge,
        &[TicketStatus::AwaitingAcceptance, TicketStatus::Accepted],
    )?;
    require(clearance.staff, clearance, Action::DeclareDodge)?;
    let loser = resolve_side(ticket, dodging_name)?;
    let winner = ticket.opponent_of(&loser).clone();

    let mut next = ticket.clone();
    next.status = TicketStatus::Dodged;
    Ok((next, winner, loser))
}
