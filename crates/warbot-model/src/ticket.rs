//! The war ticket: the durable record of one war between two entities.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{EntityRef, ModelError, ThreadId};

// ---------------------------------------------------------------------------
// TicketStatus
// ---------------------------------------------------------------------------

/// The lifecycle state of a war ticket.
///
/// ```text
/// AwaitingAcceptance → Accepted → Concluded
///         │               │
///         └───────┬───────┘
///                 ▼
///               Dodged
/// ```
///
/// `Concluded` and `Dodged` are terminal. A ticket in a terminal state is
/// deleted once its side effects have run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TicketStatus {
    AwaitingAcceptance,
    Accepted,
    Concluded,
    Dodged,
}

impl TicketStatus {
    /// Returns `true` for `Concluded` and `Dodged`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Concluded | Self::Dodged)
    }

    /// Returns `true` if transitioning to `target` is a legal step.
    pub fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::AwaitingAcceptance, Self::Accepted)
                | (Self::Accepted, Self::Concluded)
                | (Self::AwaitingAcceptance, Self::Dodged)
                | (Self::Accepted, Self::Dodged)
        )
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AwaitingAcceptance => write!(f, "AwaitingAcceptance"),
            Self::Accepted => write!(f, "Accepted"),
            Self::Concluded => write!(f, "Concluded"),
            Self::Dodged => write!(f, "Dodged"),
        }
    }
}

// ---------------------------------------------------------------------------
// WarTicket
// ---------------------------------------------------------------------------

/// One active war.
///
/// `version` backs the conditional write in the ticket store: a write only
/// lands if the stored version still equals the version that was read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarTicket {
    pub thread_id: ThreadId,
    pub status: TicketStatus,
    pub your_entity: EntityRef,
    pub enemy_entity: EntityRef,
    /// 1-based; the round awaiting a result.
    pub current_round: u32,
    /// Round wins keyed by the entity's stored name.
    pub round_scores: BTreeMap<String, u32>,
    #[serde(default)]
    pub version: u64,
}

impl WarTicket {
    /// Opens a ticket awaiting acceptance by the enemy side.
    ///
    /// # Errors
    /// - [`ModelError::SelfWar`]: both sides are the same entity
    /// - [`ModelError::NameClash`]: a guild and a team share a name, so a
    ///   typed winner or dodger could not be told apart
    pub fn new(
        thread_id: ThreadId,
        your_entity: EntityRef,
        enemy_entity: EntityRef,
    ) -> Result<Self, ModelError> {
        if your_entity.matches_name(&enemy_entity.name) {
            return Err(if your_entity.kind == enemy_entity.kind {
                ModelError::SelfWar(your_entity.name)
            } else {
                ModelError::NameClash(your_entity.name)
            });
        }
        let round_scores = [
            (your_entity.name.clone(), 0),
            (enemy_entity.name.clone(), 0),
        ]
        .into_iter()
        .collect();
        Ok(Self {
            thread_id,
            status: TicketStatus::AwaitingAcceptance,
            your_entity,
            enemy_entity,
            current_round: 1,
            round_scores,
            version: 0,
        })
    }

    /// Resolves a typed name to one of the two sides.
    ///
    /// Returns `None` if the name matches neither side, or both.
    pub fn side(&self, name: &str) -> Option<&EntityRef> {
        match (
            self.your_entity.matches_name(name),
            self.enemy_entity.matches_name(name),
        ) {
            (true, false) => Some(&self.your_entity),
            (false, true) => Some(&self.enemy_entity),
            _ => None,
        }
    }

    /// The side facing `side`. `side` must be one of the ticket's entities.
    pub fn opponent_of(&self, side: &EntityRef) -> &EntityRef {
        if side == &self.your_entity {
            &self.enemy_entity
        } else {
            &self.your_entity
        }
    }

    /// Rounds won so far by `side`.
    pub fn rounds_won(&self, side: &EntityRef) -> u32 {
        self.round_scores.get(&side.name).copied().unwrap_or(0)
    }
}
