//! Notifications published by the engine after a war changes state.
//!
//! Subscribers (leaderboard refreshers, log shippers) get these through
//! [`WarDesk::subscribe`](crate::WarDesk::subscribe). A subscriber that
//! falls behind loses the oldest events, never blocks the engine.

use std::fmt;

use serde::{Deserialize, Serialize};
use warbot_model::{EntityRef, ThreadId, WarTicket};

/// Round wins of one side at the end of a war.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideScore {
    pub entity: EntityRef,
    pub rounds: u32,
}

/// Both sides' round wins. `first` is the winner when there is one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalScore {
    pub first: SideScore,
    pub second: SideScore,
}

impl FinalScore {
    /// Score with `lead` listed first.
    pub fn of(ticket: &WarTicket, lead: &EntityRef) -> Self {
        let other = ticket.opponent_of(lead);
        Self {
            first: SideScore {
                entity: lead.clone(),
                rounds: ticket.rounds_won(lead),
            },
            second: SideScore {
                entity: other.clone(),
                rounds: ticket.rounds_won(other),
            },
        }
    }
}

impl fmt::Display for FinalScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} - {} {}",
            self.first.entity.name, self.first.rounds, self.second.rounds, self.second.entity.name
        )
    }
}

/// How a war ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    /// A side won on rounds.
    Won {
        winner: EntityRef,
        loser: EntityRef,
        score: FinalScore,
    },
    /// All rounds played, nobody reached the required wins. No score change.
    Unresolved { score: FinalScore },
    /// `loser` forfeited.
    Dodged { winner: EntityRef, loser: EntityRef },
}

impl Resolution {
    /// The sides whose scores change, if any.
    pub fn decided(&self) -> Option<(&EntityRef, &EntityRef)> {
        match self {
            Self::Won { winner, loser, .. } | Self::Dodged { winner, loser } => {
                Some((winner, loser))
            }
            Self::Unresolved { .. } => None,
        }
    }
}

/// Events emitted on the desk's broadcast channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarEvent {
    /// Aggregate and personal scores were written for a decided war.
    ScorePropagated {
        thread_id: ThreadId,
        winner: EntityRef,
        loser: EntityRef,
    },
    /// The ticket reached a terminal state and has been cleaned up.
    TicketResolved {
        thread_id: ThreadId,
        resolution: Resolution,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_final_score_lists_lead_first() {
        let mut ticket = WarTicket::new(
            ThreadId(1),
            EntityRef::guild("Ember"),
            EntityRef::team("Rooks"),
        )
        .unwrap();
        ticket.round_scores.insert("Ember".into(), 1);
        ticket.round_scores.insert("Rooks".into(), 2);

        let score = FinalScore::of(&ticket, &EntityRef::team("Rooks"));
        assert_eq!(score.to_string(), "Rooks 2 - 1 Ember");
    }

    #[test]
    fn test_unresolved_decides_nothing() {
        let ticket = WarTicket::new(
            ThreadId(1),
            EntityRef::guild("Ember"),
            EntityRef::guild("Frost"),
        )
        .unwrap();
        let unresolved = Resolution::Unresolved {
            score: FinalScore::of(&ticket, &ticket.your_entity),
        };
        assert!(unresolved.decided().is_none());

        let dodged = Resolution::Dodged {
            winner: EntityRef::guild("Ember"),
            loser: EntityRef::guild("Frost"),
        };
        assert_eq!(dodged.decided().unwrap().1, &EntityRef::guild("Frost"));
    }
}
