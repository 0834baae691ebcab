//! Interaction routing: one chat interaction in, one reply out.
//!
//! The surrounding bot framework turns its button presses and form
//! submissions into an [`Interaction`]. The handler
//!   1. routes it to the ticket's actor through the [`WarDesk`]
//!   2. turns the engine's result into a [`Reply`], never an error
//!
//! Every rejection becomes [`Reply::Rejected`] with the kind of problem, so
//! the caller only has to render and post it.

use serde::{Deserialize, Serialize};
use warbot_engine::{
    DodgeReport, EngineError, FinalScore, RejectionKind, Resolution, RoundReport, WarDesk,
};
use warbot_model::{EntityRef, MemberId, ThreadId, WarTicket};
use warbot_ports::Backend;

/// An action a member took inside a war thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interaction {
    pub thread_id: ThreadId,
    pub actor: MemberId,
    pub action: WarAction,
}

/// What the member asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WarAction {
    /// The enemy side takes up the challenge.
    Accept,
    /// Staff record who won the given round.
    ReportRound { winner: String, round: u32 },
    /// Staff declare that `dodging` forfeits.
    DeclareDodge { dodging: String },
}

/// The outcome of an interaction, ready to be rendered into the thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Accepted {
        your: EntityRef,
        enemy: EntityRef,
    },
    RoundRecorded {
        round: u32,
        winner: EntityRef,
        score: FinalScore,
    },
    Concluded(Resolution),
    Dodged {
        winner: EntityRef,
        loser: EntityRef,
    },
    Rejected {
        kind: RejectionKind,
        reason: String,
    },
}

impl Reply {
    /// Returns `true` unless the interaction was rejected.
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Rejected { .. })
    }

    /// Chat text for the reply.
    pub fn render(&self) -> String {
        match self {
            Self::Accepted { your, enemy } => {
                format!("War accepted: {} vs {}. Round 1 is up.", your.name, enemy.name)
            }
            Self::RoundRecorded {
                round,
                winner,
                score,
            } => format!(
                "Round {round} goes to {}. Score: {score}. Round {} is up.",
                winner.name,
                round + 1
            ),
            Self::Concluded(Resolution::Won { winner, score, .. }) => {
                format!("{} wins the war, {score}.", winner.name)
            }
            Self::Concluded(Resolution::Unresolved { score }) => {
                format!("The war ends without a winner, {score}. Scores are unchanged.")
            }
            Self::Concluded(Resolution::Dodged { winner, loser }) | Self::Dodged { winner, loser } => {
                format!(
                    "{} dodged the war. {} is awarded the win.",
                    loser.name, winner.name
                )
            }
            Self::Rejected { kind, reason } => {
                let prefix = match kind {
                    RejectionKind::WrongState => "Not possible right now",
                    RejectionKind::Permission => "Not allowed",
                    RejectionKind::BadInput => "Check your input",
                    RejectionKind::Retryable => "Something went wrong",
                };
                format!("{prefix}: {reason}.")
            }
        }
    }
}

impl From<EngineError> for Reply {
    fn from(err: EngineError) -> Self {
        Self::Rejected {
            kind: err.kind(),
            reason: err.reason(),
        }
    }
}

/// Routes one interaction and converts the result.
pub(crate) async fn dispatch<B: Backend>(desk: &WarDesk<B>, interaction: Interaction) -> Reply {
    let Interaction {
        thread_id,
        actor,
        action,
    } = interaction;

    let result = match action {
        WarAction::Accept => desk.accept(thread_id, actor).await.map(accepted),
        WarAction::ReportRound { winner, round } => desk
            .report_round(thread_id, actor, &winner, round)
            .await
            .map(|report| round_reply(report, &winner, round)),
        WarAction::DeclareDodge { dodging } => desk
            .declare_dodge(thread_id, actor, &dodging)
            .await
            .map(dodged),
    };

    result.unwrap_or_else(|err| {
        tracing::debug!(%thread_id, %actor, error = %err, "interaction rejected");
        err.into()
    })
}

fn accepted(ticket: WarTicket) -> Reply {
    Reply::Accepted {
        your: ticket.your_entity,
        enemy: ticket.enemy_entity,
    }
}

fn round_reply(report: RoundReport, winner_name: &str, round: u32) -> Reply {
    if let Some(resolution) = report.resolution {
        return Reply::Concluded(resolution);
    }
    // The engine accepted `winner_name`, so it resolves to a side.
    let winner = report
        .ticket
        .side(winner_name)
        .cloned()
        .unwrap_or_else(|| report.ticket.your_entity.clone());
    Reply::RoundRecorded {
        round,
        score: FinalScore::of(&report.ticket, &winner),
        winner,
    }
}

fn dodged(report: DodgeReport) -> Reply {
    Reply::Dodged {
        winner: report.winner,
        loser: report.loser,
    }
}
