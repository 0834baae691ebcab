//! Error types for the engine layer.

use warbot_model::{MemberId, ModelError, ThreadId, TicketStatus};
use warbot_ports::PortError;

use crate::Action;

/// Broad category of a rejection, for choosing what to tell the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionKind {
    /// The ticket is not in a state that allows the action.
    WrongState,
    /// The actor lacks the required role or relationship.
    Permission,
    /// The request itself is malformed (unknown side, bad names).
    BadInput,
    /// Storage hiccup; nothing was committed and the action may be retried.
    Retryable,
}

/// Errors returned by war ticket operations.
///
/// Every variant except [`EngineError::Store`] and
/// [`EngineError::Unavailable`] is a rejection that left the ticket
/// untouched.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The ticket's status does not allow this action.
    #[error("cannot {action} while the war on {thread_id} is {status}")]
    InvalidState {
        thread_id: ThreadId,
        status: TicketStatus,
        action: Action,
    },

    /// The actor is neither staff nor (where allowed) an enemy leader.
    #[error("{actor} is not allowed to {action}")]
    Unauthorized { actor: MemberId, action: Action },

    /// The supplied name matches neither side of the war.
    #[error("{0:?} is not a side in this war")]
    UnknownEntity(String),

    /// The result is for a round that has already been decided (or not
    /// reached yet).
    #[error("round {claimed} is not the current round (round {current} is being played)")]
    StaleRound { claimed: u32, current: u32 },

    /// No ticket is stored for the thread.
    #[error("no active war in {0}")]
    TicketNotFound(ThreadId),

    /// A ticket already exists for the thread.
    #[error("a war is already open in {0}")]
    AlreadyOpen(ThreadId),

    /// The ticket could not be constructed.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// A port failed. Nothing was committed.
    #[error(transparent)]
    Store(#[from] PortError),

    /// The ticket's actor is not running (shut down or idle-stopped).
    #[error("war {0} is busy, try again")]
    Unavailable(ThreadId),
}

impl EngineError {
    pub fn kind(&self) -> RejectionKind {
        match self {
            Self::InvalidState { .. }
            | Self::StaleRound { .. }
            | Self::TicketNotFound(_)
            | Self::AlreadyOpen(_) => RejectionKind::WrongState,
            Self::Unauthorized { .. } => RejectionKind::Permission,
            Self::UnknownEntity(_) | Self::Model(_) => RejectionKind::BadInput,
            Self::Store(_) | Self::Unavailable(_) => RejectionKind::Retryable,
        }
    }

    /// Short text suitable for showing to the member who triggered the
    /// action. Store failures are not echoed verbatim.
    pub fn reason(&self) -> String {
        match self {
            Self::Store(_) => "the war record could not be saved, try again".to_string(),
            other => other.to_string(),
        }
    }

    /// Returns `true` if the caller may repeat the request unchanged.
    pub fn is_retryable(&self) -> bool {
        self.kind() == RejectionKind::Retryable
    }
}
