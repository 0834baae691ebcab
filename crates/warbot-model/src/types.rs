//! Identity types shared by every layer of the war bot.
//!
//! The chat platform hands us raw 64-bit snowflakes for members, threads,
//! roles, and channels. Each one gets its own newtype so a thread id can
//! never be passed where a member id is expected.

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a chat member.
///
/// `#[serde(transparent)]` keeps the stored form a bare integer, so a
/// `MemberId(42)` persists as `42` rather than `{ "0": 42 }`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct MemberId(pub u64);

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "M-{}", self.0)
    }
}

/// The discussion thread a war is fought in. Doubles as the ticket key.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ThreadId(pub u64);

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T-{}", self.0)
    }
}

/// A platform role (moderator, score operator, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleId(pub u64);

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{}", self.0)
    }
}

/// A text channel, e.g. the audit log channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(pub u64);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Score
// ---------------------------------------------------------------------------

/// A win/loss counter. Used both for entities and personal profiles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub wins: u32,
    pub losses: u32,
}

impl Score {
    /// Adds one to the counter matching `result`.
    pub fn record(&mut self, result: WarResult) {
        match result {
            WarResult::Win => self.wins = self.wins.saturating_add(1),
            WarResult::Loss => self.losses = self.losses.saturating_add(1),
        }
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}W-{}L", self.wins, self.losses)
    }
}

/// Which side of a resolved war a party ended up on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarResult {
    Win,
    Loss,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_display_with_prefix() {
        assert_eq!(MemberId(7).to_string(), "M-7");
        assert_eq!(ThreadId(99).to_string(), "T-99");
        assert_eq!(RoleId(3).to_string(), "R-3");
        assert_eq!(ChannelId(1).to_string(), "C-1");
    }

    #[test]
    fn test_ids_serialize_transparently() {
        let json = serde_json::to_string(&ThreadId(12)).unwrap();
        assert_eq!(json, "12");
        let back: MemberId = serde_json::from_str("5").unwrap();
        assert_eq!(back, MemberId(5));
    }

    #[test]
    fn test_score_record() {
        let mut score = Score::default();
        score.record(WarResult::Win);
        score.record(WarResult::Win);
        score.record(WarResult::Loss);
        assert_eq!(score, Score { wins: 2, losses: 1 });
        assert_eq!(score.to_string(), "2W-1L");
    }

    #[test]
    fn test_score_record_saturates() {
        let mut score = Score {
            wins: u32::MAX,
            losses: 0,
        };
        score.record(WarResult::Win);
        assert_eq!(score.wins, u32::MAX);
    }
}
