//! Competing parties: guilds and teams, plus member profiles.
//!
//! An [`Entity`] is a tagged union over the two kinds of party. Each kind
//! keeps its own roster shape (only guilds have a co-leader), and both are
//! reached through the [`Competitor`] trait so score propagation never has
//! to match on the kind itself.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{MemberId, Score, WarResult};

// ---------------------------------------------------------------------------
// EntityKind / EntityRef
// ---------------------------------------------------------------------------

/// The two kinds of competitive party.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Guild,
    Team,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Guild => write!(f, "Guild"),
            Self::Team => write!(f, "Team"),
        }
    }
}

/// A reference to an entity by name and kind.
///
/// Names are unique within a kind. Tickets hold these rather than the
/// entity itself, because the entity record is owned by the entity store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub name: String,
    pub kind: EntityKind,
}

impl EntityRef {
    pub fn guild(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntityKind::Guild,
        }
    }

    pub fn team(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntityKind::Team,
        }
    }

    /// Case-insensitive name comparison, as operators type names by hand.
    pub fn matches_name(&self, name: &str) -> bool {
        self.name.trim().eq_ignore_ascii_case(name.trim())
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.kind)
    }
}

// ---------------------------------------------------------------------------
// Competitor capability
// ---------------------------------------------------------------------------

/// What score propagation needs from a party, regardless of its kind.
pub trait Competitor {
    /// The reference this party is stored under.
    fn entity_ref(&self) -> EntityRef;

    /// Every member involved with this party, de-duplicated.
    ///
    /// Leadership slots and roster slots are merged, so a leader who is
    /// also listed on the roster appears once.
    fn members(&self) -> BTreeSet<MemberId>;

    /// Records one war result on the aggregate score.
    fn add_score(&mut self, result: WarResult);

    /// The current aggregate score.
    fn score(&self) -> Score;
}

// ---------------------------------------------------------------------------
// Guild / Team
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guild {
    pub name: String,
    pub leader: MemberId,
    pub co_leader: Option<MemberId>,
    pub members: Vec<MemberId>,
    #[serde(default)]
    pub score: Score,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub name: String,
    pub leader: MemberId,
    pub members: Vec<MemberId>,
    #[serde(default)]
    pub score: Score,
}

impl Competitor for Guild {
    fn entity_ref(&self) -> EntityRef {
        EntityRef::guild(self.name.clone())
    }

    fn members(&self) -> BTreeSet<MemberId> {
        let mut all: BTreeSet<MemberId> = self.members.iter().copied().collect();
        all.insert(self.leader);
        all.extend(self.co_leader);
        all
    }

    fn add_score(&mut self, result: WarResult) {
        self.score.record(result);
    }

    fn score(&self) -> Score {
        self.score
    }
}

impl Competitor for Team {
    fn entity_ref(&self) -> EntityRef {
        EntityRef::team(self.name.clone())
    }

    fn members(&self) -> BTreeSet<MemberId> {
        let mut all: BTreeSet<MemberId> = self.members.iter().copied().collect();
        all.insert(self.leader);
        all
    }

    fn add_score(&mut self, result: WarResult) {
        self.score.record(result);
    }

    fn score(&self) -> Score {
        self.score
    }
}

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A guild or a team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Entity {
    Guild(Guild),
    Team(Team),
}

impl Entity {
    pub fn name(&self) -> &str {
        match self {
            Self::Guild(g) => &g.name,
            Self::Team(t) => &t.name,
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Guild(_) => EntityKind::Guild,
            Self::Team(_) => EntityKind::Team,
        }
    }

    /// Returns `true` if `member` holds the leader or co-leader slot.
    pub fn is_leadership(&self, member: MemberId) -> bool {
        match self {
            Self::Guild(g) => g.leader == member || g.co_leader == Some(member),
            Self::Team(t) => t.leader == member,
        }
    }

    fn as_competitor(&self) -> &dyn Competitor {
        match self {
            Self::Guild(g) => g,
            Self::Team(t) => t,
        }
    }

    fn as_competitor_mut(&mut self) -> &mut dyn Competitor {
        match self {
            Self::Guild(g) => g,
            Self::Team(t) => t,
        }
    }
}

impl Competitor for Entity {
    fn entity_ref(&self) -> EntityRef {
        self.as_competitor().entity_ref()
    }

    fn members(&self) -> BTreeSet<MemberId> {
        self.as_competitor().members()
    }

    fn add_score(&mut self, result: WarResult) {
        self.as_competitor_mut().add_score(result);
    }

    fn score(&self) -> Score {
        self.as_competitor().score()
    }
}

impl From<Guild> for Entity {
    fn from(guild: Guild) -> Self {
        Self::Guild(guild)
    }
}

impl From<Team> for Entity {
    fn from(team: Team) -> Self {
        Self::Team(team)
    }
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// A member's personal record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub member_id: MemberId,
    #[serde(default)]
    pub personal_score: Score,
}

impl Profile {
    /// A fresh profile with zeroed counters.
    pub fn new(member_id: MemberId) -> Self {
        Self {
            member_id,
            personal_score: Score::default(),
        }
    }
}
