//! Entrants: real members and synthetic byes.

use serde::{Deserialize, Serialize};

/// Opaque identity of an entrant (a community member or a bye).
pub type EntrantId = u64;

/// Identity of the account that owns a real entrant.
pub type AccountId = u64;

/// Identity of the community a tournament and its teams are scoped to.
pub type CommunityId = u64;

/// Synthetic ids are `BYE_ID_BASE + n` where `n` comes from the tournament's bye counter.
pub const BYE_ID_BASE: EntrantId = 761_557_952_975_420_886;

/// A real participant.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: EntrantId,
    pub name: String,
    pub account: AccountId,
}

impl Member {
    /// Member whose owning account is the entrant id itself (the common case).
    pub fn new(id: EntrantId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            account: id,
        }
    }

    /// Ids from `BYE_ID_BASE` up belong to generated byes.
    pub fn has_reserved_id(&self) -> bool {
        self.id >= BYE_ID_BASE
    }
}

/// A generated placeholder used to keep match counts even.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct Bye {
    pub ordinal: u64,
}

impl Bye {
    pub fn id(&self) -> EntrantId {
        BYE_ID_BASE + self.ordinal
    }

    pub fn name(&self) -> String {
        format!("Bot{}", self.ordinal)
    }
}

/// Someone standing in a bracket.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Entrant {
    Real(Member),
    Synthetic(Bye),
}

impl Entrant {
    pub fn id(&self) -> EntrantId {
        match self {
            Entrant::Real(m) => m.id,
            Entrant::Synthetic(b) => b.id(),
        }
    }

    pub fn display_name(&self) -> String {
        match self {
            Entrant::Real(m) => m.name.clone(),
            Entrant::Synthetic(b) => b.name(),
        }
    }

    pub fn is_synthetic(&self) -> bool {
        matches!(self, Entrant::Synthetic(_))
    }

    /// The member behind this entrant, `None` for byes.
    pub fn member(&self) -> Option<&Member> {
        match self {
            Entrant::Real(m) => Some(m),
            Entrant::Synthetic(_) => None,
        }
    }
}

impl From<Member> for Entrant {
    fn from(m: Member) -> Self {
        Entrant::Real(m)
    }
}
