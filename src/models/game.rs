//! Match sides, matches and rounds for 1v1 / 2v2 brackets.

use crate::models::entrant::{Entrant, EntrantId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a match.
pub type MatchId = Uuid;

/// One side of a match: a single entrant (1v1) or a pair standing together (2v2).
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Solo(Entrant),
    Pair([Entrant; 2]),
}

impl Side {
    pub fn members(&self) -> &[Entrant] {
        match self {
            Side::Solo(e) => std::slice::from_ref(e),
            Side::Pair(pair) => pair,
        }
    }

    pub fn contains(&self, id: EntrantId) -> bool {
        self.members().iter().any(|e| e.id() == id)
    }

    /// True when nobody on this side is a real member.
    pub fn is_synthetic(&self) -> bool {
        self.members().iter().all(Entrant::is_synthetic)
    }

    pub fn display_name(&self) -> String {
        match self {
            Side::Solo(e) => e.display_name(),
            Side::Pair([a, b]) => format!("{} & {}", a.display_name(), b.display_name()),
        }
    }
}

/// Which side of a match won.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    #[default]
    One,
    Two,
}

/// A single contest between two sides.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct GameMatch {
    pub id: MatchId,
    pub side_1: Side,
    pub side_2: Side,
    /// None until a winner is recorded.
    pub winner: Option<Slot>,
}

impl GameMatch {
    pub fn new(side_1: Side, side_2: Side) -> Self {
        Self {
            id: Uuid::new_v4(),
            side_1,
            side_2,
            winner: None,
        }
    }

    /// Slot of the side containing `id`, if any.
    pub fn slot_of(&self, id: EntrantId) -> Option<Slot> {
        if self.side_1.contains(id) {
            Some(Slot::One)
        } else if self.side_2.contains(id) {
            Some(Slot::Two)
        } else {
            None
        }
    }

    pub fn side(&self, slot: Slot) -> &Side {
        match slot {
            Slot::One => &self.side_1,
            Slot::Two => &self.side_2,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.winner.is_some()
    }
}

/// Matches active at the same time. Numbered from 1.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Round {
    pub number: usize,
    pub matches: Vec<GameMatch>,
}

impl Round {
    /// Pair consecutive sides into matches. `sides` must have even length.
    pub fn from_sides(number: usize, sides: Vec<Side>) -> Self {
        let mut matches = Vec::with_capacity(sides.len() / 2);
        let mut iter = sides.into_iter();
        while let (Some(a), Some(b)) = (iter.next(), iter.next()) {
            matches.push(GameMatch::new(a, b));
        }
        Self { number, matches }
    }

    /// Every entrant standing in this round, in match order.
    pub fn entrants(&self) -> impl Iterator<Item = &Entrant> {
        self.matches.iter().flat_map(|m| {
            m.side_1
                .members()
                .iter()
                .chain(m.side_2.members().iter())
        })
    }

    pub fn resolved_count(&self) -> usize {
        self.matches.iter().filter(|m| m.is_resolved()).count()
    }
}
