//! Team: a fixed pair of members within one community.

use crate::models::entrant::{CommunityId, EntrantId, Member};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a team.
pub type TeamId = Uuid;

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub community: CommunityId,
    pub members: [Member; 2],
}

impl Team {
    pub fn new(community: CommunityId, first: Member, second: Member) -> Self {
        Self {
            id: Uuid::new_v4(),
            community,
            members: [first, second],
        }
    }

    pub fn contains(&self, id: EntrantId) -> bool {
        self.members.iter().any(|m| m.id == id)
    }

    /// The other member of the team, if `id` is one of them.
    pub fn teammate_of(&self, id: EntrantId) -> Option<&Member> {
        match &self.members {
            [a, b] if a.id == id => Some(b),
            [a, b] if b.id == id => Some(a),
            _ => None,
        }
    }

    /// "A & B"
    pub fn display_name(&self) -> String {
        format!("{} & {}", self.members[0].name, self.members[1].name)
    }
}
