//! Entrant registry: team formation and membership for 2v2 play.

use crate::models::{CommunityId, EntrantId, Member, Team, TeamId, TournamentError};
use std::collections::HashMap;

/// Teams of one community. A member belongs to at most one team at a time.
#[derive(Clone, Debug, Default)]
pub struct EntrantRegistry {
    community: CommunityId,
    teams: HashMap<TeamId, Team>,
    team_of: HashMap<EntrantId, TeamId>,
}

impl EntrantRegistry {
    pub fn new(community: CommunityId) -> Self {
        Self {
            community,
            teams: HashMap::new(),
            team_of: HashMap::new(),
        }
    }

    /// Pair two members into a new team.
    pub fn register_team(&mut self, first: Member, second: Member) -> Result<TeamId, TournamentError> {
        if first.has_reserved_id() || second.has_reserved_id() {
            return Err(TournamentError::ReservedId);
        }
        if first.id == second.id {
            return Err(TournamentError::SelfTeam);
        }
        if self.team_of.contains_key(&first.id) || self.team_of.contains_key(&second.id) {
            return Err(TournamentError::AlreadyTeamed);
        }
        let team = Team::new(self.community, first, second);
        let id = team.id;
        for m in &team.members {
            self.team_of.insert(m.id, id);
        }
        log::debug!(
            "community {}: team {} formed ({})",
            self.community,
            id,
            team.display_name()
        );
        self.teams.insert(id, team);
        Ok(id)
    }

    /// Remove a team and both members' association with it.
    ///
    /// A second call for the same id fails with `NotTeamed`.
    pub fn dissolve_team(&mut self, team_id: TeamId) -> Result<Team, TournamentError> {
        let team = self
            .teams
            .remove(&team_id)
            .ok_or(TournamentError::NotTeamed)?;
        for m in &team.members {
            self.team_of.remove(&m.id);
        }
        log::debug!("community {}: team {} dissolved", self.community, team_id);
        Ok(team)
    }

    /// Dissolve whatever team `entrant` belongs to.
    pub fn leave_team(&mut self, entrant: EntrantId) -> Result<Team, TournamentError> {
        let team_id = *self
            .team_of
            .get(&entrant)
            .ok_or(TournamentError::NotTeamed)?;
        self.dissolve_team(team_id)
    }

    pub fn team(&self, team_id: TeamId) -> Option<&Team> {
        self.teams.get(&team_id)
    }

    pub fn team_of(&self, entrant: EntrantId) -> Option<&Team> {
        self.team_of.get(&entrant).and_then(|id| self.teams.get(id))
    }

    pub fn teammate_of(&self, entrant: EntrantId) -> Option<&Member> {
        self.team_of(entrant).and_then(|t| t.teammate_of(entrant))
    }

    pub fn teams(&self) -> impl Iterator<Item = &Team> {
        self.teams.values()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }
}
