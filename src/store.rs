//! Per-community tournament store.
//!
//! Each community owns one tournament and one team registry behind its own mutex.
//! Commands hold that mutex only for the state change; messaging and ledger calls
//! go out after it is released, and their failures are logged, never returned.

use crate::collaborators::{Messenger, Permissions, PointsLedger};
use crate::logic::{self, Advance, EntrantRegistry, MatchResolution, Standings};
use crate::models::{
    CommunityId, EntrantId, FillCount, Member, Phase, Round, Team, TeamId, Tournament,
    TournamentError, TournamentId, TournamentMetadata, TournamentMode, TournamentSettings,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{Duration, Instant};

struct Community {
    tournament: Tournament,
    registry: EntrantRegistry,
    last_activity: Instant,
    /// Set by pruning while it holds the lock; the map no longer points here.
    retired: bool,
}

impl Community {
    fn new(id: CommunityId) -> Self {
        Self {
            tournament: Tournament::new(id),
            registry: EntrantRegistry::new(id),
            last_activity: Instant::now(),
            retired: false,
        }
    }

    fn is_idle(&self, max_idle: Duration) -> bool {
        self.tournament.phase() != Phase::Active
            && self.registry.is_empty()
            && self.last_activity.elapsed() >= max_idle
    }
}

/// Result of recording a winner, after any round advance or completion.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WinnerOutcome {
    /// Other matches of the round are still open.
    Pending { resolution: MatchResolution },
    /// The round finished and the next one was published.
    NextRound {
        resolution: MatchResolution,
        round: Round,
    },
    /// The final was decided. Points were awarded and the community now has a fresh
    /// unconfigured tournament.
    Completed {
        resolution: MatchResolution,
        standings: Standings,
    },
}

/// All communities' tournaments, keyed by community id.
pub struct TournamentStore {
    communities: RwLock<HashMap<CommunityId, Arc<Mutex<Community>>>>,
    messenger: Arc<dyn Messenger>,
    ledger: Arc<dyn PointsLedger>,
    permissions: Arc<dyn Permissions>,
}

impl TournamentStore {
    pub fn new(
        messenger: Arc<dyn Messenger>,
        ledger: Arc<dyn PointsLedger>,
        permissions: Arc<dyn Permissions>,
    ) -> Self {
        Self {
            communities: RwLock::new(HashMap::new()),
            messenger,
            ledger,
            permissions,
        }
    }

    fn entry(&self, id: CommunityId) -> Arc<Mutex<Community>> {
        {
            let map = self.communities.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(entry) = map.get(&id) {
                return Arc::clone(entry);
            }
        }
        let mut map = self.communities.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            map.entry(id)
                .or_insert_with(|| Arc::new(Mutex::new(Community::new(id)))),
        )
    }

    /// Run `f` inside the community's critical section.
    fn with_community<T>(&self, id: CommunityId, f: impl FnOnce(&mut Community) -> T) -> T {
        self.with_entry(id, self.entry(id), f)
    }

    /// Lock `entry`, looking the community up again if pruning retired it
    /// between the lookup and the lock.
    fn with_entry<T>(
        &self,
        id: CommunityId,
        mut entry: Arc<Mutex<Community>>,
        f: impl FnOnce(&mut Community) -> T,
    ) -> T {
        loop {
            let mut guard = entry.lock().unwrap_or_else(PoisonError::into_inner);
            if !guard.retired {
                guard.last_activity = Instant::now();
                return f(&mut *guard);
            }
            drop(guard);
            log::debug!("community {}: entry was pruned, retrying", id);
            entry = self.entry(id);
        }
    }

    /// Read-only view without creating the community.
    fn peek<T>(&self, id: CommunityId, f: impl FnOnce(&Community) -> T) -> Option<T> {
        let entry = {
            let map = self.communities.read().unwrap_or_else(PoisonError::into_inner);
            map.get(&id).cloned()
        }?;
        let guard = entry.lock().unwrap_or_else(PoisonError::into_inner);
        if guard.retired {
            return None;
        }
        Some(f(&*guard))
    }

    /// Replace the community's tournament with a freshly configured one.
    ///
    /// Refused while a bracket is Active; use [`TournamentStore::reset`] for that.
    pub fn configure(
        &self,
        community: CommunityId,
        mode: TournamentMode,
        capacity: usize,
        metadata: TournamentMetadata,
    ) -> Result<Tournament, TournamentError> {
        let settings = TournamentSettings::new(mode, capacity, metadata)?;
        let configured = self.with_community(community, |c| {
            if c.tournament.phase() == Phase::Active {
                return Err(TournamentError::WrongPhase);
            }
            let mut fresh = Tournament::new(community);
            logic::configure_tournament(&mut fresh, settings)?;
            c.tournament = fresh;
            Ok(c.tournament.clone())
        })?;
        log::info!("community {}: tournament {} configured", community, configured.id());
        Ok(configured)
    }

    /// Discard whatever tournament the community has, including a stuck Active one.
    pub fn reset(&self, community: CommunityId, actor: EntrantId) -> TournamentId {
        self.with_community(community, |c| {
            log::info!(
                "community {}: actor {} reset tournament {} ({:?})",
                community,
                actor,
                c.tournament.id(),
                c.tournament.phase()
            );
            c.tournament = Tournament::new(community);
            c.tournament.id()
        })
    }

    pub fn register_team(
        &self,
        community: CommunityId,
        first: Member,
        second: Member,
    ) -> Result<TeamId, TournamentError> {
        let names = format!("{} & {}", first.name, second.name);
        let id = self.with_community(community, |c| c.registry.register_team(first, second))?;
        log::info!("community {}: team {} ({}) registered", community, id, names);
        Ok(id)
    }

    pub fn dissolve_team(
        &self,
        community: CommunityId,
        team: TeamId,
    ) -> Result<Team, TournamentError> {
        let team = self.with_community(community, |c| c.registry.dissolve_team(team))?;
        log::info!("community {}: team {} dissolved", community, team.display_name());
        Ok(team)
    }

    pub fn leave_team(
        &self,
        community: CommunityId,
        entrant: EntrantId,
    ) -> Result<Team, TournamentError> {
        let team = self.with_community(community, |c| c.registry.leave_team(entrant))?;
        log::info!(
            "community {}: entrant {} left team {}",
            community,
            entrant,
            team.display_name()
        );
        Ok(team)
    }

    pub fn team_of(&self, community: CommunityId, entrant: EntrantId) -> Option<Team> {
        self.peek(community, |c| c.registry.team_of(entrant).cloned())
            .flatten()
    }

    pub fn teammate_of(&self, community: CommunityId, entrant: EntrantId) -> Option<Member> {
        self.peek(community, |c| c.registry.teammate_of(entrant).cloned())
            .flatten()
    }

    pub fn register(
        &self,
        community: CommunityId,
        member: Member,
    ) -> Result<FillCount, TournamentError> {
        let name = member.name.clone();
        let fill = self.with_community(community, |c| {
            logic::register(&mut c.tournament, &c.registry, member)
        })?;
        log::info!("community {}: {} registered ({})", community, name, fill);
        Ok(fill)
    }

    pub fn unregister(
        &self,
        community: CommunityId,
        entrant: EntrantId,
    ) -> Result<FillCount, TournamentError> {
        let fill = self.with_community(community, |c| logic::unregister(&mut c.tournament, entrant))?;
        log::info!("community {}: entrant {} unregistered ({})", community, entrant, fill);
        Ok(fill)
    }

    /// Build round 1 and publish it.
    pub fn start(&self, community: CommunityId, actor: EntrantId) -> Result<Round, TournamentError> {
        if !self.permissions.can_start(actor, community) {
            return Err(TournamentError::Forbidden);
        }
        let (round, metadata) = self.with_community(community, |c| {
            let round = logic::start_tournament(&mut c.tournament, &c.registry)?.clone();
            let metadata = c
                .tournament
                .settings()
                .map(|s| s.metadata.clone())
                .unwrap_or_default();
            Ok::<_, TournamentError>((round, metadata))
        })?;
        log::info!("community {}: actor {} started the tournament", community, actor);

        if let Err(e) = self.messenger.publish_round(community, &round, &metadata) {
            log::warn!("community {}: failed to publish round 1: {}", community, e);
        }
        Ok(round)
    }

    /// Record a match winner; advances the round or completes the tournament.
    ///
    /// On completion the standings are computed once, the community gets a fresh
    /// unconfigured tournament, and points are awarded after the lock is released.
    pub fn record_winner(
        &self,
        community: CommunityId,
        actor: EntrantId,
        identity: EntrantId,
    ) -> Result<WinnerOutcome, TournamentError> {
        if !self.permissions.can_record_winner(actor, community) {
            return Err(TournamentError::Forbidden);
        }
        let (recorded, metadata, standings) = self.with_community(community, |c| {
            let recorded = logic::record_winner(&mut c.tournament, identity)?;
            let metadata = c
                .tournament
                .settings()
                .map(|s| s.metadata.clone())
                .unwrap_or_default();
            let standings = match recorded.advance {
                Advance::Champion(_) => {
                    let standings = logic::compute_standings(&c.tournament)?;
                    c.tournament = Tournament::new(community);
                    Some(standings)
                }
                _ => None,
            };
            Ok::<_, TournamentError>((recorded, metadata, standings))
        })?;
        log::info!(
            "community {}: actor {} recorded {} as winner of round {} match {}",
            community,
            actor,
            recorded.resolution.winner.display_name(),
            recorded.resolution.round,
            recorded.resolution.match_index + 1
        );

        let resolution = recorded.resolution;
        if let Err(e) = self.messenger.update_match(
            community,
            resolution.round,
            resolution.match_index,
            &resolution.winner.display_name(),
        ) {
            log::warn!("community {}: failed to update match display: {}", community, e);
        }

        match (recorded.advance, standings) {
            (Advance::NextRound(round), _) => {
                if let Err(e) = self.messenger.publish_round(community, &round, &metadata) {
                    log::warn!(
                        "community {}: failed to publish round {}: {}",
                        community,
                        round.number,
                        e
                    );
                }
                Ok(WinnerOutcome::NextRound { resolution, round })
            }
            (Advance::Champion(_), Some(standings)) => {
                self.award(&standings);
                if let Err(e) = self.messenger.publish_placements(&standings) {
                    log::warn!("community {}: failed to publish placements: {}", community, e);
                }
                Ok(WinnerOutcome::Completed {
                    resolution,
                    standings,
                })
            }
            _ => Ok(WinnerOutcome::Pending { resolution }),
        }
    }

    fn award(&self, standings: &Standings) {
        for award in &standings.awards {
            match self
                .ledger
                .award_points(standings.community, award.entrant, award.points)
            {
                Ok(()) => log::info!(
                    "community {}: {} +{} SP for place {}",
                    standings.community,
                    award.name,
                    award.points,
                    award.place
                ),
                Err(e) => log::warn!(
                    "community {}: failed to award {} SP to {}: {}",
                    standings.community,
                    award.points,
                    award.name,
                    e
                ),
            }
        }
    }

    /// Owned copy of the community's tournament for display.
    pub fn snapshot(&self, community: CommunityId) -> Tournament {
        self.peek(community, |c| c.tournament.clone())
            .unwrap_or_else(|| Tournament::new(community))
    }

    pub fn fill_count(&self, community: CommunityId) -> Option<FillCount> {
        self.peek(community, |c| c.tournament.fill_count()).flatten()
    }

    /// Drop communities with no running bracket and no teams that saw no command
    /// for `max_idle`. Returns how many were removed.
    pub fn prune_idle(&self, max_idle: Duration) -> usize {
        let mut map = self.communities.write().unwrap_or_else(PoisonError::into_inner);
        let before = map.len();
        map.retain(|_, entry| match entry.try_lock() {
            Ok(mut c) if c.is_idle(max_idle) => {
                c.retired = true;
                false
            }
            _ => true,
        });
        before - map.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{LogMessenger, MemoryLedger, RolePermissions};

    fn store() -> TournamentStore {
        TournamentStore::new(
            Arc::new(LogMessenger),
            Arc::new(MemoryLedger::new()),
            Arc::new(RolePermissions::new([])),
        )
    }

    #[test]
    fn pruned_entry_is_looked_up_again() {
        let store = store();
        // A command that fetched the entry just before pruning removed it.
        let stale = store.entry(1);
        assert_eq!(store.prune_idle(Duration::ZERO), 1);
        assert!(stale.lock().unwrap().retired);

        let team = store
            .with_entry(1, stale, |c| {
                c.registry.register_team(Member::new(1, "Ann"), Member::new(2, "Bo"))
            })
            .unwrap();
        assert_eq!(store.team_of(1, 2).map(|t| t.id), Some(team));
    }

    #[test]
    fn busy_entries_survive_pruning() {
        let store = store();
        let entry = store.entry(1);
        let guard = entry.lock().unwrap();
        assert_eq!(store.prune_idle(Duration::ZERO), 0);
        drop(guard);
        assert_eq!(store.prune_idle(Duration::ZERO), 1);
    }
}
