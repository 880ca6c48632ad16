//! Integration tests for the per-community store and its collaborators.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use tourney_bracket::{
    CollaboratorError, CommunityId, EntrantId, MemoryLedger, Member, Messenger, Permissions,
    Phase, PointsLedger, Role, RolePermissions, Round, Standings, TournamentError,
    TournamentMetadata, TournamentMode, TournamentStore, WinnerOutcome,
};

const COMMUNITY: CommunityId = 1;
const ADMIN: EntrantId = 900;
const HOST: EntrantId = 901;
const NOBODY: EntrantId = 902;

#[derive(Default)]
struct RecordingMessenger {
    events: Mutex<Vec<String>>,
    fail: bool,
}

impl RecordingMessenger {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn record(&self, event: String) -> Result<(), CollaboratorError> {
        self.events.lock().unwrap().push(event);
        if self.fail {
            return Err(CollaboratorError::Unavailable("chat is down".to_string()));
        }
        Ok(())
    }
}

impl Messenger for RecordingMessenger {
    fn publish_round(
        &self,
        community: CommunityId,
        round: &Round,
        _metadata: &TournamentMetadata,
    ) -> Result<(), CollaboratorError> {
        self.record(format!("{community}: round {}", round.number))
    }

    fn update_match(
        &self,
        community: CommunityId,
        round: usize,
        match_index: usize,
        winner_display: &str,
    ) -> Result<(), CollaboratorError> {
        self.record(format!("{community}: round {round} match {match_index} won by {winner_display}"))
    }

    fn publish_placements(&self, standings: &Standings) -> Result<(), CollaboratorError> {
        self.record(format!(
            "{}: {} placements",
            standings.community,
            standings.placements.len()
        ))
    }
}

#[derive(Default)]
struct RecordingLedger {
    awards: Mutex<Vec<(CommunityId, EntrantId, i64)>>,
}

impl PointsLedger for RecordingLedger {
    fn award_points(
        &self,
        community: CommunityId,
        entrant: EntrantId,
        delta: i64,
    ) -> Result<(), CollaboratorError> {
        self.awards.lock().unwrap().push((community, entrant, delta));
        Ok(())
    }
}

struct Fixture {
    store: TournamentStore,
    messenger: Arc<RecordingMessenger>,
    ledger: Arc<RecordingLedger>,
}

fn fixture_with(messenger: RecordingMessenger) -> Fixture {
    let messenger = Arc::new(messenger);
    let ledger = Arc::new(RecordingLedger::default());
    let roles = Arc::new(RolePermissions::new([ADMIN]));
    roles.grant(COMMUNITY, HOST, Role::Host);
    let store = TournamentStore::new(messenger.clone(), ledger.clone(), roles);
    Fixture {
        store,
        messenger,
        ledger,
    }
}

fn fixture() -> Fixture {
    fixture_with(RecordingMessenger::default())
}

fn member(id: u64) -> Member {
    Member::new(id, format!("P{id}"))
}

fn registered_pair(f: &Fixture) {
    f.store
        .configure(COMMUNITY, TournamentMode::OneVOne, 2, TournamentMetadata::default())
        .unwrap();
    f.store.register(COMMUNITY, member(1)).unwrap();
    f.store.register(COMMUNITY, member(2)).unwrap();
}

#[test]
fn start_is_forbidden_without_a_staff_role() {
    let f = fixture();
    registered_pair(&f);

    assert_eq!(f.store.start(COMMUNITY, NOBODY), Err(TournamentError::Forbidden));
    assert_eq!(f.store.start(COMMUNITY, HOST), Err(TournamentError::Forbidden));
    assert_eq!(f.store.snapshot(COMMUNITY).phase(), Phase::Registering);
    assert!(f.messenger.events().is_empty());
}

#[test]
fn recording_is_forbidden_without_a_staff_role() {
    let f = fixture();
    registered_pair(&f);
    f.store.start(COMMUNITY, ADMIN).unwrap();

    assert!(matches!(
        f.store.record_winner(COMMUNITY, NOBODY, 1),
        Err(TournamentError::Forbidden)
    ));
    let snapshot = f.store.snapshot(COMMUNITY);
    assert_eq!(snapshot.phase(), Phase::Active);
    assert!(snapshot.eliminated().is_empty());
}

#[test]
fn final_awards_points_once_and_resets_the_community() {
    let f = fixture();
    registered_pair(&f);
    let started = f.store.start(COMMUNITY, ADMIN).unwrap();
    let old_id = f.store.snapshot(COMMUNITY).id();
    assert_eq!(started.matches.len(), 1);

    let outcome = f.store.record_winner(COMMUNITY, HOST, 2).unwrap();
    let WinnerOutcome::Completed { standings, .. } = outcome else {
        panic!("a two-entrant final completes the tournament");
    };
    assert!(standings.champion.contains(2));

    let mut awards = f.ledger.awards.lock().unwrap().clone();
    awards.sort();
    assert_eq!(awards, vec![(COMMUNITY, 1, 2), (COMMUNITY, 2, 3)]);

    let fresh = f.store.snapshot(COMMUNITY);
    assert_eq!(fresh.phase(), Phase::Unconfigured);
    assert_ne!(fresh.id(), old_id);
    assert!(fresh.entrants().is_empty());

    assert_eq!(
        f.messenger.events(),
        vec![
            "1: round 1".to_string(),
            "1: round 1 match 0 won by P2".to_string(),
            "1: 2 placements".to_string(),
        ]
    );
    assert!(matches!(
        f.store.record_winner(COMMUNITY, HOST, 2),
        Err(TournamentError::WrongPhase)
    ));
    assert_eq!(f.ledger.awards.lock().unwrap().len(), 2);
}

#[test]
fn messenger_failure_does_not_undo_the_start() {
    let f = fixture_with(RecordingMessenger::failing());
    registered_pair(&f);

    let round = f.store.start(COMMUNITY, ADMIN).unwrap();
    assert_eq!(round.number, 1);
    assert_eq!(f.store.snapshot(COMMUNITY).phase(), Phase::Active);
    assert_eq!(f.messenger.events().len(), 1);
}

#[test]
fn configure_is_refused_while_active_but_reset_is_not() {
    let f = fixture();
    registered_pair(&f);
    f.store.start(COMMUNITY, ADMIN).unwrap();

    assert!(matches!(
        f.store
            .configure(COMMUNITY, TournamentMode::OneVOne, 4, TournamentMetadata::default()),
        Err(TournamentError::WrongPhase)
    ));
    f.store.reset(COMMUNITY, ADMIN);
    assert_eq!(f.store.snapshot(COMMUNITY).phase(), Phase::Unconfigured);
    f.store
        .configure(COMMUNITY, TournamentMode::OneVOne, 4, TournamentMetadata::default())
        .unwrap();
}

#[test]
fn communities_are_independent() {
    let f = fixture();
    registered_pair(&f);
    f.store
        .configure(2, TournamentMode::TwoVTwo, 4, TournamentMetadata::default())
        .unwrap();

    assert_eq!(f.store.fill_count(COMMUNITY).map(|c| c.registered), Some(2));
    assert_eq!(f.store.fill_count(2).map(|c| c.registered), Some(0));
    assert_eq!(f.store.fill_count(3), None);
    assert_eq!(f.store.snapshot(2).mode(), Some(TournamentMode::TwoVTwo));
}

#[test]
fn teams_are_scoped_to_their_community() {
    let f = fixture();
    let team = f.store.register_team(COMMUNITY, member(1), member(2)).unwrap();
    assert_eq!(f.store.teammate_of(COMMUNITY, 1).map(|m| m.id), Some(2));
    assert!(f.store.team_of(2, 1).is_none());
    f.store.register_team(2, member(1), member(3)).unwrap();

    assert_eq!(
        f.store.register_team(COMMUNITY, member(1), member(4)),
        Err(TournamentError::AlreadyTeamed)
    );
    let left = f.store.leave_team(COMMUNITY, 2).unwrap();
    assert_eq!(left.id, team);
    assert_eq!(f.store.dissolve_team(COMMUNITY, team), Err(TournamentError::NotTeamed));
}

#[test]
fn concurrent_registrations_fill_exactly_to_capacity() {
    let f = fixture();
    f.store
        .configure(COMMUNITY, TournamentMode::OneVOne, 32, TournamentMetadata::default())
        .unwrap();

    let results: Vec<Result<_, _>> = thread::scope(|s| {
        let handles: Vec<_> = (1..=40)
            .map(|id| {
                let store = &f.store;
                s.spawn(move || store.register(COMMUNITY, member(id)))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 32);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| *e == TournamentError::Full));
    let snapshot = f.store.snapshot(COMMUNITY);
    let ids: HashSet<EntrantId> = snapshot.entrants().iter().map(|e| e.id()).collect();
    assert_eq!(ids.len(), 32);
}

#[test]
fn simultaneous_winner_submissions_resolve_the_match_once() {
    let f = fixture();
    f.store
        .configure(COMMUNITY, TournamentMode::OneVOne, 4, TournamentMetadata::default())
        .unwrap();
    for id in 1..=4 {
        f.store.register(COMMUNITY, member(id)).unwrap();
    }
    let round = f.store.start(COMMUNITY, ADMIN).unwrap();
    let contested = &round.matches[0];
    let contenders = [
        contested.side_1.members()[0].id(),
        contested.side_2.members()[0].id(),
    ];

    let results: Vec<Result<_, _>> = thread::scope(|s| {
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = &f.store;
                let entrant = contenders[i % 2];
                s.spawn(move || store.record_winner(COMMUNITY, HOST, entrant))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| *e == TournamentError::NotInRound));
    let snapshot = f.store.snapshot(COMMUNITY);
    assert_eq!(snapshot.eliminated().len(), 1);
    assert_eq!(snapshot.results().len(), 1);
    assert_eq!(snapshot.current_round().map(|r| r.resolved_count()), Some(1));
}

#[test]
fn team_formed_while_pruning_is_never_lost() {
    let f = fixture();
    for community in 100..300 {
        thread::scope(|s| {
            s.spawn(|| {
                f.store
                    .register_team(community, member(1), member(2))
                    .unwrap();
            });
            s.spawn(|| f.store.prune_idle(Duration::ZERO));
        });
        assert!(
            f.store.team_of(community, 1).is_some(),
            "team in community {community} was dropped"
        );
    }
}

#[test]
fn pruning_keeps_communities_with_teams() {
    let f = fixture();
    f.store
        .configure(COMMUNITY, TournamentMode::OneVOne, 2, TournamentMetadata::default())
        .unwrap();
    f.store.register_team(2, member(1), member(2)).unwrap();

    assert_eq!(f.store.prune_idle(Duration::ZERO), 1);
    assert_eq!(f.store.snapshot(COMMUNITY).phase(), Phase::Unconfigured);
    assert!(f.store.team_of(2, 1).is_some());
}

#[test]
fn memory_ledger_accumulates_per_community() {
    let ledger = MemoryLedger::new();
    ledger.award_points(COMMUNITY, 1, 3).unwrap();
    ledger.award_points(COMMUNITY, 1, 2).unwrap();
    ledger.award_points(2, 1, 1).unwrap();
    assert_eq!(ledger.balance(COMMUNITY, 1), 5);
    assert_eq!(ledger.balance(2, 1), 1);
    assert_eq!(ledger.balance(2, 9), 0);
}

#[test]
fn roles_grant_and_revoke() {
    let roles = RolePermissions::new([ADMIN]);
    assert!(roles.can_start(ADMIN, 42));
    assert!(roles.is_admin(ADMIN, 42));

    roles.grant(COMMUNITY, 5, Role::Lead);
    assert!(roles.can_start(5, COMMUNITY));
    assert!(roles.can_record_winner(5, COMMUNITY));
    assert!(!roles.can_start(5, 2));

    roles.grant(COMMUNITY, 6, Role::Host);
    assert!(!roles.can_start(6, COMMUNITY));
    assert!(roles.can_record_winner(6, COMMUNITY));

    roles.revoke(COMMUNITY, 5, Role::Lead);
    assert!(!roles.can_start(5, COMMUNITY));
}
