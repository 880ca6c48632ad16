//! Setup: configure a fresh tournament and build round 1 at the start.

use crate::logic::registry::EntrantRegistry;
use crate::models::{
    Entrant, EntrantId, Phase, Round, Side, Tournament, TournamentError, TournamentMode,
    TournamentSettings,
};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;

/// Apply settings to an unconfigured tournament and open registration.
pub fn configure_tournament(
    tournament: &mut Tournament,
    settings: TournamentSettings,
) -> Result<(), TournamentError> {
    if tournament.phase != Phase::Unconfigured {
        return Err(TournamentError::WrongPhase);
    }
    log::info!(
        "community {}: tournament '{}' configured ({} mode, capacity {})",
        tournament.community,
        settings.metadata.title,
        settings.mode,
        settings.capacity
    );
    tournament.settings = Some(settings);
    tournament.phase = Phase::Registering;
    Ok(())
}

/// Start the tournament with a thread-local RNG. See [`start_tournament_with_rng`].
pub fn start_tournament<'a>(
    tournament: &'a mut Tournament,
    registry: &EntrantRegistry,
) -> Result<&'a Round, TournamentError> {
    start_tournament_with_rng(tournament, registry, &mut rand::thread_rng())
}

/// Freeze the entrants and build round 1.
///
/// 1. Append byes until the number of sides is even (one bye per 1v1 side, a bye pair per 2v2 side).
/// 2. Shuffle: 1v1 shuffles entrants; 2v2 shuffles team units, never splitting a team.
/// 3. Pair consecutive sides into matches.
pub fn start_tournament_with_rng<'a, R: Rng + ?Sized>(
    tournament: &'a mut Tournament,
    registry: &EntrantRegistry,
    rng: &mut R,
) -> Result<&'a Round, TournamentError> {
    let mode = match (tournament.phase, tournament.settings.as_ref()) {
        (Phase::Registering, Some(settings)) => settings.mode,
        _ => return Err(TournamentError::NotReady),
    };
    let real = tournament.entrants.iter().filter(|e| !e.is_synthetic()).count();
    if real < mode.side_size() {
        return Err(TournamentError::NotReady);
    }

    let sides: Vec<Side> = match mode {
        TournamentMode::OneVOne => {
            while tournament.entrants.len() % 2 != 0 {
                let bye = tournament.next_bye();
                tournament.entrants.push(bye);
            }
            tournament.entrants.shuffle(rng);
            tournament.entrants.iter().cloned().map(Side::Solo).collect()
        }
        TournamentMode::TwoVTwo => {
            while (tournament.entrants.len() / 2) % 2 != 0 {
                let first = tournament.next_bye();
                let second = tournament.next_bye();
                tournament.entrants.push(first);
                tournament.entrants.push(second);
            }
            let mut units = team_units(&tournament.entrants, registry);
            units.shuffle(rng);
            tournament.entrants = units.iter().flat_map(|u| u.iter().cloned()).collect();
            units.into_iter().map(Side::Pair).collect()
        }
    };

    let round = Round::from_sides(1, sides);
    log::info!(
        "community {}: tournament started with {} entrants, round 1 has {} matches",
        tournament.community,
        tournament.entrants.len(),
        round.matches.len()
    );
    tournament.phase = Phase::Active;
    tournament.rounds = vec![round];
    tournament.results.clear();
    tournament.eliminated.clear();
    Ok(&tournament.rounds[0])
}

/// Group entrants into pairs that must share a side.
///
/// Registered teammates (per the registry) form a unit. Real entrants without a
/// registered teammate are paired with each other in registration order; byes are
/// paired in the order they were generated.
fn team_units(entrants: &[Entrant], registry: &EntrantRegistry) -> Vec<[Entrant; 2]> {
    let mut units = Vec::with_capacity(entrants.len() / 2);
    let mut placed: HashSet<EntrantId> = HashSet::new();
    let mut singles = Vec::new();

    for e in entrants.iter().filter(|e| !e.is_synthetic()) {
        if !placed.insert(e.id()) {
            continue;
        }
        let mate = registry
            .teammate_of(e.id())
            .filter(|m| !placed.contains(&m.id))
            .and_then(|m| entrants.iter().find(|x| x.id() == m.id));
        match mate {
            Some(mate) => {
                placed.insert(mate.id());
                units.push([e.clone(), mate.clone()]);
            }
            None => singles.push(e.clone()),
        }
    }

    let byes: Vec<Entrant> = entrants.iter().filter(|e| e.is_synthetic()).cloned().collect();
    for chunk in singles.chunks_exact(2).chain(byes.chunks_exact(2)) {
        units.push([chunk[0].clone(), chunk[1].clone()]);
    }
    units
}
