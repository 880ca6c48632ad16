//! Registration phase: entrants (or whole teams) join and leave before the start.

use crate::logic::registry::EntrantRegistry;
use crate::models::{
    Entrant, EntrantId, FillCount, Member, Phase, Tournament, TournamentError, TournamentMode,
    TournamentSettings,
};

fn registering_settings(tournament: &Tournament) -> Result<&TournamentSettings, TournamentError> {
    match (tournament.phase, tournament.settings.as_ref()) {
        (Phase::Registering, Some(settings)) => Ok(settings),
        _ => Err(TournamentError::WrongPhase),
    }
}

fn fill(tournament: &Tournament, settings: &TournamentSettings) -> FillCount {
    FillCount {
        registered: tournament.entrants.len() / settings.mode.side_size(),
        capacity: settings.capacity,
    }
}

/// Register a member. In 2v2 the member's whole team is registered as a unit.
pub fn register(
    tournament: &mut Tournament,
    registry: &EntrantRegistry,
    member: Member,
) -> Result<FillCount, TournamentError> {
    let settings = registering_settings(tournament)?.clone();
    if member.has_reserved_id() {
        return Err(TournamentError::ReservedId);
    }

    match settings.mode {
        TournamentMode::OneVOne => {
            if tournament.is_registered(member.id) {
                return Err(TournamentError::AlreadyRegistered);
            }
            if tournament.entrants.len() >= settings.capacity {
                return Err(TournamentError::Full);
            }
            log::debug!("community {}: {} registered", tournament.community, member.name);
            tournament.entrants.push(Entrant::Real(member));
        }
        TournamentMode::TwoVTwo => {
            let teammate = registry
                .teammate_of(member.id)
                .cloned()
                .ok_or(TournamentError::NotTeamed)?;
            if tournament.is_registered(member.id) || tournament.is_registered(teammate.id) {
                return Err(TournamentError::AlreadyRegistered);
            }
            if tournament.entrants.len() / 2 >= settings.capacity {
                return Err(TournamentError::Full);
            }
            log::debug!(
                "community {}: team {} & {} registered",
                tournament.community,
                member.name,
                teammate.name
            );
            tournament.entrants.push(Entrant::Real(member));
            tournament.entrants.push(Entrant::Real(teammate));
        }
    }

    Ok(fill(tournament, &settings))
}

/// Withdraw an entrant. In 2v2 both members of the registration unit leave together.
///
/// Teams register as adjacent pairs at even offsets, so the unit partner is found
/// positionally even if the team was dissolved after registering.
pub fn unregister(
    tournament: &mut Tournament,
    entrant: EntrantId,
) -> Result<FillCount, TournamentError> {
    let settings = registering_settings(tournament)?.clone();
    let idx = tournament
        .entrants
        .iter()
        .position(|e| e.id() == entrant)
        .ok_or(TournamentError::NotRegistered)?;

    match settings.mode {
        TournamentMode::OneVOne => {
            tournament.entrants.remove(idx);
        }
        TournamentMode::TwoVTwo => {
            let start = idx - idx % 2;
            tournament.entrants.drain(start..start + 2);
        }
    }
    log::debug!("community {}: entrant {} unregistered", tournament.community, entrant);

    Ok(fill(tournament, &settings))
}
