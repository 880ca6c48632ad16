//! Final placements and seasonal point rewards for a completed tournament.

use crate::models::{
    CommunityId, EntrantId, Phase, Side, Tournament, TournamentError, TournamentId,
    TournamentMetadata, TournamentMode,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Points for 1st..4th place.
pub const PLACEMENT_POINTS: [i64; 4] = [3, 2, 1, 1];

/// A ranked side: the champion's whole side for 1st, a single eliminated entrant
/// (as a solo side) for 2nd to 4th.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Placement {
    pub place: u8,
    pub side: Side,
    pub points: i64,
}

/// Points credited to one real entrant.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Award {
    pub entrant: EntrantId,
    pub name: String,
    pub place: u8,
    pub points: i64,
}

/// Everything the completion announcement needs.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Standings {
    pub tournament: TournamentId,
    pub community: CommunityId,
    pub mode: TournamentMode,
    pub metadata: TournamentMetadata,
    pub champion: Side,
    /// Ranked sides with byes removed; place numbers are kept as computed.
    pub placements: Vec<Placement>,
    /// One entry per real entrant credited.
    pub awards: Vec<Award>,
    pub completed_at: DateTime<Utc>,
}

/// "1st", "2nd", "3rd", "4th"
pub fn ordinal(place: u8) -> String {
    let suffix = match place {
        1 => "st",
        2 => "nd",
        3 => "rd",
        _ => "th",
    };
    format!("{place}{suffix}")
}

/// Rank the champion and the last three entrants knocked out.
///
/// 2nd, 3rd and 4th are read entry by entry from the tail of the elimination
/// order in reverse, so in 2v2 the final's losing pair takes 2nd and 3rd.
pub fn compute_standings(tournament: &Tournament) -> Result<Standings, TournamentError> {
    if tournament.phase != Phase::Completed {
        return Err(TournamentError::WrongPhase);
    }
    let settings = tournament.settings.as_ref().ok_or(TournamentError::WrongPhase)?;
    let champion = tournament
        .results
        .first()
        .cloned()
        .ok_or(TournamentError::WrongPhase)?;

    let runners_up = tournament.eliminated.iter().rev().cloned().map(Side::Solo);
    let placements: Vec<Placement> = std::iter::once(champion.clone())
        .chain(runners_up)
        .zip(PLACEMENT_POINTS)
        .zip(1u8..)
        .filter(|((side, _), _)| !side.is_synthetic())
        .map(|((side, points), place)| Placement {
            place,
            side,
            points,
        })
        .collect();

    let awards = placements
        .iter()
        .flat_map(|p| {
            p.side.members().iter().filter_map(move |e| {
                e.member().map(|m| Award {
                    entrant: m.id,
                    name: m.name.clone(),
                    place: p.place,
                    points: p.points,
                })
            })
        })
        .collect();

    Ok(Standings {
        tournament: tournament.id,
        community: tournament.community,
        mode: settings.mode,
        metadata: settings.metadata.clone(),
        champion,
        placements,
        awards,
        completed_at: tournament.completed_at.unwrap_or_else(Utc::now),
    })
}
