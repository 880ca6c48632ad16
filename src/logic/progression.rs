//! Round progression: record match winners, advance rounds, crown the champion.

use crate::models::{EntrantId, Phase, Round, Side, Slot, Tournament, TournamentError};
use chrono::Utc;
use serde::Serialize;

/// One match that just received its winner.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct MatchResolution {
    pub round: usize,
    /// Zero-based position of the match within its round.
    pub match_index: usize,
    pub winner: Side,
    pub loser: Side,
}

/// What recording a winner did to the bracket beyond the match itself.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Advance {
    /// Other matches of the round are still open.
    Pending,
    /// The round is complete and this round was built from its winners.
    NextRound(Round),
    /// The final was decided; the tournament is Completed.
    Champion(Side),
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct WinnerRecorded {
    pub resolution: MatchResolution,
    pub advance: Advance,
}

/// Record that the side containing `identity` won its match in the current round.
///
/// A match that already has a winner is rejected with `NotInRound`, so a repeated
/// submission never adds a second elimination entry.
pub fn record_winner(
    tournament: &mut Tournament,
    identity: EntrantId,
) -> Result<WinnerRecorded, TournamentError> {
    if tournament.phase != Phase::Active {
        return Err(TournamentError::WrongPhase);
    }
    let mode = tournament
        .settings
        .as_ref()
        .map(|s| s.mode)
        .ok_or(TournamentError::WrongPhase)?;

    let round = tournament.rounds.last_mut().ok_or(TournamentError::NotInRound)?;
    let (match_index, slot) = round
        .matches
        .iter()
        .enumerate()
        .find_map(|(i, m)| m.slot_of(identity).map(|slot| (i, slot)))
        .ok_or(TournamentError::NotInRound)?;
    let round_number = round.number;
    let match_count = round.matches.len();
    let game = &mut round.matches[match_index];
    if game.is_resolved() {
        return Err(TournamentError::NotInRound);
    }

    game.winner = Some(slot);
    let loser_slot = match slot {
        Slot::One => Slot::Two,
        Slot::Two => Slot::One,
    };
    let resolution = MatchResolution {
        round: round_number,
        match_index,
        winner: game.side(slot).clone(),
        loser: game.side(loser_slot).clone(),
    };

    tournament.results.push(resolution.winner.clone());
    tournament
        .eliminated
        .extend(resolution.loser.members().iter().cloned());
    log::debug!(
        "community {}: round {} match {}: {} beat {}",
        tournament.community,
        round_number,
        match_index + 1,
        resolution.winner.display_name(),
        resolution.loser.display_name()
    );

    if tournament.results.len() < match_count {
        return Ok(WinnerRecorded {
            resolution,
            advance: Advance::Pending,
        });
    }

    if match_count == 1 {
        tournament.phase = Phase::Completed;
        tournament.completed_at = Some(Utc::now());
        log::info!(
            "community {}: tournament completed, champion {}",
            tournament.community,
            resolution.winner.display_name()
        );
        return Ok(WinnerRecorded {
            advance: Advance::Champion(resolution.winner.clone()),
            resolution,
        });
    }

    // Winners advance in the order they were recorded; no reshuffle.
    let mut sides = std::mem::take(&mut tournament.results);
    while sides.len() % 2 != 0 {
        sides.push(tournament.next_bye_side(mode));
    }
    let next = Round::from_sides(round_number + 1, sides);
    log::info!(
        "community {}: round {} complete, round {} has {} matches",
        tournament.community,
        round_number,
        next.number,
        next.matches.len()
    );
    tournament.rounds.push(next.clone());

    Ok(WinnerRecorded {
        resolution,
        advance: Advance::NextRound(next),
    })
}
