//! Data structures for the bracket: entrants, teams, matches, tournament state.

mod entrant;
mod game;
mod team;
mod tournament;

pub use entrant::{AccountId, Bye, CommunityId, Entrant, EntrantId, Member, BYE_ID_BASE};
pub use game::{GameMatch, MatchId, Round, Side, Slot};
pub use team::{Team, TeamId};
pub use tournament::{
    FillCount, Phase, Tournament, TournamentError, TournamentId, TournamentMetadata,
    TournamentMode, TournamentSettings,
};
