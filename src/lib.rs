//! Community elimination tournament bracket engine: models, logic, and a keyed store.

pub mod collaborators;
pub mod config;
pub mod logic;
pub mod models;
pub mod store;

pub use collaborators::{
    CollaboratorError, LogMessenger, MemoryLedger, Messenger, Permissions, PointsLedger, Role,
    RolePermissions,
};
pub use logic::{
    compute_standings, configure_tournament, record_winner, register, start_tournament,
    start_tournament_with_rng, unregister, Advance, Award, EntrantRegistry, MatchResolution,
    Placement, Standings, WinnerRecorded, PLACEMENT_POINTS,
};
pub use models::{
    Bye, CommunityId, Entrant, EntrantId, FillCount, GameMatch, MatchId, Member, Phase, Round,
    Side, Slot, Team, TeamId, Tournament, TournamentError, TournamentId, TournamentMetadata,
    TournamentMode, TournamentSettings, BYE_ID_BASE,
};
pub use store::{TournamentStore, WinnerOutcome};
