//! Tournament business logic: teams, registration, bracket start, rounds, placements.

mod placement;
mod progression;
mod registration;
mod registry;
mod setup;

pub use placement::{compute_standings, ordinal, Award, Placement, Standings, PLACEMENT_POINTS};
pub use progression::{record_winner, Advance, MatchResolution, WinnerRecorded};
pub use registration::{register, unregister};
pub use registry::EntrantRegistry;
pub use setup::{configure_tournament, start_tournament, start_tournament_with_rng};
