//! Tournament, its phase and configuration.

use crate::models::entrant::{Bye, CommunityId, Entrant, EntrantId};
use crate::models::game::{Round, Side};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during tournament operations.
///
/// A failed operation never mutates the tournament or the registry.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum TournamentError {
    #[error("Invalid tournament configuration: {0}")]
    InvalidConfig(String),
    #[error("Tournament is not in a state that allows this action")]
    WrongPhase,
    #[error("Already registered")]
    AlreadyRegistered,
    #[error("Not registered")]
    NotRegistered,
    #[error("Already in a team")]
    AlreadyTeamed,
    #[error("Not in a team")]
    NotTeamed,
    #[error("Cannot form a team with yourself")]
    SelfTeam,
    #[error("This id is reserved for generated bots")]
    ReservedId,
    #[error("Tournament is full")]
    Full,
    #[error("Tournament is not ready to start")]
    NotReady,
    #[error("This player/team is not in an open match of the current round")]
    NotInRound,
    #[error("You don't have permission to do this")]
    Forbidden,
}

/// Unique identifier for a tournament instance.
pub type TournamentId = Uuid;

/// Individual ("1v1") or paired ("2v2") play.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum TournamentMode {
    #[default]
    #[serde(rename = "1v1")]
    OneVOne,
    #[serde(rename = "2v2")]
    TwoVTwo,
}

impl TournamentMode {
    /// Allowed capacities: entrants for 1v1, teams for 2v2.
    pub fn allowed_capacities(self) -> &'static [usize] {
        match self {
            TournamentMode::OneVOne => &[2, 4, 8, 16, 32],
            TournamentMode::TwoVTwo => &[2, 4, 8, 16],
        }
    }

    /// Entrants standing on one side of a match.
    pub fn side_size(self) -> usize {
        match self {
            TournamentMode::OneVOne => 1,
            TournamentMode::TwoVTwo => 2,
        }
    }
}

impl fmt::Display for TournamentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TournamentMode::OneVOne => f.write_str("1v1"),
            TournamentMode::TwoVTwo => f.write_str("2v2"),
        }
    }
}

impl std::str::FromStr for TournamentMode {
    type Err = TournamentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1v1" => Ok(TournamentMode::OneVOne),
            "2v2" => Ok(TournamentMode::TwoVTwo),
            other => Err(TournamentError::InvalidConfig(format!(
                "mode must be '1v1' or '2v2', got '{other}'"
            ))),
        }
    }
}

/// Descriptive details shown alongside the bracket.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct TournamentMetadata {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub map: String,
    #[serde(default)]
    pub abilities: String,
    #[serde(default)]
    pub prize: String,
    /// Where round and result messages should be posted.
    #[serde(default)]
    pub channel: Option<String>,
}

/// Validated mode + capacity + metadata.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TournamentSettings {
    pub mode: TournamentMode,
    pub capacity: usize,
    pub metadata: TournamentMetadata,
}

impl TournamentSettings {
    pub fn new(
        mode: TournamentMode,
        capacity: usize,
        metadata: TournamentMetadata,
    ) -> Result<Self, TournamentError> {
        if !mode.allowed_capacities().contains(&capacity) {
            let unit = match mode {
                TournamentMode::OneVOne => "players",
                TournamentMode::TwoVTwo => "teams",
            };
            return Err(TournamentError::InvalidConfig(format!(
                "for {mode} mode, max {unit} must be one of {:?}",
                mode.allowed_capacities()
            )));
        }
        Ok(Self {
            mode,
            capacity,
            metadata,
        })
    }
}

/// Lifecycle phase. Only ever moves forward.
#[derive(Clone, Copy, Debug, Default, Eq, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Unconfigured,
    Registering,
    Active,
    Completed,
}

/// Registered count against capacity (teams in 2v2).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct FillCount {
    pub registered: usize,
    pub capacity: usize,
}

impl fmt::Display for FillCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.registered, self.capacity)
    }
}

/// One community's tournament: entrants, rounds, results and phase.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Tournament {
    pub(crate) id: TournamentId,
    pub(crate) community: CommunityId,
    pub(crate) settings: Option<TournamentSettings>,
    /// Registration order; frozen once Active.
    pub(crate) entrants: Vec<Entrant>,
    pub(crate) phase: Phase,
    pub(crate) rounds: Vec<Round>,
    /// Winners of the current round, in the order they were recorded.
    pub(crate) results: Vec<Side>,
    /// Every losing entrant in the order it was knocked out, a losing pair
    /// contributing both members in match order. Append-only.
    pub(crate) eliminated: Vec<Entrant>,
    pub(crate) bye_counter: u64,
    pub(crate) completed_at: Option<DateTime<Utc>>,
}

impl Tournament {
    /// Create an empty, unconfigured tournament for a community.
    pub fn new(community: CommunityId) -> Self {
        Self {
            id: Uuid::new_v4(),
            community,
            settings: None,
            entrants: Vec::new(),
            phase: Phase::Unconfigured,
            rounds: Vec::new(),
            results: Vec::new(),
            eliminated: Vec::new(),
            bye_counter: 0,
            completed_at: None,
        }
    }

    pub fn id(&self) -> TournamentId {
        self.id
    }

    pub fn community(&self) -> CommunityId {
        self.community
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn settings(&self) -> Option<&TournamentSettings> {
        self.settings.as_ref()
    }

    pub fn mode(&self) -> Option<TournamentMode> {
        self.settings.as_ref().map(|s| s.mode)
    }

    pub fn entrants(&self) -> &[Entrant] {
        &self.entrants
    }

    pub fn rounds(&self) -> &[Round] {
        &self.rounds
    }

    pub fn current_round(&self) -> Option<&Round> {
        self.rounds.last()
    }

    pub fn results(&self) -> &[Side] {
        &self.results
    }

    pub fn eliminated(&self) -> &[Entrant] {
        &self.eliminated
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn is_registered(&self, id: EntrantId) -> bool {
        self.entrants.iter().any(|e| e.id() == id)
    }

    /// Registered count against capacity; `None` until configured.
    pub fn fill_count(&self) -> Option<FillCount> {
        self.settings.as_ref().map(|s| FillCount {
            registered: self.entrants.len() / s.mode.side_size(),
            capacity: s.capacity,
        })
    }

    /// Next synthetic entrant. The counter is never reset for this instance.
    pub(crate) fn next_bye(&mut self) -> Entrant {
        self.bye_counter += 1;
        Entrant::Synthetic(Bye {
            ordinal: self.bye_counter,
        })
    }

    /// A synthetic side shaped for the current mode.
    pub(crate) fn next_bye_side(&mut self, mode: TournamentMode) -> Side {
        match mode {
            TournamentMode::OneVOne => Side::Solo(self.next_bye()),
            TournamentMode::TwoVTwo => Side::Pair([self.next_bye(), self.next_bye()]),
        }
    }
}
