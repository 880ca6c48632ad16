//! Boundary contracts with the outside world: messaging, points ledger, permissions.
//!
//! Messaging and ledger calls are made after a state change is committed. Their
//! failures are logged by the caller and never undo the change.

use crate::logic::{ordinal, Placement, Standings};
use crate::models::{CommunityId, EntrantId, Round, TournamentMetadata};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError, RwLock};
use thiserror::Error;

/// A collaborator could not be reached or refused the call.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum CollaboratorError {
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),
    #[error("collaborator rejected the call: {0}")]
    Rejected(String),
}

/// Renders bracket state for participants.
pub trait Messenger: Send + Sync {
    fn publish_round(
        &self,
        community: CommunityId,
        round: &Round,
        metadata: &TournamentMetadata,
    ) -> Result<(), CollaboratorError>;

    fn update_match(
        &self,
        community: CommunityId,
        round: usize,
        match_index: usize,
        winner_display: &str,
    ) -> Result<(), CollaboratorError>;

    fn publish_placements(&self, standings: &Standings) -> Result<(), CollaboratorError>;
}

/// Seasonal points ledger. Idempotency is the ledger's concern.
pub trait PointsLedger: Send + Sync {
    fn award_points(
        &self,
        community: CommunityId,
        entrant: EntrantId,
        delta: i64,
    ) -> Result<(), CollaboratorError>;
}

/// Who may drive a tournament.
pub trait Permissions: Send + Sync {
    fn can_start(&self, actor: EntrantId, community: CommunityId) -> bool;
    fn can_record_winner(&self, actor: EntrantId, community: CommunityId) -> bool;
}

/// Messenger that writes bracket updates to the log.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogMessenger;

impl Messenger for LogMessenger {
    fn publish_round(
        &self,
        community: CommunityId,
        round: &Round,
        metadata: &TournamentMetadata,
    ) -> Result<(), CollaboratorError> {
        log::info!(
            "community {}: {} - Round {} (map: {}, abilities: {})",
            community,
            metadata.title,
            round.number,
            metadata.map,
            metadata.abilities
        );
        for (i, m) in round.matches.iter().enumerate() {
            log::info!(
                "  Match {}: {} vs {}",
                i + 1,
                m.side_1.display_name(),
                m.side_2.display_name()
            );
        }
        Ok(())
    }

    fn update_match(
        &self,
        community: CommunityId,
        round: usize,
        match_index: usize,
        winner_display: &str,
    ) -> Result<(), CollaboratorError> {
        log::info!(
            "community {}: round {} match {} winner: {}",
            community,
            round,
            match_index + 1,
            winner_display
        );
        Ok(())
    }

    fn publish_placements(&self, standings: &Standings) -> Result<(), CollaboratorError> {
        log::info!(
            "community {}: '{}' ({}) winners, completed {}",
            standings.community,
            standings.metadata.title,
            standings.mode,
            standings.completed_at.format("%d.%m.%Y %H:%M")
        );
        for Placement { place, side, points } in &standings.placements {
            log::info!("  {}: {} ({} SP)", ordinal(*place), side.display_name(), points);
        }
        Ok(())
    }
}

/// In-process seasonal points balances per community.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    balances: Mutex<HashMap<(CommunityId, EntrantId), i64>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance(&self, community: CommunityId, entrant: EntrantId) -> i64 {
        let balances = self.balances.lock().unwrap_or_else(PoisonError::into_inner);
        balances.get(&(community, entrant)).copied().unwrap_or(0)
    }
}

impl PointsLedger for MemoryLedger {
    fn award_points(
        &self,
        community: CommunityId,
        entrant: EntrantId,
        delta: i64,
    ) -> Result<(), CollaboratorError> {
        let mut balances = self.balances.lock().unwrap_or_else(PoisonError::into_inner);
        *balances.entry((community, entrant)).or_insert(0) += delta;
        Ok(())
    }
}

/// Tournament staff roles within a community.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Everything.
    Admin,
    /// Start tournaments and record winners.
    Lead,
    /// Record winners.
    Host,
}

/// Role-based permissions, plus admins that hold every community.
#[derive(Debug, Default)]
pub struct RolePermissions {
    global_admins: HashSet<EntrantId>,
    grants: RwLock<HashMap<(CommunityId, EntrantId), HashSet<Role>>>,
}

impl RolePermissions {
    pub fn new(global_admins: impl IntoIterator<Item = EntrantId>) -> Self {
        Self {
            global_admins: global_admins.into_iter().collect(),
            grants: RwLock::default(),
        }
    }

    pub fn grant(&self, community: CommunityId, actor: EntrantId, role: Role) {
        let mut grants = self.grants.write().unwrap_or_else(PoisonError::into_inner);
        grants.entry((community, actor)).or_default().insert(role);
    }

    pub fn revoke(&self, community: CommunityId, actor: EntrantId, role: Role) {
        let mut grants = self.grants.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(roles) = grants.get_mut(&(community, actor)) {
            roles.remove(&role);
        }
    }

    pub fn is_admin(&self, actor: EntrantId, community: CommunityId) -> bool {
        self.holds_any(actor, community, &[Role::Admin])
    }

    fn holds_any(&self, actor: EntrantId, community: CommunityId, roles: &[Role]) -> bool {
        if self.global_admins.contains(&actor) {
            return true;
        }
        let grants = self.grants.read().unwrap_or_else(PoisonError::into_inner);
        grants
            .get(&(community, actor))
            .is_some_and(|held| roles.iter().any(|r| held.contains(r)))
    }
}

impl Permissions for RolePermissions {
    fn can_start(&self, actor: EntrantId, community: CommunityId) -> bool {
        self.holds_any(actor, community, &[Role::Admin, Role::Lead])
    }

    fn can_record_winner(&self, actor: EntrantId, community: CommunityId) -> bool {
        self.holds_any(actor, community, &[Role::Admin, Role::Lead, Role::Host])
    }
}
