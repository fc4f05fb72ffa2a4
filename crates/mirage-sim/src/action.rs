//! Optimistic action coordination.
//!
//! Action functions (move, pillage) validate preconditions, patch the store
//! under one fresh override id, and hand back a [`PendingAction`] naming the
//! external system call to execute. The engines never await that call; the
//! caller invokes [`PendingAction::resolve_success`] or
//! [`PendingAction::resolve_failure`] when its outcome arrives.
//!
//! Visual overrides (tile, position) survive success so the map never
//! flickers back to stale state before ingestion catches up; non-visual
//! overrides (stamina, resources, weight) are cleared on both outcomes
//! because the authoritative result supersedes them either way.

use serde::{Deserialize, Serialize};
use tracing::debug;

use mirage_store::prelude::{ComponentKind, ComponentStore, EntityId, OverrideId, PlayerAddress};

use crate::hex::Direction;

// ---------------------------------------------------------------------------
// Ownership
// ---------------------------------------------------------------------------

/// Whether `address` controls `entity`, directly or through the entity's
/// owning entity (an army controlled via its realm). Every action function
/// checks this before registering overrides.
pub fn owns(store: &ComponentStore, entity: EntityId, address: PlayerAddress) -> bool {
    if let Some(owner) = store.owners.get(entity) {
        if owner.address == address {
            return true;
        }
    }
    if let Some(chain) = store.entity_owners.get(entity) {
        if let Some(owner) = store.owners.get(chain.owner_entity_id) {
            return owner.address == address;
        }
    }
    false
}

// ---------------------------------------------------------------------------
// SystemCall
// ---------------------------------------------------------------------------

/// An opaque chain operation the external layer must execute. Fire-and-forget
/// from the engines' perspective.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SystemCall {
    Explore {
        army_id: EntityId,
        direction: Direction,
    },
    TravelHex {
        army_id: EntityId,
        directions: Vec<Direction>,
    },
    BattlePillage {
        army_id: EntityId,
        structure_id: EntityId,
    },
    BattleLeaveAndPillage {
        army_id: EntityId,
        battle_id: EntityId,
        structure_id: EntityId,
    },
}

// ---------------------------------------------------------------------------
// PendingAction
// ---------------------------------------------------------------------------

/// One dispatched user action: its override id, the call to execute, and
/// which component kinds it patched.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PendingAction {
    pub override_id: OverrideId,
    pub call: SystemCall,
    /// Patches that persist through success (map state the user already saw).
    visual: Vec<ComponentKind>,
    /// Patches cleared on every outcome.
    non_visual: Vec<ComponentKind>,
}

impl PendingAction {
    pub fn new(
        override_id: OverrideId,
        call: SystemCall,
        visual: Vec<ComponentKind>,
        non_visual: Vec<ComponentKind>,
    ) -> Self {
        Self {
            override_id,
            call,
            visual,
            non_visual,
        }
    }

    pub fn visual_components(&self) -> &[ComponentKind] {
        &self.visual
    }

    pub fn non_visual_components(&self) -> &[ComponentKind] {
        &self.non_visual
    }

    /// The system call succeeded: clear non-visual patches, keep visual ones
    /// until authoritative state supersedes them. Idempotent.
    pub fn resolve_success(&self, store: &mut ComponentStore) {
        debug!(id = ?self.override_id, call = ?self.call, "action succeeded");
        for &kind in &self.non_visual {
            store.remove_override_for(kind, self.override_id);
        }
    }

    /// The system call failed: full rollback of every patch. Idempotent.
    pub fn resolve_failure(&self, store: &mut ComponentStore) {
        debug!(id = ?self.override_id, call = ?self.call, "action failed, rolling back");
        for &kind in self.non_visual.iter().chain(&self.visual) {
            store.remove_override_for(kind, self.override_id);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
