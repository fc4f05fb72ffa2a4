//! Keyed component tables with layered overrides.
//!
//! A [`Table`] holds the authoritative rows for one component type plus an
//! ordered list of speculative patches. Reads compose the two layers:
//! the most recently added patch for an entity wins over the base row.
//! Patches are tagged with an [`OverrideId`] so one user action can register
//! overrides across several tables and later remove them atomically.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::entity::EntityId;

// ---------------------------------------------------------------------------
// OverrideId
// ---------------------------------------------------------------------------

/// Tag shared by every override one user action registers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OverrideId(u64);

impl OverrideId {
    #[inline]
    pub fn to_raw(self) -> u64 {
        self.0
    }
}

/// Monotonic [`OverrideId`] source. One per store; never reuses an id, so
/// in-flight actions cannot collide.
#[derive(Debug, Default)]
pub struct OverrideIdAllocator {
    next: u64,
}

impl OverrideIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fresh(&mut self) -> OverrideId {
        let id = OverrideId(self.next);
        self.next += 1;
        id
    }
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Patch<T> {
    id: OverrideId,
    entity: EntityId,
    value: T,
}

/// Authoritative rows plus layered override patches for one component type.
#[derive(Debug)]
pub struct Table<T: Clone> {
    name: &'static str,
    base: HashMap<EntityId, T>,
    patches: Vec<Patch<T>>,
}

impl<T: Clone> Table<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            base: HashMap::new(),
            patches: Vec::new(),
        }
    }

    /// Component name this table stores, for diagnostics.
    pub fn name(&self) -> &'static str {
        self.name
    }

    // -- authoritative layer (ingestion boundary) ---------------------------

    /// Write an authoritative row. Ingestion-layer API.
    pub fn upsert(&mut self, entity: EntityId, value: T) {
        self.base.insert(entity, value);
    }

    /// Remove an authoritative row. Ingestion-layer API.
    pub fn remove(&mut self, entity: EntityId) -> Option<T> {
        self.base.remove(&entity)
    }

    /// The authoritative row, ignoring overrides.
    pub fn base(&self, entity: EntityId) -> Option<&T> {
        self.base.get(&entity)
    }

    // -- composed reads -----------------------------------------------------

    /// The effective value: the most recently added patch for `entity` wins,
    /// otherwise the authoritative row.
    pub fn get(&self, entity: EntityId) -> Option<T> {
        self.patches
            .iter()
            .rev()
            .find(|p| p.entity == entity)
            .map(|p| p.value.clone())
            .or_else(|| self.base.get(&entity).cloned())
    }

    // -- override layer -----------------------------------------------------

    /// Register a patch under `id`.
    ///
    /// Re-adding under the same `(id, entity)` replaces that patch in place
    /// (an action refreshing its own prediction); patches under distinct ids
    /// coexist and the newest one wins on read.
    pub fn add_override(&mut self, id: OverrideId, entity: EntityId, value: T) {
        debug!(table = self.name, ?id, ?entity, "add override");
        if let Some(existing) = self
            .patches
            .iter_mut()
            .find(|p| p.id == id && p.entity == entity)
        {
            existing.value = value;
            return;
        }
        self.patches.push(Patch { id, entity, value });
    }

    /// Remove every patch tagged `id`. Idempotent: removing an absent id is
    /// a no-op, because both outcome paths of a system call attempt cleanup.
    pub fn remove_override(&mut self, id: OverrideId) {
        let before = self.patches.len();
        self.patches.retain(|p| p.id != id);
        if self.patches.len() != before {
            debug!(table = self.name, ?id, "removed override");
        }
    }

    pub fn has_override(&self, id: OverrideId) -> bool {
        self.patches.iter().any(|p| p.id == id)
    }

    pub fn override_count(&self) -> usize {
        self.patches.len()
    }

    // -- iteration ----------------------------------------------------------

    /// Entities with an effective row (authoritative or patched).
    pub fn entities(&self) -> Vec<EntityId> {
        let mut out: Vec<EntityId> = self.base.keys().copied().collect();
        for p in &self.patches {
            if !out.contains(&p.entity) {
                out.push(p.entity);
            }
        }
        out
    }

    pub fn len(&self) -> usize {
        self.base.len()
    }

    pub fn is_empty(&self) -> bool {
        self.base.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
