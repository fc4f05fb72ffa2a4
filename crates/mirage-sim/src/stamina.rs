//! The stamina engine.
//!
//! Stamina refills as a step function at armies-tick boundaries, never
//! continuously: the first query in a new armies tick sees a full bar, and
//! the bar's height is the *minimum* per-type maximum across the troop types
//! actually present (a mixed army moves at its slowest contingent's pace).

use tracing::debug;

use mirage_store::prelude::{ComponentStore, EntityId, OverrideId, Stamina, Troops};

use crate::config::SimConfig;
use crate::SimError;

// ---------------------------------------------------------------------------
// StaminaEngine
// ---------------------------------------------------------------------------

pub struct StaminaEngine<'c> {
    config: &'c SimConfig,
}

impl<'c> StaminaEngine<'c> {
    pub fn new(config: &'c SimConfig) -> Self {
        Self { config }
    }

    /// Full-bar stamina for a troop composition. Zero for an empty army.
    pub fn max_stamina(&self, troops: &Troops) -> u64 {
        troops
            .counts()
            .iter()
            .filter(|(_, count)| count.is_positive())
            .map(|(kind, _)| self.config.max_stamina(*kind))
            .min()
            .unwrap_or(0)
    }

    /// The army's stamina at `armies_tick`.
    ///
    /// A query in a fresh armies tick refills to the composition maximum;
    /// within the same tick the stored value is returned unchanged.
    ///
    /// # Errors
    ///
    /// `SimError::Store` when the entity lacks a Stamina or Army record —
    /// callers assert well-formed entities, and defaulting here would corrupt
    /// every downstream movement computation.
    pub fn stamina(
        &self,
        store: &ComponentStore,
        entity: EntityId,
        armies_tick: u64,
    ) -> Result<Stamina, SimError> {
        let stored = store.stamina(entity)?;
        let army = store.army(entity)?;

        if stored.last_refill_tick == armies_tick {
            return Ok(stored);
        }
        Ok(Stamina {
            entity_id: entity,
            amount: self.max_stamina(&army.troops),
            last_refill_tick: armies_tick,
        })
    }

    /// Predict spending `cost` stamina now, patching under `id`.
    pub fn optimistic_drain(
        &self,
        store: &mut ComponentStore,
        id: OverrideId,
        entity: EntityId,
        cost: u64,
        armies_tick: u64,
    ) -> Result<(), SimError> {
        let current = self.stamina(store, entity, armies_tick)?;
        debug!(?entity, cost, remaining = current.amount.saturating_sub(cost), "optimistic stamina drain");
        store.staminas.add_override(
            id,
            entity,
            Stamina {
                entity_id: entity,
                amount: current.amount.saturating_sub(cost),
                last_refill_tick: armies_tick,
            },
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
