//! Simulation tunables.
//!
//! [`SimConfig`] mirrors the balance values the chain's config records carry.
//! The ingestion layer materializes those records into one `SimConfig` at
//! startup; engines only ever read it. `Default` carries the live balance
//! values so tests and demos run against realistic numbers.

use serde::{Deserialize, Serialize};

use mirage_store::prelude::{Fixed, ResourceKind, TroopKind};

// ---------------------------------------------------------------------------
// SimConfig
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimConfig {
    /// Seconds per economy tick.
    pub tick_interval_secs: u64,
    /// Seconds per armies tick (stamina refill cadence).
    pub armies_tick_interval_secs: u64,

    // -- stamina ------------------------------------------------------------
    pub knight_max_stamina: u64,
    pub paladin_max_stamina: u64,
    pub crossbowman_max_stamina: u64,
    pub explore_stamina_cost: u64,
    /// Stamina per hex of travel.
    pub travel_stamina_cost: u64,
    pub pillage_stamina_cost: u64,

    // -- movement food burn, per whole troop unit ---------------------------
    pub travel_wheat_burn: Fixed,
    pub travel_fish_burn: Fixed,
    pub explore_wheat_burn: Fixed,
    pub explore_fish_burn: Fixed,

    // -- exploration reward -------------------------------------------------
    /// Resource units granted per revealed hex.
    pub explore_reward_amount: Fixed,
    /// Grams per unit of the reward (every findable resource weighs the
    /// same for capacity purposes).
    pub explore_reward_weight_grams: u64,

    // -- carry / storage capacity -------------------------------------------
    /// Grams each storehouse adds to a realm's per-resource storage.
    pub storehouse_capacity_grams: u128,
    /// Grams one whole troop unit can carry.
    pub army_capacity_per_troop_grams: u128,

    // -- battle -------------------------------------------------------------
    /// Health points per whole troop unit.
    pub troop_health: u128,
    /// Siege (grace) length in armies ticks for newly started battles.
    pub battle_grace_tick_count: u64,
    /// Minimum total troops an army needs to raid.
    pub min_troops_for_raid: Fixed,

    // -- the Wonder upkeep exception ----------------------------------------
    /// Wonder realms pay `num/den` of normal premium-currency upkeep.
    pub wonder_upkeep_numerator: i128,
    pub wonder_upkeep_denominator: i128,
}

impl SimConfig {
    /// Full stamina for one troop type.
    pub fn max_stamina(&self, kind: TroopKind) -> u64 {
        match kind {
            TroopKind::Knight => self.knight_max_stamina,
            TroopKind::Paladin => self.paladin_max_stamina,
            TroopKind::Crossbowman => self.crossbowman_max_stamina,
        }
    }

    /// Grams per whole unit of a resource. Weightless kinds (the premium
    /// currency, transport animals) return 0 and are storable without bound.
    pub fn resource_weight_grams(&self, resource: ResourceKind) -> u64 {
        match resource {
            ResourceKind::Wheat | ResourceKind::Fish => 100,
            ResourceKind::Lords | ResourceKind::Donkey => 0,
            _ => 1_000,
        }
    }

    /// Resource kinds a production consumes as inputs. Production is starved
    /// when any of these has a non-positive balance.
    pub fn production_input_kinds(&self, resource: ResourceKind) -> &'static [ResourceKind] {
        match resource {
            ResourceKind::Wheat | ResourceKind::Fish => &[],
            ResourceKind::Donkey => &[ResourceKind::Wheat],
            ResourceKind::Lords => &[
                ResourceKind::Wheat,
                ResourceKind::Fish,
                ResourceKind::Gold,
            ],
            _ => &[ResourceKind::Wheat, ResourceKind::Fish],
        }
    }

    /// Siege length in seconds for a freshly started battle.
    pub fn siege_duration_secs(&self) -> u64 {
        self.battle_grace_tick_count * self.armies_tick_interval_secs
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: 60,
            armies_tick_interval_secs: 3_600,

            knight_max_stamina: 80,
            paladin_max_stamina: 100,
            crossbowman_max_stamina: 80,
            explore_stamina_cost: 30,
            travel_stamina_cost: 20,
            pillage_stamina_cost: 20,

            travel_wheat_burn: Fixed::from_raw(100),
            travel_fish_burn: Fixed::from_raw(50),
            explore_wheat_burn: Fixed::from_raw(300),
            explore_fish_burn: Fixed::from_raw(150),

            explore_reward_amount: Fixed::from_units(20),
            explore_reward_weight_grams: 1_000,

            storehouse_capacity_grams: 10_000_000,
            army_capacity_per_troop_grams: 10_000,

            troop_health: 1,
            battle_grace_tick_count: 1,
            min_troops_for_raid: Fixed::from_units(100),

            wonder_upkeep_numerator: 10,
            wonder_upkeep_denominator: 100,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
