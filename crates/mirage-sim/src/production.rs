//! The resource/production engine.
//!
//! Balances are never stored per tick; the chain records a balance at
//! `last_updated_tick` plus production and consumption rates, and this engine
//! recomputes the effective balance at any query tick. The arithmetic has to
//! match the chain's integer math exactly or predictions drift.

use tracing::debug;

use mirage_store::prelude::{
    BuildingCategory, ComponentStore, EntityId, Fixed, OverrideId, Production, Resource,
    ResourceKind, Weight, PRECISION,
};

use crate::config::SimConfig;
use crate::SimError;

// ---------------------------------------------------------------------------
// ResourceEngine
// ---------------------------------------------------------------------------

pub struct ResourceEngine<'c> {
    config: &'c SimConfig,
}

impl<'c> ResourceEngine<'c> {
    pub fn new(config: &'c SimConfig) -> Self {
        Self { config }
    }

    /// The effective balance of `(entity, resource)` at `tick`.
    ///
    /// Projects the stored balance forward along the net rate: gains are
    /// bounded by the input-exhaustion window and storage capacity, losses
    /// drain unbounded (consumption keeps eating stock after inputs run out)
    /// and floor at zero.
    pub fn balance(
        &self,
        store: &ComponentStore,
        entity: EntityId,
        resource: ResourceKind,
        tick: u64,
    ) -> Result<Fixed, SimError> {
        let key = ComponentStore::resource_key(entity, resource);
        let stored = store
            .resources
            .get(key)
            .map(|r| r.balance)
            .unwrap_or(Fixed::ZERO);

        let Some(production) = store.productions.get(key) else {
            return Ok(stored);
        };

        let (gaining, rate) = self.net_rate_of(store, entity, &production);
        if rate.is_zero() {
            return Ok(stored);
        }

        if gaining {
            let duration = Self::production_duration(&production, tick) as i128;
            let capacity = self.storage_capacity(store, entity, resource);
            Ok((stored + rate.mul_int(duration)).min(capacity))
        } else {
            let duration = Self::depletion_duration(&production, tick) as i128;
            Ok(stored.saturating_sub_at_zero(rate.mul_int(duration)))
        }
    }

    /// Net rate as `(gaining, magnitude)`. `(false, 0)` when nothing is
    /// produced or consumed.
    pub fn net_rate(
        &self,
        store: &ComponentStore,
        entity: EntityId,
        resource: ResourceKind,
    ) -> (bool, Fixed) {
        let key = ComponentStore::resource_key(entity, resource);
        match store.productions.get(key) {
            Some(production) => self.net_rate_of(store, entity, &production),
            None => (false, Fixed::ZERO),
        }
    }

    fn net_rate_of(
        &self,
        store: &ComponentStore,
        entity: EntityId,
        production: &Production,
    ) -> (bool, Fixed) {
        let mut consumption = production.consumption_rate;
        // Wonder realms pay a fraction of normal premium-currency upkeep.
        // This is a named exception for one structure type, not a general
        // discount mechanism.
        if production.resource.is_premium()
            && store.realms.get(entity).is_some_and(|r| r.has_wonder)
        {
            consumption = consumption.scale_by_ratio(
                self.config.wonder_upkeep_numerator,
                self.config.wonder_upkeep_denominator,
            );
        }
        let diff = production.production_rate - consumption;
        if diff.is_positive() {
            (true, diff)
        } else {
            (false, -diff)
        }
    }

    /// Ticks of active production between `last_updated_tick` and `tick`,
    /// cut short at `input_finish_tick` when inputs ran out mid-window.
    /// `input_finish_tick == 0` means production never stops.
    fn production_duration(production: &Production, tick: u64) -> u64 {
        let last = production.last_updated_tick;
        if last >= tick {
            return 0;
        }
        let finish = production.input_finish_tick;
        if finish != 0 && finish <= tick {
            if last >= finish {
                return 0;
            }
            return finish - last;
        }
        tick - last
    }

    /// Ticks of depletion: consumption continues for the full window even
    /// without inputs.
    fn depletion_duration(production: &Production, tick: u64) -> u64 {
        tick.saturating_sub(production.last_updated_tick)
    }

    /// Maximum storable amount of `resource`, in fixed-point units.
    ///
    /// One storehouse-equivalent is always present; each built storehouse
    /// adds another. Weightless kinds are storable without bound.
    pub fn storage_capacity(
        &self,
        store: &ComponentStore,
        entity: EntityId,
        resource: ResourceKind,
    ) -> Fixed {
        let weight = self.config.resource_weight_grams(resource);
        if weight == 0 {
            return Fixed::from_raw(i128::MAX);
        }
        let key = ComponentStore::building_key(entity, BuildingCategory::Storehouse);
        let storehouses = store
            .building_quantities
            .get(key)
            .map(|b| b.value)
            .unwrap_or(0) as i128;
        let grams = (storehouses + 1) * self.config.storehouse_capacity_grams as i128;
        Fixed::from_raw((grams * PRECISION).div_euclid(weight as i128))
    }

    /// True when the production burns inputs but some required input's own
    /// balance is already exhausted at `tick` — output must not be credited
    /// even though `production_rate` is nonzero.
    pub fn is_consuming_inputs_without_output(
        &self,
        store: &ComponentStore,
        entity: EntityId,
        resource: ResourceKind,
        tick: u64,
    ) -> Result<bool, SimError> {
        let key = ComponentStore::resource_key(entity, resource);
        let Some(production) = store.productions.get(key) else {
            return Ok(false);
        };
        if !production.production_rate.is_positive() {
            return Ok(false);
        }
        for &input in self.config.production_input_kinds(resource) {
            if !self.balance(store, entity, input, tick)?.is_positive() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Ticks from `tick` until the balance reaches `target`, rounded up.
    /// `None` when the balance is not gaining and will never get there.
    pub fn time_until_value_reached(
        &self,
        store: &ComponentStore,
        entity: EntityId,
        resource: ResourceKind,
        tick: u64,
        target: Fixed,
    ) -> Result<Option<u64>, SimError> {
        let current = self.balance(store, entity, resource, tick)?;
        if current >= target {
            return Ok(Some(0));
        }
        let (gaining, rate) = self.net_rate(store, entity, resource);
        if !gaining || rate.is_zero() {
            return Ok(None);
        }
        let deficit = (target - current).raw();
        Ok(Some(deficit.div_euclid(rate.raw()) as u64
            + u64::from(deficit.rem_euclid(rate.raw()) != 0)))
    }

    /// The tick at which production stops for lack of inputs, `None` when it
    /// is not scheduled to stop.
    pub fn production_ends_at(
        &self,
        store: &ComponentStore,
        entity: EntityId,
        resource: ResourceKind,
    ) -> Option<u64> {
        let key = ComponentStore::resource_key(entity, resource);
        let production = store.productions.get(key)?;
        (production.input_finish_tick != 0).then_some(production.input_finish_tick)
    }

    /// Predict spending `amount` now: patches the resource balance and the
    /// entity's carried weight under `id`.
    pub fn optimistic_spend(
        &self,
        store: &mut ComponentStore,
        id: OverrideId,
        entity: EntityId,
        resource: ResourceKind,
        amount: Fixed,
        tick: u64,
    ) -> Result<(), SimError> {
        let current = self.balance(store, entity, resource, tick)?;
        let key = ComponentStore::resource_key(entity, resource);
        debug!(?entity, ?resource, %amount, "optimistic spend");
        store.resources.add_override(
            id,
            key,
            Resource {
                entity_id: entity,
                resource,
                balance: current.saturating_sub_at_zero(amount),
            },
        );

        let weight_delta = amount.mul_int(self.config.resource_weight_grams(resource) as i128);
        let carried = store
            .weights
            .get(entity)
            .map(|w| w.value)
            .unwrap_or(Fixed::ZERO);
        store.weights.add_override(
            id,
            entity,
            Weight {
                entity_id: entity,
                value: carried.saturating_sub_at_zero(weight_delta),
            },
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use mirage_store::prelude::{BuildingQuantity, Realm};

    fn realm() -> EntityId {
        EntityId::from_key(1)
    }

    fn seed(
        store: &mut ComponentStore,
        resource: ResourceKind,
        balance: i128,
        production_rate: i128,
        consumption_rate: i128,
        last_updated_tick: u64,
        input_finish_tick: u64,
    ) {
        let key = ComponentStore::resource_key(realm(), resource);
        store.resources.upsert(
            key,
            Resource {
                entity_id: realm(),
                resource,
                balance: Fixed::from_units(balance),
            },
        );
        store.productions.upsert(
            key,
            Production {
                entity_id: realm(),
                resource,
                production_rate: Fixed::from_units(production_rate),
                consumption_rate: Fixed::from_units(consumption_rate),
                building_count: 1,
                last_updated_tick,
                input_finish_tick,
            },
        );
    }

    /// Capacity of exactly 12 wheat units: one implicit storehouse of
    /// 1200 g at 100 g per unit.
    fn tight_config() -> SimConfig {
        SimConfig {
            storehouse_capacity_grams: 1_200,
            ..SimConfig::default()
        }
    }

    #[test]
    fn production_caps_at_storage_capacity() {
        let config = tight_config();
        let engine = ResourceEngine::new(&config);
        let mut store = ComponentStore::new();
        // rate 5, stored 0, 4 ticks of production would give 20 -> capped at 12.
        seed(&mut store, ResourceKind::Wheat, 0, 5, 0, 0, 0);

        let balance = engine.balance(&store, realm(), ResourceKind::Wheat, 4).unwrap();
        assert_eq!(balance, Fixed::from_units(12));
    }

    #[test]
    fn depletion_floors_at_zero() {
        let config = SimConfig::default();
        let engine = ResourceEngine::new(&config);
        let mut store = ComponentStore::new();
        seed(&mut store, ResourceKind::Wheat, 10, 0, 3, 0, 0);

        assert_eq!(
            engine.balance(&store, realm(), ResourceKind::Wheat, 2).unwrap(),
            Fixed::from_units(4)
        );
        assert_eq!(
            engine.balance(&store, realm(), ResourceKind::Wheat, 100).unwrap(),
            Fixed::ZERO
        );
    }

    #[test]
    fn zero_net_rate_is_constant() {
        let config = SimConfig::default();
        let engine = ResourceEngine::new(&config);
        let mut store = ComponentStore::new();
        seed(&mut store, ResourceKind::Wood, 7, 4, 4, 0, 0);

        for tick in [0, 1, 10, 1_000] {
            assert_eq!(
                engine.balance(&store, realm(), ResourceKind::Wood, tick).unwrap(),
                Fixed::from_units(7)
            );
        }
    }

    #[test]
    fn input_finish_tick_bounds_gains() {
        let config = SimConfig::default();
        let engine = ResourceEngine::new(&config);
        let mut store = ComponentStore::new();
        // Inputs ran out at tick 3; querying at tick 10 credits only 3 ticks.
        seed(&mut store, ResourceKind::Wood, 0, 2, 0, 0, 3);

        assert_eq!(
            engine.balance(&store, realm(), ResourceKind::Wood, 10).unwrap(),
            Fixed::from_units(6)
        );
        // Already past the finish tick at last update: no further gain.
        seed(&mut store, ResourceKind::Wood, 6, 2, 0, 5, 3);
        assert_eq!(
            engine.balance(&store, realm(), ResourceKind::Wood, 10).unwrap(),
            Fixed::from_units(6)
        );
    }

    #[test]
    fn zero_finish_tick_means_unbounded_production() {
        let config = SimConfig::default();
        let engine = ResourceEngine::new(&config);
        let mut store = ComponentStore::new();
        seed(&mut store, ResourceKind::Wheat, 0, 1, 0, 0, 0);

        let balance = engine
            .balance(&store, realm(), ResourceKind::Wheat, 50)
            .unwrap();
        assert_eq!(balance, Fixed::from_units(50));
        assert_eq!(engine.production_ends_at(&store, realm(), ResourceKind::Wheat), None);
    }

    #[test]
    fn missing_production_returns_stored_balance() {
        let config = SimConfig::default();
        let engine = ResourceEngine::new(&config);
        let mut store = ComponentStore::new();
        let key = ComponentStore::resource_key(realm(), ResourceKind::Gold);
        store.resources.upsert(
            key,
            Resource {
                entity_id: realm(),
                resource: ResourceKind::Gold,
                balance: Fixed::from_units(9),
            },
        );
        assert_eq!(
            engine.balance(&store, realm(), ResourceKind::Gold, 99).unwrap(),
            Fixed::from_units(9)
        );
        // And a fully absent pair reads as zero.
        assert_eq!(
            engine.balance(&store, realm(), ResourceKind::Stone, 99).unwrap(),
            Fixed::ZERO
        );
    }

    #[test]
    fn storehouses_extend_capacity() {
        let config = tight_config();
        let engine = ResourceEngine::new(&config);
        let mut store = ComponentStore::new();
        store.building_quantities.upsert(
            ComponentStore::building_key(realm(), BuildingCategory::Storehouse),
            BuildingQuantity {
                entity_id: realm(),
                category: BuildingCategory::Storehouse,
                value: 2,
            },
        );
        // (2 + 1) * 1200 g / 100 g = 36 units.
        assert_eq!(
            engine.storage_capacity(&store, realm(), ResourceKind::Wheat),
            Fixed::from_units(36)
        );
    }

    #[test]
    fn wonder_discounts_premium_upkeep_only() {
        let config = SimConfig::default();
        let engine = ResourceEngine::new(&config);
        let mut store = ComponentStore::new();
        store.realms.upsert(
            realm(),
            Realm {
                entity_id: realm(),
                realm_id: 1,
                has_wonder: true,
            },
        );
        seed(&mut store, ResourceKind::Lords, 0, 0, 10, 0, 0);
        seed(&mut store, ResourceKind::Wood, 0, 0, 10, 0, 0);

        // Premium upkeep runs at 10/100 of the recorded rate.
        let (gaining, rate) = engine.net_rate(&store, realm(), ResourceKind::Lords);
        assert!(!gaining);
        assert_eq!(rate, Fixed::from_units(1));

        // Other resources pay full upkeep even on a Wonder realm.
        let (_, wood_rate) = engine.net_rate(&store, realm(), ResourceKind::Wood);
        assert_eq!(wood_rate, Fixed::from_units(10));
    }

    #[test]
    fn starved_production_is_flagged() {
        let config = SimConfig::default();
        let engine = ResourceEngine::new(&config);
        let mut store = ComponentStore::new();
        // Wood produces, but the realm has no wheat or fish at all.
        seed(&mut store, ResourceKind::Wood, 0, 2, 0, 0, 0);
        assert!(engine
            .is_consuming_inputs_without_output(&store, realm(), ResourceKind::Wood, 5)
            .unwrap());

        // With food present the flag clears.
        seed(&mut store, ResourceKind::Wheat, 100, 0, 0, 0, 0);
        seed(&mut store, ResourceKind::Fish, 100, 0, 0, 0, 0);
        assert!(!engine
            .is_consuming_inputs_without_output(&store, realm(), ResourceKind::Wood, 5)
            .unwrap());

        // Food itself has no inputs and is never starved.
        assert!(!engine
            .is_consuming_inputs_without_output(&store, realm(), ResourceKind::Wheat, 5)
            .unwrap());
    }

    #[test]
    fn time_until_value_reached_rounds_up() {
        let config = SimConfig::default();
        let engine = ResourceEngine::new(&config);
        let mut store = ComponentStore::new();
        seed(&mut store, ResourceKind::Wheat, 0, 3, 0, 0, 0);

        let ticks = engine
            .time_until_value_reached(&store, realm(), ResourceKind::Wheat, 0, Fixed::from_units(10))
            .unwrap();
        assert_eq!(ticks, Some(4));

        // Already there.
        let ticks = engine
            .time_until_value_reached(&store, realm(), ResourceKind::Wheat, 10, Fixed::from_units(10))
            .unwrap();
        assert_eq!(ticks, Some(0));

        // Draining balances never reach a higher target.
        seed(&mut store, ResourceKind::Fish, 0, 0, 1, 0, 0);
        let ticks = engine
            .time_until_value_reached(&store, realm(), ResourceKind::Fish, 0, Fixed::from_units(1))
            .unwrap();
        assert_eq!(ticks, None);
    }

    #[test]
    fn optimistic_spend_patches_balance_and_weight() {
        let config = SimConfig::default();
        let engine = ResourceEngine::new(&config);
        let mut store = ComponentStore::new();
        seed(&mut store, ResourceKind::Wheat, 50, 0, 0, 0, 0);
        store.weights.upsert(
            realm(),
            Weight {
                entity_id: realm(),
                value: Fixed::from_raw(50 * 100 * PRECISION),
            },
        );

        let id = store.next_override_id();
        engine
            .optimistic_spend(&mut store, id, realm(), ResourceKind::Wheat, Fixed::from_units(20), 0)
            .unwrap();

        assert_eq!(
            engine.balance(&store, realm(), ResourceKind::Wheat, 0).unwrap(),
            Fixed::from_units(30)
        );
        // 20 units of wheat at 100 g each left the stockpile.
        assert_eq!(
            store.weights.get(realm()).unwrap().value,
            Fixed::from_raw(30 * 100 * PRECISION)
        );

        store.remove_override_everywhere(id);
        assert_eq!(
            engine.balance(&store, realm(), ResourceKind::Wheat, 0).unwrap(),
            Fixed::from_units(50)
        );
    }
}
