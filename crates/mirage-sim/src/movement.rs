//! The army movement engine.
//!
//! Computes every destination an army can reach this armies tick, with the
//! cheapest path to each, and dispatches moves optimistically. Travel crosses
//! known tiles at one stamina-and-food step per hex; exploration pushes into
//! an unknown neighbor, which is only ever legal as the first step out.

use std::collections::HashMap;

use tracing::debug;

use mirage_store::prelude::{
    ComponentKind, ComponentStore, EntityId, Fixed, Position, ResourceKind, Tile, Troops, Weight,
};

use crate::action::{owns, PendingAction, SystemCall};
use crate::config::SimConfig;
use crate::hex::{Direction, ExploredMap, HexPos};
use crate::production::ResourceEngine;
use crate::stamina::StaminaEngine;
use crate::tick::TickClock;
use crate::SimError;
use mirage_store::prelude::PlayerAddress;

// ---------------------------------------------------------------------------
// TravelPaths
// ---------------------------------------------------------------------------

/// The cheapest route to one destination.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TravelPath {
    /// Origin first, destination last; always at least two hexes.
    pub path: Vec<HexPos>,
    /// False when the destination is an unexplored hex (an explore move).
    pub is_explored: bool,
}

/// All reachable destinations keyed by hex.
#[derive(Clone, Debug, Default)]
pub struct TravelPaths {
    inner: HashMap<HexPos, TravelPath>,
}

impl TravelPaths {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, destination: HexPos, path: TravelPath) {
        self.inner.insert(destination, path);
    }

    pub fn get(&self, destination: HexPos) -> Option<&TravelPath> {
        self.inner.get(&destination)
    }

    pub fn contains(&self, destination: HexPos) -> bool {
        self.inner.contains_key(&destination)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&HexPos, &TravelPath)> {
        self.inner.iter()
    }

    /// Hexes to highlight in the UI.
    pub fn destinations(&self) -> Vec<HexPos> {
        self.inner.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

// ---------------------------------------------------------------------------
// MovementEngine
// ---------------------------------------------------------------------------

/// Movement queries and the optimistic move action.
///
/// Sub-engines are injected, never constructed internally, so each engine is
/// testable in isolation and ownership stays acyclic.
pub struct MovementEngine<'c> {
    config: &'c SimConfig,
    resources: ResourceEngine<'c>,
    stamina: StaminaEngine<'c>,
}

impl<'c> MovementEngine<'c> {
    pub fn new(
        config: &'c SimConfig,
        resources: ResourceEngine<'c>,
        stamina: StaminaEngine<'c>,
    ) -> Self {
        Self {
            config,
            resources,
            stamina,
        }
    }

    // -- budgets ------------------------------------------------------------

    /// Wheat and fish burned per hex of travel for this composition.
    pub fn travel_food_costs(&self, troops: &Troops) -> (Fixed, Fixed) {
        let units = troops.total().to_units();
        (
            self.config.travel_wheat_burn.mul_int(units),
            self.config.travel_fish_burn.mul_int(units),
        )
    }

    /// Wheat and fish burned by one exploration for this composition.
    pub fn explore_food_costs(&self, troops: &Troops) -> (Fixed, Fixed) {
        let units = troops.total().to_units();
        (
            self.config.explore_wheat_burn.mul_int(units),
            self.config.explore_fish_burn.mul_int(units),
        )
    }

    /// The owning realm's wheat and fish balances at `tick`.
    pub fn food(
        &self,
        store: &ComponentStore,
        army: EntityId,
        tick: u64,
    ) -> Result<(Fixed, Fixed), SimError> {
        let owner = store.entity_owner(army)?.owner_entity_id;
        let wheat = self.resources.balance(store, owner, ResourceKind::Wheat, tick)?;
        let fish = self.resources.balance(store, owner, ResourceKind::Fish, tick)?;
        Ok((wheat, fish))
    }

    /// How many travel steps the army can afford: the tightest of the
    /// stamina, wheat and fish budgets.
    pub fn max_steps(
        &self,
        store: &ComponentStore,
        army: EntityId,
        clock: &TickClock,
    ) -> Result<u64, SimError> {
        let stamina = self.stamina.stamina(store, army, clock.armies_tick)?;
        let by_stamina = stamina.amount / self.config.travel_stamina_cost;

        let troops = store.army(army)?.troops;
        let (wheat_per_step, fish_per_step) = self.travel_food_costs(&troops);
        let (wheat, fish) = self.food(store, army, clock.current_tick)?;
        let by_wheat = wheat.div_floor(wheat_per_step).max(0);
        let by_fish = fish.div_floor(fish_per_step).max(0);

        Ok(by_stamina
            .min(u64::try_from(by_wheat).unwrap_or(u64::MAX))
            .min(u64::try_from(by_fish).unwrap_or(u64::MAX)))
    }

    /// Grams of carry capacity left: per-troop capacity minus carried weight.
    pub fn remaining_capacity(
        &self,
        store: &ComponentStore,
        army: EntityId,
    ) -> Result<Fixed, SimError> {
        let troops = store.army(army)?.troops;
        let capacity = troops
            .total()
            .mul_int(self.config.army_capacity_per_troop_grams as i128);
        let carried = store
            .weights
            .get(army)
            .map(|w| w.value)
            .unwrap_or(Fixed::ZERO);
        Ok(capacity.saturating_sub_at_zero(carried))
    }

    /// Whether the army can push into an unexplored hex right now: enough
    /// stamina, both food budgets covered, and room to carry the reward.
    pub fn can_explore(
        &self,
        store: &ComponentStore,
        army: EntityId,
        clock: &TickClock,
    ) -> Result<bool, SimError> {
        let stamina = self.stamina.stamina(store, army, clock.armies_tick)?;
        if stamina.amount < self.config.explore_stamina_cost {
            return Ok(false);
        }

        let troops = store.army(army)?.troops;
        let (wheat_cost, fish_cost) = self.explore_food_costs(&troops);
        let (wheat, fish) = self.food(store, army, clock.current_tick)?;
        if wheat < wheat_cost || fish < fish_cost {
            return Ok(false);
        }

        Ok(self.remaining_capacity(store, army)? >= self.explore_reward_weight())
    }

    fn explore_reward_weight(&self) -> Fixed {
        self.config
            .explore_reward_amount
            .mul_int(self.config.explore_reward_weight_grams as i128)
    }

    // -- ownership ----------------------------------------------------------

    /// Whether `address` controls `entity`, directly or through the entity's
    /// owning entity.
    pub fn is_mine(
        &self,
        store: &ComponentStore,
        entity: EntityId,
        address: PlayerAddress,
    ) -> bool {
        owns(store, entity, address)
    }

    // -- path-finding -------------------------------------------------------

    /// Every destination reachable this armies tick with the cheapest path
    /// to each.
    ///
    /// Uniform-cost search over explored hexes: the frontier is sorted by
    /// distance before each pop, relaxation is strictly decreasing, and an
    /// unexplored hex is reachable only as the very first step (and only
    /// when [`Self::can_explore`] holds). Origin-only paths are never
    /// recorded.
    pub fn find_paths(
        &self,
        store: &ComponentStore,
        army: EntityId,
        explored: &ExploredMap,
        clock: &TickClock,
    ) -> Result<TravelPaths, SimError> {
        let position = store.position(army)?;
        let start = HexPos::new(position.col, position.row);
        let max_steps = self.max_steps(store, army, clock)?;
        let can_explore = self.can_explore(store, army, clock)?;

        let mut paths = TravelPaths::new();
        let mut shortest: HashMap<HexPos, u64> = HashMap::new();
        let mut frontier: Vec<(HexPos, u64, Vec<HexPos>)> = vec![(start, 0, vec![start])];

        while !frontier.is_empty() {
            frontier.sort_by_key(|(_, distance, _)| *distance);
            let (current, distance, path) = frontier.remove(0);

            if shortest.get(&current).is_some_and(|&best| best <= distance) {
                continue;
            }
            shortest.insert(current, distance);

            let current_explored = explored.is_explored(current);
            if path.len() >= 2 {
                paths.insert(
                    current,
                    TravelPath {
                        path: path.clone(),
                        is_explored: current_explored,
                    },
                );
            }

            // An unexplored hex terminates its branch; crossing it would
            // mean routing through unknown terrain.
            if !current_explored && current != start {
                continue;
            }
            if distance >= max_steps {
                continue;
            }

            for neighbor in current.neighbors() {
                if explored.is_explored(neighbor) {
                    if shortest.get(&neighbor).is_none_or(|&best| best > distance + 1) {
                        let mut next = path.clone();
                        next.push(neighbor);
                        frontier.push((neighbor, distance + 1, next));
                    }
                } else if distance == 0 && can_explore && !shortest.contains_key(&neighbor) {
                    let mut next = path.clone();
                    next.push(neighbor);
                    frontier.push((neighbor, 1, next));
                }
            }
        }

        Ok(paths)
    }

    // -- the move action ----------------------------------------------------

    /// Dispatch a move along `path`.
    ///
    /// Validates ownership and path shape before touching the store, so a
    /// doomed action never leaves speculative state behind. On success the
    /// store carries the full optimistic picture of the move and the caller
    /// receives the system call to execute.
    ///
    /// # Errors
    ///
    /// `NotOwner` when `caller` does not control the army; `EmptyPath` for a
    /// path without a destination; `NotAdjacent` when consecutive hexes do
    /// not share an edge; `Store` when required records are missing.
    pub fn move_army(
        &self,
        store: &mut ComponentStore,
        army: EntityId,
        path: &[HexPos],
        caller: PlayerAddress,
        clock: &TickClock,
    ) -> Result<PendingAction, SimError> {
        if !self.is_mine(store, army, caller) {
            return Err(SimError::NotOwner(army));
        }
        if path.len() < 2 {
            return Err(SimError::EmptyPath);
        }

        let destination = path[path.len() - 1];
        let exploring = store
            .tiles
            .get(ComponentStore::tile_key(destination.col, destination.row))
            .is_none();

        if exploring {
            self.dispatch_explore(store, army, path, clock)
        } else {
            self.dispatch_travel(store, army, path, clock)
        }
    }

    fn dispatch_travel(
        &self,
        store: &mut ComponentStore,
        army: EntityId,
        path: &[HexPos],
        clock: &TickClock,
    ) -> Result<PendingAction, SimError> {
        let mut directions = Vec::with_capacity(path.len() - 1);
        for pair in path.windows(2) {
            directions.push(pair[0].direction_to(pair[1]).ok_or(SimError::NotAdjacent)?);
        }
        let steps = directions.len() as u64;
        debug!(?army, steps, "dispatching travel");

        let id = store.next_override_id();
        self.stamina.optimistic_drain(
            store,
            id,
            army,
            self.config.travel_stamina_cost * steps,
            clock.armies_tick,
        )?;

        let troops = store.army(army)?.troops;
        let owner = store.entity_owner(army)?.owner_entity_id;
        let (wheat_per_step, fish_per_step) = self.travel_food_costs(&troops);
        self.resources.optimistic_spend(
            store,
            id,
            owner,
            ResourceKind::Wheat,
            wheat_per_step.mul_int(steps as i128),
            clock.current_tick,
        )?;
        self.resources.optimistic_spend(
            store,
            id,
            owner,
            ResourceKind::Fish,
            fish_per_step.mul_int(steps as i128),
            clock.current_tick,
        )?;

        let destination = path[path.len() - 1];
        store.positions.add_override(
            id,
            army,
            Position {
                entity_id: army,
                col: destination.col,
                row: destination.row,
            },
        );

        Ok(PendingAction::new(
            id,
            SystemCall::TravelHex {
                army_id: army,
                directions,
            },
            vec![ComponentKind::Position],
            vec![
                ComponentKind::Stamina,
                ComponentKind::Resource,
                ComponentKind::Weight,
            ],
        ))
    }

    fn dispatch_explore(
        &self,
        store: &mut ComponentStore,
        army: EntityId,
        path: &[HexPos],
        clock: &TickClock,
    ) -> Result<PendingAction, SimError> {
        // Exploration is a single push into an adjacent unknown hex.
        if path.len() != 2 {
            return Err(SimError::NotAdjacent);
        }
        let direction = path[0].direction_to(path[1]).ok_or(SimError::NotAdjacent)?;
        let destination = path[1];
        debug!(?army, ?destination, "dispatching explore");

        let id = store.next_override_id();
        self.stamina.optimistic_drain(
            store,
            id,
            army,
            self.config.explore_stamina_cost,
            clock.armies_tick,
        )?;

        let troops = store.army(army)?.troops;
        let owner = store.entity_owner(army)?.owner_entity_id;
        let (wheat_cost, fish_cost) = self.explore_food_costs(&troops);
        self.resources.optimistic_spend(
            store,
            id,
            owner,
            ResourceKind::Wheat,
            wheat_cost,
            clock.current_tick,
        )?;
        self.resources.optimistic_spend(
            store,
            id,
            owner,
            ResourceKind::Fish,
            fish_cost,
            clock.current_tick,
        )?;

        // The army will carry the exploration reward home.
        let carried = store
            .weights
            .get(army)
            .map(|w| w.value)
            .unwrap_or(Fixed::ZERO);
        store.weights.add_override(
            id,
            army,
            Weight {
                entity_id: army,
                value: carried + self.explore_reward_weight(),
            },
        );

        // Reveal the hex immediately; the biome arrives with the
        // authoritative tile.
        store.tiles.add_override(
            id,
            ComponentStore::tile_key(destination.col, destination.row),
            Tile {
                col: destination.col,
                row: destination.row,
                explored_by_id: army,
                explored_at: clock.block_timestamp,
                biome: Default::default(),
            },
        );
        store.positions.add_override(
            id,
            army,
            Position {
                entity_id: army,
                col: destination.col,
                row: destination.row,
            },
        );

        Ok(PendingAction::new(
            id,
            SystemCall::Explore {
                army_id: army,
                direction,
            },
            vec![ComponentKind::Tile, ComponentKind::Position],
            vec![
                ComponentKind::Stamina,
                ComponentKind::Resource,
                ComponentKind::Weight,
            ],
        ))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
