//! The component store: one table per component type.
//!
//! An explicit service object passed by reference into every engine call.
//! There is exactly one logical reader/writer at a time (the UI event loop),
//! so no interior locking; the store is plain owned data.

use crate::components::{
    Army, Battle, BuildingCategory, BuildingQuantity, EntityOwner, Health, Owner, Position,
    Production, Realm, Resource, ResourceKind, Stamina, Structure, Tile, Weight,
};
use crate::entity::EntityId;
use crate::table::{OverrideId, OverrideIdAllocator, Table};
use crate::StoreError;

// ---------------------------------------------------------------------------
// ComponentKind
// ---------------------------------------------------------------------------

/// Names one table of the store, so actions can describe which components
/// they patched without holding references into the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ComponentKind {
    Production,
    Resource,
    Stamina,
    Army,
    Health,
    Battle,
    Tile,
    Position,
    Weight,
    Owner,
    EntityOwner,
    Realm,
    Structure,
    BuildingQuantity,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 14] = [
        ComponentKind::Production,
        ComponentKind::Resource,
        ComponentKind::Stamina,
        ComponentKind::Army,
        ComponentKind::Health,
        ComponentKind::Battle,
        ComponentKind::Tile,
        ComponentKind::Position,
        ComponentKind::Weight,
        ComponentKind::Owner,
        ComponentKind::EntityOwner,
        ComponentKind::Realm,
        ComponentKind::Structure,
        ComponentKind::BuildingQuantity,
    ];
}

// ---------------------------------------------------------------------------
// ComponentStore
// ---------------------------------------------------------------------------

/// All authoritative state plus the override layer, one [`Table`] per
/// component type.
#[derive(Debug)]
pub struct ComponentStore {
    pub productions: Table<Production>,
    pub resources: Table<Resource>,
    pub staminas: Table<Stamina>,
    pub armies: Table<Army>,
    pub healths: Table<Health>,
    pub battles: Table<Battle>,
    pub tiles: Table<Tile>,
    pub positions: Table<Position>,
    pub weights: Table<Weight>,
    pub owners: Table<Owner>,
    pub entity_owners: Table<EntityOwner>,
    pub realms: Table<Realm>,
    pub structures: Table<Structure>,
    pub building_quantities: Table<BuildingQuantity>,
    overrides: OverrideIdAllocator,
}

impl ComponentStore {
    pub fn new() -> Self {
        Self {
            productions: Table::new("production"),
            resources: Table::new("resource"),
            staminas: Table::new("stamina"),
            armies: Table::new("army"),
            healths: Table::new("health"),
            battles: Table::new("battle"),
            tiles: Table::new("tile"),
            positions: Table::new("position"),
            weights: Table::new("weight"),
            owners: Table::new("owner"),
            entity_owners: Table::new("entity_owner"),
            realms: Table::new("realm"),
            structures: Table::new("structure"),
            building_quantities: Table::new("building_quantity"),
            overrides: OverrideIdAllocator::new(),
        }
    }

    /// A fresh override id for one user action.
    pub fn next_override_id(&mut self) -> OverrideId {
        self.overrides.fresh()
    }

    // -- composite keys -----------------------------------------------------

    /// Key of the (entity, resource) row in the production/resource tables.
    pub fn resource_key(entity: EntityId, resource: ResourceKind) -> EntityId {
        EntityId::from_keys(&[entity.to_raw(), resource.id()])
    }

    /// Key of a hex in the tile table.
    pub fn tile_key(col: u32, row: u32) -> EntityId {
        EntityId::from_keys(&[col as u128, row as u128])
    }

    /// Key of the (entity, building category) row in the building table.
    pub fn building_key(entity: EntityId, category: BuildingCategory) -> EntityId {
        EntityId::from_keys(&[entity.to_raw(), category.id()])
    }

    // -- required reads -----------------------------------------------------
    //
    // Queries over entities the caller asserts are well-formed. A missing
    // record here is a programming-contract error, never a default value,
    // since proceeding would corrupt downstream math.

    pub fn army(&self, entity: EntityId) -> Result<Army, StoreError> {
        self.armies.get(entity).ok_or(StoreError::MissingComponent {
            entity,
            component: "army",
        })
    }

    pub fn stamina(&self, entity: EntityId) -> Result<Stamina, StoreError> {
        self.staminas
            .get(entity)
            .ok_or(StoreError::MissingComponent {
                entity,
                component: "stamina",
            })
    }

    pub fn health(&self, entity: EntityId) -> Result<Health, StoreError> {
        self.healths
            .get(entity)
            .ok_or(StoreError::MissingComponent {
                entity,
                component: "health",
            })
    }

    pub fn position(&self, entity: EntityId) -> Result<Position, StoreError> {
        self.positions
            .get(entity)
            .ok_or(StoreError::MissingComponent {
                entity,
                component: "position",
            })
    }

    pub fn battle(&self, entity: EntityId) -> Result<Battle, StoreError> {
        self.battles
            .get(entity)
            .ok_or(StoreError::MissingComponent {
                entity,
                component: "battle",
            })
    }

    pub fn entity_owner(&self, entity: EntityId) -> Result<EntityOwner, StoreError> {
        self.entity_owners
            .get(entity)
            .ok_or(StoreError::MissingComponent {
                entity,
                component: "entity_owner",
            })
    }

    // -- cross-table override management ------------------------------------

    /// Remove one override id from a single table.
    pub fn remove_override_for(&mut self, kind: ComponentKind, id: OverrideId) {
        match kind {
            ComponentKind::Production => self.productions.remove_override(id),
            ComponentKind::Resource => self.resources.remove_override(id),
            ComponentKind::Stamina => self.staminas.remove_override(id),
            ComponentKind::Army => self.armies.remove_override(id),
            ComponentKind::Health => self.healths.remove_override(id),
            ComponentKind::Battle => self.battles.remove_override(id),
            ComponentKind::Tile => self.tiles.remove_override(id),
            ComponentKind::Position => self.positions.remove_override(id),
            ComponentKind::Weight => self.weights.remove_override(id),
            ComponentKind::Owner => self.owners.remove_override(id),
            ComponentKind::EntityOwner => self.entity_owners.remove_override(id),
            ComponentKind::Realm => self.realms.remove_override(id),
            ComponentKind::Structure => self.structures.remove_override(id),
            ComponentKind::BuildingQuantity => self.building_quantities.remove_override(id),
        }
    }

    /// Remove one override id from every table. Full rollback.
    pub fn remove_override_everywhere(&mut self, id: OverrideId) {
        for kind in ComponentKind::ALL {
            self.remove_override_for(kind, id);
        }
    }

    /// Total patches across all tables, for diagnostics and tests.
    pub fn override_count(&self) -> usize {
        self.productions.override_count()
            + self.resources.override_count()
            + self.staminas.override_count()
            + self.armies.override_count()
            + self.healths.override_count()
            + self.battles.override_count()
            + self.tiles.override_count()
            + self.positions.override_count()
            + self.weights.override_count()
            + self.owners.override_count()
            + self.entity_owners.override_count()
            + self.realms.override_count()
            + self.structures.override_count()
            + self.building_quantities.override_count()
    }
}

impl Default for ComponentStore {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
