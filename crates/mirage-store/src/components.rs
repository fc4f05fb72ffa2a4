//! Component record types.
//!
//! Plain serde value types mirroring the authoritative chain models. Records
//! are created and mutated only by the ingestion layer (via
//! [`Table::upsert`](crate::table::Table::upsert)); engines read them and
//! write removable overrides, never authoritative fields.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::entity::EntityId;
use crate::fixed::Fixed;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Resource kinds tracked by the economy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Wheat,
    Fish,
    Wood,
    Stone,
    Coal,
    Copper,
    Obsidian,
    Silver,
    Gold,
    ColdIron,
    Ironwood,
    Mithral,
    Dragonhide,
    Donkey,
    Lords,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 15] = [
        ResourceKind::Wheat,
        ResourceKind::Fish,
        ResourceKind::Wood,
        ResourceKind::Stone,
        ResourceKind::Coal,
        ResourceKind::Copper,
        ResourceKind::Obsidian,
        ResourceKind::Silver,
        ResourceKind::Gold,
        ResourceKind::ColdIron,
        ResourceKind::Ironwood,
        ResourceKind::Mithral,
        ResourceKind::Dragonhide,
        ResourceKind::Donkey,
        ResourceKind::Lords,
    ];

    /// Food resources feed army movement and production inputs.
    #[inline]
    pub fn is_food(self) -> bool {
        matches!(self, ResourceKind::Wheat | ResourceKind::Fish)
    }

    /// The premium currency, subject to the Wonder upkeep discount.
    #[inline]
    pub fn is_premium(self) -> bool {
        matches!(self, ResourceKind::Lords)
    }

    /// Stable numeric id, used when deriving composite entity keys.
    #[inline]
    pub fn id(self) -> u128 {
        self as u128 + 1
    }
}

/// The three army troop types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TroopKind {
    Knight,
    Paladin,
    Crossbowman,
}

/// Building categories that matter to the economy engines.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildingCategory {
    Storehouse,
    Farm,
    FishingVillage,
    Barracks,
    WorkersHut,
    Market,
}

impl BuildingCategory {
    #[inline]
    pub fn id(self) -> u128 {
        self as u128 + 1
    }
}

/// Structure categories, used by battle target classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StructureCategory {
    Realm,
    Hyperstructure,
    Bank,
    FragmentMine,
    Settlement,
}

/// Which side of a battle an army is committed to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BattleSide {
    #[default]
    None,
    Attack,
    Defence,
}

/// Terrain revealed when a hex is explored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Biome {
    /// Hex revealed optimistically; terrain not yet known.
    #[default]
    None,
    Ocean,
    Beach,
    Grassland,
    Shrubland,
    Forest,
    Desert,
    Tundra,
    Snow,
    Scorched,
}

// ---------------------------------------------------------------------------
// Addresses
// ---------------------------------------------------------------------------

/// An opaque player wallet address.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerAddress(pub u128);

impl fmt::Debug for PlayerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PlayerAddress({:#x})", self.0)
    }
}

// ---------------------------------------------------------------------------
// Economy records
// ---------------------------------------------------------------------------

/// Production state for one (entity, resource) pair.
///
/// `last_updated_tick` only moves forward and never exceeds the query tick.
/// `input_finish_tick == 0` means production is not scheduled to stop.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Production {
    pub entity_id: EntityId,
    pub resource: ResourceKind,
    pub production_rate: Fixed,
    pub consumption_rate: Fixed,
    pub building_count: u32,
    pub last_updated_tick: u64,
    pub input_finish_tick: u64,
}

/// Stored balance for one (entity, resource) pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub entity_id: EntityId,
    pub resource: ResourceKind,
    pub balance: Fixed,
}

/// Per-army stamina, refilled at armies-tick boundaries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stamina {
    pub entity_id: EntityId,
    pub amount: u64,
    pub last_refill_tick: u64,
}

/// Carried weight in fixed-point grams.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weight {
    pub entity_id: EntityId,
    pub value: Fixed,
}

/// Number of buildings of one category on an entity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingQuantity {
    pub entity_id: EntityId,
    pub category: BuildingCategory,
    pub value: u32,
}

// ---------------------------------------------------------------------------
// Military records
// ---------------------------------------------------------------------------

/// Troop counts, fixed-point units per type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Troops {
    pub knight: Fixed,
    pub paladin: Fixed,
    pub crossbowman: Fixed,
}

impl Troops {
    pub fn total(&self) -> Fixed {
        self.knight + self.paladin + self.crossbowman
    }

    pub fn is_empty(&self) -> bool {
        self.total().is_zero()
    }

    /// Per-type counts in a fixed order, for folds over the composition.
    pub fn counts(&self) -> [(TroopKind, Fixed); 3] {
        [
            (TroopKind::Knight, self.knight),
            (TroopKind::Paladin, self.paladin),
            (TroopKind::Crossbowman, self.crossbowman),
        ]
    }
}

/// An army: its troops and its battle commitment (`battle_id == 0` when not
/// in a battle).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Army {
    pub entity_id: EntityId,
    pub troops: Troops,
    pub battle_id: u128,
    pub battle_side: BattleSide,
}

impl Army {
    #[inline]
    pub fn in_battle(&self) -> bool {
        self.battle_id != 0
    }
}

/// Current/lifetime health points.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    pub current: u128,
    pub lifetime: u128,
}

impl Health {
    #[inline]
    pub fn is_alive(&self) -> bool {
        self.current > 0
    }
}

/// A battle between two aggregate armies.
///
/// `duration_left == 0` means decay has fully resolved on-chain;
/// `start_at > now` means the battle is still in its siege phase.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Battle {
    pub entity_id: EntityId,
    pub attack_army: Troops,
    pub defence_army: Troops,
    pub attack_army_lifetime: Troops,
    pub defence_army_lifetime: Troops,
    pub attack_army_health: Health,
    pub defence_army_health: Health,
    /// Damage per second dealt *to the defence side*.
    pub attack_delta: u128,
    /// Damage per second dealt *to the attack side*.
    pub defence_delta: u128,
    pub duration_left: u64,
    pub start_at: u64,
    pub last_updated: u64,
}

// ---------------------------------------------------------------------------
// World records
// ---------------------------------------------------------------------------

/// An explored hex. Set once on exploration, never reverted to unexplored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub col: u32,
    pub row: u32,
    pub explored_by_id: EntityId,
    pub explored_at: u64,
    pub biome: Biome,
}

/// An entity's hex position.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub entity_id: EntityId,
    pub col: u32,
    pub row: u32,
}

/// Direct wallet ownership of an entity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub entity_id: EntityId,
    pub address: PlayerAddress,
}

/// Ownership through another entity (an army owned by a realm).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityOwner {
    pub entity_id: EntityId,
    pub owner_entity_id: EntityId,
}

/// A realm settlement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Realm {
    pub entity_id: EntityId,
    pub realm_id: u32,
    pub has_wonder: bool,
}

/// A structure occupying a hex.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Structure {
    pub entity_id: EntityId,
    pub category: StructureCategory,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
