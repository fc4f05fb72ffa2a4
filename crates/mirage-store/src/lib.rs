//! Mirage Store -- keyed component tables with a removable override layer.
//!
//! This crate is the state primitive for the Mirage predictive simulation:
//! authoritative chain records live in typed tables addressed by hashed key
//! tuples, and speculative local mutations are layered on top as patches
//! tagged by an override id. Engines read composed values; the ingestion
//! layer alone writes authoritative rows.
//!
//! # Quick Start
//!
//! ```
//! use mirage_store::prelude::*;
//!
//! let mut store = ComponentStore::new();
//! let realm = EntityId::from_key(1);
//! let key = ComponentStore::resource_key(realm, ResourceKind::Wheat);
//!
//! // Authoritative row from the chain feed.
//! store.resources.upsert(key, Resource {
//!     entity_id: realm,
//!     resource: ResourceKind::Wheat,
//!     balance: Fixed::from_units(100),
//! });
//!
//! // A dispatched action predicts spending 30 wheat.
//! let id = store.next_override_id();
//! store.resources.add_override(id, key, Resource {
//!     entity_id: realm,
//!     resource: ResourceKind::Wheat,
//!     balance: Fixed::from_units(70),
//! });
//! assert_eq!(store.resources.get(key).unwrap().balance, Fixed::from_units(70));
//!
//! // The call failed: roll the prediction back.
//! store.remove_override_everywhere(id);
//! assert_eq!(store.resources.get(key).unwrap().balance, Fixed::from_units(100));
//! ```

#![deny(unsafe_code)]

pub mod components;
pub mod entity;
pub mod fixed;
pub mod store;
pub mod table;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by store queries.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A query required a record the store does not hold. Engines treat this
    /// as a programming-contract failure, not a default value.
    #[error("entity {entity} has no '{component}' component")]
    MissingComponent {
        entity: entity::EntityId,
        component: &'static str,
    },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::components::{
        Army, Battle, BattleSide, Biome, BuildingCategory, BuildingQuantity, EntityOwner, Health,
        Owner, PlayerAddress, Position, Production, Realm, Resource, ResourceKind, Stamina,
        Structure, StructureCategory, Tile, TroopKind, Troops, Weight,
    };
    pub use crate::entity::EntityId;
    pub use crate::fixed::{Fixed, PRECISION};
    pub use crate::store::{ComponentKind, ComponentStore};
    pub use crate::table::{OverrideId, OverrideIdAllocator, Table};
    pub use crate::StoreError;
}

// ---------------------------------------------------------------------------
// Integration tests
// ---------------------------------------------------------------------------
