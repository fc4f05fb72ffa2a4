//! Mirage Sim -- predictive simulation engines over the component store.
//!
//! This crate recomputes authoritative tick-based game state locally
//! (resource production, stamina, army movement, combat) so a client can
//! render live values between blocks, and applies user actions optimistically
//! as removable overrides while the chain call is in flight.
//!
//! All engine computations are pure synchronous functions over a
//! [`ComponentStore`](mirage_store::store::ComponentStore) snapshot; the only
//! asynchronous edges are the [`SystemCall`](action::SystemCall)s handed back
//! to the caller.
//!
//! # Quick Start
//!
//! ```
//! use mirage_sim::prelude::*;
//!
//! let config = SimConfig::default();
//! let mut store = ComponentStore::new();
//! let realm = EntityId::from_key(1);
//! let key = ComponentStore::resource_key(realm, ResourceKind::Wheat);
//!
//! store.resources.upsert(key, Resource {
//!     entity_id: realm,
//!     resource: ResourceKind::Wheat,
//!     balance: Fixed::from_units(10),
//! });
//! store.productions.upsert(key, Production {
//!     entity_id: realm,
//!     resource: ResourceKind::Wheat,
//!     production_rate: Fixed::from_units(5),
//!     consumption_rate: Fixed::ZERO,
//!     building_count: 1,
//!     last_updated_tick: 0,
//!     input_finish_tick: 0,
//! });
//!
//! let engine = ResourceEngine::new(&config);
//! let balance = engine.balance(&store, realm, ResourceKind::Wheat, 4)?;
//! assert_eq!(balance, Fixed::from_units(30));
//! # Ok::<(), mirage_sim::SimError>(())
//! ```

#![deny(unsafe_code)]

pub mod action;
pub mod battle;
pub mod config;
pub mod hex;
pub mod movement;
pub mod production;
pub mod stamina;
pub mod tick;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

/// Re-export the store crate for convenience.
pub use mirage_store;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by engine queries and action functions.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// A required record was missing from the store.
    #[error(transparent)]
    Store(#[from] mirage_store::StoreError),

    /// The caller tried to act through an entity it does not control. Raised
    /// before any override is registered.
    #[error("caller does not control entity {0}")]
    NotOwner(mirage_store::entity::EntityId),

    /// Authoritative health data violates `current <= lifetime`; this layer
    /// cannot repair chain data, so the query fails instead of guessing.
    #[error("health {current} exceeds lifetime {lifetime} in authoritative record")]
    HealthExceedsLifetime { current: u128, lifetime: u128 },

    /// A movement path without a destination.
    #[error("path must contain an origin and at least one destination hex")]
    EmptyPath,

    /// Consecutive path hexes do not share an edge.
    #[error("path hexes are not adjacent")]
    NotAdjacent,

    /// The raid predicate rejected a pillage dispatch.
    #[error("structure cannot be raided: {0:?}")]
    NotRaidable(battle::RaidStatus),
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    // Everything from the store's prelude.
    pub use mirage_store::prelude::*;

    pub use crate::action::{owns, PendingAction, SystemCall};
    pub use crate::battle::{
        ArmyView, AttackStatus, BattleEngine, BattlePhase, BattleType, ClaimStatus, LeaveStatus,
        RaidStatus, StructureView,
    };
    pub use crate::config::SimConfig;
    pub use crate::hex::{Direction, ExploredMap, HexPos};
    pub use crate::movement::{MovementEngine, TravelPath, TravelPaths};
    pub use crate::production::ResourceEngine;
    pub use crate::stamina::StaminaEngine;
    pub use crate::tick::TickClock;
    pub use crate::SimError;
}
