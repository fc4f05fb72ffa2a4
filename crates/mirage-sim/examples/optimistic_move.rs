//! Optimistic movement demo -- dispatch a travel, watch the predicted state,
//! then simulate both chain outcomes.
//!
//! Run with:
//!   cargo run --example optimistic_move -p mirage-sim
//!
//! Set `RUST_LOG=debug` to see the override lifecycle.

use mirage_sim::prelude::*;

const PLAYER: PlayerAddress = PlayerAddress(0xdead);

fn seed(store: &mut ComponentStore, realm: EntityId, army: EntityId) {
    store.owners.upsert(
        realm,
        Owner {
            entity_id: realm,
            address: PLAYER,
        },
    );
    for resource in [ResourceKind::Wheat, ResourceKind::Fish] {
        store.resources.upsert(
            ComponentStore::resource_key(realm, resource),
            Resource {
                entity_id: realm,
                resource,
                balance: Fixed::from_units(5_000),
            },
        );
    }

    store.armies.upsert(
        army,
        Army {
            entity_id: army,
            troops: Troops {
                knight: Fixed::from_units(10),
                ..Troops::default()
            },
            battle_id: 0,
            battle_side: BattleSide::None,
        },
    );
    store.staminas.upsert(
        army,
        Stamina {
            entity_id: army,
            amount: 80,
            last_refill_tick: 8,
        },
    );
    store.positions.upsert(
        army,
        Position {
            entity_id: army,
            col: 50,
            row: 50,
        },
    );
    store.entity_owners.upsert(
        army,
        EntityOwner {
            entity_id: army,
            owner_entity_id: realm,
        },
    );

    // A small explored corridor east of the army.
    for col in 50..=53 {
        store.tiles.upsert(
            ComponentStore::tile_key(col, 50),
            Tile {
                col,
                row: 50,
                explored_by_id: army,
                explored_at: 0,
                biome: Biome::Grassland,
            },
        );
    }
}

fn report(
    store: &ComponentStore,
    config: &SimConfig,
    realm: EntityId,
    army: EntityId,
    tick: u64,
) -> Result<(), SimError> {
    let resources = ResourceEngine::new(config);
    let pos = store.position(army)?;
    let stamina = store.stamina(army)?;
    let wheat = resources.balance(store, realm, ResourceKind::Wheat, tick)?;
    println!(
        "  army at ({}, {}), stamina {}, realm wheat {}, overrides {}",
        pos.col,
        pos.row,
        stamina.amount,
        wheat,
        store.override_count()
    );
    Ok(())
}

fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let config = SimConfig::default();
    let mut store = ComponentStore::new();
    let realm = EntityId::from_key(1);
    let army = EntityId::from_key(100);
    seed(&mut store, realm, army);

    let clock = TickClock::new(200, 8, 720_000);
    let engine = MovementEngine::new(
        &config,
        ResourceEngine::new(&config),
        StaminaEngine::new(&config),
    );

    println!("before dispatch:");
    report(&store, &config, realm, army, clock.current_tick)?;

    // Two steps east across explored tiles.
    let path = [HexPos::new(50, 50), HexPos::new(51, 50), HexPos::new(52, 50)];
    let action = engine.move_army(&mut store, army, &path, PLAYER, &clock)?;
    println!("dispatched {:?}", action.call);

    println!("while the call is in flight:");
    report(&store, &config, realm, army, clock.current_tick)?;

    // Pretend the chain rejected the transaction.
    action.resolve_failure(&mut store);
    println!("after the call failed (full rollback):");
    report(&store, &config, realm, army, clock.current_tick)?;

    // Dispatch again and let it succeed this time.
    let action = engine.move_army(&mut store, army, &path, PLAYER, &clock)?;
    action.resolve_success(&mut store);
    println!("after the call succeeded (position persists, costs cleared):");
    report(&store, &config, realm, army, clock.current_tick)?;

    Ok(())
}
