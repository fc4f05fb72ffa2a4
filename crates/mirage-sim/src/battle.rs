//! The battle engine.
//!
//! A battle record stores health, per-second damage deltas and a duration at
//! its `last_updated` timestamp; this engine replays the linear mutual decay
//! forward to any query time. Each side loses health at the *opponent's*
//! delta, simultaneously, and surviving troops scale with the health ratio.
//!
//! The phase machine: **Siege** before `start_at` (no decay yet), **Ongoing**
//! while `duration_left` has not elapsed, **Ended** after. A battle the chain
//! already resolved carries `duration_left == 0`.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use mirage_store::prelude::{
    Army, Battle, BattleSide, ComponentKind, ComponentStore, EntityId, Fixed, Health,
    PlayerAddress, StructureCategory, Troops,
};

use crate::action::{owns, PendingAction, SystemCall};
use crate::config::SimConfig;
use crate::stamina::StaminaEngine;
use crate::tick::TickClock;
use crate::SimError;

// ---------------------------------------------------------------------------
// Phases and views
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattlePhase {
    Siege,
    Ongoing,
    Ended,
}

/// Whether a battle is over open ground or a structure's defence slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattleType {
    OnHex,
    OnStructure,
}

/// What the predicates need to know about one army.
#[derive(Clone, Debug)]
pub struct ArmyView {
    pub entity_id: EntityId,
    pub troops: Troops,
    pub health: Health,
    pub battle_id: u128,
    pub battle_side: BattleSide,
}

impl ArmyView {
    pub fn from_store(store: &ComponentStore, entity: EntityId) -> Result<Self, SimError> {
        let army = store.army(entity)?;
        let health = store.health(entity)?;
        Ok(Self {
            entity_id: entity,
            troops: army.troops,
            health,
            battle_id: army.battle_id,
            battle_side: army.battle_side,
        })
    }

    pub fn is_alive(&self) -> bool {
        self.health.is_alive()
    }
}

/// What the predicates need to know about a structure target.
#[derive(Clone, Debug)]
pub struct StructureView {
    pub entity_id: EntityId,
    pub category: StructureCategory,
    pub is_mine: bool,
}

// ---------------------------------------------------------------------------
// Predicate statuses
// ---------------------------------------------------------------------------

/// Why an attack can or cannot start. First matching reason wins.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttackStatus {
    NothingToAttack,
    CantStart,
    BattleStart,
    /// The querying army defends a battle still in siege; it may force the
    /// fighting to begin early.
    ForceStart,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClaimStatus {
    NoSelectedArmy,
    BattleOngoing,
    NoStructureToClaim,
    DefenderPresent,
    StructureIsMine,
    SelectedArmyDead,
    Claimable,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RaidStatus {
    NoSelectedArmy,
    TooFewTroops,
    NoStructureToRaid,
    StructureIsMine,
    /// Committed to a battle that is not the structure's.
    ArmyInBattle,
    NoStamina,
    Raidable,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeaveStatus {
    NoBattleToLeave,
    /// Defenders cannot abandon an active siege.
    DefenderInOngoingBattle,
    Leavable,
}

// ---------------------------------------------------------------------------
// BattleEngine
// ---------------------------------------------------------------------------

pub struct BattleEngine<'c> {
    config: &'c SimConfig,
}

impl<'c> BattleEngine<'c> {
    pub fn new(config: &'c SimConfig) -> Self {
        Self { config }
    }

    // -- time ---------------------------------------------------------------

    pub fn phase(&self, battle: &Battle, now: u64) -> BattlePhase {
        if battle.start_at > now {
            return BattlePhase::Siege;
        }
        if battle.duration_left > 0
            && now.saturating_sub(battle.last_updated) < battle.duration_left
        {
            return BattlePhase::Ongoing;
        }
        BattlePhase::Ended
    }

    /// Seconds of decay to apply between `last_updated` and `now`.
    ///
    /// Clamped to `duration_left` when the battle ended purely optimistically
    /// so health never over-decays, and zero when the chain already resolved
    /// it (`duration_left == 0` means the final state is authoritative).
    pub fn elapsed(&self, battle: &Battle, now: u64) -> u64 {
        if battle.start_at > now || battle.duration_left == 0 {
            return 0;
        }
        now.saturating_sub(battle.last_updated).min(battle.duration_left)
    }

    /// Seconds of siege remaining, zero once fighting can start.
    pub fn siege_time_left(&self, battle: &Battle, now: u64) -> u64 {
        battle.start_at.saturating_sub(now)
    }

    pub fn battle_type(&self, structure: Option<&StructureView>) -> BattleType {
        match structure {
            Some(_) => BattleType::OnStructure,
            None => BattleType::OnHex,
        }
    }

    // -- decay --------------------------------------------------------------

    fn decayed(&self, health: Health, opponent_delta: u128, elapsed: u64) -> Health {
        let damage = opponent_delta.saturating_mul(elapsed as u128);
        let mut current = health.current.saturating_sub(damage);
        // No fractional-troop survivors: anything below one troop-unit's
        // health is dead.
        if current < self.config.troop_health {
            current = 0;
        }
        Health {
            current,
            lifetime: health.lifetime,
        }
    }

    /// The battle as it stands at `now`: both healths decayed by the
    /// opponent's delta, surviving troops rescaled from the lifetime
    /// compositions. Idempotent at a fixed `now`.
    pub fn updated_battle(&self, battle: &Battle, now: u64) -> Result<Battle, SimError> {
        let elapsed = self.elapsed(battle, now);
        let mut updated = battle.clone();
        if elapsed == 0 {
            return Ok(updated);
        }

        updated.attack_army_health =
            self.decayed(battle.attack_army_health, battle.defence_delta, elapsed);
        updated.defence_army_health =
            self.decayed(battle.defence_army_health, battle.attack_delta, elapsed);
        updated.attack_army =
            self.updated_troops(&updated.attack_army_health, &battle.attack_army_lifetime)?;
        updated.defence_army =
            self.updated_troops(&updated.defence_army_health, &battle.defence_army_lifetime)?;
        updated.duration_left = battle.duration_left - elapsed;
        updated.last_updated = now;
        Ok(updated)
    }

    /// Troops scaled to a health ratio, each type floored to whole units.
    ///
    /// # Errors
    ///
    /// `HealthExceedsLifetime` when `current > lifetime`: that record is
    /// chain data this layer cannot repair, so the query fails loudly rather
    /// than inventing a troop count from a broken ratio.
    pub fn updated_troops(&self, health: &Health, troops: &Troops) -> Result<Troops, SimError> {
        if health.lifetime == 0 {
            return Ok(Troops::default());
        }
        if health.current > health.lifetime {
            warn!(
                current = health.current,
                lifetime = health.lifetime,
                "health exceeds lifetime in authoritative record"
            );
            return Err(SimError::HealthExceedsLifetime {
                current: health.current,
                lifetime: health.lifetime,
            });
        }
        let scale = |count: Fixed| {
            count
                .scale_by_ratio(health.current as i128, health.lifetime as i128)
                .floor_unit()
        };
        Ok(Troops {
            knight: scale(troops.knight),
            paladin: scale(troops.paladin),
            crossbowman: scale(troops.crossbowman),
        })
    }

    /// An army's current troops and health, decayed through the battle it is
    /// committed to. Armies outside any battle come back unchanged.
    pub fn updated_army(
        &self,
        store: &ComponentStore,
        entity: EntityId,
        now: u64,
    ) -> Result<(Army, Health), SimError> {
        let army = store.army(entity)?;
        let health = store.health(entity)?;
        if !army.in_battle() || army.battle_side == BattleSide::None {
            return Ok((army, health));
        }

        let battle = store.battle(EntityId::from_key(army.battle_id))?;
        let updated = self.updated_battle(&battle, now)?;
        let side_health = match army.battle_side {
            BattleSide::Attack => updated.attack_army_health,
            BattleSide::Defence => updated.defence_army_health,
            BattleSide::None => unreachable!("checked above"),
        };

        let troops = self.updated_troops(&side_health, &army.troops)?;
        let current = troops.total().to_units().max(0) as u128 * self.config.troop_health;
        Ok((
            Army { troops, ..army },
            Health {
                current: current.min(health.lifetime),
                lifetime: health.lifetime,
            },
        ))
    }

    // -- eligibility predicates ---------------------------------------------

    /// Can `selected` start (or force-start) a fight against `defender`?
    pub fn attack_status(
        &self,
        battle: Option<&Battle>,
        selected: Option<&ArmyView>,
        defender: Option<&ArmyView>,
        now: u64,
    ) -> AttackStatus {
        let Some(defender) = defender else {
            return AttackStatus::NothingToAttack;
        };
        if let Some(battle) = battle {
            return match self.phase(battle, now) {
                BattlePhase::Ongoing => AttackStatus::CantStart,
                BattlePhase::Siege => {
                    let is_sieged_defender = selected.is_some_and(|s| {
                        s.battle_side == BattleSide::Defence
                            && EntityId::from_key(s.battle_id) == battle.entity_id
                    });
                    if is_sieged_defender {
                        AttackStatus::ForceStart
                    } else {
                        AttackStatus::CantStart
                    }
                }
                BattlePhase::Ended => {
                    if defender.is_alive() {
                        AttackStatus::BattleStart
                    } else {
                        AttackStatus::CantStart
                    }
                }
            };
        }
        if defender.is_alive() {
            AttackStatus::BattleStart
        } else {
            AttackStatus::CantStart
        }
    }

    pub fn claim_status(
        &self,
        battle: Option<&Battle>,
        selected: Option<&ArmyView>,
        structure: Option<&StructureView>,
        defender: Option<&ArmyView>,
        now: u64,
    ) -> ClaimStatus {
        let Some(selected) = selected else {
            return ClaimStatus::NoSelectedArmy;
        };
        if battle.is_some_and(|b| self.phase(b, now) == BattlePhase::Ongoing) {
            return ClaimStatus::BattleOngoing;
        }
        let Some(structure) = structure else {
            return ClaimStatus::NoStructureToClaim;
        };
        if defender.is_some_and(ArmyView::is_alive) {
            return ClaimStatus::DefenderPresent;
        }
        if structure.is_mine {
            return ClaimStatus::StructureIsMine;
        }
        if !selected.is_alive() {
            return ClaimStatus::SelectedArmyDead;
        }
        ClaimStatus::Claimable
    }

    /// `battle` is the battle currently attached to the structure, if any.
    pub fn raid_status(
        &self,
        battle: Option<&Battle>,
        selected: Option<&ArmyView>,
        structure: Option<&StructureView>,
        stamina_amount: u64,
    ) -> RaidStatus {
        let Some(selected) = selected else {
            return RaidStatus::NoSelectedArmy;
        };
        if selected.troops.total() < self.config.min_troops_for_raid {
            return RaidStatus::TooFewTroops;
        }
        let Some(structure) = structure else {
            return RaidStatus::NoStructureToRaid;
        };
        if structure.is_mine {
            return RaidStatus::StructureIsMine;
        }
        let committed_elsewhere = selected.battle_id != 0
            && battle.is_none_or(|b| EntityId::from_key(selected.battle_id) != b.entity_id);
        if committed_elsewhere {
            return RaidStatus::ArmyInBattle;
        }
        if stamina_amount == 0 {
            return RaidStatus::NoStamina;
        }
        RaidStatus::Raidable
    }

    pub fn leave_status(&self, battle: Option<&Battle>, army: &ArmyView, now: u64) -> LeaveStatus {
        let Some(battle) = battle else {
            return LeaveStatus::NoBattleToLeave;
        };
        if army.battle_side == BattleSide::Defence
            && self.phase(battle, now) == BattlePhase::Ongoing
        {
            return LeaveStatus::DefenderInOngoingBattle;
        }
        LeaveStatus::Leavable
    }

    // -- boolean conveniences -----------------------------------------------

    pub fn is_attackable(
        &self,
        battle: Option<&Battle>,
        selected: Option<&ArmyView>,
        defender: Option<&ArmyView>,
        now: u64,
    ) -> bool {
        matches!(
            self.attack_status(battle, selected, defender, now),
            AttackStatus::BattleStart | AttackStatus::ForceStart
        )
    }

    pub fn is_claimable(
        &self,
        battle: Option<&Battle>,
        selected: Option<&ArmyView>,
        structure: Option<&StructureView>,
        defender: Option<&ArmyView>,
        now: u64,
    ) -> bool {
        self.claim_status(battle, selected, structure, defender, now) == ClaimStatus::Claimable
    }

    pub fn is_raidable(
        &self,
        battle: Option<&Battle>,
        selected: Option<&ArmyView>,
        structure: Option<&StructureView>,
        stamina_amount: u64,
    ) -> bool {
        self.raid_status(battle, selected, structure, stamina_amount) == RaidStatus::Raidable
    }

    pub fn is_leavable(&self, battle: Option<&Battle>, army: &ArmyView, now: u64) -> bool {
        self.leave_status(battle, army, now) == LeaveStatus::Leavable
    }

    // -- the pillage action -------------------------------------------------

    /// Dispatch a raid on `structure`.
    ///
    /// Validates ownership and raid eligibility before touching the store.
    /// A raider already committed to a battle it can leave is dispatched as
    /// leave-and-pillage; otherwise a plain pillage. Registers the stamina
    /// spend as the action's only (non-visual) override.
    pub fn pillage_structure(
        &self,
        store: &mut ComponentStore,
        stamina: &StaminaEngine,
        army: EntityId,
        structure: EntityId,
        caller: PlayerAddress,
        clock: &TickClock,
    ) -> Result<PendingAction, SimError> {
        if !owns(store, army, caller) {
            return Err(SimError::NotOwner(army));
        }

        let view = ArmyView::from_store(store, army)?;
        let category = store
            .structures
            .get(structure)
            .map(|s| s.category)
            .unwrap_or(StructureCategory::Realm);
        let target = StructureView {
            entity_id: structure,
            category,
            is_mine: owns(store, structure, caller),
        };
        let current_stamina = stamina.stamina(store, army, clock.armies_tick)?;

        // The raider's own battle, if it is in one.
        let own_battle = if view.battle_id != 0 {
            Some(store.battle(EntityId::from_key(view.battle_id))?)
        } else {
            None
        };

        let status = self.raid_status(None, Some(&view), Some(&target), current_stamina.amount);
        let call = match status {
            RaidStatus::Raidable => SystemCall::BattlePillage {
                army_id: army,
                structure_id: structure,
            },
            RaidStatus::ArmyInBattle => {
                let battle = own_battle.as_ref().ok_or(SimError::NotRaidable(status))?;
                if self.leave_status(Some(battle), &view, clock.block_timestamp)
                    != LeaveStatus::Leavable
                {
                    return Err(SimError::NotRaidable(status));
                }
                SystemCall::BattleLeaveAndPillage {
                    army_id: army,
                    battle_id: battle.entity_id,
                    structure_id: structure,
                }
            }
            other => return Err(SimError::NotRaidable(other)),
        };

        debug!(?army, ?structure, ?call, "dispatching pillage");
        let id = store.next_override_id();
        stamina.optimistic_drain(
            store,
            id,
            army,
            self.config.pillage_stamina_cost,
            clock.armies_tick,
        )?;

        Ok(PendingAction::new(
            id,
            call,
            vec![],
            vec![ComponentKind::Stamina],
        ))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use mirage_store::prelude::{Fixed, Stamina};

    fn troops(knight: i128, paladin: i128) -> Troops {
        Troops {
            knight: Fixed::from_units(knight),
            paladin: Fixed::from_units(paladin),
            crossbowman: Fixed::ZERO,
        }
    }

    /// Both sides 10 knights + 10 paladins, 20 health, deltas 2, running
    /// from t=0 for 100 seconds.
    fn symmetric_battle() -> Battle {
        let side = troops(10, 10);
        let health = Health {
            current: 20,
            lifetime: 20,
        };
        Battle {
            entity_id: EntityId::from_key(77),
            attack_army: side,
            defence_army: side,
            attack_army_lifetime: side,
            defence_army_lifetime: side,
            attack_army_health: health,
            defence_army_health: health,
            attack_delta: 2,
            defence_delta: 2,
            duration_left: 100,
            start_at: 0,
            last_updated: 0,
        }
    }

    fn army_view(battle_id: u128, side: BattleSide, alive: bool) -> ArmyView {
        ArmyView {
            entity_id: EntityId::from_key(5),
            troops: troops(100, 100),
            health: Health {
                current: if alive { 200 } else { 0 },
                lifetime: 200,
            },
            battle_id,
            battle_side: side,
        }
    }

    fn structure_view(is_mine: bool) -> StructureView {
        StructureView {
            entity_id: EntityId::from_key(9),
            category: StructureCategory::Realm,
            is_mine,
        }
    }

    // -- decay --------------------------------------------------------------

    #[test]
    fn mutual_decay_matches_hand_computation() {
        let config = SimConfig::default();
        let engine = BattleEngine::new(&config);
        let battle = symmetric_battle();

        let updated = engine.updated_battle(&battle, 2).unwrap();
        assert_eq!(updated.attack_army_health.current, 16);
        assert_eq!(updated.defence_army_health.current, 16);
        // floor(10 * 16/20) = 8 of each type, both sides.
        assert_eq!(updated.attack_army, troops(8, 8));
        assert_eq!(updated.defence_army, troops(8, 8));
        assert_eq!(updated.duration_left, 98);
        assert_eq!(updated.last_updated, 2);
    }

    #[test]
    fn update_is_idempotent_at_fixed_time() {
        let config = SimConfig::default();
        let engine = BattleEngine::new(&config);
        let battle = symmetric_battle();

        let once = engine.updated_battle(&battle, 7).unwrap();
        let twice = engine.updated_battle(&once, 7).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn health_is_monotone_while_ongoing() {
        let config = SimConfig::default();
        let engine = BattleEngine::new(&config);
        let battle = symmetric_battle();

        let mut previous = u128::MAX;
        for now in 0..12 {
            let updated = engine.updated_battle(&battle, now).unwrap();
            assert!(updated.attack_army_health.current <= previous);
            previous = updated.attack_army_health.current;
        }
    }

    #[test]
    fn optimistic_end_clamps_elapsed() {
        let config = SimConfig::default();
        let engine = BattleEngine::new(&config);
        let mut battle = symmetric_battle();
        battle.duration_left = 5;

        // Way past the end: only 5 seconds of decay apply.
        assert_eq!(engine.elapsed(&battle, 1_000), 5);
        let updated = engine.updated_battle(&battle, 1_000).unwrap();
        assert_eq!(updated.attack_army_health.current, 10);
        assert_eq!(updated.duration_left, 0);

        // Resolved on-chain: no further decay at all.
        assert_eq!(engine.elapsed(&updated, 2_000), 0);
        assert_eq!(engine.updated_battle(&updated, 2_000).unwrap(), updated);
    }

    #[test]
    fn decay_floors_below_one_troop_unit() {
        let config = SimConfig {
            troop_health: 5,
            ..SimConfig::default()
        };
        let engine = BattleEngine::new(&config);
        let mut battle = symmetric_battle();
        battle.attack_army_health = Health {
            current: 20,
            lifetime: 20,
        };
        battle.defence_delta = 9;

        // 20 - 9*2 = 2, which is below one troop-unit's 5 health -> dead.
        let updated = engine.updated_battle(&battle, 2).unwrap();
        assert_eq!(updated.attack_army_health.current, 0);
        assert!(updated.attack_army.is_empty());
    }

    #[test]
    fn siege_applies_no_decay() {
        let config = SimConfig::default();
        let engine = BattleEngine::new(&config);
        let mut battle = symmetric_battle();
        battle.start_at = 50;

        assert_eq!(engine.phase(&battle, 10), BattlePhase::Siege);
        assert_eq!(engine.siege_time_left(&battle, 10), 40);
        assert_eq!(engine.updated_battle(&battle, 10).unwrap(), battle);
    }

    #[test]
    fn phase_boundaries_are_strict() {
        let config = SimConfig::default();
        let engine = BattleEngine::new(&config);
        let battle = symmetric_battle();

        assert_eq!(engine.phase(&battle, 99), BattlePhase::Ongoing);
        // Exactly at last_updated + duration_left the battle is over.
        assert_eq!(engine.phase(&battle, 100), BattlePhase::Ended);
    }

    // -- troop scaling ------------------------------------------------------

    #[test]
    fn full_health_keeps_troops_unchanged() {
        let config = SimConfig::default();
        let engine = BattleEngine::new(&config);
        let full = Health {
            current: 20,
            lifetime: 20,
        };
        assert_eq!(
            engine.updated_troops(&full, &troops(10, 10)).unwrap(),
            troops(10, 10)
        );
    }

    #[test]
    fn zero_lifetime_means_no_troops() {
        let config = SimConfig::default();
        let engine = BattleEngine::new(&config);
        let none = Health {
            current: 0,
            lifetime: 0,
        };
        assert_eq!(
            engine.updated_troops(&none, &troops(10, 10)).unwrap(),
            Troops::default()
        );
    }

    #[test]
    fn overflowing_health_is_a_hard_error() {
        let config = SimConfig::default();
        let engine = BattleEngine::new(&config);
        let broken = Health {
            current: 30,
            lifetime: 20,
        };
        let err = engine.updated_troops(&broken, &troops(10, 10)).unwrap_err();
        assert!(matches!(
            err,
            SimError::HealthExceedsLifetime {
                current: 30,
                lifetime: 20
            }
        ));
    }

    #[test]
    fn scaling_floors_to_whole_units() {
        let config = SimConfig::default();
        let engine = BattleEngine::new(&config);
        let health = Health {
            current: 15,
            lifetime: 20,
        };
        // 10 * 15/20 = 7.5 -> 7 whole units.
        assert_eq!(
            engine.updated_troops(&health, &troops(10, 0)).unwrap(),
            troops(7, 0)
        );
    }

    // -- updated_army -------------------------------------------------------

    #[test]
    fn committed_army_decays_with_its_side() {
        let config = SimConfig::default();
        let engine = BattleEngine::new(&config);
        let mut store = ComponentStore::new();

        let battle = symmetric_battle();
        let battle_key = EntityId::from_key(77);
        store.battles.upsert(battle_key, battle);

        let army = EntityId::from_key(5);
        store.armies.upsert(
            army,
            Army {
                entity_id: army,
                troops: troops(10, 10),
                battle_id: 77,
                battle_side: BattleSide::Attack,
            },
        );
        store.healths.upsert(
            army,
            Health {
                current: 20,
                lifetime: 20,
            },
        );

        let (updated, health) = engine.updated_army(&store, army, 2).unwrap();
        assert_eq!(updated.troops, troops(8, 8));
        assert_eq!(health.current, 16);
    }

    #[test]
    fn uncommitted_army_is_unchanged() {
        let config = SimConfig::default();
        let engine = BattleEngine::new(&config);
        let mut store = ComponentStore::new();
        let army = EntityId::from_key(5);
        store.armies.upsert(
            army,
            Army {
                entity_id: army,
                troops: troops(10, 10),
                battle_id: 0,
                battle_side: BattleSide::None,
            },
        );
        store.healths.upsert(
            army,
            Health {
                current: 20,
                lifetime: 20,
            },
        );

        let (updated, health) = engine.updated_army(&store, army, 500).unwrap();
        assert_eq!(updated.troops, troops(10, 10));
        assert_eq!(health.current, 20);
    }

    // -- predicates ---------------------------------------------------------

    #[test]
    fn attack_priority_order() {
        let config = SimConfig::default();
        let engine = BattleEngine::new(&config);
        let battle = symmetric_battle();
        let attacker = army_view(0, BattleSide::None, true);
        let defender = army_view(77, BattleSide::Defence, true);

        // No defender at all.
        assert_eq!(
            engine.attack_status(None, Some(&attacker), None, 0),
            AttackStatus::NothingToAttack
        );
        // Ongoing battle blocks new attackers.
        assert_eq!(
            engine.attack_status(Some(&battle), Some(&attacker), Some(&defender), 10),
            AttackStatus::CantStart
        );
        // No battle, live defender.
        assert_eq!(
            engine.attack_status(None, Some(&attacker), Some(&defender), 10),
            AttackStatus::BattleStart
        );
        // Dead defender.
        let dead = army_view(0, BattleSide::None, false);
        assert_eq!(
            engine.attack_status(None, Some(&attacker), Some(&dead), 10),
            AttackStatus::CantStart
        );
    }

    #[test]
    fn sieged_defender_may_force_start() {
        let config = SimConfig::default();
        let engine = BattleEngine::new(&config);
        let mut battle = symmetric_battle();
        battle.start_at = 100;
        let defender_in_siege = army_view(77, BattleSide::Defence, true);
        let bystander = army_view(0, BattleSide::None, true);
        let target = army_view(77, BattleSide::Attack, true);

        assert_eq!(
            engine.attack_status(Some(&battle), Some(&defender_in_siege), Some(&target), 10),
            AttackStatus::ForceStart
        );
        assert_eq!(
            engine.attack_status(Some(&battle), Some(&bystander), Some(&target), 10),
            AttackStatus::CantStart
        );
    }

    #[test]
    fn claim_priority_order() {
        let config = SimConfig::default();
        let engine = BattleEngine::new(&config);
        let battle = symmetric_battle();
        let selected = army_view(0, BattleSide::None, true);
        let dead_defender = army_view(0, BattleSide::None, false);
        let live_defender = army_view(0, BattleSide::None, true);

        assert_eq!(
            engine.claim_status(None, None, Some(&structure_view(false)), None, 0),
            ClaimStatus::NoSelectedArmy
        );
        assert_eq!(
            engine.claim_status(Some(&battle), Some(&selected), Some(&structure_view(false)), None, 10),
            ClaimStatus::BattleOngoing
        );
        assert_eq!(
            engine.claim_status(None, Some(&selected), None, None, 0),
            ClaimStatus::NoStructureToClaim
        );
        assert_eq!(
            engine.claim_status(None, Some(&selected), Some(&structure_view(false)), Some(&live_defender), 0),
            ClaimStatus::DefenderPresent
        );
        assert_eq!(
            engine.claim_status(None, Some(&selected), Some(&structure_view(true)), Some(&dead_defender), 0),
            ClaimStatus::StructureIsMine
        );
        let dead_selected = army_view(0, BattleSide::None, false);
        assert_eq!(
            engine.claim_status(None, Some(&dead_selected), Some(&structure_view(false)), Some(&dead_defender), 0),
            ClaimStatus::SelectedArmyDead
        );
        assert_eq!(
            engine.claim_status(None, Some(&selected), Some(&structure_view(false)), Some(&dead_defender), 0),
            ClaimStatus::Claimable
        );
    }

    #[test]
    fn raid_priority_order() {
        let config = SimConfig::default();
        let engine = BattleEngine::new(&config);
        let raider = army_view(0, BattleSide::None, true);

        assert_eq!(
            engine.raid_status(None, None, Some(&structure_view(false)), 10),
            RaidStatus::NoSelectedArmy
        );

        let mut tiny = raider.clone();
        tiny.troops = troops(1, 0);
        assert_eq!(
            engine.raid_status(None, Some(&tiny), Some(&structure_view(false)), 10),
            RaidStatus::TooFewTroops
        );
        assert_eq!(
            engine.raid_status(None, Some(&raider), None, 10),
            RaidStatus::NoStructureToRaid
        );
        assert_eq!(
            engine.raid_status(None, Some(&raider), Some(&structure_view(true)), 10),
            RaidStatus::StructureIsMine
        );

        let committed = army_view(42, BattleSide::Attack, true);
        assert_eq!(
            engine.raid_status(None, Some(&committed), Some(&structure_view(false)), 10),
            RaidStatus::ArmyInBattle
        );

        assert_eq!(
            engine.raid_status(None, Some(&raider), Some(&structure_view(false)), 0),
            RaidStatus::NoStamina
        );
        assert_eq!(
            engine.raid_status(None, Some(&raider), Some(&structure_view(false)), 10),
            RaidStatus::Raidable
        );
    }

    #[test]
    fn raiding_the_structures_own_battle_is_allowed() {
        let config = SimConfig::default();
        let engine = BattleEngine::new(&config);
        let battle = symmetric_battle(); // entity key 77
        let committed = army_view(77, BattleSide::Attack, true);

        assert_eq!(
            engine.raid_status(Some(&battle), Some(&committed), Some(&structure_view(false)), 10),
            RaidStatus::Raidable
        );
    }

    #[test]
    fn leave_rules() {
        let config = SimConfig::default();
        let engine = BattleEngine::new(&config);
        let battle = symmetric_battle();
        let defender = army_view(77, BattleSide::Defence, true);
        let attacker = army_view(77, BattleSide::Attack, true);

        assert_eq!(
            engine.leave_status(None, &defender, 10),
            LeaveStatus::NoBattleToLeave
        );
        assert_eq!(
            engine.leave_status(Some(&battle), &defender, 10),
            LeaveStatus::DefenderInOngoingBattle
        );
        assert!(engine.is_leavable(Some(&battle), &attacker, 10));
        // Once the battle ends the defender may go too.
        assert!(engine.is_leavable(Some(&battle), &defender, 100));
    }

    // -- pillage ------------------------------------------------------------

    fn seed_raider(store: &mut ComponentStore, caller: PlayerAddress) -> (EntityId, EntityId) {
        let army = EntityId::from_key(5);
        let structure = EntityId::from_key(9);
        store.armies.upsert(
            army,
            Army {
                entity_id: army,
                troops: troops(100, 100),
                battle_id: 0,
                battle_side: BattleSide::None,
            },
        );
        store.healths.upsert(
            army,
            Health {
                current: 200,
                lifetime: 200,
            },
        );
        store.staminas.upsert(
            army,
            Stamina {
                entity_id: army,
                amount: 60,
                last_refill_tick: 5,
            },
        );
        store.owners.upsert(
            army,
            mirage_store::prelude::Owner {
                entity_id: army,
                address: caller,
            },
        );
        store.structures.upsert(
            structure,
            mirage_store::prelude::Structure {
                entity_id: structure,
                category: StructureCategory::Realm,
            },
        );
        (army, structure)
    }

    #[test]
    fn pillage_drains_stamina_and_names_the_call() {
        let config = SimConfig::default();
        let engine = BattleEngine::new(&config);
        let stamina = StaminaEngine::new(&config);
        let mut store = ComponentStore::new();
        let caller = PlayerAddress(0xabc);
        let (army, structure) = seed_raider(&mut store, caller);
        let clock = TickClock::new(100, 5, 360_000);

        let action = engine
            .pillage_structure(&mut store, &stamina, army, structure, caller, &clock)
            .unwrap();
        assert_eq!(
            action.call,
            SystemCall::BattlePillage {
                army_id: army,
                structure_id: structure
            }
        );
        assert_eq!(store.staminas.get(army).unwrap().amount, 40);

        // Pillage has no visual component; success clears everything it set.
        action.resolve_success(&mut store);
        assert_eq!(store.override_count(), 0);
    }

    #[test]
    fn committed_raider_leaves_and_pillages() {
        let config = SimConfig::default();
        let engine = BattleEngine::new(&config);
        let stamina = StaminaEngine::new(&config);
        let mut store = ComponentStore::new();
        let caller = PlayerAddress(0xabc);
        let (army, structure) = seed_raider(&mut store, caller);
        let clock = TickClock::new(100, 5, 360_000);

        let battle = symmetric_battle();
        store.battles.upsert(EntityId::from_key(77), battle);
        store.armies.upsert(
            army,
            Army {
                entity_id: army,
                troops: troops(100, 100),
                battle_id: 77,
                battle_side: BattleSide::Attack,
            },
        );

        let action = engine
            .pillage_structure(&mut store, &stamina, army, structure, caller, &clock)
            .unwrap();
        assert!(matches!(
            action.call,
            SystemCall::BattleLeaveAndPillage { .. }
        ));
    }

    #[test]
    fn ineligible_raids_are_rejected_before_any_override() {
        let config = SimConfig::default();
        let engine = BattleEngine::new(&config);
        let stamina = StaminaEngine::new(&config);
        let mut store = ComponentStore::new();
        let caller = PlayerAddress(0xabc);
        let (army, structure) = seed_raider(&mut store, caller);
        let clock = TickClock::new(100, 5, 360_000);

        // Not the owner.
        let err = engine
            .pillage_structure(&mut store, &stamina, army, structure, PlayerAddress(0xdead), &clock)
            .unwrap_err();
        assert!(matches!(err, SimError::NotOwner(_)));
        assert_eq!(store.override_count(), 0);

        // Own structure.
        store.owners.upsert(
            structure,
            mirage_store::prelude::Owner {
                entity_id: structure,
                address: caller,
            },
        );
        let err = engine
            .pillage_structure(&mut store, &stamina, army, structure, caller, &clock)
            .unwrap_err();
        assert!(matches!(
            err,
            SimError::NotRaidable(RaidStatus::StructureIsMine)
        ));
        assert_eq!(store.override_count(), 0);
    }
}
