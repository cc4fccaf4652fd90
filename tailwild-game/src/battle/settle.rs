//! Novelty refunds and folding a finished battle into the player's state.
use serde::{Deserialize, Serialize};

use super::{BattleState, EndReason};
use crate::bounds::Bounds;
use crate::catalog::{Catalog, DropEntry, Grant};
use crate::constants::{
    CONTAMINATION_FRESHNESS_FACTOR, NOVELTY_HIGH_DISTINCT_MOVES, NOVELTY_HIGH_REFUND_PCT,
    NOVELTY_LOW_DISTINCT_MOVES, NOVELTY_LOW_REFUND_PCT, NOVELTY_SATIETY_BONUS,
};
use crate::loot::{merge_grant, stow_rolled};
use crate::numbers::round_f64_to_u32;
use crate::rng::RandomSource;
use crate::state::{Outcome, PlayerState, StatDelta};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleResult {
    pub creature_id: String,
    pub end_reason: EndReason,
    pub turns: u32,
    pub stamina_cost: u32,
    pub refund: u32,
    pub stamina_restored: u32,
    pub satiety_restored: u32,
    pub novelty_bonus: u32,
    /// Drops collected during the fight.
    pub battle_drops: Vec<Grant>,
    /// Drops from the creature's table; always empty after fleeing.
    pub corpse_drops: Vec<Grant>,
    pub contaminated: bool,
    pub delta: StatDelta,
    pub outcome: Outcome,
}

/// Four distinct moves or any double combo.
#[must_use]
pub fn is_high_novelty(battle: &BattleState) -> bool {
    battle.double_combos > 0 || battle.distinct_moves() >= NOVELTY_HIGH_DISTINCT_MOVES
}

/// Flat share of accrued stamina cost refunded at battle end.
#[must_use]
pub fn novelty_refund_pct(battle: &BattleState) -> u32 {
    if is_high_novelty(battle) {
        NOVELTY_HIGH_REFUND_PCT
    } else if battle.distinct_moves() >= NOVELTY_LOW_DISTINCT_MOVES {
        NOVELTY_LOW_REFUND_PCT
    } else {
        0
    }
}

/// Refunded stamina, rounded to the nearest point.
#[must_use]
pub fn novelty_refund(battle: &BattleState) -> u32 {
    round_f64_to_u32(
        f64::from(battle.stamina_cost) * f64::from(novelty_refund_pct(battle)) / 100.0,
    )
}

fn drop_applies(entry: &DropEntry, battle: &BattleState, reason: EndReason) -> bool {
    entry
        .integrity_min
        .is_none_or(|min| battle.integrity >= min)
        && entry
            .integrity_max
            .is_none_or(|max| battle.integrity <= max)
        && entry.requires_flags.iter().all(|flag| battle.has_flag(flag))
        && entry
            .end_reasons
            .as_ref()
            .is_none_or(|reasons| reasons.contains(&reason))
}

/// Settle `battle` into `state`.
///
/// Stamina is reconciled in a single clamp: the net cost is subtracted and
/// the accrued restore added before clamping, so a restore can cover a cost
/// that would otherwise overdraw stamina.
pub fn resolve_battle<R>(
    battle: BattleState,
    state: &mut PlayerState,
    catalog: &Catalog,
    reason: EndReason,
    rng: &mut R,
) -> BattleResult
where
    R: RandomSource + ?Sized,
{
    let before = state.stats;
    let refund = novelty_refund(&battle);
    let net_cost = battle.stamina_cost.saturating_sub(refund);
    state.stats.set_stamina(
        i64::from(state.stats.stamina()) - i64::from(net_cost) + i64::from(battle.restore_stamina),
    );
    state.stats.shift_hunger(-i64::from(battle.restore_satiety));

    let mut corpse: Vec<(Grant, Option<Bounds>)> = Vec::new();
    if reason != EndReason::Fled
        && let Some(creature) = catalog.creature(&battle.creature_id)
    {
        for entry in creature
            .drops
            .iter()
            .filter(|entry| drop_applies(entry, &battle, reason))
        {
            let qty = rng.roll(entry.qty);
            if qty > 0 {
                corpse.push((Grant::new(entry.id.clone(), qty), entry.freshness));
            }
        }
    }

    if battle.contaminated {
        log::debug!("contaminating stored food after {}", battle.creature_id);
        state
            .inventory
            .contaminate(CONTAMINATION_FRESHNESS_FACTOR);
    }

    for drop in &battle.drops {
        stow_rolled(state, catalog, &drop.id, drop.qty, None, rng);
    }
    let mut corpse_drops = Vec::new();
    for (grant, freshness) in corpse {
        stow_rolled(state, catalog, &grant.id, grant.qty, freshness, rng);
        merge_grant(&mut corpse_drops, &grant.id, grant.qty);
    }

    let novelty_bonus = if is_high_novelty(&battle) {
        state.stats.shift_hunger(-i64::from(NOVELTY_SATIETY_BONUS));
        NOVELTY_SATIETY_BONUS
    } else {
        0
    };

    let outcome = state.outcome();
    log::debug!(
        "battle with {} settled ({reason:?}): cost {}, refund {refund}, outcome {outcome}",
        battle.creature_id,
        battle.stamina_cost
    );
    BattleResult {
        creature_id: battle.creature_id,
        end_reason: reason,
        turns: battle.turn,
        stamina_cost: battle.stamina_cost,
        refund,
        stamina_restored: battle.restore_stamina,
        satiety_restored: battle.restore_satiety,
        novelty_bonus,
        battle_drops: battle.drops,
        corpse_drops,
        contaminated: battle.contaminated,
        delta: StatDelta::between(&before, &state.stats),
        outcome,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::{MoveLog, start_battle};
    use crate::rng::ScriptedRng;

    fn crab() -> (BattleState, Catalog) {
        let catalog = Catalog::load_from_static();
        let battle = start_battle(&catalog, "mud_crab").unwrap();
        (battle, catalog)
    }

    fn used(ids: &[&str]) -> MoveLog {
        ids.iter().map(|id| (*id).to_string()).collect()
    }

    #[test]
    fn three_distinct_moves_refund_thirty_percent() {
        let (mut battle, _) = crab();
        battle.moves_used = used(&["a", "b", "c"]);
        battle.stamina_cost = 7;
        assert_eq!(novelty_refund_pct(&battle), 30);
        assert_eq!(novelty_refund(&battle), 2);
    }

    #[test]
    fn a_double_combo_refunds_sixty_percent() {
        let (mut battle, _) = crab();
        battle.moves_used = used(&["double_hook"]);
        battle.double_combos = 1;
        battle.stamina_cost = 10;
        assert_eq!(novelty_refund(&battle), 6);

        battle.double_combos = 0;
        assert_eq!(novelty_refund_pct(&battle), 0);
        battle.moves_used = used(&["a", "b", "c", "d"]);
        assert_eq!(novelty_refund_pct(&battle), 60);
    }

    #[test]
    fn fleeing_skips_corpse_drops_but_keeps_battle_drops() {
        let (mut battle, catalog) = crab();
        battle.composure = 0;
        battle.drops = vec![Grant::new("pebble", 1)];
        battle.restore_satiety = 4;
        let mut state = PlayerState::default();
        state.stats.hunger = 20;
        let mut rng = ScriptedRng::default().with_fallback(0.999);

        let result = resolve_battle(battle, &mut state, &catalog, EndReason::Fled, &mut rng);
        assert!(result.corpse_drops.is_empty());
        assert_eq!(state.inventory.get("crab_meat"), 0);
        assert_eq!(state.inventory.get("pebble"), 1);
        assert_eq!(state.stats.hunger, 16);
    }

    #[test]
    fn corpse_drops_respect_end_reason_and_freshness_override() {
        let (battle, catalog) = crab();
        let mut state = PlayerState::default();
        let mut rng = ScriptedRng::default().with_fallback(0.999);
        let result = resolve_battle(battle, &mut state, &catalog, EndReason::Subdued, &mut rng);
        assert_eq!(
            result.corpse_drops,
            vec![Grant::new("crab_meat", 2), Grant::new("pebble", 2)]
        );
        assert_eq!(
            state.inventory.stack("crab_meat").unwrap().freshness,
            Some(vec![10, 10])
        );

        let (battle, catalog) = crab();
        let mut state = PlayerState::default();
        let result = resolve_battle(battle, &mut state, &catalog, EndReason::Yielded, &mut rng);
        assert_eq!(result.corpse_drops, vec![Grant::new("pebble", 2)]);
    }

    #[test]
    fn zero_quantity_drops_are_discarded() {
        let (battle, catalog) = crab();
        let mut state = PlayerState::default();
        let mut rng = ScriptedRng::default().with_fallback(0.0);
        let result = resolve_battle(battle, &mut state, &catalog, EndReason::Yielded, &mut rng);
        assert!(result.corpse_drops.is_empty());
        assert!(state.inventory.is_empty());
    }

    #[test]
    fn integrity_and_flag_conditions_gate_drops() {
        let catalog = Catalog::load_from_static();
        let mut rng = ScriptedRng::default().with_fallback(0.0);
        let mut eel = start_battle(&catalog, "river_eel").unwrap();
        let mut state = PlayerState::default();
        let result = resolve_battle(eel.clone(), &mut state, &catalog, EndReason::Subdued, &mut rng);
        assert!(result.corpse_drops.is_empty());

        eel.integrity = 10;
        eel.flags.insert(String::from("cornered"));
        let result = resolve_battle(eel, &mut state, &catalog, EndReason::Subdued, &mut rng);
        assert_eq!(
            result.corpse_drops,
            vec![Grant::new("eel_fillet", 1), Grant::new("flint_shard", 1)]
        );
    }

    #[test]
    fn single_clamp_lets_restores_rescue_stamina() {
        let (mut battle, catalog) = crab();
        battle.stamina_cost = 30;
        battle.restore_stamina = 25;
        let mut state = PlayerState::default();
        state.stats.fatigue = 80;

        let result = resolve_battle(battle, &mut state, &catalog, EndReason::Yielded, &mut ScriptedRng::default());
        // 20 - 30 + 25, clamped once
        assert_eq!(state.stats.stamina(), 15);
        assert_eq!(result.refund, 0);
        assert_eq!(result.outcome, Outcome::Ok);
    }

    #[test]
    fn contamination_applies_once_before_new_drops() {
        let (mut battle, catalog) = crab();
        battle.contaminated = true;
        battle.drops = vec![Grant::new("river_snail", 1)];
        let mut state = PlayerState::default();
        state.inventory.add("dried_berry", 2, Some(vec![10, 20]));
        let mut rng = ScriptedRng::default().with_fallback(0.999);

        let result = resolve_battle(battle, &mut state, &catalog, EndReason::Fled, &mut rng);
        assert!(result.contaminated);
        assert_eq!(
            state.inventory.stack("dried_berry").unwrap().freshness,
            Some(vec![7, 14])
        );
        let snail_max = catalog.food("river_snail").unwrap().freshness.unwrap().max;
        assert_eq!(
            state.inventory.stack("river_snail").unwrap().freshness,
            Some(vec![snail_max])
        );
    }

    #[test]
    fn high_novelty_grants_satiety_bonus() {
        let (mut battle, catalog) = crab();
        battle.double_combos = 1;
        let mut state = PlayerState::default();
        state.stats.hunger = 12;
        let result = resolve_battle(battle, &mut state, &catalog, EndReason::Fled, &mut ScriptedRng::default());
        assert_eq!(result.novelty_bonus, NOVELTY_SATIETY_BONUS);
        assert_eq!(state.stats.hunger, 12 - NOVELTY_SATIETY_BONUS);
    }
}
