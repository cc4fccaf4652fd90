//! Passage of time: per-period cost, passive recovery, rot and auto-eat.
//!
//! Every resolver that spends periods routes through these helpers so the
//! ordering is identical everywhere: cost first, then passive recovery, then
//! one rot tick and (optionally) one auto-eat per period.
use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, ToolAbility};
use crate::state::PlayerState;

/// Food eaten during a resolution, aggregated per identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Consumption {
    pub food_id: String,
    pub units: u32,
    pub restored: u32,
}

/// Append one eaten unit to `log`, merging with an existing entry.
pub fn record_consumption(log: &mut Vec<Consumption>, food_id: &str, restored: u32) {
    if let Some(entry) = log.iter_mut().find(|entry| entry.food_id == food_id) {
        entry.units = entry.units.saturating_add(1);
        entry.restored = entry.restored.saturating_add(restored);
    } else {
        log.push(Consumption {
            food_id: food_id.to_string(),
            units: 1,
            restored,
        });
    }
}

/// Charge hunger and fatigue for elapsed time.
pub fn apply_cost(state: &mut PlayerState, hunger: u32, fatigue: u32) {
    state.stats.shift_hunger(i64::from(hunger));
    state.stats.shift_fatigue(i64::from(fatigue));
}

/// Shed fatigue for `periods` if a passive-recovery tool is equipped.
///
/// Returns the fatigue actually removed.
pub fn apply_passive_recovery(state: &mut PlayerState, catalog: &Catalog, periods: u32) -> u32 {
    let rate = state.equipment.passive_recovery_rate(catalog);
    if rate == 0 || periods == 0 {
        return 0;
    }
    let before = state.stats.fatigue;
    state
        .stats
        .shift_fatigue(-i64::from(rate.saturating_mul(periods)));
    before - state.stats.fatigue
}

/// Spend `periods` at the given per-period rates: cost, passive recovery,
/// then rot and auto-eat. Returns the fatigue shed by passive recovery.
pub fn spend_periods(
    state: &mut PlayerState,
    catalog: &Catalog,
    periods: u32,
    hunger_per_period: u32,
    fatigue_per_period: u32,
    eaten: &mut Vec<Consumption>,
) -> u32 {
    apply_cost(
        state,
        periods.saturating_mul(hunger_per_period),
        periods.saturating_mul(fatigue_per_period),
    );
    let recovered = apply_passive_recovery(state, catalog, periods);
    run_periods(state, catalog, periods, eaten);
    recovered
}

/// Tick rot once per period and, with an auto-eat tool, eat one unit per
/// period while hungry.
///
/// The eaten unit comes from the first storable stack in insertion order.
pub fn run_periods(
    state: &mut PlayerState,
    catalog: &Catalog,
    periods: u32,
    eaten: &mut Vec<Consumption>,
) {
    let auto_eat = state
        .equipment
        .has_ability(catalog, ToolAbility::AutoEat);
    for _ in 0..periods {
        state.inventory.rot_one_charge();
        if auto_eat && state.stats.hunger > 0 {
            auto_eat_once(state, catalog, eaten);
        }
    }
}

fn auto_eat_once(state: &mut PlayerState, catalog: &Catalog, eaten: &mut Vec<Consumption>) {
    let Some((food_id, restore)) = state.inventory.storable().find_map(|stack| {
        catalog
            .storable_food(&stack.id)
            .map(|food| (stack.id.clone(), food.restore))
    }) else {
        return;
    };
    if state.inventory.remove_freshness_units(&food_id, 1) {
        state.stats.shift_hunger(-i64::from(restore));
        record_consumption(eaten, &food_id, restore);
        log::trace!("auto-eat consumed {food_id} (restore {restore})");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::EquipSlot;

    fn state_with(tools: &[(EquipSlot, &str)]) -> (PlayerState, Catalog) {
        let catalog = Catalog::load_from_static();
        let mut state = PlayerState::default();
        for (slot, id) in tools {
            state.equipment.equip(&catalog, *slot, id).unwrap();
        }
        (state, catalog)
    }

    #[test]
    fn auto_eat_takes_first_stack_in_insertion_order() {
        let (mut state, catalog) = state_with(&[(EquipSlot::TailLeft, "snack_pouch")]);
        state.inventory.add("river_snail", 2, Some(vec![9, 9]));
        state.inventory.add("dried_berry", 2, Some(vec![20, 20]));
        state.stats.hunger = 30;
        let mut eaten = Vec::new();
        run_periods(&mut state, &catalog, 3, &mut eaten);

        let snail = catalog.food("river_snail").unwrap().restore;
        let berry = catalog.food("dried_berry").unwrap().restore;
        assert_eq!(eaten[0].food_id, "river_snail");
        assert_eq!(eaten[0].units, 2);
        assert_eq!(eaten[1].food_id, "dried_berry");
        assert_eq!(eaten[1].units, 1);
        assert_eq!(
            state.stats.hunger,
            30_u32.saturating_sub(2 * snail + berry)
        );
        assert_eq!(state.inventory.get("dried_berry"), 1);
    }

    #[test]
    fn without_auto_eat_food_only_rots() {
        let (mut state, catalog) = state_with(&[]);
        state.inventory.add("river_snail", 1, Some(vec![2]));
        state.stats.hunger = 50;
        let mut eaten = Vec::new();
        run_periods(&mut state, &catalog, 2, &mut eaten);
        assert!(eaten.is_empty());
        assert_eq!(state.stats.hunger, 50);
        assert_eq!(state.inventory.get("river_snail"), 0);
    }

    #[test]
    fn satiated_players_do_not_eat() {
        let (mut state, catalog) = state_with(&[(EquipSlot::TailLeft, "snack_pouch")]);
        state.inventory.add("dried_berry", 1, Some(vec![30]));
        let mut eaten = Vec::new();
        run_periods(&mut state, &catalog, 4, &mut eaten);
        assert!(eaten.is_empty());
        assert_eq!(state.inventory.get("dried_berry"), 1);
    }

    #[test]
    fn passive_recovery_floors_at_zero() {
        let (mut state, catalog) = state_with(&[(EquipSlot::Shoe, "moss_slippers")]);
        state.stats.fatigue = 3;
        let recovered = apply_passive_recovery(&mut state, &catalog, 10);
        assert_eq!(recovered, 3);
        assert_eq!(state.stats.fatigue, 0);

        let (mut bare, catalog) = state_with(&[]);
        bare.stats.fatigue = 10;
        assert_eq!(apply_passive_recovery(&mut bare, &catalog, 10), 0);
    }

    #[test]
    fn spending_periods_charges_before_recovering() {
        let (mut state, catalog) = state_with(&[(EquipSlot::Shoe, "moss_slippers")]);
        let mut eaten = Vec::new();
        let recovered = spend_periods(&mut state, &catalog, 3, 2, 3, &mut eaten);
        let rate = state.equipment.passive_recovery_rate(&catalog);
        assert_eq!(state.stats.hunger, 6);
        assert_eq!(recovered, (3 * rate).min(9));
        assert_eq!(state.stats.fatigue, 9 - recovered);
    }

    #[test]
    fn consumption_log_aggregates_by_food() {
        let mut log = Vec::new();
        record_consumption(&mut log, "a", 3);
        record_consumption(&mut log, "b", 1);
        record_consumption(&mut log, "a", 3);
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].units, 2);
        assert_eq!(log[0].restored, 6);
    }
}
