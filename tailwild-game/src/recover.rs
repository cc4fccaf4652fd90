//! Resting in place for a fixed number of periods.
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::constants::RECOVER_PERIODS;
use crate::periods::{Consumption, apply_cost, apply_passive_recovery, run_periods};
use crate::state::{Outcome, PlayerState, StatDelta};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoverPreview {
    pub periods: u32,
    pub hunger: u32,
    /// Fatigue the equipped recovery tool would shed, capped at current fatigue.
    pub fatigue_recovered: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoverResult {
    pub periods: u32,
    /// Observed drop in fatigue between the before and after snapshots.
    pub fatigue_recovered: u32,
    pub delta: StatDelta,
    pub eaten: Vec<Consumption>,
    pub outcome: Outcome,
}

#[must_use]
pub fn preview(state: &PlayerState, catalog: &Catalog) -> RecoverPreview {
    let rate = state.equipment.passive_recovery_rate(catalog);
    RecoverPreview {
        periods: RECOVER_PERIODS,
        hunger: RECOVER_PERIODS.saturating_mul(catalog.biome.recover_hunger_per_period),
        fatigue_recovered: rate
            .saturating_mul(RECOVER_PERIODS)
            .min(state.stats.fatigue),
    }
}

pub fn resolve(state: &mut PlayerState, catalog: &Catalog) -> RecoverResult {
    let before = state.stats;
    let mut eaten = Vec::new();
    apply_cost(
        state,
        RECOVER_PERIODS.saturating_mul(catalog.biome.recover_hunger_per_period),
        0,
    );
    apply_passive_recovery(state, catalog, RECOVER_PERIODS);
    run_periods(state, catalog, RECOVER_PERIODS, &mut eaten);

    let fatigue_recovered = before.fatigue.saturating_sub(state.stats.fatigue);
    let outcome = state.outcome();
    log::debug!("recovered {fatigue_recovered} fatigue over {RECOVER_PERIODS} periods");
    RecoverResult {
        periods: RECOVER_PERIODS,
        fatigue_recovered,
        delta: StatDelta::between(&before, &state.stats),
        eaten,
        outcome,
    }
}
