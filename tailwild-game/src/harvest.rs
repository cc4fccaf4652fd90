//! Harvesting a resource node with a chosen method.
use serde::{Deserialize, Serialize};

use crate::bounds::Bounds;
use crate::catalog::{Catalog, EfficiencyRank, HarvestTuning, PoiKind};
use crate::constants::{
    FALLBACK_HARVEST_FATIGUE_PER_PERIOD, FALLBACK_HARVEST_HUNGER_PER_PERIOD,
    FALLBACK_HARVEST_PERIODS_MAX, FALLBACK_HARVEST_PERIODS_MIN, HARVEST_XP_FLOOR,
    HARVEST_XP_PER_PERIOD,
};
use crate::numbers::floor_f64_to_u32;
use crate::periods::{Consumption, spend_periods};
use crate::rng::RandomSource;
use crate::state::{Outcome, PlayerState, StatDelta, skill_multiplier};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestPreview {
    pub poi_id: String,
    pub method: String,
    /// Resource granted on completion; `None` when the POI yields nothing.
    pub resource: Option<String>,
    pub periods: Bounds,
    pub hunger_per_period: u32,
    pub fatigue_per_period: u32,
    pub hunger: Bounds,
    pub fatigue: Bounds,
    pub base_yield: Bounds,
    #[serde(rename = "yield")]
    pub yield_range: Bounds,
    pub rank: EfficiencyRank,
    pub skill_level: u32,
    /// True when the method is not tuned (or not usable) at this POI.
    pub fallback: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestResult {
    pub poi_id: String,
    pub method: String,
    pub resource: Option<String>,
    pub periods: u32,
    pub quantity: u32,
    pub xp_gained: u32,
    pub fatigue_recovered: u32,
    pub delta: StatDelta,
    pub eaten: Vec<Consumption>,
    pub fallback: bool,
    pub outcome: Outcome,
}

/// Methods tuned at `poi_id` whose tool, if any, is equipped. Sorted by id.
#[must_use]
pub fn available_methods(state: &PlayerState, catalog: &Catalog, poi_id: &str) -> Vec<String> {
    let Some(PoiKind::Resource { harvest, .. }) = catalog.poi(poi_id).map(|poi| &poi.kind) else {
        return Vec::new();
    };
    harvest
        .keys()
        .filter(|method| method_usable(state, catalog, method))
        .cloned()
        .collect()
}

fn method_usable(state: &PlayerState, catalog: &Catalog, method: &str) -> bool {
    catalog.method(method).is_some_and(|def| {
        def.tool
            .as_deref()
            .is_none_or(|tool| state.equipment.has(tool))
    })
}

/// Yield for a rolled base amount: `max(1, floor(base × efficiency × skill))`.
#[must_use]
pub fn scaled_yield(base: u32, rank: EfficiencyRank, skill_level: u32) -> u32 {
    floor_f64_to_u32(f64::from(base) * rank.multiplier() * skill_multiplier(skill_level)).max(1)
}

/// Project a harvest. Untuned or unusable methods get a fixed fallback.
#[must_use]
pub fn preview(state: &PlayerState, catalog: &Catalog, poi_id: &str, method: &str) -> HarvestPreview {
    let skill_level = state.skill_level(method);
    let (resource, tuning, base_yield) = match catalog.poi(poi_id).map(|poi| &poi.kind) {
        Some(PoiKind::Resource {
            resource,
            base_yield,
            harvest,
        }) => (
            Some(resource.clone()),
            harvest
                .get(method)
                .filter(|_| method_usable(state, catalog, method)),
            *base_yield,
        ),
        _ => (None, None, Bounds::fixed(0)),
    };

    let (periods, hunger_per_period, fatigue_per_period, rank, base_yield, fallback) = match tuning {
        Some(HarvestTuning {
            periods,
            hunger_per_period,
            fatigue_per_period,
            rank,
        }) => (
            *periods,
            *hunger_per_period,
            *fatigue_per_period,
            *rank,
            base_yield,
            false,
        ),
        None => {
            log::debug!("harvest of {poi_id} with {method} is untuned; using fallback preview");
            (
                Bounds::new(FALLBACK_HARVEST_PERIODS_MIN, FALLBACK_HARVEST_PERIODS_MAX),
                FALLBACK_HARVEST_HUNGER_PER_PERIOD,
                FALLBACK_HARVEST_FATIGUE_PER_PERIOD,
                EfficiencyRank::Wasteful,
                if resource.is_some() {
                    Bounds::fixed(1)
                } else {
                    base_yield
                },
                true,
            )
        }
    };

    let yield_range = if resource.is_some() {
        base_yield.map(|base| scaled_yield(base, rank, skill_level))
    } else {
        Bounds::fixed(0)
    };
    let rate = state.equipment.passive_recovery_rate(catalog);
    let gross_fatigue = periods.scale(fatigue_per_period);
    HarvestPreview {
        poi_id: poi_id.to_string(),
        method: method.to_string(),
        resource,
        periods,
        hunger_per_period,
        fatigue_per_period,
        hunger: periods.scale(hunger_per_period),
        fatigue: Bounds::new(
            gross_fatigue
                .min
                .saturating_sub(rate.saturating_mul(periods.min)),
            gross_fatigue
                .max
                .saturating_sub(rate.saturating_mul(periods.max)),
        ),
        base_yield,
        yield_range,
        rank,
        skill_level,
        fallback,
    }
}

/// Experience earned for a harvest lasting `periods`.
#[must_use]
pub fn xp_for_periods(periods: u32) -> u32 {
    periods
        .saturating_mul(HARVEST_XP_PER_PERIOD)
        .max(HARVEST_XP_FLOOR)
}

/// Resolve a previewed harvest, mutating `state`.
pub fn resolve<R>(
    state: &mut PlayerState,
    catalog: &Catalog,
    preview: &HarvestPreview,
    rng: &mut R,
) -> HarvestResult
where
    R: RandomSource + ?Sized,
{
    let before = state.stats;
    let mut eaten = Vec::new();

    let periods = rng.roll(preview.periods);
    let fatigue_recovered = spend_periods(
        state,
        catalog,
        periods,
        preview.hunger_per_period,
        preview.fatigue_per_period,
        &mut eaten,
    );

    let base = rng.roll(preview.base_yield);
    let quantity = match &preview.resource {
        Some(resource) => {
            let quantity = scaled_yield(base, preview.rank, preview.skill_level);
            state.inventory.add(resource, quantity, None);
            quantity
        }
        None => 0,
    };

    let xp_gained = if catalog.method(&preview.method).is_some() {
        let xp = xp_for_periods(periods);
        state.award_xp(&preview.method, xp);
        xp
    } else {
        0
    };

    let outcome = state.outcome();
    log::debug!(
        "harvest at {} with {}: {periods} periods, {quantity} gained, outcome {outcome}",
        preview.poi_id,
        preview.method
    );
    HarvestResult {
        poi_id: preview.poi_id.clone(),
        method: preview.method.clone(),
        resource: preview.resource.clone(),
        periods,
        quantity,
        xp_gained,
        fatigue_recovered,
        delta: StatDelta::between(&before, &state.stats),
        eaten,
        fallback: preview.fallback,
        outcome,
    }
}
