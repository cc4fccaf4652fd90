//! Surfaced journey events: rolling them and applying their fixed effects.
use std::collections::HashSet;

use crate::catalog::{Catalog, EventPool, EventPools, Grant};
use crate::loot::{merge_grant, stow_fixed};
use crate::rng::RandomSource;
use crate::state::PlayerState;

/// Roll up to `max` surfaced events.
///
/// Each attempt draws one sample and compares it against the cumulative
/// rare, uncommon and common thresholds; a sample past all of them yields
/// nothing. Repeats collapse to their first occurrence.
pub fn roll_surfaced<R>(pools: &EventPools, max: u32, rng: &mut R) -> Vec<String>
where
    R: RandomSource + ?Sized,
{
    let mut picked = Vec::new();
    for _ in 0..max {
        let sample = rng.unit();
        let Some(pool) = pool_for_sample(pools, sample) else {
            continue;
        };
        if pool.events.is_empty() {
            continue;
        }
        let last = u32::try_from(pool.events.len() - 1).unwrap_or(u32::MAX);
        let index = usize::try_from(rng.range(0, last)).unwrap_or(0);
        if let Some(event) = pool.events.get(index) {
            picked.push(event.clone());
        }
    }
    let mut seen = HashSet::new();
    picked.retain(|event| seen.insert(event.clone()));
    picked.truncate(usize::try_from(max).unwrap_or(usize::MAX));
    picked
}

fn pool_for_sample(pools: &EventPools, sample: f64) -> Option<&EventPool> {
    let rare = pools.rare.chance;
    let uncommon = rare + pools.uncommon.chance;
    let common = uncommon + pools.common.chance;
    if sample < rare {
        Some(&pools.rare)
    } else if sample < uncommon {
        Some(&pools.uncommon)
    } else if sample < common {
        Some(&pools.common)
    } else {
        None
    }
}

/// Apply an event's fixed stat delta and item grant.
pub fn apply_event(
    state: &mut PlayerState,
    catalog: &Catalog,
    event_id: &str,
    gained: &mut Vec<Grant>,
) {
    let Some(event) = catalog.event(event_id) else {
        log::debug!("surfaced event {event_id} has no definition; skipping");
        return;
    };
    state.stats.shift_hunger(i64::from(event.hunger));
    state.stats.shift_fatigue(i64::from(event.fatigue));
    if let Some(grant) = &event.grant {
        stow_fixed(state, catalog, &grant.id, grant.qty);
        merge_grant(gained, &grant.id, grant.qty);
    }
}
