//! Moving granted items into a player's inventory.
use crate::bounds::Bounds;
use crate::catalog::{Catalog, Grant};
use crate::rng::RandomSource;
use crate::state::PlayerState;

/// Add `qty` to the running total for `id`, keeping first-seen order.
pub fn merge_grant(list: &mut Vec<Grant>, id: &str, qty: u32) {
    if qty == 0 {
        return;
    }
    if let Some(entry) = list.iter_mut().find(|entry| entry.id == id) {
        entry.qty = entry.qty.saturating_add(qty);
    } else {
        list.push(Grant::new(id, qty));
    }
}

/// Stow items without randomness; storable food gets its longest life.
pub fn stow_fixed(state: &mut PlayerState, catalog: &Catalog, id: &str, qty: u32) {
    let freshness = catalog
        .storable_food(id)
        .and_then(|food| food.freshness)
        .map(|range| vec![range.max; usize::try_from(qty).unwrap_or(0)]);
    state.inventory.add(id, qty, freshness);
}

/// Stow items, rolling an independent freshness per storable unit.
///
/// `override_range` replaces the food's own freshness range when present.
pub fn stow_rolled<R>(
    state: &mut PlayerState,
    catalog: &Catalog,
    id: &str,
    qty: u32,
    override_range: Option<Bounds>,
    rng: &mut R,
) where
    R: RandomSource + ?Sized,
{
    let range = override_range.or_else(|| catalog.storable_food(id).and_then(|food| food.freshness));
    let freshness = range.map(|range| (0..qty).map(|_| rng.roll(range).max(1)).collect());
    state.inventory.add(id, qty, freshness);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::ScriptedRng;

    #[test]
    fn merge_grant_accumulates_per_identity() {
        let mut list = Vec::new();
        merge_grant(&mut list, "reed", 2);
        merge_grant(&mut list, "pebble", 0);
        merge_grant(&mut list, "reed", 1);
        assert_eq!(list, vec![Grant::new("reed", 3)]);
    }

    #[test]
    fn stowing_food_tracks_freshness() {
        let catalog = Catalog::load_from_static();
        let mut state = PlayerState::default();
        stow_fixed(&mut state, &catalog, "dried_berry", 2);
        stow_fixed(&mut state, &catalog, "reed", 2);
        let max = catalog.food("dried_berry").unwrap().freshness.unwrap().max;
        assert_eq!(
            state.inventory.stack("dried_berry").unwrap().freshness,
            Some(vec![max, max])
        );
        assert!(state.inventory.stack("reed").unwrap().freshness.is_none());

        let mut rng = ScriptedRng::new([0.0, 0.999]);
        stow_rolled(
            &mut state,
            &catalog,
            "crab_meat",
            2,
            Some(Bounds::new(3, 5)),
            &mut rng,
        );
        assert_eq!(
            state.inventory.stack("crab_meat").unwrap().freshness,
            Some(vec![3, 5])
        );
        assert!(state.inventory.is_consistent());
    }
}
