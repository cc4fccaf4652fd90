//! Stack-based inventory with optional per-unit freshness.
//!
//! Stacks keep insertion order, which is the documented tie-break for any
//! "first stack" lookup (auto-eat in particular). Freshness arrays are kept
//! sorted ascending, so consuming from the front always removes the units
//! closest to spoiling.
use serde::{Deserialize, Serialize};

use crate::numbers::round_f64_to_u32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stack {
    pub id: String,
    pub quantity: u32,
    /// Remaining life per unit; present only for storable food.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub freshness: Option<Vec<u32>>,
}

impl Stack {
    #[must_use]
    pub const fn tracks_freshness(&self) -> bool {
        self.freshness.is_some()
    }

    fn sync_quantity(&mut self) {
        if let Some(freshness) = &self.freshness {
            self.quantity = u32::try_from(freshness.len()).unwrap_or(u32::MAX);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Inventory {
    stacks: Vec<Stack>,
}

impl Inventory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn stacks(&self) -> &[Stack] {
        &self.stacks
    }

    #[must_use]
    pub fn stack(&self, id: &str) -> Option<&Stack> {
        self.stacks.iter().find(|stack| stack.id == id)
    }

    /// Quantity held for `id`, zero when absent.
    #[must_use]
    pub fn get(&self, id: &str) -> u32 {
        self.stack(id).map_or(0, |stack| stack.quantity)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }

    /// Add `qty` units of `id`.
    ///
    /// When `freshness` is supplied the stack tracks per-unit life. A list
    /// shorter than `qty` is padded with its longest-lived value and a longer
    /// one is truncated, so `freshness.len() == quantity` always holds.
    pub fn add(&mut self, id: &str, qty: u32, freshness: Option<Vec<u32>>) {
        if qty == 0 {
            return;
        }
        let incoming = freshness.map(|mut values| {
            let target = usize::try_from(qty).unwrap_or(usize::MAX);
            let pad = values.iter().copied().max().unwrap_or(1).max(1);
            values.resize(target, pad);
            values
        });

        let index = if let Some(index) = self.position(id) {
            index
        } else {
            self.stacks.push(Stack {
                id: id.to_string(),
                quantity: 0,
                freshness: incoming.as_ref().map(|_| Vec::new()),
            });
            self.stacks.len() - 1
        };
        let stack = &mut self.stacks[index];
        if stack.freshness.is_none()
            && let Some(values) = &incoming
        {
            // Untracked units join at the longest-lived incoming value.
            let pad = values.iter().copied().max().unwrap_or(1);
            let held = usize::try_from(stack.quantity).unwrap_or(0);
            stack.freshness = Some(vec![pad; held]);
        }

        match (&mut stack.freshness, incoming) {
            (Some(existing), Some(values)) => {
                existing.extend(values);
                existing.sort_unstable();
            }
            (Some(existing), None) => {
                let pad = existing.last().copied().unwrap_or(1).max(1);
                existing.extend(std::iter::repeat_n(pad, usize::try_from(qty).unwrap_or(0)));
            }
            (None, _) => {
                stack.quantity = stack.quantity.saturating_add(qty);
                return;
            }
        }
        stack.sync_quantity();
    }

    /// Remove `qty` units of `id`. Never removes partially.
    #[must_use]
    pub fn remove(&mut self, id: &str, qty: u32) -> bool {
        let Some(index) = self.position(id) else {
            return qty == 0;
        };
        if self.stacks[index].quantity < qty {
            return false;
        }
        self.take_front(index, qty);
        true
    }

    /// Remove the `units` soonest-to-expire units of a tracked food stack.
    #[must_use]
    pub fn remove_freshness_units(&mut self, food_id: &str, units: u32) -> bool {
        let Some(index) = self.position(food_id) else {
            return false;
        };
        let stack = &self.stacks[index];
        if !stack.tracks_freshness() || stack.quantity < units {
            return false;
        }
        self.take_front(index, units);
        true
    }

    /// Age every tracked unit by one; units at zero spoil silently.
    pub fn rot_one_charge(&mut self) {
        for stack in &mut self.stacks {
            if let Some(freshness) = &mut stack.freshness {
                freshness.retain_mut(|life| {
                    *life = life.saturating_sub(1);
                    *life > 0
                });
            }
            stack.sync_quantity();
        }
        self.prune();
    }

    /// Scale the remaining life of every tracked unit by `factor`.
    pub fn contaminate(&mut self, factor: f64) {
        for stack in &mut self.stacks {
            if let Some(freshness) = &mut stack.freshness {
                freshness.retain_mut(|life| {
                    *life = round_f64_to_u32(f64::from(*life) * factor);
                    *life > 0
                });
                freshness.sort_unstable();
            }
            stack.sync_quantity();
        }
        self.prune();
    }

    /// Stacks that track freshness, in insertion order.
    pub fn storable(&self) -> impl Iterator<Item = &Stack> {
        self.stacks.iter().filter(|stack| stack.tracks_freshness())
    }

    /// The stack auto-eat draws from next.
    #[must_use]
    pub fn first_storable(&self) -> Option<&Stack> {
        self.storable().next()
    }

    #[must_use]
    pub fn storable_units(&self) -> u32 {
        self.storable().map(|stack| stack.quantity).sum()
    }

    /// True when every stack upholds the quantity/freshness invariants.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let unique = self
            .stacks
            .iter()
            .enumerate()
            .all(|(i, stack)| self.stacks[..i].iter().all(|other| other.id != stack.id));
        unique
            && self.stacks.iter().all(|stack| {
                stack.quantity > 0
                    && stack.freshness.as_ref().is_none_or(|freshness| {
                        freshness.len() == stack.quantity as usize
                            && freshness.iter().all(|life| *life > 0)
                    })
            })
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.stacks.iter().position(|stack| stack.id == id)
    }

    fn take_front(&mut self, index: usize, qty: u32) {
        let stack = &mut self.stacks[index];
        match &mut stack.freshness {
            Some(freshness) => {
                let count = usize::try_from(qty).unwrap_or(freshness.len());
                freshness.drain(..count.min(freshness.len()));
                stack.sync_quantity();
            }
            None => stack.quantity -= qty,
        }
        if stack.quantity == 0 {
            self.stacks.remove(index);
        }
    }

    fn prune(&mut self) {
        self.stacks.retain(|stack| stack.quantity > 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snails(life: &[u32]) -> Inventory {
        let mut inventory = Inventory::new();
        inventory.add(
            "snail",
            u32::try_from(life.len()).unwrap(),
            Some(life.to_vec()),
        );
        inventory
    }

    #[test]
    fn add_and_remove_plain_stacks() {
        let mut inventory = Inventory::new();
        inventory.add("reed", 3, None);
        inventory.add("reed", 2, None);
        assert_eq!(inventory.get("reed"), 5);
        assert!(!inventory.remove("reed", 6));
        assert_eq!(inventory.get("reed"), 5);
        assert!(inventory.remove("reed", 5));
        assert!(inventory.stack("reed").is_none());
        assert!(inventory.is_empty());
    }

    #[test]
    fn freshness_is_kept_sorted_and_sized() {
        let mut inventory = snails(&[5, 2]);
        inventory.add("snail", 3, Some(vec![4]));
        let stack = inventory.stack("snail").unwrap();
        assert_eq!(stack.freshness.as_deref(), Some(&[2, 4, 4, 4, 5][..]));
        assert_eq!(stack.quantity, 5);
        assert!(inventory.is_consistent());
    }

    #[test]
    fn removal_takes_soonest_to_expire_first() {
        let mut inventory = snails(&[7, 1, 3]);
        assert!(inventory.remove_freshness_units("snail", 2));
        assert_eq!(
            inventory.stack("snail").unwrap().freshness.as_deref(),
            Some(&[7][..])
        );
        assert!(!inventory.remove_freshness_units("snail", 2));

        let mut plain = Inventory::new();
        plain.add("reed", 2, None);
        assert!(!plain.remove_freshness_units("reed", 1));
    }

    #[test]
    fn rot_drops_spoiled_units_and_empty_stacks() {
        let mut inventory = snails(&[1, 2]);
        inventory.add("reed", 1, None);
        inventory.rot_one_charge();
        assert_eq!(inventory.get("snail"), 1);
        inventory.rot_one_charge();
        assert!(inventory.stack("snail").is_none());
        assert_eq!(inventory.get("reed"), 1);
        assert!(inventory.is_consistent());
    }

    #[test]
    fn rot_is_additive_across_calls() {
        let start = snails(&[3, 5, 8, 9, 12]);
        for (n, m) in [(1, 2), (2, 4), (0, 7), (5, 5)] {
            let mut split = start.clone();
            for _ in 0..n {
                split.rot_one_charge();
            }
            for _ in 0..m {
                split.rot_one_charge();
            }
            let mut joined = start.clone();
            for _ in 0..(n + m) {
                joined.rot_one_charge();
            }
            assert_eq!(split, joined);
        }
    }

    #[test]
    fn contamination_scales_and_floors() {
        let mut inventory = snails(&[1, 4, 10]);
        inventory.contaminate(0.7);
        assert_eq!(
            inventory.stack("snail").unwrap().freshness.as_deref(),
            Some(&[1, 3, 7][..])
        );
        inventory.contaminate(0.0);
        assert!(inventory.stack("snail").is_none());
    }

    #[test]
    fn first_storable_skips_untracked_stacks() {
        let mut inventory = Inventory::new();
        inventory.add("reed", 2, None);
        assert!(inventory.first_storable().is_none());
        inventory.add("snail", 1, Some(vec![3]));
        inventory.add("berry", 2, Some(vec![1, 1]));
        assert_eq!(inventory.first_storable().map(|s| s.id.as_str()), Some("snail"));
        assert_eq!(inventory.storable_units(), 3);
    }

    #[test]
    fn fresh_units_start_tracking_an_untracked_stack() {
        let mut inventory = Inventory::new();
        inventory.add("snail", 1, None);
        inventory.add("snail", 1, Some(vec![2]));
        assert_eq!(inventory.get("snail"), 2);
        assert_eq!(
            inventory.stack("snail").and_then(|s| s.freshness.clone()),
            Some(vec![2, 2])
        );
        assert!(inventory.is_consistent());
        assert_eq!(inventory.storable_units(), 2);

        inventory.rot_one_charge();
        inventory.rot_one_charge();
        assert!(inventory.stack("snail").is_none());
        assert!(inventory.is_consistent());
    }

    #[test]
    fn zero_quantity_operations_are_noops() {
        let mut inventory = Inventory::new();
        inventory.add("reed", 0, None);
        assert!(inventory.is_empty());
        assert!(inventory.remove("reed", 0));
        assert!(!inventory.remove("reed", 1));
    }
}
