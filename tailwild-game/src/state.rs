use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use crate::catalog::{Catalog, SlotKind, ToolAbility};
use crate::constants::{SKILL_LEVEL_WIDTH, SKILL_MAX_LEVEL, SKILL_YIELD_BONUS_PER_LEVEL};
use crate::inventory::Inventory;
use crate::numbers::clamp_i64_to_u32;

/// Bounded hunger and fatigue meters.
///
/// Hunger and fatigue rise toward their maximum; satiety and stamina are the
/// remaining headroom (`max - value`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub hunger: u32,
    pub max_hunger: u32,
    pub fatigue: u32,
    pub max_fatigue: u32,
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            hunger: 0,
            max_hunger: 100,
            fatigue: 0,
            max_fatigue: 100,
        }
    }
}

impl Stats {
    #[must_use]
    pub const fn satiety(&self) -> u32 {
        self.max_hunger.saturating_sub(self.hunger)
    }

    #[must_use]
    pub const fn stamina(&self) -> u32 {
        self.max_fatigue.saturating_sub(self.fatigue)
    }

    /// Shift hunger by a signed amount, clamped to `0..=max_hunger`.
    pub fn shift_hunger(&mut self, delta: i64) {
        self.hunger = clamp_i64_to_u32(i64::from(self.hunger) + delta, self.max_hunger);
    }

    /// Shift fatigue by a signed amount, clamped to `0..=max_fatigue`.
    pub fn shift_fatigue(&mut self, delta: i64) {
        self.fatigue = clamp_i64_to_u32(i64::from(self.fatigue) + delta, self.max_fatigue);
    }

    /// Set stamina from a possibly out-of-range value in one clamp.
    pub fn set_stamina(&mut self, stamina: i64) {
        let stamina = clamp_i64_to_u32(stamina, self.max_fatigue);
        self.fatigue = self.max_fatigue - stamina;
    }

    pub fn clamp(&mut self) {
        self.hunger = self.hunger.min(self.max_hunger);
        self.fatigue = self.fatigue.min(self.max_fatigue);
    }

    /// Terminal state: starvation outranks exhaustion.
    #[must_use]
    pub const fn outcome(&self) -> Outcome {
        if self.hunger >= self.max_hunger {
            Outcome::Dead
        } else if self.fatigue >= self.max_fatigue {
            Outcome::Exhausted
        } else {
            Outcome::Ok
        }
    }
}

/// Observed change between two stat snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatDelta {
    pub hunger: i64,
    pub fatigue: i64,
}

impl StatDelta {
    #[must_use]
    pub fn between(before: &Stats, after: &Stats) -> Self {
        Self {
            hunger: i64::from(after.hunger) - i64::from(before.hunger),
            fatigue: i64::from(after.fatigue) - i64::from(before.fatigue),
        }
    }
}

/// Terminal tag attached to every resolution result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    #[default]
    Ok,
    Exhausted,
    Dead,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::Exhausted => write!(f, "exhausted"),
            Self::Dead => write!(f, "dead"),
        }
    }
}

/// Addressable equipment slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipSlot {
    TailLeft,
    TailRight,
    Shoe,
}

impl EquipSlot {
    #[must_use]
    pub const fn kind(self) -> SlotKind {
        match self {
            Self::TailLeft | Self::TailRight => SlotKind::Tail,
            Self::Shoe => SlotKind::Shoe,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EquipError {
    #[error("item `{0}` is not in the catalog")]
    UnknownItem(String),
    #[error("item `{id}` cannot be worn in a {slot:?} slot")]
    SlotMismatch { id: String, slot: SlotKind },
}

/// Two tail-tool slots and one shoe slot.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Equipment {
    pub tail: [Option<String>; 2],
    pub shoe: Option<String>,
}

impl Equipment {
    /// Place `id` into `slot`, returning whatever was there before.
    ///
    /// # Errors
    ///
    /// Fails when the item is unknown or its catalog slot does not match.
    pub fn equip(
        &mut self,
        catalog: &Catalog,
        slot: EquipSlot,
        id: &str,
    ) -> Result<Option<String>, EquipError> {
        let item = catalog
            .item(id)
            .ok_or_else(|| EquipError::UnknownItem(id.to_string()))?;
        if item.slot != Some(slot.kind()) {
            return Err(EquipError::SlotMismatch {
                id: id.to_string(),
                slot: slot.kind(),
            });
        }
        Ok(self.slot_mut(slot).replace(id.to_string()))
    }

    pub fn unequip(&mut self, slot: EquipSlot) -> Option<String> {
        self.slot_mut(slot).take()
    }

    const fn slot_mut(&mut self, slot: EquipSlot) -> &mut Option<String> {
        match slot {
            EquipSlot::TailLeft => &mut self.tail[0],
            EquipSlot::TailRight => &mut self.tail[1],
            EquipSlot::Shoe => &mut self.shoe,
        }
    }

    /// Every equipped item id, tails first.
    pub fn equipped(&self) -> impl Iterator<Item = &str> {
        self.tail
            .iter()
            .chain(std::iter::once(&self.shoe))
            .filter_map(|slot| slot.as_deref())
    }

    #[must_use]
    pub fn has(&self, id: &str) -> bool {
        self.equipped().any(|equipped| equipped == id)
    }

    /// First equipped tool granting an ability matching `pred`.
    pub fn ability<'c>(
        &self,
        catalog: &'c Catalog,
        pred: impl Fn(&ToolAbility) -> bool,
    ) -> Option<&'c ToolAbility> {
        self.equipped()
            .filter_map(|id| catalog.item(id).and_then(|item| item.ability.as_ref()))
            .find(|ability| pred(ability))
    }

    #[must_use]
    pub fn has_ability(&self, catalog: &Catalog, wanted: ToolAbility) -> bool {
        self.ability(catalog, |ability| *ability == wanted).is_some()
    }

    /// Fatigue shed per period by an equipped passive-recovery tool.
    #[must_use]
    pub fn passive_recovery_rate(&self, catalog: &Catalog) -> u32 {
        match self.ability(catalog, |ability| {
            matches!(ability, ToolAbility::PassiveRecovery { .. })
        }) {
            Some(ToolAbility::PassiveRecovery { fatigue_per_period }) => *fatigue_per_period,
            _ => 0,
        }
    }

    /// Match `required` tools against equipped items, each equipped item
    /// satisfying at most one requirement.
    #[must_use]
    pub fn satisfies_tools(&self, required: &[String]) -> bool {
        let mut pool: Vec<&str> = self.equipped().collect();
        required.iter().all(|tool| {
            pool.iter()
                .position(|equipped| *equipped == tool.as_str())
                .map(|index| pool.swap_remove(index))
                .is_some()
        })
    }
}

/// Skill level for an experience total: `min(10, xp / 100 + 1)`.
#[must_use]
pub const fn skill_level(xp: u32) -> u32 {
    let level = xp / SKILL_LEVEL_WIDTH + 1;
    if level > SKILL_MAX_LEVEL {
        SKILL_MAX_LEVEL
    } else {
        level
    }
}

/// Yield multiplier granted by a skill level.
#[must_use]
pub fn skill_multiplier(level: u32) -> f64 {
    1.0 + SKILL_YIELD_BONUS_PER_LEVEL * f64::from(level.saturating_sub(1))
}

/// Mutable aggregate every resolver reads and writes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlayerState {
    pub stats: Stats,
    pub equipment: Equipment,
    pub inventory: Inventory,
    #[serde(default)]
    pub xp: BTreeMap<String, u32>,
}

impl PlayerState {
    #[must_use]
    pub fn xp_for(&self, method: &str) -> u32 {
        self.xp.get(method).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn skill_level(&self, method: &str) -> u32 {
        skill_level(self.xp_for(method))
    }

    /// Add experience; counters never decrease.
    pub fn award_xp(&mut self, method: &str, amount: u32) {
        let entry = self.xp.entry(method.to_string()).or_insert(0);
        *entry = entry.saturating_add(amount);
    }

    #[must_use]
    pub const fn outcome(&self) -> Outcome {
        self.stats.outcome()
    }
}
