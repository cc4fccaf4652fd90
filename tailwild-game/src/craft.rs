//! Deterministic crafting from catalog recipes.
use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, Grant, RecipeDef};
use crate::loot::stow_fixed;
use crate::periods::{Consumption, spend_periods};
use crate::state::{Outcome, PlayerState, StatDelta};

/// Why a craft did not produce its output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CraftFailure {
    MissingResources,
    Dead,
    Exhausted,
}

/// One line of the input checklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputCheck {
    pub id: String,
    pub required: u32,
    pub held: u32,
}

impl InputCheck {
    #[must_use]
    pub const fn satisfied(&self) -> bool {
        self.held >= self.required
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CraftPreview {
    pub recipe_id: String,
    pub periods: u32,
    pub hunger: u32,
    pub fatigue: u32,
    pub inputs: Vec<InputCheck>,
    pub output: Grant,
}

impl CraftPreview {
    #[must_use]
    pub fn can_afford(&self) -> bool {
        self.inputs.iter().all(InputCheck::satisfied)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CraftResult {
    pub recipe_id: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_reason: Option<CraftFailure>,
    pub consumed: Vec<Grant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub produced: Option<Grant>,
    pub periods: u32,
    pub delta: StatDelta,
    pub eaten: Vec<Consumption>,
    pub outcome: Outcome,
}

/// Recipes whose crafting tool, if any, is equipped. Sorted by id.
#[must_use]
pub fn unlocked_recipes<'c>(state: &PlayerState, catalog: &'c Catalog) -> Vec<(&'c str, &'c RecipeDef)> {
    catalog
        .recipes
        .iter()
        .filter(|(_, recipe)| {
            recipe
                .tool
                .as_deref()
                .is_none_or(|tool| state.equipment.has(tool))
        })
        .map(|(id, recipe)| (id.as_str(), recipe))
        .collect()
}

/// Fixed projection of a recipe; `None` for unknown ids.
#[must_use]
pub fn preview(state: &PlayerState, catalog: &Catalog, recipe_id: &str) -> Option<CraftPreview> {
    let recipe = catalog.recipe(recipe_id)?;
    let biome = &catalog.biome;
    Some(CraftPreview {
        recipe_id: recipe_id.to_string(),
        periods: recipe.periods,
        hunger: recipe.periods.saturating_mul(biome.craft_hunger_per_period),
        fatigue: recipe.periods.saturating_mul(biome.craft_fatigue_per_period),
        inputs: recipe
            .inputs
            .iter()
            .map(|input| InputCheck {
                id: input.id.clone(),
                required: input.qty,
                held: state.inventory.get(&input.id),
            })
            .collect(),
        output: Grant::new(recipe.output.clone(), recipe.output_qty),
    })
}

/// Craft `preview`'s recipe.
///
/// Missing inputs fail before anything changes. Otherwise inputs and time
/// are spent up front, and the output is withheld if the player dies or
/// collapses while working.
pub fn resolve(state: &mut PlayerState, catalog: &Catalog, preview: &CraftPreview) -> CraftResult {
    let before = state.stats;
    let mut result = CraftResult {
        recipe_id: preview.recipe_id.clone(),
        success: false,
        fail_reason: None,
        consumed: Vec::new(),
        produced: None,
        periods: 0,
        delta: StatDelta::default(),
        eaten: Vec::new(),
        outcome: state.outcome(),
    };

    let has_inputs = preview
        .inputs
        .iter()
        .all(|input| state.inventory.get(&input.id) >= input.required);
    if !has_inputs {
        log::debug!("craft {} lacks inputs", preview.recipe_id);
        result.fail_reason = Some(CraftFailure::MissingResources);
        return result;
    }
    for input in &preview.inputs {
        if state.inventory.remove(&input.id, input.required) {
            result.consumed.push(Grant::new(input.id.clone(), input.required));
        }
    }

    let biome = &catalog.biome;
    spend_periods(
        state,
        catalog,
        preview.periods,
        biome.craft_hunger_per_period,
        biome.craft_fatigue_per_period,
        &mut result.eaten,
    );
    result.periods = preview.periods;
    result.outcome = state.outcome();
    result.delta = StatDelta::between(&before, &state.stats);

    match result.outcome {
        Outcome::Dead => result.fail_reason = Some(CraftFailure::Dead),
        Outcome::Exhausted => result.fail_reason = Some(CraftFailure::Exhausted),
        Outcome::Ok => {
            stow_fixed(state, catalog, &preview.output.id, preview.output.qty);
            result.produced = Some(preview.output.clone());
            result.success = true;
        }
    }
    log::debug!(
        "craft {} finished: success {}, outcome {}",
        preview.recipe_id,
        result.success,
        result.outcome
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::EquipSlot;

    #[test]
    fn missing_inputs_change_nothing() {
        let catalog = Catalog::load_from_static();
        let mut state = PlayerState::default();
        state.inventory.add("reed", 2, None);
        let snapshot = state.clone();

        let preview = preview(&state, &catalog, "reed_twine").unwrap();
        assert!(!preview.can_afford());
        let result = resolve(&mut state, &catalog, &preview);
        assert!(!result.success);
        assert_eq!(result.fail_reason, Some(CraftFailure::MissingResources));
        assert_eq!(result.delta, StatDelta::default());
        assert_eq!(result.periods, 0);
        assert_eq!(state, snapshot);
    }

    #[test]
    fn successful_craft_consumes_inputs_and_grants_output() {
        let catalog = Catalog::load_from_static();
        let mut state = PlayerState::default();
        state.inventory.add("reed", 5, None);
        let recipe = catalog.recipe("reed_twine").unwrap();

        let preview = preview(&state, &catalog, "reed_twine").unwrap();
        let result = resolve(&mut state, &catalog, &preview);
        assert!(result.success);
        assert_eq!(state.inventory.get("reed"), 2);
        assert_eq!(state.inventory.get("twine"), recipe.output_qty);
        assert_eq!(state.stats.hunger, preview.hunger);
        assert_eq!(state.stats.fatigue, preview.fatigue);
        assert_eq!(result.consumed, vec![Grant::new("reed", 3)]);
    }

    #[test]
    fn collapsing_mid_craft_keeps_the_cost_but_not_the_output() {
        let catalog = Catalog::load_from_static();
        let mut state = PlayerState::default();
        state.inventory.add("reed", 3, None);
        state.stats.fatigue = state.stats.max_fatigue - 1;

        let preview = preview(&state, &catalog, "reed_twine").unwrap();
        let result = resolve(&mut state, &catalog, &preview);
        assert!(!result.success);
        assert_eq!(result.fail_reason, Some(CraftFailure::Exhausted));
        assert_eq!(state.inventory.get("reed"), 0);
        assert_eq!(state.inventory.get("twine"), 0);
    }

    #[test]
    fn tool_gated_recipes_unlock_when_equipped() {
        let catalog = Catalog::load_from_static();
        let mut state = PlayerState::default();
        let ids = |state: &PlayerState| -> Vec<String> {
            unlocked_recipes(state, &catalog)
                .into_iter()
                .map(|(id, _)| id.to_string())
                .collect()
        };
        assert!(!ids(&state).contains(&String::from("flint_spike")));
        state
            .equipment
            .equip(&catalog, EquipSlot::TailLeft, "reed_hook")
            .unwrap();
        let unlocked = ids(&state);
        assert!(unlocked.contains(&String::from("flint_spike")));
        assert!(unlocked.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn unknown_recipes_have_no_preview() {
        let catalog = Catalog::load_from_static();
        assert!(preview(&PlayerState::default(), &catalog, "nope").is_none());
    }

    #[test]
    fn failure_reasons_serialize_in_snake_case() {
        let json = serde_json::to_string(&CraftFailure::MissingResources).unwrap();
        assert_eq!(json, "\"missing_resources\"");
    }
}
