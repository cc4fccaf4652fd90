//! Move legality and execution.
use serde::{Deserialize, Serialize};

use super::{BattleError, BattleState};
use crate::bounds::Bounds;
use crate::catalog::{Catalog, Grant, MoveDef, SituationShift};
use crate::constants::{FLEE_MOVE_ID, PROFICIENCY_JITTER_FRACTION, SKILL_MAX_LEVEL};
use crate::loot::merge_grant;
use crate::numbers::{clamp_i64_to_u32, round_f64_to_u32};
use crate::rng::RandomSource;
use crate::state::PlayerState;

/// What a landed move did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveReport {
    pub move_id: String,
    pub composure_damage: u32,
    pub integrity_damage: u32,
    pub stamina_cost: u32,
    pub countered: bool,
    pub counter_penalty: u32,
    pub drop: Option<Grant>,
    pub double_combo: bool,
    pub situation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MoveOutcome {
    /// The player ran; resolve the battle with `EndReason::Fled`.
    Fled,
    Landed(MoveReport),
}

/// Whether `def` may be played this turn.
#[must_use]
pub fn is_legal(battle: &BattleState, state: &PlayerState, def: &MoveDef) -> bool {
    def.requires_flags.iter().all(|flag| battle.has_flag(flag))
        && !def.forbids_flags.iter().any(|flag| battle.has_flag(flag))
        && def
            .situation
            .as_deref()
            .is_none_or(|situation| situation == battle.situation)
        && state.equipment.satisfies_tools(&def.tools)
}

/// Legal move ids in catalog order, with `flee` always last.
#[must_use]
pub fn available_moves(battle: &BattleState, state: &PlayerState, catalog: &Catalog) -> Vec<String> {
    catalog
        .moves
        .iter()
        .filter(|(id, def)| id.as_str() != FLEE_MOVE_ID && is_legal(battle, state, def))
        .map(|(id, _)| id.clone())
        .chain(std::iter::once(FLEE_MOVE_ID.to_string()))
        .collect()
}

/// Composure damage for `def`, scaled by proficiency in its method.
///
/// With a method the damage interpolates from the low end at level 1 to the
/// high end at the top level, jittered by a tenth of the range either way.
/// Without one it is uniform over the range.
pub fn roll_composure_damage<R>(def: &MoveDef, state: &PlayerState, rng: &mut R) -> u32
where
    R: RandomSource + ?Sized,
{
    let Bounds { min, max } = def.composure_damage;
    let Some(method) = def.method.as_deref() else {
        return rng.roll(def.composure_damage);
    };
    let level = state.skill_level(method);
    let span = f64::from(max - min);
    let progress = f64::from(level.saturating_sub(1)) / f64::from(SKILL_MAX_LEVEL - 1);
    let jitter = (rng.unit() * 2.0 - 1.0) * PROFICIENCY_JITTER_FRACTION * span;
    round_f64_to_u32(f64::from(min) + span * progress + jitter)
}

/// Play `move_id`.
///
/// `flee` returns [`MoveOutcome::Fled`] and leaves `battle` untouched.
///
/// # Errors
///
/// Fails for moves missing from the catalog or not legal this turn; the
/// battle state is unchanged in both cases.
pub fn execute_move<R>(
    battle: &mut BattleState,
    state: &PlayerState,
    catalog: &Catalog,
    move_id: &str,
    rng: &mut R,
) -> Result<MoveOutcome, BattleError>
where
    R: RandomSource + ?Sized,
{
    if move_id == FLEE_MOVE_ID {
        return Ok(MoveOutcome::Fled);
    }
    let def = catalog
        .move_def(move_id)
        .ok_or_else(|| BattleError::UnknownMove(move_id.to_string()))?;
    if !is_legal(battle, state, def) {
        log::debug!("rejected {move_id} in situation {}", battle.situation);
        return Err(BattleError::IllegalMove {
            move_id: move_id.to_string(),
            situation: battle.situation.clone(),
        });
    }

    let composure_damage = roll_composure_damage(def, state, rng).min(battle.composure);
    battle.composure -= composure_damage;
    let integrity_before = battle.integrity;
    battle.integrity = clamp_i64_to_u32(
        i64::from(integrity_before) + i64::from(def.integrity_damage),
        battle.max_integrity,
    );
    let integrity_damage = integrity_before.saturating_sub(battle.integrity);

    battle.stamina_cost = battle.stamina_cost.saturating_add(def.stamina_cost);
    battle.restore_stamina = battle.restore_stamina.saturating_add(def.restore_stamina);
    battle.restore_satiety = battle.restore_satiety.saturating_add(def.restore_satiety);

    for flag in &def.set_flags {
        battle.flags.insert(flag.clone());
    }
    for flag in &def.clear_flags {
        battle.flags.remove(flag);
    }

    if let Some(drop) = &def.drop {
        merge_grant(&mut battle.drops, &drop.id, drop.qty);
    }

    let mut countered = false;
    let mut counter_penalty = 0;
    if let Some(counter) = &def.counter
        && battle.has_flag(&counter.trigger_flag)
    {
        countered = true;
        counter_penalty = counter.stamina_penalty;
        battle.stamina_cost = battle.stamina_cost.saturating_add(counter_penalty);
        if counter.contaminates_food && !battle.contaminated {
            log::debug!("{move_id} was countered; food will be contaminated");
            battle.contaminated = true;
        }
    }

    if !battle.moves_used.iter().any(|used| used == move_id) {
        battle.moves_used.push(move_id.to_string());
    }
    let double_combo = def.is_double_combo();
    if double_combo {
        battle.double_combos = battle.double_combos.saturating_add(1);
    }

    match &def.next {
        SituationShift::Stay => {}
        SituationShift::To(next) => battle.situation.clone_from(next),
        SituationShift::Table => {
            if let Some(next) = catalog.successor(&battle.situation) {
                battle.situation = next.to_string();
            }
        }
    }
    battle.turn = battle.turn.saturating_add(1);

    Ok(MoveOutcome::Landed(MoveReport {
        move_id: move_id.to_string(),
        composure_damage,
        integrity_damage,
        stamina_cost: def.stamina_cost,
        countered,
        counter_penalty,
        drop: def.drop.clone(),
        double_combo,
        situation: battle.situation.clone(),
    }))
}
