//! Turn-based creature battles.
//!
//! A [`BattleState`] is created by [`start_battle`], mutated once per
//! [`execute_move`] and consumed by [`resolve_battle`]. Nothing touches the
//! player's state until resolution, so an abandoned battle leaves no trace.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeSet;
use thiserror::Error;

use crate::catalog::{Catalog, Grant};
use crate::state::PlayerState;

pub mod moves;
pub mod settle;

pub use moves::{MoveOutcome, MoveReport, available_moves, execute_move, is_legal};
pub use settle::{BattleResult, is_high_novelty, novelty_refund, novelty_refund_pct, resolve_battle};

/// Distinct move ids in first-use order.
pub type MoveLog = SmallVec<[String; 8]>;

/// Why a battle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    Fled,
    /// Composure reached zero.
    Subdued,
    /// Integrity reached zero.
    Slain,
    /// Accrued cost used up the player's stamina.
    Exhausted,
    /// The caller ended the fight for any other reason.
    Yielded,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BattleError {
    #[error("creature `{0}` is not in the catalog")]
    UnknownCreature(String),
    #[error("move `{0}` is not in the catalog")]
    UnknownMove(String),
    #[error("move `{move_id}` is not legal in situation `{situation}`")]
    IllegalMove { move_id: String, situation: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleState {
    pub creature_id: String,
    pub composure: u32,
    pub max_composure: u32,
    pub integrity: u32,
    pub max_integrity: u32,
    pub flags: BTreeSet<String>,
    pub situation: String,
    pub turn: u32,
    pub moves_used: MoveLog,
    pub double_combos: u32,
    /// Stamina cost accrued so far, counter penalties included.
    pub stamina_cost: u32,
    pub restore_stamina: u32,
    pub restore_satiety: u32,
    /// Mid-battle drops, one entry per identity.
    pub drops: Vec<Grant>,
    /// Raised by a food-contaminating counter; applied once at resolution.
    pub contaminated: bool,
}

impl BattleState {
    #[must_use]
    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.contains(flag)
    }

    #[must_use]
    pub fn distinct_moves(&self) -> usize {
        self.moves_used.len()
    }

    /// The end reason that currently applies, if any. Never `Fled` or
    /// `Yielded`; those are the caller's choice.
    #[must_use]
    pub fn suggested_end(&self, state: &PlayerState) -> Option<EndReason> {
        if self.integrity == 0 {
            Some(EndReason::Slain)
        } else if self.composure == 0 {
            Some(EndReason::Subdued)
        } else if self.stamina_cost >= state.stats.stamina() {
            Some(EndReason::Exhausted)
        } else {
            None
        }
    }
}

/// Open a battle against `creature_id` at full composure and integrity.
///
/// # Errors
///
/// Returns [`BattleError::UnknownCreature`] for ids missing from the catalog.
pub fn start_battle(catalog: &Catalog, creature_id: &str) -> Result<BattleState, BattleError> {
    let creature = catalog
        .creature(creature_id)
        .ok_or_else(|| BattleError::UnknownCreature(creature_id.to_string()))?;
    log::debug!(
        "battle with {creature_id} opens in situation {}",
        creature.initial_situation
    );
    Ok(BattleState {
        creature_id: creature_id.to_string(),
        composure: creature.composure,
        max_composure: creature.composure,
        integrity: creature.integrity,
        max_integrity: creature.integrity,
        flags: BTreeSet::new(),
        situation: creature.initial_situation.clone(),
        turn: 0,
        moves_used: MoveLog::new(),
        double_combos: 0,
        stamina_cost: 0,
        restore_stamina: 0,
        restore_satiety: 0,
        drops: Vec::new(),
        contaminated: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn battles_start_from_catalog_values() {
        let catalog = Catalog::load_from_static();
        let battle = start_battle(&catalog, "mud_crab").unwrap();
        let crab = catalog.creature("mud_crab").unwrap();
        assert_eq!(battle.composure, crab.composure);
        assert_eq!(battle.integrity, crab.integrity);
        assert_eq!(battle.situation, crab.initial_situation);
        assert!(battle.flags.is_empty());
        assert!(!battle.contaminated);
        assert_eq!(
            start_battle(&catalog, "dragon"),
            Err(BattleError::UnknownCreature(String::from("dragon")))
        );
    }

    #[test]
    fn suggested_end_prefers_slain() {
        let catalog = Catalog::load_from_static();
        let state = PlayerState::default();
        let mut battle = start_battle(&catalog, "mud_crab").unwrap();
        assert_eq!(battle.suggested_end(&state), None);
        battle.stamina_cost = state.stats.stamina();
        assert_eq!(battle.suggested_end(&state), Some(EndReason::Exhausted));
        battle.composure = 0;
        assert_eq!(battle.suggested_end(&state), Some(EndReason::Subdued));
        battle.integrity = 0;
        assert_eq!(battle.suggested_end(&state), Some(EndReason::Slain));
    }

    #[test]
    fn end_reasons_use_snake_case() {
        let parsed: Vec<EndReason> = serde_json::from_str(r#"["fled", "subdued", "yielded"]"#).unwrap();
        assert_eq!(
            parsed,
            vec![EndReason::Fled, EndReason::Subdued, EndReason::Yielded]
        );
    }
}
