//! Tailwild Game Engine
//!
//! Platform-agnostic rules for the Tailwild survival prototype: journeys,
//! harvesting, crafting, recovery and creature battles. This crate has no UI
//! or platform dependencies; content arrives as a read-only [`Catalog`].

pub mod battle;
pub mod bounds;
pub mod catalog;
pub mod constants;
pub mod craft;
pub mod harvest;
pub mod inventory;
pub mod journey;
pub mod loot;
pub mod numbers;
pub mod periods;
pub mod recover;
pub mod rng;
pub mod state;

// Re-export commonly used types
pub use battle::{
    BattleError, BattleResult, BattleState, EndReason, MoveOutcome, MoveReport, start_battle,
};
pub use bounds::Bounds;
pub use catalog::{Catalog, CatalogError, EntryKind, Grant, JourneyMode};
pub use craft::{CraftFailure, CraftPreview, CraftResult};
pub use harvest::{HarvestPreview, HarvestResult};
pub use inventory::{Inventory, Stack};
pub use journey::{JourneyPreview, JourneyResult, Quality};
pub use periods::Consumption;
pub use recover::{RecoverPreview, RecoverResult};
pub use rng::{RandomSource, RngBundle, ScriptedRng};
pub use state::{EquipError, EquipSlot, Equipment, Outcome, PlayerState, StatDelta, Stats};

/// Trait for abstracting catalog loading.
/// Platform-specific implementations should provide this.
pub trait CatalogLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the content catalog from the platform-specific source.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be read or parsed.
    fn load_catalog(&self) -> Result<Catalog, Self::Error>;
}

/// Binds a catalog and seeded random streams to every resolver.
///
/// Journeys draw from the journey stream, harvests from the harvest stream
/// and battles from the battle stream, so one domain's draws never shift
/// another's.
#[derive(Debug, Clone)]
pub struct Engine {
    catalog: Catalog,
    rng: RngBundle,
}

impl Engine {
    #[must_use]
    pub fn new(catalog: Catalog, seed: u64) -> Self {
        Self {
            catalog,
            rng: RngBundle::from_user_seed(seed),
        }
    }

    /// Build an engine from a platform loader.
    ///
    /// # Errors
    ///
    /// Returns the loader's error if the catalog cannot be loaded.
    pub fn from_loader<L: CatalogLoader>(loader: &L, seed: u64) -> Result<Self, L::Error> {
        Ok(Self::new(loader.load_catalog()?, seed))
    }

    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub const fn rng(&self) -> &RngBundle {
        &self.rng
    }

    /// Equip `id` into `slot`, returning the item it replaced.
    ///
    /// # Errors
    ///
    /// Returns [`EquipError`] for unknown items or slot mismatches.
    pub fn equip(
        &self,
        state: &mut PlayerState,
        slot: EquipSlot,
        id: &str,
    ) -> Result<Option<String>, EquipError> {
        state.equipment.equip(&self.catalog, slot, id)
    }

    #[must_use]
    pub fn preview_journey(&self, state: &PlayerState, mode: JourneyMode) -> JourneyPreview {
        journey::preview(state, &self.catalog, mode, &mut *self.rng.journey())
    }

    pub fn resolve_journey(
        &self,
        state: &mut PlayerState,
        preview: &JourneyPreview,
    ) -> JourneyResult {
        journey::resolve(state, &self.catalog, preview, &mut *self.rng.journey())
    }

    #[must_use]
    pub fn harvest_methods(&self, state: &PlayerState, poi_id: &str) -> Vec<String> {
        harvest::available_methods(state, &self.catalog, poi_id)
    }

    #[must_use]
    pub fn preview_harvest(&self, state: &PlayerState, poi_id: &str, method: &str) -> HarvestPreview {
        harvest::preview(state, &self.catalog, poi_id, method)
    }

    pub fn resolve_harvest(
        &self,
        state: &mut PlayerState,
        preview: &HarvestPreview,
    ) -> HarvestResult {
        harvest::resolve(state, &self.catalog, preview, &mut *self.rng.harvest())
    }

    /// Ids of recipes the player can currently craft, sorted.
    #[must_use]
    pub fn unlocked_recipes(&self, state: &PlayerState) -> Vec<String> {
        craft::unlocked_recipes(state, &self.catalog)
            .into_iter()
            .map(|(id, _)| id.to_string())
            .collect()
    }

    #[must_use]
    pub fn preview_craft(&self, state: &PlayerState, recipe_id: &str) -> Option<CraftPreview> {
        craft::preview(state, &self.catalog, recipe_id)
    }

    pub fn resolve_craft(&self, state: &mut PlayerState, preview: &CraftPreview) -> CraftResult {
        craft::resolve(state, &self.catalog, preview)
    }

    #[must_use]
    pub fn preview_recover(&self, state: &PlayerState) -> RecoverPreview {
        recover::preview(state, &self.catalog)
    }

    pub fn resolve_recover(&self, state: &mut PlayerState) -> RecoverResult {
        recover::resolve(state, &self.catalog)
    }

    /// # Errors
    ///
    /// Returns [`BattleError::UnknownCreature`] for ids missing from the catalog.
    pub fn start_battle(&self, creature_id: &str) -> Result<BattleState, BattleError> {
        battle::start_battle(&self.catalog, creature_id)
    }

    #[must_use]
    pub fn available_moves(&self, battle: &BattleState, state: &PlayerState) -> Vec<String> {
        battle::available_moves(battle, state, &self.catalog)
    }

    /// # Errors
    ///
    /// Returns [`BattleError`] for unknown or illegal moves.
    pub fn execute_move(
        &self,
        battle: &mut BattleState,
        state: &PlayerState,
        move_id: &str,
    ) -> Result<MoveOutcome, BattleError> {
        battle::execute_move(
            battle,
            state,
            &self.catalog,
            move_id,
            &mut *self.rng.battle(),
        )
    }

    pub fn resolve_battle(
        &self,
        battle: BattleState,
        state: &mut PlayerState,
        reason: EndReason,
    ) -> BattleResult {
        battle::resolve_battle(battle, state, &self.catalog, reason, &mut *self.rng.battle())
    }
}
