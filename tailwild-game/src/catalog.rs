//! Read-only content catalog.
//!
//! Every resolver receives a `&Catalog`; nothing in the engine mutates it.
//! The catalog is deserialized from JSON and indexed once at load time so
//! the kind of any id (item, resource or food) is a map lookup rather than
//! something re-derived from the shape of the id.
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

use crate::battle::EndReason;
use crate::bounds::Bounds;
use crate::constants::{
    EFFICIENCY_BEST, EFFICIENCY_GOOD, EFFICIENCY_OK, EFFICIENCY_VERY_WEAK, EFFICIENCY_WASTEFUL,
    EFFICIENCY_WEAK,
};

const DEFAULT_CATALOG_DATA: &str = include_str!("../assets/catalog.json");

/// Journey flavour selected by the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JourneyMode {
    Explore,
    FindFood,
}

impl JourneyMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Explore => "explore",
            Self::FindFood => "find_food",
        }
    }
}

/// One value per [`JourneyMode`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ModeTable<T> {
    pub explore: T,
    pub find_food: T,
}

impl<T> ModeTable<T> {
    #[must_use]
    pub const fn get(&self, mode: JourneyMode) -> &T {
        match mode {
            JourneyMode::Explore => &self.explore,
            JourneyMode::FindFood => &self.find_food,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightedId {
    pub id: String,
    pub weight: u32,
}

/// Identity plus quantity, used for recipe inputs, event grants and drops.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    pub id: String,
    #[serde(default = "default_qty")]
    pub qty: u32,
}

impl Grant {
    #[must_use]
    pub fn new(id: impl Into<String>, qty: u32) -> Self {
        Self { id: id.into(), qty }
    }
}

const fn default_qty() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EventPool {
    #[serde(default)]
    pub chance: f64,
    #[serde(default)]
    pub events: Vec<String>,
}

/// Surfaced-event pools, checked in rare, uncommon, common order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EventPools {
    #[serde(default)]
    pub rare: EventPool,
    #[serde(default)]
    pub uncommon: EventPool,
    #[serde(default)]
    pub common: EventPool,
}

impl EventPools {
    #[must_use]
    pub fn total_chance(&self) -> f64 {
        self.rare.chance + self.uncommon.chance + self.common.chance
    }
}

/// Scoop tables keyed by how hungry the player currently is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoopBands {
    pub concern_at: f64,
    pub desperation_at: f64,
    #[serde(default)]
    pub comfort: Vec<WeightedId>,
    #[serde(default)]
    pub concern: Vec<WeightedId>,
    #[serde(default)]
    pub desperation: Vec<WeightedId>,
}

impl Default for ScoopBands {
    fn default() -> Self {
        Self {
            concern_at: 0.4,
            desperation_at: 0.75,
            comfort: Vec::new(),
            concern: Vec::new(),
            desperation: Vec::new(),
        }
    }
}

/// Biome-wide tuning for travel, foraging and the time-based actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiomeTuning {
    pub steps: ModeTable<Bounds>,
    pub hunger_per_step: u32,
    pub fatigue_per_step: u32,
    pub forage_hunger_per_period: u32,
    pub forage_fatigue_per_period: u32,
    #[serde(default)]
    pub poi_weights: ModeTable<Vec<WeightedId>>,
    #[serde(default)]
    pub rare_quality_chance: f64,
    #[serde(default)]
    pub surfaced_events_max: u32,
    #[serde(default)]
    pub event_pools: EventPools,
    #[serde(default)]
    pub scoop: ScoopBands,
    pub craft_hunger_per_period: u32,
    pub craft_fatigue_per_period: u32,
    pub recover_hunger_per_period: u32,
}

impl Default for BiomeTuning {
    fn default() -> Self {
        Self {
            steps: ModeTable {
                explore: Bounds::new(4, 8),
                find_food: Bounds::new(2, 5),
            },
            hunger_per_step: 2,
            fatigue_per_step: 3,
            forage_hunger_per_period: 1,
            forage_fatigue_per_period: 2,
            poi_weights: ModeTable::default(),
            rare_quality_chance: 0.1,
            surfaced_events_max: 2,
            event_pools: EventPools::default(),
            scoop: ScoopBands::default(),
            craft_hunger_per_period: 1,
            craft_fatigue_per_period: 1,
            recover_hunger_per_period: 1,
        }
    }
}

/// Equipment slot an item can occupy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotKind {
    Tail,
    Shoe,
}

/// Passive effect a tool has while equipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ToolAbility {
    AutoEat,
    ImmediateEat,
    Scoop,
    PassiveRecovery { fatigue_per_period: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDef {
    pub name: String,
    #[serde(default)]
    pub slot: Option<SlotKind>,
    #[serde(default)]
    pub ability: Option<ToolAbility>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDef {
    pub name: String,
}

/// A food; it is storable (and rots) only when it carries a freshness range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodDef {
    pub name: String,
    pub restore: u32,
    #[serde(default)]
    pub freshness: Option<Bounds>,
}

impl FoodDef {
    #[must_use]
    pub const fn is_storable(&self) -> bool {
        self.freshness.is_some()
    }
}

/// Fixed effect of a surfaced journey event.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EventDef {
    #[serde(default)]
    pub hunger: i32,
    #[serde(default)]
    pub fatigue: i32,
    #[serde(default)]
    pub grant: Option<Grant>,
}

/// Qualitative efficiency of a harvesting method at a point of interest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EfficiencyRank {
    Best,
    Good,
    Ok,
    Weak,
    VeryWeak,
    Wasteful,
}

impl EfficiencyRank {
    #[must_use]
    pub const fn multiplier(self) -> f64 {
        match self {
            Self::Best => EFFICIENCY_BEST,
            Self::Good => EFFICIENCY_GOOD,
            Self::Ok => EFFICIENCY_OK,
            Self::Weak => EFFICIENCY_WEAK,
            Self::VeryWeak => EFFICIENCY_VERY_WEAK,
            Self::Wasteful => EFFICIENCY_WASTEFUL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestTuning {
    pub periods: Bounds,
    pub hunger_per_period: u32,
    pub fatigue_per_period: u32,
    pub rank: EfficiencyRank,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PoiKind {
    Resource {
        resource: String,
        base_yield: Bounds,
        #[serde(default)]
        harvest: BTreeMap<String, HarvestTuning>,
    },
    Food {
        forage_periods: Bounds,
        instant_food: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoiDef {
    pub name: String,
    #[serde(flatten)]
    pub kind: PoiKind,
}

impl PoiDef {
    #[must_use]
    pub const fn is_food_source(&self) -> bool {
        matches!(self.kind, PoiKind::Food { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDef {
    pub name: String,
    #[serde(default)]
    pub tool: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeDef {
    pub name: String,
    pub inputs: Vec<Grant>,
    pub periods: u32,
    pub output: String,
    #[serde(default = "default_qty")]
    pub output_qty: u32,
    #[serde(default)]
    pub tool: Option<String>,
}

/// One conditional entry of a creature's corpse drop table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropEntry {
    pub id: String,
    pub qty: Bounds,
    #[serde(default)]
    pub integrity_min: Option<u32>,
    #[serde(default)]
    pub integrity_max: Option<u32>,
    #[serde(default)]
    pub requires_flags: Vec<String>,
    #[serde(default)]
    pub end_reasons: Option<Vec<EndReason>>,
    #[serde(default)]
    pub freshness: Option<Bounds>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatureDef {
    pub name: String,
    pub composure: u32,
    pub integrity: u32,
    pub initial_situation: String,
    #[serde(default)]
    pub drops: Vec<DropEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counter {
    pub trigger_flag: String,
    #[serde(default)]
    pub stamina_penalty: u32,
    #[serde(default)]
    pub contaminates_food: bool,
}

/// Where the battle situation goes after a move lands.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SituationShift {
    /// Follow the global transition table.
    #[default]
    Table,
    /// Explicitly remain in the current situation.
    Stay,
    To(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveDef {
    pub name: String,
    #[serde(default)]
    pub requires_flags: Vec<String>,
    #[serde(default)]
    pub forbids_flags: Vec<String>,
    #[serde(default)]
    pub situation: Option<String>,
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub composure_damage: Bounds,
    #[serde(default)]
    pub integrity_damage: i32,
    #[serde(default)]
    pub stamina_cost: u32,
    #[serde(default)]
    pub restore_stamina: u32,
    #[serde(default)]
    pub restore_satiety: u32,
    #[serde(default)]
    pub set_flags: Vec<String>,
    #[serde(default)]
    pub clear_flags: Vec<String>,
    #[serde(default)]
    pub drop: Option<Grant>,
    #[serde(default)]
    pub counter: Option<Counter>,
    #[serde(default)]
    pub next: SituationShift,
}

impl MoveDef {
    /// A combo move occupies both tail tools.
    #[must_use]
    pub fn is_double_combo(&self) -> bool {
        self.tools.len() >= 2
    }
}

/// Kind of a stackable inventory identity, resolved at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Item,
    Resource,
    Food,
}

/// Errors raised when catalog content is malformed or inconsistent.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog JSON could not be parsed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("id `{id}` is defined in more than one table")]
    DuplicateId { id: String },
    #[error("{owner} references unknown {table} `{id}`")]
    UnknownReference {
        table: &'static str,
        owner: String,
        id: String,
    },
    #[error("{owner} expects `{id}` to be {expected}")]
    WrongKind {
        owner: String,
        id: String,
        expected: &'static str,
    },
    #[error("move `{move_id}` has positive integrity damage {value}")]
    PositiveIntegrityDamage { move_id: String, value: i32 },
    #[error("{field} must be between 0 and 1 (got {value:.3})")]
    Probability { field: &'static str, value: f64 },
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Catalog {
    pub biome: BiomeTuning,
    #[serde(default)]
    pub items: BTreeMap<String, ItemDef>,
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceDef>,
    #[serde(default)]
    pub foods: BTreeMap<String, FoodDef>,
    #[serde(default)]
    pub events: BTreeMap<String, EventDef>,
    #[serde(default)]
    pub pois: BTreeMap<String, PoiDef>,
    #[serde(default)]
    pub methods: BTreeMap<String, MethodDef>,
    #[serde(default)]
    pub recipes: BTreeMap<String, RecipeDef>,
    #[serde(default)]
    pub creatures: BTreeMap<String, CreatureDef>,
    #[serde(default)]
    pub moves: BTreeMap<String, MoveDef>,
    #[serde(default)]
    pub situation_transitions: BTreeMap<String, String>,
    #[serde(skip)]
    kinds: HashMap<String, EntryKind>,
}

impl Catalog {
    /// Parse catalog JSON and build the kind index.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or an id appears in more
    /// than one of the item, resource and food tables.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let mut catalog: Self = serde_json::from_str(json)?;
        catalog.reindex()?;
        Ok(catalog)
    }

    /// Load the catalog bundled with the crate.
    #[must_use]
    pub fn load_from_static() -> Self {
        match Self::from_json(DEFAULT_CATALOG_DATA) {
            Ok(catalog) => catalog,
            Err(err) => {
                log::warn!("bundled catalog failed to load: {err}");
                Self::default()
            }
        }
    }

    /// Rebuild the kind index after the tables were edited in place.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DuplicateId`] when an id is defined twice.
    pub fn reindex(&mut self) -> Result<(), CatalogError> {
        let mut kinds = HashMap::new();
        let tables = self
            .items
            .keys()
            .map(|id| (id, EntryKind::Item))
            .chain(self.resources.keys().map(|id| (id, EntryKind::Resource)))
            .chain(self.foods.keys().map(|id| (id, EntryKind::Food)));
        for (id, kind) in tables {
            if kinds.insert(id.clone(), kind).is_some() {
                return Err(CatalogError::DuplicateId { id: id.clone() });
            }
        }
        self.kinds = kinds;
        Ok(())
    }

    #[must_use]
    pub fn kind_of(&self, id: &str) -> Option<EntryKind> {
        self.kinds.get(id).copied()
    }

    #[must_use]
    pub fn item(&self, id: &str) -> Option<&ItemDef> {
        self.items.get(id)
    }

    #[must_use]
    pub fn food(&self, id: &str) -> Option<&FoodDef> {
        self.foods.get(id)
    }

    /// Food definition for `id` if it is storable.
    #[must_use]
    pub fn storable_food(&self, id: &str) -> Option<&FoodDef> {
        self.food(id).filter(|food| food.is_storable())
    }

    #[must_use]
    pub fn poi(&self, id: &str) -> Option<&PoiDef> {
        self.pois.get(id)
    }

    #[must_use]
    pub fn event(&self, id: &str) -> Option<&EventDef> {
        self.events.get(id)
    }

    #[must_use]
    pub fn recipe(&self, id: &str) -> Option<&RecipeDef> {
        self.recipes.get(id)
    }

    #[must_use]
    pub fn creature(&self, id: &str) -> Option<&CreatureDef> {
        self.creatures.get(id)
    }

    #[must_use]
    pub fn move_def(&self, id: &str) -> Option<&MoveDef> {
        self.moves.get(id)
    }

    #[must_use]
    pub fn method(&self, id: &str) -> Option<&MethodDef> {
        self.methods.get(id)
    }

    /// Successor of `situation` in the global transition table.
    #[must_use]
    pub fn successor(&self, situation: &str) -> Option<&str> {
        self.situation_transitions.get(situation).map(String::as_str)
    }

    /// Check referential integrity across every table.
    ///
    /// # Errors
    ///
    /// Returns the first inconsistency found.
    pub fn validate(&self) -> Result<(), CatalogError> {
        self.validate_biome()?;
        self.validate_pois()?;
        self.validate_content()?;
        self.validate_battle()?;
        Ok(())
    }

    fn validate_biome(&self) -> Result<(), CatalogError> {
        let biome = &self.biome;
        check_probability("biome.rare_quality_chance", biome.rare_quality_chance)?;
        for (field, pool) in [
            ("biome.event_pools.rare", &biome.event_pools.rare),
            ("biome.event_pools.uncommon", &biome.event_pools.uncommon),
            ("biome.event_pools.common", &biome.event_pools.common),
        ] {
            check_probability(field, pool.chance)?;
            for event in &pool.events {
                if !self.events.contains_key(event) {
                    return Err(unknown("event", field, event));
                }
            }
        }
        check_probability("biome.event_pools", biome.event_pools.total_chance())?;
        check_probability("biome.scoop.concern_at", biome.scoop.concern_at)?;
        check_probability("biome.scoop.desperation_at", biome.scoop.desperation_at)?;
        for entry in biome
            .poi_weights
            .explore
            .iter()
            .chain(&biome.poi_weights.find_food)
        {
            if !self.pois.contains_key(&entry.id) {
                return Err(unknown("poi", "biome.poi_weights", &entry.id));
            }
        }
        for entry in biome
            .scoop
            .comfort
            .iter()
            .chain(&biome.scoop.concern)
            .chain(&biome.scoop.desperation)
        {
            if self.storable_food(&entry.id).is_none() {
                return Err(wrong_kind("biome.scoop", &entry.id, "a storable food"));
            }
        }
        Ok(())
    }

    fn validate_pois(&self) -> Result<(), CatalogError> {
        for (poi_id, poi) in &self.pois {
            let owner = format!("poi `{poi_id}`");
            match &poi.kind {
                PoiKind::Resource {
                    resource, harvest, ..
                } => {
                    if self.kind_of(resource) != Some(EntryKind::Resource) {
                        return Err(wrong_kind(&owner, resource, "a resource"));
                    }
                    for method in harvest.keys() {
                        if !self.methods.contains_key(method) {
                            return Err(unknown("method", &owner, method));
                        }
                    }
                }
                PoiKind::Food { instant_food, .. } => match self.food(instant_food) {
                    Some(food) if !food.is_storable() => {}
                    _ => return Err(wrong_kind(&owner, instant_food, "a non-storable food")),
                },
            }
        }
        Ok(())
    }

    fn validate_content(&self) -> Result<(), CatalogError> {
        for (event_id, event) in &self.events {
            if let Some(grant) = &event.grant {
                self.require_entry(&format!("event `{event_id}`"), &grant.id)?;
            }
        }
        for (method_id, method) in &self.methods {
            if let Some(tool) = &method.tool {
                self.require_tool(&format!("method `{method_id}`"), tool)?;
            }
        }
        for (recipe_id, recipe) in &self.recipes {
            let owner = format!("recipe `{recipe_id}`");
            for input in &recipe.inputs {
                self.require_entry(&owner, &input.id)?;
            }
            self.require_entry(&owner, &recipe.output)?;
            if let Some(tool) = &recipe.tool {
                self.require_tool(&owner, tool)?;
            }
        }
        Ok(())
    }

    fn validate_battle(&self) -> Result<(), CatalogError> {
        for (creature_id, creature) in &self.creatures {
            let owner = format!("creature `{creature_id}`");
            for entry in &creature.drops {
                self.require_entry(&owner, &entry.id)?;
            }
        }
        for (move_id, def) in &self.moves {
            let owner = format!("move `{move_id}`");
            if def.integrity_damage > 0 {
                return Err(CatalogError::PositiveIntegrityDamage {
                    move_id: move_id.clone(),
                    value: def.integrity_damage,
                });
            }
            for tool in &def.tools {
                self.require_tool(&owner, tool)?;
            }
            if let Some(method) = &def.method
                && !self.methods.contains_key(method)
            {
                return Err(unknown("method", &owner, method));
            }
            if let Some(drop) = &def.drop {
                self.require_entry(&owner, &drop.id)?;
            }
        }
        Ok(())
    }

    fn require_entry(&self, owner: &str, id: &str) -> Result<(), CatalogError> {
        if self.kind_of(id).is_some() {
            Ok(())
        } else {
            Err(unknown("entry", owner, id))
        }
    }

    fn require_tool(&self, owner: &str, id: &str) -> Result<(), CatalogError> {
        match self.item(id) {
            Some(item) if item.slot.is_some() => Ok(()),
            Some(_) => Err(wrong_kind(owner, id, "an equippable item")),
            None => Err(unknown("item", owner, id)),
        }
    }
}

fn check_probability(field: &'static str, value: f64) -> Result<(), CatalogError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(CatalogError::Probability { field, value })
    }
}

fn unknown(table: &'static str, owner: &str, id: &str) -> CatalogError {
    CatalogError::UnknownReference {
        table,
        owner: owner.to_string(),
        id: id.to_string(),
    }
}

fn wrong_kind(owner: &str, id: &str, expected: &'static str) -> CatalogError {
    CatalogError::WrongKind {
        owner: owner.to_string(),
        id: id.to_string(),
        expected,
    }
}
