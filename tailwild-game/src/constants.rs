//! Centralized balance and tuning constants for Tailwild rules.
//!
//! Content (creatures, recipes, foods, ...) lives in the catalog. The values
//! here define the fixed math shared by every catalog.

// Event identifiers --------------------------------------------------------
pub const EVENT_MISSING_CHOMPER: &str = "missing_chomper";
pub const EVENT_MISSING_SCOOP: &str = "missing_scoop";

// Skill progression --------------------------------------------------------
pub const SKILL_LEVEL_WIDTH: u32 = 100;
pub const SKILL_MAX_LEVEL: u32 = 10;
pub const SKILL_YIELD_BONUS_PER_LEVEL: f64 = 0.05;
pub const HARVEST_XP_PER_PERIOD: u32 = 8;
pub const HARVEST_XP_FLOOR: u32 = 10;

// Harvest efficiency -------------------------------------------------------
pub const EFFICIENCY_BEST: f64 = 1.5;
pub const EFFICIENCY_GOOD: f64 = 1.25;
pub const EFFICIENCY_OK: f64 = 1.0;
pub const EFFICIENCY_WEAK: f64 = 0.75;
pub const EFFICIENCY_VERY_WEAK: f64 = 0.5;
pub const EFFICIENCY_WASTEFUL: f64 = 0.25;

// Harvest fallback preview -------------------------------------------------
pub const FALLBACK_HARVEST_PERIODS_MIN: u32 = 3;
pub const FALLBACK_HARVEST_PERIODS_MAX: u32 = 5;
pub const FALLBACK_HARVEST_HUNGER_PER_PERIOD: u32 = 1;
pub const FALLBACK_HARVEST_FATIGUE_PER_PERIOD: u32 = 1;

// Recovery -----------------------------------------------------------------
pub const RECOVER_PERIODS: u32 = 6;

// Battle -------------------------------------------------------------------
pub const FLEE_MOVE_ID: &str = "flee";
pub const NOVELTY_HIGH_DISTINCT_MOVES: usize = 4;
pub const NOVELTY_LOW_DISTINCT_MOVES: usize = 2;
pub const NOVELTY_HIGH_REFUND_PCT: u32 = 60;
pub const NOVELTY_LOW_REFUND_PCT: u32 = 30;
pub const NOVELTY_SATIETY_BONUS: u32 = 5;
pub const PROFICIENCY_JITTER_FRACTION: f64 = 0.1;
pub const CONTAMINATION_FRESHNESS_FACTOR: f64 = 0.7;
