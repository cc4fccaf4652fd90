//! Seeded action loops driven through the [`Engine`].
//!
//! Each scenario plays a short run with a `ChaCha8Rng` choosing actions and
//! checks preview bounds and state invariants after every resolution.

use anyhow::{Context, Result, bail, ensure};
use rand::Rng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

use tailwild_game::catalog::PoiKind;
use tailwild_game::loot::stow_fixed;
use tailwild_game::{
    Catalog, CraftFailure, EndReason, Engine, EquipSlot, JourneyMode, MoveOutcome, Outcome,
    PlayerState,
};

/// Upper bound on resolutions per run; healthy runs end earlier.
const MAX_ACTIONS: usize = 120;
const MAX_BATTLES: usize = 8;
const MAX_TURNS: u32 = 40;
/// Fatigue at which looping scenarios stop to rest.
const REST_THRESHOLD: u32 = 70;
const FLEE_CHANCE: f64 = 0.08;
const STARTER_RESOURCES: u32 = 4;
const STARTER_FOOD: u32 = 3;
const RECENT_ACTIONS: usize = 3;

const STARTER_KIT: &[(EquipSlot, &str)] = &[
    (EquipSlot::TailLeft, "snack_pouch"),
    (EquipSlot::TailRight, "shell_scoop"),
    (EquipSlot::Shoe, "moss_slippers"),
];

type ScenarioFn = fn(&Engine, &mut ChaCha8Rng, &mut RunSummary) -> Result<()>;

pub struct Scenario {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    run: ScenarioFn,
}

impl Scenario {
    /// Play one seeded run, recording progress into `summary`.
    ///
    /// # Errors
    ///
    /// Returns the first violated check.
    pub fn run(
        &self,
        engine: &Engine,
        policy: &mut ChaCha8Rng,
        summary: &mut RunSummary,
    ) -> Result<()> {
        (self.run)(engine, policy, summary)
    }
}

/// What a run did before it stopped.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub actions: usize,
    pub outcome: Outcome,
    pub log: Vec<String>,
}

impl RunSummary {
    fn record(&mut self, action: String) {
        self.actions += 1;
        self.log.push(action);
    }

    /// The last few actions, newest first.
    pub fn recent_actions(&self) -> String {
        if self.log.is_empty() {
            return "no actions recorded".to_string();
        }
        self.log
            .iter()
            .rev()
            .take(RECENT_ACTIONS)
            .cloned()
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

pub const SCENARIOS: &[Scenario] = &[
    Scenario {
        key: "smoke",
        name: "Smoke Test",
        description: "Every preview leaves state untouched, then one journey and one rest",
        run: smoke,
    },
    Scenario {
        key: "journey",
        name: "Journey Loop",
        description: "Explore and forage until collapse, checking rolled ranges",
        run: journey_loop,
    },
    Scenario {
        key: "harvest",
        name: "Harvest Loop",
        description: "Harvest resource sites with tuned and fallback methods",
        run: harvest_loop,
    },
    Scenario {
        key: "craft",
        name: "Craft Loop",
        description: "Craft unlocked recipes, with and without their inputs",
        run: craft_loop,
    },
    Scenario {
        key: "recover",
        name: "Recover Loop",
        description: "Alternate journeys and rests, reconciling observed recovery",
        run: recover_loop,
    },
    Scenario {
        key: "battle",
        name: "Battle Loop",
        description: "Fight random creatures with random legal moves and settle them",
        run: battle_loop,
    },
];

#[must_use]
pub fn find_scenario(key: &str) -> Option<&'static Scenario> {
    let key = key.trim().to_lowercase();
    SCENARIOS.iter().find(|scenario| scenario.key == key)
}

pub fn list_scenarios() -> impl Iterator<Item = (&'static str, &'static str)> {
    SCENARIOS
        .iter()
        .map(|scenario| (scenario.key, scenario.description))
}

/// Starting player: known kit equipped, a few of every resource and some
/// stored food.
fn starter_state(catalog: &Catalog) -> Result<PlayerState> {
    let mut state = PlayerState::default();
    for &(slot, id) in STARTER_KIT {
        if catalog.item(id).is_some() {
            state
                .equipment
                .equip(catalog, slot, id)
                .with_context(|| format!("equipping starter {id}"))?;
        }
    }
    for id in catalog.resources.keys() {
        stow_fixed(&mut state, catalog, id, STARTER_RESOURCES);
    }
    if let Some((food, _)) = catalog.foods.iter().find(|(_, food)| food.is_storable()) {
        stow_fixed(&mut state, catalog, food, STARTER_FOOD);
    }
    Ok(state)
}

fn check_state(state: &PlayerState) -> Result<()> {
    let stats = &state.stats;
    ensure!(
        state.inventory.is_consistent(),
        "inventory is inconsistent: {:?}",
        state.inventory.stacks()
    );
    ensure!(
        stats.hunger <= stats.max_hunger,
        "hunger {} exceeds {}",
        stats.hunger,
        stats.max_hunger
    );
    ensure!(
        stats.fatigue <= stats.max_fatigue,
        "fatigue {} exceeds {}",
        stats.fatigue,
        stats.max_fatigue
    );
    Ok(())
}

fn pick_mode(policy: &mut ChaCha8Rng) -> JourneyMode {
    if policy.gen_bool(0.5) {
        JourneyMode::Explore
    } else {
        JourneyMode::FindFood
    }
}

fn journey_step(
    engine: &Engine,
    state: &mut PlayerState,
    mode: JourneyMode,
    summary: &mut RunSummary,
) -> Result<()> {
    let preview = engine.preview_journey(state, mode);
    let result = engine.resolve_journey(state, &preview);
    summary.record(format!(
        "journey {} -> {}",
        mode.as_str(),
        result.poi_id.as_deref().unwrap_or("nowhere")
    ));

    ensure!(
        preview.steps.contains(result.steps),
        "steps {} outside {:?}",
        result.steps,
        preview.steps
    );
    ensure!(result.poi_id == preview.poi_id, "destination changed");
    ensure!(result.quality == preview.quality, "quality changed");
    match (preview.forage_periods, result.forage_periods) {
        (Some(range), Some(rolled)) => ensure!(
            range.contains(rolled),
            "forage periods {rolled} outside {range:?}"
        ),
        (None, None) => {}
        (expected, got) => bail!("forage periods {got:?} do not match preview {expected:?}"),
    }
    ensure!(
        result.events.starts_with(&preview.events),
        "surfaced events {:?} were not replayed",
        preview.events
    );
    ensure!(result.outcome == state.outcome(), "stale outcome tag");
    check_state(state)
}

fn rest_step(engine: &Engine, state: &mut PlayerState, summary: &mut RunSummary) -> Result<()> {
    let preview = engine.preview_recover(state);
    let before = state.stats.fatigue;
    let result = engine.resolve_recover(state);
    summary.record(format!("recover {} fatigue", result.fatigue_recovered));

    ensure!(result.periods == preview.periods, "rest length changed");
    ensure!(
        result.fatigue_recovered == before.saturating_sub(state.stats.fatigue),
        "reported recovery {} does not match observed",
        result.fatigue_recovered
    );
    ensure!(
        result.fatigue_recovered <= preview.fatigue_recovered,
        "recovered {} beyond preview {}",
        result.fatigue_recovered,
        preview.fatigue_recovered
    );
    check_state(state)
}

fn smoke(engine: &Engine, _policy: &mut ChaCha8Rng, summary: &mut RunSummary) -> Result<()> {
    let catalog = engine.catalog();
    let mut state = starter_state(catalog)?;
    let snapshot = state.clone();

    for mode in [JourneyMode::Explore, JourneyMode::FindFood] {
        let preview = engine.preview_journey(&state, mode);
        ensure!(
            preview.periods.min >= preview.steps.min,
            "{} preview shorter than its travel",
            mode.as_str()
        );
    }
    for poi_id in catalog.pois.keys() {
        for method in catalog.methods.keys() {
            let preview = engine.preview_harvest(&state, poi_id, method);
            ensure!(
                preview.yield_range.min <= preview.yield_range.max,
                "inverted yield at {poi_id}/{method}"
            );
        }
    }
    for recipe_id in catalog.recipes.keys() {
        ensure!(
            engine.preview_craft(&state, recipe_id).is_some(),
            "recipe {recipe_id} has no preview"
        );
    }
    let rest = engine.preview_recover(&state);
    ensure!(
        rest.fatigue_recovered <= state.stats.fatigue,
        "rest preview recovers more fatigue than the player has"
    );
    for creature_id in catalog.creatures.keys() {
        let battle = engine.start_battle(creature_id)?;
        let moves = engine.available_moves(&battle, &state);
        ensure!(
            moves.last().map(String::as_str) == Some("flee"),
            "flee is not offered against {creature_id}"
        );
    }
    ensure!(state == snapshot, "previews mutated the player");

    journey_step(engine, &mut state, JourneyMode::Explore, summary)?;
    rest_step(engine, &mut state, summary)?;
    summary.outcome = state.outcome();
    Ok(())
}

fn journey_loop(engine: &Engine, policy: &mut ChaCha8Rng, summary: &mut RunSummary) -> Result<()> {
    let mut state = starter_state(engine.catalog())?;
    while state.outcome() == Outcome::Ok && summary.actions < MAX_ACTIONS {
        let mode = pick_mode(policy);
        journey_step(engine, &mut state, mode, summary)?;
    }
    summary.outcome = state.outcome();
    Ok(())
}

fn harvest_loop(engine: &Engine, policy: &mut ChaCha8Rng, summary: &mut RunSummary) -> Result<()> {
    let catalog = engine.catalog();
    let mut state = starter_state(catalog)?;
    let sites: Vec<&String> = catalog
        .pois
        .iter()
        .filter(|(_, poi)| matches!(poi.kind, PoiKind::Resource { .. }))
        .map(|(id, _)| id)
        .collect();
    let methods: Vec<&String> = catalog.methods.keys().collect();
    if sites.is_empty() || methods.is_empty() {
        summary.outcome = state.outcome();
        return Ok(());
    }

    while state.outcome() == Outcome::Ok && summary.actions < MAX_ACTIONS {
        if state.stats.fatigue > REST_THRESHOLD {
            rest_step(engine, &mut state, summary)?;
            continue;
        }
        let Some(poi_id) = sites.choose(policy) else {
            break;
        };
        // Mostly usable methods, sometimes any method to hit the fallback.
        let usable = engine.harvest_methods(&state, poi_id);
        let method = if policy.gen_bool(0.75) && !usable.is_empty() {
            usable[policy.gen_range(0..usable.len())].clone()
        } else {
            methods[policy.gen_range(0..methods.len())].to_string()
        };

        let xp_before = state.xp_for(&method);
        let preview = engine.preview_harvest(&state, poi_id, &method);
        let result = engine.resolve_harvest(&mut state, &preview);
        summary.record(format!(
            "harvest {poi_id}/{method} x{} (fallback {})",
            result.quantity, result.fallback
        ));

        ensure!(
            preview.periods.contains(result.periods),
            "harvest periods {} outside {:?}",
            result.periods,
            preview.periods
        );
        ensure!(
            preview.yield_range.contains(result.quantity),
            "yield {} outside {:?}",
            result.quantity,
            preview.yield_range
        );
        ensure!(
            state.xp_for(&method) == xp_before + result.xp_gained,
            "xp for {method} did not advance by {}",
            result.xp_gained
        );
        check_state(&state)?;
    }
    summary.outcome = state.outcome();
    Ok(())
}

fn craft_loop(engine: &Engine, policy: &mut ChaCha8Rng, summary: &mut RunSummary) -> Result<()> {
    let mut state = starter_state(engine.catalog())?;
    while state.outcome() == Outcome::Ok && summary.actions < MAX_ACTIONS {
        if state.stats.fatigue > REST_THRESHOLD {
            rest_step(engine, &mut state, summary)?;
            continue;
        }
        let recipes = engine.unlocked_recipes(&state);
        let Some(recipe_id) = recipes.choose(policy) else {
            break;
        };
        let preview = engine
            .preview_craft(&state, recipe_id)
            .with_context(|| format!("unlocked recipe {recipe_id} has no preview"))?;
        let snapshot = state.clone();
        let result = engine.resolve_craft(&mut state, &preview);
        summary.record(format!("craft {recipe_id} success {}", result.success));

        if preview.can_afford() {
            ensure!(
                result.consumed.len() == preview.inputs.len(),
                "consumed {:?} for {:?}",
                result.consumed,
                preview.inputs
            );
            if result.outcome == Outcome::Ok {
                ensure!(result.success, "{recipe_id} failed with inputs on hand");
                ensure!(
                    result.produced.as_ref() == Some(&preview.output),
                    "produced {:?}, expected {:?}",
                    result.produced,
                    preview.output
                );
            } else {
                ensure!(result.produced.is_none(), "collapsed craft still produced");
            }
        } else {
            ensure!(
                result.fail_reason == Some(CraftFailure::MissingResources),
                "expected missing resources, got {:?}",
                result.fail_reason
            );
            ensure!(state == snapshot, "failed craft changed the player");
            // Nothing left to craft from; go gather more.
            journey_step(engine, &mut state, pick_mode(policy), summary)?;
        }
        check_state(&state)?;
    }
    summary.outcome = state.outcome();
    Ok(())
}

fn recover_loop(engine: &Engine, policy: &mut ChaCha8Rng, summary: &mut RunSummary) -> Result<()> {
    let mut state = starter_state(engine.catalog())?;
    while state.outcome() == Outcome::Ok && summary.actions < MAX_ACTIONS {
        journey_step(engine, &mut state, pick_mode(policy), summary)?;
        if state.outcome() == Outcome::Ok {
            rest_step(engine, &mut state, summary)?;
        }
    }
    summary.outcome = state.outcome();
    Ok(())
}

fn battle_loop(engine: &Engine, policy: &mut ChaCha8Rng, summary: &mut RunSummary) -> Result<()> {
    let catalog = engine.catalog();
    let mut state = starter_state(catalog)?;
    let creatures: Vec<&String> = catalog.creatures.keys().collect();

    for _ in 0..MAX_BATTLES {
        if state.outcome() != Outcome::Ok {
            break;
        }
        let Some(creature_id) = creatures.choose(policy) else {
            break;
        };
        let mut battle = engine.start_battle(creature_id)?;
        let mut reason = None;
        while battle.turn < MAX_TURNS {
            if let Some(end) = battle.suggested_end(&state) {
                reason = Some(end);
                break;
            }
            let legal = engine.available_moves(&battle, &state);
            let attacks: Vec<&String> = legal.iter().filter(|id| *id != "flee").collect();
            let flee = attacks.is_empty() || policy.gen_bool(FLEE_CHANCE);
            let pick = match attacks.choose(policy) {
                Some(id) if !flee => (*id).clone(),
                _ => String::from("flee"),
            };
            ensure!(legal.contains(&pick), "{pick} is not legal");
            let cost_before = battle.stamina_cost;
            let outcome = engine.execute_move(&mut battle, &state, &pick)?;
            summary.record(format!("{creature_id}: {pick}"));
            match outcome {
                MoveOutcome::Fled => {
                    reason = Some(EndReason::Fled);
                    break;
                }
                MoveOutcome::Landed(report) => ensure!(
                    battle.stamina_cost
                        == cost_before + report.stamina_cost + report.counter_penalty,
                    "stamina cost did not accrue for {pick}"
                ),
            }
        }

        let reason = reason.unwrap_or(EndReason::Yielded);
        let turns = battle.turn;
        let result = engine.resolve_battle(battle, &mut state, reason);
        summary.record(format!("{creature_id} settled {reason:?}"));

        ensure!(result.turns == turns, "settled turns changed");
        ensure!(result.refund <= result.stamina_cost, "refund exceeds cost");
        if reason == EndReason::Fled {
            ensure!(result.corpse_drops.is_empty(), "fleeing dropped loot");
        }
        ensure!(result.outcome == state.outcome(), "stale outcome tag");
        check_state(&state)?;

        if state.outcome() == Outcome::Ok && state.stats.fatigue > REST_THRESHOLD {
            rest_step(engine, &mut state, summary)?;
        }
    }
    summary.outcome = state.outcome();
    Ok(())
}
