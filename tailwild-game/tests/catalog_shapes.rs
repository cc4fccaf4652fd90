use tailwild_game::catalog::{PoiKind, ToolAbility};
use tailwild_game::{
    Bounds, Catalog, CatalogError, EntryKind, EquipSlot, JourneyMode, PlayerState, ScriptedRng, harvest,
    journey,
};

const MINIMAL: &str = r#"{
    "biome": {
        "steps": {"explore": [1, 1], "find_food": [1, 1]},
        "hunger_per_step": 1,
        "fatigue_per_step": 1,
        "forage_hunger_per_period": 1,
        "forage_fatigue_per_period": 1,
        "poi_weights": {
            "explore": [{"id": "pond", "weight": 1}],
            "find_food": [{"id": "pond", "weight": 1}]
        },
        "craft_hunger_per_period": 1,
        "craft_fatigue_per_period": 1,
        "recover_hunger_per_period": 1
    },
    "items": {
        "chomper": {"name": "Chomper", "slot": "tail", "ability": {"kind": "immediate_eat"}}
    },
    "foods": {
        "lily": {"name": "Lily", "restore": 3}
    },
    "pois": {
        "pond": {"name": "Pond", "kind": "food", "forage_periods": [2, 2], "instant_food": "lily"}
    }
}"#;

#[test]
fn bundled_catalog_is_consistent() {
    let catalog = Catalog::load_from_static();
    catalog.validate().unwrap();
    for id in catalog.resources.keys() {
        assert_eq!(catalog.kind_of(id), Some(EntryKind::Resource));
    }
    for (id, poi) in &catalog.pois {
        if let PoiKind::Resource { harvest, .. } = &poi.kind {
            assert!(!harvest.is_empty(), "{id} has no harvest tuning");
        }
    }
    let scoops = catalog
        .items
        .values()
        .filter(|item| item.ability == Some(ToolAbility::Scoop))
        .count();
    assert_eq!(scoops, 1);
}

#[test]
fn alternate_catalogs_drive_the_same_resolvers() {
    let catalog = Catalog::from_json(MINIMAL).unwrap();
    catalog.validate().unwrap();
    let mut state = PlayerState::default();
    state
        .equipment
        .equip(&catalog, EquipSlot::TailLeft, "chomper")
        .unwrap();
    state.stats.hunger = 10;

    let mut rng = ScriptedRng::default();
    let preview = journey::preview(&state, &catalog, JourneyMode::Explore, &mut rng);
    assert_eq!(preview.poi_id.as_deref(), Some("pond"));
    assert_eq!(preview.periods.min, 3);
    let result = journey::resolve(&mut state, &catalog, &preview, &mut rng);
    // 10 + 1 travel + 2 forage - 3 lily
    assert_eq!(state.stats.hunger, 10);
    assert_eq!(result.eaten[0].food_id, "lily");
    assert_eq!(result.events.as_slice(), ["missing_scoop"]);

    let fallback = harvest::preview(&state, &catalog, "pond", "tear");
    assert!(fallback.fallback);
}

#[test]
fn validation_catches_bad_references() {
    let mut catalog = Catalog::from_json(MINIMAL).unwrap();
    catalog.pois.get_mut("pond").unwrap().kind = PoiKind::Food {
        forage_periods: Bounds::new(1, 2),
        instant_food: String::from("chomper"),
    };
    assert!(matches!(
        catalog.validate(),
        Err(CatalogError::WrongKind { ref id, .. }) if id == "chomper"
    ));
}

#[test]
fn probabilities_outside_unit_range_are_rejected() {
    let mut catalog = Catalog::from_json(MINIMAL).unwrap();
    catalog.biome.rare_quality_chance = 1.5;
    assert!(matches!(
        catalog.validate(),
        Err(CatalogError::Probability { .. })
    ));
}

#[test]
fn malformed_json_is_a_parse_error() {
    assert!(matches!(
        Catalog::from_json("[]"),
        Err(CatalogError::Parse(_))
    ));
}
