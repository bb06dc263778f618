//! Unit tests for roster normalization and ledger parsing

use battle_stats_etl::coerce;
use battle_stats_etl::pipeline::parse_ledger;
use battle_stats_etl::{Battle, RosterRecord};
use serde_json::json;

#[test]
fn test_unparsable_stats_become_zero() {
    let record = RosterRecord::from_value(&json!({
        "id": 10,
        "name": "Caterpie",
        "hp": "forty-five",
        "attack": null,
        "defense": "35",
        "sp_attack": [],
        "sp_defense": "NaN",
        "speed": 45.5,
    }));

    assert_eq!(record.hp, 0.0);
    assert_eq!(record.attack, 0.0);
    assert_eq!(record.defense, 35.0);
    assert_eq!(record.sp_attack, 0.0);
    assert_eq!(record.sp_defense, 0.0);
    assert_eq!(record.speed, 45.5);
}

#[test]
fn test_types_from_objects_and_columns() {
    let from_objects = RosterRecord::from_value(&json!({
        "id": 6,
        "types": [{"name": "fire"}, {"name": "flying"}],
    }));
    assert_eq!(from_objects.types, "fire/flying");

    let from_columns = RosterRecord::from_value(&json!({
        "id": 1,
        "type_1": "grass",
        "type_2": "poison",
    }));
    assert_eq!(from_columns.types, "grass/poison");
}

#[test]
fn test_legendary_flag_variants() {
    for (raw, expected) in [
        (json!(true), true),
        (json!("True"), true),
        (json!(1), true),
        (json!("no"), false),
        (json!(0), false),
    ] {
        let record = RosterRecord::from_value(&json!({"id": 150, "legendary": raw}));
        assert_eq!(record.legendary, expected, "legendary = {raw}");
    }
}

#[test]
fn test_missing_id_is_kept() {
    let record = RosterRecord::from_value(&json!({"name": "Unknown"}));

    assert_eq!(record.id, None);
    assert_eq!(record.name, "Unknown");
}

#[test]
fn test_coerce_id_accepts_integral_floats_only() {
    assert_eq!(coerce::id(&json!(12)), Some(12));
    assert_eq!(coerce::id(&json!("12")), Some(12));
    assert_eq!(coerce::id(&json!(12.0)), Some(12));
    assert_eq!(coerce::id(&json!("12.0")), Some(12));
    assert_eq!(coerce::id(&json!(12.5)), None);
    assert_eq!(coerce::id(&json!("abc")), None);
    assert_eq!(coerce::id(&json!(true)), None);
}

#[test]
fn test_parse_ledger_counts_dropped_rows() {
    let rows = vec![
        json!({"first_pokemon": 1, "second_pokemon": 2, "winner": 2}),
        json!({"first_pokemon": 1, "winner": 1}),
        json!({"first_pokemon": "x", "second_pokemon": 2, "winner": 2}),
        json!("not an object"),
    ];

    let (battles, dropped) = parse_ledger(&rows);

    assert_eq!(battles, vec![Battle::new(1, 2, 2)]);
    assert_eq!(dropped, 3);
}
