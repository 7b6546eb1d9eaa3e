use dillo_game::{Armadillo, BreedingJob, GameState, Habitat, SaveDocument};
use serde_json::{Value, json};
use std::collections::BTreeSet;

fn keys(value: &Value) -> BTreeSet<&str> {
    value
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect()
}

fn busy_state() -> GameState {
    let mut state = GameState::with_seed(21);
    state.seed_starters();
    assert!(state.select(Some("d2")));
    assert!(state.move_selected_to_habitat("h1"));
    state.start_breeding("d1", "d2", 40).unwrap();
    state.breeding_tick(1_234.5);
    state
}

#[test]
fn save_document_has_exact_top_level_keys() {
    let value = serde_json::to_value(busy_state().to_document()).unwrap();
    assert_eq!(
        keys(&value),
        BTreeSet::from([
            "coins",
            "inventory",
            "armadillos",
            "habitats",
            "breeding_queue",
            "dex_colors",
            "selected_id",
            "meta",
        ])
    );
    assert_eq!(value["coins"], json!(100));
    assert_eq!(value["inventory"], json!({"food": 3, "toy": 1}));
    assert_eq!(value["dex_colors"], json!(["Albino", "Blue", "Brown"]));
    assert_eq!(value["selected_id"], json!("d2"));
    assert_eq!(value["meta"]["now_ts"], json!(1_234.5));
}

#[test]
fn entity_records_have_exact_keys() {
    let value = serde_json::to_value(busy_state().to_document()).unwrap();
    assert_eq!(
        keys(&value["armadillos"][0]),
        BTreeSet::from([
            "id",
            "name",
            "sex",
            "age_days",
            "hunger",
            "happiness",
            "genes",
            "color",
            "is_baby",
            "is_adult",
        ])
    );
    assert_eq!(
        keys(&value["habitats"][0]),
        BTreeSet::from([
            "id",
            "name",
            "level",
            "capacity",
            "occupants",
            "hatch_boost_pct",
        ])
    );
    assert_eq!(
        keys(&value["breeding_queue"][0]),
        BTreeSet::from([
            "id",
            "parent_m_id",
            "parent_f_id",
            "start_ts",
            "duration_s",
            "status",
            "result",
        ])
    );
}

#[test]
fn entity_values_use_documented_encodings() {
    let value = serde_json::to_value(busy_state().to_document()).unwrap();
    assert_eq!(
        value["armadillos"][1],
        json!({
            "id": "d2",
            "name": "Mochi",
            "sex": "F",
            "age_days": 14,
            "hunger": 65,
            "happiness": 75,
            "genes": {"color": "aa"},
            "color": "Albino",
            "is_baby": false,
            "is_adult": true
        })
    );
    assert_eq!(value["habitats"][0]["occupants"], json!(["d2"]));
    let job = &value["breeding_queue"][0];
    assert_eq!(job["status"], json!("incubating"));
    assert_eq!(job["result"], Value::Null);
    assert_eq!(job["start_ts"], json!(1_234.5));
    assert_eq!(job["duration_s"], json!(40));
}

#[test]
fn documents_from_other_writers_load() {
    let text = json!({
        "coins": 7,
        "inventory": {"food": 0},
        "armadillos": [{
            "id": "x1", "name": "Tango", "sex": "M", "age_days": 3,
            "hunger": 240, "happiness": -5, "genes": {"color": "AB"},
            "color": "Blue", "is_baby": false, "is_adult": true
        }],
        "habitats": [{"id": "h1", "name": "Cave", "level": 2, "capacity": 1}],
        "breeding_queue": [],
        "dex_colors": ["Blue", "Blue"],
        "selected_id": null,
        "meta": {"note": "hand edited"}
    })
    .to_string();

    let document = SaveDocument::from_json(&text).unwrap();
    let dillo = &document.armadillos[0];
    assert!(dillo.is_baby());
    assert_eq!((dillo.hunger(), dillo.happiness()), (100, 0));
    assert_eq!(document.dex_colors.len(), 1);
    assert_eq!(document.meta["note"], json!("hand edited"));
}

#[test]
fn entity_records_reject_invalid_values() {
    let bad_sex = json!({
        "id": "x", "name": "X", "sex": "Q", "age_days": 1, "hunger": 1,
        "happiness": 1, "genes": {}, "color": "Brown"
    });
    assert!(serde_json::from_value::<Armadillo>(bad_sex).is_err());

    let bad_level = json!({"id": "h", "name": "H", "level": 0, "capacity": 1});
    assert!(serde_json::from_value::<Habitat>(bad_level).is_err());

    let bad_duration = json!({
        "id": "b1", "parent_m_id": "d1", "parent_f_id": "d2",
        "start_ts": 0.0, "duration_s": 0, "status": "incubating"
    });
    assert!(serde_json::from_value::<BreedingJob>(bad_duration).is_err());

    let bad_status = json!({
        "id": "b1", "parent_m_id": "d1", "parent_f_id": "d2",
        "start_ts": 0.0, "duration_s": 5, "status": "hatching"
    });
    assert!(serde_json::from_value::<BreedingJob>(bad_status).is_err());
}
