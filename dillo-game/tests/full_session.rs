use dillo_game::constants::{COST_FOOD, ITEM_FOOD, ITEM_TOY};
use dillo_game::{
    FarmConfig, FarmSession, GameEngine, GameState, GameStorage, JobStatus, JsonFileStorage,
    PersistError, Sex, StartKind,
};
use std::fs;
use std::path::PathBuf;

fn seeded(seed: u64) -> GameState {
    let mut state = GameState::with_seed(seed);
    state.seed_starters();
    state
}

fn scratch_save(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("dillo-session-{tag}-{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    dir.join("save.json")
}

#[test]
fn fresh_game_matches_new_farm_layout() {
    let state = seeded(1);
    assert_eq!(state.coins(), 100);
    assert_eq!(state.inventory_count(ITEM_FOOD), 3);
    assert_eq!(state.inventory_count(ITEM_TOY), 1);
    assert_eq!(state.inventory().len(), 2);
    assert_eq!(state.armadillos().len(), 3);
    assert!(state.armadillos().iter().all(|d| d.is_adult()));
    assert_eq!(state.dex_colors().len(), 3);
    for color in ["Brown", "Albino", "Blue"] {
        assert!(state.dex_colors().contains(color));
    }
    assert_eq!(state.habitats().len(), 3);
    for habitat in state.habitats() {
        assert_eq!(habitat.capacity(), 2);
        assert!(habitat.occupants().is_empty());
    }
}

#[test]
fn shopping_respects_balance() {
    let mut state = seeded(2);
    assert!(state.buy(ITEM_FOOD, COST_FOOD));
    assert_eq!(state.coins(), 95);
    assert_eq!(state.inventory_count(ITEM_FOOD), 4);

    state.add_coins(-92);
    assert_eq!(state.coins(), 3);
    let before = state.to_document();
    assert!(!state.buy(ITEM_FOOD, COST_FOOD));
    assert_eq!(state.to_document(), before);
}

#[test]
fn breeding_pair_hatches_after_incubation() {
    let mut state = seeded(3);
    let dad = state
        .adults()
        .into_iter()
        .find(|d| d.sex() == Sex::Male)
        .map(|d| d.id().to_string())
        .unwrap();
    let mom = state
        .adults()
        .into_iter()
        .find(|d| d.sex() == Sex::Female)
        .map(|d| d.id().to_string())
        .unwrap();
    assert!(state.select(Some(&dad)));

    let job = state.start_breeding(&dad, &mom, 30).unwrap();
    assert_eq!(job.status(), JobStatus::Incubating);
    assert_eq!(state.breeding_queue().len(), 1);

    let start = 1_700_000_000.0;
    assert!(state.breeding_tick(start).is_empty());
    let dex_before = state.dex_colors().clone();
    let newborns = state.breeding_tick(start + 30.0);

    assert!(state.breeding_queue().is_empty());
    assert_eq!(newborns.len(), 1);
    let baby = &newborns[0];
    assert_eq!(baby.age_days(), 0);
    assert_eq!(baby.hunger(), 60);
    assert_eq!(baby.happiness(), 60);
    assert!(baby.is_baby());
    assert_eq!(state.armadillos().len(), 4);
    assert_eq!(state.armadillos().last(), Some(baby));
    assert!(state.dex_colors().contains(baby.color()));
    assert!(state.dex_colors().len() >= dex_before.len());
}

#[test]
fn moving_between_habitats_respects_capacity() {
    let mut state = seeded(4);
    for id in ["d1", "d2"] {
        assert!(state.select(Some(id)));
        assert!(state.move_selected_to_habitat("h1"));
    }
    assert!(state.select(Some("d3")));
    assert!(state.move_selected_to_habitat("h2"));

    let full = state.habitat("h1").unwrap().occupants().to_vec();
    assert!(!state.move_selected_to_habitat("h1"));
    assert_eq!(state.habitat("h1").unwrap().occupants(), full.as_slice());
    assert_eq!(state.habitat_of("d3").unwrap().id(), "h2");

    assert!(state.select(Some("d1")));
    assert!(state.move_selected_to_habitat("h3"));
    assert_eq!(state.habitat("h1").unwrap().occupants().len(), 1);
    assert_eq!(state.habitat("h3").unwrap().occupants(), ["d1"]);
    let housed: usize = state.habitats().iter().map(|h| h.occupants().len()).sum();
    assert_eq!(housed, 3);
}

#[test]
fn broken_save_reseeds_then_reloads_cleanly() {
    let path = scratch_save("reload");
    let engine = GameEngine::new(JsonFileStorage::new(&path));

    let mut state = seeded(5);
    assert!(state.buy(ITEM_FOOD, COST_FOOD));
    engine.save(&state).unwrap();

    fs::write(&path, "{\"coins\": 10, \"habitats\": [{\"id\": 3}]}").unwrap();
    let mut reloaded = GameState::with_seed(6);
    assert!(matches!(
        engine.load_into(&mut reloaded),
        Err(PersistError::Parse(_))
    ));
    assert_eq!(engine.load_or_seed(&mut reloaded), StartKind::Seeded);
    assert_eq!(reloaded.coins(), 100);

    engine.storage().delete_save().unwrap();
    assert!(matches!(
        engine.load_into(&mut reloaded),
        Err(PersistError::NotFound(_))
    ));

    assert!(state.select(Some("d2")));
    state.start_breeding("d1", "d2", 45).unwrap();
    state.breeding_tick(20.0);
    engine.save(&state).unwrap();
    let mut clean = GameState::with_seed(7);
    engine.load_into(&mut clean).unwrap();
    assert_eq!(clean.to_document(), state.to_document());
    assert_eq!(clean.get_selected(), state.get_selected());
    assert_eq!(clean.breeding_queue(), state.breeding_queue());

    let _ = fs::remove_dir_all(path.parent().unwrap());
}

#[test]
fn session_survives_restart_through_files() {
    let path = scratch_save("restart");
    let config = FarmConfig {
        save_path: path.clone(),
        ..FarmConfig::default()
    };

    let mut session = FarmSession::new(
        JsonFileStorage::new(&config.save_path),
        config.clone(),
        GameState::with_seed(8),
    )
    .unwrap();
    assert_eq!(session.start(), StartKind::Seeded);
    assert!(path.exists());
    session.state_mut().start_breeding("d3", "d2", 10).unwrap();
    session.tick(500.0);
    let report = session.tick(510.0);
    assert!(report.hatched());
    assert_eq!(session.state().coins(), 112);
    assert!(session.on_pause());

    let mut resumed = FarmSession::new(
        JsonFileStorage::new(&config.save_path),
        config,
        GameState::with_seed(9),
    )
    .unwrap();
    assert_eq!(resumed.start(), StartKind::Loaded);
    assert_eq!(resumed.state().coins(), 112);
    assert_eq!(resumed.state().armadillos().len(), 4);
    assert_eq!(resumed.state().now_ts(), Some(510.0));

    let _ = fs::remove_dir_all(path.parent().unwrap());
}
