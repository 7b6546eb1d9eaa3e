use anyhow::{Result, ensure};
use dillo_game::constants::ADULT_AGE_DAYS;
use dillo_game::{FarmConfig, FarmSession, GameState, MemoryStorage};
use std::collections::HashSet;
use std::path::PathBuf;

pub mod breeding;
pub mod campaign;
pub mod care;
pub mod habitats;
pub mod persistence;
pub mod smoke;

/// Inputs shared by every scenario run.
#[derive(Debug, Clone)]
pub struct ScenarioCtx {
    pub seed: u64,
    pub save_base: PathBuf,
    pub verbose: bool,
}

impl ScenarioCtx {
    /// Fresh starter farm with the context seed.
    #[must_use]
    pub fn seeded_state(&self) -> GameState {
        let mut state = GameState::with_seed(self.seed);
        state.seed_starters();
        state
    }

    /// Session backed by in-memory storage, already started.
    pub fn memory_session(&self) -> Result<FarmSession<MemoryStorage>> {
        let mut session = FarmSession::new(
            MemoryStorage::new(),
            FarmConfig::default(),
            GameState::with_seed(self.seed),
        )?;
        session.start();
        Ok(session)
    }

    pub fn log(&self, message: impl AsRef<str>) {
        if self.verbose {
            println!("    {}", message.as_ref());
        }
    }
}

pub type ScenarioFn = fn(&ScenarioCtx) -> Result<()>;

// Logic test scenario
#[derive(Debug, Clone)]
pub struct TestScenario {
    pub key: &'static str,
    pub name: &'static str,
    pub run: ScenarioFn,
}

impl TestScenario {
    #[must_use]
    pub const fn new(key: &'static str, name: &'static str, run: ScenarioFn) -> Self {
        Self { key, name, run }
    }
}

pub fn catalog() -> Vec<TestScenario> {
    vec![
        TestScenario::new("smoke", "Smoke Test", smoke::run),
        TestScenario::new("care", "Feeding and Petting", care::run),
        TestScenario::new("breeding", "Breeding and Hatching", breeding::run),
        TestScenario::new("habitats", "Habitat Moves and Upgrades", habitats::run),
        TestScenario::new("persistence", "Save, Corrupt and Reload", persistence::run),
        TestScenario::new("campaign", "Randomized Campaign", campaign::run),
    ]
}

pub fn get_scenario(name: &str) -> Option<TestScenario> {
    let key = match name.to_lowercase().as_str() {
        "smoke" | "new-game" => "smoke",
        "care" | "feeding" => "care",
        "breeding" | "hatch" => "breeding",
        "habitats" | "habitat" | "moves" => "habitats",
        "persistence" | "save" => "persistence",
        "campaign" | "random" => "campaign",
        _ => return None,
    };
    catalog().into_iter().find(|scenario| scenario.key == key)
}

pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    catalog()
        .into_iter()
        .map(|scenario| (scenario.key, scenario.name))
        .collect()
}

/// Every structural rule the store promises to keep.
pub fn check_invariants(state: &GameState) -> Result<()> {
    let ids: HashSet<&str> = state.armadillos().iter().map(|d| d.id()).collect();
    ensure!(
        ids.len() == state.armadillos().len(),
        "armadillo ids must be unique"
    );

    let mut housed = HashSet::new();
    for habitat in state.habitats() {
        ensure!(
            habitat.occupants().len() <= habitat.capacity() as usize,
            "{} holds {} occupants over capacity {}",
            habitat.id(),
            habitat.occupants().len(),
            habitat.capacity()
        );
        for occupant in habitat.occupants() {
            ensure!(
                ids.contains(occupant.as_str()),
                "{} references missing armadillo {occupant}",
                habitat.id()
            );
            ensure!(housed.insert(occupant), "{occupant} is housed twice");
        }
    }

    if let Some(selected) = state.selected_id() {
        ensure!(ids.contains(selected), "selection {selected} does not exist");
    }

    for dillo in state.armadillos() {
        ensure!(
            dillo.hunger() <= 100 && dillo.happiness() <= 100,
            "{} has meters out of range",
            dillo.id()
        );
        ensure!(
            dillo.is_adult() == (dillo.age_days() >= ADULT_AGE_DAYS),
            "{} has a stale life stage",
            dillo.id()
        );
        ensure!(
            state.dex_colors().contains(dillo.color()),
            "{} color {} missing from dex",
            dillo.id(),
            dillo.color()
        );
    }
    Ok(())
}
