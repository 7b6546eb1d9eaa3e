//! Session lifecycle: startup, periodic ticks, debounced autosave and the
//! hatch reward.
use log::{debug, info, warn};
use std::cell::Cell;
use std::rc::Rc;

use crate::armadillo::Armadillo;
use crate::config::{ConfigError, FarmConfig};
use crate::constants::META_FIRST_RUN;
use crate::persistence::JsonFileStorage;
use crate::state::GameState;
use crate::{GameEngine, GameStorage, StartKind};

/// What happened during one [`FarmSession::tick`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub newborns: Vec<Armadillo>,
    pub coins_awarded: u32,
    pub saved: bool,
}

impl TickReport {
    #[must_use]
    pub fn hatched(&self) -> bool {
        !self.newborns.is_empty()
    }
}

/// Owns the store and its storage for the lifetime of a play session.
///
/// Any observed mutation marks the session dirty. The next tick arms an
/// autosave deadline `autosave_delay_s` later; further mutations before the
/// deadline fold into that single save.
#[derive(Debug)]
pub struct FarmSession<S: GameStorage> {
    engine: GameEngine<S>,
    state: GameState,
    config: FarmConfig,
    dirty: Rc<Cell<bool>>,
    autosave_due: Option<f64>,
    saves: u32,
}

impl<S: GameStorage> FarmSession<S> {
    /// Wrap `state` and `storage` using the validated `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the config does not validate.
    pub fn new(storage: S, config: FarmConfig, state: GameState) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut state = state
            .with_mutation_chance(config.mutation_chance)
            .map_err(|_| ConfigError::MutationChanceOutOfRange(config.mutation_chance))?;
        let dirty = Rc::new(Cell::new(false));
        let flag = Rc::clone(&dirty);
        state.add_observer(move |_: &GameState| -> anyhow::Result<()> {
            flag.set(true);
            Ok(())
        });
        Ok(Self {
            engine: GameEngine::new(storage),
            state,
            config,
            dirty,
            autosave_due: None,
            saves: 0,
        })
    }

    /// Load the saved farm, or seed and immediately save a new one.
    pub fn start(&mut self) -> StartKind {
        let kind = self.engine.load_or_seed(&mut self.state);
        match kind {
            StartKind::Loaded => {
                self.state.set_meta(META_FIRST_RUN, false);
                self.clear_pending();
                info!("resumed saved farm");
            }
            StartKind::Seeded => {
                self.state.set_meta(META_FIRST_RUN, true);
                self.save_now();
            }
        }
        kind
    }

    /// Advance breeding to `now`, pay for newborns and run the autosave.
    pub fn tick(&mut self, now: f64) -> TickReport {
        let newborns = self.state.breeding_tick(now);
        let count = u32::try_from(newborns.len()).unwrap_or(u32::MAX);
        let coins_awarded = self.config.hatch_reward.saturating_mul(count);
        if coins_awarded > 0 {
            self.state.add_coins(i64::from(coins_awarded));
        }
        let saved = self.poll_autosave(now);
        TickReport {
            newborns,
            coins_awarded,
            saved,
        }
    }

    fn poll_autosave(&mut self, now: f64) -> bool {
        if self.dirty.replace(false) && self.autosave_due.is_none() {
            self.autosave_due = Some(now + self.config.autosave_delay_s);
            debug!("autosave armed for {now}+{}", self.config.autosave_delay_s);
        }
        match self.autosave_due {
            Some(due) if now >= due => self.save_now(),
            _ => false,
        }
    }

    /// Host went to background.
    pub fn on_pause(&mut self) -> bool {
        self.save_now()
    }

    /// Host is shutting down.
    pub fn on_stop(&mut self) -> bool {
        self.save_now()
    }

    /// Save synchronously. Failures are logged and reported as `false`.
    pub fn save_now(&mut self) -> bool {
        match self.engine.save(&self.state) {
            Ok(()) => {
                self.saves += 1;
                self.clear_pending();
                true
            }
            Err(err) => {
                warn!("save failed: {err}");
                false
            }
        }
    }

    fn clear_pending(&mut self) {
        self.dirty.set(false);
        self.autosave_due = None;
    }

    #[must_use]
    pub const fn state(&self) -> &GameState {
        &self.state
    }

    /// Mutable access for issuing commands.
    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    #[must_use]
    pub const fn config(&self) -> &FarmConfig {
        &self.config
    }

    #[must_use]
    pub const fn engine(&self) -> &GameEngine<S> {
        &self.engine
    }

    #[must_use]
    pub fn storage(&self) -> &S {
        self.engine.storage()
    }

    /// Deadline of the armed autosave, if any.
    #[must_use]
    pub const fn pending_autosave(&self) -> Option<f64> {
        self.autosave_due
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty.get() || self.autosave_due.is_some()
    }

    #[must_use]
    pub const fn save_count(&self) -> u32 {
        self.saves
    }

    #[must_use]
    pub fn is_first_run(&self) -> bool {
        self.state
            .meta()
            .get(META_FIRST_RUN)
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false)
    }
}

impl FarmSession<JsonFileStorage> {
    /// Session saving to `config.save_path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the config does not validate.
    pub fn open(config: FarmConfig, state: GameState) -> Result<Self, ConfigError> {
        let storage = JsonFileStorage::new(config.save_path.clone());
        Self::new(storage, config, state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{COST_FOOD, ITEM_FOOD};
    use crate::persistence::MemoryStorage;

    fn session() -> FarmSession<MemoryStorage> {
        FarmSession::new(
            MemoryStorage::new(),
            FarmConfig::default(),
            GameState::with_seed(11),
        )
        .unwrap()
    }

    #[test]
    fn first_start_seeds_and_saves() {
        let mut session = session();
        assert_eq!(session.start(), StartKind::Seeded);
        assert!(session.is_first_run());
        assert_eq!(session.save_count(), 1);
        assert!(!session.is_dirty());
        assert!(session.storage().contents().is_some());
    }

    #[test]
    fn second_start_loads_existing_save() {
        let mut first = session();
        first.start();
        assert!(first.state_mut().buy(ITEM_FOOD, COST_FOOD));
        assert!(first.on_stop());

        let saved = first.storage().contents().unwrap();
        let storage = MemoryStorage::new();
        storage.overwrite(saved);
        let mut second =
            FarmSession::new(storage, FarmConfig::default(), GameState::with_seed(12)).unwrap();
        assert_eq!(second.start(), StartKind::Loaded);
        assert!(!second.is_first_run());
        assert_eq!(second.state().coins(), 95);
        assert_eq!(second.save_count(), 0);
    }

    #[test]
    fn autosave_is_debounced_and_coalesced() {
        let mut session = session();
        session.start();
        assert!(session.state_mut().buy(ITEM_FOOD, COST_FOOD));
        assert!(session.state_mut().select(Some("d1")));

        assert!(!session.tick(10.0).saved);
        assert_eq!(session.pending_autosave(), Some(10.6));
        assert!(session.state_mut().pet_selected());
        assert!(!session.tick(10.25).saved);
        assert_eq!(session.pending_autosave(), Some(10.6));

        assert!(session.tick(10.75).saved);
        assert_eq!(session.save_count(), 2);
        assert!(!session.is_dirty());
        assert!(!session.tick(11.0).saved);
        assert_eq!(session.save_count(), 2);
    }

    #[test]
    fn hatching_pays_reward_per_newborn() {
        let mut session = session();
        session.start();
        session.state_mut().start_breeding("d1", "d2", 30).unwrap();
        session.state_mut().start_breeding("d3", "d2", 30).unwrap();
        session.tick(100.0);
        let report = session.tick(130.0);
        assert_eq!(report.newborns.len(), 2);
        assert_eq!(report.coins_awarded, 24);
        assert_eq!(session.state().coins(), 124);
    }

    #[test]
    fn open_saves_under_the_configured_directory() {
        let dir = std::env::temp_dir().join(format!("dillo-open-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        let config = FarmConfig::default().with_save_dir_override(dir.to_str());
        let mut session = FarmSession::open(config, GameState::with_seed(4)).unwrap();
        assert_eq!(session.start(), StartKind::Seeded);

        let expected = dir.join(crate::constants::SAVE_FILE_NAME);
        assert_eq!(session.storage().path(), expected.as_path());
        assert!(expected.exists());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = FarmConfig {
            autosave_delay_s: 0.0,
            ..FarmConfig::default()
        };
        assert!(FarmSession::new(MemoryStorage::new(), config, GameState::with_seed(1)).is_err());
    }
}
