//! Dillo Farm Game Engine
//!
//! Platform-agnostic simulation core for the Dillo Farm pet-breeding game.
//! This crate owns the armadillos, habitats, economy and timed breeding jobs,
//! plus the JSON save contract. Presentation layers drive it through
//! [`GameState`] commands and observers, or through a [`FarmSession`].

pub mod armadillo;
pub mod breeding;
pub mod config;
pub mod constants;
pub mod habitat;
pub mod numbers;
pub mod observers;
pub mod persistence;
pub mod session;
pub mod state;

use log::{info, warn};

// Re-export commonly used types
pub use armadillo::{Armadillo, ArmadilloError, ArmadilloRecord, LifeStage, Sex};
pub use breeding::{
    BreedingError, BreedingJob, BreedingJobRecord, JobStatus, Phenotype, combine_genes,
    hatch_result, make_baby_name,
};
pub use config::{ConfigError, FarmConfig};
pub use habitat::{Habitat, HabitatError, HabitatRecord};
pub use observers::{ObserverId, ObserverRegistry, StateObserver};
pub use persistence::{JsonFileStorage, MemoryStorage, PersistError};
pub use session::{FarmSession, TickReport};
pub use state::{GameState, SaveDocument};

/// Trait for abstracting save/load operations.
/// Platform-specific implementations should provide this.
pub trait GameStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Persist the whole document, replacing any previous save.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be written.
    fn save_game(&self, document: &SaveDocument) -> Result<(), Self::Error>;

    /// Read back the last saved document.
    ///
    /// # Errors
    ///
    /// Returns an error if no save exists or it fails to parse or validate.
    fn load_game(&self) -> Result<SaveDocument, Self::Error>;

    /// Remove the save. Deleting a missing save succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the save exists but cannot be removed.
    fn delete_save(&self) -> Result<(), Self::Error>;
}

/// How a session obtained its starting state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartKind {
    Loaded,
    Seeded,
}

/// Main game engine binding a store to its storage backend
#[derive(Debug)]
pub struct GameEngine<S: GameStorage> {
    storage: S,
}

impl<S: GameStorage> GameEngine<S> {
    pub const fn new(storage: S) -> Self {
        Self { storage }
    }

    pub const fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Save a snapshot of `state`.
    ///
    /// # Errors
    ///
    /// Returns the storage error if the write fails.
    pub fn save(&self, state: &GameState) -> Result<(), S::Error> {
        self.storage.save_game(&state.to_document())
    }

    /// Replace `state` with the saved document. `state` is untouched on error.
    ///
    /// # Errors
    ///
    /// Returns the storage error if the save is missing or invalid.
    pub fn load_into(&self, state: &mut GameState) -> Result<(), S::Error> {
        let document = self.storage.load_game()?;
        state.restore(document);
        Ok(())
    }

    /// Load the saved game, seeding a fresh farm when that fails.
    pub fn load_or_seed(&self, state: &mut GameState) -> StartKind {
        match self.load_into(state) {
            Ok(()) => {
                info!("loaded saved farm");
                StartKind::Loaded
            }
            Err(err) => {
                warn!("no usable save ({err}); starting a new farm");
                state.seed_starters();
                StartKind::Seeded
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_failure_leaves_state_untouched() {
        let engine = GameEngine::new(MemoryStorage::new());
        let mut state = GameState::with_seed(5);
        state.seed_starters();
        let before = state.to_document();

        engine.storage().overwrite("{\"coins\": \"lots\"}");
        assert!(engine.load_into(&mut state).is_err());
        assert_eq!(state.to_document(), before);
    }

    #[test]
    fn load_or_seed_prefers_existing_save() {
        let engine = GameEngine::new(MemoryStorage::new());
        let mut state = GameState::with_seed(5);
        assert_eq!(engine.load_or_seed(&mut state), StartKind::Seeded);
        state.add_coins(7);
        engine.save(&state).unwrap();

        let mut fresh = GameState::with_seed(6);
        assert_eq!(engine.load_or_seed(&mut fresh), StartKind::Loaded);
        assert_eq!(fresh.coins(), 107);
    }
}
