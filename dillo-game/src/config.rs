//! Runtime configuration for a farm session.
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::constants::{
    AUTOSAVE_DELAY_S, DEFAULT_SAVE_DIR, HATCH_MUTATION_CHANCE, REWARD_HATCH, SAVE_DIR_ENV_VAR,
    SAVE_FILE_NAME, TICK_INTERVAL_S,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{field} must be a positive number of seconds (got {value})")]
    NonPositiveInterval { field: &'static str, value: f64 },
    #[error("mutation_chance must be between 0 and 1 inclusive (got {0})")]
    MutationChanceOutOfRange(f64),
}

/// Session tuning. Every field may be omitted from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FarmConfig {
    #[serde(default = "default_save_path")]
    pub save_path: PathBuf,
    /// Quiet period after a mutation before the autosave fires.
    #[serde(default = "default_autosave_delay")]
    pub autosave_delay_s: f64,
    /// Expected spacing of host ticks.
    #[serde(default = "default_tick_interval")]
    pub tick_interval_s: f64,
    /// Coins paid per newborn.
    #[serde(default = "default_hatch_reward")]
    pub hatch_reward: u32,
    #[serde(default = "default_mutation_chance")]
    pub mutation_chance: f64,
}

impl Default for FarmConfig {
    fn default() -> Self {
        Self {
            save_path: default_save_path(),
            autosave_delay_s: default_autosave_delay(),
            tick_interval_s: default_tick_interval(),
            hatch_reward: default_hatch_reward(),
            mutation_chance: default_mutation_chance(),
        }
    }
}

impl FarmConfig {
    /// Parse and validate a JSON config.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for malformed JSON or out-of-range values.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults, with the save directory taken from `DILLO_SAVE_DIR` when set.
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().with_save_dir_override(std::env::var(SAVE_DIR_ENV_VAR).ok().as_deref())
    }

    /// Point the save file into `dir` when one is given and non-blank.
    #[must_use]
    pub fn with_save_dir_override(mut self, dir: Option<&str>) -> Self {
        if let Some(dir) = dir.map(str::trim).filter(|d| !d.is_empty()) {
            self.save_path = Path::new(dir).join(SAVE_FILE_NAME);
        }
        self
    }

    /// # Errors
    ///
    /// Returns [`ConfigError`] when an interval is not positive or the
    /// mutation chance lies outside `[0, 1]`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("autosave_delay_s", self.autosave_delay_s),
            ("tick_interval_s", self.tick_interval_s),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NonPositiveInterval { field, value });
            }
        }
        if !(0.0..=1.0).contains(&self.mutation_chance) {
            return Err(ConfigError::MutationChanceOutOfRange(self.mutation_chance));
        }
        Ok(())
    }
}

fn default_save_path() -> PathBuf {
    Path::new(".").join(DEFAULT_SAVE_DIR).join(SAVE_FILE_NAME)
}

const fn default_autosave_delay() -> f64 {
    AUTOSAVE_DELAY_S
}

const fn default_tick_interval() -> f64 {
    TICK_INTERVAL_S
}

const fn default_hatch_reward() -> u32 {
    REWARD_HATCH
}

const fn default_mutation_chance() -> f64 {
    HATCH_MUTATION_CHANCE
}
