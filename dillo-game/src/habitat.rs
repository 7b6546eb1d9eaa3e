//! Habitats: capacity-bounded pens holding armadillo ids.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{HATCH_BOOST_MAX, STARTER_HABITAT_CAPACITY};
use crate::numbers::clamp_i64_to_u32;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HabitatError {
    #[error("level must be >= 1 (got {0})")]
    LevelBelowOne(i64),
    #[error("capacity must be >= 0 (got {0})")]
    NegativeCapacity(i64),
    #[error("hatch_boost_pct must be in [0, 100] (got {0})")]
    HatchBoostOutOfRange(i64),
    #[error("{occupants} occupants exceed capacity {capacity}")]
    OverCapacity { occupants: usize, capacity: i64 },
}

/// A pen that can hold a limited number of armadillos.
///
/// Occupant ids are unique and keep insertion order; their count never
/// exceeds `capacity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "HabitatRecord", into = "HabitatRecord")]
pub struct Habitat {
    id: String,
    name: String,
    level: u32,
    capacity: u32,
    occupants: Vec<String>,
    hatch_boost_pct: u8,
}

impl Habitat {
    /// Validate and build a habitat. Duplicate occupant ids are dropped,
    /// keeping the first occurrence.
    ///
    /// # Errors
    ///
    /// Returns a [`HabitatError`] when `level < 1`, `capacity < 0`, the hatch
    /// boost lies outside `[0, 100]`, or the deduplicated occupants exceed
    /// the capacity.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        level: i64,
        capacity: i64,
        occupants: Vec<String>,
        hatch_boost_pct: i64,
    ) -> Result<Self, HabitatError> {
        if level < 1 {
            return Err(HabitatError::LevelBelowOne(level));
        }
        if capacity < 0 {
            return Err(HabitatError::NegativeCapacity(capacity));
        }
        let boost = u8::try_from(hatch_boost_pct)
            .ok()
            .filter(|pct| *pct <= HATCH_BOOST_MAX)
            .ok_or(HabitatError::HatchBoostOutOfRange(hatch_boost_pct))?;

        let mut unique: Vec<String> = Vec::with_capacity(occupants.len());
        for occupant in occupants {
            if !unique.contains(&occupant) {
                unique.push(occupant);
            }
        }
        if i64::try_from(unique.len()).unwrap_or(i64::MAX) > capacity {
            return Err(HabitatError::OverCapacity {
                occupants: unique.len(),
                capacity,
            });
        }

        Ok(Self {
            id: id.into(),
            name: name.into(),
            level: clamp_i64_to_u32(level),
            capacity: clamp_i64_to_u32(capacity),
            occupants: unique,
            hatch_boost_pct: boost,
        })
    }

    /// Empty habitat at the given level and capacity with no hatch boost.
    ///
    /// # Errors
    ///
    /// See [`Habitat::new`].
    pub fn empty(
        id: impl Into<String>,
        name: impl Into<String>,
        level: i64,
        capacity: i64,
    ) -> Result<Self, HabitatError> {
        Self::new(id, name, level, capacity, Vec::new(), 0)
    }

    /// Fresh level-1 pen at the starter capacity.
    pub(crate) fn starter(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            level: 1,
            capacity: STARTER_HABITAT_CAPACITY,
            occupants: Vec::new(),
            hatch_boost_pct: 0,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn level(&self) -> u32 {
        self.level
    }

    #[must_use]
    pub const fn capacity(&self) -> u32 {
        self.capacity
    }

    #[must_use]
    pub const fn hatch_boost_pct(&self) -> u8 {
        self.hatch_boost_pct
    }

    #[must_use]
    pub fn occupants(&self) -> &[String] {
        &self.occupants
    }

    #[must_use]
    pub fn contains(&self, armadillo_id: &str) -> bool {
        self.occupants.iter().any(|id| id == armadillo_id)
    }

    #[must_use]
    pub fn has_space(&self) -> bool {
        self.occupants.len() < self.capacity as usize
    }

    /// Add an occupant. Returns `false` without changes when the pen is full
    /// or already holds the id.
    pub fn add(&mut self, armadillo_id: &str) -> bool {
        if !self.has_space() || self.contains(armadillo_id) {
            return false;
        }
        self.occupants.push(armadillo_id.to_string());
        true
    }

    /// Remove an occupant if present.
    pub fn remove(&mut self, armadillo_id: &str) {
        self.occupants.retain(|id| id != armadillo_id);
    }

    /// Apply level and capacity deltas. Nothing changes on error.
    ///
    /// # Errors
    ///
    /// Returns a [`HabitatError`] when the resulting level drops below 1, the
    /// resulting capacity is negative, or it would no longer fit the current
    /// occupants.
    pub fn upgrade(&mut self, capacity_delta: i64, level_delta: i64) -> Result<(), HabitatError> {
        let new_level = i64::from(self.level).saturating_add(level_delta);
        let new_capacity = i64::from(self.capacity).saturating_add(capacity_delta);
        if new_level < 1 {
            return Err(HabitatError::LevelBelowOne(new_level));
        }
        if new_capacity < 0 {
            return Err(HabitatError::NegativeCapacity(new_capacity));
        }
        if new_capacity < i64::try_from(self.occupants.len()).unwrap_or(i64::MAX) {
            return Err(HabitatError::OverCapacity {
                occupants: self.occupants.len(),
                capacity: new_capacity,
            });
        }
        self.level = clamp_i64_to_u32(new_level);
        self.capacity = clamp_i64_to_u32(new_capacity);
        Ok(())
    }

    /// Keep only occupants accepted by `keep`, then cut the list to capacity.
    pub(crate) fn sanitize_occupants(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.occupants.retain(|id| keep(id));
        self.occupants.truncate(self.capacity as usize);
    }
}

/// Save-document shape of a habitat. `occupants` and `hatch_boost_pct` may be
/// omitted and default to empty and zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitatRecord {
    pub id: String,
    pub name: String,
    pub level: i64,
    pub capacity: i64,
    #[serde(default)]
    pub occupants: Vec<String>,
    #[serde(default)]
    pub hatch_boost_pct: i64,
}

impl TryFrom<HabitatRecord> for Habitat {
    type Error = HabitatError;

    fn try_from(record: HabitatRecord) -> Result<Self, Self::Error> {
        Self::new(
            record.id,
            record.name,
            record.level,
            record.capacity,
            record.occupants,
            record.hatch_boost_pct,
        )
    }
}

impl From<Habitat> for HabitatRecord {
    fn from(habitat: Habitat) -> Self {
        Self {
            id: habitat.id,
            name: habitat.name,
            level: i64::from(habitat.level),
            capacity: i64::from(habitat.capacity),
            occupants: habitat.occupants,
            hatch_boost_pct: i64::from(habitat.hatch_boost_pct),
        }
    }
}
