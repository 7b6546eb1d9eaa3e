//! Armadillo records: care meters, genes, and life stage.
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::constants::{ADULT_AGE_DAYS, NEWBORN_HAPPINESS, NEWBORN_HUNGER};
use crate::numbers::{clamp_i64_to_u32, clamp_stat};

/// Validation failures raised while building or mutating an [`Armadillo`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArmadilloError {
    #[error("sex must be \"M\" or \"F\" (got {0:?})")]
    InvalidSex(String),
    #[error("age_days must be a non-negative integer (got {0})")]
    NegativeAge(i64),
    #[error("gene {trait_name:?} must map to a genotype string")]
    NonStringGene { trait_name: String },
    #[error("{action} amount must be non-negative (got {amount})")]
    NegativeAmount { action: &'static str, amount: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Sex {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

impl Sex {
    pub const ALL: [Self; 2] = [Self::Male, Self::Female];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Male => "M",
            Self::Female => "F",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sex {
    type Err = ArmadilloError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "M" => Ok(Self::Male),
            "F" => Ok(Self::Female),
            other => Err(ArmadilloError::InvalidSex(other.to_string())),
        }
    }
}

/// Life stage derived from age; never stored independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifeStage {
    Baby,
    Adult,
}

impl LifeStage {
    #[must_use]
    pub const fn from_age(age_days: u32) -> Self {
        if age_days >= ADULT_AGE_DAYS {
            Self::Adult
        } else {
            Self::Baby
        }
    }
}

/// A single armadillo.
///
/// Meters are clamped into `[0, 100]` on every write and the life stage is
/// always recomputed from `age_days`, so a value of this type can never hold
/// an inconsistent stage. `id` and `sex` are fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ArmadilloRecord", into = "ArmadilloRecord")]
pub struct Armadillo {
    id: String,
    name: String,
    sex: Sex,
    age_days: u32,
    hunger: u8,
    happiness: u8,
    genes: BTreeMap<String, String>,
    color: String,
}

impl Armadillo {
    /// Build an armadillo with newborn-level meters, no genes, and a brown coat.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, sex: Sex, age_days: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            sex,
            age_days,
            hunger: clamp_stat(NEWBORN_HUNGER),
            happiness: clamp_stat(NEWBORN_HAPPINESS),
            genes: BTreeMap::new(),
            color: "Brown".to_string(),
        }
    }

    /// Set both meters, clamping each into `[0, 100]`.
    #[must_use]
    pub fn with_meters(mut self, hunger: i64, happiness: i64) -> Self {
        self.hunger = clamp_stat(hunger);
        self.happiness = clamp_stat(happiness);
        self
    }

    #[must_use]
    pub fn with_gene(mut self, trait_name: impl Into<String>, genotype: impl Into<String>) -> Self {
        self.genes.insert(trait_name.into(), genotype.into());
        self
    }

    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
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
    pub const fn sex(&self) -> Sex {
        self.sex
    }

    #[must_use]
    pub const fn age_days(&self) -> u32 {
        self.age_days
    }

    #[must_use]
    pub const fn hunger(&self) -> u8 {
        self.hunger
    }

    #[must_use]
    pub const fn happiness(&self) -> u8 {
        self.happiness
    }

    #[must_use]
    pub const fn genes(&self) -> &BTreeMap<String, String> {
        &self.genes
    }

    #[must_use]
    pub fn gene(&self, trait_name: &str) -> Option<&str> {
        self.genes.get(trait_name).map(String::as_str)
    }

    #[must_use]
    pub fn color(&self) -> &str {
        &self.color
    }

    #[must_use]
    pub const fn life_stage(&self) -> LifeStage {
        LifeStage::from_age(self.age_days)
    }

    #[must_use]
    pub const fn is_adult(&self) -> bool {
        matches!(self.life_stage(), LifeStage::Adult)
    }

    #[must_use]
    pub const fn is_baby(&self) -> bool {
        !self.is_adult()
    }

    /// Raise the hunger (fullness) meter, clamped to 100.
    ///
    /// # Errors
    ///
    /// Returns [`ArmadilloError::NegativeAmount`] for a negative amount.
    pub fn feed(&mut self, amount: i64) -> Result<(), ArmadilloError> {
        let amount = non_negative("feed", amount)?;
        self.hunger = clamp_stat(i64::from(self.hunger).saturating_add(amount));
        Ok(())
    }

    /// Raise the happiness meter, clamped to 100.
    ///
    /// # Errors
    ///
    /// Returns [`ArmadilloError::NegativeAmount`] for a negative amount.
    pub fn pet(&mut self, amount: i64) -> Result<(), ArmadilloError> {
        let amount = non_negative("pet", amount)?;
        self.happiness = clamp_stat(i64::from(self.happiness).saturating_add(amount));
        Ok(())
    }

    /// Advance age by whole days.
    ///
    /// # Errors
    ///
    /// Returns [`ArmadilloError::NegativeAmount`] for a negative day count.
    pub fn age_up(&mut self, days: i64) -> Result<(), ArmadilloError> {
        let days = non_negative("age_up", days)?;
        self.grow(clamp_i64_to_u32(days));
        Ok(())
    }

    pub(crate) fn grow(&mut self, days: u32) {
        self.age_days = self.age_days.saturating_add(days);
    }

    pub(crate) fn reassign_id(&mut self, id: String) {
        self.id = id;
    }
}

fn non_negative(action: &'static str, amount: i64) -> Result<i64, ArmadilloError> {
    if amount < 0 {
        return Err(ArmadilloError::NegativeAmount { action, amount });
    }
    Ok(amount)
}

/// Flat key-value shape of an armadillo inside the save document.
///
/// `is_baby` and `is_adult` are written for readers of the document but are
/// ignored on load; the stage is recomputed from `age_days`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmadilloRecord {
    pub id: String,
    pub name: String,
    pub sex: String,
    pub age_days: i64,
    pub hunger: i64,
    pub happiness: i64,
    pub genes: BTreeMap<String, Value>,
    pub color: String,
    #[serde(default)]
    pub is_baby: bool,
    #[serde(default)]
    pub is_adult: bool,
}

impl TryFrom<ArmadilloRecord> for Armadillo {
    type Error = ArmadilloError;

    fn try_from(record: ArmadilloRecord) -> Result<Self, Self::Error> {
        let sex = record.sex.parse::<Sex>()?;
        let mut genes = BTreeMap::new();
        for (trait_name, value) in record.genes {
            match value {
                Value::String(genotype) => {
                    genes.insert(trait_name, genotype);
                }
                _ => return Err(ArmadilloError::NonStringGene { trait_name }),
            }
        }
        if record.age_days < 0 {
            return Err(ArmadilloError::NegativeAge(record.age_days));
        }
        let mut armadillo = Self::new(record.id, record.name, sex, clamp_i64_to_u32(record.age_days))
            .with_meters(record.hunger, record.happiness)
            .with_color(record.color);
        armadillo.genes = genes;
        Ok(armadillo)
    }
}

impl From<Armadillo> for ArmadilloRecord {
    fn from(armadillo: Armadillo) -> Self {
        let is_adult = armadillo.is_adult();
        Self {
            id: armadillo.id,
            name: armadillo.name,
            sex: armadillo.sex.as_str().to_string(),
            age_days: i64::from(armadillo.age_days),
            hunger: i64::from(armadillo.hunger),
            happiness: i64::from(armadillo.happiness),
            genes: armadillo
                .genes
                .into_iter()
                .map(|(k, v)| (k, Value::String(v)))
                .collect(),
            color: armadillo.color,
            is_baby: !is_adult,
            is_adult,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pebble() -> Armadillo {
        Armadillo::new("d1", "Pebble", Sex::Male, 14)
            .with_meters(70, 70)
            .with_gene("color", "Aa")
            .with_color("Brown")
    }

    #[test]
    fn construction_clamps_meters() {
        let dillo = Armadillo::new("x", "X", Sex::Female, 0).with_meters(150, -20);
        assert_eq!(dillo.hunger(), 100);
        assert_eq!(dillo.happiness(), 0);
    }

    #[test]
    fn negative_age_is_rejected() {
        let mut record = ArmadilloRecord::from(pebble());
        record.age_days = -1;
        let err = Armadillo::try_from(record).unwrap_err();
        assert_eq!(err, ArmadilloError::NegativeAge(-1));
    }

    #[test]
    fn feed_and_pet_clamp_at_one_hundred() {
        let mut dillo = pebble();
        dillo.feed(20).unwrap();
        assert_eq!(dillo.hunger(), 90);
        dillo.feed(20).unwrap();
        assert_eq!(dillo.hunger(), 100);
        dillo.pet(i64::MAX).unwrap();
        assert_eq!(dillo.happiness(), 100);
    }

    #[test]
    fn negative_care_amounts_leave_meters_untouched() {
        let mut dillo = pebble();
        assert!(matches!(
            dillo.feed(-5),
            Err(ArmadilloError::NegativeAmount { action: "feed", .. })
        ));
        assert!(dillo.pet(-1).is_err());
        assert!(dillo.age_up(-3).is_err());
        assert_eq!(dillo, pebble());
    }

    #[test]
    fn age_up_crosses_adult_threshold() {
        let mut dillo = Armadillo::new("b", "Bean", Sex::Female, 0);
        assert!(dillo.is_baby());
        dillo.age_up(13).unwrap();
        assert!(dillo.is_baby());
        assert_eq!(dillo.life_stage(), LifeStage::Baby);
        dillo.age_up(1).unwrap();
        assert!(dillo.is_adult());
        assert!(!dillo.is_baby());
        dillo.age_up(0).unwrap();
        assert_eq!(dillo.age_days(), 14);
    }

    #[test]
    fn record_roundtrip_is_exact() {
        let dillo = pebble();
        let value = serde_json::to_value(&dillo).unwrap();
        assert_eq!(value["is_adult"], json!(true));
        assert_eq!(value["is_baby"], json!(false));
        assert_eq!(value["sex"], json!("M"));
        let restored: Armadillo = serde_json::from_value(value).unwrap();
        assert_eq!(restored, dillo);
    }

    #[test]
    fn stale_stage_flags_are_recomputed() {
        let value = json!({
            "id": "d9", "name": "Ziggy", "sex": "F", "age_days": 3,
            "hunger": 140, "happiness": -2, "genes": {"color": "aa"},
            "color": "Albino", "is_baby": false, "is_adult": true
        });
        let dillo: Armadillo = serde_json::from_value(value).unwrap();
        assert!(dillo.is_baby());
        assert_eq!(dillo.hunger(), 100);
        assert_eq!(dillo.happiness(), 0);
    }

    #[test]
    fn missing_required_key_fails() {
        let mut value = serde_json::to_value(pebble()).unwrap();
        value.as_object_mut().unwrap().remove("happiness");
        assert!(serde_json::from_value::<Armadillo>(value).is_err());
    }

    #[test]
    fn invalid_sex_and_gene_types_fail() {
        let mut value = serde_json::to_value(pebble()).unwrap();
        value["sex"] = json!("X");
        let err = serde_json::from_value::<Armadillo>(value).unwrap_err();
        assert!(err.to_string().contains("sex must be"));

        let mut value = serde_json::to_value(pebble()).unwrap();
        value["genes"] = json!({"color": 7});
        let err = serde_json::from_value::<Armadillo>(value).unwrap_err();
        assert!(err.to_string().contains("genotype string"));

        let mut value = serde_json::to_value(pebble()).unwrap();
        value["age_days"] = json!(-4);
        assert!(serde_json::from_value::<Armadillo>(value).is_err());
    }

    #[test]
    fn sex_parses_only_known_codes() {
        assert_eq!("M".parse::<Sex>().unwrap(), Sex::Male);
        assert_eq!("F".parse::<Sex>().unwrap(), Sex::Female);
        assert!("f".parse::<Sex>().is_err());
        assert_eq!(Sex::Female.to_string(), "F");
    }
}
