//! Breeding jobs, coat-color genetics, and hatching.
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::armadillo::{Armadillo, Sex};
use crate::constants::{COLOR_GENE, DEFAULT_GENOTYPE, NEWBORN_HAPPINESS, NEWBORN_HUNGER};
use crate::numbers::truncate_f64_to_u64;

/// Alleles a color genotype may carry.
pub const ALLELES: [char; 3] = ['A', 'a', 'B'];
/// The allele written by a mutation.
pub const MUTANT_ALLELE: char = 'B';

/// Display names handed out to newborns.
pub const NAME_POOL: [&str; 11] = [
    "Pebble", "Sprocket", "Nugget", "Mochi", "Tango", "Pixel", "Bean", "Ziggy", "Clover", "Blu",
    "Amber",
];

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BreedingError {
    #[error("genotype must be 2 characters over {{A, a, B}} (got {0:?})")]
    MalformedGenotype(String),
    #[error("mutation_chance must be between 0 and 1 inclusive (got {0})")]
    MutationChanceOutOfRange(f64),
    #[error("duration_s must be an integer in [1, {max}] (got {0})", max = u32::MAX)]
    DurationOutOfRange(i64),
    #[error("parent sexes must be dad=M and mom=F (got dad={dad}, mom={mom})")]
    ParentSexMismatch { dad: Sex, mom: Sex },
}

/// Coat color shown for a genotype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Phenotype {
    Blue,
    Brown,
    Albino,
}

impl Phenotype {
    /// Derive the phenotype; a `B` allele wins over `A`, which wins over `a`.
    #[must_use]
    pub fn from_genotype(genotype: &str) -> Self {
        if genotype.contains('B') {
            Self::Blue
        } else if genotype.contains('A') {
            Self::Brown
        } else {
            Self::Albino
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Blue => "Blue",
            Self::Brown => "Brown",
            Self::Albino => "Albino",
        }
    }
}

impl fmt::Display for Phenotype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn parse_genotype(genotype: &str) -> Result<[char; 2], BreedingError> {
    let mut chars = genotype.chars();
    match (chars.next(), chars.next(), chars.next()) {
        (Some(first), Some(second), None)
            if ALLELES.contains(&first) && ALLELES.contains(&second) =>
        {
            Ok([first, second])
        }
        _ => Err(BreedingError::MalformedGenotype(genotype.to_string())),
    }
}

/// Combine two parental genotypes into a child genotype and its phenotype.
///
/// Each parent passes one of its two alleles uniformly at random. With
/// probability `mutation_chance` one of the child's two alleles (chosen
/// uniformly) is overwritten with `B`.
///
/// # Errors
///
/// Returns an error when either genotype is malformed or `mutation_chance`
/// lies outside `[0, 1]`.
pub fn combine_genes<R: Rng + ?Sized>(
    genotype_m: &str,
    genotype_f: &str,
    mutation_chance: f64,
    rng: &mut R,
) -> Result<(String, Phenotype), BreedingError> {
    let dad = parse_genotype(genotype_m)?;
    let mom = parse_genotype(genotype_f)?;
    if !(0.0..=1.0).contains(&mutation_chance) {
        return Err(BreedingError::MutationChanceOutOfRange(mutation_chance));
    }

    let mut child = [dad[rng.gen_range(0..2)], mom[rng.gen_range(0..2)]];
    if rng.r#gen::<f64>() < mutation_chance {
        child[rng.gen_range(0..2)] = MUTANT_ALLELE;
    }

    let genotype: String = child.iter().collect();
    let phenotype = Phenotype::from_genotype(&genotype);
    Ok((genotype, phenotype))
}

/// Pick a newborn name from [`NAME_POOL`].
pub fn make_baby_name<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    NAME_POOL[rng.gen_range(0..NAME_POOL.len())]
}

/// Random armadillo id of the form `d` + 12 hex digits.
pub fn newborn_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("d{:012x}", rng.r#gen::<u64>() & 0xFFFF_FFFF_FFFF)
}

/// Produce a newborn from two parents.
///
/// Parents without a `color` gene are treated as `Aa`. The newborn has a
/// random name and sex, age 0, both meters at 60, and the combined color
/// genotype.
///
/// # Errors
///
/// Returns [`BreedingError::ParentSexMismatch`] unless `dad` is male and `mom`
/// is female, and propagates genotype or mutation-chance errors.
pub fn hatch_result<R: Rng + ?Sized>(
    dad: &Armadillo,
    mom: &Armadillo,
    mutation_chance: f64,
    rng: &mut R,
) -> Result<Armadillo, BreedingError> {
    if dad.sex() != Sex::Male || mom.sex() != Sex::Female {
        return Err(BreedingError::ParentSexMismatch {
            dad: dad.sex(),
            mom: mom.sex(),
        });
    }
    let (genotype, phenotype) = combine_genes(
        dad.gene(COLOR_GENE).unwrap_or(DEFAULT_GENOTYPE),
        mom.gene(COLOR_GENE).unwrap_or(DEFAULT_GENOTYPE),
        mutation_chance,
        rng,
    )?;
    let id = newborn_id(rng);
    let name = make_baby_name(rng);
    let sex = Sex::ALL[rng.gen_range(0..Sex::ALL.len())];
    let baby = Armadillo::new(id, name, sex, 0)
        .with_meters(NEWBORN_HUNGER, NEWBORN_HAPPINESS)
        .with_gene(COLOR_GENE, genotype)
        .with_color(phenotype.as_str());
    Ok(baby)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Incubating,
    Done,
}

/// A timed incubation between two parents.
///
/// A `start_ts` of `0.0` means the countdown has not started yet; the owning
/// store stamps it on the first tick. Status only ever moves from
/// `Incubating` to `Done`, and only the store performs that move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BreedingJobRecord", into = "BreedingJobRecord")]
pub struct BreedingJob {
    id: String,
    parent_m_id: String,
    parent_f_id: String,
    start_ts: f64,
    duration_s: u32,
    status: JobStatus,
    result: Option<Armadillo>,
}

impl BreedingJob {
    /// Create an incubating job.
    ///
    /// # Errors
    ///
    /// Returns [`BreedingError::DurationOutOfRange`] when `duration_s < 1` or
    /// does not fit in a `u32`.
    pub fn new(
        id: impl Into<String>,
        parent_m_id: impl Into<String>,
        parent_f_id: impl Into<String>,
        start_ts: f64,
        duration_s: i64,
    ) -> Result<Self, BreedingError> {
        let duration = u32::try_from(duration_s)
            .ok()
            .filter(|d| *d >= 1)
            .ok_or(BreedingError::DurationOutOfRange(duration_s))?;
        Ok(Self {
            id: id.into(),
            parent_m_id: parent_m_id.into(),
            parent_f_id: parent_f_id.into(),
            start_ts,
            duration_s: duration,
            status: JobStatus::Incubating,
            result: None,
        })
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn parent_m_id(&self) -> &str {
        &self.parent_m_id
    }

    #[must_use]
    pub fn parent_f_id(&self) -> &str {
        &self.parent_f_id
    }

    #[must_use]
    pub const fn start_ts(&self) -> f64 {
        self.start_ts
    }

    #[must_use]
    pub const fn duration_s(&self) -> u32 {
        self.duration_s
    }

    #[must_use]
    pub const fn status(&self) -> JobStatus {
        self.status
    }

    #[must_use]
    pub const fn result(&self) -> Option<&Armadillo> {
        self.result.as_ref()
    }

    #[must_use]
    pub fn is_started(&self) -> bool {
        self.start_ts != 0.0
    }

    /// Whole seconds left until hatch, floored at zero.
    #[must_use]
    pub fn remaining(&self, now: f64) -> u64 {
        truncate_f64_to_u64(f64::from(self.duration_s) - (now - self.start_ts))
    }

    /// True once the countdown reaches zero while the job is still incubating.
    #[must_use]
    pub fn is_done(&self, now: f64) -> bool {
        self.status != JobStatus::Done && self.remaining(now) == 0
    }

    pub(crate) fn start_if_unset(&mut self, now: f64) {
        if !self.is_started() {
            self.start_ts = now;
        }
    }

    pub(crate) fn complete(&mut self, newborn: Armadillo) {
        self.status = JobStatus::Done;
        self.result = Some(newborn);
    }
}

/// Save-document shape of a breeding job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreedingJobRecord {
    pub id: String,
    pub parent_m_id: String,
    pub parent_f_id: String,
    pub start_ts: f64,
    pub duration_s: i64,
    pub status: JobStatus,
    #[serde(default)]
    pub result: Option<Armadillo>,
}

impl TryFrom<BreedingJobRecord> for BreedingJob {
    type Error = BreedingError;

    fn try_from(record: BreedingJobRecord) -> Result<Self, Self::Error> {
        let mut job = Self::new(
            record.id,
            record.parent_m_id,
            record.parent_f_id,
            record.start_ts,
            record.duration_s,
        )?;
        job.status = record.status;
        job.result = record.result;
        Ok(job)
    }
}

impl From<BreedingJob> for BreedingJobRecord {
    fn from(job: BreedingJob) -> Self {
        Self {
            id: job.id,
            parent_m_id: job.parent_m_id,
            parent_f_id: job.parent_f_id,
            start_ts: job.start_ts,
            duration_s: i64::from(job.duration_s),
            status: job.status,
            result: job.result,
        }
    }
}
