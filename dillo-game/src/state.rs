//! Game state store: the aggregate root owning every entity and rule.
use log::{debug, info, warn};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::armadillo::{Armadillo, Sex};
use crate::breeding::{BreedingError, BreedingJob, hatch_result, newborn_id};
use crate::constants::{
    CARE_THRESHOLD, COLOR_GENE, DEFAULT_INCUBATION_S, FEED_AMOUNT, HATCH_MUTATION_CHANCE,
    ITEM_FOOD, ITEM_TOY, META_NOW_TS, PET_AMOUNT, REWARD_CARE, STARTER_COINS, STARTER_FOOD,
    STARTER_TOYS, UPGRADE_LEVEL_DELTA,
};
use crate::habitat::Habitat;
use crate::numbers::clamp_i64_to_u32;
use crate::observers::{ObserverId, ObserverRegistry, StateObserver};

/// Persisted shape of the whole game. Missing top-level keys fall back to
/// empty values; entity records are validated while deserializing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveDocument {
    pub coins: u32,
    pub inventory: BTreeMap<String, u32>,
    pub armadillos: Vec<Armadillo>,
    pub habitats: Vec<Habitat>,
    pub breeding_queue: Vec<BreedingJob>,
    /// Serialized as a sorted array.
    pub dex_colors: BTreeSet<String>,
    pub selected_id: Option<String>,
    pub meta: Map<String, Value>,
}

impl SaveDocument {
    /// Parse and validate a document.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed JSON or any entity record that fails
    /// validation.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Pretty JSON with two-space indentation.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// The single source of truth for a play session.
///
/// Every command either applies fully and notifies observers, or returns a
/// rejection (`false`/`None`) and leaves the state untouched.
#[derive(Debug)]
pub struct GameState {
    coins: u32,
    inventory: BTreeMap<String, u32>,
    armadillos: Vec<Armadillo>,
    habitats: Vec<Habitat>,
    breeding_queue: Vec<BreedingJob>,
    dex_colors: BTreeSet<String>,
    selected_id: Option<String>,
    meta: Map<String, Value>,
    mutation_chance: f64,
    rng: ChaCha20Rng,
    observers: ObserverRegistry,
}

impl Default for GameState {
    fn default() -> Self {
        Self::from_rng(ChaCha20Rng::from_entropy())
    }
}

impl GameState {
    /// Empty state with an entropy-seeded RNG.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty state whose genetics, names, sexes and ids are reproducible.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(ChaCha20Rng::seed_from_u64(seed))
    }

    fn from_rng(rng: ChaCha20Rng) -> Self {
        Self {
            coins: 0,
            inventory: BTreeMap::new(),
            armadillos: Vec::new(),
            habitats: Vec::new(),
            breeding_queue: Vec::new(),
            dex_colors: BTreeSet::new(),
            selected_id: None,
            meta: Map::new(),
            mutation_chance: HATCH_MUTATION_CHANCE,
            rng,
            observers: ObserverRegistry::new(),
        }
    }

    /// Override the mutation chance used when a tick hatches a job.
    ///
    /// # Errors
    ///
    /// Returns [`BreedingError::MutationChanceOutOfRange`] outside `[0, 1]`.
    pub fn with_mutation_chance(mut self, chance: f64) -> Result<Self, BreedingError> {
        if !(0.0..=1.0).contains(&chance) {
            return Err(BreedingError::MutationChanceOutOfRange(chance));
        }
        self.mutation_chance = chance;
        Ok(self)
    }

    // Observers ------------------------------------------------------------

    pub fn add_observer<O>(&mut self, observer: O) -> ObserverId
    where
        O: StateObserver + 'static,
    {
        self.observers.add(Box::new(observer))
    }

    pub fn remove_observer(&mut self, id: ObserverId) -> bool {
        self.observers.remove(id)
    }

    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    fn notify(&mut self) {
        let mut observers = std::mem::take(&mut self.observers);
        observers.notify_all(self);
        self.observers = observers;
    }

    // Queries --------------------------------------------------------------

    #[must_use]
    pub const fn coins(&self) -> u32 {
        self.coins
    }

    #[must_use]
    pub const fn inventory(&self) -> &BTreeMap<String, u32> {
        &self.inventory
    }

    #[must_use]
    pub fn inventory_count(&self, item: &str) -> u32 {
        self.inventory.get(item).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn armadillos(&self) -> &[Armadillo] {
        &self.armadillos
    }

    #[must_use]
    pub fn habitats(&self) -> &[Habitat] {
        &self.habitats
    }

    #[must_use]
    pub fn habitat(&self, habitat_id: &str) -> Option<&Habitat> {
        self.habitats.iter().find(|h| h.id() == habitat_id)
    }

    /// The habitat currently holding the given armadillo, if any.
    #[must_use]
    pub fn habitat_of(&self, armadillo_id: &str) -> Option<&Habitat> {
        self.habitats.iter().find(|h| h.contains(armadillo_id))
    }

    #[must_use]
    pub fn breeding_queue(&self) -> &[BreedingJob] {
        &self.breeding_queue
    }

    #[must_use]
    pub const fn dex_colors(&self) -> &BTreeSet<String> {
        &self.dex_colors
    }

    #[must_use]
    pub fn selected_id(&self) -> Option<&str> {
        self.selected_id.as_deref()
    }

    #[must_use]
    pub const fn meta(&self) -> &Map<String, Value> {
        &self.meta
    }

    /// Timestamp recorded by the most recent breeding tick.
    #[must_use]
    pub fn now_ts(&self) -> Option<f64> {
        self.meta.get(META_NOW_TS).and_then(Value::as_f64)
    }

    #[must_use]
    pub const fn mutation_chance(&self) -> f64 {
        self.mutation_chance
    }

    #[must_use]
    pub fn get_by_id(&self, armadillo_id: &str) -> Option<&Armadillo> {
        find(&self.armadillos, armadillo_id)
    }

    #[must_use]
    pub fn get_selected(&self) -> Option<&Armadillo> {
        self.selected_id
            .as_deref()
            .and_then(|id| self.get_by_id(id))
    }

    /// All armadillos old enough to breed.
    #[must_use]
    pub fn adults(&self) -> Vec<&Armadillo> {
        self.armadillos.iter().filter(|d| d.is_adult()).collect()
    }

    // Commands -------------------------------------------------------------

    /// Reset to the canonical new-game state.
    pub fn seed_starters(&mut self) {
        self.coins = STARTER_COINS;
        self.inventory = BTreeMap::from([
            (ITEM_FOOD.to_string(), STARTER_FOOD),
            (ITEM_TOY.to_string(), STARTER_TOYS),
        ]);
        self.armadillos = vec![
            Armadillo::new("d1", "Pebble", Sex::Male, 14)
                .with_meters(70, 70)
                .with_gene(COLOR_GENE, "Aa")
                .with_color("Brown"),
            Armadillo::new("d2", "Mochi", Sex::Female, 14)
                .with_meters(65, 75)
                .with_gene(COLOR_GENE, "aa")
                .with_color("Albino"),
            Armadillo::new("d3", "Blu", Sex::Male, 14)
                .with_meters(80, 60)
                .with_gene(COLOR_GENE, "AB")
                .with_color("Blue"),
        ];
        self.habitats = vec![
            Habitat::starter("h1", "Grassland"),
            Habitat::starter("h2", "Desert"),
            Habitat::starter("h3", "Forest"),
        ];
        self.breeding_queue.clear();
        self.dex_colors = self
            .armadillos
            .iter()
            .map(|d| d.color().to_string())
            .collect();
        self.selected_id = None;
        self.meta.clear();
        info!("seeded a new farm with {} starters", self.armadillos.len());
        self.notify();
    }

    /// Select an armadillo, or clear the selection with `None`.
    /// Returns `false` for an unknown id.
    pub fn select(&mut self, armadillo_id: Option<&str>) -> bool {
        if let Some(id) = armadillo_id
            && self.get_by_id(id).is_none()
        {
            return false;
        }
        self.selected_id = armadillo_id.map(str::to_string);
        self.notify();
        true
    }

    /// Adjust the balance by a signed amount, flooring at zero.
    pub fn add_coins(&mut self, amount: i64) {
        self.coins = clamp_i64_to_u32(i64::from(self.coins).saturating_add(amount));
        self.notify();
    }

    /// Spend `cost` coins for one unit of `item`.
    #[must_use]
    pub fn buy(&mut self, item: &str, cost: u32) -> bool {
        if self.coins < cost {
            return false;
        }
        self.coins -= cost;
        let count = self.inventory.entry(item.to_string()).or_insert(0);
        *count = count.saturating_add(1);
        debug!("bought {item} for {cost}");
        self.notify();
        true
    }

    /// Spend `cost` coins to grow a habitat by `capacity_delta` and one level.
    #[must_use]
    pub fn upgrade_habitat(&mut self, habitat_id: &str, cost: u32, capacity_delta: i64) -> bool {
        if capacity_delta <= 0 || self.coins < cost {
            return false;
        }
        let Some(habitat) = self.habitats.iter_mut().find(|h| h.id() == habitat_id) else {
            return false;
        };
        if let Err(err) = habitat.upgrade(capacity_delta, UPGRADE_LEVEL_DELTA) {
            debug!("upgrade of {habitat_id} rejected: {err}");
            return false;
        }
        self.coins -= cost;
        self.notify();
        true
    }

    /// Feed the selected armadillo, consuming one food.
    #[must_use]
    pub fn feed_selected(&mut self) -> bool {
        if self.inventory_count(ITEM_FOOD) == 0 {
            return false;
        }
        let Some(armadillo) = self.selected_mut() else {
            return false;
        };
        if armadillo.feed(FEED_AMOUNT).is_err() {
            return false;
        }
        let earned = earns_care_reward(armadillo);
        if let Some(food) = self.inventory.get_mut(ITEM_FOOD) {
            *food -= 1;
        }
        if earned {
            self.coins = self.coins.saturating_add(REWARD_CARE);
        }
        self.notify();
        true
    }

    /// Pet the selected armadillo.
    #[must_use]
    pub fn pet_selected(&mut self) -> bool {
        let Some(armadillo) = self.selected_mut() else {
            return false;
        };
        if armadillo.pet(PET_AMOUNT).is_err() {
            return false;
        }
        if earns_care_reward(armadillo) {
            self.coins = self.coins.saturating_add(REWARD_CARE);
        }
        self.notify();
        true
    }

    /// Move the selected armadillo into `habitat_id`, leaving its old pen.
    ///
    /// Nothing moves when the target is full. Moving into the pen that
    /// already holds the armadillo sends it to the back of that pen's list.
    #[must_use]
    pub fn move_selected_to_habitat(&mut self, habitat_id: &str) -> bool {
        let Some(armadillo_id) = self.get_selected().map(|d| d.id().to_string()) else {
            return false;
        };
        let Some(target) = self.habitat(habitat_id) else {
            return false;
        };
        if !target.contains(&armadillo_id) && !target.has_space() {
            return false;
        }
        for habitat in &mut self.habitats {
            habitat.remove(&armadillo_id);
        }
        if let Some(target) = self.habitats.iter_mut().find(|h| h.id() == habitat_id) {
            target.add(&armadillo_id);
        }
        self.notify();
        true
    }

    /// Queue a breeding job between an adult male and an adult female.
    ///
    /// A duration below one second is replaced by the default incubation.
    /// The job's countdown starts on the next tick.
    pub fn start_breeding(
        &mut self,
        male_id: &str,
        female_id: &str,
        duration_s: i64,
    ) -> Option<BreedingJob> {
        if male_id == female_id {
            return None;
        }
        let dad = self.get_by_id(male_id)?;
        let mom = self.get_by_id(female_id)?;
        if dad.sex() != Sex::Male || mom.sex() != Sex::Female {
            return None;
        }
        if !dad.is_adult() || !mom.is_adult() {
            return None;
        }
        let duration = if duration_s < 1 {
            i64::from(DEFAULT_INCUBATION_S)
        } else {
            duration_s
        };
        let job = match BreedingJob::new(self.next_job_id(), male_id, female_id, 0.0, duration) {
            Ok(job) => job,
            Err(err) => {
                debug!("breeding request rejected: {err}");
                return None;
            }
        };
        debug!("queued {} ({male_id} x {female_id}, {duration}s)", job.id());
        self.breeding_queue.push(job.clone());
        self.notify();
        Some(job)
    }

    fn next_job_id(&self) -> String {
        let highest = self
            .breeding_queue
            .iter()
            .filter_map(|job| job.id().strip_prefix('b')?.parse::<usize>().ok())
            .max()
            .unwrap_or(0);
        format!("b{}", highest.max(self.breeding_queue.len()) + 1)
    }

    /// Advance breeding timers to `now` and hatch every job that is due.
    ///
    /// Unstarted jobs get `now` as their start. A newborn joins its mother's
    /// habitat only when that habitat has room. Jobs whose parents no longer
    /// exist are dropped. Observers are notified only when something hatched.
    /// A non-finite `now` is ignored and leaves the store untouched.
    pub fn breeding_tick(&mut self, now: f64) -> Vec<Armadillo> {
        if !now.is_finite() {
            warn!("ignoring breeding tick at non-finite time {now}");
            return Vec::new();
        }
        self.meta.insert(META_NOW_TS.to_string(), Value::from(now));

        let queue = std::mem::take(&mut self.breeding_queue);
        let mut remaining = Vec::with_capacity(queue.len());
        let mut newborns = Vec::new();
        for mut job in queue {
            job.start_if_unset(now);
            if !job.is_done(now) {
                remaining.push(job);
                continue;
            }
            match self.hatch(&job) {
                Ok(Some(baby)) => {
                    job.complete(baby.clone());
                    self.settle_newborn(job.parent_f_id(), baby.clone());
                    newborns.push(baby);
                }
                Ok(None) => warn!("dropping {}: a parent no longer exists", job.id()),
                Err(err) => warn!("dropping {}: {err}", job.id()),
            }
        }
        self.breeding_queue = remaining;

        if !newborns.is_empty() {
            debug!("{} newborn(s) hatched at {now}", newborns.len());
            self.notify();
        }
        newborns
    }

    fn hatch(&mut self, job: &BreedingJob) -> Result<Option<Armadillo>, BreedingError> {
        let (Some(dad), Some(mom)) = (
            find(&self.armadillos, job.parent_m_id()),
            find(&self.armadillos, job.parent_f_id()),
        ) else {
            return Ok(None);
        };
        let mut baby = hatch_result(dad, mom, self.mutation_chance, &mut self.rng)?;
        while find(&self.armadillos, baby.id()).is_some() {
            baby.reassign_id(newborn_id(&mut self.rng));
        }
        Ok(Some(baby))
    }

    fn settle_newborn(&mut self, mom_id: &str, baby: Armadillo) {
        if let Some(pen) = self.habitats.iter_mut().find(|h| h.contains(mom_id))
            && !pen.add(baby.id())
        {
            debug!("{} is full; {} stays unhoused", pen.id(), baby.id());
        }
        self.dex_colors.insert(baby.color().to_string());
        self.armadillos.push(baby);
    }

    /// Age every armadillo by `days`.
    pub fn advance_days(&mut self, days: u32) {
        if days == 0 {
            return;
        }
        for armadillo in &mut self.armadillos {
            armadillo.grow(days);
        }
        self.notify();
    }

    /// Write a metadata entry. Does not notify observers.
    pub fn set_meta(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.meta.insert(key.into(), value.into());
    }

    // Serialization --------------------------------------------------------

    /// Snapshot of the whole aggregate.
    #[must_use]
    pub fn to_document(&self) -> SaveDocument {
        SaveDocument {
            coins: self.coins,
            inventory: self.inventory.clone(),
            armadillos: self.armadillos.clone(),
            habitats: self.habitats.clone(),
            breeding_queue: self.breeding_queue.clone(),
            dex_colors: self.dex_colors.clone(),
            selected_id: self.selected_id.clone(),
            meta: self.meta.clone(),
        }
    }

    /// Replace the aggregate with a loaded document.
    ///
    /// Repeated armadillo ids keep their first record. Occupants that are
    /// unknown or already housed in an earlier habitat are dropped, lists are
    /// cut to capacity, and an unknown selection is cleared.
    pub fn restore(&mut self, document: SaveDocument) {
        let SaveDocument {
            coins,
            inventory,
            armadillos,
            mut habitats,
            breeding_queue,
            dex_colors,
            selected_id,
            meta,
        } = document;

        let mut known: HashSet<String> = HashSet::with_capacity(armadillos.len());
        let armadillos: Vec<Armadillo> = armadillos
            .into_iter()
            .filter(|d| {
                let fresh = known.insert(d.id().to_string());
                if !fresh {
                    warn!("ignoring repeated armadillo id {}", d.id());
                }
                fresh
            })
            .collect();

        let mut housed: HashSet<String> = HashSet::new();
        for habitat in &mut habitats {
            habitat.sanitize_occupants(|id| known.contains(id) && housed.insert(id.to_string()));
        }

        self.coins = coins;
        self.inventory = inventory;
        self.selected_id = selected_id.filter(|id| known.contains(id));
        self.armadillos = armadillos;
        self.habitats = habitats;
        self.breeding_queue = breeding_queue;
        self.dex_colors = dex_colors;
        self.meta = meta;
        info!(
            "restored farm: {} armadillos, {} habitats, {} jobs",
            self.armadillos.len(),
            self.habitats.len(),
            self.breeding_queue.len()
        );
        self.notify();
    }

    fn selected_mut(&mut self) -> Option<&mut Armadillo> {
        let id = self.selected_id.as_deref()?;
        self.armadillos.iter_mut().find(|d| d.id() == id)
    }
}

fn find<'a>(armadillos: &'a [Armadillo], armadillo_id: &str) -> Option<&'a Armadillo> {
    armadillos.iter().find(|d| d.id() == armadillo_id)
}

fn earns_care_reward(armadillo: &Armadillo) -> bool {
    armadillo.hunger() > CARE_THRESHOLD && armadillo.happiness() > CARE_THRESHOLD
}
