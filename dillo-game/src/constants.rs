//! Centralized economy and tuning constants for Dillo Farm game logic.
//!
//! These values define the balance of the core simulation. Keeping them
//! together ensures that gameplay can only be adjusted via code changes
//! reviewed in version control.

// Costs (in coins) ----------------------------------------------------------
/// Price of one unit of food in the shop.
pub const COST_FOOD: u32 = 5;
/// Price of one toy in the shop.
pub const COST_TOY: u32 = 8;
/// Price of a single habitat upgrade.
pub const COST_HABITAT_UPGRADE: u32 = 25;

// Rewards (in coins) --------------------------------------------------------
/// Bonus paid when a care action leaves both meters above [`CARE_THRESHOLD`].
pub const REWARD_CARE: u32 = 3;
/// Bonus paid per newborn when a clutch hatches.
pub const REWARD_HATCH: u32 = 12;

// Breeding ------------------------------------------------------------------
/// Shortest incubation offered to players.
pub const INCUBATION_MIN_S: u32 = 30;
/// Longest incubation offered to players.
pub const INCUBATION_MAX_S: u32 = 90;
/// Duration substituted when a breeding request asks for less than one second.
pub const DEFAULT_INCUBATION_S: u32 = 30;
/// Mutation chance applied when a tick hatches a job.
pub const HATCH_MUTATION_CHANCE: f64 = 0.05;

// Habitat upgrades ----------------------------------------------------------
pub const UPGRADE_CAPACITY_DELTA: i64 = 1;
pub const UPGRADE_LEVEL_DELTA: i64 = 1;

// Care rules ----------------------------------------------------------------
pub const FEED_AMOUNT: i64 = 20;
pub const PET_AMOUNT: i64 = 15;
/// Both meters must be strictly above this value to earn [`REWARD_CARE`].
pub const CARE_THRESHOLD: u8 = 80;
pub const STAT_MIN: u8 = 0;
pub const STAT_MAX: u8 = 100;
pub const HATCH_BOOST_MAX: u8 = 100;

// Life stage and newborns ---------------------------------------------------
pub const ADULT_AGE_DAYS: u32 = 14;
pub const NEWBORN_HUNGER: i64 = 60;
pub const NEWBORN_HAPPINESS: i64 = 60;
/// Genotype assumed for a parent that carries no `color` gene.
pub const DEFAULT_GENOTYPE: &str = "Aa";
/// Gene key that drives coat color.
pub const COLOR_GENE: &str = "color";

// Starter save --------------------------------------------------------------
pub const STARTER_COINS: u32 = 100;
pub const STARTER_FOOD: u32 = 3;
pub const STARTER_TOYS: u32 = 1;
pub const STARTER_HABITAT_CAPACITY: u32 = 2;

// Inventory keys ------------------------------------------------------------
pub const ITEM_FOOD: &str = "food";
pub const ITEM_TOY: &str = "toy";

// Meta keys -----------------------------------------------------------------
pub const META_NOW_TS: &str = "now_ts";
pub const META_FIRST_RUN: &str = "first_run";

// Session defaults ----------------------------------------------------------
pub const AUTOSAVE_DELAY_S: f64 = 0.6;
pub const TICK_INTERVAL_S: f64 = 0.25;
pub const SAVE_DIR_ENV_VAR: &str = "DILLO_SAVE_DIR";
pub const DEFAULT_SAVE_DIR: &str = ".userdata";
pub const SAVE_FILE_NAME: &str = "save.json";
