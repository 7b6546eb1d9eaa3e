use anyhow::{Result, ensure};
use dillo_game::constants::{COST_FOOD, ITEM_FOOD, ITEM_TOY};
use dillo_game::{FarmConfig, FarmSession, GameState, MemoryStorage, Sex, StartKind};

use super::{ScenarioCtx, check_invariants};

/// New game from nothing, then a couple of shop purchases.
pub fn run(ctx: &ScenarioCtx) -> Result<()> {
    let mut session = ctx.memory_session()?;
    ensure!(session.is_first_run(), "Empty storage must start a new farm");
    ensure!(session.save_count() == 1, "New farm must be saved immediately");

    let state = session.state();
    ensure!(state.coins() == 100, "Starter coins were {}", state.coins());
    ensure!(state.inventory_count(ITEM_FOOD) == 3, "Starter food must be 3");
    ensure!(state.inventory_count(ITEM_TOY) == 1, "Starter toys must be 1");
    ensure!(state.adults().len() == 3, "All three starters must be adults");
    let males = state
        .armadillos()
        .iter()
        .filter(|d| d.sex() == Sex::Male)
        .count();
    ensure!(males == 2, "Starters must be two males and one female");
    let dex: Vec<&str> = state.dex_colors().iter().map(String::as_str).collect();
    ensure!(dex == ["Albino", "Blue", "Brown"], "Unexpected dex {dex:?}");
    ensure!(
        state
            .habitats()
            .iter()
            .all(|h| h.capacity() == 2 && h.occupants().is_empty()),
        "Starter habitats must be empty with capacity 2"
    );
    check_invariants(state)?;

    let state = session.state_mut();
    ensure!(state.buy(ITEM_FOOD, COST_FOOD), "Buying food with 100 coins failed");
    ensure!(state.coins() == 95, "Food should cost 5 coins");
    ensure!(state.inventory_count(ITEM_FOOD) == 4, "Food count should be 4");

    state.add_coins(-92);
    let before = state.to_document();
    ensure!(
        !state.buy(ITEM_FOOD, COST_FOOD),
        "Buying with 3 coins must be rejected"
    );
    ensure!(
        state.to_document() == before,
        "Rejected purchase changed the state"
    );
    ctx.log("starter farm and shop checks passed");

    ensure!(session.on_stop(), "Final save failed");
    let saved = session
        .storage()
        .contents()
        .ok_or_else(|| anyhow::anyhow!("Memory slot is empty after save"))?;
    let storage = MemoryStorage::new();
    storage.overwrite(saved);
    let mut resumed = FarmSession::new(
        storage,
        FarmConfig::default(),
        GameState::with_seed(ctx.seed.wrapping_add(1)),
    )?;
    ensure!(
        resumed.start() == StartKind::Loaded,
        "Saved farm must be resumed"
    );
    ensure!(!resumed.is_first_run(), "Resumed farm is not a first run");
    ensure!(resumed.state().coins() == 3, "Resumed coins must be 3");
    Ok(())
}
