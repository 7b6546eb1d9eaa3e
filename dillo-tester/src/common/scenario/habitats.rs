use anyhow::{Context, Result, ensure};
use dillo_game::GameState;
use dillo_game::constants::{COST_HABITAT_UPGRADE, UPGRADE_CAPACITY_DELTA};

use super::{ScenarioCtx, check_invariants};

pub fn run(ctx: &ScenarioCtx) -> Result<()> {
    let mut state = ctx.seeded_state();

    ensure!(
        !state.move_selected_to_habitat("h1"),
        "Moving with no selection must fail"
    );
    place(&mut state, "d1", "h1")?;
    place(&mut state, "d2", "h1")?;
    place(&mut state, "d3", "h2")?;

    // h1 is full
    let before = state.to_document();
    ensure!(
        !state.move_selected_to_habitat("h1"),
        "Moving into a full habitat must fail"
    );
    ensure!(state.to_document() == before, "Failed move changed state");
    ensure!(!state.move_selected_to_habitat("h9"), "Unknown habitat");

    let elsewhere = occupancy_outside(&state, "h3");
    place(&mut state, "d1", "h3")?;
    ensure!(
        occupancy_outside(&state, "h3") == elsewhere - 1,
        "Old habitat must lose the mover"
    );
    ensure!(
        state.habitat("h1").context("h1 missing")?.occupants() == ["d2"],
        "d1 must leave h1"
    );
    place(&mut state, "d2", "h2")?;
    place(&mut state, "d3", "h2")?;
    ensure!(
        state.habitat("h2").context("h2 missing")?.occupants() == ["d2", "d3"],
        "Moving into the current full habitat re-queues at the back"
    );

    ensure!(
        !state.upgrade_habitat("h2", COST_HABITAT_UPGRADE, 0),
        "Zero capacity delta must be rejected"
    );
    ensure!(
        !state.upgrade_habitat("h7", COST_HABITAT_UPGRADE, 1),
        "Unknown habitat cannot be upgraded"
    );
    let mut upgrades = 0;
    while state.upgrade_habitat("h2", COST_HABITAT_UPGRADE, UPGRADE_CAPACITY_DELTA) {
        upgrades += 1;
    }
    ensure!(upgrades == 4, "100 coins buy four upgrades, got {upgrades}");
    let pen = state.habitat("h2").context("h2 missing")?;
    ensure!(
        (pen.level(), pen.capacity()) == (5, 6),
        "Upgrades raise level and capacity"
    );
    ensure!(state.coins() == 0, "Upgrades spend all coins");
    ctx.log(format!("h2 reached level {}", pen.level()));

    check_invariants(&state)
}

fn place(state: &mut GameState, armadillo_id: &str, habitat_id: &str) -> Result<()> {
    ensure!(state.select(Some(armadillo_id)), "Selecting {armadillo_id} failed");
    ensure!(
        state.move_selected_to_habitat(habitat_id),
        "Moving {armadillo_id} into {habitat_id} failed"
    );
    Ok(())
}

fn occupancy_outside(state: &GameState, habitat_id: &str) -> usize {
    state
        .habitats()
        .iter()
        .filter(|h| h.id() != habitat_id)
        .map(|h| h.occupants().len())
        .sum()
}
