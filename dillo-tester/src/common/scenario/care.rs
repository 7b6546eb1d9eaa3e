use anyhow::{Context, Result, ensure};
use dillo_game::GameState;
use dillo_game::constants::{ITEM_FOOD, REWARD_CARE};

use super::{ScenarioCtx, check_invariants};

pub fn run(ctx: &ScenarioCtx) -> Result<()> {
    let mut state = ctx.seeded_state();

    ensure!(!state.feed_selected(), "Feeding with no selection must fail");
    ensure!(!state.pet_selected(), "Petting with no selection must fail");

    ensure!(state.select(Some("d1")), "Selecting d1 failed");
    ensure!(state.pet_selected(), "Petting d1 failed");
    ensure!(meters(&state)? == (70, 85), "Pet should add 15 happiness");
    ensure!(state.coins() == 100, "No reward while hunger is 70");

    ensure!(state.feed_selected(), "Feeding d1 failed");
    ensure!(meters(&state)? == (90, 85), "Feed should add 20 hunger");
    ensure!(
        state.coins() == 100 + REWARD_CARE,
        "Both meters above 80 pay the care reward"
    );
    ensure!(state.inventory_count(ITEM_FOOD) == 2, "Feeding eats one food");

    ensure!(state.select(Some("d3")), "Selecting d3 failed");
    ensure!(state.feed_selected(), "Feeding d3 failed");
    ensure!(meters(&state)? == (100, 60), "Hunger must clamp at 100");
    ensure!(state.pet_selected() && state.pet_selected(), "Petting d3 failed");
    ensure!(state.coins() == 100 + 2 * REWARD_CARE, "Second pet pays");

    ensure!(state.feed_selected(), "Last food should still feed");
    ensure!(state.inventory_count(ITEM_FOOD) == 0, "Food should be gone");
    let before = state.to_document();
    ensure!(!state.feed_selected(), "Feeding without food must fail");
    ensure!(state.to_document() == before, "Failed feed changed state");

    for _ in 0..10 {
        ensure!(state.pet_selected(), "Petting never needs items");
    }
    ensure!(meters(&state)?.1 == 100, "Happiness must clamp at 100");
    ctx.log(format!("care loop ended with {} coins", state.coins()));

    check_invariants(&state)
}

fn meters(state: &GameState) -> Result<(u8, u8)> {
    let selected = state.get_selected().context("Nothing is selected")?;
    Ok((selected.hunger(), selected.happiness()))
}
