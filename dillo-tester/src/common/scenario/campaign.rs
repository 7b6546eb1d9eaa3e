use anyhow::{Context, Result, ensure};
use dillo_game::constants::{
    COST_FOOD, COST_HABITAT_UPGRADE, COST_TOY, INCUBATION_MAX_S, INCUBATION_MIN_S, ITEM_FOOD,
    ITEM_TOY,
};
use dillo_game::{
    FarmConfig, FarmSession, GameState, MemoryStorage, SaveDocument, Sex, StartKind,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use super::{ScenarioCtx, check_invariants};

const VIRTUAL_MINUTES: u32 = 20;
const ACTION_EVERY_TICKS: u32 = 6;

/// Seeded random play over a stretch of virtual time, checking the store's
/// rules after every tick and resuming from the last save at the end.
pub fn run(ctx: &ScenarioCtx) -> Result<()> {
    let mut rng = ChaCha20Rng::seed_from_u64(ctx.seed);
    let mut session = ctx.memory_session()?;
    let step = session.config().tick_interval_s;
    let ticks = (f64::from(VIRTUAL_MINUTES) * 60.0 / step) as u32;

    let mut now = 0.0;
    let mut hatched = 0_usize;
    let mut autosaves = 0_u32;
    for tick in 0..ticks {
        if tick % ACTION_EVERY_TICKS == 0 {
            play_random_action(session.state_mut(), &mut rng);
        }
        now += step;
        let report = session.tick(now);
        hatched += report.newborns.len();
        autosaves += u32::from(report.saved);
        check_invariants(session.state())
            .with_context(|| format!("Invariant broken at t={now:.2}s"))?;
    }
    ctx.log(format!(
        "{hatched} newborns, {autosaves} autosaves, {} coins",
        session.state().coins()
    ));
    ensure!(autosaves > 0, "A long session must autosave");

    ensure!(session.on_stop(), "Final save failed");
    let saved = session.state().to_document();
    let storage = MemoryStorage::new();
    storage.overwrite(
        session
            .storage()
            .contents()
            .context("Nothing was saved")?,
    );
    let mut resumed = FarmSession::new(
        storage,
        FarmConfig::default(),
        GameState::with_seed(ctx.seed.rotate_left(17)),
    )?;
    ensure!(resumed.start() == StartKind::Loaded, "Campaign must resume");
    ensure!(
        without_meta(resumed.state().to_document()) == without_meta(saved),
        "Resumed farm differs from the saved one"
    );
    check_invariants(resumed.state())
}

fn play_random_action(state: &mut GameState, rng: &mut ChaCha20Rng) {
    let ids: Vec<String> = state
        .armadillos()
        .iter()
        .map(|d| d.id().to_string())
        .collect();
    if ids.is_empty() {
        return;
    }
    let pick = &ids[rng.gen_range(0..ids.len())];
    let habitat = format!("h{}", rng.gen_range(1..=3));
    match rng.gen_range(0..10) {
        0 | 1 => {
            state.select(Some(pick.as_str()));
        }
        2 => {
            let _ = state.feed_selected();
        }
        3 => {
            let _ = state.pet_selected();
        }
        4 => {
            let _ = state.move_selected_to_habitat(&habitat);
        }
        5 => {
            let _ = state.buy(ITEM_FOOD, COST_FOOD);
        }
        6 => {
            let _ = state.buy(ITEM_TOY, COST_TOY);
        }
        7 => {
            let _ = state.upgrade_habitat(&habitat, COST_HABITAT_UPGRADE, 1);
        }
        8 => {
            let pair = {
                let adults = state.adults();
                let first_of = |sex: Sex| {
                    adults
                        .iter()
                        .find(|d| d.sex() == sex)
                        .map(|d| d.id().to_string())
                };
                first_of(Sex::Male).zip(first_of(Sex::Female))
            };
            if let Some((dad, mom)) = pair {
                let duration = rng.gen_range(INCUBATION_MIN_S..=INCUBATION_MAX_S);
                state.start_breeding(&dad, &mom, i64::from(duration));
            }
        }
        _ => state.advance_days(rng.gen_range(0..2)),
    }
}

fn without_meta(mut document: SaveDocument) -> SaveDocument {
    document.meta.clear();
    document
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_actions_never_break_rules() {
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        let mut state = GameState::with_seed(5);
        state.seed_starters();
        for _ in 0..300 {
            play_random_action(&mut state, &mut rng);
            check_invariants(&state).unwrap();
        }
    }
}
