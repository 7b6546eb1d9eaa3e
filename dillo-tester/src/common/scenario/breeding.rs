use anyhow::{Context, Result, ensure};
use dillo_game::{JobStatus, Sex};

use super::{ScenarioCtx, check_invariants};

pub fn run(ctx: &ScenarioCtx) -> Result<()> {
    let mut session = ctx.memory_session()?;
    let reward = session.config().hatch_reward;

    {
        let state = session.state_mut();
        ensure!(state.select(Some("d2")), "Selecting d2 failed");
        ensure!(state.move_selected_to_habitat("h3"), "Moving d2 failed");

        ensure!(state.start_breeding("d1", "d1", 30).is_none(), "Self pairing");
        ensure!(state.start_breeding("d2", "d1", 30).is_none(), "Swapped sexes");
        ensure!(state.start_breeding("d1", "d3", 30).is_none(), "Two males");
        ensure!(state.start_breeding("d1", "zz", 30).is_none(), "Missing mom");

        let job = state
            .start_breeding("d1", "d2", 30)
            .context("Valid pairing was rejected")?;
        ensure!(job.status() == JobStatus::Incubating, "New job incubates");
        ensure!(!job.is_started(), "Countdown starts on the next tick");
        ensure!(state.breeding_queue().len() == 1, "Job must be queued");
    }

    let report = session.tick(1_000.0);
    ensure!(!report.hatched(), "Nothing hatches on the starting tick");
    let started = session.state().breeding_queue()[0].start_ts();
    ensure!(started == 1_000.0, "Lazy start should be 1000, was {started}");
    ensure!(!session.tick(1_029.0).hatched(), "One second still remains");

    let report = session.tick(1_030.0);
    ensure!(report.newborns.len() == 1, "Exactly one newborn expected");
    ensure!(report.coins_awarded == reward, "Hatch reward must be paid");
    let baby = &report.newborns[0];
    ensure!(
        (baby.age_days(), baby.hunger(), baby.happiness()) == (0, 60, 60),
        "Newborn attributes are fixed"
    );
    ensure!(baby.is_baby(), "Newborn must be a baby");

    let state = session.state();
    ensure!(state.breeding_queue().is_empty(), "Finished job leaves queue");
    ensure!(state.armadillos().len() == 4, "Newborn joins the farm");
    ensure!(state.coins() == 100 + reward, "Coins after one hatch");
    ensure!(
        state.dex_colors().contains(baby.color()),
        "Dex must record {}",
        baby.color()
    );
    ensure!(
        state.habitat_of(baby.id()).map(|h| h.id()) == Some("h3"),
        "Newborn moves in with its mother"
    );
    check_invariants(state)?;

    // h3 is now full, so the next clutch stays unhoused
    let state = session.state_mut();
    state
        .start_breeding("d3", "d2", 5)
        .context("Second pairing was rejected")?;
    session.tick(1_031.0);
    let report = session.tick(1_036.0);
    let second = report.newborns.first().context("Second clutch missing")?;
    ensure!(
        session.state().habitat_of(second.id()).is_none(),
        "Newborn in a full pen stays unhoused"
    );
    ensure!(
        session.state().coins() == 100 + 2 * reward,
        "Each clutch pays once"
    );

    let baby_id = baby.id().to_string();
    let (dad, mom) = match baby.sex() {
        Sex::Male => (baby_id.as_str(), "d2"),
        Sex::Female => ("d1", baby_id.as_str()),
    };
    let state = session.state_mut();
    ensure!(state.start_breeding(dad, mom, 30).is_none(), "Babies can't breed");
    state.advance_days(14);
    ensure!(
        state.start_breeding(dad, mom, 30).is_some(),
        "Grown babies can breed"
    );
    ctx.log(format!("{} armadillos after breeding", state.armadillos().len()));

    check_invariants(session.state())
}
