use anyhow::{Context, Result, ensure};
use dillo_game::constants::{COST_TOY, ITEM_TOY, SAVE_FILE_NAME};
use dillo_game::{
    FarmConfig, FarmSession, GameEngine, GameState, GameStorage, JsonFileStorage, StartKind,
};
use std::fs;
use std::path::Path;

use super::{ScenarioCtx, check_invariants};
use crate::common::run_dir;

pub fn run(ctx: &ScenarioCtx) -> Result<()> {
    let dir = run_dir(&ctx.save_base, "persistence", ctx.seed);
    let path = dir.join(SAVE_FILE_NAME);
    ctx.log(format!("saving under {}", path.display()));

    let mut session = open(ctx, &path, 0)?;
    ensure!(session.start() == StartKind::Seeded, "No file means new farm");
    ensure!(path.exists(), "New farm must be written to disk");
    ensure!(
        !dir.join(format!("{SAVE_FILE_NAME}.tmp")).exists(),
        "Temp file must be renamed away"
    );

    {
        let state = session.state_mut();
        ensure!(state.buy(ITEM_TOY, COST_TOY), "Toy purchase failed");
        ensure!(state.select(Some("d2")), "Selecting d2 failed");
        ensure!(state.move_selected_to_habitat("h2"), "Move failed");
        state.start_breeding("d3", "d2", 45).context("Pairing rejected")?;
    }
    session.tick(500.0);
    ensure!(session.pending_autosave().is_some(), "Mutations arm autosave");
    ensure!(!session.tick(500.25).saved, "Autosave waits for the delay");
    ensure!(session.tick(500.75).saved, "Autosave fires after the delay");
    let saved = session.state().to_document();

    // Clean reload
    let mut reloaded = GameState::with_seed(ctx.seed.wrapping_add(7));
    GameEngine::new(JsonFileStorage::new(&path)).load_into(&mut reloaded)?;
    ensure!(
        reloaded.to_document() == saved,
        "Reloaded farm differs from the saved one"
    );
    check_invariants(&reloaded)?;

    let mut resumed = open(ctx, &path, 1)?;
    ensure!(resumed.start() == StartKind::Loaded, "Saved farm must load");
    ensure!(
        resumed.state().breeding_queue()[0].start_ts() == 500.0,
        "Job start time survives a restart"
    );

    // Corrupt file reseeds
    fs::write(&path, "{ truncated").context("Corrupting the save")?;
    let mut corrupted = open(ctx, &path, 2)?;
    ensure!(
        corrupted.start() == StartKind::Seeded,
        "Corrupt save must reseed"
    );
    ensure!(corrupted.state().coins() == 100, "Reseeded coins");
    ensure!(
        corrupted.state().breeding_queue().is_empty(),
        "Reseeded queue is empty"
    );

    // Missing file reseeds
    let storage = JsonFileStorage::new(&path);
    storage.delete_save()?;
    storage.delete_save()?;
    ensure!(!path.exists(), "Delete must remove the file");
    let mut missing = open(ctx, &path, 3)?;
    ensure!(missing.start() == StartKind::Seeded, "Missing save reseeds");
    ensure!(missing.is_first_run(), "Reseeded farm is a first run");

    let _ = fs::remove_dir_all(&dir);
    Ok(())
}

fn open(ctx: &ScenarioCtx, path: &Path, salt: u64) -> Result<FarmSession<JsonFileStorage>> {
    let dir = path.parent().and_then(Path::to_str);
    let config = FarmConfig::from_env().with_save_dir_override(dir);
    let state = GameState::with_seed(ctx.seed.wrapping_add(salt));
    let session = FarmSession::open(config, state)?;
    ensure!(
        session.storage().path() == path,
        "Session must save to the configured path"
    );
    Ok(session)
}
