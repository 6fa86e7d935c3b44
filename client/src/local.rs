//! Offline play: the full simulation runs inside the client process.

use crate::input::{map_key, InputAction};
use crate::render::Renderer;
use crate::term::{self, TermGuard};
use rand::rngs::StdRng;
use rand::SeedableRng;
use shared::game::{DuelGame, SoloGame};
use shared::grid::PlayerSlot;
use shared::{GRID_COLS, GRID_ROWS, TICK_INTERVAL_MS};
use std::time::Duration;
use tokio::time::{self, MissedTickBehavior};

/// Two players on one keyboard: WASD/arrows steer player one, IJKL steers
/// player two.
pub async fn run_local() -> Result<(), Box<dyn std::error::Error>> {
    let _guard = TermGuard::new()?;
    let mut keys = term::spawn_key_reader();
    let mut rng = StdRng::from_entropy();
    let mut game = DuelGame::new(GRID_ROWS as i16, GRID_COLS as i16, &mut rng)?;
    game.start(&mut rng)?;
    let mut renderer = Renderer::new(GRID_ROWS, GRID_COLS);

    let mut ticker = time::interval(Duration::from_millis(TICK_INTERVAL_MS));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            key = keys.recv() => {
                let Some(key) = key else { break };
                match map_key(key) {
                    Some(InputAction::Turn(dir)) => game.set_direction(PlayerSlot::One, dir),
                    Some(InputAction::TurnSecond(dir)) => game.set_direction(PlayerSlot::Two, dir),
                    Some(InputAction::Restart) => game.restart(&mut rng)?,
                    Some(InputAction::Quit) => break,
                    None => {}
                }
            }
            _ = ticker.tick() => {
                game.tick(&mut rng)?;
                renderer.draw_duel(&game.snapshot(), None)?;
            }
        }
    }

    Ok(())
}

/// Classic single-player snake on the same grid.
pub async fn run_solo() -> Result<(), Box<dyn std::error::Error>> {
    let _guard = TermGuard::new()?;
    let mut keys = term::spawn_key_reader();
    let mut rng = StdRng::from_entropy();
    let mut game = SoloGame::new(GRID_ROWS as i16, GRID_COLS as i16, &mut rng)?;
    let mut renderer = Renderer::new(GRID_ROWS, GRID_COLS);

    let mut ticker = time::interval(Duration::from_millis(TICK_INTERVAL_MS));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            key = keys.recv() => {
                let Some(key) = key else { break };
                match map_key(key) {
                    Some(InputAction::Turn(dir)) | Some(InputAction::TurnSecond(dir)) => {
                        game.set_direction(dir)
                    }
                    Some(InputAction::Restart) => game.restart(&mut rng)?,
                    Some(InputAction::Quit) => break,
                    None => {}
                }
            }
            _ = ticker.tick() => {
                game.tick(&mut rng)?;
                renderer.draw_solo(&game)?;
            }
        }
    }

    Ok(())
}
