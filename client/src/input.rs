//! Keyboard to game-action mapping.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use shared::grid::Direction;

/// What a key press means to the game loops. `Turn` is the primary player
/// (WASD or arrows); `TurnSecond` is the IJKL set, only meaningful in the
/// offline two-player mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    Turn(Direction),
    TurnSecond(Direction),
    Restart,
    Quit,
}

pub fn map_key(key: KeyEvent) -> Option<InputAction> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(InputAction::Quit);
    }

    match key.code {
        KeyCode::Char('w') | KeyCode::Up => Some(InputAction::Turn(Direction::Up)),
        KeyCode::Char('s') | KeyCode::Down => Some(InputAction::Turn(Direction::Down)),
        KeyCode::Char('a') | KeyCode::Left => Some(InputAction::Turn(Direction::Left)),
        KeyCode::Char('d') | KeyCode::Right => Some(InputAction::Turn(Direction::Right)),

        KeyCode::Char('i') => Some(InputAction::TurnSecond(Direction::Up)),
        KeyCode::Char('k') => Some(InputAction::TurnSecond(Direction::Down)),
        KeyCode::Char('j') => Some(InputAction::TurnSecond(Direction::Left)),
        KeyCode::Char('l') => Some(InputAction::TurnSecond(Direction::Right)),

        KeyCode::Char('r') => Some(InputAction::Restart),
        KeyCode::Char('q') | KeyCode::Esc => Some(InputAction::Quit),
        _ => None,
    }
}
