//! Raw-mode terminal acquisition and the blocking key pump.

use crossterm::event::{read, Event, KeyEvent};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::{cursor, execute};
use std::io::stdout;
use tokio::sync::mpsc;

/// Puts the terminal into raw mode on an alternate screen with the cursor
/// hidden, and restores all of it on drop. Holding one of these is the only
/// way the rest of the client touches terminal modes, so every exit path,
/// error returns included, leaves the shell usable.
pub struct TermGuard {
    _private: (),
}

impl TermGuard {
    pub fn new() -> crossterm::Result<Self> {
        execute!(stdout(), EnterAlternateScreen, cursor::Hide)?;
        enable_raw_mode()?;
        Ok(TermGuard { _private: () })
    }
}

impl Drop for TermGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(stdout(), cursor::Show, LeaveAlternateScreen);
    }
}

/// Spawns a blocking task that waits on terminal events and forwards key
/// presses over a channel, so async loops can select on input without
/// polling. The task ends when the receiver is dropped or stdin fails.
pub fn spawn_key_reader() -> mpsc::UnboundedReceiver<KeyEvent> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::task::spawn_blocking(move || loop {
        match read() {
            Ok(Event::Key(key)) => {
                if tx.send(key).is_err() {
                    return;
                }
            }
            Ok(_) => {}
            Err(_) => return,
        }
    });
    rx
}
