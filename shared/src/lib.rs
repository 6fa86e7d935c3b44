//! Shared game model and wire protocol for the termsnake server and client.
//!
//! Everything in here is pure: the grid/entity model and the tick engines do
//! no I/O, and the protocol codec only moves bytes. The server owns the only
//! live game state and drives it; the client decodes snapshots and renders.

pub mod game;
pub mod grid;
pub mod protocol;

/// Default grid size, border ring included.
pub const GRID_ROWS: u16 = 30;
pub const GRID_COLS: u16 = 60;

/// Simulation period in milliseconds.
pub const TICK_INTERVAL_MS: u64 = 100;

/// Smallest grid the duel starting layout fits into without the two snakes
/// overlapping, border ring included. The column bound comes from player
/// one's block at `cols/3..=cols/3+3` having to clear player two's upper
/// cells at `cols/2-3`.
pub const MIN_GRID_ROWS: u16 = 12;
pub const MIN_GRID_COLS: u16 = 38;
