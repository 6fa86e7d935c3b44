//! # Authoritative snake server
//!
//! Holds the only live copy of the game state and advances it on a fixed
//! tick. Two TCP peers each get a player slot at accept time; the session
//! task is the single writer of the game, connection handlers only submit
//! direction and restart requests over a command channel and relay the
//! per-tick snapshot broadcast back to their peer.
//!
//! ## Module organization
//!
//! - [`session`] owns the game and the tick clock: commands in over an
//!   `mpsc`, snapshots out over a `broadcast` channel.
//! - [`net`] accepts connections, performs the handshake, and runs the
//!   per-peer reader and writer tasks. A failure on one connection never
//!   reaches the session or the other peer; the affected player's snake is
//!   frozen in place instead.

pub mod net;
pub mod session;
