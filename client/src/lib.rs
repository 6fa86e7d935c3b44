//! # Terminal snake client
//!
//! Connects to the authoritative server, sends direction requests as
//! two-byte input frames, and renders the per-tick snapshots onto a
//! raw-mode alternate screen. The client never simulates: what it draws is
//! exactly what the server said.
//!
//! The offline [`local`] modes reuse the same engine, input mapping and
//! renderer without a socket: a two-player couch mode (WASD against IJKL)
//! and a single-player mode.

pub mod input;
pub mod local;
pub mod net;
pub mod render;
pub mod term;
