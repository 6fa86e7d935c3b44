//! Binary wire protocol between server and client.
//!
//! Three frame kinds flow over the TCP stream:
//!
//! - handshake (server to client, once): `version (1 byte) | slot (1 byte,
//!   bit 0) | rows (u16 BE) | cols (u16 BE) | status (1 byte)`
//! - input (client to server, repeatable): `version (1 byte) | packed
//!   (1 byte)` where packed is `bit 3 restart | bit 2 slot | bits 0-1
//!   direction` (00 up, 01 right, 10 left, 11 down)
//! - snapshot (server to client, once per tick): `version (1 byte) |
//!   payload length (u32 BE) | bincode payload`
//!
//! Decoding is deliberately permissive about the version byte so a frame
//! round-trips for any version value; rejecting a mismatched version (and a
//! wrong player slot on the server side) is the caller's job via `verify`.

use crate::game::GameStatus;
use crate::grid::{Cell, Direction, PlayerSlot};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const PROTOCOL_VERSION: u8 = 1;

pub const HANDSHAKE_LEN: usize = 7;
pub const INPUT_FRAME_LEN: usize = 2;
pub const SNAPSHOT_HEADER_LEN: usize = 5;

/// Upper bound on a snapshot payload; a 30x60 grid snapshot is well under
/// a kilobyte, so anything near this is a corrupt or hostile length field.
pub const MAX_SNAPSHOT_PAYLOAD: u32 = 64 * 1024;

const RESTART_BIT: u8 = 0b1000;
const SLOT_BIT: u8 = 0b0100;
const DIR_MASK: u8 = 0b0011;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("protocol version mismatch: expected {expected}, got {got}")]
    VersionMismatch { expected: u8, got: u8 },
    #[error("input frame for the wrong player slot")]
    SlotMismatch,
    #[error("unknown game status byte {0}")]
    BadStatus(u8),
    #[error("snapshot payload of {0} bytes exceeds the frame limit")]
    OversizedSnapshot(u32),
    #[error("malformed frame payload")]
    Malformed,
}

/// Checks a decoded version byte against the one this build speaks.
pub fn verify_version(got: u8) -> Result<(), ProtocolError> {
    if got != PROTOCOL_VERSION {
        return Err(ProtocolError::VersionMismatch {
            expected: PROTOCOL_VERSION,
            got,
        });
    }
    Ok(())
}

/// Sent by the server immediately after accepting a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Handshake {
    pub version: u8,
    pub slot: PlayerSlot,
    pub rows: u16,
    pub cols: u16,
    pub status: GameStatus,
}

impl Handshake {
    pub fn encode(&self) -> [u8; HANDSHAKE_LEN] {
        let mut buf = [0u8; HANDSHAKE_LEN];
        buf[0] = self.version;
        buf[1] = self.slot.wire_bit();
        buf[2..4].copy_from_slice(&self.rows.to_be_bytes());
        buf[4..6].copy_from_slice(&self.cols.to_be_bytes());
        buf[6] = self.status.wire_byte();
        buf
    }

    pub fn decode(buf: &[u8; HANDSHAKE_LEN]) -> Result<Self, ProtocolError> {
        let status =
            GameStatus::from_wire_byte(buf[6]).ok_or(ProtocolError::BadStatus(buf[6]))?;
        Ok(Self {
            version: buf[0],
            slot: PlayerSlot::from_wire_bit(buf[1]),
            rows: u16::from_be_bytes([buf[2], buf[3]]),
            cols: u16::from_be_bytes([buf[4], buf[5]]),
            status,
        })
    }
}

/// What an input frame asks the session to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputRequest {
    Turn(Direction),
    /// Start a fresh game from a terminal state. Carried in a spare bit of
    /// the packed byte; the direction bits are ignored when it is set.
    Restart,
}

/// Fixed-size client-to-server frame carrying one direction or restart
/// request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputFrame {
    pub version: u8,
    pub slot: PlayerSlot,
    pub request: InputRequest,
}

impl InputFrame {
    pub fn turn(slot: PlayerSlot, dir: Direction) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            slot,
            request: InputRequest::Turn(dir),
        }
    }

    pub fn restart(slot: PlayerSlot) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            slot,
            request: InputRequest::Restart,
        }
    }

    pub fn encode(&self) -> [u8; INPUT_FRAME_LEN] {
        let mut packed = self.slot.wire_bit() << 2;
        match self.request {
            InputRequest::Turn(dir) => packed |= dir.wire_bits(),
            InputRequest::Restart => packed |= RESTART_BIT,
        }
        [self.version, packed]
    }

    pub fn decode(buf: &[u8; INPUT_FRAME_LEN]) -> Self {
        let packed = buf[1];
        let slot = PlayerSlot::from_wire_bit((packed & SLOT_BIT) >> 2);
        let request = if packed & RESTART_BIT != 0 {
            InputRequest::Restart
        } else {
            // Masked to two bits, so every pattern decodes.
            InputRequest::Turn(match packed & DIR_MASK {
                0b00 => Direction::Up,
                0b01 => Direction::Right,
                0b10 => Direction::Left,
                _ => Direction::Down,
            })
        };
        Self {
            version: buf[0],
            slot,
            request,
        }
    }

    /// Server-side validation: the frame must carry the current protocol
    /// version and the slot assigned to the connection it arrived on.
    pub fn verify(&self, assigned: PlayerSlot) -> Result<(), ProtocolError> {
        verify_version(self.version)?;
        if self.slot != assigned {
            return Err(ProtocolError::SlotMismatch);
        }
        Ok(())
    }
}

/// Complete per-tick state description, enough for a client to render the
/// whole grid without any history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub status: GameStatus,
    pub scores: [u16; 2],
    pub snakes: [Vec<Cell>; 2],
    pub fruit: Cell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotHeader {
    pub version: u8,
    pub payload_len: u32,
}

/// Encodes a complete snapshot frame: header plus bincode payload.
pub fn encode_snapshot(snapshot: &Snapshot) -> Result<Vec<u8>, ProtocolError> {
    let payload = bincode::serialize(snapshot).map_err(|_| ProtocolError::Malformed)?;
    let len = payload.len() as u32;
    if len > MAX_SNAPSHOT_PAYLOAD {
        return Err(ProtocolError::OversizedSnapshot(len));
    }
    let mut frame = Vec::with_capacity(SNAPSHOT_HEADER_LEN + payload.len());
    frame.push(PROTOCOL_VERSION);
    frame.extend_from_slice(&len.to_be_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}

pub fn decode_snapshot_header(
    buf: &[u8; SNAPSHOT_HEADER_LEN],
) -> Result<SnapshotHeader, ProtocolError> {
    let payload_len = u32::from_be_bytes([buf[1], buf[2], buf[3], buf[4]]);
    if payload_len > MAX_SNAPSHOT_PAYLOAD {
        return Err(ProtocolError::OversizedSnapshot(payload_len));
    }
    Ok(SnapshotHeader {
        version: buf[0],
        payload_len,
    })
}

pub fn decode_snapshot_payload(buf: &[u8]) -> Result<Snapshot, ProtocolError> {
    bincode::deserialize(buf).map_err(|_| ProtocolError::Malformed)
}
