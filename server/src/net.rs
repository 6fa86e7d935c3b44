//! TCP accept loop and per-connection frame plumbing.
//!
//! Each accepted peer gets a player slot, a handshake, and two tasks: a
//! reader decoding fixed-size input frames into session commands, and a
//! writer encoding the snapshot broadcast back out. Errors on either side
//! tear down that connection only.

use crate::session::SessionCommand;
use log::{debug, error, info, warn};
use shared::grid::PlayerSlot;
use shared::protocol::{
    encode_snapshot, Handshake, InputFrame, InputRequest, Snapshot, INPUT_FRAME_LEN,
    PROTOCOL_VERSION,
};
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc, oneshot};

/// Fixed dimensions advertised in every handshake for this session.
#[derive(Debug, Clone, Copy)]
pub struct GridSize {
    pub rows: u16,
    pub cols: u16,
}

pub fn next_free_slot(slots: &[bool; 2]) -> Option<PlayerSlot> {
    if !slots[0] {
        Some(PlayerSlot::One)
    } else if !slots[1] {
        Some(PlayerSlot::Two)
    } else {
        None
    }
}

/// Accepts connections for the lifetime of the session, binding slot one
/// then slot two. Slots stay bound after a disconnect, so any further
/// connection attempt is refused by closing it immediately.
pub async fn run_listener(
    listener: TcpListener,
    cmd_tx: mpsc::UnboundedSender<SessionCommand>,
    snapshot_tx: broadcast::Sender<Snapshot>,
    grid: GridSize,
) {
    let mut slots = [false; 2];

    loop {
        let (stream, addr) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                error!("accept failed: {}", e);
                continue;
            }
        };

        let Some(slot) = next_free_slot(&slots) else {
            warn!("refusing {}: both player slots are taken", addr);
            drop(stream);
            continue;
        };
        slots[slot.index()] = true;
        info!("peer {} assigned player slot {:?}", addr, slot);

        let cmd_tx = cmd_tx.clone();
        // Subscribe before the handshake so the first tick is not missed.
        let snapshot_rx = snapshot_tx.subscribe();
        tokio::spawn(handle_connection(stream, addr, slot, grid, cmd_tx, snapshot_rx));
    }
}

async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    slot: PlayerSlot,
    grid: GridSize,
    cmd_tx: mpsc::UnboundedSender<SessionCommand>,
    snapshot_rx: broadcast::Receiver<Snapshot>,
) {
    let (read_half, mut write_half) = stream.into_split();

    let (reply, status_rx) = oneshot::channel();
    if cmd_tx.send(SessionCommand::Joined { slot, reply }).is_err() {
        return;
    }
    let status = match status_rx.await {
        Ok(status) => status,
        Err(_) => return,
    };

    let handshake = Handshake {
        version: PROTOCOL_VERSION,
        slot,
        rows: grid.rows,
        cols: grid.cols,
        status,
    };
    if let Err(e) = write_half.write_all(&handshake.encode()).await {
        error!("handshake to {} failed: {}", addr, e);
        let _ = cmd_tx.send(SessionCommand::Left { slot });
        return;
    }

    let writer = tokio::spawn(write_snapshots(write_half, snapshot_rx, slot));
    read_inputs(read_half, addr, slot, &cmd_tx).await;

    // Reader is done, so the peer is gone either way; stop pushing
    // snapshots at a dead socket.
    writer.abort();
    let _ = cmd_tx.send(SessionCommand::Left { slot });
}

/// Inbound loop: fixed-size input frames into session commands. Returns on
/// the first transport error or disconnect. Protocol violations drop the
/// frame but keep the connection.
async fn read_inputs(
    mut read_half: OwnedReadHalf,
    addr: SocketAddr,
    slot: PlayerSlot,
    cmd_tx: &mpsc::UnboundedSender<SessionCommand>,
) {
    let mut buf = [0u8; INPUT_FRAME_LEN];

    loop {
        if let Err(e) = read_half.read_exact(&mut buf).await {
            debug!("peer {} read loop over: {}", addr, e);
            return;
        }
        let frame = InputFrame::decode(&buf);
        if let Err(e) = frame.verify(slot) {
            warn!("dropping input frame from {}: {}", addr, e);
            continue;
        }

        let cmd = match frame.request {
            InputRequest::Turn(direction) => SessionCommand::Input { slot, direction },
            InputRequest::Restart => SessionCommand::Restart { slot },
        };
        if cmd_tx.send(cmd).is_err() {
            return;
        }
    }
}

/// Outbound loop: snapshot broadcast into framed writes. A lagging peer
/// skips frames; a closed channel or write error ends the loop.
async fn write_snapshots(
    mut write_half: OwnedWriteHalf,
    mut snapshot_rx: broadcast::Receiver<Snapshot>,
    slot: PlayerSlot,
) {
    loop {
        let snapshot = match snapshot_rx.recv().await {
            Ok(snapshot) => snapshot,
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!("writer for {:?} lagged, skipped {} snapshots", slot, n);
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => return,
        };

        let frame = match encode_snapshot(&snapshot) {
            Ok(frame) => frame,
            Err(e) => {
                error!("snapshot encoding failed: {}", e);
                return;
            }
        };
        if let Err(e) = write_half.write_all(&frame).await {
            debug!("writer for {:?} over: {}", slot, e);
            return;
        }
    }
}
