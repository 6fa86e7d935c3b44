//! Networked play: handshake, input frames out, snapshot frames in.

use crate::input::{map_key, InputAction};
use crate::render::Renderer;
use crate::term::{self, TermGuard};
use log::{debug, info, warn};
use shared::protocol::{
    decode_snapshot_header, decode_snapshot_payload, verify_version, Handshake, InputFrame,
    Snapshot, HANDSHAKE_LEN, SNAPSHOT_HEADER_LEN,
};
use std::io;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::TcpStream;
use tokio::sync::mpsc;

/// Connects to the server and plays until the peer disconnects or the user
/// quits. The terminal guard is held for the whole game, so any early
/// return restores the shell.
pub async fn run(server_addr: &str) -> Result<(), Box<dyn std::error::Error>> {
    let stream = TcpStream::connect(server_addr).await?;
    // Input frames are two bytes; don't let Nagle sit on them.
    stream.set_nodelay(true)?;
    let (mut read_half, mut write_half) = stream.into_split();

    let mut buf = [0u8; HANDSHAKE_LEN];
    read_half.read_exact(&mut buf).await?;
    let handshake = Handshake::decode(&buf)?;
    verify_version(handshake.version)?;
    let slot = handshake.slot;
    info!(
        "assigned player slot {:?} on a {}x{} grid",
        slot, handshake.rows, handshake.cols
    );

    let _guard = TermGuard::new()?;
    let mut keys = term::spawn_key_reader();
    let mut renderer = Renderer::new(handshake.rows, handshake.cols);

    // Snapshots are read on their own task so a keystroke can never cancel
    // a frame read halfway through and desync the stream.
    let (snapshot_tx, mut snapshot_rx) = mpsc::unbounded_channel::<Snapshot>();
    tokio::spawn(async move {
        loop {
            match read_snapshot(&mut read_half).await {
                Ok(snapshot) => {
                    if snapshot_tx.send(snapshot).is_err() {
                        return;
                    }
                }
                Err(e) => {
                    debug!("snapshot stream over: {}", e);
                    return;
                }
            }
        }
    });

    loop {
        tokio::select! {
            key = keys.recv() => {
                let Some(key) = key else { break };
                match map_key(key) {
                    Some(InputAction::Turn(dir)) => {
                        write_half
                            .write_all(&InputFrame::turn(slot, dir).encode())
                            .await?;
                    }
                    Some(InputAction::Restart) => {
                        write_half
                            .write_all(&InputFrame::restart(slot).encode())
                            .await?;
                    }
                    Some(InputAction::Quit) => break,
                    Some(InputAction::TurnSecond(_)) | None => {}
                }
            }
            snapshot = snapshot_rx.recv() => {
                match snapshot {
                    Some(snapshot) => renderer.draw_duel(&snapshot, Some(slot))?,
                    None => {
                        warn!("server closed the connection");
                        break;
                    }
                }
            }
        }
    }

    Ok(())
}

/// Reads one framed snapshot: fixed header, version check, then exactly the
/// advertised payload length.
async fn read_snapshot(read_half: &mut OwnedReadHalf) -> io::Result<Snapshot> {
    let mut header_buf = [0u8; SNAPSHOT_HEADER_LEN];
    read_half.read_exact(&mut header_buf).await?;
    let header = decode_snapshot_header(&header_buf)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    verify_version(header.version).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    let mut payload = vec![0u8; header.payload_len as usize];
    read_half.read_exact(&mut payload).await?;
    decode_snapshot_payload(&payload).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}
