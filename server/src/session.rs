//! Session coordinator: the single writer of the game state.
//!
//! Connection handlers feed [`SessionCommand`]s into an unbounded channel;
//! the session applies them between ticks, advances the simulation on a
//! fixed interval, and broadcasts each tick's snapshot to every connected
//! writer task. Input is buffered last-write-wins inside the game itself,
//! so a slow or silent peer never stalls the clock.

use log::{error, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use shared::game::{DuelGame, GameStatus};
use shared::grid::{Direction, GameError, PlayerSlot};
use shared::protocol::Snapshot;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::{interval, MissedTickBehavior};

/// Capacity of the snapshot fan-out; a writer that falls this far behind
/// starts skipping frames rather than blocking the tick task.
const SNAPSHOT_CHANNEL_CAPACITY: usize = 32;

/// Everything a connection handler may ask of the session.
#[derive(Debug)]
pub enum SessionCommand {
    /// A peer completed the TCP accept for `slot`; the reply carries the
    /// game status its handshake should advertise.
    Joined {
        slot: PlayerSlot,
        reply: oneshot::Sender<GameStatus>,
    },
    /// Direction request decoded from an input frame.
    Input { slot: PlayerSlot, direction: Direction },
    /// Restart request; honored only from a terminal state.
    Restart { slot: PlayerSlot },
    /// The peer's connection ended; its snake freezes in place.
    Left { slot: PlayerSlot },
}

pub struct Session {
    game: DuelGame,
    rng: StdRng,
    joined: [bool; 2],
    tick_period: Duration,
    cmd_rx: mpsc::UnboundedReceiver<SessionCommand>,
    snapshot_tx: broadcast::Sender<Snapshot>,
}

impl Session {
    /// Builds the session plus the two channel endpoints the network layer
    /// needs: the command sender and the snapshot broadcaster to subscribe
    /// writer tasks on.
    pub fn new(
        rows: u16,
        cols: u16,
        tick_period: Duration,
    ) -> Result<
        (
            Self,
            mpsc::UnboundedSender<SessionCommand>,
            broadcast::Sender<Snapshot>,
        ),
        GameError,
    > {
        let mut rng = StdRng::from_entropy();
        let game = DuelGame::new(rows as i16, cols as i16, &mut rng)?;
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, _) = broadcast::channel(SNAPSHOT_CHANNEL_CAPACITY);
        let session = Session {
            game,
            rng,
            joined: [false; 2],
            tick_period,
            cmd_rx,
            snapshot_tx: snapshot_tx.clone(),
        };
        Ok((session, cmd_tx, snapshot_tx))
    }

    /// Runs until the command channel closes or the game hits an invariant
    /// violation. No two ticks overlap and every broadcast snapshot is the
    /// exact state produced by that tick.
    pub async fn run(mut self) {
        let mut ticker = interval(self.tick_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick fires immediately; skip it so the period is honest.
        ticker.tick().await;

        loop {
            tokio::select! {
                cmd = self.cmd_rx.recv() => {
                    match cmd {
                        Some(cmd) => self.handle_command(cmd),
                        None => {
                            info!("all command senders dropped, session over");
                            return;
                        }
                    }
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.on_tick() {
                        error!("session aborted by game invariant: {}", e);
                        return;
                    }
                }
            }
        }
    }

    fn handle_command(&mut self, cmd: SessionCommand) {
        match cmd {
            SessionCommand::Joined { slot, reply } => {
                self.joined[slot.index()] = true;
                if self.joined == [true, true] && self.game.status() == GameStatus::Waiting {
                    match self.game.start(&mut self.rng) {
                        Ok(()) => info!("both players joined, game running"),
                        Err(e) => error!("failed to start game: {}", e),
                    }
                }
                // The handshake is written after this reply, so it carries
                // the post-join status.
                let _ = reply.send(self.game.status());
            }
            SessionCommand::Input { slot, direction } => {
                self.game.set_direction(slot, direction);
            }
            SessionCommand::Restart { slot } => {
                if self.game.status().is_terminal() {
                    match self.game.restart(&mut self.rng) {
                        Ok(()) => info!("player {:?} restarted the game", slot),
                        Err(e) => error!("restart failed: {}", e),
                    }
                }
            }
            SessionCommand::Left { slot } => {
                warn!(
                    "player {:?} disconnected, freezing its snake; slot stays bound",
                    slot
                );
                self.game.freeze(slot);
            }
        }
    }

    fn on_tick(&mut self) -> Result<(), GameError> {
        self.game.tick(&mut self.rng)?;
        // Every state is snapshot-visible, Waiting and terminal ones
        // included; send errors just mean no writer is subscribed yet.
        let _ = self.snapshot_tx.send(self.game.snapshot());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::grid::Cell;
    use tokio::time::timeout;

    fn new_session() -> (
        Session,
        mpsc::UnboundedSender<SessionCommand>,
        broadcast::Sender<Snapshot>,
    ) {
        Session::new(30, 60, Duration::from_millis(10)).unwrap()
    }

    fn join(session: &mut Session, slot: PlayerSlot) -> GameStatus {
        let (reply, mut rx) = oneshot::channel();
        session.handle_command(SessionCommand::Joined { slot, reply });
        rx.try_recv().unwrap()
    }

    #[test]
    fn game_starts_when_both_players_joined() {
        let (mut session, _tx, _snap) = new_session();
        assert_eq!(join(&mut session, PlayerSlot::One), GameStatus::Waiting);
        assert_eq!(join(&mut session, PlayerSlot::Two), GameStatus::Running);
    }

    #[test]
    fn tick_broadcasts_the_state_it_produced() {
        let (mut session, _tx, snapshot_tx) = new_session();
        let mut rx_a = snapshot_tx.subscribe();
        let mut rx_b = snapshot_tx.subscribe();
        join(&mut session, PlayerSlot::One);
        join(&mut session, PlayerSlot::Two);

        session.on_tick().unwrap();

        let snap_a = rx_a.try_recv().unwrap();
        let snap_b = rx_b.try_recv().unwrap();
        assert_eq!(snap_a, snap_b);
        assert_eq!(snap_a, session.game.snapshot());
        assert_eq!(snap_a.status, GameStatus::Running);
    }

    #[test]
    fn input_command_steers_the_player() {
        let (mut session, _tx, _snap) = new_session();
        join(&mut session, PlayerSlot::One);
        join(&mut session, PlayerSlot::Two);

        session.handle_command(SessionCommand::Input {
            slot: PlayerSlot::One,
            direction: Direction::Up,
        });
        session.on_tick().unwrap();

        // Player one starts at (10, 20) facing left; up turns it to (9, 20).
        assert_eq!(
            session.game.player(PlayerSlot::One).snake.head(),
            Cell::new(9, 20)
        );
    }

    #[test]
    fn left_command_freezes_the_slot() {
        let (mut session, _tx, _snap) = new_session();
        join(&mut session, PlayerSlot::One);
        join(&mut session, PlayerSlot::Two);
        let frozen_head = session.game.player(PlayerSlot::Two).snake.head();

        session.handle_command(SessionCommand::Left {
            slot: PlayerSlot::Two,
        });
        session.on_tick().unwrap();
        session.on_tick().unwrap();

        assert_eq!(
            session.game.player(PlayerSlot::Two).snake.head(),
            frozen_head
        );
        assert_ne!(
            session.game.player(PlayerSlot::One).snake.head(),
            Cell::new(10, 20)
        );
    }

    #[test]
    fn restart_ignored_while_running() {
        let (mut session, _tx, _snap) = new_session();
        join(&mut session, PlayerSlot::One);
        join(&mut session, PlayerSlot::Two);
        session.on_tick().unwrap();
        let head = session.game.player(PlayerSlot::One).snake.head();

        session.handle_command(SessionCommand::Restart {
            slot: PlayerSlot::One,
        });

        assert_eq!(session.game.status(), GameStatus::Running);
        assert_eq!(session.game.player(PlayerSlot::One).snake.head(), head);
    }

    #[tokio::test]
    async fn run_loop_ticks_and_broadcasts() {
        let (session, cmd_tx, snapshot_tx) = new_session();
        let mut snapshot_rx = snapshot_tx.subscribe();
        let handle = tokio::spawn(session.run());

        let (reply, rx) = oneshot::channel();
        cmd_tx
            .send(SessionCommand::Joined {
                slot: PlayerSlot::One,
                reply,
            })
            .unwrap();
        assert_eq!(rx.await.unwrap(), GameStatus::Waiting);

        let snap = timeout(Duration::from_secs(1), snapshot_rx.recv())
            .await
            .expect("no snapshot within a second")
            .unwrap();
        assert_eq!(snap.status, GameStatus::Waiting);

        drop(cmd_tx);
        timeout(Duration::from_secs(1), handle)
            .await
            .expect("session did not stop when senders dropped")
            .unwrap();
    }
}
