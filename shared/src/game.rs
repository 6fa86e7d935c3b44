//! Tick state machines for the two-player duel and the single-player variant.
//!
//! A game value is owned by exactly one driver (the server session, or the
//! offline client loop) and mutated only through `tick` and the input
//! acceptors. Nothing in here touches the network or the clock.

use crate::grid::{
    is_opponent_collision, is_out_of_bounds, spawn_fruit, Cell, Direction, GameError, PlayerSlot,
    Snake,
};
use crate::protocol::Snapshot;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Session lifecycle. `Waiting` and the three terminal states are visible in
/// snapshots but not simulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    Waiting,
    Running,
    Player1Wins,
    Player2Wins,
    Draw,
}

impl GameStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            GameStatus::Player1Wins | GameStatus::Player2Wins | GameStatus::Draw
        )
    }

    pub fn wire_byte(self) -> u8 {
        match self {
            GameStatus::Waiting => 0,
            GameStatus::Running => 1,
            GameStatus::Player1Wins => 2,
            GameStatus::Player2Wins => 3,
            GameStatus::Draw => 4,
        }
    }

    pub fn from_wire_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(GameStatus::Waiting),
            1 => Some(GameStatus::Running),
            2 => Some(GameStatus::Player1Wins),
            3 => Some(GameStatus::Player2Wins),
            4 => Some(GameStatus::Draw),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Player {
    pub snake: Snake,
    /// Direction of the last committed move; what reversal is checked against.
    direction: Direction,
    /// Latest accepted direction request, applied at the next tick.
    pending: Option<Direction>,
    pub score: u16,
    /// Set when the peer driving this player disconnects. A frozen snake no
    /// longer moves or eats but stays on the board as a collision body.
    frozen: bool,
}

impl Player {
    fn new(snake: Snake, direction: Direction) -> Self {
        Self {
            snake,
            direction,
            pending: None,
            score: 0,
            frozen: false,
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Accepts a direction request unless it reverses the last committed
    /// move. Checking against the committed direction (not the pending one)
    /// is what stops a fast double key-press from turning the snake back
    /// into its own neck.
    fn request_direction(&mut self, dir: Direction) {
        if self.frozen || dir == self.direction.opposite() {
            return;
        }
        self.pending = Some(dir);
    }

    fn commit_direction(&mut self) -> Direction {
        if let Some(dir) = self.pending.take() {
            self.direction = dir;
        }
        self.direction
    }
}

/// The authoritative two-player game. Exactly one of these exists per
/// session; the session's tick task is its only writer.
#[derive(Debug, Clone)]
pub struct DuelGame {
    rows: i16,
    cols: i16,
    players: [Player; 2],
    fruit: Cell,
    status: GameStatus,
    ticks: u32,
}

impl DuelGame {
    /// Creates a waiting game with the fixed starting layout. On the default
    /// 30x60 grid player one sits at `[(10,23)..(10,20)]` facing left and
    /// player two at `[(13,30),(13,29),(10,28),(10,27)]` facing up.
    pub fn new(rows: i16, cols: i16, rng: &mut impl Rng) -> Result<Self, GameError> {
        let players = Self::starting_players(rows, cols);
        let fruit = spawn_fruit(rows, cols, &[&players[0].snake, &players[1].snake], rng)?;
        Ok(Self {
            rows,
            cols,
            players,
            fruit,
            status: GameStatus::Waiting,
            ticks: 0,
        })
    }

    fn starting_players(rows: i16, cols: i16) -> [Player; 2] {
        let r = rows / 3;
        let c = cols / 3;
        let snake1 = Snake::new(vec![
            Cell::new(r, c + 3),
            Cell::new(r, c + 2),
            Cell::new(r, c + 1),
            Cell::new(r, c),
        ]);
        let m = cols / 2;
        let snake2 = Snake::new(vec![
            Cell::new(r + 3, m),
            Cell::new(r + 3, m - 1),
            Cell::new(r, m - 2),
            Cell::new(r, m - 3),
        ]);
        [
            Player::new(snake1, Direction::Left),
            Player::new(snake2, Direction::Up),
        ]
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    pub fn player(&self, slot: PlayerSlot) -> &Player {
        &self.players[slot.index()]
    }

    pub fn fruit(&self) -> Cell {
        self.fruit
    }

    /// Last-write-wins pending direction for `slot`, subject to the reversal
    /// rejection enforced at acceptance time.
    pub fn set_direction(&mut self, slot: PlayerSlot, dir: Direction) {
        self.players[slot.index()].request_direction(dir);
    }

    /// Marks `slot` as driven by a disconnected peer. Its snake stays on the
    /// board but no longer moves, for the rest of the session.
    pub fn freeze(&mut self, slot: PlayerSlot) {
        self.players[slot.index()].frozen = true;
    }

    /// Replaces both players and the fruit with fresh instances and starts
    /// the simulation. Frozen flags carry over: a slot whose peer left stays
    /// frozen through every later start and restart.
    pub fn start(&mut self, rng: &mut impl Rng) -> Result<(), GameError> {
        let mut players = Self::starting_players(self.rows, self.cols);
        for (player, old) in players.iter_mut().zip(&self.players) {
            player.frozen = old.frozen;
        }
        self.fruit = spawn_fruit(
            self.rows,
            self.cols,
            &[&players[0].snake, &players[1].snake],
            rng,
        )?;
        self.players = players;
        self.status = GameStatus::Running;
        self.ticks = 0;
        Ok(())
    }

    /// Explicit restart request; only honored from a terminal state.
    pub fn restart(&mut self, rng: &mut impl Rng) -> Result<(), GameError> {
        if self.status.is_terminal() {
            self.start(rng)?;
        }
        Ok(())
    }

    fn is_dead(&self, idx: usize) -> bool {
        let snake = &self.players[idx].snake;
        is_out_of_bounds(snake.head(), self.rows, self.cols)
            || snake.is_self_collision()
            || is_opponent_collision(snake, &self.players[1 - idx].snake)
    }

    /// Advances the simulation one step.
    ///
    /// Death predicates are evaluated against the pre-tick positions of both
    /// snakes. Simultaneous death resolves by score before anything moves;
    /// otherwise living, connected players eat (head already on the fruit)
    /// and then advance, and the fruit respawns if it was eaten. Outside
    /// `Running` this is a no-op.
    pub fn tick(&mut self, rng: &mut impl Rng) -> Result<(), GameError> {
        if self.status != GameStatus::Running {
            return Ok(());
        }

        let dead = [self.is_dead(0), self.is_dead(1)];
        if dead[0] && dead[1] {
            self.status = match self.players[0].score.cmp(&self.players[1].score) {
                Ordering::Greater => GameStatus::Player1Wins,
                Ordering::Less => GameStatus::Player2Wins,
                Ordering::Equal => GameStatus::Draw,
            };
            return Ok(());
        }

        let mut any_eaten = false;
        for idx in 0..2 {
            let moves = !dead[idx] && !self.players[idx].frozen;
            if !moves {
                continue;
            }
            let player = &mut self.players[idx];
            let eaten = player.snake.head() == self.fruit;
            if eaten {
                player.score += 1;
                any_eaten = true;
            }
            let dir = player.commit_direction();
            player.snake.advance(dir, eaten);
        }

        if any_eaten {
            self.fruit = spawn_fruit(
                self.rows,
                self.cols,
                &[&self.players[0].snake, &self.players[1].snake],
                rng,
            )?;
        }

        self.ticks += 1;
        Ok(())
    }

    /// Complete description of the current state for broadcast.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            status: self.status,
            scores: [self.players[0].score, self.players[1].score],
            snakes: [
                self.players[0].snake.cells().to_vec(),
                self.players[1].snake.cells().to_vec(),
            ],
            fruit: self.fruit,
        }
    }
}

/// Terminal states of the single-player variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoloStatus {
    Running,
    Lost,
}

/// Single-player reduction of the duel: same grid, same fruit and growth
/// rules, no opponent predicate.
#[derive(Debug, Clone)]
pub struct SoloGame {
    rows: i16,
    cols: i16,
    player: Player,
    fruit: Cell,
    status: SoloStatus,
}

impl SoloGame {
    pub fn new(rows: i16, cols: i16, rng: &mut impl Rng) -> Result<Self, GameError> {
        let [player, _] = DuelGame::starting_players(rows, cols);
        let fruit = spawn_fruit(rows, cols, &[&player.snake], rng)?;
        Ok(Self {
            rows,
            cols,
            player,
            fruit,
            status: SoloStatus::Running,
        })
    }

    pub fn status(&self) -> SoloStatus {
        self.status
    }

    pub fn score(&self) -> u16 {
        self.player.score
    }

    pub fn snake(&self) -> &Snake {
        &self.player.snake
    }

    pub fn fruit(&self) -> Cell {
        self.fruit
    }

    pub fn set_direction(&mut self, dir: Direction) {
        self.player.request_direction(dir);
    }

    pub fn restart(&mut self, rng: &mut impl Rng) -> Result<(), GameError> {
        if self.status == SoloStatus::Lost {
            *self = Self::new(self.rows, self.cols, rng)?;
        }
        Ok(())
    }

    pub fn tick(&mut self, rng: &mut impl Rng) -> Result<(), GameError> {
        if self.status != SoloStatus::Running {
            return Ok(());
        }

        let snake = &self.player.snake;
        if is_out_of_bounds(snake.head(), self.rows, self.cols) || snake.is_self_collision() {
            self.status = SoloStatus::Lost;
            return Ok(());
        }

        let eaten = self.player.snake.head() == self.fruit;
        if eaten {
            self.player.score += 1;
        }
        let dir = self.player.commit_direction();
        self.player.snake.advance(dir, eaten);

        if eaten {
            self.fruit = spawn_fruit(self.rows, self.cols, &[&self.player.snake], rng)?;
        }
        Ok(())
    }
}
