//! Grid/entity model: cells, directions, snakes and the collision predicates.

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Logic errors that are fatal to a session, as opposed to recoverable
/// network conditions.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum GameError {
    #[error("no free interior cell left to place the fruit")]
    BoardFull,
}

/// A grid position. Plain value type, no identity beyond its coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub row: i16,
    pub col: i16,
}

impl Cell {
    pub fn new(row: i16, col: i16) -> Self {
        Self { row, col }
    }

    /// The neighboring cell one step away in `dir`.
    pub fn step(self, dir: Direction) -> Self {
        match dir {
            Direction::Up => Cell::new(self.row - 1, self.col),
            Direction::Down => Cell::new(self.row + 1, self.col),
            Direction::Left => Cell::new(self.row, self.col - 1),
            Direction::Right => Cell::new(self.row, self.col + 1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Two-bit wire encoding: 00 up, 01 right, 10 left, 11 down.
    pub fn wire_bits(self) -> u8 {
        match self {
            Direction::Up => 0b00,
            Direction::Right => 0b01,
            Direction::Left => 0b10,
            Direction::Down => 0b11,
        }
    }

    pub fn from_wire_bits(bits: u8) -> Option<Self> {
        match bits {
            0b00 => Some(Direction::Up),
            0b01 => Some(Direction::Right),
            0b10 => Some(Direction::Left),
            0b11 => Some(Direction::Down),
            _ => None,
        }
    }
}

/// One of the two player positions in a session. Wire encoding is a single
/// bit in the handshake and input frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerSlot {
    One,
    Two,
}

impl PlayerSlot {
    pub fn index(self) -> usize {
        match self {
            PlayerSlot::One => 0,
            PlayerSlot::Two => 1,
        }
    }

    pub fn wire_bit(self) -> u8 {
        match self {
            PlayerSlot::One => 0,
            PlayerSlot::Two => 1,
        }
    }

    pub fn from_wire_bit(bit: u8) -> Self {
        if bit & 0x01 == 0 {
            PlayerSlot::One
        } else {
            PlayerSlot::Two
        }
    }
}

/// An ordered sequence of cells, tail first, head last.
///
/// The sequence is never empty. Consecutive cells are orthogonal unit
/// neighbors once the snake has moved; the fixed starting layouts are
/// exempt from that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snake {
    cells: Vec<Cell>,
}

impl Snake {
    pub fn new(cells: Vec<Cell>) -> Self {
        assert!(!cells.is_empty(), "a snake has at least one cell");
        Self { cells }
    }

    pub fn head(&self) -> Cell {
        self.cells[self.cells.len() - 1]
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn contains(&self, cell: Cell) -> bool {
        self.cells.contains(&cell)
    }

    /// Moves the head one cell in `dir`. With `grew` the new head is appended
    /// and the tail stays put; otherwise the body shifts one position toward
    /// the tail. O(length), which is bounded by the grid area.
    pub fn advance(&mut self, dir: Direction, grew: bool) {
        let new_head = self.head().step(dir);
        if grew {
            self.cells.push(new_head);
        } else {
            self.cells.rotate_left(1);
            let last = self.cells.len() - 1;
            self.cells[last] = new_head;
        }
    }

    /// True if the head occupies any non-head body cell.
    pub fn is_self_collision(&self) -> bool {
        let head = self.head();
        self.cells[..self.cells.len() - 1].contains(&head)
    }
}

/// True if `cell` touches or exceeds the border ring. The outer ring is a
/// permanent, lethal wall.
pub fn is_out_of_bounds(cell: Cell, rows: i16, cols: i16) -> bool {
    cell.row < 1 || cell.row >= rows - 1 || cell.col < 1 || cell.col >= cols - 1
}

/// True if `snake`'s head occupies any cell of `other`, its head included,
/// which is what makes head-to-head collisions lethal for both.
pub fn is_opponent_collision(snake: &Snake, other: &Snake) -> bool {
    other.contains(snake.head())
}

/// Uniform retries before falling back to scanning for free cells.
const FRUIT_RETRY_CAP: u32 = 64;

/// Draws a random interior cell not occupied by any of `snakes`.
///
/// Uniform sampling is retried a bounded number of times; once the board is
/// crowded enough for that to keep missing, the free interior cells are
/// enumerated and one is picked directly, so placement always terminates.
/// Fails only when the interior is completely covered.
pub fn spawn_fruit(
    rows: i16,
    cols: i16,
    snakes: &[&Snake],
    rng: &mut impl Rng,
) -> Result<Cell, GameError> {
    let occupied = |cell: Cell| snakes.iter().any(|s| s.contains(cell));

    for _ in 0..FRUIT_RETRY_CAP {
        let cell = Cell::new(rng.gen_range(1..rows - 1), rng.gen_range(1..cols - 1));
        if !occupied(cell) {
            return Ok(cell);
        }
    }

    let free: Vec<Cell> = (1..rows - 1)
        .flat_map(|row| (1..cols - 1).map(move |col| Cell::new(row, col)))
        .filter(|&cell| !occupied(cell))
        .collect();

    if free.is_empty() {
        return Err(GameError::BoardFull);
    }
    Ok(free[rng.gen_range(0..free.len())])
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn snake(cells: &[(i16, i16)]) -> Snake {
        Snake::new(cells.iter().map(|&(r, c)| Cell::new(r, c)).collect())
    }

    #[test]
    fn step_moves_one_cell() {
        let c = Cell::new(5, 5);
        assert_eq!(c.step(Direction::Up), Cell::new(4, 5));
        assert_eq!(c.step(Direction::Down), Cell::new(6, 5));
        assert_eq!(c.step(Direction::Left), Cell::new(5, 4));
        assert_eq!(c.step(Direction::Right), Cell::new(5, 6));
    }

    #[test]
    fn direction_wire_bits_roundtrip() {
        for dir in [
            Direction::Up,
            Direction::Right,
            Direction::Left,
            Direction::Down,
        ] {
            assert_eq!(Direction::from_wire_bits(dir.wire_bits()), Some(dir));
        }
        assert_eq!(Direction::from_wire_bits(4), None);
    }

    #[test]
    fn advance_without_growth_keeps_length() {
        let mut s = snake(&[(5, 2), (5, 3), (5, 4)]);
        s.advance(Direction::Right, false);

        assert_eq!(s.len(), 3);
        assert_eq!(s.head(), Cell::new(5, 5));
        assert_eq!(s.cells()[0], Cell::new(5, 3));
    }

    #[test]
    fn advance_with_growth_adds_head_keeps_tail() {
        let mut s = snake(&[(5, 2), (5, 3), (5, 4)]);
        s.advance(Direction::Right, true);

        assert_eq!(s.len(), 4);
        assert_eq!(s.head(), Cell::new(5, 5));
        assert_eq!(s.cells()[0], Cell::new(5, 2));
    }

    #[test]
    fn advanced_snake_stays_contiguous() {
        let mut s = snake(&[(5, 2), (5, 3), (5, 4)]);
        s.advance(Direction::Down, false);
        s.advance(Direction::Down, true);
        s.advance(Direction::Left, false);

        for pair in s.cells().windows(2) {
            let manhattan =
                (pair[0].row - pair[1].row).abs() + (pair[0].col - pair[1].col).abs();
            assert_eq!(manhattan, 1);
        }
    }

    #[test]
    fn border_ring_is_out_of_bounds() {
        let (rows, cols) = (10, 20);
        for col in 0..cols {
            assert!(is_out_of_bounds(Cell::new(0, col), rows, cols));
            assert!(is_out_of_bounds(Cell::new(rows - 1, col), rows, cols));
        }
        for row in 0..rows {
            assert!(is_out_of_bounds(Cell::new(row, 0), rows, cols));
            assert!(is_out_of_bounds(Cell::new(row, cols - 1), rows, cols));
        }
        assert!(!is_out_of_bounds(Cell::new(1, 1), rows, cols));
        assert!(!is_out_of_bounds(Cell::new(rows - 2, cols - 2), rows, cols));
    }

    #[test]
    fn self_collision_requires_head_on_body() {
        let straight = snake(&[(5, 2), (5, 3), (5, 4)]);
        assert!(!straight.is_self_collision());

        // A U-turn next to the body is fine, landing on it is not.
        let u_turn = snake(&[(5, 2), (5, 3), (6, 3), (6, 2)]);
        assert!(!u_turn.is_self_collision());
        let on_tail = snake(&[(5, 2), (5, 3), (6, 3), (6, 2), (5, 2)]);
        assert!(on_tail.is_self_collision());
    }

    #[test]
    fn opponent_collision_includes_head_to_head() {
        let a = snake(&[(5, 2), (5, 3), (5, 4)]);
        let body_hit = snake(&[(3, 3), (4, 3), (5, 3)]);
        let head_hit = snake(&[(3, 4), (4, 4), (5, 4)]);
        let clear = snake(&[(7, 2), (7, 3), (7, 4)]);

        assert!(is_opponent_collision(&body_hit, &a));
        assert!(is_opponent_collision(&head_hit, &a));
        assert!(!is_opponent_collision(&clear, &a));
    }

    #[test]
    fn fruit_never_lands_on_a_snake() {
        let mut rng = StdRng::seed_from_u64(7);
        let a = snake(&[(1, 1), (1, 2), (1, 3)]);
        let b = snake(&[(3, 1), (3, 2), (3, 3)]);

        for _ in 0..500 {
            let fruit = spawn_fruit(5, 5, &[&a, &b], &mut rng).unwrap();
            assert!(!a.contains(fruit));
            assert!(!b.contains(fruit));
            assert!(!is_out_of_bounds(fruit, 5, 5));
        }
    }

    #[test]
    fn fruit_on_nearly_full_board_finds_the_free_cell() {
        // 5x5 grid has a 3x3 interior; cover all of it except (2, 2).
        let mut rng = StdRng::seed_from_u64(7);
        let cover: Vec<Cell> = (1..4)
            .flat_map(|r| (1..4).map(move |c| Cell::new(r, c)))
            .filter(|&c| c != Cell::new(2, 2))
            .collect();
        let s = Snake::new(cover);

        for _ in 0..10 {
            assert_eq!(spawn_fruit(5, 5, &[&s], &mut rng), Ok(Cell::new(2, 2)));
        }
    }

    #[test]
    fn fruit_on_full_board_fails() {
        let mut rng = StdRng::seed_from_u64(7);
        let cover: Vec<Cell> = (1..4)
            .flat_map(|r| (1..4).map(move |c| Cell::new(r, c)))
            .collect();
        let s = Snake::new(cover);

        assert_eq!(spawn_fruit(5, 5, &[&s], &mut rng), Err(GameError::BoardFull));
    }
}
