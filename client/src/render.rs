//! Snapshot rendering onto the raw-mode screen.
//!
//! The grid is composed into a character buffer first (pure, testable) and
//! painted in one queued pass: border ring, `*` fruit, `#` snake bodies
//! with `o` heads, and centered banners for the non-running states.

use crossterm::style::Print;
use crossterm::{cursor, queue};
use shared::game::{GameStatus, SoloGame, SoloStatus};
use shared::grid::{Cell, PlayerSlot};
use shared::protocol::Snapshot;
use std::io::{stdout, Stdout, Write};

pub struct Renderer {
    rows: u16,
    cols: u16,
    stdout: Stdout,
}

impl Renderer {
    pub fn new(rows: u16, cols: u16) -> Self {
        Self {
            rows,
            cols,
            stdout: stdout(),
        }
    }

    /// Draws a duel snapshot. `you` marks which slot this terminal drives,
    /// if any; the offline two-player mode passes `None`.
    pub fn draw_duel(&mut self, snapshot: &Snapshot, you: Option<PlayerSlot>) -> crossterm::Result<()> {
        let mut score_line = format!(
            "score 1: {} | score 2: {}",
            snapshot.scores[0], snapshot.scores[1]
        );
        if let Some(slot) = you {
            score_line.push_str(&format!("   (you are player {})", slot.index() + 1));
        }

        let mut grid = self.compose_board(&snapshot.snakes[0], &snapshot.snakes[1], snapshot.fruit);
        match snapshot.status {
            GameStatus::Waiting => self.stamp_banner(&mut grid, &["Waiting for opponent"]),
            GameStatus::Running => {}
            GameStatus::Player1Wins => {
                self.stamp_banner(&mut grid, &["Player 1 Wins", "Press R to restart"])
            }
            GameStatus::Player2Wins => {
                self.stamp_banner(&mut grid, &["Player 2 Wins", "Press R to restart"])
            }
            GameStatus::Draw => self.stamp_banner(&mut grid, &["Draw", "Press R to restart"]),
        }

        self.paint(&score_line, &grid)
    }

    /// Draws the single-player game.
    pub fn draw_solo(&mut self, game: &SoloGame) -> crossterm::Result<()> {
        let score_line = format!("score: {}", game.score());
        let mut grid = self.compose_board(game.snake().cells(), &[], game.fruit());
        if game.status() == SoloStatus::Lost {
            self.stamp_banner(&mut grid, &["You crashed", "Press R to restart"]);
        }
        self.paint(&score_line, &grid)
    }

    fn compose_board(&self, snake1: &[Cell], snake2: &[Cell], fruit: Cell) -> Vec<Vec<char>> {
        let (rows, cols) = (self.rows as usize, self.cols as usize);
        let mut grid = vec![vec![' '; cols]; rows];

        // Border ring.
        grid[0][0] = '/';
        grid[0][cols - 1] = '\\';
        grid[rows - 1][cols - 1] = '/';
        grid[rows - 1][0] = '\\';
        for col in 1..cols - 1 {
            grid[0][col] = '-';
            grid[rows - 1][col] = '-';
        }
        for row in grid.iter_mut().take(rows - 1).skip(1) {
            row[0] = '|';
            row[cols - 1] = '|';
        }

        self.stamp_cell(&mut grid, fruit, '*');
        self.stamp_snake(&mut grid, snake1);
        self.stamp_snake(&mut grid, snake2);
        grid
    }

    fn stamp_snake(&self, grid: &mut [Vec<char>], cells: &[Cell]) {
        for &cell in cells {
            self.stamp_cell(grid, cell, '#');
        }
        if let Some(&head) = cells.last() {
            self.stamp_cell(grid, head, 'o');
        }
    }

    fn stamp_cell(&self, grid: &mut [Vec<char>], cell: Cell, ch: char) {
        if (0..self.rows as i16).contains(&cell.row) && (0..self.cols as i16).contains(&cell.col) {
            grid[cell.row as usize][cell.col as usize] = ch;
        }
    }

    fn stamp_banner(&self, grid: &mut [Vec<char>], lines: &[&str]) {
        let mid_row = self.rows as usize / 2;
        for (i, line) in lines.iter().enumerate() {
            let row = mid_row + i;
            if row >= grid.len() {
                break;
            }
            let start = (self.cols as usize).saturating_sub(line.len()) / 2;
            for (j, ch) in line.chars().enumerate() {
                if start + j < grid[row].len() {
                    grid[row][start + j] = ch;
                }
            }
        }
    }

    fn paint(&mut self, score_line: &str, grid: &[Vec<char>]) -> crossterm::Result<()> {
        // Pad the score line so a shorter one overwrites the previous frame.
        let padded = format!("{:<width$}", score_line, width = self.cols as usize);
        queue!(self.stdout, cursor::MoveTo(0, 0), Print(padded))?;
        for (row, line) in grid.iter().enumerate() {
            let text: String = line.iter().collect();
            queue!(self.stdout, cursor::MoveTo(0, row as u16 + 1), Print(text))?;
        }
        self.stdout.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(list: &[(i16, i16)]) -> Vec<Cell> {
        list.iter().map(|&(r, c)| Cell::new(r, c)).collect()
    }

    #[test]
    fn board_has_border_fruit_and_heads() {
        let renderer = Renderer::new(10, 20);
        let snake1 = cells(&[(5, 3), (5, 4), (5, 5)]);
        let snake2 = cells(&[(7, 3), (7, 4)]);
        let grid = renderer.compose_board(&snake1, &snake2, Cell::new(2, 2));

        assert_eq!(grid[0][0], '/');
        assert_eq!(grid[0][19], '\\');
        assert_eq!(grid[9][0], '\\');
        assert_eq!(grid[9][19], '/');
        assert_eq!(grid[0][10], '-');
        assert_eq!(grid[4][0], '|');

        assert_eq!(grid[2][2], '*');
        assert_eq!(grid[5][3], '#');
        assert_eq!(grid[5][5], 'o');
        assert_eq!(grid[7][4], 'o');
        assert_eq!(grid[3][3], ' ');
    }

    #[test]
    fn banner_is_centered() {
        let renderer = Renderer::new(10, 20);
        let mut grid = renderer.compose_board(&[], &[], Cell::new(2, 2));
        renderer.stamp_banner(&mut grid, &["Draw"]);

        let line: String = grid[5].iter().collect();
        assert_eq!(line.trim_matches(|c| c == ' ' || c == '|'), "Draw");
        // "Draw" is 4 wide on a 20 column grid, so it starts at column 8.
        assert_eq!(grid[5][8], 'D');
    }

    #[test]
    fn out_of_range_cells_are_ignored() {
        let renderer = Renderer::new(10, 20);
        // A head that ran past the border must not panic the renderer.
        let runaway = cells(&[(0, 5), (-1, 5)]);
        let grid = renderer.compose_board(&runaway, &[], Cell::new(2, 2));
        assert_eq!(grid[0][5], '#');
    }
}
