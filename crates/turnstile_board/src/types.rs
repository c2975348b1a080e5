//! Core domain types for the board.

use super::action::MoveError;
use super::outcome::Outcome;
use super::rules;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Number of cells on the board.
pub const CELL_COUNT: usize = 9;

/// The token a player places on a cell.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    strum::EnumIter,
)]
pub enum Mark {
    /// Mark of the first player to join.
    X,
    /// Mark of the second player to join.
    O,
}

impl Mark {
    /// Returns the opposing mark.
    pub fn opponent(self) -> Self {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }
}

/// A cell on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Cell {
    /// Nobody has played here.
    #[default]
    Empty,
    /// Cell holds a mark.
    Occupied(Mark),
}

impl Cell {
    /// Returns the mark in this cell, if any.
    pub fn mark(self) -> Option<Mark> {
        match self {
            Cell::Empty => None,
            Cell::Occupied(mark) => Some(mark),
        }
    }
}

/// 3x3 board.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Board {
    /// Cells in row-major order (0-8).
    cells: [Cell; CELL_COUNT],
}

impl Board {
    /// Creates an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets the cell at `index`, or `None` when out of range.
    pub fn get(&self, index: usize) -> Option<Cell> {
        self.cells.get(index).copied()
    }

    /// Checks if the cell at `index` exists and is empty.
    pub fn is_empty(&self, index: usize) -> bool {
        matches!(self.get(index), Some(Cell::Empty))
    }

    /// Returns all cells.
    pub fn cells(&self) -> &[Cell; CELL_COUNT] {
        &self.cells
    }

    /// Places `mark` at `index`.
    ///
    /// Fails with [`MoveError::OutOfRange`] for indices outside 0-8 and
    /// with [`MoveError::CellOccupied`] when the cell already holds a mark.
    /// The board is untouched on failure.
    #[instrument(skip(self))]
    pub fn apply_move(&mut self, index: usize, mark: Mark) -> Result<(), MoveError> {
        let cell = self
            .cells
            .get_mut(index)
            .ok_or(MoveError::OutOfRange(index))?;
        if *cell != Cell::Empty {
            debug!(index, "Cell already occupied");
            return Err(MoveError::CellOccupied(index));
        }
        *cell = Cell::Occupied(mark);
        Ok(())
    }

    /// Scores the board.
    ///
    /// Win lines are checked before fullness, so a full board that also
    /// holds a line is a win.
    #[instrument(skip(self))]
    pub fn evaluate(&self) -> Outcome {
        if let Some(mark) = rules::check_winner(self) {
            Outcome::Win(mark)
        } else if rules::is_full(self) {
            Outcome::Draw
        } else {
            Outcome::InProgress
        }
    }
}
