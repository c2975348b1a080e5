//! Board evaluation result.

use super::Mark;
use serde::{Deserialize, Serialize};

/// What the current board says about the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// No line and at least one empty cell.
    InProgress,
    /// A line is filled with one mark.
    Win(Mark),
    /// Every cell is occupied and there is no line.
    Draw,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::InProgress => write!(f, "In progress"),
            Outcome::Win(mark) => write!(f, "{} wins", mark),
            Outcome::Draw => write!(f, "Draw"),
        }
    }
}
