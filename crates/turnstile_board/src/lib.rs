//! Pure tic-tac-toe board model.
//!
//! The board is a row-major sequence of nine cells. Moves are applied with
//! [`Board::apply_move`], which refuses out-of-range indices and occupied
//! cells, and the board is scored with [`Board::evaluate`].
//!
//! # Example
//!
//! ```
//! use turnstile_board::{Board, Mark, Outcome};
//!
//! let mut board = Board::new();
//! for index in [0, 1, 2] {
//!     board.apply_move(index, Mark::X).unwrap();
//! }
//! assert_eq!(board.evaluate(), Outcome::Win(Mark::X));
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod action;
mod outcome;
mod position;
pub mod rules;
mod types;

pub use action::MoveError;
pub use outcome::Outcome;
pub use position::Position;
pub use types::{Board, Cell, Mark, CELL_COUNT};
