//! Game rules.
//!
//! Pure functions over a [`Board`](crate::Board). Rules are kept apart from
//! board storage so evaluation stays stateless.

pub mod draw;
pub mod win;

pub use draw::is_full;
pub use win::{check_winner, LINES};
