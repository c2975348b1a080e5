//! Client-side mirror of a room.
//!
//! A [`Projection`] is rebuilt purely from the server's message stream and
//! drives a [`Presenter`]. Moves never touch the projection; they leave as
//! intents and come back as `cellChanged` deltas.

mod bot;
mod local;
mod presenter;
mod projection;

pub use bot::{pick_move, SimpleBot};
pub use local::{ClientError, LocalClient};
pub use presenter::{LocalResult, Presenter, TracingPresenter};
pub use projection::Projection;
