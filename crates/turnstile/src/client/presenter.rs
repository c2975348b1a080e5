//! Presentation callbacks.

use crate::protocol::ErrorNotice;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use turnstile_board::Mark;

/// Game result from the local player's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "lowercase")]
pub enum LocalResult {
    /// The local player won.
    Won,
    /// The opponent won.
    Lost,
    /// Nobody won.
    Draw,
}

/// Receiver of projection notifications, implemented by the rendering layer.
pub trait Presenter {
    /// Both players are in; the game has started.
    fn on_join_complete(&mut self);

    /// The turn moved.
    fn on_turn_changed(&mut self, is_local_player_turn: bool);

    /// The countdown changed.
    fn on_countdown_tick(&mut self, value: u8);

    /// The game is over.
    fn on_game_ended(&mut self, result: LocalResult);

    /// A cell received a mark.
    fn on_cell_changed(&mut self, _index: usize, _mark: Mark) {}

    /// The server rejected one of our requests.
    fn on_error(&mut self, _notice: &ErrorNotice) {}
}

/// Presenter that logs every notification.
#[derive(Debug, Clone, derive_new::new)]
pub struct TracingPresenter {
    name: String,
}

impl Presenter for TracingPresenter {
    fn on_join_complete(&mut self) {
        info!(client = %self.name, "Game started");
    }

    fn on_turn_changed(&mut self, is_local_player_turn: bool) {
        if is_local_player_turn {
            info!(client = %self.name, "Your move!");
        } else {
            info!(client = %self.name, "Opponent's turn...");
        }
    }

    fn on_countdown_tick(&mut self, value: u8) {
        debug!(client = %self.name, value, "Countdown");
    }

    fn on_game_ended(&mut self, result: LocalResult) {
        info!(client = %self.name, %result, "Game over");
    }

    fn on_cell_changed(&mut self, index: usize, mark: Mark) {
        info!(client = %self.name, index, %mark, "Cell marked");
    }

    fn on_error(&mut self, notice: &ErrorNotice) {
        warn!(client = %self.name, code = ?notice.code, message = %notice.message, "Request rejected");
    }
}
