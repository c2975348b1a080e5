//! Simple automated player.

use super::local::LocalClient;
use super::presenter::{LocalResult, Presenter};
use super::projection::Projection;
use crate::protocol::ServerMessage;
use tracing::{info, instrument, warn};
use turnstile_board::Position;

/// Returns the first empty cell in the mirror.
pub fn pick_move(projection: &Projection) -> Option<usize> {
    Position::valid_moves(projection.board())
        .first()
        .copied()
        .map(Position::to_index)
}

/// Player that takes the first empty cell whenever it holds the turn.
#[derive(Debug)]
pub struct SimpleBot<P> {
    client: LocalClient,
    presenter: P,
}

impl<P: Presenter> SimpleBot<P> {
    /// Wraps a connected client.
    pub fn new(client: LocalClient, presenter: P) -> Self {
        Self { client, presenter }
    }

    /// The underlying client.
    pub fn client(&self) -> &LocalClient {
        &self.client
    }

    /// Plays until the room closes the stream.
    #[instrument(skip(self), fields(player_id = %self.client.player_id()))]
    pub async fn run(mut self) -> Option<LocalResult> {
        while let Some(message) = self.client.next(&mut self.presenter).await {
            if matches!(message, ServerMessage::TurnChanged { .. })
                && self.client.projection().is_local_turn()
                && let Some(index) = pick_move(self.client.projection())
            {
                info!(index, "Bot moving");
                if let Err(e) = self.client.play(index) {
                    warn!(error = %e, "Bot move not delivered");
                }
            }
        }
        self.client.projection().local_result()
    }
}
