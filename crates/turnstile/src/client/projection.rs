//! Read-only mirror of session state.

use super::presenter::{LocalResult, Presenter};
use crate::protocol::{ClientMessage, ErrorNotice, ServerMessage};
use crate::session::{PlayerId, TerminalResult};
use crate::timer::TURN_SECONDS;
use tracing::{debug, instrument};
use turnstile_board::{Board, Cell, Mark, CELL_COUNT};

/// Local mirror of one room as seen by one client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    local_player: Option<PlayerId>,
    local_mark: Option<Mark>,
    board: Board,
    current_turn: Option<PlayerId>,
    countdown: u8,
    result: Option<TerminalResult>,
    joined: usize,
}

impl Projection {
    /// An empty mirror awaiting the server's welcome.
    pub fn new() -> Self {
        Self {
            local_player: None,
            local_mark: None,
            board: Board::new(),
            current_turn: None,
            countdown: TURN_SECONDS,
            result: None,
            joined: 0,
        }
    }

    /// Folds one server message into the mirror and raises the matching
    /// notification.
    #[instrument(skip(self, presenter))]
    pub fn apply(&mut self, message: &ServerMessage, presenter: &mut impl Presenter) {
        match message {
            ServerMessage::Welcome {
                player_id, mark, ..
            } => {
                self.local_player = Some(player_id.clone());
                self.local_mark = Some(*mark);
            }
            ServerMessage::PlayerJoined { .. } => {
                self.joined += 1;
                if self.joined == 2 {
                    presenter.on_join_complete();
                }
            }
            ServerMessage::CellChanged { index, mark } => {
                match self.board.apply_move(*index, *mark) {
                    Ok(()) => presenter.on_cell_changed(*index, *mark),
                    Err(e) => debug!(error = %e, "Ignoring inconsistent cell update"),
                }
            }
            ServerMessage::TurnChanged { player_id } => {
                self.current_turn = Some(player_id.clone());
                presenter.on_turn_changed(self.is_local_turn());
            }
            ServerMessage::CountdownChanged { value } => {
                self.countdown = *value;
                presenter.on_countdown_tick(*value);
            }
            ServerMessage::GameEnded { outcome } => {
                self.result = Some(outcome.clone());
                if let Some(result) = self.local_result() {
                    presenter.on_game_ended(result);
                }
            }
            ServerMessage::Error { code, message } => {
                presenter.on_error(&ErrorNotice {
                    code: *code,
                    message: message.clone(),
                });
            }
        }
    }

    /// The intent to send for a click on `index`. The mirror is not touched.
    pub fn move_intent(&self, index: usize) -> ClientMessage {
        ClientMessage::action(index)
    }

    /// Our identity, once welcomed.
    pub fn local_player(&self) -> Option<&PlayerId> {
        self.local_player.as_ref()
    }

    /// Our mark, once welcomed.
    pub fn local_mark(&self) -> Option<Mark> {
        self.local_mark
    }

    /// Mirrored board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Mirrored cells.
    pub fn cells(&self) -> &[Cell; CELL_COUNT] {
        self.board.cells()
    }

    /// Player holding the turn.
    pub fn current_turn(&self) -> Option<&PlayerId> {
        self.current_turn.as_ref()
    }

    /// True when the local player holds the turn.
    pub fn is_local_turn(&self) -> bool {
        self.local_player.is_some() && self.current_turn == self.local_player
    }

    /// Last countdown value received.
    pub fn countdown(&self) -> u8 {
        self.countdown
    }

    /// Players seen joining.
    pub fn joined(&self) -> usize {
        self.joined
    }

    /// Terminal result, once received.
    pub fn result(&self) -> Option<&TerminalResult> {
        self.result.as_ref()
    }

    /// Terminal result relative to the local player.
    pub fn local_result(&self) -> Option<LocalResult> {
        let result = match self.result.as_ref()?.winner() {
            None => LocalResult::Draw,
            Some(winner) if Some(winner) == self.local_player.as_ref() => LocalResult::Won,
            Some(_) => LocalResult::Lost,
        };
        Some(result)
    }
}

impl Default for Projection {
    fn default() -> Self {
        Self::new()
    }
}
