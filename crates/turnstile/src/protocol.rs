//! Wire messages between clients and rooms.
//!
//! Both directions are JSON objects tagged by `type`. Outbound messages are
//! the session's [`Delta`]s plus the admission `welcome` and sender-only
//! `error` notices.

use crate::error::{LobbyError, ProtocolError, SessionError};
use crate::session::{Delta, PlayerId, Slot, SlotAssignment, TerminalResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use turnstile_board::{Mark, MoveError, Position};

/// Message sent by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Place the player's mark, addressed by `index` or by `x`/`y`.
    Action {
        /// Board index (0-8).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<i64>,
        /// Column (0-2).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        x: Option<i64>,
        /// Row (0-2).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        y: Option<i64>,
    },
    /// Leave the room.
    Leave,
}

/// A validated client intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Move at a board index (0-8).
    Move {
        /// Board index.
        index: usize,
    },
    /// Explicit leave.
    Leave,
}

impl ClientMessage {
    /// Move intent addressed by board index.
    pub fn action(index: usize) -> Self {
        Self::Action {
            index: Some(index as i64),
            x: None,
            y: None,
        }
    }

    /// Parses a text frame.
    #[instrument(skip(text), fields(len = text.len()))]
    pub fn parse(text: &str) -> Result<Intent, ProtocolError> {
        let message: ClientMessage = serde_json::from_str(text).map_err(|e| {
            debug!(error = %e, "Rejecting unparseable client message");
            ProtocolError::MalformedAction(e.to_string())
        })?;
        message.into_intent()
    }

    /// Resolves the message into an intent.
    pub fn into_intent(self) -> Result<Intent, ProtocolError> {
        match self {
            ClientMessage::Leave => Ok(Intent::Leave),
            ClientMessage::Action {
                index: Some(index), ..
            } => usize::try_from(index)
                .ok()
                .and_then(Position::from_index)
                .map(|pos| Intent::Move {
                    index: pos.to_index(),
                })
                .ok_or(ProtocolError::IndexOutOfRange(index)),
            ClientMessage::Action {
                index: None,
                x: Some(x),
                y: Some(y),
            } => {
                let position = match (usize::try_from(x), usize::try_from(y)) {
                    (Ok(col), Ok(row)) => Position::from_coords(col, row),
                    _ => None,
                };
                position
                    .map(|pos| Intent::Move {
                        index: pos.to_index(),
                    })
                    .ok_or(ProtocolError::CoordinatesOutOfRange { x, y })
            }
            ClientMessage::Action { .. } => Err(ProtocolError::MalformedAction(
                "action needs an index or both x and y".to_string(),
            )),
        }
    }
}

/// Machine-readable reason carried by an error notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::EnumIter)]
#[serde(rename_all = "camelCase")]
pub enum ErrorCode {
    /// Index outside 0-8.
    OutOfRange,
    /// Cell already holds a mark.
    CellOccupied,
    /// Opponent holds the turn.
    NotYourTurn,
    /// Sender is not in the room.
    UnknownPlayer,
    /// The game is not running.
    NotInProgress,
    /// Two players already admitted.
    RoomFull,
    /// Room no longer exists.
    RoomClosed,
    /// Message could not be understood.
    MalformedAction,
}

/// Rejection reported to the originating client only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorNotice {
    /// Reason.
    pub code: ErrorCode,
    /// Human-readable description.
    pub message: String,
}

impl From<&SessionError> for ErrorNotice {
    fn from(err: &SessionError) -> Self {
        let code = match err {
            SessionError::Move(MoveError::OutOfRange(_)) => ErrorCode::OutOfRange,
            SessionError::Move(MoveError::CellOccupied(_)) => ErrorCode::CellOccupied,
            SessionError::NotYourTurn => ErrorCode::NotYourTurn,
            SessionError::UnknownPlayer(_) => ErrorCode::UnknownPlayer,
            SessionError::NotInProgress(_) => ErrorCode::NotInProgress,
            SessionError::RoomFull => ErrorCode::RoomFull,
        };
        Self {
            code,
            message: err.to_string(),
        }
    }
}

impl From<&ProtocolError> for ErrorNotice {
    fn from(err: &ProtocolError) -> Self {
        let code = match err {
            ProtocolError::MalformedAction(_) => ErrorCode::MalformedAction,
            ProtocolError::IndexOutOfRange(_) | ProtocolError::CoordinatesOutOfRange { .. } => {
                ErrorCode::OutOfRange
            }
        };
        Self {
            code,
            message: err.to_string(),
        }
    }
}

impl From<&LobbyError> for ErrorNotice {
    fn from(err: &LobbyError) -> Self {
        match err {
            LobbyError::Session(e) => e.into(),
            LobbyError::RoomClosed(_) => Self {
                code: ErrorCode::RoomClosed,
                message: err.to_string(),
            },
        }
    }
}

/// Message sent to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// Admission accepted. Sent only to the joiner.
    Welcome {
        /// The joiner's identity.
        player_id: PlayerId,
        /// Join order.
        slot: Slot,
        /// The joiner's mark.
        mark: Mark,
    },
    /// A player was admitted.
    PlayerJoined {
        /// Join order.
        slot: Slot,
        /// The player.
        player_id: PlayerId,
    },
    /// A cell received a mark.
    CellChanged {
        /// Board index.
        index: usize,
        /// Mark placed.
        mark: Mark,
    },
    /// The turn moved.
    TurnChanged {
        /// Player now holding the turn.
        player_id: PlayerId,
    },
    /// Seconds remaining in the turn.
    CountdownChanged {
        /// New value.
        value: u8,
    },
    /// Terminal result. The stream closes after this.
    GameEnded {
        /// Final result.
        outcome: TerminalResult,
    },
    /// A request from this client was rejected.
    Error {
        /// Reason.
        code: ErrorCode,
        /// Description.
        message: String,
    },
}

impl ServerMessage {
    /// Sender-only error notice.
    pub fn error(notice: impl Into<ErrorNotice>) -> Self {
        let ErrorNotice { code, message } = notice.into();
        Self::Error { code, message }
    }

    /// True for the last message of a session.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ServerMessage::GameEnded { .. })
    }
}

impl From<&SlotAssignment> for ServerMessage {
    fn from(assignment: &SlotAssignment) -> Self {
        Self::Welcome {
            player_id: assignment.player_id().clone(),
            slot: *assignment.slot(),
            mark: *assignment.mark(),
        }
    }
}

impl From<Delta> for ServerMessage {
    fn from(delta: Delta) -> Self {
        match delta {
            Delta::PlayerJoined { slot, player_id } => Self::PlayerJoined { slot, player_id },
            Delta::CellChanged { index, mark } => Self::CellChanged { index, mark },
            Delta::TurnChanged { player_id } => Self::TurnChanged { player_id },
            Delta::CountdownChanged { value } => Self::CountdownChanged { value },
            Delta::GameEnded { result } => Self::GameEnded { outcome: result },
        }
    }
}
