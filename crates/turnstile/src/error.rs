//! Error types for sessions, the wire protocol and the lobby.

use crate::room::RoomId;
use crate::session::{PlayerId, SessionPhase};
use derive_more::{Display, Error, From};
use tracing::instrument;
use turnstile_board::MoveError;

/// Broad class of a rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ErrorKind {
    /// Rejected locally; the session continues unchanged.
    Validation,
    /// Rejected at admission; no session is created for the requester.
    Capacity,
}

/// Rejection raised by the session state machine.
#[derive(Debug, Clone, PartialEq, Eq, Display, From)]
pub enum SessionError {
    /// The board refused the move.
    #[display("Invalid move: {}", _0)]
    #[from]
    Move(MoveError),

    /// Another player holds the turn.
    #[display("Not your turn")]
    NotYourTurn,

    /// The player was never admitted to this session.
    #[display("Player {} is not in this session", _0)]
    UnknownPlayer(PlayerId),

    /// Actions are only accepted while the game is running.
    #[display("Session is {}, not in progress", _0)]
    NotInProgress(SessionPhase),

    /// Two players are already admitted.
    #[display("Room is full")]
    RoomFull,
}

impl std::error::Error for SessionError {}

impl SessionError {
    /// Classifies the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SessionError::RoomFull => ErrorKind::Capacity,
            SessionError::Move(_)
            | SessionError::NotYourTurn
            | SessionError::UnknownPlayer(_)
            | SessionError::NotInProgress(_) => ErrorKind::Validation,
        }
    }
}

/// Inbound message that could not be understood.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum ProtocolError {
    /// Not a recognizable client message.
    #[display("Malformed action: {}", _0)]
    MalformedAction(String),

    /// Board index outside 0-8, as sent.
    #[display("Cell index {} is out of range (must be 0-8)", _0)]
    IndexOutOfRange(i64),

    /// Column or row outside 0-2, as sent.
    #[display("Cell ({}, {}) is out of range (x and y must be 0-2)", x, y)]
    CoordinatesOutOfRange {
        /// Column sent.
        x: i64,
        /// Row sent.
        y: i64,
    },
}

impl std::error::Error for ProtocolError {}

/// Failure to reach or enter a room.
#[derive(Debug, Clone, PartialEq, Eq, Display, From)]
pub enum LobbyError {
    /// The room rejected the admission.
    #[display("{}", _0)]
    #[from]
    Session(SessionError),

    /// The room's task has already shut down.
    #[display("Room {} is closed", _0)]
    RoomClosed(RoomId),
}

impl std::error::Error for LobbyError {}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}
