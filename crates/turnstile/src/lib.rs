//! Turnstile library - server-authoritative two-player tic-tac-toe.
//!
//! # Architecture
//!
//! - **Session**: the state machine that admits players, applies moves,
//!   runs the countdown and decides the result
//! - **Room**: one task per session; serializes every mutation and
//!   publishes the resulting deltas in order
//! - **Lobby**: admission and simple pairing
//! - **Server**: WebSocket transport (axum)
//! - **Client**: a read-only projection of a room plus presentation hooks
//!
//! # Example
//!
//! ```no_run
//! use turnstile::{LocalClient, Lobby, RoomConfig, SimpleBot, TracingPresenter};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let lobby = Lobby::new(RoomConfig::default());
//! let x = LocalClient::connect(&lobby).await?;
//! let o = LocalClient::connect(&lobby).await?;
//! let (x, o) = tokio::join!(
//!     SimpleBot::new(x, TracingPresenter::new("x".into())).run(),
//!     SimpleBot::new(o, TracingPresenter::new("o".into())).run(),
//! );
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod config;
mod error;
mod lobby;
mod protocol;
mod room;
mod server;
mod session;
mod timer;

// Crate-level exports - Errors
pub use error::{ConfigError, ErrorKind, LobbyError, ProtocolError, SessionError};

// Crate-level exports - Configuration
pub use config::ServerConfig;

// Crate-level exports - Session state machine
pub use session::{
    ConnectionStatus, Delta, Player, PlayerId, Session, SessionPhase, Slot, SlotAssignment,
    TerminalResult, WinCause,
};

// Crate-level exports - Turn timer
pub use timer::{Countdown, Tick, TimeoutPolicy, TurnTimer, TURN_SECONDS};

// Crate-level exports - Wire protocol
pub use protocol::{ClientMessage, ErrorCode, ErrorNotice, Intent, ServerMessage};

// Crate-level exports - Rooms and admission
pub use lobby::{Admission, Lobby};
pub use room::{Outbox, RoomConfig, RoomHandle, RoomId, RoomSummary};

// Crate-level exports - Transport
pub use server::{router, serve};

// Crate-level exports - Client projection
pub use client::{
    pick_move, ClientError, LocalClient, LocalResult, Presenter, Projection, SimpleBot,
    TracingPresenter,
};

// Crate-level exports - Board model
pub use turnstile_board::{Board, Cell, Mark, MoveError, Outcome, Position};
