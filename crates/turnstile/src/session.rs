//! Authoritative session state machine.
//!
//! A [`Session`] owns the board, the roster of at most two players, the
//! turn pointer, the countdown and the terminal result. Every mutating
//! operation returns the ordered [`Delta`]s it produced so the caller can
//! publish them exactly as they happened.

use crate::error::SessionError;
use crate::timer::{Countdown, Tick, TimeoutPolicy, TURN_SECONDS};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use turnstile_board::{Board, Mark, Outcome};
use uuid::Uuid;

/// Opaque identity of one connected player.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    /// Fresh random identity for a new connection.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// The identity as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PlayerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Join order of a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    /// First joiner. Plays X and moves first.
    First,
    /// Second joiner. Plays O.
    Second,
}

impl Slot {
    /// Mark placed by the player in this slot.
    pub fn mark(self) -> Mark {
        match self {
            Slot::First => Mark::X,
            Slot::Second => Mark::O,
        }
    }
}

/// Whether a player's connection is still live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    /// Connected.
    Connected,
    /// Left or dropped.
    Disconnected,
}

/// A player admitted to a session.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct Player {
    /// Identity.
    id: PlayerId,
    /// Join order.
    slot: Slot,
    /// Connection status.
    status: ConnectionStatus,
}

impl Player {
    /// The slot assignment handed out on admission.
    pub fn assignment(&self) -> SlotAssignment {
        SlotAssignment::new(self.id.clone(), self.slot, self.slot.mark())
    }
}

/// Result of a successful admission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, derive_new::new)]
#[serde(rename_all = "camelCase")]
pub struct SlotAssignment {
    /// Admitted player.
    player_id: PlayerId,
    /// Join order.
    slot: Slot,
    /// Mark the player places.
    mark: Mark,
}

/// Lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "camelCase")]
pub enum SessionPhase {
    /// Zero or one player admitted.
    WaitingForPlayers,
    /// Both players admitted, no terminal result yet.
    InProgress,
    /// Terminal result set.
    Finished,
}

/// Why a game was won.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WinCause {
    /// Three in a row.
    Line,
    /// The opponent left.
    Forfeit,
    /// The opponent ran out of time under [`TimeoutPolicy::Forfeit`].
    Timeout,
}

/// Immutable final outcome of a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum TerminalResult {
    /// A player won.
    Win {
        /// Winner.
        winner: PlayerId,
        /// How the game was won.
        cause: WinCause,
    },
    /// Board full with no line.
    Draw,
}

impl TerminalResult {
    /// The winner, if any.
    pub fn winner(&self) -> Option<&PlayerId> {
        match self {
            TerminalResult::Win { winner, .. } => Some(winner),
            TerminalResult::Draw => None,
        }
    }
}

/// A single unit of state change, in the order it was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delta {
    /// A player was admitted.
    PlayerJoined {
        /// Slot the player took.
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
    /// The turn moved to a player.
    TurnChanged {
        /// Player now holding the turn.
        player_id: PlayerId,
    },
    /// Seconds remaining in the current turn.
    CountdownChanged {
        /// New value.
        value: u8,
    },
    /// The session reached its terminal result.
    GameEnded {
        /// Final result.
        result: TerminalResult,
    },
}

/// One two-player game, from admission to terminal result.
#[derive(Debug, Clone)]
pub struct Session {
    id: String,
    board: Board,
    players: Vec<Player>,
    current_turn: Option<PlayerId>,
    countdown: Countdown,
    result: Option<TerminalResult>,
    timeout_policy: TimeoutPolicy,
}

impl Session {
    /// Creates an empty session.
    #[instrument(skip(id), fields(session_id = %id.as_ref()))]
    pub fn new(id: impl AsRef<str>, timeout_policy: TimeoutPolicy) -> Self {
        info!("Creating new session");
        Self {
            id: id.as_ref().to_string(),
            board: Board::new(),
            players: Vec::with_capacity(2),
            current_turn: None,
            countdown: Countdown::new(),
            result: None,
            timeout_policy,
        }
    }

    /// Session identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Admitted players in join order.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Looks up an admitted player.
    pub fn player(&self, player_id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| &p.id == player_id)
    }

    /// Player holding the turn. `None` until both players have joined.
    pub fn current_turn(&self) -> Option<&PlayerId> {
        self.current_turn.as_ref()
    }

    /// Seconds remaining in the current turn.
    pub fn countdown(&self) -> u8 {
        self.countdown.remaining()
    }

    /// Terminal result, once set.
    pub fn result(&self) -> Option<&TerminalResult> {
        self.result.as_ref()
    }

    /// Timeout handling in effect.
    pub fn timeout_policy(&self) -> TimeoutPolicy {
        self.timeout_policy
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> SessionPhase {
        if self.result.is_some() {
            SessionPhase::Finished
        } else if self.players.len() == 2 {
            SessionPhase::InProgress
        } else {
            SessionPhase::WaitingForPlayers
        }
    }

    /// True when no player is admitted.
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Admitted players whose connection is still live.
    pub fn connected(&self) -> usize {
        self.players
            .iter()
            .filter(|p| p.status == ConnectionStatus::Connected)
            .count()
    }

    /// The other admitted player.
    pub fn opponent_of(&self, player_id: &PlayerId) -> Option<&PlayerId> {
        if self.player(player_id).is_none() {
            return None;
        }
        self.players
            .iter()
            .map(|p| &p.id)
            .find(|id| *id != player_id)
    }

    /// Admits a player.
    ///
    /// Rejoining with an identity that is already present returns the
    /// existing assignment and changes nothing. The second admission starts
    /// the game: the first joiner gets the turn and the countdown starts
    /// full. `PlayerJoined` is always emitted before the first `TurnChanged`.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn join(
        &mut self,
        player_id: PlayerId,
    ) -> Result<(SlotAssignment, Vec<Delta>), SessionError> {
        if let Some(existing) = self.player(&player_id) {
            debug!(player_id = %player_id, "Player already admitted");
            return Ok((existing.assignment(), Vec::new()));
        }

        if self.phase() != SessionPhase::WaitingForPlayers {
            warn!(player_id = %player_id, "Session already has 2 players");
            return Err(SessionError::RoomFull);
        }

        let slot = if self.players.is_empty() {
            Slot::First
        } else {
            Slot::Second
        };
        let player = Player {
            id: player_id.clone(),
            slot,
            status: ConnectionStatus::Connected,
        };
        let assignment = player.assignment();
        self.players.push(player);
        info!(player_id = %player_id, %slot, mark = %slot.mark(), "Player admitted");

        let mut deltas = vec![Delta::PlayerJoined { slot, player_id }];

        if self.players.len() == 2 {
            let first = self.players[0].id.clone();
            info!(first_player = %first, "Both players present, game starting");
            self.give_turn(first, &mut deltas);
        }

        Ok((assignment, deltas))
    }

    /// Applies a move for `player_id` at `index`.
    ///
    /// On any error the session is unchanged. A move that completes a line or
    /// fills the board finishes the session; any other move passes the turn.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn submit_action(
        &mut self,
        player_id: &PlayerId,
        index: usize,
    ) -> Result<Vec<Delta>, SessionError> {
        let phase = self.phase();
        if phase != SessionPhase::InProgress {
            debug!(%phase, "Action outside of play");
            return Err(SessionError::NotInProgress(phase));
        }

        let player = self.player(player_id).ok_or_else(|| {
            warn!(player_id = %player_id, "Unknown player attempted move");
            SessionError::UnknownPlayer(player_id.clone())
        })?;
        let mark = player.slot.mark();

        if self.current_turn.as_ref() != Some(player_id) {
            warn!(
                player_id = %player_id,
                current_turn = ?self.current_turn,
                "Player tried to move out of turn"
            );
            return Err(SessionError::NotYourTurn);
        }

        self.board.apply_move(index, mark).map_err(|e| {
            warn!(player_id = %player_id, index, error = %e, "Invalid move");
            SessionError::from(e)
        })?;

        let mut deltas = vec![Delta::CellChanged { index, mark }];

        match self.board.evaluate() {
            Outcome::Win(winning_mark) => {
                let winner = self
                    .players
                    .iter()
                    .find(|p| p.slot.mark() == winning_mark)
                    .map(|p| p.id.clone())
                    .unwrap_or_else(|| player_id.clone());
                deltas.push(self.finish(TerminalResult::Win {
                    winner,
                    cause: WinCause::Line,
                }));
            }
            Outcome::Draw => deltas.push(self.finish(TerminalResult::Draw)),
            Outcome::InProgress => {
                let next = self.other_player(player_id);
                self.give_turn(next, &mut deltas);
            }
        }

        info!(
            player_id = %player_id,
            index,
            phase = %self.phase(),
            "Move applied"
        );
        Ok(deltas)
    }

    /// Advances the countdown by one second.
    ///
    /// At zero the turn passes to the opponent (or, under
    /// [`TimeoutPolicy::Forfeit`], the opponent wins). Outside of play this
    /// does nothing.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn tick(&mut self) -> Vec<Delta> {
        if self.phase() != SessionPhase::InProgress {
            return Vec::new();
        }

        match self.countdown.tick() {
            Tick::Running(value) => vec![Delta::CountdownChanged { value }],
            Tick::Expired => {
                let mut deltas = vec![Delta::CountdownChanged { value: 0 }];
                let Some(timed_out) = self.current_turn.clone() else {
                    return deltas;
                };
                let opponent = self.other_player(&timed_out);
                info!(
                    player_id = %timed_out,
                    policy = ?self.timeout_policy,
                    "Turn timed out"
                );
                match self.timeout_policy {
                    TimeoutPolicy::SkipTurn => self.give_turn(opponent, &mut deltas),
                    TimeoutPolicy::Forfeit => deltas.push(self.finish(TerminalResult::Win {
                        winner: opponent,
                        cause: WinCause::Timeout,
                    })),
                }
                deltas
            }
        }
    }

    /// Removes a player.
    ///
    /// Mid-game this forfeits to the opponent. While waiting, the session
    /// resets to empty. After the game is over only the connection status
    /// changes.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn leave(&mut self, player_id: &PlayerId) -> Vec<Delta> {
        let Some(player) = self.players.iter_mut().find(|p| &p.id == player_id) else {
            debug!(player_id = %player_id, "Leave from unknown player ignored");
            return Vec::new();
        };
        player.status = ConnectionStatus::Disconnected;

        match self.phase() {
            SessionPhase::WaitingForPlayers => {
                info!(player_id = %player_id, "Waiting player left, resetting session");
                self.players.clear();
                self.board = Board::new();
                self.current_turn = None;
                self.countdown.reset();
                Vec::new()
            }
            SessionPhase::InProgress => {
                let winner = self.other_player(player_id);
                info!(player_id = %player_id, winner = %winner, "Player left mid-game, forfeit");
                vec![self.finish(TerminalResult::Win {
                    winner,
                    cause: WinCause::Forfeit,
                })]
            }
            SessionPhase::Finished => {
                debug!(player_id = %player_id, "Player left finished session");
                Vec::new()
            }
        }
    }

    /// The opponent of an admitted player during play.
    fn other_player(&self, player_id: &PlayerId) -> PlayerId {
        self.opponent_of(player_id)
            .cloned()
            .unwrap_or_else(|| player_id.clone())
    }

    fn give_turn(&mut self, player_id: PlayerId, deltas: &mut Vec<Delta>) {
        self.current_turn = Some(player_id.clone());
        self.countdown.reset();
        deltas.push(Delta::TurnChanged { player_id });
        deltas.push(Delta::CountdownChanged {
            value: TURN_SECONDS,
        });
    }

    fn finish(&mut self, result: TerminalResult) -> Delta {
        debug_assert!(self.result.is_none(), "terminal result set twice");
        info!(result = ?result, "Session finished");
        self.result = Some(result.clone());
        Delta::GameEnded { result }
    }
}
