//! Per-session actor.
//!
//! Each room runs as one tokio task that owns its [`Session`] and
//! [`TurnTimer`]. Joins, actions, leaves and timer ticks are all handled
//! inside a single `select!` loop, so no two of them ever touch the session
//! at the same time. Rooms share nothing with each other.
//!
//! A repeat join by an admitted player leaves the session untouched and
//! attaches one more stream, primed with the room's current state.

use crate::error::{LobbyError, SessionError};
use crate::protocol::ServerMessage;
use crate::session::{Delta, PlayerId, Session, SessionPhase, SlotAssignment};
use crate::timer::{TimeoutPolicy, TurnTimer};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, instrument, warn, Instrument};

/// Room identifier.
pub type RoomId = String;

/// Outbound stream to one client.
pub type Outbox = mpsc::UnboundedSender<ServerMessage>;

/// Settings shared by every room a lobby creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Getters, derive_new::new)]
pub struct RoomConfig {
    /// Length of one countdown second.
    tick: Duration,
    /// What happens when a turn times out.
    timeout_policy: TimeoutPolicy,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), TimeoutPolicy::default())
    }
}

/// Point-in-time view of a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    /// Room identifier.
    id: RoomId,
    /// Admitted players.
    players: usize,
    /// Admitted players still connected.
    connected: usize,
    /// Session phase.
    phase: SessionPhase,
}

#[derive(Debug)]
enum RoomCommand {
    Join {
        player_id: PlayerId,
        outbox: Outbox,
        reply: oneshot::Sender<Result<SlotAssignment, SessionError>>,
    },
    Action {
        player_id: PlayerId,
        index: usize,
    },
    Leave {
        player_id: PlayerId,
    },
    Summary {
        reply: oneshot::Sender<RoomSummary>,
    },
}

/// Cloneable handle for sending commands to a room.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    id: RoomId,
    commands: mpsc::UnboundedSender<RoomCommand>,
}

impl RoomHandle {
    /// Room identifier.
    pub fn id(&self) -> &RoomId {
        &self.id
    }

    /// True once the room's task has exited.
    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    /// Admits `player_id`; the room will publish to `outbox`.
    #[instrument(skip(self, outbox), fields(room_id = %self.id))]
    pub async fn join(
        &self,
        player_id: PlayerId,
        outbox: Outbox,
    ) -> Result<SlotAssignment, LobbyError> {
        let (reply, response) = oneshot::channel();
        self.send(RoomCommand::Join {
            player_id,
            outbox,
            reply,
        })?;
        let assignment = response.await.map_err(|_| self.closed())??;
        Ok(assignment)
    }

    /// Forwards a move intent. Rejections go to the player's outbox.
    pub fn submit_action(&self, player_id: PlayerId, index: usize) -> Result<(), LobbyError> {
        self.send(RoomCommand::Action { player_id, index })
    }

    /// Removes a player. Harmless if the room is gone.
    pub fn leave(&self, player_id: PlayerId) {
        if self.send(RoomCommand::Leave { player_id }).is_err() {
            debug!(room_id = %self.id, "Leave sent to closed room");
        }
    }

    /// Current summary, or `None` if the room has closed.
    pub async fn summary(&self) -> Option<RoomSummary> {
        let (reply, response) = oneshot::channel();
        self.send(RoomCommand::Summary { reply }).ok()?;
        response.await.ok()
    }

    fn send(&self, command: RoomCommand) -> Result<(), LobbyError> {
        self.commands.send(command).map_err(|_| self.closed())
    }

    fn closed(&self) -> LobbyError {
        LobbyError::RoomClosed(self.id.clone())
    }
}

/// Starts a room task and returns its handle.
#[instrument(skip(config))]
pub fn spawn(id: RoomId, config: RoomConfig) -> RoomHandle {
    let (commands, rx) = mpsc::unbounded_channel();
    let room = Room {
        session: Session::new(&id, *config.timeout_policy()),
        timer: TurnTimer::new(*config.tick()),
        outboxes: Vec::with_capacity(2),
        commands: rx,
        vacated: false,
    };
    let span = tracing::info_span!("room", room_id = %id);
    tokio::spawn(room.run().instrument(span));
    RoomHandle { id, commands }
}

struct Room {
    session: Session,
    timer: TurnTimer,
    outboxes: Vec<(PlayerId, Outbox)>,
    commands: mpsc::UnboundedReceiver<RoomCommand>,
    vacated: bool,
}

impl Room {
    async fn run(mut self) {
        info!("Room open");
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => self.handle(command),
                    None => {
                        debug!("All handles dropped");
                        break;
                    }
                },
                () = self.timer.tick(), if self.timer.is_armed() => {
                    let deltas = self.session.tick();
                    self.publish(deltas);
                }
            }

            if self.session.phase() != SessionPhase::InProgress {
                self.timer.cancel();
            }
            if self.session.phase() == SessionPhase::Finished {
                info!(result = ?self.session.result(), "Result delivered, closing streams");
                self.outboxes.clear();
                break;
            }
            if self.vacated {
                info!("Last player left");
                break;
            }
        }
        info!("Room closed");
    }

    fn handle(&mut self, command: RoomCommand) {
        match command {
            RoomCommand::Join {
                player_id,
                outbox,
                reply,
            } => {
                let rejoining = self.session.player(&player_id).is_some();
                let roster: Vec<ServerMessage> = self
                    .session
                    .players()
                    .iter()
                    .filter(|p| p.id() != &player_id)
                    .map(|p| ServerMessage::PlayerJoined {
                        slot: *p.slot(),
                        player_id: p.id().clone(),
                    })
                    .collect();

                match self.session.join(player_id.clone()) {
                    Ok((assignment, deltas)) => {
                        let _ = outbox.send(ServerMessage::from(&assignment));
                        if rejoining {
                            // Already seated; existing streams stay open.
                            debug!(player_id = %player_id, "Attaching another stream");
                            for message in self.snapshot() {
                                let _ = outbox.send(message);
                            }
                        } else {
                            for message in roster {
                                let _ = outbox.send(message);
                            }
                        }
                        self.outboxes.push((player_id, outbox));
                        self.publish(deltas);
                        let _ = reply.send(Ok(assignment));
                    }
                    Err(e) => {
                        let _ = reply.send(Err(e));
                    }
                }
            }
            RoomCommand::Action { player_id, index } => {
                match self.session.submit_action(&player_id, index) {
                    Ok(deltas) => self.publish(deltas),
                    Err(e) => self.notify(&player_id, ServerMessage::error(&e)),
                }
            }
            RoomCommand::Leave { player_id } => {
                self.outboxes.retain(|(id, _)| id != &player_id);
                let deltas = self.session.leave(&player_id);
                self.publish(deltas);
                self.vacated = self.session.is_empty();
            }
            RoomCommand::Summary { reply } => {
                let _ = reply.send(RoomSummary {
                    id: self.session.id().to_string(),
                    players: self.session.players().len(),
                    connected: self.session.connected(),
                    phase: self.session.phase(),
                });
            }
        }
    }

    /// Sends deltas to every connected client in order, keeping the timer in
    /// step with the turn.
    fn publish(&mut self, deltas: Vec<Delta>) {
        for delta in deltas {
            match &delta {
                Delta::TurnChanged { .. } => self.timer.arm(),
                Delta::GameEnded { .. } => self.timer.cancel(),
                _ => {}
            }
            let message = ServerMessage::from(delta);
            for (player_id, outbox) in &self.outboxes {
                if outbox.send(message.clone()).is_err() {
                    warn!(player_id = %player_id, "Client stream closed");
                }
            }
        }
    }

    /// Everything a new stream needs to mirror the room as it stands.
    fn snapshot(&self) -> Vec<ServerMessage> {
        let mut messages: Vec<ServerMessage> = self
            .session
            .players()
            .iter()
            .map(|p| ServerMessage::PlayerJoined {
                slot: *p.slot(),
                player_id: p.id().clone(),
            })
            .collect();
        messages.extend(
            self.session
                .board()
                .cells()
                .iter()
                .enumerate()
                .filter_map(|(index, cell)| {
                    cell.mark()
                        .map(|mark| ServerMessage::CellChanged { index, mark })
                }),
        );
        if let Some(player_id) = self.session.current_turn() {
            messages.push(ServerMessage::TurnChanged {
                player_id: player_id.clone(),
            });
            messages.push(ServerMessage::CountdownChanged {
                value: self.session.countdown(),
            });
        }
        messages
    }

    fn notify(&self, player_id: &PlayerId, message: ServerMessage) {
        for (_, outbox) in self.outboxes.iter().filter(|(id, _)| id == player_id) {
            let _ = outbox.send(message.clone());
        }
    }
}
