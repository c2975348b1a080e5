//! In-process client endpoint.

use super::presenter::Presenter;
use super::projection::Projection;
use crate::error::{LobbyError, ProtocolError};
use crate::lobby::Lobby;
use crate::protocol::{ClientMessage, Intent, ServerMessage};
use crate::room::{RoomHandle, RoomId};
use crate::session::{PlayerId, SlotAssignment};
use tokio::sync::mpsc;
use tracing::{debug, instrument};

/// A client connected to a room without a network hop.
///
/// The room holds the only sender for this client's stream, so the stream
/// ends exactly when the room closes it.
#[derive(Debug)]
pub struct LocalClient {
    assignment: SlotAssignment,
    room: RoomHandle,
    inbox: mpsc::UnboundedReceiver<ServerMessage>,
    projection: Projection,
}

impl LocalClient {
    /// Joins the waiting room (or a new one) with a fresh identity.
    pub async fn connect(lobby: &Lobby) -> Result<Self, LobbyError> {
        Self::connect_as(lobby, PlayerId::generate(), None).await
    }

    /// Joins with a chosen identity, optionally into a named room.
    #[instrument(skip(lobby))]
    pub async fn connect_as(
        lobby: &Lobby,
        player_id: PlayerId,
        room_id: Option<RoomId>,
    ) -> Result<Self, LobbyError> {
        let (outbox, inbox) = mpsc::unbounded_channel();
        let admission = match room_id {
            Some(room_id) => lobby.join_room(room_id, player_id, outbox).await?,
            None => lobby.join_or_create(player_id, outbox).await?,
        };
        Ok(Self {
            assignment: admission.assignment().clone(),
            room: admission.room().clone(),
            inbox,
            projection: Projection::new(),
        })
    }

    /// Our identity.
    pub fn player_id(&self) -> &PlayerId {
        self.assignment.player_id()
    }

    /// Slot and mark we were given.
    pub fn assignment(&self) -> &SlotAssignment {
        &self.assignment
    }

    /// Room we are in.
    pub fn room_id(&self) -> &RoomId {
        self.room.id()
    }

    /// Our mirror of the room.
    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    /// Waits for the next server message and folds it into the projection.
    ///
    /// Returns `None` once the room has closed our stream.
    pub async fn next(&mut self, presenter: &mut impl Presenter) -> Option<ServerMessage> {
        let message = self.inbox.recv().await?;
        self.projection.apply(&message, presenter);
        Some(message)
    }

    /// Folds every message already queued, without waiting.
    pub fn drain(&mut self, presenter: &mut impl Presenter) -> Vec<ServerMessage> {
        let mut messages = Vec::new();
        while let Ok(message) = self.inbox.try_recv() {
            self.projection.apply(&message, presenter);
            messages.push(message);
        }
        messages
    }

    /// Sends a client message through the same validation as the network
    /// path.
    #[instrument(skip(self), fields(player_id = %self.player_id()))]
    pub fn send(&self, message: ClientMessage) -> Result<(), ClientError> {
        match message.into_intent()? {
            Intent::Move { index } => self.room.submit_action(self.player_id().clone(), index)?,
            Intent::Leave => self.room.leave(self.player_id().clone()),
        }
        Ok(())
    }

    /// Sends a move intent for `index`.
    pub fn play(&self, index: usize) -> Result<(), ClientError> {
        self.send(self.projection.move_intent(index))
    }

    /// Leaves the room.
    pub fn leave(self) {
        debug!(player_id = %self.player_id(), "Leaving room");
        self.room.leave(self.player_id().clone());
    }
}

/// Failure to deliver an intent.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::From)]
pub enum ClientError {
    /// The message was malformed.
    #[display("{}", _0)]
    Protocol(ProtocolError),
    /// The room is gone.
    #[display("{}", _0)]
    Lobby(LobbyError),
}

impl std::error::Error for ClientError {}
