//! Admission and simple pairing.
//!
//! The lobby hands each connecting player to a room: either the one room
//! currently waiting for an opponent, or a fresh one.

use crate::error::{LobbyError, SessionError};
use crate::room::{self, Outbox, RoomConfig, RoomHandle, RoomId, RoomSummary};
use crate::session::{PlayerId, Slot, SlotAssignment};
use derive_getters::Getters;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, instrument, warn};

const JOIN_ATTEMPTS: usize = 3;

/// A player's seat in a room.
#[derive(Debug, Clone, Getters)]
pub struct Admission {
    /// Slot assignment returned by the room.
    assignment: SlotAssignment,
    /// Room the player was admitted to.
    room: RoomHandle,
}

#[derive(Debug, Default)]
struct LobbyState {
    rooms: HashMap<RoomId, RoomHandle>,
    open: Option<RoomId>,
    next_room: u64,
}

impl LobbyState {
    fn reap(&mut self) {
        self.rooms.retain(|id, handle| {
            let live = !handle.is_closed();
            if !live {
                debug!(room_id = %id, "Reaping closed room");
            }
            live
        });
        if self
            .open
            .as_ref()
            .is_some_and(|id| !self.rooms.contains_key(id))
        {
            self.open = None;
        }
    }

    fn create(&mut self, id: RoomId, config: RoomConfig) -> RoomHandle {
        let handle = room::spawn(id.clone(), config);
        self.rooms.insert(id, handle.clone());
        handle
    }

    fn fresh_id(&mut self) -> RoomId {
        loop {
            self.next_room += 1;
            let id = format!("room-{}", self.next_room);
            if !self.rooms.contains_key(&id) {
                return id;
            }
        }
    }
}

/// Registry of live rooms.
#[derive(Debug, Clone)]
pub struct Lobby {
    state: Arc<Mutex<LobbyState>>,
    config: RoomConfig,
}

impl Lobby {
    /// Creates an empty lobby whose rooms use `config`.
    #[instrument]
    pub fn new(config: RoomConfig) -> Self {
        info!("Creating lobby");
        Self {
            state: Arc::new(Mutex::new(LobbyState::default())),
            config,
        }
    }

    /// Settings given to new rooms.
    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Admits a player into the waiting room, creating one if needed.
    #[instrument(skip(self, outbox))]
    pub async fn join_or_create(
        &self,
        player_id: PlayerId,
        outbox: Outbox,
    ) -> Result<Admission, LobbyError> {
        let mut last_error = None;
        for attempt in 1..=JOIN_ATTEMPTS {
            let room = {
                let mut state = self.lock();
                state.reap();
                let waiting = state
                    .open
                    .as_ref()
                    .and_then(|id| state.rooms.get(id))
                    .cloned();
                match waiting {
                    Some(room) => room,
                    None => {
                        let id = state.fresh_id();
                        let room = state.create(id.clone(), self.config);
                        state.open = Some(id);
                        room
                    }
                }
            };

            match room.join(player_id.clone(), outbox.clone()).await {
                Ok(assignment) => {
                    if *assignment.slot() == Slot::Second {
                        self.close_if_open(room.id());
                    }
                    info!(room_id = %room.id(), slot = %assignment.slot(), "Player seated");
                    return Ok(Admission { assignment, room });
                }
                Err(e @ (LobbyError::Session(SessionError::RoomFull) | LobbyError::RoomClosed(_))) => {
                    debug!(room_id = %room.id(), attempt, error = %e, "Open room unavailable, retrying");
                    self.close_if_open(room.id());
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }
        warn!(attempts = JOIN_ATTEMPTS, "Could not seat player");
        Err(last_error.unwrap_or(LobbyError::Session(SessionError::RoomFull)))
    }

    /// Admits a player into the named room, creating it if it does not exist.
    #[instrument(skip(self, outbox))]
    pub async fn join_room(
        &self,
        room_id: RoomId,
        player_id: PlayerId,
        outbox: Outbox,
    ) -> Result<Admission, LobbyError> {
        let room = {
            let mut state = self.lock();
            state.reap();
            match state.rooms.get(&room_id).cloned() {
                Some(room) => room,
                None => {
                    info!(room_id = %room_id, "Creating named room");
                    state.create(room_id.clone(), self.config)
                }
            }
        };
        let assignment = room.join(player_id, outbox).await?;
        Ok(Admission { assignment, room })
    }

    /// Summaries of live rooms, sorted by id.
    #[instrument(skip(self))]
    pub async fn rooms(&self) -> Vec<RoomSummary> {
        let handles: Vec<RoomHandle> = {
            let mut state = self.lock();
            state.reap();
            state.rooms.values().cloned().collect()
        };
        let mut summaries = Vec::with_capacity(handles.len());
        for handle in handles {
            if let Some(summary) = handle.summary().await {
                summaries.push(summary);
            }
        }
        summaries.sort_by(|a, b| a.id().cmp(b.id()));
        info!(count = summaries.len(), "Listed rooms");
        summaries
    }

    fn close_if_open(&self, room_id: &RoomId) {
        let mut state = self.lock();
        if state.open.as_ref() == Some(room_id) {
            state.open = None;
        }
    }

    fn lock(&self) -> MutexGuard<'_, LobbyState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Lobby {
    fn default() -> Self {
        Self::new(RoomConfig::default())
    }
}
