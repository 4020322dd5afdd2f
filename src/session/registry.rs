//! Registry of live rooms and the connections seated in them

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::game::constants::SEAT_COUNT;
use crate::game::{ControlInput, Room, RoomState};
use crate::ws::protocol::ServerMsg;

/// How a room was created, which decides how it is restarted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomKind {
    /// Humans (and possibly a practice opponent)
    Match,
    /// Two scripted opponents watched by one connection
    Spectate,
}

/// Handle to a room and its observers
#[derive(Clone)]
struct RoomEntry {
    room: Arc<Mutex<Room>>,
    kind: RoomKind,
    tx: broadcast::Sender<ServerMsg>,
}

/// Result of seating a connection
#[derive(Debug)]
pub struct JoinOutcome {
    pub room_id: String,
    /// Whether this join started the match
    pub started: bool,
    /// Room broadcast (snapshots, waiting notices, departures)
    pub updates: broadcast::Receiver<ServerMsg>,
}

/// Session errors surfaced to clients
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("Room is full")]
    RoomFull,

    #[error("Not in a room")]
    NotInRoom,

    #[error("Already in this room")]
    AlreadyInRoom,
}

/// Process-wide room table. The simulation core never sees this.
pub struct RoomRegistry {
    rooms: DashMap<String, RoomEntry>,
    /// Connection id -> room id
    connections: DashMap<String, String>,
    broadcast_capacity: usize,
}

impl RoomRegistry {
    pub fn new(broadcast_capacity: usize) -> Self {
        Self {
            rooms: DashMap::new(),
            connections: DashMap::new(),
            broadcast_capacity: broadcast_capacity.max(1),
        }
    }

    pub fn active_rooms(&self) -> usize {
        self.rooms.len()
    }

    pub fn connected_players(&self) -> usize {
        self.connections.len()
    }

    /// Room a connection is currently mapped to
    pub fn room_of(&self, conn_id: &str) -> Option<String> {
        self.connections.get(conn_id).map(|r| r.value().clone())
    }

    /// Shared handle to a room, for inspection
    pub fn room(&self, room_id: &str) -> Option<Arc<Mutex<Room>>> {
        self.rooms.get(room_id).map(|e| e.value().room.clone())
    }

    fn entry(&self, room_id: &str) -> Option<RoomEntry> {
        self.rooms.get(room_id).map(|e| e.value().clone())
    }

    fn get_or_create(&self, room_id: &str, kind: RoomKind) -> RoomEntry {
        self.rooms
            .entry(room_id.to_string())
            .or_insert_with(|| {
                info!(room_id = %room_id, ?kind, "Room created");
                RoomEntry {
                    room: Arc::new(Mutex::new(Room::new(room_id))),
                    kind,
                    tx: broadcast::channel(self.broadcast_capacity).0,
                }
            })
            .value()
            .clone()
    }

    fn entry_for(&self, conn_id: &str) -> Result<RoomEntry, SessionError> {
        self.room_of(conn_id)
            .and_then(|room_id| self.entry(&room_id))
            .ok_or(SessionError::NotInRoom)
    }

    /// Seat a connection in `room_id`, creating the room on first join.
    /// A rejected join leaves the connection where it was.
    pub fn join(
        &self,
        conn_id: &str,
        room_id: &str,
        player_name: &str,
    ) -> Result<JoinOutcome, SessionError> {
        if self.room_of(conn_id).as_deref() == Some(room_id) {
            return Err(SessionError::AlreadyInRoom);
        }

        let entry = self.get_or_create(room_id, RoomKind::Match);

        // Take the seat before giving up the old one. The seated human keeps
        // the room alive until the connection is mapped below.
        let started = {
            let mut room = entry.room.lock();
            let was_waiting = room.state() == RoomState::Waiting;
            if !room.add_player(conn_id, player_name) {
                drop(room);
                self.remove_if_unobserved(room_id);
                return Err(SessionError::RoomFull);
            }
            was_waiting && room.state() == RoomState::Playing
        };

        self.leave(conn_id);
        self.connections
            .insert(conn_id.to_string(), room_id.to_string());

        let updates = entry.tx.subscribe();
        if started {
            let _ = entry.tx.send(ServerMsg::GameStart);
        }

        info!(conn_id = %conn_id, room_id = %room_id, player_name = %player_name, "Joined room");
        Ok(JoinOutcome {
            room_id: room_id.to_string(),
            started,
            updates,
        })
    }

    /// Replace the connection's input. Unseated connections are ignored.
    pub fn set_input(&self, conn_id: &str, input: ControlInput) {
        if let Ok(entry) = self.entry_for(conn_id) {
            entry.room.lock().set_input(conn_id, input);
        }
    }

    /// Add a practice opponent when the connection waits alone.
    /// Returns whether practice started.
    pub fn practice(&self, conn_id: &str) -> Result<bool, SessionError> {
        let entry = self.entry_for(conn_id)?;
        let started = {
            let mut room = entry.room.lock();
            if room.state() != RoomState::Waiting || room.seat_count() != 1 {
                return Ok(false);
            }
            room.add_single_opponent();
            room.state() == RoomState::Playing
        };

        if started {
            let _ = entry.tx.send(ServerMsg::GameStart);
            info!(conn_id = %conn_id, "Practice started");
        }
        Ok(started)
    }

    /// Open a private room where two scripted opponents fight
    pub fn spectate(&self, conn_id: &str) -> JoinOutcome {
        self.leave(conn_id);

        let room_id = format!("spectate_{conn_id}");
        self.connections.insert(conn_id.to_string(), room_id.clone());
        let entry = self.get_or_create(&room_id, RoomKind::Spectate);
        entry.room.lock().add_opponent_pair();

        info!(conn_id = %conn_id, room_id = %room_id, "Spectating");
        JoinOutcome {
            room_id,
            started: true,
            updates: entry.tx.subscribe(),
        }
    }

    /// Replace an ended room with a fresh match. Returns the room kind when a
    /// restart happened.
    pub fn restart(&self, conn_id: &str) -> Result<Option<RoomKind>, SessionError> {
        let entry = self.entry_for(conn_id)?;
        let started = {
            let mut room = entry.room.lock();
            if room.state() != RoomState::Ended {
                return Ok(None);
            }

            let mut fresh = Room::new(room.id());
            match entry.kind {
                RoomKind::Spectate => fresh.add_opponent_pair(),
                RoomKind::Match => {
                    for rocket in room.combatants().iter().filter(|c| !c.is_scripted()) {
                        fresh.add_player(rocket.id.clone(), rocket.name.clone());
                    }
                    if room.has_opponents() {
                        fresh.add_single_opponent();
                    }
                }
            }
            info!(room_id = %room.id(), "Room restarted");
            *room = fresh;
            room.state() == RoomState::Playing
        };

        if started && entry.kind == RoomKind::Match {
            let _ = entry.tx.send(ServerMsg::GameStart);
        }
        Ok(Some(entry.kind))
    }

    /// Drop a connection, ending its match and deleting the room once no
    /// connection observes it
    pub fn disconnect(&self, conn_id: &str) {
        self.leave(conn_id);
        debug!(conn_id = %conn_id, "Connection removed");
    }

    fn leave(&self, conn_id: &str) {
        let Some((_, room_id)) = self.connections.remove(conn_id) else {
            return;
        };

        if let Some(entry) = self.entry(&room_id) {
            entry.room.lock().remove_player(conn_id);
            let _ = entry.tx.send(ServerMsg::PlayerLeft {
                player_id: conn_id.to_string(),
            });
        }
        self.remove_if_unobserved(&room_id);
    }

    /// Delete a room nobody is mapped to and no human is seated in
    fn remove_if_unobserved(&self, room_id: &str) {
        let removed = self.rooms.remove_if(room_id, |_, entry| {
            !self.connections.iter().any(|c| c.value() == room_id)
                && entry.room.lock().combatants().iter().all(|c| c.is_scripted())
        });
        if removed.is_some() {
            info!(room_id = %room_id, "Room deleted");
        }
    }

    /// Advance every room by one tick and broadcast the result
    pub fn tick_all(&self) {
        // Snapshot handles first; never lock a room while holding a map guard
        let entries: Vec<RoomEntry> = self.rooms.iter().map(|e| e.value().clone()).collect();

        for entry in entries {
            let msg = {
                let mut room = entry.room.lock();
                match room.state() {
                    RoomState::Waiting => ServerMsg::Waiting {
                        players: room.seat_count(),
                        needed: SEAT_COUNT,
                    },
                    RoomState::Playing | RoomState::Ended => {
                        room.update();
                        ServerMsg::State(room.serialize())
                    }
                }
            };
            // No receivers is fine
            let _ = entry.tx.send(msg);
        }
    }
}
