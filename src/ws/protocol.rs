//! WebSocket protocol message definitions
//! These are the wire types for client-server communication

use serde::{Deserialize, Serialize};

use crate::game::{ControlInput, RoomSnapshot};

fn default_player_name() -> String {
    "Player".to_string()
}

/// Messages sent from client to server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMsg {
    /// Take a seat in a room, creating it if needed
    #[serde(rename_all = "camelCase")]
    Join {
        room_id: String,
        #[serde(default = "default_player_name")]
        player_name: String,
    },

    /// Latest control state (last input wins)
    Input { input: ControlInput },

    /// Start a practice match against a scripted opponent
    Practice,

    /// Watch two scripted opponents fight in a private room
    Spectate,

    /// Start a fresh match once the current one has ended
    Restart,
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMsg {
    /// Seat taken
    #[serde(rename_all = "camelCase")]
    Joined { player_id: String, room_id: String },

    /// Request rejected
    Error { message: String },

    /// Room started playing
    GameStart,

    /// Spectator room ready
    #[serde(rename_all = "camelCase")]
    SpectateStart { player_id: String, room_id: String },

    /// Per-tick room snapshot
    State(RoomSnapshot),

    /// Room still waiting for players
    Waiting { players: usize, needed: usize },

    /// A player disconnected
    #[serde(rename_all = "camelCase")]
    PlayerLeft { player_id: String },
}
