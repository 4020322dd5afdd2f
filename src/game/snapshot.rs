//! Per-tick room snapshot sent to renderers
//!
//! Field names are the wire contract with the browser client.

use serde::{Deserialize, Serialize};

use super::room::RoomState;

/// Read-only view of a room after a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub state: RoomState,
    pub winner: Option<String>,
    pub arena_radius: f64,
    pub rockets: Vec<RocketSnapshot>,
    /// Active bullets only
    pub bullets: Vec<BulletSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RocketSnapshot {
    pub id: String,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub angle: f64,
    pub health: f64,
    pub thrusting: bool,
    pub turning_left: bool,
    pub turning_right: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BulletSnapshot {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
}
