//! Discrete control input shared by humans and scripted opponents

use serde::{Deserialize, Serialize};

/// Last-received control state for one rocket.
///
/// Accepted verbatim from the transport: missing fields are `false`, and the
/// legacy short names (`up`, `down`, `left`, `right`) are understood.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ControlInput {
    #[serde(alias = "up")]
    pub thrust_forward: bool,
    #[serde(alias = "down")]
    pub thrust_backward: bool,
    #[serde(alias = "left")]
    pub turn_left: bool,
    #[serde(alias = "right")]
    pub turn_right: bool,
    pub fire: bool,
}

impl ControlInput {
    /// All controls released
    pub const IDLE: ControlInput = ControlInput {
        thrust_forward: false,
        thrust_backward: false,
        turn_left: false,
        turn_right: false,
        fire: false,
    };
}
