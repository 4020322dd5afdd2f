//! Session layer: room registry and the fixed-rate tick loop

pub mod registry;
pub mod tick;

pub use registry::{JoinOutcome, RoomKind, RoomRegistry, SessionError};
pub use tick::run_tick_loop;
