//! Game simulation modules

pub mod combat;
pub mod combatant;
pub mod constants;
pub mod input;
pub mod opponent;
pub mod room;
pub mod snapshot;
pub mod vector;

pub use combat::Projectile;
pub use combatant::{Combatant, Controller, SpawnPose};
pub use input::ControlInput;
pub use opponent::{OpponentController, Personality, PersonalityError, Pilot};
pub use room::{Room, RoomState, TargetSelector};
pub use snapshot::{BulletSnapshot, RocketSnapshot, RoomSnapshot};
pub use vector::Vector2;
