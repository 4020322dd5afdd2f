//! Arena tuning constants
//!
//! These values are part of the observable contract with renderers and must
//! stay identical across implementations for a replay to line up.

use std::f64::consts::PI;

// Arena
pub const ARENA_RADIUS: f64 = 400.0;

// Rockets
pub const ROCKET_RADIUS: f64 = 15.0;
pub const MAX_SPEED: f64 = 6.0;
pub const THRUST_POWER: f64 = 0.15; // per tick
pub const REVERSE_THRUST_FACTOR: f64 = 0.5;
pub const ROTATION_SPEED: f64 = 0.08; // rad per tick
pub const FRICTION: f64 = 0.995; // velocity multiplier per tick
pub const MAX_HEALTH: f64 = 100.0;
pub const FIRE_COOLDOWN: u32 = 15; // ticks

/// Wall contact damage. Kept for configuration parity only: the wall rule is
/// instant destruction and this value is never applied.
pub const WALL_DAMAGE: f64 = 10.0;

// Bullets
pub const BULLET_RADIUS: f64 = 4.0;
pub const BULLET_SPEED: f64 = 8.0;
pub const BULLET_LIFETIME: u32 = 120; // ticks
pub const BULLET_DAMAGE: f64 = 20.0;
/// Share of the firer's velocity carried by a new bullet
pub const BULLET_INHERITED_MOMENTUM: f64 = 0.3;
/// Spawn distance of a bullet ahead of the rocket centre
pub const MUZZLE_OFFSET: f64 = ROCKET_RADIUS + BULLET_RADIUS + 2.0;

// Seats
pub const SEAT_COUNT: usize = 2;

/// Spawn pose `(x, y, angle)` per seat index, mirrored across the y axis
pub const SPAWN_POSES: [(f64, f64, f64); SEAT_COUNT] = [(-200.0, 0.0, 0.0), (200.0, 0.0, PI)];

// Scripted opponents
pub const STEER_DEADBAND: f64 = 0.1; // rad
pub const THRUST_ALIGNMENT: f64 = 0.5; // rad
pub const FIRING_RANGE: f64 = 350.0;
