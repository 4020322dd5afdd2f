//! Projectiles and hit detection

use super::constants::{BULLET_LIFETIME, BULLET_RADIUS, ROCKET_RADIUS};
use super::snapshot::BulletSnapshot;
use super::vector::Vector2;
use super::Combatant;

/// Active bullet in the arena
#[derive(Debug, Clone)]
pub struct Projectile {
    /// Rocket that fired this bullet; never damaged by it
    pub owner_id: String,
    pub position: Vector2,
    pub velocity: Vector2,
    /// Remaining ticks before the bullet expires
    pub lifetime: i32,
    active: bool,
}

impl Projectile {
    pub fn new(owner_id: impl Into<String>, position: Vector2, velocity: Vector2) -> Self {
        Self {
            owner_id: owner_id.into(),
            position,
            velocity,
            lifetime: BULLET_LIFETIME as i32,
            active: true,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Advance one tick. Collisions are resolved by the room.
    pub fn apply_motion(&mut self) {
        self.position = self.position + self.velocity;
        self.lifetime -= 1;
        if self.lifetime <= 0 {
            self.active = false;
        }
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }

    /// Whether this bullet overlaps `target`'s hull
    pub fn hits(&self, target: &Combatant) -> bool {
        self.position.distance(target.position) < ROCKET_RADIUS + BULLET_RADIUS
    }

    pub fn snapshot(&self) -> BulletSnapshot {
        BulletSnapshot {
            x: self.position.x,
            y: self.position.y,
            vx: self.velocity.x,
            vy: self.velocity.y,
        }
    }
}
