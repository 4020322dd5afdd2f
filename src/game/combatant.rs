//! Rocket state and per-tick integration

use super::combat::Projectile;
use super::constants::{
    BULLET_INHERITED_MOMENTUM, BULLET_SPEED, FIRE_COOLDOWN, FRICTION, MAX_HEALTH, MAX_SPEED,
    MUZZLE_OFFSET, REVERSE_THRUST_FACTOR, ROTATION_SPEED, THRUST_POWER,
};
use super::input::ControlInput;
use super::snapshot::RocketSnapshot;
use super::vector::Vector2;

/// Initial position and heading of a rocket
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnPose {
    pub position: Vector2,
    pub angle: f64,
}

impl SpawnPose {
    pub const fn new(x: f64, y: f64, angle: f64) -> Self {
        Self {
            position: Vector2::new(x, y),
            angle,
        }
    }
}

/// Who produces this rocket's input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Controller {
    Human,
    Scripted,
}

/// An arena fighter (authoritative)
#[derive(Debug, Clone)]
pub struct Combatant {
    pub id: String,
    pub name: String,
    pub controller: Controller,

    // Kinematics
    pub position: Vector2,
    pub velocity: Vector2,
    /// Heading in radians, unbounded
    pub angle: f64,

    // Combat
    health: f64,
    pub fire_cooldown: u32,

    pub input: ControlInput,

    // Presentation flags, recomputed every tick
    pub thrusting: bool,
    pub turning_left: bool,
    pub turning_right: bool,
}

impl Combatant {
    pub fn new(id: impl Into<String>, name: impl Into<String>, spawn: SpawnPose) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            controller: Controller::Human,
            position: spawn.position,
            velocity: Vector2::ZERO,
            angle: spawn.angle,
            health: MAX_HEALTH,
            fire_cooldown: 0,
            input: ControlInput::IDLE,
            thrusting: false,
            turning_left: false,
            turning_right: false,
        }
    }

    pub fn scripted(id: impl Into<String>, name: impl Into<String>, spawn: SpawnPose) -> Self {
        Self {
            controller: Controller::Scripted,
            ..Self::new(id, name, spawn)
        }
    }

    pub fn health(&self) -> f64 {
        self.health
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    pub fn is_scripted(&self) -> bool {
        self.controller == Controller::Scripted
    }

    pub fn set_input(&mut self, input: ControlInput) {
        self.input = input;
    }

    /// Apply the current input and integrate one tick
    pub fn apply_input(&mut self) {
        self.thrusting = false;
        self.turning_left = false;
        self.turning_right = false;

        // Both turns may apply in the same tick
        if self.input.turn_left {
            self.angle -= ROTATION_SPEED;
            self.turning_left = true;
        }
        if self.input.turn_right {
            self.angle += ROTATION_SPEED;
            self.turning_right = true;
        }

        if self.input.thrust_forward {
            self.velocity = self.velocity + Vector2::from_angle(self.angle, THRUST_POWER);
            self.thrusting = true;
        }
        // Reverse thrust has no presentation flag
        if self.input.thrust_backward {
            let brake = Vector2::from_angle(self.angle, -THRUST_POWER * REVERSE_THRUST_FACTOR);
            self.velocity = self.velocity + brake;
        }

        self.velocity = self.velocity.scale(FRICTION).limit(MAX_SPEED);
        self.position = self.position + self.velocity;

        self.fire_cooldown = self.fire_cooldown.saturating_sub(1);
    }

    pub fn can_fire(&self) -> bool {
        self.input.fire && self.fire_cooldown == 0 && self.is_alive()
    }

    /// Launch a bullet from the nose. Callers gate on [`Combatant::can_fire`].
    pub fn fire(&mut self) -> Projectile {
        self.fire_cooldown = FIRE_COOLDOWN;
        let position = self.position + Vector2::from_angle(self.angle, MUZZLE_OFFSET);
        let velocity = Vector2::from_angle(self.angle, BULLET_SPEED)
            + self.velocity.scale(BULLET_INHERITED_MOMENTUM);
        Projectile::new(self.id.clone(), position, velocity)
    }

    pub fn take_damage(&mut self, amount: f64) {
        self.health = (self.health - amount).max(0.0);
    }

    /// Instant destruction (arena wall contact)
    pub fn destroy(&mut self) {
        self.health = 0.0;
    }

    pub fn snapshot(&self) -> RocketSnapshot {
        RocketSnapshot {
            id: self.id.clone(),
            name: self.name.clone(),
            x: self.position.x,
            y: self.position.y,
            vx: self.velocity.x,
            vy: self.velocity.y,
            angle: self.angle,
            health: self.health,
            thrusting: self.thrusting,
            turning_left: self.turning_left,
            turning_right: self.turning_right,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn rocket() -> Combatant {
        Combatant::new("r", "Rocket", SpawnPose::new(0.0, 0.0, 0.0))
    }

    #[test]
    fn forward_thrust_accelerates_along_heading() {
        let mut r = rocket();
        r.set_input(ControlInput {
            thrust_forward: true,
            ..ControlInput::IDLE
        });
        r.apply_input();

        let expected = THRUST_POWER * FRICTION;
        assert!((r.velocity.x - expected).abs() < EPS);
        assert!(r.velocity.y.abs() < EPS);
        assert!((r.position.x - expected).abs() < EPS);
        assert!(r.thrusting);
    }

    #[test]
    fn reverse_thrust_is_half_power_and_unflagged() {
        let mut r = rocket();
        r.set_input(ControlInput {
            thrust_backward: true,
            ..ControlInput::IDLE
        });
        r.apply_input();

        assert!((r.velocity.x + THRUST_POWER * 0.5 * FRICTION).abs() < EPS);
        assert!(!r.thrusting);
    }

    #[test]
    fn both_turns_apply_in_the_same_tick() {
        let mut r = rocket();
        r.set_input(ControlInput {
            turn_left: true,
            turn_right: true,
            ..ControlInput::IDLE
        });
        r.apply_input();
        assert!(r.turning_left && r.turning_right);
        assert!(r.angle.abs() < EPS);

        r.set_input(ControlInput::IDLE);
        r.apply_input();
        assert!(!r.turning_left && !r.turning_right && !r.thrusting);
    }

    #[test]
    fn speed_is_capped() {
        let mut r = rocket();
        r.velocity = Vector2::new(50.0, 0.0);
        r.apply_input();
        assert!((r.velocity.magnitude() - MAX_SPEED).abs() < EPS);
    }

    #[test]
    fn firing_sets_cooldown_and_inherits_momentum() {
        let mut r = rocket();
        r.velocity = Vector2::new(2.0, 0.0);
        r.set_input(ControlInput {
            fire: true,
            ..ControlInput::IDLE
        });
        assert!(r.can_fire());

        let bullet = r.fire();
        assert_eq!(r.fire_cooldown, FIRE_COOLDOWN);
        assert!(!r.can_fire());
        assert_eq!(bullet.owner_id, "r");
        assert!((bullet.position.x - MUZZLE_OFFSET).abs() < EPS);
        assert!((bullet.velocity.x - (BULLET_SPEED + 0.6)).abs() < EPS);

        for _ in 0..FIRE_COOLDOWN {
            r.apply_input();
        }
        assert_eq!(r.fire_cooldown, 0);
        assert!(r.can_fire());
    }

    #[test]
    fn damage_floors_at_zero() {
        let mut r = rocket();
        r.take_damage(30.0);
        assert_eq!(r.health(), 70.0);
        r.take_damage(500.0);
        assert_eq!(r.health(), 0.0);
        assert!(!r.is_alive());

        r.set_input(ControlInput {
            fire: true,
            ..ControlInput::IDLE
        });
        assert!(!r.can_fire());
    }

    #[test]
    fn cooldown_never_underflows() {
        let mut r = rocket();
        r.apply_input();
        assert_eq!(r.fire_cooldown, 0);
    }
}
