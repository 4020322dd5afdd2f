//! Scripted opponents
//!
//! A scripted rocket is driven through the same [`ControlInput`] a human
//! sends. The room resolves the target each tick and hands it to a
//! [`Pilot`]; the pilot only decides which controls to hold.

use std::f64::consts::{PI, TAU};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::constants::{FIRING_RANGE, STEER_DEADBAND, THRUST_ALIGNMENT};
use super::input::ControlInput;
use super::Combatant;

/// Produces the next control input for a rocket
pub trait Pilot: Send {
    fn next_input(&mut self, own: &Combatant, target: Option<&Combatant>) -> ControlInput;
}

/// Tunable behaviour of an [`OpponentController`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Personality {
    /// 0..=1, higher means less willing to back off
    pub aggression: f64,
    /// Heading error (rad) under which it fires
    pub accuracy: f64,
    /// Ticks a decision is held before it is recomputed
    pub reaction_delay: u32,
    /// Width (rad) of the uniform noise added to steering
    pub jitter: f64,
    /// Engagement distance it tries to keep
    pub preferred_distance: f64,
}

impl Default for Personality {
    fn default() -> Self {
        Self {
            aggression: 0.5,
            accuracy: 0.3,
            reaction_delay: 0,
            jitter: 0.0,
            preferred_distance: 150.0,
        }
    }
}

impl Personality {
    /// Closes in, fires often, reacts quickly
    pub fn aggressor() -> Self {
        Self {
            aggression: 0.8,
            accuracy: 0.4,
            reaction_delay: 3,
            jitter: 0.1,
            preferred_distance: 100.0,
        }
    }

    /// Keeps its distance, precise shots, slow reactions
    pub fn sniper() -> Self {
        Self {
            aggression: 0.3,
            accuracy: 0.2,
            reaction_delay: 8,
            jitter: 0.05,
            preferred_distance: 250.0,
        }
    }

    pub fn validate(&self) -> Result<(), PersonalityError> {
        if !(0.0..=1.0).contains(&self.aggression) {
            return Err(PersonalityError::Aggression(self.aggression));
        }
        if !self.accuracy.is_finite() || self.accuracy < 0.0 {
            return Err(PersonalityError::Negative("accuracy", self.accuracy));
        }
        if !self.jitter.is_finite() || self.jitter < 0.0 {
            return Err(PersonalityError::Negative("jitter", self.jitter));
        }
        if !self.preferred_distance.is_finite() || self.preferred_distance < 0.0 {
            return Err(PersonalityError::Negative(
                "preferred_distance",
                self.preferred_distance,
            ));
        }
        Ok(())
    }
}

/// Personality validation errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PersonalityError {
    #[error("aggression must be within 0..=1, got {0}")]
    Aggression(f64),

    #[error("{0} must be a finite non-negative number, got {1}")]
    Negative(&'static str, f64),
}

/// Normalize an angle into (-π, π]
pub fn wrap_angle(angle: f64) -> f64 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI {
        wrapped + TAU
    } else {
        wrapped
    }
}

/// Reactive steering AI with a personality
#[derive(Debug, Clone)]
pub struct OpponentController {
    personality: Personality,
    ticks_since_decision: u32,
    last_decision: ControlInput,
    rng: ChaCha8Rng,
}

impl OpponentController {
    pub fn new(personality: Personality, seed: u64) -> Result<Self, PersonalityError> {
        personality.validate()?;
        Ok(Self {
            personality,
            // First call always decides
            ticks_since_decision: personality.reaction_delay,
            last_decision: ControlInput::IDLE,
            rng: ChaCha8Rng::seed_from_u64(seed),
        })
    }

    pub fn personality(&self) -> &Personality {
        &self.personality
    }

    fn decide(&mut self, own: &Combatant, target: &Combatant) -> ControlInput {
        let to_target = target.position - own.position;
        let angle_diff = wrap_angle(to_target.angle() - own.angle);
        let distance = to_target.magnitude();

        // Noise affects steering only, never the fire or thrust checks
        let noise = (self.rng.gen::<f64>() - 0.5) * self.personality.jitter;
        let steering = angle_diff + noise;

        let p = &self.personality;
        ControlInput {
            turn_left: steering < -STEER_DEADBAND,
            turn_right: steering > STEER_DEADBAND,
            thrust_forward: angle_diff.abs() < THRUST_ALIGNMENT && distance > p.preferred_distance,
            thrust_backward: distance < p.preferred_distance * p.aggression,
            fire: angle_diff.abs() < p.accuracy && distance < FIRING_RANGE,
        }
    }
}

impl Pilot for OpponentController {
    fn next_input(&mut self, own: &Combatant, target: Option<&Combatant>) -> ControlInput {
        let Some(target) = target else {
            return ControlInput::IDLE;
        };

        if self.ticks_since_decision < self.personality.reaction_delay {
            self.ticks_since_decision += 1;
            return self.last_decision;
        }

        let decision = self.decide(own, target);
        self.ticks_since_decision = 1;
        self.last_decision = decision;
        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::combatant::SpawnPose;

    fn duel(target_x: f64, target_y: f64) -> (Combatant, Combatant) {
        (
            Combatant::scripted("bot", "Bot", SpawnPose::new(0.0, 0.0, 0.0)),
            Combatant::new("human", "Human", SpawnPose::new(target_x, target_y, PI)),
        )
    }

    #[test]
    fn wrap_angle_range() {
        assert!((wrap_angle(3.0 * PI).abs() - PI).abs() < 1e-9);
        assert!((wrap_angle(-PI) - PI).abs() < 1e-9);
        assert!((wrap_angle(-3.0 * PI / 2.0) - PI / 2.0).abs() < 1e-9);
        assert!((wrap_angle(0.25) - 0.25).abs() < 1e-12);
        assert!(wrap_angle(10_000.0).abs() <= PI);
    }

    #[test]
    fn no_target_disengages() {
        let mut ai = OpponentController::new(Personality::default(), 1).unwrap();
        let (own, _) = duel(100.0, 0.0);
        assert_eq!(ai.next_input(&own, None), ControlInput::IDLE);
    }

    #[test]
    fn aligned_far_target_thrusts_and_holds_fire() {
        let mut ai = OpponentController::new(Personality::default(), 1).unwrap();
        let (own, target) = duel(360.0, 0.0);
        let input = ai.next_input(&own, Some(&target));
        assert!(input.thrust_forward);
        assert!(!input.fire, "target is beyond firing range");
        assert!(!input.turn_left && !input.turn_right);
    }

    #[test]
    fn aligned_target_in_range_is_fired_on() {
        let mut ai = OpponentController::new(Personality::default(), 1).unwrap();
        let (own, target) = duel(200.0, 0.0);
        let input = ai.next_input(&own, Some(&target));
        assert!(input.fire && input.thrust_forward);
    }

    #[test]
    fn steers_toward_target() {
        let mut ai = OpponentController::new(Personality::default(), 1).unwrap();
        let (own, above) = duel(0.0, 200.0);
        let input = ai.next_input(&own, Some(&above));
        assert!(input.turn_right && !input.turn_left);
        assert!(!input.fire && !input.thrust_forward);

        let (own, below) = duel(0.0, -200.0);
        let input = ai.next_input(&own, Some(&below));
        assert!(input.turn_left && !input.turn_right);
    }

    #[test]
    fn retreats_inside_aggression_threshold() {
        let mut ai = OpponentController::new(Personality::default(), 1).unwrap();
        // 150 * 0.5 = 75
        let (own, close) = duel(70.0, 0.0);
        assert!(ai.next_input(&own, Some(&close)).thrust_backward);

        let (own, mid) = duel(80.0, 0.0);
        assert!(!ai.next_input(&own, Some(&mid)).thrust_backward);
    }

    #[test]
    fn reaction_delay_holds_decision() {
        let personality = Personality {
            reaction_delay: 5,
            ..Personality::default()
        };
        let mut ai = OpponentController::new(personality, 1).unwrap();
        let (own, target) = duel(200.0, 0.0);
        let first = ai.next_input(&own, Some(&target));
        assert!(first.fire);

        // Target jumps behind; decision stays sticky through tick 5
        let (_, moved) = duel(-200.0, 10.0);
        for _ in 2..=5 {
            assert_eq!(ai.next_input(&own, Some(&moved)), first);
        }
        assert_ne!(ai.next_input(&own, Some(&moved)), first);
    }

    #[test]
    fn jitter_does_not_affect_firing() {
        let personality = Personality {
            jitter: 10.0,
            ..Personality::default()
        };
        let (own, target) = duel(200.0, 0.0);
        for seed in 0..32 {
            let mut ai = OpponentController::new(personality, seed).unwrap();
            let input = ai.next_input(&own, Some(&target));
            assert!(input.fire && input.thrust_forward);
        }
    }

    #[test]
    fn same_seed_same_decisions() {
        let personality = Personality::aggressor();
        let (own, target) = duel(120.0, 40.0);
        let mut a = OpponentController::new(personality, 99).unwrap();
        let mut b = OpponentController::new(personality, 99).unwrap();
        for _ in 0..20 {
            assert_eq!(
                a.next_input(&own, Some(&target)),
                b.next_input(&own, Some(&target))
            );
        }
    }

    #[test]
    fn rejects_out_of_range_personality() {
        let bad = Personality {
            aggression: 1.5,
            ..Personality::default()
        };
        assert_eq!(
            OpponentController::new(bad, 0).unwrap_err(),
            PersonalityError::Aggression(1.5)
        );

        let bad = Personality {
            jitter: f64::NAN,
            ..Personality::default()
        };
        assert!(bad.validate().is_err());
        assert!(Personality::aggressor().validate().is_ok());
        assert!(Personality::sniper().validate().is_ok());
    }
}
