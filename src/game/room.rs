//! Room state and the authoritative per-tick pipeline

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::combat::Projectile;
use super::combatant::{Combatant, SpawnPose};
use super::constants::{ARENA_RADIUS, BULLET_DAMAGE, ROCKET_RADIUS, SEAT_COUNT, SPAWN_POSES};
use super::input::ControlInput;
use super::opponent::{OpponentController, Personality, PersonalityError, Pilot};
use super::snapshot::RoomSnapshot;

/// Room phase. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomState {
    /// Seats still open
    Waiting,
    /// Match in progress
    Playing,
    /// Match decided; the room keeps ticking until it is replaced
    Ended,
}

/// Which rocket a scripted pilot engages
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSelector {
    /// First live rocket other than itself, in join order
    AnyOther,
    /// A specific rocket, while it is alive
    Combatant(String),
}

impl TargetSelector {
    fn resolve<'a>(&self, own_id: &str, combatants: &'a [Combatant]) -> Option<&'a Combatant> {
        match self {
            Self::AnyOther => combatants.iter().find(|c| c.id != own_id && c.is_alive()),
            Self::Combatant(id) => combatants.iter().find(|c| &c.id == id && c.is_alive()),
        }
    }
}

/// Scripted pilot bound to one rocket
struct Autopilot {
    combatant_id: String,
    target: TargetSelector,
    pilot: Box<dyn Pilot>,
}

fn spawn_pose(seat: usize) -> SpawnPose {
    let (x, y, angle) = SPAWN_POSES[seat];
    SpawnPose::new(x, y, angle)
}

/// An isolated match instance
pub struct Room {
    id: String,
    state: RoomState,
    winner: Option<String>,
    tick: u64,
    /// Join order is the hit enumeration order
    combatants: Vec<Combatant>,
    projectiles: Vec<Projectile>,
    autopilots: Vec<Autopilot>,
    opponents_spawned: u32,
    rng: ChaCha8Rng,
}

impl Room {
    pub fn new(id: impl Into<String>) -> Self {
        Self::with_seed(id, rand::random())
    }

    /// Room whose scripted opponents draw from a fixed seed
    pub fn with_seed(id: impl Into<String>, seed: u64) -> Self {
        Self {
            id: id.into(),
            state: RoomState::Waiting,
            winner: None,
            tick: 0,
            combatants: Vec::new(),
            projectiles: Vec::new(),
            autopilots: Vec::new(),
            opponents_spawned: 0,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> RoomState {
        self.state
    }

    pub fn winner(&self) -> Option<&str> {
        self.winner.as_deref()
    }

    /// Ticks simulated so far
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn combatants(&self) -> &[Combatant] {
        &self.combatants
    }

    pub fn combatant(&self, id: &str) -> Option<&Combatant> {
        self.combatants.iter().find(|c| c.id == id)
    }

    pub fn combatant_mut(&mut self, id: &str) -> Option<&mut Combatant> {
        self.combatants.iter_mut().find(|c| c.id == id)
    }

    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    /// Occupied seats, scripted rockets included
    pub fn seat_count(&self) -> usize {
        self.combatants.len()
    }

    pub fn has_opponents(&self) -> bool {
        !self.autopilots.is_empty()
    }

    fn alive_count(&self) -> usize {
        self.combatants.iter().filter(|c| c.is_alive()).count()
    }

    fn start(&mut self) {
        if self.state == RoomState::Waiting {
            self.state = RoomState::Playing;
            info!(room_id = %self.id, seats = self.combatants.len(), "Match started");
        }
    }

    fn end(&mut self, winner: Option<String>) {
        info!(room_id = %self.id, winner = ?winner, tick = self.tick, "Match ended");
        self.state = RoomState::Ended;
        self.winner = winner;
    }

    /// Seat a human rocket. Returns `false` when the room is full.
    pub fn add_player(&mut self, id: impl Into<String>, name: impl Into<String>) -> bool {
        let id = id.into();
        if self.combatants.len() >= SEAT_COUNT {
            debug!(room_id = %self.id, player_id = %id, "Room full");
            return false;
        }
        if self.combatant(&id).is_some() {
            warn!(room_id = %self.id, player_id = %id, "Player already in room");
            return false;
        }

        let seat = self.combatants.len();
        let rocket = Combatant::new(id, name, spawn_pose(seat));
        info!(room_id = %self.id, player_id = %rocket.id, seat, "Player joined room");
        self.combatants.push(rocket);

        if self.combatants.len() == SEAT_COUNT {
            self.start();
        }
        true
    }

    /// Spawn a scripted rocket and bind a pilot to it. Does not change the
    /// room state.
    pub fn add_scripted(
        &mut self,
        id: impl Into<String>,
        name: impl Into<String>,
        spawn: SpawnPose,
        personality: Personality,
        target: TargetSelector,
    ) -> Result<(), PersonalityError> {
        let controller = OpponentController::new(personality, self.rng.gen())?;
        let rocket = Combatant::scripted(id, name, spawn);
        self.attach_pilot(rocket.id.clone(), target, Box::new(controller));
        self.combatants.push(rocket);
        Ok(())
    }

    /// Drive an existing rocket with a custom pilot
    pub fn attach_pilot(
        &mut self,
        combatant_id: impl Into<String>,
        target: TargetSelector,
        pilot: Box<dyn Pilot>,
    ) {
        self.autopilots.push(Autopilot {
            combatant_id: combatant_id.into(),
            target,
            pilot,
        });
    }

    fn next_opponent_tag(&mut self) -> u32 {
        self.opponents_spawned += 1;
        self.opponents_spawned
    }

    /// Solo practice: one scripted opponent on the second spawn, fighting
    /// whoever else is alive. Forces the match to start.
    pub fn add_single_opponent(&mut self) {
        if self.state == RoomState::Ended {
            debug!(room_id = %self.id, "Ignoring opponent spawn in ended room");
            return;
        }

        let id = format!("bot_{}", self.next_opponent_tag());
        if let Err(e) = self.add_scripted(
            id.clone(),
            "Bot",
            spawn_pose(1),
            Personality::default(),
            TargetSelector::AnyOther,
        ) {
            warn!(room_id = %self.id, error = %e, "Failed to spawn opponent");
            return;
        }

        info!(room_id = %self.id, bot_id = %id, "Practice opponent added");
        self.start();
    }

    /// Demo mode: two scripted rockets fighting each other
    pub fn add_opponent_pair(&mut self) {
        if self.state == RoomState::Ended {
            debug!(room_id = %self.id, "Ignoring opponent spawn in ended room");
            return;
        }

        let tag = self.next_opponent_tag();
        let aggressor_id = format!("bot1_{tag}");
        let sniper_id = format!("bot2_{tag}");

        let spawned = self
            .add_scripted(
                aggressor_id.clone(),
                "Aggressor",
                spawn_pose(0),
                Personality::aggressor(),
                TargetSelector::Combatant(sniper_id.clone()),
            )
            .and_then(|_| {
                self.add_scripted(
                    sniper_id.clone(),
                    "Sniper",
                    spawn_pose(1),
                    Personality::sniper(),
                    TargetSelector::Combatant(aggressor_id.clone()),
                )
            });
        if let Err(e) = spawned {
            warn!(room_id = %self.id, error = %e, "Failed to spawn opponent pair");
            return;
        }

        info!(room_id = %self.id, "Opponent pair added");
        self.start();
    }

    /// Remove a rocket. A playing room left with fewer than two rockets ends,
    /// won by the survivor if there is exactly one.
    pub fn remove_player(&mut self, id: &str) {
        let Some(index) = self.combatants.iter().position(|c| c.id == id) else {
            return;
        };
        self.combatants.remove(index);
        self.autopilots.retain(|a| a.combatant_id != id);
        info!(room_id = %self.id, player_id = %id, "Player left room");

        if self.combatants.len() < SEAT_COUNT && self.state == RoomState::Playing {
            let winner = match self.combatants.as_slice() {
                [survivor] => Some(survivor.id.clone()),
                _ => None,
            };
            self.end(winner);
        }
    }

    /// Replace a rocket's input. Unknown ids are ignored.
    pub fn set_input(&mut self, id: &str, input: ControlInput) {
        if let Some(rocket) = self.combatant_mut(id) {
            rocket.set_input(input);
        }
    }

    /// Run one simulation tick. Waiting rooms do not move; ended rooms keep
    /// moving so the final positions stay live.
    pub fn update(&mut self) {
        if self.state == RoomState::Waiting {
            return;
        }
        self.tick += 1;

        self.drive_autopilots();
        self.update_rockets();
        self.update_projectiles();
        self.projectiles.retain(Projectile::is_active);

        if self.state == RoomState::Playing && self.alive_count() <= 1 {
            let winner = self
                .combatants
                .iter()
                .find(|c| c.is_alive())
                .map(|c| c.id.clone());
            self.end(winner);
        }
    }

    fn drive_autopilots(&mut self) {
        for autopilot in &mut self.autopilots {
            let Some(index) = self
                .combatants
                .iter()
                .position(|c| c.id == autopilot.combatant_id)
            else {
                continue;
            };
            let target = autopilot
                .target
                .resolve(&autopilot.combatant_id, &self.combatants);
            let input = autopilot.pilot.next_input(&self.combatants[index], target);
            self.combatants[index].set_input(input);
        }
    }

    fn update_rockets(&mut self) {
        for rocket in self.combatants.iter_mut().filter(|c| c.is_alive()) {
            rocket.apply_input();

            if rocket.can_fire() {
                self.projectiles.push(rocket.fire());
            }

            // Wall contact is instant destruction
            if rocket.position.magnitude() + ROCKET_RADIUS > ARENA_RADIUS {
                rocket.destroy();
                debug!(room_id = %self.id, player_id = %rocket.id, "Rocket hit the wall");
            }
        }
    }

    fn update_projectiles(&mut self) {
        for bullet in self.projectiles.iter_mut().filter(|b| b.is_active()) {
            bullet.apply_motion();

            if bullet.position.magnitude() > ARENA_RADIUS {
                bullet.deactivate();
                continue;
            }

            // One hit per bullet, first rocket in join order wins
            let target = self
                .combatants
                .iter_mut()
                .filter(|c| c.id != bullet.owner_id && c.is_alive())
                .find(|c| bullet.hits(c));
            if let Some(target) = target {
                bullet.deactivate();
                target.take_damage(BULLET_DAMAGE);
                debug!(
                    room_id = %self.id,
                    shooter_id = %bullet.owner_id,
                    target_id = %target.id,
                    health = target.health(),
                    "Bullet hit"
                );
            }
        }
    }

    /// Snapshot for observers
    pub fn serialize(&self) -> RoomSnapshot {
        RoomSnapshot {
            state: self.state,
            winner: self.winner.clone(),
            arena_radius: ARENA_RADIUS,
            rockets: self.combatants.iter().map(Combatant::snapshot).collect(),
            bullets: self
                .projectiles
                .iter()
                .filter(|b| b.is_active())
                .map(Projectile::snapshot)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::constants::{FIRE_COOLDOWN, MAX_HEALTH};
    use crate::game::vector::Vector2;
    use std::f64::consts::PI;

    fn duel() -> Room {
        let mut room = Room::with_seed("room", 42);
        assert!(room.add_player("a", "Alice"));
        assert!(room.add_player("b", "Bob"));
        room
    }

    fn hold(room: &mut Room, id: &str, input: ControlInput) {
        room.set_input(id, input);
    }

    const FIRE: ControlInput = ControlInput {
        thrust_forward: false,
        thrust_backward: false,
        turn_left: false,
        turn_right: false,
        fire: true,
    };

    #[test]
    fn two_joins_start_the_match_at_mirrored_spawns() {
        let mut room = Room::with_seed("room", 1);
        assert!(room.add_player("a", "Alice"));
        assert_eq!(room.state(), RoomState::Waiting);
        assert!(room.add_player("b", "Bob"));
        assert_eq!(room.state(), RoomState::Playing);

        let a = room.combatant("a").unwrap();
        let b = room.combatant("b").unwrap();
        assert_eq!((a.position, a.angle), (Vector2::new(-200.0, 0.0), 0.0));
        assert_eq!((b.position, b.angle), (Vector2::new(200.0, 0.0), PI));
        assert_eq!(a.health(), MAX_HEALTH);

        assert!(!room.add_player("c", "Carol"));
        assert_eq!(room.seat_count(), 2);
    }

    #[test]
    fn waiting_room_does_not_tick() {
        let mut room = Room::with_seed("room", 1);
        room.add_player("a", "Alice");
        room.set_input(
            "a",
            ControlInput {
                thrust_forward: true,
                ..ControlInput::IDLE
            },
        );
        room.update();
        assert_eq!(room.tick(), 0);
        assert_eq!(room.combatant("a").unwrap().position, Vector2::new(-200.0, 0.0));
    }

    #[test]
    fn unknown_input_is_ignored() {
        let mut room = duel();
        room.set_input("ghost", FIRE);
        room.update();
        assert!(room.projectiles().is_empty());
    }

    #[test]
    fn held_fire_is_rate_limited() {
        let mut room = duel();
        // Out of the line of fire so no bullet is consumed
        room.combatant_mut("b").unwrap().position = Vector2::new(0.0, 300.0);
        hold(&mut room, "a", FIRE);

        for _ in 0..(FIRE_COOLDOWN * 4) {
            room.update();
        }
        assert_eq!(room.projectiles().len(), 4);
        let xs: Vec<f64> = room.projectiles().iter().map(|b| b.position.x).collect();
        for pair in xs.windows(2) {
            assert!((pair[0] - pair[1] - 8.0 * FIRE_COOLDOWN as f64).abs() < 1e-9);
        }
    }

    #[test]
    fn wall_contact_is_instant_death() {
        let mut room = duel();
        room.combatant_mut("b").unwrap().position = Vector2::new(401.0, 0.0);
        room.update();
        assert_eq!(room.combatant("b").unwrap().health(), 0.0);
        assert_eq!(room.state(), RoomState::Ended);
        assert_eq!(room.winner(), Some("a"));
    }

    #[test]
    fn bullet_damages_target_once_and_never_its_owner() {
        let mut room = duel();
        // Park b right in front of a's muzzle
        room.combatant_mut("b").unwrap().position = Vector2::new(-160.0, 0.0);
        hold(&mut room, "a", FIRE);
        room.update();

        assert_eq!(room.combatant("b").unwrap().health(), MAX_HEALTH - BULLET_DAMAGE);
        assert_eq!(room.combatant("a").unwrap().health(), MAX_HEALTH);
        assert!(room.projectiles().is_empty());
    }

    #[test]
    fn overlapping_targets_resolve_in_join_order() {
        let mut room = duel();
        room.add_single_opponent();
        assert_eq!(room.seat_count(), 3);

        // Both non-owners within reach of a's first bullet; the bot faces
        // away so it holds fire
        room.combatant_mut("b").unwrap().position = Vector2::new(-160.0, 0.0);
        let bot = room.combatant_mut("bot_1").unwrap();
        bot.position = Vector2::new(-160.0, 5.0);
        bot.angle = PI / 2.0;
        hold(&mut room, "a", FIRE);
        room.update();

        assert_eq!(room.combatant("b").unwrap().health(), MAX_HEALTH - BULLET_DAMAGE);
        assert_eq!(room.combatant("bot_1").unwrap().health(), MAX_HEALTH);
        assert_eq!(room.combatant("a").unwrap().health(), MAX_HEALTH);
        assert!(room.projectiles().is_empty());
    }

    #[test]
    fn simultaneous_deaths_are_a_draw() {
        let mut room = duel();
        room.combatant_mut("a").unwrap().position = Vector2::new(-395.0, 0.0);
        room.combatant_mut("b").unwrap().position = Vector2::new(395.0, 0.0);
        room.update();
        assert_eq!(room.state(), RoomState::Ended);
        assert_eq!(room.winner(), None);
    }

    #[test]
    fn leaving_ends_match_with_survivor_as_winner() {
        let mut room = duel();
        room.remove_player("a");
        assert_eq!(room.state(), RoomState::Ended);
        assert_eq!(room.winner(), Some("b"));

        room.remove_player("b");
        assert_eq!(room.state(), RoomState::Ended);
        assert_eq!(room.winner(), Some("b"));
    }

    #[test]
    fn ended_room_keeps_ticking_but_never_restarts() {
        let mut room = duel();
        room.remove_player("b");
        assert_eq!(room.state(), RoomState::Ended);

        room.set_input(
            "a",
            ControlInput {
                thrust_forward: true,
                ..ControlInput::IDLE
            },
        );
        room.update();
        assert!(room.combatant("a").unwrap().position.x > -200.0);

        assert!(room.add_player("c", "Carol"));
        room.add_single_opponent();
        room.add_opponent_pair();
        room.update();
        assert_eq!(room.state(), RoomState::Ended);
    }

    #[test]
    fn single_opponent_forces_play() {
        let mut room = Room::with_seed("room", 3);
        room.add_player("a", "Alice");
        room.add_single_opponent();
        assert_eq!(room.state(), RoomState::Playing);
        assert!(room.has_opponents());

        let bot = &room.combatants()[1];
        assert!(bot.is_scripted());
        assert_eq!(bot.name, "Bot");
        assert_eq!((bot.position, bot.angle), (Vector2::new(200.0, 0.0), PI));
    }

    #[test]
    fn opponent_pair_fights_itself() {
        let mut room = Room::with_seed("demo", 5);
        room.add_opponent_pair();
        assert_eq!(room.state(), RoomState::Playing);
        let names: Vec<_> = room.combatants().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Aggressor", "Sniper"]);

        for _ in 0..60 {
            room.update();
        }
        // Both face each other at 400 apart; the aggressor closes in
        let aggressor = &room.combatants()[0];
        assert!(aggressor.position.x > -200.0);
    }

    #[test]
    fn serialize_lists_active_bullets() {
        let mut room = duel();
        hold(&mut room, "a", FIRE);
        room.update();

        let snapshot = room.serialize();
        assert_eq!(snapshot.state, RoomState::Playing);
        assert_eq!(snapshot.arena_radius, ARENA_RADIUS);
        assert_eq!(snapshot.rockets.len(), 2);
        assert_eq!(snapshot.bullets.len(), 1);
        assert_eq!(snapshot.rockets[0].id, "a");
    }
}
