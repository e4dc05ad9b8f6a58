pub mod physics;
pub mod state;

use crate::{Iteration, PhysicsConfig, Surface, Vec2};

/// Driver input for a single tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Controls {
    /// Steering in [-1, 1]; positive turns left (counter-clockwise).
    pub turn: f32,
    pub accelerate: bool,
    pub brake: bool,
}

impl Controls {
    pub const IDLE: Controls = Controls {
        turn: 0.0,
        accelerate: false,
        brake: false,
    };

    /// -1 braking, 1 accelerating, 0 for neither or both.
    pub fn accel_sign(&self) -> i8 {
        match (self.accelerate, self.brake) {
            (true, false) => 1,
            (false, true) => -1,
            _ => 0,
        }
    }

    /// Inverse of [`Controls::accel_sign`]; pressing both pedals is
    /// indistinguishable from pressing neither once on the wire.
    pub fn from_accel_sign(turn: f32, accel_sign: i8) -> Self {
        Self {
            turn,
            accelerate: accel_sign > 0,
            brake: accel_sign < 0,
        }
    }

    /// Clamps steering into range and folds "both pedals" into "neither",
    /// so the local car and its wire snapshot always agree.
    pub fn normalized(&self) -> Self {
        let turn = if self.turn.is_finite() {
            self.turn.clamp(-1.0, 1.0)
        } else {
            0.0
        };
        Self::from_accel_sign(turn, self.accel_sign())
    }
}

/// A simulated car. Everything but `locked` and `lap` is carried by
/// [`state::CarState`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Car {
    pub position: Vec2,
    /// Heading in radians, counter-clockwise from +x.
    pub rotation: f32,
    /// Signed scalar speed along the heading, in world units per second.
    pub speed: f32,
    /// Velocity actually integrated into the position; lags behind the
    /// heading while the car slides.
    pub movement: Vec2,
    pub controls: Controls,
    /// A locked car ignores input and stays in place (pre-race countdown).
    pub locked: bool,
    /// Physics ticks simulated so far; the logical clock used to correlate
    /// snapshots between peers.
    pub iteration: Iteration,
    pub lap: u32,
}

impl Car {
    pub fn new(position: Vec2, rotation: f32) -> Self {
        Self {
            position,
            rotation,
            ..Default::default()
        }
    }

    /// Teleports the car onto a grid slot and brings it to a standstill.
    pub fn place(&mut self, position: Vec2, rotation: f32) {
        self.position = position;
        self.rotation = rotation;
        self.speed = 0.0;
        self.movement = Vec2::ZERO;
        self.controls = Controls::IDLE;
    }

    /// Locking drops any held input, so a car released from the grid starts
    /// from idle controls on both peers.
    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
        if locked {
            self.controls = Controls::IDLE;
        }
    }

    /// Applies driver input; ignored while the car is locked.
    pub fn set_controls(&mut self, controls: Controls) {
        if self.locked {
            return;
        }
        self.controls = controls.normalized();
    }

    /// In-place form of [`physics::update`] with the held controls.
    pub fn tick(&mut self, surface: &dyn Surface, dt_ms: u32, config: &PhysicsConfig) {
        physics::step(self, surface, dt_ms, config);
    }
}
