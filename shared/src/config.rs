use std::default::Default;

use crate::constants::{
    DEFAULT_HEARTBEAT_TICKS, DEFAULT_TICK_MS, PROTOCOL_MAJOR, PROTOCOL_MINOR,
};

/// Tuning for [`crate::physics::step`]. Both peers must use identical values,
/// otherwise server replay drifts away from the client.
#[derive(Clone, Debug, PartialEq)]
pub struct PhysicsConfig {
    /// Top forward speed, world units per second. Reverse is capped at half.
    pub max_speed: f32,
    /// Speed gained per second while accelerating.
    pub acceleration: f32,
    /// Speed lost per second while braking.
    pub braking: f32,
    /// Fraction of the current speed lost per second to drag.
    pub air_resistance: f32,
    /// Heading change per second at full lock and top speed, radians.
    pub turn_rate: f32,
    pub tenacity_low_speed: f32,
    pub tenacity_high_speed: f32,
    pub drift_speed_threshold: f32,
    pub drift_turn_threshold: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            max_speed: 24.0,
            acceleration: 12.0,
            braking: 24.0,
            air_resistance: 0.15,
            turn_rate: 2.6,
            tenacity_low_speed: 10.0,
            tenacity_high_speed: 2.5,
            drift_speed_threshold: 12.0,
            drift_turn_threshold: 0.75,
        }
    }
}

/// Contains Config properties shared by the simulation on every peer
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationConfig {
    /// Length of one physics tick, in milliseconds
    pub tick_ms: u32,
    /// A car snapshot is sent at least once every this many ticks, even
    /// when nothing changed
    pub heartbeat_ticks: u32,
    pub physics: PhysicsConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_ms: DEFAULT_TICK_MS,
            heartbeat_ticks: DEFAULT_HEARTBEAT_TICKS,
            physics: PhysicsConfig::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProtocolVersion {
    pub major: u16,
    pub minor: u16,
}

impl ProtocolVersion {
    pub const CURRENT: ProtocolVersion = ProtocolVersion {
        major: PROTOCOL_MAJOR,
        minor: PROTOCOL_MINOR,
    };

    pub fn is_compatible(&self, other: &ProtocolVersion) -> bool {
        self == other
    }
}

impl Default for ProtocolVersion {
    fn default() -> Self {
        Self::CURRENT
    }
}
