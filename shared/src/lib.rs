//! # Pitlane Shared
//! Common functionality shared between pitlane-server & pitlane-client crates:
//! the deterministic car simulation, its wire snapshot, lap tracking, votes,
//! the race lifecycle and the protocol messages.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

pub use pitlane_serde::{
    BitReader, BitWrite, BitWriter, ConstBitLength, Serde, SerdeErr, UnsignedInteger,
    UnsignedVariableInteger,
};

mod arena;
mod car;
mod config;
mod constants;
mod framing;
mod level;
pub mod math;
mod message;
mod progress;
mod race;
mod time;
mod types;
mod vote;

pub use arena::{ArenaError, CarArena, CarKey};
pub use car::{physics, state::CarState, Car, Controls};
pub use config::{PhysicsConfig, ProtocolVersion, SimulationConfig};
pub use constants::{
    DEFAULT_HEARTBEAT_TICKS, DEFAULT_POSITION_TOLERANCE, DEFAULT_TICK_MS, MAX_PLAYER_NAME_LEN,
    PROTOCOL_MAJOR, PROTOCOL_MINOR,
};
pub use framing::{
    encode_frame, FrameBuffer, FrameError, FrameQueue, MAX_FRAME_LEN, MAX_QUEUED_BYTES,
};
pub use level::{FlatSurface, Level, StartSlot, Surface};
pub use math::Vec2;
pub use message::{GameModeKind, GoodbyeReason, Message, MessageError};
pub use progress::{
    Checkpoint, ProgressTracker, ProgressUpdate, StartLine, Track, TrackError,
    DEFAULT_ROLLOVER_THRESHOLD,
};
pub use race::{RaceError, RaceSession, RaceState};
pub use time::{PeriodicTimer, TimeError, Timestamp};
pub use types::{Iteration, Millis};
pub use vote::{Vote, VoteError, VoteKind, VoteOption, VoteOutcome, VoteResult, VoteState};
