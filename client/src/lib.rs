//! # Pitlane Client
//! The player's side of a Pitlane race. Connects in the background,
//! simulates the local car with the shared physics, sends its state when
//! the server needs it and teleports every remote car to the snapshots the
//! server relays.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

#[macro_use]
extern crate cfg_if;

pub mod transport;
pub mod shared {
    pub use pitlane_shared::{
        Car, CarState, Controls, FlatSurface, GameModeKind, GoodbyeReason, Level, Millis,
        ProgressTracker, ProtocolVersion, RaceSession, RaceState, SimulationConfig, StartSlot,
        Surface, Timestamp, Vote, VoteKind, VoteOption, VoteResult,
    };
}

mod client;
mod client_config;
mod connect;
mod error;
mod events;

pub use client::{Client, ConnectionStatus};
pub use client_config::ClientConfig;
pub use error::PitlaneClientError;
pub use events::{
    ClientEvents, ConnectEvent, ConnectionFailedEvent, DisconnectEvent, ErrorEvent, Event,
    GameModeEvent, LapEvent, PlayerJoinedEvent, PlayerLeftEvent, RaceStartEvent, RaceStateEvent,
    VoteEndEvent, VoteStartEvent, VoteTickEvent,
};
