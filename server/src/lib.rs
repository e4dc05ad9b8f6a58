//! # Pitlane Server
//! The authoritative side of a Pitlane race. Accepts clients over a
//! pluggable transport, replays every reported car against its own physics
//! to catch cheaters, relays car states between clients and runs
//! majority votes.

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
        CarState, FlatSurface, GameModeKind, GoodbyeReason, Level, Millis, ProtocolVersion,
        SimulationConfig, StartSlot, Surface, Timestamp, VoteKind, VoteOption, VoteResult,
    };
}

mod authority;
mod error;
mod events;
mod handshake;
mod presence;
mod server;
mod server_config;
mod user;

pub use authority::{validate, CheatReport, ReplayLimits, Verdict};
pub use error::PitlaneServerError;
pub use events::{
    CarStateEvent, CheatEvent, ConnectEvent, DisconnectEvent, ErrorEvent, Event, Events,
    VoteEndEvent, VoteStartEvent,
};
pub use handshake::{evaluate as evaluate_handshake, HandshakeResult};
pub use presence::{PresenceKeeper, PresenceService};
pub use server::Server;
pub use server_config::ServerConfig;
pub use user::{User, UserKey};
