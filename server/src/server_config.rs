use std::default::Default;

use pitlane_shared::{
    GameModeKind, ProtocolVersion, SimulationConfig, DEFAULT_POSITION_TOLERANCE,
};

/// Contains Config properties which will be used by the Server
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Clients must report exactly this version in their `ClientInfo`
    pub protocol: ProtocolVersion,
    /// Announced to every client right after its handshake
    pub game_mode: GameModeKind,
    /// Sent in the game state snapshot so clients load the same level
    pub level_id: String,
    /// Largest per-axis gap, in world units, between a replayed shadow car
    /// and the position a client reports before the client is kicked
    pub position_tolerance: f32,
    /// A snapshot claiming more ticks than this since the last accepted one
    /// is treated as a divergence instead of being replayed
    pub max_replay_ticks: u32,
    /// How often to retry presence registration, in milliseconds
    pub presence_register_period: u64,
    /// How often to send presence keepalives once registered, in milliseconds
    pub presence_keepalive_period: u64,
    /// Kick the subject of a passed `KickPlayer` vote
    pub enforce_kick_votes: bool,
    /// Must match the clients' simulation settings for replay to agree
    pub simulation: SimulationConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            protocol: ProtocolVersion::CURRENT,
            game_mode: GameModeKind::Race,
            level_id: String::from("default"),
            position_tolerance: DEFAULT_POSITION_TOLERANCE,
            max_replay_ticks: 6_000,
            presence_register_period: 10_000,
            presence_keepalive_period: 60_000,
            enforce_kick_votes: true,
            simulation: SimulationConfig::default(),
        }
    }
}
