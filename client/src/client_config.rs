use std::{default::Default, time::Duration};

use pitlane_shared::{ProtocolVersion, SimulationConfig};

/// Contains Config properties which will be used by a Client
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Name announced in the handshake; also names the local car
    pub player_name: String,
    /// Reported to the server, which only accepts an exact match
    pub protocol: ProtocolVersion,
    /// How long the connect task waits for the transport before giving up
    pub connect_timeout: Duration,
    /// Must match the server's simulation settings, or replay checks will
    /// disconnect this client
    pub simulation: SimulationConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            player_name: String::from("player"),
            protocol: ProtocolVersion::CURRENT,
            connect_timeout: Duration::from_secs(5),
            simulation: SimulationConfig::default(),
        }
    }
}
