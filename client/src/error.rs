use thiserror::Error;

use pitlane_shared::{MessageError, RaceError, TrackError};

/// Errors surfaced by the client, either returned directly or queued as
/// `ErrorEvent`s
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PitlaneClientError {
    /// The operation needs a joined session
    #[error("Client is not connected")]
    NotConnected,

    /// `connect` was called while a connection is pending or established
    #[error("Client is already connecting or connected")]
    AlreadyConnecting,

    /// `connect` needs to be called from within a tokio runtime
    #[error("No tokio runtime available to run the connect task")]
    NoRuntime,

    /// The transport did not connect within the configured timeout
    #[error("Connecting timed out after {timeout_ms} ms")]
    ConnectTimeout { timeout_ms: u128 },

    /// The transport refused to connect
    #[error("Connecting failed: {reason}")]
    ConnectFailed { reason: String },

    /// The transport refused a packet
    #[error("Failed to send packet to the server")]
    SendFailed,

    /// Lookup of a player that is not in the session
    #[error("No player named {name:?}")]
    UnknownPlayer { name: String },

    /// The server sent bytes that do not decode as a message
    #[error("Malformed message from the server: {0}")]
    Message(#[from] MessageError),

    /// The level's checkpoints do not form a usable track
    #[error("Level has no usable track: {0}")]
    Track(#[from] TrackError),

    /// The server asked for a race this client cannot run
    #[error("Cannot start race: {0}")]
    Race(#[from] RaceError),
}
