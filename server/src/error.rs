use std::{io::ErrorKind, net::SocketAddr};

use thiserror::Error;

use pitlane_shared::{MessageError, VoteError};

use crate::UserKey;

/// Errors surfaced by the server, either returned directly or queued as
/// `ErrorEvent`s
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PitlaneServerError {
    /// Lookup of a user that has left or never joined
    #[error("No user with key {key:?}")]
    UnknownUser { key: UserKey },

    /// The socket could not start accepting clients
    #[error("Failed to listen: {reason}")]
    ListenFailed { kind: ErrorKind, reason: String },

    /// An operation that needs the socket was called before `listen`
    #[error("Server is not listening")]
    NotListening,

    /// The transport refused a packet
    #[error("Failed to send packet to {address}")]
    SendFailed { address: SocketAddr },

    /// The transport failed while polling for packets
    #[error("Failed to receive packets from the socket")]
    RecvFailed,

    /// A client sent bytes that do not decode as a message
    #[error("Malformed message from {address}: {source}")]
    Message {
        address: SocketAddr,
        #[source]
        source: MessageError,
    },

    /// A vote request or ballot was refused
    #[error("Vote rejected: {0}")]
    Vote(#[from] VoteError),

    /// A race cannot start without joined users
    #[error("Cannot start a race with no joined users")]
    NoRacers,
}
