use pitlane_serde::{
    BitReader, BitWrite, BitWriter, Serde, SerdeErr, UnsignedInteger, UnsignedVariableInteger,
};
use thiserror::Error;

use crate::{CarState, ProtocolVersion, Vec2, VoteKind, VoteOption, VoteResult};

/// Why the server is closing a connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GoodbyeReason {
    Cheating,
    UnsupportedProtocol,
    NameInUse,
    /// Empty, over-long or containing control characters
    InvalidName,
    ServerShutdown,
    Kicked,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameModeKind {
    Race,
    TimeTrial,
}

/// One packet's worth of protocol. Every packet carries exactly one message.
#[derive(Clone, Debug, PartialEq)]
pub enum Message {
    /// First message of a connection, client to server.
    ClientInfo {
        protocol: ProtocolVersion,
        player_name: String,
    },
    GameMode {
        mode: GameModeKind,
    },
    PlayerJoined {
        name: String,
    },
    PlayerLeft {
        name: String,
    },
    /// Everything a newly joined client needs to catch up.
    GameState {
        level_id: String,
        players: Vec<(String, CarState)>,
    },
    CarState(CarState),
    RaceStart {
        position: Vec2,
        rotation: f32,
        lap_count: u32,
        /// Relative to receipt; peers do not share a clock.
        countdown_ms: u32,
    },
    /// A vote request from a client, or its rebroadcast once accepted.
    VoteStart {
        kind: VoteKind,
        subject: String,
        time_limit_sec: u16,
    },
    /// A ballot. `voter` is ignored when coming from a client and stamped by
    /// the server on rebroadcast.
    VoteTick {
        option: VoteOption,
        voter: String,
    },
    VoteEnd {
        result: VoteResult,
    },
    Goodbye {
        reason: GoodbyeReason,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageError {
    #[error("Malformed packet: {0}")]
    Serde(#[from] SerdeErr),

    /// Extra bytes after a complete message usually mean a peer speaking a
    /// different protocol revision
    #[error("Packet has {remaining} bytes left over after the message")]
    TrailingBytes { remaining: usize },

    #[error("Empty packet")]
    Empty,
}

type MessageTag = UnsignedInteger<4>;

impl Message {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Message::ClientInfo { .. } => "ClientInfo",
            Message::GameMode { .. } => "GameMode",
            Message::PlayerJoined { .. } => "PlayerJoined",
            Message::PlayerLeft { .. } => "PlayerLeft",
            Message::GameState { .. } => "GameState",
            Message::CarState(_) => "CarState",
            Message::RaceStart { .. } => "RaceStart",
            Message::VoteStart { .. } => "VoteStart",
            Message::VoteTick { .. } => "VoteTick",
            Message::VoteEnd { .. } => "VoteEnd",
            Message::Goodbye { .. } => "Goodbye",
        }
    }

    fn tag(&self) -> u8 {
        match self {
            Message::ClientInfo { .. } => 0,
            Message::GameMode { .. } => 1,
            Message::PlayerJoined { .. } => 2,
            Message::PlayerLeft { .. } => 3,
            Message::GameState { .. } => 4,
            Message::CarState(_) => 5,
            Message::RaceStart { .. } => 6,
            Message::VoteStart { .. } => 7,
            Message::VoteTick { .. } => 8,
            Message::VoteEnd { .. } => 9,
            Message::Goodbye { .. } => 10,
        }
    }

    pub fn encode(&self) -> Box<[u8]> {
        let mut writer = BitWriter::new();
        self.ser(&mut writer);
        writer.to_bytes()
    }

    pub fn decode(payload: &[u8]) -> Result<Self, MessageError> {
        if payload.is_empty() {
            return Err(MessageError::Empty);
        }
        let mut reader = BitReader::new(payload);
        let message = Self::de(&mut reader)?;
        let remaining = reader.bytes_remaining();
        if remaining > 0 {
            return Err(MessageError::TrailingBytes { remaining });
        }
        Ok(message)
    }
}

impl Serde for Message {
    fn ser(&self, writer: &mut dyn BitWrite) {
        // tags are all below 16
        MessageTag::try_new(self.tag())
            .unwrap_or_default()
            .ser(writer);

        match self {
            Message::ClientInfo {
                protocol,
                player_name,
            } => {
                protocol.major.ser(writer);
                protocol.minor.ser(writer);
                player_name.ser(writer);
            }
            Message::GameMode { mode } => mode.ser(writer),
            Message::PlayerJoined { name } | Message::PlayerLeft { name } => name.ser(writer),
            Message::GameState { level_id, players } => {
                level_id.ser(writer);
                players.ser(writer);
            }
            Message::CarState(state) => state.ser(writer),
            Message::RaceStart {
                position,
                rotation,
                lap_count,
                countdown_ms,
            } => {
                position.ser(writer);
                rotation.ser(writer);
                UnsignedVariableInteger::<4>::try_new(*lap_count)
                    .unwrap_or_default()
                    .ser(writer);
                UnsignedVariableInteger::<7>::try_new(*countdown_ms)
                    .unwrap_or_default()
                    .ser(writer);
            }
            Message::VoteStart {
                kind,
                subject,
                time_limit_sec,
            } => {
                kind.ser(writer);
                subject.ser(writer);
                time_limit_sec.ser(writer);
            }
            Message::VoteTick { option, voter } => {
                option.ser(writer);
                voter.ser(writer);
            }
            Message::VoteEnd { result } => result.ser(writer),
            Message::Goodbye { reason } => reason.ser(writer),
        }
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let tag: u8 = MessageTag::de(reader)?.to()?;
        let message = match tag {
            0 => Message::ClientInfo {
                protocol: ProtocolVersion {
                    major: u16::de(reader)?,
                    minor: u16::de(reader)?,
                },
                player_name: String::de(reader)?,
            },
            1 => Message::GameMode {
                mode: GameModeKind::de(reader)?,
            },
            2 => Message::PlayerJoined {
                name: String::de(reader)?,
            },
            3 => Message::PlayerLeft {
                name: String::de(reader)?,
            },
            4 => Message::GameState {
                level_id: String::de(reader)?,
                players: Vec::de(reader)?,
            },
            5 => Message::CarState(CarState::de(reader)?),
            6 => Message::RaceStart {
                position: Vec2::de(reader)?,
                rotation: f32::de(reader)?,
                lap_count: UnsignedVariableInteger::<4>::de(reader)?.to()?,
                countdown_ms: UnsignedVariableInteger::<7>::de(reader)?.to()?,
            },
            7 => Message::VoteStart {
                kind: VoteKind::de(reader)?,
                subject: String::de(reader)?,
                time_limit_sec: u16::de(reader)?,
            },
            8 => Message::VoteTick {
                option: VoteOption::de(reader)?,
                voter: String::de(reader)?,
            },
            9 => Message::VoteEnd {
                result: VoteResult::de(reader)?,
            },
            10 => Message::Goodbye {
                reason: GoodbyeReason::de(reader)?,
            },
            tag => {
                return Err(SerdeErr::InvalidTag {
                    type_name: "Message",
                    tag: tag as u64,
                })
            }
        };
        Ok(message)
    }
}

// Small enums go over the wire as fixed-width tags.
macro_rules! impl_serde_for_tag_enum {
    ($impl_type:ident, $bits:expr, [$($variant:ident),+ $(,)?]) => {
        impl Serde for $impl_type {
            fn ser(&self, writer: &mut dyn BitWrite) {
                let variants = [$($impl_type::$variant),+];
                let index = variants
                    .iter()
                    .position(|variant| variant == self)
                    .unwrap_or(0);
                UnsignedInteger::<$bits>::try_new(index as u8)
                    .unwrap_or_default()
                    .ser(writer);
            }

            fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
                let variants = [$($impl_type::$variant),+];
                let tag: usize = UnsignedInteger::<$bits>::de(reader)?.to()?;
                variants.get(tag).copied().ok_or(SerdeErr::InvalidTag {
                    type_name: stringify!($impl_type),
                    tag: tag as u64,
                })
            }
        }
    };
}

impl_serde_for_tag_enum!(
    GoodbyeReason,
    3,
    [
        Cheating,
        UnsupportedProtocol,
        NameInUse,
        InvalidName,
        ServerShutdown,
        Kicked
    ]
);
impl_serde_for_tag_enum!(GameModeKind, 1, [Race, TimeTrial]);
impl_serde_for_tag_enum!(VoteKind, 2, [RestartRace, KickPlayer, ChangeLevel]);
impl_serde_for_tag_enum!(VoteOption, 1, [Yes, No]);
impl_serde_for_tag_enum!(VoteResult, 1, [Passed, Failed]);
