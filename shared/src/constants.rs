/// Wire protocol version. Peers must agree on both numbers or the server
/// says goodbye during the handshake.
pub const PROTOCOL_MAJOR: u16 = 1;
pub const PROTOCOL_MINOR: u16 = 2;

pub const DEFAULT_TICK_MS: u32 = 16;
pub const DEFAULT_HEARTBEAT_TICKS: u32 = 60;
pub const DEFAULT_POSITION_TOLERANCE: f32 = 0.5;

/// Longest player name accepted by the server, in bytes.
pub const MAX_PLAYER_NAME_LEN: usize = 24;
