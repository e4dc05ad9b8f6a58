use pitlane_shared::{GoodbyeReason, ProtocolVersion, MAX_PLAYER_NAME_LEN};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandshakeResult {
    Accepted,
    Rejected(GoodbyeReason),
}

/// Decides whether a `ClientInfo` may join. `name_taken` answers for names
/// already held by joined users.
pub fn evaluate<F>(
    server_version: &ProtocolVersion,
    client_version: &ProtocolVersion,
    name: &str,
    name_taken: F,
) -> HandshakeResult
where
    F: Fn(&str) -> bool,
{
    if !server_version.is_compatible(client_version) {
        return HandshakeResult::Rejected(GoodbyeReason::UnsupportedProtocol);
    }
    if !is_valid_name(name) {
        return HandshakeResult::Rejected(GoodbyeReason::InvalidName);
    }
    if name_taken(name) {
        return HandshakeResult::Rejected(GoodbyeReason::NameInUse);
    }
    HandshakeResult::Accepted
}

fn is_valid_name(name: &str) -> bool {
    !name.trim().is_empty()
        && name.len() <= MAX_PLAYER_NAME_LEN
        && !name.chars().any(char::is_control)
}
