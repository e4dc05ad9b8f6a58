use std::vec::IntoIter;

use pitlane_shared::{CarState, GoodbyeReason, VoteKind, VoteResult};

use crate::{authority::CheatReport, PitlaneServerError, UserKey};

pub struct Events {
    connections: Vec<(UserKey, String)>,
    disconnections: Vec<(UserKey, String, Option<GoodbyeReason>)>,
    cheats: Vec<(UserKey, String, CheatReport)>,
    car_states: Vec<(UserKey, CarState)>,
    vote_starts: Vec<(UserKey, VoteKind, String)>,
    vote_ends: Vec<(VoteKind, String, VoteResult)>,
    errors: Vec<PitlaneServerError>,
    empty: bool,
}

impl Events {
    pub(crate) fn new() -> Self {
        Self {
            connections: Vec::new(),
            disconnections: Vec::new(),
            cheats: Vec::new(),
            car_states: Vec::new(),
            vote_starts: Vec::new(),
            vote_ends: Vec::new(),
            errors: Vec::new(),
            empty: true,
        }
    }

    // Public

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn read<V: Event>(&mut self) -> V::Iter {
        V::iter(self)
    }

    pub fn has<V: Event>(&self) -> bool {
        V::has(self)
    }

    // Crate-public

    pub(crate) fn push_connection(&mut self, user_key: &UserKey, name: &str) {
        self.connections.push((*user_key, name.to_string()));
        self.empty = false;
    }

    pub(crate) fn push_disconnection(
        &mut self,
        user_key: &UserKey,
        name: &str,
        reason: Option<GoodbyeReason>,
    ) {
        self.disconnections
            .push((*user_key, name.to_string(), reason));
        self.empty = false;
    }

    pub(crate) fn push_cheat(&mut self, user_key: &UserKey, name: &str, report: CheatReport) {
        self.cheats.push((*user_key, name.to_string(), report));
        self.empty = false;
    }

    pub(crate) fn push_car_state(&mut self, user_key: &UserKey, state: CarState) {
        self.car_states.push((*user_key, state));
        self.empty = false;
    }

    pub(crate) fn push_vote_start(&mut self, user_key: &UserKey, kind: VoteKind, subject: &str) {
        self.vote_starts
            .push((*user_key, kind, subject.to_string()));
        self.empty = false;
    }

    pub(crate) fn push_vote_end(&mut self, kind: VoteKind, subject: &str, result: VoteResult) {
        self.vote_ends.push((kind, subject.to_string(), result));
        self.empty = false;
    }

    pub(crate) fn push_error(&mut self, error: PitlaneServerError) {
        self.errors.push(error);
        self.empty = false;
    }
}

// Event Trait
pub trait Event {
    type Iter;

    fn iter(events: &mut Events) -> Self::Iter;

    fn has(events: &Events) -> bool;
}

// ConnectEvent
pub struct ConnectEvent;
impl Event for ConnectEvent {
    type Iter = IntoIter<(UserKey, String)>;

    fn iter(events: &mut Events) -> Self::Iter {
        let list = std::mem::take(&mut events.connections);
        IntoIterator::into_iter(list)
    }

    fn has(events: &Events) -> bool {
        !events.connections.is_empty()
    }
}

// DisconnectEvent
pub struct DisconnectEvent;
impl Event for DisconnectEvent {
    /// `None` when the client went away on its own
    type Iter = IntoIter<(UserKey, String, Option<GoodbyeReason>)>;

    fn iter(events: &mut Events) -> Self::Iter {
        let list = std::mem::take(&mut events.disconnections);
        IntoIterator::into_iter(list)
    }

    fn has(events: &Events) -> bool {
        !events.disconnections.is_empty()
    }
}

// CheatEvent
pub struct CheatEvent;
impl Event for CheatEvent {
    type Iter = IntoIter<(UserKey, String, CheatReport)>;

    fn iter(events: &mut Events) -> Self::Iter {
        let list = std::mem::take(&mut events.cheats);
        IntoIterator::into_iter(list)
    }

    fn has(events: &Events) -> bool {
        !events.cheats.is_empty()
    }
}

// CarStateEvent
pub struct CarStateEvent;
impl Event for CarStateEvent {
    type Iter = IntoIter<(UserKey, CarState)>;

    fn iter(events: &mut Events) -> Self::Iter {
        let list = std::mem::take(&mut events.car_states);
        IntoIterator::into_iter(list)
    }

    fn has(events: &Events) -> bool {
        !events.car_states.is_empty()
    }
}

// VoteStartEvent
pub struct VoteStartEvent;
impl Event for VoteStartEvent {
    type Iter = IntoIter<(UserKey, VoteKind, String)>;

    fn iter(events: &mut Events) -> Self::Iter {
        let list = std::mem::take(&mut events.vote_starts);
        IntoIterator::into_iter(list)
    }

    fn has(events: &Events) -> bool {
        !events.vote_starts.is_empty()
    }
}

// VoteEndEvent
pub struct VoteEndEvent;
impl Event for VoteEndEvent {
    type Iter = IntoIter<(VoteKind, String, VoteResult)>;

    fn iter(events: &mut Events) -> Self::Iter {
        let list = std::mem::take(&mut events.vote_ends);
        IntoIterator::into_iter(list)
    }

    fn has(events: &Events) -> bool {
        !events.vote_ends.is_empty()
    }
}

// Error Event
pub struct ErrorEvent;
impl Event for ErrorEvent {
    type Iter = IntoIter<PitlaneServerError>;

    fn iter(events: &mut Events) -> Self::Iter {
        let list = std::mem::take(&mut events.errors);
        IntoIterator::into_iter(list)
    }

    fn has(events: &Events) -> bool {
        !events.errors.is_empty()
    }
}
