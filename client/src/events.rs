use std::vec::IntoIter;

use pitlane_shared::{
    GameModeKind, GoodbyeReason, Millis, RaceState, VoteKind, VoteOption, VoteResult,
};

use crate::PitlaneClientError;

/// Everything that happened during one [`crate::Client::tick`].
pub struct ClientEvents {
    connections: Vec<String>,
    connection_failures: Vec<PitlaneClientError>,
    disconnections: Vec<Option<GoodbyeReason>>,
    game_modes: Vec<GameModeKind>,
    joined_players: Vec<String>,
    left_players: Vec<String>,
    race_starts: Vec<(u32, Millis)>,
    race_states: Vec<(RaceState, RaceState)>,
    laps: Vec<(String, u32, Option<Millis>)>,
    vote_starts: Vec<(VoteKind, String)>,
    vote_ticks: Vec<(VoteOption, String)>,
    vote_ends: Vec<VoteResult>,
    errors: Vec<PitlaneClientError>,
    empty: bool,
}

impl ClientEvents {
    pub(crate) fn new() -> Self {
        Self {
            connections: Vec::new(),
            connection_failures: Vec::new(),
            disconnections: Vec::new(),
            game_modes: Vec::new(),
            joined_players: Vec::new(),
            left_players: Vec::new(),
            race_starts: Vec::new(),
            race_states: Vec::new(),
            laps: Vec::new(),
            vote_starts: Vec::new(),
            vote_ticks: Vec::new(),
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

    pub(crate) fn push_connection(&mut self, level_id: &str) {
        self.connections.push(level_id.to_string());
        self.empty = false;
    }

    pub(crate) fn push_connection_failure(&mut self, error: PitlaneClientError) {
        self.connection_failures.push(error);
        self.empty = false;
    }

    pub(crate) fn push_disconnection(&mut self, reason: Option<GoodbyeReason>) {
        self.disconnections.push(reason);
        self.empty = false;
    }

    pub(crate) fn push_game_mode(&mut self, mode: GameModeKind) {
        self.game_modes.push(mode);
        self.empty = false;
    }

    pub(crate) fn push_player_joined(&mut self, name: &str) {
        self.joined_players.push(name.to_string());
        self.empty = false;
    }

    pub(crate) fn push_player_left(&mut self, name: &str) {
        self.left_players.push(name.to_string());
        self.empty = false;
    }

    pub(crate) fn push_race_start(&mut self, lap_count: u32, start_ms: Millis) {
        self.race_starts.push((lap_count, start_ms));
        self.empty = false;
    }

    pub(crate) fn push_race_state(&mut self, old: RaceState, new: RaceState) {
        self.race_states.push((old, new));
        self.empty = false;
    }

    pub(crate) fn push_lap(&mut self, name: &str, lap: u32, lap_time: Option<Millis>) {
        self.laps.push((name.to_string(), lap, lap_time));
        self.empty = false;
    }

    pub(crate) fn push_vote_start(&mut self, kind: VoteKind, subject: &str) {
        self.vote_starts.push((kind, subject.to_string()));
        self.empty = false;
    }

    pub(crate) fn push_vote_tick(&mut self, option: VoteOption, voter: &str) {
        self.vote_ticks.push((option, voter.to_string()));
        self.empty = false;
    }

    pub(crate) fn push_vote_end(&mut self, result: VoteResult) {
        self.vote_ends.push(result);
        self.empty = false;
    }

    pub(crate) fn push_error(&mut self, error: PitlaneClientError) {
        self.errors.push(error);
        self.empty = false;
    }
}

// Event Trait
pub trait Event {
    type Iter;

    fn iter(events: &mut ClientEvents) -> Self::Iter;

    fn has(events: &ClientEvents) -> bool;
}

macro_rules! impl_event {
    ($event:ident, $field:ident, $item:ty) => {
        pub struct $event;
        impl Event for $event {
            type Iter = IntoIter<$item>;

            fn iter(events: &mut ClientEvents) -> Self::Iter {
                let list = std::mem::take(&mut events.$field);
                IntoIterator::into_iter(list)
            }

            fn has(events: &ClientEvents) -> bool {
                !events.$field.is_empty()
            }
        }
    };
}

// Joined a session; carries the level id the server is running
impl_event!(ConnectEvent, connections, String);
impl_event!(ConnectionFailedEvent, connection_failures, PitlaneClientError);
// `None` when the connection dropped without a goodbye
impl_event!(DisconnectEvent, disconnections, Option<GoodbyeReason>);
impl_event!(GameModeEvent, game_modes, GameModeKind);
impl_event!(PlayerJoinedEvent, joined_players, String);
impl_event!(PlayerLeftEvent, left_players, String);
// (lap count, local start time)
impl_event!(RaceStartEvent, race_starts, (u32, Millis));
impl_event!(RaceStateEvent, race_states, (RaceState, RaceState));
// (player, finished lap, its duration)
impl_event!(LapEvent, laps, (String, u32, Option<Millis>));
impl_event!(VoteStartEvent, vote_starts, (VoteKind, String));
impl_event!(VoteTickEvent, vote_ticks, (VoteOption, String));
impl_event!(VoteEndEvent, vote_ends, VoteResult);
impl_event!(ErrorEvent, errors, PitlaneClientError);
