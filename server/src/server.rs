use std::{collections::HashMap, net::SocketAddr};

use log::{debug, info, warn};

use pitlane_shared::{
    CarState, GoodbyeReason, Level, Message, Millis, ProtocolVersion, Surface, Vote, VoteKind,
    VoteOption, VoteOutcome, VoteResult,
};

use crate::{
    authority::{self, ReplayLimits, Verdict},
    handshake::{self, HandshakeResult},
    transport::{PacketReceiver, PacketSender, Socket},
    Events, PitlaneServerError, PresenceKeeper, ServerConfig, User, UserKey,
};

/// The authoritative side of a race. Owns one record per joined client,
/// replays their cars to catch cheaters, relays state between clients and
/// runs votes.
pub struct Server {
    config: ServerConfig,
    io: Option<(Box<dyn PacketSender>, Box<dyn PacketReceiver>)>,
    users: HashMap<UserKey, User>,
    user_connections: HashMap<SocketAddr, UserKey>,
    next_user_key: u64,
    next_join_order: u64,
    vote: Vote<UserKey>,
    presence: Option<PresenceKeeper>,
    incoming_events: Events,
}

impl Server {
    /// Create a new Server
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            io: None,
            users: HashMap::new(),
            user_connections: HashMap::new(),
            next_user_key: 0,
            next_join_order: 0,
            vote: Vote::new(),
            presence: None,
            incoming_events: Events::new(),
        }
    }

    /// Start accepting clients on the given socket. On failure the server
    /// stays unbound and `listen` may be retried with another socket.
    pub fn listen(&mut self, socket: Box<dyn Socket>) -> Result<(), PitlaneServerError> {
        let io = socket.listen().map_err(|error| PitlaneServerError::ListenFailed {
            kind: error.kind(),
            reason: error.to_string(),
        })?;
        self.io = Some(io);
        Ok(())
    }

    /// Returns whether or not the Server has initialized correctly and is
    /// listening for Clients
    pub fn is_listening(&self) -> bool {
        self.io.is_some()
    }

    /// Keeps the server listed with a presence service from now on
    pub fn set_presence(&mut self, keeper: PresenceKeeper) {
        self.presence = Some(keeper);
    }

    /// Drains the socket, validates every incoming car snapshot against
    /// `surface`, resolves expired votes and services the presence keeper.
    /// Returns everything that happened since the last call.
    pub fn receive(&mut self, now: Millis, surface: &dyn Surface) -> Events {
        self.maintain_socket(now, surface);

        if let Some(result) = self.vote.update(now) {
            info!("Vote timed out");
            self.conclude_vote(result);
        }

        if let Some(presence) = self.presence.as_mut() {
            presence.update(now);
        }

        std::mem::replace(&mut self.incoming_events, Events::new())
    }

    /// Puts every joined user on the grid, in join order, and tells each
    /// client where its car starts and how long the countdown runs.
    pub fn start_race(
        &mut self,
        lap_count: u32,
        countdown_ms: u32,
        level: &dyn Level,
    ) -> Result<(), PitlaneServerError> {
        if !self.is_listening() {
            return Err(PitlaneServerError::NotListening);
        }
        let grid = self.user_keys_in_join_order();
        if grid.is_empty() {
            return Err(PitlaneServerError::NoRacers);
        }

        info!(
            "Starting a {} lap race for {} players",
            lap_count,
            grid.len()
        );

        let mut notices = Vec::with_capacity(grid.len());
        for (n, user_key) in grid.iter().enumerate() {
            let Some(user) = self.users.get_mut(user_key) else {
                continue;
            };
            let slot = level.start_slot(n);
            user.shadow.place(slot.position, slot.rotation);
            // the server moved the car, so there is no replay baseline
            // until the client confirms the new position
            user.rebase();
            user.last_state = Some(CarState::serialize(&user.shadow, user.name(), false));
            notices.push((
                user.address(),
                Message::RaceStart {
                    position: slot.position,
                    rotation: slot.rotation,
                    lap_count,
                    countdown_ms,
                },
            ));
        }

        for (address, message) in notices {
            self.send_to_address(&address, &message);
        }
        Ok(())
    }

    /// Says goodbye to a user and drops its connection
    pub fn kick(&mut self, user_key: &UserKey, reason: GoodbyeReason) -> Result<(), PitlaneServerError> {
        if !self.users.contains_key(user_key) {
            return Err(PitlaneServerError::UnknownUser { key: *user_key });
        }
        self.remove_user(user_key, Some(reason));
        Ok(())
    }

    /// Says goodbye to everyone
    pub fn shutdown(&mut self) {
        for user_key in self.user_keys_in_join_order() {
            self.remove_user(&user_key, Some(GoodbyeReason::ServerShutdown));
        }
    }

    // Users

    pub fn user(&self, user_key: &UserKey) -> Result<&User, PitlaneServerError> {
        self.users
            .get(user_key)
            .ok_or(PitlaneServerError::UnknownUser { key: *user_key })
    }

    pub fn user_key_by_name(&self, name: &str) -> Option<UserKey> {
        self.users
            .iter()
            .find(|(_, user)| user.name() == name)
            .map(|(user_key, _)| *user_key)
    }

    pub fn users_count(&self) -> usize {
        self.users.len()
    }

    pub fn user_keys(&self) -> Vec<UserKey> {
        self.user_keys_in_join_order()
    }

    pub fn vote(&self) -> &Vote<UserKey> {
        &self.vote
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    // Private methods

    fn maintain_socket(&mut self, now: Millis, surface: &dyn Surface) {
        let Some((_, receiver)) = self.io.as_mut() else {
            return;
        };

        let mut packets = Vec::new();
        loop {
            match receiver.receive() {
                Ok(Some((address, payload))) => packets.push((address, payload.to_vec())),
                Ok(None) => break,
                Err(_) => {
                    self.incoming_events
                        .push_error(PitlaneServerError::RecvFailed);
                    break;
                }
            }
        }
        let disconnections = receiver.take_disconnections();

        for (address, payload) in packets {
            match Message::decode(&payload) {
                Ok(message) => self.handle_message(address, message, now, surface),
                Err(source) => {
                    warn!("Server Error: cannot read malformed packet from {}", address);
                    self.incoming_events
                        .push_error(PitlaneServerError::Message { address, source });
                }
            }
        }

        for address in disconnections {
            if let Some(user_key) = self.user_connections.get(&address).copied() {
                self.remove_user(&user_key, None);
            }
        }
    }

    fn handle_message(
        &mut self,
        address: SocketAddr,
        message: Message,
        now: Millis,
        surface: &dyn Surface,
    ) {
        let Some(user_key) = self.user_connections.get(&address).copied() else {
            match message {
                Message::ClientInfo {
                    protocol,
                    player_name,
                } => self.handle_client_info(address, &protocol, &player_name),
                other => debug!(
                    "Dropping {} from {}, handshake not done",
                    other.name(),
                    address
                ),
            }
            return;
        };

        match message {
            Message::CarState(state) => self.handle_car_state(&user_key, state, surface),
            Message::VoteStart {
                kind,
                subject,
                time_limit_sec,
            } => self.handle_vote_start(&user_key, kind, &subject, time_limit_sec, now),
            Message::VoteTick { option, .. } => self.handle_vote_tick(&user_key, option, now),
            other => warn!(
                "Dropping unexpected {} from {:?}",
                other.name(),
                user_key
            ),
        }
    }

    fn handle_client_info(&mut self, address: SocketAddr, protocol: &ProtocolVersion, name: &str) {
        let users = &self.users;
        let result = handshake::evaluate(&self.config.protocol, protocol, name, |name| {
            users.values().any(|user| user.name() == name)
        });

        if let HandshakeResult::Rejected(reason) = result {
            info!("Rejecting {} ({:?}): {:?}", address, name, reason);
            self.send_goodbye(&address, reason);
            return;
        }

        let user_key = UserKey::from_u64(self.next_user_key);
        self.next_user_key += 1;
        let join_order = self.next_join_order;
        self.next_join_order += 1;

        self.send_to_address(
            &address,
            &Message::GameMode {
                mode: self.config.game_mode,
            },
        );

        let players: Vec<(String, CarState)> = self
            .user_keys_in_join_order()
            .iter()
            .filter_map(|key| self.users.get(key))
            .filter_map(|user| {
                user.last_state()
                    .map(|state| (user.name().to_string(), state.clone()))
            })
            .collect();
        let game_state = Message::GameState {
            level_id: self.config.level_id.clone(),
            players,
        };
        self.send_to_address(&address, &game_state);

        // everyone already joined hears about the newcomer
        self.broadcast(
            &Message::PlayerJoined {
                name: name.to_string(),
            },
            None,
        );

        self.users
            .insert(user_key, User::new(address, name, join_order));
        self.user_connections.insert(address, user_key);

        info!("Player {:?} joined from {}", name, address);
        self.incoming_events.push_connection(&user_key, name);
    }

    fn handle_car_state(&mut self, user_key: &UserKey, mut state: CarState, surface: &dyn Surface) {
        let Some(name) = self.users.get(user_key).map(|user| user.name().to_string()) else {
            return;
        };

        // never trust the name a client puts on its own car
        state.owner = name.clone();
        self.broadcast(&Message::CarState(state.clone()), Some(user_key));

        let limits = ReplayLimits {
            position_tolerance: self.config.position_tolerance,
            max_replay_ticks: self.config.max_replay_ticks,
        };
        let Some(user) = self.users.get_mut(user_key) else {
            return;
        };
        let verdict = authority::validate(
            &mut user.shadow,
            user.last_iteration,
            &state,
            surface,
            &self.config.simulation,
            &limits,
        );

        match verdict {
            Verdict::Accepted => {
                user.last_iteration = Some(state.iteration);
                user.last_state = Some(state.clone());
                self.incoming_events.push_car_state(user_key, state);
            }
            Verdict::Stale => {
                debug!(
                    "Ignoring stale state {} from {:?}",
                    state.iteration, name
                );
            }
            Verdict::Diverged(report) => {
                warn!(
                    "Player {:?} diverged at iteration {} (off by {:?}), disconnecting",
                    name,
                    report.claimed_iteration,
                    report.deviation()
                );
                self.incoming_events.push_cheat(user_key, &name, report);
                self.remove_user(user_key, Some(GoodbyeReason::Cheating));
            }
        }
    }

    fn handle_vote_start(
        &mut self,
        user_key: &UserKey,
        kind: VoteKind,
        subject: &str,
        time_limit_sec: u16,
        now: Millis,
    ) {
        if kind == VoteKind::KickPlayer && self.user_key_by_name(subject).is_none() {
            warn!("Dropping kick vote against unknown player {:?}", subject);
            return;
        }

        let voter_count = self.users.len() as u32;
        let time_limit = Millis::from(time_limit_sec) * 1000;
        if let Err(error) = self.vote.start(kind, subject, voter_count, time_limit, now) {
            warn!("Vote request from {:?} refused: {}", user_key, error);
            self.incoming_events.push_error(error.into());
            return;
        }

        info!("Vote {:?} {:?} started by {:?}", kind, subject, user_key);
        self.broadcast(
            &Message::VoteStart {
                kind,
                subject: subject.to_string(),
                time_limit_sec,
            },
            None,
        );
        self.incoming_events.push_vote_start(user_key, kind, subject);
    }

    fn handle_vote_tick(&mut self, user_key: &UserKey, option: VoteOption, now: Millis) {
        let Some(name) = self.users.get(user_key).map(|user| user.name().to_string()) else {
            return;
        };

        match self.vote.add_vote(option, *user_key, now) {
            Ok(outcome) => {
                self.broadcast(&Message::VoteTick { option, voter: name }, None);
                if let VoteOutcome::Decided(result) = outcome {
                    self.conclude_vote(result);
                }
            }
            Err(error) => {
                warn!("Ballot from {:?} refused: {}", name, error);
                self.incoming_events.push_error(error.into());
            }
        }
    }

    fn conclude_vote(&mut self, result: VoteResult) {
        let Some(kind) = self.vote.kind() else {
            return;
        };
        let subject = self.vote.subject().to_string();
        info!("Vote {:?} {:?} ended: {:?}", kind, subject, result);

        self.broadcast(&Message::VoteEnd { result }, None);
        self.incoming_events.push_vote_end(kind, &subject, result);

        if result == VoteResult::Passed
            && kind == VoteKind::KickPlayer
            && self.config.enforce_kick_votes
        {
            if let Some(user_key) = self.user_key_by_name(&subject) {
                self.remove_user(&user_key, Some(GoodbyeReason::Kicked));
            }
        }
    }

    /// Drops a user. With a `reason`, the client is told why and the
    /// connection is closed from this side.
    fn remove_user(&mut self, user_key: &UserKey, reason: Option<GoodbyeReason>) {
        let Some(user) = self.users.remove(user_key) else {
            return;
        };
        self.user_connections.remove(&user.address());

        if let Some(reason) = reason {
            self.send_goodbye(&user.address(), reason);
        }

        info!("Player {:?} left ({:?})", user.name(), reason);
        self.broadcast(
            &Message::PlayerLeft {
                name: user.name().to_string(),
            },
            None,
        );
        self.incoming_events
            .push_disconnection(user_key, user.name(), reason);
    }

    fn send_goodbye(&mut self, address: &SocketAddr, reason: GoodbyeReason) {
        self.send_to_address(address, &Message::Goodbye { reason });
        if let Some((sender, _)) = self.io.as_ref() {
            sender.disconnect(address);
        }
    }

    fn send_to_address(&mut self, address: &SocketAddr, message: &Message) {
        let Some((sender, _)) = self.io.as_ref() else {
            return;
        };
        if sender.send(address, &message.encode()).is_err() {
            warn!("Server Error: Cannot send {} to {}", message.name(), address);
            self.incoming_events
                .push_error(PitlaneServerError::SendFailed { address: *address });
        }
    }

    /// Sends to every joined user, optionally skipping one.
    fn broadcast(&mut self, message: &Message, except: Option<&UserKey>) {
        let Some((sender, _)) = self.io.as_ref() else {
            return;
        };
        let payload = message.encode();
        for (user_key, user) in self.users.iter() {
            if Some(user_key) == except {
                continue;
            }
            if sender.send(&user.address(), &payload).is_err() {
                warn!(
                    "Server Error: Cannot send {} to {}",
                    message.name(),
                    user.address()
                );
                self.incoming_events.push_error(PitlaneServerError::SendFailed {
                    address: user.address(),
                });
            }
        }
    }

    fn user_keys_in_join_order(&self) -> Vec<UserKey> {
        let mut keys: Vec<(u64, UserKey)> = self
            .users
            .iter()
            .map(|(user_key, user)| (user.join_order(), *user_key))
            .collect();
        keys.sort();
        keys.into_iter().map(|(_, user_key)| user_key).collect()
    }
}
