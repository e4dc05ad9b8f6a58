use std::collections::HashMap;

use log::{debug, info, warn};
use tokio::runtime::Handle;

use pitlane_shared::{
    Car, CarArena, CarKey, CarState, Controls, GameModeKind, GoodbyeReason, Iteration, Level,
    Message, Millis, ProgressTracker, ProgressUpdate, RaceSession, RaceState, Track, Vec2, Vote,
    VoteKind, VoteOption, VoteResult,
};

use crate::{
    connect::{ConnectPoll, Io, PendingConnect},
    transport::Socket,
    ClientConfig, ClientEvents, PitlaneClientError,
};

/// Where the client is in its connection lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    /// The connect task is running
    Connecting,
    /// Connected, `ClientInfo` sent, waiting for the game state
    Handshaking,
    /// Joined; the car map is live
    Connected,
}

/// Drives the local car, decides when the server needs to hear about it and
/// mirrors every other car, the race and any running vote.
pub struct Client {
    config: ClientConfig,
    status: ConnectionStatus,
    pending_connect: Option<PendingConnect>,
    io: Option<Io>,
    game_mode: Option<GameModeKind>,
    level_id: Option<String>,
    cars: CarArena,
    players: HashMap<String, CarKey>,
    progress: HashMap<String, ProgressTracker>,
    track: Option<Track>,
    race: RaceSession,
    vote: Vote<String>,
    last_sent_controls: Option<Controls>,
    last_sent_iteration: Iteration,
    collision_pending: bool,
    release_at: Option<Millis>,
    goodbye: Option<GoodbyeReason>,
    incoming_events: ClientEvents,
}

impl Client {
    /// Create a new Client
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            status: ConnectionStatus::Disconnected,
            pending_connect: None,
            io: None,
            game_mode: None,
            level_id: None,
            cars: CarArena::new(),
            players: HashMap::new(),
            progress: HashMap::new(),
            track: None,
            race: RaceSession::new(),
            vote: Vote::new(),
            last_sent_controls: None,
            last_sent_iteration: 0,
            collision_pending: false,
            release_at: None,
            goodbye: None,
            incoming_events: ClientEvents::new(),
        }
    }

    /// Starts connecting in the background. Must be called from within a
    /// tokio runtime; the outcome shows up in a later `tick` as a
    /// `ConnectEvent` or `ConnectionFailedEvent`.
    pub fn connect(&mut self, socket: Box<dyn Socket>) -> Result<(), PitlaneClientError> {
        if self.status != ConnectionStatus::Disconnected {
            return Err(PitlaneClientError::AlreadyConnecting);
        }
        let runtime = Handle::try_current().map_err(|_| PitlaneClientError::NoRuntime)?;

        info!("Connecting as {:?}", self.config.player_name);
        self.goodbye = None;
        self.pending_connect = Some(PendingConnect::start(
            &runtime,
            socket,
            self.config.connect_timeout,
        ));
        self.status = ConnectionStatus::Connecting;
        Ok(())
    }

    /// Abandons a pending connect. Returns whether there was one.
    pub fn cancel_connect(&mut self) -> bool {
        let Some(pending_connect) = self.pending_connect.take() else {
            return false;
        };
        info!("Connect cancelled");
        pending_connect.cancel();
        self.status = ConnectionStatus::Disconnected;
        true
    }

    /// Leaves the session, or stops connecting.
    pub fn disconnect(&mut self) {
        self.cancel_connect();
        let Some((sender, _)) = self.io.as_ref() else {
            return;
        };
        sender.disconnect();
        self.teardown();
        self.incoming_events.push_disconnection(None);
    }

    /// Runs one simulation step: finishes a pending connect, drains the
    /// server's messages, applies `controls` to the local car, steps every
    /// car and sends the local car's state when the server needs it.
    pub fn tick(&mut self, now: Millis, controls: Controls, level: &dyn Level) -> ClientEvents {
        self.poll_connect();
        self.receive_messages(now, level);

        // the server's VoteEnd still follows and is what gets reported
        if let Some(result) = self.vote.update(now) {
            debug!("Vote mirror reached its deadline: {:?}", result);
        }

        if self.status == ConnectionStatus::Connected {
            self.simulate(now, controls, level);
            self.transmit();
        }

        std::mem::replace(&mut self.incoming_events, ClientEvents::new())
    }

    /// Marks the next sent state as following a collision, which exempts it
    /// from the server's replay check.
    pub fn report_collision(&mut self) {
        self.collision_pending = true;
    }

    pub fn request_vote(
        &mut self,
        kind: VoteKind,
        subject: &str,
        time_limit_sec: u16,
    ) -> Result<(), PitlaneClientError> {
        if self.status != ConnectionStatus::Connected {
            return Err(PitlaneClientError::NotConnected);
        }
        self.send(&Message::VoteStart {
            kind,
            subject: subject.to_string(),
            time_limit_sec,
        })
    }

    pub fn cast_vote(&mut self, option: VoteOption) -> Result<(), PitlaneClientError> {
        if self.status != ConnectionStatus::Connected {
            return Err(PitlaneClientError::NotConnected);
        }
        // the server stamps the real voter; the name is only informational
        self.send(&Message::VoteTick {
            option,
            voter: self.config.player_name.clone(),
        })
    }

    // Accessors

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn is_connected(&self) -> bool {
        self.status == ConnectionStatus::Connected
    }

    pub fn is_connecting(&self) -> bool {
        matches!(
            self.status,
            ConnectionStatus::Connecting | ConnectionStatus::Handshaking
        )
    }

    pub fn player_name(&self) -> &str {
        &self.config.player_name
    }

    pub fn local_car(&self) -> Option<&Car> {
        let key = self.players.get(&self.config.player_name)?;
        self.cars.get(key)
    }

    /// For the game's collision response. Call [`Client::report_collision`]
    /// after moving the car.
    pub fn local_car_mut(&mut self) -> Option<&mut Car> {
        let key = self.players.get(&self.config.player_name)?;
        self.cars.get_mut(key)
    }

    pub fn car(&self, name: &str) -> Result<&Car, PitlaneClientError> {
        self.players
            .get(name)
            .and_then(|key| self.cars.get(key))
            .ok_or_else(|| PitlaneClientError::UnknownPlayer {
                name: name.to_string(),
            })
    }

    pub fn cars(&self) -> impl Iterator<Item = (&str, &Car)> {
        self.players
            .iter()
            .filter_map(|(name, key)| self.cars.get(key).map(|car| (name.as_str(), car)))
    }

    pub fn player_names(&self) -> impl Iterator<Item = &str> {
        self.players.keys().map(String::as_str)
    }

    pub fn progress(&self, name: &str) -> Result<&ProgressTracker, PitlaneClientError> {
        self.progress
            .get(name)
            .ok_or_else(|| PitlaneClientError::UnknownPlayer {
                name: name.to_string(),
            })
    }

    pub fn race(&self) -> &RaceSession {
        &self.race
    }

    pub fn vote(&self) -> &Vote<String> {
        &self.vote
    }

    pub fn game_mode(&self) -> Option<GameModeKind> {
        self.game_mode
    }

    pub fn level_id(&self) -> Option<&str> {
        self.level_id.as_deref()
    }

    /// Why the server last said goodbye, if it did.
    pub fn goodbye_reason(&self) -> Option<GoodbyeReason> {
        self.goodbye
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // Connection

    fn poll_connect(&mut self) {
        let Some(pending_connect) = self.pending_connect.as_mut() else {
            return;
        };
        match pending_connect.poll() {
            ConnectPoll::Waiting => {}
            ConnectPoll::Finished(Ok(io)) => {
                self.pending_connect = None;
                self.io = Some(io);
                self.status = ConnectionStatus::Handshaking;
                info!("Transport connected, sending client info");
                let hello = Message::ClientInfo {
                    protocol: self.config.protocol,
                    player_name: self.config.player_name.clone(),
                };
                self.send_or_report(&hello);
            }
            ConnectPoll::Finished(Err(error)) => {
                self.pending_connect = None;
                self.status = ConnectionStatus::Disconnected;
                warn!("Connect failed: {}", error);
                self.incoming_events.push_connection_failure(error);
            }
        }
    }

    fn receive_messages(&mut self, now: Millis, level: &dyn Level) {
        let Some((_, receiver)) = self.io.as_mut() else {
            return;
        };

        let mut payloads = Vec::new();
        let mut lost = false;
        loop {
            match receiver.receive() {
                Ok(Some(payload)) => payloads.push(payload.to_vec()),
                Ok(None) => break,
                Err(_) => {
                    lost = true;
                    break;
                }
            }
        }

        for payload in payloads {
            match Message::decode(&payload) {
                Ok(message) => self.handle_message(message, now, level),
                Err(error) => {
                    warn!("Dropping malformed message: {}", error);
                    self.incoming_events.push_error(error.into());
                }
            }
            if self.io.is_none() {
                // said goodbye; the rest is moot
                return;
            }
        }

        if lost {
            info!("Connection to server lost");
            self.teardown();
            self.incoming_events.push_disconnection(None);
        }
    }

    fn handle_message(&mut self, message: Message, now: Millis, level: &dyn Level) {
        match message {
            Message::GameMode { mode } => {
                debug!("Game mode {:?}", mode);
                self.game_mode = Some(mode);
                self.incoming_events.push_game_mode(mode);
            }
            Message::GameState { level_id, players } => {
                self.handle_game_state(&level_id, players, level)
            }
            Message::PlayerJoined { name } => {
                if name == self.config.player_name {
                    return;
                }
                info!("Player {:?} joined", name);
                self.spawn_car(&name, Car::default());
                self.incoming_events.push_player_joined(&name);
            }
            Message::PlayerLeft { name } => self.remove_player(&name),
            Message::CarState(state) => self.handle_car_state(state),
            Message::RaceStart {
                position,
                rotation,
                lap_count,
                countdown_ms,
            } => self.handle_race_start(position, rotation, lap_count, countdown_ms, now, level),
            Message::VoteStart {
                kind,
                subject,
                time_limit_sec,
            } => self.handle_vote_start(kind, &subject, time_limit_sec, now),
            Message::VoteTick { option, voter } => {
                if let Err(error) = self.vote.add_vote(option, voter.clone(), now) {
                    debug!("Vote mirror ignored ballot from {:?}: {}", voter, error);
                }
                self.incoming_events.push_vote_tick(option, &voter);
            }
            Message::VoteEnd { result } => self.handle_vote_end(result),
            Message::Goodbye { reason } => {
                info!("Server said goodbye: {:?}", reason);
                self.goodbye = Some(reason);
                if let Some((sender, _)) = self.io.as_ref() {
                    sender.disconnect();
                }
                self.teardown();
                self.incoming_events.push_disconnection(Some(reason));
            }
            Message::ClientInfo { .. } => {
                warn!("Dropping unexpected ClientInfo from server");
            }
        }
    }

    fn handle_game_state(
        &mut self,
        level_id: &str,
        players: Vec<(String, CarState)>,
        level: &dyn Level,
    ) {
        if self.status != ConnectionStatus::Handshaking {
            warn!("Dropping game state outside of the handshake");
            return;
        }

        for (name, state) in players {
            let mut car = Car::default();
            state.apply(&mut car);
            self.spawn_car(&name, car);
        }

        if !self.players.contains_key(&self.config.player_name) {
            let slot = level.start_slot(self.players.len());
            let name = self.config.player_name.clone();
            self.spawn_car(&name, Car::new(slot.position, slot.rotation));
        }

        info!("Joined level {:?} with {} players", level_id, self.players.len());
        self.level_id = Some(level_id.to_string());
        self.status = ConnectionStatus::Connected;
        self.last_sent_controls = None;
        self.incoming_events.push_connection(level_id);
    }

    fn handle_car_state(&mut self, state: CarState) {
        if state.owner == self.config.player_name {
            debug!("Ignoring a state for the local car");
            return;
        }
        let key = match self.players.get(&state.owner) {
            Some(key) => *key,
            None => self.spawn_car(&state.owner, Car::default()),
        };
        if let Some(car) = self.cars.get_mut(&key) {
            // no smoothing, remote cars jump to wherever their owner says
            state.apply(car);
        }
    }

    fn handle_race_start(
        &mut self,
        position: Vec2,
        rotation: f32,
        lap_count: u32,
        countdown_ms: u32,
        now: Millis,
        level: &dyn Level,
    ) {
        let start_ms = now.saturating_add(Millis::from(countdown_ms));

        self.race.reset();
        let names: Vec<String> = self.players.keys().cloned().collect();
        if let Err(error) = self.race.start_race(names, lap_count, start_ms) {
            warn!("Cannot start race: {}", error);
            self.incoming_events.push_error(error.into());
            return;
        }

        for tracker in self.progress.values_mut() {
            tracker.reset(start_ms);
        }
        match level.track() {
            Ok(track) => self.track = Some(track),
            Err(error) => {
                warn!("Level has no usable track, laps will not count: {}", error);
                self.track = None;
                self.incoming_events.push_error(error.into());
            }
        }

        if let Some(car) = self.local_car_mut() {
            car.place(position, rotation);
            car.lap = 1;
            car.set_locked(true);
        }
        self.release_at = Some(start_ms);
        // a state sent before the placement may still be in flight, so the
        // jump to the grid must not be replayed against it
        self.last_sent_controls = None;
        self.collision_pending = true;

        info!("Race of {} laps starts in {} ms", lap_count, countdown_ms);
        self.incoming_events.push_race_start(lap_count, start_ms);
    }

    fn handle_vote_start(
        &mut self,
        kind: VoteKind,
        subject: &str,
        time_limit_sec: u16,
        now: Millis,
    ) {
        if self.vote.is_running() {
            warn!("Server started a vote while the mirror still runs one");
            self.vote.finish(VoteResult::Failed);
        }
        let voter_count = self.players.len() as u32;
        let time_limit = Millis::from(time_limit_sec) * 1000;
        if let Err(error) = self.vote.start(kind, subject, voter_count, time_limit, now) {
            warn!("Vote mirror cannot follow: {}", error);
        }
        self.incoming_events.push_vote_start(kind, subject);
    }

    fn handle_vote_end(&mut self, result: VoteResult) {
        if self.vote.result() != Some(result) {
            warn!(
                "Vote mirror expected {:?}, server decided {:?}",
                self.vote.result(),
                result
            );
        }
        self.vote.finish(result);
        self.incoming_events.push_vote_end(result);
    }

    // Simulation

    fn simulate(&mut self, now: Millis, controls: Controls, level: &dyn Level) {
        let local_key = self.players.get(&self.config.player_name).copied();

        if let Some(release_at) = self.release_at {
            if now >= release_at {
                self.release_at = None;
                if let Some(car) = local_key.and_then(|key| self.cars.get_mut(&key)) {
                    car.set_locked(false);
                }
            }
        }

        if let Some(car) = local_key.and_then(|key| self.cars.get_mut(&key)) {
            car.set_controls(controls);
        }

        // remote cars keep their last known input until the next snapshot
        let simulation = &self.config.simulation;
        for (_, car) in self.cars.iter_mut() {
            car.tick(&level, simulation.tick_ms, &simulation.physics);
        }

        if self.race.state() >= RaceState::Running {
            self.update_progress(now);
        }

        let progress = &self.progress;
        self.race.update(now, &self.config.player_name, |name| {
            progress.get(name).map_or(0, ProgressTracker::lap)
        });
        for (old, new) in self.race.drain_transitions() {
            self.incoming_events.push_race_state(old, new);
        }
    }

    fn update_progress(&mut self, now: Millis) {
        let Some(track) = self.track.as_ref() else {
            return;
        };
        for (name, key) in self.players.iter() {
            let (Some(car), Some(tracker)) = (self.cars.get_mut(key), self.progress.get_mut(name))
            else {
                continue;
            };
            if let ProgressUpdate::LapCompleted(lap) = tracker.update(track, car.position, now) {
                car.lap = tracker.lap();
                debug!("{:?} finished lap {}", name, lap);
                self.incoming_events
                    .push_lap(name, lap, tracker.lap_time(lap, now));
            }
        }
    }

    fn transmit(&mut self) {
        let Some(car) = self.local_car() else {
            return;
        };
        let controls = car.controls;
        let iteration = car.iteration;

        let input_changed = self.last_sent_controls != Some(controls);
        let heartbeat_due = iteration.saturating_sub(self.last_sent_iteration)
            >= self.config.simulation.heartbeat_ticks;
        if !input_changed && !self.collision_pending && !heartbeat_due {
            return;
        }

        let state = CarState::serialize(car, &self.config.player_name, self.collision_pending);
        self.last_sent_controls = Some(controls);
        self.last_sent_iteration = iteration;
        self.collision_pending = false;
        self.send_or_report(&Message::CarState(state));
    }

    // Plumbing

    fn spawn_car(&mut self, name: &str, car: Car) -> CarKey {
        if let Some(key) = self.players.get(name) {
            return *key;
        }
        let key = self.cars.insert(car);
        self.players.insert(name.to_string(), key);
        self.progress.insert(name.to_string(), ProgressTracker::new());
        key
    }

    fn remove_player(&mut self, name: &str) {
        let Some(key) = self.players.remove(name) else {
            return;
        };
        if let Err(error) = self.cars.remove(&key) {
            warn!("Car of {:?} was already gone: {}", name, error);
        }
        self.progress.remove(name);
        self.race.remove_player(name);

        info!("Player {:?} left", name);
        self.incoming_events.push_player_left(name);
    }

    fn send(&self, message: &Message) -> Result<(), PitlaneClientError> {
        let Some((sender, _)) = self.io.as_ref() else {
            return Err(PitlaneClientError::NotConnected);
        };
        sender
            .send(&message.encode())
            .map_err(|_| PitlaneClientError::SendFailed)
    }

    fn send_or_report(&mut self, message: &Message) {
        if let Err(error) = self.send(message) {
            warn!("Cannot send {}: {}", message.name(), error);
            self.incoming_events.push_error(error);
        }
    }

    fn teardown(&mut self) {
        self.io = None;
        self.status = ConnectionStatus::Disconnected;
        self.game_mode = None;
        self.level_id = None;
        self.cars.clear();
        self.players.clear();
        self.progress.clear();
        self.track = None;
        self.race.reset();
        self.vote = Vote::new();
        self.last_sent_controls = None;
        self.last_sent_iteration = 0;
        self.collision_pending = false;
        self.release_at = None;
    }
}
