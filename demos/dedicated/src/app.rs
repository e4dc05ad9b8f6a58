use std::{env, net::SocketAddr, str::FromStr};

use log::{info, warn};

use pitlane_server::{
    transport::tcp, CheatEvent, ConnectEvent, DisconnectEvent, ErrorEvent, PitlaneServerError,
    Server, ServerConfig, VoteEndEvent, VoteStartEvent,
};
use pitlane_shared::{Timestamp, VoteKind, VoteResult};

use crate::ring::Ring;

const DEFAULT_PORT: u16 = 14191;
const DEFAULT_LAPS: u32 = 3;
const COUNTDOWN_MS: u32 = 3_000;

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(value) => match value.parse() {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!("Ignoring unparsable {}={:?}", key, value);
                default
            }
        },
        Err(_) => default,
    }
}

pub struct App {
    server: Server,
    level: Ring,
    lap_count: u32,
}

impl App {
    /// Reads `PITLANE_ADDRESS`, `PITLANE_LEVEL` and `PITLANE_LAPS`.
    pub fn from_env() -> Result<Self, PitlaneServerError> {
        let address = env_or(
            "PITLANE_ADDRESS",
            SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
        );
        let config = ServerConfig {
            level_id: env_or("PITLANE_LEVEL", String::from("ring")),
            ..Default::default()
        };

        let mut server = Server::new(config);
        server.listen(Box::new(tcp::Socket::new(address)))?;
        info!("Listening on {}", address);

        Ok(App {
            server,
            level: Ring,
            lap_count: env_or("PITLANE_LAPS", DEFAULT_LAPS),
        })
    }

    pub fn tick_ms(&self) -> u64 {
        u64::from(self.server.config().simulation.tick_ms)
    }

    pub fn update(&mut self) {
        let now = match Timestamp::try_now() {
            Ok(now) => now,
            Err(error) => {
                warn!("Skipping tick: {}", error);
                return;
            }
        };

        let mut events = self.server.receive(now, &self.level);
        if events.is_empty() {
            return;
        }

        for (_, name) in events.read::<ConnectEvent>() {
            info!("{} joined, {} on the server", name, self.server.users_count());
        }
        for (_, name, reason) in events.read::<DisconnectEvent>() {
            match reason {
                Some(reason) => info!("{} removed: {:?}", name, reason),
                None => info!("{} left", name),
            }
        }
        for (_, name, report) in events.read::<CheatEvent>() {
            warn!(
                "{} failed replay at iteration {} (off by {:?})",
                name,
                report.claimed_iteration,
                report.deviation()
            );
        }
        for (_, kind, subject) in events.read::<VoteStartEvent>() {
            info!("Vote {:?} {:?} opened", kind, subject);
        }
        for (kind, subject, result) in events.read::<VoteEndEvent>() {
            info!("Vote {:?} {:?}: {:?}", kind, subject, result);
            if kind == VoteKind::RestartRace && result == VoteResult::Passed {
                self.start_race();
            }
        }
        for error in events.read::<ErrorEvent>() {
            warn!("Server Error: {}", error);
        }
    }

    fn start_race(&mut self) {
        match self
            .server
            .start_race(self.lap_count, COUNTDOWN_MS, &self.level)
        {
            Ok(()) => info!("Race of {} laps started", self.lap_count),
            Err(error) => warn!("Cannot start race: {}", error),
        }
    }
}
