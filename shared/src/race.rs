use std::collections::BTreeSet;

use log::info;
use thiserror::Error;

use crate::Millis;

/// Lifecycle of one race. States only ever move forward; the sole way back
/// to `Standby` is a fresh session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RaceState {
    Standby,
    Pending,
    Running,
    /// The local player has finished, others may still be racing.
    FinishedSingle,
    FinishedAll,
}

impl RaceState {
    pub fn is_finished(&self) -> bool {
        matches!(self, RaceState::FinishedSingle | RaceState::FinishedAll)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RaceError {
    #[error("Race has already been started (currently {state:?})")]
    AlreadyStarted { state: RaceState },

    #[error("A race needs at least one lap")]
    NoLaps,
}

#[derive(Clone, Debug)]
pub struct RaceSession {
    state: RaceState,
    players: BTreeSet<String>,
    lap_count: u32,
    start_ms: Millis,
    finish_ms: Option<Millis>,
    transitions: Vec<(RaceState, RaceState)>,
}

impl Default for RaceSession {
    fn default() -> Self {
        Self::new()
    }
}

impl RaceSession {
    pub fn new() -> Self {
        Self {
            state: RaceState::Standby,
            players: BTreeSet::new(),
            lap_count: 0,
            start_ms: 0,
            finish_ms: None,
            transitions: Vec::new(),
        }
    }

    /// Throws away the current session, including undrained transitions.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Arms the race. `players` is snapshotted: only these are waited for
    /// before the race counts as finished for everyone.
    pub fn start_race<I, S>(
        &mut self,
        players: I,
        lap_count: u32,
        start_ms: Millis,
    ) -> Result<(), RaceError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if self.state != RaceState::Standby {
            return Err(RaceError::AlreadyStarted { state: self.state });
        }
        if lap_count == 0 {
            return Err(RaceError::NoLaps);
        }

        self.players = players.into_iter().map(Into::into).collect();
        self.lap_count = lap_count;
        self.start_ms = start_ms;
        self.transition(RaceState::Pending);
        Ok(())
    }

    /// Advances as far as the inputs allow. Several transitions may fire in
    /// one call; each is queued separately, in order.
    ///
    /// `laps` returns a player's current lap number, where a player on lap
    /// `lap_count + 1` has finished.
    pub fn update<F>(&mut self, now: Millis, local: &str, laps: F)
    where
        F: Fn(&str) -> u32,
    {
        loop {
            let next = match self.state {
                RaceState::Pending if now >= self.start_ms => RaceState::Running,
                RaceState::Running if laps(local) > self.lap_count => {
                    self.finish_ms = Some(now);
                    RaceState::FinishedSingle
                }
                RaceState::FinishedSingle
                    if self
                        .players
                        .iter()
                        .all(|player| laps(player) > self.lap_count) =>
                {
                    RaceState::FinishedAll
                }
                _ => break,
            };
            self.transition(next);
        }
    }

    /// Stops waiting for a player who left mid-race.
    pub fn remove_player(&mut self, name: &str) -> bool {
        self.players.remove(name)
    }

    /// Takes every `(old, new)` pair queued since the last drain.
    pub fn drain_transitions(&mut self) -> Vec<(RaceState, RaceState)> {
        std::mem::take(&mut self.transitions)
    }

    fn transition(&mut self, next: RaceState) {
        let old = self.state;
        self.state = next;
        info!("race {:?} -> {:?}", old, next);
        self.transitions.push((old, next));
    }

    pub fn state(&self) -> RaceState {
        self.state
    }

    pub fn players(&self) -> impl Iterator<Item = &str> {
        self.players.iter().map(String::as_str)
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.players.contains(name)
    }

    pub fn lap_count(&self) -> u32 {
        self.lap_count
    }

    pub fn start_ms(&self) -> Millis {
        self.start_ms
    }

    /// Time the local player crossed the line for the last time.
    pub fn finish_ms(&self) -> Option<Millis> {
        self.finish_ms
    }
}
