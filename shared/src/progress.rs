use thiserror::Error;

use crate::{Millis, Vec2};

/// Default gap in progress fraction beyond which a checkpoint counts as
/// "the other side of the lap".
pub const DEFAULT_ROLLOVER_THRESHOLD: f32 = 0.5;

/// A waypoint of the closed track.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Checkpoint {
    pub index: usize,
    pub position: Vec2,
    /// Fraction of the lap covered at this checkpoint, in [0, 1].
    pub progress: f32,
}

/// The start/finish line, a segment from `a` to `b`. Driving direction is
/// towards the left of `a -> b`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StartLine {
    pub a: Vec2,
    pub b: Vec2,
}

impl StartLine {
    /// Half-plane test: true once `point` is on or beyond the line.
    pub fn is_past(&self, point: Vec2) -> bool {
        (self.b - self.a).perp_dot(point - self.a) >= 0.0
    }
}

/// Errors that can occur when building a [`Track`]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrackError {
    /// A lap needs at least a start checkpoint and two others
    #[error("A track needs at least 3 checkpoints, got {count}")]
    TooFewCheckpoints { count: usize },

    /// Checkpoints must be numbered 0, 1, 2, ... in order
    #[error("Checkpoint at position {expected} has index {found}")]
    NonConsecutiveIndex { expected: usize, found: usize },

    /// Progress fractions live in [0, 1]
    #[error("Checkpoint {index} has progress {progress}, outside [0, 1]")]
    ProgressOutOfRange { index: usize, progress: f32 },
}

/// Checkpoint layout of one level.
#[derive(Clone, Debug, PartialEq)]
pub struct Track {
    checkpoints: Vec<Checkpoint>,
    start_line: StartLine,
    rollover_threshold: f32,
}

impl Track {
    pub fn new(checkpoints: Vec<Checkpoint>, start_line: StartLine) -> Result<Self, TrackError> {
        if checkpoints.len() < 3 {
            return Err(TrackError::TooFewCheckpoints {
                count: checkpoints.len(),
            });
        }
        for (expected, checkpoint) in checkpoints.iter().enumerate() {
            if checkpoint.index != expected {
                return Err(TrackError::NonConsecutiveIndex {
                    expected,
                    found: checkpoint.index,
                });
            }
            if !(0.0..=1.0).contains(&checkpoint.progress) {
                return Err(TrackError::ProgressOutOfRange {
                    index: checkpoint.index,
                    progress: checkpoint.progress,
                });
            }
        }
        Ok(Self {
            checkpoints,
            start_line,
            rollover_threshold: DEFAULT_ROLLOVER_THRESHOLD,
        })
    }

    pub fn with_rollover_threshold(mut self, threshold: f32) -> Self {
        self.rollover_threshold = threshold;
        self
    }

    pub fn len(&self) -> usize {
        self.checkpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checkpoints.is_empty()
    }

    pub fn checkpoint(&self, index: usize) -> Option<&Checkpoint> {
        self.checkpoints.get(index)
    }

    pub fn start_line(&self) -> &StartLine {
        &self.start_line
    }

    pub fn successor(&self, index: usize) -> usize {
        (index + 1) % self.checkpoints.len()
    }

    pub fn predecessor(&self, index: usize) -> usize {
        (index + self.checkpoints.len() - 1) % self.checkpoints.len()
    }

    /// Distance along the track between two checkpoints, as a lap fraction.
    /// Deliberately not cyclic: the last checkpoint and the first one are
    /// almost a whole lap apart.
    pub fn track_distance(&self, from: usize, to: usize) -> f32 {
        (self.checkpoints[to].progress - self.checkpoints[from].progress).abs()
    }
}

/// What a call to [`ProgressTracker::update`] changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProgressUpdate {
    Unchanged,
    /// Advanced to this checkpoint index.
    Checkpoint(usize),
    /// Crossed the start line having finished this lap.
    LapCompleted(u32),
}

/// Checkpoint & lap accounting for one car.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProgressTracker {
    current: usize,
    lap: u32,
    race_start: Option<Millis>,
    /// Completion time of every finished lap, oldest first
    ledger: Vec<Millis>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Puts the car on lap 1 at the start checkpoint and forgets old laps.
    pub fn reset(&mut self, race_start: Millis) {
        self.current = 0;
        self.lap = 1;
        self.race_start = Some(race_start);
        self.ledger.clear();
    }

    pub fn current_checkpoint(&self) -> usize {
        self.current
    }

    /// Lap being driven; one past the last lap once the car has finished.
    pub fn lap(&self) -> u32 {
        self.lap
    }

    pub fn completed_laps(&self) -> usize {
        self.ledger.len()
    }

    pub fn ledger(&self) -> &[Millis] {
        &self.ledger
    }

    pub fn update(&mut self, track: &Track, position: Vec2, now: Millis) -> ProgressUpdate {
        if track.is_empty() || self.race_start.is_none() {
            return ProgressUpdate::Unchanged;
        }
        let current = self.current.min(track.len() - 1);
        let previous = track.predecessor(current);
        let next = track.successor(current);

        let mut pick = current;
        let mut best = distance_squared(track, current, position);
        for candidate in [next, previous] {
            let distance = distance_squared(track, candidate, position);
            if distance < best {
                best = distance;
                pick = candidate;
            }
        }

        if pick == current {
            return ProgressUpdate::Unchanged;
        }

        if pick == next && next != 0 {
            self.current = next;
            return ProgressUpdate::Checkpoint(next);
        }

        // a far jump backwards in index can only be the end of a lap, and
        // only counts once the car is actually across the line
        let far = track.track_distance(current, pick) > track.rollover_threshold;
        if far && pick < current && pick == 0 && track.start_line().is_past(position) {
            self.current = 0;
            self.ledger.push(now);
            let finished = self.lap;
            self.lap += 1;
            return ProgressUpdate::LapCompleted(finished);
        }

        ProgressUpdate::Unchanged
    }

    /// Duration of `lap` (1-based) in ms. For the lap in progress this is the
    /// time spent on it so far.
    pub fn lap_time(&self, lap: u32, now: Millis) -> Option<Millis> {
        let lap = lap as usize;
        if lap == 0 || lap > self.ledger.len() + 1 {
            return None;
        }
        let started = if lap == 1 {
            self.race_start?
        } else {
            self.ledger[lap - 2]
        };
        let ended = self.ledger.get(lap - 1).copied().unwrap_or(now);
        Some(ended.saturating_sub(started))
    }

    /// Time since the start, or the full race time once `laps` are done.
    pub fn total_time(&self, laps: u32, now: Millis) -> Option<Millis> {
        let started = self.race_start?;
        let ended = match laps as usize {
            0 => now,
            laps if self.ledger.len() >= laps => self.ledger[laps - 1],
            _ => now,
        };
        Some(ended.saturating_sub(started))
    }

    pub fn best_lap(&self) -> Option<Millis> {
        (1..=self.ledger.len() as u32)
            .filter_map(|lap| self.lap_time(lap, 0))
            .min()
    }
}

fn distance_squared(track: &Track, index: usize, position: Vec2) -> f32 {
    track.checkpoints[index].position.distance_squared(position)
}
