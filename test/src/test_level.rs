use pitlane_shared::{Checkpoint, Level, StartLine, StartSlot, Surface, Vec2};

/// Side of the square loop, in world units.
pub const TRACK_SIZE: f32 = 100.0;

/// A square loop driven counter-clockwise on flat tarmac. The start/finish
/// line crosses the middle of the bottom edge at x = 50; the grid lines up
/// behind it.
#[derive(Clone, Debug, Default)]
pub struct TestLevel {
    resistance: f32,
}

impl TestLevel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Same layout on uniformly sticky ground.
    pub fn with_resistance(resistance: f32) -> Self {
        Self { resistance }
    }

    /// Checkpoint positions in driving order, starting at the line.
    pub fn lap_points() -> Vec<Vec2> {
        vec![
            Vec2::new(TRACK_SIZE, 0.0),
            Vec2::new(TRACK_SIZE, TRACK_SIZE),
            Vec2::new(0.0, TRACK_SIZE),
            Vec2::new(0.0, 0.0),
            // just across the line
            Vec2::new(TRACK_SIZE / 2.0 + 2.0, 0.0),
        ]
    }
}

impl Surface for TestLevel {
    fn resistance(&self, _: Vec2) -> f32 {
        self.resistance
    }
}

impl Level for TestLevel {
    fn start_slot(&self, n: usize) -> StartSlot {
        StartSlot {
            position: Vec2::new(TRACK_SIZE / 2.0 - 8.0 - 6.0 * n as f32, 0.0),
            rotation: 0.0,
        }
    }

    fn start_line(&self) -> StartLine {
        StartLine {
            a: Vec2::new(TRACK_SIZE / 2.0, 10.0),
            b: Vec2::new(TRACK_SIZE / 2.0, -10.0),
        }
    }

    fn checkpoints(&self) -> Vec<Checkpoint> {
        [
            (TRACK_SIZE / 2.0, 0.0, 0.0),
            (TRACK_SIZE, 0.0, 0.125),
            (TRACK_SIZE, TRACK_SIZE, 0.375),
            (0.0, TRACK_SIZE, 0.625),
            (0.0, 0.0, 0.875),
        ]
        .iter()
        .enumerate()
        .map(|(index, (x, y, progress))| Checkpoint {
            index,
            position: Vec2::new(*x, *y),
            progress: *progress,
        })
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use pitlane_shared::{ProgressTracker, ProgressUpdate};

    use super::*;

    #[test]
    fn lap_points_complete_a_lap() {
        let track = TestLevel::new().track().unwrap();
        let mut tracker = ProgressTracker::new();
        tracker.reset(0);

        let mut last = ProgressUpdate::Unchanged;
        for point in TestLevel::lap_points() {
            last = tracker.update(&track, point, 10);
        }
        assert_eq!(last, ProgressUpdate::LapCompleted(1));
        assert_eq!(tracker.lap(), 2);
    }

    #[test]
    fn grid_is_behind_the_line() {
        let level = TestLevel::new();
        let line = level.start_line();
        for n in 0..8 {
            assert!(!line.is_past(level.start_slot(n).position));
        }
    }
}
