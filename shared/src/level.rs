use crate::{Checkpoint, StartLine, Track, TrackError, Vec2};

/// Ground the physics step drives over.
pub trait Surface {
    /// Extra drag at `point`, as a fraction of speed lost per second.
    /// Tarmac is 0; grass, sand and the like are positive.
    fn resistance(&self, point: Vec2) -> f32;
}

/// A grid position a car is placed on before the start.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StartSlot {
    pub position: Vec2,
    pub rotation: f32,
}

/// Read-only geometry of a loaded level. Parsing level files is the
/// embedding game's job; the core only asks these questions.
pub trait Level: Surface {
    /// Grid slot for the `n`th car, counting from 0.
    fn start_slot(&self, n: usize) -> StartSlot;

    fn start_line(&self) -> StartLine;

    fn checkpoints(&self) -> Vec<Checkpoint>;

    fn track(&self) -> Result<Track, TrackError> {
        Track::new(self.checkpoints(), self.start_line())
    }
}

/// Uniform ground, mostly useful for servers that do not load level art and
/// for tests.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FlatSurface {
    resistance: f32,
}

impl FlatSurface {
    pub fn new(resistance: f32) -> Self {
        Self { resistance }
    }
}

impl Surface for FlatSurface {
    fn resistance(&self, _: Vec2) -> f32 {
        self.resistance
    }
}

impl<S: Surface + ?Sized> Surface for &S {
    fn resistance(&self, point: Vec2) -> f32 {
        (**self).resistance(point)
    }
}
