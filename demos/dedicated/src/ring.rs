use std::f32::consts::{FRAC_PI_2, PI};

use pitlane_shared::{Checkpoint, Level, StartLine, StartSlot, Surface, Vec2};

const RADIUS: f32 = 200.0;
const HALF_WIDTH: f32 = 15.0;
const CHECKPOINTS: usize = 8;
const GRASS_RESISTANCE: f32 = 2.0;

/// A circular track around the origin, driven counter-clockwise. The line
/// sits on the positive x axis.
pub struct Ring;

impl Surface for Ring {
    fn resistance(&self, point: Vec2) -> f32 {
        if (point.length() - RADIUS).abs() > HALF_WIDTH {
            GRASS_RESISTANCE
        } else {
            0.0
        }
    }
}

impl Level for Ring {
    fn start_slot(&self, n: usize) -> StartSlot {
        // alternate sides of the racing line, two cars per row
        let side = if n % 2 == 0 { -5.0 } else { 5.0 };
        let row = (n / 2) as f32;
        StartSlot {
            position: Vec2::new(RADIUS + side, -8.0 - 8.0 * row),
            rotation: FRAC_PI_2,
        }
    }

    fn start_line(&self) -> StartLine {
        StartLine {
            a: Vec2::new(RADIUS - HALF_WIDTH, 0.0),
            b: Vec2::new(RADIUS + HALF_WIDTH, 0.0),
        }
    }

    fn checkpoints(&self) -> Vec<Checkpoint> {
        (0..CHECKPOINTS)
            .map(|index| {
                let angle = 2.0 * PI * index as f32 / CHECKPOINTS as f32;
                Checkpoint {
                    index,
                    position: Vec2::from_angle(angle) * RADIUS,
                    progress: index as f32 / CHECKPOINTS as f32,
                }
            })
            .collect()
    }
}
