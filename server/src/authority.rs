//! Snapshot validation by deterministic replay.
//!
//! Every client reports its own car. The server keeps a shadow copy, steps
//! it through the same physics up to the iteration the client claims, and
//! only accepts the claim if both land in the same place.

use pitlane_shared::{physics, Car, CarState, Iteration, SimulationConfig, Surface, Vec2};

/// Evidence attached to a cheating disconnect.
#[derive(Clone, Debug, PartialEq)]
pub struct CheatReport {
    /// Iteration the shadow was replayed from.
    pub replayed_from: Iteration,
    pub claimed_iteration: Iteration,
    /// Where the shadow ended up. `None` when the gap was too large to replay.
    pub expected: Option<Vec2>,
    pub reported: Vec2,
}

impl CheatReport {
    /// Largest per-axis distance between replay and claim.
    pub fn deviation(&self) -> Option<f32> {
        self.expected.map(|expected| {
            let offset = expected - self.reported;
            offset.x.abs().max(offset.y.abs())
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Verdict {
    /// The snapshot now describes the shadow car.
    Accepted,
    /// Older than what the shadow already has; nothing changed.
    Stale,
    Diverged(CheatReport),
}

#[derive(Clone, Debug)]
pub struct ReplayLimits {
    pub position_tolerance: f32,
    pub max_replay_ticks: u32,
}

/// Checks `state` against `shadow` and, if it holds up, adopts it.
///
/// `last_iteration` is the shadow's replay baseline; `None` means there is
/// nothing to replay from and the snapshot is trusted as-is.
pub fn validate(
    shadow: &mut Car,
    last_iteration: Option<Iteration>,
    state: &CarState,
    surface: &dyn Surface,
    simulation: &SimulationConfig,
    limits: &ReplayLimits,
) -> Verdict {
    let Some(last) = last_iteration else {
        state.apply(shadow);
        return Verdict::Accepted;
    };

    if state.iteration <= last {
        return Verdict::Stale;
    }

    let gap = state.iteration - last;
    if gap > limits.max_replay_ticks {
        return Verdict::Diverged(CheatReport {
            replayed_from: last,
            claimed_iteration: state.iteration,
            expected: None,
            reported: state.position,
        });
    }

    let mut replay = shadow.clone();
    replay.iteration = last;
    for _ in 1..gap {
        physics::step(&mut replay, surface, simulation.tick_ms, &simulation.physics);
    }
    // the client sends on every input change, so the claimed tick is the
    // first one driven by the new controls
    replay = physics::update(
        &replay,
        &state.controls(),
        surface,
        simulation.tick_ms,
        &simulation.physics,
    );

    if !state.after_collision
        && !replay
            .position
            .within_per_axis(state.position, limits.position_tolerance)
    {
        return Verdict::Diverged(CheatReport {
            replayed_from: last,
            claimed_iteration: state.iteration,
            expected: Some(replay.position),
            reported: state.position,
        });
    }

    state.apply(shadow);
    Verdict::Accepted
}
