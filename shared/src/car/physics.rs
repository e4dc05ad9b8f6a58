//! Per-tick car integration.
//!
//! The step is a pure function of the car, its controls, the ground under it
//! and the tick length: the server replays client cars with it and compares
//! the result against what the client reports, so anything that is not an
//! input here must not influence the outcome.

use crate::{math::normalize_angle, Car, Controls, PhysicsConfig, Surface, Vec2};

/// Returns the car one tick later. `controls` replace the car's held input
/// before integrating, unless the car is locked.
pub fn update(
    car: &Car,
    controls: &Controls,
    surface: &dyn Surface,
    dt_ms: u32,
    config: &PhysicsConfig,
) -> Car {
    let mut next = car.clone();
    next.set_controls(*controls);
    step(&mut next, surface, dt_ms, config);
    next
}

/// Advances `car` one tick with the controls it already holds.
pub fn step(car: &mut Car, surface: &dyn Surface, dt_ms: u32, config: &PhysicsConfig) {
    car.iteration += 1;

    if car.locked {
        return;
    }

    let dt = dt_ms as f32 / 1000.0;
    let controls = car.controls;

    if controls.accelerate {
        car.speed += config.acceleration * dt;
    }
    if controls.brake {
        car.speed -= config.braking * dt;
    }

    let resistance = config.air_resistance + surface.resistance(car.position).max(0.0);
    car.speed -= car.speed * (resistance * dt).min(1.0);
    car.speed = car.speed.clamp(-config.max_speed / 2.0, config.max_speed);

    // a standing car cannot turn; reversing flips the steering direction
    let speed_ratio = car.speed / config.max_speed;
    car.rotation =
        normalize_angle(car.rotation + controls.turn * config.turn_rate * speed_ratio * dt);

    let straight = Vec2::from_angle(car.rotation) * car.speed;
    car.movement = car
        .movement
        .lerp(straight, tenacity(car.speed, config) * dt);

    car.position += car.movement * dt;
}

/// How quickly the movement vector snaps back onto the heading, per second.
/// Grip is strongest at a standstill and fades towards top speed.
pub fn tenacity(speed: f32, config: &PhysicsConfig) -> f32 {
    let ratio = (speed.abs() / config.max_speed).min(1.0);
    config.tenacity_low_speed + (config.tenacity_high_speed - config.tenacity_low_speed) * ratio
}

/// Local-only visual state: braking or steering hard above the drift speed.
/// Never synchronized; each peer derives it from the car it already has.
pub fn is_drifting(car: &Car, config: &PhysicsConfig) -> bool {
    if car.locked || car.speed.abs() < config.drift_speed_threshold {
        return false;
    }
    car.controls.brake || car.controls.turn.abs() >= config.drift_turn_threshold
}
