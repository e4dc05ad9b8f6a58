use pitlane_serde::{BitReader, BitWrite, Serde, SerdeErr};

use crate::{Car, Controls, Iteration, Vec2};

/// Full snapshot of a car's synchronized state, as sent over the wire.
///
/// Snapshots are never deltas: [`CarState::apply`] overwrites every
/// synchronized field, which is what lets either peer correct the other by
/// simply teleporting.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CarState {
    pub position: Vec2,
    pub rotation: f32,
    pub movement: Vec2,
    pub speed: f32,
    pub turn: f32,
    /// -1 braking, 0 coasting, 1 accelerating.
    pub accel_sign: i8,
    pub iteration: Iteration,
    /// Set by the sender when a collision happened on the tick this snapshot
    /// was taken, which makes its position legitimately unpredictable.
    pub after_collision: bool,
    pub owner: String,
}

impl CarState {
    pub fn serialize(car: &Car, owner: &str, after_collision: bool) -> Self {
        Self {
            position: car.position,
            rotation: car.rotation,
            movement: car.movement,
            speed: car.speed,
            turn: car.controls.turn,
            accel_sign: car.controls.accel_sign(),
            iteration: car.iteration,
            after_collision,
            owner: owner.to_string(),
        }
    }

    pub fn controls(&self) -> Controls {
        Controls::from_accel_sign(self.turn, self.accel_sign)
    }

    /// Overwrites the synchronized fields of `car`. `locked` and `lap` are
    /// local bookkeeping and are left alone.
    pub fn apply(&self, car: &mut Car) {
        car.position = self.position;
        car.rotation = self.rotation;
        car.movement = self.movement;
        car.speed = self.speed;
        car.controls = self.controls();
        car.iteration = self.iteration;
    }
}

impl Serde for CarState {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.position.ser(writer);
        self.rotation.ser(writer);
        self.movement.ser(writer);
        self.speed.ser(writer);
        self.turn.ser(writer);
        self.accel_sign.ser(writer);
        self.iteration.ser(writer);
        self.after_collision.ser(writer);
        self.owner.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let position = Vec2::de(reader)?;
        let rotation = f32::de(reader)?;
        let movement = Vec2::de(reader)?;
        let speed = f32::de(reader)?;
        let turn = f32::de(reader)?;
        let accel_sign = i8::de(reader)?;
        if !(-1..=1).contains(&accel_sign) {
            return Err(SerdeErr::InvalidTag {
                type_name: "CarState::accel_sign",
                tag: accel_sign as u64,
            });
        }
        Ok(Self {
            position,
            rotation,
            movement,
            speed,
            turn,
            accel_sign,
            iteration: Iteration::de(reader)?,
            after_collision: bool::de(reader)?,
            owner: String::de(reader)?,
        })
    }
}
