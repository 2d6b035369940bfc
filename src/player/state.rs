//! Ship component and the input intent resource.
//!
//! [`Ship`] holds the flight state in true world coordinates; its
//! `Transform` is a derived copy written after every flight update.
//! [`ShipIntent`] is the input abstraction: keyboard systems fill it, the
//! flight system reads it, and tests set it directly.

use crate::collision::OrientedBox;
use crate::config::FieldConfig;
use bevy::prelude::*;

// ── Components ─────────────────────────────────────────────────────────────────

/// The player ship.
///
/// Local axes: +X right, +Y up, −Z forward.  Lateral velocity lives in
/// `velocity.x` / `velocity.y` (ship frame); forward motion is
/// `forward_speed` along −Z.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct Ship {
    pub position: Vec3,
    pub velocity: Vec2,
    pub forward_speed: f32,
    pub rotation: Quat,
    /// Cosmetic bank toward the lateral velocity, radians about the forward axis.
    pub roll_offset: f32,
    /// Set when any collision sub-step of the last update hit an asteroid.
    pub intersected: bool,
}

impl Default for Ship {
    fn default() -> Self {
        Self::at(Vec3::ZERO)
    }
}

impl Ship {
    /// A ship at rest at `position`, facing −Z.
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            forward_speed: 0.0,
            rotation: Quat::IDENTITY,
            roll_offset: 0.0,
            intersected: false,
        }
    }

    /// Put the ship back at rest at `position`, keeping its orientation.
    pub fn reset(&mut self, position: Vec3) {
        let rotation = self.rotation;
        *self = Self::at(position);
        self.rotation = rotation;
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// Forward speed mapped to `[0, 1]` across the throttle range.
    pub fn speed01(&self, config: &FieldConfig) -> f32 {
        let span = config.ship_max_forward_speed - config.ship_min_forward_speed;
        if span <= 0.0 {
            return 0.0;
        }
        ((self.forward_speed - config.ship_min_forward_speed) / span).clamp(0.0, 1.0)
    }

    /// Ship-to-world transform including the cosmetic roll offset.
    pub fn world_matrix(&self) -> Mat4 {
        let roll = Quat::from_axis_angle(self.forward(), self.roll_offset);
        Mat4::from_rotation_translation(roll * self.rotation, self.position)
    }

    /// The hull collision box in the ship's rotated frame.
    pub fn hull_box(&self, half_extents: Vec3) -> OrientedBox {
        OrientedBox::new(-half_extents, half_extents, self.world_matrix())
    }

    /// Advance the flight model by `dt` seconds.
    ///
    /// Lateral input accelerates up to `ship_max_lateral_speed`; an idle axis
    /// decelerates back to zero.  Vertical input also pitches the ship, roll
    /// input rolls it about the forward axis, and throttle changes the forward
    /// speed within its band.
    pub fn integrate(&mut self, dt: f32, intent: &ShipIntent, config: &FieldConfig) {
        let max = config.ship_max_lateral_speed;
        let decel = max / config.ship_lateral_decel_time;

        let mut accel = Vec2::new(
            lateral_accel(dt, intent.lateral.x, &mut self.velocity.x, decel),
            lateral_accel(dt, intent.lateral.y, &mut self.velocity.y, decel),
        );
        if accel.length() > 1.0 {
            accel = accel.normalize();
        }
        self.velocity += accel * dt * (max / config.ship_lateral_accel_time);
        self.velocity = self.velocity.clamp_length_max(max);

        let pitch_axis = self.rotation * Vec3::X;
        self.rotation =
            Quat::from_axis_angle(pitch_axis, accel.y * config.ship_pitch_speed * dt) * self.rotation;
        let roll_axis = self.forward();
        self.rotation =
            Quat::from_axis_angle(roll_axis, intent.roll * config.ship_roll_speed * dt) * self.rotation;
        self.rotation = self.rotation.normalize();

        let desired_roll = -self.velocity.x * config.ship_max_roll_offset / max;
        self.roll_offset += (desired_roll - self.roll_offset) * (3.0 * dt).min(1.0);

        self.forward_speed = (self.forward_speed + intent.throttle * config.ship_forward_accel * dt)
            .clamp(config.ship_min_forward_speed, config.ship_max_forward_speed);

        let local = Vec3::new(self.velocity.x, self.velocity.y, -self.forward_speed);
        self.position += self.rotation * (local * dt);
    }

    /// Move the ship back into `[0, box_size)³` by whole boxes.
    ///
    /// Returns the shift applied, so anything positioned relative to the ship
    /// (targets) can follow.  The tiled field looks identical after the shift.
    pub fn recenter(&mut self, box_size: f32) -> Vec3 {
        let boxes = (self.position / box_size).floor();
        let shift = -boxes * box_size;
        self.position += shift;
        shift
    }
}

/// Returns the acceleration input for one lateral axis, or decays `velocity`
/// toward zero when the axis is idle.
fn lateral_accel(dt: f32, input: f32, velocity: &mut f32, decel: f32) -> f32 {
    if input.abs() >= 0.01 {
        return input;
    }
    if *velocity > 0.0 {
        *velocity = (*velocity - dt * decel).max(0.0);
    } else {
        *velocity = (*velocity + dt * decel).min(0.0);
    }
    0.0
}

// ── Resources ──────────────────────────────────────────────────────────────────

/// Per-frame flight intent.
///
/// Cleared every frame by `ship_intent_clear_system` and then filled by the
/// keyboard system.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq)]
pub struct ShipIntent {
    /// Strafe input: `x` right, `y` up, each in `[-1, 1]`.
    pub lateral: Vec2,
    /// Roll input in `[-1, 1]`; positive rolls clockwise seen from behind.
    pub roll: f32,
    /// Throttle in `[-1, 1]`; positive speeds up.
    pub throttle: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> FieldConfig {
        FieldConfig::default()
    }

    #[test]
    fn idle_ship_decelerates_to_zero() {
        let mut ship = Ship::at(Vec3::ZERO);
        ship.velocity = Vec2::new(4.0, -3.0);
        for _ in 0..60 {
            ship.integrate(1.0 / 60.0, &ShipIntent::default(), &config());
        }
        assert_eq!(ship.velocity, Vec2::ZERO);
    }

    #[test]
    fn lateral_speed_is_capped() {
        let mut ship = Ship::at(Vec3::ZERO);
        let intent = ShipIntent {
            lateral: Vec2::new(1.0, 1.0),
            ..Default::default()
        };
        for _ in 0..300 {
            ship.integrate(1.0 / 60.0, &intent, &config());
        }
        assert!(ship.velocity.length() <= config().ship_max_lateral_speed + 1e-4);
    }

    #[test]
    fn throttle_stays_in_band() {
        let mut ship = Ship::at(Vec3::ZERO);
        let full = ShipIntent {
            throttle: 1.0,
            ..Default::default()
        };
        for _ in 0..1000 {
            ship.integrate(0.05, &full, &config());
        }
        assert_eq!(ship.forward_speed, config().ship_max_forward_speed);

        let brake = ShipIntent {
            throttle: -1.0,
            ..Default::default()
        };
        for _ in 0..1000 {
            ship.integrate(0.05, &brake, &config());
        }
        assert_eq!(ship.forward_speed, config().ship_min_forward_speed);
    }

    #[test]
    fn ship_flies_forward_along_neg_z() {
        let mut ship = Ship::at(Vec3::ZERO);
        ship.integrate(1.0, &ShipIntent::default(), &config());
        // Minimum forward speed is applied from the first step.
        assert!(ship.position.z < 0.0);
        assert!(ship.position.x.abs() < 1e-4 && ship.position.y.abs() < 1e-4);
    }

    #[test]
    fn recenter_moves_by_whole_boxes() {
        let mut ship = Ship::at(Vec3::new(-10.0, 4500.0, 100.0));
        let shift = ship.recenter(4000.0);
        assert_eq!(shift, Vec3::new(4000.0, -4000.0, 0.0));
        assert_eq!(ship.position, Vec3::new(3990.0, 500.0, 100.0));
    }

    #[test]
    fn hull_box_follows_ship() {
        let ship = Ship::at(Vec3::new(10.0, 20.0, 30.0));
        let hull = ship.hull_box(Vec3::new(2.5, 1.0, 4.0));
        let (center, _) = hull.bounding_sphere();
        assert!((center - ship.position).length() < 1e-5);
    }
}
