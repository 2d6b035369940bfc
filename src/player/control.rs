//! Ship input and flight systems.
//!
//! ## Pipeline (runs in order every `Update` frame while playing)
//!
//! 1. [`ship_intent_clear_system`]: resets `ShipIntent` to neutral.
//! 2. [`keyboard_to_intent_system`]: translates keys into `ShipIntent` fields.
//! 3. `update_wrapping_system`: re-centres the wrapping window on the ship.
//! 4. [`ship_flight_system`]: integrates the flight model in sub-steps and
//!    runs one hull-box collision query per sub-step.
//!
//! Input only ever reaches the flight model through `ShipIntent`; tests set
//! the resource directly and run only the flight system.

use super::state::{Ship, ShipIntent};
use crate::collision::CollisionQueryEngine;
use crate::config::FieldConfig;
use crate::field::AsteroidField;
use crate::game::GameSession;
use crate::wrapping::WrappingState;
use bevy::prelude::*;

// ── Step 1: Clear ─────────────────────────────────────────────────────────────

pub fn ship_intent_clear_system(mut intent: ResMut<ShipIntent>) {
    *intent = ShipIntent::default();
}

// ── Step 2: Keyboard → Intent ─────────────────────────────────────────────────

/// Translate keys into [`ShipIntent`].
///
/// - **Arrows / WASD** → strafe (`lateral`), up/down also pitches
/// - **Q / E** → roll left / right
/// - **Space / Shift** → throttle up / down
pub fn keyboard_to_intent_system(keys: Res<ButtonInput<KeyCode>>, mut intent: ResMut<ShipIntent>) {
    let axis = |pos: &[KeyCode], neg: &[KeyCode]| -> f32 {
        let p = keys.any_pressed(pos.iter().copied()) as i32;
        let n = keys.any_pressed(neg.iter().copied()) as i32;
        (p - n) as f32
    };

    intent.lateral = Vec2::new(
        axis(
            &[KeyCode::ArrowRight, KeyCode::KeyD],
            &[KeyCode::ArrowLeft, KeyCode::KeyA],
        ),
        axis(
            &[KeyCode::ArrowUp, KeyCode::KeyW],
            &[KeyCode::ArrowDown, KeyCode::KeyS],
        ),
    );
    intent.roll = axis(&[KeyCode::KeyE], &[KeyCode::KeyQ]);
    intent.throttle = axis(
        &[KeyCode::Space],
        &[KeyCode::ShiftLeft, KeyCode::ShiftRight],
    );
}

// ── Step 3: Flight + collision ────────────────────────────────────────────────

/// Move the ship and test its hull against the field.
///
/// The frame is split into `collision_substeps` equal steps so that the
/// per-query displacement stays small next to an asteroid radius.  Each step
/// integrates, re-centres the wrapping window on the ship, and issues one
/// oriented-box query.  Any hit sets [`Ship::intersected`] for this frame.
#[allow(clippy::too_many_arguments)]
pub fn ship_flight_system(
    time: Res<Time>,
    intent: Res<ShipIntent>,
    config: Res<FieldConfig>,
    field: Res<AsteroidField>,
    session: Res<GameSession>,
    mut wrapping: ResMut<WrappingState>,
    mut engine: ResMut<CollisionQueryEngine>,
    mut ships: Query<(&mut Ship, &mut Transform)>,
) {
    let Ok((mut ship, mut transform)) = ships.single_mut() else {
        return;
    };

    let steps = config.collision_substeps.max(1);
    let dt = time.delta_secs() / steps as f32;
    let half_extents = Vec3::from(config.ship_half_extents);

    ship.intersected = false;
    for step in 1..=steps {
        ship.integrate(dt, &intent, &config);
        wrapping.update(ship.position);
        let hull = ship.hull_box(half_extents);
        let spin_time = session.elapsed + dt * step as f32;
        if engine.any_box_intersects(&field, &wrapping, &hull, spin_time) {
            ship.intersected = true;
        }
    }

    *transform = Transform::from_matrix(ship.world_matrix());
}
