//! Player module: ship entity, flight input, collision and presentation.
//!
//! ## Sub-module layout
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`state`] | `Ship` component (flight model, hull box) and the `ShipIntent` resource |
//! | [`control`] | Input systems and the sub-stepped flight + collision system |
//! | [`rendering`] | Ship mesh attachment and the chase camera |
//!
//! All public items are re-exported at this level so the rest of the crate
//! can use flat `crate::player::*` imports.

pub mod control;
pub mod rendering;
pub mod state;

// ── Flat re-exports ───────────────────────────────────────────────────────────

pub use control::{keyboard_to_intent_system, ship_flight_system, ship_intent_clear_system};
pub use rendering::{attach_ship_mesh_system, chase_camera_system, ChaseCamera};
pub use state::{Ship, ShipIntent};

// ── Ship spawn ─────────────────────────────────────────────────────────────────

use crate::wrapping::WrapFocus;
use bevy::prelude::*;

/// Spawn the ship entity.
///
/// The position is a placeholder; the session start moves it to a clear spot
/// once the field exists.  The wrapping window follows this entity.
pub fn spawn_ship(mut commands: Commands) {
    commands.spawn((
        Ship::default(),
        WrapFocus,
        Transform::default(),
        Visibility::default(),
    ));

    println!("✓ Ship spawned");
}
