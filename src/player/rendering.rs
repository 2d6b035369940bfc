//! Ship presentation: hull mesh and the chase camera.
//!
//! The ship's `Transform` is written by the flight system; everything here only
//! reads it.

use super::state::Ship;
use crate::config::FieldConfig;
use bevy::prelude::*;

/// Camera offset behind and above the ship, in ship space.
const CAMERA_OFFSET: Vec3 = Vec3::new(0.0, 5.0, 14.0);
/// Point the camera looks at, in ship space.
const CAMERA_LOOK_AT: Vec3 = Vec3::new(0.0, 3.0, 0.0);
/// Field of view at minimum and maximum forward speed, degrees.
const LOW_FOV: f32 = 75.0;
const HIGH_FOV: f32 = 100.0;

/// The camera that trails the ship.  Its rotation lags the ship's.
#[derive(Component, Debug, Clone, Copy)]
pub struct ChaseCamera {
    pub rotation: Quat,
}

impl Default for ChaseCamera {
    fn default() -> Self {
        Self {
            rotation: Quat::IDENTITY,
        }
    }
}

/// Attach a hull mesh to the ship on spawn.
///
/// Runs once per ship entity (via [`Added<Ship>`]).  The mesh matches the
/// collision box so what you see is what collides.
pub fn attach_ship_mesh_system(
    mut commands: Commands,
    query: Query<Entity, Added<Ship>>,
    config: Res<FieldConfig>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    for entity in query.iter() {
        let size = Vec3::from(config.ship_half_extents) * 2.0;
        let mesh = meshes.add(Cuboid::from_size(size));
        let material = materials.add(StandardMaterial {
            base_color: Color::srgb(0.75, 0.78, 0.82),
            metallic: 0.6,
            perceptual_roughness: 0.4,
            ..default()
        });
        commands
            .entity(entity)
            .insert((Mesh3d(mesh), MeshMaterial3d(material)));
    }
}

/// Follow the ship from behind, easing the camera rotation toward the ship's
/// and widening the field of view with speed.
pub fn chase_camera_system(
    time: Res<Time>,
    config: Res<FieldConfig>,
    q_ship: Query<&Ship>,
    mut q_camera: Query<(&mut Transform, &mut ChaseCamera, &mut Projection), Without<Ship>>,
) {
    let Ok(ship) = q_ship.single() else {
        return;
    };
    let Ok((mut transform, mut chase, mut projection)) = q_camera.single_mut() else {
        return;
    };

    let t = time.delta_secs().min(1.0);
    chase.rotation = chase.rotation.slerp(ship.rotation, t);

    transform.translation = ship.position + chase.rotation * CAMERA_OFFSET;
    let target = ship.position + chase.rotation * CAMERA_LOOK_AT;
    transform.look_at(target, chase.rotation * Vec3::Y);

    if let Projection::Perspective(perspective) = projection.as_mut() {
        let fov = LOW_FOV + (HIGH_FOV - LOW_FOV) * ship.speed01(&config);
        perspective.fov = fov.to_radians();
    }
}
