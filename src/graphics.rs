use crate::config::FieldConfig;
use crate::player::ChaseCamera;
use bevy::prelude::*;

/// Direction the sunlight travels, world space.
const SUN_DIRECTION: Vec3 = Vec3::new(-0.4, -0.6, -0.7);

/// Setup the 3D chase camera.
///
/// The far plane reaches past the render distance so hidden-by-distance
/// asteroids drop out before the clip plane cuts them.
pub fn setup_camera(mut commands: Commands, config: Res<FieldConfig>) {
    commands.spawn((
        Camera3d::default(),
        ChaseCamera::default(),
        Projection::Perspective(PerspectiveProjection {
            fov: 75f32.to_radians(),
            near: 0.5,
            far: config.render_distance * 1.25,
            ..default()
        }),
        Transform::default(),
    ));
    eprintln!("[SETUP] Camera spawned");
}

/// Setup a single directional "sun".
pub fn setup_lighting(mut commands: Commands) {
    commands.spawn((
        DirectionalLight {
            illuminance: 8_000.0,
            color: Color::srgb(1.0, 0.95, 0.88),
            ..default()
        },
        Transform::default().looking_to(SUN_DIRECTION, Vec3::Y),
    ));
    eprintln!("[SETUP] Sun spawned");
}
