use asteroid_run::asteroid_rendering::{
    spawn_field_visuals_system, sync_asteroid_transforms_system, sync_target_visuals_system,
};
use asteroid_run::config::{load_field_config, FieldConfig};
use asteroid_run::field::{AsteroidField, FieldPlugin};
use asteroid_run::game::{session_advance_system, start_session_system, GamePlugin};
use asteroid_run::player::{attach_ship_mesh_system, chase_camera_system};
use asteroid_run::rendering::{
    game_over_banner_system, gizmo_rendering_system, hud_display_system, overlay_toggle_system,
    setup_hud, stats_display_system, sync_stats_visibility_system, OverlayState,
};
use asteroid_run::{graphics, player};
use bevy::prelude::*;
use bevy::window::WindowResolution;

fn main() {
    let mut app = App::new();

    app.add_plugins(DefaultPlugins.set(WindowPlugin {
        primary_window: Some(Window {
            title: "Asteroid Run".into(),
            resolution: WindowResolution::new(1280, 720),
            ..Default::default()
        }),
        ..Default::default()
    }))
    .insert_resource(ClearColor(Color::BLACK))
    // Compiled defaults; load_field_config overwrites them from
    // assets/field.toml (if present) before the field is generated.
    .insert_resource(FieldConfig::default())
    .init_resource::<OverlayState>()
    .add_plugins((FieldPlugin, GamePlugin))
    .add_systems(
        Startup,
        (
            load_field_config,
            graphics::setup_camera.after(load_field_config),
            graphics::setup_lighting,
            setup_hud,
            spawn_field_visuals_system.after(start_session_system),
        ),
    )
    .add_systems(
        Update,
        (
            attach_ship_mesh_system,
            overlay_toggle_system,
            (
                sync_asteroid_transforms_system,
                sync_target_visuals_system,
                chase_camera_system,
            )
                .after(session_advance_system)
                .after(player::ship_flight_system),
            (
                hud_display_system,
                game_over_banner_system,
                sync_stats_visibility_system,
                stats_display_system.after(player::ship_flight_system),
                gizmo_rendering_system.after(session_advance_system),
            ),
        )
            .run_if(resource_exists::<AsteroidField>),
    );

    app.run();
}
