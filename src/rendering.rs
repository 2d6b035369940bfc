//! HUD, game-over banner and gizmo debug overlays.
//!
//! ## Layer Model
//!
//! | Layer              | Technology | Default | Controlled by          |
//! |--------------------|------------|---------|------------------------|
//! | Score / time HUD   | Bevy UI    | always  | n/a                    |
//! | Game-over banner   | Bevy UI    | hidden  | `GamePhase::GameOver`  |
//! | Field stats text   | Bevy UI    | OFF     | `show_stats` (F3)      |
//! | Hull box outline   | Gizmos     | OFF     | `show_hull` (F4)       |
//! | Nearby asteroids   | Gizmos     | OFF     | `show_nearby` (F5)     |
//!
//! ## System Responsibilities
//!
//! | System                          | Schedule | Purpose                                 |
//! |---------------------------------|----------|-----------------------------------------|
//! | `setup_hud`                     | Startup  | Spawn HUD, banner and stats text nodes  |
//! | `overlay_toggle_system`         | Update   | Flip overlay flags from function keys   |
//! | `hud_display_system`            | Update   | Refresh score / time / speed text       |
//! | `game_over_banner_system`       | Update   | Show the banner while the game is over  |
//! | `sync_stats_visibility_system`  | Update   | Show/hide the stats text                |
//! | `stats_display_system`          | Update   | Refresh stats text, reset query counter |
//! | `gizmo_rendering_system`        | Update   | Draw the enabled gizmo layers           |

use crate::collision::CollisionQueryEngine;
use crate::config::FieldConfig;
use crate::field::AsteroidField;
use crate::game::{GamePhase, GameSession};
use crate::player::Ship;
use crate::wrapping::WrappingState;
use bevy::prelude::*;

const HUD_FONT_SIZE: f32 = 18.0;
const BANNER_FONT_SIZE: f32 = 36.0;

/// Radius around the ship inside which the nearby-asteroid overlay draws.
const NEARBY_RADIUS: f32 = 150.0;

/// Box edges as corner index pairs, matching [`crate::collision::OrientedBox::world_corners`].
const BOX_EDGES: [(usize, usize); 12] = [
    (0, 1),
    (2, 3),
    (4, 5),
    (6, 7),
    (0, 2),
    (1, 3),
    (4, 6),
    (5, 7),
    (0, 4),
    (1, 5),
    (2, 6),
    (3, 7),
];

// ── Overlay state resource ────────────────────────────────────────────────────

/// Which debug layers are drawn.  Function keys flip the flags.
#[derive(Resource, Clone, Debug, Default)]
pub struct OverlayState {
    /// Field and collision statistics text.
    pub show_stats: bool,
    /// Outline of the ship's collision box, red while intersecting.
    pub show_hull: bool,
    /// Bounding spheres of the asteroids around the ship.
    pub show_nearby: bool,
}

// ── Component markers ─────────────────────────────────────────────────────────

/// Marker for the permanent HUD node.
#[derive(Component)]
pub struct HudDisplay;

/// Marker for the centred game-over banner.
#[derive(Component)]
pub struct GameOverBanner;

/// Marker for the stats text root node.
#[derive(Component)]
pub struct StatsTextDisplay;

// ── Startup ───────────────────────────────────────────────────────────────────

/// Spawn the HUD (top-left), the stats text under it and the hidden banner.
pub fn setup_hud(mut commands: Commands) {
    commands
        .spawn((
            Node {
                position_type: PositionType::Absolute,
                left: Val::Px(10.0),
                top: Val::Px(10.0),
                ..default()
            },
            HudDisplay,
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new("Score: 0"),
                TextFont {
                    font_size: HUD_FONT_SIZE,
                    ..default()
                },
                TextColor(Color::srgb(0.95, 0.88, 0.45)),
            ));
        });

    commands
        .spawn((
            Node {
                position_type: PositionType::Absolute,
                left: Val::Px(10.0),
                top: Val::Px(10.0 + HUD_FONT_SIZE + 6.0),
                ..default()
            },
            StatsTextDisplay,
            Visibility::Hidden,
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new(""),
                TextFont {
                    font_size: HUD_FONT_SIZE * 0.8,
                    ..default()
                },
                TextColor(Color::srgb(0.0, 1.0, 1.0)),
            ));
        });

    commands
        .spawn((
            Node {
                position_type: PositionType::Absolute,
                width: Val::Percent(100.0),
                top: Val::Percent(40.0),
                justify_content: JustifyContent::Center,
                ..default()
            },
            GameOverBanner,
            Visibility::Hidden,
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new("GAME OVER"),
                TextFont {
                    font_size: BANNER_FONT_SIZE,
                    ..default()
                },
                TextColor(Color::srgb(1.0, 0.35, 0.25)),
            ));
        });
}

// ── Update: input ─────────────────────────────────────────────────────────────

/// F3 stats, F4 hull box, F5 nearby asteroids.
pub fn overlay_toggle_system(keys: Res<ButtonInput<KeyCode>>, mut overlay: ResMut<OverlayState>) {
    if keys.just_pressed(KeyCode::F3) {
        overlay.show_stats = !overlay.show_stats;
    }
    if keys.just_pressed(KeyCode::F4) {
        overlay.show_hull = !overlay.show_hull;
    }
    if keys.just_pressed(KeyCode::F5) {
        overlay.show_nearby = !overlay.show_nearby;
    }
}

// ── Update: HUD ───────────────────────────────────────────────────────────────

/// The HUD line for the current session and ship.
pub fn hud_text(session: &GameSession, ship: &Ship) -> String {
    let mut text = format!(
        "Score: {}   Time: {:.1}   Speed: {:.0}",
        session.score,
        session.remaining_time.max(0.0),
        ship.forward_speed
    );
    if session.invincible_time > 0.0 && !session.game_over {
        text.push_str("   [shielded]");
    }
    text
}

/// Refresh the HUD each frame.
pub fn hud_display_system(
    session: Res<GameSession>,
    ships: Query<&Ship>,
    parent_query: Query<&Children, With<HudDisplay>>,
    mut text_query: Query<&mut Text>,
) {
    let Ok(ship) = ships.single() else {
        return;
    };
    let line = hud_text(&session, ship);
    for children in parent_query.iter() {
        for child in children.iter() {
            if let Ok(mut text) = text_query.get_mut(child) {
                *text = Text::new(line.clone());
            }
        }
    }
}

/// Show the banner with the final score while the game is over.
pub fn game_over_banner_system(
    phase: Res<State<GamePhase>>,
    session: Res<GameSession>,
    mut banner: Query<(&mut Visibility, &Children), With<GameOverBanner>>,
    mut text_query: Query<&mut Text>,
) {
    if !phase.is_changed() {
        return;
    }
    let over = *phase.get() == GamePhase::GameOver;
    for (mut visibility, children) in banner.iter_mut() {
        *visibility = if over {
            Visibility::Visible
        } else {
            Visibility::Hidden
        };
        if !over {
            continue;
        }
        for child in children.iter() {
            if let Ok(mut text) = text_query.get_mut(child) {
                *text = Text::new(format!(
                    "GAME OVER\nScore: {}\nPress R to restart",
                    session.score
                ));
            }
        }
    }
}

// ── Update: stats overlay ─────────────────────────────────────────────────────

/// Show or hide the stats text based on [`OverlayState::show_stats`].
pub fn sync_stats_visibility_system(
    overlay: Res<OverlayState>,
    mut query: Query<&mut Visibility, With<StatsTextDisplay>>,
) {
    if !overlay.is_changed() {
        return;
    }
    let vis = if overlay.show_stats {
        Visibility::Visible
    } else {
        Visibility::Hidden
    };
    for mut v in query.iter_mut() {
        *v = vis;
    }
}

/// Refresh the stats text and restart the per-frame query counter.
pub fn stats_display_system(
    field: Res<AsteroidField>,
    mut engine: ResMut<CollisionQueryEngine>,
    overlay: Res<OverlayState>,
    parent_query: Query<&Children, With<StatsTextDisplay>>,
    mut text_query: Query<&mut Text>,
) {
    let tested = engine.tested_count();
    engine.reset_stats();
    if !overlay.show_stats {
        return;
    }
    for children in parent_query.iter() {
        for child in children.iter() {
            if let Ok(mut text) = text_query.get_mut(child) {
                *text = Text::new(format!(
                    "Asteroids: {} | Variants: {} | Grid: {}³ ({} entries) | Tested: {}",
                    field.instances().len(),
                    field.catalog().len(),
                    field.grid().dimension(),
                    field.grid().entry_count(),
                    tested
                ));
            }
        }
    }
}

// ── Update: gizmo overlay rendering ──────────────────────────────────────────

/// Draw all enabled gizmo overlay layers based on [`OverlayState`].
pub fn gizmo_rendering_system(
    mut gizmos: Gizmos,
    overlay: Res<OverlayState>,
    config: Res<FieldConfig>,
    field: Res<AsteroidField>,
    wrapping: Res<WrappingState>,
    ships: Query<&Ship>,
) {
    if !overlay.show_hull && !overlay.show_nearby {
        return;
    }
    let Ok(ship) = ships.single() else {
        return;
    };

    if overlay.show_hull {
        let corners = ship
            .hull_box(Vec3::from(config.ship_half_extents))
            .world_corners();
        let color = if ship.intersected {
            Color::srgb(1.0, 0.15, 0.15)
        } else {
            Color::srgb(0.2, 1.0, 0.4)
        };
        for (a, b) in BOX_EDGES {
            gizmos.line(corners[a], corners[b], color);
        }
    }

    if overlay.show_nearby {
        let grid = field.grid();
        let instances = field.instances();
        let mut drawn = Vec::new();
        for cell in grid.cells_overlapping(ship.position, NEARBY_RADIUS) {
            for &index in grid.cell(cell) {
                if drawn.contains(&index) {
                    continue;
                }
                drawn.push(index);
                let instance = &instances[index as usize];
                let center = wrapping.visible_position(instance.position);
                if center.distance(ship.position) > NEARBY_RADIUS + instance.radius {
                    continue;
                }
                gizmos.sphere(center, instance.radius, Color::srgba(0.2, 0.8, 1.0, 0.5));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hud_text_shows_score_time_and_speed() {
        let session = GameSession {
            score: 70,
            remaining_time: 12.34,
            invincible_time: 0.0,
            ..Default::default()
        };
        let ship = Ship {
            forward_speed: 150.0,
            ..Default::default()
        };
        assert_eq!(
            hud_text(&session, &ship),
            "Score: 70   Time: 12.3   Speed: 150"
        );
    }

    #[test]
    fn hud_text_marks_invincibility_and_clamps_time() {
        let session = GameSession {
            remaining_time: -0.5,
            invincible_time: 1.0,
            ..Default::default()
        };
        let text = hud_text(&session, &Ship::default());
        assert!(text.contains("Time: 0.0"));
        assert!(text.ends_with("[shielded]"));
    }

    #[test]
    fn function_keys_toggle_overlays() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        let mut input = ButtonInput::<KeyCode>::default();
        input.press(KeyCode::F3);
        input.press(KeyCode::F5);
        app.insert_resource(input);
        app.init_resource::<OverlayState>();
        app.add_systems(Update, overlay_toggle_system);
        app.update();

        let overlay = app.world().resource::<OverlayState>();
        assert!(overlay.show_stats);
        assert!(!overlay.show_hull);
        assert!(overlay.show_nearby);
    }
}
