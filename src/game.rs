//! Session rules: checkpoints, score, timers and game over.
//!
//! Three targets are live at a time.  Each sits at a fixed flight distance
//! from the ship, measured in seconds at a reference speed:
//!
//! | Target | Reference speed                      | Base | Per remaining second |
//! |--------|--------------------------------------|------|----------------------|
//! | Blue   | 100, +50 per capture, capped at 400  | 10   | 0.5                  |
//! | Yellow | 500                                  | 20   | 1.0                  |
//! | Red    | 650                                  | 40   | 2.0                  |
//!
//! Reaching any target scores it, grants a short invincibility window and
//! fades all three out; when the fade ends a fresh set is placed and the
//! round clock resets.  Hitting an asteroid while vulnerable, or running out
//! of time, ends the game.  `R` starts a new one.

use crate::collision::CollisionQueryEngine;
use crate::config::FieldConfig;
use crate::constants::*;
use crate::field::{generate_field_system, AsteroidField};
use crate::placement::random_direction;
use crate::player::{
    keyboard_to_intent_system, ship_flight_system, ship_intent_clear_system, spawn_ship, Ship,
    ShipIntent,
};
use crate::wrapping::{update_wrapping_system, WrappingState};
use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Fade-out speed of captured targets (alpha per second).
const TARGET_FADE_RATE: f32 = 5.0;
/// Clearance radius required around a new start position.
const START_CLEARANCE: f32 = 10.0;
/// Capture distance as a multiple of the target radius.
const CAPTURE_SCALE: f32 = 1.2;

// ── Types ─────────────────────────────────────────────────────────────────────

#[derive(States, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GamePhase {
    #[default]
    Playing,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    Blue,
    Yellow,
    Red,
}

impl TargetKind {
    pub const ALL: [TargetKind; 3] = [TargetKind::Blue, TargetKind::Yellow, TargetKind::Red];

    pub fn base_points(self) -> i32 {
        match self {
            TargetKind::Blue => BLUE_BASE_POINTS,
            TargetKind::Yellow => YELLOW_BASE_POINTS,
            TargetKind::Red => RED_BASE_POINTS,
        }
    }

    pub fn time_points(self) -> f32 {
        match self {
            TargetKind::Blue => BLUE_TIME_POINTS,
            TargetKind::Yellow => YELLOW_TIME_POINTS,
            TargetKind::Red => RED_TIME_POINTS,
        }
    }

    pub fn color(self) -> Color {
        match self {
            TargetKind::Blue => Color::srgb(0.4, 0.7, 1.0),
            TargetKind::Yellow => Color::srgb(1.0, 1.0, 0.4),
            TargetKind::Red => Color::srgb(1.0, 0.4, 0.4),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Target {
    pub kind: TargetKind,
    pub position: Vec3,
}

/// What a call to [`GameSession::advance`] changed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionEvent {
    None,
    Captured { kind: TargetKind, points: i32 },
    TargetsPlaced,
    Crashed,
    TimeUp,
}

/// Randomness for gameplay decisions (start spot, target spots).
///
/// Separate from the field seed so every game differs while the field stays
/// the same.
#[derive(Resource)]
pub struct SessionRng(pub StdRng);

impl Default for SessionRng {
    fn default() -> Self {
        Self(StdRng::from_entropy())
    }
}

#[derive(Resource, Debug, Clone)]
pub struct GameSession {
    pub score: i32,
    /// Seconds left in the current round.
    pub remaining_time: f32,
    pub invincible_time: f32,
    /// Session clock driving asteroid spin.
    pub elapsed: f32,
    pub blue_required_speed: f32,
    pub targets: [Target; 3],
    /// True while the current targets fade out and before new ones appear.
    pub fading_targets: bool,
    pub targets_alpha: f32,
    pub game_over: bool,
}

impl Default for GameSession {
    fn default() -> Self {
        Self {
            score: 0,
            remaining_time: ROUND_TIME,
            invincible_time: START_INVINCIBILITY,
            elapsed: 0.0,
            blue_required_speed: BLUE_SPEED_START,
            targets: TargetKind::ALL.map(|kind| Target {
                kind,
                position: Vec3::ZERO,
            }),
            fading_targets: true,
            targets_alpha: 0.0,
            game_over: false,
        }
    }
}

impl GameSession {
    /// Reset the session and put the ship at a random spot clear of asteroids.
    pub fn new_game(
        &mut self,
        rng: &mut impl Rng,
        engine: &mut CollisionQueryEngine,
        field: &AsteroidField,
        ship: &mut Ship,
        config: &FieldConfig,
    ) {
        let elapsed = self.elapsed;
        *self = Self {
            remaining_time: config.round_time,
            elapsed,
            ..Self::default()
        };

        let box_size = field.box_size();
        // Stored and visible positions coincide with cleared offsets.
        let wrapping = WrappingState::new(box_size);
        let mut start = Vec3::splat(box_size * 0.5);
        for _ in 0..FREE_SPOT_ATTEMPTS {
            start = Vec3::new(
                rng.gen_range(0.0..box_size),
                rng.gen_range(0.0..box_size),
                rng.gen_range(0.0..box_size),
            );
            if !engine.any_sphere_intersects(field, &wrapping, start, START_CLEARANCE) {
                break;
            }
        }
        ship.reset(start);
        ship.forward_speed = config.ship_min_forward_speed;
    }

    /// A spot `speed * TARGET_DISTANCE_SECONDS` away from `origin` in a random
    /// direction, clear of asteroids by `radius`.
    ///
    /// Gives up after a bounded number of tries and returns the last
    /// candidate; a crowded field then yields a target inside rock rather than
    /// a hang.
    pub fn target_position(
        rng: &mut impl Rng,
        engine: &mut CollisionQueryEngine,
        field: &AsteroidField,
        origin: Vec3,
        speed: f32,
        radius: f32,
    ) -> Vec3 {
        let distance = speed * TARGET_DISTANCE_SECONDS;
        let mut pos = origin;
        for _ in 0..FREE_SPOT_ATTEMPTS {
            pos = origin + random_direction(rng) * distance;
            let wrapping = WrappingState::centered_on(field.box_size(), pos);
            if !engine.any_sphere_intersects(field, &wrapping, pos, radius) {
                return pos;
            }
        }
        warn!("[game] no clear target spot near {pos:?}; placing it anyway");
        pos
    }

    /// Place a fresh set of targets around `origin`.
    pub fn place_targets(
        &mut self,
        rng: &mut impl Rng,
        engine: &mut CollisionQueryEngine,
        field: &AsteroidField,
        origin: Vec3,
        radius: f32,
    ) {
        for target in &mut self.targets {
            let speed = match target.kind {
                TargetKind::Blue => self.blue_required_speed.min(BLUE_SPEED_CAP),
                TargetKind::Yellow => YELLOW_TARGET_SPEED,
                TargetKind::Red => RED_TARGET_SPEED,
            };
            target.position = Self::target_position(rng, engine, field, origin, speed, radius);
        }
    }

    /// Follow a whole-box shift of the ship (see [`Ship::recenter`]).
    pub fn shift_targets(&mut self, shift: Vec3) {
        for target in &mut self.targets {
            target.position += shift;
        }
    }

    /// Advance the session by `dt` after the ship has moved.
    pub fn advance(
        &mut self,
        dt: f32,
        ship: &Ship,
        rng: &mut impl Rng,
        engine: &mut CollisionQueryEngine,
        field: &AsteroidField,
        config: &FieldConfig,
    ) -> SessionEvent {
        if self.game_over {
            return SessionEvent::None;
        }
        self.elapsed += dt;

        if self.invincible_time > 0.0 {
            self.invincible_time -= dt;
        } else if ship.intersected {
            self.game_over = true;
            return SessionEvent::Crashed;
        }

        if self.fading_targets {
            self.targets_alpha -= dt * TARGET_FADE_RATE;
            if self.targets_alpha < 0.0 {
                self.place_targets(rng, engine, field, ship.position, config.target_radius);
                self.remaining_time = config.round_time;
                self.targets_alpha = 1.0;
                self.fading_targets = false;
                return SessionEvent::TargetsPlaced;
            }
            return SessionEvent::None;
        }

        let mut event = SessionEvent::None;
        let reach = config.target_radius * CAPTURE_SCALE + config.ship_sphere_radius;
        if let Some(target) = self
            .targets
            .iter()
            .find(|t| ship.position.distance(t.position) < reach)
        {
            let points =
                target.kind.base_points() + (target.kind.time_points() * self.remaining_time).round() as i32;
            event = SessionEvent::Captured {
                kind: target.kind,
                points,
            };
            self.score += points;
            self.blue_required_speed += BLUE_SPEED_STEP;
            self.invincible_time = CAPTURE_INVINCIBILITY;
            self.targets_alpha = 1.0;
            self.fading_targets = true;
        }

        self.remaining_time -= dt;
        if self.remaining_time < 0.0 {
            self.remaining_time = 0.0;
            self.game_over = true;
            return SessionEvent::TimeUp;
        }
        event
    }
}

// ── Plugin ────────────────────────────────────────────────────────────────────

/// Ship flight, session rules and restart, on top of [`FieldPlugin`].
///
/// Requires `StatesPlugin` (part of `DefaultPlugins`).
///
/// [`FieldPlugin`]: crate::field::FieldPlugin
pub struct GamePlugin;

impl Plugin for GamePlugin {
    fn build(&self, app: &mut App) {
        app.init_state::<GamePhase>()
            .init_resource::<ShipIntent>()
            .init_resource::<GameSession>()
            .init_resource::<SessionRng>()
            .add_systems(
                Startup,
                (spawn_ship, start_session_system)
                    .chain()
                    .after(generate_field_system),
            )
            .add_systems(
                Update,
                (
                    ship_intent_clear_system,
                    keyboard_to_intent_system,
                    ship_flight_system.after(update_wrapping_system),
                    session_advance_system,
                )
                    .chain()
                    .run_if(in_state(GamePhase::Playing))
                    .run_if(resource_exists::<AsteroidField>),
            )
            .add_systems(
                Update,
                restart_system
                    .run_if(in_state(GamePhase::GameOver))
                    .run_if(resource_exists::<AsteroidField>),
            );
    }
}

/// Startup: first game once the field and ship exist.
pub fn start_session_system(
    mut session: ResMut<GameSession>,
    mut rng: ResMut<SessionRng>,
    mut engine: ResMut<CollisionQueryEngine>,
    field: Option<Res<AsteroidField>>,
    config: Res<FieldConfig>,
    mut ships: Query<(&mut Ship, &mut Transform)>,
) {
    let Some(field) = field else {
        return;
    };
    let Ok((mut ship, mut transform)) = ships.single_mut() else {
        return;
    };
    session.new_game(&mut rng.0, &mut engine, &field, &mut ship, &config);
    *transform = Transform::from_matrix(ship.world_matrix());
    info!("[game] new game, ship at {:.0?}", ship.position);
}

/// Score, timers, target placement and the whole-box re-centre.
#[allow(clippy::too_many_arguments)]
pub fn session_advance_system(
    time: Res<Time>,
    config: Res<FieldConfig>,
    field: Res<AsteroidField>,
    mut session: ResMut<GameSession>,
    mut rng: ResMut<SessionRng>,
    mut engine: ResMut<CollisionQueryEngine>,
    mut wrapping: ResMut<WrappingState>,
    mut next_phase: ResMut<NextState<GamePhase>>,
    mut ships: Query<(&mut Ship, &mut Transform)>,
) {
    let Ok((mut ship, mut transform)) = ships.single_mut() else {
        return;
    };

    let event = session.advance(
        time.delta_secs(),
        &ship,
        &mut rng.0,
        &mut engine,
        &field,
        &config,
    );
    match event {
        SessionEvent::Captured { kind, points } => {
            info!("[game] {kind:?} target reached: +{points} (score {})", session.score);
        }
        SessionEvent::Crashed => {
            info!("[game] ship destroyed, final score {}", session.score);
            next_phase.set(GamePhase::GameOver);
        }
        SessionEvent::TimeUp => {
            info!("[game] out of time, final score {}", session.score);
            next_phase.set(GamePhase::GameOver);
        }
        SessionEvent::TargetsPlaced | SessionEvent::None => {}
    }

    let shift = ship.recenter(field.box_size());
    if shift != Vec3::ZERO {
        session.shift_targets(shift);
        wrapping.update(ship.position);
        *transform = Transform::from_matrix(ship.world_matrix());
    }
}

/// `R` after game over starts a new game.
#[allow(clippy::too_many_arguments)]
pub fn restart_system(
    keys: Res<ButtonInput<KeyCode>>,
    config: Res<FieldConfig>,
    field: Res<AsteroidField>,
    mut session: ResMut<GameSession>,
    mut rng: ResMut<SessionRng>,
    mut engine: ResMut<CollisionQueryEngine>,
    mut next_phase: ResMut<NextState<GamePhase>>,
    mut ships: Query<(&mut Ship, &mut Transform)>,
) {
    if !keys.just_pressed(KeyCode::KeyR) {
        return;
    }
    let Ok((mut ship, mut transform)) = ships.single_mut() else {
        return;
    };
    session.new_game(&mut rng.0, &mut engine, &field, &mut ship, &config);
    *transform = Transform::from_matrix(ship.world_matrix());
    next_phase.set(GamePhase::Playing);
    info!("[game] restart, ship at {:.0?}", ship.position);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::AsteroidInstance;

    fn empty_field() -> (AsteroidField, FieldConfig) {
        let config = FieldConfig {
            box_size: 400.0,
            num_variants: 1,
            num_lod_levels: 3,
            collision_lod: 1,
            render_lod: 2,
            ..Default::default()
        };
        (AsteroidField::from_instances(&config, Vec::new()).unwrap(), config)
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn first_advance_after_fade_places_targets() {
        let (field, config) = empty_field();
        let mut engine = CollisionQueryEngine::default();
        let mut session = GameSession::default();
        let mut ship = Ship::default();
        let mut rng = rng();
        session.new_game(&mut rng, &mut engine, &field, &mut ship, &config);

        let event = session.advance(0.1, &ship, &mut rng, &mut engine, &field, &config);
        assert_eq!(event, SessionEvent::TargetsPlaced);
        assert!(!session.fading_targets);
        let blue = session.targets[0].position.distance(ship.position);
        assert!((blue - BLUE_SPEED_START * TARGET_DISTANCE_SECONDS).abs() < 1e-1);
    }

    #[test]
    fn capture_scores_base_plus_time_points() {
        let (field, config) = empty_field();
        let mut engine = CollisionQueryEngine::default();
        let mut session = GameSession {
            fading_targets: false,
            remaining_time: 30.0,
            invincible_time: 0.0,
            ..Default::default()
        };
        let ship = Ship::at(Vec3::new(100.0, 0.0, 0.0));
        session.targets[2].position = ship.position + Vec3::X * 5.0;
        session.targets[0].position = Vec3::splat(9_000.0);
        session.targets[1].position = Vec3::splat(-9_000.0);

        let event = session.advance(0.0, &ship, &mut rng(), &mut engine, &field, &config);
        assert_eq!(
            event,
            SessionEvent::Captured {
                kind: TargetKind::Red,
                points: RED_BASE_POINTS + 60
            }
        );
        assert_eq!(session.score, RED_BASE_POINTS + 60);
        assert_eq!(session.blue_required_speed, BLUE_SPEED_START + BLUE_SPEED_STEP);
        assert_eq!(session.invincible_time, CAPTURE_INVINCIBILITY);
        assert!(session.fading_targets);
    }

    #[test]
    fn collision_ends_game_only_when_vulnerable() {
        let (field, config) = empty_field();
        let mut engine = CollisionQueryEngine::default();
        let mut ship = Ship::default();
        ship.intersected = true;

        let mut session = GameSession::default();
        let event = session.advance(0.1, &ship, &mut rng(), &mut engine, &field, &config);
        assert_ne!(event, SessionEvent::Crashed);
        assert!(!session.game_over);

        session.invincible_time = 0.0;
        let event = session.advance(0.1, &ship, &mut rng(), &mut engine, &field, &config);
        assert_eq!(event, SessionEvent::Crashed);
        assert!(session.game_over);
        assert_eq!(
            session.advance(0.1, &ship, &mut rng(), &mut engine, &field, &config),
            SessionEvent::None
        );
    }

    #[test]
    fn round_clock_runs_out() {
        let (field, config) = empty_field();
        let mut engine = CollisionQueryEngine::default();
        let mut session = GameSession {
            fading_targets: false,
            remaining_time: 0.05,
            invincible_time: 0.0,
            targets: TargetKind::ALL.map(|kind| Target {
                kind,
                position: Vec3::splat(9_000.0),
            }),
            ..Default::default()
        };
        let event = session.advance(0.1, &Ship::default(), &mut rng(), &mut engine, &field, &config);
        assert_eq!(event, SessionEvent::TimeUp);
        assert_eq!(session.remaining_time, 0.0);
    }

    #[test]
    fn targets_avoid_asteroids() {
        let config = FieldConfig {
            box_size: 400.0,
            num_variants: 1,
            num_lod_levels: 3,
            collision_lod: 1,
            render_lod: 2,
            ..Default::default()
        };
        // Blue target distance at the start speed is 4000: ten boxes away.
        let rock = AsteroidInstance {
            position: Vec3::splat(200.0),
            variant: 0,
            radius: 150.0,
            spacing: 0.0,
            rotation_axis: Vec3::Y,
            initial_rotation: 0.0,
            rotation_speed: 0.0,
        };
        let field = AsteroidField::from_instances(&config, vec![rock]).unwrap();
        let mut engine = CollisionQueryEngine::default();
        let mut rng = rng();
        for _ in 0..20 {
            let pos = GameSession::target_position(
                &mut rng,
                &mut engine,
                &field,
                Vec3::ZERO,
                BLUE_SPEED_START,
                config.target_radius,
            );
            let wrapping = WrappingState::centered_on(400.0, pos);
            assert!(!engine.any_sphere_intersects(&field, &wrapping, pos, config.target_radius));
        }
    }

    #[test]
    fn shift_moves_all_targets() {
        let mut session = GameSession::default();
        session.shift_targets(Vec3::X * 4000.0);
        assert!(session.targets.iter().all(|t| t.position == Vec3::X * 4000.0));
    }
}
