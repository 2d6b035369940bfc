//! Centralised field-generation, collision and gameplay constants.
//!
//! All tuneable values live here so they can be found, reasoned-about, and
//! modified in one place without source-diving across multiple modules.
//! Every constant is mirrored by a field on
//! [`FieldConfig`](crate::config::FieldConfig), which can override it from
//! `assets/field.toml` at startup.
//!
//! ## Tuning guidance
//!
//! Each constant notes the observable consequence of changing it.  After
//! editing, run `cargo test` to confirm the placement and collision invariants
//! still hold.

// ── World Bounds ──────────────────────────────────────────────────────────────

/// Edge length of the canonical asteroid cube (world units).
///
/// The cube tiles infinitely around the camera, so this is also the distance
/// after which the field visibly repeats.  Must be an integer multiple of
/// [`GRID_CELL_SIZE`].
pub const BOX_SIZE: f32 = 4000.0;

/// Master seed for the whole generation chain (catalog, placement, spin).
pub const FIELD_SEED: u64 = 42;

// ── Sphere Meshes ─────────────────────────────────────────────────────────────

/// Number of icosphere subdivision levels (LOD 0 = bare icosahedron).
///
/// Level `k` has `20 · 4^k` triangles.  At 5 levels the finest mesh has
/// 5120 triangles and 2562 vertices; 7 levels would be the last one that still
/// fits 16-bit indices.
pub const NUM_LOD_LEVELS: usize = 5;

/// Sphere LOD used for target checkpoints.
pub const TARGET_SPHERE_LOD: usize = 3;

// ── Asteroid Variants ─────────────────────────────────────────────────────────

/// Number of distinct procedurally generated asteroid shapes.
pub const NUM_VARIANTS: usize = 50;

/// LOD level whose vertices double as the collision point cloud.
///
/// LOD 2 gives 162 points per asteroid: dense enough that a ship hull box
/// cannot slip between neighbouring points, cheap enough to test thousands of
/// candidates per frame.
pub const COLLISION_LOD: usize = 2;

/// Band the per-variant inner radius floor is drawn from (fraction of size).
///
/// Lower values give deeper craters; the floor keeps vertices from collapsing
/// towards the centre.
pub const INNER_RADIUS_MIN: f32 = 0.4;
pub const INNER_RADIUS_MAX: f32 = 0.5;

/// Band the variant size (outer radius, world units) is drawn from.
pub const ASTEROID_SIZE_MIN: f32 = 20.0;
pub const ASTEROID_SIZE_MAX: f32 = 30.0;

/// Probability that a variant's size is doubled into a "giant".
pub const GIANT_CHANCE: f64 = 0.1;

/// Size multiplier applied to giants.
pub const GIANT_SCALE: f32 = 2.0;

/// Lower bound of the ridge factor: ridges carve at most 20 % off the radius.
pub const RIDGE_FLOOR: f32 = 0.8;

/// Frequency and octave count of the low-frequency base-shape noise.
///
/// Noise is sampled at `vertex * size`, so the frequency is per world unit.
pub const BASE_NOISE_FREQUENCY: f64 = 0.03;
pub const BASE_NOISE_OCTAVES: usize = 4;

/// Frequency and octave count of the ridge (crater / crest) noise.
pub const RIDGE_NOISE_FREQUENCY: f64 = 0.06;
pub const RIDGE_NOISE_OCTAVES: usize = 6;

// ── Placement ─────────────────────────────────────────────────────────────────

/// Cell size of the dense occupancy grid used while placing asteroids.
///
/// Finer cells make the overlap test tighter but the grid grows cubically:
/// 20 u over a 4000 u box is 201³ cells (≈ 32 MB), 10 u would be 258 MB.
pub const PLACEMENT_CELL_SIZE: f32 = 20.0;

/// Band the surface-to-surface spacing is drawn from.
///
/// Spacing is modulated by a slow noise field so that the field has dense
/// clusters and open lanes instead of a uniform packing.
pub const SPACING_MIN: f32 = 5.0;
pub const SPACING_MAX: f32 = 40.0;

/// Frequency of the spacing modulation noise (per world unit).
pub const SPACING_NOISE_FREQUENCY: f64 = 1.0 / 800.0;

/// Candidate proposals each active asteroid gets before it retires.
pub const PLACEMENT_ATTEMPTS: u32 = 8;

/// Maximum spin speed of an asteroid instance (radians per second).
pub const MAX_ROTATION_SPEED: f32 = 0.2;

// ── Spatial Hash Grid ─────────────────────────────────────────────────────────

/// World-space size of each collision hash cell.
///
/// Smaller than a typical asteroid so that a sphere of radius 20–60 spans a
/// handful of cells.  Must divide [`BOX_SIZE`] evenly.
pub const GRID_CELL_SIZE: f32 = 50.0;

/// Padding added to the oriented-box query AABB before cell enumeration.
pub const BOX_QUERY_MARGIN: f32 = 50.0;

// ── Ship ──────────────────────────────────────────────────────────────────────

/// Maximum lateral (left/right/up/down) speed, units per second.
pub const SHIP_MAX_LATERAL_SPEED: f32 = 10.0;

/// Seconds to reach / lose full lateral speed.
pub const SHIP_LATERAL_ACCEL_TIME: f32 = 0.5;
pub const SHIP_LATERAL_DECEL_TIME: f32 = 0.5;

/// Pitch and roll rates (radians per second at full input).
pub const SHIP_PITCH_SPEED: f32 = 0.5;
pub const SHIP_ROLL_SPEED: f32 = 0.5;

/// Cosmetic roll (radians) at full lateral speed.
pub const SHIP_MAX_ROLL_OFFSET: f32 = 0.4;

/// Forward speed range and throttle acceleration.
pub const SHIP_MIN_FORWARD_SPEED: f32 = 20.0;
pub const SHIP_MAX_FORWARD_SPEED: f32 = 300.0;
pub const SHIP_FORWARD_ACCEL: f32 = 60.0;

/// Half extents of the ship hull box in ship-local space.
pub const SHIP_HALF_EXTENTS: [f32; 3] = [2.5, 1.0, 4.0];

/// Radius of the ship's bounding sphere (used for target capture).
pub const SHIP_SPHERE_RADIUS: f32 = 4.8;

/// Collision sub-steps per frame; keeps per-step travel below the hull size.
pub const COLLISION_SUBSTEPS: u32 = 4;

// ── Session ───────────────────────────────────────────────────────────────────

/// Radius of a target checkpoint sphere.
pub const TARGET_RADIUS: f32 = 30.0;

/// Seconds granted per round.
pub const ROUND_TIME: f32 = 60.0;

/// Invincibility after starting a game and after each capture.
pub const START_INVINCIBILITY: f32 = 3.0;
pub const CAPTURE_INVINCIBILITY: f32 = 2.0;

/// Target distance = speed × this many seconds.
pub const TARGET_DISTANCE_SECONDS: f32 = 40.0;

/// Points for blue / yellow / red targets (base, per remaining second).
pub const BLUE_BASE_POINTS: i32 = 10;
pub const YELLOW_BASE_POINTS: i32 = 20;
pub const RED_BASE_POINTS: i32 = 40;
pub const BLUE_TIME_POINTS: f32 = 0.5;
pub const YELLOW_TIME_POINTS: f32 = 1.0;
pub const RED_TIME_POINTS: f32 = 2.0;

/// Blue target speed requirement: initial, increment per capture and cap.
pub const BLUE_SPEED_START: f32 = 100.0;
pub const BLUE_SPEED_STEP: f32 = 50.0;
pub const BLUE_SPEED_CAP: f32 = 400.0;

/// Fixed speeds used to place the yellow and red targets.
pub const YELLOW_TARGET_SPEED: f32 = 500.0;
pub const RED_TARGET_SPEED: f32 = 650.0;

/// Bounded retries when searching for asteroid-free spawn / target spots.
pub const FREE_SPOT_ATTEMPTS: u32 = 256;

// ── Rendering ─────────────────────────────────────────────────────────────────

/// LOD used for on-screen asteroid meshes.
pub const RENDER_LOD: usize = 3;

/// Instances further than this from the camera are hidden.
pub const RENDER_DISTANCE: f32 = 1500.0;
