//! Runtime field configuration loaded from `assets/field.toml`.
//!
//! [`FieldConfig`] is a Bevy [`Resource`] that mirrors every constant in
//! [`crate::constants`].  At startup, [`load_field_config`] reads
//! `assets/field.toml` and overwrites the defaults with any values present in
//! the file.  Missing keys fall back to the compile-time defaults, so a minimal
//! TOML can override just the values you care about.
//!
//! ## Usage in systems
//!
//! Add `config: Res<FieldConfig>` to any system parameter list and read values
//! with `config.box_size`, `config.grid_cell_size`, etc.
//!
//! ## Tuning workflow
//!
//! 1. Edit `assets/field.toml` (e.g. change `seed` for a different field).
//! 2. Restart the game; no recompilation required.
//!
//! Keep `src/constants.rs` in sync: it remains the **authoritative default**
//! source used by `FieldConfig::default()`.

use crate::constants::*;
use crate::error::{validate_band, validate_grid, validate_positive, FieldError, FieldResult};
use bevy::prelude::*;
use serde::Deserialize;

/// Upper bound on `num_lod_levels`.  Level 6 has 40,962 vertices; level 7
/// (163,842) no longer fits 16-bit indices.
const MAX_LOD_LEVELS: usize = 7;

/// Runtime-tunable generation, collision and gameplay configuration.
///
/// All fields default to the corresponding compile-time constant from
/// `src/constants.rs`.
#[derive(Resource, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    // ── World ─────────────────────────────────────────────────────────────────
    pub box_size: f32,
    pub seed: u64,

    // ── Meshes & Variants ─────────────────────────────────────────────────────
    pub num_lod_levels: usize,
    pub num_variants: usize,
    pub collision_lod: usize,
    pub inner_radius_min: f32,
    pub inner_radius_max: f32,
    pub asteroid_size_min: f32,
    pub asteroid_size_max: f32,
    pub giant_chance: f64,
    pub giant_scale: f32,
    pub ridge_floor: f32,
    pub base_noise_frequency: f64,
    pub base_noise_octaves: usize,
    pub ridge_noise_frequency: f64,
    pub ridge_noise_octaves: usize,

    // ── Placement ─────────────────────────────────────────────────────────────
    pub placement_cell_size: f32,
    pub spacing_min: f32,
    pub spacing_max: f32,
    pub spacing_noise_frequency: f64,
    pub placement_attempts: u32,
    pub max_rotation_speed: f32,

    // ── Collision ─────────────────────────────────────────────────────────────
    pub grid_cell_size: f32,
    pub box_query_margin: f32,

    // ── Ship ──────────────────────────────────────────────────────────────────
    pub ship_max_lateral_speed: f32,
    pub ship_lateral_accel_time: f32,
    pub ship_lateral_decel_time: f32,
    pub ship_pitch_speed: f32,
    pub ship_roll_speed: f32,
    pub ship_max_roll_offset: f32,
    pub ship_min_forward_speed: f32,
    pub ship_max_forward_speed: f32,
    pub ship_forward_accel: f32,
    pub ship_half_extents: [f32; 3],
    pub ship_sphere_radius: f32,
    pub collision_substeps: u32,

    // ── Session ───────────────────────────────────────────────────────────────
    pub target_radius: f32,
    pub round_time: f32,

    // ── Rendering ─────────────────────────────────────────────────────────────
    pub render_lod: usize,
    pub render_distance: f32,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            // World
            box_size: BOX_SIZE,
            seed: FIELD_SEED,
            // Meshes & Variants
            num_lod_levels: NUM_LOD_LEVELS,
            num_variants: NUM_VARIANTS,
            collision_lod: COLLISION_LOD,
            inner_radius_min: INNER_RADIUS_MIN,
            inner_radius_max: INNER_RADIUS_MAX,
            asteroid_size_min: ASTEROID_SIZE_MIN,
            asteroid_size_max: ASTEROID_SIZE_MAX,
            giant_chance: GIANT_CHANCE,
            giant_scale: GIANT_SCALE,
            ridge_floor: RIDGE_FLOOR,
            base_noise_frequency: BASE_NOISE_FREQUENCY,
            base_noise_octaves: BASE_NOISE_OCTAVES,
            ridge_noise_frequency: RIDGE_NOISE_FREQUENCY,
            ridge_noise_octaves: RIDGE_NOISE_OCTAVES,
            // Placement
            placement_cell_size: PLACEMENT_CELL_SIZE,
            spacing_min: SPACING_MIN,
            spacing_max: SPACING_MAX,
            spacing_noise_frequency: SPACING_NOISE_FREQUENCY,
            placement_attempts: PLACEMENT_ATTEMPTS,
            max_rotation_speed: MAX_ROTATION_SPEED,
            // Collision
            grid_cell_size: GRID_CELL_SIZE,
            box_query_margin: BOX_QUERY_MARGIN,
            // Ship
            ship_max_lateral_speed: SHIP_MAX_LATERAL_SPEED,
            ship_lateral_accel_time: SHIP_LATERAL_ACCEL_TIME,
            ship_lateral_decel_time: SHIP_LATERAL_DECEL_TIME,
            ship_pitch_speed: SHIP_PITCH_SPEED,
            ship_roll_speed: SHIP_ROLL_SPEED,
            ship_max_roll_offset: SHIP_MAX_ROLL_OFFSET,
            ship_min_forward_speed: SHIP_MIN_FORWARD_SPEED,
            ship_max_forward_speed: SHIP_MAX_FORWARD_SPEED,
            ship_forward_accel: SHIP_FORWARD_ACCEL,
            ship_half_extents: SHIP_HALF_EXTENTS,
            ship_sphere_radius: SHIP_SPHERE_RADIUS,
            collision_substeps: COLLISION_SUBSTEPS,
            // Session
            target_radius: TARGET_RADIUS,
            round_time: ROUND_TIME,
            // Rendering
            render_lod: RENDER_LOD,
            render_distance: RENDER_DISTANCE,
        }
    }
}

impl FieldConfig {
    /// Parse a (possibly partial) TOML document on top of the defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str::<FieldConfig>(contents)
    }

    /// Number of hash-grid cells along each axis of the box.
    pub fn grid_dimension(&self) -> i32 {
        (self.box_size / self.grid_cell_size).round() as i32
    }

    /// Reject values that would break generation invariants.
    ///
    /// Called once before generation; a failure here is a configuration bug.
    pub fn validate(&self) -> FieldResult<()> {
        validate_positive("box_size", self.box_size)?;
        validate_positive("grid_cell_size", self.grid_cell_size)?;
        validate_positive("placement_cell_size", self.placement_cell_size)?;
        validate_positive("asteroid_size_min", self.asteroid_size_min)?;
        validate_positive("giant_scale", self.giant_scale)?;
        validate_positive("inner_radius_min", self.inner_radius_min)?;
        validate_band("asteroid_size_max", self.asteroid_size_min, self.asteroid_size_max)?;
        validate_band("inner_radius_max", self.inner_radius_min, self.inner_radius_max)?;
        validate_band("inner_radius_max", self.inner_radius_max, 1.0)?;
        validate_band("spacing_min", 0.0, self.spacing_min)?;
        validate_band("spacing_max", self.spacing_min, self.spacing_max)?;
        validate_band("ridge_floor", 0.0, self.ridge_floor)?;
        validate_band("ridge_floor", self.ridge_floor, 1.0)?;
        validate_grid(self.box_size, self.grid_cell_size)?;

        // Every asteroid body must contain at least one placement lattice point.
        let half_diagonal = self.placement_cell_size * 3f32.sqrt() * 0.5;
        if half_diagonal > self.asteroid_size_min {
            return Err(FieldError::UnsafeConstant {
                name: "placement_cell_size",
                value: self.placement_cell_size,
                safe_range: "(0, 2 * asteroid_size_min / sqrt(3)]",
            });
        }

        if self.num_lod_levels == 0 || self.num_lod_levels > MAX_LOD_LEVELS {
            return Err(FieldError::UnsafeConstant {
                name: "num_lod_levels",
                value: self.num_lod_levels as f32,
                safe_range: "[1, 7]",
            });
        }
        if self.collision_lod >= self.num_lod_levels {
            return Err(FieldError::UnsafeConstant {
                name: "collision_lod",
                value: self.collision_lod as f32,
                safe_range: "[0, num_lod_levels)",
            });
        }
        if self.render_lod >= self.num_lod_levels {
            return Err(FieldError::UnsafeConstant {
                name: "render_lod",
                value: self.render_lod as f32,
                safe_range: "[0, num_lod_levels)",
            });
        }
        if self.num_variants == 0 {
            return Err(FieldError::EmptyCatalog);
        }
        if self.placement_attempts == 0 {
            return Err(FieldError::UnsafeConstant {
                name: "placement_attempts",
                value: 0.0,
                safe_range: "[1, ∞)",
            });
        }
        if self.collision_substeps == 0 {
            return Err(FieldError::UnsafeConstant {
                name: "collision_substeps",
                value: 0.0,
                safe_range: "[1, ∞)",
            });
        }
        Ok(())
    }
}

/// Startup system: attempt to load `assets/field.toml` and overwrite the
/// `FieldConfig` resource with any values present in the file.
///
/// Missing keys retain their compiled defaults.  TOML parse errors are printed
/// to stderr but do not abort the game.  A missing file is silently ignored
/// (defaults are already in place from `insert_resource`).
pub fn load_field_config(mut config: ResMut<FieldConfig>) {
    let path = "assets/field.toml";
    match std::fs::read_to_string(path) {
        Ok(contents) => match FieldConfig::from_toml_str(&contents) {
            Ok(loaded) => {
                *config = loaded;
                println!("✓ Loaded field config from {path}");
            }
            Err(e) => {
                eprintln!("⚠ Failed to parse {path}: {e}; using defaults");
            }
        },
        Err(_) => {
            // File not present; defaults are already in place.
            println!("ℹ No {path} found; using compiled defaults");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(FieldConfig::default().validate().is_ok());
        assert_eq!(FieldConfig::default().grid_dimension(), 80);
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config = FieldConfig::from_toml_str("seed = 7\nbox_size = 1000.0\n").unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.box_size, 1000.0);
        assert_eq!(config.num_variants, NUM_VARIANTS);
        assert_eq!(config.grid_cell_size, GRID_CELL_SIZE);
    }

    #[test]
    fn collision_lod_must_exist() {
        let config = FieldConfig {
            collision_lod: NUM_LOD_LEVELS,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(FieldError::UnsafeConstant {
                name: "collision_lod",
                ..
            })
        ));
    }

    #[test]
    fn lod_count_limited_to_16_bit_meshes() {
        let ok = FieldConfig {
            num_lod_levels: 7,
            ..Default::default()
        };
        assert!(ok.validate().is_ok());

        let too_many = FieldConfig {
            num_lod_levels: 8,
            ..Default::default()
        };
        assert!(matches!(
            too_many.validate(),
            Err(FieldError::UnsafeConstant {
                name: "num_lod_levels",
                ..
            })
        ));
    }

    #[test]
    fn mismatched_grid_is_rejected() {
        let config = FieldConfig {
            grid_cell_size: 45.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(FieldError::GridMismatch { .. })
        ));
    }

    #[test]
    fn inverted_spacing_band_is_rejected() {
        let config = FieldConfig {
            spacing_min: 30.0,
            spacing_max: 10.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
