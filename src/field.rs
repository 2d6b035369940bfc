//! The asteroid field aggregate and its Bevy plugin.
//!
//! [`AsteroidField`] owns everything generated at startup: the sphere LOD
//! hierarchy, the variant catalog, the placed instances and the collision
//! grid.  It is built once, inserted as a resource, and only read afterwards.
//!
//! ## Generation order
//!
//! One `StdRng` seeded from `FieldConfig::seed` is threaded through:
//!
//! 1. [`SphereLodMesh::generate`] (no randomness)
//! 2. [`AsteroidCatalog::generate`]
//! 3. [`PoissonFieldPlacer::place`]
//! 4. per-instance spin axis, phase and speed
//! 5. [`SpatialHashGrid::build`] (no randomness)
//!
//! Changing the order of stages 2–4 changes the field produced by a seed.

use crate::asteroid::AsteroidCatalog;
use crate::collision::CollisionQueryEngine;
use crate::config::{load_field_config, FieldConfig};
use crate::error::{FieldError, FieldResult};
use crate::placement::{random_direction, Placement, PoissonFieldPlacer};
use crate::spatial_partition::SpatialHashGrid;
use crate::sphere::SphereLodMesh;
use crate::wrapping::{update_wrapping_system, WrappingState};
use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::TAU;
use std::time::Instant;

/// One placed asteroid: a variant at a position with a constant spin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AsteroidInstance {
    /// Stored position inside `[0, box_size)³`.
    pub position: Vec3,
    pub variant: usize,
    /// Bounding radius (the variant size).
    pub radius: f32,
    /// Surface gap requested at placement; pads the grid footprint.
    pub spacing: f32,
    pub rotation_axis: Vec3,
    pub initial_rotation: f32,
    /// Radians per second, signed.
    pub rotation_speed: f32,
}

impl AsteroidInstance {
    fn from_placement(rng: &mut impl Rng, placement: &Placement, max_speed: f32) -> Self {
        let rotation_axis = random_direction(rng);
        let initial_rotation = rng.gen_range(0.0..TAU);
        let rotation_speed = if max_speed > 0.0 {
            rng.gen_range(-max_speed..=max_speed)
        } else {
            0.0
        };
        Self {
            position: placement.position,
            variant: placement.variant,
            radius: placement.radius,
            spacing: placement.spacing,
            rotation_axis,
            initial_rotation,
            rotation_speed,
        }
    }

    pub fn rotation_angle(&self, elapsed: f32) -> f32 {
        self.initial_rotation + self.rotation_speed * elapsed
    }

    pub fn rotation(&self, elapsed: f32) -> Quat {
        Quat::from_axis_angle(self.rotation_axis, self.rotation_angle(elapsed))
    }

    /// Rotation about the fixed spin axis at session time `elapsed`.
    pub fn rotation_matrix(&self, elapsed: f32) -> Mat4 {
        Mat4::from_axis_angle(self.rotation_axis, self.rotation_angle(elapsed))
    }
}

/// Everything generated at startup, owned in one place.
#[derive(Resource, Debug)]
pub struct AsteroidField {
    box_size: f32,
    sphere: SphereLodMesh,
    catalog: AsteroidCatalog,
    instances: Vec<AsteroidInstance>,
    grid: SpatialHashGrid,
}

impl AsteroidField {
    /// Run the full generation chain for `config`.
    pub fn generate(config: &FieldConfig) -> FieldResult<Self> {
        config.validate()?;
        let started = Instant::now();

        let mut rng = StdRng::seed_from_u64(config.seed);
        let sphere = SphereLodMesh::generate(config.num_lod_levels);
        let catalog = AsteroidCatalog::generate(&mut rng, &sphere, config)?;

        let mut placer = PoissonFieldPlacer::new(&mut rng, config);
        let placements = placer.place(&mut rng, &catalog);
        let stats = placer.stats();

        let instances: Vec<AsteroidInstance> = placements
            .iter()
            .map(|p| AsteroidInstance::from_placement(&mut rng, p, config.max_rotation_speed))
            .collect();

        let field = Self::assemble(config, sphere, catalog, instances);
        info!(
            "[field] {} variants ({} vertices, {} indices), {} instances from {} proposals, {} grid entries in {:.2?}",
            field.catalog.len(),
            field.catalog.vertices.len(),
            field.catalog.indices.len(),
            field.instances.len(),
            stats.proposals,
            field.grid.entry_count(),
            started.elapsed()
        );
        Ok(field)
    }

    /// Build a field from explicit instances over a freshly generated catalog.
    ///
    /// Used for scripted scenarios and tests.  Every instance must name an
    /// existing variant.
    pub fn from_instances(
        config: &FieldConfig,
        instances: Vec<AsteroidInstance>,
    ) -> FieldResult<Self> {
        config.validate()?;
        let mut rng = StdRng::seed_from_u64(config.seed);
        let sphere = SphereLodMesh::generate(config.num_lod_levels);
        let catalog = AsteroidCatalog::generate(&mut rng, &sphere, config)?;
        if let Some(bad) = instances.iter().find(|i| i.variant >= catalog.len()) {
            return Err(FieldError::UnknownVariant {
                variant: bad.variant,
                catalog_len: catalog.len(),
            });
        }
        Ok(Self::assemble(config, sphere, catalog, instances))
    }

    fn assemble(
        config: &FieldConfig,
        sphere: SphereLodMesh,
        catalog: AsteroidCatalog,
        instances: Vec<AsteroidInstance>,
    ) -> Self {
        let grid = SpatialHashGrid::build(&instances, config.box_size, config.grid_cell_size);
        Self {
            box_size: config.box_size,
            sphere,
            catalog,
            instances,
            grid,
        }
    }

    pub fn box_size(&self) -> f32 {
        self.box_size
    }

    pub fn sphere(&self) -> &SphereLodMesh {
        &self.sphere
    }

    pub fn catalog(&self) -> &AsteroidCatalog {
        &self.catalog
    }

    pub fn instances(&self) -> &[AsteroidInstance] {
        &self.instances
    }

    pub fn grid(&self) -> &SpatialHashGrid {
        &self.grid
    }
}

// ── Plugin ────────────────────────────────────────────────────────────────────

/// Generates the field at startup and keeps the wrapping offsets current.
///
/// Inserts [`AsteroidField`] plus fresh [`WrappingState`] and
/// [`CollisionQueryEngine`] resources sized from the [`FieldConfig`] in the
/// world.  `FieldConfig` itself is only initialised if absent, so tests and
/// `main` can insert their own first.
pub struct FieldPlugin;

impl Plugin for FieldPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<FieldConfig>()
            .init_resource::<WrappingState>()
            .init_resource::<CollisionQueryEngine>()
            .add_systems(Startup, generate_field_system.after(load_field_config))
            .add_systems(
                Update,
                update_wrapping_system.run_if(resource_exists::<AsteroidField>),
            );
    }
}

/// Startup system: build the field, or log the configuration error and exit.
pub fn generate_field_system(
    mut commands: Commands,
    config: Res<FieldConfig>,
    mut exit: MessageWriter<AppExit>,
) {
    match AsteroidField::generate(&config) {
        Ok(field) => {
            commands.insert_resource(WrappingState::new(config.box_size));
            commands.insert_resource(CollisionQueryEngine::new(config.box_query_margin));
            commands.insert_resource(field);
        }
        Err(e) => {
            error!("[field] generation failed: {e}");
            exit.write(AppExit::error());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config(seed: u64) -> FieldConfig {
        FieldConfig {
            box_size: 500.0,
            seed,
            num_variants: 4,
            num_lod_levels: 3,
            collision_lod: 1,
            render_lod: 2,
            ..Default::default()
        }
    }

    #[test]
    fn generated_instances_match_catalog() {
        let field = AsteroidField::generate(&small_config(3)).unwrap();
        assert!(!field.instances().is_empty());
        for inst in field.instances() {
            let variant = &field.catalog().variants[inst.variant];
            assert_eq!(inst.radius, variant.size);
            assert!((inst.rotation_axis.length() - 1.0).abs() < 1e-4);
            assert!(inst.rotation_speed.abs() <= crate::constants::MAX_ROTATION_SPEED);
        }
    }

    #[test]
    fn generation_is_reproducible_per_seed() {
        let a = AsteroidField::generate(&small_config(11)).unwrap();
        let b = AsteroidField::generate(&small_config(11)).unwrap();
        assert_eq!(a.instances(), b.instances());
    }

    #[test]
    fn invalid_config_is_reported() {
        let config = FieldConfig {
            num_variants: 0,
            ..small_config(1)
        };
        assert_eq!(
            AsteroidField::generate(&config).unwrap_err(),
            FieldError::EmptyCatalog
        );
    }

    #[test]
    fn unknown_variant_is_rejected() {
        let inst = AsteroidInstance {
            position: Vec3::splat(100.0),
            variant: 9,
            radius: 25.0,
            spacing: 5.0,
            rotation_axis: Vec3::X,
            initial_rotation: 0.0,
            rotation_speed: 0.0,
        };
        assert!(matches!(
            AsteroidField::from_instances(&small_config(1), vec![inst]),
            Err(FieldError::UnknownVariant { variant: 9, .. })
        ));
    }

    #[test]
    fn rotation_matrix_follows_spin() {
        let inst = AsteroidInstance {
            position: Vec3::ZERO,
            variant: 0,
            radius: 1.0,
            spacing: 0.0,
            rotation_axis: Vec3::Z,
            initial_rotation: 0.0,
            rotation_speed: std::f32::consts::FRAC_PI_2,
        };
        let rotated = inst.rotation_matrix(1.0).transform_point3(Vec3::X);
        assert!((rotated - Vec3::Y).length() < 1e-5);
        assert!((inst.rotation(1.0) * Vec3::X - Vec3::Y).length() < 1e-5);
    }
}
