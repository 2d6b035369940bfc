//! Mesh3d rendering for the asteroid field and the target checkpoints.
//!
//! Every variant gets one retained GPU mesh built from the catalog at the
//! configured render LOD, and every placed instance gets one entity sharing
//! its variant's mesh.  Bevy batches entities that share a mesh and material,
//! so the per-instance cost is a transform write.
//!
//! ## Per-frame sync
//!
//! | System                            | Writes                                         |
//! |-----------------------------------|------------------------------------------------|
//! | `sync_asteroid_transforms_system` | wrapped position, spin, distance visibility     |
//! | `sync_target_visuals_system`      | target position, spin, fade alpha               |
//!
//! Both run after the session update, once the wrapping window sits on the
//! ship's final position for the frame.

use crate::asteroid::{unpack_normal, AsteroidCatalog};
use crate::config::FieldConfig;
use crate::constants::TARGET_SPHERE_LOD;
use crate::field::AsteroidField;
use crate::game::GameSession;
use crate::sphere::SphereLodMesh;
use crate::wrapping::{WrapFocus, WrappingState};
use bevy::prelude::*;
use bevy_asset::RenderAssetUsages;
use bevy_mesh::{Indices, PrimitiveTopology};

/// Distinct rock materials shared round-robin across variants.
const ROCK_MATERIALS: u32 = 8;

/// Spin of each target sphere: (axis, radians per second).
const TARGET_SPINS: [(Vec3, f32); 3] = [(Vec3::X, 0.1), (Vec3::Y, 0.2), (Vec3::Z, -0.1)];

/// Links a rendered entity to its instance in [`AsteroidField::instances`].
#[derive(Component, Debug, Clone, Copy)]
pub struct AsteroidVisual {
    pub instance: u32,
}

/// Links a rendered sphere to a slot of [`GameSession::targets`].
#[derive(Component, Debug, Clone, Copy)]
pub struct TargetVisual {
    pub slot: usize,
}

// ── Geometry helpers ──────────────────────────────────────────────────────────

/// Build the renderable mesh of `variant` at `lod`.
///
/// Vertex normals come from the catalog's packed normals; indices are the
/// shared per-LOD 16-bit index list.
pub fn variant_mesh(catalog: &AsteroidCatalog, variant: usize, lod: usize) -> Mesh {
    let vertices = catalog.variant_vertices(variant, lod);
    let positions: Vec<[f32; 3]> = vertices.iter().map(|v| v.position.to_array()).collect();
    let normals: Vec<[f32; 3]> = vertices
        .iter()
        .map(|v| unpack_normal(v.normal).normalize_or_zero().to_array())
        .collect();

    let mut mesh = Mesh::new(
        PrimitiveTopology::TriangleList,
        RenderAssetUsages::RENDER_WORLD,
    );
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
    mesh.insert_indices(Indices::U16(catalog.lod_indices(lod).to_vec()));
    mesh
}

/// A sphere of `radius` from the shared LOD hierarchy.
pub fn sphere_mesh(sphere: &SphereLodMesh, lod: usize, radius: f32) -> Mesh {
    let level = sphere.level(lod);
    let positions: Vec<[f32; 3]> = level
        .vertices
        .iter()
        .map(|v| (*v * radius).to_array())
        .collect();
    let normals: Vec<[f32; 3]> = level.vertices.iter().map(|v| v.to_array()).collect();
    let indices: Vec<u32> = level.triangles.iter().flatten().copied().collect();

    let mut mesh = Mesh::new(
        PrimitiveTopology::TriangleList,
        RenderAssetUsages::RENDER_WORLD,
    );
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
    mesh.insert_indices(Indices::U32(indices));
    mesh
}

/// Generate a rocky grey-brown tone seeded by an index.
///
/// Palette: luminance 0.18–0.36 with a slight warm/cool tint variation.
fn rock_color(seed: u32) -> Color {
    // Knuth multiplicative hash → 0.0–1.0
    let h = seed.wrapping_mul(2_654_435_761).wrapping_add(0xDEAD_BEEF);
    let t = (h & 0xFFFF) as f32 / 65_535.0;

    let lum = 0.18 + t * 0.18;
    let r = (lum + t * 0.06).min(1.0);
    let g = (lum + t * 0.02).min(1.0);
    let b = (lum.max(0.14) - t * 0.03).max(0.0);
    Color::srgb(r, g, b)
}

// ── Startup ───────────────────────────────────────────────────────────────────

/// Spawn one entity per asteroid instance plus the three target spheres.
///
/// Instances start hidden; the first transform sync reveals the ones within
/// render distance.
pub fn spawn_field_visuals_system(
    mut commands: Commands,
    field: Option<Res<AsteroidField>>,
    config: Res<FieldConfig>,
    session: Res<GameSession>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let Some(field) = field else {
        return;
    };
    let catalog = field.catalog();
    let lod = config.render_lod.min(field.sphere().num_levels() - 1);

    let variant_meshes: Vec<Handle<Mesh>> = (0..catalog.len())
        .map(|variant| meshes.add(variant_mesh(catalog, variant, lod)))
        .collect();
    let rock_materials: Vec<Handle<StandardMaterial>> = (0..ROCK_MATERIALS)
        .map(|i| {
            materials.add(StandardMaterial {
                base_color: rock_color(i),
                perceptual_roughness: 0.95,
                ..default()
            })
        })
        .collect();

    for (index, instance) in field.instances().iter().enumerate() {
        commands.spawn((
            AsteroidVisual {
                instance: index as u32,
            },
            Mesh3d(variant_meshes[instance.variant].clone()),
            MeshMaterial3d(rock_materials[instance.variant % rock_materials.len()].clone()),
            Transform::from_translation(instance.position),
            Visibility::Hidden,
        ));
    }

    let target_lod = TARGET_SPHERE_LOD.min(field.sphere().num_levels() - 1);
    let target_mesh = meshes.add(sphere_mesh(field.sphere(), target_lod, config.target_radius));
    for (slot, target) in session.targets.iter().enumerate() {
        let color = target.kind.color();
        let material = materials.add(StandardMaterial {
            base_color: color.with_alpha(0.0),
            emissive: color.to_linear() * 2.0,
            alpha_mode: AlphaMode::Blend,
            unlit: true,
            ..default()
        });
        commands.spawn((
            TargetVisual { slot },
            Mesh3d(target_mesh.clone()),
            MeshMaterial3d(material),
            Transform::from_translation(target.position),
            Visibility::Hidden,
        ));
    }

    info!(
        "[render] {} asteroid entities over {} variant meshes at LOD {}",
        field.instances().len(),
        variant_meshes.len(),
        lod
    );
}

// ── Update ────────────────────────────────────────────────────────────────────

/// Place every instance at its wrapped visible position with its current spin,
/// hiding the ones beyond render distance.
pub fn sync_asteroid_transforms_system(
    field: Res<AsteroidField>,
    wrapping: Res<WrappingState>,
    session: Res<GameSession>,
    config: Res<FieldConfig>,
    focus: Query<&Transform, (With<WrapFocus>, Without<AsteroidVisual>)>,
    mut visuals: Query<(&AsteroidVisual, &mut Transform, &mut Visibility)>,
) {
    let Ok(focus) = focus.single() else {
        return;
    };
    let center = focus.translation;
    let max_dist_sq = config.render_distance * config.render_distance;
    let instances = field.instances();

    for (visual, mut transform, mut visibility) in visuals.iter_mut() {
        let instance = &instances[visual.instance as usize];
        let visible = wrapping.visible_position(instance.position);
        if visible.distance_squared(center) > max_dist_sq {
            visibility.set_if_neq(Visibility::Hidden);
            continue;
        }
        visibility.set_if_neq(Visibility::Inherited);
        transform.translation = visible;
        transform.rotation = instance.rotation(session.elapsed);
    }
}

/// Move target spheres to their session positions and fade them.
pub fn sync_target_visuals_system(
    session: Res<GameSession>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut visuals: Query<(
        &TargetVisual,
        &mut Transform,
        &mut Visibility,
        &MeshMaterial3d<StandardMaterial>,
    )>,
) {
    let alpha = session.targets_alpha.clamp(0.0, 1.0);
    for (visual, mut transform, mut visibility, material) in visuals.iter_mut() {
        let Some(target) = session.targets.get(visual.slot) else {
            continue;
        };
        let (axis, speed) = TARGET_SPINS[visual.slot % TARGET_SPINS.len()];
        transform.translation = target.position;
        transform.rotation = Quat::from_axis_angle(axis, session.elapsed * speed);

        if alpha <= 0.0 {
            visibility.set_if_neq(Visibility::Hidden);
            continue;
        }
        visibility.set_if_neq(Visibility::Inherited);
        if let Some(mat) = materials.get_mut(&material.0) {
            mat.base_color = target.kind.color().with_alpha(alpha * 0.6);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_mesh::VertexAttributeValues;

    fn small_field() -> AsteroidField {
        let config = FieldConfig {
            box_size: 400.0,
            num_variants: 2,
            num_lod_levels: 3,
            collision_lod: 1,
            render_lod: 2,
            ..Default::default()
        };
        AsteroidField::from_instances(&config, Vec::new()).unwrap()
    }

    #[test]
    fn variant_mesh_matches_catalog_lod() {
        let field = small_field();
        let mesh = variant_mesh(field.catalog(), 1, 2);
        let expected_vertices = field.catalog().variant_vertices(1, 2).len();
        match mesh.attribute(Mesh::ATTRIBUTE_POSITION) {
            Some(VertexAttributeValues::Float32x3(p)) => assert_eq!(p.len(), expected_vertices),
            other => panic!("unexpected position attribute: {other:?}"),
        }
        assert_eq!(
            mesh.indices().map(|i| i.len()),
            Some(field.catalog().lod_indices(2).len())
        );
    }

    #[test]
    fn sphere_mesh_has_requested_radius() {
        let sphere = SphereLodMesh::generate(2);
        let mesh = sphere_mesh(&sphere, 1, 30.0);
        let Some(VertexAttributeValues::Float32x3(p)) = mesh.attribute(Mesh::ATTRIBUTE_POSITION)
        else {
            panic!("missing positions");
        };
        for v in p {
            assert!((Vec3::from(*v).length() - 30.0).abs() < 1e-3);
        }
        assert_eq!(mesh.indices().map(|i| i.len()), Some(80 * 3));
    }
}
