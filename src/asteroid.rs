//! Procedural asteroid variants and the shared vertex buffer they live in.
//!
//! A fixed catalog of rock shapes ("variants") is synthesised once at startup
//! by pushing every vertex of every sphere LOD in or out along its direction
//! according to two noise fields.  All variants share one flat vertex buffer
//! and one index buffer, so the renderer can draw any variant at any LOD with
//! a single `(IndexRange, VertexRange)` pair and a base-vertex offset.
//!
//! ## Buffer layout
//!
//! ```text
//! vertices: [ v0 lod0 | v0 lod1 | … | v0 lodN | v1 lod0 | … ]
//! indices:  [ lod0 triangles | lod1 triangles | … ]   (shared by all variants)
//! ```
//!
//! Indices are 16-bit and relative to the start of a variant's LOD range.

use crate::config::FieldConfig;
use crate::error::{FieldError, FieldResult};
use crate::noise_field::NoiseFieldSampler;
use crate::sphere::SphereLodMesh;
use bevy::prelude::*;
use rand::Rng;

/// Squared length below which an accumulated normal is left at zero.
const NORMAL_EPSILON: f32 = 1e-6;

/// One GPU-ready asteroid vertex: position plus a packed normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AsteroidVertex {
    pub position: Vec3,
    /// Signed byte per component (x in the low byte), see [`pack_normal`].
    pub normal: u32,
}

/// A contiguous run of vertices inside [`AsteroidCatalog::vertices`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexRange {
    pub offset: u32,
    pub count: u32,
}

impl VertexRange {
    pub fn as_range(&self) -> std::ops::Range<usize> {
        self.offset as usize..(self.offset + self.count) as usize
    }
}

/// A contiguous run of indices inside [`AsteroidCatalog::indices`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexRange {
    pub first: u32,
    pub count: u32,
}

impl IndexRange {
    pub fn as_range(&self) -> std::ops::Range<usize> {
        self.first as usize..(self.first + self.count) as usize
    }
}

/// One procedurally generated rock shape.
#[derive(Debug, Clone)]
pub struct AsteroidVariant {
    /// Outer radius in world units; every vertex lies within it.
    pub size: f32,
    /// Fraction of `size` no vertex dips below.
    pub inner_radius: f32,
    /// Where each LOD of this variant lives in the shared vertex buffer.
    pub lods: Vec<VertexRange>,
    /// Vertex positions at the collision LOD, in variant-local space.
    pub collision_vertices: Vec<Vec3>,
}

impl AsteroidVariant {
    /// Offset of this variant's first vertex (start of its LOD 0 range).
    pub fn first_lod_first_vertex(&self) -> u32 {
        self.lods[0].offset
    }
}

/// The full variant catalog plus the buffers shared by every variant.
#[derive(Debug, Clone)]
pub struct AsteroidCatalog {
    pub variants: Vec<AsteroidVariant>,
    pub vertices: Vec<AsteroidVertex>,
    pub indices: Vec<u16>,
    /// Index range of each sphere LOD inside `indices`.
    pub lod_indices: Vec<IndexRange>,
}

impl AsteroidCatalog {
    /// Synthesise `config.num_variants` variants from `sphere`.
    ///
    /// Draws from `rng` in a fixed order per variant (inner radius, size,
    /// giant roll, two noise seeds), so the catalog is reproducible from one
    /// master seed.
    pub fn generate(
        rng: &mut impl Rng,
        sphere: &SphereLodMesh,
        config: &FieldConfig,
    ) -> FieldResult<Self> {
        if config.num_variants == 0 {
            return Err(FieldError::EmptyCatalog);
        }
        let collision_lod = config.collision_lod.min(sphere.num_levels() - 1);

        let mut indices = Vec::new();
        let mut lod_indices = Vec::with_capacity(sphere.num_levels());
        for (lod, level) in sphere.levels().iter().enumerate() {
            // Indices are local to a LOD range, so only the vertex count matters.
            if level.vertices.len() > u16::MAX as usize + 1 {
                return Err(FieldError::IndexOverflow {
                    lod,
                    vertex_count: level.vertices.len(),
                });
            }
            let first = indices.len() as u32;
            indices.extend(level.triangles.iter().flatten().map(|&i| i as u16));
            lod_indices.push(IndexRange {
                first,
                count: indices.len() as u32 - first,
            });
        }

        let mut vertices = Vec::new();
        let mut variants = Vec::with_capacity(config.num_variants);
        for _ in 0..config.num_variants {
            variants.push(generate_variant(
                &mut *rng,
                sphere,
                config,
                collision_lod,
                &mut vertices,
            ));
        }

        Ok(Self {
            variants,
            vertices,
            indices,
            lod_indices,
        })
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    /// Vertices of `variant` at `lod`.
    pub fn variant_vertices(&self, variant: usize, lod: usize) -> &[AsteroidVertex] {
        &self.vertices[self.variants[variant].lods[lod].as_range()]
    }

    /// Triangle indices of `lod`, relative to the start of a variant's range.
    pub fn lod_indices(&self, lod: usize) -> &[u16] {
        &self.indices[self.lod_indices[lod].as_range()]
    }

    /// Largest variant size in the catalog.
    pub fn max_size(&self) -> f32 {
        self.variants.iter().map(|v| v.size).fold(0.0, f32::max)
    }
}

fn generate_variant(
    rng: &mut impl Rng,
    sphere: &SphereLodMesh,
    config: &FieldConfig,
    collision_lod: usize,
    vertices: &mut Vec<AsteroidVertex>,
) -> AsteroidVariant {
    let inner_radius = rng.gen_range(config.inner_radius_min..=config.inner_radius_max);
    let mut size = rng.gen_range(config.asteroid_size_min..=config.asteroid_size_max);
    if rng.gen_bool(config.giant_chance.clamp(0.0, 1.0)) {
        size *= config.giant_scale;
    }
    let sampler = NoiseFieldSampler::new(rng.gen(), rng.gen(), config);

    let mut lods = Vec::with_capacity(sphere.num_levels());
    let mut collision_vertices = Vec::new();

    for (lod, level) in sphere.levels().iter().enumerate() {
        let first = vertices.len();
        vertices.extend(level.vertices.iter().map(|&unit| {
            let scaled = unit * size;
            AsteroidVertex {
                position: scaled * sampler.radius_factor(scaled, inner_radius),
                normal: 0,
            }
        }));
        calculate_normals(&mut vertices[first..], &level.triangles);

        if lod == collision_lod {
            collision_vertices.extend(vertices[first..].iter().map(|v| v.position));
        }
        lods.push(VertexRange {
            offset: first as u32,
            count: (vertices.len() - first) as u32,
        });
    }

    AsteroidVariant {
        size,
        inner_radius,
        lods,
        collision_vertices,
    }
}

/// Smooth per-vertex normals from the area-independent sum of face normals.
///
/// Vertices whose accumulated normal is (near) zero keep a zero normal rather
/// than a NaN.
pub fn calculate_normals(vertices: &mut [AsteroidVertex], triangles: &[[u32; 3]]) {
    let mut normals = vec![Vec3::ZERO; vertices.len()];
    for &[a, b, c] in triangles {
        let origin = vertices[a as usize].position;
        let d1 = vertices[b as usize].position - origin;
        let d2 = vertices[c as usize].position - origin;
        let face = d1.normalize_or_zero().cross(d2.normalize_or_zero()).normalize_or_zero();
        for i in [a, b, c] {
            normals[i as usize] += face;
        }
    }
    for (vertex, normal) in vertices.iter_mut().zip(normals) {
        vertex.normal = if normal.length_squared() > NORMAL_EPSILON {
            pack_normal(normal.normalize())
        } else {
            0
        };
    }
}

/// Pack a unit vector into three signed bytes (x lowest).
pub fn pack_normal(normal: Vec3) -> u32 {
    normal
        .to_array()
        .iter()
        .enumerate()
        .fold(0u32, |packed, (i, &c)| {
            let byte = ((c * 127.0) as i32).clamp(-127, 127) as i8 as u8;
            packed | (byte as u32) << (i * 8)
        })
}

/// Inverse of [`pack_normal`] (lossy to 1/127 per component).
pub fn unpack_normal(packed: u32) -> Vec3 {
    let component = |i: u32| ((packed >> (i * 8)) as u8 as i8) as f32 / 127.0;
    Vec3::new(component(0), component(1), component(2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn small_catalog(num_variants: usize) -> (AsteroidCatalog, SphereLodMesh) {
        let config = FieldConfig {
            num_variants,
            ..Default::default()
        };
        let sphere = SphereLodMesh::generate(config.num_lod_levels);
        let mut rng = StdRng::seed_from_u64(11);
        let catalog = AsteroidCatalog::generate(&mut rng, &sphere, &config).unwrap();
        (catalog, sphere)
    }

    #[test]
    fn finest_lod_beyond_16_bit_indices_is_rejected() {
        let config = FieldConfig::default();
        let sphere = SphereLodMesh::generate(8);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            AsteroidCatalog::generate(&mut rng, &sphere, &config).unwrap_err(),
            FieldError::IndexOverflow {
                lod: 7,
                vertex_count: 163_842,
            }
        );
    }

    #[test]
    fn vertices_stay_between_inner_floor_and_size() {
        let (catalog, _) = small_catalog(8);
        for variant in &catalog.variants {
            for range in &variant.lods {
                for v in &catalog.vertices[range.as_range()] {
                    let r = v.position.length();
                    assert!(r >= variant.inner_radius * variant.size - 1e-3);
                    assert!(r <= variant.size + 1e-3);
                }
            }
        }
    }

    #[test]
    fn ranges_tile_the_vertex_buffer() {
        let (catalog, sphere) = small_catalog(4);
        let mut expected_offset = 0;
        for variant in &catalog.variants {
            assert_eq!(variant.first_lod_first_vertex(), expected_offset);
            for (lod, range) in variant.lods.iter().enumerate() {
                assert_eq!(range.offset, expected_offset);
                assert_eq!(range.count as usize, sphere.level(lod).vertices.len());
                expected_offset += range.count;
            }
        }
        assert_eq!(expected_offset as usize, catalog.vertices.len());
    }

    #[test]
    fn collision_vertices_match_collision_lod() {
        let (catalog, _) = small_catalog(3);
        let config = FieldConfig::default();
        for (i, variant) in catalog.variants.iter().enumerate() {
            let lod = catalog.variant_vertices(i, config.collision_lod);
            assert_eq!(variant.collision_vertices.len(), lod.len());
            assert_eq!(variant.collision_vertices[0], lod[0].position);
        }
    }

    #[test]
    fn sizes_fall_in_normal_or_giant_band() {
        let (catalog, _) = small_catalog(40);
        for variant in &catalog.variants {
            let normal = (20.0..=30.0).contains(&variant.size);
            let giant = (40.0..=60.0).contains(&variant.size);
            assert!(normal || giant, "size {}", variant.size);
            assert!((0.4..=0.5).contains(&variant.inner_radius));
        }
        assert!(catalog.max_size() <= 60.0);
    }

    #[test]
    fn index_ranges_cover_each_lod() {
        let (catalog, sphere) = small_catalog(1);
        for lod in 0..sphere.num_levels() {
            assert_eq!(
                catalog.lod_indices(lod).len(),
                sphere.level(lod).triangles.len() * 3
            );
        }
    }

    #[test]
    fn same_seed_gives_same_catalog() {
        let (a, _) = small_catalog(5);
        let (b, _) = small_catalog(5);
        assert_eq!(a.vertices, b.vertices);
    }

    #[test]
    fn normals_point_outward() {
        let (catalog, _) = small_catalog(2);
        let vertices = catalog.variant_vertices(0, 2);
        let outward = vertices
            .iter()
            .filter(|v| unpack_normal(v.normal).dot(v.position) > 0.0)
            .count();
        assert!(outward * 4 >= vertices.len() * 3);
    }

    #[test]
    fn degenerate_triangle_leaves_zero_normal() {
        let mut vertices = vec![
            AsteroidVertex {
                position: Vec3::ONE,
                normal: 7,
            };
            3
        ];
        calculate_normals(&mut vertices, &[[0, 1, 2]]);
        assert!(vertices.iter().all(|v| v.normal == 0));
    }

    #[test]
    fn pack_normal_round_trips_axes() {
        for axis in [Vec3::X, Vec3::NEG_Y, Vec3::Z] {
            assert!((unpack_normal(pack_normal(axis)) - axis).length() < 0.01);
        }
    }

    #[test]
    fn zero_variants_is_an_error() {
        let config = FieldConfig {
            num_variants: 0,
            ..Default::default()
        };
        let sphere = SphereLodMesh::generate(1);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            AsteroidCatalog::generate(&mut rng, &sphere, &config).unwrap_err(),
            FieldError::EmptyCatalog
        );
    }
}
