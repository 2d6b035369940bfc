//! Subdivided icosahedron meshes, one per level of detail.
//!
//! Level 0 is the regular icosahedron (12 vertices, 20 triangles).  Every
//! further level splits each triangle into four through its edge midpoints.
//! Midpoints are shared between the two triangles of an edge, and every level
//! keeps the previous level's vertices at the same indices, so level `k` is an
//! index-compatible superset of level `k - 1`.
//!
//! The hierarchy is generated once and shared read-only by the asteroid
//! variants and by the target checkpoint spheres.

use bevy::prelude::*;
use std::collections::HashMap;

const ICOSAHEDRON_VERTICES: [[f32; 3]; 12] = [
    [0.000000, -1.000000, 0.000000],
    [0.723600, -0.447215, 0.525720],
    [-0.276385, -0.447215, 0.850640],
    [-0.894425, -0.447215, 0.000000],
    [-0.276385, -0.447215, -0.850640],
    [0.723600, -0.447215, -0.525720],
    [0.276385, 0.447215, 0.850640],
    [-0.723600, 0.447215, 0.525720],
    [-0.723600, 0.447215, -0.525720],
    [0.276385, 0.447215, -0.850640],
    [0.894425, 0.447215, 0.000000],
    [0.000000, 1.000000, 0.000000],
];

const ICOSAHEDRON_TRIANGLES: [[u32; 3]; 20] = [
    [0, 1, 2],
    [1, 0, 5],
    [0, 2, 3],
    [0, 3, 4],
    [0, 4, 5],
    [1, 5, 10],
    [2, 1, 6],
    [3, 2, 7],
    [4, 3, 8],
    [5, 4, 9],
    [1, 10, 6],
    [2, 6, 7],
    [3, 7, 8],
    [4, 8, 9],
    [5, 9, 10],
    [6, 10, 11],
    [7, 6, 11],
    [8, 7, 11],
    [9, 8, 11],
    [10, 9, 11],
];

/// One level of the hierarchy: unit-sphere vertices and triangle indices.
#[derive(Debug, Clone)]
pub struct SphereLod {
    pub vertices: Vec<Vec3>,
    pub triangles: Vec<[u32; 3]>,
}

/// The full LOD hierarchy, level 0 (coarsest) first.
#[derive(Debug, Clone)]
pub struct SphereLodMesh {
    levels: Vec<SphereLod>,
}

impl SphereLodMesh {
    /// Build `num_levels` levels.  Pure function of `num_levels`.
    ///
    /// # Panics
    /// If `num_levels` is zero.
    pub fn generate(num_levels: usize) -> Self {
        assert!(num_levels >= 1, "sphere mesh needs at least one LOD level");

        let mut levels = Vec::with_capacity(num_levels);
        levels.push(SphereLod {
            vertices: ICOSAHEDRON_VERTICES.iter().map(|&v| Vec3::from(v)).collect(),
            triangles: ICOSAHEDRON_TRIANGLES.to_vec(),
        });
        for lod in 1..num_levels {
            let next = subdivide(&levels[lod - 1]);
            levels.push(next);
        }
        Self { levels }
    }

    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    pub fn levels(&self) -> &[SphereLod] {
        &self.levels
    }

    /// Level `lod`.  Panics on an out-of-range level like slice indexing.
    pub fn level(&self, lod: usize) -> &SphereLod {
        &self.levels[lod]
    }
}

/// Split every triangle of `prev` into four through memoized edge midpoints.
fn subdivide(prev: &SphereLod) -> SphereLod {
    let mut vertices = prev.vertices.clone();
    let mut triangles = Vec::with_capacity(prev.triangles.len() * 4);
    // Keyed by (min, max) so both windings of an edge share one midpoint.
    let mut midpoints: HashMap<(u32, u32), u32> = HashMap::new();

    let mut midpoint = |a: u32, b: u32, vertices: &mut Vec<Vec3>| -> u32 {
        let key = (a.min(b), a.max(b));
        *midpoints.entry(key).or_insert_with(|| {
            let id = vertices.len() as u32;
            let mid = (prev.vertices[a as usize] + prev.vertices[b as usize]).normalize();
            vertices.push(mid);
            id
        })
    };

    for &[a, b, c] in &prev.triangles {
        let ab = midpoint(a, b, &mut vertices);
        let bc = midpoint(b, c, &mut vertices);
        let ca = midpoint(c, a, &mut vertices);
        triangles.push([a, ab, ca]);
        triangles.push([ab, b, bc]);
        triangles.push([ca, bc, c]);
        triangles.push([ab, bc, ca]);
    }

    SphereLod {
        vertices,
        triangles,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn distinct_edges(lod: &SphereLod) -> usize {
        let mut edges = HashSet::new();
        for &[a, b, c] in &lod.triangles {
            for (x, y) in [(a, b), (b, c), (c, a)] {
                edges.insert((x.min(y), x.max(y)));
            }
        }
        edges.len()
    }

    #[test]
    fn level_zero_is_icosahedron() {
        let mesh = SphereLodMesh::generate(1);
        assert_eq!(mesh.level(0).vertices.len(), 12);
        assert_eq!(mesh.level(0).triangles.len(), 20);
        assert_eq!(distinct_edges(mesh.level(0)), 30);
    }

    #[test]
    fn triangle_count_quadruples() {
        let mesh = SphereLodMesh::generate(5);
        for (k, level) in mesh.levels().iter().enumerate() {
            assert_eq!(level.triangles.len(), 20 * 4usize.pow(k as u32));
        }
    }

    #[test]
    fn one_new_vertex_per_parent_edge() {
        let mesh = SphereLodMesh::generate(5);
        for k in 1..mesh.num_levels() {
            let prev = mesh.level(k - 1);
            assert_eq!(
                mesh.level(k).vertices.len(),
                prev.vertices.len() + distinct_edges(prev),
                "V_k = V_(k-1) + E_(k-1) at level {k}"
            );
        }
    }

    #[test]
    fn levels_are_index_supersets() {
        let mesh = SphereLodMesh::generate(4);
        for k in 1..mesh.num_levels() {
            let prev = &mesh.level(k - 1).vertices;
            assert_eq!(&mesh.level(k).vertices[..prev.len()], &prev[..]);
        }
    }

    #[test]
    fn vertices_lie_on_unit_sphere() {
        let mesh = SphereLodMesh::generate(4);
        for level in mesh.levels() {
            for v in &level.vertices {
                assert!((v.length() - 1.0).abs() < 1e-4, "{v:?} off the sphere");
            }
        }
    }

    #[test]
    #[should_panic]
    fn zero_levels_panics() {
        let _ = SphereLodMesh::generate(0);
    }
}
