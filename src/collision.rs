//! Collision queries against the asteroid field.
//!
//! Two read-only queries, both driven by the
//! [`SpatialHashGrid`](crate::spatial_partition::SpatialHashGrid) and the
//! current [`WrappingState`]:
//!
//! | Query                     | Used for                    | Exact test                         |
//! |---------------------------|-----------------------------|------------------------------------|
//! | [`any_sphere_intersects`] | spawn points, target spots  | sphere vs instance radius          |
//! | [`any_box_intersects`]    | ship hull each sub-step     | collision vertices inside the box  |
//!
//! Instances are always tested at their *visible* position, never at the
//! stored one.  Because visible and stored positions are congruent modulo the
//! box size, world-space query points index the toroidal grid directly.
//! Queries far from the camera (more than half a box away) should pass a
//! [`WrappingState::centered_on`] the query point instead of the frame state.
//!
//! ## Deduplication
//!
//! An instance appears in up to 64 cells, so a query may meet it several
//! times.  The engine keeps one stamp per instance and a generation counter:
//! an instance is tested only when its stamp differs from the current
//! generation.  Starting a query bumps the counter; the stamp array is only
//! zeroed when the counter wraps.
//!
//! [`any_sphere_intersects`]: CollisionQueryEngine::any_sphere_intersects
//! [`any_box_intersects`]: CollisionQueryEngine::any_box_intersects

use crate::constants::BOX_QUERY_MARGIN;
use crate::field::AsteroidField;
use crate::wrapping::WrappingState;
use bevy::prelude::*;

/// A box in its own rotated frame plus the matrices to and from world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientedBox {
    pub local_min: Vec3,
    pub local_max: Vec3,
    pub box_to_world: Mat4,
    pub world_to_box: Mat4,
}

impl OrientedBox {
    pub fn new(local_min: Vec3, local_max: Vec3, box_to_world: Mat4) -> Self {
        Self {
            local_min,
            local_max,
            box_to_world,
            world_to_box: box_to_world.inverse(),
        }
    }

    /// Box of `half_extents` centred on `translation` and rotated by `rotation`.
    pub fn centered(half_extents: Vec3, rotation: Quat, translation: Vec3) -> Self {
        Self::new(
            -half_extents,
            half_extents,
            Mat4::from_rotation_translation(rotation, translation),
        )
    }

    /// The eight corners in world space.
    pub fn world_corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.local_min, self.local_max);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(a.x, b.y, b.z),
            Vec3::new(b.x, b.y, b.z),
        ]
        .map(|c| self.box_to_world.transform_point3(c))
    }

    /// World-space sphere enclosing the box: `(center, radius)`.
    pub fn bounding_sphere(&self) -> (Vec3, f32) {
        let center = self
            .box_to_world
            .transform_point3((self.local_min + self.local_max) * 0.5);
        let corner = self.box_to_world.transform_point3(self.local_max);
        (center, center.distance(corner))
    }

    /// World-space AABB `(min, max)` of the transformed corners.
    pub fn world_aabb(&self) -> (Vec3, Vec3) {
        let corners = self.world_corners();
        corners[1..]
            .iter()
            .fold((corners[0], corners[0]), |(lo, hi), &c| (lo.min(c), hi.max(c)))
    }

    /// Strict containment of a box-local point.
    pub fn contains_local(&self, point: Vec3) -> bool {
        point.cmpgt(self.local_min).all() && point.cmplt(self.local_max).all()
    }
}

/// Reusable scratch for field queries.
#[derive(Resource, Debug, Clone)]
pub struct CollisionQueryEngine {
    stamps: Vec<u32>,
    generation: u32,
    box_margin: f32,
    /// Instances given an exact test since the last reset; a profiling aid.
    tested: u64,
}

impl Default for CollisionQueryEngine {
    fn default() -> Self {
        Self::new(BOX_QUERY_MARGIN)
    }
}

impl CollisionQueryEngine {
    /// `box_margin` pads the box query's world AABB before cell lookup.
    pub fn new(box_margin: f32) -> Self {
        Self {
            stamps: Vec::new(),
            generation: 0,
            box_margin,
            tested: 0,
        }
    }

    pub fn tested_count(&self) -> u64 {
        self.tested
    }

    pub fn reset_stats(&mut self) {
        self.tested = 0;
    }

    fn begin_query(&mut self, instance_count: usize) {
        if self.stamps.len() != instance_count {
            self.stamps.clear();
            self.stamps.resize(instance_count, 0);
            self.generation = 0;
        }
        self.generation = self.generation.wrapping_add(1);
        if self.generation == 0 {
            self.stamps.fill(0);
            self.generation = 1;
        }
    }

    /// Mark `index` as seen; false if it was already seen this query.
    fn first_visit(&mut self, index: u32) -> bool {
        let stamp = &mut self.stamps[index as usize];
        if *stamp == self.generation {
            return false;
        }
        *stamp = self.generation;
        self.tested += 1;
        true
    }

    /// True if any instance's bounding sphere overlaps the query sphere.
    pub fn any_sphere_intersects(
        &mut self,
        field: &AsteroidField,
        wrapping: &WrappingState,
        pos: Vec3,
        radius: f32,
    ) -> bool {
        let instances = field.instances();
        let grid = field.grid();
        self.begin_query(instances.len());

        for cell in grid.cells_overlapping(pos, radius) {
            for &index in grid.cell(cell) {
                if !self.first_visit(index) {
                    continue;
                }
                let instance = &instances[index as usize];
                let visible = wrapping.visible_position(instance.position);
                let reach = instance.radius + radius;
                if visible.distance_squared(pos) < reach * reach {
                    return true;
                }
            }
        }
        false
    }

    /// True if any instance's collision vertex lies strictly inside `query`.
    ///
    /// `elapsed` is the session time driving instance spin.
    pub fn any_box_intersects(
        &mut self,
        field: &AsteroidField,
        wrapping: &WrappingState,
        query: &OrientedBox,
        elapsed: f32,
    ) -> bool {
        let instances = field.instances();
        let variants = &field.catalog().variants;
        let grid = field.grid();
        self.begin_query(instances.len());

        let (center, sphere_radius) = query.bounding_sphere();
        let (min, max) = query.world_aabb();
        let margin = Vec3::splat(self.box_margin);

        for cell in grid.cells_overlapping_aabb(min - margin, max + margin) {
            for &index in grid.cell(cell) {
                if !self.first_visit(index) {
                    continue;
                }
                let instance = &instances[index as usize];
                let visible = wrapping.visible_position(instance.position);

                // Coarse sphere-vs-sphere reject.
                let reach = instance.radius + sphere_radius;
                if visible.distance_squared(center) >= reach * reach {
                    continue;
                }

                let to_box = query.world_to_box
                    * Mat4::from_translation(visible)
                    * instance.rotation_matrix(elapsed);
                let hit = variants[instance.variant]
                    .collision_vertices
                    .iter()
                    .any(|&v| query.contains_local(to_box.transform_point3(v)));
                if hit {
                    return true;
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FieldConfig;
    use crate::field::AsteroidInstance;

    const B: f32 = 400.0;

    fn single_rock_field(position: Vec3, rotation_speed: f32) -> AsteroidField {
        let config = FieldConfig {
            box_size: B,
            num_variants: 1,
            num_lod_levels: 3,
            collision_lod: 2,
            render_lod: 2,
            asteroid_size_min: 25.0,
            asteroid_size_max: 25.0,
            giant_chance: 0.0,
            ..Default::default()
        };
        let instance = AsteroidInstance {
            position,
            variant: 0,
            radius: 25.0,
            spacing: 10.0,
            rotation_axis: Vec3::Z,
            initial_rotation: 0.0,
            rotation_speed,
        };
        AsteroidField::from_instances(&config, vec![instance]).unwrap()
    }

    #[test]
    fn sphere_query_hits_and_misses() {
        let field = single_rock_field(Vec3::splat(200.0), 0.0);
        let wrapping = WrappingState::centered_on(B, Vec3::splat(200.0));
        let mut engine = CollisionQueryEngine::default();
        assert!(engine.any_sphere_intersects(&field, &wrapping, Vec3::splat(200.0), 1.0));
        assert!(engine.any_sphere_intersects(&field, &wrapping, Vec3::new(200.0, 200.0, 228.0), 5.0));
        assert!(!engine.any_sphere_intersects(&field, &wrapping, Vec3::new(200.0, 200.0, 260.0), 5.0));
    }

    #[test]
    fn sphere_query_sees_wrapped_copy() {
        // Rock stored near the low corner; camera near the high corner.
        let field = single_rock_field(Vec3::splat(10.0), 0.0);
        let camera = Vec3::splat(390.0);
        let wrapping = WrappingState::centered_on(B, camera);
        let mut engine = CollisionQueryEngine::default();
        assert!(engine.any_sphere_intersects(&field, &wrapping, Vec3::splat(410.0), 1.0));
        assert!(!engine.any_sphere_intersects(&field, &wrapping, Vec3::splat(10.0), 1.0));
    }

    #[test]
    fn box_around_rock_hits() {
        let field = single_rock_field(Vec3::splat(200.0), 0.3);
        let wrapping = WrappingState::centered_on(B, Vec3::splat(200.0));
        let mut engine = CollisionQueryEngine::default();
        let query = OrientedBox::centered(Vec3::splat(30.0), Quat::from_rotation_y(0.7), Vec3::splat(200.0));
        assert!(engine.any_box_intersects(&field, &wrapping, &query, 12.5));
    }

    #[test]
    fn box_outside_rock_misses() {
        let field = single_rock_field(Vec3::splat(200.0), 0.3);
        let wrapping = WrappingState::centered_on(B, Vec3::splat(200.0));
        let mut engine = CollisionQueryEngine::default();
        let query = OrientedBox::centered(
            Vec3::new(2.5, 1.0, 4.0),
            Quat::from_rotation_x(0.4),
            Vec3::new(200.0, 240.0, 200.0),
        );
        assert!(!engine.any_box_intersects(&field, &wrapping, &query, 3.0));
    }

    #[test]
    fn sphere_and_box_queries_agree() {
        let field = single_rock_field(Vec3::splat(200.0), 0.1);
        let wrapping = WrappingState::centered_on(B, Vec3::splat(200.0));
        let mut engine = CollisionQueryEngine::default();
        let points = [
            Vec3::splat(200.0),
            Vec3::new(200.0, 200.0, 300.0),
            Vec3::new(120.0, 200.0, 200.0),
            Vec3::new(200.0, 261.0, 140.0),
        ];
        for p in points {
            let sphere = engine.any_sphere_intersects(&field, &wrapping, p, 1.0);
            // A box big enough to swallow the rock whole when centred on it.
            let query = OrientedBox::centered(Vec3::splat(27.0), Quat::IDENTITY, p);
            let boxed = engine.any_box_intersects(&field, &wrapping, &query, 0.0);
            assert_eq!(sphere, boxed, "disagreement at {p:?}");
        }
    }

    #[test]
    fn repeated_queries_reuse_stamps() {
        let field = single_rock_field(Vec3::splat(200.0), 0.0);
        let wrapping = WrappingState::centered_on(B, Vec3::splat(200.0));
        let mut engine = CollisionQueryEngine::default();
        // The query cube shares four cells with the rock; it is tested once.
        for _ in 0..3 {
            assert!(!engine.any_sphere_intersects(&field, &wrapping, Vec3::new(200.0, 200.0, 250.0), 20.0));
        }
        assert_eq!(engine.tested_count(), 3);
    }

    #[test]
    fn oriented_box_geometry() {
        let query = OrientedBox::centered(Vec3::new(1.0, 2.0, 3.0), Quat::IDENTITY, Vec3::X * 10.0);
        let (center, radius) = query.bounding_sphere();
        assert!((center - Vec3::X * 10.0).length() < 1e-5);
        assert!((radius - 14f32.sqrt()).abs() < 1e-4);
        let (min, max) = query.world_aabb();
        assert!((min - Vec3::new(9.0, -2.0, -3.0)).length() < 1e-5);
        assert!((max - Vec3::new(11.0, 2.0, 3.0)).length() < 1e-5);
        assert!(query.contains_local(Vec3::ZERO));
        assert!(!query.contains_local(Vec3::new(1.0, 0.0, 0.0)));
    }
}
