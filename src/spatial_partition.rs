//! Toroidal spatial hash grid for asteroid collision queries.
//!
//! The canonical box is split into `dimension³` cubic cells of
//! `cell_size` units.  Each instance is appended to every cell its padded
//! sphere (`radius + spacing`) touches.  Cell coordinates wrap with
//! `rem_euclid`, matching the tiled world: a query near `x = -10` looks at the
//! same cells as one near `x = box_size - 10`.
//!
//! ## Cell Size Choice
//!
//! Cell size (`GRID_CELL_SIZE` in `constants.rs`) is tuned against instance
//! radii, not query sizes.  With 50-unit cells and radii of 20–60:
//!   - a typical instance lands in 2×2×2 = 8 cells
//!   - a giant with maximum spacing spans at most 4×4×4 = 64 cells
//!
//! The grid is built once after placement and never mutated, so lookups need
//! no synchronisation.

use crate::field::AsteroidInstance;
use bevy::prelude::*;

#[derive(Debug, Clone, Default)]
pub struct SpatialHashGrid {
    cell_size: f32,
    dimension: i32,
    /// Flat `x * n² + y * n + z` cell storage of instance indices.
    cells: Vec<Vec<u32>>,
}

impl SpatialHashGrid {
    /// Bucket every instance into the cells its padded sphere overlaps.
    ///
    /// `box_size` must be a whole multiple of `cell_size`
    /// (see [`FieldConfig::validate`](crate::config::FieldConfig::validate)).
    pub fn build(instances: &[AsteroidInstance], box_size: f32, cell_size: f32) -> Self {
        let dimension = ((box_size / cell_size).round() as i32).max(1);
        let mut grid = Self {
            cell_size,
            dimension,
            cells: vec![Vec::new(); (dimension as usize).pow(3)],
        };
        for (index, instance) in instances.iter().enumerate() {
            let reach = instance.radius + instance.spacing;
            let cells: Vec<usize> = grid.cells_overlapping(instance.position, reach).collect();
            for cell in cells {
                grid.cells[cell].push(index as u32);
            }
        }
        grid
    }

    /// Cells per axis.
    pub fn dimension(&self) -> i32 {
        self.dimension
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Instance indices stored in flat cell `index`.
    pub fn cell(&self, index: usize) -> &[u32] {
        &self.cells[index]
    }

    /// Grid cell containing `pos`, before wrapping.
    pub fn world_to_cell(&self, pos: Vec3) -> IVec3 {
        (pos / self.cell_size).floor().as_ivec3()
    }

    /// Flat index of a (possibly out-of-range) cell coordinate, wrapped.
    pub fn cell_index(&self, cell: IVec3) -> usize {
        let n = self.dimension;
        let w = IVec3::new(
            cell.x.rem_euclid(n),
            cell.y.rem_euclid(n),
            cell.z.rem_euclid(n),
        );
        ((w.x * n + w.y) * n + w.z) as usize
    }

    /// Flat indices of the cells overlapped by the cube around a sphere.
    ///
    /// The result is conservative: callers must still do the exact distance
    /// test.  Each cell is yielded at most once even when the sphere is wider
    /// than the whole box.
    pub fn cells_overlapping(&self, pos: Vec3, radius: f32) -> impl Iterator<Item = usize> + '_ {
        self.cells_overlapping_aabb(pos - radius, pos + radius)
    }

    /// Flat indices of the cells overlapped by a world-space AABB.
    pub fn cells_overlapping_aabb(&self, min: Vec3, max: Vec3) -> impl Iterator<Item = usize> + '_ {
        let lo = self.world_to_cell(min);
        let hi = self.world_to_cell(max);
        let span = (hi - lo + IVec3::ONE)
            .max(IVec3::ZERO)
            .min(IVec3::splat(self.dimension));

        (0..span.x).flat_map(move |dx| {
            (0..span.y).flat_map(move |dy| {
                (0..span.z).map(move |dz| self.cell_index(lo + IVec3::new(dx, dy, dz)))
            })
        })
    }

    /// Total number of (cell, instance) entries; a build statistic.
    pub fn entry_count(&self) -> usize {
        self.cells.iter().map(Vec::len).sum()
    }
}
