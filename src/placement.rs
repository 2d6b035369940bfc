//! Poisson-disk placement of asteroid instances with variable radii.
//!
//! A Bridson-style active-list sampler: every accepted asteroid becomes an
//! "active" seed that proposes a fixed number of neighbours at exactly
//! touching-plus-spacing distance in random directions.  A proposal is kept
//! if it lies inside the box and does not overlap any earlier asteroid.
//!
//! ## Occupancy grid
//!
//! Overlap checks go through a dense lattice with one entry per
//! `placement_cell_size` step.  Each lattice point stores the index of an
//! asteroid whose padded sphere (`radius + spacing`) covers it, or
//! [`EMPTY_CELL`].  Later asteroids overwrite padding points but never a point
//! inside another asteroid's body, so every body keeps its own lattice points
//! and a proposal that overlaps a body is always found by a lookup of
//! `radius + 2 · cell` around it.  This requires the smallest asteroid radius
//! to exceed half a cell diagonal, which [`FieldConfig::validate`] enforces.
//!
//! The box tiles space, so a candidate near a face is also looked up as its
//! copies shifted by one box length; bodies never overlap across a seam.
//!
//! The loop terminates because every asteroid enters the active list with a
//! finite budget and each iteration spends exactly one unit of it.

use crate::asteroid::AsteroidCatalog;
use crate::config::FieldConfig;
use crate::noise_field::SpacingField;
use bevy::prelude::*;
use rand::Rng;
use std::f32::consts::TAU;

/// Sentinel for an unclaimed lattice point.
pub const EMPTY_CELL: u32 = u32::MAX;

/// One accepted asteroid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub position: Vec3,
    pub variant: usize,
    /// Copy of the variant size.
    pub radius: f32,
    /// Surface gap this asteroid asked for at its position.
    pub spacing: f32,
}

/// Counters from the last [`PoissonFieldPlacer::place`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlacementStats {
    /// Candidate positions proposed (one per loop iteration).
    pub proposals: u64,
    /// Candidates rejected for leaving the box.
    pub out_of_bounds: u64,
    /// Candidates rejected for overlapping an earlier asteroid.
    pub overlapping: u64,
    /// Asteroids accepted, including the first one.
    pub accepted: usize,
}

struct ActiveEntry {
    position: Vec3,
    radius_and_spacing: f32,
    remaining_attempts: u32,
}

/// Offsets of the tile copies of `p` whose cube of half-size `reach` still
/// reaches into the box.  Always includes the zero offset first.
fn tile_shifts(p: Vec3, reach: f32, box_size: f32) -> impl Iterator<Item = Vec3> {
    let axis = |v: f32| {
        let mut options = vec![0.0];
        if v - reach < 0.0 {
            options.push(box_size);
        }
        if v + reach >= box_size {
            options.push(-box_size);
        }
        options
    };
    let (xs, ys, zs) = (axis(p.x), axis(p.y), axis(p.z));
    xs.into_iter().flat_map(move |x| {
        let zs = zs.clone();
        ys.clone()
            .into_iter()
            .flat_map(move |y| zs.clone().into_iter().map(move |z| Vec3::new(x, y, z)))
    })
}

/// Uniformly distributed unit vector.
pub fn random_direction(rng: &mut impl Rng) -> Vec3 {
    let theta = rng.gen_range(0.0..TAU);
    let cos_pitch: f32 = rng.gen_range(-1.0..=1.0);
    let sin_pitch = (1.0 - cos_pitch * cos_pitch).max(0.0).sqrt();
    Vec3::new(theta.cos() * sin_pitch, theta.sin() * sin_pitch, cos_pitch)
}

pub struct PoissonFieldPlacer {
    box_size: f32,
    cell_size: f32,
    /// Lattice points per axis (`ceil(box / cell) + 1`).
    points_per_axis: i32,
    cells: Vec<u32>,
    spacing: SpacingField,
    attempts: u32,
    stats: PlacementStats,
}

impl PoissonFieldPlacer {
    /// Allocate the occupancy lattice and seed the spacing field from `rng`.
    pub fn new(rng: &mut impl Rng, config: &FieldConfig) -> Self {
        let points_per_axis = (config.box_size / config.placement_cell_size).ceil() as i32 + 1;
        let total = (points_per_axis as usize).pow(3);
        Self {
            box_size: config.box_size,
            cell_size: config.placement_cell_size,
            points_per_axis,
            cells: vec![EMPTY_CELL; total],
            spacing: SpacingField::new(rng.gen(), config),
            attempts: config.placement_attempts.max(1),
            stats: PlacementStats::default(),
        }
    }

    pub fn stats(&self) -> PlacementStats {
        self.stats
    }

    /// Fill the box with non-overlapping asteroids drawn from `catalog`.
    ///
    /// Returns an empty list only for an empty catalog; a box that is small
    /// relative to the asteroids yields sparse output, never an error.
    pub fn place(&mut self, rng: &mut impl Rng, catalog: &AsteroidCatalog) -> Vec<Placement> {
        self.cells.fill(EMPTY_CELL);
        self.stats = PlacementStats::default();

        let mut placed = Vec::new();
        let mut active = Vec::new();
        if catalog.is_empty() {
            return placed;
        }

        let first = rng.gen_range(0..catalog.len());
        let radius = catalog.variants[first].size;
        let lo = radius.min(self.box_size * 0.5);
        let hi = (self.box_size - radius).max(lo);
        let start = Vec3::new(
            rng.gen_range(lo..=hi),
            rng.gen_range(lo..=hi),
            rng.gen_range(lo..=hi),
        );
        self.accept(start, first, radius, &mut placed, &mut active);

        while !active.is_empty() {
            let variant = rng.gen_range(0..catalog.len());
            let idx = rng.gen_range(0..active.len());
            let radius = catalog.variants[variant].size;

            let seed: &ActiveEntry = &active[idx];
            let candidate =
                seed.position + random_direction(rng) * (seed.radius_and_spacing + radius);
            self.stats.proposals += 1;

            if !self.in_box(candidate) {
                self.stats.out_of_bounds += 1;
            } else if self.overlaps_existing(candidate, radius, &placed) {
                self.stats.overlapping += 1;
            } else {
                self.accept(candidate, variant, radius, &mut placed, &mut active);
            }

            active[idx].remaining_attempts -= 1;
            if active[idx].remaining_attempts == 0 {
                active.swap_remove(idx);
            }
        }

        placed
    }

    fn in_box(&self, p: Vec3) -> bool {
        p.cmpge(Vec3::ZERO).all() && p.cmplt(Vec3::splat(self.box_size)).all()
    }

    /// Overlap test against the asteroids of this box and of its neighbouring
    /// tiles, so that bodies stay apart across the box faces too.
    fn overlaps_existing(&self, candidate: Vec3, radius: f32, placed: &[Placement]) -> bool {
        let reach = radius + self.cell_size * 2.0;
        tile_shifts(candidate, reach, self.box_size)
            .any(|shift| self.overlaps_near(candidate + shift, radius, reach, placed))
    }

    fn overlaps_near(&self, candidate: Vec3, radius: f32, reach: f32, placed: &[Placement]) -> bool {
        self.lattice_around(candidate, reach).any(|(cell, _)| {
            let owner = self.cells[cell];
            if owner == EMPTY_CELL {
                return false;
            }
            let other = &placed[owner as usize];
            let min_dist = radius + other.radius + other.spacing;
            candidate.distance_squared(other.position) < min_dist * min_dist
        })
    }

    fn accept(
        &mut self,
        position: Vec3,
        variant: usize,
        radius: f32,
        placed: &mut Vec<Placement>,
        active: &mut Vec<ActiveEntry>,
    ) {
        let spacing = self.spacing.spacing_at(position);
        let reach = radius + spacing;
        let index = placed.len() as u32;

        let stamped: Vec<usize> = self
            .lattice_around(position, reach)
            .filter(|&(cell, point)| {
                if point.distance_squared(position) > reach * reach {
                    return false;
                }
                let owner = self.cells[cell];
                owner == EMPTY_CELL || {
                    let other = &placed[owner as usize];
                    point.distance_squared(other.position) > other.radius * other.radius
                }
            })
            .map(|(cell, _)| cell)
            .collect();
        for cell in stamped {
            self.cells[cell] = index;
        }

        placed.push(Placement {
            position,
            variant,
            radius,
            spacing,
        });
        active.push(ActiveEntry {
            position,
            radius_and_spacing: reach,
            remaining_attempts: self.attempts,
        });
        self.stats.accepted += 1;
    }

    /// Lattice points (flat index, world position) within the axis-aligned
    /// cube of half-size `reach` around `center`, clamped to the lattice.
    fn lattice_around(&self, center: Vec3, reach: f32) -> impl Iterator<Item = (usize, Vec3)> {
        let max = IVec3::splat(self.points_per_axis - 1);
        let lo = ((center - reach) / self.cell_size)
            .floor()
            .as_ivec3()
            .clamp(IVec3::ZERO, max);
        let hi = ((center + reach) / self.cell_size)
            .ceil()
            .as_ivec3()
            .clamp(IVec3::ZERO, max);
        let n = self.points_per_axis as usize;
        let cell_size = self.cell_size;

        (lo.x..=hi.x).flat_map(move |x| {
            (lo.y..=hi.y).flat_map(move |y| {
                (lo.z..=hi.z).map(move |z| {
                    let flat = (x as usize * n + y as usize) * n + z as usize;
                    (flat, IVec3::new(x, y, z).as_vec3() * cell_size)
                })
            })
        })
    }
}
