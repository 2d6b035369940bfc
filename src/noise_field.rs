//! Coherent noise fields for asteroid shapes and placement density.
//!
//! [`NoiseFieldSampler`] pairs a low-frequency fBm field (overall lumpiness)
//! with a ridged multifractal field (sharp crests and crater rims).  Both are
//! sampled at `unit_vertex * size`, so a larger asteroid picks up more noise
//! detail instead of being a scaled copy of a small one.
//!
//! [`SpacingField`] is a single slow Perlin field that modulates the gap left
//! between neighbouring asteroids during placement.

use crate::config::FieldConfig;
use bevy::prelude::*;
use noise::{Fbm, MultiFractal, NoiseFn, Perlin, RidgedMulti};

fn to_point(p: Vec3) -> [f64; 3] {
    [p.x as f64, p.y as f64, p.z as f64]
}

/// Linear blend, `a` at `t = 0` and `b` at `t = 1`.
pub fn mix(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Map a value in `[-1, 1]` to `[0, 1]`, clamping overshoot.
fn unit_interval(value: f64) -> f32 {
    (value as f32 * 0.5 + 0.5).clamp(0.0, 1.0)
}

/// Two independently seeded noise fields driving one asteroid variant.
pub struct NoiseFieldSampler {
    base: Fbm<Perlin>,
    ridge: RidgedMulti<Perlin>,
    ridge_floor: f32,
}

impl NoiseFieldSampler {
    pub fn new(base_seed: u32, ridge_seed: u32, config: &FieldConfig) -> Self {
        let base = Fbm::<Perlin>::new(base_seed)
            .set_octaves(config.base_noise_octaves)
            .set_frequency(config.base_noise_frequency)
            .set_persistence(0.5)
            .set_lacunarity(2.0);
        let ridge = RidgedMulti::<Perlin>::new(ridge_seed)
            .set_octaves(config.ridge_noise_octaves)
            .set_frequency(config.ridge_noise_frequency)
            .set_lacunarity(2.0);
        Self {
            base,
            ridge,
            ridge_floor: config.ridge_floor,
        }
    }

    /// Base shape noise, clamped to `[-1, 1]`.
    pub fn sample_base(&self, point: Vec3) -> f32 {
        (self.base.get(to_point(point)) as f32).clamp(-1.0, 1.0)
    }

    /// Ridge noise folded into `[0, 1]`; 1 on crests.
    pub fn sample_ridge(&self, point: Vec3) -> f32 {
        unit_interval(self.ridge.get(to_point(point)))
    }

    /// Radius multiplier (fraction of the variant size) at `point`.
    ///
    /// `mix(inner, 1, base) * mix(ridge_floor, 1, ridge)`, clamped so that
    /// ridges never carve below the inner floor: the result is always in
    /// `[inner_radius, 1]`.
    pub fn radius_factor(&self, point: Vec3, inner_radius: f32) -> f32 {
        let base = self.sample_base(point) * 0.5 + 0.5;
        let ridge = self.sample_ridge(point);
        let radius = mix(inner_radius, 1.0, base) * mix(self.ridge_floor, 1.0, ridge);
        radius.clamp(inner_radius, 1.0)
    }
}

/// Slow noise field giving every position a surface spacing within a band.
pub struct SpacingField {
    noise: Perlin,
    frequency: f64,
    min: f32,
    max: f32,
}

impl SpacingField {
    pub fn new(seed: u32, config: &FieldConfig) -> Self {
        Self {
            noise: Perlin::new(seed),
            frequency: config.spacing_noise_frequency,
            min: config.spacing_min,
            max: config.spacing_max,
        }
    }

    /// Spacing at `position`, always within `[min, max]`.
    pub fn spacing_at(&self, position: Vec3) -> f32 {
        let p = to_point(position);
        let t = unit_interval(self.noise.get([
            p[0] * self.frequency,
            p[1] * self.frequency,
            p[2] * self.frequency,
        ]));
        mix(self.min, self.max, t)
    }

    /// Largest spacing this field can produce.
    pub fn max_spacing(&self) -> f32 {
        self.max
    }
}
