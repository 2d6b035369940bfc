//! Camera-relative wrapping of the tiled asteroid box.
//!
//! Instances are stored in the canonical cube `[0, box_size)³`.  Every frame
//! the camera focus picks which copy of each instance is "visible": the one
//! inside the box-sized cube centred on the camera.
//!
//! ```text
//! wrapping_offset = 1.5 · B - (camera mod B)
//! global_offset   = camera - B / 2
//! visible(p)      = ((p + wrapping_offset) mod B) + global_offset
//! ```
//!
//! `wrapping_offset + global_offset` is always a multiple of `B`, so a visible
//! position is congruent to its stored position.  The collision grid relies on
//! this: world-space query points index it directly through the torus.

use bevy::prelude::*;

fn rem_euclid_vec3(v: Vec3, m: f32) -> Vec3 {
    Vec3::new(v.x.rem_euclid(m), v.y.rem_euclid(m), v.z.rem_euclid(m))
}

/// Offsets mapping stored instance positions to the copy nearest the camera.
///
/// Recomputed once per frame (or collision sub-step) before any query.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct WrappingState {
    box_size: f32,
    wrapping_offset: Vec3,
    global_offset: Vec3,
}

impl Default for WrappingState {
    fn default() -> Self {
        Self::new(crate::constants::BOX_SIZE)
    }
}

impl WrappingState {
    /// Cleared state for a box of `box_size`.
    pub fn new(box_size: f32) -> Self {
        Self {
            box_size,
            wrapping_offset: Vec3::ZERO,
            global_offset: Vec3::ZERO,
        }
    }

    /// State as if the camera sat at `focus`.
    ///
    /// Used for queries far from the real camera, such as checking that a
    /// prospective target position is clear of asteroids.
    pub fn centered_on(box_size: f32, focus: Vec3) -> Self {
        let mut state = Self::new(box_size);
        state.update(focus);
        state
    }

    pub fn update(&mut self, camera_pos: Vec3) {
        let b = self.box_size;
        self.wrapping_offset = Vec3::splat(b * 1.5) - rem_euclid_vec3(camera_pos, b);
        self.global_offset = camera_pos - Vec3::splat(b * 0.5);
    }

    /// Reset both offsets to zero (session start).
    pub fn clear(&mut self) {
        self.wrapping_offset = Vec3::ZERO;
        self.global_offset = Vec3::ZERO;
    }

    pub fn visible_position(&self, stored: Vec3) -> Vec3 {
        rem_euclid_vec3(stored + self.wrapping_offset, self.box_size) + self.global_offset
    }

    pub fn wrapping_offset(&self) -> Vec3 {
        self.wrapping_offset
    }

    pub fn global_offset(&self) -> Vec3 {
        self.global_offset
    }

    pub fn box_size(&self) -> f32 {
        self.box_size
    }
}

/// Marks the entity whose position the wrapping window follows (the ship).
#[derive(Component, Debug, Default)]
pub struct WrapFocus;

/// Re-centre the wrapping window on the focus entity once per frame, before
/// any collision query or transform sync.
pub fn update_wrapping_system(
    mut wrapping: ResMut<WrappingState>,
    focus: Query<&Transform, With<WrapFocus>>,
) {
    if let Ok(transform) = focus.single() {
        wrapping.update(transform.translation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const B: f32 = 4000.0;

    fn assert_in_window(visible: Vec3, camera: Vec3) {
        // Small slack for rounding at the window edge with large camera values.
        let tol = 1e-2;
        let lo = camera - B * 0.5;
        let hi = camera + B * 0.5;
        for axis in 0..3 {
            assert!(
                visible[axis] >= lo[axis] - tol && visible[axis] < hi[axis] + tol,
                "axis {axis}: {visible:?} outside [{lo:?}, {hi:?})"
            );
        }
    }

    #[test]
    fn visible_positions_surround_camera() {
        let cameras = [
            Vec3::ZERO,
            Vec3::new(2000.0, 2000.0, 2000.0),
            Vec3::new(-12_345.0, 777.0, 40_001.5),
            Vec3::new(3999.9, -0.1, 8000.0),
        ];
        let stored = [
            Vec3::ZERO,
            Vec3::new(3999.0, 1.0, 2000.0),
            Vec3::new(123.0, 3456.0, 789.0),
        ];
        for camera in cameras {
            let state = WrappingState::centered_on(B, camera);
            for p in stored {
                assert_in_window(state.visible_position(p), camera);
            }
        }
    }

    #[test]
    fn offsets_cancel_modulo_box() {
        let state = WrappingState::centered_on(B, Vec3::new(-5_500.0, 12_250.0, 3.0));
        let sum = state.wrapping_offset() + state.global_offset();
        for axis in 0..3 {
            assert!(sum[axis].rem_euclid(B).min(B - sum[axis].rem_euclid(B)) < 1e-2);
        }
    }

    #[test]
    fn camera_at_instance_needs_no_wrap() {
        let pos = Vec3::splat(2000.0);
        let state = WrappingState::centered_on(B, pos);
        assert_eq!(state.visible_position(pos), pos);
    }

    #[test]
    fn clear_resets_offsets() {
        let mut state = WrappingState::centered_on(B, Vec3::new(100.0, 200.0, 300.0));
        state.clear();
        assert_eq!(state.wrapping_offset(), Vec3::ZERO);
        assert_eq!(state.global_offset(), Vec3::ZERO);
        assert_eq!(state.visible_position(Vec3::new(1.0, 2.0, 3.0)), Vec3::new(1.0, 2.0, 3.0));
    }
}
