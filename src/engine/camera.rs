//! Orbit camera riding a sphere around the board center.

use std::collections::HashSet;
use std::f32::consts::FRAC_PI_2;

use glam::{Mat4, Vec3};
use tracing::info;
use winit::keyboard::KeyCode;

const ZOOM_SPEED: f32 = 10.0;
const TURN_SPEED: f32 = 1.5;
const MIN_RADIUS: f32 = 5.0;
const MAX_RADIUS: f32 = 60.0;
// Stays short of vertical so the Z-up view basis never degenerates.
const MAX_PITCH: f32 = 1.5;
const FIELD_OF_VIEW_DEGREES: f32 = 45.0;

/// Camera state driven by held keys: W/S move in and out, A/D orbit,
/// the vertical arrows tilt. The light toggle lives here as well since
/// it is part of the same input surface.
#[derive(Debug)]
pub struct OrbitCamera {
    radius: f32,
    yaw: f32,
    pitch: f32,
    light_enabled: bool,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        // Starts on the white side of the board, slightly above it.
        Self {
            radius: 25.0,
            yaw: -FRAC_PI_2,
            pitch: 0.6,
            light_enabled: true,
        }
    }
}

impl OrbitCamera {
    /// Integrates the currently held keys over `dt` seconds and clamps
    /// the result to the usable range.
    pub fn apply_input(&mut self, held: &HashSet<KeyCode>, dt: f32) {
        if held.contains(&KeyCode::KeyW) {
            self.radius -= ZOOM_SPEED * dt;
        }
        if held.contains(&KeyCode::KeyS) {
            self.radius += ZOOM_SPEED * dt;
        }
        if held.contains(&KeyCode::KeyA) {
            self.yaw -= TURN_SPEED * dt;
        }
        if held.contains(&KeyCode::KeyD) {
            self.yaw += TURN_SPEED * dt;
        }
        if held.contains(&KeyCode::ArrowUp) {
            self.pitch += TURN_SPEED * dt;
        }
        if held.contains(&KeyCode::ArrowDown) {
            self.pitch -= TURN_SPEED * dt;
        }
        self.radius = self.radius.clamp(MIN_RADIUS, MAX_RADIUS);
        self.pitch = self.pitch.clamp(-MAX_PITCH, MAX_PITCH);
    }

    pub fn toggle_light(&mut self) {
        self.light_enabled = !self.light_enabled;
        info!(
            "diffuse and specular light {}",
            if self.light_enabled { "on" } else { "off" }
        );
    }

    pub fn light_enabled(&self) -> bool {
        self.light_enabled
    }

    pub fn eye(&self) -> Vec3 {
        Vec3::new(
            self.radius * self.pitch.cos() * self.yaw.cos(),
            self.radius * self.pitch.cos() * self.yaw.sin(),
            self.radius * self.pitch.sin(),
        )
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), Vec3::ZERO, Vec3::Z)
    }

    pub fn projection_matrix(&self, width: u32, height: u32) -> Mat4 {
        let aspect = width as f32 / height.max(1) as f32;
        Mat4::perspective_rh_gl(FIELD_OF_VIEW_DEGREES.to_radians(), aspect, 0.1, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn held(keys: &[KeyCode]) -> HashSet<KeyCode> {
        keys.iter().copied().collect()
    }

    #[test]
    fn test_zoom_scales_with_elapsed_time() {
        let mut camera = OrbitCamera::default();
        camera.apply_input(&held(&[KeyCode::KeyW]), 0.5);
        assert!((camera.eye().length() - 20.0).abs() < 1e-4);
    }

    #[test]
    fn test_radius_clamps_at_both_ends() {
        let mut camera = OrbitCamera::default();
        camera.apply_input(&held(&[KeyCode::KeyW]), 100.0);
        assert!((camera.eye().length() - 5.0).abs() < 1e-4);
        camera.apply_input(&held(&[KeyCode::KeyS]), 100.0);
        assert!((camera.eye().length() - 60.0).abs() < 1e-4);
    }

    #[test]
    fn test_pitch_never_reaches_vertical() {
        let mut camera = OrbitCamera::default();
        camera.apply_input(&held(&[KeyCode::ArrowUp]), 100.0);
        let eye = camera.eye();
        // A sliver of horizontal distance must survive the clamp.
        assert!(eye.x.hypot(eye.y) > 1e-3);
        assert!(camera.view_matrix().to_cols_array().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_opposing_keys_cancel() {
        let mut camera = OrbitCamera::default();
        let before = camera.eye();
        camera.apply_input(&held(&[KeyCode::KeyA, KeyCode::KeyD]), 1.0);
        assert!((camera.eye() - before).length() < 1e-4);
    }

    #[test]
    fn test_light_starts_on_and_toggles() {
        let mut camera = OrbitCamera::default();
        assert!(camera.light_enabled());
        camera.toggle_light();
        assert!(!camera.light_enabled());
        camera.toggle_light();
        assert!(camera.light_enabled());
    }
}
