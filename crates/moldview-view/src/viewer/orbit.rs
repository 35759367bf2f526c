use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};

use super::camera::{Camera, Projection};
use super::input::ViewerInput;
use super::math::Vec3;
use super::surface::SurfaceSize;

const PHI_EPS: f64 = 1.0e-6;
const SETTLE_EPS: f64 = 1.0e-9;
const WHEEL_STEP: f32 = 50.0;
const ZOOM_BASE: f64 = 0.95;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitSettings {
    pub enable_damping: bool,
    pub damping_factor: f64,
    pub screen_space_panning: bool,
    pub min_distance: f64,
    pub max_distance: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub rotate_speed: f64,
    pub pan_speed: f64,
    pub zoom_speed: f64,
}

impl Default for OrbitSettings {
    fn default() -> Self {
        Self {
            enable_damping: true,
            damping_factor: 0.05,
            screen_space_panning: false,
            min_distance: 1.0,
            max_distance: 50.0,
            min_zoom: 0.01,
            max_zoom: 100.0,
            rotate_speed: 1.0,
            pan_speed: 1.0,
            zoom_speed: 1.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct OrbitController {
    settings: OrbitSettings,
    target: Vec3,
    delta_theta: f64,
    delta_phi: f64,
    pan_offset: Vec3,
    scale: f64,
}

impl OrbitController {
    pub fn new(settings: OrbitSettings) -> Self {
        Self {
            settings,
            target: Vec3::ZERO,
            delta_theta: 0.0,
            delta_phi: 0.0,
            pan_offset: Vec3::ZERO,
            scale: 1.0,
        }
    }

    pub fn settings(&self) -> &OrbitSettings {
        &self.settings
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn set_target(&mut self, target: Vec3) {
        self.target = target;
    }

    pub fn bind(&mut self, target: Vec3) {
        self.target = target;
    }

    pub fn has_pending_motion(&self) -> bool {
        self.delta_theta != 0.0
            || self.delta_phi != 0.0
            || self.pan_offset != Vec3::ZERO
            || self.scale != 1.0
    }

    pub fn rotate_left(&mut self, angle: f64) {
        self.delta_theta -= angle;
    }

    pub fn rotate_up(&mut self, angle: f64) {
        self.delta_phi -= angle;
    }

    pub fn dolly_in(&mut self, factor: f64) {
        if factor > 0.0 {
            self.scale *= factor;
        }
    }

    pub fn dolly_out(&mut self, factor: f64) {
        if factor > 0.0 {
            self.scale /= factor;
        }
    }

    pub fn pan(&mut self, dx: f64, dy: f64, camera: &Camera, surface: SurfaceSize) {
        let width = surface.width.max(1) as f64;
        let height = surface.height.max(1) as f64;
        let forward = camera.forward();
        let right = forward.cross(camera.view_up()).normalized();
        let screen_up = right.cross(forward).normalized();
        let along_up = if self.settings.screen_space_panning {
            screen_up
        } else {
            camera.up.cross(right).normalized()
        };

        let (left_distance, up_distance) = match camera.projection {
            Projection::Perspective { fov_deg, .. } => {
                let offset = (camera.position - self.target).length();
                let target_distance = offset * (fov_deg.to_radians() / 2.0).tan();
                (
                    2.0 * dx * target_distance / height,
                    2.0 * dy * target_distance / height,
                )
            }
            Projection::Orthographic {
                left,
                right: right_edge,
                top,
                bottom,
                ..
            } => (
                dx * (right_edge - left) / camera.zoom / width,
                dy * (top - bottom) / camera.zoom / height,
            ),
        };

        let speed = self.settings.pan_speed;
        self.pan_offset = self.pan_offset + right * (-left_distance * speed);
        self.pan_offset = self.pan_offset + along_up * (up_distance * speed);
    }

    pub fn apply_input(&mut self, input: &ViewerInput, camera: &Camera, surface: SurfaceSize) {
        if !input.hovered {
            return;
        }
        let height = if input.viewport_height > 0.0 {
            input.viewport_height as f64
        } else {
            surface.height.max(1) as f64
        };
        let dx = input.pointer_delta.x as f64;
        let dy = input.pointer_delta.y as f64;

        if input.primary_down && (dx != 0.0 || dy != 0.0) {
            let speed = self.settings.rotate_speed;
            self.rotate_left(TAU * dx / height * speed);
            self.rotate_up(TAU * dy / height * speed);
        } else if (input.secondary_down || input.middle_down) && (dx != 0.0 || dy != 0.0) {
            self.pan(dx, dy, camera, surface);
        }

        if input.scroll_delta != 0.0 {
            let steps = (input.scroll_delta.abs() / WHEEL_STEP).max(1.0) as f64;
            let factor = ZOOM_BASE.powf(self.settings.zoom_speed * steps);
            if input.scroll_delta > 0.0 {
                self.dolly_in(factor);
            } else {
                self.dolly_out(factor);
            }
        }
    }

    /// Applies pending motion to `camera`. Returns true when the camera moved.
    ///
    /// With nothing pending and the distance already inside the limits the
    /// position is left exactly as it is.
    pub fn update(&mut self, camera: &mut Camera) -> bool {
        let offset = camera.position - self.target;
        let radius = offset.length();
        let is_perspective = matches!(camera.projection, Projection::Perspective { .. });
        let out_of_range = is_perspective
            && (radius < self.settings.min_distance || radius > self.settings.max_distance);

        if !self.has_pending_motion() && !out_of_range {
            camera.look_at(self.target);
            return false;
        }

        let (mut theta, mut phi) = if radius > 0.0 {
            (
                offset.x.atan2(offset.z),
                (offset.y / radius).clamp(-1.0, 1.0).acos(),
            )
        } else {
            (0.0, PI / 2.0)
        };

        let step = if self.settings.enable_damping {
            self.settings.damping_factor
        } else {
            1.0
        };
        theta += self.delta_theta * step;
        phi += self.delta_phi * step;
        phi = phi.clamp(PHI_EPS, PI - PHI_EPS);

        let mut radius = radius;
        if is_perspective {
            radius = (radius * self.scale)
                .clamp(self.settings.min_distance, self.settings.max_distance);
        } else {
            camera.zoom =
                (camera.zoom / self.scale).clamp(self.settings.min_zoom, self.settings.max_zoom);
        }

        self.target = self.target + self.pan_offset * step;

        let sin_phi = phi.sin();
        let offset = Vec3::new(
            radius * sin_phi * theta.sin(),
            radius * phi.cos(),
            radius * sin_phi * theta.cos(),
        );
        let previous = camera.position;
        camera.position = self.target + offset;
        camera.look_at(self.target);

        if self.settings.enable_damping {
            let keep = 1.0 - self.settings.damping_factor;
            self.delta_theta *= keep;
            self.delta_phi *= keep;
            self.pan_offset = self.pan_offset * keep;
            self.settle();
        } else {
            self.stop();
        }
        self.scale = 1.0;

        camera.position != previous
    }

    pub fn stop(&mut self) {
        self.delta_theta = 0.0;
        self.delta_phi = 0.0;
        self.pan_offset = Vec3::ZERO;
        self.scale = 1.0;
    }

    pub fn dispose(&mut self) {
        self.stop();
        self.target = Vec3::ZERO;
    }

    fn settle(&mut self) {
        if self.delta_theta.abs() < SETTLE_EPS {
            self.delta_theta = 0.0;
        }
        if self.delta_phi.abs() < SETTLE_EPS {
            self.delta_phi = 0.0;
        }
        if self.pan_offset.length() < SETTLE_EPS {
            self.pan_offset = Vec3::ZERO;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewer::camera::CameraKind;

    fn perspective_camera(position: Vec3) -> Camera {
        Camera::new(
            Projection::new(CameraKind::Perspective, 1.0, None),
            position,
        )
    }

    #[test]
    fn idle_update_keeps_position_bit_identical() {
        let mut orbit = OrbitController::new(OrbitSettings::default());
        let position = Vec3::new(0.1, 0.2, 9.774_056_478_9);
        let mut camera = perspective_camera(position);
        assert!(!orbit.update(&mut camera));
        assert_eq!(camera.position, position);
        assert_eq!(camera.target, Vec3::ZERO);
    }

    #[test]
    fn distance_is_clamped_to_limits() {
        let mut orbit = OrbitController::new(OrbitSettings::default());
        let mut camera = perspective_camera(Vec3::new(0.0, 0.0, 120.0));
        assert!(orbit.update(&mut camera));
        assert!((camera.position.length() - 50.0).abs() < 1.0e-9);

        let mut camera = perspective_camera(Vec3::new(0.0, 0.0, 0.25));
        orbit.update(&mut camera);
        assert!((camera.position.length() - 1.0).abs() < 1.0e-9);
    }

    #[test]
    fn damping_spreads_rotation_over_frames() {
        let mut orbit = OrbitController::new(OrbitSettings::default());
        let mut camera = perspective_camera(Vec3::new(0.0, 0.0, 10.0));
        orbit.rotate_left(1.0);
        orbit.update(&mut camera);
        let first = camera.position;
        assert!(first.x.abs() > 0.0);
        assert!(orbit.has_pending_motion());
        orbit.update(&mut camera);
        assert!(camera.position.x.abs() > first.x.abs());
        assert!((camera.position.length() - 10.0).abs() < 1.0e-9);
    }

    #[test]
    fn without_damping_motion_is_applied_at_once() {
        let settings = OrbitSettings {
            enable_damping: false,
            ..OrbitSettings::default()
        };
        let mut orbit = OrbitController::new(settings);
        let mut camera = perspective_camera(Vec3::new(0.0, 0.0, 10.0));
        orbit.dolly_in(0.5);
        orbit.update(&mut camera);
        assert!((camera.position.length() - 5.0).abs() < 1.0e-9);
        assert!(!orbit.has_pending_motion());
    }

    #[test]
    fn orthographic_dolly_changes_zoom() {
        let mut orbit = OrbitController::new(OrbitSettings::default());
        let mut camera = Camera::new(
            Projection::new(CameraKind::Orthographic, 1.0, None),
            Vec3::new(0.0, 0.0, 10.0),
        );
        orbit.dolly_in(0.5);
        orbit.update(&mut camera);
        assert!((camera.zoom - 2.0).abs() < 1.0e-12);
        assert!((camera.position.length() - 10.0).abs() < 1.0e-9);
    }

    #[test]
    fn rebinding_preserves_settings() {
        let settings = OrbitSettings {
            damping_factor: 0.2,
            ..OrbitSettings::default()
        };
        let mut orbit = OrbitController::new(settings);
        orbit.bind(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(orbit.target(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(orbit.settings().damping_factor, 0.2);
        assert!(orbit.settings().enable_damping);
    }
}
