//! Orbiting perspective camera.
//!
//! The camera circles the joint at a fixed radius and height. Its aspect
//! follows the surface; resizes never rebuild anything else.

use cablesight_shared::{Mat4, Vec3};

/// Vertical field of view (rad).
pub const FOV_Y: f32 = 0.75;
/// Near clip plane.
pub const NEAR: f32 = 0.1;
/// Far clip plane.
pub const FAR: f32 = 100.0;

/// Orbit camera looking at a fixed target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    target: Vec3,
    radius: f32,
    height: f32,
    angle: f32,
    aspect: f32,
}

impl Camera {
    /// Creates a camera orbiting `target`.
    #[must_use]
    pub const fn new(target: Vec3, radius: f32, height: f32) -> Self {
        Self {
            target,
            radius,
            height,
            angle: 0.0,
            aspect: 1.0,
        }
    }

    /// Updates the aspect ratio for a `width`×`height` viewport.
    ///
    /// Degenerate sizes keep the previous aspect.
    #[allow(clippy::cast_precision_loss)]
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    /// Current aspect ratio.
    #[must_use]
    pub const fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Orbit angle (rad).
    #[must_use]
    pub const fn angle(&self) -> f32 {
        self.angle
    }

    /// Advances the orbit by `speed` rad/s.
    pub fn advance(&mut self, dt: f32, speed: f32) {
        if dt > 0.0 && dt.is_finite() {
            self.angle = (self.angle + speed * dt).rem_euclid(std::f32::consts::TAU);
        }
    }

    /// World-space eye position.
    #[must_use]
    pub fn position(&self) -> Vec3 {
        // Orbit in the XZ plane; the cable runs along X
        self.target
            + Vec3::new(
                self.radius * self.angle.sin(),
                self.height,
                self.radius * self.angle.cos(),
            )
    }

    /// Combined projection × view matrix.
    #[must_use]
    pub fn view_projection(&self) -> Mat4 {
        Mat4::perspective(FOV_Y, self.aspect, NEAR, FAR) * Mat4::look_at(self.position(), self.target, Vec3::Y)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::ZERO, 6.0, 1.8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewport_sets_aspect() {
        let mut camera = Camera::default();
        camera.set_viewport(800, 600);
        assert!((camera.aspect() - 800.0 / 600.0).abs() < 1e-6);
        camera.set_viewport(0, 600);
        assert!((camera.aspect() - 800.0 / 600.0).abs() < 1e-6);
    }

    #[test]
    fn test_orbit_keeps_distance() {
        let mut camera = Camera::new(Vec3::new(1.0, 0.0, 0.0), 5.0, 0.0);
        for _ in 0..50 {
            camera.advance(0.1, 0.3);
            assert!((camera.position().distance(Vec3::new(1.0, 0.0, 0.0)) - 5.0).abs() < 1e-4);
        }
        camera.advance(f32::NAN, 0.3);
        assert!(camera.angle().is_finite());
    }

    #[test]
    fn test_target_projects_to_center() {
        let camera = Camera::default();
        let m = camera.view_projection().cols;
        // Clip-space position of the target (origin)
        let (x, y, w) = (m[3][0], m[3][1], m[3][3]);
        assert!(w > 0.0);
        assert!((x / w).abs() < 1e-4 && (y / w).abs() < 1e-4);
    }
}
