//! Cable centerline.
//!
//! A Catmull-Rom spline through control points, with parallel-transport
//! frames so tubes built along it do not twist.

use cablesight_shared::{Quaternion, Vec3};

use crate::error::{EngineError, EngineResult};

/// Position and orthonormal frame at one point of a curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveFrame {
    /// Point on the curve.
    pub position: Vec3,
    /// Unit tangent.
    pub tangent: Vec3,
    /// Unit normal (perpendicular to tangent).
    pub normal: Vec3,
    /// Unit binormal (tangent x normal).
    pub binormal: Vec3,
}

/// Smooth 3D centerline through control points.
#[derive(Debug, Clone, PartialEq)]
pub struct PathCurve {
    points: Vec<Vec3>,
}

impl PathCurve {
    /// Builds a curve through `points`.
    ///
    /// # Errors
    ///
    /// `InvalidGeometry` for fewer than two points or coincident neighbours.
    pub fn new(points: Vec<Vec3>) -> EngineResult<Self> {
        if points.len() < 2 {
            return Err(EngineError::InvalidGeometry(format!(
                "centerline needs at least 2 points, got {}",
                points.len()
            )));
        }
        if let Some(i) = points.windows(2).position(|w| w[0].distance(w[1]) < 1e-5) {
            return Err(EngineError::InvalidGeometry(format!(
                "centerline points {} and {} coincide",
                i,
                i + 1
            )));
        }
        Ok(Self { points })
    }

    /// Straight segment of `length` along +X, centered on the origin.
    #[must_use]
    pub fn straight(length: f32) -> Self {
        let half = length.abs().max(1e-3) * 0.5;
        Self {
            points: vec![Vec3::new(-half, 0.0, 0.0), Vec3::new(half, 0.0, 0.0)],
        }
    }

    /// Cable run along +X with a gentle sag and the joint at the midpoint.
    #[must_use]
    pub fn joint_run(length: f32, sag: f32) -> Self {
        let half = length.abs().max(1e-3) * 0.5;
        Self {
            points: vec![
                Vec3::new(-half, sag, 0.0),
                Vec3::new(-half * 0.5, sag * 0.3, 0.0),
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(half * 0.5, sag * 0.3, 0.0),
                Vec3::new(half, sag, 0.0),
            ],
        }
    }

    /// Control points.
    #[must_use]
    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    fn segment(&self, s: f32) -> ([Vec3; 4], f32) {
        let last = self.points.len() - 1;
        let u = s.clamp(0.0, 1.0) * last as f32;
        let i = (u.floor() as usize).min(last - 1);
        let t = u - i as f32;
        let p1 = self.points[i];
        let p2 = self.points[i + 1];
        let p0 = if i == 0 { p1 } else { self.points[i - 1] };
        let p3 = if i + 2 > last { p2 } else { self.points[i + 2] };
        ([p0, p1, p2, p3], t)
    }

    /// Point at parameter `s` in [0, 1].
    #[must_use]
    pub fn point_at(&self, s: f32) -> Vec3 {
        let ([p0, p1, p2, p3], t) = self.segment(s);
        let t2 = t * t;
        let t3 = t2 * t;
        (p1 * 2.0
            + (p2 - p0) * t
            + (p0 * 2.0 - p1 * 5.0 + p2 * 4.0 - p3) * t2
            + (p1 * 3.0 - p0 - p2 * 3.0 + p3) * t3)
            * 0.5
    }

    /// Unit tangent at parameter `s`.
    #[must_use]
    pub fn tangent_at(&self, s: f32) -> Vec3 {
        let ([p0, p1, p2, p3], t) = self.segment(s);
        let d = ((p2 - p0)
            + (p0 * 2.0 - p1 * 5.0 + p2 * 4.0 - p3) * (2.0 * t)
            + (p1 * 3.0 - p0 - p2 * 3.0 + p3) * (3.0 * t * t))
            * 0.5;
        let tangent = d.normalize();
        if tangent == Vec3::ZERO {
            (p2 - p1).normalize()
        } else {
            tangent
        }
    }

    /// Approximate arc length.
    #[must_use]
    pub fn length(&self) -> f32 {
        let samples = 64;
        (0..samples)
            .map(|i| {
                let a = self.point_at(i as f32 / samples as f32);
                let b = self.point_at((i + 1) as f32 / samples as f32);
                a.distance(b)
            })
            .sum()
    }

    /// `segments + 1` parallel-transport frames over `[start, end]`.
    #[must_use]
    pub fn frames(&self, start: f32, end: f32, segments: u32) -> Vec<CurveFrame> {
        let segments = segments.max(1);
        let mut frames = Vec::with_capacity(segments as usize + 1);

        let first_tangent = self.tangent_at(start);
        let mut normal = first_tangent.any_perpendicular();
        let mut previous = first_tangent;

        for i in 0..=segments {
            let s = start + (end - start) * i as f32 / segments as f32;
            let tangent = self.tangent_at(s);
            // Carry the normal along with the tangent's rotation
            normal = Quaternion::from_rotation_arc(previous, tangent).rotate(normal).normalize();
            let binormal = tangent.cross(normal).normalize();
            frames.push(CurveFrame {
                position: self.point_at(s),
                tangent,
                normal,
                binormal,
            });
            previous = tangent;
        }
        frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_degenerate() {
        assert!(PathCurve::new(vec![Vec3::ZERO]).is_err());
        assert!(PathCurve::new(vec![Vec3::ZERO, Vec3::ZERO]).is_err());
        assert!(PathCurve::new(vec![Vec3::ZERO, Vec3::X]).is_ok());
    }

    #[test]
    fn test_interpolates_endpoints() {
        let curve = PathCurve::joint_run(10.0, 0.5);
        assert!(curve.point_at(0.0).distance(Vec3::new(-5.0, 0.5, 0.0)) < 1e-4);
        assert!(curve.point_at(1.0).distance(Vec3::new(5.0, 0.5, 0.0)) < 1e-4);
        assert!(curve.point_at(0.5).distance(Vec3::ZERO) < 1e-4);
    }

    #[test]
    fn test_straight_length() {
        let curve = PathCurve::straight(8.0);
        assert!((curve.length() - 8.0).abs() < 1e-2);
        assert!(curve.tangent_at(0.3).distance(Vec3::X) < 1e-4);
    }

    #[test]
    fn test_frames_orthonormal() {
        let curve = PathCurve::joint_run(10.0, 1.0);
        for frame in curve.frames(0.0, 1.0, 32) {
            assert!((frame.normal.length() - 1.0).abs() < 1e-3);
            assert!(frame.normal.dot(frame.tangent).abs() < 1e-3);
            assert!(frame.binormal.dot(frame.tangent).abs() < 1e-3);
        }
    }
}
