//! Node transforms.

use cablesight_shared::{Mat4, Quaternion, Vec3};

/// Translation, rotation and uniform-or-not scale, applied scale first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Translation.
    pub translation: Vec3,
    /// Rotation.
    pub rotation: Quaternion,
    /// Per-axis scale.
    pub scale: Vec3,
}

impl Transform {
    /// No-op transform.
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quaternion::IDENTITY,
        scale: Vec3::new(1.0, 1.0, 1.0),
    };

    /// Pure translation.
    #[must_use]
    pub const fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    /// Same transform with a different rotation.
    #[must_use]
    pub const fn with_rotation(mut self, rotation: Quaternion) -> Self {
        self.rotation = rotation;
        self
    }

    /// Maps a point from local to parent space.
    #[must_use]
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        let scaled = Vec3::new(p.x * self.scale.x, p.y * self.scale.y, p.z * self.scale.z);
        self.rotation.rotate(scaled) + self.translation
    }

    /// Column-major matrix.
    #[must_use]
    pub fn to_matrix(&self) -> Mat4 {
        let q = self.rotation.normalize();
        let (x, y, z, w) = (q.x, q.y, q.z, q.w);
        let (sx, sy, sz) = (self.scale.x, self.scale.y, self.scale.z);
        let t = self.translation;
        Mat4 {
            cols: [
                [
                    (1.0 - 2.0 * (y * y + z * z)) * sx,
                    2.0 * (x * y + w * z) * sx,
                    2.0 * (x * z - w * y) * sx,
                    0.0,
                ],
                [
                    2.0 * (x * y - w * z) * sy,
                    (1.0 - 2.0 * (x * x + z * z)) * sy,
                    2.0 * (y * z + w * x) * sy,
                    0.0,
                ],
                [
                    2.0 * (x * z + w * y) * sz,
                    2.0 * (y * z - w * x) * sz,
                    (1.0 - 2.0 * (x * x + y * y)) * sz,
                    0.0,
                ],
                [t.x, t.y, t.z, 1.0],
            ],
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}
