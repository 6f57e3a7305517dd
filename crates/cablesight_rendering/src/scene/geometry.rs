//! # Geometry
//!
//! CPU-side vertex and index data for every primitive the scene uses.
//! Buffers are built once at mount and handed to the backend; the engine
//! never rebuilds geometry per frame.

use std::f32::consts::{FRAC_PI_6, TAU};

use bytemuck::{Pod, Zeroable};
use cablesight_shared::Vec3;

use super::curve::{CurveFrame, PathCurve};
use crate::error::EngineResult;

/// Interleaved vertex, laid out for direct upload.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// Position.
    pub position: [f32; 3],
    /// Unit normal.
    pub normal: [f32; 3],
    /// Texture coordinate.
    pub uv: [f32; 2],
}

impl Vertex {
    /// Size of a vertex in bytes.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    fn new(position: Vec3, normal: Vec3, uv: [f32; 2]) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
            uv,
        }
    }
}

/// Primitive assembly mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    /// Indexed triangle list.
    Triangles,
    /// Unindexed point list.
    Points,
}

/// Vertex and index data for one drawable.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    label: String,
    topology: Topology,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
}

impl Geometry {
    /// Debug label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Primitive mode.
    #[must_use]
    pub const fn topology(&self) -> Topology {
        self.topology
    }

    /// Vertices.
    #[must_use]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Triangle indices (empty for points).
    #[must_use]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of triangles.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Vertex buffer bytes.
    #[must_use]
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Largest distance of any vertex from the line through `origin` along `axis`.
    #[must_use]
    pub fn max_radial_extent(&self, origin: Vec3, axis: Vec3) -> f32 {
        let axis = axis.normalize();
        self.vertices
            .iter()
            .map(|v| {
                let d = Vec3::from_array(v.position) - origin;
                (d - axis * d.dot(axis)).length()
            })
            .fold(0.0, f32::max)
    }

    /// Closed tube of constant `radius` around `curve` over `[start, end]`.
    ///
    /// `u` runs along the curve, `v` around it.
    #[must_use]
    pub fn tube(
        label: impl Into<String>,
        curve: &PathCurve,
        (start, end): (f32, f32),
        radius: f32,
        tubular_segments: u32,
        radial_segments: u32,
    ) -> Self {
        let frames = curve.frames(start, end, tubular_segments);
        Self::sweep(label.into(), &frames, radius, radial_segments.max(3))
    }

    /// Thin tube wound helically around `curve` at `helix_radius`.
    ///
    /// # Errors
    ///
    /// `InvalidGeometry` if the helix degenerates.
    #[allow(clippy::too_many_arguments)]
    pub fn helix(
        label: impl Into<String>,
        curve: &PathCurve,
        (start, end): (f32, f32),
        helix_radius: f32,
        strand_radius: f32,
        turns: f32,
        phase: f32,
        segments: u32,
    ) -> EngineResult<Self> {
        let segments = segments.max(4);
        let points: Vec<Vec3> = curve
            .frames(start, end, segments)
            .iter()
            .enumerate()
            .map(|(i, frame)| {
                let angle = phase + turns * TAU * i as f32 / segments as f32;
                frame.position + (frame.normal * angle.cos() + frame.binormal * angle.sin()) * helix_radius
            })
            .collect();
        let path = PathCurve::new(points)?;
        Ok(Self::tube(label, &path, (0.0, 1.0), strand_radius, segments, 6))
    }

    fn sweep(label: String, frames: &[CurveFrame], radius: f32, radial: u32) -> Self {
        let rings = frames.len() as u32;
        let mut vertices = Vec::with_capacity((rings * (radial + 1)) as usize);
        for (i, frame) in frames.iter().enumerate() {
            let u = i as f32 / (rings - 1).max(1) as f32;
            for j in 0..=radial {
                let v = j as f32 / radial as f32;
                let theta = v * TAU;
                let dir = frame.normal * theta.cos() + frame.binormal * theta.sin();
                vertices.push(Vertex::new(frame.position + dir * radius, dir, [u, v]));
            }
        }

        let stride = radial + 1;
        let mut indices = Vec::with_capacity(((rings - 1) * radial * 6) as usize);
        for i in 0..rings.saturating_sub(1) {
            for j in 0..radial {
                let a = i * stride + j;
                let b = (i + 1) * stride + j;
                indices.extend_from_slice(&[a, b, a + 1, b, b + 1, a + 1]);
            }
        }

        Self {
            label,
            topology: Topology::Triangles,
            vertices,
            indices,
        }
    }

    /// Hexagonal collar around the X axis.
    ///
    /// Side face `i` has its outward normal at angle `i * 60° + 30°` in the
    /// YZ plane; the caps are hexagonal rings down to `inner_radius`.
    #[must_use]
    pub fn hex_collar(label: impl Into<String>, apothem: f32, inner_radius: f32, length: f32) -> Self {
        let circumradius = apothem / FRAC_PI_6.cos();
        let half = length * 0.5;
        let corner = |k: u32, r: f32| {
            let a = k as f32 * TAU / 6.0;
            Vec3::new(0.0, r * a.cos(), r * a.sin())
        };

        let mut vertices = Vec::with_capacity(48);
        let mut indices = Vec::with_capacity(72);

        for face in 0..6u32 {
            let normal = hex_face_normal(face as usize);
            let p0 = corner(face, circumradius);
            let p1 = corner(face + 1, circumradius);
            let base = vertices.len() as u32;
            vertices.push(Vertex::new(p0 + Vec3::new(-half, 0.0, 0.0), normal, [0.0, 0.0]));
            vertices.push(Vertex::new(p0 + Vec3::new(half, 0.0, 0.0), normal, [1.0, 0.0]));
            vertices.push(Vertex::new(p1 + Vec3::new(half, 0.0, 0.0), normal, [1.0, 1.0]));
            vertices.push(Vertex::new(p1 + Vec3::new(-half, 0.0, 0.0), normal, [0.0, 1.0]));
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        for (x, normal) in [(-half, -Vec3::X), (half, Vec3::X)] {
            for k in 0..6u32 {
                let base = vertices.len() as u32;
                let offset = Vec3::new(x, 0.0, 0.0);
                vertices.push(Vertex::new(corner(k, circumradius) + offset, normal, [0.0, 0.0]));
                vertices.push(Vertex::new(corner(k + 1, circumradius) + offset, normal, [1.0, 0.0]));
                vertices.push(Vertex::new(corner(k + 1, inner_radius) + offset, normal, [1.0, 1.0]));
                vertices.push(Vertex::new(corner(k, inner_radius) + offset, normal, [0.0, 1.0]));
                indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
            }
        }

        Self {
            label: label.into(),
            topology: Topology::Triangles,
            vertices,
            indices,
        }
    }

    /// Rectangle in the XY plane facing +Z.
    ///
    /// UV origin is the top-left corner, matching canvas pixel order.
    #[must_use]
    pub fn quad(label: impl Into<String>, width: f32, height: f32) -> Self {
        let (hw, hh) = (width * 0.5, height * 0.5);
        let n = Vec3::Z;
        Self {
            label: label.into(),
            topology: Topology::Triangles,
            vertices: vec![
                Vertex::new(Vec3::new(-hw, hh, 0.0), n, [0.0, 0.0]),
                Vertex::new(Vec3::new(hw, hh, 0.0), n, [1.0, 0.0]),
                Vertex::new(Vec3::new(hw, -hh, 0.0), n, [1.0, 1.0]),
                Vertex::new(Vec3::new(-hw, -hh, 0.0), n, [0.0, 1.0]),
            ],
            indices: vec![0, 3, 2, 0, 2, 1],
        }
    }

    /// Flat ring in the YZ plane (around the X axis), facing +X.
    #[must_use]
    pub fn annulus(label: impl Into<String>, inner: f32, outer: f32, segments: u32) -> Self {
        let segments = segments.max(3);
        let mut vertices = Vec::with_capacity(((segments + 1) * 2) as usize);
        for j in 0..=segments {
            let v = j as f32 / segments as f32;
            let (s, c) = (v * TAU).sin_cos();
            vertices.push(Vertex::new(Vec3::new(0.0, inner * c, inner * s), Vec3::X, [0.0, v]));
            vertices.push(Vertex::new(Vec3::new(0.0, outer * c, outer * s), Vec3::X, [1.0, v]));
        }
        let mut indices = Vec::with_capacity((segments * 6) as usize);
        for j in 0..segments {
            let a = j * 2;
            indices.extend_from_slice(&[a, a + 1, a + 3, a, a + 3, a + 2]);
        }
        Self {
            label: label.into(),
            topology: Topology::Triangles,
            vertices,
            indices,
        }
    }

    /// Point buffer with room for `capacity` points, rewritten each frame.
    #[must_use]
    pub fn points(label: impl Into<String>, capacity: usize) -> Self {
        Self {
            label: label.into(),
            topology: Topology::Points,
            vertices: vec![Vertex::default(); capacity.max(1)],
            indices: Vec::new(),
        }
    }
}

/// Outward normal of hex collar face `face` (0..6).
#[must_use]
pub fn hex_face_normal(face: usize) -> Vec3 {
    let angle = hex_face_angle(face);
    Vec3::new(0.0, angle.cos(), angle.sin())
}

/// Angle of hex collar face `face` about the X axis: `face * 60° + 30°`.
#[must_use]
pub fn hex_face_angle(face: usize) -> f32 {
    (face % 6) as f32 * TAU / 6.0 + FRAC_PI_6
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_layout() {
        assert_eq!(Vertex::SIZE, 32);
    }

    #[test]
    fn test_tube_counts_and_radius() {
        let curve = PathCurve::straight(4.0);
        let tube = Geometry::tube("t", &curve, (0.0, 1.0), 0.5, 16, 12);
        assert_eq!(tube.vertex_count(), 17 * 13);
        assert_eq!(tube.triangle_count(), 16 * 12 * 2);
        let extent = tube.max_radial_extent(Vec3::ZERO, Vec3::X);
        assert!((extent - 0.5).abs() < 1e-3);
        assert!(tube.indices().iter().all(|&i| (i as usize) < tube.vertex_count()));
    }

    #[test]
    fn test_helix_sits_on_its_radius() {
        let curve = PathCurve::straight(4.0);
        let strand = Geometry::helix("s", &curve, (0.0, 1.0), 0.3, 0.05, 4.0, 0.0, 64).unwrap();
        let extent = strand.max_radial_extent(Vec3::ZERO, Vec3::X);
        assert!(extent > 0.3 && extent < 0.36, "extent {extent}");
    }

    #[test]
    fn test_hex_collar_faces_point_outward() {
        let collar = Geometry::hex_collar("h", 1.0, 0.9, 0.5);
        for face in 0..6 {
            let normal = hex_face_normal(face);
            let v = collar.vertices()[face * 4];
            let p = Vec3::from_array(v.position);
            assert!(Vec3::new(0.0, p.y, p.z).dot(normal) > 0.99);
            assert_eq!(Vec3::from_array(v.normal), normal);
        }
    }

    #[test]
    fn test_points_buffer() {
        let points = Geometry::points("p", 128);
        assert_eq!(points.topology(), Topology::Points);
        assert_eq!(points.vertex_count(), 128);
        assert_eq!(points.vertex_bytes().len(), 128 * Vertex::SIZE);
    }
}
