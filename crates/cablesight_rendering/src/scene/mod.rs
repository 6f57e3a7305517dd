//! # Scene
//!
//! Geometry, materials and the ownership tree that ties them together.

mod curve;
mod geometry;
mod graph;
mod material;
mod transform;

pub use curve::{CurveFrame, PathCurve};
pub use geometry::{hex_face_angle, hex_face_normal, Geometry, Topology, Vertex};
pub use graph::{DisposeReport, MaterialSlot, Mesh, Node, NodeId, NodeKind, SceneGraph};
pub use material::{MaterialLayer, ShaderUniforms, SharedTexture, UniformValue};
pub use transform::Transform;
