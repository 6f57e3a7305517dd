//! # Cable Assembly
//!
//! Concentric layer stack swept along the centerline:
//!
//! ```text
//!            jacket 0.80 ─────────┐      ┌───────── (cut back 0.26)
//!             armor 0.74 ───────────┐  ┌─────────── (cut back 0.22)
//!            shield 0.67 ─────────────┐┌──────────── ...
//!     outer semicon 0.63
//!        insulation 0.60
//!     inner semicon 0.38
//!  strands (helix) 0.33 + 0.03
//!         conductor 0.30 ════════════════════════════ (continuous)
//!                                 joint
//! ```
//!
//! Each layer is stripped back further from the joint than the one inside
//! it, so the stack reads as a staged joint preparation.

use std::f32::consts::TAU;

use crate::assembly::textures::{MapSlot, TextureLibrary};
use crate::backend::RenderBackend;
use crate::error::{EngineError, EngineResult};
use crate::scene::{Geometry, MaterialLayer, NodeId, PathCurve, SceneGraph, Transform};

/// Curve parameter of the joint.
pub const JOINT_PARAM: f32 = 0.5;

const TUBULAR_SEGMENTS: u32 = 96;
const RADIAL_SEGMENTS: u32 = 32;
const STRAND_SEGMENTS: u32 = 240;

/// Cross-section of one layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LayerShape {
    /// Solid tube of the given outer radius.
    Tube {
        /// Outer radius.
        radius: f32,
    },
    /// Helically wound strands.
    Strands {
        /// Number of strands.
        count: u32,
        /// Distance of strand centers from the axis.
        helix_radius: f32,
        /// Radius of one strand.
        strand_radius: f32,
        /// Turns over the full cable length.
        turns: f32,
    },
}

/// One entry of the layer stack.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerSpec {
    /// Node name suffix.
    pub name: &'static str,
    /// Cross-section.
    pub shape: LayerShape,
    /// Half-width of the stripped window around the joint, in curve parameter.
    pub cutback: f32,
    /// Base color.
    pub color: [f32; 3],
    /// Roughness.
    pub roughness: f32,
    /// Metalness.
    pub metalness: f32,
    /// Procedural map, if any.
    pub map: Option<MapSlot>,
    /// Map tiling (along, around).
    pub repeat: [f32; 2],
}

impl LayerSpec {
    /// Largest distance of the layer surface from the centerline.
    #[must_use]
    pub fn outer_extent(&self) -> f32 {
        match self.shape {
            LayerShape::Tube { radius } => radius,
            LayerShape::Strands {
                helix_radius,
                strand_radius,
                ..
            } => helix_radius + strand_radius,
        }
    }

    fn material(&self, library: &TextureLibrary) -> MaterialLayer {
        MaterialLayer::new(self.color)
            .with_surface(self.roughness, self.metalness)
            .with_map(self.map.and_then(|slot| library.get(slot)), self.repeat)
    }
}

/// The joint's layer stack, innermost first.
pub const CABLE_LAYERS: [LayerSpec; 8] = [
    LayerSpec {
        name: "conductor",
        shape: LayerShape::Tube { radius: 0.30 },
        cutback: 0.0,
        color: [0.72, 0.45, 0.20],
        roughness: 0.35,
        metalness: 1.0,
        map: Some(MapSlot::Copper),
        repeat: [24.0, 2.0],
    },
    LayerSpec {
        name: "strands",
        shape: LayerShape::Strands {
            count: 6,
            helix_radius: 0.33,
            strand_radius: 0.03,
            turns: 14.0,
        },
        cutback: 0.0,
        color: [0.78, 0.50, 0.24],
        roughness: 0.3,
        metalness: 1.0,
        map: None,
        repeat: [1.0, 1.0],
    },
    LayerSpec {
        name: "inner-semicon",
        shape: LayerShape::Tube { radius: 0.38 },
        cutback: 0.04,
        color: [0.06, 0.06, 0.07],
        roughness: 0.8,
        metalness: 0.0,
        map: Some(MapSlot::Speckle),
        repeat: [16.0, 2.0],
    },
    LayerSpec {
        name: "insulation",
        shape: LayerShape::Tube { radius: 0.60 },
        cutback: 0.08,
        color: [0.86, 0.85, 0.76],
        roughness: 0.45,
        metalness: 0.0,
        map: Some(MapSlot::Speckle),
        repeat: [8.0, 2.0],
    },
    LayerSpec {
        name: "outer-semicon",
        shape: LayerShape::Tube { radius: 0.63 },
        cutback: 0.14,
        color: [0.08, 0.08, 0.09],
        roughness: 0.85,
        metalness: 0.0,
        map: Some(MapSlot::Speckle),
        repeat: [16.0, 2.0],
    },
    LayerSpec {
        name: "shield",
        shape: LayerShape::Tube { radius: 0.67 },
        cutback: 0.18,
        color: [0.70, 0.48, 0.30],
        roughness: 0.4,
        metalness: 0.9,
        map: Some(MapSlot::Braid),
        repeat: [32.0, 4.0],
    },
    LayerSpec {
        name: "armor",
        shape: LayerShape::Tube { radius: 0.74 },
        cutback: 0.22,
        color: [0.55, 0.56, 0.58],
        roughness: 0.5,
        metalness: 0.85,
        map: Some(MapSlot::Metal),
        repeat: [12.0, 2.0],
    },
    LayerSpec {
        name: "jacket",
        shape: LayerShape::Tube { radius: 0.80 },
        cutback: 0.26,
        color: [0.05, 0.05, 0.05],
        roughness: 0.7,
        metalness: 0.0,
        map: Some(MapSlot::Speckle),
        repeat: [10.0, 2.0],
    },
];

/// Checks that layer extents strictly increase outward and strands clear
/// the conductor.
///
/// # Errors
///
/// `InvalidGeometry` naming the first offending pair.
pub fn validate_layers(layers: &[LayerSpec]) -> EngineResult<()> {
    for pair in layers.windows(2) {
        let (inner, outer) = (&pair[0], &pair[1]);
        if outer.outer_extent() <= inner.outer_extent() {
            return Err(EngineError::InvalidGeometry(format!(
                "layer `{}` ({}) does not enclose `{}` ({})",
                outer.name,
                outer.outer_extent(),
                inner.name,
                inner.outer_extent()
            )));
        }
        if let LayerShape::Strands {
            helix_radius,
            strand_radius,
            ..
        } = outer.shape
        {
            if helix_radius - strand_radius < inner.outer_extent() - 1e-4 {
                return Err(EngineError::InvalidGeometry(format!(
                    "strands of `{}` cut into `{}`",
                    outer.name, inner.name
                )));
            }
        }
    }
    Ok(())
}

/// Handles to the built cable.
#[derive(Debug, Clone)]
pub struct CableNodes {
    /// Group holding every layer.
    pub group: NodeId,
    /// One group per layer, innermost first.
    pub layers: Vec<NodeId>,
}

/// Builds the cable along `curve` into a fresh graph.
///
/// # Errors
///
/// `InvalidGeometry` for a broken layer stack or a terminal backend error.
/// Nothing stays allocated on failure.
pub fn build_cable_assembly<B: RenderBackend + ?Sized>(
    backend: &mut B,
    curve: &PathCurve,
    library: &TextureLibrary,
) -> EngineResult<SceneGraph> {
    let mut graph = SceneGraph::new();
    let root = graph.root();
    match build_cable(&mut graph, backend, root, curve, library, &CABLE_LAYERS) {
        Ok(_) => Ok(graph),
        Err(err) => {
            graph.dispose(backend);
            Err(err)
        }
    }
}

/// Builds `layers` along `curve` under `parent`.
///
/// On error the graph may hold a partial cable; the caller disposes it.
///
/// # Errors
///
/// `InvalidGeometry` or a terminal backend error.
pub fn build_cable<B: RenderBackend + ?Sized>(
    graph: &mut SceneGraph,
    backend: &mut B,
    parent: NodeId,
    curve: &PathCurve,
    library: &TextureLibrary,
    layers: &[LayerSpec],
) -> EngineResult<CableNodes> {
    validate_layers(layers)?;
    let group = graph.add_group(parent, "cable", Transform::IDENTITY)?;
    let mut layer_nodes = Vec::with_capacity(layers.len());

    for spec in layers {
        let layer_group = graph.add_group(group, format!("layer-{}", spec.name), Transform::IDENTITY)?;
        layer_nodes.push(layer_group);

        match spec.shape {
            LayerShape::Tube { radius } => {
                for (side, span) in spans(spec.cutback) {
                    let name = format!("layer-{}{}", spec.name, side);
                    let geometry = Geometry::tube(&name, curve, span, radius, TUBULAR_SEGMENTS, RADIAL_SEGMENTS);
                    graph.spawn_mesh(
                        backend,
                        layer_group,
                        name,
                        &geometry,
                        vec![spec.material(library)],
                        Transform::IDENTITY,
                    )?;
                }
            }
            LayerShape::Strands {
                count,
                helix_radius,
                strand_radius,
                turns,
            } => {
                for strand in 0..count {
                    let name = format!("layer-{}-{}", spec.name, strand);
                    let phase = TAU * strand as f32 / count as f32;
                    let geometry = Geometry::helix(
                        &name,
                        curve,
                        (0.0, 1.0),
                        helix_radius,
                        strand_radius,
                        turns,
                        phase,
                        STRAND_SEGMENTS,
                    )?;
                    graph.spawn_mesh(
                        backend,
                        layer_group,
                        name,
                        &geometry,
                        vec![spec.material(library)],
                        Transform::IDENTITY,
                    )?;
                }
            }
        }
    }

    tracing::debug!("cable assembled: {} layers, {} meshes", layers.len(), graph.mesh_count());
    Ok(CableNodes {
        group,
        layers: layer_nodes,
    })
}

/// Curve spans covered by a layer with the given cutback.
fn spans(cutback: f32) -> Vec<(&'static str, (f32, f32))> {
    if cutback <= 0.0 {
        vec![("-full", (0.0, 1.0))]
    } else {
        let window = cutback.min(JOINT_PARAM - 0.01);
        vec![
            ("-left", (0.0, JOINT_PARAM - window)),
            ("-right", (JOINT_PARAM + window, 1.0)),
        ]
    }
}
