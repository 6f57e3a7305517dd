//! Fault overlays and the scanning ring.
//!
//! Overlays are built once, hidden, and switched per frame from the effect
//! parameter set. Only visible overlays get their materials touched.

use crate::assembly::cable::JOINT_PARAM;
use crate::assembly::textures::{MapSlot, TextureLibrary};
use crate::backend::RenderBackend;
use crate::effects::{EffectParameterSet, MAX_DISCHARGE_PARTICLES};
use crate::error::EngineResult;
use crate::scene::{Geometry, MaterialLayer, NodeId, PathCurve, SceneGraph, Transform};
use cablesight_shared::{Quaternion, Vec3};

/// Radius of the treeing sheet, just outside the insulation.
pub const TREEING_RADIUS: f32 = 0.605;
/// Radius of the heat and flow sheets, just outside the jacket.
pub const OUTER_SHEET_RADIUS: f32 = 0.815;
/// Scanning ring radii.
pub const SCAN_RING_RADII: (f32, f32) = (0.88, 0.96);

/// Scan sweep stays this far from the cable ends (curve parameter).
const SCAN_MARGIN: f32 = 0.15;

/// Handles to the overlay meshes.
#[derive(Debug, Clone)]
pub struct OverlayNodes {
    /// Group holding every overlay.
    pub group: NodeId,
    /// Branching discharge sheet.
    pub treeing: NodeId,
    /// Joint hot-spot sheet.
    pub heat: NodeId,
    /// Mechanical wear sheet.
    pub flow: NodeId,
    /// Water intrusion sheet.
    pub water: NodeId,
    /// Discharge point sprites.
    pub particles: NodeId,
    /// Scanning ring.
    pub scan_ring: NodeId,
}

/// Builds every overlay, hidden.
///
/// # Errors
///
/// Terminal backend error. On error the graph may hold a partial set; the
/// caller disposes it.
pub fn build_overlays<B: RenderBackend + ?Sized>(
    graph: &mut SceneGraph,
    backend: &mut B,
    parent: NodeId,
    curve: &PathCurve,
    library: &TextureLibrary,
) -> EngineResult<OverlayNodes> {
    let group = graph.add_group(parent, "overlays", Transform::IDENTITY)?;
    let around_joint = (JOINT_PARAM - 0.2, JOINT_PARAM + 0.2);

    let treeing = graph.spawn_mesh(
        backend,
        group,
        "overlay-treeing",
        &Geometry::tube("overlay-treeing", curve, around_joint, TREEING_RADIUS, 64, 32),
        vec![MaterialLayer::new([0.6, 0.75, 1.0])
            .with_opacity(0.9)
            .with_emissive([0.6, 0.75, 1.0], 0.0)
            .with_map(library.get(MapSlot::Treeing), [3.0, 2.0])],
        Transform::IDENTITY,
    )?;

    let heat = graph.spawn_mesh(
        backend,
        group,
        "overlay-heat",
        &Geometry::tube(
            "overlay-heat",
            curve,
            (JOINT_PARAM - 0.08, JOINT_PARAM + 0.08),
            OUTER_SHEET_RADIUS,
            24,
            32,
        ),
        vec![MaterialLayer::new([1.0, 0.3, 0.1])
            .with_opacity(0.5)
            .with_emissive([1.0, 0.3, 0.1], 0.0)],
        Transform::IDENTITY,
    )?;

    let flow = graph.spawn_mesh(
        backend,
        group,
        "overlay-flow",
        &Geometry::tube("overlay-flow", curve, (0.1, 0.9), OUTER_SHEET_RADIUS + 0.004, 96, 32),
        vec![MaterialLayer::new([1.0; 3])
            .with_opacity(0.7)
            .with_emissive([1.0; 3], 0.0)
            .with_map(library.get(MapSlot::Metal), [8.0, 2.0])],
        Transform::IDENTITY,
    )?;

    let water = graph.spawn_mesh(
        backend,
        group,
        "overlay-water",
        &Geometry::tube("overlay-water", curve, (0.1, 0.9), OUTER_SHEET_RADIUS + 0.006, 96, 32),
        vec![MaterialLayer::new([1.0; 3])
            .with_opacity(0.7)
            .with_emissive([1.0; 3], 0.0)
            .with_map(library.get(MapSlot::Water), [6.0, 2.0])],
        Transform::IDENTITY,
    )?;

    let particles = graph.spawn_mesh(
        backend,
        group,
        "discharge-particles",
        &Geometry::points("discharge-particles", MAX_DISCHARGE_PARTICLES),
        vec![MaterialLayer::new([0.75, 0.85, 1.0])
            .with_opacity(0.95)
            .with_emissive([0.75, 0.85, 1.0], 3.0)],
        Transform::IDENTITY,
    )?;

    let scan_ring = graph.spawn_mesh(
        backend,
        group,
        "scan-ring",
        &Geometry::annulus("scan-ring", SCAN_RING_RADII.0, SCAN_RING_RADII.1, 64),
        vec![MaterialLayer::new([0.2, 0.9, 1.0])
            .with_opacity(0.45)
            .with_emissive([0.2, 0.9, 1.0], 1.5)
            .with_map(library.get(MapSlot::Mesh), [1.0, 24.0])],
        Transform::IDENTITY,
    )?;

    for node in [treeing, heat, flow, water, particles, scan_ring] {
        graph.set_visible(node, false)?;
    }

    Ok(OverlayNodes {
        group,
        treeing,
        heat,
        flow,
        water,
        particles,
        scan_ring,
    })
}

/// Curve parameter of the scan ring: bounces between the margins at
/// `speed` cable lengths per second.
#[must_use]
pub fn scan_position(elapsed: f32, speed: f32) -> f32 {
    let phase = (elapsed * speed).rem_euclid(2.0);
    let tri = if phase < 1.0 { phase } else { 2.0 - phase };
    SCAN_MARGIN + (1.0 - 2.0 * SCAN_MARGIN) * tri
}

impl OverlayNodes {
    /// Shows, hides and tints the overlays for this frame.
    ///
    /// # Errors
    ///
    /// `StaleNode` if an overlay is gone.
    pub fn apply(&self, graph: &mut SceneGraph, params: &EffectParameterSet) -> EngineResult<()> {
        let glow = params.glow_intensity;
        let sheets = [
            (self.treeing, params.overlays.treeing, 0.35 + 0.6 * glow),
            (self.heat, params.overlays.heat, 0.2 + 0.5 * glow),
            (self.flow, params.overlays.flow && !params.overlays.water, 0.3 + 0.5 * glow),
            (self.water, params.overlays.flow && params.overlays.water, 0.3 + 0.5 * glow),
        ];
        for (node, visible, opacity) in sheets {
            graph.set_visible(node, visible)?;
            if visible {
                let layer = graph.material_mut(node, 0)?;
                layer.opacity = opacity.clamp(0.0, 1.0);
                layer.emissive = params.tint;
                layer.emissive_intensity = 2.0 * glow;
                layer.uniforms.merge(&params.uniforms);
            }
        }

        graph.set_visible(self.particles, params.particle_visible)?;
        if params.particle_visible {
            graph.material_mut(self.particles, 0)?.emissive = params.tint;
        }
        Ok(())
    }

    /// Moves the scan ring to curve parameter `s`; hidden unless `visible`.
    ///
    /// # Errors
    ///
    /// `StaleNode` if the ring is gone.
    pub fn place_scan_ring(&self, graph: &mut SceneGraph, curve: &PathCurve, s: f32, visible: bool) -> EngineResult<()> {
        graph.set_visible(self.scan_ring, visible)?;
        if visible {
            let transform = Transform::from_translation(curve.point_at(s))
                .with_rotation(Quaternion::from_rotation_arc(Vec3::X, curve.tangent_at(s)));
            graph.set_transform(self.scan_ring, transform)?;
        }
        Ok(())
    }
}
