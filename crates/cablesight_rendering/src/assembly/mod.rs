//! # Material/Geometry Assembler
//!
//! Builds the whole scene once per mount:
//!
//! ```text
//! root
//! ├── cable      layered stack along the centerline
//! ├── sensor     hex housing, six screens, six LEDs
//! └── overlays   fault sheets, discharge sprites, scan ring
//! ```
//!
//! Procedural maps are generated first and shared between materials. After
//! assembly only materials hold them, so each map lives exactly as long as
//! the last material that samples it.

mod cable;
mod overlays;
mod screens;
mod sensor;
mod textures;

pub use cable::{
    build_cable, build_cable_assembly, validate_layers, CableNodes, LayerShape, LayerSpec, CABLE_LAYERS, JOINT_PARAM,
};
pub use overlays::{build_overlays, scan_position, OverlayNodes, OUTER_SHEET_RADIUS, SCAN_RING_RADII, TREEING_RADIUS};
pub use screens::{InstrumentScreen, ScreenBank, ScreenChannel, HISTORY_LEN};
pub use sensor::{build_sensor, led_color, screen_rotation, SensorModule};
pub use textures::{MapSlot, TextureLibrary};

use cablesight_shared::{EngineConfig, FaultMode, TelemetrySample, TimingSettings, Vec3, SENSOR_FACES};

use crate::backend::RenderBackend;
use crate::effects::EffectParameterSet;
use crate::error::EngineResult;
use crate::scene::{DisposeReport, PathCurve, SceneGraph, SharedTexture};
use crate::scheduler::FrameInfo;
use crate::telemetry;

/// Cable run length in scene units.
pub const CABLE_LENGTH: f32 = 12.0;
/// Sag at the cable ends.
pub const CABLE_SAG: f32 = 0.3;

/// Everything built for one mount.
#[derive(Debug)]
pub struct Assembly {
    graph: SceneGraph,
    curve: PathCurve,
    /// Cable handles.
    pub cable: CableNodes,
    /// Sensor housing.
    pub sensor: SensorModule,
    /// Overlays.
    pub overlays: OverlayNodes,
    /// Instrument screens.
    pub screens: ScreenBank,
}

/// Builds the full scene for `mode`.
///
/// # Errors
///
/// `InvalidGeometry` or a terminal backend error. Nothing stays allocated
/// on failure.
pub fn assemble<B: RenderBackend + ?Sized>(
    backend: &mut B,
    config: &EngineConfig,
    mode: FaultMode,
) -> EngineResult<Assembly> {
    let curve = PathCurve::joint_run(CABLE_LENGTH, CABLE_SAG);
    let mut library = TextureLibrary::generate(backend, &config.textures, config.texture_seed)?;

    let mut screens = ScreenBank::new(config.textures.screen_width, config.textures.screen_height);
    let faces = match screens.upload(backend, mode, &telemetry::sample(mode, 0.0)) {
        Ok(faces) => faces,
        Err(err) => {
            library.release_all(backend);
            return Err(err);
        }
    };

    let mut graph = SceneGraph::new();
    let built = build_all(&mut graph, backend, &curve, &library, &faces);

    // Materials now hold their own references
    let faces_freed: u32 = faces
        .into_iter()
        .flatten()
        .map(|face| u32::from(face.release(backend)))
        .sum();
    let maps_freed = library.release_all(backend);

    match built {
        Ok((cable, sensor, overlays)) => {
            tracing::info!(
                "scene assembled: {} nodes, {} meshes, {} screens ({} unused maps freed)",
                graph.len(),
                graph.mesh_count(),
                screens.len(),
                maps_freed + faces_freed
            );
            Ok(Assembly {
                graph,
                curve,
                cable,
                sensor,
                overlays,
                screens,
            })
        }
        Err(err) => {
            screens.forget_textures();
            graph.dispose(backend);
            Err(err)
        }
    }
}

fn build_all<B: RenderBackend + ?Sized>(
    graph: &mut SceneGraph,
    backend: &mut B,
    curve: &PathCurve,
    library: &TextureLibrary,
    faces: &[Option<SharedTexture>; SENSOR_FACES],
) -> EngineResult<(CableNodes, SensorModule, OverlayNodes)> {
    let root = graph.root();
    let cable = build_cable(graph, backend, root, curve, library, &CABLE_LAYERS)?;
    let sensor = build_sensor(graph, backend, root, curve, JOINT_PARAM, library, faces)?;
    let overlays = build_overlays(graph, backend, root, curve, library)?;
    Ok((cable, sensor, overlays))
}

impl Assembly {
    /// The scene graph.
    #[must_use]
    pub const fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    /// Mutable scene graph.
    pub fn graph_mut(&mut self) -> &mut SceneGraph {
        &mut self.graph
    }

    /// Cable centerline.
    #[must_use]
    pub const fn curve(&self) -> &PathCurve {
        &self.curve
    }

    /// Where the sensor sits along the cable.
    #[must_use]
    pub fn joint_position(&self) -> Vec3 {
        self.curve.point_at(JOINT_PARAM)
    }

    /// Overlays for this frame's effect parameters.
    ///
    /// # Errors
    ///
    /// `StaleNode` if an overlay is gone.
    pub fn apply_effects(&mut self, params: &EffectParameterSet) -> EngineResult<()> {
        self.overlays.apply(&mut self.graph, params)
    }

    /// Spins the sensor rotor and sweeps the scan ring.
    ///
    /// # Errors
    ///
    /// `StaleNode` if the rotor or ring is gone.
    pub fn advance_scan(&mut self, frame: &FrameInfo, timing: &TimingSettings, scanning: bool) -> EngineResult<()> {
        self.sensor
            .advance_orbit(&mut self.graph, frame.delta, timing.sensor_orbit_speed, scanning)?;
        let s = scan_position(frame.elapsed, timing.scan_sweep_speed);
        self.overlays.place_scan_ring(&mut self.graph, &self.curve, s, scanning)
    }

    /// Toggles the sensor LEDs. Returns the new state.
    ///
    /// # Errors
    ///
    /// `StaleNode` if an LED is gone.
    pub fn blink(&mut self, mode: FaultMode) -> EngineResult<bool> {
        self.sensor.blink(&mut self.graph, mode)
    }

    /// Repaints and re-uploads every instrument screen.
    ///
    /// # Errors
    ///
    /// Terminal backend error.
    pub fn redraw_screens<B: RenderBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        mode: FaultMode,
        sample: &TelemetrySample,
    ) -> EngineResult<u32> {
        let lit = self.sensor.leds_lit();
        self.screens.redraw(backend, mode, sample, lit)
    }

    /// Releases every GPU resource of the scene, bottom-up, once.
    pub fn dispose<B: RenderBackend + ?Sized>(mut self, backend: &mut B) -> DisposeReport {
        self.screens.forget_textures();
        self.graph.dispose(backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{HeadlessBackend, ResourceKind};
    use cablesight_shared::TextureSettings;

    fn small_config() -> EngineConfig {
        EngineConfig {
            texture_seed: Some(5),
            textures: TextureSettings {
                braid: 32,
                speckle: 32,
                metal: 32,
                copper: 32,
                mesh: 32,
                treeing: 32,
                water: 32,
                screen_width: 64,
                screen_height: 32,
            },
            ..EngineConfig::default()
        }
    }

    #[test]
    fn test_assemble_and_dispose_releases_everything() {
        let mut backend = HeadlessBackend::new();
        let assembly = assemble(&mut backend, &small_config(), FaultMode::Baseline).unwrap();
        let live = backend.live_counts();
        assert_eq!(live.textures, 7 + 6);
        assert!(live.geometries > 0 && live.materials >= live.geometries);

        let report = assembly.dispose(&mut backend);
        assert_eq!(report.textures, 13);
        assert_eq!(backend.live_counts().total(), 0);
        assert_eq!(backend.double_releases(), 0);
    }

    #[test]
    fn test_failed_assembly_leaves_nothing() {
        let mut backend = HeadlessBackend::new();
        backend.fail_next_allocation(ResourceKind::Geometry);
        assert!(assemble(&mut backend, &small_config(), FaultMode::Baseline).is_err());
        assert_eq!(backend.live_counts().total(), 0);
    }
}
