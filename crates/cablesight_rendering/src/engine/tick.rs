//! Per-tick work of a mounted engine.
//!
//! [`MountedScene`] is everything a mount builds; [`TickSystems`] borrows it
//! together with the backend and the telemetry sink for exactly one tick.
//! The inputs snapshot is copied in by value, so a tick never sees a
//! half-applied change from the host.

use cablesight_shared::{EngineInputs, Subsystem, TelemetrySample, TimingSettings};

use crate::assembly::{Assembly, JOINT_PARAM, TREEING_RADIUS};
use crate::backend::{DrawItem, RenderBackend, RenderPass, SurfaceId};
use crate::camera::Camera;
use crate::effects::{DischargeEmitter, EmissionRing, FaultEffectMachine};
use crate::error::EngineResult;
use crate::scheduler::{FrameInfo, FrameSystems};
use crate::telemetry::{self, TelemetryEmitter, TelemetrySink};

/// Background color of every pass.
pub const CLEAR_COLOR: [f32; 4] = [0.02, 0.03, 0.05, 1.0];

/// Everything one mount owns besides the scheduler.
#[derive(Debug)]
pub(crate) struct MountedScene {
    pub surface: SurfaceId,
    pub size: (u32, u32),
    pub assembly: Assembly,
    pub machine: FaultEffectMachine,
    pub emitter: TelemetryEmitter,
    pub particles: DischargeEmitter,
    pub camera: Camera,
    pub latest: TelemetrySample,
    pub draws: Vec<DrawItem>,
    pub demo_fired: bool,
}

/// One tick's view of the engine.
pub(crate) struct TickSystems<'a, B: RenderBackend + ?Sized> {
    pub scene: &'a mut MountedScene,
    pub backend: &'a mut B,
    pub sink: &'a mut Option<Box<dyn TelemetrySink>>,
    pub inputs: EngineInputs,
    pub timing: &'a TimingSettings,
}

impl<B: RenderBackend + ?Sized> FrameSystems for TickSystems<'_, B> {
    fn update_effects(&mut self, frame: &FrameInfo) -> EngineResult<()> {
        let scene = &mut *self.scene;
        let mode = self.inputs.fault_mode;

        let params = scene.machine.tick(mode, frame.elapsed);
        scene.assembly.apply_effects(params)?;
        scene.latest = telemetry::sample(mode, frame.elapsed);

        let curve = scene.assembly.curve();
        let ring = EmissionRing {
            origin: scene.assembly.joint_position(),
            axis: curve.tangent_at(JOINT_PARAM),
            radius: TREEING_RADIUS,
        };
        scene.particles.update(frame.delta, params.particle_visible, &ring);

        scene.assembly.advance_scan(frame, self.timing, self.inputs.is_scanning)?;
        scene.camera.advance(frame.delta, self.timing.camera_orbit_speed);
        Ok(())
    }

    fn run_gated(&mut self, subsystem: Subsystem, frame: &FrameInfo) -> EngineResult<bool> {
        let scene = &mut *self.scene;
        let mode = scene.machine.mode();
        match subsystem {
            Subsystem::HistorySample => {
                scene.assembly.screens.record(&scene.latest);
                Ok(false)
            }
            Subsystem::ScreenRedraw => {
                let updated = scene.assembly.redraw_screens(&mut *self.backend, mode, &scene.latest)?;
                tracing::debug!("frame {}: {} screens redrawn", frame.frame, updated);
                Ok(false)
            }
            Subsystem::IndicatorBlink => {
                scene.assembly.blink(mode)?;
                Ok(false)
            }
            Subsystem::SensorTelemetry => Ok(scene.emitter.emit(&scene.latest, self.sink.as_deref_mut())),
        }
    }

    fn render(&mut self, frame: &FrameInfo) -> EngineResult<u32> {
        let scene = &mut *self.scene;
        scene.assembly.graph_mut().flush_materials(&mut *self.backend)?;

        scene.draws.clear();
        scene.assembly.graph().collect_draws(&mut scene.draws);

        let particle_count = scene.particles.alive_count();
        let pass = RenderPass {
            frame: frame.frame,
            surface: scene.surface,
            view_projection: scene.camera.view_projection(),
            camera_position: scene.camera.position(),
            draws: &scene.draws,
            particles: scene.particles.as_bytes(),
            particle_count,
            clear_color: CLEAR_COLOR,
        };
        self.backend.render(&pass)?;
        Ok(particle_count)
    }
}
