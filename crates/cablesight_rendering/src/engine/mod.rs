//! # Resource Lifecycle Manager
//!
//! [`Engine`] owns one mount at a time: render surface, scene, scheduler and
//! display link. Every transition is an explicit [`LifecycleState`], so
//! repeated mount or unmount calls are no-ops rather than guarded ad hoc.
//!
//! Teardown order (unmount, and the Failed transition):
//! 1. Cancel the display link, no tick can be scheduled afterwards
//! 2. Dispose the scene graph bottom-up (geometry, materials, textures)
//! 3. Detach the render surface from the host
//! 4. Destroy the surface and drop every reference
//!
//! ## Usage
//!
//! ```rust,ignore
//! let mut engine = Engine::new(HeadlessBackend::new(), HostContainer::new(800, 600), config)?;
//! let inputs = engine.inputs();
//! engine.mount()?;
//! loop {
//!     engine.on_display_refresh(now())?;
//!     inputs.update(|i| i.is_scanning = true);
//! }
//! ```

mod host;
mod lifecycle;
mod tick;

pub use host::{HostContainer, HostSurface};
pub use lifecycle::LifecycleState;
pub use tick::CLEAR_COLOR;

use cablesight_core::{InputCell, InputWriter};
use cablesight_procedural::TextureSeed;
use cablesight_shared::{EngineConfig, EngineInputs};

use crate::assembly::{self, Assembly};
use crate::backend::RenderBackend;
use crate::camera::Camera;
use crate::effects::{DischargeConfig, DischargeEmitter, FaultEffectMachine, MAX_DISCHARGE_PARTICLES};
use crate::error::{EngineError, EngineResult};
use crate::scheduler::{AnimationScheduler, CadenceTable, DisplayLink, FrameResult, LoopStats};
use crate::telemetry::{self, TelemetryEmitter, TelemetrySink};
use tick::{MountedScene, TickSystems};

/// Distance of the orbiting camera from the joint.
const CAMERA_RADIUS: f32 = 6.5;
/// Height of the orbiting camera above the joint.
const CAMERA_HEIGHT: f32 = 2.0;
/// Salt separating the particle stream from the texture stream.
const PARTICLE_SEED_SALT: u64 = 0x5EED_0F_D15C;

/// A mounted scene and its loop.
#[derive(Debug)]
struct Mount {
    scene: MountedScene,
    scheduler: AnimationScheduler,
    link: DisplayLink,
}

/// One visualization engine instance.
pub struct Engine<B: RenderBackend, H: HostSurface> {
    backend: B,
    host: H,
    config: EngineConfig,
    cadence: CadenceTable,
    inputs: InputCell<EngineInputs>,
    state: LifecycleState,
    mount: Option<Mount>,
    sink: Option<Box<dyn TelemetrySink>>,
    on_complete: Option<Box<dyn FnMut()>>,
    last_error: Option<EngineError>,
    last_stats: LoopStats,
    mounts: u64,
}

impl<B: RenderBackend, H: HostSurface> Engine<B, H> {
    /// Creates an unmounted engine.
    ///
    /// # Errors
    ///
    /// `Config` if the configuration fails validation, `InvalidCadence` if a
    /// period is zero.
    pub fn new(backend: B, host: H, config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        let cadence = CadenceTable::from_settings(&config.cadence)?;
        let inputs = InputCell::new(EngineInputs {
            fault_mode: config.initial_fault_mode,
            ..EngineInputs::default()
        });
        Ok(Self {
            backend,
            host,
            config,
            cadence,
            inputs,
            state: LifecycleState::Unmounted,
            mount: None,
            sink: None,
            on_complete: None,
            last_error: None,
            last_stats: LoopStats::default(),
            mounts: 0,
        })
    }

    /// Writer for the inbound inputs. Changes apply from the next tick.
    #[must_use]
    pub fn inputs(&self) -> InputWriter<EngineInputs> {
        self.inputs.writer()
    }

    /// Current inputs, as the next tick will read them.
    #[must_use]
    pub fn current_inputs(&self) -> EngineInputs {
        self.inputs.read().value
    }

    /// Installs the telemetry consumer.
    pub fn set_telemetry_sink(&mut self, sink: impl TelemetrySink + 'static) {
        self.sink = Some(Box::new(sink));
    }

    /// Installs the auto-demo completion callback.
    pub fn set_completion_callback(&mut self, callback: impl FnMut() + 'static) {
        self.on_complete = Some(Box::new(callback));
    }

    /// Lifecycle state.
    #[must_use]
    pub const fn state(&self) -> LifecycleState {
        self.state
    }

    /// The terminal error that moved the engine to Failed, if any.
    #[must_use]
    pub const fn last_error(&self) -> Option<&EngineError> {
        self.last_error.as_ref()
    }

    /// The render backend.
    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutable backend access, for hosts that drive it directly.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// The host surface.
    #[must_use]
    pub const fn host(&self) -> &H {
        &self.host
    }

    /// Mutable host access.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Effective configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Loop statistics of the current mount, or of the last one.
    #[must_use]
    pub fn stats(&self) -> LoopStats {
        self.mount.as_ref().map_or(self.last_stats, |m| m.scheduler.stats())
    }

    /// Scenes built over the engine's lifetime.
    #[must_use]
    pub const fn mounts(&self) -> u64 {
        self.mounts
    }

    /// The mounted scene, if any.
    #[must_use]
    pub fn assembly(&self) -> Option<&Assembly> {
        self.mount.as_ref().map(|m| &m.scene.assembly)
    }

    /// Active render surface size, if mounted.
    #[must_use]
    pub fn surface_size(&self) -> Option<(u32, u32)> {
        self.mount.as_ref().map(|m| m.scene.size)
    }

    /// Camera of the current mount.
    #[must_use]
    pub fn camera(&self) -> Option<&Camera> {
        self.mount.as_ref().map(|m| &m.scene.camera)
    }

    /// Last telemetry sample computed by a tick.
    #[must_use]
    pub fn latest_sample(&self) -> Option<cablesight_shared::TelemetrySample> {
        self.mount.as_ref().map(|m| m.scene.latest)
    }

    /// Mounts at the host's current size.
    ///
    /// A no-op while Mounting, Mounted or Suspended. An unusable size or an
    /// unavailable surface leaves the engine Pending until a valid
    /// [`Self::resize`].
    ///
    /// # Errors
    ///
    /// The terminal error if construction failed (the engine is then
    /// Failed), or the stored error when called on a Failed engine.
    pub fn mount(&mut self) -> EngineResult<()> {
        let (width, height) = self.host.size();
        match self.state {
            LifecycleState::Mounting
            | LifecycleState::Mounted
            | LifecycleState::Suspended { .. }
            | LifecycleState::Unmounting => {
                tracing::debug!("mount ignored: already {}", self.state);
                Ok(())
            }
            LifecycleState::Failed => Err(self.last_error.clone().unwrap_or(EngineError::ContextLost)),
            LifecycleState::Unmounted | LifecycleState::Pending { .. } => self.mount_at(width, height),
        }
    }

    /// Host size changed.
    ///
    /// | State | Valid size | Too small |
    /// |---|---|---|
    /// | Pending | mount | stay Pending |
    /// | Mounted | resize target and projection | suspend |
    /// | Suspended | resume | stay Suspended |
    ///
    /// Other states ignore resizes.
    ///
    /// # Errors
    ///
    /// A terminal error from the backend (the engine is then Failed).
    pub fn resize(&mut self, width: u32, height: u32) -> EngineResult<()> {
        let usable = self.config.surface.is_usable(width, height);
        match self.state {
            LifecycleState::Pending { .. } => {
                if usable {
                    self.mount_at(width, height)
                } else {
                    self.state = LifecycleState::Pending { width, height };
                    Ok(())
                }
            }
            LifecycleState::Mounted if !usable => {
                if let Some(mount) = self.mount.as_mut() {
                    mount.link.cancel();
                }
                self.state = LifecycleState::Suspended { width, height };
                tracing::warn!("host shrank to {}x{}: ticking suspended", width, height);
                Ok(())
            }
            LifecycleState::Mounted => self.apply_size(width, height),
            LifecycleState::Suspended { .. } if usable => {
                self.apply_size(width, height)?;
                if let Some(mount) = self.mount.as_mut() {
                    mount.link = DisplayLink::new();
                    mount.link.request();
                }
                self.state = LifecycleState::Mounted;
                tracing::info!("host back to {}x{}: ticking resumed", width, height);
                Ok(())
            }
            LifecycleState::Suspended { .. } => {
                self.state = LifecycleState::Suspended { width, height };
                Ok(())
            }
            LifecycleState::Unmounted
            | LifecycleState::Mounting
            | LifecycleState::Unmounting
            | LifecycleState::Failed => Ok(()),
        }
    }

    /// Tears the current mount down. A no-op when nothing is mounted.
    ///
    /// Returns once every resource is released and the surface detached,
    /// so a following [`Self::mount`] starts from scratch.
    pub fn unmount(&mut self) {
        match self.state {
            LifecycleState::Unmounted | LifecycleState::Unmounting | LifecycleState::Failed => {
                tracing::debug!("unmount ignored: {}", self.state);
                return;
            }
            LifecycleState::Pending { .. } => {
                self.state = LifecycleState::Unmounted;
                tracing::info!("pending mount abandoned");
                return;
            }
            LifecycleState::Mounting | LifecycleState::Mounted | LifecycleState::Suspended { .. } => {}
        }

        self.state = LifecycleState::Unmounting;
        if let Some(mount) = self.mount.take() {
            self.teardown(mount);
        }
        self.state = LifecycleState::Unmounted;
        tracing::info!("engine unmounted");
    }

    /// Display refresh callback.
    ///
    /// Runs one tick if a frame was requested, then requests the next.
    /// Refreshes that arrive with nothing requested (suspended, unmounted,
    /// cancelled) are ignored and return `Ok(None)`.
    ///
    /// # Errors
    ///
    /// The terminal error that stopped the tick; the engine is then Failed
    /// with every resource released.
    pub fn on_display_refresh(&mut self, now: f64) -> EngineResult<Option<FrameResult>> {
        let Some(mount) = self.mount.as_mut() else {
            return Ok(None);
        };
        if self.state != LifecycleState::Mounted || !mount.link.take_pending() {
            mount.scheduler.note_ignored_refresh();
            return Ok(None);
        }

        // One snapshot per tick, by value
        let inputs = self.inputs.read().value;
        let outcome = {
            let mut systems = TickSystems {
                scene: &mut mount.scene,
                backend: &mut self.backend,
                sink: &mut self.sink,
                inputs,
                timing: &self.config.timing,
            };
            mount.scheduler.tick(now, &mut systems)
        };

        match outcome {
            Ok(result) => {
                mount.link.request();
                if inputs.is_auto_demo
                    && !mount.scene.demo_fired
                    && result.elapsed >= self.config.timing.auto_demo_cycle_secs
                {
                    mount.scene.demo_fired = true;
                    tracing::info!("auto-demo cycle complete at {:.2}s", result.elapsed);
                    if let Some(callback) = self.on_complete.as_mut() {
                        callback();
                    }
                }
                Ok(Some(result))
            }
            Err(err) if err.is_terminal() => {
                self.fail(err.clone());
                Err(err)
            }
            Err(err) => {
                mount.link.request();
                tracing::warn!("tick {} failed: {}", mount.scheduler.frame(), err);
                Err(err)
            }
        }
    }

    fn mount_at(&mut self, width: u32, height: u32) -> EngineResult<()> {
        if !self.config.surface.is_usable(width, height) {
            self.state = LifecycleState::Pending { width, height };
            tracing::info!("host is {}x{}: mount deferred", width, height);
            return Ok(());
        }

        self.state = LifecycleState::Mounting;
        match self.build(width, height) {
            Ok(mut mount) => {
                self.host.attach(mount.scene.surface);
                mount.link.request();
                self.mount = Some(mount);
                self.mounts += 1;
                self.state = LifecycleState::Mounted;
                tracing::info!("engine mounted at {}x{} (mount #{})", width, height, self.mounts);
                Ok(())
            }
            Err(EngineError::SurfaceUnavailable { .. }) => {
                self.state = LifecycleState::Pending { width, height };
                tracing::warn!("no render surface at {}x{}: mount deferred", width, height);
                Ok(())
            }
            Err(err) => {
                self.fail(err.clone());
                Err(err)
            }
        }
    }

    /// Builds a complete mount. Nothing stays allocated on error.
    fn build(&mut self, width: u32, height: u32) -> EngineResult<Mount> {
        let surface = self.backend.create_surface(width, height)?;
        let mode = self.inputs.read().value.fault_mode;
        let assembly = match assembly::assemble(&mut self.backend, &self.config, mode) {
            Ok(assembly) => assembly,
            Err(err) => {
                self.backend.destroy_surface(surface);
                return Err(err);
            }
        };

        let mut camera = Camera::new(assembly.joint_position(), CAMERA_RADIUS, CAMERA_HEIGHT);
        camera.set_viewport(width, height);
        let particle_seed = self
            .config
            .texture_seed
            .map_or_else(|| TextureSeed::fresh().value(), |seed| seed ^ PARTICLE_SEED_SALT);

        Ok(Mount {
            scene: MountedScene {
                surface,
                size: (width, height),
                assembly,
                machine: FaultEffectMachine::new(mode),
                emitter: TelemetryEmitter::new(self.config.thresholds),
                particles: DischargeEmitter::new(MAX_DISCHARGE_PARTICLES, DischargeConfig::default(), particle_seed),
                camera,
                latest: telemetry::sample(mode, 0.0),
                draws: Vec::new(),
                demo_fired: false,
            },
            scheduler: AnimationScheduler::new(self.cadence.clone(), self.config.timing.max_frame_delta),
            link: DisplayLink::new(),
        })
    }

    fn apply_size(&mut self, width: u32, height: u32) -> EngineResult<()> {
        let Some(mount) = self.mount.as_mut() else {
            return Ok(());
        };
        if let Err(err) = self.backend.resize_surface(mount.scene.surface, width, height) {
            if err.is_terminal() {
                self.fail(err.clone());
            }
            return Err(err);
        }
        mount.scene.size = (width, height);
        mount.scene.camera.set_viewport(width, height);
        tracing::debug!("surface resized to {}x{}", width, height);
        Ok(())
    }

    fn teardown(&mut self, mut mount: Mount) {
        // === PHASE 1: Stop the loop ===
        mount.link.cancel();
        self.last_stats = mount.scheduler.stats();

        // === PHASE 2: GPU resources, bottom-up ===
        let surface = mount.scene.surface;
        mount.scene.particles.clear();
        let report = mount.scene.assembly.dispose(&mut self.backend);

        // === PHASE 3: Host ===
        self.host.detach(surface);
        self.backend.destroy_surface(surface);

        tracing::debug!(
            "released {} nodes, {} geometries, {} materials, {} textures",
            report.nodes,
            report.geometries,
            report.materials,
            report.textures
        );
    }

    fn fail(&mut self, err: EngineError) {
        if let Some(mount) = self.mount.take() {
            self.teardown(mount);
        }
        tracing::error!("engine failed: {}", err);
        self.last_error = Some(err);
        self.state = LifecycleState::Failed;
    }
}

impl<B: RenderBackend, H: HostSurface> Drop for Engine<B, H> {
    fn drop(&mut self) {
        if let Some(mount) = self.mount.take() {
            self.teardown(mount);
        }
    }
}

impl<B: RenderBackend + std::fmt::Debug, H: HostSurface + std::fmt::Debug> std::fmt::Debug for Engine<B, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("state", &self.state)
            .field("backend", &self.backend)
            .field("host", &self.host)
            .field("mounts", &self.mounts)
            .field("last_error", &self.last_error)
            .finish_non_exhaustive()
    }
}
