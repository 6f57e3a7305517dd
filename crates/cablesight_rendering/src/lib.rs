//! # CABLESIGHT Rendering Engine
//!
//! Real-time procedural visualization of a high-voltage cable joint:
//! - Layered cable and hexagonal sensor housing, built once per mount
//! - Fault-mode effects recomputed every frame from `(mode, t)`
//! - Expensive updates gated by a declarative frame cadence table
//! - Debounced synthetic telemetry pushed to the host
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     ONE DISPLAY REFRESH                      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  InputCell snapshot → FaultEffectMachine → overlays/particles│
//! │       ↓                                                      │
//! │  CadenceTable: history │ screens │ LEDs │ telemetry (gated)  │
//! │       ↓                                                      │
//! │  flush materials → collect draws → RenderBackend::render     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ownership Rules
//!
//! - The scheduler is the only writer of the scene graph
//! - Each node owns its geometry and material handles; procedural maps are
//!   reference counted and freed with their last material
//! - Teardown walks the graph bottom-up exactly once
//! - No tick panics: terminal errors move the engine to `Failed`

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod assembly;
pub mod backend;
pub mod camera;
pub mod effects;
pub mod engine;
pub mod error;
pub mod scene;
pub mod scheduler;
pub mod telemetry;

pub use assembly::{assemble, build_cable_assembly, Assembly, CABLE_LAYERS};
pub use backend::{DrawItem, GpuHandle, HeadlessBackend, RenderBackend, RenderPass, ResourceKind, SurfaceId};
pub use camera::Camera;
pub use effects::{effect_parameters, EffectParameterSet, FaultEffectMachine};
pub use engine::{Engine, HostContainer, HostSurface, LifecycleState};
pub use error::{EngineError, EngineResult};
pub use scene::{PathCurve, SceneGraph};
pub use scheduler::{AnimationScheduler, CadenceTable, DisplayLink, FrameResult, LoopStats};
pub use telemetry::{TelemetryEmitter, TelemetrySink};
