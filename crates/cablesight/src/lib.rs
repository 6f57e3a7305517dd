//! # CABLESIGHT
//!
//! HV cable-joint monitoring visualizer: one crate for hosts to depend on.
//!
//! ## Crates
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                       cablesight                          │
//! ├───────────────────────────────────────────────────────────┤
//! │  rendering   engine, scene, effects, scheduler, telemetry │
//! │      │                                                    │
//! │      ├──► procedural   surface maps                       │
//! │      ├──► shared       config, fault modes, samples, math │
//! │      └──► core         slot arena, input cell, cancel     │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cablesight::prelude::*;
//!
//! let mut engine = Engine::new(HeadlessBackend::new(), HostContainer::new(800, 600), EngineConfig::default())?;
//! engine.set_telemetry_sink(|s: &TelemetrySample| println!("{:.1} °C", s.temperature));
//! engine.mount()?;
//! engine.on_display_refresh(0.0)?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub use cablesight_core as core;
pub use cablesight_procedural as procedural;
pub use cablesight_rendering as rendering;
pub use cablesight_shared as shared;

/// Everything a host needs to embed the engine.
pub mod prelude {
    pub use cablesight_rendering::{
        Engine, EngineError, EngineResult, HeadlessBackend, HostContainer, HostSurface, LifecycleState,
        RenderBackend, TelemetrySink,
    };
    pub use cablesight_shared::{EngineConfig, EngineInputs, FaultMode, TelemetrySample, TelemetryThresholds};
}
