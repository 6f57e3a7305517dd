//! # CABLESIGHT Shared
//!
//! Plain data exchanged between the visualization engine and the UI that
//! hosts it.
//!
//! ## CRITICAL RULE
//!
//! This crate must NEVER depend on rendering code. The host reads
//! `TelemetrySample` and writes `EngineInputs` without linking the engine.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod cadence;
pub mod config;
pub mod constants;
pub mod error;
pub mod fault;
pub mod math;
pub mod telemetry;

pub use cadence::{CadenceSettings, Subsystem};
pub use config::{EngineConfig, EngineInputs, SurfaceSettings, TextureSettings, TimingSettings};
pub use constants::{
    AUTO_DEMO_CYCLE_SECS, MAX_FRAME_DELTA, MAX_TEXTURE_SIDE, MIN_SURFACE_SIDE, NOMINAL_REFRESH_HZ, SENSOR_FACES,
};
pub use error::{ConfigError, ConfigResult};
pub use fault::FaultMode;
pub use math::{Mat4, Quaternion, Vec2, Vec3};
pub use telemetry::{TelemetrySample, TelemetryThresholds};
