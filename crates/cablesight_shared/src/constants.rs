//! # Engine Constants
//!
//! Defaults baked into the engine. Most are overridable through
//! [`crate::EngineConfig`].

/// Smallest host surface, in pixels per side, the engine will render into.
pub const MIN_SURFACE_SIDE: u32 = 32;

/// Largest frame delta fed to the animation clock (seconds).
///
/// A tab returning from the background can report seconds of delta; clamping
/// keeps particle motion and orbits from jumping.
pub const MAX_FRAME_DELTA: f32 = 0.1;

/// Default auto-demo cycle length (seconds).
pub const AUTO_DEMO_CYCLE_SECS: f32 = 30.0;

/// Nominal display refresh rate used by the headless driver.
pub const NOMINAL_REFRESH_HZ: u32 = 60;

/// Upper bound for any single procedural texture side.
pub const MAX_TEXTURE_SIDE: u32 = 4096;

/// Number of faces on the sensor housing (and screens).
pub const SENSOR_FACES: usize = 6;
