//! # Animation Scheduler
//!
//! One loop, driven by display refreshes. Smooth motion runs every tick;
//! expensive updates (screen repaint, telemetry) run on their own frame
//! cadence, so their cost does not scale with the refresh rate.

mod cadence;
mod frame_loop;
mod stats;

pub use cadence::{CadenceEntry, CadenceTable};
pub use frame_loop::{AnimationScheduler, DisplayLink, FrameClock, FrameInfo, FrameSystems};
pub use stats::{FrameResult, LoopStats};
