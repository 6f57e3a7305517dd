//! Frame Loop
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                       ONE TICK                           │
//! ├──────────────────────────────────────────────────────────┤
//! │  1. advance clock (delta clamped)                        │
//! │  2. frame += 1                                           │
//! │  3. effects: fault state, particles, orbits (full rate)  │
//! │  4. gated subsystems due on this frame, table order      │
//! │  5. exactly one render pass                              │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! The display link owns "is another frame requested". Cancelling it is
//! final for that link: a cancelled link refuses new requests, so no tick
//! can be scheduled after teardown.

use std::time::Instant;

use cablesight_core::CancelToken;
use cablesight_shared::Subsystem;

use super::cadence::CadenceTable;
use super::stats::{FrameResult, LoopStats};
use crate::error::EngineResult;

/// Converts host timestamps into clamped frame deltas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameClock {
    last: Option<f64>,
    elapsed: f32,
    max_delta: f32,
}

impl FrameClock {
    /// Clock at zero; deltas never exceed `max_delta`.
    #[must_use]
    pub fn new(max_delta: f32) -> Self {
        Self {
            last: None,
            elapsed: 0.0,
            max_delta: max_delta.max(0.0),
        }
    }

    /// Advances to `now` (seconds, host clock) and returns the applied delta.
    ///
    /// The first call returns 0. Backwards or non-finite timestamps give 0.
    pub fn advance(&mut self, now: f64) -> f32 {
        let delta = match self.last {
            Some(last) if now.is_finite() && now > last => ((now - last) as f32).min(self.max_delta),
            _ => 0.0,
        };
        if now.is_finite() {
            self.last = Some(now);
        }
        self.elapsed += delta;
        delta
    }

    /// Accumulated simulated time (s).
    #[must_use]
    pub const fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Back to zero, forgetting the last timestamp.
    pub fn reset(&mut self) {
        self.last = None;
        self.elapsed = 0.0;
    }
}

/// What the systems see of the current tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInfo {
    /// Frame number (first tick is 1).
    pub frame: u64,
    /// Elapsed simulated time (s).
    pub elapsed: f32,
    /// Delta applied this tick (s).
    pub delta: f32,
}

/// The per-tick work, supplied by the engine.
pub trait FrameSystems {
    /// Full-rate updates: effect state, particles, orbits, camera.
    ///
    /// # Errors
    ///
    /// Terminal backend error.
    fn update_effects(&mut self, frame: &FrameInfo) -> EngineResult<()>;

    /// Runs one gated subsystem. Returns true if a telemetry sample went out.
    ///
    /// # Errors
    ///
    /// Any engine error. Non-terminal ones do not stop the frame's render.
    fn run_gated(&mut self, subsystem: Subsystem, frame: &FrameInfo) -> EngineResult<bool>;

    /// Issues the frame's render pass. Returns live particle count.
    ///
    /// # Errors
    ///
    /// Terminal backend error.
    fn render(&mut self, frame: &FrameInfo) -> EngineResult<u32>;
}

/// Owns the clock, frame counter and cadence table.
#[derive(Debug, Clone)]
pub struct AnimationScheduler {
    clock: FrameClock,
    frame: u64,
    cadence: CadenceTable,
    stats: LoopStats,
}

impl AnimationScheduler {
    /// Scheduler at frame 0.
    #[must_use]
    pub fn new(cadence: CadenceTable, max_delta: f32) -> Self {
        Self {
            clock: FrameClock::new(max_delta),
            frame: 0,
            cadence,
            stats: LoopStats::default(),
        }
    }

    /// Runs one tick against `systems`.
    ///
    /// A terminal error stops the tick where it occurs. A non-terminal
    /// error from a gated subsystem skips that subsystem only: the render
    /// pass still runs and the first such error is returned afterwards.
    ///
    /// # Errors
    ///
    /// The first error from a system.
    pub fn tick<S: FrameSystems + ?Sized>(&mut self, now: f64, systems: &mut S) -> EngineResult<FrameResult> {
        let tick_start = Instant::now();

        // === PHASE 1: Time ===
        let delta = self.clock.advance(now);
        self.frame += 1;
        let info = FrameInfo {
            frame: self.frame,
            elapsed: self.clock.elapsed(),
            delta,
        };

        // === PHASE 2: Full-rate effects ===
        systems.update_effects(&info)?;

        // === PHASE 3: Gated subsystems ===
        let mut result = FrameResult::begin(info.frame, info.elapsed, delta);
        let mut deferred = None;
        for subsystem in self.cadence.due(info.frame) {
            tracing::trace!("frame {}: {}", info.frame, subsystem.name());
            match systems.run_gated(subsystem, &info) {
                Ok(emitted) => {
                    result.telemetry_emitted |= emitted;
                    result.mark_ran(subsystem);
                }
                Err(err) if err.is_terminal() => return Err(err),
                Err(err) => {
                    deferred.get_or_insert(err);
                }
            }
        }

        // === PHASE 4: Render, once ===
        result.particles_alive = systems.render(&info)?;
        result.render_passes = 1;

        result.frame_time_us = tick_start.elapsed().as_micros() as u32;
        self.stats.record(&result);
        match deferred {
            Some(err) => Err(err),
            None => Ok(result),
        }
    }

    /// Frames ticked so far.
    #[must_use]
    pub const fn frame(&self) -> u64 {
        self.frame
    }

    /// Elapsed simulated time (s).
    #[must_use]
    pub const fn elapsed(&self) -> f32 {
        self.clock.elapsed()
    }

    /// The cadence table.
    #[must_use]
    pub const fn cadence(&self) -> &CadenceTable {
        &self.cadence
    }

    /// Loop statistics.
    #[must_use]
    pub const fn stats(&self) -> LoopStats {
        self.stats
    }

    pub(crate) fn note_ignored_refresh(&mut self) {
        self.stats.ignored_refreshes += 1;
    }
}

/// Next-frame request bookkeeping for one mount.
#[derive(Debug, Clone, Default)]
pub struct DisplayLink {
    pending: bool,
    requests: u64,
    token: CancelToken,
}

impl DisplayLink {
    /// Live link with nothing requested.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests the next refresh. Refused (false) once cancelled.
    pub fn request(&mut self) -> bool {
        if self.token.is_cancelled() {
            return false;
        }
        self.pending = true;
        self.requests += 1;
        true
    }

    /// Consumes the outstanding request. False if none is outstanding.
    pub fn take_pending(&mut self) -> bool {
        std::mem::take(&mut self.pending) && !self.token.is_cancelled()
    }

    /// Returns true if a refresh is requested.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending && !self.token.is_cancelled()
    }

    /// Drops any outstanding request and refuses all later ones.
    pub fn cancel(&mut self) -> bool {
        self.pending = false;
        self.token.cancel()
    }

    /// Returns true once cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Requests made over the link's lifetime.
    #[must_use]
    pub const fn requests(&self) -> u64 {
        self.requests
    }

    /// Token observed by anything that must stop with the link.
    #[must_use]
    pub fn token(&self) -> CancelToken {
        self.token.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use cablesight_shared::CadenceSettings;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
        renders: u32,
    }

    impl FrameSystems for Recorder {
        fn update_effects(&mut self, frame: &FrameInfo) -> EngineResult<()> {
            self.calls.push(format!("effects@{}", frame.frame));
            Ok(())
        }

        fn run_gated(&mut self, subsystem: Subsystem, frame: &FrameInfo) -> EngineResult<bool> {
            self.calls.push(format!("{}@{}", subsystem.name(), frame.frame));
            Ok(subsystem == Subsystem::SensorTelemetry)
        }

        fn render(&mut self, frame: &FrameInfo) -> EngineResult<u32> {
            self.calls.push(format!("render@{}", frame.frame));
            self.renders += 1;
            Ok(0)
        }
    }

    #[test]
    fn test_clock_clamps_and_starts_at_zero() {
        let mut clock = FrameClock::new(0.1);
        assert_eq!(clock.advance(10.0), 0.0);
        assert!((clock.advance(10.016) - 0.016).abs() < 1e-5);
        assert!((clock.advance(15.0) - 0.1).abs() < 1e-6);
        assert_eq!(clock.advance(14.0), 0.0);
        assert_eq!(clock.advance(f64::NAN), 0.0);
    }

    #[test]
    fn test_tick_order_and_single_render() {
        let table = CadenceTable::from_settings(&CadenceSettings::default()).unwrap();
        let mut scheduler = AnimationScheduler::new(table, 0.1);
        let mut systems = Recorder::default();

        for i in 0..30 {
            scheduler.tick(f64::from(i) / 60.0, &mut systems).unwrap();
        }
        assert_eq!(systems.renders, 30);

        let frame_30: Vec<&str> = systems
            .calls
            .iter()
            .filter(|c| c.ends_with("@30"))
            .map(String::as_str)
            .collect();
        assert_eq!(
            frame_30,
            [
                "effects@30",
                "history-sample@30",
                "screen-texture-redraw@30",
                "indicator-blink@30",
                "sensor-telemetry@30",
                "render@30"
            ]
        );
        assert_eq!(scheduler.stats().telemetry_emitted, 2);
    }

    struct FlakyScreens {
        inner: Recorder,
    }

    impl FrameSystems for FlakyScreens {
        fn update_effects(&mut self, frame: &FrameInfo) -> EngineResult<()> {
            self.inner.update_effects(frame)
        }

        fn run_gated(&mut self, subsystem: Subsystem, frame: &FrameInfo) -> EngineResult<bool> {
            if subsystem == Subsystem::ScreenRedraw {
                return Err(EngineError::SurfaceUnavailable { width: 0, height: 0 });
            }
            self.inner.run_gated(subsystem, frame)
        }

        fn render(&mut self, frame: &FrameInfo) -> EngineResult<u32> {
            self.inner.render(frame)
        }
    }

    #[test]
    fn test_non_terminal_gated_error_still_renders_once() {
        let table = CadenceTable::from_settings(&CadenceSettings::default()).unwrap();
        let mut scheduler = AnimationScheduler::new(table, 0.1);
        let mut systems = FlakyScreens {
            inner: Recorder::default(),
        };

        for i in 0..10 {
            let outcome = scheduler.tick(f64::from(i) / 60.0, &mut systems);
            assert_eq!(outcome.is_err(), i == 9, "frame {}", i + 1);
        }
        assert_eq!(systems.inner.renders, 10);
        assert!(systems.inner.calls.iter().any(|c| c == "render@10"));
        assert_eq!(scheduler.stats().render_passes, 10);
        assert_eq!(scheduler.stats().total_frames, 10);
    }

    #[test]
    fn test_cancelled_link_refuses_requests() {
        let mut link = DisplayLink::new();
        assert!(link.request());
        assert!(link.take_pending());
        assert!(!link.take_pending());

        link.request();
        assert!(link.cancel());
        assert!(!link.is_pending());
        assert!(!link.request());
        assert!(!link.take_pending());
    }
}
