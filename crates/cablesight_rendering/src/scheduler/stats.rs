//! Frame statistics.

use cablesight_shared::Subsystem;

const fn bit(subsystem: Subsystem) -> u8 {
    match subsystem {
        Subsystem::HistorySample => 1,
        Subsystem::ScreenRedraw => 2,
        Subsystem::IndicatorBlink => 4,
        Subsystem::SensorTelemetry => 8,
    }
}

/// Result of a single tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameResult {
    /// Frame number (first tick is 1).
    pub frame_number: u64,
    /// Elapsed simulated time after this tick (s).
    pub elapsed: f32,
    /// Clamped delta applied this tick (s).
    pub delta: f32,
    /// Render passes issued (always 1).
    pub render_passes: u32,
    /// A telemetry sample reached the host this tick.
    pub telemetry_emitted: bool,
    /// Discharge particles alive after the update.
    pub particles_alive: u32,
    /// Wall time spent in the tick (microseconds).
    pub frame_time_us: u32,
    ran: u8,
}

impl FrameResult {
    /// A tick that has not run any gated subsystem yet.
    pub(crate) fn begin(frame_number: u64, elapsed: f32, delta: f32) -> Self {
        Self {
            frame_number,
            elapsed,
            delta,
            ..Self::default()
        }
    }

    pub(crate) fn mark_ran(&mut self, subsystem: Subsystem) {
        self.ran |= bit(subsystem);
    }

    /// Returns true if `subsystem` ran this tick.
    #[must_use]
    pub const fn ran(&self, subsystem: Subsystem) -> bool {
        self.ran & bit(subsystem) != 0
    }

    /// Number of gated subsystems that ran.
    #[must_use]
    pub const fn gated_runs(&self) -> u32 {
        self.ran.count_ones()
    }
}

/// Statistics for the frame loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    /// Ticks completed
    pub total_frames: u64,
    /// Render passes issued
    pub render_passes: u64,
    /// Gated subsystem runs, by subsystem (history, screens, blink, telemetry)
    pub gated_runs: [u64; 4],
    /// Telemetry samples delivered
    pub telemetry_emitted: u64,
    /// Display refreshes ignored because no frame was requested
    pub ignored_refreshes: u64,
    /// Worst tick time (microseconds)
    pub worst_frame_time_us: u32,
    /// Average tick time (microseconds)
    pub avg_frame_time_us: u32,
}

impl LoopStats {
    /// Folds one tick into the totals.
    pub fn record(&mut self, frame: &FrameResult) {
        self.total_frames += 1;
        self.render_passes += u64::from(frame.render_passes);
        for (i, subsystem) in Subsystem::ALL.into_iter().enumerate() {
            if frame.ran(subsystem) {
                self.gated_runs[i] += 1;
            }
        }
        if frame.telemetry_emitted {
            self.telemetry_emitted += 1;
        }
        self.worst_frame_time_us = self.worst_frame_time_us.max(frame.frame_time_us);
        // Running mean without storing history
        let n = self.total_frames;
        let avg = u64::from(self.avg_frame_time_us);
        self.avg_frame_time_us = ((avg * (n - 1) + u64::from(frame.frame_time_us)) / n) as u32;
    }

    /// Runs of `subsystem` so far.
    #[must_use]
    pub fn runs(&self, subsystem: Subsystem) -> u64 {
        Subsystem::ALL
            .iter()
            .position(|&s| s == subsystem)
            .map_or(0, |i| self.gated_runs[i])
    }

    /// Returns FPS calculated from the average tick time.
    #[must_use]
    pub fn tick_rate_ceiling(&self) -> f32 {
        if self.avg_frame_time_us > 0 {
            1_000_000.0 / self.avg_frame_time_us as f32
        } else {
            0.0
        }
    }
}
