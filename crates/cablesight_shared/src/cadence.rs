//! Update cadences.
//!
//! A cadence is the number of frames between two runs of a gated subsystem.
//! The scheduler turns these settings into its declarative cadence table.

use serde::{Deserialize, Serialize};

/// Visual subsystems whose updates are frame-gated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Subsystem {
    /// Sample, debounce and emit telemetry to the host.
    SensorTelemetry,
    /// Repaint the six instrument screen textures.
    ScreenRedraw,
    /// Toggle the status indicator LEDs.
    IndicatorBlink,
    /// Push the current readings into the screen waveform history.
    HistorySample,
}

impl Subsystem {
    /// Every subsystem, in the order the scheduler runs them within a tick.
    pub const ALL: [Self; 4] = [
        Self::HistorySample,
        Self::ScreenRedraw,
        Self::IndicatorBlink,
        Self::SensorTelemetry,
    ];

    /// Kebab-case name used in configuration and logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::SensorTelemetry => "sensor-telemetry",
            Self::ScreenRedraw => "screen-texture-redraw",
            Self::IndicatorBlink => "indicator-blink",
            Self::HistorySample => "history-sample",
        }
    }
}

/// Period, in frames, of each gated subsystem.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CadenceSettings {
    /// Telemetry emission period.
    pub sensor_telemetry: u32,
    /// Instrument screen repaint period.
    pub screen_redraw: u32,
    /// Indicator LED toggle period.
    pub indicator_blink: u32,
    /// Waveform history sampling period.
    pub history_sample: u32,
}

impl CadenceSettings {
    /// Period configured for a subsystem.
    #[must_use]
    pub const fn period(&self, subsystem: Subsystem) -> u32 {
        match subsystem {
            Subsystem::SensorTelemetry => self.sensor_telemetry,
            Subsystem::ScreenRedraw => self.screen_redraw,
            Subsystem::IndicatorBlink => self.indicator_blink,
            Subsystem::HistorySample => self.history_sample,
        }
    }
}

impl Default for CadenceSettings {
    fn default() -> Self {
        Self {
            sensor_telemetry: 15,
            screen_redraw: 10,
            indicator_blink: 3,
            history_sample: 5,
        }
    }
}
