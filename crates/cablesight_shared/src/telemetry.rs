//! # Telemetry Samples
//!
//! Synthetic sensor readings pushed to the HUD. The host re-renders whenever
//! it receives a new sample, so the engine only sends one when a reading has
//! moved by more than its per-field threshold.

use serde::{Deserialize, Serialize};

/// One snapshot of every synthetic sensor channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    /// Apparent partial-discharge charge (pC).
    pub partial_discharge: f32,
    /// Joint body temperature (°C).
    pub temperature: f32,
    /// Vibration velocity (mm/s RMS).
    pub vibration: f32,
    /// Dielectric loss factor (tan δ, dimensionless).
    pub dielectric_loss: f32,
    /// Phase voltage (kV).
    pub voltage: f32,
    /// Load current (A).
    pub current: f32,
}

impl TelemetrySample {
    /// Returns true if any field moved strictly more than its threshold.
    #[must_use]
    pub fn exceeds(&self, previous: &Self, thresholds: &TelemetryThresholds) -> bool {
        self.changed_channels(previous, thresholds).next().is_some()
    }

    /// Names of the channels that moved strictly more than their threshold.
    pub fn changed_channels<'a>(
        &'a self,
        previous: &'a Self,
        thresholds: &'a TelemetryThresholds,
    ) -> impl Iterator<Item = &'static str> + 'a {
        [
            ("partial_discharge", self.partial_discharge - previous.partial_discharge, thresholds.partial_discharge),
            ("temperature", self.temperature - previous.temperature, thresholds.temperature),
            ("vibration", self.vibration - previous.vibration, thresholds.vibration),
            ("dielectric_loss", self.dielectric_loss - previous.dielectric_loss, thresholds.dielectric_loss),
            ("voltage", self.voltage - previous.voltage, thresholds.voltage),
            ("current", self.current - previous.current, thresholds.current),
        ]
        .into_iter()
        .filter(|(_, delta, limit)| delta.abs() > *limit)
        .map(|(name, _, _)| name)
    }

    /// Value of a channel by name, for screen painting.
    #[must_use]
    pub fn channel(&self, name: &str) -> Option<f32> {
        match name {
            "partial_discharge" => Some(self.partial_discharge),
            "temperature" => Some(self.temperature),
            "vibration" => Some(self.vibration),
            "dielectric_loss" => Some(self.dielectric_loss),
            "voltage" => Some(self.voltage),
            "current" => Some(self.current),
            _ => None,
        }
    }
}

/// Minimum change per channel before a sample is re-emitted.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryThresholds {
    /// Partial discharge (pC).
    pub partial_discharge: f32,
    /// Temperature (°C).
    pub temperature: f32,
    /// Vibration (mm/s).
    pub vibration: f32,
    /// Dielectric loss (tan δ).
    pub dielectric_loss: f32,
    /// Voltage (kV).
    pub voltage: f32,
    /// Current (A).
    pub current: f32,
}

impl TelemetryThresholds {
    /// Every threshold with its channel name.
    #[must_use]
    pub const fn channels(&self) -> [(&'static str, f32); 6] {
        [
            ("partial_discharge", self.partial_discharge),
            ("temperature", self.temperature),
            ("vibration", self.vibration),
            ("dielectric_loss", self.dielectric_loss),
            ("voltage", self.voltage),
            ("current", self.current),
        ]
    }
}

impl Default for TelemetryThresholds {
    fn default() -> Self {
        Self {
            partial_discharge: 5.0,
            temperature: 0.5,
            vibration: 0.05,
            dielectric_loss: 0.000_5,
            voltage: 0.1,
            current: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_temperature(t: f32) -> TelemetrySample {
        TelemetrySample {
            temperature: t,
            ..TelemetrySample::default()
        }
    }

    #[test]
    fn test_threshold_is_strict() {
        let thresholds = TelemetryThresholds::default();
        let base = with_temperature(26.0);

        assert!(!with_temperature(26.3).exceeds(&base, &thresholds));
        assert!(!with_temperature(26.5).exceeds(&base, &thresholds));
        assert!(with_temperature(26.9).exceeds(&base, &thresholds));
        assert!(with_temperature(25.0).exceeds(&base, &thresholds));
    }

    #[test]
    fn test_changed_channels() {
        let thresholds = TelemetryThresholds::default();
        let a = TelemetrySample::default();
        let b = TelemetrySample {
            voltage: 0.5,
            current: 0.5,
            partial_discharge: 6.0,
            ..a
        };
        let changed: Vec<_> = b.changed_channels(&a, &thresholds).collect();
        assert_eq!(changed, vec!["partial_discharge", "voltage"]);
    }

    #[test]
    fn test_channel_lookup() {
        let s = with_temperature(40.0);
        assert_eq!(s.channel("temperature"), Some(40.0));
        assert_eq!(s.channel("humidity"), None);
        let thresholds = TelemetryThresholds::default();
        assert!(thresholds.channels().iter().all(|&(name, _)| s.channel(name).is_some()));
    }
}
