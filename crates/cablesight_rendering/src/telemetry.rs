//! # Telemetry
//!
//! Synthetic sensor readings derived from `(mode, t)` and the debounce
//! filter in front of the host callback.
//!
//! Two independent gates must both pass before the host hears anything:
//! the scheduler only offers a sample on the sensor-telemetry cadence, and
//! the emitter only forwards it if some channel moved strictly more than its
//! threshold since the last forwarded sample.

use std::f32::consts::TAU;

use cablesight_shared::{FaultMode, TelemetrySample, TelemetryThresholds};
use crossbeam_channel::{Sender, TrySendError};

/// Joint temperature while overheating (°C).
#[inline]
#[must_use]
pub fn overheat_temperature(t: f32) -> f32 {
    75.0 + 20.0 * t.sin()
}

/// Partial discharge while electrical treeing grows (pC).
#[inline]
#[must_use]
pub fn treeing_discharge(t: f32) -> f32 {
    150.0 + 100.0 * (10.0 * t).sin()
}

/// Readings for `mode` at elapsed time `t` seconds. Pure.
#[must_use]
pub fn sample(mode: FaultMode, t: f32) -> TelemetrySample {
    let mut s = TelemetrySample {
        partial_discharge: 2.0 + 0.5 * (3.0 * t).sin(),
        temperature: 26.2 + 0.3 * (0.5 * t).sin(),
        vibration: 0.02 + 0.005 * (5.0 * t).sin(),
        dielectric_loss: 0.001_2 + 0.000_1 * (0.7 * t).sin(),
        voltage: 110.0 + 0.05 * t.sin(),
        current: 400.0 + 5.0 * (0.3 * t).sin(),
    };

    match mode {
        FaultMode::Baseline => {}
        FaultMode::ElectricalTreeing => {
            s.partial_discharge = treeing_discharge(t);
            s.dielectric_loss = 0.003_5 + 0.000_5 * (2.0 * t).sin();
        }
        FaultMode::JointOverheat => {
            s.temperature = overheat_temperature(t);
            s.current = 520.0 + 30.0 * (0.8 * t).sin();
        }
        FaultMode::MechanicalDamage => {
            s.vibration = 0.35 + 0.15 * (12.0 * t).sin();
            s.partial_discharge = 12.0 + 4.0 * (6.0 * t).sin();
        }
        FaultMode::WaterTreeing => {
            s.dielectric_loss = 0.008 + 0.001_5 * (0.9 * t).sin();
            s.partial_discharge = 35.0 + 15.0 * (2.0 * t).sin();
            // Slow supply ripple from the degraded insulation
            s.voltage = 110.0 + 0.4 * (t / 4.0 * TAU).sin();
        }
    }
    s
}

/// Receiver of forwarded samples.
pub trait TelemetrySink {
    /// Called with every sample that passed both gates.
    fn deliver(&mut self, sample: &TelemetrySample);
}

impl<F: FnMut(&TelemetrySample)> TelemetrySink for F {
    fn deliver(&mut self, sample: &TelemetrySample) {
        self(sample);
    }
}

impl TelemetrySink for Sender<TelemetrySample> {
    fn deliver(&mut self, sample: &TelemetrySample) {
        // Never block a tick on a slow consumer
        match self.try_send(*sample) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => tracing::debug!("telemetry channel full, sample dropped"),
            Err(TrySendError::Disconnected(_)) => tracing::debug!("telemetry receiver gone"),
        }
    }
}

/// Debounce filter in front of the host callback.
#[derive(Debug, Clone)]
pub struct TelemetryEmitter {
    thresholds: TelemetryThresholds,
    last_emitted: Option<TelemetrySample>,
    emitted: u64,
    suppressed: u64,
}

impl TelemetryEmitter {
    /// Creates an emitter that has not emitted yet.
    #[must_use]
    pub const fn new(thresholds: TelemetryThresholds) -> Self {
        Self {
            thresholds,
            last_emitted: None,
            emitted: 0,
            suppressed: 0,
        }
    }

    /// Decides whether `sample` goes out. The first sample always does;
    /// later ones only if a channel moved past its threshold relative to the
    /// last sample that went out.
    pub fn offer(&mut self, sample: &TelemetrySample) -> bool {
        let pass = match &self.last_emitted {
            None => true,
            Some(previous) => sample.exceeds(previous, &self.thresholds),
        };
        if pass {
            if let Some(previous) = &self.last_emitted {
                let changed: Vec<&str> = sample.changed_channels(previous, &self.thresholds).collect();
                tracing::debug!("telemetry emitted, changed: {}", changed.join(", "));
            }
            self.last_emitted = Some(*sample);
            self.emitted += 1;
        } else {
            self.suppressed += 1;
        }
        pass
    }

    /// Offers `sample` and forwards it to `sink` if it passes.
    pub fn emit(&mut self, sample: &TelemetrySample, sink: Option<&mut (dyn TelemetrySink + '_)>) -> bool {
        let pass = self.offer(sample);
        if pass {
            if let Some(sink) = sink {
                sink.deliver(sample);
            }
        }
        pass
    }

    /// Last sample that went out.
    #[must_use]
    pub const fn last_emitted(&self) -> Option<&TelemetrySample> {
        self.last_emitted.as_ref()
    }

    /// Samples forwarded so far.
    #[must_use]
    pub const fn emitted(&self) -> u64 {
        self.emitted
    }

    /// Samples held back by the debounce.
    #[must_use]
    pub const fn suppressed(&self) -> u64 {
        self.suppressed
    }

    /// Forgets the last emitted sample.
    pub fn reset(&mut self) {
        self.last_emitted = None;
        self.emitted = 0;
        self.suppressed = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baseline_at_zero() {
        let s = sample(FaultMode::Baseline, 0.0);
        assert!((s.temperature - 26.2).abs() < 1e-4);
        assert!((s.voltage - 110.0).abs() < 1e-4);
        assert!((s.current - 400.0).abs() < 1e-4);
    }

    #[test]
    fn test_modes_are_distinguishable() {
        let t = 1.3;
        let base = sample(FaultMode::Baseline, t);
        let thresholds = TelemetryThresholds::default();
        for mode in FaultMode::ALL.into_iter().filter(|m| m.is_fault()) {
            assert!(sample(mode, t).exceeds(&base, &thresholds), "{mode} looks like baseline");
        }
    }

    #[test]
    fn test_first_sample_always_emitted() {
        let mut emitter = TelemetryEmitter::new(TelemetryThresholds::default());
        let s = sample(FaultMode::Baseline, 0.0);
        assert!(emitter.offer(&s));
        assert!(!emitter.offer(&s));
        assert_eq!(emitter.emitted(), 1);
        assert_eq!(emitter.suppressed(), 1);
    }

    #[test]
    fn test_sink_receives_only_passing_samples() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut sink = tx;
        let mut emitter = TelemetryEmitter::new(TelemetryThresholds::default());
        let s = sample(FaultMode::Baseline, 0.0);
        emitter.emit(&s, Some(&mut sink));
        emitter.emit(&s, Some(&mut sink));
        assert_eq!(rx.try_iter().count(), 1);
    }
}
