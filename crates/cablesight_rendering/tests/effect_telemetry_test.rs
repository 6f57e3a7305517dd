//! # Effect and Telemetry Property Tests
//!
//! Pure-function properties of the effect state machine and the telemetry
//! debounce, plus the rate limit as seen through a running engine.

use std::f32::consts::FRAC_PI_2;

use cablesight_rendering::effects::OverlayVisibility;
use cablesight_rendering::telemetry::{self, TelemetryEmitter, TelemetrySink};
use cablesight_rendering::{effect_parameters, Engine, HeadlessBackend, HostContainer};
use cablesight_shared::{
    EngineConfig, FaultMode, Subsystem, TelemetrySample, TelemetryThresholds, TextureSettings,
};

fn small_config() -> EngineConfig {
    EngineConfig {
        texture_seed: Some(21),
        textures: TextureSettings {
            braid: 32,
            speckle: 32,
            metal: 32,
            copper: 32,
            mesh: 32,
            treeing: 32,
            water: 32,
            screen_width: 64,
            screen_height: 32,
        },
        ..EngineConfig::default()
    }
}

fn times() -> impl Iterator<Item = f32> {
    (-400..400).map(|i| i as f32 * 0.173)
}

/// Test: The effect function is pure for every mode and time.
#[test]
fn test_effect_parameters_are_pure() {
    for mode in FaultMode::ALL {
        for t in times() {
            assert_eq!(effect_parameters(mode, t), effect_parameters(mode, t), "{mode} at {t}");
        }
    }
}

/// Test: Glow stays within [0, 1] for every mode, overheat included.
#[test]
fn test_glow_is_bounded() {
    for mode in FaultMode::ALL {
        for t in times() {
            let glow = effect_parameters(mode, t).glow_intensity;
            assert!((0.0..=1.0).contains(&glow), "{mode} at {t}: {glow}");
        }
    }
    assert_eq!(effect_parameters(FaultMode::JointOverheat, f32::NAN).glow_intensity, 0.0);
}

/// Test: Baseline at t=0 hides everything and reads about 26.2 °C.
#[test]
fn test_scenario_baseline_at_zero() {
    let params = effect_parameters(FaultMode::Baseline, 0.0);
    assert_eq!(params.glow_intensity, 0.0);
    assert_eq!(params.overlays, OverlayVisibility::HIDDEN);
    assert!(!params.particle_visible);

    let sample = telemetry::sample(FaultMode::Baseline, 0.0);
    assert!((sample.temperature - 26.2).abs() < 1e-4);
    assert!((sample.voltage - 110.0).abs() < 0.1);
    assert!((sample.current - 400.0).abs() < 1.0);
}

/// Test: Overheat at t=π/2 peaks at 95 °C with full glow.
#[test]
fn test_scenario_overheat_peak() {
    let sample = telemetry::sample(FaultMode::JointOverheat, FRAC_PI_2);
    assert!((sample.temperature - 95.0).abs() < 1e-3);

    let params = effect_parameters(FaultMode::JointOverheat, FRAC_PI_2);
    assert_eq!(params.glow_intensity, 1.0);
    assert!(params.overlays.heat);
}

/// Test: [26.0, 26.3, 26.9] with a 0.5 threshold emits 26.0 then only 26.9.
#[test]
fn test_scenario_temperature_debounce() {
    let mut emitter = TelemetryEmitter::new(TelemetryThresholds::default());
    let at = |temperature: f32| TelemetrySample {
        temperature,
        ..TelemetrySample::default()
    };

    assert!(emitter.offer(&at(26.0)));
    assert!(!emitter.offer(&at(26.3)));
    assert!(emitter.offer(&at(26.9)));
    assert_eq!(emitter.last_emitted().map(|s| s.temperature), Some(26.9));
    assert_eq!(emitter.emitted(), 2);
    assert_eq!(emitter.suppressed(), 1);
}

/// Test: Samples within every threshold of the last emitted one never fire.
#[test]
fn test_within_threshold_never_fires() {
    let thresholds = TelemetryThresholds::default();
    let mut emitter = TelemetryEmitter::new(thresholds);
    let base = telemetry::sample(FaultMode::Baseline, 0.0);
    let mut delivered = 0;
    let mut count = |_: &TelemetrySample| delivered += 1;
    let sink: &mut dyn TelemetrySink = &mut count;
    assert!(emitter.emit(&base, Some(&mut *sink)));

    for k in 0..200 {
        let f = 0.9 * (k as f32 * 0.37).sin();
        let jittered = TelemetrySample {
            partial_discharge: base.partial_discharge + f * thresholds.partial_discharge,
            temperature: base.temperature + f * thresholds.temperature,
            vibration: base.vibration + f * thresholds.vibration,
            dielectric_loss: base.dielectric_loss + f * thresholds.dielectric_loss,
            voltage: base.voltage + f * thresholds.voltage,
            current: base.current + f * thresholds.current,
        };
        assert!(!emitter.emit(&jittered, Some(&mut *sink)), "k = {k}");
    }
    assert_eq!(delivered, 1);
}

/// Test: Emissions happen only on telemetry-cadence frames, never closer
/// together than the cadence, and the sink sees exactly those samples.
#[test]
fn test_emission_is_rate_limited() {
    let config = small_config();
    let period = u64::from(config.cadence.period(Subsystem::SensorTelemetry));
    let mut engine = Engine::new(HeadlessBackend::new(), HostContainer::new(800, 600), config).unwrap();
    let (tx, rx) = crossbeam_channel::unbounded();
    engine.set_telemetry_sink(tx);
    engine.inputs().update(|i| i.fault_mode = FaultMode::ElectricalTreeing);
    engine.mount().unwrap();

    let mut emitted_frames = Vec::new();
    for i in 0..600 {
        let result = engine.on_display_refresh(f64::from(i) / 60.0).unwrap().unwrap();
        if result.telemetry_emitted {
            emitted_frames.push(result.frame_number);
        }
    }

    assert!(emitted_frames.len() >= 2);
    assert!(emitted_frames.iter().all(|f| f % period == 0));
    assert!(emitted_frames.windows(2).all(|w| w[1] - w[0] >= period));
    assert_eq!(rx.try_iter().count(), emitted_frames.len());
    assert_eq!(engine.stats().telemetry_emitted, emitted_frames.len() as u64);
}
