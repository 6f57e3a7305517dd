//! # Engine Configuration
//!
//! Loaded once, before mount, from TOML. Every field has a default so an
//! empty file is a valid configuration.
//!
//! ```toml
//! initial_fault_mode = "joint_overheat"
//!
//! [cadence]
//! sensor-telemetry = 15
//! screen-redraw = 10
//!
//! [thresholds]
//! temperature = 0.5
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::cadence::{CadenceSettings, Subsystem};
use crate::constants::{AUTO_DEMO_CYCLE_SECS, MAX_FRAME_DELTA, MAX_TEXTURE_SIDE, MIN_SURFACE_SIDE};
use crate::error::{ConfigError, ConfigResult};
use crate::fault::FaultMode;
use crate::telemetry::TelemetryThresholds;

/// Inputs the host may change at any time. Read once per tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineInputs {
    /// Active fault mode.
    pub fault_mode: FaultMode,
    /// Sensor module is sweeping the cable.
    pub is_scanning: bool,
    /// Auto-demo cycle is running; fires the completion callback once.
    pub is_auto_demo: bool,
}

/// Minimum usable host surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceSettings {
    /// Minimum width in pixels.
    pub min_width: u32,
    /// Minimum height in pixels.
    pub min_height: u32,
}

impl SurfaceSettings {
    /// Returns true if a surface of this size can be rendered into.
    #[must_use]
    pub const fn is_usable(&self, width: u32, height: u32) -> bool {
        width >= self.min_width && height >= self.min_height
    }
}

impl Default for SurfaceSettings {
    fn default() -> Self {
        Self {
            min_width: MIN_SURFACE_SIDE,
            min_height: MIN_SURFACE_SIDE,
        }
    }
}

/// Procedural texture resolutions (pixels per side unless noted).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureSettings {
    /// Braided shield weave normal map.
    pub braid: u32,
    /// Speckle bump / roughness map.
    pub speckle: u32,
    /// Worn armour metal map.
    pub metal: u32,
    /// Twisted copper conductor map.
    pub copper: u32,
    /// Alpha-cut mesh pattern.
    pub mesh: u32,
    /// Electrical treeing discharge pattern.
    pub treeing: u32,
    /// Water intrusion spots.
    pub water: u32,
    /// Instrument screen width.
    pub screen_width: u32,
    /// Instrument screen height.
    pub screen_height: u32,
}

impl TextureSettings {
    fn sides(&self) -> [(&'static str, u32); 9] {
        [
            ("textures.braid", self.braid),
            ("textures.speckle", self.speckle),
            ("textures.metal", self.metal),
            ("textures.copper", self.copper),
            ("textures.mesh", self.mesh),
            ("textures.treeing", self.treeing),
            ("textures.water", self.water),
            ("textures.screen_width", self.screen_width),
            ("textures.screen_height", self.screen_height),
        ]
    }
}

impl Default for TextureSettings {
    fn default() -> Self {
        Self {
            braid: 512,
            speckle: 256,
            metal: 512,
            copper: 256,
            mesh: 256,
            treeing: 512,
            water: 512,
            screen_width: 256,
            screen_height: 128,
        }
    }
}

/// Clock and motion parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingSettings {
    /// Largest frame delta accepted by the clock (seconds).
    pub max_frame_delta: f32,
    /// Auto-demo cycle length (seconds).
    pub auto_demo_cycle_secs: f32,
    /// Sensor housing orbit speed while scanning (rad/s).
    pub sensor_orbit_speed: f32,
    /// Camera orbit speed (rad/s).
    pub camera_orbit_speed: f32,
    /// Scanning ring sweep speed (cable lengths per second).
    pub scan_sweep_speed: f32,
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            max_frame_delta: MAX_FRAME_DELTA,
            auto_demo_cycle_secs: AUTO_DEMO_CYCLE_SECS,
            sensor_orbit_speed: 0.4,
            camera_orbit_speed: 0.05,
            scan_sweep_speed: 0.25,
        }
    }
}

/// Complete engine configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Fault mode written into the inputs before the first tick.
    pub initial_fault_mode: FaultMode,
    /// Fixed texture seed. `None` seeds internally for visual variety.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub texture_seed: Option<u64>,
    /// Gated update periods.
    pub cadence: CadenceSettings,
    /// Telemetry debounce thresholds.
    pub thresholds: TelemetryThresholds,
    /// Minimum usable surface.
    pub surface: SurfaceSettings,
    /// Procedural texture resolutions.
    pub textures: TextureSettings,
    /// Clock and motion.
    pub timing: TimingSettings,
}

impl EngineConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::Invalid`] for out-of-range values.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`Self::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::info!("loaded engine config from {}", path.display());
        Ok(config)
    }

    /// Serializes to TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Serialize`] if serialization fails.
    pub fn to_toml_string(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Checks every value is in range.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError::Invalid`] found.
    pub fn validate(&self) -> ConfigResult<()> {
        for subsystem in Subsystem::ALL {
            if self.cadence.period(subsystem) == 0 {
                return Err(ConfigError::Invalid {
                    field: "cadence",
                    reason: format!("period for {} must be at least 1 frame", subsystem.name()),
                });
            }
        }

        // NaN or infinity would silence a channel for good
        for (channel, threshold) in self.thresholds.channels() {
            if !(threshold >= 0.0 && threshold.is_finite()) {
                return Err(ConfigError::Invalid {
                    field: "thresholds",
                    reason: format!("{channel} threshold must be finite and non-negative, found {threshold}"),
                });
            }
        }

        if self.surface.min_width == 0 || self.surface.min_height == 0 {
            return Err(ConfigError::Invalid {
                field: "surface",
                reason: "minimum surface size must be non-zero".to_string(),
            });
        }

        for (field, side) in self.textures.sides() {
            if side == 0 || side > MAX_TEXTURE_SIDE {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("texture side {side} outside 1..={MAX_TEXTURE_SIDE}"),
                });
            }
        }

        if !(self.timing.max_frame_delta > 0.0) {
            return Err(ConfigError::Invalid {
                field: "timing.max_frame_delta",
                reason: "must be positive".to_string(),
            });
        }

        if !(self.timing.auto_demo_cycle_secs > 0.0) {
            return Err(ConfigError::Invalid {
                field: "timing.auto_demo_cycle_secs",
                reason: "must be positive".to_string(),
            });
        }

        let speeds = [
            ("timing.sensor_orbit_speed", self.timing.sensor_orbit_speed),
            ("timing.camera_orbit_speed", self.timing.camera_orbit_speed),
            ("timing.scan_sweep_speed", self.timing.scan_sweep_speed),
        ];
        for (field, speed) in speeds {
            if !speed.is_finite() {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be finite, found {speed}"),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.cadence.sensor_telemetry, 15);
        assert_eq!(config.cadence.screen_redraw, 10);
        assert_eq!(config.cadence.indicator_blink, 3);
    }

    #[test]
    fn test_partial_override() {
        let config = EngineConfig::from_toml_str(
            r#"
            initial_fault_mode = "joint_overheat"
            texture_seed = 7

            [cadence]
            sensor-telemetry = 30

            [thresholds]
            temperature = 1.5
            "#,
        )
        .unwrap();

        assert_eq!(config.initial_fault_mode, FaultMode::JointOverheat);
        assert_eq!(config.cadence.sensor_telemetry, 30);
        assert_eq!(config.cadence.screen_redraw, 10);
        assert!((config.thresholds.temperature - 1.5).abs() < f32::EPSILON);
        assert_eq!(config.texture_seed, Some(7));
    }

    #[test]
    fn test_unknown_fault_mode_falls_back() {
        let config = EngineConfig::from_toml_str(r#"initial_fault_mode = "arc_flash""#).unwrap();
        assert_eq!(config.initial_fault_mode, FaultMode::Baseline);
    }

    #[test]
    fn test_zero_cadence_rejected() {
        let err = EngineConfig::from_toml_str("[cadence]\nindicator-blink = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "cadence", .. }));
    }

    #[test]
    fn test_negative_threshold_rejected() {
        let err = EngineConfig::from_toml_str("[thresholds]\ncurrent = -1.0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "thresholds", .. }));

        for value in ["nan", "inf"] {
            let err = EngineConfig::from_toml_str(&format!("[thresholds]\ntemperature = {value}")).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid { field: "thresholds", .. }), "{value}");
        }
    }

    #[test]
    fn test_non_finite_speed_rejected() {
        let err = EngineConfig::from_toml_str("[timing]\nscan_sweep_speed = nan").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "timing.scan_sweep_speed", .. }));

        let err = EngineConfig::from_toml_str("[timing]\ncamera_orbit_speed = -inf").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "timing.camera_orbit_speed", .. }));

        let config = EngineConfig::from_toml_str("[timing]\nsensor_orbit_speed = -0.4").unwrap();
        assert!((config.timing.sensor_orbit_speed + 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_oversized_texture_rejected() {
        let err = EngineConfig::from_toml_str("[textures]\nbraid = 100000").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "textures.braid", .. }));
    }

    #[test]
    fn test_malformed_toml() {
        let err = EngineConfig::from_toml_str("cadence = [").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = EngineConfig::default();
        config.initial_fault_mode = FaultMode::WaterTreeing;
        let text = config.to_toml_string().unwrap();
        assert_eq!(EngineConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_missing_file() {
        let err = EngineConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_surface_usable() {
        let surface = SurfaceSettings::default();
        assert!(!surface.is_usable(0, 0));
        assert!(!surface.is_usable(800, 16));
        assert!(surface.is_usable(800, 600));
    }
}
