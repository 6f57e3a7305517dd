//! # Fault-Mode Effect State Machine
//!
//! Maps the active fault mode and elapsed time to the visual parameters of
//! one frame.
//!
//! ```text
//! mode ──┐
//!        ├──► effect_parameters(mode, t) ──► EffectParameterSet
//! t    ──┘          (pure, no memory)
//! ```
//!
//! Mode switches are immediate. Nothing is carried across frames: the
//! parameter set is recomputed from scratch every tick, so there is no
//! accumulated drift and no transition state.

use cablesight_shared::FaultMode;

use crate::scene::ShaderUniforms;
use crate::telemetry::{overheat_temperature, treeing_discharge};

/// Tint of the flow overlay while water treeing.
pub const WATER_ALTERNATE_TINT: [f32; 3] = [0.25, 0.55, 0.95];

/// Uniform names pushed to overlay materials.
pub mod uniform {
    /// Elapsed time (s).
    pub const TIME: &str = "u_time";
    /// Effect intensity in [0, 1].
    pub const INTENSITY: &str = "u_intensity";
    /// Overlay tint.
    pub const TINT: &str = "u_tint";
    /// Joint temperature (°C), overheat only.
    pub const TEMPERATURE: &str = "u_temperature";
    /// Partial discharge (pC), treeing only.
    pub const PARTIAL_DISCHARGE: &str = "u_partial_discharge";
}

/// Which overlays are shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverlayVisibility {
    /// Branching discharge pattern in the insulation.
    pub treeing: bool,
    /// Hot-spot glow at the joint body.
    pub heat: bool,
    /// Flow/degradation sheet along the cable.
    pub flow: bool,
    /// The flow sheet shows the water intrusion pattern instead of wear.
    pub water: bool,
}

impl OverlayVisibility {
    /// Everything hidden.
    pub const HIDDEN: Self = Self {
        treeing: false,
        heat: false,
        flow: false,
        water: false,
    };

    /// Returns true if any overlay is shown.
    #[must_use]
    pub const fn any(&self) -> bool {
        self.treeing || self.heat || self.flow
    }
}

/// Visual parameters for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectParameterSet {
    /// Mode the set was computed for.
    pub mode: FaultMode,
    /// Glow intensity, always within [0, 1].
    pub glow_intensity: f32,
    /// Discharge particles emitted.
    pub particle_visible: bool,
    /// Overlay visibility.
    pub overlays: OverlayVisibility,
    /// Overlay tint.
    pub tint: [f32; 3],
    /// Uniform values for overlay materials.
    pub uniforms: ShaderUniforms,
}

/// Computes the parameter set for `mode` at elapsed time `t`.
///
/// Pure: equal inputs give equal outputs.
#[must_use]
pub fn effect_parameters(mode: FaultMode, t: f32) -> EffectParameterSet {
    let mut uniforms = ShaderUniforms::new();
    let mut overlays = OverlayVisibility::HIDDEN;
    let mut particle_visible = false;
    let mut tint = mode.accent_color();

    let raw = match mode {
        FaultMode::Baseline => 0.0,
        FaultMode::JointOverheat => {
            let temperature = overheat_temperature(t);
            uniforms.set_float(uniform::TEMPERATURE, temperature);
            let glow = ((temperature - 30.0) / 10.0).clamp(0.0, 1.0);
            overlays.heat = glow > 0.0;
            glow
        }
        FaultMode::ElectricalTreeing => {
            overlays.treeing = true;
            particle_visible = true;
            uniforms.set_float(uniform::PARTIAL_DISCHARGE, treeing_discharge(t));
            0.6 + 0.4 * (8.0 * t).sin()
        }
        FaultMode::MechanicalDamage => {
            overlays.flow = true;
            0.5 + 0.3 * (2.0 * t).sin()
        }
        FaultMode::WaterTreeing => {
            overlays.flow = true;
            overlays.water = true;
            tint = WATER_ALTERNATE_TINT;
            0.4
        }
    };
    // NaN from a non-finite clock collapses to zero glow
    let glow_intensity = if raw.is_finite() { raw.clamp(0.0, 1.0) } else { 0.0 };

    uniforms.set_float(uniform::TIME, t);
    uniforms.set_float(uniform::INTENSITY, glow_intensity);
    uniforms.set_vec3(uniform::TINT, tint);

    EffectParameterSet {
        mode,
        glow_intensity,
        particle_visible,
        overlays,
        tint,
        uniforms,
    }
}

/// Tracks the active mode and produces each frame's parameters.
#[derive(Debug, Clone)]
pub struct FaultEffectMachine {
    mode: FaultMode,
    transitions: u64,
    current: EffectParameterSet,
}

impl FaultEffectMachine {
    /// Starts in `initial` at t = 0.
    #[must_use]
    pub fn new(initial: FaultMode) -> Self {
        Self {
            mode: initial,
            transitions: 0,
            current: effect_parameters(initial, 0.0),
        }
    }

    /// Applies the requested mode (immediately) and recomputes the set.
    pub fn tick(&mut self, requested: FaultMode, t: f32) -> &EffectParameterSet {
        if requested != self.mode {
            tracing::info!("fault mode {} -> {}", self.mode, requested);
            self.mode = requested;
            self.transitions += 1;
        }
        self.current = effect_parameters(self.mode, t);
        &self.current
    }

    /// Active mode.
    #[must_use]
    pub const fn mode(&self) -> FaultMode {
        self.mode
    }

    /// Parameters of the last tick.
    #[must_use]
    pub const fn current(&self) -> &EffectParameterSet {
        &self.current
    }

    /// Number of mode changes seen.
    #[must_use]
    pub const fn transitions(&self) -> u64 {
        self.transitions
    }
}
