//! Visual Effects
//!
//! - Fault-mode effect state machine (pure per-frame parameters)
//! - Discharge particle emitter

mod fault_state;
mod particles;

pub use fault_state::{
    effect_parameters, uniform, EffectParameterSet, FaultEffectMachine, OverlayVisibility, WATER_ALTERNATE_TINT,
};
pub use particles::{
    DischargeConfig, DischargeEmitter, DischargeParticle, EmissionRing, ParticleStats, MAX_DISCHARGE_PARTICLES,
};
