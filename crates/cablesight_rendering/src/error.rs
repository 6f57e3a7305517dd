//! # Engine Error Types
//!
//! All errors that can occur while building, ticking or tearing down an
//! engine instance.
//!
//! | Class | Variants | Engine reaction |
//! |---|---|---|
//! | Construction | `SurfaceUnavailable` | stay Pending, retry on next valid resize |
//! | Resource exhaustion | `ContextLost`, `AllocationFailed` | terminal: release everything, enter Failed |
//! | Assembly defect | `InvalidGeometry`, `StaleNode` | terminal |
//! | Setup | `InvalidCadence`, `Config` | returned from `Engine::new`, engine never built |

use cablesight_shared::ConfigError;
use thiserror::Error;

use crate::backend::ResourceKind;

/// Errors that can occur in the engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// No drawable surface of a usable size.
    #[error("render surface unavailable at {width}x{height}")]
    SurfaceUnavailable {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },

    /// The rendering context was lost.
    #[error("rendering context lost")]
    ContextLost,

    /// A GPU-side allocation failed.
    #[error("GPU allocation failed for {kind}")]
    AllocationFailed {
        /// Kind of resource that could not be allocated.
        kind: ResourceKind,
    },

    /// Assembled geometry breaks an invariant (e.g. overlapping layers).
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// A node handle no longer resolves in the scene graph.
    #[error("scene node `{0}` no longer exists")]
    StaleNode(String),

    /// A cadence period of zero frames.
    #[error("cadence for {subsystem} must be at least 1 frame")]
    InvalidCadence {
        /// Subsystem name.
        subsystem: &'static str,
    },

    /// Configuration was rejected.
    #[error("configuration rejected: {0}")]
    Config(String),
}

impl EngineError {
    /// Returns true if the engine instance cannot continue after this error.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::ContextLost
                | Self::AllocationFailed { .. }
                | Self::InvalidGeometry(_)
                | Self::StaleNode(_)
        )
    }
}

impl From<ConfigError> for EngineError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_taxonomy() {
        assert!(!EngineError::SurfaceUnavailable { width: 0, height: 0 }.is_terminal());
        assert!(EngineError::ContextLost.is_terminal());
        assert!(EngineError::AllocationFailed { kind: ResourceKind::Texture }.is_terminal());
        assert!(!EngineError::InvalidCadence { subsystem: "indicator-blink" }.is_terminal());
    }

    #[test]
    fn test_config_conversion() {
        let err: EngineError = ConfigError::Invalid {
            field: "cadence",
            reason: "zero".to_string(),
        }
        .into();
        assert!(matches!(err, EngineError::Config(ref msg) if msg.contains("cadence")));
    }
}
