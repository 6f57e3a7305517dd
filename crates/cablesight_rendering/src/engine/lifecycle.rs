//! Lifecycle states of one engine instance.
//!
//! ```text
//!              mount                        resize < min
//! Unmounted ─────────► Mounting ──► Mounted ◄────────────► Suspended
//!   ▲    │                ▲            │      resize >= min
//!   │    │ no surface     │ valid      │ unmount
//!   │    └──► Pending ────┘ resize     ▼
//!   └──────────────────────────── Unmounting
//!
//! terminal resource error (any state with resources) ──► Failed
//! ```

use std::fmt;

/// Where the engine is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecycleState {
    /// Nothing built.
    #[default]
    Unmounted,
    /// Mount requested but the host surface is unusable; waiting for a
    /// valid resize.
    Pending {
        /// Last reported width.
        width: u32,
        /// Last reported height.
        height: u32,
    },
    /// Building the scene.
    Mounting,
    /// Scene built and ticking.
    Mounted,
    /// Scene built but the host shrank below the minimum; no ticks.
    Suspended {
        /// Last reported width.
        width: u32,
        /// Last reported height.
        height: u32,
    },
    /// Tearing down.
    Unmounting,
    /// A terminal error released everything. Final.
    Failed,
}

impl LifecycleState {
    /// Returns true while a scene exists (ticking or suspended).
    #[must_use]
    pub const fn has_scene(self) -> bool {
        matches!(self, Self::Mounted | Self::Suspended { .. })
    }

    /// Short name for logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Unmounted => "unmounted",
            Self::Pending { .. } => "pending",
            Self::Mounting => "mounting",
            Self::Mounted => "mounted",
            Self::Suspended { .. } => "suspended",
            Self::Unmounting => "unmounting",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending { width, height } | Self::Suspended { width, height } => {
                write!(f, "{} ({width}x{height})", self.name())
            }
            _ => f.write_str(self.name()),
        }
    }
}
