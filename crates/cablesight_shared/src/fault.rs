//! # Fault Modes
//!
//! The simulated failure category currently shown on the joint. Exactly one
//! mode is active at a time and switching is immediate.
//!
//! Unknown names never fail: anything the host sends that does not match a
//! known mode is treated as `Baseline`, so the effect state machine always
//! has a defined input for the next tick.

use serde::{Deserialize, Deserializer, Serialize};

/// Simulated fault category.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum FaultMode {
    /// Healthy joint - no overlays.
    #[default]
    Baseline = 0,
    /// Branching discharge channels in the insulation.
    ElectricalTreeing = 1,
    /// Crushed or abraded armour and jacket.
    MechanicalDamage = 2,
    /// Hot spot at the joint body.
    JointOverheat = 3,
    /// Moisture-driven degradation spread across the insulation.
    WaterTreeing = 4,
}

impl FaultMode {
    /// Every mode, in selector order.
    pub const ALL: [Self; 5] = [
        Self::Baseline,
        Self::ElectricalTreeing,
        Self::MechanicalDamage,
        Self::JointOverheat,
        Self::WaterTreeing,
    ];

    /// Converts from the host's numeric selector. Unknown values map to `Baseline`.
    #[must_use]
    pub const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::ElectricalTreeing,
            2 => Self::MechanicalDamage,
            3 => Self::JointOverheat,
            4 => Self::WaterTreeing,
            _ => Self::Baseline,
        }
    }

    /// Looks up a mode by name.
    ///
    /// Matching ignores case, `_`, `-` and spaces, and accepts a few short
    /// aliases (`normal`, `treeing`, `overheat`, `water`, `mechanical`).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let key: String = name
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .map(|c| c.to_ascii_lowercase())
            .collect();

        match key.as_str() {
            "baseline" | "normal" | "none" => Some(Self::Baseline),
            "electricaltreeing" | "treeing" | "electrical" => Some(Self::ElectricalTreeing),
            "mechanicaldamage" | "mechanical" | "damage" => Some(Self::MechanicalDamage),
            "jointoverheat" | "overheat" | "thermal" => Some(Self::JointOverheat),
            "watertreeing" | "water" | "moisture" => Some(Self::WaterTreeing),
            _ => None,
        }
    }

    /// Like [`Self::from_name`], falling back to `Baseline` with a warning.
    #[must_use]
    pub fn parse_lenient(name: &str) -> Self {
        Self::from_name(name).unwrap_or_else(|| {
            tracing::warn!("unknown fault mode {:?}, falling back to baseline", name);
            Self::Baseline
        })
    }

    /// Canonical snake-case name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Baseline => "baseline",
            Self::ElectricalTreeing => "electrical_treeing",
            Self::MechanicalDamage => "mechanical_damage",
            Self::JointOverheat => "joint_overheat",
            Self::WaterTreeing => "water_treeing",
        }
    }

    /// Accent color used for overlays, screens and indicators (linear RGB).
    #[must_use]
    pub const fn accent_color(self) -> [f32; 3] {
        match self {
            Self::Baseline => [0.15, 0.85, 0.45],          // Green
            Self::ElectricalTreeing => [0.45, 0.65, 1.0],  // Electric blue
            Self::MechanicalDamage => [1.0, 0.6, 0.1],     // Amber
            Self::JointOverheat => [1.0, 0.25, 0.1],       // Red-orange
            Self::WaterTreeing => [0.1, 0.75, 0.95],       // Cyan
        }
    }

    /// Severity bucket for indicator coloring: 0 = healthy, 2 = critical.
    #[must_use]
    pub const fn severity(self) -> u8 {
        match self {
            Self::Baseline => 0,
            Self::MechanicalDamage | Self::WaterTreeing => 1,
            Self::ElectricalTreeing | Self::JointOverheat => 2,
        }
    }

    /// Returns true for every mode except `Baseline`.
    #[must_use]
    pub const fn is_fault(self) -> bool {
        !matches!(self, Self::Baseline)
    }
}

impl std::fmt::Display for FaultMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for FaultMode {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse_lenient(s))
    }
}

impl<'de> Deserialize<'de> for FaultMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Self::parse_lenient(&name))
    }
}
