//! Declarative cadence table.
//!
//! Every "run this every N frames" rule lives here, keyed by subsystem.
//! The scheduler consults the table once per tick; no subsystem does its own
//! modulo check.

use cablesight_shared::{CadenceSettings, Subsystem};

use crate::error::{EngineError, EngineResult};

/// One row of the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CadenceEntry {
    /// Gated subsystem.
    pub subsystem: Subsystem,
    /// Period in frames, at least 1.
    pub period: u32,
}

/// Subsystem periods, in run order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CadenceTable {
    entries: Vec<CadenceEntry>,
}

impl CadenceTable {
    /// Builds a table from explicit rows, keeping their order.
    ///
    /// # Errors
    ///
    /// `InvalidCadence` for a zero period.
    pub fn new(rows: impl IntoIterator<Item = (Subsystem, u32)>) -> EngineResult<Self> {
        let mut entries = Vec::new();
        for (subsystem, period) in rows {
            if period == 0 {
                return Err(EngineError::InvalidCadence {
                    subsystem: subsystem.name(),
                });
            }
            entries.retain(|e: &CadenceEntry| e.subsystem != subsystem);
            entries.push(CadenceEntry { subsystem, period });
        }
        Ok(Self { entries })
    }

    /// Table for every subsystem, from configuration.
    ///
    /// # Errors
    ///
    /// `InvalidCadence` for a zero period.
    pub fn from_settings(settings: &CadenceSettings) -> EngineResult<Self> {
        Self::new(Subsystem::ALL.map(|s| (s, settings.period(s))))
    }

    /// Rows in run order.
    #[must_use]
    pub fn entries(&self) -> &[CadenceEntry] {
        &self.entries
    }

    /// Period of `subsystem`, if it is gated.
    #[must_use]
    pub fn period(&self, subsystem: Subsystem) -> Option<u32> {
        self.entries.iter().find(|e| e.subsystem == subsystem).map(|e| e.period)
    }

    /// Returns true if `subsystem` runs on `frame`.
    #[must_use]
    pub fn is_due(&self, subsystem: Subsystem, frame: u64) -> bool {
        self.period(subsystem).is_some_and(|p| frame % u64::from(p) == 0)
    }

    /// Subsystems due on `frame`, in run order.
    pub fn due(&self, frame: u64) -> impl Iterator<Item = Subsystem> + '_ {
        self.entries
            .iter()
            .filter(move |e| frame % u64::from(e.period) == 0)
            .map(|e| e.subsystem)
    }
}
