//! Actor (network facility) aggregate record
//!
//! Represents the per-actor volume totals accumulated by one streaming pass
//! over the ledger. Each actor has:
//! - Maximum declared capacity (overwritten, not accumulated)
//! - Captured volume (total attributed input, accumulated)
//! - Treated volume (total output after the actor's own losses, accumulated)
//!
//! CRITICAL: All volumes are f64 in thousands of cubic meters per year.

use serde::{Deserialize, Serialize};

/// Per-actor aggregate volumes
///
/// Created zero-initialized on first reference to the actor's identifier,
/// then mutated in place by subsequent ledger rows. Lives for the duration
/// of one index build.
///
/// # Example
/// ```
/// use water_network_core_rs::ActorRecord;
///
/// let mut record = ActorRecord::new();
/// record.add_captured(100.0);
/// record.add_treated(90.0);
/// assert_eq!(record.captured_volume(), 100.0);
/// assert_eq!(record.treated_volume(), 90.0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActorRecord {
    /// Declared maximum capacity; the most recent positive declaration wins
    max_capacity: f64,

    /// Total volume captured from sources (monotonically accumulated)
    captured_volume: f64,

    /// Total volume treated/delivered downstream (monotonically accumulated)
    treated_volume: f64,
}

impl ActorRecord {
    /// Create a zero-initialized record
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulate captured volume by addition
    ///
    /// Non-finite values are ignored so that one malformed row cannot
    /// poison the whole sum.
    pub fn add_captured(&mut self, v: f64) {
        if v.is_finite() {
            self.captured_volume += v;
        }
    }

    /// Accumulate treated volume by addition
    ///
    /// Non-finite values are ignored, same as [`add_captured`](Self::add_captured).
    pub fn add_treated(&mut self, v: f64) {
        if v.is_finite() {
            self.treated_volume += v;
        }
    }

    /// Overwrite the maximum capacity
    ///
    /// Only strictly positive declarations are honored; a zero or negative
    /// declaration is ignored, not an error.
    pub fn set_max_capacity(&mut self, v: f64) {
        if v.is_finite() && v > 0.0 {
            self.max_capacity = v;
        }
    }

    /// Declared maximum capacity (0.0 until a positive declaration is seen)
    pub fn max_capacity(&self) -> f64 {
        self.max_capacity
    }

    /// Total captured volume
    pub fn captured_volume(&self) -> f64 {
        self.captured_volume
    }

    /// Total treated volume
    pub fn treated_volume(&self) -> f64 {
        self.treated_volume
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_is_zeroed() {
        let record = ActorRecord::new();
        assert_eq!(record.max_capacity(), 0.0);
        assert_eq!(record.captured_volume(), 0.0);
        assert_eq!(record.treated_volume(), 0.0);
    }

    #[test]
    fn test_set_max_capacity_ignores_non_positive() {
        let mut record = ActorRecord::new();
        record.set_max_capacity(500.0);
        record.set_max_capacity(0.0);
        record.set_max_capacity(-10.0);
        assert_eq!(record.max_capacity(), 500.0);
    }

    #[test]
    fn test_set_max_capacity_overwrites() {
        let mut record = ActorRecord::new();
        record.set_max_capacity(500.0);
        record.set_max_capacity(750.0);
        // Most recent positive declaration wins
        assert_eq!(record.max_capacity(), 750.0);
    }

    #[test]
    fn test_accumulation_ignores_non_finite() {
        let mut record = ActorRecord::new();
        record.add_captured(100.0);
        record.add_captured(f64::NAN);
        record.add_captured(f64::INFINITY);
        assert_eq!(record.captured_volume(), 100.0);
    }
}
