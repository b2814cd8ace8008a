//! Confidence module - scalar provider confidence in [0, 1]

use std::fmt;

/// A validated confidence score in [0.0, 1.0]
///
/// Providers report one score per finding. When findings merge, the
/// aggregate is the maximum across contributors: a single strong signal
/// is enough to surface a candidate, and confidence is never diluted by
/// disagreement.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Confidence(f64);

impl Confidence {
    /// Create a new confidence score
    ///
    /// Returns an error if the value is outside [0.0, 1.0] or not finite.
    pub fn new(value: f64) -> Result<Self, String> {
        if !value.is_finite() {
            return Err(format!("Confidence must be finite, got {}", value));
        }
        if !(0.0..=1.0).contains(&value) {
            return Err(format!("Confidence {} out of range [0.0, 1.0]", value));
        }
        Ok(Self(value))
    }

    /// Create a confidence score, clamping into [0.0, 1.0]
    ///
    /// Non-finite input clamps to 0.0. Useful for untrusted provider
    /// payloads where an out-of-range score should degrade, not abort.
    pub fn clamped(value: f64) -> Self {
        if !value.is_finite() {
            return Self(0.0);
        }
        Self(value.clamp(0.0, 1.0))
    }

    /// Get the raw value
    pub fn value(&self) -> f64 {
        self.0
    }

    /// The greater of two scores (the merge aggregation rule)
    pub fn max(self, other: Self) -> Self {
        if other.0 > self.0 {
            other
        } else {
            self
        }
    }

    /// Whether this score meets a configured floor
    pub fn meets_floor(&self, floor: f64) -> bool {
        self.0 >= floor
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}
