//! Storyloom Sensitivity Classifier
//!
//! Assigns a cultural-sensitivity tier to a piece of text by blending a
//! deterministic keyword/phrase scan with whatever signal the AI
//! providers contributed. The scan has final say, so decisions stay
//! auditable: the same input and marker policy always yield the same
//! assessment.
//!
//! Precedence:
//! 1. Any SACRED-tier marker forces tier SACRED
//! 2. Any other marker forces at least HIGH
//! 3. Otherwise the provider's tier suggestion is used
//! 4. Otherwise MEDIUM (never default to the most permissive tier)
//!
//! `requires_review` is true whenever the tier is HIGH or SACRED, or
//! whenever a provider explicitly flagged the text regardless of tier.

#![warn(missing_docs)]

mod classifier;
mod markers;

pub use classifier::SensitivityClassifier;
pub use markers::{MarkerPolicy, MarkerRule};

use thiserror::Error;

/// Errors that can occur while building a classifier
#[derive(Error, Debug)]
pub enum ClassifierError {
    /// A policy row is malformed
    #[error("Invalid marker rule: {0}")]
    InvalidRule(String),

    /// Policy TOML could not be parsed
    #[error("Policy parse error: {0}")]
    PolicyParse(String),
}
