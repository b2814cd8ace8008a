//! Cultural advisor module - human reviewers

use std::fmt;

/// Unique identifier for a cultural advisor, based on UUIDv7
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AdvisorId(u128);

impl AdvisorId {
    /// Generate a new UUIDv7-based AdvisorId
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Create an AdvisorId from a raw u128 value
    pub fn from_value(value: u128) -> Self {
        Self(value)
    }

    /// Parse an AdvisorId from a UUIDv7 string
    pub fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s)
            .map(|u| Self(u.as_u128()))
            .map_err(|e| format!("Invalid UUIDv7 string: {}", e))
    }

    /// Get the raw u128 value
    pub fn value(&self) -> u128 {
        self.0
    }
}

impl Default for AdvisorId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AdvisorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

/// A human reviewer. Static reference entity; not mutated by the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct CulturalAdvisor {
    /// Unique identifier
    pub id: AdvisorId,

    /// Full name
    pub name: String,

    /// Community affiliation
    pub affiliation: String,

    /// Specialty tags (e.g. "oral-history", "ceremony")
    pub specialties: Vec<String>,

    /// Whether the advisor currently accepts consultations
    pub active: bool,
}
