//! Sensitivity module - cultural-sensitivity tiers and assessments

/// Cultural-sensitivity tier of a piece of content
///
/// Tiers are totally ordered; `Sacred` is maximal. Content at `High` or
/// `Sacred` always requires human review before publication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SensitivityTier {
    /// Freely shareable content
    Low,

    /// Default tier when no signal suggests otherwise
    Medium,

    /// Restricted content; review required
    High,

    /// Sacred or ceremonial content; review always required
    Sacred,
}

impl SensitivityTier {
    /// Get the tier name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            SensitivityTier::Low => "low",
            SensitivityTier::Medium => "medium",
            SensitivityTier::High => "high",
            SensitivityTier::Sacred => "sacred",
        }
    }

    /// Parse a tier from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(SensitivityTier::Low),
            "medium" => Some(SensitivityTier::Medium),
            "high" => Some(SensitivityTier::High),
            "sacred" => Some(SensitivityTier::Sacred),
            _ => None,
        }
    }
}

impl std::str::FromStr for SensitivityTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid sensitivity tier: {}", s))
    }
}

/// A provider's opinion on the sensitivity of a piece of text
///
/// Signals are advisory input to the deterministic classifier, which has
/// final say over the assessment.
#[derive(Debug, Clone, PartialEq)]
pub struct SensitivitySignal {
    /// Suggested tier, if the provider gave one
    pub tier: Option<SensitivityTier>,

    /// Whether the provider explicitly flagged the text for review
    pub requires_review: bool,

    /// Recommended actions
    pub recommendations: Vec<String>,

    /// Identifier of the provider that produced this signal
    pub source: String,
}

/// One sensitivity assessment of one piece of content
///
/// An item may be reassessed when its content changes; new assessments
/// are appended and previous ones retained for audit.
#[derive(Debug, Clone, PartialEq)]
pub struct SensitivityAssessment {
    /// Assigned tier
    pub tier: SensitivityTier,

    /// Whether publication must be gated behind a Consultation
    pub requires_review: bool,

    /// Free-text recommended actions for reviewers
    pub recommendations: Vec<String>,

    /// Identifier of the provider (or "markers" for the keyword scan)
    /// that produced this assessment
    pub provider: String,

    /// When the assessment was made (Unix seconds)
    pub assessed_at: u64,
}

impl SensitivityAssessment {
    /// Create a new assessment, enforcing the Sacred review invariant
    ///
    /// `Sacred` tier always implies `requires_review = true`; a provider
    /// payload cannot override this.
    pub fn new(
        tier: SensitivityTier,
        requires_review: bool,
        recommendations: Vec<String>,
        provider: String,
        assessed_at: u64,
    ) -> Self {
        let requires_review =
            requires_review || tier >= SensitivityTier::High;
        Self {
            tier,
            requires_review,
            recommendations,
            provider,
            assessed_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_ordering() {
        assert!(SensitivityTier::Low < SensitivityTier::Medium);
        assert!(SensitivityTier::Medium < SensitivityTier::High);
        assert!(SensitivityTier::High < SensitivityTier::Sacred);
    }

    #[test]
    fn test_tier_round_trip() {
        for tier in [
            SensitivityTier::Low,
            SensitivityTier::Medium,
            SensitivityTier::High,
            SensitivityTier::Sacred,
        ] {
            assert_eq!(SensitivityTier::parse(tier.as_str()), Some(tier));
        }
    }

    #[test]
    fn test_sacred_forces_review() {
        let assessment = SensitivityAssessment::new(
            SensitivityTier::Sacred,
            false, // provider says no review needed
            vec![],
            "language_model".to_string(),
            1_700_000_000,
        );
        assert!(assessment.requires_review);
    }

    #[test]
    fn test_high_forces_review() {
        let assessment = SensitivityAssessment::new(
            SensitivityTier::High,
            false,
            vec![],
            "markers".to_string(),
            1_700_000_000,
        );
        assert!(assessment.requires_review);
    }

    #[test]
    fn test_low_tier_keeps_provider_flag() {
        let flagged = SensitivityAssessment::new(
            SensitivityTier::Low,
            true,
            vec![],
            "cultural_review".to_string(),
            1_700_000_000,
        );
        assert!(flagged.requires_review);

        let unflagged = SensitivityAssessment::new(
            SensitivityTier::Low,
            false,
            vec![],
            "cultural_review".to_string(),
            1_700_000_000,
        );
        assert!(!unflagged.requires_review);
    }
}
