//! Deterministic sensitivity classification

use crate::{ClassifierError, MarkerPolicy};
use storyloom_domain::{SensitivityAssessment, SensitivitySignal, SensitivityTier};
use tracing::debug;

/// Identifier recorded on assessments decided by the marker scan
const MARKER_SOURCE: &str = "markers";

/// Fallback tier when neither markers nor providers give a signal
const DEFAULT_TIER: SensitivityTier = SensitivityTier::Medium;

/// A compiled marker rule ready for matching
struct CompiledMarker {
    phrase_lower: String,
    category: String,
    tier: SensitivityTier,
}

/// Classifies text into a sensitivity tier
///
/// Deterministic for the same input and marker policy; the AI provider
/// signal only fills the gap when no marker matches, and can raise but
/// never lower a marker-derived tier.
pub struct SensitivityClassifier {
    markers: Vec<CompiledMarker>,
}

impl SensitivityClassifier {
    /// Build a classifier from a marker policy
    ///
    /// Rejects rules with tiers below HIGH: markers exist to restrict,
    /// and a permissive marker row is almost certainly a config mistake.
    pub fn new(policy: MarkerPolicy) -> Result<Self, ClassifierError> {
        let mut markers = Vec::with_capacity(policy.rules.len());

        for rule in &policy.rules {
            if rule.phrase.trim().is_empty() {
                return Err(ClassifierError::InvalidRule(
                    "Marker phrase is empty".to_string(),
                ));
            }
            let tier = SensitivityTier::parse(&rule.tier).ok_or_else(|| {
                ClassifierError::InvalidRule(format!(
                    "Unknown tier '{}' for phrase '{}'",
                    rule.tier, rule.phrase
                ))
            })?;
            if tier < SensitivityTier::High {
                return Err(ClassifierError::InvalidRule(format!(
                    "Marker '{}' has tier '{}'; markers must be high or sacred",
                    rule.phrase, rule.tier
                )));
            }
            markers.push(CompiledMarker {
                phrase_lower: rule.phrase.to_lowercase(),
                category: rule.category.clone(),
                tier,
            });
        }

        Ok(Self { markers })
    }

    /// Build a classifier with the default marker policy
    pub fn default_policy() -> Self {
        // The built-in policy is validated by construction
        Self::new(MarkerPolicy::default()).unwrap()
    }

    /// Produce a sensitivity assessment for a piece of text
    ///
    /// `signal` is the provider's opinion, when one exists. The returned
    /// assessment enforces SACRED => requires_review regardless of what
    /// the provider said.
    pub fn classify(
        &self,
        text: &str,
        signal: Option<&SensitivitySignal>,
        assessed_at: u64,
    ) -> SensitivityAssessment {
        let text_lower = text.to_lowercase();

        let mut marker_tier: Option<SensitivityTier> = None;
        let mut matched_categories: Vec<String> = Vec::new();

        for marker in &self.markers {
            if text_lower.contains(&marker.phrase_lower) {
                debug!(
                    "Marker '{}' matched (category {}, tier {})",
                    marker.phrase_lower,
                    marker.category,
                    marker.tier.as_str()
                );
                marker_tier = Some(match marker_tier {
                    Some(existing) => existing.max(marker.tier),
                    None => marker.tier,
                });
                if !matched_categories.contains(&marker.category) {
                    matched_categories.push(marker.category.clone());
                }
            }
        }

        let provider_tier = signal.and_then(|s| s.tier);
        let provider_flagged = signal.map_or(false, |s| s.requires_review);

        // Marker floor wins; a provider may raise but never lower it
        let tier = match (marker_tier, provider_tier) {
            (Some(marker), Some(provider)) => marker.max(provider),
            (Some(marker), None) => marker,
            (None, Some(provider)) => provider,
            (None, None) => DEFAULT_TIER,
        };

        let mut recommendations: Vec<String> = matched_categories
            .iter()
            .map(|c| format!("Consult advisors regarding {} content", c))
            .collect();
        if let Some(s) = signal {
            recommendations.extend(s.recommendations.iter().cloned());
        }

        let source = if marker_tier.is_some() {
            MARKER_SOURCE.to_string()
        } else {
            signal
                .map(|s| s.source.clone())
                .unwrap_or_else(|| MARKER_SOURCE.to_string())
        };

        SensitivityAssessment::new(tier, provider_flagged, recommendations, source, assessed_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MarkerRule;

    const NOW: u64 = 1_700_000_000;

    fn signal(tier: Option<SensitivityTier>, requires_review: bool) -> SensitivitySignal {
        SensitivitySignal {
            tier,
            requires_review,
            recommendations: vec!["Check with the family first".to_string()],
            source: "cultural_review".to_string(),
        }
    }

    #[test]
    fn test_sacred_marker_forces_sacred() {
        let classifier = SensitivityClassifier::default_policy();
        let assessment = classifier.classify(
            "The story mentions a sacred site near the river.",
            Some(&signal(Some(SensitivityTier::Low), false)),
            NOW,
        );
        assert_eq!(assessment.tier, SensitivityTier::Sacred);
        assert!(assessment.requires_review);
        assert_eq!(assessment.provider, "markers");
    }

    #[test]
    fn test_restricted_marker_forces_at_least_high() {
        let classifier = SensitivityClassifier::default_policy();
        let assessment = classifier.classify(
            "They held a ceremony at the hall.",
            Some(&signal(Some(SensitivityTier::Low), false)),
            NOW,
        );
        assert_eq!(assessment.tier, SensitivityTier::High);
        assert!(assessment.requires_review);
    }

    #[test]
    fn test_provider_can_raise_marker_tier() {
        let classifier = SensitivityClassifier::default_policy();
        let assessment = classifier.classify(
            "They held a ceremony at the hall.",
            Some(&signal(Some(SensitivityTier::Sacred), false)),
            NOW,
        );
        assert_eq!(assessment.tier, SensitivityTier::Sacred);
    }

    #[test]
    fn test_no_marker_defers_to_provider() {
        let classifier = SensitivityClassifier::default_policy();
        let assessment = classifier.classify(
            "The youth program ran all summer.",
            Some(&signal(Some(SensitivityTier::Low), false)),
            NOW,
        );
        assert_eq!(assessment.tier, SensitivityTier::Low);
        assert!(!assessment.requires_review);
        assert_eq!(assessment.provider, "cultural_review");
    }

    #[test]
    fn test_no_signal_defaults_to_medium() {
        let classifier = SensitivityClassifier::default_policy();
        let assessment =
            classifier.classify("The youth program ran all summer.", None, NOW);
        assert_eq!(assessment.tier, SensitivityTier::Medium);
        assert!(!assessment.requires_review);
    }

    #[test]
    fn test_provider_flag_forces_review_at_low_tier() {
        let classifier = SensitivityClassifier::default_policy();
        let assessment = classifier.classify(
            "The youth program ran all summer.",
            Some(&signal(Some(SensitivityTier::Low), true)),
            NOW,
        );
        assert_eq!(assessment.tier, SensitivityTier::Low);
        assert!(assessment.requires_review);
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let classifier = SensitivityClassifier::default_policy();
        let assessment = classifier.classify("A SACRED SITE was named.", None, NOW);
        assert_eq!(assessment.tier, SensitivityTier::Sacred);
    }

    #[test]
    fn test_deterministic_for_same_input() {
        let classifier = SensitivityClassifier::default_policy();
        let text = "Sorry business kept the family away.";
        let first = classifier.classify(text, None, NOW);
        let second = classifier.classify(text, None, NOW);
        assert_eq!(first, second);
    }

    #[test]
    fn test_recommendations_include_categories_and_provider_notes() {
        let classifier = SensitivityClassifier::default_policy();
        let assessment = classifier.classify(
            "Men's business was discussed near the sacred site.",
            Some(&signal(None, false)),
            NOW,
        );
        assert!(assessment
            .recommendations
            .iter()
            .any(|r| r.contains("gender_restricted")));
        assert!(assessment
            .recommendations
            .iter()
            .any(|r| r.contains("sacred_site")));
        assert!(assessment
            .recommendations
            .iter()
            .any(|r| r.contains("Check with the family")));
    }

    #[test]
    fn test_permissive_marker_rule_rejected() {
        let policy = MarkerPolicy {
            rules: vec![MarkerRule {
                phrase: "river".to_string(),
                category: "place".to_string(),
                tier: "low".to_string(),
            }],
        };
        assert!(matches!(
            SensitivityClassifier::new(policy),
            Err(ClassifierError::InvalidRule(_))
        ));
    }

    #[test]
    fn test_unknown_tier_rejected() {
        let policy = MarkerPolicy {
            rules: vec![MarkerRule {
                phrase: "river".to_string(),
                category: "place".to_string(),
                tier: "forbidden".to_string(),
            }],
        };
        assert!(matches!(
            SensitivityClassifier::new(policy),
            Err(ClassifierError::InvalidRule(_))
        ));
    }
}
