//! Marker policy table
//!
//! The marker list is a configurable policy table rather than hard-coded
//! strings: the actual phrases belong to the community's cultural
//! advisors, and the built-in defaults are a conservative starting set
//! pending their sign-off.

use serde::{Deserialize, Serialize};

/// One row of the marker policy table
///
/// `tier` is the string form of a sensitivity tier ("high" or "sacred");
/// it is validated when the classifier is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerRule {
    /// Phrase to scan for (case-insensitive substring match)
    pub phrase: String,

    /// Restricted category this phrase indicates
    pub category: String,

    /// Tier forced by a match ("high" or "sacred")
    pub tier: String,
}

/// The configured set of marker rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerPolicy {
    /// Policy rows
    pub rules: Vec<MarkerRule>,
}

impl MarkerPolicy {
    /// Load a policy from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize the policy to a TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

impl Default for MarkerPolicy {
    /// Conservative built-in marker set
    ///
    /// Placeholder phrases pending advisor sign-off on the real list.
    fn default() -> Self {
        let rule = |phrase: &str, category: &str, tier: &str| MarkerRule {
            phrase: phrase.to_string(),
            category: category.to_string(),
            tier: tier.to_string(),
        };

        Self {
            rules: vec![
                rule("sacred site", "sacred_site", "sacred"),
                rule("songline", "sacred_site", "sacred"),
                rule("initiation", "ceremonial", "sacred"),
                rule("burial ground", "mourning", "sacred"),
                rule("ceremony", "ceremonial", "high"),
                rule("ceremonial", "ceremonial", "high"),
                rule("men's business", "gender_restricted", "high"),
                rule("women's business", "gender_restricted", "high"),
                rule("sorry business", "mourning", "high"),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_has_rules() {
        let policy = MarkerPolicy::default();
        assert!(!policy.rules.is_empty());
        assert!(policy.rules.iter().any(|r| r.tier == "sacred"));
        assert!(policy.rules.iter().any(|r| r.tier == "high"));
    }

    #[test]
    fn test_toml_round_trip() {
        let policy = MarkerPolicy::default();
        let toml_str = policy.to_toml().unwrap();
        let parsed = MarkerPolicy::from_toml(&toml_str).unwrap();
        assert_eq!(policy, parsed);
    }

    #[test]
    fn test_custom_policy_from_toml() {
        let toml_str = r#"
            [[rules]]
            phrase = "crossing story"
            category = "family"
            tier = "high"
        "#;
        let policy = MarkerPolicy::from_toml(toml_str).unwrap();
        assert_eq!(policy.rules.len(), 1);
        assert_eq!(policy.rules[0].phrase, "crossing story");
    }
}
