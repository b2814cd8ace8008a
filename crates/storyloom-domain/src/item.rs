//! Extracted item module - candidate Stories and Outcomes

use crate::confidence::Confidence;
use crate::document::DocumentId;
use crate::sensitivity::SensitivityAssessment;
use std::fmt;

/// Unique identifier for an extracted item, based on UUIDv7
///
/// UUIDv7 ids are chronologically sortable, so "most recent" queries
/// reduce to id ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemId(u128);

impl ItemId {
    /// Generate a new UUIDv7-based ItemId
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Create an ItemId from a raw u128 value
    ///
    /// This is primarily for storage layer deserialization.
    pub fn from_value(value: u128) -> Self {
        Self(value)
    }

    /// Parse an ItemId from a UUIDv7 string
    pub fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s)
            .map(|u| Self(u.as_u128()))
            .map_err(|e| format!("Invalid UUIDv7 string: {}", e))
    }

    /// Get the raw u128 value
    pub fn value(&self) -> u128 {
        self.0
    }

    /// Get the timestamp component of the UUIDv7 (milliseconds since Unix epoch)
    pub fn timestamp(&self) -> u64 {
        // UUIDv7: top 48 bits are Unix millisecond timestamp
        (self.0 >> 80) as u64
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

/// Kind of extracted item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    /// A narrative story
    Story,

    /// A measurable outcome
    Outcome,
}

impl ItemKind {
    /// Get the kind name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Story => "story",
            ItemKind::Outcome => "outcome",
        }
    }

    /// Parse a kind from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "story" => Some(ItemKind::Story),
            "outcome" => Some(ItemKind::Outcome),
            _ => None,
        }
    }
}

/// Lifecycle status of an extracted item
///
/// Items are never deleted, only archived (audit trail requirement).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemStatus {
    /// Freshly extracted, not yet queued for review
    Draft,

    /// Waiting on human approval
    PendingApproval,

    /// Approved for publication
    Approved,

    /// Rejected by a reviewer
    Rejected,

    /// Publicly visible
    Published,

    /// Retired from visibility but retained for audit
    Archived,
}

impl ItemStatus {
    /// Get the status name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Draft => "draft",
            ItemStatus::PendingApproval => "pending_approval",
            ItemStatus::Approved => "approved",
            ItemStatus::Rejected => "rejected",
            ItemStatus::Published => "published",
            ItemStatus::Archived => "archived",
        }
    }

    /// Parse a status from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Some(ItemStatus::Draft),
            "pending_approval" => Some(ItemStatus::PendingApproval),
            "approved" => Some(ItemStatus::Approved),
            "rejected" => Some(ItemStatus::Rejected),
            "published" => Some(ItemStatus::Published),
            "archived" => Some(ItemStatus::Archived),
            _ => None,
        }
    }
}

/// A labeled measurement on an Outcome item
#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    /// What is being measured
    pub label: String,

    /// The measured value, as reported
    pub value: String,
}

/// One provider's confidence contribution to a merged item
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderScore {
    /// Provider identifier
    pub provider: String,

    /// That provider's confidence for this item
    pub confidence: Confidence,
}

/// A candidate Story or Outcome produced by extraction
///
/// Created by the orchestrator; mutated by the governance workflow and
/// by human approval actions; never deleted, only archived.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedItem {
    /// Unique identifier
    pub id: ItemId,

    /// The document this item was extracted from
    pub document: DocumentId,

    /// Story or Outcome
    pub kind: ItemKind,

    /// Item title
    pub title: String,

    /// Body text (stories) or description (outcomes)
    pub body: String,

    /// Optional category label
    pub category: Option<String>,

    /// Free-form tags, kept sorted and deduplicated
    pub tags: Vec<String>,

    /// Ordered metrics (outcomes only)
    pub metrics: Vec<Metric>,

    /// Cultural-significance note (stories only)
    pub cultural_note: Option<String>,

    /// Aggregate confidence (maximum across contributors)
    pub confidence: Confidence,

    /// Per-provider confidence contributions
    pub contributors: Vec<ProviderScore>,

    /// Sensitivity assessments, oldest first; reassessments append
    pub assessments: Vec<SensitivityAssessment>,

    /// Lifecycle status
    pub status: ItemStatus,

    /// When this item was created (Unix seconds)
    pub created_at: u64,
}

impl ExtractedItem {
    /// The current (most recent) sensitivity assessment, if any
    pub fn assessment(&self) -> Option<&SensitivityAssessment> {
        self.assessments.last()
    }

    /// Whether the current assessment requires human review
    ///
    /// Defaults to true when no assessment exists yet (default-deny).
    pub fn requires_review(&self) -> bool {
        self.assessment().map_or(true, |a| a.requires_review)
    }

    /// The item title in normalized form (see [`normalize_title`])
    pub fn normalized_title(&self) -> String {
        normalize_title(&self.title)
    }
}

/// Normalize a title for identity comparison
///
/// Lowercased, with runs of whitespace collapsed to single spaces and
/// leading/trailing whitespace removed. Two candidates from the same
/// document with equal normalized titles are the same underlying item;
/// the same normalization keys Protocol title matching.
pub fn normalize_title(title: &str) -> String {
    title
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensitivity::{SensitivityAssessment, SensitivityTier};

    fn create_test_item() -> ExtractedItem {
        ExtractedItem {
            id: ItemId::new(),
            document: DocumentId::new(),
            kind: ItemKind::Story,
            title: "River crossing".to_string(),
            body: "How the community rebuilt the crossing.".to_string(),
            category: Some("community".to_string()),
            tags: vec!["infrastructure".to_string()],
            metrics: vec![],
            cultural_note: None,
            confidence: Confidence::new(0.8).unwrap(),
            contributors: vec![],
            assessments: vec![],
            status: ItemStatus::Draft,
            created_at: 1_700_000_000,
        }
    }

    #[test]
    fn test_normalize_title() {
        assert_eq!(normalize_title("  River   Crossing "), "river crossing");
        assert_eq!(normalize_title("RIVER\tCROSSING"), "river crossing");
        assert_eq!(normalize_title("river crossing"), "river crossing");
    }

    #[test]
    fn test_requires_review_defaults_to_true() {
        let item = create_test_item();
        assert!(item.assessment().is_none());
        assert!(item.requires_review(), "unassessed items must default-deny");
    }

    #[test]
    fn test_latest_assessment_wins() {
        let mut item = create_test_item();
        item.assessments.push(SensitivityAssessment::new(
            SensitivityTier::High,
            true,
            vec![],
            "markers".to_string(),
            1_700_000_000,
        ));
        item.assessments.push(SensitivityAssessment::new(
            SensitivityTier::Low,
            false,
            vec![],
            "cultural_review".to_string(),
            1_700_000_100,
        ));

        assert_eq!(item.assessment().unwrap().tier, SensitivityTier::Low);
        assert!(!item.requires_review());
        // Earlier assessment retained for audit
        assert_eq!(item.assessments.len(), 2);
    }

    #[test]
    fn test_item_id_chronological() {
        let id1 = ItemId::new();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let id2 = ItemId::new();
        assert!(id1 < id2);
        assert!(id1.timestamp() <= id2.timestamp());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: ItemId ordering matches u128 ordering
        #[test]
        fn test_item_id_ordering(a: u128, b: u128) {
            let id_a = ItemId::from_value(a);
            let id_b = ItemId::from_value(b);
            prop_assert_eq!(id_a < id_b, a < b);
            prop_assert_eq!(id_a == id_b, a == b);
        }

        /// Property: normalization is idempotent
        #[test]
        fn test_normalize_idempotent(title in ".{0,80}") {
            let once = normalize_title(&title);
            prop_assert_eq!(normalize_title(&once), once.clone());
        }
    }
}
