//! Consultation module - ad hoc human review requests
//!
//! A Consultation tracks one review of one piece of content through a
//! fixed lifecycle: REQUESTED -> SCHEDULED -> IN_PROGRESS -> COMPLETED,
//! with CANCELLED reachable from any non-terminal state. Transition
//! validation lives in the governance crate; this module holds the data
//! and the small structural predicates.

use crate::advisor::AdvisorId;
use crate::content_ref::ContentRef;
use std::fmt;

/// Unique identifier for a consultation, based on UUIDv7
///
/// UUIDv7 ordering makes "the most recent Consultation for this item" a
/// plain max over ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConsultationId(u128);

impl ConsultationId {
    /// Generate a new UUIDv7-based ConsultationId
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Create a ConsultationId from a raw u128 value
    pub fn from_value(value: u128) -> Self {
        Self(value)
    }

    /// Parse a ConsultationId from a UUIDv7 string
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

impl Default for ConsultationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConsultationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

/// Status of a consultation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConsultationStatus {
    /// Created, no advisor session planned yet
    Requested,

    /// An advisor session has been scheduled
    Scheduled,

    /// Review is underway
    InProgress,

    /// Review finished; verdict recorded (terminal)
    Completed,

    /// Abandoned before completion (terminal)
    Cancelled,
}

impl ConsultationStatus {
    /// Get the status name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsultationStatus::Requested => "requested",
            ConsultationStatus::Scheduled => "scheduled",
            ConsultationStatus::InProgress => "in_progress",
            ConsultationStatus::Completed => "completed",
            ConsultationStatus::Cancelled => "cancelled",
        }
    }

    /// Parse a status from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "requested" => Some(ConsultationStatus::Requested),
            "scheduled" => Some(ConsultationStatus::Scheduled),
            "in_progress" => Some(ConsultationStatus::InProgress),
            "completed" => Some(ConsultationStatus::Completed),
            "cancelled" => Some(ConsultationStatus::Cancelled),
            _ => None,
        }
    }

    /// Whether this status admits no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ConsultationStatus::Completed | ConsultationStatus::Cancelled
        )
    }
}

/// Priority of a consultation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConsultationPriority {
    /// No urgency
    Low,

    /// Default priority
    Medium,

    /// Restricted content awaiting release
    High,

    /// Sacred content; review before anything else
    Urgent,
}

impl ConsultationPriority {
    /// Get the priority name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsultationPriority::Low => "low",
            ConsultationPriority::Medium => "medium",
            ConsultationPriority::High => "high",
            ConsultationPriority::Urgent => "urgent",
        }
    }

    /// Parse a priority from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(ConsultationPriority::Low),
            "medium" => Some(ConsultationPriority::Medium),
            "high" => Some(ConsultationPriority::High),
            "urgent" => Some(ConsultationPriority::Urgent),
            _ => None,
        }
    }
}

/// Approval verdict of a completed consultation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApprovalStatus {
    /// Not yet decided (only valid while the consultation is open)
    Pending,

    /// Content approved for release
    Approved,

    /// Content must not be released
    Rejected,
}

impl ApprovalStatus {
    /// Get the approval status name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Rejected => "rejected",
        }
    }

    /// Parse an approval status from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(ApprovalStatus::Pending),
            "approved" => Some(ApprovalStatus::Approved),
            "rejected" => Some(ApprovalStatus::Rejected),
            _ => None,
        }
    }
}

/// A review request tied to one piece of content
#[derive(Debug, Clone, PartialEq)]
pub struct Consultation {
    /// Unique identifier
    pub id: ConsultationId,

    /// The content under review
    pub content: ContentRef,

    /// Why this review was requested
    pub purpose: String,

    /// Priority
    pub priority: ConsultationPriority,

    /// Assigned advisor, if any
    pub advisor: Option<AdvisorId>,

    /// Lifecycle status
    pub status: ConsultationStatus,

    /// Reviewer notes
    pub notes: Option<String>,

    /// Free-text recommendations recorded during review
    pub recommendations: Vec<String>,

    /// Cultural-sensitivity rating 1-5, set only at completion
    pub sensitivity_rating: Option<u8>,

    /// Approval verdict; Pending until completion
    pub approval: ApprovalStatus,

    /// Whether a follow-up consultation should be opened on completion
    pub follow_up_required: bool,

    /// The consultation this one follows up on, if any
    pub parent: Option<ConsultationId>,

    /// When the advisor session is scheduled (Unix seconds)
    pub scheduled_at: Option<u64>,

    /// When the review completed (Unix seconds)
    pub completed_at: Option<u64>,

    /// When the request was created (Unix seconds)
    pub created_at: u64,
}

impl Consultation {
    /// Create a new consultation in the Requested state
    pub fn new(
        content: ContentRef,
        purpose: String,
        priority: ConsultationPriority,
        advisor: Option<AdvisorId>,
        created_at: u64,
    ) -> Self {
        Self {
            id: ConsultationId::new(),
            content,
            purpose,
            priority,
            advisor,
            status: ConsultationStatus::Requested,
            notes: None,
            recommendations: Vec::new(),
            sensitivity_rating: None,
            approval: ApprovalStatus::Pending,
            follow_up_required: false,
            parent: None,
            scheduled_at: None,
            completed_at: None,
            created_at,
        }
    }
}
