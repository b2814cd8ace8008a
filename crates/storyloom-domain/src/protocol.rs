//! Protocol module - standing, time-boxed sharing permissions
//!
//! A Protocol records that a named story may be shared with a given
//! audience without a per-instance Consultation. Protocols have no
//! intermediate states: each one is either valid (now within
//! [validated_at, expires_at), or expires_at is null) or expired.
//! Re-validation creates a new Protocol row, preserving the old one.

use crate::advisor::AdvisorId;
use std::fmt;

/// Unique identifier for a protocol, based on UUIDv7
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProtocolId(u128);

impl ProtocolId {
    /// Generate a new UUIDv7-based ProtocolId
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Create a ProtocolId from a raw u128 value
    pub fn from_value(value: u128) -> Self {
        Self(value)
    }

    /// Parse a ProtocolId from a UUIDv7 string
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

impl Default for ProtocolId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProtocolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

/// How widely the covered story may be shared
///
/// Ordered from most to least permissive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SharingPermission {
    /// Publicly shareable with attribution to traditional owners
    PublicWithAttribution,

    /// Shareable within the community only
    CommunityOnly,

    /// Restricted to elders
    RestrictedElders,
}

impl SharingPermission {
    /// Get the permission name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            SharingPermission::PublicWithAttribution => "public_with_attribution",
            SharingPermission::CommunityOnly => "community_only",
            SharingPermission::RestrictedElders => "restricted_elders",
        }
    }

    /// Parse a permission from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "public_with_attribution" => Some(SharingPermission::PublicWithAttribution),
            "community_only" => Some(SharingPermission::CommunityOnly),
            "restricted_elders" => Some(SharingPermission::RestrictedElders),
            _ => None,
        }
    }

    /// Whether this permission level admits the given audience
    ///
    /// A permission admits an audience when it is at least as permissive
    /// as the audience requires.
    pub fn admits(&self, audience: Audience) -> bool {
        match self {
            SharingPermission::PublicWithAttribution => true,
            SharingPermission::CommunityOnly => audience != Audience::Public,
            SharingPermission::RestrictedElders => audience == Audience::Elders,
        }
    }
}

/// The audience a publish attempt targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Audience {
    /// The open public site
    Public,

    /// Community members only
    Community,

    /// Elders only
    Elders,
}

impl Audience {
    /// Get the audience name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Audience::Public => "public",
            Audience::Community => "community",
            Audience::Elders => "elders",
        }
    }
}

/// A standing sharing permission for a named story
#[derive(Debug, Clone, PartialEq)]
pub struct Protocol {
    /// Unique identifier
    pub id: ProtocolId,

    /// Title of the covered story; matching is by normalized title
    pub story_title: String,

    /// Story type (e.g. "creation", "historical", "family")
    pub story_type: String,

    /// Names of the traditional owners of the story
    pub traditional_owners: Vec<String>,

    /// Geographic origin
    pub origin: Option<String>,

    /// Seasonal restrictions on sharing, if any
    pub seasonal_restrictions: Vec<String>,

    /// Gender restriction, if any
    pub gender_restriction: Option<String>,

    /// Age restriction, if any
    pub age_restriction: Option<String>,

    /// Ceremonial context note
    pub ceremonial_context: Option<String>,

    /// Sharing permission level
    pub sharing: SharingPermission,

    /// Whether a Consultation is still required despite this Protocol
    pub consultation_required: bool,

    /// The advisor who validated this protocol
    pub validated_by: AdvisorId,

    /// When validation happened (Unix seconds)
    pub validated_at: u64,

    /// Expiry (Unix seconds); None means indefinite
    pub expires_at: Option<u64>,

    /// The protocol this one re-validates, if any
    pub supersedes: Option<ProtocolId>,
}

impl Protocol {
    /// Whether this protocol is valid at the given instant
    ///
    /// A protocol with `expires_at` in the past is treated as absent for
    /// gating purposes, regardless of its other fields.
    pub fn is_valid_at(&self, now: u64) -> bool {
        now >= self.validated_at && self.expires_at.map_or(true, |e| now < e)
    }
}
