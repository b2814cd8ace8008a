//! Protocol creation and re-validation

use crate::GovernanceError;
use storyloom_domain::{AdvisorId, Protocol, ProtocolId, SharingPermission};
use tracing::info;

/// Fields an advisor supplies when validating a new protocol
#[derive(Debug, Clone)]
pub struct ProtocolDraft {
    /// Title of the covered story
    pub story_title: String,

    /// Story type (e.g. "creation", "historical", "family")
    pub story_type: String,

    /// Names of the traditional owners
    pub traditional_owners: Vec<String>,

    /// Geographic origin
    pub origin: Option<String>,

    /// Seasonal restrictions on sharing
    pub seasonal_restrictions: Vec<String>,

    /// Gender restriction, if any
    pub gender_restriction: Option<String>,

    /// Age restriction, if any
    pub age_restriction: Option<String>,

    /// Ceremonial context note
    pub ceremonial_context: Option<String>,

    /// Sharing permission level
    pub sharing: SharingPermission,

    /// Whether a Consultation is still required despite this protocol
    pub consultation_required: bool,

    /// Expiry (Unix seconds); None means indefinite
    pub expires_at: Option<u64>,
}

impl super::Governance {
    /// Create a protocol from an advisor's validation
    ///
    /// Rejected synchronously when the draft is malformed — in
    /// particular an expiry in the past, which would create a protocol
    /// that was never valid.
    pub fn create_protocol(
        &self,
        draft: ProtocolDraft,
        validated_by: AdvisorId,
        now: u64,
    ) -> Result<Protocol, GovernanceError> {
        if draft.story_title.trim().is_empty() {
            return Err(GovernanceError::InvalidProtocol(
                "story title is empty".to_string(),
            ));
        }
        if let Some(expires_at) = draft.expires_at {
            if expires_at <= now {
                return Err(GovernanceError::InvalidProtocol(format!(
                    "expiry {} is not in the future",
                    expires_at
                )));
            }
        }

        let protocol = Protocol {
            id: ProtocolId::new(),
            story_title: draft.story_title,
            story_type: draft.story_type,
            traditional_owners: draft.traditional_owners,
            origin: draft.origin,
            seasonal_restrictions: draft.seasonal_restrictions,
            gender_restriction: draft.gender_restriction,
            age_restriction: draft.age_restriction,
            ceremonial_context: draft.ceremonial_context,
            sharing: draft.sharing,
            consultation_required: draft.consultation_required,
            validated_by,
            validated_at: now,
            expires_at: draft.expires_at,
            supersedes: None,
        };

        info!(
            "Protocol {} validated for story '{}' ({})",
            protocol.id,
            protocol.story_title,
            protocol.sharing.as_str()
        );

        Ok(protocol)
    }

    /// Re-validate an expired or expiring protocol
    ///
    /// Builds a new Protocol row carrying the old one's terms with a
    /// fresh validation window; the old row is left untouched so the
    /// history of what was permitted when is preserved.
    pub fn revalidate_protocol(
        &self,
        previous: &Protocol,
        validated_by: AdvisorId,
        expires_at: Option<u64>,
        now: u64,
    ) -> Result<Protocol, GovernanceError> {
        if let Some(expiry) = expires_at {
            if expiry <= now {
                return Err(GovernanceError::InvalidProtocol(format!(
                    "expiry {} is not in the future",
                    expiry
                )));
            }
        }

        let mut renewed = previous.clone();
        renewed.id = ProtocolId::new();
        renewed.validated_by = validated_by;
        renewed.validated_at = now;
        renewed.expires_at = expires_at;
        renewed.supersedes = Some(previous.id);

        info!(
            "Protocol {} re-validated as {} for story '{}'",
            previous.id, renewed.id, renewed.story_title
        );

        Ok(renewed)
    }
}
