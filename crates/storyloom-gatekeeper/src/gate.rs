//! Publish-eligibility decision logic

use storyloom_domain::{
    normalize_title, ApprovalStatus, Audience, Consultation, ConsultationId, ConsultationStatus,
    ExtractedItem, ItemKind, Protocol, ProtocolId,
};
use tracing::debug;

/// Outcome of a publish-eligibility check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishDecision {
    /// The item may be published right now
    Publishable,

    /// The item is blocked pending review
    Hold {
        /// What is blocking publication
        reason: HoldReason,
    },

    /// A completed consultation rejected the item
    Rejected {
        /// The rejecting consultation
        consultation: ConsultationId,
    },
}

/// Why a held item is blocked
///
/// Carries the specific blocking entity so staff know what to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldReason {
    /// Review is required but no consultation exists yet
    NoConsultation,

    /// The most recent consultation has not completed
    ConsultationOpen {
        /// The open consultation
        consultation: ConsultationId,
    },

    /// A protocol covering this story exists but has expired
    ProtocolExpired {
        /// The expired protocol
        protocol: ProtocolId,
    },
}

/// The publication gate
///
/// Rule order:
/// 1. Items whose current assessment does not require review are
///    publishable immediately.
/// 2. The most recent non-cancelled Consultation is consulted: a
///    REJECTED verdict blocks outright (an explicit human rejection
///    outranks any standing Protocol), an APPROVED verdict publishes.
/// 3. Otherwise an unexpired Protocol for the identically-titled story
///    whose sharing permission admits the intended audience substitutes
///    for the missing approval.
/// 4. Otherwise the item holds.
#[derive(Debug, Default)]
pub struct PublicationGate;

impl PublicationGate {
    /// Create a new publication gate
    pub fn new() -> Self {
        Self
    }

    /// Decide whether an item may be published right now
    ///
    /// `consultations` are the consultations referencing this item;
    /// `protocols` are candidate standing permissions (filtered here by
    /// title match and validity). Pure: no side effects, no caching.
    pub fn decide(
        &self,
        item: &ExtractedItem,
        consultations: &[Consultation],
        protocols: &[Protocol],
        audience: Audience,
        now: u64,
    ) -> PublishDecision {
        if !item.requires_review() {
            return PublishDecision::Publishable;
        }

        // Cancelled reviews neither approve nor block; ignore them.
        let latest = consultations
            .iter()
            .filter(|c| c.status != ConsultationStatus::Cancelled)
            .max_by_key(|c| c.id);

        if let Some(consultation) = latest {
            if consultation.status == ConsultationStatus::Completed {
                match consultation.approval {
                    ApprovalStatus::Rejected => {
                        return PublishDecision::Rejected {
                            consultation: consultation.id,
                        };
                    }
                    ApprovalStatus::Approved => {
                        return PublishDecision::Publishable;
                    }
                    // A completed consultation with a pending verdict
                    // cannot be created through the workflow; if one
                    // reaches us through the store, hold.
                    ApprovalStatus::Pending => {
                        return PublishDecision::Hold {
                            reason: HoldReason::ConsultationOpen {
                                consultation: consultation.id,
                            },
                        };
                    }
                }
            }
        }

        // No verdict yet; a standing Protocol for the identically-titled
        // story can substitute for the individual consultation.
        if let Some(decision) = self.protocol_decision(item, protocols, audience, now) {
            return decision;
        }

        match latest {
            Some(open) => PublishDecision::Hold {
                reason: HoldReason::ConsultationOpen {
                    consultation: open.id,
                },
            },
            None => PublishDecision::Hold {
                reason: HoldReason::NoConsultation,
            },
        }
    }

    /// Evaluate the protocol substitution path
    ///
    /// Returns Publishable when a valid, matching, sufficiently
    /// permissive protocol exists; a Hold with the expired protocol id
    /// when only expired matches exist; None when protocols say nothing.
    fn protocol_decision(
        &self,
        item: &ExtractedItem,
        protocols: &[Protocol],
        audience: Audience,
        now: u64,
    ) -> Option<PublishDecision> {
        // Protocols cover titled stories; matching is exact on the
        // normalized title, the conservative default.
        if item.kind != ItemKind::Story || item.title.trim().is_empty() {
            return None;
        }

        let title = item.normalized_title();
        let mut expired_match: Option<ProtocolId> = None;

        for protocol in protocols {
            if normalize_title(&protocol.story_title) != title {
                continue;
            }
            if !protocol.is_valid_at(now) {
                expired_match.get_or_insert(protocol.id);
                continue;
            }
            if protocol.consultation_required {
                // The advisor asked for per-instance review anyway
                continue;
            }
            if protocol.sharing.admits(audience) {
                debug!(
                    "Protocol {} substitutes for consultation on item {}",
                    protocol.id, item.id
                );
                return Some(PublishDecision::Publishable);
            }
        }

        expired_match.map(|protocol| PublishDecision::Hold {
            reason: HoldReason::ProtocolExpired { protocol },
        })
    }
}
