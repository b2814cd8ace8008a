//! Consultation state machine

use crate::GovernanceError;
use storyloom_domain::{
    AdvisorId, ApprovalStatus, Consultation, ConsultationPriority, ConsultationStatus, ContentRef,
    SensitivityAssessment, SensitivityTier,
};
use tracing::info;

/// An action a staff member or advisor takes on a consultation
#[derive(Debug, Clone)]
pub enum ConsultationAction {
    /// Plan an advisor session
    Schedule {
        /// When the session will happen (Unix seconds)
        scheduled_at: u64,
        /// Advisor to assign, if known
        advisor: Option<AdvisorId>,
    },

    /// Begin the review
    Start,

    /// Finish the review with a verdict
    Complete {
        /// The verdict; must be Approved or Rejected
        approval: ApprovalStatus,
        /// Cultural-sensitivity rating, 1-5
        sensitivity_rating: u8,
        /// Reviewer notes
        notes: Option<String>,
        /// Recommendations recorded during review
        recommendations: Vec<String>,
        /// Whether a follow-up consultation should be opened
        follow_up_required: bool,
        /// Priority for the follow-up; inherits the parent's when None
        follow_up_priority: Option<ConsultationPriority>,
    },

    /// Abandon the review
    Cancel,
}

impl ConsultationAction {
    fn name(&self) -> &'static str {
        match self {
            ConsultationAction::Schedule { .. } => "schedule",
            ConsultationAction::Start => "start",
            ConsultationAction::Complete { .. } => "complete",
            ConsultationAction::Cancel => "cancel",
        }
    }
}

/// Result of applying an action
#[derive(Debug, Clone)]
pub struct ApplyOutcome {
    /// The consultation after the transition
    pub consultation: Consultation,

    /// A follow-up consultation spawned by completion, if requested
    pub follow_up: Option<Consultation>,
}

/// The governance workflow
///
/// Holds no mutable state; every operation is a pure function from the
/// current entity to its successor, so callers can persist the result
/// under whatever locking discipline the store provides.
#[derive(Debug, Default)]
pub struct Governance;

impl Governance {
    /// Create a new governance workflow
    pub fn new() -> Self {
        Self
    }

    /// Map a sensitivity tier to an auto-created consultation priority
    pub fn priority_for_tier(tier: SensitivityTier) -> ConsultationPriority {
        match tier {
            SensitivityTier::Sacred => ConsultationPriority::Urgent,
            SensitivityTier::High => ConsultationPriority::High,
            _ => ConsultationPriority::Medium,
        }
    }

    /// Build the consultation an assessment demands, if any
    ///
    /// Returns a `Requested` consultation whenever the assessment has
    /// `requires_review = true`; the caller persists it atomically with
    /// the item so a flagged item never exists without its consultation.
    pub fn consultation_for_assessment(
        &self,
        content: ContentRef,
        assessment: &SensitivityAssessment,
        now: u64,
    ) -> Option<Consultation> {
        if !assessment.requires_review {
            return None;
        }

        let priority = Self::priority_for_tier(assessment.tier);
        info!(
            "Auto-creating {} consultation for {} ({} tier)",
            priority.as_str(),
            content,
            assessment.tier.as_str()
        );

        Some(Consultation::new(
            content,
            format!(
                "Automatic review: content assessed at {} sensitivity",
                assessment.tier.as_str()
            ),
            priority,
            None,
            now,
        ))
    }

    /// Apply an action to a consultation
    ///
    /// Returns the updated consultation (and a follow-up, when completion
    /// requests one) or an `InvalidTransition` error. The input is not
    /// mutated.
    pub fn apply(
        &self,
        consultation: &Consultation,
        action: ConsultationAction,
        now: u64,
    ) -> Result<ApplyOutcome, GovernanceError> {
        let from = consultation.status;

        if from.is_terminal() {
            return Err(self.invalid(from, &action, "consultation is terminal"));
        }

        let mut updated = consultation.clone();

        match &action {
            ConsultationAction::Schedule {
                scheduled_at,
                advisor,
            } => {
                // Rescheduling an already-scheduled session is allowed
                if !matches!(
                    from,
                    ConsultationStatus::Requested | ConsultationStatus::Scheduled
                ) {
                    return Err(self.invalid(from, &action, "can only schedule before review starts"));
                }
                updated.status = ConsultationStatus::Scheduled;
                updated.scheduled_at = Some(*scheduled_at);
                if advisor.is_some() {
                    updated.advisor = *advisor;
                }
            }

            ConsultationAction::Start => {
                // Requested and Scheduled may both move straight to review
                if !matches!(
                    from,
                    ConsultationStatus::Requested | ConsultationStatus::Scheduled
                ) {
                    return Err(self.invalid(from, &action, "review already started"));
                }
                updated.status = ConsultationStatus::InProgress;
            }

            ConsultationAction::Complete {
                approval,
                sensitivity_rating,
                notes,
                recommendations,
                follow_up_required,
                follow_up_priority,
            } => {
                if from != ConsultationStatus::InProgress {
                    return Err(self.invalid(from, &action, "review has not started"));
                }
                if *approval == ApprovalStatus::Pending {
                    return Err(self.invalid(
                        from,
                        &action,
                        "completion requires an approved or rejected verdict",
                    ));
                }
                if !(1..=5).contains(sensitivity_rating) {
                    return Err(self.invalid(
                        from,
                        &action,
                        "sensitivity rating must be between 1 and 5",
                    ));
                }

                updated.status = ConsultationStatus::Completed;
                updated.approval = *approval;
                updated.sensitivity_rating = Some(*sensitivity_rating);
                updated.completed_at = Some(now);
                updated.follow_up_required = *follow_up_required;
                if notes.is_some() {
                    updated.notes = notes.clone();
                }
                updated.recommendations.extend(recommendations.iter().cloned());

                let follow_up = if *follow_up_required {
                    let mut next = Consultation::new(
                        consultation.content,
                        format!("Follow-up on consultation {}", consultation.id),
                        follow_up_priority.unwrap_or(consultation.priority),
                        consultation.advisor,
                        now,
                    );
                    next.parent = Some(consultation.id);
                    info!(
                        "Completion of {} spawned follow-up {}",
                        consultation.id, next.id
                    );
                    Some(next)
                } else {
                    None
                };

                return Ok(ApplyOutcome {
                    consultation: updated,
                    follow_up,
                });
            }

            ConsultationAction::Cancel => {
                updated.status = ConsultationStatus::Cancelled;
            }
        }

        Ok(ApplyOutcome {
            consultation: updated,
            follow_up: None,
        })
    }

    fn invalid(
        &self,
        from: ConsultationStatus,
        action: &ConsultationAction,
        reason: &str,
    ) -> GovernanceError {
        GovernanceError::InvalidTransition {
            from: from.as_str().to_string(),
            action: action.name().to_string(),
            reason: reason.to_string(),
        }
    }
}
