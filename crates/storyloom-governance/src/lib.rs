//! Storyloom Governance Workflow
//!
//! The state machine for Consultations (ad hoc human review requests)
//! and Protocols (standing, time-boxed sharing permissions).
//!
//! # Consultation lifecycle
//!
//! ```text
//! REQUESTED -> SCHEDULED -> IN_PROGRESS -> COMPLETED
//!     |            |             |
//!     |            +-------------+--> (direct start allowed)
//!     +--------------------------+--> CANCELLED (any non-terminal)
//! ```
//!
//! Completing a consultation requires an explicit APPROVED/REJECTED
//! verdict in the same transition; a consultation can never be COMPLETED
//! with a PENDING verdict. Transitions are pure: `apply` returns the
//! updated copy and the caller persists it under an optimistic version
//! check, which is what stops two concurrent reviewer actions from
//! racing a consultation past a terminal state.
//!
//! # Protocols
//!
//! Protocols have no intermediate states; each is valid until its expiry
//! or indefinitely. Re-validation creates a new Protocol that supersedes
//! the old one, preserving the history of what was permitted when.

#![warn(missing_docs)]

mod protocol;
mod workflow;

pub use protocol::ProtocolDraft;
pub use workflow::{ApplyOutcome, ConsultationAction, Governance};

use thiserror::Error;

/// Errors produced by governance operations
#[derive(Error, Debug)]
pub enum GovernanceError {
    /// A consultation transition that the state machine forbids
    #[error("Invalid transition from '{from}' via '{action}': {reason}")]
    InvalidTransition {
        /// Status the consultation was in
        from: String,
        /// Action that was attempted
        action: String,
        /// Why the transition was rejected
        reason: String,
    },

    /// A protocol that fails validation at creation time
    #[error("Invalid protocol: {0}")]
    InvalidProtocol(String),
}
