//! Storyloom Domain Layer
//!
//! This crate contains the core business logic and domain model for Storyloom.
//! It defines the fundamental entities, value objects, and trait interfaces
//! that all other layers depend upon.
//!
//! ## Key Concepts
//!
//! - **SourceDocument**: An uploaded file moving through the extraction pipeline
//! - **ExtractedItem**: A candidate Story or Outcome with confidence, pending approval
//! - **Sensitivity tier**: LOW/MEDIUM/HIGH/SACRED classification under cultural protocol
//! - **Consultation**: An ad hoc human review request with a fixed status lifecycle
//! - **Protocol**: A standing, time-boxed sharing permission for a named story
//!
//! ## Architecture
//!
//! This crate follows Clean Architecture:
//! - Only one external crate dependency (uuid, for identifiers)
//! - Pure business logic only
//! - Infrastructure implementations live in other crates
//! - Trait definitions for all external interactions

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod advisor;
pub mod confidence;
pub mod consultation;
pub mod content_ref;
pub mod document;
pub mod item;
pub mod protocol;
pub mod sensitivity;
pub mod traits;

// Re-exports for convenience
pub use advisor::{AdvisorId, CulturalAdvisor};
pub use confidence::Confidence;
pub use consultation::{
    ApprovalStatus, Consultation, ConsultationId, ConsultationPriority, ConsultationStatus,
};
pub use content_ref::{ContentRef, ContentType};
pub use document::{DocumentFormat, DocumentId, ExtractionStatus, SourceDocument};
pub use item::{normalize_title, ExtractedItem, ItemId, ItemKind, ItemStatus, Metric, ProviderScore};
pub use protocol::{Audience, Protocol, ProtocolId, SharingPermission};
pub use sensitivity::{SensitivityAssessment, SensitivitySignal, SensitivityTier};
