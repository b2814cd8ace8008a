//! Error types for the pipeline

use thiserror::Error;

/// Errors that can occur during document processing and service calls
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The requested document does not exist
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    /// The requested item does not exist
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    /// The requested consultation does not exist
    #[error("Consultation not found: {0}")]
    ConsultationNotFound(String),

    /// Text extraction failed (fatal for the document, no retry)
    #[error("Extraction failed: {0}")]
    Extraction(#[from] storyloom_textract::TextractError),

    /// No analysis providers are configured
    #[error("No analysis providers available")]
    NoProvidersAvailable,

    /// Every registered provider failed or timed out
    ///
    /// Distinct from an empty result: the document could not be looked
    /// at, and is retry-eligible by re-invoking processing.
    #[error("All providers failed: {0}")]
    AllProvidersFailed(String),

    /// Processing was cancelled; nothing was persisted
    #[error("Processing cancelled")]
    Cancelled,

    /// Persistence error
    #[error("Store error: {0}")]
    Store(String),

    /// Governance workflow rejected a transition
    #[error(transparent)]
    Governance(#[from] storyloom_governance::GovernanceError),

    /// The work queue is no longer accepting jobs
    #[error("Worker pool is shut down")]
    QueueClosed,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
