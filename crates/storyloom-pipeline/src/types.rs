//! Result types for document processing

use storyloom_domain::{DocumentId, ExtractedItem, ExtractionStatus};
use storyloom_providers::{MediaDescription, NarrativeAnalysis};

/// Result of processing one document
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    /// Extracted Story items, as persisted
    pub stories: Vec<ExtractedItem>,

    /// Extracted Outcome items, as persisted
    pub outcomes: Vec<ExtractedItem>,

    /// Narrative analyses contributed by providers (not persisted)
    pub narratives: Vec<NarrativeAnalysis>,

    /// Media descriptions contributed by providers (not persisted)
    pub media: Vec<MediaDescription>,

    /// Final document status
    pub status: ExtractionStatus,

    /// Metadata about the processing run
    pub metadata: ProcessingMetadata,
}

/// Metadata about one processing run
#[derive(Debug, Clone)]
pub struct ProcessingMetadata {
    /// The processed document
    pub document_id: DocumentId,

    /// Number of registered providers consulted
    pub providers_consulted: usize,

    /// Providers that failed or timed out (their contribution dropped)
    pub providers_failed: usize,

    /// Candidates discarded for falling below the confidence floor
    pub candidates_discarded: usize,

    /// Whether the extracted text was truncated at the length cap
    pub truncated: bool,

    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}
