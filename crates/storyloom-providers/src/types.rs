//! Finding types shared by all provider adapters

use storyloom_domain::{
    Confidence, DocumentFormat, DocumentId, ItemKind, Metric, SensitivitySignal,
};

/// Context handed to every adapter alongside the document text
#[derive(Debug, Clone)]
pub struct AnalysisHints {
    /// The document under analysis
    pub document_id: DocumentId,

    /// Original filename
    pub filename: String,

    /// Declared format
    pub format: DocumentFormat,

    /// Whether the extracted text was truncated at the length cap
    pub truncated: bool,
}

/// One finding returned by one provider
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderFinding {
    /// Identifier of the provider that produced this finding
    pub provider: String,

    /// The typed payload
    pub payload: FindingPayload,

    /// Provider confidence for this finding
    pub confidence: Confidence,
}

/// The exhaustive set of payload kinds a provider can return
///
/// Modeled as a sum type rather than an untyped map so the merge step
/// can pattern-match exhaustively.
#[derive(Debug, Clone, PartialEq)]
pub enum FindingPayload {
    /// A candidate Story or Outcome
    ItemCandidate(ItemCandidate),

    /// A sensitivity signal about the analyzed text
    Sensitivity(SensitivitySignal),

    /// Free-form narrative analysis (themes, corroboration)
    Narrative(NarrativeAnalysis),

    /// A description of visual media
    MediaDescription(MediaDescription),
}

/// A candidate item proposed by a provider
#[derive(Debug, Clone, PartialEq)]
pub struct ItemCandidate {
    /// Story or Outcome
    pub kind: ItemKind,

    /// Proposed title
    pub title: String,

    /// Body text or outcome description
    pub body: String,

    /// Optional category label
    pub category: Option<String>,

    /// Free-form tags
    pub tags: Vec<String>,

    /// Metrics (outcomes)
    pub metrics: Vec<Metric>,

    /// Cultural-significance note (stories)
    pub cultural_note: Option<String>,
}

/// Narrative-level analysis of the document
#[derive(Debug, Clone, PartialEq)]
pub struct NarrativeAnalysis {
    /// Short summary of the document
    pub summary: String,

    /// Recurring themes
    pub themes: Vec<String>,

    /// Whether the factual content could be corroborated
    pub corroborated: bool,
}

/// Description of visual media
#[derive(Debug, Clone, PartialEq)]
pub struct MediaDescription {
    /// Full description of the media content
    pub description: String,

    /// Subjects recognized in the media
    pub subjects: Vec<String>,
}
