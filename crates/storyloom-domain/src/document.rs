//! Source document module - uploaded files entering the pipeline

use std::fmt;

/// Unique identifier for a source document, based on UUIDv7
///
/// UUIDv7 provides:
/// - Chronological sortability for temporal queries
/// - 128-bit uniqueness
/// - No coordination required for distributed generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocumentId(u128);

impl DocumentId {
    /// Generate a new UUIDv7-based DocumentId
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Create a DocumentId from a raw u128 value
    ///
    /// This is primarily for storage layer deserialization.
    pub fn from_value(value: u128) -> Self {
        Self(value)
    }

    /// Parse a DocumentId from a UUIDv7 string
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

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

/// Declared format of an uploaded document
///
/// Dispatch in the text extractor is by declared format, never by content
/// sniffing. Image documents are handled by the vision provider path;
/// audio and video are recognized but not yet processable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    /// Plain UTF-8 text
    PlainText,

    /// PDF document
    Pdf,

    /// Word-processor document (DOCX)
    WordProcessor,

    /// Still image (JPEG, PNG, ...)
    Image,

    /// Audio recording
    Audio,

    /// Video recording
    Video,
}

impl DocumentFormat {
    /// Get the format name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentFormat::PlainText => "plain_text",
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::WordProcessor => "word_processor",
            DocumentFormat::Image => "image",
            DocumentFormat::Audio => "audio",
            DocumentFormat::Video => "video",
        }
    }

    /// Parse a format from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "plain_text" => Some(DocumentFormat::PlainText),
            "pdf" => Some(DocumentFormat::Pdf),
            "word_processor" => Some(DocumentFormat::WordProcessor),
            "image" => Some(DocumentFormat::Image),
            "audio" => Some(DocumentFormat::Audio),
            "video" => Some(DocumentFormat::Video),
            _ => None,
        }
    }

    /// Guess a format from a filename extension
    ///
    /// A convenience for the upload layer; the pipeline itself always
    /// trusts the declared format.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let ext = filename.rsplit('.').next()?.to_lowercase();
        match ext.as_str() {
            "txt" | "md" | "text" => Some(DocumentFormat::PlainText),
            "pdf" => Some(DocumentFormat::Pdf),
            "docx" | "doc" | "odt" => Some(DocumentFormat::WordProcessor),
            "jpg" | "jpeg" | "png" | "gif" | "webp" => Some(DocumentFormat::Image),
            "mp3" | "wav" | "m4a" | "ogg" => Some(DocumentFormat::Audio),
            "mp4" | "mov" | "avi" | "webm" => Some(DocumentFormat::Video),
            _ => None,
        }
    }
}

impl std::str::FromStr for DocumentFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid document format: {}", s))
    }
}

/// Extraction lifecycle status of a source document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtractionStatus {
    /// Uploaded, not yet picked up
    Pending,

    /// A worker is currently processing the document
    Processing,

    /// Extraction finished and items were persisted
    Completed,

    /// Extraction failed; re-invoking processing is allowed
    Failed,
}

impl ExtractionStatus {
    /// Get the status name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionStatus::Pending => "pending",
            ExtractionStatus::Processing => "processing",
            ExtractionStatus::Completed => "completed",
            ExtractionStatus::Failed => "failed",
        }
    }

    /// Parse a status from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(ExtractionStatus::Pending),
            "processing" => Some(ExtractionStatus::Processing),
            "completed" => Some(ExtractionStatus::Completed),
            "failed" => Some(ExtractionStatus::Failed),
            _ => None,
        }
    }
}

/// An uploaded source document
///
/// Content is immutable once uploaded; only the pipeline mutates the
/// extraction status as the document moves through processing.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDocument {
    /// Unique identifier
    pub id: DocumentId,

    /// Original filename as uploaded
    pub filename: String,

    /// Declared format
    pub format: DocumentFormat,

    /// Size in bytes
    pub byte_size: u64,

    /// Owning actor (staff member or uploader) reference
    pub uploaded_by: String,

    /// Upload timestamp (Unix seconds)
    pub uploaded_at: u64,

    /// Current extraction status
    pub status: ExtractionStatus,

    /// Human-readable failure reason, set when status is Failed
    pub failure_reason: Option<String>,
}

impl SourceDocument {
    /// Create a new document in the Pending state
    pub fn new(
        filename: String,
        format: DocumentFormat,
        byte_size: u64,
        uploaded_by: String,
        uploaded_at: u64,
    ) -> Self {
        Self {
            id: DocumentId::new(),
            filename,
            format,
            byte_size,
            uploaded_by,
            uploaded_at,
            status: ExtractionStatus::Pending,
            failure_reason: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_id_chronological() {
        let id1 = DocumentId::new();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let id2 = DocumentId::new();

        assert!(id1 < id2, "Earlier UUIDv7 should be less than later UUIDv7");
    }

    #[test]
    fn test_document_id_display_and_parse() {
        let id = DocumentId::new();
        let parsed = DocumentId::from_string(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_format_from_filename() {
        assert_eq!(
            DocumentFormat::from_filename("interview_03.docx"),
            Some(DocumentFormat::WordProcessor)
        );
        assert_eq!(
            DocumentFormat::from_filename("report.pdf"),
            Some(DocumentFormat::Pdf)
        );
        assert_eq!(
            DocumentFormat::from_filename("notes.txt"),
            Some(DocumentFormat::PlainText)
        );
        assert_eq!(DocumentFormat::from_filename("archive.tar.gz"), None);
    }

    #[test]
    fn test_format_round_trip() {
        for format in [
            DocumentFormat::PlainText,
            DocumentFormat::Pdf,
            DocumentFormat::WordProcessor,
            DocumentFormat::Image,
            DocumentFormat::Audio,
            DocumentFormat::Video,
        ] {
            assert_eq!(DocumentFormat::parse(format.as_str()), Some(format));
        }
    }

    #[test]
    fn test_new_document_is_pending() {
        let doc = SourceDocument::new(
            "story.txt".to_string(),
            DocumentFormat::PlainText,
            1024,
            "staff:marla".to_string(),
            1_700_000_000,
        );
        assert_eq!(doc.status, ExtractionStatus::Pending);
        assert!(doc.failure_reason.is_none());
    }
}
