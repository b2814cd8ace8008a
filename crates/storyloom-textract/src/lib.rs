//! Storyloom Text Extraction Layer
//!
//! Converts uploaded source documents into normalized plain text for the
//! extraction pipeline. Dispatch is by declared format, never by content
//! sniffing.
//!
//! # Supported formats
//!
//! - Plain UTF-8 text
//! - PDF (via `pdf-extract`)
//! - Word-processor DOCX (ZIP container + WordprocessingML)
//!
//! Image, audio, and video formats are rejected here; image documents
//! take the vision-provider path in the orchestrator instead.
//!
//! # Examples
//!
//! ```
//! use storyloom_textract::TextExtractor;
//! use storyloom_domain::DocumentFormat;
//!
//! let extractor = TextExtractor::default();
//! let out = extractor
//!     .extract(DocumentFormat::PlainText, b"An interview transcript.")
//!     .unwrap();
//! assert_eq!(out.text, "An interview transcript.");
//! assert!(!out.truncated);
//! ```

#![warn(missing_docs)]

mod extractor;

pub use extractor::{ExtractedText, TextExtractor, DEFAULT_MAX_TEXT_CHARS};

use thiserror::Error;

/// Errors that can occur during text extraction
#[derive(Error, Debug)]
pub enum TextractError {
    /// The declared format is not in the supported set (fatal, no retry)
    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    /// The parser could not decode the input (fatal)
    #[error("Corrupt input: {0}")]
    CorruptInput(String),
}
