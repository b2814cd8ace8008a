//! Format dispatch and per-format decoders

use crate::TextractError;
use regex::Regex;
use std::io::Read;
use storyloom_domain::DocumentFormat;
use tracing::{debug, warn};

/// Default cap on extracted text length (characters)
pub const DEFAULT_MAX_TEXT_CHARS: usize = 50_000;

/// Result of a text extraction
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedText {
    /// Normalized plain text
    pub text: String,

    /// True when the document exceeded the configured maximum length
    /// and the text was cut at the limit
    pub truncated: bool,
}

/// Converts source documents into normalized plain text
///
/// Oversized documents are truncated rather than rejected; partial
/// extraction is still useful. Decode failures and unsupported formats
/// are fatal and surfaced to the caller.
pub struct TextExtractor {
    max_text_chars: usize,
    markup_tag: Regex,
}

impl TextExtractor {
    /// Create an extractor with the given text length cap
    pub fn new(max_text_chars: usize) -> Self {
        Self {
            max_text_chars,
            // WordprocessingML elements; never matches across `>`
            markup_tag: Regex::new(r"<[^>]+>").unwrap(),
        }
    }

    /// Extract plain text from document bytes
    ///
    /// Dispatch is strictly on the declared format.
    pub fn extract(
        &self,
        format: DocumentFormat,
        bytes: &[u8],
    ) -> Result<ExtractedText, TextractError> {
        let text = match format {
            DocumentFormat::PlainText => self.extract_plain(bytes)?,
            DocumentFormat::Pdf => self.extract_pdf(bytes)?,
            DocumentFormat::WordProcessor => self.extract_docx(bytes)?,
            other => {
                return Err(TextractError::UnsupportedFormat(
                    other.as_str().to_string(),
                ))
            }
        };

        Ok(self.finish(text))
    }

    /// Truncate to the configured cap, flagging when anything was cut
    fn finish(&self, text: String) -> ExtractedText {
        match text.char_indices().nth(self.max_text_chars) {
            Some((byte_idx, _)) => {
                warn!(
                    "Extracted text exceeds {} chars, truncating",
                    self.max_text_chars
                );
                ExtractedText {
                    text: text[..byte_idx].to_string(),
                    truncated: true,
                }
            }
            None => ExtractedText {
                text,
                truncated: false,
            },
        }
    }

    fn extract_plain(&self, bytes: &[u8]) -> Result<String, TextractError> {
        std::str::from_utf8(bytes)
            .map(|s| s.to_string())
            .map_err(|e| TextractError::CorruptInput(format!("Invalid UTF-8: {}", e)))
    }

    fn extract_pdf(&self, bytes: &[u8]) -> Result<String, TextractError> {
        let text = pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| TextractError::CorruptInput(format!("PDF decode failed: {}", e)))?;
        debug!("Decoded {} chars from PDF", text.len());
        Ok(text)
    }

    /// DOCX: a ZIP container; the body lives in word/document.xml
    fn extract_docx(&self, bytes: &[u8]) -> Result<String, TextractError> {
        let cursor = std::io::Cursor::new(bytes);
        let mut archive = zip::ZipArchive::new(cursor)
            .map_err(|e| TextractError::CorruptInput(format!("Not a ZIP container: {}", e)))?;

        let mut document_xml = String::new();
        archive
            .by_name("word/document.xml")
            .map_err(|e| TextractError::CorruptInput(format!("Missing document body: {}", e)))?
            .read_to_string(&mut document_xml)
            .map_err(|e| TextractError::CorruptInput(format!("Unreadable document body: {}", e)))?;

        // Paragraph and line-break boundaries become newlines before the
        // markup is stripped, so paragraphs don't run together.
        let with_breaks = document_xml
            .replace("</w:p>", "\n")
            .replace("<w:br/>", "\n")
            .replace("<w:tab/>", "\t");

        let stripped = self.markup_tag.replace_all(&with_breaks, "");
        Ok(unescape_xml(stripped.trim()))
    }
}

impl Default for TextExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TEXT_CHARS)
    }
}

/// Decode the five predefined XML entities
fn unescape_xml(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
