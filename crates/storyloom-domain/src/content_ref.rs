//! Polymorphic content references
//!
//! Consultations and Protocols point at "any reviewable entity". The
//! reference is a tagged union of a content type and an opaque id;
//! resolution to the concrete entity happens in the persistence adapter,
//! not in governance logic.

use std::fmt;

/// The kind of entity a content reference points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    /// An extracted Story item
    Story,

    /// An extracted Outcome item
    Outcome,

    /// A source document
    Document,
}

impl ContentType {
    /// Get the content type name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Story => "story",
            ContentType::Outcome => "outcome",
            ContentType::Document => "document",
        }
    }

    /// Parse a content type from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "story" => Some(ContentType::Story),
            "outcome" => Some(ContentType::Outcome),
            "document" => Some(ContentType::Document),
            _ => None,
        }
    }
}

/// A typed pointer to a reviewable entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentRef {
    /// What kind of entity is referenced
    pub content_type: ContentType,

    /// The referenced entity's id (raw u128 of its UUIDv7)
    pub content_id: u128,
}

impl ContentRef {
    /// Reference an extracted item by kind and id
    pub fn item(kind: crate::item::ItemKind, id: crate::item::ItemId) -> Self {
        let content_type = match kind {
            crate::item::ItemKind::Story => ContentType::Story,
            crate::item::ItemKind::Outcome => ContentType::Outcome,
        };
        Self {
            content_type,
            content_id: id.value(),
        }
    }

    /// Reference a source document
    pub fn document(id: crate::document::DocumentId) -> Self {
        Self {
            content_type: ContentType::Document,
            content_id: id.value(),
        }
    }
}

impl fmt::Display for ContentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}",
            self.content_type.as_str(),
            uuid::Uuid::from_u128(self.content_id)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{ItemId, ItemKind};

    #[test]
    fn test_item_ref_kinds() {
        let id = ItemId::new();
        let story = ContentRef::item(ItemKind::Story, id);
        let outcome = ContentRef::item(ItemKind::Outcome, id);

        assert_eq!(story.content_type, ContentType::Story);
        assert_eq!(outcome.content_type, ContentType::Outcome);
        assert_eq!(story.content_id, outcome.content_id);
        assert_ne!(story, outcome);
    }

    #[test]
    fn test_display_includes_type_tag() {
        let id = ItemId::new();
        let r = ContentRef::item(ItemKind::Story, id);
        assert!(r.to_string().starts_with("story:"));
    }
}
