//! Trait definitions for external interactions
//!
//! These traits define the boundaries between domain logic and
//! infrastructure. Implementations live in other crates (storyloom-store
//! for persistence; the surrounding upload layer for document bytes).

use crate::consultation::{Consultation, ConsultationId};
use crate::content_ref::ContentRef;
use crate::document::{DocumentId, ExtractionStatus, SourceDocument};
use crate::item::{ExtractedItem, ItemId, ItemStatus};
use crate::protocol::{Protocol, ProtocolId};

/// An entity paired with its optimistic-locking version
///
/// Stores bump the version on every successful update; updates carry the
/// version the caller read, and a mismatch fails without mutating.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    /// The entity
    pub value: T,

    /// Version at read time
    pub version: u64,
}

/// Query criteria for retrieving extracted items
#[derive(Debug, Clone, Default)]
pub struct ItemQuery {
    /// Filter by source document
    pub document: Option<DocumentId>,

    /// Filter by lifecycle status
    pub status: Option<ItemStatus>,

    /// Filter by minimum aggregate confidence
    pub min_confidence: Option<f64>,

    /// Maximum results to return
    pub limit: Option<usize>,
}

/// Trait for persisting pipeline entities
///
/// Implemented by the infrastructure layer (storyloom-store). All
/// mutations of existing entities take an `expected_version`; stores
/// must reject a mismatch without mutating (optimistic locking), which
/// is what keeps two concurrent reviewer actions from racing a
/// Consultation past a terminal state.
pub trait ContentStore {
    /// Error type for store operations
    type Error;

    /// Insert a new source document
    fn insert_document(&mut self, document: SourceDocument) -> Result<DocumentId, Self::Error>;

    /// Get a source document by id
    fn get_document(&self, id: DocumentId) -> Result<Option<SourceDocument>, Self::Error>;

    /// Transition a document's extraction status
    fn set_document_status(
        &mut self,
        id: DocumentId,
        status: ExtractionStatus,
        failure_reason: Option<String>,
    ) -> Result<(), Self::Error>;

    /// Insert an item together with its required consultation, atomically
    ///
    /// When the item's assessment requires review, the caller passes the
    /// auto-created consultation and the store persists both or neither;
    /// an item must never become visible without its consultation.
    fn insert_item_with_consultation(
        &mut self,
        item: ExtractedItem,
        consultation: Option<Consultation>,
    ) -> Result<ItemId, Self::Error>;

    /// Get an item (with its version) by id
    fn get_item(&self, id: ItemId) -> Result<Option<Versioned<ExtractedItem>>, Self::Error>;

    /// Update an item under an optimistic version check
    ///
    /// Returns the new version on success.
    fn update_item(
        &mut self,
        item: ExtractedItem,
        expected_version: u64,
    ) -> Result<u64, Self::Error>;

    /// Query items matching criteria
    fn query_items(&self, query: &ItemQuery) -> Result<Vec<ExtractedItem>, Self::Error>;

    /// Insert a new consultation
    fn insert_consultation(
        &mut self,
        consultation: Consultation,
    ) -> Result<ConsultationId, Self::Error>;

    /// Get a consultation (with its version) by id
    fn get_consultation(
        &self,
        id: ConsultationId,
    ) -> Result<Option<Versioned<Consultation>>, Self::Error>;

    /// Update a consultation under an optimistic version check
    ///
    /// Returns the new version on success.
    fn update_consultation(
        &mut self,
        consultation: Consultation,
        expected_version: u64,
    ) -> Result<u64, Self::Error>;

    /// All consultations referencing a piece of content
    fn consultations_for(&self, content: &ContentRef) -> Result<Vec<Consultation>, Self::Error>;

    /// Insert a new protocol
    ///
    /// Protocols are never updated in place; re-validation inserts a new
    /// row that supersedes the old one.
    fn insert_protocol(&mut self, protocol: Protocol) -> Result<ProtocolId, Self::Error>;

    /// All protocols whose normalized story title equals the given one
    fn protocols_for_title(&self, normalized_title: &str) -> Result<Vec<Protocol>, Self::Error>;
}

/// Trait for reading stored document bytes
///
/// Implemented by the surrounding file-storage layer.
pub trait DocumentSource {
    /// Error type for read operations
    type Error;

    /// Read the raw bytes of a stored document
    fn read(&self, id: DocumentId) -> Result<Vec<u8>, Self::Error>;
}
