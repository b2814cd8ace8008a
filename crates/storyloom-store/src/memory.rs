//! In-memory reference store

use crate::StoreError;
use std::collections::HashMap;
use storyloom_domain::traits::{ContentStore, ItemQuery, Versioned};
use storyloom_domain::{
    normalize_title, Consultation, ConsultationId, ContentRef, DocumentId, ExtractedItem,
    ExtractionStatus, ItemId, Protocol, ProtocolId, SourceDocument,
};

/// In-memory implementation of ContentStore
///
/// The reference implementation of store semantics: the SQLite adapter
/// must agree with it on versioning and atomicity, and the shared
/// integration tests hold both to that.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: HashMap<u128, SourceDocument>,
    items: HashMap<u128, (ExtractedItem, u64)>,
    consultations: HashMap<u128, (Consultation, u64)>,
    protocols: Vec<Protocol>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored items (test helper)
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Number of stored consultations (test helper)
    pub fn consultation_count(&self) -> usize {
        self.consultations.len()
    }
}

impl ContentStore for MemoryStore {
    type Error = StoreError;

    fn insert_document(&mut self, document: SourceDocument) -> Result<DocumentId, Self::Error> {
        let id = document.id;
        self.documents.insert(id.value(), document);
        Ok(id)
    }

    fn get_document(&self, id: DocumentId) -> Result<Option<SourceDocument>, Self::Error> {
        Ok(self.documents.get(&id.value()).cloned())
    }

    fn set_document_status(
        &mut self,
        id: DocumentId,
        status: ExtractionStatus,
        failure_reason: Option<String>,
    ) -> Result<(), Self::Error> {
        let document = self
            .documents
            .get_mut(&id.value())
            .ok_or_else(|| StoreError::NotFound(format!("document {}", id)))?;
        document.status = status;
        document.failure_reason = failure_reason;
        Ok(())
    }

    fn insert_item_with_consultation(
        &mut self,
        item: ExtractedItem,
        consultation: Option<Consultation>,
    ) -> Result<ItemId, Self::Error> {
        let id = item.id;
        self.items.insert(id.value(), (item, 1));
        if let Some(consultation) = consultation {
            self.consultations
                .insert(consultation.id.value(), (consultation, 1));
        }
        Ok(id)
    }

    fn get_item(&self, id: ItemId) -> Result<Option<Versioned<ExtractedItem>>, Self::Error> {
        Ok(self.items.get(&id.value()).map(|(item, version)| Versioned {
            value: item.clone(),
            version: *version,
        }))
    }

    fn update_item(
        &mut self,
        item: ExtractedItem,
        expected_version: u64,
    ) -> Result<u64, Self::Error> {
        let entry = self
            .items
            .get_mut(&item.id.value())
            .ok_or_else(|| StoreError::NotFound(format!("item {}", item.id)))?;

        if entry.1 != expected_version {
            return Err(StoreError::VersionConflict {
                entity: format!("item {}", item.id),
                expected: expected_version,
                actual: entry.1,
            });
        }

        *entry = (item, expected_version + 1);
        Ok(expected_version + 1)
    }

    fn query_items(&self, query: &ItemQuery) -> Result<Vec<ExtractedItem>, Self::Error> {
        let mut results: Vec<ExtractedItem> = self
            .items
            .values()
            .map(|(item, _)| item.clone())
            .collect();

        if let Some(document) = query.document {
            results.retain(|i| i.document == document);
        }
        if let Some(status) = query.status {
            results.retain(|i| i.status == status);
        }
        if let Some(min_confidence) = query.min_confidence {
            results.retain(|i| i.confidence.value() >= min_confidence);
        }

        // Stable ordering for callers that page through results
        results.sort_by_key(|i| i.id);

        if let Some(limit) = query.limit {
            results.truncate(limit);
        }

        Ok(results)
    }

    fn insert_consultation(
        &mut self,
        consultation: Consultation,
    ) -> Result<ConsultationId, Self::Error> {
        let id = consultation.id;
        self.consultations.insert(id.value(), (consultation, 1));
        Ok(id)
    }

    fn get_consultation(
        &self,
        id: ConsultationId,
    ) -> Result<Option<Versioned<Consultation>>, Self::Error> {
        Ok(self
            .consultations
            .get(&id.value())
            .map(|(consultation, version)| Versioned {
                value: consultation.clone(),
                version: *version,
            }))
    }

    fn update_consultation(
        &mut self,
        consultation: Consultation,
        expected_version: u64,
    ) -> Result<u64, Self::Error> {
        let entry = self
            .consultations
            .get_mut(&consultation.id.value())
            .ok_or_else(|| StoreError::NotFound(format!("consultation {}", consultation.id)))?;

        if entry.1 != expected_version {
            return Err(StoreError::VersionConflict {
                entity: format!("consultation {}", consultation.id),
                expected: expected_version,
                actual: entry.1,
            });
        }

        *entry = (consultation, expected_version + 1);
        Ok(expected_version + 1)
    }

    fn consultations_for(&self, content: &ContentRef) -> Result<Vec<Consultation>, Self::Error> {
        let mut results: Vec<Consultation> = self
            .consultations
            .values()
            .filter(|(c, _)| c.content == *content)
            .map(|(c, _)| c.clone())
            .collect();
        results.sort_by_key(|c| c.id);
        Ok(results)
    }

    fn insert_protocol(&mut self, protocol: Protocol) -> Result<ProtocolId, Self::Error> {
        let id = protocol.id;
        self.protocols.push(protocol);
        Ok(id)
    }

    fn protocols_for_title(&self, normalized: &str) -> Result<Vec<Protocol>, Self::Error> {
        Ok(self
            .protocols
            .iter()
            .filter(|p| normalize_title(&p.story_title) == normalized)
            .cloned()
            .collect())
    }
}
