//! The service facade exposed to the surrounding layers
//!
//! Realizes the inbound boundary contracts: document processing for the
//! upload layer, consultation management for the review UI, and publish
//! eligibility for the content-management layer.

use crate::error::PipelineError;
use crate::orchestrator::{current_timestamp, Orchestrator};
use crate::types::ProcessingResult;
use std::sync::{Arc, Mutex};
use storyloom_domain::traits::{ContentStore, DocumentSource};
use storyloom_domain::{
    AdvisorId, Audience, Consultation, ConsultationId, ConsultationPriority, ContentRef,
    ContentType, DocumentId, ItemId, ItemKind, ItemStatus, Protocol,
};
use storyloom_gatekeeper::{PublicationGate, PublishDecision};
use storyloom_governance::{ConsultationAction, Governance, ProtocolDraft};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// The pipeline's service facade
///
/// Constructed once at process start with an orchestrator and handed by
/// reference to whatever invokes it.
pub struct ContentService<S, D> {
    orchestrator: Orchestrator<S, D>,
    governance: Governance,
    gate: PublicationGate,
    store: Arc<Mutex<S>>,
}

impl<S, D> ContentService<S, D>
where
    S: ContentStore + Send,
    S::Error: std::fmt::Display,
    D: DocumentSource,
    D::Error: std::fmt::Display,
{
    /// Create a service around an orchestrator
    pub fn new(orchestrator: Orchestrator<S, D>) -> Self {
        let store = Arc::clone(orchestrator.store());
        Self {
            orchestrator,
            governance: Governance::new(),
            gate: PublicationGate::new(),
            store,
        }
    }

    /// The underlying orchestrator (for worker pools)
    pub fn orchestrator(&self) -> &Orchestrator<S, D> {
        &self.orchestrator
    }

    /// Process a stored document through the extraction pipeline
    ///
    /// Invoked by the upload layer after a file is stored. Re-invoking
    /// on a `Failed` document retries it.
    pub async fn process_document(
        &self,
        document_id: DocumentId,
    ) -> Result<ProcessingResult, PipelineError> {
        let cancel = CancellationToken::new();
        self.orchestrator.process_document(document_id, &cancel).await
    }

    /// Open a consultation manually (staff review UI)
    pub fn request_consultation(
        &self,
        content_type: ContentType,
        content_id: u128,
        purpose: String,
        advisor: Option<AdvisorId>,
        priority: ConsultationPriority,
    ) -> Result<Consultation, PipelineError> {
        let consultation = Consultation::new(
            ContentRef {
                content_type,
                content_id,
            },
            purpose,
            priority,
            advisor,
            current_timestamp(),
        );

        self.with_store(|store| store.insert_consultation(consultation.clone()))?;
        info!("Consultation {} requested", consultation.id);
        Ok(consultation)
    }

    /// Apply a reviewer action to a consultation
    ///
    /// The transition is validated by the governance state machine and
    /// persisted under an optimistic version check; a concurrent update
    /// surfaces as a store error rather than silently racing. Completion
    /// with follow-up also persists the spawned consultation.
    pub fn update_consultation(
        &self,
        id: ConsultationId,
        action: ConsultationAction,
    ) -> Result<Consultation, PipelineError> {
        let versioned = self
            .with_store(|store| store.get_consultation(id))?
            .ok_or_else(|| PipelineError::ConsultationNotFound(id.to_string()))?;

        let outcome = self
            .governance
            .apply(&versioned.value, action, current_timestamp())?;

        self.with_store(|store| {
            store.update_consultation(outcome.consultation.clone(), versioned.version)
        })?;

        if let Some(follow_up) = &outcome.follow_up {
            self.with_store(|store| store.insert_consultation(follow_up.clone()))?;
        }

        Ok(outcome.consultation)
    }

    /// Check whether an item may be published right now
    ///
    /// Re-evaluated on every call; nothing is cached. Invoked by the
    /// content-management layer before flipping an item to published.
    pub fn check_publish_eligibility(
        &self,
        item_id: ItemId,
        audience: Audience,
    ) -> Result<PublishDecision, PipelineError> {
        let item = self
            .with_store(|store| store.get_item(item_id))?
            .ok_or_else(|| PipelineError::ItemNotFound(item_id.to_string()))?
            .value;

        let consultations =
            self.with_store(|store| store.consultations_for(&ContentRef::item(item.kind, item.id)))?;

        let protocols = if item.kind == ItemKind::Story {
            self.with_store(|store| store.protocols_for_title(&item.normalized_title()))?
        } else {
            Vec::new()
        };

        Ok(self.gate.decide(
            &item,
            &consultations,
            &protocols,
            audience,
            current_timestamp(),
        ))
    }

    /// Publish an item if the gate allows it right now
    ///
    /// The eligibility decision is re-checked at the moment of the
    /// attempt; when it is `Publishable` the item's status moves to
    /// `Published` under an optimistic version check. The decision is
    /// returned either way so callers can surface the blocking entity.
    pub fn publish_item(
        &self,
        item_id: ItemId,
        audience: Audience,
    ) -> Result<PublishDecision, PipelineError> {
        let decision = self.check_publish_eligibility(item_id, audience)?;
        if decision != PublishDecision::Publishable {
            return Ok(decision);
        }

        let versioned = self
            .with_store(|store| store.get_item(item_id))?
            .ok_or_else(|| PipelineError::ItemNotFound(item_id.to_string()))?;

        let mut item = versioned.value;
        item.status = ItemStatus::Published;
        self.with_store(|store| store.update_item(item, versioned.version))?;

        info!("Item {} published", item_id);
        Ok(PublishDecision::Publishable)
    }

    /// Record an advisor's validation of a new protocol
    pub fn create_protocol(
        &self,
        draft: ProtocolDraft,
        validated_by: AdvisorId,
    ) -> Result<Protocol, PipelineError> {
        let protocol = self
            .governance
            .create_protocol(draft, validated_by, current_timestamp())?;
        self.with_store(|store| store.insert_protocol(protocol.clone()))?;
        Ok(protocol)
    }

    /// Re-validate an existing protocol, preserving the old row
    pub fn revalidate_protocol(
        &self,
        previous: &Protocol,
        validated_by: AdvisorId,
        expires_at: Option<u64>,
    ) -> Result<Protocol, PipelineError> {
        let renewed = self.governance.revalidate_protocol(
            previous,
            validated_by,
            expires_at,
            current_timestamp(),
        )?;
        self.with_store(|store| store.insert_protocol(renewed.clone()))?;
        Ok(renewed)
    }

    fn with_store<T>(
        &self,
        f: impl FnOnce(&mut S) -> Result<T, S::Error>,
    ) -> Result<T, PipelineError> {
        let mut store = self
            .store
            .lock()
            .map_err(|e| PipelineError::Store(format!("Store lock poisoned: {}", e)))?;
        f(&mut store).map_err(|e| PipelineError::Store(e.to_string()))
    }
}
