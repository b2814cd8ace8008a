//! Extraction orchestration
//!
//! Fan-out/fan-in over the provider registry: all adapters start as soon
//! as normalized text is ready, each under its own timeout and a
//! cancellation token tied to the document job; the merge step is a join
//! barrier that waits for every adapter to settle. One slow or broken
//! provider never blocks extraction; only the loss of all of them fails
//! the document.

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::merge::merge_findings;
use crate::types::{ProcessingMetadata, ProcessingResult};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use storyloom_classifier::SensitivityClassifier;
use storyloom_domain::traits::{ContentStore, DocumentSource};
use storyloom_domain::{
    Consultation, ContentRef, DocumentFormat, DocumentId, ExtractedItem, ExtractionStatus, ItemId,
    ItemKind, ItemStatus, SourceDocument,
};
use storyloom_governance::Governance;
use storyloom_providers::{AnalysisHints, ProviderFinding, ProviderRegistry};
use storyloom_textract::TextExtractor;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Current Unix timestamp in seconds
pub(crate) fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// The extraction orchestrator
///
/// Constructed once at process start and shared by reference; the
/// provider registry inside is read-only, and the store is only touched
/// under its lock at discrete points (never across an await).
pub struct Orchestrator<S, D> {
    registry: ProviderRegistry,
    classifier: SensitivityClassifier,
    governance: Governance,
    textract: TextExtractor,
    store: Arc<Mutex<S>>,
    source: Arc<D>,
    config: PipelineConfig,
}

impl<S, D> Orchestrator<S, D>
where
    S: ContentStore + Send,
    S::Error: std::fmt::Display,
    D: DocumentSource,
    D::Error: std::fmt::Display,
{
    /// Create a new orchestrator
    pub fn new(
        registry: ProviderRegistry,
        classifier: SensitivityClassifier,
        store: Arc<Mutex<S>>,
        source: Arc<D>,
        config: PipelineConfig,
    ) -> Self {
        let textract = TextExtractor::new(config.max_text_chars);
        Self {
            registry,
            classifier,
            governance: Governance::new(),
            textract,
            store,
            source,
            config,
        }
    }

    /// The governance workflow this orchestrator feeds
    pub fn governance(&self) -> &Governance {
        &self.governance
    }

    /// Access to the shared store
    pub(crate) fn store(&self) -> &Arc<Mutex<S>> {
        &self.store
    }

    /// Process one document end to end
    ///
    /// Loads the document, extracts text, fans out to every registered
    /// provider, merges the findings, classifies each surviving
    /// candidate, and persists items atomically with their auto-created
    /// consultations. A cancelled job persists nothing and leaves the
    /// document retry-eligible.
    pub async fn process_document(
        &self,
        document_id: DocumentId,
        cancel: &CancellationToken,
    ) -> Result<ProcessingResult, PipelineError> {
        let start = SystemTime::now();

        let document = self
            .with_store(|store| store.get_document(document_id))?
            .ok_or_else(|| PipelineError::DocumentNotFound(document_id.to_string()))?;

        info!(
            "Processing document {} ('{}', {})",
            document.id,
            document.filename,
            document.format.as_str()
        );

        self.with_store(|store| {
            store.set_document_status(document_id, ExtractionStatus::Processing, None)
        })?;

        match self.run_extraction(&document, cancel, start).await {
            Ok(result) => {
                self.with_store(|store| {
                    store.set_document_status(document_id, ExtractionStatus::Completed, None)
                })?;
                info!(
                    "Document {} completed: {} stories, {} outcomes ({} ms)",
                    document_id,
                    result.stories.len(),
                    result.outcomes.len(),
                    result.metadata.processing_time_ms
                );
                Ok(result)
            }
            Err(PipelineError::Cancelled) => {
                // Nothing was persisted; put the document back in the queue-able state
                self.with_store(|store| {
                    store.set_document_status(document_id, ExtractionStatus::Pending, None)
                })?;
                info!("Document {} processing cancelled", document_id);
                Err(PipelineError::Cancelled)
            }
            Err(e) => {
                warn!("Document {} failed: {}", document_id, e);
                self.with_store(|store| {
                    store.set_document_status(
                        document_id,
                        ExtractionStatus::Failed,
                        Some(e.to_string()),
                    )
                })?;
                Err(e)
            }
        }
    }

    async fn run_extraction(
        &self,
        document: &SourceDocument,
        cancel: &CancellationToken,
        start: SystemTime,
    ) -> Result<ProcessingResult, PipelineError> {
        let bytes = self
            .source
            .read(document.id)
            .map_err(|e| PipelineError::Store(format!("Document read failed: {}", e)))?;

        // Image documents carry no extractable text; the vision adapter
        // works from the document reference in the hints instead.
        let (text, truncated) = match document.format {
            DocumentFormat::Image => (String::new(), false),
            format => {
                let extracted = self.textract.extract(format, &bytes)?;
                (extracted.text, extracted.truncated)
            }
        };

        let hints = AnalysisHints {
            document_id: document.id,
            filename: document.filename.clone(),
            format: document.format,
            truncated,
        };

        let (findings, providers_failed) = self.gather_findings(&text, &hints, cancel).await?;

        let outcome = merge_findings(findings, self.config.confidence_floor);
        let now = current_timestamp();

        let mut pending: Vec<(ExtractedItem, Option<Consultation>)> = Vec::new();
        for merged in outcome.candidates {
            let scan_text = match &merged.candidate.cultural_note {
                Some(note) => format!(
                    "{}\n{}\n{}",
                    merged.candidate.title, merged.candidate.body, note
                ),
                None => format!("{}\n{}", merged.candidate.title, merged.candidate.body),
            };
            let assessment =
                self.classifier
                    .classify(&scan_text, outcome.sensitivity.as_ref(), now);

            let status = if assessment.requires_review {
                ItemStatus::PendingApproval
            } else {
                ItemStatus::Draft
            };

            let item = ExtractedItem {
                id: ItemId::new(),
                document: document.id,
                kind: merged.candidate.kind,
                title: merged.candidate.title,
                body: merged.candidate.body,
                category: merged.candidate.category,
                tags: merged.candidate.tags,
                metrics: merged.candidate.metrics,
                cultural_note: merged.candidate.cultural_note,
                confidence: merged.confidence,
                contributors: merged.contributors,
                assessments: vec![assessment.clone()],
                status,
                created_at: now,
            };

            let consultation = self.governance.consultation_for_assessment(
                ContentRef::item(item.kind, item.id),
                &assessment,
                now,
            );

            pending.push((item, consultation));
        }

        // Cancellation discards everything gathered so far; a cancelled
        // job must produce no persisted output.
        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        let mut stories = Vec::new();
        let mut outcomes = Vec::new();
        for (item, consultation) in pending {
            let persisted = item.clone();
            self.with_store(|store| store.insert_item_with_consultation(item.clone(), consultation.clone()))?;
            match persisted.kind {
                ItemKind::Story => stories.push(persisted),
                ItemKind::Outcome => outcomes.push(persisted),
            }
        }

        let processing_time_ms = start
            .elapsed()
            .unwrap_or(Duration::from_secs(0))
            .as_millis() as u64;

        Ok(ProcessingResult {
            stories,
            outcomes,
            narratives: outcome.narratives,
            media: outcome.media,
            status: ExtractionStatus::Completed,
            metadata: ProcessingMetadata {
                document_id: document.id,
                providers_consulted: self.registry.len(),
                providers_failed,
                candidates_discarded: outcome.discarded,
                truncated,
                processing_time_ms,
            },
        })
    }

    /// Fan out to every registered adapter and join the results
    ///
    /// Returns the surviving findings and the number of adapters that
    /// contributed nothing. Errs with `AllProvidersFailed` only when
    /// every adapter failed or timed out; an empty-but-successful sweep
    /// is a valid result.
    async fn gather_findings(
        &self,
        text: &str,
        hints: &AnalysisHints,
        cancel: &CancellationToken,
    ) -> Result<(Vec<ProviderFinding>, usize), PipelineError> {
        if self.registry.is_empty() {
            return Err(PipelineError::NoProvidersAvailable);
        }

        let mut tasks = Vec::with_capacity(self.registry.len());
        for provider in self.registry.iter() {
            let provider = Arc::clone(provider);
            let text = text.to_string();
            let hints = hints.clone();
            let timeout = self.config.provider_timeout();
            let cancel = cancel.child_token();

            tasks.push(tokio::spawn(async move {
                let id = provider.id().to_string();
                let outcome = tokio::select! {
                    _ = cancel.cancelled() => Err("cancelled".to_string()),
                    settled = tokio::time::timeout(timeout, provider.analyze(&text, &hints)) => {
                        match settled {
                            Ok(Ok(findings)) => Ok(findings),
                            Ok(Err(e)) => Err(e.to_string()),
                            Err(_) => Err(format!("timed out after {:?}", timeout)),
                        }
                    }
                };
                (id, outcome)
            }));
        }

        // Join barrier: the merge never starts until every adapter settles
        let settled = futures::future::join_all(tasks).await;

        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        let mut findings = Vec::new();
        let mut failures = Vec::new();
        for task in settled {
            match task {
                Ok((id, Ok(batch))) => {
                    debug!("Provider {} contributed {} finding(s)", id, batch.len());
                    findings.extend(batch);
                }
                Ok((id, Err(reason))) => {
                    warn!("Provider {} contributed nothing: {}", id, reason);
                    failures.push(format!("{}: {}", id, reason));
                }
                Err(e) => {
                    warn!("Provider task panicked: {}", e);
                    failures.push(format!("task failure: {}", e));
                }
            }
        }

        if failures.len() == self.registry.len() {
            return Err(PipelineError::AllProvidersFailed(failures.join("; ")));
        }

        Ok((findings, failures.len()))
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
