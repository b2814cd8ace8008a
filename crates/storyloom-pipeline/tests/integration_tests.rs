//! End-to-end pipeline tests over mock providers and the memory store

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use storyloom_domain::traits::{ContentStore, DocumentSource};
use storyloom_domain::{
    ApprovalStatus, Audience, Confidence, ConsultationPriority, ConsultationStatus, ContentRef,
    DocumentFormat, DocumentId, ExtractionStatus, ItemKind, ItemStatus, SensitivityTier,
    SourceDocument,
};
use storyloom_gatekeeper::{HoldReason, PublishDecision};
use storyloom_governance::{ConsultationAction, ProtocolDraft};
use storyloom_pipeline::{ContentService, Orchestrator, PipelineConfig, PipelineError, WorkerPool};
use storyloom_providers::{
    AnalysisProvider, FindingPayload, ItemCandidate, MockProvider, ProviderFinding,
    ProviderRegistry,
};
use storyloom_store::MemoryStore;

const NOW: u64 = 1_700_000_000;

/// Route pipeline logs through the test harness (RUST_LOG to enable)
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// In-memory document byte source
struct MemorySource {
    documents: HashMap<u128, Vec<u8>>,
}

impl DocumentSource for MemorySource {
    type Error = String;

    fn read(&self, id: DocumentId) -> Result<Vec<u8>, Self::Error> {
        self.documents
            .get(&id.value())
            .cloned()
            .ok_or_else(|| format!("no bytes for document {}", id))
    }
}

fn story_finding(title: &str, body: &str, confidence: f64) -> ProviderFinding {
    ProviderFinding {
        provider: String::new(),
        payload: FindingPayload::ItemCandidate(ItemCandidate {
            kind: ItemKind::Story,
            title: title.to_string(),
            body: body.to_string(),
            category: None,
            tags: vec![],
            metrics: vec![],
            cultural_note: None,
        }),
        confidence: Confidence::new(confidence).unwrap(),
    }
}

fn outcome_finding(title: &str, body: &str, confidence: f64) -> ProviderFinding {
    ProviderFinding {
        provider: String::new(),
        payload: FindingPayload::ItemCandidate(ItemCandidate {
            kind: ItemKind::Outcome,
            title: title.to_string(),
            body: body.to_string(),
            category: None,
            tags: vec![],
            metrics: vec![],
            cultural_note: None,
        }),
        confidence: Confidence::new(confidence).unwrap(),
    }
}

/// Wall-clock now, matching what the service stamps on entities
fn wall_clock_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

fn plain_document(name: &str) -> (SourceDocument, Vec<u8>) {
    let body = b"An interview transcript about community work.".to_vec();
    let document = SourceDocument::new(
        name.to_string(),
        DocumentFormat::PlainText,
        body.len() as u64,
        "staff:marla".to_string(),
        NOW,
    );
    (document, body)
}

/// Assemble a service over mock providers and in-memory storage
fn build_service(
    providers: Vec<Arc<dyn AnalysisProvider>>,
    documents: Vec<(SourceDocument, Vec<u8>)>,
    config: PipelineConfig,
) -> (
    ContentService<MemoryStore, MemorySource>,
    Arc<Mutex<MemoryStore>>,
) {
    let mut store = MemoryStore::new();
    let mut bytes = HashMap::new();
    for (document, content) in documents {
        bytes.insert(document.id.value(), content);
        store.insert_document(document).unwrap();
    }
    let store = Arc::new(Mutex::new(store));

    let registry = providers
        .into_iter()
        .fold(ProviderRegistry::empty(), |registry, provider| {
            registry.with_provider(provider)
        });

    let orchestrator = Orchestrator::new(
        registry,
        storyloom_classifier::SensitivityClassifier::default_policy(),
        Arc::clone(&store),
        Arc::new(MemorySource { documents: bytes }),
        config,
    );

    (ContentService::new(orchestrator), store)
}

#[tokio::test]
async fn test_scenario_a_clean_story_is_immediately_publishable() {
    init_tracing();
    let (document, bytes) = plain_document("interview.txt");
    let provider = MockProvider::new("language_model").with_findings(vec![story_finding(
        "Youth program summer",
        "The youth program ran all summer at the hall.",
        0.8,
    )]);

    let (service, store) = build_service(
        vec![Arc::new(provider)],
        vec![(document.clone(), bytes)],
        PipelineConfig::default(),
    );

    let result = service.process_document(document.id).await.unwrap();
    assert_eq!(result.stories.len(), 1);
    assert_eq!(result.outcomes.len(), 0);

    let item = &result.stories[0];
    assert_eq!(item.assessment().unwrap().tier, SensitivityTier::Medium);
    assert!(!item.requires_review());
    assert_eq!(item.status, ItemStatus::Draft);

    // No consultation was auto-created
    assert_eq!(store.lock().unwrap().consultation_count(), 0);

    assert_eq!(
        service
            .check_publish_eligibility(item.id, Audience::Public)
            .unwrap(),
        PublishDecision::Publishable
    );
}

#[tokio::test]
async fn test_scenario_b_sacred_marker_forces_urgent_consultation_and_hold() {
    let (document, bytes) = plain_document("elder_interview.txt");
    let provider = MockProvider::new("language_model").with_findings(vec![story_finding(
        "The old crossing",
        "The elder described the sacred site upriver.",
        0.9,
    )]);

    let (service, store) = build_service(
        vec![Arc::new(provider)],
        vec![(document.clone(), bytes)],
        PipelineConfig::default(),
    );

    let result = service.process_document(document.id).await.unwrap();
    let item = &result.stories[0];
    assert_eq!(item.assessment().unwrap().tier, SensitivityTier::Sacred);
    assert!(item.requires_review());
    assert_eq!(item.status, ItemStatus::PendingApproval);

    let consultations = store
        .lock()
        .unwrap()
        .consultations_for(&ContentRef::item(item.kind, item.id))
        .unwrap();
    assert_eq!(consultations.len(), 1, "consultation must be auto-created");
    assert_eq!(consultations[0].status, ConsultationStatus::Requested);
    assert_eq!(consultations[0].priority, ConsultationPriority::Urgent);

    assert_eq!(
        service
            .check_publish_eligibility(item.id, Audience::Public)
            .unwrap(),
        PublishDecision::Hold {
            reason: HoldReason::ConsultationOpen {
                consultation: consultations[0].id
            }
        }
    );
}

#[tokio::test]
async fn test_scenario_c_rejected_consultation_blocks_permanently() {
    let (document, bytes) = plain_document("elder_interview.txt");
    let provider = MockProvider::new("language_model").with_findings(vec![story_finding(
        "The old crossing",
        "The elder described the sacred site upriver.",
        0.9,
    )]);

    let (service, store) = build_service(
        vec![Arc::new(provider)],
        vec![(document.clone(), bytes)],
        PipelineConfig::default(),
    );

    let result = service.process_document(document.id).await.unwrap();
    let item = &result.stories[0];
    let consultation_id = store
        .lock()
        .unwrap()
        .consultations_for(&ContentRef::item(item.kind, item.id))
        .unwrap()[0]
        .id;

    service
        .update_consultation(consultation_id, ConsultationAction::Start)
        .unwrap();
    service
        .update_consultation(
            consultation_id,
            ConsultationAction::Complete {
                approval: ApprovalStatus::Rejected,
                sensitivity_rating: 5,
                notes: Some("Not for public telling".to_string()),
                recommendations: vec![],
                follow_up_required: false,
                follow_up_priority: None,
            },
        )
        .unwrap();

    let decision = service
        .check_publish_eligibility(item.id, Audience::Public)
        .unwrap();
    assert_eq!(
        decision,
        PublishDecision::Rejected {
            consultation: consultation_id
        }
    );

    // Re-checking never reverts a rejection to a hold
    let again = service
        .check_publish_eligibility(item.id, Audience::Public)
        .unwrap();
    assert_eq!(again, decision);
}

#[tokio::test]
async fn test_scenario_d_protocol_substitutes_for_cancelled_consultation() {
    let (document, bytes) = plain_document("interview.txt");
    let provider = MockProvider::new("language_model").with_findings(vec![story_finding(
        "River crossing",
        "A ceremony was held at the new crossing.",
        0.85,
    )]);

    let (service, store) = build_service(
        vec![Arc::new(provider)],
        vec![(document.clone(), bytes)],
        PipelineConfig::default(),
    );

    let result = service.process_document(document.id).await.unwrap();
    let item = &result.stories[0];
    assert_eq!(item.assessment().unwrap().tier, SensitivityTier::High);

    // Clear the auto-created consultation so the protocol path decides
    let consultation_id = store
        .lock()
        .unwrap()
        .consultations_for(&ContentRef::item(item.kind, item.id))
        .unwrap()[0]
        .id;
    service
        .update_consultation(consultation_id, ConsultationAction::Cancel)
        .unwrap();

    // Without a protocol the item holds
    assert_eq!(
        service
            .check_publish_eligibility(item.id, Audience::Public)
            .unwrap(),
        PublishDecision::Hold {
            reason: HoldReason::NoConsultation
        }
    );

    // An identically-titled protocol valid for a year substitutes
    service
        .create_protocol(
            ProtocolDraft {
                story_title: "River Crossing".to_string(),
                story_type: "historical".to_string(),
                traditional_owners: vec!["Marr family".to_string()],
                origin: None,
                seasonal_restrictions: vec![],
                gender_restriction: None,
                age_restriction: None,
                ceremonial_context: None,
                sharing: storyloom_domain::SharingPermission::PublicWithAttribution,
                consultation_required: false,
                expires_at: Some(wall_clock_now() + 86_400 * 365),
            },
            storyloom_domain::AdvisorId::new(),
        )
        .unwrap();

    assert_eq!(
        service
            .check_publish_eligibility(item.id, Audience::Public)
            .unwrap(),
        PublishDecision::Publishable
    );
}

#[tokio::test]
async fn test_scenario_e_expired_protocol_is_treated_as_absent() {
    let (document, bytes) = plain_document("interview.txt");
    let provider = MockProvider::new("language_model").with_findings(vec![story_finding(
        "River crossing",
        "A ceremony was held at the new crossing.",
        0.85,
    )]);

    let (service, store) = build_service(
        vec![Arc::new(provider)],
        vec![(document.clone(), bytes)],
        PipelineConfig::default(),
    );

    let result = service.process_document(document.id).await.unwrap();
    let item = &result.stories[0];
    let consultation_id = store
        .lock()
        .unwrap()
        .consultations_for(&ContentRef::item(item.kind, item.id))
        .unwrap()[0]
        .id;
    service
        .update_consultation(consultation_id, ConsultationAction::Cancel)
        .unwrap();

    // Insert a protocol that expired yesterday, bypassing creation-time
    // validation the way old rows naturally age out
    let expired = storyloom_domain::Protocol {
        id: storyloom_domain::ProtocolId::new(),
        story_title: "River crossing".to_string(),
        story_type: "historical".to_string(),
        traditional_owners: vec![],
        origin: None,
        seasonal_restrictions: vec![],
        gender_restriction: None,
        age_restriction: None,
        ceremonial_context: None,
        sharing: storyloom_domain::SharingPermission::PublicWithAttribution,
        consultation_required: false,
        validated_by: storyloom_domain::AdvisorId::new(),
        validated_at: NOW,
        expires_at: Some(wall_clock_now() - 86_400),
        supersedes: None,
    };
    let expired_id = expired.id;
    store.lock().unwrap().insert_protocol(expired).unwrap();

    assert_eq!(
        service
            .check_publish_eligibility(item.id, Audience::Public)
            .unwrap(),
        PublishDecision::Hold {
            reason: HoldReason::ProtocolExpired {
                protocol: expired_id
            }
        }
    );
}

#[tokio::test]
async fn test_merge_round_trip_and_confidence_floor() {
    let (document, bytes) = plain_document("report.txt");

    // Two adapters agree on one item at 0.65/0.91; a third candidate is
    // seen only once at 0.6
    let first = MockProvider::new("language_model").with_findings(vec![
        story_finding("River crossing", "short note", 0.65),
        story_finding("Quiet story", "barely seen", 0.6),
    ]);
    let second = MockProvider::new("research").with_findings(vec![story_finding(
        "river crossing",
        "The full account of the rebuild.",
        0.91,
    )]);

    let (service, store) = build_service(
        vec![Arc::new(first), Arc::new(second)],
        vec![(document.clone(), bytes)],
        PipelineConfig::default(),
    );

    let result = service.process_document(document.id).await.unwrap();
    assert_eq!(result.stories.len(), 1, "low-confidence candidate discarded");
    assert_eq!(result.metadata.candidates_discarded, 1);

    let item = &result.stories[0];
    assert_eq!(item.confidence.value(), 0.91, "max rule, never averaged");
    assert_eq!(item.body, "The full account of the rebuild.");
    assert_eq!(item.contributors.len(), 2);

    assert_eq!(store.lock().unwrap().item_count(), 1);
}

#[tokio::test]
async fn test_processing_is_idempotent_on_titles_and_tiers() {
    let (document, bytes) = plain_document("report.txt");
    let findings = vec![
        story_finding("The old crossing", "The sacred site upriver.", 0.9),
        outcome_finding("Attendance", "Forty-two families attended.", 0.8),
    ];
    let provider = MockProvider::new("language_model").with_findings(findings);

    let (service, _store) = build_service(
        vec![Arc::new(provider)],
        vec![(document.clone(), bytes)],
        PipelineConfig::default(),
    );

    let summarize = |result: &storyloom_pipeline::ProcessingResult| {
        let mut summary: Vec<(String, SensitivityTier)> = result
            .stories
            .iter()
            .chain(result.outcomes.iter())
            .map(|i| (i.title.clone(), i.assessment().unwrap().tier))
            .collect();
        summary.sort();
        summary
    };

    let first = service.process_document(document.id).await.unwrap();
    let second = service.process_document(document.id).await.unwrap();
    assert_eq!(summarize(&first), summarize(&second));
}

#[tokio::test(start_paused = true)]
async fn test_all_providers_timing_out_fails_the_document() {
    let (document, bytes) = plain_document("report.txt");

    let slow = |id: &str| {
        Arc::new(
            MockProvider::new(id)
                .with_findings(vec![story_finding("Too late", "never arrives", 0.9)])
                .with_delay(Duration::from_secs(120)),
        )
    };

    let (service, store) = build_service(
        vec![slow("language_model"), slow("cultural_review"), slow("research")],
        vec![(document.clone(), bytes)],
        PipelineConfig::default(), // 60s provider timeout
    );

    let result = service.process_document(document.id).await;
    assert!(matches!(result, Err(PipelineError::AllProvidersFailed(_))));

    let store = store.lock().unwrap();
    let failed = store.get_document(document.id).unwrap().unwrap();
    assert_eq!(failed.status, ExtractionStatus::Failed);
    assert!(failed.failure_reason.is_some());
    assert_eq!(store.item_count(), 0, "no items persisted on failure");
}

#[tokio::test]
async fn test_one_broken_provider_does_not_block_extraction() {
    let (document, bytes) = plain_document("report.txt");

    let good = MockProvider::new("language_model")
        .with_findings(vec![story_finding("Good story", "arrives fine", 0.8)]);
    let broken = MockProvider::new("research").failing();

    let (service, _store) = build_service(
        vec![Arc::new(good), Arc::new(broken)],
        vec![(document.clone(), bytes)],
        PipelineConfig::default(),
    );

    let result = service.process_document(document.id).await.unwrap();
    assert_eq!(result.stories.len(), 1);
    assert_eq!(result.metadata.providers_failed, 1);
    assert_eq!(result.metadata.providers_consulted, 2);
}

#[tokio::test]
async fn test_empty_registry_is_distinguished_from_all_failed() {
    let (document, bytes) = plain_document("report.txt");
    let (service, store) = build_service(
        vec![],
        vec![(document.clone(), bytes)],
        PipelineConfig::default(),
    );

    let result = service.process_document(document.id).await;
    assert!(matches!(result, Err(PipelineError::NoProvidersAvailable)));
    assert_eq!(
        store
            .lock()
            .unwrap()
            .get_document(document.id)
            .unwrap()
            .unwrap()
            .status,
        ExtractionStatus::Failed
    );
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_persists_nothing() {
    let (document, bytes) = plain_document("report.txt");
    let provider = MockProvider::new("language_model")
        .with_findings(vec![story_finding("Slow story", "body", 0.9)])
        .with_delay(Duration::from_secs(30));

    let (service, store) = build_service(
        vec![Arc::new(provider)],
        vec![(document.clone(), bytes)],
        PipelineConfig::default(),
    );

    let orchestrator = service.orchestrator();
    let cancel = tokio_util::sync::CancellationToken::new();

    let processing = orchestrator.process_document(document.id, &cancel);
    tokio::pin!(processing);

    // Let the job reach its provider calls, then cancel it
    let result = tokio::select! {
        biased;
        _ = async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            cancel.cancel();
            std::future::pending::<()>().await;
        } => unreachable!(),
        result = &mut processing => result,
    };

    assert!(matches!(result, Err(PipelineError::Cancelled)));

    let store = store.lock().unwrap();
    assert_eq!(store.item_count(), 0);
    assert_eq!(store.consultation_count(), 0);
    assert_eq!(
        store.get_document(document.id).unwrap().unwrap().status,
        ExtractionStatus::Pending,
        "cancelled documents stay retry-eligible"
    );
}

#[tokio::test]
async fn test_completion_with_follow_up_spawns_new_consultation() {
    let (document, bytes) = plain_document("elder_interview.txt");
    let provider = MockProvider::new("language_model").with_findings(vec![story_finding(
        "The old crossing",
        "The elder described the sacred site upriver.",
        0.9,
    )]);

    let (service, store) = build_service(
        vec![Arc::new(provider)],
        vec![(document.clone(), bytes)],
        PipelineConfig::default(),
    );

    let result = service.process_document(document.id).await.unwrap();
    let item = &result.stories[0];
    let content = ContentRef::item(item.kind, item.id);
    let consultation_id = store
        .lock()
        .unwrap()
        .consultations_for(&content)
        .unwrap()[0]
        .id;

    service
        .update_consultation(consultation_id, ConsultationAction::Start)
        .unwrap();
    service
        .update_consultation(
            consultation_id,
            ConsultationAction::Complete {
                approval: ApprovalStatus::Approved,
                sensitivity_rating: 4,
                notes: None,
                recommendations: vec!["Revisit next season".to_string()],
                follow_up_required: true,
                follow_up_priority: None,
            },
        )
        .unwrap();

    let consultations = store.lock().unwrap().consultations_for(&content).unwrap();
    assert_eq!(consultations.len(), 2);
    let follow_up = consultations
        .iter()
        .find(|c| c.parent == Some(consultation_id))
        .expect("follow-up must exist");
    assert_eq!(follow_up.status, ConsultationStatus::Requested);
    assert_eq!(follow_up.priority, ConsultationPriority::Urgent);
}

#[tokio::test]
async fn test_invalid_transition_surfaces_synchronously() {
    let (document, bytes) = plain_document("elder_interview.txt");
    let provider = MockProvider::new("language_model").with_findings(vec![story_finding(
        "The old crossing",
        "The elder described the sacred site upriver.",
        0.9,
    )]);

    let (service, store) = build_service(
        vec![Arc::new(provider)],
        vec![(document.clone(), bytes)],
        PipelineConfig::default(),
    );

    let result = service.process_document(document.id).await.unwrap();
    let item = &result.stories[0];
    let consultation_id = store
        .lock()
        .unwrap()
        .consultations_for(&ContentRef::item(item.kind, item.id))
        .unwrap()[0]
        .id;

    // Completing before the review starts is rejected
    let result = service.update_consultation(
        consultation_id,
        ConsultationAction::Complete {
            approval: ApprovalStatus::Approved,
            sensitivity_rating: 3,
            notes: None,
            recommendations: vec![],
            follow_up_required: false,
            follow_up_priority: None,
        },
    );
    assert!(matches!(result, Err(PipelineError::Governance(_))));
}

#[tokio::test]
async fn test_publish_item_flips_status_only_when_publishable() {
    let (document, bytes) = plain_document("interview.txt");
    let provider = MockProvider::new("language_model").with_findings(vec![
        story_finding("Clean story", "Nothing restricted here.", 0.8),
        story_finding("Guarded story", "The sacred site upriver.", 0.9),
    ]);

    let (service, store) = build_service(
        vec![Arc::new(provider)],
        vec![(document.clone(), bytes)],
        PipelineConfig::default(),
    );

    let result = service.process_document(document.id).await.unwrap();
    let clean = result
        .stories
        .iter()
        .find(|i| i.title == "Clean story")
        .unwrap();
    let guarded = result
        .stories
        .iter()
        .find(|i| i.title == "Guarded story")
        .unwrap();

    assert_eq!(
        service.publish_item(clean.id, Audience::Public).unwrap(),
        PublishDecision::Publishable
    );
    assert_eq!(
        store
            .lock()
            .unwrap()
            .get_item(clean.id)
            .unwrap()
            .unwrap()
            .value
            .status,
        ItemStatus::Published
    );

    let blocked = service.publish_item(guarded.id, Audience::Public).unwrap();
    assert!(matches!(blocked, PublishDecision::Hold { .. }));
    assert_eq!(
        store
            .lock()
            .unwrap()
            .get_item(guarded.id)
            .unwrap()
            .unwrap()
            .value
            .status,
        ItemStatus::PendingApproval
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_worker_pool_processes_documents_in_any_order() {
    init_tracing();
    let (doc_a, bytes_a) = plain_document("first.txt");
    let (doc_b, bytes_b) = plain_document("second.txt");

    let mut store = MemoryStore::new();
    let mut bytes = HashMap::new();
    for (document, content) in [(doc_a.clone(), bytes_a), (doc_b.clone(), bytes_b)] {
        bytes.insert(document.id.value(), content);
        store.insert_document(document).unwrap();
    }
    let store = Arc::new(Mutex::new(store));

    let registry = ProviderRegistry::empty().with_provider(Arc::new(
        MockProvider::new("language_model")
            .with_findings(vec![story_finding("A story", "body", 0.8)]),
    ));

    let config = PipelineConfig {
        worker_count: 2,
        ..Default::default()
    };
    let orchestrator = Arc::new(Orchestrator::new(
        registry,
        storyloom_classifier::SensitivityClassifier::default_policy(),
        Arc::clone(&store),
        Arc::new(MemorySource { documents: bytes }),
        config.clone(),
    ));

    let pool = WorkerPool::start(orchestrator, &config);
    pool.submit(doc_a.id).await.unwrap();
    pool.submit(doc_b.id).await.unwrap();

    // Poll until both documents settle
    let deadline = std::time::Instant::now() + Duration::from_secs(10);
    loop {
        let done = {
            let store = store.lock().unwrap();
            [doc_a.id, doc_b.id].iter().all(|id| {
                store.get_document(*id).unwrap().unwrap().status == ExtractionStatus::Completed
            })
        };
        if done {
            break;
        }
        assert!(
            std::time::Instant::now() < deadline,
            "documents did not complete in time"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    pool.shutdown().await;
    assert_eq!(store.lock().unwrap().item_count(), 2);
}
