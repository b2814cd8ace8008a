//! Merge and deduplicate provider findings
//!
//! Two candidates from the same document are the same underlying item
//! when their normalized titles are equal. A merged candidate keeps the
//! body of its highest-confidence contributor, unions tag sets, and
//! aggregates confidence by maximum: one strong signal is enough to
//! surface an item, and confidence is never diluted by disagreement.

use std::collections::HashMap;
use storyloom_domain::{
    normalize_title, Confidence, ProviderScore, SensitivitySignal, SensitivityTier,
};
use storyloom_providers::{
    FindingPayload, ItemCandidate, MediaDescription, NarrativeAnalysis, ProviderFinding,
};
use tracing::debug;

/// One deduplicated candidate with its provenance
#[derive(Debug, Clone)]
pub struct MergedCandidate {
    /// The winning candidate content
    pub candidate: ItemCandidate,

    /// Aggregate confidence (maximum across contributors)
    pub confidence: Confidence,

    /// Every provider that contributed, with its own score
    pub contributors: Vec<ProviderScore>,
}

/// Everything the merge step produces from one document's findings
#[derive(Debug, Clone, Default)]
pub struct MergeOutcome {
    /// Deduplicated candidates at or above the confidence floor
    pub candidates: Vec<MergedCandidate>,

    /// Combined sensitivity signal across providers, if any gave one
    pub sensitivity: Option<SensitivitySignal>,

    /// Narrative analyses, passed through for the caller
    pub narratives: Vec<NarrativeAnalysis>,

    /// Media descriptions, passed through for the caller
    pub media: Vec<MediaDescription>,

    /// Candidates dropped for falling below the floor
    pub discarded: usize,
}

/// Merge all provider findings for one document
pub fn merge_findings(findings: Vec<ProviderFinding>, confidence_floor: f64) -> MergeOutcome {
    let mut by_title: HashMap<String, MergedCandidate> = HashMap::new();
    let mut signals: Vec<(SensitivitySignal, Confidence)> = Vec::new();
    let mut narratives = Vec::new();
    let mut media = Vec::new();

    for finding in findings {
        let score = ProviderScore {
            provider: finding.provider.clone(),
            confidence: finding.confidence,
        };

        match finding.payload {
            FindingPayload::ItemCandidate(candidate) => {
                let key = normalize_title(&candidate.title);
                match by_title.get_mut(&key) {
                    Some(existing) => merge_into(existing, candidate, score),
                    None => {
                        by_title.insert(
                            key,
                            MergedCandidate {
                                candidate,
                                confidence: finding.confidence,
                                contributors: vec![score],
                            },
                        );
                    }
                }
            }
            FindingPayload::Sensitivity(signal) => {
                signals.push((signal, finding.confidence));
            }
            FindingPayload::Narrative(narrative) => narratives.push(narrative),
            FindingPayload::MediaDescription(description) => media.push(description),
        }
    }

    let total = by_title.len();
    let mut candidates: Vec<MergedCandidate> = by_title
        .into_values()
        .filter(|c| c.confidence.meets_floor(confidence_floor))
        .collect();
    let discarded = total - candidates.len();

    if discarded > 0 {
        debug!(
            "Discarded {} candidate(s) below confidence floor {}",
            discarded, confidence_floor
        );
    }

    // Normalize tag order so merged output is independent of arrival order
    for merged in &mut candidates {
        merged.candidate.tags.sort();
        merged.candidate.tags.dedup();
    }

    MergeOutcome {
        candidates,
        sensitivity: combine_signals(signals),
        narratives,
        media,
        discarded,
    }
}

/// Fold a duplicate candidate into an existing merged entry
///
/// The highest-confidence contributor's content wins wholesale; tag
/// sets union.
fn merge_into(existing: &mut MergedCandidate, incoming: ItemCandidate, score: ProviderScore) {
    if score.confidence > existing.confidence {
        let mut tags = existing.candidate.tags.clone();
        tags.extend(incoming.tags.iter().cloned());
        existing.candidate = ItemCandidate { tags, ..incoming };
        existing.confidence = score.confidence;
    } else {
        existing
            .candidate
            .tags
            .extend(incoming.tags.iter().cloned());
    }
    existing.contributors.push(score);
}

/// Combine sensitivity signals from multiple providers
///
/// Conservative: the highest suggested tier wins, any review flag
/// sticks, and recommendations accumulate. The recorded source is the
/// highest-confidence signal's provider.
fn combine_signals(mut signals: Vec<(SensitivitySignal, Confidence)>) -> Option<SensitivitySignal> {
    if signals.is_empty() {
        return None;
    }

    signals.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let source = signals[0].0.source.clone();
    let mut tier: Option<SensitivityTier> = None;
    let mut requires_review = false;
    let mut recommendations = Vec::new();

    for (signal, _) in signals {
        tier = match (tier, signal.tier) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        requires_review = requires_review || signal.requires_review;
        recommendations.extend(signal.recommendations);
    }

    Some(SensitivitySignal {
        tier,
        requires_review,
        recommendations,
        source,
    })
}
