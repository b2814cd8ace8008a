//! Parse language-model output into item candidates

use crate::types::ItemCandidate;
use crate::ProviderError;
use serde_json::Value;
use storyloom_domain::{Confidence, ItemKind, Metric};
use tracing::warn;

/// Parse model JSON output into candidates with per-candidate confidence
///
/// Models sometimes wrap JSON in markdown code blocks; those are
/// stripped first. Malformed entries are skipped with a warning rather
/// than failing the whole response.
pub fn parse_candidates(
    response: &str,
) -> Result<Vec<(ItemCandidate, Confidence)>, ProviderError> {
    let json_str = extract_json(response)?;

    let json: Value = serde_json::from_str(&json_str)
        .map_err(|e| ProviderError::InvalidResponse(format!("JSON parse error: {}", e)))?;

    let entries = json
        .as_array()
        .ok_or_else(|| ProviderError::InvalidResponse("Expected JSON array".to_string()))?;

    let mut candidates = Vec::new();
    for (idx, entry) in entries.iter().enumerate() {
        match parse_candidate_json(entry) {
            Ok(candidate) => candidates.push(candidate),
            Err(e) => {
                warn!("Failed to parse candidate {}: {}", idx, e);
            }
        }
    }

    Ok(candidates)
}

/// Extract JSON from a response, handling markdown code blocks
fn extract_json(response: &str) -> Result<String, ProviderError> {
    let trimmed = response.trim();

    if trimmed.starts_with("```") {
        let lines: Vec<&str> = trimmed.lines().collect();
        if lines.len() < 2 {
            return Err(ProviderError::InvalidResponse(
                "Empty code block".to_string(),
            ));
        }
        // Skip first line (```json or ```) and last line (```)
        let json_lines = &lines[1..lines.len().saturating_sub(1)];
        Ok(json_lines.join("\n"))
    } else {
        Ok(trimmed.to_string())
    }
}

/// Parse a single candidate from JSON
fn parse_candidate_json(json: &Value) -> Result<(ItemCandidate, Confidence), String> {
    let obj = json
        .as_object()
        .ok_or_else(|| "Candidate is not a JSON object".to_string())?;

    let kind_str = obj
        .get("kind")
        .and_then(|v| v.as_str())
        .ok_or_else(|| "Missing or invalid 'kind'".to_string())?;
    let kind = ItemKind::parse(kind_str).ok_or_else(|| format!("Unknown kind '{}'", kind_str))?;

    let title = obj
        .get("title")
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| "Missing or empty 'title'".to_string())?
        .to_string();

    let body = obj
        .get("body")
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| "Missing or empty 'body'".to_string())?
        .to_string();

    let confidence_raw = obj
        .get("confidence")
        .and_then(|v| v.as_f64())
        .ok_or_else(|| "Missing or invalid 'confidence'".to_string())?;
    let confidence = Confidence::new(confidence_raw)
        .map_err(|e| format!("Invalid confidence: {}", e))?;

    let category = obj
        .get("category")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());

    let tags = obj
        .get("tags")
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|t| t.as_str())
                .map(|t| t.to_string())
                .collect()
        })
        .unwrap_or_default();

    let metrics = obj
        .get("metrics")
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|m| {
                    let label = m.get("label")?.as_str()?.to_string();
                    let value = m.get("value")?.as_str()?.to_string();
                    Some(Metric { label, value })
                })
                .collect()
        })
        .unwrap_or_default();

    let cultural_note = obj
        .get("cultural_note")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());

    Ok((
        ItemCandidate {
            kind,
            title,
            body,
            category,
            tags,
            metrics,
            cultural_note,
        },
        confidence,
    ))
}
