//! General-purpose language-model adapter
//!
//! Sends document text to an LLM completion API and parses the returned
//! JSON into Story/Outcome candidates. One timeout-bounded attempt per
//! call; failures surface as errors and the orchestrator drops this
//! provider's contribution for the document.

use crate::parser::parse_candidates;
use crate::types::{AnalysisHints, FindingPayload, ProviderFinding};
use crate::{AnalysisProvider, ProviderError, DEFAULT_TIMEOUT_SECS};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Provider identifier recorded on findings
pub const PROVIDER_ID: &str = "language_model";

/// Adapter for a general-purpose LLM completion API
pub struct LanguageModelProvider {
    endpoint: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

/// Request body for the completion API
#[derive(Serialize)]
struct CompletionRequest {
    model: String,
    prompt: String,
    stream: bool,
}

/// Response from the completion API
#[derive(Deserialize)]
struct CompletionResponse {
    response: String,
}

impl LanguageModelProvider {
    /// Create a new language-model adapter
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| ProviderError::Other(format!("HTTP client build failed: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model: model.into(),
            client,
        })
    }

    /// Build the extraction prompt for a document
    fn build_prompt(&self, text: &str, hints: &AnalysisHints) -> String {
        format!(
            "You analyze community source documents (interview transcripts, reports) \
             and extract structured items.\n\
             Return ONLY a JSON array. Each element:\n\
             {{\"kind\": \"story\"|\"outcome\", \"title\": ..., \"body\": ..., \
             \"category\": ..., \"tags\": [...], \
             \"metrics\": [{{\"label\": ..., \"value\": ...}}], \
             \"cultural_note\": ..., \"confidence\": 0.0-1.0}}\n\
             Stories are narratives; outcomes are measurable results with metrics.\n\
             Document: {} ({})\n\
             ---\n\
             {}",
            hints.filename,
            hints.format.as_str(),
            text
        )
    }
}

#[async_trait]
impl AnalysisProvider for LanguageModelProvider {
    fn id(&self) -> &str {
        PROVIDER_ID
    }

    async fn analyze(
        &self,
        text: &str,
        hints: &AnalysisHints,
    ) -> Result<Vec<ProviderFinding>, ProviderError> {
        let url = format!("{}/api/generate", self.endpoint);
        let request_body = CompletionRequest {
            model: self.model.clone(),
            prompt: self.build_prompt(text, hints),
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| ProviderError::Communication(format!("Request failed: {}", e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited);
        }
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ProviderError::Communication(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        debug!(
            "Model response length: {} chars",
            completion.response.len()
        );

        let findings = parse_candidates(&completion.response)?
            .into_iter()
            .map(|(candidate, confidence)| ProviderFinding {
                provider: PROVIDER_ID.to_string(),
                payload: FindingPayload::ItemCandidate(candidate),
                confidence,
            })
            .collect();

        Ok(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storyloom_domain::{DocumentFormat, DocumentId};

    #[test]
    fn test_provider_creation() {
        let provider =
            LanguageModelProvider::new("http://localhost:11434", "key", "llama2").unwrap();
        assert_eq!(provider.id(), PROVIDER_ID);
    }

    #[test]
    fn test_prompt_includes_document_context() {
        let provider =
            LanguageModelProvider::new("http://localhost:11434", "key", "llama2").unwrap();
        let hints = AnalysisHints {
            document_id: DocumentId::new(),
            filename: "interview_03.docx".to_string(),
            format: DocumentFormat::WordProcessor,
            truncated: false,
        };
        let prompt = provider.build_prompt("The elder spoke.", &hints);
        assert!(prompt.contains("interview_03.docx"));
        assert!(prompt.contains("The elder spoke."));
        assert!(prompt.contains("\"kind\""));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_communication_error() {
        let provider =
            LanguageModelProvider::new("http://127.0.0.1:1", "key", "llama2").unwrap();
        let hints = AnalysisHints {
            document_id: DocumentId::new(),
            filename: "a.txt".to_string(),
            format: DocumentFormat::PlainText,
            truncated: false,
        };
        let result = provider.analyze("text", &hints).await;
        assert!(matches!(result, Err(ProviderError::Communication(_))));
    }
}
