//! Research / fact-validation adapter
//!
//! Wraps an external service that checks the factual content of a
//! document and returns a narrative analysis with a corroboration
//! verdict.

use crate::types::{AnalysisHints, FindingPayload, NarrativeAnalysis, ProviderFinding};
use crate::{AnalysisProvider, ProviderError, DEFAULT_TIMEOUT_SECS};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use storyloom_domain::Confidence;

/// Provider identifier recorded on findings
pub const PROVIDER_ID: &str = "research";

/// Adapter for the research/fact-validation service
pub struct ResearchProvider {
    endpoint: String,
    api_key: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ValidateRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct ValidateResponse {
    summary: String,
    #[serde(default)]
    themes: Vec<String>,
    corroborated: bool,
    confidence: f64,
}

impl ResearchProvider {
    /// Create a new research adapter
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| ProviderError::Other(format!("HTTP client build failed: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            client,
        })
    }
}

#[async_trait]
impl AnalysisProvider for ResearchProvider {
    fn id(&self) -> &str {
        PROVIDER_ID
    }

    async fn analyze(
        &self,
        text: &str,
        _hints: &AnalysisHints,
    ) -> Result<Vec<ProviderFinding>, ProviderError> {
        let url = format!("{}/api/validate", self.endpoint);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&ValidateRequest { text })
            .send()
            .await
            .map_err(|e| ProviderError::Communication(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(ProviderError::Communication(format!("HTTP {}", status)));
        }

        let validated: ValidateResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        Ok(vec![ProviderFinding {
            provider: PROVIDER_ID.to_string(),
            payload: FindingPayload::Narrative(NarrativeAnalysis {
                summary: validated.summary,
                themes: validated.themes,
                corroborated: validated.corroborated,
            }),
            confidence: Confidence::clamped(validated.confidence),
        }])
    }
}
