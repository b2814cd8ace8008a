//! Specialized cultural-sensitivity reviewer adapter
//!
//! Wraps an external review service that assesses text against cultural
//! protocols and returns a tier suggestion plus recommendations. The
//! deterministic marker scan in storyloom-classifier has final say; this
//! provider only contributes a signal.

use crate::types::{AnalysisHints, FindingPayload, ProviderFinding};
use crate::{AnalysisProvider, ProviderError, DEFAULT_TIMEOUT_SECS};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use storyloom_domain::{Confidence, SensitivitySignal, SensitivityTier};
use tracing::debug;

/// Provider identifier recorded on findings
pub const PROVIDER_ID: &str = "cultural_review";

/// Adapter for the cultural-sensitivity review service
pub struct CulturalReviewProvider {
    endpoint: String,
    api_key: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct AssessRequest<'a> {
    text: &'a str,
    filename: &'a str,
}

#[derive(Deserialize)]
struct AssessResponse {
    tier: Option<String>,
    requires_review: bool,
    #[serde(default)]
    recommendations: Vec<String>,
    confidence: f64,
}

impl CulturalReviewProvider {
    /// Create a new cultural review adapter
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
impl AnalysisProvider for CulturalReviewProvider {
    fn id(&self) -> &str {
        PROVIDER_ID
    }

    async fn analyze(
        &self,
        text: &str,
        hints: &AnalysisHints,
    ) -> Result<Vec<ProviderFinding>, ProviderError> {
        let url = format!("{}/api/assess", self.endpoint);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&AssessRequest {
                text,
                filename: &hints.filename,
            })
            .send()
            .await
            .map_err(|e| ProviderError::Communication(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(ProviderError::Communication(format!("HTTP {}", status)));
        }

        let assessed: AssessResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        // An unrecognized tier string degrades to "no tier suggestion"
        // rather than failing the call
        let tier = assessed.tier.as_deref().and_then(SensitivityTier::parse);
        debug!(
            "Cultural review: tier={:?}, requires_review={}",
            tier, assessed.requires_review
        );

        Ok(vec![ProviderFinding {
            provider: PROVIDER_ID.to_string(),
            payload: FindingPayload::Sensitivity(SensitivitySignal {
                tier,
                requires_review: assessed.requires_review,
                recommendations: assessed.recommendations,
                source: PROVIDER_ID.to_string(),
            }),
            confidence: Confidence::clamped(assessed.confidence),
        }])
    }
}
