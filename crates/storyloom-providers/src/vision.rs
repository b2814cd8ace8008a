//! Vision adapter for image documents
//!
//! Image documents carry no extractable text; the vision service fetches
//! the stored media by document id and returns a description. The
//! adapter therefore sends the document reference from the hints rather
//! than the (empty) text.

use crate::types::{AnalysisHints, FindingPayload, MediaDescription, ProviderFinding};
use crate::{AnalysisProvider, ProviderError, DEFAULT_TIMEOUT_SECS};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use storyloom_domain::{Confidence, DocumentFormat};

/// Provider identifier recorded on findings
pub const PROVIDER_ID: &str = "vision";

/// Adapter for the image-analysis service
pub struct VisionProvider {
    endpoint: String,
    api_key: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct DescribeRequest {
    document_id: String,
    filename: String,
}

#[derive(Deserialize)]
struct DescribeResponse {
    description: String,
    #[serde(default)]
    subjects: Vec<String>,
    confidence: f64,
}

impl VisionProvider {
    /// Create a new vision adapter
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
impl AnalysisProvider for VisionProvider {
    fn id(&self) -> &str {
        PROVIDER_ID
    }

    async fn analyze(
        &self,
        _text: &str,
        hints: &AnalysisHints,
    ) -> Result<Vec<ProviderFinding>, ProviderError> {
        // Only image documents have anything for this adapter to see
        if hints.format != DocumentFormat::Image {
            return Ok(Vec::new());
        }

        let url = format!("{}/api/describe", self.endpoint);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&DescribeRequest {
                document_id: hints.document_id.to_string(),
                filename: hints.filename.clone(),
            })
            .send()
            .await
            .map_err(|e| ProviderError::Communication(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(ProviderError::Communication(format!("HTTP {}", status)));
        }

        let described: DescribeResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        Ok(vec![ProviderFinding {
            provider: PROVIDER_ID.to_string(),
            payload: FindingPayload::MediaDescription(MediaDescription {
                description: described.description,
                subjects: described.subjects,
            }),
            confidence: Confidence::clamped(described.confidence),
        }])
    }
}
