//! Storyloom Provider Layer
//!
//! Pluggable AI analysis backends behind a single async trait.
//!
//! # Architecture
//!
//! Every external analysis service is wrapped in an adapter implementing
//! [`AnalysisProvider`]. Adapters are registered at process start based
//! on which credentials are configured (see [`ProviderRegistry`]); an
//! absent credential simply omits that adapter, it is never an error.
//!
//! # Providers
//!
//! - [`MockProvider`]: deterministic mock for testing
//! - [`LanguageModelProvider`]: general-purpose extraction via an LLM API
//! - [`CulturalReviewProvider`]: specialized cultural-sensitivity reviewer
//! - [`ResearchProvider`]: fact-validation / corroboration service
//! - [`VisionProvider`]: image analysis for media documents
//!
//! Adapters make exactly one timeout-bounded attempt per call; retry
//! policy belongs to the queue layer outside this crate.

#![warn(missing_docs)]

mod cultural;
mod language;
mod parser;
mod registry;
mod research;
mod types;
mod vision;

pub use cultural::CulturalReviewProvider;
pub use language::LanguageModelProvider;
pub use registry::{ProviderCredentials, ProviderEndpoint, ProviderRegistry};
pub use research::ResearchProvider;
pub use types::{
    AnalysisHints, FindingPayload, ItemCandidate, MediaDescription, NarrativeAnalysis,
    ProviderFinding,
};
pub use vision::VisionProvider;

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

/// Default timeout for provider HTTP requests (seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Errors that can occur during provider calls
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from the backend
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimited,

    /// Backend reported itself unavailable
    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    /// Generic error
    #[error("Provider error: {0}")]
    Other(String),
}

/// A uniform wrapper around one external AI/vision analysis backend
///
/// Implementations must be cheap to share (`Send + Sync`); the registry
/// is read-only after startup and shared across worker tasks.
#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    /// Stable identifier of this provider (recorded on findings)
    fn id(&self) -> &str;

    /// Analyze normalized document text and return typed findings
    ///
    /// A failure yields zero findings from this provider and is logged
    /// by the orchestrator; it never aborts the whole orchestration.
    async fn analyze(
        &self,
        text: &str,
        hints: &AnalysisHints,
    ) -> Result<Vec<ProviderFinding>, ProviderError>;
}

/// Mock provider for deterministic testing
///
/// Returns pre-configured findings without any network calls, with
/// optional artificial delay and failure injection.
///
/// # Examples
///
/// ```
/// use storyloom_providers::{AnalysisProvider, MockProvider};
///
/// let provider = MockProvider::new("mock");
/// assert_eq!(provider.id(), "mock");
/// assert_eq!(provider.call_count(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    id: String,
    findings: Vec<ProviderFinding>,
    delay: Option<Duration>,
    fail: bool,
    call_count: Arc<Mutex<usize>>,
}

impl MockProvider {
    /// Create a mock that returns no findings
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            findings: Vec::new(),
            delay: None,
            fail: false,
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Configure the findings returned on every call
    ///
    /// The provider field of each finding is overwritten with this
    /// mock's id.
    pub fn with_findings(mut self, findings: Vec<ProviderFinding>) -> Self {
        self.findings = findings;
        self
    }

    /// Add an artificial delay before responding (for timeout tests)
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Configure every call to fail
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Number of times analyze was called
    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }
}

#[async_trait]
impl AnalysisProvider for MockProvider {
    fn id(&self) -> &str {
        &self.id
    }

    async fn analyze(
        &self,
        _text: &str,
        _hints: &AnalysisHints,
    ) -> Result<Vec<ProviderFinding>, ProviderError> {
        *self.call_count.lock().unwrap() += 1;

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail {
            return Err(ProviderError::Other("Mock failure".to_string()));
        }

        Ok(self
            .findings
            .iter()
            .cloned()
            .map(|mut f| {
                f.provider = self.id.clone();
                f
            })
            .collect())
    }
}
