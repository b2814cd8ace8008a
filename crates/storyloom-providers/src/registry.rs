//! Credential-driven provider registry
//!
//! The registry is built once at process start from whichever
//! credentials are configured and is read-only afterwards, so it can be
//! shared freely across worker tasks without locking.

use crate::{
    AnalysisProvider, CulturalReviewProvider, LanguageModelProvider, ProviderError,
    ResearchProvider, VisionProvider,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Connection details for one analysis backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderEndpoint {
    /// Base URL of the service
    pub endpoint: String,

    /// API credential
    pub api_key: String,

    /// Model name, for backends that take one
    pub model: Option<String>,
}

/// Which analysis backends are configured
///
/// An absent entry disables that adapter; it is never an error. Loadable
/// from TOML so the surrounding deployment owns the actual secrets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderCredentials {
    /// General-purpose language model
    pub language_model: Option<ProviderEndpoint>,

    /// Cultural-sensitivity review service
    pub cultural_review: Option<ProviderEndpoint>,

    /// Research/fact-validation service
    pub research: Option<ProviderEndpoint>,

    /// Image-analysis service
    pub vision: Option<ProviderEndpoint>,
}

impl ProviderCredentials {
    /// Load credentials from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }
}

/// The set of adapters configured at startup
#[derive(Clone)]
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn AnalysisProvider>>,
}

impl ProviderRegistry {
    /// Build the registry from configured credentials
    ///
    /// Each configured backend contributes one adapter; everything else
    /// is simply absent and the orchestrator degrades gracefully with
    /// fewer sources.
    pub fn from_credentials(credentials: &ProviderCredentials) -> Result<Self, ProviderError> {
        let mut providers: Vec<Arc<dyn AnalysisProvider>> = Vec::new();

        if let Some(lm) = &credentials.language_model {
            let model = lm.model.as_deref().unwrap_or("default");
            providers.push(Arc::new(LanguageModelProvider::new(
                &lm.endpoint,
                &lm.api_key,
                model,
            )?));
        }

        if let Some(cr) = &credentials.cultural_review {
            providers.push(Arc::new(CulturalReviewProvider::new(
                &cr.endpoint,
                &cr.api_key,
            )?));
        }

        if let Some(re) = &credentials.research {
            providers.push(Arc::new(ResearchProvider::new(&re.endpoint, &re.api_key)?));
        }

        if let Some(vi) = &credentials.vision {
            providers.push(Arc::new(VisionProvider::new(&vi.endpoint, &vi.api_key)?));
        }

        info!(
            "Provider registry built with {} adapter(s): [{}]",
            providers.len(),
            providers
                .iter()
                .map(|p| p.id())
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(Self { providers })
    }

    /// An empty registry (no configured backends)
    pub fn empty() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Add an already-constructed adapter (tests, custom backends)
    pub fn with_provider(mut self, provider: Arc<dyn AnalysisProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Number of registered adapters
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Whether no adapters are registered
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Iterate over the registered adapters
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn AnalysisProvider>> {
        self.providers.iter()
    }
}
