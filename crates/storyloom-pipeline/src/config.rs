//! Configuration for the pipeline

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the extraction pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Candidates with aggregate confidence strictly below this floor
    /// are discarded before persistence
    pub confidence_floor: f64,

    /// Maximum time for a single provider call (seconds)
    pub provider_timeout_secs: u64,

    /// Maximum extracted text length (characters); longer documents are
    /// truncated, not rejected
    pub max_text_chars: usize,

    /// Number of concurrent document workers
    pub worker_count: usize,

    /// Capacity of the document work queue
    pub queue_capacity: usize,
}

impl PipelineConfig {
    /// Get the provider timeout as a Duration
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.confidence_floor) {
            return Err("confidence_floor must be in [0.0, 1.0]".to_string());
        }
        if self.provider_timeout_secs == 0 {
            return Err("provider_timeout_secs must be greater than 0".to_string());
        }
        if self.max_text_chars == 0 {
            return Err("max_text_chars must be greater than 0".to_string());
        }
        if self.worker_count == 0 {
            return Err("worker_count must be greater than 0".to_string());
        }
        if self.queue_capacity == 0 {
            return Err("queue_capacity must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Strict preset: higher floor, shorter provider timeouts
    pub fn strict() -> Self {
        Self {
            confidence_floor: 0.8,
            provider_timeout_secs: 20,
            ..Self::default()
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

impl Default for PipelineConfig {
    /// Default configuration with balanced settings
    fn default() -> Self {
        Self {
            confidence_floor: 0.7,
            provider_timeout_secs: 60,
            max_text_chars: 50_000,
            worker_count: 4,
            queue_capacity: 64,
        }
    }
}
