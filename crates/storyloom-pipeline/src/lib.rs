//! Storyloom Extraction Pipeline
//!
//! Turns stored source documents into confidence-scored Story and
//! Outcome items, gated behind the cultural governance workflow.
//!
//! # Data flow
//!
//! ```text
//! Document -> TextExtractor -> Orchestrator (provider fan-out/fan-in)
//!          -> merge + confidence floor -> SensitivityClassifier
//!          -> items + auto-created Consultations -> ContentStore
//! ```
//!
//! The [`ContentService`] facade exposes the inbound operations consumed
//! by the surrounding layers: document processing, consultation
//! management, publish eligibility, and protocol validation. The
//! [`WorkerPool`] runs document jobs concurrently over a shared queue.

#![warn(missing_docs)]

mod config;
mod error;
mod merge;
mod orchestrator;
mod service;
mod types;
mod worker;

pub use config::PipelineConfig;
pub use error::PipelineError;
pub use merge::{merge_findings, MergeOutcome, MergedCandidate};
pub use orchestrator::Orchestrator;
pub use service::ContentService;
pub use types::{ProcessingMetadata, ProcessingResult};
pub use worker::WorkerPool;
