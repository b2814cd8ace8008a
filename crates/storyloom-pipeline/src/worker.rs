//! Worker pool over the document work queue
//!
//! A fixed set of worker tasks drains a shared, unordered queue of
//! documents-to-process. Documents complete independently in any order;
//! within one document the orchestrator owns the fan-out. Cancelling a
//! job cancels all of its in-flight adapter calls, and pool shutdown
//! cancels everything.

use crate::error::PipelineError;
use crate::orchestrator::Orchestrator;
use crate::PipelineConfig;
use std::sync::Arc;
use storyloom_domain::traits::{ContentStore, DocumentSource};
use storyloom_domain::DocumentId;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// One unit of work for the pool
struct DocumentJob {
    document_id: DocumentId,
    cancel: CancellationToken,
}

/// A pool of document-processing workers
pub struct WorkerPool {
    sender: mpsc::Sender<DocumentJob>,
    shutdown: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Start the pool with the configured number of workers
    pub fn start<S, D>(orchestrator: Arc<Orchestrator<S, D>>, config: &PipelineConfig) -> Self
    where
        S: ContentStore + Send + 'static,
        S::Error: std::fmt::Display,
        D: DocumentSource + Send + Sync + 'static,
        D::Error: std::fmt::Display,
    {
        let (sender, receiver) = mpsc::channel::<DocumentJob>(config.queue_capacity);
        let receiver = Arc::new(tokio::sync::Mutex::new(receiver));
        let shutdown = CancellationToken::new();

        let handles = (0..config.worker_count)
            .map(|worker| {
                let orchestrator = Arc::clone(&orchestrator);
                let receiver = Arc::clone(&receiver);
                let shutdown = shutdown.clone();

                tokio::spawn(async move {
                    info!("Worker {} started", worker);
                    loop {
                        let job = tokio::select! {
                            _ = shutdown.cancelled() => break,
                            job = async { receiver.lock().await.recv().await } => {
                                match job {
                                    Some(job) => job,
                                    None => break,
                                }
                            }
                        };

                        match orchestrator
                            .process_document(job.document_id, &job.cancel)
                            .await
                        {
                            Ok(result) => info!(
                                "Worker {} finished document {} ({} item(s))",
                                worker,
                                job.document_id,
                                result.stories.len() + result.outcomes.len()
                            ),
                            Err(PipelineError::Cancelled) => {
                                info!("Worker {} job {} cancelled", worker, job.document_id)
                            }
                            // The orchestrator already persisted the failure
                            // on the document; nothing to do but log.
                            Err(e) => {
                                error!("Worker {} document {} failed: {}", worker, job.document_id, e)
                            }
                        }
                    }
                    info!("Worker {} stopped", worker);
                })
            })
            .collect();

        Self {
            sender,
            shutdown,
            handles,
        }
    }

    /// Enqueue a document for processing
    ///
    /// Returns the job's cancellation token; cancelling it aborts the
    /// job's adapter calls and discards any partial results.
    pub async fn submit(&self, document_id: DocumentId) -> Result<CancellationToken, PipelineError> {
        let cancel = self.shutdown.child_token();
        self.sender
            .send(DocumentJob {
                document_id,
                cancel: cancel.clone(),
            })
            .await
            .map_err(|_| PipelineError::QueueClosed)?;
        Ok(cancel)
    }

    /// Stop accepting work, cancel in-flight jobs, and join the workers
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        drop(self.sender);
        for handle in self.handles {
            let _ = handle.await;
        }
        info!("Worker pool stopped");
    }
}
