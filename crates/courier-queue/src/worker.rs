//! Worker host: a typed shim over the engine's consumption interface.
//!
//! The host owns a handler map keyed by job name and a polling loop over an
//! injected [`QueueConsumer`]. Handlers are typed; the host deserializes the
//! delivered payload, runs the handler, and reports `complete`/`fail` back to
//! the engine. Retry, backoff, and stalled-job detection all stay on the
//! engine side of the seam.

use crate::client::{DeliveredJob, QueueConsumer};
use crate::config::WorkerConfig;
use crate::error::{QueueError, QueueResult};
use crate::metrics;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use courier_core::JobId;
use futures::future::BoxFuture;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Execution context handed to a job handler.
#[derive(Debug, Clone)]
pub struct JobContext {
    /// Engine-assigned job ID.
    pub job_id: JobId,

    /// Queue the job came from.
    pub queue: String,

    /// Attempt number (1-based).
    pub attempt: u32,

    /// ID of the worker host processing the job.
    pub worker_id: String,

    /// When the host received the job.
    pub received_at: DateTime<Utc>,
}

/// Trait for typed job handlers.
#[async_trait]
pub trait JobHandler: Send + Sync + 'static {
    /// Input payload type, deserialized from the delivered job.
    type Input: DeserializeOwned + Send;

    /// Output type, serialized and reported to the engine on completion.
    type Output: Serialize + Send;

    /// Job name this handler consumes.
    const NAME: &'static str;

    /// Processes one job.
    async fn handle(&self, input: Self::Input, ctx: JobContext) -> QueueResult<Self::Output>;
}

type BoxedHandler = Box<
    dyn Fn(DeliveredJob, JobContext) -> BoxFuture<'static, QueueResult<Option<serde_json::Value>>>
        + Send
        + Sync,
>;

/// Host that pulls jobs from the engine and dispatches them to handlers.
pub struct WorkerHost {
    id: String,
    consumer: Arc<dyn QueueConsumer>,
    config: WorkerConfig,
    handlers: Arc<RwLock<HashMap<String, BoxedHandler>>>,
    shutdown_tx: broadcast::Sender<()>,
    running: Arc<AtomicBool>,
    jobs_processed: Arc<AtomicU64>,
    jobs_failed: Arc<AtomicU64>,
}

impl WorkerHost {
    /// Creates a worker host over an injected consumer adapter.
    pub fn new(consumer: Arc<dyn QueueConsumer>, config: WorkerConfig) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            id: format!("worker-{}", Uuid::new_v4()),
            consumer,
            config,
            handlers: Arc::new(RwLock::new(HashMap::new())),
            shutdown_tx,
            running: Arc::new(AtomicBool::new(false)),
            jobs_processed: Arc::new(AtomicU64::new(0)),
            jobs_failed: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Registers a typed handler under its job name.
    pub fn register<H: JobHandler>(&self, handler: H) {
        let handler = Arc::new(handler);
        let boxed: BoxedHandler = Box::new(move |job, ctx| {
            let handler = handler.clone();
            Box::pin(async move {
                let input: H::Input = serde_json::from_value(job.payload)?;
                let output = handler.handle(input, ctx).await?;
                Ok(Some(serde_json::to_value(output)?))
            })
        });

        self.handlers.write().insert(H::NAME.to_string(), boxed);
        info!(job_name = H::NAME, "Registered job handler");
    }

    /// Polls once: fetches the next job, dispatches it, reports the outcome.
    ///
    /// Returns `Ok(true)` when a job was processed (successfully or not) and
    /// `Ok(false)` when the queues were idle.
    pub async fn process_next(&self) -> QueueResult<bool> {
        let queues: Vec<&str> = self.config.queues.iter().map(String::as_str).collect();

        let Some(job) = self.consumer.next_job(&queues, &self.id).await? else {
            return Ok(false);
        };

        let ctx = JobContext {
            job_id: job.job_id.clone(),
            queue: job.queue.clone(),
            attempt: job.attempt,
            worker_id: self.id.clone(),
            received_at: Utc::now(),
        };
        let job_id = job.job_id.clone();
        let job_name = job.name.clone();

        debug!(job_id = %job_id, job_name = %job_name, "Processing job");

        let handler_future = {
            let handlers = self.handlers.read();
            handlers.get(&job_name).map(|handler| handler(job, ctx))
        };

        let Some(future) = handler_future else {
            let err = QueueError::Configuration(format!("No handler for job type: {job_name}"));
            error!(job_name = %job_name, "No handler registered for job type");
            self.consumer.fail(&job_id, &err).await?;
            self.jobs_failed.fetch_add(1, Ordering::Relaxed);
            metrics::job_failed(&job_name);
            return Ok(true);
        };

        match future.await {
            Ok(result) => {
                debug!(job_id = %job_id, "Job completed");
                if let Err(e) = self.consumer.complete(&job_id, result).await {
                    error!(job_id = %job_id, error = %e, "Failed to acknowledge job");
                }
                self.jobs_processed.fetch_add(1, Ordering::Relaxed);
                metrics::job_processed(&job_name);
            }
            Err(e) => {
                warn!(job_id = %job_id, error = %e, "Job handler failed");
                if let Err(e) = self.consumer.fail(&job_id, &e).await {
                    error!(job_id = %job_id, error = %e, "Failed to report job failure");
                }
                self.jobs_failed.fetch_add(1, Ordering::Relaxed);
                metrics::job_failed(&job_name);
            }
        }

        Ok(true)
    }

    /// Runs the polling loop until [`stop`](Self::stop) is called.
    pub async fn run(&self) -> QueueResult<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(QueueError::Worker("Worker host already running".to_string()));
        }

        info!(
            worker_id = %self.id,
            queues = ?self.config.queues,
            "Starting worker host"
        );

        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let poll_interval = self.config.poll_interval();

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!(worker_id = %self.id, "Received shutdown signal");
                    break;
                }

                result = self.process_next() => {
                    match result {
                        // Idle: wait before polling again.
                        Ok(false) => tokio::time::sleep(poll_interval).await,
                        Ok(true) => {}
                        Err(e) => {
                            error!(worker_id = %self.id, error = %e, "Failed to poll for jobs");
                            tokio::time::sleep(poll_interval).await;
                        }
                    }
                }
            }
        }

        self.running.store(false, Ordering::SeqCst);
        info!(
            worker_id = %self.id,
            processed = self.jobs_processed.load(Ordering::Relaxed),
            failed = self.jobs_failed.load(Ordering::Relaxed),
            "Worker host stopped"
        );

        Ok(())
    }

    /// Signals the polling loop to stop.
    pub fn stop(&self) {
        info!(worker_id = %self.id, "Stopping worker host...");
        let _ = self.shutdown_tx.send(());
    }

    /// True while the polling loop is active.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Number of jobs processed successfully.
    pub fn jobs_processed(&self) -> u64 {
        self.jobs_processed.load(Ordering::Relaxed)
    }

    /// Number of jobs that failed.
    pub fn jobs_failed(&self) -> u64 {
        self.jobs_failed.load(Ordering::Relaxed)
    }

    /// Worker host ID.
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl std::fmt::Debug for WorkerHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerHost")
            .field("id", &self.id)
            .field("queues", &self.config.queues)
            .finish_non_exhaustive()
    }
}
