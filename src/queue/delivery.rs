//! Background processing of submitted batches.
//!
//! Submitted batches are queued and handled by a dispatcher task. Each job
//! aggregates predictions, normalizes them and, when a platform endpoint was
//! set at submission time, posts the result there once. Failures are logged
//! and never reach the submitter.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, error, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::DeliveryConfig;
use crate::error::{AppError, Result};
use crate::gateway::Aggregator;
use crate::response::{NormalizedLabel, Normalizer};

/// A text to classify, identified by the platform's id
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
pub struct BatchItem {
    pub text_id: String,
    pub text: String,
}

/// Payload posted to the platform
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DeliveryEnvelope {
    pub texts: Vec<DeliveredText>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DeliveredText {
    pub id: String,
    pub predictions: Vec<NormalizedLabel>,
}

impl DeliveryEnvelope {
    /// Pair each item id with its normalized predictions
    pub fn build(items: &[BatchItem], predictions: Vec<Vec<NormalizedLabel>>) -> Self {
        Self {
            texts: items
                .iter()
                .zip(predictions)
                .map(|(item, predictions)| DeliveredText {
                    id: item.text_id.clone(),
                    predictions,
                })
                .collect(),
        }
    }
}

/// One submitted batch
#[derive(Debug, Clone)]
pub struct DeliveryJob {
    pub id: Uuid,
    pub submitted_at: DateTime<Utc>,
    pub items: Vec<BatchItem>,
    pub endpoint: Option<String>,
}

impl DeliveryJob {
    pub fn new(items: Vec<BatchItem>, endpoint: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            submitted_at: Utc::now(),
            items,
            endpoint,
        }
    }
}

/// Aggregate, normalize and deliver one job
pub struct DeliveryTask {
    aggregator: Arc<Aggregator>,
    normalizer: Arc<Normalizer>,
    client: Client,
}

impl DeliveryTask {
    pub fn new(
        aggregator: Arc<Aggregator>,
        normalizer: Arc<Normalizer>,
        timeout_ms: u64,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            aggregator,
            normalizer,
            client,
        })
    }

    /// Run the job and return the envelope that was (or would have been) sent
    pub async fn run(&self, job: &DeliveryJob) -> Result<DeliveryEnvelope> {
        let texts: Vec<String> = job.items.iter().map(|item| item.text.clone()).collect();

        let raw = self.aggregator.predict_all(&texts).await?;
        let envelope = DeliveryEnvelope::build(&job.items, self.normalizer.normalize(&raw));

        info!(
            job_id = %job.id,
            texts = envelope.texts.len(),
            "Batch predictions collected"
        );
        debug!(job_id = %job.id, envelope = ?envelope, "Batch envelope");

        if let Some(endpoint) = &job.endpoint {
            self.deliver(endpoint, &envelope).await?;
            info!(job_id = %job.id, endpoint = %endpoint, "Batch predictions delivered");
        }

        Ok(envelope)
    }

    /// Single POST of the envelope; no retries
    pub async fn deliver(&self, endpoint: &str, envelope: &DeliveryEnvelope) -> Result<()> {
        let response = self
            .client
            .post(endpoint)
            .json(envelope)
            .send()
            .await
            .map_err(|e| AppError::Delivery(format!("{}: {}", endpoint, e)))?;

        if !response.status().is_success() {
            return Err(AppError::Delivery(format!(
                "{} answered {}",
                endpoint,
                response.status()
            )));
        }

        Ok(())
    }

    async fn process(&self, job: DeliveryJob) {
        let waited_ms = (Utc::now() - job.submitted_at).num_milliseconds();
        debug!(job_id = %job.id, waited_ms, "Processing batch");

        if let Err(e) = self.run(&job).await {
            error!(
                job_id = %job.id,
                texts = job.items.len(),
                error = %e,
                "Batch processing failed"
            );
        }
    }
}

/// Queue accepting batches for background processing
pub struct DeliveryQueue {
    sender: mpsc::Sender<DeliveryJob>,
    endpoint: RwLock<Option<String>>,
}

impl DeliveryQueue {
    /// Create the queue and spawn its dispatcher on the current runtime
    pub fn start(task: Arc<DeliveryTask>, config: &DeliveryConfig) -> Self {
        let (sender, receiver) = mpsc::channel(config.queue_capacity.max(1));
        let permits = Arc::new(Semaphore::new(config.max_concurrent_jobs.max(1)));

        tokio::spawn(run_dispatcher(receiver, task, permits));

        Self {
            sender,
            endpoint: RwLock::new(normalize_endpoint(config.endpoint.clone())),
        }
    }

    /// Enqueue a batch without waiting for it to be processed
    pub fn submit(&self, items: Vec<BatchItem>) -> Result<Uuid> {
        let job = DeliveryJob::new(items, self.endpoint());
        let id = job.id;
        let texts = job.items.len();

        self.sender.try_send(job).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => AppError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => {
                AppError::Internal("Delivery queue is closed".to_string())
            }
        })?;

        debug!(job_id = %id, texts, "Batch queued");
        Ok(id)
    }

    /// Current platform endpoint
    pub fn endpoint(&self) -> Option<String> {
        self.endpoint.read().clone()
    }

    /// Replace the platform endpoint; an empty value disables delivery
    pub fn set_endpoint(&self, endpoint: Option<String>) {
        let endpoint = normalize_endpoint(endpoint);
        info!(endpoint = ?endpoint, "Platform endpoint updated");
        *self.endpoint.write() = endpoint;
    }
}

fn normalize_endpoint(endpoint: Option<String>) -> Option<String> {
    endpoint
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
}

async fn run_dispatcher(
    mut receiver: mpsc::Receiver<DeliveryJob>,
    task: Arc<DeliveryTask>,
    permits: Arc<Semaphore>,
) {
    while let Some(job) = receiver.recv().await {
        let permit = match permits.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                warn!("Delivery semaphore closed, stopping dispatcher");
                break;
            }
        };

        let task = task.clone();
        tokio::spawn(async move {
            let _permit = permit;
            task.process(job).await;
        });
    }

    debug!("Delivery dispatcher stopped");
}
