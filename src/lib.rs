//! Label Zoo Gateway
//!
//! Fans texts out to every connected Triton classification model, collects
//! their raw labels and normalizes them into display names and colors for the
//! moderation platform.

pub mod api;
pub mod backend;
pub mod config;
pub mod error;
pub mod gateway;
pub mod queue;
pub mod response;

pub use error::{AppError, Result};

use std::sync::Arc;

use backend::BackendRegistry;
use gateway::Aggregator;
use queue::{DeliveryQueue, DeliveryTask};
use response::Normalizer;

/// Application state shared across all handlers
pub struct AppState {
    pub settings: Arc<config::Settings>,
    pub backend_registry: Arc<BackendRegistry>,
    pub aggregator: Arc<Aggregator>,
    pub normalizer: Arc<Normalizer>,
    pub delivery_queue: Arc<DeliveryQueue>,
}

impl AppState {
    /// Wire the aggregator and the delivery queue around a registry.
    ///
    /// Must be called inside a Tokio runtime; the delivery dispatcher is
    /// spawned here.
    pub fn new(
        settings: config::Settings,
        backend_registry: Arc<BackendRegistry>,
        normalizer: Normalizer,
    ) -> Result<Self> {
        let aggregator = Arc::new(Aggregator::new(
            backend_registry.clone(),
            settings.aggregation.max_concurrent_texts,
        ));
        let normalizer = Arc::new(normalizer);

        let task = Arc::new(DeliveryTask::new(
            aggregator.clone(),
            normalizer.clone(),
            settings.delivery.timeout_ms,
        )?);
        let delivery_queue = Arc::new(DeliveryQueue::start(task, &settings.delivery));

        Ok(Self {
            settings: Arc::new(settings),
            backend_registry,
            aggregator,
            normalizer,
            delivery_queue,
        })
    }
}
