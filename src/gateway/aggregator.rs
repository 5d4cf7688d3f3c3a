//! Fan-out of texts to every registered backend

use futures::future::try_join_all;
use futures::{stream, StreamExt, TryStreamExt};
use std::sync::Arc;
use tracing::debug;

use crate::backend::{BackendRegistry, InferenceBackend};
use crate::error::Result;

/// Collects raw predictions from all registered backends
pub struct Aggregator {
    registry: Arc<BackendRegistry>,
    max_concurrent_texts: usize,
}

impl Aggregator {
    pub fn new(registry: Arc<BackendRegistry>, max_concurrent_texts: usize) -> Self {
        Self {
            registry,
            max_concurrent_texts: max_concurrent_texts.max(1),
        }
    }

    pub fn registry(&self) -> &Arc<BackendRegistry> {
        &self.registry
    }

    /// One raw label list per text, backends concatenated in registry order.
    ///
    /// The registry is read once per call. Any backend failure fails the
    /// whole aggregation.
    pub async fn predict_all(&self, texts: &[String]) -> Result<Vec<Vec<String>>> {
        let backends: Arc<[Arc<dyn InferenceBackend>]> = self.registry.snapshot().into();

        if backends.is_empty() {
            debug!(texts = texts.len(), "No backends registered, returning empty predictions");
            return Ok(vec![Vec::new(); texts.len()]);
        }

        // Owned futures keep the stream Send for spawned callers
        let per_text: Vec<_> = texts
            .iter()
            .cloned()
            .map(|text| {
                let backends = backends.clone();
                async move { predict_text(&backends, text).await }
            })
            .collect();

        stream::iter(per_text)
            .buffered(self.max_concurrent_texts)
            .try_collect()
            .await
    }
}

async fn predict_text(backends: &[Arc<dyn InferenceBackend>], text: String) -> Result<Vec<String>> {
    let single = [text];
    let per_backend = try_join_all(backends.iter().map(|backend| backend.predict(&single))).await?;

    Ok(per_backend.into_iter().flatten().collect())
}
