//! Backend traits and shared types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::Result;

/// Registry view of one backend
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
pub struct BackendInfo {
    pub model_name: String,
    pub url: String,
}

/// A classification backend producing raw label tokens for texts
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Model name, unique across the registry
    fn name(&self) -> &str;

    /// Base endpoint of the backend API
    fn endpoint(&self) -> &str;

    /// Largest number of texts accepted by one inference call
    fn max_batch_size(&self) -> usize;

    /// Liveness probe; never fails, returns false on any error
    async fn is_ready(&self) -> bool;

    /// One raw label string per input text, in input order
    async fn predict(&self, texts: &[String]) -> Result<Vec<String>>;

    /// Release the backend session
    fn close(&self);

    fn info(&self) -> BackendInfo {
        BackendInfo {
            model_name: self.name().to_string(),
            url: self.endpoint().to_string(),
        }
    }
}
