//! Triton inference server backend (KServe v2 REST protocol)

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::backend::traits::InferenceBackend;
use crate::config::BackendConfig;
use crate::error::{AppError, Result};

const INPUT_NAME: &str = "text_input";
const BYTES_DATATYPE: &str = "BYTES";

/// Inference request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferRequest {
    pub inputs: Vec<InferTensor>,
}

/// Named tensor as sent to and returned by `/infer`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferTensor {
    pub name: String,
    pub shape: Vec<usize>,
    pub datatype: String,
    pub data: Vec<String>,
}

/// Inference response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferResponse {
    pub outputs: Vec<InferTensor>,
}

/// Subset of the model configuration we depend on
#[derive(Debug, Clone, Deserialize)]
struct ModelConfig {
    max_batch_size: Option<i64>,
}

impl InferRequest {
    pub fn for_texts(texts: &[String]) -> Self {
        Self {
            inputs: vec![InferTensor {
                name: INPUT_NAME.to_string(),
                shape: vec![texts.len(), 1],
                datatype: BYTES_DATATYPE.to_string(),
                data: texts.to_vec(),
            }],
        }
    }
}

/// Client for one model served by a Triton server
pub struct TritonBackend {
    model_name: String,
    base: String,
    max_batch_size: usize,
    session: Mutex<Option<Client>>,
}

impl TritonBackend {
    /// Open a session, probe liveness and discover the model's max batch size
    pub async fn connect(config: &BackendConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        let base = config.base_url();

        let response = client.get(&base).send().await.map_err(|e| {
            AppError::Connection(format!("{} is unreachable: {}", base, e))
        })?;
        if !response.status().is_success() {
            return Err(AppError::Connection(format!(
                "{} answered liveness probe with {}",
                base,
                response.status()
            )));
        }

        let max_batch_size = Self::discover_batch_size(&client, &base, &config.model_name).await?;

        info!(
            backend = %config.model_name,
            endpoint = %base,
            max_batch_size,
            "Connected to Triton model"
        );

        Ok(Self {
            model_name: config.model_name.clone(),
            base,
            max_batch_size,
            session: Mutex::new(Some(client)),
        })
    }

    async fn discover_batch_size(client: &Client, base: &str, model_name: &str) -> Result<usize> {
        let url = format!("{}/models/{}/config", base, model_name);

        let response = client.get(&url).send().await.map_err(|e| {
            AppError::Connection(format!("Failed to query config of '{}': {}", model_name, e))
        })?;
        if !response.status().is_success() {
            return Err(AppError::BackendConfig(format!(
                "Config of '{}' unavailable: {}",
                model_name,
                response.status()
            )));
        }

        let model_config = response.json::<ModelConfig>().await.map_err(|e| {
            AppError::BackendConfig(format!("Invalid config of '{}': {}", model_name, e))
        })?;

        match model_config.max_batch_size {
            Some(size) if size > 0 => Ok(size as usize),
            Some(size) => Err(AppError::InvalidBatchSize(format!(
                "Model '{}' reports non-positive max_batch_size {}",
                model_name, size
            ))),
            None => Err(AppError::BackendConfig(format!(
                "Model '{}' does not expose max_batch_size",
                model_name
            ))),
        }
    }

    fn session(&self) -> Result<Client> {
        self.session
            .lock()
            .clone()
            .ok_or_else(|| AppError::Backend(format!("Session of '{}' is closed", self.model_name)))
    }

    /// Send one chunk no larger than the max batch size
    async fn infer_chunk(&self, client: &Client, chunk: &[String]) -> Result<Vec<String>> {
        let url = format!("{}/models/{}/infer", self.base, self.model_name);

        let response = client
            .post(&url)
            .json(&InferRequest::for_texts(chunk))
            .send()
            .await
            .map_err(|e| {
                warn!(backend = %self.model_name, error = %e, "Inference request failed");
                AppError::Backend(format!("{}: {}", self.model_name, e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(backend = %self.model_name, status = %status, "Inference call rejected");
            return Err(AppError::Backend(format!(
                "{} returned {}: {}",
                self.model_name, status, body
            )));
        }

        let result = response.json::<InferResponse>().await.map_err(|e| {
            error!(backend = %self.model_name, error = %e, "Failed to parse inference response");
            AppError::Backend(format!("Failed to parse response: {}", e))
        })?;

        let labels = result
            .outputs
            .into_iter()
            .next()
            .map(|output| output.data)
            .ok_or_else(|| AppError::Backend(format!("{} returned no outputs", self.model_name)))?;

        if labels.len() != chunk.len() {
            return Err(AppError::Backend(format!(
                "{} returned {} labels for {} texts",
                self.model_name,
                labels.len(),
                chunk.len()
            )));
        }

        Ok(labels)
    }
}

#[async_trait]
impl InferenceBackend for TritonBackend {
    fn name(&self) -> &str {
        &self.model_name
    }

    fn endpoint(&self) -> &str {
        &self.base
    }

    fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    async fn is_ready(&self) -> bool {
        let Ok(client) = self.session() else {
            return false;
        };

        match client.get(format!("{}/health/ready", self.base)).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(backend = %self.model_name, error = %e, "Readiness probe failed");
                false
            }
        }
    }

    async fn predict(&self, texts: &[String]) -> Result<Vec<String>> {
        let client = self.session()?;
        let mut labels = Vec::with_capacity(texts.len());

        for chunk in texts.chunks(self.max_batch_size) {
            labels.extend(self.infer_chunk(&client, chunk).await?);
        }

        debug!(backend = %self.model_name, texts = texts.len(), "Prediction completed");
        Ok(labels)
    }

    fn close(&self) {
        if self.session.lock().take().is_some() {
            info!(backend = %self.model_name, endpoint = %self.base, "Closed Triton session");
        }
    }
}
