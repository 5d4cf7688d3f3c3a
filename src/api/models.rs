//! API request and response models

use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::config::BackendConfig;
use crate::queue::BatchItem;

/// Plain list of texts to classify
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct TextList {
    pub text_list: Vec<String>,
}

/// Batch submitted by the platform
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ServiceInput {
    pub texts: Vec<BatchItem>,
}

/// Acknowledgement of an accepted batch
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct BatchAccepted {
    pub status: String,
}

impl BatchAccepted {
    pub fn received() -> Self {
        Self {
            status: "texts received".to_string(),
        }
    }
}

/// Address of a Triton model to connect
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct RegisterBackendRequest {
    /// Base url without port
    pub url: String,

    /// Port, as a number or a numeric string
    #[serde(deserialize_with = "deserialize_port")]
    #[schema(value_type = u16)]
    pub port: u16,

    pub model_name: String,

    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl From<RegisterBackendRequest> for BackendConfig {
    fn from(request: RegisterBackendRequest) -> Self {
        let mut config = BackendConfig::new(request.model_name, request.url, request.port);
        if let Some(timeout_ms) = request.timeout_ms {
            config.timeout_ms = timeout_ms;
        }
        config
    }
}

fn deserialize_port<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Number(u16),
        Text(String),
    }

    match Port::deserialize(deserializer)? {
        Port::Number(port) => Ok(port),
        Port::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid port '{}'", text))),
    }
}

/// Query of the delivery endpoint update
#[derive(Debug, Clone, Deserialize, Serialize, IntoParams)]
pub struct DeliveryEndpointParams {
    /// New platform endpoint; empty disables delivery
    #[serde(default)]
    pub new_endpoint: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct DeliveryEndpointResponse {
    pub endpoint: Option<String>,
}

/// Health check response
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub backends: BackendHealthSummary,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct BackendHealthSummary {
    pub total: usize,
    pub ready: usize,
}

/// Generic success response
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct SuccessResponse {
    pub success: bool,
    pub message: String,
}
