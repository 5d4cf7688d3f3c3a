//! Backend registry for managing connected inference backends

use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{info, warn};

use crate::backend::traits::{BackendInfo, InferenceBackend};
use crate::backend::triton::TritonBackend;
use crate::config::BackendConfig;
use crate::error::{AppError, Result};

/// Registry of inference backends, kept in registration order.
///
/// Mutations are exclusive. Readers get owned snapshots so no network call
/// ever runs under the lock.
pub struct BackendRegistry {
    backends: RwLock<Vec<Arc<dyn InferenceBackend>>>,
}

impl BackendRegistry {
    /// Create a new empty backend registry
    pub fn new() -> Self {
        Self {
            backends: RwLock::new(Vec::new()),
        }
    }

    /// Connect the backends listed in configuration.
    ///
    /// A backend reporting a non-positive batch size aborts startup. Every
    /// other failure is logged and the backend skipped.
    pub async fn connect_from_config(&self, configs: &[BackendConfig]) -> Result<()> {
        for config in configs {
            match self.connect(config).await {
                Ok(()) => {}
                Err(e @ AppError::InvalidBatchSize(_)) => return Err(e),
                Err(e) => {
                    warn!(backend = %config.model_name, error = %e, "Failed to connect backend");
                }
            }
        }

        if self.is_empty() {
            warn!("No inference backends are connected");
        }

        Ok(())
    }

    /// Connect a Triton backend and register it
    pub async fn connect(&self, config: &BackendConfig) -> Result<()> {
        // Checked before connecting so a duplicate never opens a session
        if self.contains(&config.model_name) {
            return Err(AppError::DuplicateBackend(config.model_name.clone()));
        }

        let backend = TritonBackend::connect(config).await?;
        let backend: Arc<dyn InferenceBackend> = Arc::new(backend);

        if let Err(e) = self.add(backend.clone()) {
            backend.close();
            return Err(e);
        }

        Ok(())
    }

    /// Register an already connected backend
    pub fn add(&self, backend: Arc<dyn InferenceBackend>) -> Result<()> {
        let mut backends = self.backends.write();

        if backends.iter().any(|b| b.name() == backend.name()) {
            return Err(AppError::DuplicateBackend(backend.name().to_string()));
        }

        info!(backend = %backend.name(), endpoint = %backend.endpoint(), "Registered backend");
        backends.push(backend);

        Ok(())
    }

    /// Remove a backend and close its session
    pub fn remove(&self, name: &str) -> Result<()> {
        let removed = {
            let mut backends = self.backends.write();
            let index = backends
                .iter()
                .position(|b| b.name() == name)
                .ok_or_else(|| AppError::BackendNotFound(name.to_string()))?;
            backends.remove(index)
        };

        removed.close();
        info!(backend = %name, endpoint = %removed.endpoint(), "Removed backend");

        Ok(())
    }

    /// Model names and endpoints in registration order
    pub fn list(&self) -> Vec<BackendInfo> {
        self.backends.read().iter().map(|b| b.info()).collect()
    }

    /// Consistent view of the registered backends
    pub fn snapshot(&self) -> Vec<Arc<dyn InferenceBackend>> {
        self.backends.read().clone()
    }

    /// Get a backend by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn InferenceBackend>> {
        self.backends.read().iter().find(|b| b.name() == name).cloned()
    }

    /// Close every session and empty the registry
    pub fn close_all(&self) {
        let drained: Vec<_> = self.backends.write().drain(..).collect();
        for backend in drained {
            backend.close();
        }
    }

    /// Get the number of registered backends
    pub fn len(&self) -> usize {
        self.backends.read().len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.backends.read().is_empty()
    }

    /// Check if a backend exists
    pub fn contains(&self, name: &str) -> bool {
        self.backends.read().iter().any(|b| b.name() == name)
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}
