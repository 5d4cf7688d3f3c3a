//! Label mapping table loaded from configuration

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::{AppError, Result};

/// Display name and color code for one raw label token
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelEntry {
    pub display: String,
    pub color: String,
}

impl LabelEntry {
    pub fn new(display: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            display: display.into(),
            color: color.into(),
        }
    }
}

/// Accepted YAML shapes: `token: [display, color]` or `token: {display, color}`
#[derive(Deserialize)]
#[serde(untagged)]
enum LabelValue {
    Pair(String, String),
    Table { display: String, color: String },
}

impl From<LabelValue> for LabelEntry {
    fn from(value: LabelValue) -> Self {
        match value {
            LabelValue::Pair(display, color) | LabelValue::Table { display, color } => {
                LabelEntry { display, color }
            }
        }
    }
}

/// Immutable table keyed by raw label token
#[derive(Debug, Clone, Default)]
pub struct LabelMapping {
    entries: HashMap<String, LabelEntry>,
}

impl LabelMapping {
    pub fn new(entries: HashMap<String, LabelEntry>) -> Self {
        Self { entries }
    }

    /// Load the mapping from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(config::ConfigError::Message(format!(
                "Failed to read label mapping {}: {}",
                path.display(),
                e
            )))
        })?;

        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let raw: HashMap<String, LabelValue> = serde_yaml::from_str(content).map_err(|e| {
            AppError::Config(config::ConfigError::Message(format!(
                "Failed to parse label mapping: {}",
                e
            )))
        })?;

        Ok(Self::new(
            raw.into_iter()
                .map(|(token, value)| (token, value.into()))
                .collect(),
        ))
    }

    pub fn get(&self, token: &str) -> Option<&LabelEntry> {
        self.entries.get(token)
    }

    pub fn contains(&self, token: &str) -> bool {
        self.entries.contains_key(token)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, LabelEntry)> for LabelMapping {
    fn from_iter<I: IntoIterator<Item = (String, LabelEntry)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
