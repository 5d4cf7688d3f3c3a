//! Normalization of raw backend labels into display-ready predictions

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::config::LabelsConfig;
use crate::error::{AppError, Result};
use crate::response::labels::{LabelEntry, LabelMapping};

/// One display-ready label as consumed by the platform
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
pub struct NormalizedLabel {
    pub prediction: String,
    pub color: String,
}

impl From<&LabelEntry> for NormalizedLabel {
    fn from(entry: &LabelEntry) -> Self {
        Self {
            prediction: entry.display.clone(),
            color: entry.color.clone(),
        }
    }
}

/// Maps raw label tokens through the label table.
///
/// Every text yields at least one label. The irrelevant entry only appears
/// alone, when no other mapped token survived.
#[derive(Debug, Clone)]
pub struct Normalizer {
    mapping: Arc<LabelMapping>,
    separator: String,
    irrelevant_token: String,
    irrelevant_label: NormalizedLabel,
}

impl Normalizer {
    pub fn new(
        mapping: Arc<LabelMapping>,
        separator: impl Into<String>,
        irrelevant_token: impl Into<String>,
    ) -> Result<Self> {
        let separator = separator.into();
        let irrelevant_token = irrelevant_token.into();

        if separator.is_empty() {
            return Err(AppError::Config(config::ConfigError::Message(
                "Label separator cannot be empty".to_string(),
            )));
        }

        let irrelevant_label = mapping
            .get(&irrelevant_token)
            .map(NormalizedLabel::from)
            .ok_or_else(|| {
                AppError::Config(config::ConfigError::Message(format!(
                    "The irrelevant class name '{}' is not in label mapping",
                    irrelevant_token
                )))
            })?;

        Ok(Self {
            mapping,
            separator,
            irrelevant_token,
            irrelevant_label,
        })
    }

    /// Load the mapping file named in the labels config and validate it
    pub fn from_config(config: &LabelsConfig) -> Result<Self> {
        let mapping = LabelMapping::load(&config.mapping_path)?;
        Self::new(
            Arc::new(mapping),
            config.separator.clone(),
            config.irrelevant_class_name.clone(),
        )
    }

    pub fn mapping(&self) -> &LabelMapping {
        &self.mapping
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    pub fn irrelevant_token(&self) -> &str {
        &self.irrelevant_token
    }

    /// Normalize the raw predictions of every text, keeping text order
    pub fn normalize(&self, raw_predictions: &[Vec<String>]) -> Vec<Vec<NormalizedLabel>> {
        raw_predictions
            .iter()
            .map(|raw| self.normalize_one(raw))
            .collect()
    }

    /// Normalize the raw labels of a single text
    pub fn normalize_one(&self, raw: &[String]) -> Vec<NormalizedLabel> {
        let mapped: Vec<(&str, &LabelEntry)> = raw
            .iter()
            .flat_map(|token| token.split(self.separator.as_str()))
            .filter_map(|token| self.mapping.get(token).map(|entry| (token, entry)))
            .collect();

        let relevant: Vec<NormalizedLabel> = mapped
            .into_iter()
            .filter(|(token, _)| *token != self.irrelevant_token)
            .map(|(_, entry)| NormalizedLabel::from(entry))
            .collect();

        if relevant.is_empty() {
            vec![self.irrelevant_label.clone()]
        } else {
            relevant
        }
    }
}
