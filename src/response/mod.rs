//! Response shaping - label table and prediction normalization

pub mod labels;
pub mod normalize;

pub use labels::{LabelEntry, LabelMapping};
pub use normalize::{NormalizedLabel, Normalizer};
