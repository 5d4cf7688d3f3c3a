//! Gateway module - prediction fan-out across backends

pub mod aggregator;

pub use aggregator::Aggregator;
