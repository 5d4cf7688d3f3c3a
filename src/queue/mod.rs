//! Queue module - background batch processing and delivery

pub mod delivery;

pub use delivery::{
    BatchItem, DeliveredText, DeliveryEnvelope, DeliveryJob, DeliveryQueue, DeliveryTask,
};
