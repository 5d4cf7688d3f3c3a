//! Backend module - traits, Triton client and registry

pub mod registry;
pub mod traits;
pub mod triton;

pub use registry::BackendRegistry;
pub use traits::{BackendInfo, InferenceBackend};
pub use triton::TritonBackend;
