mod local;
mod remote;

pub use local::LocalBackend;
pub use remote::RemoteBackend;

use crate::Result;
use async_trait::async_trait;

/// A validated generation request, as handed to a backend.
///
/// `model` is guaranteed non-empty when the remote backend is selected and
/// is ignored by the local backend. `max_length` falls back to the
/// configured default downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub model: Option<String>,
    pub max_length: Option<usize>,
}

/// The subsystem that actually produces generated text.
///
/// Exactly one implementation is constructed at startup and shared,
/// read-only, across requests.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;
}
