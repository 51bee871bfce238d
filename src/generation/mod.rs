mod model;
mod pool;
pub mod sampling;

pub use model::CausalLmGenerator;
pub use pool::WorkerPool;

use crate::Result;

/// The model library seam: extend a prompt by up to `max_new_tokens`
/// tokens and return the full text, prompt included.
///
/// Implementations block the calling thread for the whole generation, so
/// they are only ever invoked from the worker pool.
pub trait TextGenerator: Send + Sync {
    fn generate(&self, prompt: &str, max_new_tokens: usize) -> Result<String>;
}
