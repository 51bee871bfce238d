use super::{Backend, GenerationRequest};
use crate::generation::{TextGenerator, WorkerPool};
use crate::{Result, config::LocalConfig};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// In-process inference behind a bounded worker pool: at most
/// `config.workers` model invocations run at once, later submissions
/// queue until a worker frees up.
pub struct LocalBackend {
    pool: WorkerPool,
    generator: Arc<dyn TextGenerator>,
    batch_size: usize,
    default_max_length: usize,
    early_stop: bool,
}

impl LocalBackend {
    pub fn new(generator: Arc<dyn TextGenerator>, config: &LocalConfig) -> Self {
        Self {
            pool: WorkerPool::new(config.workers),
            generator,
            batch_size: config.batch_size.max(1),
            default_max_length: config.default_max_length,
            early_stop: config.early_stop,
        }
    }
}

#[async_trait]
impl Backend for LocalBackend {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let generator = Arc::clone(&self.generator);
        let prompt = request.prompt.clone();
        let max_length = request.max_length.unwrap_or(self.default_max_length);
        let batch_size = self.batch_size;
        let early_stop = self.early_stop;

        debug!("Queueing local generation of up to {} tokens", max_length);

        self.pool
            .run(move || generate_chunked(generator.as_ref(), &prompt, max_length, batch_size, early_stop))
            .await
    }
}

/// Fixed-size chunked generation: each chunk feeds the accumulated text
/// back in as context and appends only the newly produced suffix. The
/// loop ends once `max_length` tokens have been requested in total; with
/// `early_stop` it also ends when a chunk yields no new text.
pub(crate) fn generate_chunked(
    generator: &dyn TextGenerator,
    prompt: &str,
    max_length: usize,
    batch_size: usize,
    early_stop: bool,
) -> Result<String> {
    let mut context = prompt.to_string();
    let mut output = String::new();
    let mut requested = 0;

    while requested < max_length {
        let chunk = batch_size.min(max_length - requested);
        let full = generator.generate(&context, chunk)?;

        let suffix = match full.strip_prefix(context.as_str()) {
            Some(s) => s.to_string(),
            // Decode round-trips can reshape the context slightly; fall
            // back to a character offset.
            None => full.chars().skip(context.chars().count()).collect(),
        };

        output.push_str(&suffix);
        context = full;
        requested += chunk;

        if early_stop && suffix.is_empty() {
            break;
        }
    }

    Ok(output)
}
