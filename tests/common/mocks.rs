use async_trait::async_trait;
use gengate_rust::{
    Error, Result,
    backend::{Backend, GenerationRequest},
};
use std::sync::{Arc, Mutex};

/// Mock backend for testing: hands out queued responses and records every
/// request it receives.
#[derive(Debug)]
pub struct MockBackend {
    pub responses: Arc<Mutex<Vec<String>>>,
    pub requests: Arc<Mutex<Vec<GenerationRequest>>>,
    pub error: Option<Error>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            error: None,
        }
    }

    pub fn with_responses(self, responses: Vec<&str>) -> Self {
        *self.responses.lock().unwrap() = responses.into_iter().map(str::to_string).collect();
        self
    }

    pub fn with_error(mut self, error: Error) -> Self {
        self.error = Some(error);
        self
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request.clone());

        if let Some(ref error) = self.error {
            return Err(clone_error(error));
        }

        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Err(Error::inference("no more mock responses available"));
        }

        Ok(responses.remove(0))
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

// Error carries non-clonable variants; the mocks only ever hold the
// message-bearing kinds.
fn clone_error(error: &Error) -> Error {
    match error {
        Error::Validation(msg) => Error::Validation(msg.clone()),
        Error::BackendUnavailable(msg) => Error::BackendUnavailable(msg.clone()),
        Error::Backend { status, body } => Error::Backend {
            status: *status,
            body: body.clone(),
        },
        Error::Inference(msg) => Error::Inference(msg.clone()),
        other => Error::internal(other.to_string()),
    }
}
