use super::{Backend, GenerationRequest};
use crate::{Error, Result, config::RemoteConfig};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Adapter for an Ollama-style generation service.
///
/// One synchronous POST per request; streaming is always disabled, so the
/// upstream answer arrives as a single JSON payload.
pub struct RemoteBackend {
    client: reqwest::Client,
    url: String,
}

#[derive(Debug, Serialize)]
struct UpstreamRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct UpstreamResponse {
    response: Option<String>,
}

impl RemoteBackend {
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

#[async_trait]
impl Backend for RemoteBackend {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let model = request
            .model
            .as_deref()
            .ok_or_else(|| Error::validation("missing required field: model"))?;

        debug!("Forwarding prompt to {} with model {}", self.url, model);

        let body = UpstreamRequest {
            model,
            prompt: &request.prompt,
            stream: false,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::unavailable(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::unavailable(e.to_string()))?;

        if !status.is_success() {
            return Err(Error::Backend {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: UpstreamResponse =
            serde_json::from_str(&text).map_err(|_| Error::Backend {
                status: status.as_u16(),
                body: format!("malformed upstream payload: {}", text),
            })?;

        parsed.response.ok_or_else(|| Error::Backend {
            status: status.as_u16(),
            body: "upstream payload has no response field".to_string(),
        })
    }
}
