use serde::{Deserialize, Serialize};

/// Inbound body of `POST /generate`. Everything is optional at the wire
/// level so that a missing field surfaces as the gateway's own 400
/// envelope instead of a framework rejection.
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub max_length: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub response: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
