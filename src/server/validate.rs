use super::types::GenerateRequest;
use crate::backend::GenerationRequest;
use crate::config::BackendMode;
use crate::{Error, Result};

/// Checks required fields before any backend call is attempted.
///
/// `prompt` is always required and non-empty; `model` only when the
/// remote backend is selected (the local backend ignores it).
pub fn validate(body: GenerateRequest, mode: BackendMode) -> Result<GenerationRequest> {
    let prompt = body
        .prompt
        .filter(|p| !p.is_empty())
        .ok_or_else(|| Error::validation("missing required field: prompt"))?;

    let model = body.model.filter(|m| !m.is_empty());
    if mode == BackendMode::Remote && model.is_none() {
        return Err(Error::validation("missing required field: model"));
    }

    Ok(GenerationRequest {
        prompt,
        model,
        max_length: body.max_length,
    })
}
