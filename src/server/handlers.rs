use super::types::{ErrorResponse, GenerateRequest, GenerateResponse};
use super::validate;
use crate::Error;
use crate::backend::Backend;
use crate::config::BackendMode;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, Json},
};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn Backend>,
    pub mode: BackendMode,
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
<head><title>Generation Gateway</title></head>
<body>
  <h1>Generation Gateway</h1>
  <form onsubmit="send(event)">
    <textarea id="prompt" rows="4" cols="60" placeholder="Prompt"></textarea><br>
    <input id="model" placeholder="Model"><br>
    <button>Generate</button>
  </form>
  <pre id="out"></pre>
  <script>
    async function send(e) {
      e.preventDefault();
      const res = await fetch('/generate', {
        method: 'POST',
        headers: {'Content-Type': 'application/json'},
        body: JSON.stringify({
          prompt: document.getElementById('prompt').value,
          model: document.getElementById('model').value,
        }),
      });
      const data = await res.json();
      document.getElementById('out').textContent = data.response || data.error;
    }
  </script>
</body>
</html>
"#;

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub async fn generate(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, (StatusCode, Json<ErrorResponse>)> {
    // Validation short-circuits before the backend is touched.
    let request = validate::validate(request, state.mode).map_err(error_response)?;

    info!("Received generation request ({} byte prompt)", request.prompt.len());

    match state.backend.generate(&request).await {
        Ok(text) => Ok(Json(GenerateResponse { response: text })),
        Err(e) => {
            error!("Generation failed: {}", e);
            Err(error_response(e))
        }
    }
}

fn error_response(error: Error) -> (StatusCode, Json<ErrorResponse>) {
    (
        status_for(&error),
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
}

/// One consistent mapping: client mistakes are 400, an unreachable or
/// failing upstream is 502, everything else is 500.
fn status_for(error: &Error) -> StatusCode {
    match error {
        Error::Validation(_) => StatusCode::BAD_REQUEST,
        Error::BackendUnavailable(_) | Error::Backend { .. } => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_is_consistent() {
        assert_eq!(
            status_for(&Error::validation("missing prompt")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&Error::unavailable("connection refused")),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_for(&Error::Backend {
                status: 500,
                body: "upstream exploded".to_string(),
            }),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_for(&Error::inference("model raised")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_for(&Error::internal("bug")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
