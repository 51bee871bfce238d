pub mod handlers;
mod types;
mod validate;

pub use types::{ErrorResponse, GenerateRequest, GenerateResponse};

use crate::Result;
use crate::backend::{Backend, LocalBackend, RemoteBackend};
use crate::config::{BackendMode, Config};
use crate::generation::CausalLmGenerator;
use axum::{
    Router,
    routing::{get, post},
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::trace::TraceLayer;
use tracing::info;

pub async fn run(mut config: Config) -> Result<()> {
    // Environment overrides for the backend knobs
    config.backend.remote.url =
        std::env::var("OLLAMA_API_URL").unwrap_or_else(|_| config.backend.remote.url.clone());
    config.backend.local.model =
        std::env::var("MODEL_NAME").unwrap_or_else(|_| config.backend.local.model.clone());

    // Select and initialize the backend once; it is read-only afterwards.
    let backend: Arc<dyn Backend> = match config.backend.mode {
        BackendMode::Remote => {
            info!("Using remote backend at {}", config.backend.remote.url);
            Arc::new(RemoteBackend::new(&config.backend.remote)?)
        }
        BackendMode::Local => {
            info!("Loading local model {}", config.backend.local.model);
            let generator = Arc::new(CausalLmGenerator::load(&config.backend.local).await?);
            Arc::new(LocalBackend::new(generator, &config.backend.local))
        }
    };

    let app_state = handlers::AppState {
        backend,
        mode: config.backend.mode,
    };
    let app = router(app_state);

    // Start server
    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Router construction is separate so tests can drive the handlers with a
/// stub backend.
pub fn router(state: handlers::AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/generate", post(handlers::generate))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
