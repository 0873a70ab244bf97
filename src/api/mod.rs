//! HTTP layer exposing note analysis, diagnosis and the HTML forms.

pub mod routes;
pub mod types;
pub mod upload;

use std::{net::SocketAddr, sync::Arc};

use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::{
    config::Settings,
    diagnosis::{DiagnosisService, OpenRouterClient},
    nlp::NoteAnalyzer,
};

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub analyzer: NoteAnalyzer,
    pub diagnosis: DiagnosisService,
}

impl AppState {
    /// Load models and build the upstream client from settings.
    pub async fn load(settings: Settings) -> Result<Self> {
        let analyzer = NoteAnalyzer::load(&settings).await?;
        let client = OpenRouterClient::from_settings(&settings)?;
        if settings.openrouter_api_key.is_none() {
            tracing::warn!("OPENROUTER_API_KEY not set; diagnoses will report an error");
        }
        Ok(Self {
            settings: Arc::new(settings),
            analyzer,
            diagnosis: DiagnosisService::new(Arc::new(client)),
        })
    }
}

/// All routes with tracing, CORS and the upload size limit applied.
pub fn router(state: AppState) -> Router {
    let body_limit = state.settings.max_upload_bytes;
    let router = Router::new()
        .route("/health", get(routes::health))
        .route("/summarize", post(routes::summarize))
        .route("/diagnose", post(routes::diagnose));

    #[cfg(feature = "askama")]
    let router = router
        .route("/", get(crate::ui::index))
        .route("/upload", get(crate::ui::upload))
        .route("/report", post(crate::ui::report));

    router
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(settings: Settings, host: String, port: u16) -> Result<()> {
    let state = AppState::load(settings).await?;
    let router = router(state);

    let addr: SocketAddr = format!("{host}:{port}").parse()?;
    info!(%addr, "serving note-assistant API");
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
    info!("shutting down");
}
