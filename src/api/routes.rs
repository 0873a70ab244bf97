//! HTTP route handlers for Axum.

use axum::{extract::State, http::StatusCode, Json};
use tracing::{info, instrument};

use crate::{
    api::{
        types::{DiagnosisRequest, DiagnosisResponse, HealthDto},
        upload::NoteUpload,
    },
    nlp::NoteAnalysis,
};

use super::AppState;

pub type ApiResult<T> = Result<Json<T>, (StatusCode, String)>;

pub async fn health() -> Json<HealthDto> {
    Json(HealthDto {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[instrument(skip_all)]
pub async fn summarize(
    State(state): State<AppState>,
    NoteUpload(text): NoteUpload,
) -> ApiResult<NoteAnalysis> {
    let analysis = analyze(&state, text).await?;
    info!(
        summary_chars = analysis.summary.len(),
        vitals = analysis.structured.vitals_with_values.len(),
        "summarized note"
    );
    Ok(Json(analysis))
}

/// Upstream failures come back as a 200 whose `diagnosis` holds the error text.
#[instrument(skip_all)]
pub async fn diagnose(
    State(state): State<AppState>,
    Json(request): Json<DiagnosisRequest>,
) -> Json<DiagnosisResponse> {
    let (diagnosis, parsed) = state
        .diagnosis
        .suggest_parsed(&request.symptoms, &request.conditions, &request.medications)
        .await;
    Json(DiagnosisResponse { diagnosis, parsed })
}

/// Run the CPU-bound analysis on the blocking pool.
pub(crate) async fn analyze(
    state: &AppState,
    text: String,
) -> Result<NoteAnalysis, (StatusCode, String)> {
    let analyzer = state.analyzer.clone();
    tokio::task::spawn_blocking(move || analyzer.analyze(&text))
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}
