//! Server-rendered HTML forms and the full-pipeline report page.

use askama::Template;
use axum::{extract::State, http::StatusCode, response::Html};
use chrono::Utc;
use tracing::{info, instrument};

use crate::{
    api::{routes, upload::NoteUpload, AppState},
    diagnosis::{DiagnosisResult, SERVICE_ERROR_PREFIX},
    nlp::vitals::VitalRecord,
};

type HtmlResult = Result<Html<String>, (StatusCode, String)>;

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate {
    max_upload_kb: usize,
}

#[derive(Template)]
#[template(path = "upload.html")]
struct UploadTemplate {
    max_upload_kb: usize,
}

/// One labeled list on the report page.
struct SectionView {
    title: &'static str,
    items: Vec<String>,
}

#[derive(Template)]
#[template(path = "report.html")]
struct ReportTemplate {
    generated_at: String,
    summary: String,
    sections: Vec<SectionView>,
    vitals: Vec<VitalRecord>,
    diagnosis: DiagnosisResult,
    raw_diagnosis: String,
    diagnosis_failed: bool,
}

fn render<T: Template>(template: T) -> HtmlResult {
    template
        .render()
        .map(Html)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}

pub async fn index(State(state): State<AppState>) -> HtmlResult {
    render(IndexTemplate {
        max_upload_kb: state.settings.max_upload_bytes / 1024,
    })
}

pub async fn upload(State(state): State<AppState>) -> HtmlResult {
    render(UploadTemplate {
        max_upload_kb: state.settings.max_upload_bytes / 1024,
    })
}

/// Summarize, extract, diagnose and render everything on one page.
#[instrument(skip_all)]
pub async fn report(State(state): State<AppState>, NoteUpload(text): NoteUpload) -> HtmlResult {
    let analysis = routes::analyze(&state, text).await?;
    let (symptoms, conditions, medications) = analysis.diagnosis_fields();
    let (raw_diagnosis, diagnosis) = state
        .diagnosis
        .suggest_parsed(&symptoms, &conditions, &medications)
        .await;
    let diagnosis_failed = raw_diagnosis.starts_with(SERVICE_ERROR_PREFIX);

    let sections = analysis
        .structured
        .entities
        .iter()
        .filter(|(_, items)| !items.is_empty())
        .map(|(category, items)| SectionView {
            title: category.title(),
            items: items.iter().cloned().collect(),
        })
        .collect();

    info!(diagnosis_failed, "rendered report");
    render(ReportTemplate {
        generated_at: Utc::now().to_rfc3339(),
        summary: analysis.summary,
        sections,
        vitals: analysis.structured.vitals_with_values,
        diagnosis,
        raw_diagnosis,
        diagnosis_failed,
    })
}
