use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use futures::future::BoxFuture;
use note_assistant::{
    api::{router, AppState},
    config::Settings,
    diagnosis::{CompletionBackend, DiagnosisError, DiagnosisService},
    nlp::{embeddings::HashingEncoder, ner::DictionaryNer, NoteAnalyzer},
};
use serde_json::{json, Value};
use tower::ServiceExt;

struct Unreachable;

impl CompletionBackend for Unreachable {
    fn complete<'a>(&'a self, _prompt: &'a str) -> BoxFuture<'a, Result<String, DiagnosisError>> {
        Box::pin(async { Err(DiagnosisError::EmptyReply) })
    }
}

struct Canned;

impl CompletionBackend for Canned {
    fn complete<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, DiagnosisError>> {
        let urgency = if prompt.contains("chest pain") {
            "Emergency"
        } else {
            "Routine"
        };
        Box::pin(async move {
            Ok(format!(
                "Likely Diagnosis: Angina\nReasoning: Exertional symptoms\nUrgency: {urgency}\nNext Steps: ECG"
            ))
        })
    }
}

fn app(backend: Arc<dyn CompletionBackend>) -> Router {
    app_with(backend, Settings::default())
}

fn app_with(backend: Arc<dyn CompletionBackend>, settings: Settings) -> Router {
    router(AppState {
        settings: Arc::new(settings),
        analyzer: NoteAnalyzer::new(Arc::new(DictionaryNer), Arc::new(HashingEncoder), 3),
        diagnosis: DiagnosisService::new(backend),
    })
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn multipart(field: &str, content: &[u8]) -> Request<Body> {
    let boundary = "note-boundary";
    let mut body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"note.txt\"\r\nContent-Type: text/plain\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    Request::post("/summarize")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn diagnose_returns_error_text_when_upstream_fails() {
    let request = Request::post("/diagnose")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({"symptoms": "cough", "conditions": "asthma", "medications": "albuterol"})
                .to_string(),
        ))
        .unwrap();
    let response = app(Arc::new(Unreachable)).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert!(json["diagnosis"]
        .as_str()
        .unwrap()
        .starts_with("Diagnosis service error:"));
    assert_eq!(json["parsed"]["likely_diagnosis"], "");
}

#[tokio::test]
async fn diagnose_parses_reply() {
    let request = Request::post("/diagnose")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({"symptoms": "chest pain", "conditions": "none", "medications": "none"})
                .to_string(),
        ))
        .unwrap();
    let response = app(Arc::new(Canned)).oneshot(request).await.unwrap();
    let json: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["parsed"]["likely_diagnosis"], "Angina");
    assert_eq!(json["parsed"]["urgency"], "Emergency");
    assert_eq!(json["parsed"]["next_steps"], "ECG");
}

#[tokio::test]
async fn summarize_accepts_plain_body() {
    let request = Request::post("/summarize")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from("Patient reports cough. Taking Metformin 500 mg."))
        .unwrap();
    let response = app(Arc::new(Unreachable)).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(
        json["summary"],
        "Patient reports cough. Taking Metformin 500 mg."
    );
    assert_eq!(json["structured"]["symptoms"][0], "cough");
    assert_eq!(json["structured"]["medications"][0], "Metformin");
}

#[tokio::test]
async fn summarize_accepts_file_upload() {
    let response = app(Arc::new(Unreachable))
        .oneshot(multipart("file", b"BP: 120/80. HR 70 bpm."))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["structured"]["vitals_with_values"][0]["systolic"], "120");
}

#[tokio::test]
async fn summarize_rejects_invalid_utf8() {
    let response = app(Arc::new(Unreachable))
        .oneshot(multipart("file", &[0xff, 0xfe, 0xfd]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn span_offsets_index_uploaded_text() {
    let note = "  Patient   reports\r\n\r\n\r\n\r\n  cough and fever.";
    let request = Request::post("/summarize")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from(note))
        .unwrap();
    let response = app(Arc::new(Unreachable)).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json: Value = serde_json::from_str(&body_text(response).await).unwrap();
    let spans = json["structured"]["all_entities"].as_array().unwrap();
    let texts: Vec<&str> = spans.iter().map(|s| s["text"].as_str().unwrap()).collect();
    assert_eq!(texts, vec!["cough", "fever"]);
    for span in spans {
        let start = span["start"].as_u64().unwrap() as usize;
        let end = span["end"].as_u64().unwrap() as usize;
        assert_eq!(&note[start..end], span["text"].as_str().unwrap());
    }
    assert_eq!(json["summary"], "Patient reports\n\ncough and fever.");
}

#[tokio::test]
async fn oversized_body_is_payload_too_large() {
    let settings = Settings {
        max_upload_bytes: 1024,
        ..Settings::default()
    };
    let request = Request::post("/summarize")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from("a".repeat(4096)))
        .unwrap();
    let response = app_with(Arc::new(Unreachable), settings)
        .oneshot(request)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn blank_body_is_rejected_like_empty_upload() {
    let request = Request::post("/summarize")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from(" \r\n "))
        .unwrap();
    let response = app(Arc::new(Unreachable)).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app(Arc::new(Unreachable))
        .oneshot(multipart("file", b"   "))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.contains("no clinical note"));
}

#[tokio::test]
async fn health_reports_ok() {
    let response = app(Arc::new(Unreachable))
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let json: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["status"], "ok");
}

#[cfg(feature = "askama")]
#[tokio::test]
async fn report_renders_diagnosis_error() {
    let mut request = multipart("text", b"Chief complaint: chest pain.\nMeds: Aspirin 81 mg");
    *request.uri_mut() = "/report".parse().unwrap();
    let response = app(Arc::new(Unreachable)).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Diagnosis service error: upstream reply contained no message"));
    assert!(html.contains("Aspirin"));
}

#[cfg(feature = "askama")]
#[tokio::test]
async fn index_serves_form() {
    let response = app(Arc::new(Unreachable))
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("action=\"/report\""));
}
