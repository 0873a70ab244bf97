//! Request extractor accepting a note as multipart upload or raw body text.

use axum::{
    async_trait,
    body::Bytes,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::BytesRejection,
        FromRequest, Multipart, Request,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Multipart field names that may carry the note.
const NOTE_FIELDS: &[&str] = &["file", "text", "note"];

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("could not read multipart body: {0}")]
    Multipart(#[from] MultipartError),
    #[error(transparent)]
    Rejected(#[from] MultipartRejection),
    #[error(transparent)]
    Body(#[from] BytesRejection),
    #[error("no clinical note supplied; send a `file` or `text` field")]
    MissingNote,
    #[error("clinical note is not valid UTF-8")]
    InvalidUtf8,
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        let status = match &self {
            UploadError::Multipart(err) => err.status(),
            UploadError::Rejected(rejection) => rejection.status(),
            UploadError::Body(rejection) => rejection.status(),
            UploadError::MissingNote | UploadError::InvalidUtf8 => StatusCode::BAD_REQUEST,
        };
        (status, self.to_string()).into_response()
    }
}

/// Clinical note text taken from the request.
#[derive(Debug, Clone)]
pub struct NoteUpload(pub String);

#[async_trait]
impl<S> FromRequest<S> for NoteUpload
where
    S: Send + Sync,
{
    type Rejection = UploadError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.starts_with("multipart/form-data"))
            .unwrap_or(false);

        if is_multipart {
            let multipart = Multipart::from_request(req, state).await?;
            return from_multipart(multipart).await;
        }

        let bytes = Bytes::from_request(req, state).await?;
        if is_blank(&bytes) {
            return Err(UploadError::MissingNote);
        }
        decode(&bytes).map(NoteUpload)
    }
}

/// First populated note field wins; an empty text area falls through to the
/// file field and vice versa.
async fn from_multipart(mut multipart: Multipart) -> Result<NoteUpload, UploadError> {
    while let Some(field) = multipart.next_field().await? {
        let wanted = field
            .name()
            .map(|name| NOTE_FIELDS.contains(&name))
            .unwrap_or(false)
            || field.file_name().is_some();
        if !wanted {
            continue;
        }
        let bytes = field.bytes().await?;
        if is_blank(&bytes) {
            continue;
        }
        return decode(&bytes).map(NoteUpload);
    }
    Err(UploadError::MissingNote)
}

fn is_blank(bytes: &[u8]) -> bool {
    bytes.iter().all(u8::is_ascii_whitespace)
}

fn decode(bytes: &[u8]) -> Result<String, UploadError> {
    String::from_utf8(bytes.to_vec()).map_err(|_| UploadError::InvalidUtf8)
}
