//! Shared DTOs for JSON requests and responses.

use serde::{Deserialize, Serialize};

use crate::diagnosis::DiagnosisResult;

#[derive(Debug, Clone, Deserialize)]
pub struct DiagnosisRequest {
    pub symptoms: String,
    pub conditions: String,
    pub medications: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiagnosisResponse {
    pub diagnosis: String,
    pub parsed: DiagnosisResult,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthDto {
    pub status: &'static str,
    pub version: &'static str,
}
