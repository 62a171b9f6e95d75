// src/api/types.rs

use serde::Serialize;

use crate::engine::sample::SampleCurve;

/// Response for run creation.
#[derive(Debug, Serialize)]
pub struct RunCreatedResponse {
    pub id: String,
    pub curve: SampleCurve,
}

/// Response for a stop request.
#[derive(Debug, Serialize)]
pub struct StopResponse {
    pub id: String,
    pub status: String,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
