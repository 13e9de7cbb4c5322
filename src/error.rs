use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use scan_imaging::{ResampleError, UnknownFilterError};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Not found")]
    NotFound,

    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failure of a single image job. Every variant ends up as an error
/// response; none of them escape the dispatcher.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Degenerate geometry: output would be {width}x{height}")]
    DegenerateGeometry { width: f64, height: f64 },

    #[error("Output too large: {width}x{height}")]
    OutputTooLarge { width: u64, height: u64 },

    #[error("Unknown filter: {0}")]
    UnknownFilter(String),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Encode error: {0}")]
    Encode(String),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Image too large: {size} bytes (max {max})")]
    ImageTooLarge { size: usize, max: usize },

    #[error("Job cancelled")]
    Cancelled,

    #[error("Worker failed: {0}")]
    WorkerFailed(String),
}

impl JobError {
    /// Short stable name of the variant, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            JobError::Decode(_) => "decode",
            JobError::DegenerateGeometry { .. } => "degenerate_geometry",
            JobError::OutputTooLarge { .. } => "output_too_large",
            JobError::UnknownFilter(_) => "unknown_filter",
            JobError::UnsupportedOperation(_) => "unsupported_operation",
            JobError::Encode(_) => "encode",
            JobError::InvalidPayload(_) => "invalid_payload",
            JobError::ImageTooLarge { .. } => "image_too_large",
            JobError::Cancelled => "cancelled",
            JobError::WorkerFailed(_) => "worker_failed",
        }
    }
}

impl From<ResampleError> for JobError {
    fn from(e: ResampleError) -> Self {
        match e {
            ResampleError::DegenerateGeometry { width, height } => {
                JobError::DegenerateGeometry { width, height }
            }
            ResampleError::OutputTooLarge { width, height } => {
                JobError::OutputTooLarge { width, height }
            }
            ResampleError::Cancelled => JobError::Cancelled,
        }
    }
}

impl From<UnknownFilterError> for JobError {
    fn from(e: UnknownFilterError) -> Self {
        JobError::UnknownFilter(e.name().to_string())
    }
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Store error: {0}")]
    Store(String),

    #[error("Delivery failed: {0}")]
    Delivery(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::JobNotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::Notify(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        };

        let body = Json(json!({
            "status": status.as_u16(),
            "error": message,
        }));

        (status, body).into_response()
    }
}
