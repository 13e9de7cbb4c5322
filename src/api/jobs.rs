use axum::{
    extract::{Path, State},
    response::Json,
    Json as JsonExtractor,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::models::{JobRequest, JobResponse};
use crate::services::JobDispatcher;

/// Response from job cancellation
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CancelResponse {
    pub correlation_id: String,
    /// Always true; unknown ids are a 404
    pub cancelled: bool,
}

/// Run an image job
///
/// Runs a `perspectiveTransform` or `applyFilter` job and returns its single
/// response. Job failures are reported with `status: "error"` and HTTP 200.
#[utoipa::path(
    post,
    path = "/api/jobs",
    request_body = JobRequest,
    responses(
        (status = 200, description = "Job finished (successfully or not)", body = JobResponse),
        (status = 400, description = "Body is not valid JSON"),
        (status = 422, description = "Body is not a job request"),
        (status = 413, description = "Body exceeds the size limit"),
    ),
    tag = "Jobs"
)]
pub async fn handle_submit_job(
    State(dispatcher): State<Arc<JobDispatcher>>,
    JsonExtractor(request): JsonExtractor<JobRequest>,
) -> Json<JobResponse> {
    tracing::debug!(
        correlation_id = %request.correlation_id,
        operation = %request.operation,
        "Job received"
    );
    Json(dispatcher.handle(request).await)
}

/// Cancel a running job
///
/// The job still answers its own request, with an error.
#[utoipa::path(
    post,
    path = "/api/jobs/{correlation_id}/cancel",
    responses(
        (status = 200, description = "Cancellation requested", body = CancelResponse),
        (status = 404, description = "No job with this id is in flight"),
    ),
    params(
        ("correlation_id" = String, Path, description = "Correlation id of the job"),
    ),
    tag = "Jobs"
)]
pub async fn handle_cancel_job(
    State(dispatcher): State<Arc<JobDispatcher>>,
    Path(correlation_id): Path<String>,
) -> Result<Json<CancelResponse>, ApiError> {
    if dispatcher.cancel(&correlation_id).await {
        Ok(Json(CancelResponse {
            correlation_id,
            cancelled: true,
        }))
    } else {
        Err(ApiError::JobNotFound(correlation_id))
    }
}
