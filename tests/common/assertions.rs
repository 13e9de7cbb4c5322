//! Assertion helpers for tests.

use axum::http::StatusCode;
use docscan::models::{JobResponse, JobStatus};
use pretty_assertions::assert_eq;

use super::app::TestResponse;

/// Assert response has expected status code
pub fn assert_status(response: &TestResponse, expected: StatusCode) {
    assert_eq!(
        response.status, expected,
        "Expected status {}, got {}. Body: {}",
        expected,
        response.status,
        response.text()
    );
}

/// Assert response is OK (200)
pub fn assert_ok(response: &TestResponse) {
    assert_status(response, StatusCode::OK);
}

/// Assert a job succeeded for `correlation_id` and return its result bytes
pub fn assert_job_success(response: &JobResponse, correlation_id: &str) -> Vec<u8> {
    assert_eq!(response.correlation_id, correlation_id);
    assert_eq!(
        response.status,
        JobStatus::Success,
        "Job failed: {:?}",
        response.message
    );
    assert!(response.message.is_none());
    response
        .result_bytes
        .clone()
        .expect("success response without resultBytes")
}

/// Assert a job failed for `correlation_id` with a message containing `needle`
pub fn assert_job_error(response: &JobResponse, correlation_id: &str, needle: &str) {
    assert_eq!(response.correlation_id, correlation_id);
    assert_eq!(response.status, JobStatus::Error);
    assert!(response.result_bytes.is_none());
    let message = response.message.as_deref().unwrap_or_default();
    assert!(
        message.contains(needle),
        "Expected error containing {needle:?}, got {message:?}"
    );
}

/// Assert error JSON body has the `{status, error}` shape
pub fn assert_api_error(response: &TestResponse, expected: StatusCode) {
    assert_status(response, expected);
    let json: serde_json::Value = response.json();
    assert_eq!(json["status"].as_u64(), Some(expected.as_u16() as u64));
    assert!(json["error"].is_string(), "Missing error message: {json}");
}
