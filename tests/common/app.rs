//! Test application factory for integration tests.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower::ServiceExt;

use docscan::error::NotifyError;
use docscan::models::{AppConfig, JobRequest, JobResponse, OutputFormat, PushMessage};
use docscan::server::{build_router, create_app_state_with, AppState};
use docscan::services::{DeliveryProvider, ImageCrateCodec};

/// Delivery provider that keeps every message it is given
#[derive(Default)]
pub struct RecordingProvider {
    messages: Mutex<Vec<PushMessage>>,
}

impl RecordingProvider {
    pub async fn messages(&self) -> Vec<PushMessage> {
        self.messages.lock().await.clone()
    }
}

#[async_trait]
impl DeliveryProvider for RecordingProvider {
    async fn send(&self, message: &PushMessage) -> Result<String, NotifyError> {
        let mut messages = self.messages.lock().await;
        messages.push(message.clone());
        Ok(format!("test-message-{}", messages.len()))
    }
}

/// Test application with router and direct access to services
pub struct TestApp {
    router: axum::Router,
    pub state: AppState,
    pub provider: Arc<RecordingProvider>,
}

impl TestApp {
    /// Create a test application that encodes job results as PNG, so
    /// results can be compared pixel for pixel
    pub fn new() -> Self {
        let mut config = AppConfig::default();
        config.jobs.output_format = OutputFormat::Png;
        Self::with_config(config)
    }

    /// Create a test application from an explicit configuration
    pub fn with_config(config: AppConfig) -> Self {
        let provider = Arc::new(RecordingProvider::default());
        let state = create_app_state_with(
            config,
            Arc::new(ImageCrateCodec::new()),
            provider.clone(),
        );

        // Build router using shared server module (same as production)
        let router = build_router(state.clone());

        Self {
            router,
            state,
            provider,
        }
    }

    /// Make a GET request to the given path
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request(Request::get(path).body(Body::empty()).unwrap())
            .await
    }

    /// Make a POST request with JSON body
    pub async fn post_json(&self, path: &str, body: &serde_json::Value) -> TestResponse {
        self.post_raw(path, &body.to_string()).await
    }

    /// Make a POST request with a raw body labelled as JSON
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::post(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.request(request).await
    }

    /// Make a PUT request with JSON body
    pub async fn put_json(&self, path: &str, body: &serde_json::Value) -> TestResponse {
        let request = Request::put(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.request(request).await
    }

    /// Submit a job over HTTP and parse its response
    pub async fn submit_job(&self, job: &JobRequest) -> JobResponse {
        let response = self
            .post_json("/api/jobs", &serde_json::to_value(job).unwrap())
            .await;
        assert_eq!(response.status, StatusCode::OK, "body: {}", response.text());
        response.json()
    }

    /// Send a request to the router
    async fn request(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Request failed");

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes()
            .to_vec();

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Test response with convenience methods
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    /// Parse body as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body).expect("Failed to parse JSON response")
    }

    /// Get body as string
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }
}
