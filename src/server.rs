//! HTTP server setup and configuration.
//!
//! This module provides the router and application state used by both
//! the production server and integration tests.

use axum::{
    extract::{DefaultBodyLimit, Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::error::ApiError;
use crate::models::{AppConfig, JobResponse, NotificationPreferences};
use crate::services::{
    DeliveryProvider, DynImageCodec, ImageCrateCodec, InMemoryNotificationStore,
    InMemoryPreferenceStore, InMemoryReminderStore, InMemoryUserDirectory, JobDispatcher,
    LoggingDeliveryProvider, NotificationDispatcher, NotificationService, ReminderRunReport,
    ReminderScheduler, ReminderStore,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub dispatcher: Arc<JobDispatcher>,
    pub notifications: Arc<NotificationService>,
    pub notification_store: Arc<InMemoryNotificationStore>,
    pub preferences: Arc<InMemoryPreferenceStore>,
    pub reminders: Arc<InMemoryReminderStore>,
    pub users: Arc<InMemoryUserDirectory>,
    pub scheduler: Arc<ReminderScheduler>,
}

/// Create application state with the `image` codec and the logging push
/// provider.
pub fn create_app_state(config: AppConfig) -> AppState {
    create_app_state_with(
        config,
        Arc::new(ImageCrateCodec::new()),
        Arc::new(LoggingDeliveryProvider::new()),
    )
}

/// Create application state with explicit collaborators.
pub fn create_app_state_with(
    config: AppConfig,
    codec: DynImageCodec,
    provider: Arc<dyn DeliveryProvider>,
) -> AppState {
    let dispatcher = Arc::new(JobDispatcher::new(codec, &config.jobs));

    let notification_store = Arc::new(InMemoryNotificationStore::new());
    let preferences = Arc::new(InMemoryPreferenceStore::new());
    let reminders = Arc::new(InMemoryReminderStore::new());
    let users = Arc::new(InMemoryUserDirectory::new());

    let notifications = Arc::new(NotificationService::new(
        notification_store.clone(),
        NotificationDispatcher::new(preferences.clone(), provider),
    ));
    let scheduler = Arc::new(ReminderScheduler::new(
        notifications.clone(),
        reminders.clone(),
        users.clone(),
        config.reminders.clone(),
    ));

    AppState {
        config: Arc::new(config),
        dispatcher,
        notifications,
        notification_store,
        preferences,
        reminders,
        users,
        scheduler,
    }
}

/// Build the API router with all endpoints and middleware.
///
/// This is the core router used by both production and tests.
pub fn build_router(state: AppState) -> Router {
    let max_body_bytes = state.config.server.max_body_bytes;

    Router::new()
        // Image jobs
        .route("/api/jobs", post(handle_submit_job))
        .route("/api/jobs/:correlation_id/cancel", post(handle_cancel_job))
        // Notifications and reminders
        .route("/api/notifications", post(handle_publish))
        .route("/api/preferences/:user_id", put(handle_put_preferences))
        .route("/api/reminders", post(handle_create_reminder))
        .route("/api/reminders/run", post(handle_run_reminders))
        // Health check
        .route("/health", get(|| async { "OK" }))
        // Add state, body limit and tracing
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
}

// Wrapper handlers to extract state components for the underlying API handlers

async fn handle_submit_job(
    State(state): State<AppState>,
    body: axum::Json<crate::models::JobRequest>,
) -> Json<JobResponse> {
    api::handle_submit_job(State(state.dispatcher), body).await
}

async fn handle_cancel_job(
    State(state): State<AppState>,
    path: Path<String>,
) -> Result<Json<api::CancelResponse>, ApiError> {
    api::handle_cancel_job(State(state.dispatcher), path).await
}

async fn handle_publish(
    State(state): State<AppState>,
    body: axum::Json<crate::models::Notification>,
) -> Result<(StatusCode, Json<api::PublishResponse>), ApiError> {
    api::handle_publish(State(state.notifications), body).await
}

async fn handle_put_preferences(
    State(state): State<AppState>,
    path: Path<String>,
    body: axum::Json<NotificationPreferences>,
) -> Json<NotificationPreferences> {
    api::handle_put_preferences(State(state.preferences), path, body).await
}

async fn handle_create_reminder(
    State(state): State<AppState>,
    body: axum::Json<crate::models::Reminder>,
) -> Result<(StatusCode, Json<api::ReminderCreated>), ApiError> {
    let store: Arc<dyn ReminderStore> = state.reminders;
    api::handle_create_reminder(State(store), body).await
}

async fn handle_run_reminders(
    State(state): State<AppState>,
) -> Result<Json<ReminderRunReport>, ApiError> {
    api::handle_run_reminders(State(state.scheduler)).await
}
