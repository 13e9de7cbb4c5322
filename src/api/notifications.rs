use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    Json as JsonExtractor,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::models::{Notification, NotificationPreferences, Reminder};
use crate::services::{
    DispatchOutcome, InMemoryPreferenceStore, NotificationService, ReminderRunReport,
    ReminderScheduler, ReminderStore,
};

/// Response from notification publishing
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublishResponse {
    pub notification_id: String,
    /// What happened to the push; the notification is stored either way
    pub delivery: DispatchOutcome,
}

/// Response from reminder creation
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReminderCreated {
    pub id: String,
}

/// Store a notification and push it to the user
#[utoipa::path(
    post,
    path = "/api/notifications",
    request_body = Notification,
    responses(
        (status = 201, description = "Notification stored", body = PublishResponse),
        (status = 400, description = "Missing user or title"),
    ),
    tag = "Notifications"
)]
pub async fn handle_publish(
    State(service): State<Arc<NotificationService>>,
    JsonExtractor(notification): JsonExtractor<Notification>,
) -> Result<(StatusCode, Json<PublishResponse>), ApiError> {
    if notification.user_id.trim().is_empty() {
        return Err(ApiError::BadRequest("userId is required".to_string()));
    }
    if notification.title.trim().is_empty() {
        return Err(ApiError::BadRequest("title is required".to_string()));
    }

    let (notification_id, delivery) = service.publish(notification).await?;
    Ok((
        StatusCode::CREATED,
        Json(PublishResponse {
            notification_id,
            delivery,
        }),
    ))
}

/// Store a user's notification preferences
///
/// The path's user id wins over any `userId` in the body.
#[utoipa::path(
    put,
    path = "/api/preferences/{user_id}",
    request_body = NotificationPreferences,
    responses(
        (status = 200, description = "Preferences stored", body = NotificationPreferences),
    ),
    params(
        ("user_id" = String, Path, description = "User the preferences belong to"),
    ),
    tag = "Notifications"
)]
pub async fn handle_put_preferences(
    State(store): State<Arc<InMemoryPreferenceStore>>,
    Path(user_id): Path<String>,
    JsonExtractor(mut preferences): JsonExtractor<NotificationPreferences>,
) -> Json<NotificationPreferences> {
    preferences.user_id = user_id;
    tracing::info!(
        user_id = %preferences.user_id,
        enabled = preferences.enabled,
        has_token = preferences.token().is_some(),
        "Preferences updated"
    );
    store.upsert(preferences.clone()).await;
    Json(preferences)
}

/// Store a scheduled reminder
#[utoipa::path(
    post,
    path = "/api/reminders",
    request_body = Reminder,
    responses(
        (status = 201, description = "Reminder stored", body = ReminderCreated),
        (status = 400, description = "Reminder has no title"),
    ),
    tag = "Reminders"
)]
pub async fn handle_create_reminder(
    State(store): State<Arc<dyn ReminderStore>>,
    JsonExtractor(reminder): JsonExtractor<Reminder>,
) -> Result<(StatusCode, Json<ReminderCreated>), ApiError> {
    if reminder.title.trim().is_empty() {
        return Err(ApiError::BadRequest("title is required".to_string()));
    }
    let frequency = reminder.frequency;
    let id = store.insert(reminder).await?;
    tracing::info!(reminder_id = %id, ?frequency, "Reminder stored");
    Ok((StatusCode::CREATED, Json(ReminderCreated { id })))
}

/// Process due reminders now
#[utoipa::path(
    post,
    path = "/api/reminders/run",
    responses(
        (status = 200, description = "Due reminders processed", body = ReminderRunReport),
    ),
    tag = "Reminders"
)]
pub async fn handle_run_reminders(
    State(scheduler): State<Arc<ReminderScheduler>>,
) -> Result<Json<ReminderRunReport>, ApiError> {
    let report = scheduler.process_due(Utc::now()).await?;
    Ok(Json(report))
}
