use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use utoipa::ToSchema;

/// Notification type names shared with the client app.
pub mod types {
    pub const JOB_RECORD_CREATED: &str = "job_record_created";
    pub const JOB_RECORD_UPDATED: &str = "job_record_updated";
    pub const EXPENSE_CREATED: &str = "expense_created";
    pub const TIMESHEET_REMINDER: &str = "timesheet_reminder";
    pub const SYSTEM_UPDATES: &str = "system_updates";
    pub const SCHEDULED_REMINDER: &str = "scheduled_reminder";

    /// Types a user can switch off individually.
    pub const GATED: [&str; 5] = [
        JOB_RECORD_CREATED,
        JOB_RECORD_UPDATED,
        EXPENSE_CREATED,
        TIMESHEET_REMINDER,
        SYSTEM_UPDATES,
    ];
}

/// A notification addressed to one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub user_id: String,
    pub title: String,
    pub body: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// Free-form string data forwarded to the device; `route` sets the link
    #[serde(default)]
    pub data: BTreeMap<String, String>,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        user_id: impl Into<String>,
        kind: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            title: title.into(),
            body: body.into(),
            kind: kind.into(),
            data: BTreeMap::new(),
            is_read: false,
            created_at: Utc::now(),
        }
    }

    /// Add a data entry.
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// In-app route the notification opens, `/` if none.
    pub fn route(&self) -> &str {
        self.data.get("route").map(String::as_str).unwrap_or("/")
    }
}

/// Per-user delivery settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPreferences {
    #[serde(default)]
    pub user_id: String,
    /// Master switch
    #[serde(default)]
    pub enabled: bool,
    /// Device token of the push provider
    #[serde(default)]
    pub fcm_token: Option<String>,
    /// Per-type switches; a gated type is on unless set to `false`
    #[serde(default)]
    pub type_flags: HashMap<String, bool>,
}

impl NotificationPreferences {
    pub fn enabled_with_token(user_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            enabled: true,
            fcm_token: Some(token.into()),
            type_flags: HashMap::new(),
        }
    }

    pub fn with_type_flag(mut self, kind: impl Into<String>, enabled: bool) -> Self {
        self.type_flags.insert(kind.into(), enabled);
        self
    }

    /// Whether notifications of `kind` may be delivered.
    pub fn allows(&self, kind: &str) -> bool {
        if !types::GATED.contains(&kind) {
            return true;
        }
        self.type_flags.get(kind).copied() != Some(false)
    }

    /// The token, if present and non-empty.
    pub fn token(&self) -> Option<&str> {
        self.fcm_token.as_deref().filter(|t| !t.is_empty())
    }
}

/// A provider-ready push message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PushMessage {
    pub token: String,
    pub title: String,
    pub body: String,
    pub data: BTreeMap<String, String>,
    pub webpush: WebpushConfig,
    pub android: AndroidConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebpushConfig {
    pub icon: String,
    pub badge: String,
    pub require_interaction: bool,
    pub vibrate: Vec<u32>,
    pub actions: Vec<NotificationAction>,
    /// Page opened on click
    pub link: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
}

impl NotificationAction {
    pub fn new(action: &str, title: &str) -> Self {
        Self {
            action: action.to_string(),
            title: title.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AndroidConfig {
    pub priority: String,
    pub channel_id: String,
    pub default_vibrate_timings: bool,
    pub default_sound: bool,
}

/// How often a reminder repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Once,
    Daily,
    Weekly,
    Monthly,
}

/// A scheduled message to a set of users.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    /// Assigned by the store when empty
    #[serde(default)]
    pub id: String,
    pub target_user_ids: Vec<String>,
    pub title: String,
    pub message: String,
    pub frequency: Frequency,
    /// Only the time of day is used after the first send
    pub scheduled_time: DateTime<Utc>,
    /// Weekday, 1 = Sunday ... 7 = Saturday
    #[serde(default)]
    pub day_of_week: Option<u32>,
    #[serde(default)]
    pub day_of_month: Option<u32>,
    /// Defaults to `scheduled_time` when stored
    #[serde(default)]
    pub next_send_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_sent_at: Option<DateTime<Utc>>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl Reminder {
    pub fn new(
        frequency: Frequency,
        scheduled_time: DateTime<Utc>,
        title: impl Into<String>,
        message: impl Into<String>,
        target_user_ids: Vec<String>,
    ) -> Self {
        Self {
            id: String::new(),
            target_user_ids,
            title: title.into(),
            message: message.into(),
            frequency,
            scheduled_time,
            day_of_week: None,
            day_of_month: None,
            next_send_at: Some(scheduled_time),
            last_sent_at: None,
            is_active: true,
        }
    }

    /// Active and scheduled at or before `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.next_send_at.is_some_and(|at| at <= now)
    }
}

/// The slice of a user record the scheduler needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserRecord {
    pub id: String,
    #[serde(default)]
    pub role: String,
}

impl UserRecord {
    pub fn new(id: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: role.into(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_preferences_allow_ungated_types() {
        let prefs = NotificationPreferences::enabled_with_token("u1", "tok")
            .with_type_flag(types::SCHEDULED_REMINDER, false);
        // Only the gated types honour their flag
        assert!(prefs.allows(types::SCHEDULED_REMINDER));
        assert!(prefs.allows("anything_else"));
    }

    #[test]
    fn test_preferences_gated_types_default_on() {
        let prefs = NotificationPreferences::enabled_with_token("u1", "tok")
            .with_type_flag(types::EXPENSE_CREATED, false)
            .with_type_flag(types::SYSTEM_UPDATES, true);

        assert!(!prefs.allows(types::EXPENSE_CREATED));
        assert!(prefs.allows(types::SYSTEM_UPDATES));
        assert!(prefs.allows(types::JOB_RECORD_CREATED));
    }

    #[test]
    fn test_empty_token_is_no_token() {
        let mut prefs = NotificationPreferences::enabled_with_token("u1", "");
        assert_eq!(prefs.token(), None);
        prefs.fcm_token = None;
        assert_eq!(prefs.token(), None);
    }

    #[test]
    fn test_notification_route_default() {
        let n = Notification::new("u1", types::SYSTEM_UPDATES, "t", "b");
        assert_eq!(n.route(), "/");
        assert_eq!(n.with_data("route", "/expenses").route(), "/expenses");
    }

    #[test]
    fn test_notification_wire_format() {
        let n: Notification = serde_json::from_value(json!({
            "userId": "u1",
            "title": "New job",
            "body": "Job 12 created",
            "type": "job_record_created",
            "data": {"route": "/job-records/12"}
        }))
        .unwrap();

        assert_eq!(n.kind, types::JOB_RECORD_CREATED);
        assert!(!n.is_read);
        assert_eq!(n.route(), "/job-records/12");
    }

    #[test]
    fn test_reminder_defaults_and_due() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let reminder: Reminder = serde_json::from_value(json!({
            "targetUserIds": ["u1"],
            "title": "Standup",
            "message": "Daily standup",
            "frequency": "daily",
            "scheduledTime": "2024-03-01T09:00:00Z",
            "nextSendAt": "2024-03-01T09:00:00Z"
        }))
        .unwrap();

        assert!(reminder.is_active);
        assert_eq!(reminder.frequency, Frequency::Daily);
        assert!(reminder.is_due(at));
        assert!(!reminder.is_due(at - chrono::Duration::seconds(1)));
    }

    #[test]
    fn test_admin_role() {
        assert!(UserRecord::new("a", "admin").is_admin());
        assert!(!UserRecord::new("b", "worker").is_admin());
        assert!(!UserRecord::new("c", "").is_admin());
    }
}
