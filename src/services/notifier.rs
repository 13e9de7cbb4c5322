//! Preference-gated push delivery.
//!
//! Storing a notification and pushing it to the user's device are separate
//! steps: [`NotificationService::publish`] always stores, then hands the
//! notification to [`NotificationDispatcher::dispatch`], which decides
//! whether the user wants it, builds the provider message and sends it
//! once. Failures are logged and reported, never retried.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use utoipa::ToSchema;

use super::store::{NotificationStore, PreferenceStore};
use crate::error::NotifyError;
use crate::models::{
    types, AndroidConfig, Notification, NotificationAction, PushMessage, WebpushConfig,
};

pub const CLICK_ACTION: &str = "FLUTTER_NOTIFICATION_CLICK";
pub const WEB_ICON: &str = "/icons/Icon-192.png";
pub const WEB_BADGE: &str = "/icons/Icon-maskable-192.png";
pub const VIBRATE_PATTERN: [u32; 3] = [200, 100, 200];

/// Hands a composed message to a push provider.
#[async_trait]
pub trait DeliveryProvider: Send + Sync {
    /// Send one message, returning the provider's message id
    async fn send(&self, message: &PushMessage) -> Result<String, NotifyError>;
}

/// Provider that only logs; used when no real provider is configured.
#[derive(Debug, Default)]
pub struct LoggingDeliveryProvider {
    sent: AtomicU64,
}

impl LoggingDeliveryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent_count(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl DeliveryProvider for LoggingDeliveryProvider {
    async fn send(&self, message: &PushMessage) -> Result<String, NotifyError> {
        let n = self.sent.fetch_add(1, Ordering::Relaxed) + 1;
        let token_prefix: String = message.token.chars().take(8).collect();
        tracing::info!(
            token = %token_prefix,
            title = %message.title,
            link = %message.webpush.link,
            "Push message (logging provider)"
        );
        Ok(format!("logged/{n}"))
    }
}

/// Why a notification was not pushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NoPreferences,
    Disabled,
    TypeDisabled,
    NoToken,
}

/// Result of one dispatch attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DispatchOutcome {
    Sent { message_id: String },
    Skipped { reason: SkipReason },
    Failed { error: String },
}

impl DispatchOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, DispatchOutcome::Sent { .. })
    }
}

/// Action buttons offered for a notification type.
pub fn actions_for(kind: &str) -> Vec<NotificationAction> {
    match kind {
        types::JOB_RECORD_CREATED | types::JOB_RECORD_UPDATED => vec![
            NotificationAction::new("view", "View"),
            NotificationAction::new("dismiss", "Dismiss"),
        ],
        types::EXPENSE_CREATED => vec![NotificationAction::new("view", "View Expense")],
        types::TIMESHEET_REMINDER => vec![NotificationAction::new("complete", "Complete Now")],
        _ => Vec::new(),
    }
}

/// Types that stay on screen until the user acts.
pub fn requires_interaction(kind: &str) -> bool {
    matches!(
        kind,
        types::JOB_RECORD_CREATED | types::JOB_RECORD_UPDATED | types::TIMESHEET_REMINDER
    )
}

/// Build the provider message for `notification`.
pub fn compose_message(notification_id: &str, notification: &Notification, token: &str) -> PushMessage {
    let mut data = std::collections::BTreeMap::new();
    data.insert("notificationId".to_string(), notification_id.to_string());
    data.insert("type".to_string(), notification.kind.clone());
    data.insert("click_action".to_string(), CLICK_ACTION.to_string());
    // Notification data wins over the defaults above
    data.extend(notification.data.clone());

    PushMessage {
        token: token.to_string(),
        title: notification.title.clone(),
        body: notification.body.clone(),
        data,
        webpush: WebpushConfig {
            icon: WEB_ICON.to_string(),
            badge: WEB_BADGE.to_string(),
            require_interaction: requires_interaction(&notification.kind),
            vibrate: VIBRATE_PATTERN.to_vec(),
            actions: actions_for(&notification.kind),
            link: notification.route().to_string(),
        },
        android: AndroidConfig {
            priority: "high".to_string(),
            channel_id: "default".to_string(),
            default_vibrate_timings: true,
            default_sound: true,
        },
    }
}

/// Gates notifications on user preferences and sends them.
pub struct NotificationDispatcher {
    preferences: Arc<dyn PreferenceStore>,
    provider: Arc<dyn DeliveryProvider>,
}

impl NotificationDispatcher {
    pub fn new(preferences: Arc<dyn PreferenceStore>, provider: Arc<dyn DeliveryProvider>) -> Self {
        Self {
            preferences,
            provider,
        }
    }

    /// Push one stored notification if the user wants it.
    pub async fn dispatch(&self, notification_id: &str, notification: &Notification) -> DispatchOutcome {
        let user_id = notification.user_id.as_str();

        let preferences = match self.preferences.get_preferences(user_id).await {
            Ok(Some(preferences)) => preferences,
            Ok(None) => return skip(notification_id, user_id, SkipReason::NoPreferences),
            Err(e) => {
                tracing::error!(notification_id, user_id, error = %e, "Failed to load preferences");
                return DispatchOutcome::Failed {
                    error: e.to_string(),
                };
            }
        };

        if !preferences.enabled {
            return skip(notification_id, user_id, SkipReason::Disabled);
        }
        if !preferences.allows(&notification.kind) {
            return skip(notification_id, user_id, SkipReason::TypeDisabled);
        }
        let Some(token) = preferences.token() else {
            return skip(notification_id, user_id, SkipReason::NoToken);
        };

        let message = compose_message(notification_id, notification, token);
        match self.provider.send(&message).await {
            Ok(message_id) => {
                tracing::info!(
                    notification_id,
                    user_id,
                    kind = %notification.kind,
                    message_id = %message_id,
                    "Notification sent"
                );
                DispatchOutcome::Sent { message_id }
            }
            Err(e) => {
                tracing::error!(notification_id, user_id, error = %e, "Notification delivery failed");
                DispatchOutcome::Failed {
                    error: e.to_string(),
                }
            }
        }
    }
}

fn skip(notification_id: &str, user_id: &str, reason: SkipReason) -> DispatchOutcome {
    tracing::debug!(notification_id, user_id, ?reason, "Notification not pushed");
    DispatchOutcome::Skipped { reason }
}

/// Stores notifications and pushes them.
pub struct NotificationService {
    store: Arc<dyn NotificationStore>,
    dispatcher: NotificationDispatcher,
}

impl NotificationService {
    pub fn new(store: Arc<dyn NotificationStore>, dispatcher: NotificationDispatcher) -> Self {
        Self { store, dispatcher }
    }

    /// Store `notification`, then try to push it. Only a store failure is
    /// an error; delivery problems are in the outcome.
    pub async fn publish(
        &self,
        notification: Notification,
    ) -> Result<(String, DispatchOutcome), NotifyError> {
        let id = self.store.add(notification.clone()).await?;
        let outcome = self.dispatcher.dispatch(&id, &notification).await;
        Ok((id, outcome))
    }

    pub fn store(&self) -> &Arc<dyn NotificationStore> {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NotificationPreferences;
    use crate::services::store::{InMemoryNotificationStore, InMemoryPreferenceStore};
    use tokio::sync::Mutex;

    /// Provider that records messages, or fails every send.
    #[derive(Default)]
    struct RecordingProvider {
        sent: Mutex<Vec<PushMessage>>,
        fail: bool,
    }

    #[async_trait]
    impl DeliveryProvider for RecordingProvider {
        async fn send(&self, message: &PushMessage) -> Result<String, NotifyError> {
            if self.fail {
                return Err(NotifyError::Delivery("unregistered token".to_string()));
            }
            let mut sent = self.sent.lock().await;
            sent.push(message.clone());
            Ok(format!("msg-{}", sent.len()))
        }
    }

    async fn setup(
        prefs: Option<NotificationPreferences>,
        fail: bool,
    ) -> (NotificationDispatcher, Arc<RecordingProvider>) {
        let store = Arc::new(InMemoryPreferenceStore::new());
        if let Some(prefs) = prefs {
            store.upsert(prefs).await;
        }
        let provider = Arc::new(RecordingProvider {
            fail,
            ..Default::default()
        });
        (NotificationDispatcher::new(store, provider.clone()), provider)
    }

    fn job_created() -> Notification {
        Notification::new("u1", types::JOB_RECORD_CREATED, "New job", "Job 12")
            .with_data("route", "/job-records/12")
    }

    #[tokio::test]
    async fn test_sends_when_allowed() {
        let (dispatcher, provider) =
            setup(Some(NotificationPreferences::enabled_with_token("u1", "tok")), false).await;

        let outcome = dispatcher.dispatch("n-1", &job_created()).await;
        assert_eq!(
            outcome,
            DispatchOutcome::Sent {
                message_id: "msg-1".to_string()
            }
        );

        let sent = provider.sent.lock().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].token, "tok");
    }

    #[tokio::test]
    async fn test_skip_reasons() {
        let cases = [
            (None, SkipReason::NoPreferences),
            (
                Some(NotificationPreferences {
                    enabled: false,
                    ..NotificationPreferences::enabled_with_token("u1", "tok")
                }),
                SkipReason::Disabled,
            ),
            (
                Some(
                    NotificationPreferences::enabled_with_token("u1", "tok")
                        .with_type_flag(types::JOB_RECORD_CREATED, false),
                ),
                SkipReason::TypeDisabled,
            ),
            (
                Some(NotificationPreferences {
                    fcm_token: None,
                    ..NotificationPreferences::enabled_with_token("u1", "")
                }),
                SkipReason::NoToken,
            ),
        ];

        for (prefs, reason) in cases {
            let (dispatcher, provider) = setup(prefs, false).await;
            let outcome = dispatcher.dispatch("n-1", &job_created()).await;
            assert_eq!(outcome, DispatchOutcome::Skipped { reason });
            assert!(provider.sent.lock().await.is_empty());
        }
    }

    #[tokio::test]
    async fn test_delivery_failure_is_reported() {
        let (dispatcher, _) =
            setup(Some(NotificationPreferences::enabled_with_token("u1", "tok")), true).await;

        match dispatcher.dispatch("n-1", &job_created()).await {
            DispatchOutcome::Failed { error } => assert!(error.contains("unregistered token")),
            other => panic!("Expected Failed, got {other:?}"),
        }
    }

    #[test]
    fn test_compose_job_created() {
        let message = compose_message("n-7", &job_created(), "tok");

        assert_eq!(message.title, "New job");
        assert_eq!(message.data["notificationId"], "n-7");
        assert_eq!(message.data["type"], "job_record_created");
        assert_eq!(message.data["click_action"], CLICK_ACTION);
        assert_eq!(message.data["route"], "/job-records/12");

        assert_eq!(message.webpush.icon, WEB_ICON);
        assert_eq!(message.webpush.badge, WEB_BADGE);
        assert!(message.webpush.require_interaction);
        assert_eq!(message.webpush.vibrate, vec![200, 100, 200]);
        assert_eq!(message.webpush.link, "/job-records/12");
        assert_eq!(
            message.webpush.actions,
            vec![
                NotificationAction::new("view", "View"),
                NotificationAction::new("dismiss", "Dismiss"),
            ]
        );

        assert_eq!(message.android.priority, "high");
        assert_eq!(message.android.channel_id, "default");
    }

    #[test]
    fn test_compose_per_type_actions() {
        assert_eq!(
            actions_for(types::EXPENSE_CREATED),
            vec![NotificationAction::new("view", "View Expense")]
        );
        assert_eq!(
            actions_for(types::TIMESHEET_REMINDER),
            vec![NotificationAction::new("complete", "Complete Now")]
        );
        assert!(actions_for(types::SCHEDULED_REMINDER).is_empty());

        assert!(requires_interaction(types::TIMESHEET_REMINDER));
        assert!(!requires_interaction(types::EXPENSE_CREATED));
    }

    #[test]
    fn test_compose_default_link() {
        let n = Notification::new("u1", types::SYSTEM_UPDATES, "Update", "v2");
        let message = compose_message("n-1", &n, "tok");
        assert_eq!(message.webpush.link, "/");
        assert!(message.webpush.actions.is_empty());
        assert!(!message.data.contains_key("route"));
    }

    #[tokio::test]
    async fn test_publish_stores_even_when_skipped() {
        let store = Arc::new(InMemoryNotificationStore::new());
        let (dispatcher, _) = setup(None, false).await;
        let service = NotificationService::new(store.clone(), dispatcher);

        let (id, outcome) = service.publish(job_created()).await.unwrap();
        assert_eq!(
            outcome,
            DispatchOutcome::Skipped {
                reason: SkipReason::NoPreferences
            }
        );
        assert!(store.get(&id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_logging_provider_counts() {
        let provider = LoggingDeliveryProvider::new();
        let message = compose_message("n-1", &job_created(), "abcdefghijkl");
        assert_eq!(provider.send(&message).await.unwrap(), "logged/1");
        assert_eq!(provider.send(&message).await.unwrap(), "logged/2");
        assert_eq!(provider.sent_count(), 2);
    }
}
