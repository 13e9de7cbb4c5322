use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::NotifyError;
use crate::models::{Notification, NotificationPreferences, Reminder, UserRecord};

/// Lookup of per-user notification preferences
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    async fn get_preferences(
        &self,
        user_id: &str,
    ) -> Result<Option<NotificationPreferences>, NotifyError>;
}

/// Storage of notification documents
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Store a notification and return its id
    async fn add(&self, notification: Notification) -> Result<String, NotifyError>;

    async fn get(&self, id: &str) -> Result<Option<Notification>, NotifyError>;

    /// Delete notifications created before `cutoff`, returning how many
    async fn delete_created_before(&self, cutoff: DateTime<Utc>) -> Result<usize, NotifyError>;
}

/// Storage of scheduled reminders
#[async_trait]
pub trait ReminderStore: Send + Sync {
    /// Store a reminder, assigning an id if it has none
    async fn insert(&self, reminder: Reminder) -> Result<String, NotifyError>;

    /// Active reminders whose next send time is at or before `now`
    async fn due(&self, now: DateTime<Utc>) -> Result<Vec<Reminder>, NotifyError>;

    /// Replace a stored reminder
    async fn update(&self, reminder: Reminder) -> Result<(), NotifyError>;

    async fn get(&self, id: &str) -> Result<Option<Reminder>, NotifyError>;
}

/// Source of user records
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn list_users(&self) -> Result<Vec<UserRecord>, NotifyError>;
}

/// Sequential ids of the form `{prefix}-{n}`
struct IdSequence {
    prefix: &'static str,
    next: AtomicU64,
}

impl IdSequence {
    fn new(prefix: &'static str) -> Self {
        Self {
            prefix,
            next: AtomicU64::new(1),
        }
    }

    fn next(&self) -> String {
        format!("{}-{}", self.prefix, self.next.fetch_add(1, Ordering::Relaxed))
    }
}

/// In-memory preference storage
#[derive(Default)]
pub struct InMemoryPreferenceStore {
    preferences: Arc<RwLock<HashMap<String, NotificationPreferences>>>,
}

impl InMemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store or replace preferences, keyed by `user_id`
    pub async fn upsert(&self, preferences: NotificationPreferences) {
        let mut map = self.preferences.write().await;
        map.insert(preferences.user_id.clone(), preferences);
    }
}

#[async_trait]
impl PreferenceStore for InMemoryPreferenceStore {
    async fn get_preferences(
        &self,
        user_id: &str,
    ) -> Result<Option<NotificationPreferences>, NotifyError> {
        let map = self.preferences.read().await;
        Ok(map.get(user_id).cloned())
    }
}

/// In-memory notification storage
pub struct InMemoryNotificationStore {
    notifications: Arc<RwLock<HashMap<String, Notification>>>,
    ids: IdSequence,
}

impl InMemoryNotificationStore {
    pub fn new() -> Self {
        Self {
            notifications: Arc::new(RwLock::new(HashMap::new())),
            ids: IdSequence::new("notification"),
        }
    }

    pub async fn len(&self) -> usize {
        self.notifications.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// All notifications addressed to `user_id`
    pub async fn for_user(&self, user_id: &str) -> Vec<Notification> {
        let map = self.notifications.read().await;
        map.values()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect()
    }
}

impl Default for InMemoryNotificationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationStore for InMemoryNotificationStore {
    async fn add(&self, notification: Notification) -> Result<String, NotifyError> {
        let id = self.ids.next();
        let mut map = self.notifications.write().await;
        map.insert(id.clone(), notification);
        Ok(id)
    }

    async fn get(&self, id: &str) -> Result<Option<Notification>, NotifyError> {
        let map = self.notifications.read().await;
        Ok(map.get(id).cloned())
    }

    async fn delete_created_before(&self, cutoff: DateTime<Utc>) -> Result<usize, NotifyError> {
        let mut map = self.notifications.write().await;
        let before = map.len();
        map.retain(|_, n| n.created_at >= cutoff);
        Ok(before - map.len())
    }
}

/// In-memory reminder storage
pub struct InMemoryReminderStore {
    reminders: Arc<RwLock<HashMap<String, Reminder>>>,
    ids: IdSequence,
}

impl InMemoryReminderStore {
    pub fn new() -> Self {
        Self {
            reminders: Arc::new(RwLock::new(HashMap::new())),
            ids: IdSequence::new("reminder"),
        }
    }
}

impl Default for InMemoryReminderStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReminderStore for InMemoryReminderStore {
    async fn insert(&self, mut reminder: Reminder) -> Result<String, NotifyError> {
        if reminder.id.is_empty() {
            reminder.id = self.ids.next();
        }
        if reminder.next_send_at.is_none() && reminder.last_sent_at.is_none() {
            reminder.next_send_at = Some(reminder.scheduled_time);
        }
        let id = reminder.id.clone();
        let mut map = self.reminders.write().await;
        map.insert(id.clone(), reminder);
        Ok(id)
    }

    async fn due(&self, now: DateTime<Utc>) -> Result<Vec<Reminder>, NotifyError> {
        let map = self.reminders.read().await;
        let mut due: Vec<Reminder> = map.values().filter(|r| r.is_due(now)).cloned().collect();
        due.sort_by_key(|r| r.next_send_at);
        Ok(due)
    }

    async fn update(&self, reminder: Reminder) -> Result<(), NotifyError> {
        let mut map = self.reminders.write().await;
        match map.get_mut(&reminder.id) {
            Some(stored) => {
                *stored = reminder;
                Ok(())
            }
            None => Err(NotifyError::Store(format!(
                "reminder {} not found",
                reminder.id
            ))),
        }
    }

    async fn get(&self, id: &str) -> Result<Option<Reminder>, NotifyError> {
        let map = self.reminders.read().await;
        Ok(map.get(id).cloned())
    }
}

/// In-memory user directory
#[derive(Default)]
pub struct InMemoryUserDirectory {
    users: Arc<RwLock<HashMap<String, UserRecord>>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn upsert(&self, user: UserRecord) {
        let mut map = self.users.write().await;
        map.insert(user.id.clone(), user);
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn list_users(&self) -> Result<Vec<UserRecord>, NotifyError> {
        let map = self.users.read().await;
        let mut users: Vec<UserRecord> = map.values().cloned().collect();
        users.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(users)
    }
}
