//! Scheduled reminders, notification cleanup and the weekly timesheet nudge.
//!
//! Reminder times are interpreted in one fixed UTC offset (the
//! `reminders.utc_offset_hours` setting). Only the hour and minute of a
//! reminder's `scheduled_time` matter once it has fired.

use chrono::{DateTime, Datelike, Days, Duration, FixedOffset, NaiveDate, TimeZone, Timelike, Utc, Weekday};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use utoipa::ToSchema;

use super::notifier::NotificationService;
use super::store::{ReminderStore, UserDirectory};
use crate::error::NotifyError;
use crate::models::{types, Frequency, Notification, Reminder, ReminderConfig};

/// Route opened by reminder notifications.
pub const REMINDERS_ROUTE: &str = "/notifications";

/// Route opened by the timesheet reminder.
pub const TIMESHEET_ROUTE: &str = "/job-records/create";

/// Local hour at which the Friday timesheet reminder goes out.
pub const TIMESHEET_HOUR: u32 = 9;

/// Weekday for a reminder day number (1 = Sunday ... 7 = Saturday).
pub fn reminder_weekday(day: u32) -> Option<Weekday> {
    match day {
        1 => Some(Weekday::Sun),
        2 => Some(Weekday::Mon),
        3 => Some(Weekday::Tue),
        4 => Some(Weekday::Wed),
        5 => Some(Weekday::Thu),
        6 => Some(Weekday::Fri),
        7 => Some(Weekday::Sat),
        _ => None,
    }
}

fn last_day_of_month(year: i32, month: u32) -> Option<u32> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?
        .pred_opt()
        .map(|d| d.day())
}

/// When a reminder that fired at `now` should fire next.
///
/// `None` for one-off reminders (they are deactivated instead).
pub fn next_send_at(
    reminder: &Reminder,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> Option<DateTime<Utc>> {
    let today = now.with_timezone(&offset).date_naive();
    let scheduled = reminder.scheduled_time.with_timezone(&offset);

    let date = match reminder.frequency {
        Frequency::Once => return None,
        Frequency::Daily => today.checked_add_days(Days::new(1))?,
        Frequency::Weekly => {
            let mut date = today.checked_add_days(Days::new(7))?;
            if let Some(target) = reminder.day_of_week.and_then(reminder_weekday) {
                while date.weekday() != target {
                    date = date.succ_opt()?;
                }
            }
            date
        }
        Frequency::Monthly => {
            let (year, month) = if today.month() == 12 {
                (today.year() + 1, 1)
            } else {
                (today.year(), today.month() + 1)
            };
            let wanted = reminder.day_of_month.unwrap_or_else(|| scheduled.day());
            let day = wanted.clamp(1, last_day_of_month(year, month)?);
            NaiveDate::from_ymd_opt(year, month, day)?
        }
    };

    let local = date.and_hms_opt(scheduled.hour(), scheduled.minute(), 0)?;
    offset
        .from_local_datetime(&local)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Summary of one `process_due` run.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ReminderRunReport {
    /// Reminders that fired
    pub processed: usize,
    /// Reminders that could not be processed
    pub failed: usize,
    /// Notifications created
    pub notifications: usize,
}

#[derive(Default)]
struct RunState {
    last_cleanup: Option<DateTime<Utc>>,
    last_timesheet: Option<NaiveDate>,
}

pub struct ReminderScheduler {
    notifications: Arc<NotificationService>,
    reminders: Arc<dyn ReminderStore>,
    users: Arc<dyn UserDirectory>,
    config: ReminderConfig,
    offset: FixedOffset,
    state: Mutex<RunState>,
}

impl ReminderScheduler {
    pub fn new(
        notifications: Arc<NotificationService>,
        reminders: Arc<dyn ReminderStore>,
        users: Arc<dyn UserDirectory>,
        config: ReminderConfig,
    ) -> Self {
        let offset = config.offset();
        Self {
            notifications,
            reminders,
            users,
            config,
            offset,
            state: Mutex::new(RunState::default()),
        }
    }

    /// Fire every reminder due at `now`. A failing reminder is logged and
    /// counted; the others still run.
    pub async fn process_due(&self, now: DateTime<Utc>) -> Result<ReminderRunReport, NotifyError> {
        let due = self.reminders.due(now).await?;
        let mut report = ReminderRunReport::default();

        for reminder in due {
            let id = reminder.id.clone();
            match self.fire(reminder, now).await {
                Ok(sent) => {
                    report.processed += 1;
                    report.notifications += sent;
                }
                Err(e) => {
                    report.failed += 1;
                    tracing::error!(reminder_id = %id, error = %e, "Failed to process reminder");
                }
            }
        }

        if report.processed > 0 || report.failed > 0 {
            tracing::info!(
                processed = report.processed,
                failed = report.failed,
                notifications = report.notifications,
                "Processed due reminders"
            );
        }
        Ok(report)
    }

    async fn fire(&self, mut reminder: Reminder, now: DateTime<Utc>) -> Result<usize, NotifyError> {
        let mut sent = 0;
        for user_id in &reminder.target_user_ids {
            let notification = Notification::new(
                user_id.clone(),
                types::SCHEDULED_REMINDER,
                reminder.title.clone(),
                reminder.message.clone(),
            )
            .with_data("reminder_id", reminder.id.clone())
            .with_data("route", REMINDERS_ROUTE)
            .with_created_at(now);

            self.notifications.publish(notification).await?;
            sent += 1;
        }

        reminder.last_sent_at = Some(now);
        reminder.next_send_at = next_send_at(&reminder, now, self.offset);
        if reminder.next_send_at.is_none() {
            reminder.is_active = false;
        }
        tracing::debug!(
            reminder_id = %reminder.id,
            next_send_at = ?reminder.next_send_at,
            active = reminder.is_active,
            "Reminder rescheduled"
        );
        self.reminders.update(reminder).await?;
        Ok(sent)
    }

    /// Delete notifications older than the retention period.
    pub async fn cleanup(&self, now: DateTime<Utc>) -> Result<usize, NotifyError> {
        let cutoff = now - Duration::days(self.config.retention_days);
        let deleted = self
            .notifications
            .store()
            .delete_created_before(cutoff)
            .await?;
        tracing::info!(deleted, %cutoff, "Cleaned up old notifications");
        Ok(deleted)
    }

    /// Send the timesheet reminder to every non-admin user.
    pub async fn timesheet_reminders(&self) -> Result<usize, NotifyError> {
        let users = self.users.list_users().await?;
        let mut sent = 0;
        for user in users.iter().filter(|u| !u.is_admin()) {
            let notification = Notification::new(
                user.id.clone(),
                types::TIMESHEET_REMINDER,
                "Timesheet Reminder",
                "Please submit your timesheet for this week.",
            )
            .with_data("route", TIMESHEET_ROUTE);

            self.notifications.publish(notification).await?;
            sent += 1;
        }
        tracing::info!(sent, "Sent timesheet reminders");
        Ok(sent)
    }

    /// One scheduler tick: due reminders always, cleanup once a day,
    /// timesheet reminders on Friday at 09:xx local time once a day.
    pub async fn tick(&self, now: DateTime<Utc>) {
        if let Err(e) = self.process_due(now).await {
            tracing::error!(error = %e, "Reminder run failed");
        }

        let mut state = self.state.lock().await;

        let cleanup_due = state
            .last_cleanup
            .map_or(true, |last| now - last >= Duration::days(1));
        if cleanup_due {
            match self.cleanup(now).await {
                Ok(_) => state.last_cleanup = Some(now),
                Err(e) => tracing::error!(error = %e, "Notification cleanup failed"),
            }
        }

        let local = now.with_timezone(&self.offset);
        let today = local.date_naive();
        if local.weekday() == Weekday::Fri
            && local.hour() == TIMESHEET_HOUR
            && state.last_timesheet != Some(today)
        {
            match self.timesheet_reminders().await {
                Ok(_) => state.last_timesheet = Some(today),
                Err(e) => tracing::error!(error = %e, "Timesheet reminders failed"),
            }
        }
    }

    /// Tick every `poll_interval_secs` until the task is dropped.
    pub async fn run(self: Arc<Self>) {
        let period = std::time::Duration::from_secs(self.config.poll_interval_secs.max(1));
        let mut interval = tokio::time::interval(period);
        tracing::info!(
            poll_interval_secs = period.as_secs(),
            utc_offset = %self.offset,
            "Reminder scheduler started"
        );
        loop {
            interval.tick().await;
            self.tick(Utc::now()).await;
        }
    }
}
