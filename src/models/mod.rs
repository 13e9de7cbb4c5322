pub mod config;
pub mod job;
pub mod notification;

pub use config::{AppConfig, JobConfig, OutputFormat, ReminderConfig, ServerConfig};
pub use job::{
    FilterPayload, ImageSize, JobRequest, JobResponse, JobStatus, Operation, ParsedJob,
    PerspectivePayload, WireCorner,
};
pub use notification::{
    types, AndroidConfig, Frequency, Notification, NotificationAction, NotificationPreferences,
    PushMessage, Reminder, UserRecord, WebpushConfig,
};
