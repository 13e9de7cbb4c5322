pub mod jobs;
pub mod notifications;

pub use jobs::{__path_handle_cancel_job, __path_handle_submit_job};
pub use jobs::{handle_cancel_job, handle_submit_job, CancelResponse};
pub use notifications::{
    __path_handle_create_reminder, __path_handle_publish, __path_handle_put_preferences,
    __path_handle_run_reminders,
};
pub use notifications::{
    handle_create_reminder, handle_publish, handle_put_preferences, handle_run_reminders,
    PublishResponse, ReminderCreated,
};
