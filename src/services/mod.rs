pub mod codec;
pub mod dispatcher;
pub mod notifier;
pub mod scheduler;
pub mod store;

pub use codec::{DynImageCodec, ImageCodec, ImageCrateCodec};
pub use dispatcher::{JobDispatcher, JobWorker};
pub use notifier::{
    compose_message, DeliveryProvider, DispatchOutcome, LoggingDeliveryProvider,
    NotificationDispatcher, NotificationService, SkipReason,
};
pub use scheduler::{next_send_at, ReminderRunReport, ReminderScheduler};
pub use store::{
    InMemoryNotificationStore, InMemoryPreferenceStore, InMemoryReminderStore,
    InMemoryUserDirectory, NotificationStore, PreferenceStore, ReminderStore, UserDirectory,
};
