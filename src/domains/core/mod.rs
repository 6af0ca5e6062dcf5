pub mod feedback;
pub mod manager;
pub mod repository;
pub mod rest_client;

pub use feedback::{AutoConfirm, ConfirmPrompt, Confirmer, LogNotifier, Notification, NotificationLevel, NotificationQueue, Notifier};
pub use manager::{ChangeEvent, EntityDraft, EntityFilter, EntityManager, ManagedEntity};
pub use repository::{decode_record, decode_records, fetch_all, RepositoryClient};
pub use rest_client::RestRepositoryClient;
