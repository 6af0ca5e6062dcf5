use log::{error, info};
use serde::Serialize;
use std::sync::Mutex;

/// User-facing message texts
pub mod messages {
    pub const SAVE_SUCCESS: &str = "Saved successfully";
    pub const UPDATE_SUCCESS: &str = "Updated successfully";
    pub const DELETE_SUCCESS: &str = "Deleted successfully";
    pub const SAVE_FAILED: &str = "Error while saving";
    pub const DELETE_FAILED: &str = "Error while deleting";
    pub const LOAD_FAILED: &str = "Error while loading data";
    pub const NETWORK_ERROR: &str = "Connection error";
    pub const EXPORT_SUCCESS: &str = "Export completed";
    pub const EXPORT_FAILED: &str = "Error while exporting";
    pub const REPORT_SUCCESS: &str = "Report generated";
    pub const NOTHING_TO_EXPORT: &str = "No data to export";
    pub const MISSING_CONFIGURATION: &str = "Configure the data API before continuing";
    pub const SYNC_SUCCESS: &str = "Synchronization completed";
    pub const SYNC_FAILED: &str = "Synchronization failed";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Success,
    Error,
    Info,
}

/// A transient message for the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

/// Sink for user notifications
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);

    fn success(&self, message: &str) {
        self.notify(Notification {
            level: NotificationLevel::Success,
            message: message.to_string(),
        });
    }

    fn error(&self, message: &str) {
        self.notify(Notification {
            level: NotificationLevel::Error,
            message: message.to_string(),
        });
    }

    fn info(&self, message: &str) {
        self.notify(Notification {
            level: NotificationLevel::Info,
            message: message.to_string(),
        });
    }
}

/// Notifier that only writes to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Error => error!("{}", notification.message),
            _ => info!("{}", notification.message),
        }
    }
}

/// Buffers notifications until a front end drains them
#[derive(Debug, Default)]
pub struct NotificationQueue {
    pending: Mutex<Vec<Notification>>,
}

impl NotificationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&self) -> Vec<Notification> {
        match self.pending.lock() {
            Ok(mut pending) => std::mem::take(&mut *pending),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }

    pub fn len(&self) -> usize {
        self.pending.lock().map(|p| p.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Notifier for NotificationQueue {
    fn notify(&self, notification: Notification) {
        LogNotifier.notify(notification.clone());
        if let Ok(mut pending) = self.pending.lock() {
            pending.push(notification);
        }
    }
}

/// Question put to the user before a destructive action
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfirmPrompt {
    pub title: String,
    pub message: String,
}

impl ConfirmPrompt {
    pub fn delete(entity_name: &str, label: &str) -> Self {
        Self {
            title: format!("Delete {}", entity_name.to_lowercase()),
            message: format!(
                "Are you sure you want to delete \"{}\"? This action cannot be undone.",
                label
            ),
        }
    }
}

/// Asks the user to confirm a destructive action
pub trait Confirmer: Send + Sync {
    fn confirm(&self, prompt: &ConfirmPrompt) -> bool;
}

/// Fixed answer, for scripted use
#[derive(Debug, Clone, Copy)]
pub struct AutoConfirm(pub bool);

impl Confirmer for AutoConfirm {
    fn confirm(&self, _prompt: &ConfirmPrompt) -> bool {
        self.0
    }
}
