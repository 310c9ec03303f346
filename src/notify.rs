//! User-visible notifications (toasts).

use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Presentation hint for the page.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Default,
    Destructive,
}

/// A toast with a title and a description.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub variant: Variant,
}

impl Notification {
    pub fn info(title: &str, description: &str) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
            variant: Variant::Default,
        }
    }

    pub fn failure(title: &str, description: &str) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
            variant: Variant::Destructive,
        }
    }

    pub fn download_succeeded() -> Self {
        Self::info("Download successful", "QR code has been downloaded as PNG")
    }

    pub fn download_cancelled() -> Self {
        Self::info("Download cancelled", "The QR code was not saved")
    }
}

/// Something that can present notifications to the user.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: &Notification);
}

/// Notifier that keeps every notification, for inspection.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.seen.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: &Notification) {
        self.seen
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(notification.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_notifier_keeps_order() {
        let notifier = RecordingNotifier::new();
        notifier.notify(&Notification::download_succeeded());
        notifier.notify(&Notification::download_cancelled());

        let seen = notifier.notifications();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].title, "Download successful");
        assert_eq!(seen[1].title, "Download cancelled");
    }

    #[test]
    fn test_serializes_for_the_page() {
        let value = serde_json::to_value(Notification::failure("Download failed", "x")).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "title": "Download failed",
                "description": "x",
                "variant": "destructive"
            })
        );
    }
}
