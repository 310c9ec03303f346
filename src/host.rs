//! Desktop host integration: toasts as WebView events, downloads via the
//! native save dialog or the OS downloads folder.

use crate::config::{DownloadConfig, DownloadMode};
use crate::download::{check_file_name, write_file, DirectorySink, DownloadError, DownloadSink};
use crate::notify::{Notification, Notifier};
use std::path::PathBuf;
use tauri::{AppHandle, Emitter, Manager};
use tauri_plugin_dialog::DialogExt;
use tauri_plugin_opener::OpenerExt;

/// Event name the page listens on for toasts.
pub const TOAST_EVENT: &str = "toast";

/// Emits notifications to the frontend.
pub struct EventNotifier {
    app: AppHandle,
}

impl EventNotifier {
    pub fn new(app: AppHandle) -> Self {
        Self { app }
    }
}

impl Notifier for EventNotifier {
    fn notify(&self, notification: &Notification) {
        if let Err(e) = self.app.emit(TOAST_EVENT, notification) {
            log::error!("Failed to emit {} event: {}", TOAST_EVENT, e);
        }
    }
}

enum SaveTarget {
    Dialog,
    Directory(DirectorySink),
}

/// Save mechanism for the desktop app.
pub struct DesktopSink {
    app: AppHandle,
    target: SaveTarget,
    reveal_after_save: bool,
}

impl DesktopSink {
    pub fn from_config(app: &AppHandle, config: &DownloadConfig) -> Self {
        let target = match config.mode {
            DownloadMode::Dialog => SaveTarget::Dialog,
            DownloadMode::Directory => {
                let dir = config
                    .directory
                    .clone()
                    .or_else(|| app.path().download_dir().ok());
                match dir {
                    Some(dir) => {
                        log::info!("Exports go to {}", dir.display());
                        SaveTarget::Directory(DirectorySink::new(dir))
                    }
                    None => {
                        log::warn!("No downloads folder available, falling back to save dialog");
                        SaveTarget::Dialog
                    }
                }
            }
        };

        Self {
            app: app.clone(),
            target,
            reveal_after_save: config.reveal_after_save,
        }
    }

    async fn save_with_dialog(
        &self,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<Option<PathBuf>, DownloadError> {
        check_file_name(file_name)?;

        let (tx, rx) = tokio::sync::oneshot::channel();
        self.app
            .dialog()
            .file()
            .set_file_name(file_name)
            .add_filter("PNG image", &["png"])
            .save_file(move |path| {
                let _ = tx.send(path);
            });

        let chosen = rx
            .await
            .map_err(|e| DownloadError::DialogError(e.to_string()))?;
        let Some(chosen) = chosen else {
            return Ok(None);
        };

        let path = chosen
            .into_path()
            .map_err(|e| DownloadError::DialogError(e.to_string()))?;
        let path = write_file(path, bytes.to_vec()).await?;

        log::info!("Saved {} ({} bytes)", path.display(), bytes.len());
        Ok(Some(path))
    }
}

impl DownloadSink for DesktopSink {
    async fn save(&self, file_name: &str, bytes: &[u8]) -> Result<Option<PathBuf>, DownloadError> {
        let saved = match &self.target {
            SaveTarget::Dialog => self.save_with_dialog(file_name, bytes).await?,
            SaveTarget::Directory(sink) => sink.save(file_name, bytes).await?,
        };

        if self.reveal_after_save {
            if let Some(path) = &saved {
                if let Err(e) = self.app.opener().reveal_item_in_dir(path) {
                    log::warn!("Could not reveal {}: {}", path.display(), e);
                }
            }
        }

        Ok(saved)
    }
}
