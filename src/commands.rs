//! Tauri commands for the QR form.
//!
//! These commands expose the session and the export pipeline to the
//! WebView frontend via IPC.
//!
//! Note: the session mutex is never held across an await. `export_png`
//! snapshots the URL and graphic first and runs the pipeline unlocked.

use crate::config::AppConfig;
use crate::export::{ExportError, ExportOutcome, ExportPipeline};
use crate::host::{DesktopSink, EventNotifier};
use crate::session::{UiSession, ViewState};
use crate::validator;
use std::sync::{Mutex, MutexGuard};
use tauri::State;

pub type DesktopPipeline = ExportPipeline<DesktopSink, EventNotifier>;

/// Application state shared by all commands.
pub struct AppState {
    /// Candidate URL and its rendered QR graphic
    pub session: Mutex<UiSession>,
    /// Export pipeline; owns the in-progress flag
    pub pipeline: DesktopPipeline,
    /// Configuration loaded at startup
    pub config: AppConfig,
}

impl AppState {
    pub fn new(session: UiSession, pipeline: DesktopPipeline, config: AppConfig) -> Self {
        Self {
            session: Mutex::new(session),
            pipeline,
            config,
        }
    }

    fn session(&self) -> MutexGuard<'_, UiSession> {
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn view(&self) -> ViewState {
        self.session().view(self.pipeline.is_running())
    }
}

/// Update the candidate URL; returns the new view.
#[tauri::command]
pub fn update_url(url: String, state: State<AppState>) -> ViewState {
    state.session().set_url(url);
    state.view()
}

/// Get the current view.
#[tauri::command]
pub fn get_view(state: State<AppState>) -> ViewState {
    state.view()
}

/// Check a candidate without touching the session.
#[tauri::command]
pub fn validate_url(candidate: String) -> bool {
    validator::is_valid_url(&candidate)
}

/// Export the displayed QR code as a PNG.
///
/// Failures are also reported through a `toast` event.
#[tauri::command]
pub async fn export_png(state: State<'_, AppState>) -> Result<ExportOutcome, ExportError> {
    let (url, graphic) = state.session().export_source();
    state.pipeline.export(&url, graphic.as_ref()).await
}

/// Get the active configuration.
#[tauri::command]
pub fn get_config(state: State<AppState>) -> AppConfig {
    state.config.clone()
}
