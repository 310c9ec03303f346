// QR Studio - Native Tauri Backend
//
// This crate turns a URL into a QR code and exports it as a lossless PNG.
// The core (validation, SVG rendering, raster export) is plain Rust; the
// `desktop` feature adds the Tauri window, IPC commands and dialogs.

pub mod config;
pub mod download;
pub mod export;
pub mod logging;
pub mod notify;
pub mod qr;
pub mod session;
pub mod validator;

#[cfg(feature = "desktop")]
mod commands;
#[cfg(feature = "desktop")]
mod host;

#[cfg(feature = "desktop")]
pub use desktop::run;

#[cfg(feature = "desktop")]
mod desktop {
    use crate::commands::{
        export_png, get_config, get_view, update_url, validate_url, AppState,
    };
    use crate::config::AppConfig;
    use crate::export::{ExportPipeline, ExportSettings};
    use crate::host::{DesktopSink, EventNotifier};
    use crate::qr::QrStyle;
    use crate::session::UiSession;
    use tauri::Manager;

    /// Load config from the app config dir; defaults when missing or broken.
    fn load_config(app: &tauri::AppHandle) -> AppConfig {
        match app.path().app_config_dir() {
            Ok(dir) => AppConfig::load_or_default(&dir),
            Err(e) => {
                log::warn!("No app config directory ({}); using defaults", e);
                AppConfig::default()
            }
        }
    }

    /// Build the shared state once the app handle exists.
    fn build_state(app: &tauri::AppHandle) -> AppState {
        let mut config = load_config(app);
        let settings = match ExportSettings::try_from(&config.export) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("{}; using default export settings", e);
                config.export = Default::default();
                ExportSettings::default()
            }
        };

        let pipeline = ExportPipeline::new(
            settings,
            DesktopSink::from_config(app, &config.download),
            EventNotifier::new(app.clone()),
        );
        let session = UiSession::new(QrStyle::from(&config.qr));

        AppState::new(session, pipeline, config)
    }

    #[cfg_attr(mobile, tauri::mobile_entry_point)]
    pub fn run() {
        crate::logging::init_logging();

        tauri::Builder::default()
            .plugin(tauri_plugin_opener::init())
            .plugin(tauri_plugin_dialog::init())
            .invoke_handler(tauri::generate_handler![
                update_url,
                get_view,
                validate_url,
                export_png,
                get_config,
            ])
            .setup(|app| {
                let state = build_state(app.handle());
                app.manage(state);
                log::info!("App setup complete");
                Ok(())
            })
            .run(tauri::generate_context!())
            .expect("error while running tauri application");
    }
}
