//! Vector-to-raster export pipeline.
//!
//! Turns the currently displayed QR graphic into a PNG and hands it to a
//! download sink. One run at a time; every run clears its in-progress flag
//! and releases its object URLs no matter how it ends.

mod blob;
mod guard;
mod raster;

pub use blob::{Blob, BlobStore, ObjectUrl};
pub use raster::RasterSurface;

use crate::config::{check_export_size, parse_hex_color, ConfigError, ExportConfig};
use crate::download::DownloadSink;
use crate::notify::{Notification, Notifier};
use crate::qr::VectorGraphic;
use guard::InProgressGuard;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during an export run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExportError {
    #[error("No URL provided")]
    NoInputProvided,

    #[error("QR code graphic not found")]
    SourceNotFound,

    #[error("Raster surface could not be created")]
    RenderingUnsupported,

    #[error("Could not decode QR code image: {0}")]
    DecodeFailed(String),

    #[error("Export failed: {0}")]
    Unknown(String),
}

impl ExportError {
    /// The toast shown for this failure.
    pub fn notification(&self) -> Notification {
        match self {
            ExportError::NoInputProvided => Notification::failure(
                "No URL provided",
                "Please enter a URL to generate a QR code",
            ),
            ExportError::SourceNotFound => {
                Notification::failure("Download failed", "Could not find QR code to download")
            }
            ExportError::RenderingUnsupported => Notification::failure(
                "Download failed",
                "Image rendering is not supported on this system",
            ),
            ExportError::DecodeFailed(_) => {
                Notification::failure("Download failed", "Could not process QR code image")
            }
            ExportError::Unknown(_) => {
                Notification::failure("Download failed", "An error occurred while downloading")
            }
        }
    }
}

impl Serialize for ExportError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Details of a saved export.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExportReceipt {
    pub file_name: String,
    /// Where the sink stored the file
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    /// Encoded PNG size
    pub bytes: usize,
}

/// How an export call ended, when it did not fail.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ExportOutcome {
    Saved(ExportReceipt),
    /// The user dismissed the save dialog
    Cancelled,
    /// Another run holds the in-progress flag; nothing was started
    AlreadyRunning,
}

/// Resolved export settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSettings {
    pub size: u32,
    pub background: [u8; 3],
    pub file_prefix: String,
    pub start_delay: Duration,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            size: 512,
            background: [255, 255, 255],
            file_prefix: "qr-code".to_string(),
            start_delay: Duration::ZERO,
        }
    }
}

impl TryFrom<&ExportConfig> for ExportSettings {
    type Error = ConfigError;

    fn try_from(config: &ExportConfig) -> Result<Self, Self::Error> {
        let background =
            parse_hex_color(&config.background).ok_or_else(|| ConfigError::Invalid {
                field: "export.background",
                message: "expected a #rrggbb colour".to_string(),
            })?;
        check_export_size(config.size)?;

        Ok(Self {
            size: config.size,
            background,
            file_prefix: config.file_prefix.clone(),
            start_delay: Duration::from_millis(config.start_delay_ms),
        })
    }
}

/// The export pipeline, generic over where files go and how the user is told.
pub struct ExportPipeline<S, N> {
    settings: ExportSettings,
    sink: S,
    notifier: N,
    blobs: BlobStore,
    in_progress: AtomicBool,
    last_stamp: AtomicI64,
}

impl<S: DownloadSink, N: Notifier> ExportPipeline<S, N> {
    pub fn new(settings: ExportSettings, sink: S, notifier: N) -> Self {
        Self {
            settings,
            sink,
            notifier,
            blobs: BlobStore::new(),
            in_progress: AtomicBool::new(false),
            last_stamp: AtomicI64::new(0),
        }
    }

    pub fn settings(&self) -> &ExportSettings {
        &self.settings
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Object URLs created by runs; empty whenever no run is active.
    pub fn blobs(&self) -> &BlobStore {
        &self.blobs
    }

    /// Whether a run currently holds the in-progress flag.
    pub fn is_running(&self) -> bool {
        self.in_progress.load(Ordering::Acquire)
    }

    /// Export `source` (the graphic rendered for `url`) as a PNG.
    ///
    /// Failures are logged and notified here, then returned to the caller.
    pub async fn export(
        &self,
        url: &str,
        source: Option<&VectorGraphic>,
    ) -> Result<ExportOutcome, ExportError> {
        let result = self.run(url, source).await;

        match &result {
            Ok(ExportOutcome::Saved(receipt)) => {
                log::info!(
                    "Exported {} ({}x{}, {} bytes) to {}",
                    receipt.file_name,
                    receipt.width,
                    receipt.height,
                    receipt.bytes,
                    receipt.path.display()
                );
                self.notifier.notify(&Notification::download_succeeded());
            }
            Ok(ExportOutcome::Cancelled) => {
                log::info!("Export cancelled by user");
                self.notifier.notify(&Notification::download_cancelled());
            }
            Ok(ExportOutcome::AlreadyRunning) => {
                log::debug!("Export already in progress, ignoring request");
            }
            Err(e) => {
                log::warn!("Export failed: {}", e);
                self.notifier.notify(&e.notification());
            }
        }

        result
    }

    async fn run(
        &self,
        url: &str,
        source: Option<&VectorGraphic>,
    ) -> Result<ExportOutcome, ExportError> {
        if url.is_empty() {
            return Err(ExportError::NoInputProvided);
        }

        // Declared first so it drops last, after every object URL
        let Some(_in_progress) = InProgressGuard::acquire(&self.in_progress) else {
            return Ok(ExportOutcome::AlreadyRunning);
        };

        // Let the page paint its "generating" state before the work starts
        if self.settings.start_delay.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.settings.start_delay).await;
        }

        let graphic = source.ok_or(ExportError::SourceNotFound)?;
        let markup = graphic.serialize();
        log::debug!("Exporting {} ({} bytes of SVG)", url, markup.len());

        let surface = RasterSurface::new(self.settings.size, self.settings.background)?;
        let (width, height) = (surface.width(), surface.height());

        let png = {
            let svg_url = self
                .blobs
                .create_object_url(markup.into_bytes(), "image/svg+xml;charset=utf-8");
            let svg = self.resolve(&svg_url)?;

            tokio::task::spawn_blocking(move || {
                let mut surface = surface;
                surface.draw_svg(&svg.bytes)?;
                surface.encode_png()
            })
            .await
            .map_err(|e| ExportError::Unknown(format!("Raster worker failed: {}", e)))??
        };

        let file_name = self.next_file_name();
        let png_url = self.blobs.create_object_url(png, "image/png");
        let download = self.resolve(&png_url)?;

        let saved = self
            .sink
            .save(&file_name, &download.bytes)
            .await
            .map_err(|e| ExportError::Unknown(e.to_string()))?;

        Ok(match saved {
            Some(path) => ExportOutcome::Saved(ExportReceipt {
                file_name,
                path,
                width,
                height,
                bytes: download.bytes.len(),
            }),
            None => ExportOutcome::Cancelled,
        })
    }

    fn resolve(&self, url: &ObjectUrl<'_>) -> Result<Blob, ExportError> {
        self.blobs
            .resolve(url.as_str())
            .ok_or_else(|| ExportError::Unknown(format!("Object URL {} was revoked", url.as_str())))
    }

    /// `<prefix>-<unix-epoch-millis>.png`, strictly increasing per pipeline.
    fn next_file_name(&self) -> String {
        let now = chrono::Utc::now().timestamp_millis();
        let previous = self
            .last_stamp
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or(now);
        let stamp = now.max(previous + 1);

        format!("{}-{}.png", self.settings.file_prefix, stamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::DirectorySink;
    use crate::notify::RecordingNotifier;

    fn pipeline(dir: &std::path::Path) -> ExportPipeline<DirectorySink, RecordingNotifier> {
        ExportPipeline::new(
            ExportSettings::default(),
            DirectorySink::new(dir),
            RecordingNotifier::new(),
        )
    }

    #[test]
    fn test_file_names_are_unique_and_increasing() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(dir.path());

        let stamps: Vec<i64> = (0..50)
            .map(|_| {
                let name = pipeline.next_file_name();
                let stamp = name
                    .strip_prefix("qr-code-")
                    .and_then(|s| s.strip_suffix(".png"))
                    .unwrap();
                assert!(stamp.chars().all(|c| c.is_ascii_digit()));
                stamp.parse().unwrap()
            })
            .collect();

        assert!(stamps.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_each_error_has_distinct_message() {
        let errors = [
            ExportError::NoInputProvided,
            ExportError::SourceNotFound,
            ExportError::RenderingUnsupported,
            ExportError::DecodeFailed("bad".to_string()),
            ExportError::Unknown("oops".to_string()),
        ];
        let descriptions: std::collections::HashSet<String> = errors
            .iter()
            .map(|e| e.notification().description)
            .collect();
        assert_eq!(descriptions.len(), errors.len());
    }

    #[test]
    fn test_settings_from_config() {
        let config = ExportConfig {
            background: "#102030".to_string(),
            start_delay_ms: 300,
            ..ExportConfig::default()
        };
        let settings = ExportSettings::try_from(&config).unwrap();
        assert_eq!(settings.background, [0x10, 0x20, 0x30]);
        assert_eq!(settings.start_delay, Duration::from_millis(300));
        assert_eq!(settings.size, 512);

        let huge = ExportConfig {
            size: 100_000,
            ..ExportConfig::default()
        };
        assert!(matches!(
            ExportSettings::try_from(&huge),
            Err(ConfigError::Invalid { field: "export.size", .. })
        ));
    }

    #[test]
    fn test_outcome_serialization() {
        let value = serde_json::to_value(ExportOutcome::AlreadyRunning).unwrap();
        assert_eq!(value, serde_json::json!({ "status": "alreadyRunning" }));

        let err = serde_json::to_value(ExportError::SourceNotFound).unwrap();
        assert_eq!(err, serde_json::json!("QR code graphic not found"));
    }

    #[tokio::test]
    async fn test_empty_url_is_rejected_without_running() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(dir.path());

        let result = pipeline.export("", None).await;
        assert_eq!(result, Err(ExportError::NoInputProvided));
        assert!(!pipeline.is_running());

        let seen = pipeline.notifier().notifications();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].title, "No URL provided");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_garbage_markup_is_decode_failure() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(dir.path());
        let graphic = VectorGraphic::from_markup("<svg", 256);

        let result = pipeline.export("https://example.com", Some(&graphic)).await;
        assert!(matches!(result, Err(ExportError::DecodeFailed(_))));
        assert!(!pipeline.is_running());
        assert_eq!(pipeline.blobs().live_count(), 0);
        assert_eq!(
            pipeline.notifier().notifications()[0].description,
            "Could not process QR code image"
        );
    }

    #[tokio::test]
    async fn test_zero_size_surface_is_rendering_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = ExportPipeline::new(
            ExportSettings {
                size: 0,
                ..ExportSettings::default()
            },
            DirectorySink::new(dir.path()),
            RecordingNotifier::new(),
        );
        let graphic = crate::qr::render_svg("https://example.com", &Default::default()).unwrap();

        let result = pipeline.export("https://example.com", Some(&graphic)).await;
        assert_eq!(result, Err(ExportError::RenderingUnsupported));
        assert!(!pipeline.is_running());
        assert_eq!(pipeline.blobs().live_count(), 0);
    }
}
