//! Application configuration.
//!
//! Read from `config.toml` in the app config directory. Every field has a
//! default, so a missing file (or a partial one) is fine.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {message}")]
    ReadError { path: PathBuf, message: String },

    #[error("Failed to parse config: {0}")]
    ParseError(String),

    #[error("Invalid config value for {field}: {message}")]
    Invalid { field: &'static str, message: String },
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub qr: QrConfig,
    pub export: ExportConfig,
    pub download: DownloadConfig,
}

/// QR error correction level.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum ErrorCorrection {
    /// ~7% recovery
    #[default]
    L,
    /// ~15% recovery
    M,
    /// ~25% recovery
    Q,
    /// ~30% recovery
    H,
}

/// How the displayed vector graphic is generated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct QrConfig {
    /// Display width/height in pixels
    pub display_size: u32,
    pub error_correction: ErrorCorrection,
    /// Quiet zone around the code, in modules
    pub quiet_zone: u32,
    pub dark_color: String,
    pub light_color: String,
}

impl Default for QrConfig {
    fn default() -> Self {
        Self {
            display_size: 256,
            error_correction: ErrorCorrection::L,
            quiet_zone: 0,
            dark_color: "#000000".to_string(),
            light_color: "#ffffff".to_string(),
        }
    }
}

/// Raster export settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExportConfig {
    /// Raster width/height in pixels
    pub size: u32,
    /// Opaque fill drawn before the QR code
    pub background: String,
    /// File name prefix; the timestamp and `.png` are appended
    pub file_prefix: String,
    /// Pause before the pipeline starts so the page can show progress
    pub start_delay_ms: u64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            size: 512,
            background: "#ffffff".to_string(),
            file_prefix: "qr-code".to_string(),
            start_delay_ms: 0,
        }
    }
}

/// Where exported files go.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DownloadMode {
    /// Ask with a native save dialog
    #[default]
    Dialog,
    /// Write straight into a directory
    Directory,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DownloadConfig {
    pub mode: DownloadMode,
    /// Overrides the OS downloads folder in directory mode
    pub directory: Option<PathBuf>,
    /// Show the saved file in the file manager
    pub reveal_after_save: bool,
}

impl AppConfig {
    /// Parse and validate configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: AppConfig =
            toml::from_str(text).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load `config.toml` from a directory. A missing file yields defaults.
    pub fn load_from_dir(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join("config.toml");
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
            path: path.clone(),
            message: e.to_string(),
        })?;
        let config = Self::from_toml_str(&text)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load configuration, falling back to defaults on any error.
    pub fn load_or_default(dir: &Path) -> Self {
        match Self::load_from_dir(dir) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("{}; using default configuration", e);
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        parse_hex_color(&self.qr.dark_color).ok_or_else(|| invalid_color("qr.dark_color"))?;
        parse_hex_color(&self.qr.light_color).ok_or_else(|| invalid_color("qr.light_color"))?;
        parse_hex_color(&self.export.background)
            .ok_or_else(|| invalid_color("export.background"))?;

        check_export_size(self.export.size)?;

        if self.qr.display_size == 0 {
            return Err(ConfigError::Invalid {
                field: "qr.display_size",
                message: "must be greater than zero".to_string(),
            });
        }

        let prefix = &self.export.file_prefix;
        if prefix.is_empty() || prefix.contains(['/', '\\']) {
            return Err(ConfigError::Invalid {
                field: "export.file_prefix",
                message: format!("'{}' is not a usable file name prefix", prefix),
            });
        }

        Ok(())
    }
}

/// Largest raster export side, in pixels.
pub const MAX_EXPORT_SIZE: u32 = 8192;

/// Reject export sizes that cannot be allocated or would exhaust memory.
pub fn check_export_size(size: u32) -> Result<(), ConfigError> {
    if !(1..=MAX_EXPORT_SIZE).contains(&size) {
        return Err(ConfigError::Invalid {
            field: "export.size",
            message: format!("{} is outside 1..={}", size, MAX_EXPORT_SIZE),
        });
    }
    Ok(())
}

fn invalid_color(field: &'static str) -> ConfigError {
    ConfigError::Invalid {
        field,
        message: "expected a #rrggbb colour".to_string(),
    }
}

/// Parse a `#rrggbb` colour into RGB components.
pub fn parse_hex_color(value: &str) -> Option<[u8; 3]> {
    let hex = value.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }

    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some([channel(0)?, channel(2)?, channel(4)?])
}
