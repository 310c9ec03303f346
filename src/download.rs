//! Download sinks: where exported files end up.

use std::future::Future;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while saving an exported file.
#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("Invalid file name: {0}")]
    InvalidName(String),

    #[error("Failed to write {path}: {message}")]
    WriteError { path: PathBuf, message: String },

    #[error("Save dialog failed: {0}")]
    DialogError(String),
}

/// The host's save mechanism.
pub trait DownloadSink: Send + Sync {
    /// Offer `bytes` to the user as `file_name`.
    ///
    /// Returns the saved path, or `None` if the user dismissed the save.
    fn save(
        &self,
        file_name: &str,
        bytes: &[u8],
    ) -> impl Future<Output = Result<Option<PathBuf>, DownloadError>> + Send;
}

/// Writes files straight into a directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write synchronously; the directory is created if missing.
    pub fn write(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, DownloadError> {
        check_file_name(file_name)?;

        std::fs::create_dir_all(&self.dir).map_err(|e| DownloadError::WriteError {
            path: self.dir.clone(),
            message: e.to_string(),
        })?;

        let path = self.dir.join(file_name);
        std::fs::write(&path, bytes).map_err(|e| DownloadError::WriteError {
            path: path.clone(),
            message: e.to_string(),
        })?;

        log::info!("Saved {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }
}

impl DownloadSink for DirectorySink {
    async fn save(&self, file_name: &str, bytes: &[u8]) -> Result<Option<PathBuf>, DownloadError> {
        let sink = self.clone();
        let name = file_name.to_string();
        let bytes = bytes.to_vec();

        tokio::task::spawn_blocking(move || sink.write(&name, &bytes))
            .await
            .map_err(|e| DownloadError::WriteError {
                path: self.dir.join(file_name),
                message: e.to_string(),
            })?
            .map(Some)
    }
}

/// Write `bytes` to `path` on the blocking pool.
pub async fn write_file(path: PathBuf, bytes: Vec<u8>) -> Result<PathBuf, DownloadError> {
    let target = path.clone();
    let result = tokio::task::spawn_blocking(move || std::fs::write(&target, &bytes))
        .await
        .map_err(|e| e.to_string())
        .and_then(|written| written.map_err(|e| e.to_string()));

    match result {
        Ok(()) => Ok(path),
        Err(message) => Err(DownloadError::WriteError { path, message }),
    }
}

/// Reject names that would escape the target directory.
pub fn check_file_name(file_name: &str) -> Result<(), DownloadError> {
    let bad = file_name.is_empty()
        || file_name == "."
        || file_name == ".."
        || file_name.contains(['/', '\\', '\0']);
    if bad {
        return Err(DownloadError::InvalidName(file_name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_directory_sink_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(dir.path().join("nested"));

        let saved = sink.save("qr-code-1.png", &[1, 2, 3]).await.unwrap().unwrap();
        assert_eq!(saved, dir.path().join("nested").join("qr-code-1.png"));
        assert_eq!(std::fs::read(saved).unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_directory_sink_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(dir.path());

        assert!(matches!(
            sink.save("../escape.png", &[0]).await,
            Err(DownloadError::InvalidName(_))
        ));
        assert!(matches!(sink.save("", &[0]).await, Err(DownloadError::InvalidName(_))));
    }

    #[tokio::test]
    async fn test_write_file_reports_missing_parent() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("missing").join("qr-code-1.png");

        assert!(matches!(
            write_file(target.clone(), vec![1]).await,
            Err(DownloadError::WriteError { path, .. }) if path == target
        ));

        let target = dir.path().join("qr-code-2.png");
        assert_eq!(write_file(target.clone(), vec![7, 8]).await.unwrap(), target);
        assert_eq!(std::fs::read(target).unwrap(), vec![7, 8]);
    }
}
