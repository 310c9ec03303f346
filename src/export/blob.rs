//! Temporary object URLs for bytes that only live during one export run.
//!
//! Handles revoke themselves on drop, so every exit path of the pipeline
//! releases what it created.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Bytes registered under an object URL.
#[derive(Debug, Clone)]
pub struct Blob {
    pub bytes: Arc<[u8]>,
    pub mime: &'static str,
}

/// Registry of live object URLs.
#[derive(Debug, Default)]
pub struct BlobStore {
    entries: Mutex<HashMap<String, Blob>>,
    next_id: AtomicU64,
}

impl BlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register bytes and return a handle that revokes the URL when dropped.
    pub fn create_object_url(&self, bytes: impl Into<Arc<[u8]>>, mime: &'static str) -> ObjectUrl<'_> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let url = format!("blob:qr-studio/{}", id);
        let blob = Blob {
            bytes: bytes.into(),
            mime,
        };

        self.lock().insert(url.clone(), blob);
        log::trace!("Created object URL {} ({})", url, mime);

        ObjectUrl { store: self, url }
    }

    /// Look up a live object URL.
    pub fn resolve(&self, url: &str) -> Option<Blob> {
        self.lock().get(url).cloned()
    }

    /// Release an object URL. Unknown URLs are ignored.
    pub fn revoke(&self, url: &str) {
        if self.lock().remove(url).is_some() {
            log::trace!("Revoked object URL {}", url);
        }
    }

    /// Number of object URLs not yet revoked.
    pub fn live_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Blob>> {
        // A poisoned map only means a panic elsewhere; the entries are still usable
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Scoped object URL; revoked when dropped.
#[derive(Debug)]
pub struct ObjectUrl<'a> {
    store: &'a BlobStore,
    url: String,
}

impl ObjectUrl<'_> {
    pub fn as_str(&self) -> &str {
        &self.url
    }
}

impl Drop for ObjectUrl<'_> {
    fn drop(&mut self) {
        self.store.revoke(&self.url);
    }
}
