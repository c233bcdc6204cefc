use crate::types::UploadedBlob;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;
use uuid::Uuid;

const HANDLE_PREFIX: &str = "blob:document-analyzer";

type Entries = Arc<Mutex<HashMap<String, Arc<UploadedBlob>>>>;

/// Registry of transient preview handles for uploaded documents.
///
/// Each handle is an openable URL that stays valid for as long as the
/// `PreviewHandle` returned by `register` is alive. Dropping the handle
/// revokes the URL.
#[derive(Debug, Clone)]
pub struct PreviewStore {
    scope: String,
    entries: Entries,
}

impl PreviewStore {
    pub fn new() -> Self {
        Self {
            scope: Uuid::new_v4().simple().to_string(),
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Create a new handle for `blob`. Every call yields a distinct URL.
    pub fn register(&self, blob: Arc<UploadedBlob>) -> PreviewHandle {
        let url = format!("{}/{}/{}", HANDLE_PREFIX, self.scope, Uuid::new_v4());
        debug!("Registering preview handle {} for {}", url, blob.filename);

        lock(&self.entries).insert(url.clone(), blob);

        PreviewHandle {
            url,
            entries: self.entries.clone(),
        }
    }

    /// Resolve a live handle URL back to its document
    pub fn open(&self, url: &str) -> Option<Arc<UploadedBlob>> {
        lock(&self.entries).get(url).cloned()
    }

    pub fn contains(&self, url: &str) -> bool {
        lock(&self.entries).contains_key(url)
    }

    pub fn live_handles(&self) -> usize {
        lock(&self.entries).len()
    }
}

impl Default for PreviewStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Scoped preview URL for one upload, revoked on drop
#[derive(Debug)]
pub struct PreviewHandle {
    url: String,
    entries: Entries,
}

impl PreviewHandle {
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        if lock(&self.entries).remove(&self.url).is_some() {
            debug!("Revoked preview handle {}", self.url);
        }
    }
}

fn lock(entries: &Entries) -> MutexGuard<'_, HashMap<String, Arc<UploadedBlob>>> {
    // A panic while holding the lock cannot leave the map half-updated
    entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
