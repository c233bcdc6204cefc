use crate::preview::{PreviewHandle, PreviewStore};
use crate::types::{AnalyzerConfig, AnalyzerError, InputReference, Result, UploadedBlob};
use crate::utils::media;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Holds the user's chosen input: either an uploaded document or a remote
/// URL, never both.
///
/// Every mutation replaces the whole reference, so the two sources can not
/// coexist. The preview handle of an upload is released as soon as that
/// upload stops being the current reference, and when the resolver is dropped.
#[derive(Debug)]
pub struct InputResolver {
    reference: InputReference,
    accepted_media_type: String,
    previews: PreviewStore,
    preview: Option<PreviewHandle>,
}

impl InputResolver {
    pub fn new(accepted_media_type: impl Into<String>) -> Self {
        Self::with_store(accepted_media_type, PreviewStore::new())
    }

    pub fn from_config(config: &AnalyzerConfig) -> Self {
        Self::new(config.accepted_media_type.clone())
    }

    /// Resolver registering its preview handles in a caller-provided store
    pub fn with_store(accepted_media_type: impl Into<String>, previews: PreviewStore) -> Self {
        Self {
            reference: InputReference::None,
            accepted_media_type: accepted_media_type.into(),
            previews,
            preview: None,
        }
    }

    /// Select an uploaded document. Rejected uploads leave the current
    /// reference untouched.
    pub fn set_upload(&mut self, blob: UploadedBlob) -> Result<()> {
        if !media::matches(&blob.mime_type, &self.accepted_media_type) {
            warn!(
                "Rejecting upload {}: declared type '{}' is not {}",
                blob.filename, blob.mime_type, self.accepted_media_type
            );
            return Err(AnalyzerError::InvalidInputKind {
                declared: blob.mime_type,
                accepted: self.accepted_media_type.clone(),
            });
        }

        self.release_preview();
        info!("Document uploaded: {} ({} bytes)", blob.filename, blob.len());
        self.reference = InputReference::UploadedBlob(Arc::new(blob));
        Ok(())
    }

    /// Select a remote document, stored as given. Blank text clears the input.
    pub fn set_remote_url(&mut self, text: &str) {
        self.release_preview();

        if text.trim().is_empty() {
            debug!("Remote URL cleared");
            self.reference = InputReference::None;
        } else {
            debug!("Remote URL set: {}", text);
            self.reference = InputReference::RemoteLocator { url: text.to_string() };
        }
    }

    pub fn clear(&mut self) {
        self.release_preview();
        self.reference = InputReference::None;
    }

    /// Snapshot of the current input
    pub fn current_reference(&self) -> InputReference {
        self.reference.clone()
    }

    pub fn accepted_media_type(&self) -> &str {
        &self.accepted_media_type
    }

    /// Openable URL for the current input, or `None` when nothing is selected.
    ///
    /// Uploads get a transient handle on first use which is reused until the
    /// upload is replaced.
    pub fn preview_handle(&mut self) -> Option<String> {
        match &self.reference {
            InputReference::None => None,
            InputReference::RemoteLocator { url } => Some(url.clone()),
            InputReference::UploadedBlob(blob) => {
                let handle = self
                    .preview
                    .get_or_insert_with(|| self.previews.register(blob.clone()));
                Some(handle.url().to_string())
            }
        }
    }

    pub fn previews(&self) -> &PreviewStore {
        &self.previews
    }

    fn release_preview(&mut self) {
        if let Some(handle) = self.preview.take() {
            debug!("Releasing preview handle {}", handle.url());
        }
    }
}
