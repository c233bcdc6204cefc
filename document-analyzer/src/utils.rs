/// Media type utilities
pub mod media {
    use crate::types::{Result, UploadedBlob, DEFAULT_MEDIA_TYPE};
    use std::path::Path;

    /// Lowercased type/subtype with any `;` parameters removed
    pub fn essence(media_type: &str) -> String {
        media_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase()
    }

    /// Compare a declared media type against the accepted one
    pub fn matches(declared: &str, accepted: &str) -> bool {
        let declared = essence(declared);
        !declared.is_empty() && declared == essence(accepted)
    }

    /// Declared media type for a local file, derived from its extension the
    /// way a browser file picker does. Content is never sniffed.
    pub fn for_path(path: &Path) -> String {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some("pdf") => DEFAULT_MEDIA_TYPE.to_string(),
            Some("txt") => "text/plain".to_string(),
            Some("html") | Some("htm") => "text/html".to_string(),
            Some("doc") => "application/msword".to_string(),
            Some("docx") => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document".to_string()
            }
            _ => "application/octet-stream".to_string(),
        }
    }

    /// Read a local file into an upload with the given declared type
    pub async fn load_upload(path: &Path, declared: Option<&str>) -> Result<UploadedBlob> {
        let bytes = tokio::fs::read(path).await?;
        let mime_type = declared
            .map(|value| value.to_string())
            .unwrap_or_else(|| for_path(path));
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());

        Ok(UploadedBlob::new(bytes, mime_type, filename))
    }
}

/// Text processing utilities
pub mod text {
    /// Truncate text to at most `max_length` bytes, trying to break at
    /// sentence boundaries
    pub fn smart_truncate(text: &str, max_length: usize) -> String {
        if text.len() <= max_length {
            return text.to_string();
        }

        let mut cut = max_length;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }

        let truncated = &text[..cut];
        if let Some(last_sentence) = truncated.rfind('.') {
            truncated[..last_sentence + 1].to_string()
        } else if let Some(last_space) = truncated.rfind(' ') {
            format!("{}...", &truncated[..last_space])
        } else {
            format!("{}...", truncated)
        }
    }

    /// Uppercase the first character, e.g. for section headings
    pub fn capitalize(text: &str) -> String {
        let mut chars = text.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    /// Collapse runs of whitespace into single spaces
    pub fn normalize_whitespace(text: &str) -> String {
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}
