//! Video link utilities: turn a watch or short link into an embeddable URL.
use serde::Serialize;
use url::Url;

pub const SHORT_LINK_HOST: &str = "youtu.be";
pub const LONG_FORM_HOST: &str = "youtube.com";
pub const EMBED_URL_PREFIX: &str = "https://www.youtube.com/embed/";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoReference {
    pub source_url: String,
    pub video_id: String,
    pub embed_url: String,
}

/// Canonicalize a recognized video link.
///
/// Supports:
/// - https://youtu.be/dQw4w9WgXcQ
/// - https://www.youtube.com/watch?v=dQw4w9WgXcQ
/// - https://youtube.com/watch?v=dQw4w9WgXcQ
/// - any of the above with additional parameters
///
/// Anything else, including text that does not parse as an absolute URL,
/// yields `None`.
pub fn canonicalize(url_str: &str) -> Option<VideoReference> {
    let video_id = video_id(url_str)?;

    Some(VideoReference {
        source_url: url_str.to_string(),
        embed_url: format!("{}{}", EMBED_URL_PREFIX, video_id),
        video_id,
    })
}

/// Extract the video identifier from a recognized link
pub fn video_id(url_str: &str) -> Option<String> {
    let url = Url::parse(url_str).ok()?;
    let host = url.host_str()?;

    let candidate = if host == SHORT_LINK_HOST {
        url.path_segments()?.next()?.to_string()
    } else if host.contains(LONG_FORM_HOST) {
        url.query_pairs()
            .find(|(key, _)| *key == "v")
            .map(|(_, value)| value.into_owned())?
    } else {
        return None;
    };

    is_valid_video_id(&candidate).then_some(candidate)
}

/// Embeddable URL for a recognized link
pub fn embed_url(url_str: &str) -> Option<String> {
    canonicalize(url_str).map(|reference| reference.embed_url)
}

fn is_valid_video_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
