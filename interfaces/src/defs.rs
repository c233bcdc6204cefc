use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Section names observed across analysis runs. Providers may return any
/// other name as well; these only keep the common ones spelled consistently.
pub mod section {
    pub const KEY_FINDINGS: &str = "key findings";
    pub const RECOMMENDED_ACTIONS: &str = "recommended actions";
    pub const COMPARATIVE_ASSESSMENT: &str = "comparative assessment";
    pub const RISK_NOTES: &str = "risk notes";
}

/// A document captured from a file upload. Never mutated after capture.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadedBlob {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub filename: String,
}

impl UploadedBlob {
    pub fn new(bytes: impl Into<Vec<u8>>, mime_type: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            mime_type: mime_type.into(),
            filename: filename.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for UploadedBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Document bodies can be large, only the size is useful in logs
        f.debug_struct("UploadedBlob")
            .field("filename", &self.filename)
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// The one authoritative representation of the user's chosen input.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum InputReference {
    #[default]
    None,
    UploadedBlob(Arc<UploadedBlob>),
    RemoteLocator { url: String },
}

impl InputReference {
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    pub fn is_upload(&self) -> bool {
        matches!(self, Self::UploadedBlob(_))
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::RemoteLocator { .. })
    }

    pub fn upload(&self) -> Option<&UploadedBlob> {
        match self {
            Self::UploadedBlob(blob) => Some(blob),
            _ => None,
        }
    }

    pub fn remote_url(&self) -> Option<&str> {
        match self {
            Self::RemoteLocator { url } => Some(url),
            _ => None,
        }
    }
}

impl fmt::Display for InputReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "no input"),
            Self::UploadedBlob(blob) => write!(
                f,
                "upload {} ({} bytes, {})",
                blob.filename,
                blob.len(),
                blob.mime_type
            ),
            Self::RemoteLocator { url } => write!(f, "url {}", url),
        }
    }
}

/// Identity of a single analysis run. Two requests for identical input still
/// carry different ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Read-only snapshot of the input taken when an analysis is triggered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    id: RequestId,
    reference: InputReference,
    requested_at: DateTime<Utc>,
}

impl AnalysisRequest {
    /// Snapshot `reference` into a fresh request. There is nothing to analyze
    /// for `InputReference::None`.
    pub fn snapshot(reference: &InputReference) -> Option<Self> {
        if reference.is_none() {
            return None;
        }

        Some(Self {
            id: RequestId::new(),
            reference: reference.clone(),
            requested_at: Utc::now(),
        })
    }

    pub fn id(&self) -> RequestId {
        self.id
    }

    pub fn reference(&self) -> &InputReference {
        &self.reference
    }

    pub fn requested_at(&self) -> DateTime<Utc> {
        self.requested_at
    }

    /// Identity comparison, content is ignored.
    pub fn is_same_request(&self, other: &AnalysisRequest) -> bool {
        self.id == other.id
    }
}

/// A named, ordered, non-empty list of short text items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultSection {
    name: String,
    items: Vec<String>,
}

impl ResultSection {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }
}

/// Summary plus an open collection of named sections.
///
/// Sections keep insertion order. An empty section is never stored: adding
/// one is a no-op, and adding to an existing name appends to it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawAnalysisResult")]
pub struct AnalysisResult {
    summary: String,
    sections: Vec<ResultSection>,
}

impl AnalysisResult {
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            sections: Vec::new(),
        }
    }

    pub fn with_section<I, S>(mut self, name: impl Into<String>, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push_section(name, items);
        self
    }

    pub fn push_section<I, S>(&mut self, name: impl Into<String>, items: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let items: Vec<String> = items.into_iter().map(Into::into).collect();
        if items.is_empty() {
            return;
        }

        let name = name.into();
        match self.sections.iter_mut().find(|section| section.name == name) {
            Some(existing) => existing.items.extend(items),
            None => self.sections.push(ResultSection { name, items }),
        }
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn sections(&self) -> &[ResultSection] {
        &self.sections
    }

    pub fn section(&self, name: &str) -> Option<&[String]> {
        self.sections
            .iter()
            .find(|section| section.name == name)
            .map(|section| section.items.as_slice())
    }

    pub fn section_names(&self) -> Vec<&str> {
        self.sections.iter().map(|section| section.name.as_str()).collect()
    }
}

/// Wire form of a result. Sections arrive either as a list of
/// `{"name", "items"}` objects or as a map from name to items; both keep the
/// order in which they were sent.
#[derive(Deserialize)]
struct RawAnalysisResult {
    #[serde(default)]
    summary: String,
    #[serde(default)]
    sections: RawSections,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSections {
    List(Vec<RawSection>),
    Named(NamedSections),
}

impl Default for RawSections {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

#[derive(Deserialize)]
struct RawSection {
    name: String,
    #[serde(default)]
    items: Vec<String>,
}

struct NamedSections(Vec<(String, Vec<String>)>);

impl<'de> Deserialize<'de> for NamedSections {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct NamedSectionsVisitor;

        impl<'de> Visitor<'de> for NamedSectionsVisitor {
            type Value = NamedSections;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of section names to item lists")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut sections = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, Vec<String>>()? {
                    sections.push(entry);
                }
                Ok(NamedSections(sections))
            }
        }

        deserializer.deserialize_map(NamedSectionsVisitor)
    }
}

impl From<RawAnalysisResult> for AnalysisResult {
    fn from(raw: RawAnalysisResult) -> Self {
        let sections: Vec<(String, Vec<String>)> = match raw.sections {
            RawSections::List(list) => list
                .into_iter()
                .map(|section| (section.name, section.items))
                .collect(),
            RawSections::Named(NamedSections(named)) => named,
        };

        sections
            .into_iter()
            .fold(AnalysisResult::new(raw.summary), |result, (name, items)| {
                result.with_section(name, items)
            })
    }
}

/// Ways a provider can fail a run. Every one of them ends the run as `Failed`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Analysis timed out")]
    Timeout,

    #[error("Provider rejected the request: {0}")]
    ProviderRejected(String),

    #[error("Unknown error: {0}")]
    UnknownError(String),
}

impl ProviderError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NetworkError(_) => "network_error",
            Self::Timeout => "timeout",
            Self::ProviderRejected(_) => "provider_rejected",
            Self::UnknownError(_) => "unknown_error",
        }
    }
}

/// Lifecycle of the analysis owned by an orchestrator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AnalysisState {
    #[default]
    Idle,
    Running { request: AnalysisRequest },
    Succeeded { result: AnalysisResult },
    Failed { reason: ProviderError },
}

impl AnalysisState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running { .. } => "running",
            Self::Succeeded { .. } => "succeeded",
            Self::Failed { .. } => "failed",
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running { .. })
    }

    pub fn in_flight(&self) -> Option<&AnalysisRequest> {
        match self {
            Self::Running { request } => Some(request),
            _ => None,
        }
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        match self {
            Self::Succeeded { result } => Some(result),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&ProviderError> {
        match self {
            Self::Failed { reason } => Some(reason),
            _ => None,
        }
    }
}

// Provider note:
// An orchestrator holds exactly one provider and calls `analyze` at most once
// per request. Implementations must resolve every call exactly once, either
// with a result or with one of the `ProviderError` kinds. Timeouts are the
// provider's business and surface as `ProviderError::Timeout`.

#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    /// Name used in logs and the provider registry
    fn provider_name(&self) -> String;

    /// Run the analysis for a snapshotted request
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, ProviderError>;
}
