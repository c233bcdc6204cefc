pub mod types;
pub mod utils;
pub mod preview;
pub mod resolver;
pub mod links;
pub mod orchestrator;
pub mod provider;
pub mod http_provider;
pub mod presenter;

pub use types::*;
pub use preview::{PreviewHandle, PreviewStore};
pub use resolver::InputResolver;
pub use links::{canonicalize, VideoReference};
pub use orchestrator::{AnalysisEvent, AnalysisOrchestrator, Rejection};
pub use provider::{provider_from_config, BaselineAnalysisProvider, EmptyAnalysisProvider, ProviderBuilder, ProviderRegistry};
pub use http_provider::HttpAnalysisProvider;
pub use presenter::{ResultPresenter, TextPresenter};
