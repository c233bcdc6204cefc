use async_trait::async_trait;

use crate::defs::AnalysisProvider;
use crate::defs::AnalysisRequest;
use crate::defs::AnalysisResult;
use crate::defs::ProviderError;

pub struct EmptyAnalysisProvider;

#[async_trait]
impl AnalysisProvider for EmptyAnalysisProvider {
    fn provider_name(&self) -> String {
        "empty".to_owned()
    }

    async fn analyze(&self, _request: &AnalysisRequest) -> Result<AnalysisResult, ProviderError> {
        // Nothing worth reporting, the ideal analysis is an empty summary.
        Ok(AnalysisResult::default())
    }
}
