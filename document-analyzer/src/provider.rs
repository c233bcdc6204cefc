use crate::http_provider::HttpAnalysisProvider;
use crate::types::{AnalysisProvider, AnalyzerConfig, AnalyzerError, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

pub use interfaces::baseline::BaselineAnalysisProvider;
pub use interfaces::empty::EmptyAnalysisProvider;

/// Provider registry for choosing the analysis backend by name
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn AnalysisProvider>>,
    default_provider: Option<String>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: None,
        }
    }

    /// Register a new provider under its own name
    pub fn register_provider(&mut self, provider: Arc<dyn AnalysisProvider>) {
        let name = provider.provider_name();
        info!("Registering analysis provider: {}", name);

        // Set as default if it's the first provider
        if self.default_provider.is_none() {
            self.default_provider = Some(name.clone());
        }

        self.providers.insert(name, provider);
    }

    pub fn get_provider(&self, name: &str) -> Option<Arc<dyn AnalysisProvider>> {
        self.providers.get(name).cloned()
    }

    pub fn get_default_provider(&self) -> Option<Arc<dyn AnalysisProvider>> {
        self.default_provider
            .as_ref()
            .and_then(|name| self.get_provider(name))
    }

    pub fn set_default_provider(&mut self, name: &str) -> Result<()> {
        if self.providers.contains_key(name) {
            self.default_provider = Some(name.to_string());
            info!("Set default analysis provider to: {}", name);
            Ok(())
        } else {
            Err(AnalyzerError::Config(format!("Provider '{}' not found", name)))
        }
    }

    /// Registered provider names, sorted
    pub fn list_providers(&self) -> Vec<String> {
        let mut names: Vec<String> = self.providers.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn remove_provider(&mut self, name: &str) -> bool {
        let removed = self.providers.remove(name).is_some();

        // Update default provider if it was removed
        if self.default_provider.as_deref() == Some(name) {
            self.default_provider = self.list_providers().into_iter().next();
        }

        removed
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        let mut registry = Self::new();
        registry.register_provider(Arc::new(BaselineAnalysisProvider::default()));
        registry
    }
}

/// Builder for assembling a provider registry
pub struct ProviderBuilder {
    registry: ProviderRegistry,
}

impl ProviderBuilder {
    pub fn new() -> Self {
        Self {
            registry: ProviderRegistry::new(),
        }
    }

    pub fn add_baseline_provider(mut self, name: String, delay_ms: Option<u64>) -> Self {
        let provider = match delay_ms {
            Some(delay) => BaselineAnalysisProvider::new(name).with_delay(delay),
            None => BaselineAnalysisProvider::new(name),
        };

        self.registry.register_provider(Arc::new(provider));
        self
    }

    /// Register the remote service provider for `config` and make it the
    /// default
    pub fn add_http_provider(mut self, config: &AnalyzerConfig) -> Result<Self> {
        let provider = HttpAnalysisProvider::new(config)?;
        let name = provider.provider_name();
        self.registry.register_provider(Arc::new(provider));
        self.registry.set_default_provider(&name)?;
        Ok(self)
    }

    pub fn set_default(mut self, name: &str) -> Result<Self> {
        self.registry.set_default_provider(name)?;
        Ok(self)
    }

    pub fn build(self) -> ProviderRegistry {
        self.registry
    }
}

impl Default for ProviderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Pick the provider for `config`: the remote service when an endpoint is
/// configured, the baseline provider otherwise.
pub fn provider_from_config(config: &AnalyzerConfig) -> Result<Arc<dyn AnalysisProvider>> {
    let mut builder =
        ProviderBuilder::new().add_baseline_provider("baseline".to_string(), Some(config.baseline_delay_ms));

    if config.endpoint.is_some() {
        builder = builder.add_http_provider(config)?;
    }

    builder
        .build()
        .get_default_provider()
        .ok_or_else(|| AnalyzerError::Config("no analysis provider registered".to_string()))
}
