//! Provider router — selects the correct LLM provider based on config.

use crate::anthropic::AnthropicProvider;
use crate::openai_compat::OpenAiCompatProvider;
use agentquest_config::{AppConfig, ProviderConfig};
use agentquest_core::provider::Provider;
use std::collections::HashMap;
use std::sync::Arc;

/// Holds the configured providers, keyed by name.
pub struct ProviderRouter {
    providers: HashMap<String, Arc<dyn Provider>>,
    default_provider: String,
}

impl ProviderRouter {
    /// Create a new router with a default provider.
    pub fn new(default_provider: impl Into<String>) -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider.into(),
        }
    }

    /// Register a provider.
    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn Provider>) {
        self.providers.insert(name.into(), provider);
    }

    /// Get the default provider.
    pub fn default_provider(&self) -> Option<Arc<dyn Provider>> {
        self.providers.get(&self.default_provider).cloned()
    }

    /// Get a specific provider by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.providers.get(name).cloned()
    }
}

/// Build providers from configuration.
///
/// Every `[providers.<name>]` table becomes a provider; the default provider
/// is always present even when it has no table of its own.
pub fn build_from_config(config: &AppConfig) -> ProviderRouter {
    let mut router = ProviderRouter::new(&config.default_provider);

    for (name, provider_config) in &config.providers {
        router.register(name.clone(), build_one(name, provider_config, config));
    }

    if router.get(&config.default_provider).is_none() {
        let provider = build_one(&config.default_provider, &ProviderConfig::default(), config);
        router.register(config.default_provider.clone(), provider);
    }

    router
}

fn build_one(name: &str, provider_config: &ProviderConfig, config: &AppConfig) -> Arc<dyn Provider> {
    let api_key = provider_config
        .api_key
        .clone()
        .or_else(|| config.api_key.clone())
        .unwrap_or_default();

    if name == "anthropic" {
        let mut p = AnthropicProvider::new(&api_key);
        if let Some(url) = &provider_config.api_url {
            p = p.with_base_url(url);
        }
        return Arc::new(p);
    }

    let base_url = provider_config
        .api_url
        .clone()
        .unwrap_or_else(|| default_base_url(name));
    Arc::new(OpenAiCompatProvider::new(name, &base_url, &api_key))
}

/// Get the default base URL for well-known providers.
pub fn default_base_url(provider_name: &str) -> String {
    match provider_name {
        "openrouter" => "https://openrouter.ai/api/v1".into(),
        "openai" => "https://api.openai.com/v1".into(),
        "anthropic" => "https://api.anthropic.com".into(),
        "ollama" => "http://localhost:11434/v1".into(),
        "deepseek" => "https://api.deepseek.com/v1".into(),
        "groq" => "https://api.groq.com/openai/v1".into(),
        "together" => "https://api.together.xyz/v1".into(),
        "vllm" => "http://localhost:8000/v1".into(),
        _ => format!("https://{provider_name}.api.example.com/v1"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn router_register_and_lookup() {
        let mut router = ProviderRouter::new("openrouter");
        router.register("openrouter", Arc::new(OpenAiCompatProvider::openrouter("sk-test")));

        assert!(router.get("openrouter").is_some());
        assert!(router.get("nonexistent").is_none());
        assert!(router.default_provider().is_some());
    }

    #[test]
    fn default_base_urls() {
        assert!(default_base_url("openrouter").contains("openrouter.ai"));
        assert!(default_base_url("openai").contains("api.openai.com"));
        assert!(default_base_url("ollama").contains("localhost:11434"));
    }

    #[test]
    fn build_from_default_config() {
        let router = build_from_config(&AppConfig::default());
        let provider = router.default_provider().unwrap();
        assert_eq!(provider.name(), "openrouter");
    }

    #[test]
    fn configured_providers_are_all_registered() {
        let mut config = AppConfig {
            default_provider: "anthropic".into(),
            ..AppConfig::default()
        };
        config.providers.insert(
            "ollama".into(),
            ProviderConfig {
                api_url: Some("http://gpu-box:11434/v1".into()),
                ..ProviderConfig::default()
            },
        );

        let router = build_from_config(&config);
        assert!(router.get("anthropic").is_some());
        assert!(router.get("ollama").is_some());
        assert!(router.get("openai").is_none());
        assert_eq!(router.default_provider().unwrap().name(), "anthropic");
    }
}
