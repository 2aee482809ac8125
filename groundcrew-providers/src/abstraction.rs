//! ABOUTME: Provider abstraction layer — capability detection, registry and manager
//! ABOUTME: Generalized from a single `complete` method to the four operations spec.md names

use crate::auth::Auth;
use crate::error::{ProviderError, Result};
use async_trait::async_trait;
use futures::stream::BoxStream;
use groundcrew_core::{Message, Usage};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Capabilities a provider instance advertises, used by the planner/router
/// to pick a provider that can satisfy a turn's requirements.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ProviderCapabilities {
    pub supports_streaming: bool,
    pub supports_structured_output: bool,
    pub supports_embeddings: bool,
    pub max_context_tokens: Option<usize>,
    pub max_output_tokens: Option<usize>,
}

/// Configuration for a single provider instance.
#[derive(Clone)]
pub struct ProviderConfig {
    pub name: String,
    pub model: String,
    pub endpoint: Option<String>,
    pub auth: Option<Auth>,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl ProviderConfig {
    #[must_use]
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            endpoint: None,
            auth: None,
            timeout_secs: 30,
            max_retries: 3,
        }
    }

    #[must_use]
    pub fn with_auth(mut self, auth: Auth) -> Self {
        self.auth = Some(auth);
        self
    }

    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub messages: Vec<Message>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    #[must_use]
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            temperature: None,
            max_tokens: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub text: String,
    pub usage: Usage,
}

pub type TokenStream = BoxStream<'static, Result<String>>;

/// Operations a provider instance must support:
/// plain completion, streamed completion, schema-constrained completion,
/// and embeddings (`spec.md` §4.2, C1 LLM Client).
#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn capabilities(&self) -> &ProviderCapabilities;
    fn name(&self) -> &str;

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    async fn complete_stream(&self, request: CompletionRequest) -> Result<TokenStream>;

    /// Complete and validate the result against a JSON schema, used by the
    /// planner and critic for structured outputs.
    async fn complete_structured(
        &self,
        request: CompletionRequest,
        schema: &serde_json::Value,
    ) -> Result<serde_json::Value>;

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

type ProviderFactory = Box<dyn Fn(ProviderConfig) -> Result<Arc<dyn LlmProvider>> + Send + Sync>;

/// Maps provider type names (`"openai"`, `"anthropic"`, ...) to factories
/// that build an instance from a `ProviderConfig`.
pub struct ProviderRegistry {
    factories: HashMap<String, ProviderFactory>,
}

impl ProviderRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(ProviderConfig) -> Result<Arc<dyn LlmProvider>> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
    }

    pub fn create(&self, config: ProviderConfig) -> Result<Arc<dyn LlmProvider>> {
        let factory = self
            .factories
            .get(&config.name)
            .ok_or_else(|| ProviderError::UnknownProvider(config.name.clone()))?;
        factory(config)
    }

    #[must_use]
    pub fn available_providers(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Holds initialized provider instances keyed by `"{name}:{model}"` and
/// tracks a default, so the orchestrator can request "the default
/// provider" or a named override from routing.
pub struct ProviderManager {
    registry: RwLock<ProviderRegistry>,
    instances: RwLock<HashMap<String, Arc<dyn LlmProvider>>>,
    default_instance: RwLock<Option<String>>,
}

impl ProviderManager {
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: RwLock::new(ProviderRegistry::new()),
            instances: RwLock::new(HashMap::new()),
            default_instance: RwLock::new(None),
        }
    }

    pub async fn register_provider<F>(&self, name: impl Into<String>, factory: F)
    where
        F: Fn(ProviderConfig) -> Result<Arc<dyn LlmProvider>> + Send + Sync + 'static,
    {
        self.registry.write().await.register(name, factory);
    }

    pub async fn init_provider(&self, config: ProviderConfig) -> Result<()> {
        let instance_key = format!("{}:{}", config.name, config.model);
        let provider = self.registry.read().await.create(config)?;

        self.instances.write().await.insert(instance_key.clone(), provider);

        let mut default = self.default_instance.write().await;
        if default.is_none() {
            *default = Some(instance_key);
        }
        Ok(())
    }

    pub async fn get(&self, name: Option<&str>) -> Result<Arc<dyn LlmProvider>> {
        let instances = self.instances.read().await;
        let key = match name {
            Some(name) => name.to_string(),
            None => self
                .default_instance
                .read()
                .await
                .clone()
                .ok_or_else(|| ProviderError::Configuration {
                    message: "no default provider configured".into(),
                })?,
        };
        instances
            .get(&key)
            .cloned()
            .ok_or_else(|| ProviderError::UnknownProvider(key))
    }

    pub async fn set_default(&self, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        if !self.instances.read().await.contains_key(&name) {
            return Err(ProviderError::UnknownProvider(name));
        }
        *self.default_instance.write().await = Some(name);
        Ok(())
    }

    pub async fn list_instances(&self) -> Vec<String> {
        self.instances.read().await.keys().cloned().collect()
    }
}

impl Default for ProviderManager {
    fn default() -> Self {
        Self::new()
    }
}
