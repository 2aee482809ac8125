//! ABOUTME: Provider instance backed by rig-core, with reqwest for embeddings
//! ABOUTME: rig-core does not expose streaming or embeddings, so those two operations bypass it

use crate::abstraction::{
    CompletionRequest, CompletionResponse, LlmProvider, ProviderCapabilities, ProviderConfig,
    TokenStream,
};
use crate::error::{ProviderError, Result};
use async_trait::async_trait;
use groundcrew_core::Role;
use rig::client::CompletionClient;
use rig::completion::CompletionModel;
use rig::providers;

enum RigModel {
    OpenAI(providers::openai::CompletionModel),
    Anthropic(providers::anthropic::completion::CompletionModel),
}

pub struct RigProvider {
    config: ProviderConfig,
    capabilities: ProviderCapabilities,
    model: RigModel,
}

impl RigProvider {
    pub fn new(config: ProviderConfig, api_key: &str) -> Result<Self> {
        let model = match config.name.as_str() {
            "openai" => {
                let client = providers::openai::Client::new(api_key);
                RigModel::OpenAI(client.completion_model(&config.model).completions_api())
            }
            "anthropic" => {
                let base_url = config.endpoint.as_deref().unwrap_or("https://api.anthropic.com");
                let client = providers::anthropic::ClientBuilder::new(api_key)
                    .base_url(base_url)
                    .build()
                    .map_err(|e| ProviderError::Configuration {
                        message: format!("failed to build anthropic client: {e}"),
                    })?;
                RigModel::Anthropic(client.completion_model(&config.model))
            }
            other => {
                return Err(ProviderError::Configuration {
                    message: format!("unsupported provider type: {other}"),
                })
            }
        };

        let capabilities = ProviderCapabilities {
            supports_streaming: false,
            supports_structured_output: true,
            supports_embeddings: config.name == "openai",
            max_context_tokens: Some(context_window(&config.name, &config.model)),
            max_output_tokens: Some(4096),
        };

        Ok(Self {
            config,
            capabilities,
            model,
        })
    }

    async fn execute(&self, prompt: &str) -> Result<String> {
        let choice = match &self.model {
            RigModel::OpenAI(model) => {
                let response = model.completion_request(prompt).send().await.map_err(|e| {
                    ProviderError::Transient {
                        provider: self.config.name.clone(),
                        message: e.to_string(),
                    }
                })?;
                response.choice.first()
            }
            RigModel::Anthropic(model) => {
                let response = model.completion_request(prompt).send().await.map_err(|e| {
                    ProviderError::Transient {
                        provider: self.config.name.clone(),
                        message: e.to_string(),
                    }
                })?;
                response.choice.first()
            }
        };
        match choice {
            rig::completion::message::AssistantContent::Text(text) => Ok(text.text),
            rig::completion::message::AssistantContent::ToolCall(call) => {
                Err(ProviderError::InvalidRequest {
                    provider: self.config.name.clone(),
                    message: format!("unexpected tool call response: {}", call.function.name),
                })
            }
            rig::completion::message::AssistantContent::Reasoning(_) => {
                Err(ProviderError::InvalidRequest {
                    provider: self.config.name.clone(),
                    message: "unexpected reasoning-only response".into(),
                })
            }
        }
    }
}

fn context_window(provider: &str, model: &str) -> usize {
    match (provider, model) {
        ("openai", "gpt-4" | "gpt-4-turbo") => 128_000,
        ("openai", "gpt-3.5-turbo") => 16_384,
        ("anthropic", _) => 200_000,
        _ => 8_192,
    }
}

fn render_prompt(messages: &[groundcrew_core::Message]) -> String {
    messages
        .iter()
        .map(|m| {
            let role = match m.role {
                Role::User => "user",
                Role::Assistant => "assistant",
                Role::System => "system",
            };
            format!("{role}: {}", m.content)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[async_trait]
impl LlmProvider for RigProvider {
    fn capabilities(&self) -> &ProviderCapabilities {
        &self.capabilities
    }

    fn name(&self) -> &str {
        &self.config.name
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let prompt = render_prompt(&request.messages);
        let text = self.execute(&prompt).await?;
        Ok(CompletionResponse {
            text,
            usage: groundcrew_core::Usage::default(),
        })
    }

    async fn complete_stream(&self, _request: CompletionRequest) -> Result<TokenStream> {
        Err(ProviderError::InvalidRequest {
            provider: self.config.name.clone(),
            message: "rig-core does not expose token streaming".into(),
        })
    }

    async fn complete_structured(
        &self,
        request: CompletionRequest,
        schema: &serde_json::Value,
    ) -> Result<serde_json::Value> {
        let mut prompt = render_prompt(&request.messages);
        prompt.push_str(&format!(
            "\n\nRespond with JSON only, matching this schema:\n{schema}"
        ));

        let compiled = jsonschema::JSONSchema::compile(schema).map_err(|e| ProviderError::SchemaViolation {
            provider: self.config.name.clone(),
            message: format!("invalid schema: {e}"),
        })?;

        let mut last_error = None;
        for _ in 0..=self.config.max_retries {
            let text = self.execute(&prompt).await?;
            match serde_json::from_str::<serde_json::Value>(&text) {
                Ok(value) if compiled.is_valid(&value) => return Ok(value),
                Ok(value) => {
                    last_error = Some(format!("schema validation failed for {value}"));
                }
                Err(e) => last_error = Some(format!("response was not valid JSON: {e}")),
            }
        }
        Err(ProviderError::SchemaViolation {
            provider: self.config.name.clone(),
            message: last_error.unwrap_or_else(|| "no response produced".into()),
        })
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if self.config.name != "openai" {
            return Err(ProviderError::InvalidRequest {
                provider: self.config.name.clone(),
                message: "embeddings are only wired for the openai provider".into(),
            });
        }
        let auth = self
            .config
            .auth
            .as_ref()
            .ok_or_else(|| ProviderError::Auth {
                provider: self.config.name.clone(),
                message: "no credentials configured".into(),
            })?
            .header_value()
            .await
            .map_err(|e| ProviderError::Auth {
                provider: self.config.name.clone(),
                message: e.to_string(),
            })?;

        let client = reqwest::Client::new();
        let response = client
            .post("https://api.openai.com/v1/embeddings")
            .header("Authorization", auth)
            .json(&serde_json::json!({ "model": "text-embedding-3-small", "input": texts }))
            .timeout(std::time::Duration::from_secs(self.config.timeout_secs))
            .send()
            .await
            .map_err(|e| ProviderError::Transient {
                provider: self.config.name.clone(),
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(ProviderError::Transient {
                provider: self.config.name.clone(),
                message: format!("embeddings request failed with status {}", response.status()),
            });
        }

        #[derive(serde::Deserialize)]
        struct EmbeddingDatum {
            embedding: Vec<f32>,
        }
        #[derive(serde::Deserialize)]
        struct EmbeddingsResponse {
            data: Vec<EmbeddingDatum>,
        }

        let parsed: EmbeddingsResponse = response.json().await.map_err(|e| ProviderError::Transient {
            provider: self.config.name.clone(),
            message: e.to_string(),
        })?;
        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }
}
