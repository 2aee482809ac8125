//! ABOUTME: Shared structured-output stub provider for critic/CRAG unit tests

#![cfg(test)]

use async_trait::async_trait;
use groundcrew_providers::{
    CompletionRequest, CompletionResponse, LlmProvider, ProviderCapabilities, Result as ProviderResult, TokenStream,
};

pub struct StubProvider {
    capabilities: ProviderCapabilities,
    response: serde_json::Value,
}

impl StubProvider {
    pub fn with_json(response: serde_json::Value) -> Self {
        Self {
            capabilities: ProviderCapabilities {
                supports_streaming: false,
                supports_structured_output: true,
                supports_embeddings: false,
                max_context_tokens: Some(8_000),
                max_output_tokens: Some(1_000),
            },
            response,
        }
    }
}

#[async_trait]
impl LlmProvider for StubProvider {
    fn name(&self) -> &str {
        "stub"
    }

    fn capabilities(&self) -> &ProviderCapabilities {
        &self.capabilities
    }

    async fn complete(&self, _request: CompletionRequest) -> ProviderResult<CompletionResponse> {
        unimplemented!()
    }

    async fn complete_stream(&self, _request: CompletionRequest) -> ProviderResult<TokenStream> {
        unimplemented!()
    }

    async fn complete_structured(
        &self,
        _request: CompletionRequest,
        _schema: &serde_json::Value,
    ) -> ProviderResult<serde_json::Value> {
        Ok(self.response.clone())
    }

    async fn embed(&self, _texts: &[String]) -> ProviderResult<Vec<Vec<f32>>> {
        unimplemented!()
    }
}
