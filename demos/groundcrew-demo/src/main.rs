//! ABOUTME: End-to-end CLI driver wiring a turn through fake/in-memory collaborators or a hosted provider

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{Parser, ValueEnum};
use groundcrew_config::FeatureSet;
use groundcrew_core::{Message, Reference, ReferenceSource, WebResult};
use groundcrew_events::TurnEvent;
use groundcrew_orchestrator::{Orchestrator, ResponseMode};
use groundcrew_providers::{
    CompletionRequest, CompletionResponse, LlmProvider, ProviderCapabilities, ProviderConfig,
    ProviderManager, RigProvider, TokenStream,
};
use groundcrew_providers::{Auth, Result as ProviderResult};
use groundcrew_retrieval::{Result as RetrievalResult, SearchClient, SearchQuery};
use groundcrew_web::{Result as WebResultAlias, WebSearchClient};
use std::sync::Arc;
use tracing::info;

/// Level passed to `--trace`, mirroring `RUST_LOG`'s precedence when unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum TraceLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<TraceLevel> for tracing::Level {
    fn from(level: TraceLevel) -> Self {
        match level {
            TraceLevel::Off | TraceLevel::Error => tracing::Level::ERROR,
            TraceLevel::Warn => tracing::Level::WARN,
            TraceLevel::Info => tracing::Level::INFO,
            TraceLevel::Debug => tracing::Level::DEBUG,
            TraceLevel::Trace => tracing::Level::TRACE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ProviderKind {
    /// No network calls; answers are extracted from the retrieved evidence.
    Offline,
    Openai,
    Anthropic,
}

/// Runs one turn through the groundcrew pipeline against a small
/// in-memory knowledge base, printing the grounded answer and its
/// diagnostics.
#[derive(Parser, Debug)]
#[command(name = "groundcrew-demo")]
#[command(about = "Ask the groundcrew demo corpus a question")]
struct Cli {
    /// The question to ask.
    question: String,

    /// Session to continue; omit to derive one from the question.
    #[arg(long)]
    session_id: Option<String>,

    /// LLM backend. `offline` needs no credentials and skips
    /// structured-output features (routing, critic, CRAG).
    #[arg(long, value_enum, default_value = "offline")]
    provider: ProviderKind,

    /// Model name, passed through to the chosen provider.
    #[arg(long, default_value = "gpt-4-turbo")]
    model: String,

    /// API key for the hosted provider.
    #[arg(long, env = "GROUNDCREW_API_KEY")]
    api_key: Option<String>,

    /// Turn on intent routing, CRAG, and critic revision. Requires a
    /// provider that supports structured output.
    #[arg(long)]
    advanced: bool,

    /// Print the full `Response` as JSON instead of a formatted summary.
    #[arg(long)]
    json: bool,

    /// Stream the draft answer token-by-token instead of waiting for the
    /// finished turn.
    #[arg(long)]
    stream: bool,

    #[arg(long, value_enum, default_value = "warn")]
    trace: TraceLevel,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_tracing(cli.trace);

    let search_client: Arc<dyn SearchClient> = Arc::new(DemoCorpus::new());
    let web_client: Arc<dyn WebSearchClient> = Arc::new(DemoWebIndex::new());
    let provider = build_provider(&cli).await?;

    let mut features = FeatureSet::default();
    if !cli.advanced {
        features.enable_intent_routing = false;
        features.enable_query_decomposition = false;
        features.enable_critic = false;
        features.enable_crag = false;
    }

    let orchestrator = Orchestrator::new(search_client, provider)
        .with_web_client(web_client)
        .with_defaults(features);

    let messages = vec![Message::user(cli.question.clone())];
    let session_id = cli
        .session_id
        .clone()
        .map(groundcrew_core::SessionId)
        .unwrap_or_else(|| groundcrew_core::SessionId::derive(&messages));

    let mode = if cli.stream { ResponseMode::Stream } else { ResponseMode::Sync };
    let mut token_subscriber = cli.stream.then(|| orchestrator.events().subscribe(session_id.as_str()));

    let turn = orchestrator.run_turn(&messages, None, None, Some(session_id), mode);

    let response = if let Some(subscriber) = &mut token_subscriber {
        let printer = async {
            while let Ok(correlated) = subscriber.recv().await {
                if let TurnEvent::Token { ref text } = correlated.event {
                    print!("{text}");
                    use std::io::Write;
                    let _ = std::io::stdout().flush();
                }
                if matches!(correlated.event, TurnEvent::Done) {
                    break;
                }
            }
        };
        let (response, ()) = tokio::join!(turn, printer);
        println!();
        response.context("turn failed")?
    } else {
        turn.await.context("turn failed")?
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    println!("Answer: {}\n", response.answer);
    if !response.references.is_empty() {
        println!("Evidence:");
        for reference in &response.references {
            println!(
                "  [{}] {}",
                reference.id,
                reference.title.as_deref().unwrap_or(&reference.content)
            );
        }
    }
    if let Some(route) = &response.route {
        println!(
            "\nRoute: intent={} confidence={:.2} strategy={}",
            route.intent, route.confidence, route.strategy
        );
    }
    if !response.critic.is_empty() {
        println!("Critic passes: {}", response.critic.len());
    }
    println!(
        "\nSession {} turn {} ({} prompt / {} completion tokens)",
        response.session_id, response.turn, response.usage.prompt_tokens, response.usage.completion_tokens
    );

    Ok(())
}

fn setup_tracing(trace: TraceLevel) {
    use std::io;
    use tracing_subscriber::EnvFilter;

    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(io::stderr)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::from(trace))
            .with_writer(io::stderr)
            .with_target(false)
            .init();
    }
}

/// Builds the provider through a `ProviderManager` rather than constructing
/// it directly, so picking a backend is a matter of which name gets
/// `init_provider`-ed, not which struct the call site names.
async fn build_provider(cli: &Cli) -> Result<Arc<dyn LlmProvider>> {
    let manager = ProviderManager::new();
    manager.register_provider("offline", |_config| Ok(Arc::new(OfflineProvider::new()) as Arc<dyn LlmProvider>)).await;
    manager
        .register_provider("openai", |config| {
            let api_key = match &config.auth {
                Some(Auth::ApiKey(key)) => key.clone(),
                _ => return Err(groundcrew_providers::ProviderError::Configuration { message: "missing api key".into() }),
            };
            Ok(Arc::new(RigProvider::new(config, &api_key)?) as Arc<dyn LlmProvider>)
        })
        .await;
    manager
        .register_provider("anthropic", |config| {
            let api_key = match &config.auth {
                Some(Auth::ApiKey(key)) => key.clone(),
                _ => return Err(groundcrew_providers::ProviderError::Configuration { message: "missing api key".into() }),
            };
            Ok(Arc::new(RigProvider::new(config, &api_key)?) as Arc<dyn LlmProvider>)
        })
        .await;

    let config = match cli.provider {
        ProviderKind::Offline => ProviderConfig::new("offline", cli.model.clone()),
        ProviderKind::Openai | ProviderKind::Anthropic => {
            let name = if cli.provider == ProviderKind::Openai { "openai" } else { "anthropic" };
            let api_key = cli
                .api_key
                .clone()
                .context("--api-key (or GROUNDCREW_API_KEY) is required for a hosted provider")?;
            ProviderConfig::new(name, cli.model.clone()).with_auth(Auth::ApiKey(api_key))
        }
    };
    manager.init_provider(config).await.context("failed to initialize provider")?;
    manager.get(None).await.context("no provider registered")
}

/// A fixed knowledge base about the groundcrew project itself, scored by
/// naive term overlap. Stands in for a hosted hybrid search index.
struct DemoCorpus {
    documents: Vec<Reference>,
}

impl DemoCorpus {
    fn new() -> Self {
        let entries = [
            (
                "doc-1",
                "Turn pipeline",
                "A groundcrew turn runs context assembly, memory recall, planning, \
                 concurrent retrieval and web dispatch, CRAG gating, synthesis, critic \
                 revision, memory write, and telemetry finalization, in that order.",
            ),
            (
                "doc-2",
                "Feature layering",
                "Feature flags resolve in three layers: compiled-in defaults, a persisted \
                 per-session override, and a per-request override, with later layers \
                 winning field by field.",
            ),
            (
                "doc-3",
                "CRAG gate",
                "The CRAG gate grades retrieved evidence as correct, ambiguous, or incorrect. \
                 Ambiguous evidence triggers a query refinement; incorrect evidence falls \
                 back to web search.",
            ),
            (
                "doc-4",
                "Reference fusion",
                "Index and web evidence are fused with reciprocal rank fusion, optionally \
                 blended with a semantic similarity term, and deduplicated by normalized URL.",
            ),
        ];
        let documents = entries
            .into_iter()
            .map(|(id, title, content)| Reference {
                id: id.to_string(),
                title: Some(title.to_string()),
                url: None,
                page_number: None,
                content: content.to_string(),
                score: None,
                captions: Vec::new(),
                source: ReferenceSource::Index,
                is_summary: false,
            })
            .collect();
        Self { documents }
    }
}

#[async_trait]
impl SearchClient for DemoCorpus {
    async fn search(&self, query: &SearchQuery) -> RetrievalResult<Vec<Reference>> {
        let needle = query.text.to_lowercase();
        let mut scored: Vec<(f32, Reference)> = self
            .documents
            .iter()
            .cloned()
            .map(|mut reference| {
                let haystack = reference.content.to_lowercase();
                let overlap = needle
                    .split_whitespace()
                    .filter(|word| word.len() > 3 && haystack.contains(word))
                    .count() as f32;
                reference.score = Some(overlap);
                (overlap, reference)
            })
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        Ok(scored
            .into_iter()
            .take(query.top_k as usize)
            .map(|(_, reference)| reference)
            .collect())
    }

    async fn load(&self, id: &str) -> RetrievalResult<Reference> {
        self.documents
            .iter()
            .find(|reference| reference.id == id)
            .cloned()
            .ok_or_else(|| groundcrew_retrieval::RetrievalError::Empty)
    }
}

/// A couple of canned web results, standing in for a live web search API.
struct DemoWebIndex {
    results: Vec<WebResult>,
}

impl DemoWebIndex {
    fn new() -> Self {
        Self {
            results: vec![
                WebResult::new(
                    "https://example.com/groundcrew-overview",
                    "Groundcrew overview",
                    "A grounded question-answering service combining hybrid retrieval with \
                     web augmentation and critic-gated synthesis.",
                ),
                WebResult::new(
                    "https://example.com/groundcrew-telemetry",
                    "Telemetry and tracing",
                    "Every turn emits a trace event with per-stage timings and aggregate \
                     token usage for observability.",
                ),
            ],
        }
    }
}

#[async_trait]
impl WebSearchClient for DemoWebIndex {
    async fn search(&self, query: &str, k: u32) -> WebResultAlias<Vec<WebResult>> {
        let needle = query.to_lowercase();
        let mut matched: Vec<WebResult> = self
            .results
            .iter()
            .filter(|result| needle.split_whitespace().any(|word| result.snippet.to_lowercase().contains(word)))
            .cloned()
            .collect();
        if matched.is_empty() {
            matched = self.results.clone();
        }
        matched.truncate(k as usize);
        Ok(matched)
    }
}

/// Answers by quoting the evidence passed in the prompt. Never calls a
/// network; used when no hosted provider is configured.
struct OfflineProvider {
    capabilities: ProviderCapabilities,
}

impl OfflineProvider {
    fn new() -> Self {
        Self {
            capabilities: ProviderCapabilities {
                supports_streaming: false,
                supports_structured_output: false,
                supports_embeddings: false,
                max_context_tokens: Some(8_192),
                max_output_tokens: Some(1_024),
            },
        }
    }
}

#[async_trait]
impl LlmProvider for OfflineProvider {
    fn capabilities(&self) -> &ProviderCapabilities {
        &self.capabilities
    }

    fn name(&self) -> &str {
        "offline"
    }

    async fn complete(&self, request: CompletionRequest) -> ProviderResult<CompletionResponse> {
        let prompt = request.messages.last().map(|m| m.content.clone()).unwrap_or_default();
        let evidence_lines: Vec<&str> = prompt
            .lines()
            .filter(|line| line.trim_start().starts_with('['))
            .collect();
        let text = if evidence_lines.is_empty() {
            "No matching evidence was found for this question.".to_string()
        } else {
            format!("Based on the evidence above: {}", evidence_lines.join(" "))
        };
        info!("offline provider drafted a {}-byte answer", text.len());
        let usage = groundcrew_core::Usage {
            prompt_tokens: (prompt.len() / 4) as u32,
            completion_tokens: (text.len() / 4) as u32,
        };
        Ok(CompletionResponse { text, usage })
    }

    async fn complete_stream(&self, _request: CompletionRequest) -> ProviderResult<TokenStream> {
        Err(groundcrew_providers::ProviderError::InvalidRequest {
            provider: self.name().to_string(),
            message: "offline provider does not stream".into(),
        })
    }

    async fn complete_structured(
        &self,
        _request: CompletionRequest,
        _schema: &serde_json::Value,
    ) -> ProviderResult<serde_json::Value> {
        Err(groundcrew_providers::ProviderError::InvalidRequest {
            provider: self.name().to_string(),
            message: "offline provider does not support structured output; run with --advanced only against a hosted provider".into(),
        })
    }

    async fn embed(&self, _texts: &[String]) -> ProviderResult<Vec<Vec<f32>>> {
        Err(groundcrew_providers::ProviderError::InvalidRequest {
            provider: self.name().to_string(),
            message: "offline provider does not support embeddings".into(),
        })
    }
}
