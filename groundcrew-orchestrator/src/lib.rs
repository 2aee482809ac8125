//! ABOUTME: Session orchestrator — the turn pipeline tying every other groundcrew crate together

pub mod dispatch;
pub mod error;
pub mod response;
pub mod synth;

pub use error::{OrchestratorError, Result};
pub use response::{Diagnostics, Response, RouteInfo};

use chrono::Utc;
use groundcrew_config::{merge, FeatureLayer, FeatureSet};
use groundcrew_context::{budget, compact_history, select_summaries, SectionCaps, Sections};
use groundcrew_core::{
    CRAGAction, CriticReport, Intent, IntentKind, LongTermMemory, MemoryType, Message, Plan,
    PlanStep, PlanStepKind, Reference, RetrieverStrategy, RouteProfile, SessionId, TurnContext,
    Usage,
};
use groundcrew_critic::{critic_loop, grade_retrieval, refine, DEFAULT_GROUNDEDNESS_THRESHOLD};
use groundcrew_events::{AggregateCounters, EventBus, TraceRecorder, TurnEvent, TurnMode};
use groundcrew_memory::{recall_or_empty, LongTermMemoryStore, RecallFilter, ShortTermStore};
use groundcrew_planner::{plan_turn, PlannerOutput, PlannerTuning};
use groundcrew_providers::LlmProvider;
use groundcrew_retrieval::{RetrievalEngine, SearchClient};
use groundcrew_utils::{retry_with_backoff, CircuitBreakerManager, RateLimiter, RetryConfig};
use groundcrew_web::{filter, fuse, DomainAuthority, FilterOutcome, ScorableResult, WebSearchClient};
use parking_lot::Mutex as SyncMutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, instrument, warn};

/// Whether `Orchestrator::run_turn` drafts the answer in one shot or streams
/// it token-by-token as `TurnEvent::Token` events (`spec.md` §4.1's
/// synthesis step supports both).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseMode {
    #[default]
    Sync,
    Stream,
}

/// Races `fut` against the turn's cancellation token so a call to the
/// search client, web client, or provider doesn't run to completion after
/// the turn has already been told to stop.
async fn run_cancellable<T>(
    turn_ctx: &TurnContext,
    fut: impl std::future::Future<Output = Result<T>>,
) -> Result<T> {
    let token = turn_ctx.cancellation_token();
    tokio::select! {
        result = fut => result,
        () = token.cancelled() => Err(OrchestratorError::Cancelled),
    }
}

const KEEP_RECENT_MESSAGES: usize = 6;
const MAX_CRITIC_REVISIONS: u32 = 2;
const INSUFFICIENT_EVIDENCE_ANSWER: &str = "I don't have enough grounded evidence to answer this question.";
const CRAG_MIN_OVERLAP: f32 = 0.15;
const MEMORY_RECALL_TOP_K: usize = 5;
const MEMORY_RECALL_MIN_SIMILARITY: f32 = 0.75;

/// Wires every groundcrew component into one per-turn pipeline
/// (`spec.md` §4.1's 13 numbered steps).
pub struct Orchestrator {
    search_client: Arc<dyn SearchClient>,
    web_client: Option<Arc<dyn WebSearchClient>>,
    provider: Arc<dyn LlmProvider>,
    long_term: Option<Arc<dyn LongTermMemoryStore>>,
    short_term: ShortTermStore,
    events: EventBus,
    authority: DomainAuthority,
    defaults: FeatureSet,
    retry_config: RetryConfig,
    counters: SyncMutex<AggregateCounters>,
    circuit_breakers: CircuitBreakerManager,
    rate_limiter: RateLimiter,
}

impl Orchestrator {
    #[must_use]
    pub fn new(search_client: Arc<dyn SearchClient>, provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            search_client,
            web_client: None,
            provider,
            long_term: None,
            short_term: ShortTermStore::new(),
            events: EventBus::new(),
            authority: DomainAuthority::default(),
            defaults: FeatureSet::default(),
            retry_config: RetryConfig::default(),
            counters: SyncMutex::new(AggregateCounters::default()),
            circuit_breakers: CircuitBreakerManager::new(),
            rate_limiter: RateLimiter::default(),
        }
    }

    #[must_use]
    pub fn with_web_client(mut self, client: Arc<dyn WebSearchClient>) -> Self {
        self.web_client = Some(client);
        self
    }

    #[must_use]
    pub fn with_long_term_memory(mut self, store: Arc<dyn LongTermMemoryStore>) -> Self {
        self.long_term = Some(store);
        self
    }

    #[must_use]
    pub fn with_domain_authority(mut self, authority: DomainAuthority) -> Self {
        self.authority = authority;
        self
    }

    #[must_use]
    pub fn with_defaults(mut self, defaults: FeatureSet) -> Self {
        self.defaults = defaults;
        self
    }

    #[must_use]
    pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }

    #[must_use]
    pub fn with_circuit_breaker_config(mut self, config: groundcrew_utils::BreakerConfig) -> Self {
        self.circuit_breakers = CircuitBreakerManager::with_config(config);
        self
    }

    #[must_use]
    pub fn with_rate_limit_config(mut self, config: groundcrew_utils::TokenBucketConfig) -> Self {
        self.rate_limiter = RateLimiter::new(config);
        self
    }

    /// Runs `fut` for `vendor`'s upstream, denying the call outright if that
    /// upstream's circuit breaker is open and otherwise recording success
    /// or failure against it. Callers pass an already-retrying future (see
    /// `groundcrew_utils::retry_with_backoff`) so a breaker trip reflects
    /// exhausted retries, not a single blip.
    async fn guarded<T, E>(&self, vendor: &str, fut: impl std::future::Future<Output = std::result::Result<T, E>>) -> Result<T>
    where
        OrchestratorError: From<E>,
    {
        self.rate_limiter.acquire(vendor, 1.0).await;
        let breaker = self.circuit_breakers.get_or_create(vendor);
        if !breaker.can_execute() {
            return Err(OrchestratorError::CircuitOpen(vendor.to_string()));
        }
        let started = Instant::now();
        match fut.await {
            Ok(value) => {
                breaker.record_success(started.elapsed());
                Ok(value)
            }
            Err(err) => {
                breaker.record_failure();
                Err(err.into())
            }
        }
    }

    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    #[must_use]
    pub fn aggregate_error_rate(&self) -> f64 {
        self.counters.lock().error_rate()
    }

    fn question_of(messages: &[Message]) -> String {
        messages
            .iter()
            .rev()
            .find(|m| m.is_user())
            .map(|m| m.content.clone())
            .unwrap_or_default()
    }

    fn section_caps(budget_tokens: u32) -> SectionCaps {
        let total = budget_tokens as usize;
        SectionCaps {
            history: total * 25 / 100,
            summary: total * 15 / 100,
            salience: total * 10 / 100,
            references: total * 40 / 100,
            web_context: total * 10 / 100,
        }
    }

    async fn embed_one(&self, text: &str) -> Option<Vec<f32>> {
        if !self.provider.capabilities().supports_embeddings {
            return None;
        }
        self.provider
            .embed(&[text.to_string()])
            .await
            .ok()
            .and_then(|mut rows| rows.pop())
    }

    async fn embed_many(&self, texts: &[String]) -> Option<Vec<Vec<f32>>> {
        if texts.is_empty() || !self.provider.capabilities().supports_embeddings {
            return Some(Vec::new());
        }
        self.provider.embed(texts).await.ok()
    }

    /// Runs one complete turn: context assembly, memory recall, planning,
    /// concurrent retrieval/web dispatch, CRAG gating, synthesis, critic
    /// revision, memory write, and telemetry finalization.
    #[instrument(skip(self, messages, persisted_overrides, request_overrides))]
    pub async fn run_turn(
        &self,
        messages: &[Message],
        persisted_overrides: Option<&FeatureLayer>,
        request_overrides: Option<&FeatureLayer>,
        session_id: Option<SessionId>,
        mode: ResponseMode,
    ) -> Result<Response> {
        let features = merge(self.defaults, persisted_overrides, request_overrides);
        let session_id = session_id.unwrap_or_else(|| SessionId::derive(messages));
        let question = Self::question_of(messages);
        let existing_memory = self.short_term.get(session_id.as_str());
        let turn = existing_memory.turn + 1;

        let turn_ctx = TurnContext::new(session_id.clone(), turn)
            .with_deadline(Duration::from_millis(features.turn_timeout_ms));
        let mut recorder = TraceRecorder::start(session_id.as_str(), TurnMode::Grounded, question.clone());

        self.events.publish(session_id.as_str(), turn, TurnEvent::Status { message: "starting turn".into() });

        match self.run_pipeline(&turn_ctx, &features, messages, &question, &existing_memory, turn, mode).await {
            Ok(mut outcome) => {
                for step in &outcome.steps {
                    recorder.emit(step.0.clone(), step.1, step.2);
                }
                recorder.add_usage(outcome.usage);
                let telemetry = recorder.complete();
                self.counters.lock().record(&telemetry, true);
                self.events.publish(session_id.as_str(), turn, TurnEvent::Telemetry { telemetry: telemetry.clone() });
                self.events.publish(session_id.as_str(), turn, TurnEvent::Complete { answer: outcome.response.answer.clone() });
                self.events.publish(session_id.as_str(), turn, TurnEvent::Done);
                outcome.response.activity = telemetry.steps.clone();
                outcome.response.usage = telemetry.usage;
                outcome.response.turn = turn;
                outcome.response.session_id = session_id.0;
                Ok(outcome.response)
            }
            Err(err) => {
                let telemetry = recorder.fail(format!("{:?}", err.kind()));
                self.counters.lock().record(&telemetry, false);
                self.events.publish(session_id.as_str(), turn, TurnEvent::Error { error: err.to_turn_error() });
                self.events.publish(session_id.as_str(), turn, TurnEvent::Done);
                Err(err)
            }
        }
    }

    #[allow(clippy::too_many_lines)]
    async fn run_pipeline(
        &self,
        turn_ctx: &TurnContext,
        features: &FeatureSet,
        messages: &[Message],
        question: &str,
        existing_memory: &groundcrew_memory::SessionMemory,
        turn: u32,
        mode: ResponseMode,
    ) -> Result<PipelineOutcome> {
        let session_id = turn_ctx.session_id.as_str();
        let mut steps: Vec<(String, u64, bool)> = Vec::new();
        let mut usage = Usage::default();

        // Step: context pipeline (compaction + summary selection + budgeting)
        let started = Instant::now();
        let compaction = compact_history(messages, KEEP_RECENT_MESSAGES, turn, self.provider.as_ref()).await?;
        let query_embedding = self.embed_one(question).await;

        let mut bullets = existing_memory.summary_bullets.clone();
        bullets.extend(compaction.summary_bullets.clone());
        let bullet_texts: Vec<String> = bullets.iter().map(|b| b.text.clone()).collect();
        let bullet_embeddings = self.embed_many(&bullet_texts).await;
        let selected_bullets = select_summaries(query_embedding.as_deref(), &bullets, bullet_embeddings.as_deref(), 5);

        let mut salience_texts: Vec<String> = existing_memory
            .salience_notes
            .iter()
            .chain(compaction.salience_notes.iter())
            .map(|n| n.text.clone())
            .collect();

        if features.enable_semantic_memory {
            if let (Some(store), Some(embedding)) = (&self.long_term, &query_embedding) {
                let filter = RecallFilter { session_id: Some(session_id.to_string()), ..RecallFilter::default() };
                let recalled = recall_or_empty(store.as_ref(), embedding, MEMORY_RECALL_TOP_K, MEMORY_RECALL_MIN_SIMILARITY, &filter).await;
                salience_texts.extend(recalled.into_iter().map(|m| m.text));
            }
        }

        let history_texts: Vec<String> = compaction
            .recent_messages
            .iter()
            .map(|m| format!("{:?}: {}", m.role, m.content))
            .collect();

        steps.push(("context".into(), started.elapsed().as_millis() as u64, true));
        if turn_ctx.deadline_exceeded() {
            return Err(OrchestratorError::DeadlineExceeded);
        }

        // Step: intent routing and planning
        let started = Instant::now();
        let planner_output = if features.enable_intent_routing {
            let tuning = PlannerTuning {
                enable_decomposition: features.enable_query_decomposition,
                ..PlannerTuning::default()
            };
            plan_turn(question, self.provider.as_ref(), tuning).await?
        } else {
            default_planner_output(question)
        };
        steps.push(("plan".into(), started.elapsed().as_millis() as u64, true));

        self.events.publish(session_id, turn, TurnEvent::Route { route: planner_output.route.clone() });
        self.events.publish(session_id, turn, TurnEvent::Plan { plan: planner_output.plan.clone() });

        // Step: concurrent retrieval + web dispatch
        let started = Instant::now();
        let engine = if features.enable_adaptive_retrieval {
            RetrievalEngine::new(Arc::clone(&self.search_client)).with_reformulation_provider(Arc::clone(&self.provider))
        } else {
            RetrievalEngine::new(Arc::clone(&self.search_client))
        };

        let run_retrieval = planner_output.plan.contains(PlanStepKind::Retrieve) || planner_output.decomposition.is_some();
        let run_web = planner_output.plan.contains(PlanStepKind::WebSearch) && self.web_client.is_some();

        let vector_future = async {
            if !run_retrieval {
                return Ok((Vec::new(), None));
            }
            if let Some((decomposed, _)) = &planner_output.decomposition {
                let references = dispatch::run_decomposed_retrieval(&engine, decomposed, features.max_parallel_sub_queries, features.max_reformulations).await;
                Ok::<_, OrchestratorError>((references, None))
            } else {
                let lazy = planner_output.route.use_lazy_retrieval && features.enable_lazy_retrieval;
                let config = self.retry_config.clone();
                let result = self
                    .guarded(
                        "search",
                        retry_with_backoff(
                            &config,
                            |e: &groundcrew_retrieval::RetrievalError| e.kind(),
                            |_| None,
                            || dispatch::run_vector_retrieval(&engine, question, features.top_k, features.reranker_threshold, features.max_reformulations, lazy),
                        ),
                    )
                    .await?;
                Ok::<_, OrchestratorError>((result.references, Some(result.diagnostics)))
            }
        };

        let web_future = async {
            if !run_web {
                return Ok(Vec::new());
            }
            let client = self.web_client.as_ref().expect("checked by run_web");
            let config = self.retry_config.clone();
            self.guarded(
                "web",
                retry_with_backoff(
                    &config,
                    |e: &groundcrew_web::WebError| e.kind(),
                    |_| None,
                    || client.search(question, features.top_k),
                ),
            )
            .await
        };

        let (vector_outcome, raw_web_results) = tokio::join!(run_cancellable(turn_ctx, vector_future), run_cancellable(turn_ctx, web_future));
        let (index_refs, retrieval_diagnostics) = vector_outcome?;
        let raw_web_results = raw_web_results?;
        steps.push(("dispatch".into(), started.elapsed().as_millis() as u64, true));
        if turn_ctx.deadline_exceeded() {
            return Err(OrchestratorError::DeadlineExceeded);
        }

        if !raw_web_results.is_empty() {
            self.events.publish(session_id, turn, TurnEvent::WebResults { results: raw_web_results.clone() });
        }

        // Step: web quality filter + fusion
        let started = Instant::now();
        let (web_results, web_kept, web_removed) = if features.enable_web_quality_filter && !raw_web_results.is_empty() {
            if let Some(embedding) = &query_embedding {
                let snippets: Vec<String> = raw_web_results.iter().map(|r| r.snippet.clone()).collect();
                let web_embeddings = self.embed_many(&snippets).await.unwrap_or_default();
                let known: Vec<Vec<f32>> = {
                    let contents: Vec<String> = index_refs.iter().map(|r| r.content.clone()).collect();
                    self.embed_many(&contents).await.unwrap_or_default()
                };
                if web_embeddings.len() == raw_web_results.len() {
                    let candidates: Vec<ScorableResult> = raw_web_results
                        .iter()
                        .cloned()
                        .zip(web_embeddings)
                        .map(|(result, embedding)| ScorableResult { result, embedding })
                        .collect();
                    let FilterOutcome { kept, removed } = filter(candidates, embedding, &known, &self.authority);
                    let kept_count = kept.len();
                    let removed_count = removed.len();
                    (kept, Some(kept_count), Some(removed_count))
                } else {
                    (raw_web_results, None, None)
                }
            } else {
                (raw_web_results, None, None)
            }
        } else {
            (raw_web_results, None, None)
        };

        let web_as_refs = dispatch::web_results_to_references(&web_results);
        let semantic_boost_map: Option<HashMap<String, Vec<f32>>> = if features.enable_semantic_boost && query_embedding.is_some() {
            let mut map = HashMap::new();
            let all_refs: Vec<&Reference> = index_refs.iter().chain(web_as_refs.iter()).collect();
            let contents: Vec<String> = all_refs.iter().map(|r| r.content.clone()).collect();
            if let Some(embeddings) = self.embed_many(&contents).await {
                for (reference, embedding) in all_refs.iter().zip(embeddings) {
                    let key = reference.url.as_ref().map(|u| u.trim_end_matches('/').to_lowercase()).unwrap_or_else(|| reference.id.clone());
                    map.insert(key, embedding);
                }
            }
            Some(map)
        } else {
            None
        };
        let semantic_boost = match (&query_embedding, &semantic_boost_map) {
            (Some(embedding), Some(map)) => Some((embedding.as_slice(), map, features.semantic_boost_weight)),
            _ => None,
        };
        let mut references = fuse(&index_refs, &web_as_refs, features.rrf_k as f32, semantic_boost);
        steps.push(("fuse".into(), started.elapsed().as_millis() as u64, true));

        // Step: CRAG gate
        let started = Instant::now();
        let crag_action = if features.enable_crag && !references.is_empty() {
            let evaluation = grade_retrieval(question, &references, self.provider.as_ref()).await?;
            match evaluation.action {
                CRAGAction::Use => {}
                CRAGAction::Refine => references = refine(question, references, CRAG_MIN_OVERLAP),
                CRAGAction::WebFallback => {
                    if let Some(client) = &self.web_client {
                        if let Ok(fallback) = client.search(question, features.top_k).await {
                            let fallback_refs = dispatch::web_results_to_references(&fallback);
                            references = fuse(&references, &fallback_refs, features.rrf_k as f32, None);
                        }
                    }
                }
            }
            Some(evaluation.action)
        } else {
            None
        };
        steps.push(("crag".into(), started.elapsed().as_millis() as u64, true));

        // Step: context budgeting
        let reference_texts: Vec<String> = references
            .iter()
            .map(|r| format!("[{}] {}: {}", r.id, r.title.clone().unwrap_or_default(), r.content))
            .collect();
        let sections = budget(
            Sections {
                history: history_texts,
                summary: selected_bullets.into_iter().map(|b| b.text).collect(),
                salience: salience_texts,
                references: reference_texts,
                web_context: Vec::new(),
            },
            Self::section_caps(features.context_token_budget),
        );

        // Step: synthesis. Evidence-free turns skip the provider call
        // entirely and return a deterministic refusal, matching the
        // critic's own "insufficient evidence" grading (spec.md §4.8).
        let started = Instant::now();
        let (mut answer, draft_usage) = if references.is_empty() {
            (INSUFFICIENT_EVIDENCE_ANSWER.to_string(), Usage::default())
        } else {
            let prompt = synth::build_prompt(question, &sections, &[]);
            let vendor = format!("provider:{}", self.provider.name());
            match mode {
                ResponseMode::Sync => {
                    run_cancellable(turn_ctx, self.guarded(&vendor, synth::synthesize(self.provider.as_ref(), prompt))).await?
                }
                ResponseMode::Stream => {
                    run_cancellable(
                        turn_ctx,
                        self.guarded(
                            &vendor,
                            synth::synthesize_streaming(self.provider.as_ref(), prompt, |chunk| {
                                self.events.publish(session_id, turn, TurnEvent::Token { text: chunk.to_string() });
                            }),
                        ),
                    )
                    .await?
                }
            }
        };
        usage = usage.combine(draft_usage);
        steps.push(("synthesize".into(), started.elapsed().as_millis() as u64, true));
        if turn_ctx.deadline_exceeded() {
            return Err(OrchestratorError::DeadlineExceeded);
        }

        self.events.publish(session_id, turn, TurnEvent::Context { references: references.clone() });

        if turn_ctx.deadline_exceeded() {
            return Err(OrchestratorError::DeadlineExceeded);
        }

        // Step: critic revision loop
        let started = Instant::now();
        let mut reports: Vec<CriticReport> = Vec::new();
        if features.enable_critic && !references.is_empty() {
            let revision_usage = Arc::new(SyncMutex::new(Usage::default()));
            let provider = self.provider.as_ref();
            let revision_usage_for_closure = Arc::clone(&revision_usage);
            let (revised, critic_reports) = critic_loop(
                question,
                answer,
                &references,
                &[],
                provider,
                MAX_CRITIC_REVISIONS,
                DEFAULT_GROUNDEDNESS_THRESHOLD,
                |_draft, notes| {
                    let revision_usage = Arc::clone(&revision_usage_for_closure);
                    let sections = sections.clone();
                    async move {
                        let prompt = synth::build_prompt(question, &sections, &notes);
                        let call = provider.complete(groundcrew_providers::CompletionRequest::new(vec![Message::user(prompt)]));
                        let token = turn_ctx.cancellation_token();
                        let response = tokio::select! {
                            result = call => result.map_err(groundcrew_critic::CriticError::from)?,
                            () = token.cancelled() => return Err(groundcrew_critic::CriticError::Cancelled),
                        };
                        let mut guard = revision_usage.lock();
                        *guard = guard.combine(response.usage);
                        Ok(response.text)
                    }
                },
            )
            .await?;
            answer = revised;
            reports = critic_reports;
            usage = usage.combine(*revision_usage.lock());
            for report in &reports {
                self.events.publish(session_id, turn, TurnEvent::Critique { report: report.clone() });
            }
        }
        steps.push(("critic".into(), started.elapsed().as_millis() as u64, true));

        let citation_ids = groundcrew_core::extract_citations(&answer);
        self.events.publish(session_id, turn, TurnEvent::Citations { ids: citation_ids });

        // Step: memory write
        let started = Instant::now();
        for bullet in &compaction.summary_bullets {
            self.short_term.touch(session_id, turn, Some(bullet.clone()), None);
        }
        for note in &compaction.salience_notes {
            self.short_term.touch(session_id, turn, None, Some(note.clone()));
        }
        if compaction.summary_bullets.is_empty() && compaction.salience_notes.is_empty() {
            self.short_term.touch(session_id, turn, None, None);
        }
        if features.enable_semantic_memory {
            if let (Some(store), Some(embedding)) = (&self.long_term, self.embed_one(&answer).await) {
                let memory = LongTermMemory::new(
                    uuid::Uuid::new_v4().to_string(),
                    session_id,
                    MemoryType::Episodic,
                    format!("Q: {question}\nA: {answer}"),
                    embedding,
                    Utc::now(),
                );
                if let Err(err) = store.add(memory).await {
                    warn!(error = %err, "failed to persist long-term memory");
                }
            }
        }
        steps.push(("memory".into(), started.elapsed().as_millis() as u64, true));

        let retrieval_failed = retrieval_diagnostics.as_ref().is_some_and(|d| !d.succeeded);
        let critic_unresolved = reports.last().is_some_and(|r| r.action != groundcrew_core::CriticAction::Accept);
        let route_info = response::route_info(&planner_output.intent, &planner_output.route);
        let diagnostics = Diagnostics {
            retrieval: retrieval_diagnostics.map(|d| response::RetrievalDiagnosticsView {
                stage: format!("{:?}", d.stage),
                reformulations: d.reformulations,
                attempted: d.attempted,
                succeeded: d.succeeded,
                mean_score: d.mean_score,
                min_score: d.min_score,
                max_score: d.max_score,
            }),
            web_filter_kept: web_kept,
            web_filter_removed: web_removed,
            decomposition: planner_output.decomposition.as_ref().map(|(d, _)| response::DecompositionDiagnosticsView {
                sub_query_count: d.sub_queries.len(),
                fell_back: d.sub_queries.len() == 1,
            }),
            crag_action: crag_action.map(|a| format!("{a:?}")),
            partial: retrieval_failed || critic_unresolved,
            critic_unresolved,
        };

        info!(turn, session_id, answer_len = answer.len(), "turn completed");

        Ok(PipelineOutcome {
            response: Response {
                answer,
                references,
                web_results,
                activity: Vec::new(),
                plan: planner_output.plan,
                critic: reports,
                route: Some(route_info),
                diagnostics,
                usage: Usage::default(),
                session_id: String::new(),
                turn: 0,
            },
            usage,
            steps,
        })
    }
}

struct PipelineOutcome {
    response: Response,
    usage: Usage,
    steps: Vec<(String, u64, bool)>,
}

/// The manual dual-retrieval plan used when intent routing is disabled —
/// always searches both the index and the web rather than trusting a
/// classifier that was never consulted.
fn default_planner_output(_question: &str) -> PlannerOutput {
    PlannerOutput {
        intent: Intent { kind: IntentKind::FactualLookup, confidence: 1.0 },
        route: RouteProfile { strategy: RetrieverStrategy::Hybrid, use_lazy_retrieval: false, use_decomposition: false },
        plan: Plan::new(vec![
            PlanStep { kind: PlanStepKind::Retrieve, description: "retrieve from the internal knowledge index".into() },
            PlanStep { kind: PlanStepKind::WebSearch, description: "search the public web".into() },
            PlanStep { kind: PlanStepKind::Synthesize, description: "draft the answer".into() },
        ]),
        plan_confidence: 1.0,
        decomposition: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use groundcrew_providers::{
        CompletionResponse, ProviderCapabilities, Result as ProviderResult, TokenStream,
    };
    use groundcrew_retrieval::{SearchClient, SearchQuery};
    use groundcrew_web::WebSearchClient as WebSearchClientTrait;
    use serde_json::{json, Value};
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;

    struct FakeSearchClient {
        references: Vec<Reference>,
    }

    #[async_trait]
    impl SearchClient for FakeSearchClient {
        async fn search(&self, _query: &SearchQuery) -> groundcrew_retrieval::Result<Vec<Reference>> {
            Ok(self.references.clone())
        }

        async fn load(&self, id: &str) -> groundcrew_retrieval::Result<Reference> {
            self.references
                .iter()
                .find(|r| r.id == id)
                .cloned()
                .ok_or(groundcrew_retrieval::RetrievalError::Empty)
        }
    }

    struct FakeWebClient {
        results: Vec<groundcrew_core::WebResult>,
    }

    #[async_trait]
    impl WebSearchClientTrait for FakeWebClient {
        async fn search(&self, _query: &str, _k: u32) -> groundcrew_web::Result<Vec<groundcrew_core::WebResult>> {
            Ok(self.results.clone())
        }
    }

    struct FakeProvider {
        capabilities: ProviderCapabilities,
        completion_text: String,
        structured_responses: StdMutex<VecDeque<Value>>,
    }

    impl FakeProvider {
        fn new(completion_text: impl Into<String>, structured_responses: Vec<Value>) -> Self {
            Self {
                capabilities: ProviderCapabilities {
                    supports_streaming: true,
                    supports_structured_output: true,
                    supports_embeddings: false,
                    max_context_tokens: Some(8_000),
                    max_output_tokens: Some(1_000),
                },
                completion_text: completion_text.into(),
                structured_responses: StdMutex::new(structured_responses.into()),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for FakeProvider {
        fn name(&self) -> &str {
            "fake"
        }

        fn capabilities(&self) -> &ProviderCapabilities {
            &self.capabilities
        }

        async fn complete(&self, _request: groundcrew_providers::CompletionRequest) -> ProviderResult<CompletionResponse> {
            Ok(CompletionResponse { text: self.completion_text.clone(), usage: Usage { prompt_tokens: 20, completion_tokens: 10 } })
        }

        async fn complete_stream(&self, _request: groundcrew_providers::CompletionRequest) -> ProviderResult<TokenStream> {
            let chunks: Vec<ProviderResult<String>> = self
                .completion_text
                .split_inclusive(' ')
                .map(|chunk| Ok(chunk.to_string()))
                .collect();
            Ok(Box::pin(futures::stream::iter(chunks)))
        }

        async fn complete_structured(
            &self,
            _request: groundcrew_providers::CompletionRequest,
            _schema: &Value,
        ) -> ProviderResult<Value> {
            Ok(self.structured_responses.lock().unwrap().pop_front().expect("response queued for this call"))
        }

        async fn embed(&self, _texts: &[String]) -> ProviderResult<Vec<Vec<f32>>> {
            unimplemented!("embeddings disabled in these tests")
        }
    }

    fn disabled_features() -> FeatureSet {
        FeatureSet {
            enable_lazy_retrieval: false,
            enable_intent_routing: false,
            enable_query_decomposition: false,
            enable_web_reranking: false,
            enable_semantic_boost: false,
            enable_semantic_memory: false,
            enable_critic: false,
            enable_crag: false,
            enable_web_quality_filter: false,
            enable_adaptive_retrieval: false,
            ..FeatureSet::default()
        }
    }

    fn one_reference() -> Reference {
        Reference {
            id: "1".into(),
            title: Some("Paris".into()),
            url: Some("https://example.com/paris".into()),
            page_number: None,
            content: "Paris is the capital of France.".into(),
            score: Some(0.9),
            captions: Vec::new(),
            source: groundcrew_core::ReferenceSource::Index,
            is_summary: false,
        }
    }

    fn one_web_result() -> groundcrew_core::WebResult {
        groundcrew_core::WebResult::new("https://example.com/web", "Paris facts", "Paris, capital of France, has 2M residents.")
    }

    #[tokio::test]
    async fn minimal_pipeline_with_routing_disabled_returns_grounded_answer() {
        let search = Arc::new(FakeSearchClient { references: vec![one_reference()] });
        let web = Arc::new(FakeWebClient { results: vec![one_web_result()] });
        let provider = Arc::new(FakeProvider::new("Paris is the capital of France [1].", Vec::new()));

        let orchestrator = Orchestrator::new(search, provider)
            .with_web_client(web)
            .with_defaults(disabled_features());

        let messages = vec![Message::user("What is the capital of France?")];
        let response = orchestrator.run_turn(&messages, None, None, None, ResponseMode::Sync).await.unwrap();

        assert_eq!(response.answer, "Paris is the capital of France [1].");
        assert_eq!(response.turn, 1);
        assert!(!response.references.is_empty());
        assert!(response.critic.is_empty());
        assert_eq!(response.diagnostics.retrieval.as_ref().map(|d| d.succeeded), Some(true));
        assert!(!response.activity.is_empty());
        assert!(response.activity.iter().any(|step| step.name == "synthesize"));
    }

    #[tokio::test]
    async fn streaming_mode_publishes_token_events_and_assembles_the_same_answer() {
        let search = Arc::new(FakeSearchClient { references: vec![one_reference()] });
        let provider = Arc::new(FakeProvider::new("Paris is the capital of France [1].", Vec::new()));
        let orchestrator = Orchestrator::new(search, provider).with_defaults(disabled_features());

        let messages = vec![Message::user("What is the capital of France?")];
        let session_id = SessionId::derive(&messages);
        let mut subscriber = orchestrator.events().subscribe(session_id.as_str());
        let response = orchestrator
            .run_turn(&messages, None, None, Some(session_id), ResponseMode::Stream)
            .await
            .unwrap();

        assert_eq!(response.answer, "Paris is the capital of France [1].");

        let mut reassembled = String::new();
        while let Ok(correlated) = subscriber.try_recv() {
            if let TurnEvent::Token { text } = correlated.event {
                reassembled.push_str(&text);
            }
        }
        assert_eq!(reassembled, "Paris is the capital of France [1].");
    }

    #[tokio::test]
    async fn second_turn_on_same_session_advances_turn_number() {
        let search = Arc::new(FakeSearchClient { references: vec![one_reference()] });
        let provider = Arc::new(FakeProvider::new("Paris [1].", Vec::new()));
        let orchestrator = Orchestrator::new(search, provider).with_defaults(disabled_features());

        let messages = vec![Message::user("What is the capital of France?")];
        let session_id = SessionId::derive(&messages);

        orchestrator.run_turn(&messages, None, None, Some(session_id.clone()), ResponseMode::Sync).await.unwrap();
        let second = orchestrator.run_turn(&messages, None, None, Some(session_id), ResponseMode::Sync).await.unwrap();

        assert_eq!(second.turn, 2);
    }

    #[tokio::test]
    async fn full_pipeline_with_routing_critic_and_crag_accepts_on_first_pass() {
        let search = Arc::new(FakeSearchClient { references: vec![one_reference()] });
        let web = Arc::new(FakeWebClient { results: vec![one_web_result()] });
        let structured_responses = vec![
            json!({"intent": "factual_lookup", "confidence": 0.95, "reasoning": "asks for a fact"}),
            json!({"confidence": 0.9, "steps": ["vector_search"], "rationale": "internal index suffices"}),
            json!({"confidence": "correct", "rationale": "evidence directly answers the question"}),
            json!({"issues": []}),
        ];
        let provider = Arc::new(FakeProvider::new("Paris is the capital of France [1].", structured_responses));

        let mut features = disabled_features();
        features.enable_intent_routing = true;
        features.enable_critic = true;
        features.enable_crag = true;

        let orchestrator = Orchestrator::new(search, provider).with_web_client(web).with_defaults(features);
        let messages = vec![Message::user("What is the capital of France?")];
        let response = orchestrator.run_turn(&messages, None, None, None, ResponseMode::Sync).await.unwrap();

        assert_eq!(response.answer, "Paris is the capital of France [1].");
        assert_eq!(response.critic.len(), 1);
        assert_eq!(response.diagnostics.crag_action.as_deref(), Some("Use"));
        assert_eq!(response.route.as_ref().map(|r| r.intent.as_str()), Some("FactualLookup"));
        assert!(!response.diagnostics.critic_unresolved);
        assert!(!response.diagnostics.partial);
    }

    #[tokio::test]
    async fn no_evidence_returns_a_refusal_without_drafting_an_answer() {
        let search = Arc::new(FakeSearchClient { references: vec![] });
        let structured_responses = vec![
            json!({"intent": "factual_lookup", "confidence": 0.95, "reasoning": "asks for a fact"}),
            json!({"confidence": 0.9, "steps": [], "rationale": "no retrieval needed"}),
        ];
        let provider = Arc::new(FakeProvider::new("should never be used", structured_responses));
        let mut features = disabled_features();
        features.enable_intent_routing = true;
        let orchestrator = Orchestrator::new(search, provider).with_defaults(features);

        let messages = vec![Message::user("What is the capital of France?")];
        let response = orchestrator.run_turn(&messages, None, None, None, ResponseMode::Sync).await.unwrap();

        assert_eq!(response.answer, INSUFFICIENT_EVIDENCE_ANSWER);
        assert!(response.references.is_empty());
        assert!(response.critic.is_empty());
    }

    #[tokio::test]
    async fn exhausted_critic_revisions_mark_the_response_partial() {
        let search = Arc::new(FakeSearchClient { references: vec![one_reference()] });
        let structured_responses = vec![
            json!({"issues": ["still unsupported"]}),
            json!({"issues": ["still unsupported"]}),
            json!({"issues": ["still unsupported"]}),
        ];
        let provider = Arc::new(FakeProvider::new("Paris is the capital of France [1].", structured_responses));
        let mut features = disabled_features();
        features.enable_critic = true;
        let orchestrator = Orchestrator::new(search, provider).with_defaults(features);

        let messages = vec![Message::user("What is the capital of France?")];
        let response = orchestrator.run_turn(&messages, None, None, None, ResponseMode::Sync).await.unwrap();

        assert_eq!(response.critic.len(), 3);
        assert!(response.critic.iter().all(|r| r.action == groundcrew_core::CriticAction::Revise));
        assert!(response.diagnostics.critic_unresolved);
        assert!(response.diagnostics.partial);
    }

    #[tokio::test]
    async fn zero_timeout_trips_the_deadline_before_planning_runs() {
        let search = Arc::new(FakeSearchClient { references: vec![one_reference()] });
        let provider = Arc::new(FakeProvider::new("answer", Vec::new()));
        let mut features = disabled_features();
        features.turn_timeout_ms = 0;
        let orchestrator = Orchestrator::new(search, provider).with_defaults(features);

        let messages = vec![Message::user("What is the capital of France?")];
        let err = orchestrator.run_turn(&messages, None, None, None, ResponseMode::Sync).await.unwrap_err();

        assert!(matches!(err, OrchestratorError::DeadlineExceeded));
    }
}
