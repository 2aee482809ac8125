//! ABOUTME: Post-synthesis critic: grades an answer's groundedness and coverage

use crate::error::{CriticError, Result};
use groundcrew_core::{citations_are_closed, extract_citations, CriticAction, CriticReport, Message, Reference, WebResult};
use groundcrew_providers::{CompletionRequest, LlmProvider};
use serde::Deserialize;
use serde_json::json;

/// Groundedness/coverage at or above this, with no LLM-flagged issues,
/// accepts the answer outright.
pub const DEFAULT_GROUNDEDNESS_THRESHOLD: f32 = 0.8;

fn split_sentences(text: &str) -> Vec<&str> {
    text.split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Fraction of `answer`'s sentences carrying at least one `[n]` citation
/// (the open-question decision for "coverage": monotonic, bounded in
/// `[0, 1]`, spec.md §9). An answer with no sentences at all is fully
/// covered vacuously.
#[must_use]
pub fn citation_coverage(answer: &str) -> f32 {
    let sentences = split_sentences(answer);
    if sentences.is_empty() {
        return 1.0;
    }
    let cited = sentences.iter().filter(|s| !extract_citations(s).is_empty()).count();
    cited as f32 / sentences.len() as f32
}

/// Wraps `groundcrew_core::citations_are_closed`: every citation in
/// `answer` must resolve to a reference in `references` (spec.md §8
/// property 2). The `Reference` doc comment names this function as the
/// enforcement point for that invariant.
#[must_use]
pub fn citation_closure(answer: &str, references: &[Reference]) -> bool {
    citations_are_closed(answer, references)
}

#[derive(Debug, Deserialize)]
struct RawIssues {
    #[serde(default)]
    issues: Vec<String>,
}

fn issues_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "issues": { "type": "array", "items": { "type": "string" } }
        },
        "required": ["issues"]
    })
}

/// Grades `answer` against `question`, `references`, and `web_context`
/// (spec.md §4.8). Groundedness/coverage are computed deterministically
/// from citation structure; `issues` come from an LLM pass asked to spot
/// unsupported or off-topic claims. Empty evidence is graded
/// `grounded=true, coverage=0` per spec.md's "insufficient evidence" edge
/// case — there are no claims to fail grounding.
pub async fn grade_answer(
    question: &str,
    answer: &str,
    references: &[Reference],
    web_context: &[WebResult],
    provider: &dyn LlmProvider,
    groundedness_threshold: f32,
) -> Result<CriticReport> {
    if references.is_empty() && web_context.is_empty() {
        return Ok(CriticReport::accept(1.0, 0.0));
    }

    let coverage = citation_coverage(answer);
    let groundedness = if citation_closure(answer, references) { coverage } else { 0.0 };

    let evidence: String = references
        .iter()
        .map(|r| format!("[{}] {}", r.id, r.content))
        .collect::<Vec<_>>()
        .join("\n");
    let prompt = format!(
        "Question: {question}\nAnswer: {answer}\nEvidence:\n{evidence}\n\n\
         List any issues with the answer: unsupported claims, claims that \
         contradict the evidence, or parts of the question left unaddressed. \
         Return an empty list if there are none."
    );
    let request = CompletionRequest::new(vec![Message::user(prompt)]);
    let value = provider.complete_structured(request, &issues_schema()).await?;
    let raw: RawIssues = serde_json::from_value(value).map_err(|e| CriticError::Schema(e.to_string()))?;

    let action = if groundedness >= groundedness_threshold && raw.issues.is_empty() {
        CriticAction::Accept
    } else {
        CriticAction::Revise
    };

    Ok(CriticReport {
        groundedness,
        coverage,
        issues: raw.issues,
        action,
    })
}
