//! ABOUTME: Pre-synthesis CRAG grading of retrieved evidence and low-signal refinement

use crate::error::{CriticError, Result};
use groundcrew_core::{CRAGAction, CRAGConfidence, CRAGEvaluation, Message, Reference};
use groundcrew_providers::{CompletionRequest, LlmProvider};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashSet;

#[derive(Debug, Deserialize)]
struct RawEvaluation {
    confidence: CRAGConfidence,
    rationale: String,
}

fn evaluation_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "confidence": { "type": "string", "enum": ["correct", "ambiguous", "incorrect"] },
            "rationale": { "type": "string" }
        },
        "required": ["confidence", "rationale"]
    })
}

/// Grades whether retrieved `references` actually answer `question`
/// (spec.md §4.8, Corrective RAG).
pub async fn grade_retrieval(question: &str, references: &[Reference], provider: &dyn LlmProvider) -> Result<CRAGEvaluation> {
    if references.is_empty() {
        return Ok(CRAGEvaluation {
            confidence: CRAGConfidence::Incorrect,
            action: CRAGAction::WebFallback,
            rationale: "no references were retrieved".into(),
        });
    }

    let evidence: String = references
        .iter()
        .map(|r| format!("[{}] {}", r.id, r.content))
        .collect::<Vec<_>>()
        .join("\n");
    let prompt = format!(
        "Question: {question}\nRetrieved evidence:\n{evidence}\n\n\
         Grade whether this evidence is sufficient to answer the question: \
         correct (clearly sufficient), ambiguous (partially relevant but \
         noisy), or incorrect (not relevant). Give a one-sentence rationale."
    );
    let request = CompletionRequest::new(vec![Message::user(prompt)]);
    let value = provider.complete_structured(request, &evaluation_schema()).await?;
    let raw: RawEvaluation = serde_json::from_value(value).map_err(|e| CriticError::Schema(e.to_string()))?;

    Ok(CRAGEvaluation {
        confidence: raw.confidence,
        action: CRAGEvaluation::action_for(raw.confidence),
        rationale: raw.rationale,
    })
}

fn words(text: &str) -> HashSet<String> {
    text.split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f32 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    intersection as f32 / union as f32
}

/// Strips sentences from each reference's content with low lexical overlap
/// against `question`, implementing the `ambiguous` CRAG action ("refine
/// by stripping low-similarity sentences", spec.md §4.8). A reference left
/// with no surviving sentences keeps its first sentence rather than going
/// empty, since a citation must still resolve to some content.
#[must_use]
pub fn refine(question: &str, references: Vec<Reference>, min_overlap: f32) -> Vec<Reference> {
    let question_words = words(question);
    references
        .into_iter()
        .map(|mut reference| {
            let sentences: Vec<&str> = reference
                .content
                .split(['.', '!', '?'])
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect();
            let mut kept: Vec<&str> = sentences
                .iter()
                .copied()
                .filter(|s| jaccard(&question_words, &words(s)) >= min_overlap)
                .collect();
            if kept.is_empty() {
                if let Some(first) = sentences.first() {
                    kept.push(first);
                }
            }
            reference.content = kept.join(". ");
            reference
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::StubProvider;

    #[tokio::test]
    async fn empty_references_grade_incorrect_without_calling_the_provider() {
        let provider = StubProvider::with_json(json!({"confidence": "correct", "rationale": "unused"}));
        let evaluation = grade_retrieval("q", &[], &provider).await.unwrap();
        assert_eq!(evaluation.confidence, CRAGConfidence::Incorrect);
        assert_eq!(evaluation.action, CRAGAction::WebFallback);
    }

    #[tokio::test]
    async fn ambiguous_confidence_maps_to_refine_action() {
        let refs = vec![Reference::from_index("1", "some loosely related text")];
        let provider = StubProvider::with_json(json!({"confidence": "ambiguous", "rationale": "partially relevant"}));
        let evaluation = grade_retrieval("q", &refs, &provider).await.unwrap();
        assert_eq!(evaluation.action, CRAGAction::Refine);
    }

    #[test]
    fn refine_keeps_only_overlapping_sentences() {
        let refs = vec![Reference::from_index("1", "Rust has ownership and borrowing. The weather today is sunny.")];
        let refined = refine("what is rust ownership", refs, 0.2);
        assert!(refined[0].content.contains("ownership"));
        assert!(!refined[0].content.contains("weather"));
    }

    #[test]
    fn refine_never_empties_a_reference_entirely() {
        let refs = vec![Reference::from_index("1", "Completely unrelated sentence about gardening.")];
        let refined = refine("quantum computing", refs, 0.9);
        assert!(!refined[0].content.is_empty());
    }
}
