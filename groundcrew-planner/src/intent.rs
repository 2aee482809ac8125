//! ABOUTME: Classifies a turn's question into an Intent via structured LLM output

use crate::error::Result;
use groundcrew_core::{Intent, IntentKind};
use groundcrew_providers::{CompletionRequest, LlmProvider};
use serde::Deserialize;
use serde_json::json;

/// Below this confidence, the classifier's raw intent is overridden to
/// `Conversational` (`spec.md` §4.7: "low-confidence maps to conversational").
pub const DEFAULT_INTENT_CONF_THRESHOLD: f32 = 0.5;

#[derive(Debug, Deserialize)]
struct ClassifiedIntent {
    intent: IntentKind,
    confidence: f32,
    #[allow(dead_code)]
    reasoning: String,
}

fn intent_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "intent": {
                "type": "string",
                "enum": ["factual_lookup", "conversational", "procedural", "comparative"]
            },
            "confidence": { "type": "number" },
            "reasoning": { "type": "string" }
        },
        "required": ["intent", "confidence", "reasoning"]
    })
}

/// Classifies `question` into an `Intent`, strictly requiring
/// `{intent, confidence, reasoning}` in the provider's structured output.
pub async fn classify_intent(question: &str, provider: &dyn LlmProvider, conf_threshold: f32) -> Result<Intent> {
    let prompt = format!(
        "Classify the intent of this question as one of factual_lookup, \
         conversational, procedural, or comparative. Report your confidence \
         (0.0-1.0) and a one-sentence reason.\n\nQuestion: {question}"
    );
    let request = CompletionRequest::new(vec![groundcrew_core::Message::user(prompt)]);
    let value = provider.complete_structured(request, &intent_schema()).await?;
    let classified: ClassifiedIntent = serde_json::from_value(value)
        .map_err(|e| crate::error::PlannerError::Schema(e.to_string()))?;

    let kind = if classified.confidence < conf_threshold {
        IntentKind::Conversational
    } else {
        classified.intent
    };

    Ok(Intent {
        kind,
        confidence: classified.confidence,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::StubProvider;

    #[tokio::test]
    async fn confident_classification_is_passed_through() {
        let provider = StubProvider::with_json(json!({
            "intent": "comparative",
            "confidence": 0.9,
            "reasoning": "asks to compare two things"
        }));
        let intent = classify_intent("how do A and B differ", &provider, DEFAULT_INTENT_CONF_THRESHOLD)
            .await
            .unwrap();
        assert_eq!(intent.kind, IntentKind::Comparative);
    }

    #[tokio::test]
    async fn low_confidence_is_overridden_to_conversational() {
        let provider = StubProvider::with_json(json!({
            "intent": "factual_lookup",
            "confidence": 0.2,
            "reasoning": "unclear"
        }));
        let intent = classify_intent("hmm what do you think", &provider, DEFAULT_INTENT_CONF_THRESHOLD)
            .await
            .unwrap();
        assert_eq!(intent.kind, IntentKind::Conversational);
    }
}
