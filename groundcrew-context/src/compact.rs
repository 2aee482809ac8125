//! ABOUTME: Compacts older conversation turns into summary bullets and durable salience notes

use crate::error::Result;
use groundcrew_core::{Message, SalienceNote, SummaryBullet};
use groundcrew_providers::{CompletionRequest, LlmProvider};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct CompactionResult {
    pub recent_messages: Vec<Message>,
    pub summary_bullets: Vec<SummaryBullet>,
    pub salience_notes: Vec<SalienceNote>,
}

#[derive(Debug, Deserialize)]
struct Distillation {
    bullets: Vec<String>,
    #[serde(default)]
    notes: Vec<DistilledNote>,
}

#[derive(Debug, Deserialize)]
struct DistilledNote {
    text: String,
    weight: f32,
}

fn distillation_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "bullets": { "type": "array", "items": { "type": "string" } },
            "notes": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "text": { "type": "string" },
                        "weight": { "type": "number" }
                    },
                    "required": ["text", "weight"]
                }
            }
        },
        "required": ["bullets", "notes"]
    })
}

/// Keeps the last `keep_recent` messages verbatim and distills everything
/// older into structured summary bullets plus durable salience notes
/// (`spec.md` §4.5). A conversation no longer than `keep_recent` needs no
/// summarization at all.
pub async fn compact(messages: &[Message], keep_recent: usize, current_turn: u32, provider: &dyn LlmProvider) -> Result<CompactionResult> {
    if messages.len() <= keep_recent {
        return Ok(CompactionResult {
            recent_messages: messages.to_vec(),
            summary_bullets: Vec::new(),
            salience_notes: Vec::new(),
        });
    }

    let split_at = messages.len() - keep_recent;
    let (older, recent) = messages.split_at(split_at);

    let transcript: String = older
        .iter()
        .map(|m| format!("{:?}: {}", m.role, m.content))
        .collect::<Vec<_>>()
        .join("\n");
    let prompt = format!(
        "Summarize this older part of a conversation into short factual bullets, \
         and extract any durable user preferences or recurring facts as weighted notes.\n\n{transcript}"
    );

    let request = CompletionRequest::new(vec![Message::user(prompt)]);
    let value = provider.complete_structured(request, &distillation_schema()).await?;
    let distillation: Distillation = serde_json::from_value(value).unwrap_or(Distillation { bullets: Vec::new(), notes: Vec::new() });

    debug!(bullets = distillation.bullets.len(), notes = distillation.notes.len(), "compacted older turns");

    Ok(CompactionResult {
        recent_messages: recent.to_vec(),
        summary_bullets: distillation
            .bullets
            .into_iter()
            .map(|text| SummaryBullet { turn: current_turn, text })
            .collect(),
        salience_notes: distillation
            .notes
            .into_iter()
            .map(|note| SalienceNote {
                text: note.text,
                weight: note.weight,
                last_seen_turn: current_turn,
            })
            .collect(),
    })
}
