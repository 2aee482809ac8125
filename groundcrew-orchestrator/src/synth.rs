//! ABOUTME: Synthesis prompt assembly and the answer-drafting call the critic loop regenerates against

use crate::error::Result;
use futures::StreamExt;
use groundcrew_context::Sections;
use groundcrew_core::{Message, Usage};
use groundcrew_providers::{CompletionRequest, LlmProvider};

const SYSTEM_PREAMBLE: &str = "Answer the user's question using only the numbered evidence below. \
Cite every factual claim with its reference number in brackets, e.g. [1]. \
If the evidence does not support an answer, say so rather than guessing.";

fn render_sections(sections: &Sections) -> String {
    let mut parts = Vec::new();
    if !sections.summary.is_empty() {
        parts.push(format!("Conversation summary:\n{}", sections.summary.join("\n")));
    }
    if !sections.salience.is_empty() {
        parts.push(format!("Known about this user:\n{}", sections.salience.join("\n")));
    }
    if !sections.history.is_empty() {
        parts.push(format!("Recent conversation:\n{}", sections.history.join("\n")));
    }
    if !sections.references.is_empty() {
        parts.push(format!("Evidence:\n{}", sections.references.join("\n")));
    }
    if !sections.web_context.is_empty() {
        parts.push(format!("Additional web evidence:\n{}", sections.web_context.join("\n")));
    }
    parts.join("\n\n")
}

/// Builds the synthesis prompt for `question` given the budgeted context
/// sections, appending any outstanding critic revision notes.
#[must_use]
pub fn build_prompt(question: &str, sections: &Sections, revision_notes: &[String]) -> String {
    let mut prompt = format!("{SYSTEM_PREAMBLE}\n\n{}\n\nQuestion: {question}", render_sections(sections));
    if !revision_notes.is_empty() {
        prompt.push_str(&format!(
            "\n\nThe previous draft had these issues, fix them in the new answer:\n- {}",
            revision_notes.join("\n- ")
        ));
    }
    prompt
}

/// Drafts an answer from `prompt`, returning the text and the usage to
/// fold into the turn's aggregate.
pub async fn synthesize(provider: &dyn LlmProvider, prompt: String) -> Result<(String, Usage)> {
    let response = provider.complete(CompletionRequest::new(vec![Message::user(prompt)])).await?;
    Ok((response.text, response.usage))
}

/// Drafts an answer by consuming the provider's token stream, calling
/// `on_token` for each chunk as it arrives so the caller can publish it.
/// Streamed responses don't report usage until the stream ends, so the
/// returned `Usage` is always zero.
pub async fn synthesize_streaming(
    provider: &dyn LlmProvider,
    prompt: String,
    mut on_token: impl FnMut(&str),
) -> Result<(String, Usage)> {
    let mut stream = provider.complete_stream(CompletionRequest::new(vec![Message::user(prompt)])).await?;
    let mut answer = String::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        on_token(&chunk);
        answer.push_str(&chunk);
    }
    Ok((answer, Usage::default()))
}
