//! ABOUTME: Bounded critic loop — grade, regenerate on revise, up to maxRevisions

use crate::critic::grade_answer;
use crate::error::Result;
use groundcrew_core::{CriticAction, CriticReport, Reference, WebResult};
use groundcrew_providers::LlmProvider;
use std::future::Future;

/// Grades `initial_answer`, and while the critic asks for a revision and
/// the revision budget isn't exhausted, calls `regenerate` with the
/// current answer and the accumulated issue notes to produce the next
/// draft (spec.md §4.1 step 11, §4.8). Returns the final answer and every
/// `CriticReport` produced, oldest first, so the caller can surface them
/// as the response's `critic?` field and append to telemetry on
/// last-resort non-acceptance.
pub async fn critic_loop<F, Fut>(
    question: &str,
    initial_answer: String,
    references: &[Reference],
    web_context: &[WebResult],
    provider: &dyn LlmProvider,
    max_revisions: u32,
    groundedness_threshold: f32,
    mut regenerate: F,
) -> Result<(String, Vec<CriticReport>)>
where
    F: FnMut(String, Vec<String>) -> Fut,
    Fut: Future<Output = Result<String>>,
{
    let mut answer = initial_answer;
    let mut revision_notes: Vec<String> = Vec::new();
    let mut reports = Vec::new();
    let mut revisions_used = 0;

    loop {
        let report = grade_answer(question, &answer, references, web_context, provider, groundedness_threshold).await?;
        let accepted = report.action == CriticAction::Accept;
        revision_notes.extend(report.issues.clone());
        reports.push(report);

        if accepted || revisions_used >= max_revisions {
            break;
        }

        answer = regenerate(answer, revision_notes.clone()).await?;
        revisions_used += 1;
    }

    Ok((answer, reports))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::StubProvider;
    use groundcrew_core::Reference;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn accepted_on_first_pass_never_regenerates() {
        let refs = vec![Reference::from_index("1", "doc")];
        let provider = StubProvider::with_json(json!({"issues": []}));
        let calls = AtomicUsize::new(0);
        let (answer, reports) = critic_loop(
            "q",
            "grounded answer [1].".to_string(),
            &refs,
            &[],
            &provider,
            3,
            crate::critic::DEFAULT_GROUNDEDNESS_THRESHOLD,
            |draft, _notes| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move { Ok(draft) }
            },
        )
        .await
        .unwrap();
        assert_eq!(answer, "grounded answer [1].");
        assert_eq!(reports.len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn exhausts_revision_budget_when_never_accepted() {
        let refs = vec![Reference::from_index("1", "doc")];
        let provider = StubProvider::with_json(json!({"issues": ["still unsupported"]}));
        let (final_answer, reports) = critic_loop(
            "q",
            "ungrounded claim.".to_string(),
            &refs,
            &[],
            &provider,
            2,
            crate::critic::DEFAULT_GROUNDEDNESS_THRESHOLD,
            |draft, _notes| async move { Ok(format!("{draft} revised")) },
        )
        .await
        .unwrap();
        assert_eq!(reports.len(), 3);
        assert_eq!(final_answer, "ungrounded claim. revised revised");
    }
}
