//! ABOUTME: Critic and CRAG grading report types

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriticAction {
    Accept,
    Revise,
    Reject,
}

/// Post-synthesis quality check on a drafted answer (`spec.md` §4.8).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CriticReport {
    /// 0.0..=1.0: how well the answer's claims are supported by cited evidence.
    pub groundedness: f32,
    /// 0.0..=1.0: how much of the question the answer addresses.
    pub coverage: f32,
    pub issues: Vec<String>,
    pub action: CriticAction,
}

impl CriticReport {
    #[must_use]
    pub fn accept(groundedness: f32, coverage: f32) -> Self {
        Self {
            groundedness,
            coverage,
            issues: Vec::new(),
            action: CriticAction::Accept,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CRAGConfidence {
    Correct,
    Ambiguous,
    Incorrect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CRAGAction {
    Use,
    Refine,
    WebFallback,
}

/// Pre-synthesis grading of retrieved evidence (`spec.md` §4.8, Corrective
/// RAG): decides whether retrieved context is trustworthy enough to answer
/// from directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CRAGEvaluation {
    pub confidence: CRAGConfidence,
    pub action: CRAGAction,
    pub rationale: String,
}

impl CRAGEvaluation {
    #[must_use]
    pub fn action_for(confidence: CRAGConfidence) -> CRAGAction {
        match confidence {
            CRAGConfidence::Correct => CRAGAction::Use,
            CRAGConfidence::Ambiguous => CRAGAction::Refine,
            CRAGConfidence::Incorrect => CRAGAction::WebFallback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_for_maps_each_confidence_level() {
        assert_eq!(CRAGEvaluation::action_for(CRAGConfidence::Correct), CRAGAction::Use);
        assert_eq!(CRAGEvaluation::action_for(CRAGConfidence::Ambiguous), CRAGAction::Refine);
        assert_eq!(
            CRAGEvaluation::action_for(CRAGConfidence::Incorrect),
            CRAGAction::WebFallback
        );
    }
}
