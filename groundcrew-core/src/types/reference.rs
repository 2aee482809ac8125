//! ABOUTME: Reference type produced by retrieval/web dispatch and cited by synthesis

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceSource {
    Index,
    Web,
}

/// A single piece of cited evidence for a turn.
///
/// Invariant (`spec.md` §3): every reference cited in an answer (`[n]`)
/// must have a matching entry, by `id`, in the reference set produced for
/// that turn — enforced by `groundcrew_critic::citation_closure`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reference {
    pub id: String,
    pub title: Option<String>,
    pub url: Option<String>,
    pub page_number: Option<u32>,
    /// Full content, or a summary when produced by lazy retrieval.
    pub content: String,
    pub score: Option<f32>,
    pub captions: Vec<String>,
    pub source: ReferenceSource,
    /// Set when `content` is a summary pending `load(id)` (lazy retrieval).
    pub is_summary: bool,
}

impl Reference {
    #[must_use]
    pub fn from_index(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            url: None,
            page_number: None,
            content: content.into(),
            score: None,
            captions: Vec::new(),
            source: ReferenceSource::Index,
            is_summary: false,
        }
    }

    #[must_use]
    pub fn with_score(mut self, score: f32) -> Self {
        self.score = Some(score);
        self
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    #[must_use]
    pub fn summary(mut self) -> Self {
        self.is_summary = true;
        self
    }
}

/// Every `[n]` numeric citation present in `answer`, deduped, in first-seen order.
#[must_use]
pub fn extract_citations(answer: &str) -> Vec<String> {
    let mut citations = Vec::new();
    let bytes = answer.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'[' {
            let mut j = i + 1;
            while j < bytes.len() && bytes[j].is_ascii_digit() {
                j += 1;
            }
            if j > i + 1 && j < bytes.len() && bytes[j] == b']' {
                let id = answer[i + 1..j].to_string();
                if !citations.contains(&id) {
                    citations.push(id);
                }
                i = j + 1;
                continue;
            }
        }
        i += 1;
    }
    citations
}

/// Citation closure check from `spec.md` §8 property 2: every numeric
/// citation in `answer` refers to some `references[i].id`.
#[must_use]
pub fn citations_are_closed(answer: &str, references: &[Reference]) -> bool {
    extract_citations(answer)
        .iter()
        .all(|id| references.iter().any(|r| &r.id == id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_numeric_citations_in_order() {
        let answer = "Photosynthesis peaks at noon [2] near the equator [1], see also [2].";
        assert_eq!(extract_citations(answer), vec!["2", "1"]);
    }

    #[test]
    fn ignores_non_numeric_brackets() {
        let answer = "See [todo] and [n] for details, but cite [3].";
        assert_eq!(extract_citations(answer), vec!["3"]);
    }

    #[test]
    fn closure_detects_dangling_citation() {
        let refs = vec![Reference::from_index("1", "doc")];
        assert!(citations_are_closed("grounded in [1]", &refs));
        assert!(!citations_are_closed("grounded in [2]", &refs));
    }

    #[test]
    fn closure_holds_vacuously_with_no_citations() {
        assert!(citations_are_closed("I do not have sufficient evidence.", &[]));
    }
}
