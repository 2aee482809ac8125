//! ABOUTME: Per-section token budgeting, trimming oldest-first without splitting an item

/// Rough 4-chars-per-token estimate, matching the teacher's own
/// assembly-stage heuristic — good enough for a budget check, not a
/// tokenizer replacement.
#[must_use]
pub fn estimate_tokens(text: &str) -> usize {
    text.len().div_ceil(4)
}

#[derive(Debug, Clone, Default)]
pub struct Sections {
    pub history: Vec<String>,
    pub summary: Vec<String>,
    pub salience: Vec<String>,
    pub references: Vec<String>,
    pub web_context: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct SectionCaps {
    pub history: usize,
    pub summary: usize,
    pub salience: usize,
    pub references: usize,
    pub web_context: usize,
}

/// Items within a section are assumed oldest-first; trimming drops whole
/// items from the front until the section's token total fits its cap.
/// Never splits an item — satisfies the "don't truncate a reference
/// mid-citation" invariant for every section, not only references.
fn trim_section(mut items: Vec<String>, cap: usize) -> Vec<String> {
    let mut total: usize = items.iter().map(|s| estimate_tokens(s)).sum();
    while total > cap && !items.is_empty() {
        let removed = items.remove(0);
        total -= estimate_tokens(&removed);
    }
    items
}

#[must_use]
pub fn budget(sections: Sections, caps: SectionCaps) -> Sections {
    Sections {
        history: trim_section(sections.history, caps.history),
        summary: trim_section(sections.summary, caps.summary),
        salience: trim_section(sections.salience, caps.salience),
        references: trim_section(sections.references, caps.references),
        web_context: trim_section(sections.web_context, caps.web_context),
    }
}

#[must_use]
pub fn total_tokens(sections: &Sections) -> usize {
    [&sections.history, &sections.summary, &sections.salience, &sections.references, &sections.web_context]
        .into_iter()
        .flatten()
        .map(|s| estimate_tokens(s))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_oldest_items_first_within_a_section() {
        let sections = Sections {
            history: vec!["a".repeat(20), "b".repeat(20), "c".repeat(20)],
            ..Sections::default()
        };
        let caps = SectionCaps { history: 10, summary: 0, salience: 0, references: 0, web_context: 0 };
        let result = budget(sections, caps);
        assert_eq!(result.history, vec!["c".repeat(20)]);
    }

    #[test]
    fn never_splits_a_single_item_even_over_cap() {
        let sections = Sections {
            references: vec!["x".repeat(100)],
            ..Sections::default()
        };
        let caps = SectionCaps { history: 0, summary: 0, salience: 0, references: 5, web_context: 0 };
        let result = budget(sections, caps);
        assert_eq!(result.references.len(), 1);
    }

    #[test]
    fn sections_are_trimmed_independently() {
        let sections = Sections {
            history: vec!["a".repeat(40)],
            summary: vec!["b".repeat(40)],
            ..Sections::default()
        };
        let caps = SectionCaps { history: 0, summary: 100, salience: 0, references: 0, web_context: 0 };
        let result = budget(sections, caps);
        assert!(result.history.is_empty());
        assert_eq!(result.summary.len(), 1);
    }

    proptest::proptest! {
        #[test]
        fn trimmed_section_is_a_suffix_fitting_the_cap_or_a_single_oversized_item(
            items in proptest::collection::vec("[a-z]{0,12}", 0..10),
            cap in 0usize..40,
        ) {
            let original = items.clone();
            let trimmed = trim_section(items, cap);

            proptest::prop_assert!(original.ends_with(&trimmed));

            let total: usize = trimmed.iter().map(|s| estimate_tokens(s)).sum();
            proptest::prop_assert!(total <= cap || trimmed.len() <= 1);
        }

        #[test]
        fn budget_never_grows_a_section(
            history in proptest::collection::vec("[a-z]{0,12}", 0..6),
            summary in proptest::collection::vec("[a-z]{0,12}", 0..6),
            history_cap in 0usize..40,
            summary_cap in 0usize..40,
        ) {
            let sections = Sections {
                history: history.clone(),
                summary: summary.clone(),
                ..Sections::default()
            };
            let caps = SectionCaps { history: history_cap, summary: summary_cap, salience: 0, references: 0, web_context: 0 };
            let result = budget(sections, caps);

            proptest::prop_assert!(result.history.len() <= history.len());
            proptest::prop_assert!(result.summary.len() <= summary.len());
            let baseline = Sections { history, summary, ..Sections::default() };
            proptest::prop_assert!(total_tokens(&result) <= total_tokens(&baseline));
        }
    }
}
