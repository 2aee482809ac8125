//! ABOUTME: Maps a classified Intent onto a concrete RouteProfile

use groundcrew_core::{Intent, IntentKind, RouteProfile};

/// Derives the routing decision for `intent` (`spec.md` §4.1 step 4).
/// `Procedural` questions need the same grounded, hybrid treatment as
/// `FactualLookup` ones; only `Comparative` questions opt into decomposition.
#[must_use]
pub fn route_for(intent: &Intent) -> RouteProfile {
    match intent.kind {
        IntentKind::Conversational => RouteProfile::conversational(),
        IntentKind::FactualLookup | IntentKind::Procedural => RouteProfile::factual(),
        IntentKind::Comparative => RouteProfile::comparative(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversational_intent_skips_retrieval() {
        let profile = route_for(&Intent { kind: IntentKind::Conversational, confidence: 0.9 });
        assert!(!profile.use_lazy_retrieval);
        assert!(!profile.use_decomposition);
    }

    #[test]
    fn comparative_intent_enables_decomposition() {
        let profile = route_for(&Intent { kind: IntentKind::Comparative, confidence: 0.9 });
        assert!(profile.use_decomposition);
    }
}
