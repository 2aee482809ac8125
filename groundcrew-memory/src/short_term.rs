//! ABOUTME: In-process per-session memory: summary bullets and salience notes, pruned by turn age

use dashmap::DashMap;
use groundcrew_core::{SalienceNote, SummaryBullet};
use std::sync::Arc;
use tracing::debug;

const DEFAULT_MAX_AGE_TURNS: u32 = 20;

#[derive(Debug, Clone, Default)]
pub struct SessionMemory {
    pub summary_bullets: Vec<SummaryBullet>,
    pub salience_notes: Vec<SalienceNote>,
    pub turn: u32,
}

/// Keyed by `sessionId` (`spec.md` §4.6). Notes whose `turn`/`last_seen_turn`
/// falls more than `max_age_turns` behind the session's current turn are
/// dropped on the next touch of that session.
pub struct ShortTermStore {
    sessions: Arc<DashMap<String, SessionMemory>>,
    max_age_turns: u32,
}

impl ShortTermStore {
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_age_turns(DEFAULT_MAX_AGE_TURNS)
    }

    #[must_use]
    pub fn with_max_age_turns(max_age_turns: u32) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            max_age_turns,
        }
    }

    pub fn get(&self, session_id: &str) -> SessionMemory {
        self.sessions.get(session_id).map(|entry| entry.clone()).unwrap_or_default()
    }

    /// Advances the session to `turn`, appends `bullet`/`note` when present,
    /// then prunes anything too old relative to the new turn.
    pub fn touch(&self, session_id: &str, turn: u32, bullet: Option<SummaryBullet>, note: Option<SalienceNote>) {
        let mut entry = self.sessions.entry(session_id.to_string()).or_default();
        entry.turn = turn;
        if let Some(bullet) = bullet {
            entry.summary_bullets.push(bullet);
        }
        if let Some(note) = note {
            entry.salience_notes.push(note);
        }

        let max_age_turns = self.max_age_turns;
        let before = entry.summary_bullets.len() + entry.salience_notes.len();
        entry.summary_bullets.retain(|b| turn.saturating_sub(b.turn) <= max_age_turns);
        entry.salience_notes.retain(|n| turn.saturating_sub(n.last_seen_turn) <= max_age_turns);
        let pruned = before - (entry.summary_bullets.len() + entry.salience_notes.len());
        if pruned > 0 {
            debug!(session_id, pruned, "pruned aged-out short-term memory entries");
        }
    }

    pub fn clear(&self, session_id: &str) {
        self.sessions.remove(session_id);
    }
}

impl Default for ShortTermStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bullet(turn: u32) -> SummaryBullet {
        SummaryBullet { turn, text: "fact".to_string() }
    }

    fn note(last_seen_turn: u32) -> SalienceNote {
        SalienceNote { text: "preference".to_string(), weight: 1.0, last_seen_turn }
    }

    #[test]
    fn prunes_entries_older_than_max_age() {
        let store = ShortTermStore::with_max_age_turns(2);
        store.touch("s1", 1, Some(bullet(1)), None);
        store.touch("s1", 2, Some(bullet(2)), None);
        store.touch("s1", 5, None, None);
        let memory = store.get("s1");
        assert_eq!(memory.summary_bullets.len(), 1);
        assert_eq!(memory.summary_bullets[0].turn, 2);
    }

    #[test]
    fn keeps_recent_salience_notes() {
        let store = ShortTermStore::with_max_age_turns(10);
        store.touch("s1", 1, None, Some(note(1)));
        store.touch("s1", 3, None, None);
        assert_eq!(store.get("s1").salience_notes.len(), 1);
    }

    #[test]
    fn unknown_session_returns_empty_memory() {
        let store = ShortTermStore::new();
        let memory = store.get("missing");
        assert!(memory.summary_bullets.is_empty());
        assert!(memory.salience_notes.is_empty());
    }
}
