//! ABOUTME: Telemetry and usage accounting types streamed alongside a turn

use serde::{Deserialize, Serialize};

/// Token accounting for a single provider call, aggregated per turn.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl Usage {
    #[must_use]
    pub fn total(self) -> u32 {
        self.prompt_tokens + self.completion_tokens
    }

    #[must_use]
    pub fn combine(self, other: Self) -> Self {
        Self {
            prompt_tokens: self.prompt_tokens + other.prompt_tokens,
            completion_tokens: self.completion_tokens + other.completion_tokens,
        }
    }
}

/// One named step in the per-turn activity trace, streamed as `activity`
/// events and aggregated for the final `telemetry` event (`spec.md` §6, §4.9).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityStep {
    pub name: String,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub duration_ms: u64,
    pub ok: bool,
}

/// Final per-turn telemetry summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryEvent {
    pub steps: Vec<ActivityStep>,
    pub usage: Usage,
    pub total_duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_combines_additively() {
        let a = Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
        };
        let b = Usage {
            prompt_tokens: 2,
            completion_tokens: 3,
        };
        let combined = a.combine(b);
        assert_eq!(combined.prompt_tokens, 12);
        assert_eq!(combined.total(), 20);
    }
}
