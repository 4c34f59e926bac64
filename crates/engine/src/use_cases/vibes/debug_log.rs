//! In-memory log of first-sight checks for the debug panel.

use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;

use npcvibes_domain::{CharacterRef, VibeStatistics, VibeType};

/// How many checks the log keeps
const MAX_CHECKS: usize = 100;
/// How many checks the debug summary shows
const RECENT_CHECKS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SightCheck {
    pub pc_id: CharacterRef,
    pub npc_id: CharacterRef,
    pub pc_can_see_npc: bool,
    pub npc_can_see_pc: bool,
    /// Vibes rolled by this check, empty when nothing was generated
    pub rolled: Vec<VibeType>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugInfo {
    pub total_checks: u64,
    pub recent_checks: Vec<SightCheck>,
    pub statistics: VibeStatistics,
    pub processed_pairs: Vec<String>,
}

#[derive(Default)]
struct LogState {
    total: u64,
    checks: VecDeque<SightCheck>,
    statistics: VibeStatistics,
}

#[derive(Default)]
pub struct SightDebugLog {
    state: Mutex<LogState>,
}

impl SightDebugLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, check: SightCheck) {
        let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        state.total += 1;
        for vibe in &check.rolled {
            state.statistics.record(*vibe);
        }
        if state.checks.len() == MAX_CHECKS {
            state.checks.pop_front();
        }
        state.checks.push_back(check);
    }

    /// Summary with the most recent checks, newest last.
    pub fn summary(&self, processed_pairs: Vec<String>) -> DebugInfo {
        let state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        let skip = state.checks.len().saturating_sub(RECENT_CHECKS);
        DebugInfo {
            total_checks: state.total,
            recent_checks: state.checks.iter().skip(skip).cloned().collect(),
            statistics: state.statistics,
            processed_pairs,
        }
    }

    pub fn clear(&self) {
        *self.state.lock().unwrap_or_else(|p| p.into_inner()) = LogState::default();
    }
}
