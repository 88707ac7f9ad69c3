use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::repository::SyncOutcome;

/// Successful sync cycle: every registered repository reported without error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub outcomes: Vec<SyncOutcome>,
    pub duration_ms: u64,
}

impl SyncReport {
    pub fn pushed_count(&self) -> usize {
        self.outcomes.iter().map(|o| o.pushed.len()).sum()
    }

    pub fn purged_count(&self) -> usize {
        self.outcomes.iter().map(|o| o.purged.len()).sum()
    }
}

/// Cycle outcome recorded in [`SyncEngineStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncCycleStatus {
    Ok,
    PartialFailure,
}

/// Lightweight engine status snapshot for diagnostics screens.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncEngineStatus {
    pub last_cycle_at: Option<DateTime<Utc>>,
    pub last_cycle_status: Option<SyncCycleStatus>,
    pub last_cycle_duration_ms: Option<u64>,
    pub last_pushed_count: usize,
    pub consecutive_failures: u32,
    pub last_error: Option<String>,
    pub timer_running: bool,
}
