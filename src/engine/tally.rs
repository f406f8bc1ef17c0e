//! Running per-game accounting

use crate::cursor::FeedCursor;
use crate::games::{BatchDecode, Delta, GameKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Net proceeds and counters accumulated by one polling task
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameTally {
    /// Stake collected minus payout disbursed, in base units
    pub net_delta: Delta,
    pub events_scored: u64,
    pub events_skipped: u64,
    pub decode_failures: u64,
    pub fetch_failures: u64,
    pub pages_fetched: u64,
    pub cycles: u64,
}

impl GameTally {
    /// Fold one decoded page into the running figures
    pub fn fold_batch(&mut self, batch: &BatchDecode) {
        self.net_delta = self.net_delta.saturating_add(batch.delta);
        self.events_scored += batch.scored as u64;
        self.events_skipped += batch.skipped as u64;
        self.decode_failures += batch.failures.len() as u64;
        self.pages_fetched += 1;
    }

    pub fn record_fetch_failure(&mut self) {
        self.fetch_failures += 1;
    }

    pub fn record_cycle(&mut self) {
        self.cycles += 1;
    }
}

/// Where a polling task currently is in its loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PollState {
    Idle,
    Fetching,
    Decoding,
    Waiting,
    Stopped,
}

impl fmt::Display for PollState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PollState::Idle => "idle",
            PollState::Fetching => "fetching",
            PollState::Decoding => "decoding",
            PollState::Waiting => "waiting",
            PollState::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// Read-only view of a polling task published after every state change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TallySnapshot {
    pub game: GameKind,
    pub state: PollState,
    pub cursor: FeedCursor,
    pub tally: GameTally,
    pub updated_at: DateTime<Utc>,
}

impl TallySnapshot {
    pub fn new(game: GameKind, cursor: FeedCursor, tally: GameTally) -> Self {
        Self {
            game,
            state: PollState::Idle,
            cursor,
            tally,
            updated_at: Utc::now(),
        }
    }
}
