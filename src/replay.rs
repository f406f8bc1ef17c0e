//! Offline replay of saved event pages
//!
//! Feeds a JSON dump of events through the same poller the live tracker
//! uses, backed by a [`MemoryFeed`] instead of a fullnode.

use crate::checkpoint::MemoryCheckpointStore;
use crate::cursor::FeedCursor;
use crate::engine::{GamePoller, GameTally, PollerSettings};
use crate::errors::{StorageError, TrackerResult};
use crate::feed::{EventEnvelope, EventPage, MemoryFeed};
use crate::games::GameDescriptor;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

/// Accepted dump layouts: a raw `suix_queryEvents` result or a bare list
#[derive(Deserialize)]
#[serde(untagged)]
enum EventDump {
    Page(EventPage),
    Events(Vec<EventEnvelope>),
}

impl EventDump {
    fn into_events(self) -> Vec<EventEnvelope> {
        match self {
            EventDump::Page(page) => page.data,
            EventDump::Events(events) => events,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReplayOutcome {
    pub events_loaded: usize,
    pub cursor: FeedCursor,
    pub tally: GameTally,
}

/// Parse a dump in either accepted layout
pub fn parse_events(raw: &str) -> TrackerResult<Vec<EventEnvelope>> {
    serde_json::from_str::<EventDump>(raw)
        .map(EventDump::into_events)
        .map_err(|e| StorageError::CorruptedData(format!("Unrecognised event dump: {}", e)).into())
}

pub fn load_events(path: impl AsRef<Path>) -> TrackerResult<Vec<EventEnvelope>> {
    let raw = std::fs::read_to_string(path.as_ref())?;
    parse_events(&raw)
}

/// Run one full cycle over `events` for `game`
pub async fn replay_events(
    game: GameDescriptor,
    events: Vec<EventEnvelope>,
    settings: PollerSettings,
) -> ReplayOutcome {
    let events_loaded = events.len();
    let feed = Arc::new(MemoryFeed::new(events));
    let mut poller = GamePoller::new(game, feed, Arc::new(MemoryCheckpointStore::new()), settings);

    poller.poll_cycle().await;

    ReplayOutcome {
        events_loaded,
        cursor: poller.cursor().clone(),
        tally: poller.tally().clone(),
    }
}
