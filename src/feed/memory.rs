//! In-process event feed over an ordered event list

use super::{EventEnvelope, EventFeed, EventFilter, EventId, EventPage, FeedError, SortOrder};
use async_trait::async_trait;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    RwLock,
};

/// Serves a fixed, append-only event log with the same cursor semantics as
/// the fullnode: a page starts strictly after the cursor, and `next_cursor`
/// is the id of the last event returned.
///
/// Failures can be injected to exercise the engine's recovery path.
#[derive(Default)]
pub struct MemoryFeed {
    events: RwLock<Vec<EventEnvelope>>,
    pending_failures: AtomicUsize,
    queries: RwLock<Vec<Option<EventId>>>,
}

impl MemoryFeed {
    pub fn new(events: Vec<EventEnvelope>) -> Self {
        Self {
            events: RwLock::new(events),
            ..Default::default()
        }
    }

    /// Append events to the end of the log
    pub fn push(&self, events: impl IntoIterator<Item = EventEnvelope>) {
        if let Ok(mut log) = self.events.write() {
            log.extend(events);
        }
    }

    /// Make the next `count` queries fail with `FeedError::Unavailable`
    pub fn fail_next(&self, count: usize) {
        self.pending_failures.store(count, Ordering::SeqCst);
    }

    /// Cursors of every query received so far, failed ones included
    pub fn queried_cursors(&self) -> Vec<Option<EventId>> {
        self.queries.read().map(|q| q.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.events.read().map(|log| log.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn take_failure(&self) -> bool {
        self.pending_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

fn matches_filter(event: &EventEnvelope, filter: &EventFilter) -> bool {
    let prefix = format!("{}::", filter.module_type());
    event.event_type.starts_with(&prefix)
}

#[async_trait]
impl EventFeed for MemoryFeed {
    async fn query_events(
        &self,
        filter: &EventFilter,
        cursor: Option<&EventId>,
        order: SortOrder,
        limit: usize,
    ) -> Result<EventPage, FeedError> {
        if let Ok(mut queries) = self.queries.write() {
            queries.push(cursor.cloned());
        }

        if self.take_failure() {
            return Err(FeedError::Unavailable("injected failure".to_string()));
        }

        let log = self
            .events
            .read()
            .map_err(|_| FeedError::Unavailable("event log poisoned".to_string()))?;

        let mut matching: Vec<&EventEnvelope> = log.iter().filter(|e| matches_filter(e, filter)).collect();
        if order == SortOrder::Descending {
            matching.reverse();
        }

        let start = match cursor {
            None => 0,
            Some(id) => match matching.iter().position(|e| &e.id == id) {
                Some(pos) => pos + 1,
                None => {
                    return Err(FeedError::MalformedResponse(format!("unknown cursor {}", id)));
                }
            },
        };

        let data: Vec<EventEnvelope> = matching
            .iter()
            .skip(start)
            .take(limit)
            .map(|e| (*e).clone())
            .collect();

        let has_next_page = start + data.len() < matching.len();
        let next_cursor = data.last().map(|e| e.id.clone()).or_else(|| cursor.cloned());

        Ok(EventPage {
            data,
            next_cursor,
            has_next_page,
        })
    }
}
