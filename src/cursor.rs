//! Pagination position in the event feed

use crate::feed::{EventId, EventPage};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque position of the last consumed event for one tracked module.
///
/// `FeedCursor::initial()` stands for the beginning of recorded history.
/// A cursor only ever moves to the position the feed handed back alongside a
/// page that has already been folded into the tally.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeedCursor(Option<EventId>);

impl FeedCursor {
    pub fn initial() -> Self {
        Self(None)
    }

    pub fn at(id: EventId) -> Self {
        Self(Some(id))
    }

    /// Event id to pass to the feed, `None` at the start of the stream
    pub fn position(&self) -> Option<&EventId> {
        self.0.as_ref()
    }

    pub fn is_initial(&self) -> bool {
        self.0.is_none()
    }

    /// Cursor to resume from after `page` has been consumed.
    ///
    /// A page with events moves to its next cursor, or to its last event when
    /// the feed sent none. An empty page leaves the position untouched.
    pub fn advance(&self, page: &EventPage) -> FeedCursor {
        match (&page.next_cursor, page.data.last()) {
            (Some(next), Some(_)) => FeedCursor(Some(next.clone())),
            (None, Some(last)) => FeedCursor(Some(last.id.clone())),
            (Some(next), None) if self.0.is_none() => FeedCursor(Some(next.clone())),
            _ => self.clone(),
        }
    }
}

impl fmt::Display for FeedCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(id) => write!(f, "{}", id),
            None => write!(f, "start"),
        }
    }
}
