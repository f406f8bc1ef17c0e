//! Remote event feed
//!
//! The polling engine only depends on [`EventFeed`]. `SuiRpcFeed` talks to a
//! fullnode over JSON-RPC; `MemoryFeed` serves a fixed, ordered event list for
//! offline replay and tests.

pub mod memory;
pub mod rpc;
pub mod types;

pub use memory::MemoryFeed;
pub use rpc::SuiRpcFeed;
pub use types::{EventEnvelope, EventFilter, EventId, EventPage, SortOrder};

use async_trait::async_trait;

/// Errors raised while fetching a page of events
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// Transport-level failure (connect, TLS, body read)
    #[error("Transport failure: {0}")]
    Transport(String),

    /// The node answered with a JSON-RPC error object
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// Request exceeded the configured deadline
    #[error("Request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// The response did not match the expected page shape
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Feed is temporarily unable to serve requests
    #[error("Feed unavailable: {0}")]
    Unavailable(String),
}

/// Paginated access to the ledger's event stream.
///
/// Re-querying with the same cursor must return the same events, or a
/// strict superset of them, in the same order.
#[async_trait]
pub trait EventFeed: Send + Sync {
    /// Fetch up to `limit` events matching `filter`, strictly after `cursor`
    /// (`None` means the start of recorded history).
    async fn query_events(
        &self,
        filter: &EventFilter,
        cursor: Option<&EventId>,
        order: SortOrder,
        limit: usize,
    ) -> Result<EventPage, FeedError>;
}
