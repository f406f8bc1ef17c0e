//! Wire types shared by every feed implementation

use crate::common::numeric::{opt_u64_lenient, u64_lenient};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of a single event in the ledger: the emitting transaction plus
/// the event's index inside it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventId {
    pub tx_digest: String,
    #[serde(deserialize_with = "u64_lenient", serialize_with = "serialize_seq")]
    pub event_seq: u64,
}

// The node expects `eventSeq` back as a decimal string.
fn serialize_seq<S>(seq: &u64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&seq.to_string())
}

impl EventId {
    pub fn new(tx_digest: impl Into<String>, event_seq: u64) -> Self {
        Self {
            tx_digest: tx_digest.into(),
            event_seq,
        }
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.tx_digest, self.event_seq)
    }
}

/// One event as returned by the feed.
///
/// The polling engine treats this as opaque; only the decoder registered for
/// the emitting module looks inside `parsed_json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEnvelope {
    pub id: EventId,
    /// Fully qualified Move type, e.g. `0xabc::plinko::Outcome<0x2::sui::SUI>`
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub parsed_json: Option<serde_json::Value>,
    #[serde(default)]
    pub package_id: Option<String>,
    #[serde(default)]
    pub transaction_module: Option<String>,
    #[serde(default)]
    pub sender: Option<String>,
    #[serde(default, deserialize_with = "opt_u64_lenient")]
    pub timestamp_ms: Option<u64>,
}

impl EventEnvelope {
    /// Minimal envelope with only the fields decoders look at.
    pub fn new(id: EventId, event_type: impl Into<String>, parsed_json: serde_json::Value) -> Self {
        Self {
            id,
            event_type: event_type.into(),
            parsed_json: Some(parsed_json),
            package_id: None,
            transaction_module: None,
            sender: None,
            timestamp_ms: None,
        }
    }
}

/// One page of a paginated event query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPage {
    pub data: Vec<EventEnvelope>,
    #[serde(default)]
    pub next_cursor: Option<EventId>,
    #[serde(default)]
    pub has_next_page: bool,
}

/// Event query filter. Serializes to the node's `{"MoveEventModule": {...}}`
/// shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventFilter {
    MoveEventModule { package: String, module: String },
}

impl EventFilter {
    pub fn module(package: impl Into<String>, module: impl Into<String>) -> Self {
        EventFilter::MoveEventModule {
            package: package.into(),
            module: module.into(),
        }
    }

    /// `package::module` prefix that matching event types start with
    pub fn module_type(&self) -> String {
        match self {
            EventFilter::MoveEventModule { package, module } => format!("{}::{}", package, module),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Ascending,
    Descending,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_page_from_node_response() {
        let page: EventPage = serde_json::from_value(json!({
            "data": [{
                "id": { "txDigest": "8xQ1", "eventSeq": "0" },
                "packageId": "0x1513",
                "transactionModule": "plinko",
                "sender": "0xfeed",
                "type": "0x1513::plinko::Outcome<0x2::sui::SUI>",
                "parsedJson": { "bet_size": "100" },
                "bcs": "abc",
                "timestampMs": "1700000000000"
            }],
            "nextCursor": { "txDigest": "8xQ1", "eventSeq": "0" },
            "hasNextPage": false
        }))
        .unwrap();

        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].id, EventId::new("8xQ1", 0));
        assert_eq!(page.data[0].timestamp_ms, Some(1_700_000_000_000));
        assert_eq!(page.next_cursor, Some(EventId::new("8xQ1", 0)));
        assert!(!page.has_next_page);
    }

    #[test]
    fn test_filter_wire_shape() {
        let filter = EventFilter::module("0x1513", "plinko");
        let value = serde_json::to_value(&filter).unwrap();

        assert_eq!(value, json!({ "MoveEventModule": { "package": "0x1513", "module": "plinko" } }));
        assert_eq!(filter.module_type(), "0x1513::plinko");
    }

    #[test]
    fn test_event_id_serializes_seq_as_string() {
        let value = serde_json::to_value(EventId::new("abc", 12)).unwrap();
        assert_eq!(value, json!({ "txDigest": "abc", "eventSeq": "12" }));
    }
}
