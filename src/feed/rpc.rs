//! JSON-RPC event feed backed by a Sui fullnode

use super::{EventFeed, EventFilter, EventId, EventPage, FeedError, SortOrder};
use crate::config::Network;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, trace};

const QUERY_EVENTS_METHOD: &str = "suix_queryEvents";

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

/// Event feed that issues `suix_queryEvents` calls against one fullnode.
///
/// The underlying `reqwest::Client` pools connections and is safe to share
/// between polling tasks.
pub struct SuiRpcFeed {
    client: Client,
    url: String,
    timeout: Duration,
    next_request_id: AtomicU64,
}

impl SuiRpcFeed {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, FeedError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FeedError::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: url.into(),
            timeout,
            next_request_id: AtomicU64::new(1),
        })
    }

    /// Feed pointed at the public fullnode of `network`
    pub fn for_network(network: Network, timeout: Duration) -> Result<Self, FeedError> {
        Self::new(network.fullnode_url(), timeout)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// The client deadline covers the body read as well as the send
    fn request_error(&self, e: reqwest::Error) -> FeedError {
        if e.is_timeout() {
            FeedError::Timeout {
                timeout_ms: self.timeout.as_millis() as u64,
            }
        } else if e.is_decode() {
            FeedError::MalformedResponse(e.to_string())
        } else {
            FeedError::Transport(e.to_string())
        }
    }

    async fn call<T>(&self, method: &str, params: Value) -> Result<T, FeedError>
    where
        T: DeserializeOwned,
    {
        let id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        trace!("RPC call {} #{}: {}", method, id, body);

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Transport(format!("HTTP {} from {}", status, self.url)));
        }

        let rpc: RpcResponse<T> = response.json().await.map_err(|e| self.request_error(e))?;

        if let Some(error) = rpc.error {
            return Err(FeedError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        rpc.result
            .ok_or_else(|| FeedError::MalformedResponse(format!("no result in {} response", method)))
    }
}

/// Positional params for `suix_queryEvents`: query, cursor, limit, descending.
fn query_params(filter: &EventFilter, cursor: Option<&EventId>, order: SortOrder, limit: usize) -> Value {
    json!([filter, cursor, limit, order == SortOrder::Descending])
}

#[async_trait]
impl EventFeed for SuiRpcFeed {
    async fn query_events(
        &self,
        filter: &EventFilter,
        cursor: Option<&EventId>,
        order: SortOrder,
        limit: usize,
    ) -> Result<EventPage, FeedError> {
        let params = query_params(filter, cursor, order, limit);
        let page: EventPage = self.call(QUERY_EVENTS_METHOD, params).await?;

        debug!(
            "Fetched {} events for {} (has_next_page: {})",
            page.data.len(),
            filter.module_type(),
            page.has_next_page
        );

        Ok(page)
    }
}
