//! House Tracker - net proceeds accounting for on-chain casino games
//!
//! Polls a Sui fullnode's event stream for each tracked game module, decodes
//! the settlement events and keeps a running stake-minus-payout figure per
//! game. Each game is polled by its own task; progress can optionally be
//! checkpointed to RocksDB so a restart resumes where it stopped.

pub mod checkpoint;
pub mod common;
pub mod config;
pub mod cursor;
pub mod engine;
pub mod errors;
pub mod feed;
pub mod games;
pub mod replay;
pub mod storage;
pub mod telemetry;

pub use checkpoint::{Checkpoint, CheckpointStore, MemoryCheckpointStore, RocksCheckpointStore};
pub use config::{ConfigLoader, Network, TrackerConfig};
pub use cursor::FeedCursor;
pub use engine::{GamePoller, GameTally, PollState, PollerSettings, Supervisor, TallySnapshot};
pub use errors::{TrackerError, TrackerResult};
pub use feed::{EventEnvelope, EventFeed, EventFilter, EventId, EventPage, FeedError, MemoryFeed, SortOrder, SuiRpcFeed};
pub use games::{BatchDecode, Delta, GameDescriptor, GameKind, GameRegistry, SettlementDecoder};

use std::sync::Arc;

/// Checkpoint store selected by configuration
pub fn open_checkpoint_store(config: &TrackerConfig) -> TrackerResult<Arc<dyn CheckpointStore>> {
    match &config.storage.checkpoint_dir {
        Some(dir) => Ok(Arc::new(RocksCheckpointStore::open(dir)?)),
        None => Ok(Arc::new(MemoryCheckpointStore::new())),
    }
}

/// JSON-RPC feed for the configured endpoint
pub fn connect_feed(config: &TrackerConfig) -> TrackerResult<Arc<dyn EventFeed>> {
    let feed = SuiRpcFeed::new(config.network.endpoint(), config.network.request_timeout())?;
    Ok(Arc::new(feed))
}
