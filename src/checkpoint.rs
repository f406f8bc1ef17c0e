//! Durable per-game progress
//!
//! A checkpoint pairs a cursor with the tally accumulated up to it, so a
//! restarted tracker resumes where it stopped instead of re-reading the
//! whole history.

use crate::cursor::FeedCursor;
use crate::engine::GameTally;
use crate::errors::{StorageError, TrackerError, TrackerResult};
use crate::games::GameKind;
use crate::storage::KvStorage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::RwLock;

const CHECKPOINT_PREFIX: &str = "checkpoint:game:";

fn checkpoint_key(game: GameKind) -> Vec<u8> {
    format!("{}{}", CHECKPOINT_PREFIX, game).into_bytes()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub game: GameKind,
    pub cursor: FeedCursor,
    pub tally: GameTally,
    pub saved_at: DateTime<Utc>,
}

impl Checkpoint {
    pub fn new(game: GameKind, cursor: FeedCursor, tally: GameTally) -> Self {
        Self {
            game,
            cursor,
            tally,
            saved_at: Utc::now(),
        }
    }
}

/// Storage for the latest checkpoint of each game
pub trait CheckpointStore: Send + Sync {
    fn load(&self, game: GameKind) -> TrackerResult<Option<Checkpoint>>;

    /// Replace the stored checkpoint for `checkpoint.game`
    fn save(&self, checkpoint: &Checkpoint) -> TrackerResult<()>;

    fn list(&self) -> TrackerResult<Vec<Checkpoint>>;
}

/// Process-local checkpoints, lost on exit
#[derive(Debug, Default)]
pub struct MemoryCheckpointStore {
    checkpoints: RwLock<BTreeMap<GameKind, Checkpoint>>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> TrackerError {
    StorageError::ReadFailed("checkpoint map lock poisoned".to_string()).into()
}

impl CheckpointStore for MemoryCheckpointStore {
    fn load(&self, game: GameKind) -> TrackerResult<Option<Checkpoint>> {
        let map = self.checkpoints.read().map_err(|_| poisoned())?;
        Ok(map.get(&game).cloned())
    }

    fn save(&self, checkpoint: &Checkpoint) -> TrackerResult<()> {
        let mut map = self.checkpoints.write().map_err(|_| poisoned())?;
        map.insert(checkpoint.game, checkpoint.clone());
        Ok(())
    }

    fn list(&self) -> TrackerResult<Vec<Checkpoint>> {
        let map = self.checkpoints.read().map_err(|_| poisoned())?;
        Ok(map.values().cloned().collect())
    }
}

/// Checkpoints stored as JSON values in RocksDB
#[derive(Clone)]
pub struct RocksCheckpointStore {
    storage: KvStorage,
}

impl RocksCheckpointStore {
    pub fn open<P: AsRef<Path>>(path: P) -> TrackerResult<Self> {
        Ok(Self {
            storage: KvStorage::open(path)?,
        })
    }

    pub fn with_storage(storage: KvStorage) -> Self {
        Self { storage }
    }
}

fn decode_checkpoint(key: &[u8], bytes: &[u8]) -> TrackerResult<Checkpoint> {
    serde_json::from_slice(bytes).map_err(|e| {
        StorageError::CorruptedData(format!(
            "Failed to decode checkpoint {}: {}",
            String::from_utf8_lossy(key),
            e
        ))
        .into()
    })
}

impl CheckpointStore for RocksCheckpointStore {
    fn load(&self, game: GameKind) -> TrackerResult<Option<Checkpoint>> {
        let key = checkpoint_key(game);
        let Some(bytes) = self.storage.get(&key)? else {
            return Ok(None);
        };

        decode_checkpoint(&key, &bytes).map(Some)
    }

    fn save(&self, checkpoint: &Checkpoint) -> TrackerResult<()> {
        let bytes = serde_json::to_vec(checkpoint).map_err(|e| {
            StorageError::WriteFailed(format!("Failed to encode checkpoint for {}: {}", checkpoint.game, e))
        })?;

        self.storage.put(&checkpoint_key(checkpoint.game), &bytes)
    }

    fn list(&self) -> TrackerResult<Vec<Checkpoint>> {
        self.storage
            .scan_prefix(CHECKPOINT_PREFIX.as_bytes())?
            .iter()
            .map(|(key, value)| decode_checkpoint(key, value))
            .collect()
    }
}
