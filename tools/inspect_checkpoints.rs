//! Dump the checkpoints stored in a tracker RocksDB directory

use house_tracker::checkpoint::{CheckpointStore, RocksCheckpointStore};
use std::env;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let db_path = env::args()
        .nth(1)
        .or_else(|| env::var("TRACKER_CHECKPOINT_DIR").ok())
        .unwrap_or_else(|| "./tracker_checkpoints".to_string());

    let store = RocksCheckpointStore::open(&db_path)?;
    let checkpoints = store.list()?;

    println!("Checkpoints in {} ({}):", db_path, checkpoints.len());
    for checkpoint in checkpoints {
        println!("  {}", checkpoint.game);
        println!("    cursor:   {}", checkpoint.cursor);
        println!("    net:      {}", checkpoint.tally.net_delta);
        println!(
            "    events:   {} scored, {} skipped, {} failed",
            checkpoint.tally.events_scored, checkpoint.tally.events_skipped, checkpoint.tally.decode_failures
        );
        println!("    saved at: {}", checkpoint.saved_at.to_rfc3339());
    }

    Ok(())
}
