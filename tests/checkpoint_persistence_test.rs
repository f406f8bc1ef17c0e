//! Verify that checkpoints survive a restart and polling resumes from them

use house_tracker::{
    checkpoint::{CheckpointStore, RocksCheckpointStore},
    engine::{PollerSettings, Supervisor},
    feed::{EventEnvelope, EventId, MemoryFeed},
    games::{GameDescriptor, GameKind, GameRegistry},
    FeedCursor,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const PACKAGE: &str = "0xbeef";

fn plinko_event(seq: u64) -> EventEnvelope {
    EventEnvelope::new(
        EventId::new(format!("tx{}", seq), 0),
        format!("{}::plinko::Outcome<0x2::sui::SUI>", PACKAGE),
        json!({ "bet_size": "100", "ball_count": "2", "pnl": "50" }),
    )
}

fn registry() -> GameRegistry {
    GameRegistry::new(vec![GameDescriptor::new(GameKind::Plinko, PACKAGE, "plinko")])
}

fn settings() -> PollerSettings {
    PollerSettings {
        page_size: 2,
        poll_interval: Duration::from_millis(500),
        request_timeout: Duration::from_secs(5),
    }
}

#[tokio::test(start_paused = true)]
async fn test_resume_from_checkpoint_after_restart() {
    let dir = TempDir::new().expect("temp dir");

    // === PHASE 1: track three events, then stop ===
    {
        let store = Arc::new(RocksCheckpointStore::open(dir.path()).expect("open store"));
        let feed = Arc::new(MemoryFeed::new((0..3).map(plinko_event).collect()));

        let supervisor = Supervisor::spawn(&registry(), feed, store, settings(), None).expect("supervisor starts");
        let mut plinko = supervisor.watch(GameKind::Plinko).expect("plinko tracked");
        plinko
            .wait_for(|s| s.tally.events_scored == 3)
            .await
            .expect("poller alive");

        let finished = supervisor.shutdown().await;
        assert_eq!(finished[0].1.net_delta, 450);
    }

    // === PHASE 2: checkpoint is on disk ===
    {
        let store = RocksCheckpointStore::open(dir.path()).expect("reopen store");
        let checkpoint = store
            .load(GameKind::Plinko)
            .expect("readable")
            .expect("checkpoint saved");

        assert_eq!(checkpoint.cursor, FeedCursor::at(EventId::new("tx2", 0)));
        assert_eq!(checkpoint.tally.net_delta, 450);
        assert_eq!(checkpoint.tally.events_scored, 3);
    }

    // === PHASE 3: restart against a feed that has grown ===
    let store = Arc::new(RocksCheckpointStore::open(dir.path()).expect("reopen store"));
    let feed = Arc::new(MemoryFeed::new((0..5).map(plinko_event).collect()));

    let supervisor = Supervisor::spawn(&registry(), feed.clone(), store.clone(), settings(), None)
        .expect("supervisor restarts");
    let mut plinko = supervisor.watch(GameKind::Plinko).expect("plinko tracked");
    plinko
        .wait_for(|s| s.tally.events_scored == 5)
        .await
        .expect("poller alive");

    let finished = supervisor.shutdown().await;
    assert_eq!(finished[0].1.net_delta, 750);

    // The restarted poller never re-read events before the checkpoint
    assert_eq!(feed.queried_cursors()[0], Some(EventId::new("tx2", 0)));

    let checkpoint = store.load(GameKind::Plinko).expect("readable").expect("checkpoint saved");
    assert_eq!(checkpoint.cursor, FeedCursor::at(EventId::new("tx4", 0)));
}
