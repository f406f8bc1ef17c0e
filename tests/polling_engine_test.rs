//! End-to-end behaviour of the polling engine against an in-memory feed

use house_tracker::{
    checkpoint::MemoryCheckpointStore,
    engine::{GamePoller, PollState, PollerSettings, Supervisor},
    feed::{EventEnvelope, EventId, MemoryFeed},
    games::{GameDescriptor, GameKind, GameRegistry},
    FeedCursor,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

const PACKAGE: &str = "0xcafe";
const POLL_INTERVAL: Duration = Duration::from_millis(1000);

fn limbo_event(seq: u64, stake: u64, returned: u64) -> EventEnvelope {
    EventEnvelope::new(
        EventId::new(format!("tx{}", seq), 0),
        format!("{}::limbo::Outcome<0x2::sui::SUI>", PACKAGE),
        json!({ "results": [{ "bet_size": stake.to_string(), "bet_returned": returned.to_string() }] }),
    )
}

fn limbo_poller(feed: Arc<MemoryFeed>, page_size: usize) -> GamePoller {
    GamePoller::new(
        GameDescriptor::new(GameKind::Limbo, PACKAGE, "limbo"),
        feed,
        Arc::new(MemoryCheckpointStore::new()),
        PollerSettings {
            page_size,
            poll_interval: POLL_INTERVAL,
            request_timeout: Duration::from_secs(5),
        },
    )
}

fn cursor_seq(cursor: &Option<EventId>) -> Option<u64> {
    cursor
        .as_ref()
        .map(|id| id.tx_digest.trim_start_matches("tx").parse().expect("test digest"))
}

#[tokio::test(start_paused = true)]
async fn test_cursor_only_moves_forward_and_nothing_is_counted_twice() {
    let feed = Arc::new(MemoryFeed::new((0..7).map(|i| limbo_event(i, 100, i * 10)).collect()));
    let poller = limbo_poller(feed.clone(), 3);
    let mut snapshots = poller.subscribe();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(poller.run(shutdown_rx));

    snapshots
        .wait_for(|s| s.tally.events_scored == 7 && s.state == PollState::Waiting)
        .await
        .expect("poller alive");

    // Let a few idle polls go by before new events land
    tokio::time::sleep(POLL_INTERVAL * 3).await;
    feed.push((7..10).map(|i| limbo_event(i, 100, i * 10)));

    snapshots
        .wait_for(|s| s.tally.events_scored == 10)
        .await
        .expect("poller alive");

    shutdown_tx.send(true).expect("poller listening");
    let tally = handle.await.expect("poller task");

    let expected: i128 = (0..10).map(|i| 100 - (i * 10) as i128).sum();
    assert_eq!(tally.net_delta, expected);
    assert_eq!(tally.events_scored, 10);

    let seqs: Vec<Option<u64>> = feed.queried_cursors().iter().map(cursor_seq).collect();
    assert_eq!(seqs[0], None);
    for pair in seqs.windows(2) {
        assert!(pair[0] <= pair[1], "cursor moved backwards: {:?}", seqs);
    }
    assert!(seqs.iter().all(|s| *s <= Some(9)));
    assert_eq!(snapshots.borrow().cursor, FeedCursor::at(EventId::new("tx9", 0)));
}

#[tokio::test(start_paused = true)]
async fn test_pages_are_drained_without_waiting() {
    let feed = Arc::new(MemoryFeed::new((0..9).map(|i| limbo_event(i, 50, 0)).collect()));
    let poller = limbo_poller(feed.clone(), 2);
    let mut snapshots = poller.subscribe();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let started = Instant::now();
    let handle = tokio::spawn(poller.run(shutdown_rx));

    snapshots
        .wait_for(|s| s.tally.events_scored == 9)
        .await
        .expect("poller alive");

    assert!(started.elapsed() < POLL_INTERVAL);
    // Five pages of two (the last holding one event)
    assert_eq!(feed.queried_cursors().len(), 5);

    shutdown_tx.send(true).expect("poller listening");
    handle.await.expect("poller task");
}

#[tokio::test(start_paused = true)]
async fn test_failed_fetch_retries_after_interval() {
    let feed = Arc::new(MemoryFeed::new(vec![limbo_event(0, 100, 0), limbo_event(1, 100, 300)]));
    feed.fail_next(1);

    let poller = limbo_poller(feed.clone(), 50);
    let mut snapshots = poller.subscribe();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let started = Instant::now();
    let handle = tokio::spawn(poller.run(shutdown_rx));

    let after_failure = snapshots
        .wait_for(|s| s.state == PollState::Waiting)
        .await
        .expect("poller alive")
        .clone();
    assert_eq!(after_failure.tally.fetch_failures, 1);
    assert_eq!(after_failure.tally.net_delta, 0);
    assert_eq!(after_failure.cursor, FeedCursor::initial());

    snapshots
        .wait_for(|s| s.tally.events_scored == 2)
        .await
        .expect("poller alive");
    assert!(started.elapsed() >= POLL_INTERVAL);

    shutdown_tx.send(true).expect("poller listening");
    let tally = handle.await.expect("poller task");

    assert_eq!(tally.net_delta, -100);
    assert_eq!(tally.fetch_failures, 1);
    // Retry started from the same position
    assert_eq!(feed.queried_cursors()[..2], [None, None]);
}

#[tokio::test(start_paused = true)]
async fn test_malformed_event_does_not_stall_the_cursor() {
    let mut events = vec![limbo_event(0, 100, 0)];
    events.push(EventEnvelope::new(
        EventId::new("tx1", 0),
        format!("{}::limbo::Outcome<0x2::sui::SUI>", PACKAGE),
        json!({ "results": "garbage" }),
    ));
    events.push(limbo_event(2, 100, 0));

    let mut poller = limbo_poller(Arc::new(MemoryFeed::new(events)), 50);
    let report = poller.poll_cycle().await;

    assert_eq!(report.decode_failures, 1);
    assert_eq!(poller.tally().net_delta, 200);
    assert_eq!(poller.cursor(), &FeedCursor::at(EventId::new("tx2", 0)));
}

#[tokio::test(start_paused = true)]
async fn test_supervisor_tracks_games_independently() {
    let feed = Arc::new(MemoryFeed::new(vec![
        limbo_event(0, 100, 0),
        EventEnvelope::new(
            EventId::new("tx1", 0),
            format!("{}::plinko::Outcome<0x2::sui::SUI>", PACKAGE),
            json!({ "bet_size": "10", "ball_count": "3", "pnl": "-5" }),
        ),
        limbo_event(2, 100, 500),
    ]));

    let registry = GameRegistry::new(vec![
        GameDescriptor::new(GameKind::Limbo, PACKAGE, "limbo"),
        GameDescriptor::new(GameKind::Plinko, PACKAGE, "plinko"),
    ]);

    let supervisor = Supervisor::spawn(
        &registry,
        feed,
        Arc::new(MemoryCheckpointStore::new()),
        PollerSettings {
            poll_interval: POLL_INTERVAL,
            ..Default::default()
        },
        Some(Duration::from_secs(10)),
    )
    .expect("supervisor starts");

    let mut limbo = supervisor.watch(GameKind::Limbo).expect("limbo tracked");
    let mut plinko = supervisor.watch(GameKind::Plinko).expect("plinko tracked");
    limbo.wait_for(|s| s.tally.events_scored == 2).await.expect("limbo alive");
    plinko.wait_for(|s| s.tally.events_scored == 1).await.expect("plinko alive");

    assert_eq!(supervisor.total_net(), -300 + 35);

    let finished = supervisor.shutdown().await;
    assert_eq!(finished.len(), 2);
    assert!(limbo.borrow().state == PollState::Stopped);
    assert!(plinko.borrow().state == PollState::Stopped);
}
