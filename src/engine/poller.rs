//! Per-game polling loop
//!
//! One `GamePoller` owns the cursor and tally of one tracked module. A cycle
//! drains the feed page by page (fetch, decode, fold, advance) until the feed
//! reports no further page, then the task sleeps for the poll interval.
//! Cursor and tally are only touched synchronously after a page has arrived,
//! so cancelling a cycle at its fetch never leaves them half-updated.

use super::tally::{GameTally, PollState, TallySnapshot};
use crate::checkpoint::{Checkpoint, CheckpointStore};
use crate::config::TrackerConfig;
use crate::cursor::FeedCursor;
use crate::feed::{EventFeed, EventPage, FeedError, SortOrder};
use crate::games::{Delta, GameDescriptor, GameKind};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Paging and timing knobs shared by every poller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerSettings {
    pub page_size: usize,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
}

impl Default for PollerSettings {
    fn default() -> Self {
        Self {
            page_size: 50,
            poll_interval: Duration::from_millis(1000),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl PollerSettings {
    pub fn from_config(config: &TrackerConfig) -> Self {
        Self {
            page_size: config.polling.page_size,
            poll_interval: config.polling.interval(),
            request_timeout: config.network.request_timeout(),
        }
    }
}

/// What one cycle did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleReport {
    pub pages: u32,
    pub events: usize,
    pub delta: Delta,
    pub decode_failures: usize,
    /// Set when the cycle ended on a failed fetch
    pub fetch_error: Option<String>,
}

impl CycleReport {
    pub fn fetch_failed(&self) -> bool {
        self.fetch_error.is_some()
    }
}

pub struct GamePoller {
    game: GameDescriptor,
    feed: Arc<dyn EventFeed>,
    checkpoints: Arc<dyn CheckpointStore>,
    settings: PollerSettings,
    cursor: FeedCursor,
    tally: GameTally,
    snapshots: watch::Sender<TallySnapshot>,
}

impl GamePoller {
    pub fn new(
        game: GameDescriptor,
        feed: Arc<dyn EventFeed>,
        checkpoints: Arc<dyn CheckpointStore>,
        settings: PollerSettings,
    ) -> Self {
        let (snapshots, _) = watch::channel(TallySnapshot::new(
            game.id(),
            FeedCursor::initial(),
            GameTally::default(),
        ));

        Self {
            game,
            feed,
            checkpoints,
            settings,
            cursor: FeedCursor::initial(),
            tally: GameTally::default(),
            snapshots,
        }
    }

    /// Continue from a stored checkpoint instead of the start of the stream.
    /// Checkpoints of other games are ignored.
    pub fn resume_from(&mut self, checkpoint: Checkpoint) {
        if checkpoint.game != self.game.id() {
            warn!(
                game = %self.game.id(),
                "Ignoring checkpoint recorded for {}",
                checkpoint.game
            );
            return;
        }

        info!(
            game = %self.game.id(),
            "Resuming from {} (net {})",
            checkpoint.cursor,
            checkpoint.tally.net_delta
        );
        self.cursor = checkpoint.cursor;
        self.tally = checkpoint.tally;
        self.publish(PollState::Idle);
    }

    pub fn game(&self) -> GameKind {
        self.game.id()
    }

    pub fn cursor(&self) -> &FeedCursor {
        &self.cursor
    }

    pub fn tally(&self) -> &GameTally {
        &self.tally
    }

    pub fn subscribe(&self) -> watch::Receiver<TallySnapshot> {
        self.snapshots.subscribe()
    }

    fn publish(&self, state: PollState) {
        self.snapshots.send_replace(TallySnapshot {
            game: self.game.id(),
            state,
            cursor: self.cursor.clone(),
            tally: self.tally.clone(),
            updated_at: Utc::now(),
        });
    }

    async fn fetch_page(&self) -> Result<EventPage, FeedError> {
        let filter = self.game.filter();
        let query = self.feed.query_events(
            &filter,
            self.cursor.position(),
            SortOrder::Ascending,
            self.settings.page_size,
        );

        match tokio::time::timeout(self.settings.request_timeout, query).await {
            Ok(result) => result,
            Err(_) => Err(FeedError::Timeout {
                timeout_ms: self.settings.request_timeout.as_millis() as u64,
            }),
        }
    }

    fn save_checkpoint(&self) {
        let checkpoint = Checkpoint::new(self.game.id(), self.cursor.clone(), self.tally.clone());
        if let Err(e) = self.checkpoints.save(&checkpoint) {
            warn!(game = %self.game.id(), "Failed to save checkpoint at {}: {}", self.cursor, e);
        }
    }

    /// Drain the feed from the current cursor.
    ///
    /// A failed fetch ends the cycle with cursor and tally as they were
    /// after the last good page.
    pub async fn poll_cycle(&mut self) -> CycleReport {
        let mut report = CycleReport::default();
        let module_type = self.game.module_type();

        loop {
            self.publish(PollState::Fetching);

            let page = match self.fetch_page().await {
                Ok(page) => page,
                Err(e) => {
                    warn!(game = %self.game.id(), "Fetch from {} failed: {}", self.cursor, e);
                    self.tally.record_fetch_failure();
                    report.fetch_error = Some(e.to_string());
                    break;
                }
            };

            self.publish(PollState::Decoding);

            let batch = self.game.decoder().decode(&page.data, &module_type);
            for failure in &batch.failures {
                warn!(
                    game = %self.game.id(),
                    "Skipping undecodable event {}: {}",
                    failure.event_id,
                    failure.error
                );
            }

            self.tally.fold_batch(&batch);
            self.cursor = self.cursor.advance(&page);

            report.pages += 1;
            report.events += page.data.len();
            report.delta = report.delta.saturating_add(batch.delta);
            report.decode_failures += batch.failures.len();

            if !page.data.is_empty() {
                debug!(
                    game = %self.game.id(),
                    "Folded {} events (delta {}, net {}), cursor now {}",
                    page.data.len(),
                    batch.delta,
                    self.tally.net_delta,
                    self.cursor
                );
                self.save_checkpoint();
            }

            if !(page.has_next_page && page.next_cursor.is_some() && !page.data.is_empty()) {
                break;
            }
        }

        self.tally.record_cycle();
        report
    }

    /// Poll until `shutdown` turns true (or its sender goes away), returning
    /// the final tally.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> GameTally {
        info!(
            game = %self.game.id(),
            "📡 Polling {} from {}",
            self.game.module_type(),
            self.cursor
        );

        loop {
            tokio::select! {
                biased;
                _ = shutdown_requested(&mut shutdown) => break,
                report = self.poll_cycle() => {
                    if report.events > 0 {
                        info!(
                            game = %self.game.id(),
                            "Cycle folded {} events over {} pages (delta {}, net {})",
                            report.events,
                            report.pages,
                            report.delta,
                            self.tally.net_delta
                        );
                    }
                }
            }

            self.publish(PollState::Waiting);

            tokio::select! {
                biased;
                _ = shutdown_requested(&mut shutdown) => break,
                _ = tokio::time::sleep(self.settings.poll_interval) => {}
            }
        }

        self.publish(PollState::Stopped);
        info!(
            game = %self.game.id(),
            "🛑 Stopped at {} (net {})",
            self.cursor,
            self.tally.net_delta
        );
        self.tally
    }
}

/// Resolves once shutdown has been signalled or can no longer be signalled
pub(crate) async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::MemoryCheckpointStore;
    use crate::feed::{EventEnvelope, EventId, MemoryFeed};
    use async_trait::async_trait;
    use serde_json::json;

    const PACKAGE: &str = "0xfeed";

    fn limbo_event(seq: u64, stake: u64, returned: u64) -> EventEnvelope {
        EventEnvelope::new(
            EventId::new(format!("tx{}", seq), 0),
            format!("{}::limbo::Outcome<0x2::sui::SUI>", PACKAGE),
            json!({ "results": [{ "bet_size": stake.to_string(), "bet_returned": returned.to_string() }] }),
        )
    }

    fn poller(feed: Arc<dyn EventFeed>, page_size: usize) -> GamePoller {
        GamePoller::new(
            GameDescriptor::new(GameKind::Limbo, PACKAGE, "limbo"),
            feed,
            Arc::new(MemoryCheckpointStore::new()),
            PollerSettings {
                page_size,
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn test_cycle_drains_all_pages() {
        let feed = Arc::new(MemoryFeed::new((0..5).map(|i| limbo_event(i, 100, 40)).collect()));
        let mut poller = poller(feed.clone(), 2);

        let report = poller.poll_cycle().await;

        assert_eq!(report.pages, 3);
        assert_eq!(report.events, 5);
        assert_eq!(report.delta, 300);
        assert_eq!(poller.tally().net_delta, 300);
        assert_eq!(poller.cursor(), &FeedCursor::at(EventId::new("tx4", 0)));
        assert_eq!(feed.queried_cursors().len(), 3);
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_state_untouched() {
        let feed = Arc::new(MemoryFeed::new(vec![limbo_event(0, 100, 0)]));
        let mut poller = poller(feed.clone(), 50);
        feed.fail_next(1);

        let report = poller.poll_cycle().await;
        assert!(report.fetch_failed());
        assert_eq!(poller.tally().net_delta, 0);
        assert_eq!(poller.tally().fetch_failures, 1);
        assert!(poller.cursor().is_initial());

        let report = poller.poll_cycle().await;
        assert!(!report.fetch_failed());
        assert_eq!(poller.tally().net_delta, 100);
    }

    #[tokio::test]
    async fn test_empty_feed_keeps_initial_cursor() {
        let feed = Arc::new(MemoryFeed::default());
        let mut poller = poller(feed, 50);

        let report = poller.poll_cycle().await;
        assert_eq!(report.pages, 1);
        assert_eq!(report.events, 0);
        assert!(poller.cursor().is_initial());
        assert_eq!(poller.tally().cycles, 1);
    }

    /// Always serves the same event and claims more pages without a cursor
    struct CursorlessFeed;

    #[async_trait]
    impl EventFeed for CursorlessFeed {
        async fn query_events(
            &self,
            _filter: &crate::feed::EventFilter,
            _cursor: Option<&EventId>,
            _order: SortOrder,
            _limit: usize,
        ) -> Result<EventPage, FeedError> {
            Ok(EventPage {
                data: vec![limbo_event(0, 100, 0)],
                next_cursor: None,
                has_next_page: true,
            })
        }
    }

    #[tokio::test]
    async fn test_page_without_next_cursor_ends_cycle() {
        let mut poller = poller(Arc::new(CursorlessFeed), 50);

        let report = poller.poll_cycle().await;

        assert_eq!(report.pages, 1);
        assert_eq!(report.events, 1);
        assert_eq!(poller.tally().net_delta, 100);
        assert_eq!(poller.cursor(), &FeedCursor::at(EventId::new("tx0", 0)));
    }

    struct StalledFeed;

    #[async_trait]
    impl EventFeed for StalledFeed {
        async fn query_events(
            &self,
            _filter: &crate::feed::EventFilter,
            _cursor: Option<&EventId>,
            _order: SortOrder,
            _limit: usize,
        ) -> Result<EventPage, FeedError> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_fetch_times_out() {
        let mut poller = poller(Arc::new(StalledFeed), 50);

        let report = poller.poll_cycle().await;
        assert!(report.fetch_failed());
        assert_eq!(poller.tally().fetch_failures, 1);
    }

    #[tokio::test]
    async fn test_resume_ignores_foreign_checkpoint() {
        let mut poller = poller(Arc::new(MemoryFeed::default()), 50);

        poller.resume_from(Checkpoint::new(
            GameKind::Plinko,
            FeedCursor::at(EventId::new("tx1", 0)),
            GameTally::default(),
        ));
        assert!(poller.cursor().is_initial());

        poller.resume_from(Checkpoint::new(
            GameKind::Limbo,
            FeedCursor::at(EventId::new("tx1", 0)),
            GameTally {
                net_delta: 42,
                ..Default::default()
            },
        ));
        assert_eq!(poller.tally().net_delta, 42);
        assert_eq!(poller.subscribe().borrow().tally.net_delta, 42);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_on_shutdown() {
        let feed = Arc::new(MemoryFeed::new(vec![limbo_event(0, 100, 250)]));
        let poller = poller(feed, 50);
        let mut snapshots = poller.subscribe();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(poller.run(shutdown_rx));

        snapshots.wait_for(|s| s.state == PollState::Waiting).await.unwrap();
        shutdown_tx.send(true).unwrap();

        let tally = handle.await.unwrap();
        assert_eq!(tally.net_delta, -150);
        assert_eq!(snapshots.borrow().state, PollState::Stopped);
    }
}
