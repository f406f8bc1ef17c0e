//! Owns the polling tasks
//!
//! One tokio task per tracked game plus a reporter that periodically logs
//! a summary. Shutdown is a single `watch` flag every task listens on.

use super::poller::{shutdown_requested, GamePoller, PollerSettings};
use super::tally::{GameTally, TallySnapshot};
use crate::checkpoint::CheckpointStore;
use crate::feed::EventFeed;
use crate::errors::TrackerResult;
use crate::games::{Delta, GameKind, GameRegistry};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

pub struct Supervisor {
    shutdown: watch::Sender<bool>,
    tasks: Vec<(GameKind, JoinHandle<GameTally>)>,
    snapshots: Vec<watch::Receiver<TallySnapshot>>,
    reporter: Option<JoinHandle<()>>,
}

impl Supervisor {
    /// Start one poller per registered game, resuming each from its stored
    /// checkpoint when there is one.
    pub fn spawn(
        registry: &GameRegistry,
        feed: Arc<dyn EventFeed>,
        checkpoints: Arc<dyn CheckpointStore>,
        settings: PollerSettings,
        report_interval: Option<Duration>,
    ) -> TrackerResult<Self> {
        let (shutdown, shutdown_rx) = watch::channel(false);
        let mut tasks = Vec::with_capacity(registry.len());
        let mut snapshots = Vec::with_capacity(registry.len());

        for game in registry.tracked_games() {
            let mut poller = GamePoller::new(game.clone(), feed.clone(), checkpoints.clone(), settings);

            if let Some(checkpoint) = checkpoints.load(game.id())? {
                poller.resume_from(checkpoint);
            }

            snapshots.push(poller.subscribe());
            tasks.push((game.id(), tokio::spawn(poller.run(shutdown_rx.clone()))));
        }

        // A zero interval disables the reporter
        let reporter = report_interval
            .filter(|every| !every.is_zero())
            .map(|every| tokio::spawn(report_loop(snapshots.clone(), every, shutdown_rx)));

        info!("✅ Supervising {} polling tasks", tasks.len());

        Ok(Self {
            shutdown,
            tasks,
            snapshots,
            reporter,
        })
    }

    /// Latest snapshot of every task
    pub fn snapshots(&self) -> Vec<TallySnapshot> {
        self.snapshots.iter().map(|rx| rx.borrow().clone()).collect()
    }

    pub fn watch(&self, game: GameKind) -> Option<watch::Receiver<TallySnapshot>> {
        self.snapshots.iter().find(|rx| rx.borrow().game == game).cloned()
    }

    /// Net proceeds across every tracked game
    pub fn total_net(&self) -> Delta {
        total_net(&self.snapshots())
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Signal every task to stop and wait for all of them. Returns the final
    /// tally of each task that exited cleanly.
    pub async fn shutdown(self) -> Vec<(GameKind, GameTally)> {
        self.shutdown.send_replace(true);

        let (games, handles): (Vec<GameKind>, Vec<JoinHandle<GameTally>>) = self.tasks.into_iter().unzip();
        let results = join_all(handles).await;

        if let Some(reporter) = self.reporter {
            if let Err(e) = reporter.await {
                warn!("Reporter task ended abnormally: {}", e);
            }
        }

        games
            .into_iter()
            .zip(results)
            .filter_map(|(game, result)| match result {
                Ok(tally) => Some((game, tally)),
                Err(e) => {
                    warn!(game = %game, "Polling task ended abnormally: {}", e);
                    None
                }
            })
            .collect()
    }
}

pub fn total_net(snapshots: &[TallySnapshot]) -> Delta {
    snapshots
        .iter()
        .fold(0 as Delta, |acc, s| acc.saturating_add(s.tally.net_delta))
}

fn log_summary(snapshots: &[watch::Receiver<TallySnapshot>]) {
    let current: Vec<TallySnapshot> = snapshots.iter().map(|rx| rx.borrow().clone()).collect();

    for s in &current {
        info!(
            game = %s.game,
            "📊 {} net {} over {} events ({} skipped, {} decode failures, {} fetch failures), cursor {}",
            s.state,
            s.tally.net_delta,
            s.tally.events_scored,
            s.tally.events_skipped,
            s.tally.decode_failures,
            s.tally.fetch_failures,
            s.cursor
        );
    }
    info!("📊 Total net across {} games: {}", current.len(), total_net(&current));
}

async fn report_loop(
    snapshots: Vec<watch::Receiver<TallySnapshot>>,
    every: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // First tick completes immediately
    ticker.tick().await;

    loop {
        tokio::select! {
            biased;
            _ = shutdown_requested(&mut shutdown) => break,
            _ = ticker.tick() => log_summary(&snapshots),
        }
    }

    log_summary(&snapshots);
}
