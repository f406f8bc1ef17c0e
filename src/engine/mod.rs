//! Polling engine
//!
//! `GamePoller` runs the fetch, decode, fold, advance loop for one module;
//! `Supervisor` owns a poller task per tracked game.

pub mod poller;
pub mod supervisor;
pub mod tally;

pub use poller::{CycleReport, GamePoller, PollerSettings};
pub use supervisor::Supervisor;
pub use tally::{GameTally, PollState, TallySnapshot};
