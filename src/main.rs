//! House tracker binary

use clap::{Parser, Subcommand};
use house_tracker::{
    config::{self, ConfigLoader, GamesConfig, Network, TrackerConfig},
    connect_feed,
    engine::{PollerSettings, Supervisor},
    errors::{ConfigurationError, TrackerResult},
    games::{GameKind, GameRegistry},
    open_checkpoint_store, replay, telemetry,
};
use std::path::PathBuf;
use tokio::signal;
use tracing::{error, info, warn};

/// Net proceeds tracker for on-chain casino games
#[derive(Parser)]
#[command(name = "house-tracker")]
#[command(about = "Tracks house net proceeds from on-chain game settlement events")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json: bool,

    /// Network whose public fullnode is queried
    #[arg(short, long)]
    network: Option<Network>,

    /// Fullnode JSON-RPC URL, overrides the network default
    #[arg(long)]
    rpc_url: Option<String>,

    /// Comma separated games to track
    #[arg(short, long)]
    games: Option<String>,

    /// Persist checkpoints to this RocksDB directory
    #[arg(long)]
    checkpoint_dir: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll every tracked game until interrupted
    Run,

    /// List the tracked games and their modules
    Games,

    /// Print a sample configuration file
    Config {
        /// Write to this path instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Decode a saved page of events offline
    Replay {
        #[arg(short, long)]
        game: GameKind,

        /// JSON file holding a `suix_queryEvents` result or an event list
        #[arg(short, long)]
        file: PathBuf,
    },
}

fn load_config(cli: &Cli) -> TrackerResult<TrackerConfig> {
    let loader = match &cli.config {
        Some(path) => ConfigLoader::new().with_path(path),
        None => ConfigLoader::new(),
    };
    let mut config = loader.load()?;

    // Command line flags win over file and environment
    if let Some(network) = cli.network {
        config.network.network = network;
    }
    if let Some(url) = &cli.rpc_url {
        config.network.rpc_url = Some(url.clone());
    }
    if let Some(games) = &cli.games {
        config.games.enabled = config::parse_game_list(games)?;
    }
    if let Some(dir) = &cli.checkpoint_dir {
        config.storage.checkpoint_dir = Some(dir.clone());
    }
    if cli.json {
        config.logging.json = true;
    }

    config::validate(&config)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> TrackerResult<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    if let Err(e) = telemetry::init_tracing(&config.logging, cli.verbose) {
        eprintln!("Failed to initialise logging: {}", e);
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_tracker(config).await,
        Commands::Games => list_games(&config),
        Commands::Config { output } => print_sample_config(output),
        Commands::Replay { game, file } => replay_file(&config, game, file).await,
    }
}

async fn run_tracker(config: TrackerConfig) -> TrackerResult<()> {
    let registry = GameRegistry::from_config(&config.games)?;
    if registry.is_empty() {
        warn!("No games enabled; nothing will be tracked");
    }

    info!("🚀 Starting house tracker");
    info!("   Endpoint: {}", config.network.endpoint());
    info!("   Games: {}", registry.len());
    info!("   Poll interval: {}ms, page size {}", config.polling.interval_ms, config.polling.page_size);
    match &config.storage.checkpoint_dir {
        Some(dir) => info!("   Checkpoints: {}", dir),
        None => info!("   Checkpoints: in memory"),
    }

    let feed = connect_feed(&config)?;
    let checkpoints = open_checkpoint_store(&config)?;

    let supervisor = Supervisor::spawn(
        &registry,
        feed,
        checkpoints,
        PollerSettings::from_config(&config),
        Some(config.polling.report_interval()),
    )?;

    shutdown_signal().await;

    info!("Stopping {} polling tasks...", supervisor.len());
    let finished = supervisor.shutdown().await;

    let mut total: i128 = 0;
    for (game, tally) in &finished {
        info!(
            game = %game,
            "Final net {} over {} events in {} cycles",
            tally.net_delta,
            tally.events_scored,
            tally.cycles
        );
        total = total.saturating_add(tally.net_delta);
    }
    info!("🛑 House tracker stopped (total net {})", total);

    Ok(())
}

fn list_games(config: &TrackerConfig) -> TrackerResult<()> {
    let registry = GameRegistry::from_config(&config.games)?;

    println!("Tracked games ({}):", registry.len());
    for game in registry.tracked_games() {
        println!(
            "  {:<12} {}::{}",
            game.id().as_str(),
            game.module_type(),
            game.decoder().event_name()
        );
    }

    let builtin = GameRegistry::builtin();
    let disabled: Vec<_> = builtin
        .tracked_games()
        .iter()
        .filter(|g| registry.get(g.id()).is_none())
        .collect();
    if !disabled.is_empty() {
        println!("Available but disabled ({}):", disabled.len());
        for game in disabled {
            println!("  {:<12} {}", game.id().as_str(), game.module_type());
        }
    }

    Ok(())
}

fn print_sample_config(output: Option<PathBuf>) -> TrackerResult<()> {
    match output {
        Some(path) => {
            config::generate_sample_config(&path)?;
            println!("Sample configuration written to {}", path.display());
        }
        None => print!("{}", config::sample_config()?),
    }
    Ok(())
}

async fn replay_file(config: &TrackerConfig, game: GameKind, file: PathBuf) -> TrackerResult<()> {
    let registry = GameRegistry::from_config(&GamesConfig {
        enabled: vec![game],
        packages: config.games.packages.clone(),
    })?;
    let descriptor = registry
        .get(game)
        .cloned()
        .ok_or_else(|| ConfigurationError::UnknownGame(game.to_string()))?;

    let events = replay::load_events(&file)?;
    let outcome = replay::replay_events(descriptor, events, PollerSettings::from_config(config)).await;

    println!("Replayed {} events from {}", outcome.events_loaded, file.display());
    println!("  Scored:          {}", outcome.tally.events_scored);
    println!("  Skipped:         {}", outcome.tally.events_skipped);
    println!("  Decode failures: {}", outcome.tally.decode_failures);
    println!("  Net delta:       {}", outcome.tally.net_delta);
    println!("  Final cursor:    {}", outcome.cursor);

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received terminate signal");
        },
    }
}
