//! Configuration for the house tracker
//!
//! Defaults: mainnet fullnode, plinko only, one-second polling and no
//! checkpointing. A TOML file and then environment variables are layered on
//! top.

use crate::errors::{ConfigurationError, TrackerResult};
use crate::games::GameKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Sui network the fullnode belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
    Devnet,
    Localnet,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
            Network::Devnet => "devnet",
            Network::Localnet => "localnet",
        }
    }

    /// Public fullnode JSON-RPC endpoint
    pub fn fullnode_url(&self) -> String {
        match self {
            Network::Localnet => "http://127.0.0.1:9000".to_string(),
            other => format!("https://fullnode.{}.sui.io:443", other.as_str()),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            "devnet" => Ok(Network::Devnet),
            "localnet" | "local" => Ok(Network::Localnet),
            other => Err(ConfigurationError::InvalidValue {
                field: "network.network".to_string(),
                value: other.to_string(),
                reason: "expected mainnet, testnet, devnet or localnet".to_string(),
            }),
        }
    }
}

/// Complete tracker configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub network: NetworkConfig,
    pub polling: PollingConfig,
    pub storage: StorageConfig,
    pub games: GamesConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub network: Network,
    /// Overrides the network's public fullnode
    pub rpc_url: Option<String>,
    pub request_timeout_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            network: Network::Mainnet,
            rpc_url: None,
            request_timeout_ms: 10_000,
        }
    }
}

impl NetworkConfig {
    pub fn endpoint(&self) -> String {
        self.rpc_url.clone().unwrap_or_else(|| self.network.fullnode_url())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Delay between polls once a module's feed is drained
    pub interval_ms: u64,
    pub page_size: usize,
    /// How often the supervisor logs a tally summary
    pub report_interval_ms: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            page_size: 50,
            report_interval_ms: 30_000,
        }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn report_interval(&self) -> Duration {
        Duration::from_millis(self.report_interval_ms)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// RocksDB directory for cursor checkpoints; unset keeps them in memory
    pub checkpoint_dir: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GamesConfig {
    pub enabled: Vec<GameKind>,
    /// Package address per game id, replacing the published one
    pub packages: BTreeMap<String, String>,
}

impl Default for GamesConfig {
    fn default() -> Self {
        Self {
            enabled: vec![GameKind::Plinko],
            packages: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Configuration loader with environment variable support
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self { config_path: None }
    }

    pub fn with_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Load the file (if any), apply process environment overrides and
    /// validate the result.
    pub fn load(&self) -> TrackerResult<TrackerConfig> {
        self.load_with_env(|key| env::var(key).ok())
    }

    /// Same as [`load`](Self::load) with an explicit variable lookup
    pub fn load_with_env<F>(&self, lookup: F) -> TrackerResult<TrackerConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match &self.config_path {
            Some(path) => self.load_from_file(path)?,
            None => TrackerConfig::default(),
        };

        apply_env_overrides(&mut config, lookup)?;
        validate(&config)?;

        Ok(config)
    }

    fn load_from_file(&self, path: &Path) -> TrackerResult<TrackerConfig> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigurationError::LoadFailed(format!("Failed to read {}: {}", path.display(), e)))?;

        toml::from_str(&content)
            .map_err(|e| ConfigurationError::LoadFailed(format!("Failed to parse TOML: {}", e)).into())
    }

    pub fn save(&self, config: &TrackerConfig, path: impl AsRef<Path>) -> TrackerResult<()> {
        let path = path.as_ref();
        let toml_string = to_toml(config)?;

        std::fs::write(path, toml_string)
            .map_err(|e| ConfigurationError::SaveFailed(format!("Failed to write to {}: {}", path.display(), e)).into())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_env<T: FromStr>(key: &str, raw: String, reason: &str) -> Result<T, ConfigurationError> {
    raw.trim().parse().map_err(|_| ConfigurationError::InvalidValue {
        field: key.to_string(),
        value: raw.clone(),
        reason: reason.to_string(),
    })
}

fn apply_env_overrides<F>(config: &mut TrackerConfig, lookup: F) -> TrackerResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(network) = lookup("NETWORK") {
        config.network.network = network.parse()?;
    }
    if let Some(url) = lookup("TRACKER_RPC_URL") {
        config.network.rpc_url = Some(url);
    }
    if let Some(interval) = lookup("TRACKER_POLL_INTERVAL_MS") {
        config.polling.interval_ms = parse_env("TRACKER_POLL_INTERVAL_MS", interval, "Invalid interval")?;
    }
    if let Some(size) = lookup("TRACKER_PAGE_SIZE") {
        config.polling.page_size = parse_env("TRACKER_PAGE_SIZE", size, "Invalid page size")?;
    }
    if let Some(dir) = lookup("TRACKER_CHECKPOINT_DIR") {
        config.storage.checkpoint_dir = if dir.trim().is_empty() { None } else { Some(dir) };
    }
    if let Some(games) = lookup("TRACKER_GAMES") {
        config.games.enabled = parse_game_list(&games)?;
    }

    Ok(())
}

/// Comma separated game ids; blank entries are ignored
pub fn parse_game_list(raw: &str) -> Result<Vec<GameKind>, ConfigurationError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(GameKind::from_str)
        .collect()
}

/// Reject configurations the engine cannot run with
pub fn validate(config: &TrackerConfig) -> TrackerResult<()> {
    if config.polling.page_size == 0 || config.polling.page_size > 1000 {
        return Err(ConfigurationError::InvalidValue {
            field: "polling.page_size".to_string(),
            value: config.polling.page_size.to_string(),
            reason: "Page size must be between 1 and 1000".to_string(),
        }
        .into());
    }

    if config.network.request_timeout_ms < 100 {
        return Err(ConfigurationError::InvalidValue {
            field: "network.request_timeout_ms".to_string(),
            value: config.network.request_timeout_ms.to_string(),
            reason: "Timeout must be at least 100ms".to_string(),
        }
        .into());
    }

    if config.polling.report_interval_ms == 0 {
        return Err(ConfigurationError::InvalidValue {
            field: "polling.report_interval_ms".to_string(),
            value: "0".to_string(),
            reason: "Report interval cannot be zero".to_string(),
        }
        .into());
    }

    if let Some(url) = &config.network.rpc_url {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigurationError::InvalidValue {
                field: "network.rpc_url".to_string(),
                value: url.clone(),
                reason: "URL must use http or https".to_string(),
            }
            .into());
        }
    }

    if let Some(dir) = &config.storage.checkpoint_dir {
        if dir.trim().is_empty() {
            return Err(ConfigurationError::MissingRequired("storage.checkpoint_dir".to_string()).into());
        }
    }

    for key in config.games.packages.keys() {
        if !GameKind::ALL.iter().any(|g| g.as_str() == key) {
            return Err(ConfigurationError::UnknownGame(key.clone()).into());
        }
    }

    Ok(())
}

fn to_toml(config: &TrackerConfig) -> TrackerResult<String> {
    toml::to_string_pretty(config)
        .map_err(|e| ConfigurationError::SaveFailed(format!("Failed to serialize config: {}", e)).into())
}

/// Sample configuration file contents
pub fn sample_config() -> TrackerResult<String> {
    to_toml(&TrackerConfig::default())
}

/// Write a sample configuration file
pub fn generate_sample_config(path: impl AsRef<Path>) -> TrackerResult<()> {
    ConfigLoader::new().save(&TrackerConfig::default(), path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = TrackerConfig::default();
        assert_eq!(config.network.network, Network::Mainnet);
        assert_eq!(config.polling.interval_ms, 1000);
        assert_eq!(config.polling.page_size, 50);
        assert_eq!(config.games.enabled, vec![GameKind::Plinko]);
        assert!(config.storage.checkpoint_dir.is_none());
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_network_urls() {
        assert_eq!(Network::Mainnet.fullnode_url(), "https://fullnode.mainnet.sui.io:443");
        assert_eq!(Network::Devnet.fullnode_url(), "https://fullnode.devnet.sui.io:443");
        assert_eq!(Network::Localnet.fullnode_url(), "http://127.0.0.1:9000");
        assert_eq!("TESTNET".parse::<Network>().unwrap(), Network::Testnet);
        assert!("moonnet".parse::<Network>().is_err());
    }

    #[test]
    fn test_endpoint_prefers_override() {
        let mut config = TrackerConfig::default();
        config.network.network = Network::Testnet;
        assert_eq!(config.network.endpoint(), "https://fullnode.testnet.sui.io:443");

        config.network.rpc_url = Some("http://localhost:9124".to_string());
        assert_eq!(config.network.endpoint(), "http://localhost:9124");
    }

    #[test]
    fn test_env_overrides() {
        let config = ConfigLoader::new()
            .load_with_env(env_of(&[
                ("NETWORK", "testnet"),
                ("TRACKER_PAGE_SIZE", "25"),
                ("TRACKER_POLL_INTERVAL_MS", "250"),
                ("TRACKER_GAMES", "plinko, roulette,,limbo"),
                ("TRACKER_CHECKPOINT_DIR", "/tmp/checkpoints"),
            ]))
            .unwrap();

        assert_eq!(config.network.network, Network::Testnet);
        assert_eq!(config.polling.page_size, 25);
        assert_eq!(config.polling.interval(), Duration::from_millis(250));
        assert_eq!(config.games.enabled, vec![GameKind::Plinko, GameKind::Roulette, GameKind::Limbo]);
        assert_eq!(config.storage.checkpoint_dir.as_deref(), Some("/tmp/checkpoints"));
    }

    #[test]
    fn test_invalid_env_values_rejected() {
        let loader = ConfigLoader::new();
        assert!(loader.load_with_env(env_of(&[("TRACKER_PAGE_SIZE", "many")])).is_err());
        assert!(loader.load_with_env(env_of(&[("TRACKER_PAGE_SIZE", "0")])).is_err());
        assert!(loader.load_with_env(env_of(&[("TRACKER_GAMES", "plinko,dice")])).is_err());
        assert!(loader.load_with_env(env_of(&[("TRACKER_RPC_URL", "fullnode:443")])).is_err());
    }

    #[test]
    fn test_unknown_package_override_rejected() {
        let mut config = TrackerConfig::default();
        config.games.packages.insert("dice".to_string(), "0x1".to_string());
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[polling]
page_size = 10

[games]
enabled = ["blackjack", "bls_settler"]

[games.packages]
blackjack = "0xabc"
"#
        )
        .unwrap();

        let config = ConfigLoader::new().with_path(file.path()).load_with_env(env_of(&[])).unwrap();

        assert_eq!(config.polling.page_size, 10);
        assert_eq!(config.polling.interval_ms, 1000);
        assert_eq!(config.games.enabled, vec![GameKind::Blackjack, GameKind::BlsSettler]);
        assert_eq!(config.games.packages.get("blackjack").map(String::as_str), Some("0xabc"));
    }

    #[test]
    fn test_save_and_load_config() -> TrackerResult<()> {
        let temp_file = NamedTempFile::new().unwrap();

        let mut original = TrackerConfig::default();
        original.network.network = Network::Devnet;
        original.polling.page_size = 20;
        original.games.enabled = vec![GameKind::Limbo];
        original.games.packages.insert("limbo".to_string(), "0x42".to_string());
        original.storage.checkpoint_dir = Some("./checkpoints".to_string());

        let loader = ConfigLoader::new();
        loader.save(&original, temp_file.path())?;

        let loaded = ConfigLoader::new().with_path(temp_file.path()).load_with_env(env_of(&[]))?;
        assert_eq!(loaded, original);

        Ok(())
    }

    #[test]
    fn test_sample_config_parses() {
        let sample = sample_config().unwrap();
        let parsed: TrackerConfig = toml::from_str(&sample).unwrap();
        assert_eq!(parsed, TrackerConfig::default());
    }
}
