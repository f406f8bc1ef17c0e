//! Tracked game registry
//!
//! Built once at startup and handed to the polling engine by reference.

use super::decoders::{decoder_for, SettlementDecoder};
use super::types::GameKind;
use crate::config::GamesConfig;
use crate::errors::{ConfigurationError, TrackerResult};
use crate::feed::EventFilter;
use std::fmt;
use std::sync::Arc;

/// Published package and module of a built-in game
pub fn builtin_module(game: GameKind) -> (&'static str, &'static str) {
    match game {
        GameKind::Blackjack => (
            "0xbdec0470a0b3c4a1cd3d2ac3b7eb10af57db23e2dffcdf001f1f04f6eb79e065",
            "single_deck_blackjack",
        ),
        GameKind::BlsSettler => (
            "0xf0978635bb456d2cb2e594cd4a018c9aed486d6cb68c7890abe5ef56838034bf",
            "bls_settler",
        ),
        GameKind::Limbo => (
            "0xbca3313d753bba2e3b3d911d2306c5024de99dfdb2fc456850186b18867ac36c",
            "limbo",
        ),
        GameKind::Plinko => (
            "0x1513ee1a47bb1e3b78162f42510f3eece3c6ab0b246bdafda47f939cf7a81c07",
            "plinko",
        ),
        GameKind::Roulette => (
            "0x97edb657c1fc47e02b1c6603fcdf82974b149f6b9bb8e3ade69c6ec94f3003f1",
            "roulette_events",
        ),
    }
}

/// One tracked game module and the decoder for its settlement events
#[derive(Clone)]
pub struct GameDescriptor {
    id: GameKind,
    package_id: String,
    module_name: String,
    decoder: Arc<dyn SettlementDecoder>,
}

impl GameDescriptor {
    pub fn new(id: GameKind, package_id: impl Into<String>, module_name: impl Into<String>) -> Self {
        Self {
            id,
            package_id: package_id.into(),
            module_name: module_name.into(),
            decoder: decoder_for(id),
        }
    }

    pub fn builtin(id: GameKind) -> Self {
        let (package_id, module_name) = builtin_module(id);
        Self::new(id, package_id, module_name)
    }

    pub fn id(&self) -> GameKind {
        self.id
    }

    pub fn package_id(&self) -> &str {
        &self.package_id
    }

    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    pub fn decoder(&self) -> &dyn SettlementDecoder {
        self.decoder.as_ref()
    }

    /// `package::module`, the prefix of every event type the module emits
    pub fn module_type(&self) -> String {
        format!("{}::{}", self.package_id, self.module_name)
    }

    pub fn filter(&self) -> EventFilter {
        EventFilter::module(self.package_id.clone(), self.module_name.clone())
    }
}

impl fmt::Debug for GameDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameDescriptor")
            .field("id", &self.id)
            .field("package_id", &self.package_id)
            .field("module_name", &self.module_name)
            .field("event", &self.decoder.event_name())
            .finish()
    }
}

/// Immutable set of tracked games
#[derive(Debug, Clone, Default)]
pub struct GameRegistry {
    games: Vec<GameDescriptor>,
}

impl GameRegistry {
    pub fn new(games: Vec<GameDescriptor>) -> Self {
        Self { games }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Every built-in game at its published address
    pub fn builtin() -> Self {
        Self::new(GameKind::ALL.iter().copied().map(GameDescriptor::builtin).collect())
    }

    /// Games enabled in configuration, with package overrides applied
    pub fn from_config(config: &GamesConfig) -> TrackerResult<Self> {
        let mut games: Vec<GameDescriptor> = Vec::with_capacity(config.enabled.len());

        for &id in &config.enabled {
            if games.iter().any(|g| g.id == id) {
                return Err(ConfigurationError::ValidationFailed(format!("game {} enabled twice", id)).into());
            }

            let (default_package, module_name) = builtin_module(id);
            let package_id = config
                .packages
                .get(id.as_str())
                .map(String::as_str)
                .unwrap_or(default_package);

            if !package_id.starts_with("0x") {
                return Err(ConfigurationError::InvalidValue {
                    field: format!("games.packages.{}", id),
                    value: package_id.to_string(),
                    reason: "package address must start with 0x".to_string(),
                }
                .into());
            }

            games.push(GameDescriptor::new(id, package_id, module_name));
        }

        Ok(Self::new(games))
    }

    pub fn tracked_games(&self) -> &[GameDescriptor] {
        &self.games
    }

    pub fn get(&self, id: GameKind) -> Option<&GameDescriptor> {
        self.games.iter().find(|g| g.id == id)
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }
}
