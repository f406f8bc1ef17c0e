use crate::common::numeric::{i128_lenient, opt_u64_lenient, u64_lenient};
use crate::errors::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Signed accounting figure in base units; positive when the house keeps
/// more than it pays out.
pub type Delta = i128;

/// The only coin type settlement accounting is performed for
pub const SETTLEMENT_ASSET: &str = "0x2::sui::SUI";

/// Tracked game types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum GameKind {
    Blackjack,
    BlsSettler,
    Limbo,
    Plinko,
    Roulette,
}

impl GameKind {
    pub const ALL: [GameKind; 5] = [
        GameKind::Blackjack,
        GameKind::BlsSettler,
        GameKind::Limbo,
        GameKind::Plinko,
        GameKind::Roulette,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GameKind::Blackjack => "blackjack",
            GameKind::BlsSettler => "bls_settler",
            GameKind::Limbo => "limbo",
            GameKind::Plinko => "plinko",
            GameKind::Roulette => "roulette",
        }
    }
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameKind {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "blackjack" => Ok(GameKind::Blackjack),
            "bls_settler" | "bls" => Ok(GameKind::BlsSettler),
            "limbo" => Ok(GameKind::Limbo),
            "plinko" => Ok(GameKind::Plinko),
            "roulette" => Ok(GameKind::Roulette),
            other => Err(ConfigurationError::UnknownGame(other.to_string())),
        }
    }
}

/// Type arguments of a generic Move type.
///
/// `0xabc::mod::Event<0x2::sui::SUI, u64>` yields `["0x2::sui::SUI", "u64"]`;
/// a non-generic type yields nothing. Nested generics stay intact.
pub fn extract_generic_types(event_type: &str) -> Vec<&str> {
    let Some(open) = event_type.find('<') else {
        return Vec::new();
    };
    let inner = event_type[open + 1..].strip_suffix('>').unwrap_or(&event_type[open + 1..]);

    let mut args = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, ch) in inner.char_indices() {
        match ch {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                args.push(inner[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    let last = inner[start..].trim();
    if !last.is_empty() {
        args.push(last);
    }
    args
}

/// Whether the event's coin type argument is the settlement asset
pub fn is_settlement_asset(event_type: &str) -> bool {
    extract_generic_types(event_type).first() == Some(&SETTLEMENT_ASSET)
}

// Settlement payloads as emitted by each game module. Only the fields the
// accounting needs are declared; everything else in `parsedJson` is ignored.

/// One player hand in a blackjack round
#[derive(Debug, Clone, Deserialize)]
pub struct BlackjackHand {
    #[serde(default, deserialize_with = "opt_u64_lenient")]
    pub bet_size: Option<u64>,
    #[serde(default)]
    pub cards: Vec<u8>,
    #[serde(default, deserialize_with = "opt_u64_lenient")]
    pub current_sum: Option<u64>,
    #[serde(default)]
    pub is_natural_blackjack: bool,
}

/// `GameOutcome` event of the single-deck blackjack module
#[derive(Debug, Clone, Deserialize)]
pub struct BlackjackOutcome {
    /// Round-level stake, used for hands that do not carry their own
    #[serde(default, deserialize_with = "opt_u64_lenient")]
    pub bet_size: Option<u64>,
    pub dealer_cards: Vec<u8>,
    pub player_hands: Vec<BlackjackHand>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlsSettlement {
    #[serde(deserialize_with = "u64_lenient")]
    pub bet_size: u64,
    #[serde(deserialize_with = "u64_lenient")]
    pub payout_amount: u64,
    pub player_won: bool,
}

/// `SettlementEvent` of the BLS settler module
#[derive(Debug, Clone, Deserialize)]
pub struct BlsSettlementEvent {
    pub settlements: Vec<BlsSettlement>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LimboResult {
    #[serde(deserialize_with = "u64_lenient")]
    pub bet_size: u64,
    #[serde(deserialize_with = "u64_lenient")]
    pub bet_returned: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LimboOutcome {
    pub results: Vec<LimboResult>,
}

/// `Outcome` event of the plinko module. `pnl` is the net figure the
/// contract computed for the whole drop.
#[derive(Debug, Clone, Deserialize)]
pub struct PlinkoOutcome {
    #[serde(deserialize_with = "u64_lenient")]
    pub bet_size: u64,
    #[serde(deserialize_with = "u64_lenient")]
    pub ball_count: u64,
    #[serde(deserialize_with = "i128_lenient")]
    pub pnl: i128,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RouletteBetResult {
    #[serde(deserialize_with = "u64_lenient")]
    pub bet_size: u64,
    #[serde(deserialize_with = "u64_lenient")]
    pub bet_type: u64,
    pub is_win: bool,
}

/// `GameSettlement` event of the roulette module
#[derive(Debug, Clone, Deserialize)]
pub struct RouletteSettlement {
    pub bet_results: Vec<RouletteBetResult>,
}
