//! Blackjack hand evaluation
//!
//! Cards are deck indices `0..52`; the rank is `card % 13` with rank 0 the
//! ace, ranks 1-9 the pip cards two through ten and ranks 10-12 the faces.

use serde::{Deserialize, Serialize};

pub const BLACKJACK: u32 = 21;

/// Hard value of a single card (aces count 1)
pub fn card_value(card: u8) -> u32 {
    match card % 13 {
        0 => 1,
        rank @ 1..=9 => rank as u32 + 1,
        _ => 10,
    }
}

/// Best total of a hand: one ace is promoted to 11 when that keeps the
/// total at or under 21.
pub fn hand_value(cards: &[u8]) -> u32 {
    let hard: u32 = cards.iter().map(|&c| card_value(c)).sum();
    let has_ace = cards.iter().any(|&c| c % 13 == 0);

    if has_ace && hard + 10 <= BLACKJACK {
        hard + 10
    } else {
        hard
    }
}

/// Two-card 21
pub fn is_natural(cards: &[u8]) -> bool {
    cards.len() == 2 && hand_value(cards) == BLACKJACK
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandResult {
    Win,
    Push,
    Lose,
}

/// Resolve one player hand against the dealer's final total.
///
/// Only the dealer total takes part, so a player natural wins against any
/// dealer hand, including a dealer 21.
pub fn resolve_hand(dealer_total: u32, player_total: u32, player_natural: bool) -> HandResult {
    if player_total > BLACKJACK {
        return HandResult::Lose;
    }
    if player_natural {
        return HandResult::Win;
    }
    if dealer_total > BLACKJACK {
        return HandResult::Win;
    }

    match player_total.cmp(&dealer_total) {
        std::cmp::Ordering::Greater => HandResult::Win,
        std::cmp::Ordering::Equal => HandResult::Push,
        std::cmp::Ordering::Less => HandResult::Lose,
    }
}

/// Amount returned to the player for a resolved hand. A winning natural pays
/// 3:2 on top of the stake, truncated to whole base units.
pub fn payout(stake: u64, result: HandResult, natural: bool) -> u128 {
    let stake = stake as u128;
    match result {
        HandResult::Win if natural => stake * 5 / 2,
        HandResult::Win => stake * 2,
        HandResult::Push => stake,
        HandResult::Lose => 0,
    }
}
