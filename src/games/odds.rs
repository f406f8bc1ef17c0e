//! Roulette bet-category payout odds

/// Gross payout multiple for a roulette bet category. Unknown categories
/// pay nothing.
pub fn bet_type_odds(bet_type: u64) -> u64 {
    match bet_type {
        0 | 1 => 2,
        2 => 36,
        3 | 4 => 2,
        5..=7 => 3,
        8 | 9 => 2,
        10..=12 => 3,
        _ => 0,
    }
}
