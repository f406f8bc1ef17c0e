//! Settlement decoders
//!
//! One pure decoder per game module. A decoder looks at a page of events,
//! keeps the ones emitted as `{module}::{EventName}` for the settlement asset,
//! and scores each into a signed delta (stake collected minus payout). Every
//! event yields its own [`EventOutcome`] so a malformed payload only costs
//! that event.

use super::hand;
use super::odds::bet_type_odds;
use super::types::*;
use crate::feed::{EventEnvelope, EventId};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

/// Why a single event could not be scored
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError {
    #[error("Malformed {game} payload: {reason}")]
    MalformedPayload { game: GameKind, reason: String },

    #[error("Arithmetic overflow while scoring {game} event")]
    Overflow { game: GameKind },
}

/// A decode failure tied to the offending event
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeFailure {
    pub event_id: EventId,
    pub error: DecodeError,
}

/// Result of decoding one event
#[derive(Debug, Clone, PartialEq)]
pub enum EventOutcome {
    Scored(Delta),
    /// Other event type, other asset, or no parsed payload
    Skipped,
    Failed(DecodeError),
}

/// Aggregate over one page of events
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchDecode {
    pub delta: Delta,
    pub scored: usize,
    pub skipped: usize,
    pub failures: Vec<DecodeFailure>,
}

impl BatchDecode {
    pub fn record(&mut self, event_id: &EventId, outcome: EventOutcome) {
        match outcome {
            EventOutcome::Scored(delta) => {
                self.delta = self.delta.saturating_add(delta);
                self.scored += 1;
            }
            EventOutcome::Skipped => self.skipped += 1,
            EventOutcome::Failed(error) => self.failures.push(DecodeFailure {
                event_id: event_id.clone(),
                error,
            }),
        }
    }

    pub fn events_seen(&self) -> usize {
        self.scored + self.skipped + self.failures.len()
    }
}

/// Decode-and-score capability shared by every game module.
///
/// Implementations are pure: the same events always produce the same
/// [`BatchDecode`].
pub trait SettlementDecoder: Send + Sync {
    fn game(&self) -> GameKind;

    /// Name of the settlement event inside the module
    fn event_name(&self) -> &'static str;

    /// Score one parsed payload
    fn score(&self, payload: &Value) -> Result<Delta, DecodeError>;

    fn accepts(&self, event_type: &str, module_type: &str) -> bool {
        let qualified = format!("{}::{}", module_type, self.event_name());
        event_type.contains(&qualified) && is_settlement_asset(event_type)
    }

    fn decode_event(&self, event: &EventEnvelope, module_type: &str) -> EventOutcome {
        if !self.accepts(&event.event_type, module_type) {
            return EventOutcome::Skipped;
        }

        match &event.parsed_json {
            Some(payload) => match self.score(payload) {
                Ok(delta) => EventOutcome::Scored(delta),
                Err(e) => EventOutcome::Failed(e),
            },
            None => EventOutcome::Skipped,
        }
    }

    fn decode(&self, events: &[EventEnvelope], module_type: &str) -> BatchDecode {
        let mut batch = BatchDecode::default();
        for event in events {
            batch.record(&event.id, self.decode_event(event, module_type));
        }
        batch
    }
}

/// Decoder for a built-in game
pub fn decoder_for(game: GameKind) -> Arc<dyn SettlementDecoder> {
    match game {
        GameKind::Blackjack => Arc::new(BlackjackDecoder),
        GameKind::BlsSettler => Arc::new(BlsSettlerDecoder),
        GameKind::Limbo => Arc::new(LimboDecoder),
        GameKind::Plinko => Arc::new(PlinkoDecoder),
        GameKind::Roulette => Arc::new(RouletteDecoder),
    }
}

fn parse<T: DeserializeOwned>(game: GameKind, payload: &Value) -> Result<T, DecodeError> {
    serde_json::from_value(payload.clone()).map_err(|e| DecodeError::MalformedPayload {
        game,
        reason: e.to_string(),
    })
}

fn accumulate(game: GameKind, total: Delta, contribution: Option<Delta>) -> Result<Delta, DecodeError> {
    contribution
        .and_then(|c| total.checked_add(c))
        .ok_or(DecodeError::Overflow { game })
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BlackjackDecoder;

impl SettlementDecoder for BlackjackDecoder {
    fn game(&self) -> GameKind {
        GameKind::Blackjack
    }

    fn event_name(&self) -> &'static str {
        "GameOutcome"
    }

    fn score(&self, payload: &Value) -> Result<Delta, DecodeError> {
        let outcome: BlackjackOutcome = parse(self.game(), payload)?;
        let dealer_total = hand::hand_value(&outcome.dealer_cards);

        let mut delta: Delta = 0;
        for player in &outcome.player_hands {
            let stake = player
                .bet_size
                .filter(|s| *s > 0)
                .or(outcome.bet_size)
                .unwrap_or(0);

            // Cards are authoritative; the reported sum covers payloads without them
            let total = if player.cards.is_empty() {
                player
                    .current_sum
                    .map(|s| u32::try_from(s).unwrap_or(u32::MAX))
                    .unwrap_or(0)
            } else {
                hand::hand_value(&player.cards)
            };

            let result = hand::resolve_hand(dealer_total, total, player.is_natural_blackjack);
            let paid = hand::payout(stake, result, player.is_natural_blackjack);
            let contribution = i128::try_from(paid).ok().map(|p| stake as i128 - p);
            delta = accumulate(self.game(), delta, contribution)?;
        }

        Ok(delta)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BlsSettlerDecoder;

impl SettlementDecoder for BlsSettlerDecoder {
    fn game(&self) -> GameKind {
        GameKind::BlsSettler
    }

    fn event_name(&self) -> &'static str {
        "SettlementEvent"
    }

    fn score(&self, payload: &Value) -> Result<Delta, DecodeError> {
        let event: BlsSettlementEvent = parse(self.game(), payload)?;

        event.settlements.iter().try_fold(0, |total, s| {
            let contribution = if s.player_won {
                -(s.payout_amount as i128)
            } else {
                s.bet_size as i128
            };
            accumulate(self.game(), total, Some(contribution))
        })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LimboDecoder;

impl SettlementDecoder for LimboDecoder {
    fn game(&self) -> GameKind {
        GameKind::Limbo
    }

    fn event_name(&self) -> &'static str {
        "Outcome"
    }

    fn score(&self, payload: &Value) -> Result<Delta, DecodeError> {
        let outcome: LimboOutcome = parse(self.game(), payload)?;

        outcome.results.iter().try_fold(0, |total, r| {
            accumulate(self.game(), total, Some(r.bet_size as i128 - r.bet_returned as i128))
        })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PlinkoDecoder;

impl SettlementDecoder for PlinkoDecoder {
    fn game(&self) -> GameKind {
        GameKind::Plinko
    }

    fn event_name(&self) -> &'static str {
        "Outcome"
    }

    /// Total stake over all balls minus the pnl the contract reported.
    fn score(&self, payload: &Value) -> Result<Delta, DecodeError> {
        let outcome: PlinkoOutcome = parse(self.game(), payload)?;

        let wagered = (outcome.bet_size as i128).checked_mul(outcome.ball_count as i128);
        accumulate(self.game(), 0, wagered.and_then(|w| w.checked_sub(outcome.pnl)))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RouletteDecoder;

impl SettlementDecoder for RouletteDecoder {
    fn game(&self) -> GameKind {
        GameKind::Roulette
    }

    fn event_name(&self) -> &'static str {
        "GameSettlement"
    }

    fn score(&self, payload: &Value) -> Result<Delta, DecodeError> {
        let settlement: RouletteSettlement = parse(self.game(), payload)?;

        settlement.bet_results.iter().try_fold(0, |total, bet| {
            let stake = bet.bet_size as i128;
            let contribution = if bet.is_win {
                (bet_type_odds(bet.bet_type) as i128)
                    .checked_mul(stake)
                    .map(|paid| stake - paid)
            } else {
                Some(stake)
            };
            accumulate(self.game(), total, contribution)
        })
    }
}
