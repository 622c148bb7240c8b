//! Dice wager mini-game.
//!
//! Overview
//! - Player stakes `bet` tokens (inclusive range, 10-100 by default)
//! - Player and house each roll one six-sided die
//! - Higher player roll pays 2×bet, lower pays nothing, equal refunds the bet
//! - One round per player every 30 seconds; the cooldown lives on the session
//!
//! Check order: cooldown, bet range, funds. The bet is deducted and the
//! cooldown stamped before the dice are rolled, so a round is never free to
//! retry.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use std::fmt;

use super::EconomyError;
use crate::config::WagerConfig;
use crate::metrics;
use crate::profile::PlayerProfile;

/// Source of die faces in `1..=6`.
pub trait DiceRoller {
    fn roll(&mut self) -> u8;
}

/// Rolls from the thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadDice;

impl DiceRoller for ThreadDice {
    fn roll(&mut self) -> u8 {
        rand::thread_rng().gen_range(1..=6)
    }
}

/// Rolls from a caller-supplied RNG (seeded in tests and simulations).
#[derive(Debug, Clone)]
pub struct RngDice<R>(pub R);

impl<R: Rng> DiceRoller for RngDice<R> {
    fn roll(&mut self) -> u8 {
        self.0.gen_range(1..=6)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WagerRules {
    pub min_bet: u64,
    pub max_bet: u64,
    pub cooldown: Duration,
}

impl Default for WagerRules {
    fn default() -> Self {
        Self::from(&WagerConfig::default())
    }
}

impl From<&WagerConfig> for WagerRules {
    fn from(config: &WagerConfig) -> Self {
        Self {
            min_bet: config.min_bet,
            max_bet: config.max_bet,
            cooldown: Duration::seconds(config.cooldown_secs as i64),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WagerOutcome {
    Win { payout: u64 },
    Lose,
    Tie,
}

impl fmt::Display for WagerOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WagerOutcome::Win { payout } => write!(f, "win ({} paid)", payout),
            WagerOutcome::Lose => write!(f, "lose"),
            WagerOutcome::Tie => write!(f, "tie (bet refunded)"),
        }
    }
}

/// Everything that happened in one accepted round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WagerRound {
    pub bet: u64,
    pub player_roll: u8,
    pub house_roll: u8,
    pub outcome: WagerOutcome,
    pub balance_after: u64,
}

/// Play one round against the house.
///
/// `last_round` is the session's cooldown stamp; it is set to `now` when the
/// round is accepted.
pub fn play_wager_round<D: DiceRoller + ?Sized>(
    profile: &mut PlayerProfile,
    last_round: &mut Option<DateTime<Utc>>,
    bet: i64,
    rules: &WagerRules,
    now: DateTime<Utc>,
    dice: &mut D,
) -> Result<WagerRound, EconomyError> {
    if let Some(previous) = *last_round {
        let elapsed = now.signed_duration_since(previous);
        if elapsed < rules.cooldown {
            return Err(EconomyError::CooldownActive {
                remaining_secs: rules.cooldown.num_seconds() - elapsed.num_seconds(),
            });
        }
    }

    let stake = u64::try_from(bet)
        .ok()
        .filter(|b| (rules.min_bet..=rules.max_bet).contains(b))
        .ok_or(EconomyError::InvalidBetRange {
            bet,
            min: rules.min_bet,
            max: rules.max_bet,
        })?;
    if profile.token_balance < stake {
        return Err(EconomyError::InsufficientFunds {
            needed: stake,
            available: profile.token_balance,
        });
    }

    profile.token_balance -= stake;
    *last_round = Some(now);

    let player_roll = dice.roll();
    let house_roll = dice.roll();
    let outcome = if player_roll > house_roll {
        metrics::inc_wager_win();
        WagerOutcome::Win { payout: stake * 2 }
    } else if player_roll < house_roll {
        metrics::inc_wager_loss();
        WagerOutcome::Lose
    } else {
        metrics::inc_wager_tie();
        WagerOutcome::Tie
    };
    profile.token_balance += match outcome {
        WagerOutcome::Win { payout } => payout,
        WagerOutcome::Tie => stake,
        WagerOutcome::Lose => 0,
    };

    Ok(WagerRound {
        bet: stake,
        player_roll,
        house_roll,
        outcome,
        balance_after: profile.token_balance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::PlayerId;

    struct Scripted(Vec<u8>);

    impl DiceRoller for Scripted {
        fn roll(&mut self) -> u8 {
            self.0.remove(0)
        }
    }

    #[test]
    fn test_cooldown_checked_before_bet_range() {
        let mut profile = PlayerProfile::new(PlayerId(1), 100);
        let now = Utc::now();
        let mut last = Some(now - Duration::seconds(10));
        let err = play_wager_round(
            &mut profile,
            &mut last,
            5000,
            &WagerRules::default(),
            now,
            &mut Scripted(vec![]),
        )
        .unwrap_err();
        assert_eq!(err, EconomyError::CooldownActive { remaining_secs: 20 });
        assert_eq!(profile.token_balance, 100);
    }

    #[test]
    fn test_bet_bounds_are_inclusive() {
        let rules = WagerRules::default();
        let now = Utc::now();
        for (bet, ok) in [(9, false), (10, true), (100, true), (101, false), (-10, false)] {
            let mut profile = PlayerProfile::new(PlayerId(2), 1000);
            let mut last = None;
            let result = play_wager_round(
                &mut profile,
                &mut last,
                bet,
                &rules,
                now,
                &mut Scripted(vec![3, 3]),
            );
            assert_eq!(result.is_ok(), ok, "bet {}", bet);
            assert_eq!(last.is_some(), ok);
        }
    }

    #[test]
    fn test_rejected_round_does_not_stamp_cooldown() {
        let mut profile = PlayerProfile::new(PlayerId(3), 5);
        let mut last = None;
        let err = play_wager_round(
            &mut profile,
            &mut last,
            10,
            &WagerRules::default(),
            Utc::now(),
            &mut Scripted(vec![]),
        )
        .unwrap_err();
        assert!(matches!(err, EconomyError::InsufficientFunds { .. }));
        assert!(last.is_none());
        assert_eq!(profile.token_balance, 5);
    }

    #[test]
    fn test_round_allowed_once_cooldown_elapsed() {
        let mut profile = PlayerProfile::new(PlayerId(4), 100);
        let now = Utc::now();
        let mut last = Some(now - Duration::seconds(30));
        let round = play_wager_round(
            &mut profile,
            &mut last,
            10,
            &WagerRules::default(),
            now,
            &mut Scripted(vec![1, 6]),
        )
        .unwrap();
        assert_eq!(round.outcome, WagerOutcome::Lose);
        assert_eq!(round.balance_after, 90);
        assert_eq!(last, Some(now));
    }
}
