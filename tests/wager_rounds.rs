/// Dice wager payouts, limits and roll distribution
mod common;

use chrono::{Duration, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;

use arena_economy::economy::{
    play_wager_round, DiceRoller, EconomyError, RngDice, WagerOutcome, WagerRules,
};
use arena_economy::profile::{PlayerId, PlayerProfile};
use common::ScriptedDice;

fn round_with(faces: &[u8]) -> (PlayerProfile, WagerOutcome) {
    let mut profile = PlayerProfile::new(PlayerId(9), 100);
    let mut last = None;
    let round = play_wager_round(
        &mut profile,
        &mut last,
        50,
        &WagerRules::default(),
        Utc::now(),
        &mut ScriptedDice::new(faces),
    )
    .unwrap();
    assert_eq!(round.balance_after, profile.token_balance);
    (profile, round.outcome)
}

#[test]
fn test_bet_50_from_100_exact_balances() {
    let (win, outcome) = round_with(&[5, 2]);
    assert_eq!(outcome, WagerOutcome::Win { payout: 100 });
    assert_eq!(win.token_balance, 150);

    let (lose, outcome) = round_with(&[1, 6]);
    assert_eq!(outcome, WagerOutcome::Lose);
    assert_eq!(lose.token_balance, 50);

    let (tie, outcome) = round_with(&[4, 4]);
    assert_eq!(outcome, WagerOutcome::Tie);
    assert_eq!(tie.token_balance, 100);
}

#[test]
fn test_second_round_inside_cooldown_rejected() {
    let mut profile = PlayerProfile::new(PlayerId(10), 100);
    let mut last = None;
    let rules = WagerRules::default();
    let start = Utc::now();
    let mut dice = ScriptedDice::new(&[3, 3, 2, 1]);

    play_wager_round(&mut profile, &mut last, 10, &rules, start, &mut dice).unwrap();
    let err = play_wager_round(
        &mut profile,
        &mut last,
        10,
        &rules,
        start + Duration::seconds(29),
        &mut dice,
    )
    .unwrap_err();
    assert_eq!(err, EconomyError::CooldownActive { remaining_secs: 1 });
    assert_eq!(profile.token_balance, 100);

    let round = play_wager_round(
        &mut profile,
        &mut last,
        10,
        &rules,
        start + Duration::seconds(30),
        &mut dice,
    )
    .unwrap();
    assert_eq!(round.outcome, WagerOutcome::Win { payout: 20 });
    assert_eq!(profile.token_balance, 110);
}

#[test]
fn test_out_of_range_bets_report_limits() {
    let mut profile = PlayerProfile::new(PlayerId(11), 1000);
    let mut last = None;
    let err = play_wager_round(
        &mut profile,
        &mut last,
        101,
        &WagerRules::default(),
        Utc::now(),
        &mut ScriptedDice::new(&[]),
    )
    .unwrap_err();
    assert_eq!(
        err,
        EconomyError::InvalidBetRange {
            bet: 101,
            min: 10,
            max: 100
        }
    );
    assert_eq!(profile.token_balance, 1000);
}

#[test]
fn test_roll_ties_occur_one_sixth_of_the_time() {
    let mut dice = RngDice(StdRng::seed_from_u64(20_240_601));
    let trials = 60_000;
    let mut ties = 0;
    let mut faces = [0u32; 7];
    for _ in 0..trials {
        let player = dice.roll();
        let house = dice.roll();
        assert!((1..=6).contains(&player) && (1..=6).contains(&house));
        faces[player as usize] += 1;
        if player == house {
            ties += 1;
        }
    }
    let rate = ties as f64 / trials as f64;
    assert!((rate - 1.0 / 6.0).abs() < 0.01, "tie rate {}", rate);
    for face in 1..=6 {
        let share = faces[face] as f64 / trials as f64;
        assert!((share - 1.0 / 6.0).abs() < 0.01, "face {} share {}", face, share);
    }
}

#[test]
fn test_many_rounds_conserve_tokens() {
    let rules = WagerRules {
        cooldown: Duration::zero(),
        ..WagerRules::default()
    };
    let mut dice = RngDice(StdRng::seed_from_u64(7));
    let mut profile = PlayerProfile::new(PlayerId(12), 10_000);
    let mut last = None;
    let now = Utc::now();
    let mut expected = 10_000i64;
    for _ in 0..2_000 {
        let round =
            play_wager_round(&mut profile, &mut last, 25, &rules, now, &mut dice).unwrap();
        expected += match round.outcome {
            WagerOutcome::Win { payout } => payout as i64 - 25,
            WagerOutcome::Lose => -25,
            WagerOutcome::Tie => 0,
        };
        assert_eq!(profile.token_balance as i64, expected);
    }
}
