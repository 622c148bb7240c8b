/// Sliding-window throttle behaviour with the default 5 actions per second
use std::thread;
use std::time::{Duration, Instant};

use arena_economy::config::RateLimitConfig;
use arena_economy::profile::PlayerId;
use arena_economy::ratelimit::RateLimiter;

#[test]
fn test_five_per_second_then_recovers() {
    let limiter = RateLimiter::from_config(&RateLimitConfig::default());
    let id = PlayerId(42);
    let start = Instant::now();
    for n in 0..5 {
        assert!(limiter.allow_at(id, start), "call {} should pass", n + 1);
    }
    assert!(!limiter.allow_at(id, start + Duration::from_millis(900)));
    assert!(limiter.allow_at(id, start + Duration::from_millis(1_100)));
}

#[test]
fn test_any_one_second_span_admits_at_most_five() {
    let limiter = RateLimiter::default();
    let id = PlayerId(43);
    let start = Instant::now();
    let mut accepted = Vec::new();
    // One attempt every 100ms for 3 seconds
    for step in 0..30u64 {
        let at = start + Duration::from_millis(step * 100);
        if limiter.allow_at(id, at) {
            accepted.push(at);
        }
    }
    for (i, first) in accepted.iter().enumerate() {
        let in_span = accepted[i..]
            .iter()
            .take_while(|t| t.duration_since(*first) < Duration::from_secs(1))
            .count();
        assert!(in_span <= 5, "{} accepted within 1s of {:?}", in_span, first);
    }
    assert!(accepted.len() >= 10);
}

#[test]
fn test_concurrent_callers_share_one_budget() {
    let limiter = RateLimiter::new(5, Duration::from_secs(60));
    let id = PlayerId(44);
    let handles: Vec<_> = (0..10)
        .map(|_| {
            let limiter = limiter.clone();
            thread::spawn(move || limiter.allow(id))
        })
        .collect();
    let passed = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|ok| *ok)
        .count();
    assert_eq!(passed, 5);
}
