/*!
 * Sliding Window Tests
 */

use loglens::{LogEntry, LogLevel, SlidingWindow};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

fn base() -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(1_700_000_000)
}

fn entry(ts: SystemTime, level: LogLevel) -> LogEntry {
    LogEntry::new(ts, level, "10.0.0.1")
}

fn error(ts: SystemTime, error_type: &str) -> LogEntry {
    entry(ts, LogLevel::Error).with_error_type(error_type)
}

#[test]
fn test_window_holds_exactly_the_horizon() {
    // 100 entries spanning 90 seconds against a 60 second window:
    // after the final add only the last 60 seconds survive
    let start = base();
    let window = SlidingWindow::new(60);

    let mut final_now = start;
    for i in 0..100u64 {
        let ts = start + Duration::from_millis(i * 900);
        window.add(entry(ts, LogLevel::Info), ts);
        final_now = ts;
    }

    let cutoff = final_now - Duration::from_secs(60);
    let expected = (0..100u64)
        .filter(|i| start + Duration::from_millis(i * 900) >= cutoff)
        .count() as u64;

    let (total, level_counts, _) = window.get_stats();
    assert_eq!(total, expected);
    assert_eq!(level_counts.values().sum::<u64>(), total);
}

#[test]
fn test_level_counts_follow_adds_and_evictions() {
    let start = base();
    let window = SlidingWindow::new(60);

    window.add(entry(start, LogLevel::Debug), start);
    let (_, levels, _) = window.get_stats();
    assert_eq!(levels.get(&LogLevel::Debug), Some(&1));

    // 61 seconds later the add-side eviction removes it
    let later = start + Duration::from_secs(61);
    window.add(entry(later, LogLevel::Info), later);
    let (total, levels, _) = window.get_stats();
    assert_eq!(total, 1);
    assert_eq!(levels.get(&LogLevel::Debug), Some(&0));
    assert_eq!(levels.get(&LogLevel::Info), Some(&1));
}

#[test]
fn test_error_counts_match_error_lists() {
    let start = base();
    let window = SlidingWindow::new(120);

    for i in 0..10u64 {
        let ts = start + Duration::from_secs(i);
        window.add(error(ts, "DbTimeout"), ts);
    }
    for i in 10..13u64 {
        let ts = start + Duration::from_secs(i);
        window.add(error(ts, "AuthFailed"), ts);
    }

    let now = start + Duration::from_secs(13);
    let (_, _, errors) = window.get_stats();
    assert_eq!(errors.get("DbTimeout"), Some(&10));
    assert_eq!(errors.get("AuthFailed"), Some(&3));

    // Rates agree with the counts over a horizon covering everything
    let rate = window.get_error_rate("DbTimeout", 120, now);
    assert!((rate - 10.0 / 120.0).abs() < 1e-9);
}

#[test]
fn test_rate_change_formula_table() {
    let now = base() + Duration::from_secs(1000);
    let window = SlidingWindow::new(600);

    // Entries inserted oldest first; all queries observe at `now`
    for (secs_ago, error_type) in [
        (100u64, "stale"),
        (25, "steady"),
        (20, "double"),
        (10, "double"),
        (8, "steady"),
        (5, "double"),
        (3, "fresh"),
    ] {
        window.add(error(now - Duration::from_secs(secs_ago), error_type), now);
    }

    // Unknown type and both-empty intervals -> 0
    assert_eq!(window.get_error_change("none", 15, 15, now), 0.0);
    assert_eq!(window.get_error_change("stale", 15, 15, now), 0.0);

    // recent = 2 * prev > 0 -> 100
    assert_eq!(window.get_error_change("double", 15, 15, now), 100.0);

    // recent > 0, prev = 0 -> 100
    assert_eq!(window.get_error_change("fresh", 15, 15, now), 100.0);

    // recent = prev > 0 -> 0
    assert_eq!(window.get_error_change("steady", 15, 15, now), 0.0);
}

#[test]
fn test_shrinking_window_evicts_growing_does_not() {
    let start = base();
    let window = SlidingWindow::new(120);

    for i in 0..12u64 {
        let ts = start + Duration::from_secs(i * 10);
        window.add(entry(ts, LogLevel::Info), ts);
    }
    let now = start + Duration::from_secs(110);

    window.set_duration(30, now);
    let (total, _, _) = window.get_stats();
    // Only entries at 80, 90, 100, 110 seconds are within 30 s of now
    assert_eq!(total, 4);

    window.set_duration(120, now);
    let (total, _, _) = window.get_stats();
    assert_eq!(total, 4);
}

#[test]
fn test_queries_on_unknown_types_are_zero() {
    let window = SlidingWindow::new(60);
    let now = base();
    assert_eq!(window.get_error_rate("ghost", 10, now), 0.0);
    assert_eq!(window.get_error_change("ghost", 15, 15, now), 0.0);
}
