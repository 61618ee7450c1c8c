/*!
 * Pattern Tracker Tests
 */

use loglens::{LogEntry, LogLevel, PatternTracker, SlidingWindow};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

fn base() -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(1_700_000_000)
}

fn error(ts: SystemTime, error_type: &str) -> LogEntry {
    LogEntry::new(ts, LogLevel::Error, "10.0.0.1").with_error_type(error_type)
}

/// Drive one error type at a fixed per-second rate across an interval,
/// keeping the window and tracker in sync
fn feed(
    window: &SlidingWindow,
    tracker: &PatternTracker,
    error_type: &str,
    from: SystemTime,
    seconds: u64,
    per_second: u64,
) -> SystemTime {
    let mut now = from;
    for second in 0..seconds {
        for i in 0..per_second {
            let ts = from + Duration::from_secs(second) + Duration::from_millis(i * 1000 / per_second);
            now = ts;
            let entry = error(ts, error_type);
            window.add(entry.clone(), ts);
            tracker.update(&entry, ts, window);
        }
    }
    now
}

#[test]
fn test_spike_rule_triples_weight_on_quadrupled_rate() {
    let t0 = base();
    let window = SlidingWindow::new(120);
    let tracker = PatternTracker::new();

    // ~2/s for 12 seconds: the rotation at the 10 s mark samples a
    // positive baseline rate
    let end = feed(&window, &tracker, "X", t0, 12, 2);

    // Jump to ~10/s; the next rotation sees at least a 4x rate
    let surge_start = end + Duration::from_secs(1);
    feed(&window, &tracker, "X", surge_start, 12, 10);

    let top = tracker.top_errors(1);
    assert_eq!(top[0].error_type, "X");
    assert!(top[0].weight >= 3.0, "weight was {}", top[0].weight);
}

#[test]
fn test_weight_stays_zero_without_spike() {
    let t0 = base();
    let window = SlidingWindow::new(120);
    let tracker = PatternTracker::new();

    // A flat rate rotates the history but never quadruples
    feed(&window, &tracker, "X", t0, 40, 3);

    let top = tracker.top_errors(1);
    assert_eq!(top[0].weight, 0.0);
}

#[test]
fn test_emerging_pattern_reports_percent_change() {
    let t0 = base();
    let window = SlidingWindow::new(120);
    let tracker = PatternTracker::new();

    // 10/s for 15 s, then 50/s for 15 s: the recent interval carries
    // 750 against 150, a 400% increase
    let end = feed(&window, &tracker, "X", t0, 15, 10);
    let surge_start = end + Duration::from_millis(100);
    let observed = feed(&window, &tracker, "X", surge_start, 15, 50);

    let emerging = tracker.emerging_patterns(observed, &window);
    let change = emerging.get("X").copied().expect("X should be emerging");
    assert!((change - 400.0).abs() < 5.0, "change was {}", change);

    let history = tracker.history();
    assert_eq!(history.len(), 1);
    assert!((history[0].peak_change - change).abs() < 1e-9);
}

#[test]
fn test_history_cap_drops_oldest() {
    let t0 = base();
    let window = SlidingWindow::new(600);
    let tracker = PatternTracker::new();

    // Per pattern: one entry in the prior interval, three in the
    // recent one, a 200% change
    for i in 0..8u64 {
        let name = format!("err-{}", i);
        let tick = t0 + Duration::from_secs(100 + i * 40);
        for secs_ago in [20u64, 5, 4, 3] {
            let entry = error(tick - Duration::from_secs(secs_ago), &name);
            window.add(entry.clone(), tick);
            tracker.update(&entry, tick, &window);
        }
        let emerging = tracker.emerging_patterns(tick, &window);
        assert!(emerging.contains_key(&name), "{} should be emerging", name);
    }

    let history = tracker.history();
    assert_eq!(history.len(), 5);
    assert_eq!(history[0].pattern, "err-3");
    assert_eq!(history[4].pattern, "err-7");
}

#[test]
fn test_history_returns_detached_copy() {
    let t0 = base();
    let window = SlidingWindow::new(600);
    let tracker = PatternTracker::new();

    let tick = t0 + Duration::from_secs(100);
    for secs_ago in [20u64, 5, 4, 3] {
        let entry = error(tick - Duration::from_secs(secs_ago), "X");
        window.add(entry.clone(), tick);
        tracker.update(&entry, tick, &window);
    }
    tracker.emerging_patterns(tick, &window);

    let mut copy = tracker.history();
    assert_eq!(copy.len(), 1);
    copy.clear();
    assert_eq!(tracker.history().len(), 1);
}

#[test]
fn test_top_errors_ranks_by_weighted_count() {
    let t0 = base();
    let window = SlidingWindow::new(120);
    let tracker = PatternTracker::new();

    for _ in 0..100 {
        tracker.update(&error(t0, "common"), t0, &window);
    }
    for _ in 0..10 {
        tracker.update(&error(t0, "rare"), t0, &window);
    }

    let top = tracker.top_errors(5);
    assert_eq!(top.len(), 2);
    assert_eq!(top[0].error_type, "common");
    assert_eq!(top[0].count, 100);
    assert_eq!(top[1].error_type, "rare");

    // n caps the result length
    assert_eq!(tracker.top_errors(1).len(), 1);
}
