/*!
 * Controller Scenario Tests
 * End-to-end behavior of the analyzer core under steady, surging,
 * bursty, and error-heavy streams, with time driven explicitly
 */

use loglens::{Analyzer, Config, LogEntry, LogLevel};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

fn base() -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(1_700_000_000)
}

fn info(ts: SystemTime) -> LogEntry {
    LogEntry::new(ts, LogLevel::Info, "10.0.0.1")
}

fn error(ts: SystemTime, error_type: &str) -> LogEntry {
    LogEntry::new(ts, LogLevel::Error, "10.0.0.1").with_error_type(error_type)
}

fn new_analyzer(buffer: usize) -> Analyzer {
    Analyzer::new(&Config::new(buffer, false), base())
}

/// Feed `per_second` entries for each of `seconds` wall seconds,
/// ticking a snapshot at the end of each second. Returns the window
/// sizes observed per tick.
fn run_steady(
    analyzer: &Analyzer,
    start: SystemTime,
    seconds: u64,
    per_second: u64,
) -> (Vec<u32>, Vec<String>) {
    let mut window_sizes = Vec::new();
    let mut alerts = Vec::new();
    for second in 0..seconds {
        let at = start + Duration::from_secs(second);
        for i in 0..per_second {
            let ts = at + Duration::from_millis(i * 1000 / per_second);
            analyzer.ingest(info(ts), ts);
        }
        let tick = at + Duration::from_secs(1);
        // Roll the rate bucket over so the tick sees this second
        analyzer.ingest(info(tick), tick);
        let (stats, tick_alerts) = analyzer.tick_snapshot(tick);
        window_sizes.push(stats.window_size);
        alerts.extend(tick_alerts.into_iter().map(|a| a.message));
    }
    (window_sizes, alerts)
}

#[test]
fn test_steady_stream_grows_window_to_cap() {
    let analyzer = new_analyzer(10_000);

    let (window_sizes, alerts) = run_steady(&analyzer, base(), 10, 100);

    // 100/sec is quiet: the window climbs 10 s per tick and pins at 120
    assert_eq!(
        window_sizes,
        vec![70, 80, 90, 100, 110, 120, 120, 120, 120, 120]
    );
    assert!(window_sizes.windows(2).all(|w| w[1] >= w[0]));
    assert!(alerts.is_empty());

    let (stats, _) = analyzer.tick_snapshot(base() + Duration::from_secs(11));
    assert!((stats.current_rate - 100.0).abs() < 5.0);
}

#[test]
fn test_surge_shrinks_window_with_alerts() {
    let analyzer = new_analyzer(1_000_000);

    let (window_sizes, alerts) = run_steady(&analyzer, base(), 6, 3000);

    // 3000/sec is a surge: 60 -> 50 -> 40 -> 30, pinned at 30
    assert_eq!(window_sizes, vec![50, 40, 30, 30, 30, 30]);
    let adjustments: Vec<_> = alerts
        .iter()
        .filter(|m| m.contains("due to rate surge"))
        .collect();
    assert_eq!(adjustments.len(), 3);
    assert!(adjustments[0].contains("Adjusted window to 50 sec"));
    assert!(adjustments[2].contains("Adjusted window to 30 sec"));
}

#[test]
fn test_burst_resizes_buffer_once_crossed() {
    let now = base();
    let analyzer = new_analyzer(500);

    // 450 entries in one wall second: the burst fires as the count
    // crosses 0.8 * 500 and resizes to 750
    let mut burst_alerts = Vec::new();
    for _ in 0..450 {
        if let Some(alert) = analyzer.ingest(info(now), now) {
            burst_alerts.push(alert);
        }
    }

    assert_eq!(burst_alerts.len(), 1);
    assert!(burst_alerts[0]
        .message
        .contains("entries in 1 sec, resized buffer to 750"));
    assert_eq!(analyzer.buffer_size(), 750);
}

#[test]
fn test_sub_threshold_second_never_bursts() {
    let now = base();
    let analyzer = new_analyzer(500);

    for _ in 0..400 {
        assert!(analyzer.ingest(info(now), now).is_none());
    }
    assert_eq!(analyzer.buffer_size(), 500);
}

#[test]
fn test_error_spike_is_reported_in_snapshot() {
    let analyzer = new_analyzer(1_000_000);
    let start = base();

    // 10 errors/sec for 15 s, then 50/sec for 15 s
    let mut now = start;
    for second in 0..30u64 {
        let per_second: u64 = if second < 15 { 10 } else { 50 };
        let at = start + Duration::from_secs(second);
        for i in 0..per_second {
            let ts = at + Duration::from_millis(i * 1000 / per_second);
            analyzer.ingest(error(ts, "X"), ts);
            now = ts;
        }
    }

    let (stats, _) = analyzer.tick_snapshot(now);
    let change = stats
        .emerging_patterns
        .get("X")
        .copied()
        .expect("X should be emerging");
    assert!((change - 400.0).abs() < 10.0, "change was {}", change);
    assert_eq!(stats.emerging_pattern_history.len(), 1);
}

#[test]
fn test_skipped_entries_are_counted_not_indexed() {
    let now = base();
    let analyzer = new_analyzer(10_000);

    for i in 0..100u64 {
        let ts = now + Duration::from_millis(i * 10);
        analyzer.ingest(info(ts), ts);
    }
    for _ in 0..5 {
        analyzer.ingest(LogEntry::invalid("bad line"), now + Duration::from_secs(1));
    }

    let (stats, _) = analyzer.tick_snapshot(now + Duration::from_secs(1));
    assert_eq!(stats.entries_processed, 100);
    assert_eq!(stats.skipped_entries, 5);
    assert_eq!(stats.level_counts.values().sum::<u64>(), 100);
}

#[test]
fn test_processed_count_exact_under_concurrency() {
    let now = base();
    let analyzer = Arc::new(new_analyzer(usize::MAX / 2));
    let mut handles = Vec::new();

    for worker in 0..8 {
        let analyzer = Arc::clone(&analyzer);
        handles.push(std::thread::spawn(move || {
            for _ in 0..500 {
                // All-ERROR mix is the historical worst case for a
                // torn counter
                let entry = error(now, if worker % 2 == 0 { "X" } else { "Y" });
                analyzer.ingest(entry, now);
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(analyzer.entries_processed(), 4000);
}

#[test]
fn test_snapshots_are_independent_copies() {
    let now = base();
    let analyzer = new_analyzer(10_000);
    analyzer.ingest(error(now, "X"), now);

    let (mut first, _) = analyzer.tick_snapshot(now);
    first.error_counts.clear();
    first.emerging_pattern_history.push(
        loglens::EmergingPatternEvent::new("Forged", now, 999.0),
    );

    let (second, _) = analyzer.tick_snapshot(now + Duration::from_secs(1));
    assert_eq!(second.error_counts.get("X"), Some(&1));
    assert!(second
        .emerging_pattern_history
        .iter()
        .all(|e| e.pattern != "Forged"));
}
