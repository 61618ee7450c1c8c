/*!
 * Analyzer Controller
 * Owns the window, pattern tracker, rate tracker, and global counters.
 * The ingestion path folds entries in; the snapshot path produces an
 * immutable per-second statistics view and decides window and buffer
 * adaptations.
 *
 * Locking: the controller mutex guards the counters, buffer state, and
 * rate buckets. Sections under it never touch a queue; alerts are
 * returned to the caller and sent outside the lock.
 */

use crate::analytics::patterns::PatternTracker;
use crate::analytics::rate::RateTracker;
use crate::analytics::window::SlidingWindow;
use crate::core::config::Config;
use crate::core::limits::{
    BUFFER_GROWTH_FACTOR, BURST_FACTOR, HIGH_ERROR_RATE_THRESHOLD, INITIAL_WINDOW_SECS,
    MAX_WINDOW_SECS, MIN_WINDOW_SECS, RATE_LOW_THRESHOLD, RATE_SMOOTHING_SECS,
    RATE_SURGE_THRESHOLD, WINDOW_STEP_SECS,
};
use crate::core::types::{Alert, LogEntry, LogStats};
use log::debug;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::SystemTime;

struct ControllerState {
    rate: RateTracker,
    entries_processed: u64,
    skipped_entries: u64,
    buffer_size: usize,
    buffer_resized: bool,
    window_size: u32,
    previous_window_size: u32,
    peak_rate: f64,
}

/// The analytics core: consumes entries, produces snapshots and alerts
pub struct Analyzer {
    window: SlidingWindow,
    patterns: PatternTracker,
    state: Mutex<ControllerState>,
}

impl Analyzer {
    pub fn new(config: &Config, now: SystemTime) -> Self {
        Self {
            window: SlidingWindow::new(INITIAL_WINDOW_SECS),
            patterns: PatternTracker::new(),
            state: Mutex::new(ControllerState {
                rate: RateTracker::new(now),
                entries_processed: 0,
                skipped_entries: 0,
                buffer_size: config.initial_buffer_size,
                buffer_resized: false,
                window_size: INITIAL_WINDOW_SECS,
                previous_window_size: INITIAL_WINDOW_SECS,
                peak_rate: 0.0,
            }),
        }
    }

    /// Fold one entry into the core. Returns a burst alert when this
    /// entry pushed the running per-second count over the buffer
    /// threshold; the caller owns delivery.
    pub fn ingest(&self, entry: LogEntry, now: SystemTime) -> Option<Alert> {
        {
            let mut state = self.state.lock();
            state.rate.tick(now);

            if !entry.is_valid {
                state.skipped_entries += 1;
                drop(state);
                debug!("skipped malformed entry: {}", entry.raw);
                return None;
            }
        }

        self.window.add(entry.clone(), now);
        self.patterns.update(&entry, now, &self.window);

        let mut state = self.state.lock();
        state.entries_processed += 1;

        let second_count = state.rate.current_second_count();
        if second_count as f64 > state.buffer_size as f64 * BURST_FACTOR {
            let new_size = (state.buffer_size as f64 * BUFFER_GROWTH_FACTOR) as usize;
            state.buffer_size = new_size;
            state.buffer_resized = true;
            drop(state);
            debug!(
                "burst: {} entries this second, buffer resized to {}",
                second_count, new_size
            );
            return Some(Alert::burst(now, second_count, new_size));
        }

        None
    }

    /// One snapshot cycle: refresh the rate, adapt the window, collect
    /// window and pattern statistics, and assemble an owned snapshot.
    /// Alerts raised by this tick are returned alongside it.
    pub fn tick_snapshot(&self, now: SystemTime) -> (LogStats, Vec<Alert>) {
        let mut alerts = Vec::new();
        let mut state = self.state.lock();

        let current_rate = state.rate.calculate_rate(RATE_SMOOTHING_SECS, now);
        if current_rate > state.peak_rate {
            state.peak_rate = current_rate;
        }

        // Adaptive window: shrink under surge (with an alert), grow
        // when quiet, one step per tick, clamped to the bounds
        let window_size = state.window_size;
        let mut next_window = window_size;
        if current_rate > RATE_SURGE_THRESHOLD && window_size > MIN_WINDOW_SECS {
            next_window = window_size.saturating_sub(WINDOW_STEP_SECS).max(MIN_WINDOW_SECS);
            alerts.push(Alert::window_adjusted(now, next_window));
        } else if current_rate < RATE_LOW_THRESHOLD && window_size < MAX_WINDOW_SECS {
            next_window = (window_size + WINDOW_STEP_SECS).min(MAX_WINDOW_SECS);
        }

        if next_window != window_size {
            state.previous_window_size = window_size;
            state.window_size = next_window;
            self.window.set_duration(next_window, now);
            debug!(
                "window adjusted {} -> {} sec at {:.0} entries/sec",
                window_size, next_window, current_rate
            );
        }

        let (_, level_counts, error_counts) = self.window.get_stats();

        let mut error_rates = HashMap::with_capacity(error_counts.len());
        for error_type in error_counts.keys() {
            error_rates.insert(
                error_type.clone(),
                self.window.get_error_rate(error_type, state.window_size, now),
            );
        }

        let emerging_patterns = self.patterns.emerging_patterns(now, &self.window);
        let emerging_pattern_history = self.patterns.history();

        let total_error_rate: f64 = error_rates.values().sum();
        if total_error_rate > HIGH_ERROR_RATE_THRESHOLD {
            alerts.push(Alert::high_error_rate(now, total_error_rate));
        }

        // Resize flag is reported for at most one tick
        state.buffer_resized = false;

        let stats = LogStats {
            entries_processed: state.entries_processed,
            current_rate,
            peak_rate: state.peak_rate,
            window_size: state.window_size,
            previous_window_size: state.previous_window_size,
            level_counts,
            error_counts,
            error_rates,
            emerging_patterns,
            skipped_entries: state.skipped_entries,
            last_updated: now,
            emerging_pattern_history,
        };

        (stats, alerts)
    }

    pub fn window(&self) -> &SlidingWindow {
        &self.window
    }

    pub fn patterns(&self) -> &PatternTracker {
        &self.patterns
    }

    pub fn entries_processed(&self) -> u64 {
        self.state.lock().entries_processed
    }

    pub fn skipped_entries(&self) -> u64 {
        self.state.lock().skipped_entries
    }

    pub fn buffer_size(&self) -> usize {
        self.state.lock().buffer_size
    }

    /// True between a burst-driven resize and the next snapshot tick
    pub fn buffer_resized(&self) -> bool {
        self.state.lock().buffer_resized
    }

    pub fn window_size(&self) -> u32 {
        self.state.lock().window_size
    }
}
