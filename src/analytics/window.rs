/*!
 * Sliding Window
 * Time-bounded store of valid entries with per-level and per-error-type
 * secondary indexes. Pure queries; the controller supplies the
 * observation time so nothing here reads the clock.
 */

use crate::core::types::{LogEntry, LogLevel};
use parking_lot::RwLock;
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, SystemTime};

struct WindowInner {
    /// Primary list, insertion order == non-decreasing timestamp order
    entries: VecDeque<LogEntry>,
    by_level: HashMap<LogLevel, VecDeque<LogEntry>>,
    by_error: HashMap<String, VecDeque<LogEntry>>,
    duration: Duration,
    total_count: u64,
    level_counts: HashMap<LogLevel, u64>,
    error_counts: HashMap<String, u64>,
}

/// Time-bounded window over the recent log stream
pub struct SlidingWindow {
    inner: RwLock<WindowInner>,
}

impl SlidingWindow {
    pub fn new(duration_secs: u32) -> Self {
        Self {
            inner: RwLock::new(WindowInner {
                entries: VecDeque::new(),
                by_level: HashMap::new(),
                by_error: HashMap::new(),
                duration: Duration::from_secs(duration_secs as u64),
                total_count: 0,
                level_counts: HashMap::new(),
                error_counts: HashMap::new(),
            }),
        }
    }

    /// Insert a valid entry, evicting anything that fell out of the
    /// horizon first. Callers must not pass invalid entries.
    pub fn add(&self, entry: LogEntry, now: SystemTime) {
        debug_assert!(entry.is_valid);

        let mut inner = self.inner.write();

        if let Some(cutoff) = now.checked_sub(inner.duration) {
            inner.evict_before(cutoff);
        }

        inner.total_count += 1;
        *inner.level_counts.entry(entry.level).or_insert(0) += 1;
        inner
            .by_level
            .entry(entry.level)
            .or_default()
            .push_back(entry.clone());

        if let Some(error_type) = entry.classified_error() {
            *inner.error_counts.entry(error_type.to_string()).or_insert(0) += 1;
            inner
                .by_error
                .entry(error_type.to_string())
                .or_default()
                .push_back(entry.clone());
        }

        inner.entries.push_back(entry);
    }

    /// Change the horizon. Shrinking triggers an immediate eviction
    /// pass; growing takes effect through natural drift on later adds.
    pub fn set_duration(&self, duration_secs: u32, now: SystemTime) {
        let mut inner = self.inner.write();
        let new_duration = Duration::from_secs(duration_secs as u64);
        let old_duration = inner.duration;
        inner.duration = new_duration;

        if new_duration < old_duration {
            if let Some(cutoff) = now.checked_sub(new_duration) {
                inner.evict_before(cutoff);
            }
        }
    }

    pub fn duration(&self) -> Duration {
        self.inner.read().duration
    }

    /// Total count plus copies of both count maps, so callers cannot
    /// reach internal state
    pub fn get_stats(&self) -> (u64, HashMap<LogLevel, u64>, HashMap<String, u64>) {
        let inner = self.inner.read();
        (
            inner.total_count,
            inner.level_counts.clone(),
            inner.error_counts.clone(),
        )
    }

    /// Entries/sec for one error type over the trailing `seconds`.
    /// Unknown types rate at zero.
    pub fn get_error_rate(&self, error_type: &str, seconds: u32, now: SystemTime) -> f64 {
        if seconds == 0 {
            return 0.0;
        }

        let inner = self.inner.read();
        let Some(list) = inner.by_error.get(error_type) else {
            return 0.0;
        };
        let Some(cutoff) = now.checked_sub(Duration::from_secs(seconds as u64)) else {
            return list.len() as f64 / seconds as f64;
        };

        // Newest first; the list is time-ordered so the first entry
        // before the cutoff ends the scan
        let mut count = 0u64;
        for entry in list.iter().rev() {
            if entry.timestamp < cutoff {
                break;
            }
            count += 1;
        }

        count as f64 / seconds as f64
    }

    /// Percent change of one error type's count between the trailing
    /// `recent_sec` interval and the `prev_sec` interval just before it
    pub fn get_error_change(
        &self,
        error_type: &str,
        recent_sec: u32,
        prev_sec: u32,
        now: SystemTime,
    ) -> f64 {
        let inner = self.inner.read();
        let Some(list) = inner.by_error.get(error_type) else {
            return 0.0;
        };

        let recent_cutoff = now.checked_sub(Duration::from_secs(recent_sec as u64));
        let prev_cutoff =
            now.checked_sub(Duration::from_secs((recent_sec + prev_sec) as u64));

        let mut recent_count = 0u64;
        let mut prev_count = 0u64;

        // Single backward scan partitioning into the two adjacent
        // intervals; everything before both cutoffs is irrelevant
        for entry in list.iter().rev() {
            if recent_cutoff.map_or(true, |c| entry.timestamp > c) {
                recent_count += 1;
            } else if prev_cutoff.map_or(true, |c| entry.timestamp > c) {
                prev_count += 1;
            } else {
                break;
            }
        }

        if prev_count == 0 {
            if recent_count > 0 {
                return 100.0;
            }
            return 0.0;
        }

        100.0 * (recent_count as f64 - prev_count as f64) / prev_count as f64
    }
}

impl WindowInner {
    /// Walk the primary list from the oldest end, dropping expired
    /// entries from every index. Insertion order is non-decreasing in
    /// timestamp, so the walk stops at the first survivor.
    fn evict_before(&mut self, cutoff: SystemTime) {
        while let Some(entry) = self.entries.front() {
            if entry.timestamp >= cutoff {
                break;
            }
            let entry = self.entries.pop_front().expect("front checked above");

            self.total_count -= 1;
            if let Some(count) = self.level_counts.get_mut(&entry.level) {
                debug_assert!(*count > 0, "level count underflow");
                *count -= 1;
            }

            if let Some(list) = self.by_level.get_mut(&entry.level) {
                // First match by timestamp; entries are
                // count-equivalent so any same-second peer works
                if let Some(pos) = list.iter().position(|e| e.timestamp == entry.timestamp) {
                    list.remove(pos);
                }
            }

            if let Some(error_type) = entry.classified_error() {
                if let Some(count) = self.error_counts.get_mut(error_type) {
                    debug_assert!(*count > 0, "error count underflow");
                    *count -= 1;
                }
                if let Some(list) = self.by_error.get_mut(error_type) {
                    if let Some(pos) = list.iter().position(|e| e.timestamp == entry.timestamp) {
                        list.remove(pos);
                    }
                }
            }
        }
    }
}
