/*!
 * Pattern Tracker
 * Per-error-type weights driven by rate acceleration, plus a short
 * history of notable spikes.
 */

use crate::analytics::window::SlidingWindow;
use crate::core::limits::{
    EMERGING_CHANGE_THRESHOLD, EMERGING_PRIOR_SECS, EMERGING_RECENT_SECS, HISTORY_ROTATION_PERIOD,
    PATTERN_HISTORY_CAP, RATE_HISTORY_LEN, RATE_SMOOTHING_SECS, SPIKE_RATIO,
    SPIKE_WEIGHT_MULTIPLIER,
};
use crate::core::types::{EmergingPatternEvent, LogEntry, WeightedError};
use log::debug;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::SystemTime;

/// Running statistics for one error type
#[derive(Debug, Clone)]
struct ErrorPattern {
    /// Monotonic total since process start
    count: u64,
    /// Severity multiplier, grown by the spike rule
    weight: f64,
    /// Recent rate samples, index 0 = most recent
    rate_history: [f64; RATE_HISTORY_LEN],
    last_updated: SystemTime,
}

impl ErrorPattern {
    fn new(now: SystemTime) -> Self {
        Self {
            count: 0,
            weight: 0.0,
            rate_history: [0.0; RATE_HISTORY_LEN],
            last_updated: now,
        }
    }

    /// Shift history right, install the fresh sample, and apply the
    /// spike rule: a >= 4x jump between consecutive samples triples
    /// the weight (seeding it to 1 first so a zero weight can grow).
    fn rotate(&mut self, fresh_rate: f64, now: SystemTime) {
        self.rate_history.copy_within(0..RATE_HISTORY_LEN - 1, 1);
        self.rate_history[0] = fresh_rate;
        self.last_updated = now;

        let recent = self.rate_history[0];
        let previous = self.rate_history[1];
        if recent > 0.0 && previous > 0.0 && recent >= SPIKE_RATIO * previous {
            self.weight = self.weight.max(1.0) * SPIKE_WEIGHT_MULTIPLIER;
        }
    }
}

/// Tracks error patterns, their weights, and emerging-pattern events
pub struct PatternTracker {
    inner: RwLock<TrackerInner>,
}

struct TrackerInner {
    patterns: HashMap<String, ErrorPattern>,
    /// First-seen order, for deterministic ranking ties
    order: Vec<String>,
    history: Vec<EmergingPatternEvent>,
}

impl PatternTracker {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(TrackerInner {
                patterns: HashMap::new(),
                order: Vec::new(),
                history: Vec::with_capacity(PATTERN_HISTORY_CAP),
            }),
        }
    }

    /// Fold one entry into its pattern. Ignores everything that is not
    /// a classified ERROR. The rate history rotates at most once per
    /// rotation period, sampling the window's short-horizon rate.
    pub fn update(&self, entry: &LogEntry, now: SystemTime, window: &SlidingWindow) {
        let Some(error_type) = entry.classified_error() else {
            return;
        };

        let mut inner = self.inner.write();
        if !inner.patterns.contains_key(error_type) {
            inner.patterns.insert(error_type.to_string(), ErrorPattern::new(now));
            inner.order.push(error_type.to_string());
        }
        let pattern = inner
            .patterns
            .get_mut(error_type)
            .expect("pattern inserted above");

        pattern.count += 1;

        let due = now
            .duration_since(pattern.last_updated)
            .map(|elapsed| elapsed > HISTORY_ROTATION_PERIOD)
            .unwrap_or(false);
        if due {
            let fresh = window.get_error_rate(error_type, RATE_SMOOTHING_SECS, now);
            let weight_before = pattern.weight;
            pattern.rotate(fresh, now);
            if pattern.weight != weight_before {
                debug!(
                    "spike: {} rate {:.2}/s, weight {} -> {}",
                    error_type, fresh, weight_before, pattern.weight
                );
            }
        }
    }

    /// Up to `n` error types ranked by count amplified by weight,
    /// ties in first-seen order
    pub fn top_errors(&self, n: usize) -> Vec<WeightedError> {
        let inner = self.inner.read();

        let mut rows: Vec<WeightedError> = inner
            .order
            .iter()
            .filter_map(|error_type| {
                inner.patterns.get(error_type).map(|p| WeightedError {
                    error_type: error_type.clone(),
                    count: p.count,
                    weight: p.weight,
                })
            })
            .collect();

        // Stable sort keeps first-seen order within equal scores
        rows.sort_by(|a, b| {
            b.score()
                .partial_cmp(&a.score())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        rows.truncate(n);
        rows
    }

    /// Error types whose recent interval rate exceeds the prior
    /// interval by more than the emerging threshold. Each detection
    /// also lands in the event history.
    ///
    /// The read phase runs under the shared lock, which is released
    /// before the exclusive append; events recorded by a concurrent
    /// tick interleave harmlessly because appends are monotone.
    pub fn emerging_patterns(
        &self,
        now: SystemTime,
        window: &SlidingWindow,
    ) -> HashMap<String, f64> {
        let mut result = HashMap::new();
        {
            let inner = self.inner.read();
            for error_type in &inner.order {
                let change = window.get_error_change(
                    error_type,
                    EMERGING_RECENT_SECS,
                    EMERGING_PRIOR_SECS,
                    now,
                );
                if change > EMERGING_CHANGE_THRESHOLD {
                    result.insert(error_type.clone(), change);
                }
            }
        }

        if !result.is_empty() {
            let mut inner = self.inner.write();
            for (pattern, change) in &result {
                inner
                    .history
                    .push(EmergingPatternEvent::new(pattern.clone(), now, *change));
            }
            let overflow = inner.history.len().saturating_sub(PATTERN_HISTORY_CAP);
            if overflow > 0 {
                inner.history.drain(0..overflow);
            }
        }

        result
    }

    /// Defensive copy of the spike event history, oldest first
    pub fn history(&self) -> Vec<EmergingPatternEvent> {
        self.inner.read().history.clone()
    }
}

impl Default for PatternTracker {
    fn default() -> Self {
        Self::new()
    }
}
