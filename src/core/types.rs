/*!
 * Data Model
 * Value types flowing through the pipeline: parsed entries, alerts,
 * and the per-tick statistics snapshot.
 */

use crate::core::limits::{INITIAL_WINDOW_SECS, PATTERN_EVENT_VISIBILITY, PATTERN_HISTORY_CAP};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::SystemTime;

/// Log severity tag as it appears in the source stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum LogLevel {
    Error,
    Info,
    Debug,
}

impl LogLevel {
    /// Map the textual tag from a log line; `None` for anything else
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "ERROR" => Some(LogLevel::Error),
            "INFO" => Some(LogLevel::Info),
            "DEBUG" => Some(LogLevel::Debug),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed log entry. Immutable after parse; invalid entries still
/// flow through the pipeline so they can be counted as skipped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// Entry-stated time, second precision
    pub timestamp: SystemTime,
    pub level: LogLevel,
    /// Source address, retained for attribution but never indexed
    pub ip: String,
    pub message: Option<String>,
    /// Set only for ERROR entries whose payload matched the
    /// error-classification rule
    pub error_type: Option<String>,
    pub is_valid: bool,
    /// Original line, carried for debug diagnostics
    pub raw: String,
}

impl LogEntry {
    /// A well-formed entry
    pub fn new(timestamp: SystemTime, level: LogLevel, ip: impl Into<String>) -> Self {
        Self {
            timestamp,
            level,
            ip: ip.into(),
            message: None,
            error_type: None,
            is_valid: true,
            raw: String::new(),
        }
    }

    /// A malformed line: counted as skipped, never indexed
    pub fn invalid(raw: impl Into<String>) -> Self {
        Self {
            timestamp: SystemTime::UNIX_EPOCH,
            level: LogLevel::Info,
            ip: String::new(),
            message: None,
            error_type: None,
            is_valid: false,
            raw: raw.into(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_error_type(mut self, error_type: impl Into<String>) -> Self {
        self.error_type = Some(error_type.into());
        self
    }

    pub fn with_raw(mut self, raw: impl Into<String>) -> Self {
        self.raw = raw.into();
        self
    }

    /// True for ERROR entries carrying a classified error type
    #[inline]
    pub fn classified_error(&self) -> Option<&str> {
        if self.level == LogLevel::Error {
            self.error_type.as_deref()
        } else {
            None
        }
    }
}

/// Operator alert with its emit time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub timestamp: SystemTime,
    pub message: String,
}

impl Alert {
    pub fn new(timestamp: SystemTime, message: impl Into<String>) -> Self {
        Self {
            timestamp,
            message: message.into(),
        }
    }

    /// Per-second entry count crossed the burst threshold
    pub fn burst(now: SystemTime, count: u64, new_buffer_size: usize) -> Self {
        Self::new(
            now,
            format!(
                "\u{26a0}\u{fe0f} Burst detected: {} entries in 1 sec, resized buffer to {}",
                count, new_buffer_size
            ),
        )
    }

    /// Window shrank in response to a rate surge
    pub fn window_adjusted(now: SystemTime, window_secs: u32) -> Self {
        Self::new(
            now,
            format!(
                "\u{26a0}\u{fe0f} Adjusted window to {} sec due to rate surge",
                window_secs
            ),
        )
    }

    /// Aggregate error rate crossed the alerting threshold
    pub fn high_error_rate(now: SystemTime, total_rate: f64) -> Self {
        Self::new(
            now,
            format!(
                "\u{26a0}\u{fe0f} High error rate ({:.1} errors/sec), increased pattern weight",
                total_rate
            ),
        )
    }
}

/// A recorded spike in one error type's rate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmergingPatternEvent {
    pub pattern: String,
    pub start_time: SystemTime,
    pub end_time: SystemTime,
    /// Percent change that triggered the event
    pub peak_change: f64,
    pub description: String,
}

impl EmergingPatternEvent {
    pub fn new(pattern: impl Into<String>, start_time: SystemTime, peak_change: f64) -> Self {
        let pattern = pattern.into();
        Self {
            description: format!("Spike in {} errors", pattern),
            pattern,
            start_time,
            end_time: start_time + PATTERN_EVENT_VISIBILITY,
            peak_change,
        }
    }

    /// Events stay visible for a fixed time after creation
    pub fn is_expired(&self, now: SystemTime) -> bool {
        now.duration_since(self.start_time)
            .map(|age| age > PATTERN_EVENT_VISIBILITY)
            .unwrap_or(false)
    }
}

/// An error type with its windowed count and severity weight
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightedError {
    pub error_type: String,
    pub count: u64,
    pub weight: f64,
}

impl WeightedError {
    /// Ranking score: raw count amplified by accumulated weight
    #[inline]
    pub fn score(&self) -> f64 {
        self.count as f64 * (1.0 + self.weight)
    }
}

/// Per-tick statistics snapshot. Owned and deep-copied at publication;
/// the core never touches a snapshot after handing it out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogStats {
    /// Lifetime count of valid entries processed
    pub entries_processed: u64,
    /// Smoothed entries/sec over the recent horizon
    pub current_rate: f64,
    pub peak_rate: f64,
    /// Current window horizon in seconds
    pub window_size: u32,
    /// Horizon before the most recent adaptation step
    pub previous_window_size: u32,
    pub level_counts: HashMap<LogLevel, u64>,
    pub error_counts: HashMap<String, u64>,
    /// Errors/sec per type, computed over the current window
    pub error_rates: HashMap<String, f64>,
    /// Error type -> percent rate increase for currently-spiking types
    pub emerging_patterns: HashMap<String, f64>,
    pub skipped_entries: u64,
    pub last_updated: SystemTime,
    pub emerging_pattern_history: Vec<EmergingPatternEvent>,
}

impl LogStats {
    pub fn new(now: SystemTime) -> Self {
        Self {
            entries_processed: 0,
            current_rate: 0.0,
            peak_rate: 0.0,
            window_size: INITIAL_WINDOW_SECS,
            previous_window_size: INITIAL_WINDOW_SECS,
            level_counts: HashMap::new(),
            error_counts: HashMap::new(),
            error_rates: HashMap::new(),
            emerging_patterns: HashMap::new(),
            skipped_entries: 0,
            last_updated: now,
            emerging_pattern_history: Vec::with_capacity(PATTERN_HISTORY_CAP),
        }
    }

    /// Sum of per-type error rates, the alerting quantity
    pub fn total_error_rate(&self) -> f64 {
        self.error_rates.values().sum()
    }
}
