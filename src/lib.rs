/*!
 * loglens
 * Streaming log analytics over a line-oriented stdin stream: a
 * time-bounded sliding window with level/error indexes, adaptive
 * window and buffer sizing, emerging-pattern detection, and per-second
 * statistics snapshots.
 */

pub mod analytics;
pub mod core;
pub mod display;
pub mod reader;

pub use crate::analytics::{Analyzer, AnalyzerTask, PatternTracker, RateTracker, SlidingWindow};
pub use crate::core::config::Config;
pub use crate::core::errors::{AnalyzerError, LoglensError, ReaderError};
pub use crate::core::types::{
    Alert, EmergingPatternEvent, LogEntry, LogLevel, LogStats, WeightedError,
};
pub use crate::display::DisplayTask;
pub use crate::reader::ReaderTask;
