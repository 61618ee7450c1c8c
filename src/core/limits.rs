/*!
 * Tunables and Thresholds
 *
 * Centralized location for the pipeline's limits, thresholds, and
 * adaptation constants, grouped by subsystem.
 */

use std::time::Duration;

// =============================================================================
// QUEUE CAPACITIES
// =============================================================================

/// Inbound entry queue (parser -> ingestion)
/// Large enough to absorb multi-second bursts without blocking the parser
pub const INBOUND_QUEUE_CAPACITY: usize = 50_000;

/// Snapshot queue (snapshot task -> renderer)
/// Small on purpose: a stale snapshot is worthless, freshness wins
pub const SNAPSHOT_QUEUE_CAPACITY: usize = 10;

/// Alert queue (ingestion & snapshot tasks -> renderer)
pub const ALERT_QUEUE_CAPACITY: usize = 100;

// =============================================================================
// SLIDING WINDOW
// =============================================================================

/// Starting window horizon
pub const INITIAL_WINDOW_SECS: u32 = 60;

/// Window adaptation bounds
pub const MIN_WINDOW_SECS: u32 = 30;
pub const MAX_WINDOW_SECS: u32 = 120;

/// Window moves in fixed steps, once per snapshot tick
pub const WINDOW_STEP_SECS: u32 = 10;

/// Above this rate the window shrinks toward MIN_WINDOW_SECS
pub const RATE_SURGE_THRESHOLD: f64 = 2500.0;

/// Below this rate the window grows toward MAX_WINDOW_SECS
pub const RATE_LOW_THRESHOLD: f64 = 600.0;

// =============================================================================
// RATE TRACKER
// =============================================================================

/// Smoothing horizon for the reported current rate
pub const RATE_SMOOTHING_SECS: u32 = 10;

/// Per-second buckets older than this are evicted before any read
pub const BUCKET_RETENTION: Duration = Duration::from_secs(120);

/// Spacing of statistics snapshots
pub const SNAPSHOT_INTERVAL: Duration = Duration::from_secs(1);

// =============================================================================
// BURST DETECTION
// =============================================================================

/// A second whose entry count exceeds this fraction of the buffer
/// capacity counts as a burst
pub const BURST_FACTOR: f64 = 0.8;

/// Buffer capacity multiplier applied on burst
pub const BUFFER_GROWTH_FACTOR: f64 = 1.5;

/// Default starting buffer capacity
pub const DEFAULT_BUFFER_SIZE: usize = 10_000;

// =============================================================================
// PATTERN TRACKER
// =============================================================================

/// Rate samples retained per error type, index 0 = most recent
pub const RATE_HISTORY_LEN: usize = 5;

/// Minimum spacing between rate-history rotations
pub const HISTORY_ROTATION_PERIOD: Duration = Duration::from_secs(10);

/// A rotation whose fresh rate is at least this multiple of the
/// previous sample trips the spike rule
pub const SPIKE_RATIO: f64 = 4.0;

/// Weight multiplier applied by the spike rule
pub const SPIKE_WEIGHT_MULTIPLIER: f64 = 3.0;

/// Emerging-pattern comparison intervals: recent vs the interval
/// immediately before it
pub const EMERGING_RECENT_SECS: u32 = 15;
pub const EMERGING_PRIOR_SECS: u32 = 15;

/// Rate change (percent) above which a pattern counts as emerging
pub const EMERGING_CHANGE_THRESHOLD: f64 = 100.0;

/// Emerging-pattern events retained, oldest dropped first
pub const PATTERN_HISTORY_CAP: usize = 5;

/// Emerging-pattern events are hidden by the renderer after this age
pub const PATTERN_EVENT_VISIBILITY: Duration = Duration::from_secs(60);

// =============================================================================
// ALERTS & DISPLAY
// =============================================================================

/// Aggregate error rate (errors/sec) above which an alert is emitted
pub const HIGH_ERROR_RATE_THRESHOLD: f64 = 5.0;

/// Alerts kept in the renderer's backlog
pub const ALERT_BACKLOG: usize = 50;

/// Alerts shown per frame
pub const ALERTS_SHOWN: usize = 12;

/// Top error types shown per frame
pub const TOP_ERRORS_SHOWN: usize = 3;
