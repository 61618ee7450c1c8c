/*!
 * Rate Tracker
 * Per-wall-second entry counts with a smoothed recent rate. Owned by
 * the controller and touched only under its lock.
 */

use crate::core::limits::BUCKET_RETENTION;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// One committed second of throughput
#[derive(Debug, Clone, Copy)]
pub struct RateBucket {
    pub timestamp: SystemTime,
    pub count: u64,
}

/// Counts entries per wall second and averages them over short horizons
#[derive(Debug)]
pub struct RateTracker {
    buckets: Vec<RateBucket>,
    current_second: SystemTime,
    current_count: u64,
}

impl RateTracker {
    pub fn new(now: SystemTime) -> Self {
        Self {
            buckets: Vec::new(),
            current_second: truncate_to_second(now),
            current_count: 0,
        }
    }

    /// Per-entry bookkeeping. Rolling into a new second commits the
    /// previous second's count to the bucket list.
    pub fn tick(&mut self, entry_time: SystemTime) {
        let second = truncate_to_second(entry_time);
        if second != self.current_second {
            self.buckets.push(RateBucket {
                timestamp: self.current_second,
                count: self.current_count,
            });
            self.current_second = second;
            self.current_count = 0;
        }
        self.current_count += 1;
    }

    /// Running count for the second currently being filled, the
    /// quantity the burst check watches
    #[inline]
    pub fn current_second_count(&self) -> u64 {
        self.current_count
    }

    /// Mean committed count over buckets in the trailing `seconds`.
    /// Stale buckets are evicted first; no buckets means rate zero.
    pub fn calculate_rate(&mut self, seconds: u32, now: SystemTime) -> f64 {
        if let Some(retention_cutoff) = now.checked_sub(BUCKET_RETENTION) {
            self.buckets.retain(|b| b.timestamp > retention_cutoff);
        }

        let cutoff = now.checked_sub(Duration::from_secs(seconds as u64));
        let mut total = 0u64;
        let mut relevant = 0u64;
        for bucket in &self.buckets {
            if cutoff.map_or(true, |c| bucket.timestamp > c) {
                total += bucket.count;
                relevant += 1;
            }
        }

        if relevant == 0 {
            return 0.0;
        }
        total as f64 / relevant as f64
    }
}

/// Drop sub-second precision so entries landing in the same wall
/// second share one bucket
fn truncate_to_second(t: SystemTime) -> SystemTime {
    match t.duration_since(UNIX_EPOCH) {
        Ok(d) => UNIX_EPOCH + Duration::from_secs(d.as_secs()),
        Err(_) => UNIX_EPOCH,
    }
}
