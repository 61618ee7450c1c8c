/*!
 * Terminal Renderer
 * Consumes snapshots and alerts and repaints a one-page report.
 * Purely presentational: nothing here feeds back into the core.
 */

use crate::core::limits::{ALERTS_SHOWN, ALERT_BACKLOG, TOP_ERRORS_SHOWN};
use crate::core::types::{Alert, LogLevel, LogStats};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::{mpsc, watch};

/// Handle to the running renderer task
pub struct DisplayTask {
    shutdown_tx: watch::Sender<bool>,
    handle: Option<tokio::task::JoinHandle<()>>,
    shutdown_initiated: Arc<AtomicBool>,
}

impl DisplayTask {
    pub fn spawn(snapshot_rx: mpsc::Receiver<LogStats>, alert_rx: mpsc::Receiver<Alert>) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let shutdown_initiated = Arc::new(AtomicBool::new(false));

        let handle = tokio::spawn(run_display_loop(snapshot_rx, alert_rx, shutdown_rx));
        info!("display task spawned");

        Self {
            shutdown_tx,
            handle: Some(handle),
            shutdown_initiated,
        }
    }

    pub async fn shutdown(mut self) {
        self.shutdown_initiated.store(true, Ordering::SeqCst);
        let _ = self.shutdown_tx.send(true);

        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!("display task shutdown error: {}", e);
            }
        }
    }
}

impl Drop for DisplayTask {
    fn drop(&mut self) {
        if self.shutdown_initiated.load(Ordering::SeqCst) {
            return;
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
        warn!("display task aborted without graceful shutdown");
    }
}

async fn run_display_loop(
    mut snapshot_rx: mpsc::Receiver<LogStats>,
    mut alert_rx: mpsc::Receiver<Alert>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut alerts: Vec<Alert> = Vec::new();

    loop {
        tokio::select! {
            _ = shutdown_rx.changed() => {
                debug!("display loop stopping on shutdown signal");
                break;
            }
            alert = alert_rx.recv() => {
                let Some(alert) = alert else {
                    debug!("alert queue closed, display loop stopping");
                    break;
                };
                alerts.push(alert);
                if alerts.len() > ALERT_BACKLOG {
                    alerts.remove(0);
                }
            }
            stats = snapshot_rx.recv() => {
                let Some(stats) = stats else {
                    debug!("snapshot queue closed, display loop stopping");
                    break;
                };
                print!("\x1b[H\x1b[2J{}", render(&stats, &alerts, SystemTime::now()));
            }
        }
    }
}

/// Build the full report frame for one snapshot
pub fn render(stats: &LogStats, alerts: &[Alert], now: SystemTime) -> String {
    let mut report = String::new();

    let window_text = if stats.previous_window_size != stats.window_size {
        format!(
            "{} sec (Adjusted from {} sec)",
            stats.window_size, stats.previous_window_size
        )
    } else {
        format!("{} sec", stats.window_size)
    };

    report.push_str(&format!(
        "\nLog Analysis Report (Last Updated: {})\n\
         \u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\n\
         Runtime Stats:\n\
         \u{2022} Entries Processed: {}\n\
         \u{2022} Current Rate: {:.0} entries/sec (Peak: {:.0} entries/sec)\n\
         \u{2022} Adaptive Window: {}\n",
        format_timestamp(stats.last_updated),
        format_number(stats.entries_processed),
        stats.current_rate,
        stats.peak_rate,
        window_text,
    ));

    report.push_str("\nPattern Analysis:");
    let total_logs: u64 = stats.level_counts.values().sum();
    if total_logs > 0 {
        for level in [LogLevel::Error, LogLevel::Info, LogLevel::Debug] {
            if let Some(&count) = stats.level_counts.get(&level) {
                let percentage = 100.0 * count as f64 / total_logs as f64;
                report.push_str(&format!(
                    "\n\u{2022} {}: {:.0}% ({} entries)",
                    level,
                    percentage,
                    format_number(count)
                ));
            }
        }
    }

    report.push_str("\n\nDynamic Insights:");
    let total_error_rate = stats.total_error_rate();
    if total_error_rate > 0.0 {
        report.push_str(&format!(
            "\n\u{2022} Error Rate: {:.1} errors/sec",
            total_error_rate
        ));
    }

    if let Some((pattern, change)) = top_emerging(stats) {
        report.push_str(&format!(
            "\n\u{2022} Emerging Pattern: \"{}\" spiked {:.0}% in last 15 sec",
            pattern, change
        ));
    }

    let visible_history: Vec<_> = stats
        .emerging_pattern_history
        .iter()
        .rev()
        .filter(|event| !event.is_expired(now))
        .collect();
    if !visible_history.is_empty() {
        report.push_str("\n\nEmerging Pattern History:");
        for event in visible_history {
            let seconds_ago = now
                .duration_since(event.start_time)
                .map(|d| d.as_secs())
                .unwrap_or(0);
            report.push_str(&format!(
                "\n\u{2022} [{} sec ago] \"{}\" spiked {:.0}%",
                seconds_ago, event.pattern, event.peak_change
            ));
        }
    }

    if !stats.error_counts.is_empty() {
        let mut errors: Vec<(&String, &u64)> = stats.error_counts.iter().collect();
        errors.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        report.push_str("\n\n\u{2022} Top Errors:");
        for (rank, (error_type, count)) in errors.iter().take(TOP_ERRORS_SHOWN).enumerate() {
            report.push_str(&format!(
                "\n  {}. {} ({} occurrences)",
                rank + 1,
                error_type,
                format_number(**count)
            ));
        }
    }

    if !alerts.is_empty() {
        report.push_str("\n\nSelf-Evolving Alerts:");
        let start = alerts.len().saturating_sub(ALERTS_SHOWN);
        for alert in &alerts[start..] {
            report.push_str(&format!(
                "\n[{}] {}",
                format_time_of_day(alert.timestamp),
                alert.message
            ));
        }
    }

    report.push_str(
        "\n\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\n\
         Press Ctrl+C to exit\n",
    );

    report
}

/// Highest-change emerging pattern, if any
fn top_emerging(stats: &LogStats) -> Option<(&str, f64)> {
    stats
        .emerging_patterns
        .iter()
        .max_by(|a, b| {
            a.1.partial_cmp(b.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.0.cmp(a.0))
        })
        .map(|(pattern, change)| (pattern.as_str(), *change))
}

/// Group thousands for readability
fn format_number(n: u64) -> String {
    if n < 1000 {
        return n.to_string();
    }
    let mut parts = Vec::new();
    let mut remainder = n;
    while remainder >= 1000 {
        parts.push(format!("{:03}", remainder % 1000));
        remainder /= 1000;
    }
    let mut out = remainder.to_string();
    for part in parts.iter().rev() {
        out.push(',');
        out.push_str(part);
    }
    out
}

fn format_timestamp(t: SystemTime) -> String {
    DateTime::<Utc>::from(t)
        .format("%Y-%m-%d %H:%M:%S UTC")
        .to_string()
}

fn format_time_of_day(t: SystemTime) -> String {
    DateTime::<Utc>::from(t).format("%H:%M:%S").to_string()
}
