/*!
 * Analyzer Task Plumbing
 *
 * Runs the core as two cooperating tasks: the ingestion loop draining
 * the inbound queue, and the snapshot loop firing once per second.
 * Both observe one shutdown signal.
 *
 * Shutdown is graceful-with-fallback: `shutdown().await` stops both
 * loops cleanly and consumes the handle; if it was never called, Drop
 * aborts the tasks so nothing leaks.
 */

use crate::analytics::analyzer::Analyzer;
use crate::core::errors::AnalyzerError;
use crate::core::limits::SNAPSHOT_INTERVAL;
use crate::core::types::{Alert, LogEntry, LogStats};
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::{mpsc, watch};

/// Handle to the running analyzer tasks
pub struct AnalyzerTask {
    shutdown_tx: watch::Sender<bool>,
    ingest_handle: Option<tokio::task::JoinHandle<()>>,
    snapshot_handle: Option<tokio::task::JoinHandle<()>>,
    shutdown_initiated: Arc<AtomicBool>,
}

impl AnalyzerTask {
    /// Start the ingestion and snapshot loops over a shared core
    pub fn spawn(
        analyzer: Arc<Analyzer>,
        inbound_rx: mpsc::Receiver<LogEntry>,
        snapshot_tx: mpsc::Sender<LogStats>,
        alert_tx: mpsc::Sender<Alert>,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let shutdown_initiated = Arc::new(AtomicBool::new(false));

        let ingest_handle = tokio::spawn(run_ingest_loop(
            Arc::clone(&analyzer),
            inbound_rx,
            alert_tx.clone(),
            shutdown_rx.clone(),
        ));
        let snapshot_handle = tokio::spawn(run_snapshot_loop(
            analyzer,
            snapshot_tx,
            alert_tx,
            shutdown_rx,
        ));

        info!("analyzer tasks spawned");

        Self {
            shutdown_tx,
            ingest_handle: Some(ingest_handle),
            snapshot_handle: Some(snapshot_handle),
            shutdown_initiated,
        }
    }

    /// Stop both loops and wait for them. Consumes the handle so it
    /// cannot be shut down twice. A loop that panicked instead of
    /// unwinding cleanly surfaces as a task failure.
    pub async fn shutdown(mut self) -> Result<(), AnalyzerError> {
        self.shutdown_initiated.store(true, Ordering::SeqCst);
        let _ = self.shutdown_tx.send(true);

        let mut result = Ok(());
        for handle in [self.ingest_handle.take(), self.snapshot_handle.take()]
            .into_iter()
            .flatten()
        {
            if let Err(e) = handle.await {
                warn!("analyzer task shutdown error: {}", e);
                result = Err(AnalyzerError::TaskFailed(e.to_string()));
            }
        }
        if result.is_ok() {
            info!("analyzer tasks shutdown complete");
        }
        result
    }
}

impl Drop for AnalyzerTask {
    fn drop(&mut self) {
        if self.shutdown_initiated.load(Ordering::SeqCst) {
            return;
        }
        // Graceful shutdown was skipped; abort so the tasks don't leak
        for handle in [self.ingest_handle.take(), self.snapshot_handle.take()]
            .into_iter()
            .flatten()
        {
            handle.abort();
        }
        warn!("analyzer tasks aborted without graceful shutdown");
    }
}

/// Drain the inbound queue into the core. Ends on shutdown or when
/// the queue closes (input EOF upstream).
async fn run_ingest_loop(
    analyzer: Arc<Analyzer>,
    mut inbound_rx: mpsc::Receiver<LogEntry>,
    alert_tx: mpsc::Sender<Alert>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = shutdown_rx.changed() => {
                debug!("ingestion loop stopping on shutdown signal");
                break;
            }
            entry = inbound_rx.recv() => {
                let Some(entry) = entry else {
                    debug!("inbound queue closed, ingestion loop stopping");
                    break;
                };
                if let Some(alert) = analyzer.ingest(entry, SystemTime::now()) {
                    // Freshness over completeness: a full queue drops
                    // the alert instead of stalling the hot path
                    if alert_tx.try_send(alert).is_err() {
                        debug!("burst alert dropped, queue unavailable");
                    }
                }
            }
        }
    }
}

/// Publish one snapshot per second until shutdown
async fn run_snapshot_loop(
    analyzer: Arc<Analyzer>,
    snapshot_tx: mpsc::Sender<LogStats>,
    alert_tx: mpsc::Sender<Alert>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let start = tokio::time::Instant::now() + SNAPSHOT_INTERVAL;
    let mut interval = tokio::time::interval_at(start, SNAPSHOT_INTERVAL);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = shutdown_rx.changed() => {
                debug!("snapshot loop stopping on shutdown signal");
                break;
            }
            _ = interval.tick() => {
                let (stats, alerts) = analyzer.tick_snapshot(SystemTime::now());
                for alert in alerts {
                    if alert_tx.try_send(alert).is_err() {
                        debug!("alert dropped, queue unavailable");
                    }
                }
                if snapshot_tx.try_send(stats).is_err() {
                    // The next tick produces a fresher one anyway
                    debug!("snapshot dropped, queue unavailable");
                }
            }
        }
    }
}
