/*!
 * Line Reader
 * Parses the stdin log stream into entries and feeds the inbound
 * queue. Malformed lines still flow through, flagged invalid, so the
 * core can count them as skipped.
 */

use crate::core::errors::ReaderError;
use crate::core::types::{LogEntry, LogLevel};
use chrono::NaiveDateTime;
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::SystemTime;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, watch};

static LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[(.*?)\] (ERROR|INFO|DEBUG) - IP:([\d\.]+)(?: (.*))?")
        .expect("line regex is valid")
});

static ERROR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Error 500 - (.*)").expect("error regex is valid"));

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Parse one line into an entry. Anything that fails extraction comes
/// back flagged invalid with the original text attached.
pub fn parse_line(line: &str) -> LogEntry {
    if line.is_empty() {
        return LogEntry::invalid(line);
    }

    let Some(captures) = LINE_RE.captures(line) else {
        return LogEntry::invalid(line);
    };

    let Ok(naive) = NaiveDateTime::parse_from_str(&captures[1], TIMESTAMP_FORMAT) else {
        return LogEntry::invalid(line);
    };
    let timestamp = SystemTime::from(naive.and_utc());

    let level = LogLevel::from_tag(&captures[2]).expect("regex admits only known tags");
    let mut entry = LogEntry::new(timestamp, level, &captures[3]).with_raw(line);

    if level == LogLevel::Error {
        if let Some(payload) = captures.get(4).map(|m| m.as_str()).filter(|s| !s.is_empty()) {
            entry = entry.with_message(payload);
            if let Some(error_captures) = ERROR_RE.captures(payload) {
                entry = entry.with_error_type(&error_captures[1]);
            }
        }
    }

    entry
}

/// Handle to the running reader task
pub struct ReaderTask {
    shutdown_tx: watch::Sender<bool>,
    handle: Option<tokio::task::JoinHandle<Result<(), ReaderError>>>,
    shutdown_initiated: Arc<AtomicBool>,
}

impl ReaderTask {
    /// Start reading stdin into the inbound queue
    pub fn spawn(inbound_tx: mpsc::Sender<LogEntry>) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let shutdown_initiated = Arc::new(AtomicBool::new(false));

        let handle = tokio::spawn(async move {
            let stdin = BufReader::new(tokio::io::stdin());
            read_loop(stdin, inbound_tx, shutdown_rx).await
        });

        info!("reader task spawned");

        Self {
            shutdown_tx,
            handle: Some(handle),
            shutdown_initiated,
        }
    }

    /// Stop reading and return the loop's outcome; `Ok` covers both
    /// EOF and signal-driven stops
    pub async fn shutdown(mut self) -> Result<(), ReaderError> {
        self.shutdown_initiated.store(true, Ordering::SeqCst);
        let _ = self.shutdown_tx.send(true);

        match self.handle.take() {
            Some(handle) => match handle.await {
                Ok(result) => result,
                Err(e) => {
                    warn!("reader task shutdown error: {}", e);
                    Ok(())
                }
            },
            None => Ok(()),
        }
    }
}

impl Drop for ReaderTask {
    fn drop(&mut self) {
        if self.shutdown_initiated.load(Ordering::SeqCst) {
            return;
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
        warn!("reader task aborted without graceful shutdown");
    }
}

/// Per-line loop over any buffered input, generic so tests can feed
/// an in-memory stream
pub async fn read_loop<R>(
    input: R,
    inbound_tx: mpsc::Sender<LogEntry>,
    mut shutdown_rx: watch::Receiver<bool>,
) -> Result<(), ReaderError>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();

    loop {
        tokio::select! {
            _ = shutdown_rx.changed() => {
                debug!("reader loop stopping on shutdown signal");
                return Ok(());
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    info!("input ended, reader loop stopping");
                    return Ok(());
                };
                let entry = parse_line(&line);
                if !entry.is_valid {
                    debug!("malformed entry forwarded as skipped: {}", line);
                }
                if inbound_tx.send(entry).await.is_err() {
                    return Err(ReaderError::QueueClosed);
                }
            }
        }
    }
}
