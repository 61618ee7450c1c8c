/*!
 * loglens - Streaming Log Analytics
 *
 * Reads a line-oriented log stream from stdin and maintains a live
 * terminal report: throughput, level mix, per-error-type rates,
 * emerging patterns, and operator alerts.
 */

use clap::Parser;
use log::{error, info};
use std::fs::OpenOptions;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::SystemTime;

use loglens::core::limits::{
    ALERT_QUEUE_CAPACITY, INBOUND_QUEUE_CAPACITY, SNAPSHOT_QUEUE_CAPACITY,
};
use loglens::{
    Analyzer, AnalyzerTask, Config, DisplayTask, LoglensError, ReaderError, ReaderTask,
};

#[derive(Parser, Debug)]
#[command(
    name = "loglens",
    version,
    about = "Streaming log analytics over stdin"
)]
struct Cli {
    /// Initial buffer size for burst detection; grows automatically
    /// under load
    #[arg(long, default_value_t = loglens::core::limits::DEFAULT_BUFFER_SIZE)]
    buffer: usize,

    /// Write verbose diagnostics to debug.log
    #[arg(long)]
    debug: bool,
}

fn init_logging(debug: bool) {
    let mut builder = env_logger::Builder::from_default_env();
    if debug {
        // Diagnostics go to a side file so they never fight the
        // terminal report for the screen
        builder.filter_level(log::LevelFilter::Debug);
        match OpenOptions::new().create(true).append(true).open("debug.log") {
            Ok(file) => {
                builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
            Err(e) => {
                eprintln!("could not open debug.log: {}", e);
            }
        }
    } else {
        builder.filter_level(log::LevelFilter::Warn);
    }
    builder.init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let config = Config::new(cli.buffer, cli.debug);
    info!(
        "starting with buffer size {} (debug: {})",
        config.initial_buffer_size, config.debug
    );

    let (inbound_tx, inbound_rx) = tokio::sync::mpsc::channel(INBOUND_QUEUE_CAPACITY);
    let (snapshot_tx, snapshot_rx) = tokio::sync::mpsc::channel(SNAPSHOT_QUEUE_CAPACITY);
    let (alert_tx, alert_rx) = tokio::sync::mpsc::channel(ALERT_QUEUE_CAPACITY);

    let analyzer = Arc::new(Analyzer::new(&config, SystemTime::now()));

    let reader = ReaderTask::spawn(inbound_tx);
    let analyzer_task = AnalyzerTask::spawn(analyzer, inbound_rx, snapshot_tx, alert_tx);
    let display = DisplayTask::spawn(snapshot_rx, alert_rx);

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {}", e);
    }
    println!("\nShutting down gracefully...");

    // Stop components in reverse order of the data flow
    display.shutdown().await;
    let analyzer_result = analyzer_task.shutdown().await;
    let reader_result = reader.shutdown().await;

    println!("Shutdown complete.");

    // Non-zero exit is reserved for real input I/O failures and task
    // failures. A queue torn down mid-send during this shutdown is a
    // clean termination signal, not an error.
    let outcome: Result<(), LoglensError> = analyzer_result.map_err(LoglensError::from).and(
        match reader_result {
            Ok(()) | Err(ReaderError::QueueClosed) => Ok(()),
            Err(e @ ReaderError::Io(_)) => Err(LoglensError::from(e)),
        },
    );

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("shutdown failure: {}", e);
            ExitCode::FAILURE
        }
    }
}
