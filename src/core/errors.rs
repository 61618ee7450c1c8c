/*!
 * Error Types
 * Centralized error handling with thiserror
 */

use thiserror::Error;

/// Errors surfaced by the stdin reader
#[derive(Error, Debug)]
pub enum ReaderError {
    #[error("failed to read from input: {0}")]
    Io(#[from] std::io::Error),

    #[error("inbound queue closed before input ended")]
    QueueClosed,
}

/// Errors surfaced by the analyzer task plumbing
#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("analyzer task failed: {0}")]
    TaskFailed(String),
}

/// Unified error type for the binary
#[derive(Error, Debug)]
pub enum LoglensError {
    #[error("reader error: {0}")]
    Reader(#[from] ReaderError),

    #[error("analyzer error: {0}")]
    Analyzer(#[from] AnalyzerError),
}
