//! Error types for the pdf-ocr-tool library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`PdfOcrError`] — **Local**: the adapter refused to run or could not
//!   finish its own work (empty path, malformed tool arguments, unreadable env
//!   file, output file not writable). Returned as `Err(PdfOcrError)`.
//!
//! * [`BackendFailure`] — **Backend-side**: the OCR process was started (or
//!   was supposed to be) and did not produce a result. Carried by
//!   [`crate::output::OcrOutcome::Failure`] so callers can inspect the exit
//!   code and captured output instead of only a message string.
//!
//! Host runtimes that want a single error type get
//! [`PdfOcrError::Backend`] via [`crate::output::OcrOutcome::into_result`].

use std::path::PathBuf;
use thiserror::Error;

/// Bytes of stdout/stderr retained in a [`BackendFailure::NonZeroExit`].
pub const OUTPUT_TAIL_BYTES: usize = 4096;

/// All fatal errors returned by the pdf-ocr-tool library.
#[derive(Debug, Error)]
pub enum PdfOcrError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// `pdf_path` was empty.
    #[error("pdf_path must not be empty")]
    EmptyPdfPath,

    /// The tool argument object did not match the declared schema.
    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The backend env file could not be read or parsed.
    #[error("Failed to load env file '{path}': {reason}")]
    EnvFile { path: PathBuf, reason: String },

    // ── Backend errors ────────────────────────────────────────────────────
    /// The OCR backend did not produce a result.
    #[error(transparent)]
    Backend(#[from] BackendFailure),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Why a backend invocation produced no text.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendFailure {
    /// The executable could not be started (not on PATH, not executable, …).
    #[error("Failed to start OCR backend '{program}': {reason}")]
    SpawnFailed { program: String, reason: String },

    /// The backend ran and exited unsuccessfully.
    ///
    /// `code` is `None` when the process was terminated by a signal.
    #[error("OCR backend exited with {}{}", fmt_code(.code), fmt_tail(.stdout_tail, .stderr_tail))]
    NonZeroExit {
        code: Option<i32>,
        stdout_tail: String,
        stderr_tail: String,
    },

    /// The backend exceeded the configured timeout and was killed.
    #[error("OCR backend timed out after {} and was killed", fmt_millis(.timeout_ms))]
    TimedOut { timeout_ms: u64 },

    /// The invocation was cancelled by the caller and the backend was killed.
    #[error("OCR backend invocation was cancelled")]
    Cancelled,

    /// Reading the backend's output pipes failed.
    #[error("I/O error while waiting for OCR backend: {reason}")]
    Io { reason: String },
}

fn fmt_code(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("status {c}"),
        None => "no status (terminated by signal)".to_string(),
    }
}

fn fmt_millis(ms: &u64) -> String {
    if ms % 1000 == 0 {
        format!("{}s", ms / 1000)
    } else {
        format!("{:.1}s", *ms as f64 / 1000.0)
    }
}

fn fmt_tail(stdout_tail: &str, stderr_tail: &str) -> String {
    // The reference backend reports errors on stdout; prefer stderr when both exist.
    let tail = if !stderr_tail.trim().is_empty() {
        stderr_tail.trim()
    } else {
        stdout_tail.trim()
    };
    if tail.is_empty() {
        String::new()
    } else {
        format!(": {tail}")
    }
}

/// Keep at most the last `max` bytes of `bytes`, decoded lossily.
///
/// The cut is moved forward to a UTF-8 boundary where possible so the tail
/// does not start with a replacement character.
pub(crate) fn tail_lossy(bytes: &[u8], max: usize) -> String {
    if bytes.len() <= max {
        return String::from_utf8_lossy(bytes).into_owned();
    }
    let mut start = bytes.len() - max;
    // Skip UTF-8 continuation bytes (10xxxxxx).
    while start < bytes.len() && (bytes[start] & 0b1100_0000) == 0b1000_0000 {
        start += 1;
    }
    String::from_utf8_lossy(&bytes[start..]).into_owned()
}
