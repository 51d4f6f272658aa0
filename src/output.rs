//! Result types returned by a backend invocation.

use crate::error::{BackendFailure, PdfOcrError};
use crate::request::OutputFormat;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Successful transcription of one PDF.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcrOutput {
    /// Backend stdout with leading and trailing whitespace removed.
    pub text: String,
    /// The path that was passed to the backend.
    pub pdf_path: PathBuf,
    /// The format string that was passed to the backend.
    pub output_format: OutputFormat,
    pub stats: InvocationStats,
}

/// Process-level facts about one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationStats {
    /// Exit code; `None` if the process was killed by a signal.
    pub exit_code: Option<i32>,
    /// Wall-clock time from spawn to exit.
    pub duration_ms: u64,
    /// Raw (untrimmed) stdout size.
    pub stdout_bytes: usize,
    pub stderr_bytes: usize,
}

/// Outcome of a single backend invocation.
///
/// A backend failure is a normal, expected outcome for a tool (missing file,
/// model server down), so it is a variant here rather than an `Err`.
/// Use [`OcrOutcome::into_result`] to get a plain `Result`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OcrOutcome {
    Success(OcrOutput),
    Failure {
        pdf_path: PathBuf,
        failure: BackendFailure,
    },
}

impl OcrOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, OcrOutcome::Success(_))
    }

    /// The transcribed text, if the invocation succeeded.
    pub fn text(&self) -> Option<&str> {
        match self {
            OcrOutcome::Success(out) => Some(&out.text),
            OcrOutcome::Failure { .. } => None,
        }
    }

    /// The failure, if the invocation failed.
    pub fn failure(&self) -> Option<&BackendFailure> {
        match self {
            OcrOutcome::Success(_) => None,
            OcrOutcome::Failure { failure, .. } => Some(failure),
        }
    }

    /// Convert into a `Result`, mapping a failure to [`PdfOcrError::Backend`].
    pub fn into_result(self) -> Result<OcrOutput, PdfOcrError> {
        match self {
            OcrOutcome::Success(out) => Ok(out),
            OcrOutcome::Failure { failure, .. } => Err(PdfOcrError::Backend(failure)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn success() -> OcrOutcome {
        OcrOutcome::Success(OcrOutput {
            text: "--- Page 1 ---\nHello".into(),
            pdf_path: "/tmp/doc.pdf".into(),
            output_format: OutputFormat::Markdown,
            stats: InvocationStats {
                exit_code: Some(0),
                duration_ms: 12,
                stdout_bytes: 22,
                stderr_bytes: 0,
            },
        })
    }

    #[test]
    fn success_accessors() {
        let o = success();
        assert!(o.is_success());
        assert_eq!(o.text(), Some("--- Page 1 ---\nHello"));
        assert!(o.failure().is_none());
        assert_eq!(o.into_result().unwrap().stats.exit_code, Some(0));
    }

    #[test]
    fn failure_into_result_is_backend_error() {
        let o = OcrOutcome::Failure {
            pdf_path: "/tmp/doc.pdf".into(),
            failure: BackendFailure::Cancelled,
        };
        assert!(o.text().is_none());
        assert_eq!(o.failure(), Some(&BackendFailure::Cancelled));
        assert!(matches!(
            o.into_result(),
            Err(PdfOcrError::Backend(BackendFailure::Cancelled))
        ));
    }

    #[test]
    fn outcome_json_shape() {
        let json = serde_json::to_value(success()).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["output_format"], "markdown");
        assert_eq!(json["stats"]["exit_code"], 0);

        let failed = OcrOutcome::Failure {
            pdf_path: "/tmp/doc.pdf".into(),
            failure: BackendFailure::TimedOut { timeout_ms: 9000 },
        };
        let json = serde_json::to_value(failed).unwrap();
        assert_eq!(json["status"], "failure");
        assert_eq!(json["failure"]["kind"], "timed_out");
    }
}
