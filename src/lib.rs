//! # pdf-ocr-tool
//!
//! An agent tool that transcribes PDF documents by handing them to an external
//! OCR backend process.
//!
//! The crate does no OCR itself. It owns the contract around the backend: a
//! tool descriptor a host runtime can advertise, normalisation of the two
//! inputs (`pdf_path`, `output_format`), one subprocess per call with timeout
//! and cancellation, and a trimmed text result.
//!
//! ## Flow
//!
//! ```text
//! host / CLI
//!  │  { pdf_path, output_format? }
//!  ├─ 1. Request  reject empty path, default format to "markdown"
//!  ├─ 2. Command  uv run --directory <dir> --env-file <env> <script> <pdf> <format>
//!  ├─ 3. Wait     race child vs. timeout vs. CancellationToken
//!  └─ 4. Result   exit 0 → trimmed stdout; otherwise a BackendFailure
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf_ocr_tool::{transcribe, BackendConfig, OcrRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = BackendConfig::default();
//!     let request = OcrRequest::new("/tmp/doc.pdf", None)?;
//!     let output = transcribe(&request, &config).await?.into_result()?;
//!     println!("{}", output.text);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf-ocr` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod invoke;
pub mod output;
pub mod progress;
pub mod request;
pub mod tool;
pub mod transcribe;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{BackendConfig, BackendConfigBuilder, Launcher};
pub use error::{BackendFailure, PdfOcrError};
pub use invoke::{command_line, CommandLine};
pub use output::{InvocationStats, OcrOutcome, OcrOutput};
pub use progress::{InvocationObserver, NoopObserver, Observer};
pub use request::{OcrRequest, OutputFormat};
pub use tool::{PdfOcrTool, Tool, ToolArgs, ToolDescriptor};
pub use transcribe::{
    transcribe, transcribe_batch, transcribe_bytes, transcribe_sync, transcribe_to_file,
    transcribe_with_cancel,
};

pub use tokio_util::sync::CancellationToken;
