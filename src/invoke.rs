//! Backend invocation: build the command line, run it, collect the result.
//!
//! This is the only module that touches processes. One call spawns exactly one
//! child, waits for it, and turns whatever happened into an [`OcrOutcome`].
//! There are no retries: a failed OCR run is reported, not repeated.
//!
//! ## Waiting
//!
//! The child is raced against the optional timeout and the caller's
//! [`CancellationToken`]. Whichever loses is dropped; the child is spawned
//! with `kill_on_drop`, so dropping the wait future kills the backend.
//! Cancellation is checked first (`biased`), so a token cancelled before the
//! call never spawns anything.

use crate::config::{BackendConfig, Launcher};
use crate::error::{tail_lossy, BackendFailure, PdfOcrError, OUTPUT_TAIL_BYTES};
use crate::output::{InvocationStats, OcrOutcome, OcrOutput};
use crate::request::OcrRequest;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// A fully-resolved backend command, before spawning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<OsString>,
    /// Working directory to set on the child; `None` inherits ours.
    pub current_dir: Option<PathBuf>,
}

impl CommandLine {
    /// The last two arguments: `[pdf_path, output_format]`.
    pub fn positional(&self) -> &[OsString] {
        &self.args[self.args.len().saturating_sub(2)..]
    }
}

/// Build the command for `request` under `config`.
///
/// Pure: reads nothing from disk, so the exact shape can be asserted in tests.
pub fn command_line(config: &BackendConfig, request: &OcrRequest) -> CommandLine {
    let mut args: Vec<OsString> = Vec::new();
    let current_dir = match config.launcher {
        Launcher::Uv => {
            args.push("run".into());
            args.push("--directory".into());
            args.push(config.working_dir.clone().into_os_string());
            if let Some(ref env_file) = config.env_file {
                args.push("--env-file".into());
                args.push(env_file.clone().into_os_string());
            }
            None
        }
        Launcher::Direct => Some(config.working_dir.clone()),
    };
    args.push(config.script.clone().into_os_string());
    args.push(request.pdf_path().as_os_str().to_os_string());
    args.push(request.output_format().as_str().into());

    CommandLine {
        program: config.program.clone(),
        args,
        current_dir,
    }
}

/// Parse a dotenv file into key/value pairs without touching our own
/// environment.
pub fn load_env_file(path: &Path) -> Result<Vec<(String, String)>, PdfOcrError> {
    let env_err = |reason: String| PdfOcrError::EnvFile {
        path: path.to_path_buf(),
        reason,
    };
    dotenvy::from_path_iter(path)
        .map_err(|e| env_err(e.to_string()))?
        .map(|item| item.map_err(|e| env_err(e.to_string())))
        .collect()
}

/// Run the backend once for `request`.
///
/// # Returns
/// `Ok(OcrOutcome)` whenever the adapter got as far as trying to run the
/// backend — including spawn failure, non-zero exit, timeout and cancel.
///
/// # Errors
/// `Err(PdfOcrError::EnvFile)` if [`Launcher::Direct`] is used and the env
/// file cannot be loaded. Nothing is spawned in that case.
pub async fn run_backend(
    request: &OcrRequest,
    config: &BackendConfig,
    cancel: &CancellationToken,
) -> Result<OcrOutcome, PdfOcrError> {
    let pdf_path = request.pdf_path();
    let cmd_line = command_line(config, request);

    let mut cmd = Command::new(&cmd_line.program);
    cmd.args(&cmd_line.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(ref dir) = cmd_line.current_dir {
        cmd.current_dir(dir);
    }
    if config.launcher == Launcher::Direct {
        if let Some(ref env_file) = config.env_file {
            let vars = load_env_file(env_file)?;
            debug!("Loaded {} variables from {}", vars.len(), env_file.display());
            cmd.envs(vars);
        }
    }

    if cancel.is_cancelled() {
        return Ok(fail(config, pdf_path, BackendFailure::Cancelled));
    }

    debug!("Backend command: {} {:?}", cmd_line.program, cmd_line.args);
    info!(
        "Starting OCR: {} (format: {})",
        pdf_path.display(),
        request.output_format()
    );

    let start = Instant::now();
    let child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            return Ok(fail(
                config,
                pdf_path,
                BackendFailure::SpawnFailed {
                    program: cmd_line.program,
                    reason: e.to_string(),
                },
            ));
        }
    };
    if let Some(ref obs) = config.observer {
        obs.on_spawn(pdf_path, child.id());
    }

    let waited = tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(BackendFailure::Cancelled),
        _ = expire(config.timeout) => Err(BackendFailure::TimedOut {
            timeout_ms: config
                .timeout
                .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
                .unwrap_or_default(),
        }),
        res = child.wait_with_output() => res.map_err(|e| BackendFailure::Io {
            reason: e.to_string(),
        }),
    };
    let duration_ms = start.elapsed().as_millis() as u64;

    let output = match waited {
        Ok(output) => output,
        Err(failure) => return Ok(fail(config, pdf_path, failure)),
    };

    let stats = InvocationStats {
        exit_code: output.status.code(),
        duration_ms,
        stdout_bytes: output.stdout.len(),
        stderr_bytes: output.stderr.len(),
    };

    if !output.status.success() {
        let failure = BackendFailure::NonZeroExit {
            code: stats.exit_code,
            stdout_tail: tail_lossy(&output.stdout, OUTPUT_TAIL_BYTES),
            stderr_tail: tail_lossy(&output.stderr, OUTPUT_TAIL_BYTES),
        };
        return Ok(fail(config, pdf_path, failure));
    }

    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    debug!(
        "OCR of {}: {} stdout bytes, {} stderr bytes, {}ms",
        pdf_path.display(),
        stats.stdout_bytes,
        stats.stderr_bytes,
        duration_ms
    );
    info!(
        "OCR complete: {} ({} chars, {}ms)",
        pdf_path.display(),
        text.len(),
        duration_ms
    );
    if let Some(ref obs) = config.observer {
        obs.on_success(pdf_path, text.len(), duration_ms);
    }

    Ok(OcrOutcome::Success(OcrOutput {
        text,
        pdf_path: pdf_path.to_path_buf(),
        output_format: request.output_format().clone(),
        stats,
    }))
}

/// Resolves after `timeout`, or never.
async fn expire(timeout: Option<Duration>) {
    match timeout {
        Some(d) => tokio::time::sleep(d).await,
        None => std::future::pending::<()>().await,
    }
}

fn fail(config: &BackendConfig, pdf_path: &Path, failure: BackendFailure) -> OcrOutcome {
    warn!("OCR of {} failed: {}", pdf_path.display(), failure);
    if let Some(ref obs) = config.observer {
        obs.on_failure(pdf_path, &failure);
    }
    OcrOutcome::Failure {
        pdf_path: pdf_path.to_path_buf(),
        failure,
    }
}
