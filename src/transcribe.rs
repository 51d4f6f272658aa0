//! Public entry points.
//!
//! Each function here is a thin arrangement around
//! [`crate::invoke::run_backend`]: one backend process per request, nothing
//! shared between calls except the cancellation token in
//! [`transcribe_batch`].

use crate::config::BackendConfig;
use crate::error::PdfOcrError;
use crate::invoke::run_backend;
use crate::output::{OcrOutcome, OcrOutput};
use crate::request::OcrRequest;
use futures::stream::{self, StreamExt};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Transcribe one PDF through the backend.
///
/// # Errors
/// Only local problems are `Err` (see [`run_backend`]); backend failures are
/// [`OcrOutcome::Failure`].
pub async fn transcribe(
    request: &OcrRequest,
    config: &BackendConfig,
) -> Result<OcrOutcome, PdfOcrError> {
    transcribe_with_cancel(request, config, CancellationToken::new()).await
}

/// Like [`transcribe`], but the backend is killed as soon as `cancel` fires.
pub async fn transcribe_with_cancel(
    request: &OcrRequest,
    config: &BackendConfig,
    cancel: CancellationToken,
) -> Result<OcrOutcome, PdfOcrError> {
    run_backend(request, config, &cancel).await
}

/// Synchronous wrapper around [`transcribe`].
///
/// Creates a temporary tokio runtime internally; do not call from inside an
/// async context.
pub fn transcribe_sync(
    request: &OcrRequest,
    config: &BackendConfig,
) -> Result<OcrOutcome, PdfOcrError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| PdfOcrError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(transcribe(request, config))
}

/// Transcribe and write the text to `output_path`.
///
/// Uses atomic write (a uniquely named temp file next to the target, then
/// rename) so a failed or cancelled run never leaves a partial file or a
/// stray temp file. A backend failure is returned as
/// [`PdfOcrError::Backend`] and nothing is written.
pub async fn transcribe_to_file(
    request: &OcrRequest,
    output_path: impl AsRef<Path>,
    config: &BackendConfig,
) -> Result<OcrOutput, PdfOcrError> {
    let output = transcribe(request, config).await?.into_result()?;
    let path = output_path.as_ref();
    let write_err = |source| PdfOcrError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
            parent.to_path_buf()
        }
        None => PathBuf::from("."),
    };

    let mut contents = output.text.clone();
    contents.push('\n');

    // The temp file is deleted on drop, including when persist fails.
    let target = path.to_path_buf();
    tokio::task::spawn_blocking(move || -> std::io::Result<()> {
        let mut tmp = tempfile::NamedTempFile::new_in(&parent)?;
        tmp.write_all(contents.as_bytes())?;
        tmp.flush()?;
        tmp.persist(&target).map_err(|e| e.error)?;
        Ok(())
    })
    .await
    .map_err(|e| PdfOcrError::Internal(format!("output write task failed: {e}")))?
    .map_err(write_err)?;

    info!("Wrote {} bytes to {}", output.text.len() + 1, path.display());
    Ok(output)
}

/// Transcribe PDF bytes held in memory.
///
/// The bytes are written to a managed [`tempfile`] with a `.pdf` suffix, which
/// is removed when this function returns. The reported `pdf_path` in the
/// outcome is that temporary path.
pub async fn transcribe_bytes(
    bytes: &[u8],
    output_format: Option<&str>,
    config: &BackendConfig,
) -> Result<OcrOutcome, PdfOcrError> {
    let mut tmp = tempfile::Builder::new()
        .prefix("pdf-ocr-")
        .suffix(".pdf")
        .tempfile()
        .map_err(|e| PdfOcrError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| PdfOcrError::Internal(format!("tempfile write: {e}")))?;
    tmp.flush()
        .map_err(|e| PdfOcrError::Internal(format!("tempfile flush: {e}")))?;

    let request = OcrRequest::new(tmp.path(), output_format)?;
    // `tmp` lives until the backend has exited.
    transcribe(&request, config).await
}

/// Transcribe several PDFs, running at most `concurrency` backends at once.
///
/// Every request gets its own process; the only thing they share is
/// `cancel`, which stops all of them. Results are in the order of
/// `requests`, regardless of completion order. A local error on any request
/// (e.g. an unreadable env file) aborts the batch with that error.
pub async fn transcribe_batch(
    requests: &[OcrRequest],
    config: &BackendConfig,
    concurrency: usize,
    cancel: CancellationToken,
) -> Result<Vec<OcrOutcome>, PdfOcrError> {
    let concurrency = concurrency.max(1);
    debug!(
        "Batch of {} requests, concurrency {}",
        requests.len(),
        concurrency
    );

    let mut indexed: Vec<(usize, Result<OcrOutcome, PdfOcrError>)> =
        stream::iter(requests.iter().enumerate().map(|(idx, req)| {
            let cancel = cancel.clone();
            async move { (idx, run_backend(req, config, &cancel).await) }
        }))
        .buffer_unordered(concurrency)
        .collect()
        .await;

    indexed.sort_by_key(|(idx, _)| *idx);
    indexed.into_iter().map(|(_, res)| res).collect()
}
