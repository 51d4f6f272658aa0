//! End-to-end tests against the real uv-launched OCR backend.
//!
//! These need a deployed tool directory (`~/.config/opencode/tool` with
//! `pdf_ocr_backend.py` and `.env`), `uv` on PATH, and a reachable OCR model
//! server. They are gated behind `PDF_OCR_E2E` so they never run in CI unless
//! explicitly requested.
//!
//! Run with:
//!   PDF_OCR_E2E=1 PDF_OCR_E2E_PDF=/abs/path/doc.pdf cargo test --test e2e -- --nocapture

use pdf_ocr_tool::{transcribe, BackendConfig, BackendFailure, OcrRequest, PdfOcrTool, Tool};
use std::path::PathBuf;

/// Skip unless `PDF_OCR_E2E` is set; yields the PDF from `PDF_OCR_E2E_PDF`.
macro_rules! e2e_skip_unless_ready {
    () => {{
        if std::env::var("PDF_OCR_E2E").is_err() {
            println!("SKIP — set PDF_OCR_E2E=1 to run e2e tests");
            return;
        }
        let Ok(raw) = std::env::var("PDF_OCR_E2E_PDF") else {
            println!("SKIP — set PDF_OCR_E2E_PDF to an absolute PDF path");
            return;
        };
        let p = PathBuf::from(raw);
        if !p.exists() {
            println!("SKIP — test file not found: {}", p.display());
            return;
        }
        p
    }};
}

#[tokio::test]
async fn test_real_backend_markdown() {
    let pdf = e2e_skip_unless_ready!();
    let request = OcrRequest::new(&pdf, None).unwrap();
    let out = transcribe(&request, &BackendConfig::default())
        .await
        .expect("local setup")
        .into_result()
        .expect("backend should succeed");

    assert!(!out.text.is_empty());
    assert_eq!(out.text, out.text.trim());
    assert!(
        out.text.starts_with("--- Page 1 ---"),
        "backend separates pages with markers, got: {:?}",
        out.text.chars().take(60).collect::<String>()
    );
    println!("✓ {} chars in {}ms", out.text.len(), out.stats.duration_ms);
}

#[tokio::test]
async fn test_real_backend_missing_file() {
    let _ = e2e_skip_unless_ready!();
    let request = OcrRequest::new("/nonexistent/e2e.pdf", None).unwrap();
    let outcome = transcribe(&request, &BackendConfig::default())
        .await
        .expect("local setup");

    match outcome.failure() {
        Some(BackendFailure::NonZeroExit {
            code, stdout_tail, ..
        }) => {
            assert_eq!(*code, Some(1));
            assert!(stdout_tail.contains("PDF file not found"));
        }
        other => panic!("expected NonZeroExit, got {other:?}"),
    }
}

#[tokio::test]
async fn test_real_backend_via_tool_surface() {
    let pdf = e2e_skip_unless_ready!();
    let tool = PdfOcrTool::default();
    let text = tool
        .execute(
            serde_json::json!({ "pdf_path": pdf, "output_format": "text" }),
            Default::default(),
        )
        .await
        .expect("tool execute");
    assert!(!text.is_empty());
}
