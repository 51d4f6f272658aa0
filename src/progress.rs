//! Observer trait for backend invocation events.
//!
//! Inject an [`Arc<dyn InvocationObserver>`] via
//! [`crate::config::BackendConfigBuilder::observer`] to be told when the
//! backend process starts and how it ends. OCR of a long document can take
//! minutes, so hosts use this to drive spinners, status lines, or audit logs
//! without the library knowing how they present it.
//!
//! # Example
//!
//! ```rust
//! use pdf_ocr_tool::{BackendConfig, InvocationObserver};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! struct PrintSpawn;
//!
//! impl InvocationObserver for PrintSpawn {
//!     fn on_spawn(&self, pdf_path: &Path, pid: Option<u32>) {
//!         eprintln!("OCR of {} started (pid {:?})", pdf_path.display(), pid);
//!     }
//! }
//!
//! let config = BackendConfig::builder()
//!     .observer(Arc::new(PrintSpawn) as Arc<dyn InvocationObserver>)
//!     .build()
//!     .unwrap();
//! ```

use crate::error::BackendFailure;
use std::path::Path;
use std::sync::Arc;

/// Called by the adapter around each backend process.
///
/// Implementations must be `Send + Sync`: batch runs invoke the backend
/// concurrently and call the observer from several tasks at once. All
/// methods default to no-ops.
pub trait InvocationObserver: Send + Sync {
    /// The backend process was spawned. `pid` is `None` if the OS did not
    /// report one.
    fn on_spawn(&self, pdf_path: &Path, pid: Option<u32>) {
        let _ = (pdf_path, pid);
    }

    /// The backend exited zero.
    ///
    /// # Arguments
    /// * `text_len`    — byte length of the trimmed output
    /// * `duration_ms` — wall-clock time from spawn to exit
    fn on_success(&self, pdf_path: &Path, text_len: usize, duration_ms: u64) {
        let _ = (pdf_path, text_len, duration_ms);
    }

    /// The invocation failed (including spawn failure, timeout, cancel).
    fn on_failure(&self, pdf_path: &Path, failure: &BackendFailure) {
        let _ = (pdf_path, failure);
    }
}

/// Observer that ignores every event.
pub struct NoopObserver;

impl InvocationObserver for NoopObserver {}

/// Convenience alias matching the type stored in [`crate::config::BackendConfig`].
pub type Observer = Arc<dyn InvocationObserver>;
