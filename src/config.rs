//! Configuration for the OCR backend invocation.
//!
//! Everything the adapter needs to know about *where* and *how* to run the
//! backend lives in [`BackendConfig`]: which launcher, which script, which
//! working directory and env file, and how long to wait. Nothing is read from
//! hard-coded paths at call time, so tests can point the adapter at a throwaway
//! script in a temp directory.

use crate::error::PdfOcrError;
use crate::progress::Observer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Default backend script, relative to the working directory.
pub const DEFAULT_SCRIPT: &str = "pdf_ocr_backend.py";

/// Default launcher executable.
pub const DEFAULT_PROGRAM: &str = "uv";

/// Default timeout: one hour, the same budget the backend gives its own
/// model client.
pub const DEFAULT_TIMEOUT_SECS: u64 = 3600;

/// How the backend script is started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Launcher {
    /// `uv run --directory <dir> [--env-file <file>] <script> <pdf> <format>`.
    ///
    /// uv resolves the script's Python environment and loads the env file.
    #[default]
    Uv,
    /// `<program> <script> <pdf> <format>` with the working directory set on
    /// the child and the env file parsed by this crate.
    Direct,
}

/// Configuration for backend invocations.
///
/// Built via [`BackendConfig::builder()`] or [`BackendConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf_ocr_tool::{BackendConfig, Launcher};
///
/// let config = BackendConfig::builder()
///     .working_dir("/opt/ocr")
///     .env_file("/opt/ocr/.env")
///     .timeout_secs(600)
///     .build()
///     .unwrap();
/// assert_eq!(config.launcher, Launcher::Uv);
/// ```
#[derive(Clone)]
pub struct BackendConfig {
    /// Launcher style. Default: [`Launcher::Uv`].
    pub launcher: Launcher,

    /// Executable to spawn. Default: `"uv"`.
    pub program: String,

    /// Backend script path, resolved relative to `working_dir` by the launcher.
    /// Default: `"pdf_ocr_backend.py"`.
    pub script: PathBuf,

    /// Directory the backend runs in. Default: `~/.config/opencode/tool`.
    pub working_dir: PathBuf,

    /// Env file with backend credentials. Default: `<working_dir>/.env`.
    /// `None` runs the backend with the inherited environment only.
    pub env_file: Option<PathBuf>,

    /// Kill the backend after this long. `None` waits indefinitely.
    /// Default: 3600 s.
    pub timeout: Option<Duration>,

    /// Receives spawn/success/failure events.
    pub observer: Option<Observer>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        let working_dir = default_tool_dir();
        let env_file = Some(working_dir.join(".env"));
        Self {
            launcher: Launcher::default(),
            program: DEFAULT_PROGRAM.to_string(),
            script: PathBuf::from(DEFAULT_SCRIPT),
            working_dir,
            env_file,
            timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            observer: None,
        }
    }
}

impl fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendConfig")
            .field("launcher", &self.launcher)
            .field("program", &self.program)
            .field("script", &self.script)
            .field("working_dir", &self.working_dir)
            .field("env_file", &self.env_file)
            .field("timeout", &self.timeout)
            .field("observer", &self.observer.as_ref().map(|_| "<dyn InvocationObserver>"))
            .finish()
    }
}

impl BackendConfig {
    /// Create a new builder for `BackendConfig`.
    pub fn builder() -> BackendConfigBuilder {
        BackendConfigBuilder {
            config: Self::default(),
            env_file_set: false,
        }
    }
}

/// `~/.config/opencode/tool`, or `./.config/opencode/tool` when the home
/// directory cannot be determined.
pub fn default_tool_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("opencode")
        .join("tool")
}

/// Builder for [`BackendConfig`].
pub struct BackendConfigBuilder {
    config: BackendConfig,
    env_file_set: bool,
}

impl fmt::Debug for BackendConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl BackendConfigBuilder {
    pub fn launcher(mut self, launcher: Launcher) -> Self {
        self.config.launcher = launcher;
        self
    }

    pub fn program(mut self, program: impl Into<String>) -> Self {
        self.config.program = program.into();
        self
    }

    pub fn script(mut self, script: impl Into<PathBuf>) -> Self {
        self.config.script = script.into();
        self
    }

    /// Set the working directory. Unless [`Self::env_file`] or
    /// [`Self::no_env_file`] is also called, the env file follows it to
    /// `<dir>/.env`.
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.working_dir = dir.into();
        self
    }

    pub fn env_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.env_file = Some(path.into());
        self.env_file_set = true;
        self
    }

    pub fn no_env_file(mut self) -> Self {
        self.config.env_file = None;
        self.env_file_set = true;
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Shorthand for [`Self::timeout`]; `0` disables the timeout.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout = (secs > 0).then(|| Duration::from_secs(secs));
        self
    }

    pub fn observer(mut self, observer: Observer) -> Self {
        self.config.observer = Some(observer);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(mut self) -> Result<BackendConfig, PdfOcrError> {
        if !self.env_file_set {
            self.config.env_file = Some(self.config.working_dir.join(".env"));
        }
        let c = &self.config;
        if c.program.trim().is_empty() {
            return Err(PdfOcrError::InvalidConfig(
                "backend program must not be empty".into(),
            ));
        }
        if c.script.as_os_str().is_empty() {
            return Err(PdfOcrError::InvalidConfig(
                "backend script must not be empty".into(),
            ));
        }
        if c.working_dir.as_os_str().is_empty() {
            return Err(PdfOcrError::InvalidConfig(
                "working directory must not be empty".into(),
            ));
        }
        if c.timeout == Some(Duration::ZERO) {
            return Err(PdfOcrError::InvalidConfig(
                "timeout must be > 0 (use None to disable)".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn defaults_match_reference_layout() {
        let c = BackendConfig::default();
        assert_eq!(c.launcher, Launcher::Uv);
        assert_eq!(c.program, "uv");
        assert_eq!(c.script, Path::new("pdf_ocr_backend.py"));
        assert!(c.working_dir.ends_with(".config/opencode/tool"));
        assert_eq!(c.env_file, Some(c.working_dir.join(".env")));
        assert_eq!(c.timeout, Some(Duration::from_secs(3600)));
    }

    #[test]
    fn env_file_follows_working_dir() {
        let c = BackendConfig::builder()
            .working_dir("/srv/ocr")
            .build()
            .unwrap();
        assert_eq!(c.env_file.as_deref(), Some(Path::new("/srv/ocr/.env")));
    }

    #[test]
    fn explicit_env_file_wins() {
        let c = BackendConfig::builder()
            .env_file("/etc/ocr.env")
            .working_dir("/srv/ocr")
            .build()
            .unwrap();
        assert_eq!(c.env_file.as_deref(), Some(Path::new("/etc/ocr.env")));
    }

    #[test]
    fn no_env_file_disables_it() {
        let c = BackendConfig::builder()
            .working_dir("/srv/ocr")
            .no_env_file()
            .build()
            .unwrap();
        assert!(c.env_file.is_none());
    }

    #[test]
    fn timeout_secs_zero_disables_timeout() {
        let c = BackendConfig::builder().timeout_secs(0).build().unwrap();
        assert!(c.timeout.is_none());
    }

    #[test]
    fn zero_duration_timeout_is_rejected() {
        let err = BackendConfig::builder()
            .timeout(Some(Duration::ZERO))
            .build()
            .unwrap_err();
        assert!(matches!(err, PdfOcrError::InvalidConfig(_)));
    }

    #[test]
    fn empty_program_is_rejected() {
        let err = BackendConfig::builder().program("  ").build().unwrap_err();
        assert!(err.to_string().contains("program"));
    }

    #[test]
    fn debug_hides_observer() {
        let c = BackendConfig::builder()
            .observer(std::sync::Arc::new(crate::progress::NoopObserver))
            .build()
            .unwrap();
        assert!(format!("{c:?}").contains("<dyn InvocationObserver>"));
    }

    #[test]
    fn launcher_serialises_lowercase() {
        assert_eq!(serde_json::to_string(&Launcher::Direct).unwrap(), "\"direct\"");
    }
}
