//! CLI binary for pdf-ocr-tool.
//!
//! A thin shim over the library crate that maps CLI flags to `BackendConfig`,
//! runs the backend, and prints results.

use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf_ocr_tool::{
    transcribe_batch, transcribe_to_file, BackendConfig, BackendFailure, CancellationToken,
    InvocationObserver, Launcher, OcrOutcome, OcrRequest, Observer, PdfOcrTool, Tool,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI observer using indicatif ─────────────────────────────────────────────

/// Spinner that stays up while backends run and logs one line per finished PDF.
struct CliObserver {
    bar: ProgressBar,
    total: usize,
    running: AtomicUsize,
    done: AtomicUsize,
}

impl CliObserver {
    fn new(total: usize) -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  ⏱ {elapsed_precise}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("OCR");
        bar.set_message("starting backend…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self {
            bar,
            total,
            running: AtomicUsize::new(0),
            done: AtomicUsize::new(0),
        })
    }

    fn refresh(&self) {
        let running = self.running.load(Ordering::SeqCst);
        let done = self.done.load(Ordering::SeqCst);
        self.bar
            .set_message(format!("{done}/{} done, {running} running", self.total));
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl InvocationObserver for CliObserver {
    fn on_spawn(&self, _pdf_path: &Path, _pid: Option<u32>) {
        self.running.fetch_add(1, Ordering::SeqCst);
        self.refresh();
    }

    fn on_success(&self, pdf_path: &Path, text_len: usize, duration_ms: u64) {
        self.running.fetch_sub(1, Ordering::SeqCst);
        self.done.fetch_add(1, Ordering::SeqCst);
        self.bar.println(format!(
            "  {} {}  {}  {}",
            green("✓"),
            pdf_path.display(),
            dim(&format!("{text_len:>6} chars")),
            dim(&format!("{:.1}s", duration_ms as f64 / 1000.0)),
        ));
        self.refresh();
    }

    fn on_failure(&self, pdf_path: &Path, failure: &BackendFailure) {
        // Spawn failures and pre-spawn cancels never incremented `running`.
        let _ = self
            .running
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        self.done.fetch_add(1, Ordering::SeqCst);
        let msg = failure.to_string();
        let msg = match msg.char_indices().nth(100) {
            Some((cut, _)) => format!("{}\u{2026}", &msg[..cut]),
            None => msg,
        };
        self.bar
            .println(format!("  {} {}  {}", red("✗"), pdf_path.display(), red(&msg)));
        self.refresh();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Transcribe to stdout (markdown)
  pdf-ocr /tmp/doc.pdf

  # Plain text into a file
  pdf-ocr --format text /tmp/doc.pdf -o doc.txt

  # Several documents, two backends at a time, JSON results
  pdf-ocr -j 2 --json a.pdf b.pdf c.pdf

  # Print the tool descriptor a host runtime would register
  pdf-ocr --describe

  # Execute exactly as a host runtime would
  pdf-ocr --args '{"pdf_path": "/tmp/doc.pdf", "output_format": "text"}'

  # Run the backend script with a specific interpreter instead of uv
  pdf-ocr --launcher direct --program python3 --tool-dir ./tool /tmp/doc.pdf

BACKEND COMMAND:
  uv launcher:      uv run --directory <TOOL_DIR> --env-file <ENV_FILE> <SCRIPT> <PDF> <FORMAT>
  direct launcher:  <PROGRAM> <SCRIPT> <PDF> <FORMAT>   (cwd = TOOL_DIR, ENV_FILE loaded)

ENVIRONMENT VARIABLES:
  PDF_OCR_TOOL_DIR        Backend working directory (default ~/.config/opencode/tool)
  PDF_OCR_ENV_FILE        Backend env file (default <TOOL_DIR>/.env)
  PDF_OCR_PROGRAM         Launcher executable (default uv)
  PDF_OCR_SCRIPT          Backend script (default pdf_ocr_backend.py)
  PDF_OCR_TIMEOUT         Seconds before the backend is killed (0 = never)
  RUST_LOG                Override log filter
"#;

/// Transcribe PDF documents through an external OCR backend.
#[derive(Parser, Debug)]
#[command(
    name = "pdf-ocr",
    version,
    about = "Transcribe PDF documents to markdown or text through an external OCR backend",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF file path(s), ideally absolute.
    #[arg(required_unless_present_any = ["describe", "args"])]
    inputs: Vec<String>,

    /// Output format passed to the backend (markdown, text, or anything it accepts).
    #[arg(short, long, env = "PDF_OCR_FORMAT")]
    format: Option<String>,

    /// Write the result to this file instead of stdout (single input only).
    #[arg(short, long, env = "PDF_OCR_OUTPUT")]
    output: Option<PathBuf>,

    /// Print results as JSON outcomes instead of raw text.
    #[arg(long, env = "PDF_OCR_JSON")]
    json: bool,

    /// Print the tool descriptor as JSON and exit.
    #[arg(long, conflicts_with_all = ["inputs", "args"])]
    describe: bool,

    /// Execute the tool with a JSON argument object, as a host runtime would.
    #[arg(long, value_name = "JSON", conflicts_with = "inputs")]
    args: Option<String>,

    /// Backend working directory.
    #[arg(long, env = "PDF_OCR_TOOL_DIR")]
    tool_dir: Option<PathBuf>,

    /// Env file handed to the backend.
    #[arg(long, env = "PDF_OCR_ENV_FILE", conflicts_with = "no_env_file")]
    env_file: Option<PathBuf>,

    /// Run the backend without an env file.
    #[arg(long)]
    no_env_file: bool,

    /// Launcher executable.
    #[arg(long, env = "PDF_OCR_PROGRAM")]
    program: Option<String>,

    /// Backend script, relative to the tool directory.
    #[arg(long, env = "PDF_OCR_SCRIPT")]
    script: Option<PathBuf>,

    /// How to start the backend script.
    #[arg(long, env = "PDF_OCR_LAUNCHER", value_enum, default_value = "uv")]
    launcher: LauncherArg,

    /// Seconds before the backend is killed (0 = never).
    #[arg(long, env = "PDF_OCR_TIMEOUT", default_value_t = pdf_ocr_tool::config::DEFAULT_TIMEOUT_SECS)]
    timeout: u64,

    /// Maximum backends running at once when several inputs are given.
    #[arg(short = 'j', long, env = "PDF_OCR_CONCURRENCY", default_value_t = 1)]
    concurrency: usize,

    /// Disable the spinner.
    #[arg(long, env = "PDF_OCR_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF_OCR_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF_OCR_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum LauncherArg {
    Uv,
    Direct,
}

impl From<LauncherArg> for Launcher {
    fn from(v: LauncherArg) -> Self {
        match v {
            LauncherArg::Uv => Launcher::Uv,
            LauncherArg::Direct => Launcher::Direct,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner replaces INFO logs; --verbose always wins.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.describe;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Cancellation on Ctrl-C ───────────────────────────────────────────
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, stopping OCR backend");
                cancel.cancel();
            }
        });
    }

    // ── Descriptor mode ──────────────────────────────────────────────────
    if cli.describe {
        let tool = PdfOcrTool::new(build_config(&cli, None)?);
        println!(
            "{}",
            serde_json::to_string_pretty(&tool.descriptor())
                .context("Failed to serialise descriptor")?
        );
        return Ok(());
    }

    let observer = show_progress.then(|| CliObserver::new(cli.inputs.len().max(1)));
    let config = build_config(&cli, observer.clone().map(|o| o as Observer))?;

    // ── Host-runtime mode ────────────────────────────────────────────────
    if let Some(ref raw) = cli.args {
        let args: serde_json::Value =
            serde_json::from_str(raw).context("--args is not valid JSON")?;
        let tool = PdfOcrTool::new(config);
        let result = tool.execute(args, cancel).await;
        if let Some(ref obs) = observer {
            obs.finish();
        }
        let text = result.context("Tool execution failed")?;
        write_stdout(&text)?;
        return Ok(());
    }

    // ── Single input to file ─────────────────────────────────────────────
    if let Some(ref output_path) = cli.output {
        if cli.inputs.len() != 1 {
            bail!("--output accepts exactly one input, got {}", cli.inputs.len());
        }
        let request = OcrRequest::new(&cli.inputs[0], cli.format.as_deref())?;
        let result = tokio::select! {
            res = transcribe_to_file(&request, output_path, &config) => res,
            _ = cancel.cancelled() => Err(BackendFailure::Cancelled.into()),
        };
        if let Some(ref obs) = observer {
            obs.finish();
        }
        let output = result.context("OCR failed")?;
        if !cli.quiet {
            eprintln!(
                "{}  {} chars  {}ms  →  {}",
                green("✔"),
                output.text.len(),
                output.stats.duration_ms,
                bold(&output_path.display().to_string()),
            );
        }
        return Ok(());
    }

    // ── One or more inputs to stdout ─────────────────────────────────────
    let requests = cli
        .inputs
        .iter()
        .map(|p| OcrRequest::new(p, cli.format.as_deref()))
        .collect::<Result<Vec<_>, _>>()?;

    let outcomes = transcribe_batch(&requests, &config, cli.concurrency, cancel).await;
    if let Some(ref obs) = observer {
        obs.finish();
    }
    let outcomes = outcomes.context("OCR failed")?;

    if cli.json {
        let json = if outcomes.len() == 1 {
            serde_json::to_string_pretty(&outcomes[0])
        } else {
            serde_json::to_string_pretty(&outcomes)
        }
        .context("Failed to serialise output")?;
        println!("{json}");
    } else {
        print_text(&outcomes)?;
    }

    let failed = outcomes.iter().filter(|o| !o.is_success()).count();
    if failed > 0 {
        if outcomes.len() == 1 {
            if let Some(failure) = outcomes[0].failure() {
                bail!("OCR failed: {failure}");
            }
        }
        bail!("{failed}/{} documents failed", outcomes.len());
    }
    Ok(())
}

/// Map CLI args to `BackendConfig`.
fn build_config(cli: &Cli, observer: Option<Observer>) -> Result<BackendConfig> {
    let mut builder = BackendConfig::builder()
        .launcher(cli.launcher.into())
        .timeout_secs(cli.timeout);

    if let Some(ref dir) = cli.tool_dir {
        builder = builder.working_dir(dir);
    }
    if let Some(ref program) = cli.program {
        builder = builder.program(program);
    }
    if let Some(ref script) = cli.script {
        builder = builder.script(script);
    }
    if cli.no_env_file {
        builder = builder.no_env_file();
    } else if let Some(ref env_file) = cli.env_file {
        builder = builder.env_file(env_file);
    }
    if let Some(obs) = observer {
        builder = builder.observer(obs);
    }

    builder.build().context("Invalid configuration")
}

/// Print successful results to stdout and failures to stderr.
///
/// With more than one input each result gets a `==> path <==` header.
fn print_text(outcomes: &[OcrOutcome]) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let headers = outcomes.len() > 1;

    for (i, outcome) in outcomes.iter().enumerate() {
        match outcome {
            OcrOutcome::Success(out) => {
                if headers {
                    if i > 0 {
                        writeln!(handle).context("Failed to write to stdout")?;
                    }
                    writeln!(handle, "==> {} <==", out.pdf_path.display())
                        .context("Failed to write to stdout")?;
                }
                writeln!(handle, "{}", out.text).context("Failed to write to stdout")?;
            }
            OcrOutcome::Failure { pdf_path, failure } => {
                if headers {
                    eprintln!("{} {}: {}", red("✗"), pdf_path.display(), failure);
                }
            }
        }
    }
    Ok(())
}

fn write_stdout(text: &str) -> Result<()> {
    let stdout = io::stdout();
    write_text(&mut stdout.lock(), text).context("Failed to write to stdout")
}

/// Write `text`, ending with exactly one trailing newline if it had none.
fn write_text(w: &mut impl Write, text: &str) -> io::Result<()> {
    w.write_all(text.as_bytes())?;
    if !text.ends_with('\n') {
        w.write_all(b"\n")?;
    }
    w.flush()
}
