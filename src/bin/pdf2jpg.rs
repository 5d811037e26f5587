//! CLI binary for pdf2jpg.
//!
//! A thin shim over the library crate: sets up logging, loads the settings
//! file, binds PDFium and runs the batch. Running it with no arguments is the
//! normal mode of operation; every flag only adjusts where things live or how
//! chatty the output is.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2jpg::{
    load_or_create, BatchProgressCallback, Converter, PdfiumRenderer, SettingsOutcome,
    DEFAULT_SETTINGS_FILE,
};
use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

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
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar over the candidate files plus a log
/// line per finished file.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Wall-clock start of the file currently being converted.
    file_started: Mutex<Option<Instant>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    /// Spinner until `on_batch_start` tells us how many files there are.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Scanning input directory…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            file_started: Mutex::new(None),
            errors: AtomicUsize::new(0),
        })
    }

    fn elapsed_secs(&self) -> f64 {
        self.file_started
            .lock()
            .ok()
            .and_then(|mut started| started.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_files: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} files  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total_files as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("Converting");
        self.bar.reset_eta();
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Found {total_files} PDF files to convert"))
        ));
    }

    fn on_file_start(&self, _index: usize, _total: usize, path: &Path) {
        if let Ok(mut started) = self.file_started.lock() {
            *started = Some(Instant::now());
        }
        self.bar.set_message(file_name(path));
    }

    fn on_file_complete(&self, index: usize, total: usize, path: &Path, pages: usize) {
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}  {}",
            green("✓"),
            index,
            total,
            file_name(path),
            dim(&format!("{pages} pages")),
            dim(&format!("{:.1}s", self.elapsed_secs())),
        ));
        self.bar.inc(1);
    }

    fn on_file_error(&self, index: usize, total: usize, path: &Path, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);

        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}  {}",
            red("✗"),
            index,
            total,
            file_name(path),
            red(&msg),
            dim(&format!("{:.1}s", self.elapsed_secs())),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_files: usize, converted: usize) {
        self.bar.finish_and_clear();
        let failed = self.errors.load(Ordering::SeqCst);

        if failed == 0 {
            eprintln!(
                "{} {} files converted successfully",
                green("✔"),
                bold(&converted.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} files converted  ({} failed)",
                if converted == 0 { red("✘") } else { cyan("⚠") },
                bold(&converted.to_string()),
                total_files,
                red(&failed.to_string()),
            );
        }
    }
}

/// Convert every PDF in a directory to JPEG page images.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2jpg",
    version,
    about = "Convert every PDF in a directory to JPEG page images",
    long_about = "Convert every PDF in the configured input directory to JPEG page images. \
All behaviour is driven by the settings file; on first run a template is written and \
the program exits so it can be filled in. Converted PDFs are renamed to \
<name>_processed.pdf and skipped on later runs.",
    color = clap::ColorChoice::Auto
)]
struct Cli {
    /// Settings file (created as a template if missing).
    #[arg(short, long, env = "PDF2JPG_CONFIG", default_value = DEFAULT_SETTINGS_FILE)]
    config: PathBuf,

    /// Append log records to this file.
    #[arg(long, env = "PDF2JPG_LOG_FILE", default_value = "pdf2jpg.log")]
    log_file: PathBuf,

    /// Disable progress bar.
    #[arg(long, env = "PDF2JPG_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2JPG_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2JPG_QUIET")]
    quiet: bool,
}

/// Log to stderr and, when it can be opened, to `cli.log_file`.
///
/// The file always receives INFO (DEBUG with `--verbose`); stderr is quieter
/// while the progress bar is showing. An unusable log file only costs the
/// file copy of the log.
fn init_logging(cli: &Cli, show_progress: bool) {
    let stderr_level = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };
    let file_level = if cli.verbose { "debug" } else { "info" };

    let stderr_layer = fmt::layer().with_writer(io::stderr).with_filter(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(stderr_level)),
    );

    let file_layer = match OpenOptions::new()
        .create(true)
        .append(true)
        .open(&cli.log_file)
    {
        Ok(file) => Some(
            fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .with_filter(EnvFilter::new(file_level)),
        ),
        Err(e) => {
            eprintln!(
                "warning: cannot open log file {}: {e}; logging to stderr only",
                cli.log_file.display()
            );
            None
        }
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let show_progress = !cli.quiet && !cli.no_progress;
    init_logging(&cli, show_progress);

    // ── Settings ─────────────────────────────────────────────────────────
    let settings = match load_or_create(&cli.config).context("Failed to load settings")? {
        SettingsOutcome::Loaded(settings) => settings,
        SettingsOutcome::Created(path) => {
            eprintln!(
                "The settings file did not exist. An example has been created: {}\n\
                 Fill in input_dir and output_dir, then run pdf2jpg again.",
                bold(&path.display().to_string())
            );
            return Ok(ExitCode::FAILURE);
        }
    };

    // Fail on bad directories before PDFium is fetched.
    settings.prepare_dirs().context("Invalid settings")?;

    // ── PDFium engine ────────────────────────────────────────────────────
    // On the very first run the library (~30 MB) is downloaded from
    // bblanchon/pdfium-binaries and cached; later runs only check the path.
    let renderer = PdfiumRenderer::new().context("Failed to load the PDFium engine")?;

    // ── Run the batch ────────────────────────────────────────────────────
    let mut converter = Converter::new(renderer);
    if show_progress {
        converter = converter.with_progress(CliProgressCallback::new_dynamic());
    }

    info!("Starting PDF to JPG conversion process");
    let report = converter
        .convert_directory(&settings)
        .context("Batch conversion failed")?;

    if !cli.quiet && !show_progress {
        eprintln!(
            "Conversion process completed. Successful: {}, Failed: {}",
            report.converted.len(),
            report.failed.len()
        );
        for failed in &report.failed {
            eprintln!("  {} {}: {}", red("✗"), failed.source.display(), failed.error);
        }
    }

    Ok(ExitCode::SUCCESS)
}
