//! CLI binary for cv-screen.
//!
//! `cv-screen serve` runs the HTTP endpoint; `cv-screen classify` screens a
//! single file or URL and prints the result. Both map flags and env vars onto
//! `PipelineConfig`; the library itself never reads the environment.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use cv_screen::server::{self, AppState, ServerConfig};
use cv_screen::{
    ClassificationResult, OcrMode, OcrProgressCallback, PipelineConfig, ProgressCallback, Screener,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}

// ── OCR progress bar ─────────────────────────────────────────────────────

/// Progress bar for the OCR fallback. Stays hidden for documents with a text
/// layer, since no OCR event fires for them.
struct CliProgressCallback {
    bar: ProgressBar,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            bar: ProgressBar::hidden(),
            errors: AtomicUsize::new(0),
        })
    }
}

impl OcrProgressCallback for CliProgressCallback {
    fn on_ocr_start(&self, total_pages: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}/{len} pages  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ");

        self.bar.set_draw_target(indicatif::ProgressDrawTarget::stderr());
        self.bar.set_length(total_pages as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("OCR");
        self.bar.enable_steady_tick(Duration::from_millis(80));
    }

    fn on_page_complete(&self, page_num: usize, total_pages: usize, text_len: usize) {
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}",
            green("✓"),
            page_num,
            total_pages,
            dim(&format!("{text_len:>5} chars")),
        ));
        self.bar.inc(1);
    }

    fn on_page_error(&self, page_num: usize, total_pages: usize, error: String) {
        self.errors.fetch_add(1, Ordering::SeqCst);
        let msg: String = if error.chars().count() > 80 {
            error.chars().take(79).chain(['…']).collect()
        } else {
            error
        };
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}",
            red("✗"),
            page_num,
            total_pages,
            red(&msg),
        ));
        self.bar.inc(1);
    }

    fn on_ocr_complete(&self, total_pages: usize, success_count: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} OCR: {}/{} pages transcribed ({} failed)",
            if success_count == total_pages {
                green("✔")
            } else {
                red("⚠")
            },
            success_count,
            total_pages,
            self.errors.load(Ordering::SeqCst),
        );
    }
}

// ── Arguments ────────────────────────────────────────────────────────────

/// Screen resumes with language models.
#[derive(Parser, Debug)]
#[command(
    name = "cv-screen",
    version,
    about = "Extract and classify resumes (PDF) with language models",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "CV_SCREEN_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "CV_SCREEN_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server exposing POST /procesar-cv/.
    Serve {
        /// Interface to bind.
        #[arg(long, env = "CV_SCREEN_HOST", default_value = "0.0.0.0")]
        host: String,

        /// Port to listen on.
        #[arg(long, env = "CV_SCREEN_PORT", default_value_t = 8000)]
        port: u16,

        /// Largest accepted upload in bytes.
        #[arg(long, env = "CV_SCREEN_MAX_UPLOAD", default_value_t = 20 * 1024 * 1024)]
        max_upload_bytes: usize,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },

    /// Screen one resume and print the result as JSON.
    Classify {
        /// Local PDF path or HTTP/HTTPS URL.
        input: String,

        /// Include extraction details and timings in the output.
        #[arg(long)]
        details: bool,

        /// Disable the OCR progress bar.
        #[arg(long, env = "CV_SCREEN_NO_PROGRESS")]
        no_progress: bool,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },
}

#[derive(Args, Debug)]
struct PipelineArgs {
    /// Credential for the model service. Without it every model call fails.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Vision model used to transcribe scanned pages.
    #[arg(long, env = "CV_SCREEN_OCR_MODEL", default_value = cv_screen::config::DEFAULT_MODEL)]
    ocr_model: String,

    /// Model used to classify the extracted text.
    #[arg(long, env = "CV_SCREEN_MODEL", default_value = cv_screen::config::DEFAULT_MODEL)]
    model: String,

    /// Transcribe scanned pages one at a time instead of concurrently.
    #[arg(long, env = "CV_SCREEN_SEQUENTIAL")]
    sequential: bool,

    /// Number of pages transcribed concurrently.
    #[arg(short, long, env = "CV_SCREEN_CONCURRENCY", default_value_t = 8)]
    concurrency: usize,

    /// Longest edge of a rendered page, in pixels.
    #[arg(long, env = "CV_SCREEN_MAX_PIXELS", default_value_t = 2000)]
    max_pixels: u32,

    /// Per-call model timeout in seconds.
    #[arg(long, env = "CV_SCREEN_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// HTTP download timeout in seconds for URL inputs.
    #[arg(long, env = "CV_SCREEN_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "CV_SCREEN_PDF_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Path to the pdfium shared library.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_library: Option<PathBuf>,
}

impl PipelineArgs {
    fn build(&self, progress: Option<ProgressCallback>) -> Result<PipelineConfig> {
        let mut builder = PipelineConfig::builder()
            .ocr_model(&self.ocr_model)
            .classifier_model(&self.model)
            .ocr_mode(if self.sequential {
                OcrMode::Sequential
            } else {
                OcrMode::Parallel
            })
            .concurrency(self.concurrency)
            .max_rendered_pixels(self.max_pixels)
            .api_timeout_secs(self.api_timeout)
            .download_timeout_secs(self.download_timeout);

        if let Some(ref key) = self.api_key {
            builder = builder.api_key(key);
        }
        if let Some(ref password) = self.password {
            builder = builder.password(password);
        }
        if let Some(ref library) = self.pdfium_library {
            builder = builder.pdfium_library(library);
        }
        if let Some(cb) = progress {
            builder = builder.progress_callback(cb);
        }

        builder.build().context("Invalid configuration")
    }
}

// ── Entry point ──────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
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

    match cli.command {
        Command::Serve {
            host,
            port,
            max_upload_bytes,
            pipeline,
        } => {
            let config = pipeline.build(None)?;
            let server_config = ServerConfig {
                host,
                port,
                max_upload_bytes,
            };
            let state = AppState::new(Screener::new(config), &server_config);
            server::serve(&server_config, state)
                .await
                .context("Server failed")?;
        }
        Command::Classify {
            input,
            details,
            no_progress,
            pipeline,
        } => {
            let progress: Option<ProgressCallback> = if cli.quiet || no_progress {
                None
            } else {
                Some(CliProgressCallback::new() as Arc<dyn OcrProgressCallback>)
            };
            let screener = Screener::new(pipeline.build(progress)?);
            let output = screener
                .screen_input(&input)
                .await
                .with_context(|| format!("Failed to screen '{input}'"))?;

            let json = if details {
                serde_json::to_string_pretty(&output)
            } else {
                serde_json::to_string_pretty(&output.result)
            }
            .context("Failed to serialise result")?;
            println!("{json}");

            if !cli.quiet {
                let verdict = match &output.result {
                    ClassificationResult::Classified(c) if c.is_candidate => green("candidate"),
                    ClassificationResult::Classified(_) => dim("not a candidate"),
                    ClassificationResult::Unparsed { .. } => red("unparsed answer"),
                    ClassificationResult::Failed { .. } => red("model call failed"),
                };
                eprintln!(
                    "{}  {:?}  {}ms",
                    verdict, output.extraction.method, output.stats.total_duration_ms
                );
            }
        }
    }

    Ok(())
}
