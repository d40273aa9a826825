//! Service binary for edgequake-docextract.
//!
//! Maps CLI flags to `ExtractionConfig` and `ServerConfig`, warms the
//! conversion engine up and serves the extraction API.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_docextract::{
    AcceleratorDevice, EngineKind, ErrorStatusPolicy, ExtractionConfig, Extractor, Server,
    ServerConfig, WarmupPolicy,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Serve on 0.0.0.0:8998 with docling
  docextract

  # Pre-downloaded docling models, 4 threads, CPU only
  docextract --artifacts-path ~/.cache/docling/models --num-threads 4 --device cpu

  # Lightweight fallback engine (no OCR, no tables)
  docextract --engine pdfium --pdfium-lib /opt/pdfium/lib --no-ocr --no-tables

  # Reject uploads over 50 MB and report unreadable PDFs as 422
  docextract --max-upload-mb 50 --strict-status

  # Send a document
  docextract-client report.pdf

ENVIRONMENT VARIABLES:
  DOCEXTRACT_HOST         Bind address (default 0.0.0.0)
  DOCEXTRACT_PORT         Bind port (default 8998)
  DOCEXTRACT_ENGINE       docling | pdfium
  DOCLING_BIN             docling executable
  DOCLING_ARTIFACTS_PATH  Local docling model directory
  PDFIUM_LIB_PATH         libpdfium file or directory
  RUST_LOG                Overrides the log filter
"#;

/// Serve PDF text, table and image extraction over HTTP.
#[derive(Parser, Debug)]
#[command(
    name = "docextract",
    version,
    about = "Serve PDF text, table and image extraction over HTTP",
    long_about = "Accepts PDF uploads on POST /upload-pdf/ and returns chunked page text, \
table rows and base64 PNG images as JSON. Conversion runs through docling (layout analysis, \
OCR, table structure) or, as a lightweight fallback, pdfium.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Bind address.
    #[arg(long, env = "DOCEXTRACT_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Bind port.
    #[arg(long, env = "DOCEXTRACT_PORT", default_value_t = 8998)]
    port: u16,

    /// Conversion engine: docling or pdfium.
    #[arg(long, env = "DOCEXTRACT_ENGINE", default_value = "docling")]
    engine: EngineKind,

    /// docling executable.
    #[arg(long, env = "DOCLING_BIN", default_value = "docling")]
    docling_bin: PathBuf,

    /// Local docling model directory.
    #[arg(long, env = "DOCLING_ARTIFACTS_PATH")]
    artifacts_path: Option<PathBuf>,

    /// libpdfium shared library, or the directory holding it.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Engine worker threads.
    #[arg(long, env = "DOCEXTRACT_NUM_THREADS", default_value_t = 8)]
    num_threads: usize,

    /// Accelerator device: auto, cpu, cuda, mps.
    #[arg(long, env = "DOCEXTRACT_DEVICE", default_value = "auto")]
    device: AcceleratorDevice,

    /// Picture rendering scale.
    #[arg(long, env = "DOCEXTRACT_IMAGES_SCALE", default_value_t = 2.0)]
    images_scale: f32,

    /// Disable OCR.
    #[arg(long, env = "DOCEXTRACT_NO_OCR")]
    no_ocr: bool,

    /// Disable table structure recognition.
    #[arg(long, env = "DOCEXTRACT_NO_TABLES")]
    no_tables: bool,

    /// Maximum chunk length in characters.
    #[arg(long, env = "DOCEXTRACT_CHUNK_SIZE", default_value_t = 1000)]
    chunk_size: usize,

    /// Characters shared by consecutive chunks.
    #[arg(long, env = "DOCEXTRACT_CHUNK_OVERLAP", default_value_t = 100)]
    chunk_overlap: usize,

    /// Sample document converted once at startup.
    #[arg(long, env = "DOCEXTRACT_WARMUP_PDF", default_value = "test_pdf.pdf")]
    warmup_pdf: PathBuf,

    /// What a failed warm-up does: warn or fail-fast.
    #[arg(long, env = "DOCEXTRACT_WARMUP_POLICY", default_value = "warn")]
    warmup_policy: WarmupPolicy,

    /// Answer 422 instead of 500 when the engine rejects the upload.
    #[arg(long, env = "DOCEXTRACT_STRICT_STATUS")]
    strict_status: bool,

    /// Upload size cap in megabytes (default: unlimited).
    #[arg(long, env = "DOCEXTRACT_MAX_UPLOAD_MB")]
    max_upload_mb: Option<usize>,

    /// Directory for temporary upload files.
    #[arg(long, env = "DOCEXTRACT_TEMP_DIR")]
    temp_dir: Option<PathBuf>,

    /// Allowed CORS origin; repeat for several. Default: any origin.
    #[arg(long = "cors-origin", env = "DOCEXTRACT_CORS_ORIGINS", value_delimiter = ',')]
    cors_origins: Vec<String>,

    /// Log level for this crate and the HTTP layer (error, warn, info, debug, trace).
    #[arg(long, env = "DOCEXTRACT_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Errors only, no warm-up spinner.
    #[arg(short, long, env = "DOCEXTRACT_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let level = if cli.quiet { "error" } else { cli.log_level.as_str() };
    let filter = format!("edgequake_docextract={level},tower_http={level}");
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let extraction = build_extraction_config(&cli).context("Invalid extraction settings")?;
    let server_config = build_server_config(&cli);
    server_config
        .socket_addr()
        .context("Invalid bind address")?;

    let server = Server::new(server_config, Extractor::from_config(&extraction));

    // ── Warm-up ──────────────────────────────────────────────────────────
    let spinner = (!cli.quiet).then(|| {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("Warm-up");
        bar.set_message(format!(
            "{} on {}",
            extraction.engine.kind,
            server.config().warmup_pdf.display()
        ));
        bar.enable_steady_tick(Duration::from_millis(80));
        bar
    });

    let warmed = server.warm_up().await;
    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }
    warmed.context("Warm-up failed")?;

    // ── Serve ────────────────────────────────────────────────────────────
    server.start().await.context("Server failed")?;
    Ok(())
}

/// Map CLI args to `ExtractionConfig`.
fn build_extraction_config(cli: &Cli) -> Result<ExtractionConfig> {
    let mut builder = ExtractionConfig::builder()
        .engine(cli.engine)
        .docling_bin(cli.docling_bin.clone())
        .num_threads(cli.num_threads)
        .device(cli.device)
        .images_scale(cli.images_scale)
        .ocr(!cli.no_ocr)
        .table_structure(!cli.no_tables)
        .chunk_size(cli.chunk_size)
        .chunk_overlap(cli.chunk_overlap);
    if let Some(ref path) = cli.artifacts_path {
        builder = builder.artifacts_path(path.clone());
    }
    if let Some(ref path) = cli.pdfium_lib {
        builder = builder.pdfium_lib_path(path.clone());
    }
    Ok(builder.build()?)
}

/// Map CLI args to `ServerConfig`.
fn build_server_config(cli: &Cli) -> ServerConfig {
    ServerConfig {
        host: cli.host.clone(),
        port: cli.port,
        warmup_pdf: cli.warmup_pdf.clone(),
        warmup_policy: cli.warmup_policy,
        error_status: if cli.strict_status {
            ErrorStatusPolicy::Strict
        } else {
            ErrorStatusPolicy::Legacy
        },
        max_upload_bytes: cli.max_upload_mb.map(|mb| mb.saturating_mul(1024 * 1024)),
        temp_dir: cli.temp_dir.clone(),
        cors_origins: cli.cors_origins.clone(),
    }
}
