//! The extraction service object.
//!
//! One [`Extractor`] is built at startup and shared by every request. It
//! owns the conversion engine and the chunking configuration; each call
//! converts the document once and runs the three extraction passes.

use crate::config::{ChunkConfig, ExtractionConfig};
use crate::engine::{build_engine, convert_timed, ConversionEngine, ConversionTimings};
use crate::error::ExtractError;
use crate::output::ExtractionOutput;
use crate::pipeline::{chunk::RecursiveCharacterSplitter, extract_document};
use crate::upload::UploadedDocument;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Converts PDFs and extracts chunked text, tables and images.
///
/// Cloning is cheap; clones share the engine.
///
/// # Example
/// ```rust,no_run
/// use edgequake_docextract::{Extractor, ExtractionConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let extractor = Extractor::from_config(&ExtractionConfig::default());
/// let output = extractor.extract("report.pdf").await?;
/// println!("{} chunks", output.text.len());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Extractor {
    engine: Arc<dyn ConversionEngine>,
    splitter: RecursiveCharacterSplitter,
}

impl fmt::Debug for Extractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extractor")
            .field("engine", &self.engine.name())
            .field("chunking", self.splitter.config())
            .finish()
    }
}

impl Extractor {
    pub fn new(engine: Arc<dyn ConversionEngine>, chunking: ChunkConfig) -> Self {
        Self {
            engine,
            splitter: RecursiveCharacterSplitter::new(chunking),
        }
    }

    /// Build the engine named by `config` and wrap it.
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new(build_engine(&config.engine), config.chunking.clone())
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    pub fn chunk_config(&self) -> &ChunkConfig {
        self.splitter.config()
    }

    /// Convert the PDF at `pdf_path` and extract everything from it.
    ///
    /// Chunk and table metadata carry `pdf_path` as the filename. Any failure
    /// fails the whole call; there are no partial results.
    pub async fn extract(
        &self,
        pdf_path: impl AsRef<Path>,
    ) -> Result<ExtractionOutput, ExtractError> {
        let total_start = Instant::now();
        let path = pdf_path.as_ref().to_path_buf();
        info!("Starting extraction: {}", path.display());

        // ── Step 1: Convert ──────────────────────────────────────────────────
        let engine = Arc::clone(&self.engine);
        let conv_path = path.clone();
        let result = tokio::task::spawn_blocking(move || convert_timed(engine.as_ref(), &conv_path))
            .await
            .map_err(|e| ExtractError::Internal(format!("Conversion task panicked: {}", e)))??;

        // ── Step 2: Text, tables, images ─────────────────────────────────────
        let splitter = self.splitter.clone();
        let filename = path.to_string_lossy().into_owned();
        let output =
            tokio::task::spawn_blocking(move || extract_document(&result, &filename, &splitter))
                .await
                .map_err(|e| {
                    ExtractError::Internal(format!("Extraction task panicked: {}", e))
                })??;

        info!(
            "Extraction complete: {} chunks, {} tables, {} images in {:.2}s",
            output.text.len(),
            output.tables.len(),
            output.images.len(),
            total_start.elapsed().as_secs_f64()
        );
        Ok(output)
    }

    /// Extract from in-memory PDF bytes via a temporary file.
    ///
    /// The temporary file is removed before this returns.
    pub async fn extract_bytes(&self, bytes: &[u8]) -> Result<ExtractionOutput, ExtractError> {
        let upload = UploadedDocument::persist(bytes, None, None)?;
        self.extract(upload.path()).await
    }

    /// Blocking variant of [`extract`](Self::extract) for non-async callers.
    pub fn extract_sync(&self, pdf_path: impl AsRef<Path>) -> Result<ExtractionOutput, ExtractError> {
        let path = pdf_path.as_ref();
        let result = convert_timed(self.engine.as_ref(), path)?;
        extract_document(&result, &path.to_string_lossy(), &self.splitter)
    }

    /// Convert `sample` once and discard the result, so that model loading
    /// happens before the first real request.
    pub async fn warm_up(&self, sample: impl AsRef<Path>) -> Result<ConversionTimings, ExtractError> {
        let path = sample.as_ref().to_path_buf();
        info!("Warming up {} engine with '{}'", self.engine.name(), path.display());

        let engine = Arc::clone(&self.engine);
        let result = tokio::task::spawn_blocking(move || convert_timed(engine.as_ref(), &path))
            .await
            .map_err(|e| ExtractError::Internal(format!("Warm-up task panicked: {}", e)))??;

        debug!("Warm-up converted {} pages", result.document.num_pages());
        Ok(result.timings)
    }
}
