//! Conversion engines: PDF path in, [`ConvertedDocument`] out.
//!
//! Engines are synchronous and may be slow (model inference, subprocesses);
//! callers run them on the blocking thread pool. One engine instance is
//! shared by every request.

pub mod docling;
pub mod pdfium;

pub use self::docling::DoclingEngine;
pub use self::pdfium::PdfiumEngine;

use crate::config::{EngineConfig, EngineKind};
use crate::document::ConvertedDocument;
use crate::error::ExtractError;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

/// Turns a PDF file into a structured document.
pub trait ConversionEngine: Send + Sync {
    /// Short identifier used in logs and error messages.
    fn name(&self) -> &str;

    /// Convert the PDF at `pdf_path`. Called once per document.
    fn convert(&self, pdf_path: &Path) -> Result<ConvertedDocument, ExtractError>;
}

/// Wall-clock timings of one conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConversionTimings {
    pub pipeline_total: Duration,
}

/// A converted document plus how long it took.
#[derive(Debug, Clone)]
pub struct ConversionResult {
    pub document: ConvertedDocument,
    pub timings: ConversionTimings,
}

/// Run `engine` on `pdf_path`, timing the call.
pub fn convert_timed(
    engine: &dyn ConversionEngine,
    pdf_path: &Path,
) -> Result<ConversionResult, ExtractError> {
    if !pdf_path.exists() {
        return Err(ExtractError::FileNotFound {
            path: pdf_path.to_path_buf(),
        });
    }

    let start = Instant::now();
    let document = engine.convert(pdf_path)?;
    let timings = ConversionTimings {
        pipeline_total: start.elapsed(),
    };
    info!(
        "{} converted '{}': {} pages in {:.2}s",
        engine.name(),
        pdf_path.display(),
        document.num_pages(),
        timings.pipeline_total.as_secs_f64()
    );

    Ok(ConversionResult { document, timings })
}

/// Construct the engine selected by `config`.
pub fn build_engine(config: &EngineConfig) -> Arc<dyn ConversionEngine> {
    match config.kind {
        EngineKind::Docling => Arc::new(DoclingEngine::new(
            config.docling_bin.clone(),
            config.pipeline.clone(),
            config.artifacts_path.clone(),
        )),
        EngineKind::Pdfium => Arc::new(PdfiumEngine::new(
            config.pdfium_lib_path.clone(),
            config.pipeline.clone(),
        )),
    }
}
