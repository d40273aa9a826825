//! # edgequake-docextract
//!
//! Extract chunked text, tables and images from PDF documents, as a library
//! or as an HTTP service.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Upload   multipart `file` → temporary `upload-*.pdf` (always removed)
//!  ├─ 2. Convert  docling (layout, OCR, table structure) or pdfium, once per document
//!  ├─ 3. Text     per-page markdown → recursive splitter (1000 chars, 100 overlap)
//!  ├─ 4. Tables   one list of row records per table
//!  └─ 5. Images   base64 PNG + <img> tag + caption texts per picture
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_docextract::{Extractor, ExtractionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ExtractionConfig::builder().num_threads(4).build()?;
//!     let extractor = Extractor::from_config(&config);
//!     let output = extractor.extract("document.pdf").await?;
//!     println!("{}", serde_json::to_string_pretty(&output)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `server` | on      | The axum HTTP service ([`server`]) |
//! | `cli`    | on      | The `docextract` and `docextract-client` binaries |
//!
//! Library-only use:
//! ```toml
//! edgequake-docextract = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
#[cfg(feature = "server")]
pub mod server;
pub mod upload;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    AcceleratorDevice, ChunkConfig, EngineConfig, EngineKind, ErrorStatusPolicy,
    ExtractionConfig, ExtractionConfigBuilder, PipelineOptions, ServerConfig, WarmupPolicy,
};
pub use document::ConvertedDocument;
pub use engine::{ConversionEngine, ConversionTimings};
pub use error::{ErrorKind, ExtractError};
pub use extract::Extractor;
pub use output::{ChunkMetadata, ExtractionOutput, ImageRecord, TableRecord, TextChunk};
#[cfg(feature = "server")]
pub use server::Server;
pub use upload::UploadedDocument;
