//! Extraction passes over a converted document.
//!
//! Each submodule implements exactly one pass. All three read the same
//! [`ConvertedDocument`](crate::document::ConvertedDocument) and share
//! nothing with each other.
//!
//! ## Data Flow
//!
//! ```text
//!                 ┌─▶ text   (per-page markdown ─▶ chunk) ─▶ Vec<TextChunk>
//! ConversionResult┼─▶ tables (row records)                 ─▶ Vec<TableRecord>
//!                 └─▶ images (PNG ─▶ base64 + captions)    ─▶ Vec<ImageRecord>
//! ```
//!
//! 1. [`text`]   export every page as markdown and split it with [`chunk`]
//! 2. [`tables`] one row-record table per table item, in inventory order
//! 3. [`images`] one encoded image per picture, in reading order
//!
//! Passes run sequentially; the first error aborts the whole extraction.

pub mod chunk;
pub mod images;
pub mod tables;
pub mod text;

use crate::engine::ConversionResult;
use crate::error::ExtractError;
use crate::output::ExtractionOutput;
use chunk::RecursiveCharacterSplitter;
use tracing::debug;

/// Run the text, tables and images passes in order.
pub fn extract_document(
    result: &ConversionResult,
    filename: &str,
    splitter: &RecursiveCharacterSplitter,
) -> Result<ExtractionOutput, ExtractError> {
    let doc = &result.document;

    let text = text::extract_text(doc, filename, splitter);
    debug!("Text pass: {} chunks", text.len());

    let tables = tables::extract_tables(doc, filename)?;
    debug!("Tables pass: {} tables", tables.len());

    let images = images::extract_images(doc, filename)?;
    debug!("Images pass: {} images", images.len());

    Ok(ExtractionOutput {
        text,
        tables,
        images,
    })
}
