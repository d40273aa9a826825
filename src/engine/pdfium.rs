//! In-process pdfium engine.
//!
//! Produces one page entry per PDF page, the page's text layer as paragraph
//! items, and every embedded raster image object as a picture. There is no
//! OCR and no table recognition, so scanned pages yield no text and tables
//! come out as plain paragraphs.

use super::ConversionEngine;
use crate::config::PipelineOptions;
use crate::document::{
    BoundingBox, ConvertedDocument, CoordOrigin, DocItemLabel, DocumentBuilder, ImageRef,
    ProvenanceItem, Size,
};
use crate::error::ExtractError;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Converts PDFs with the pdfium library.
#[derive(Debug, Clone)]
pub struct PdfiumEngine {
    lib_path: Option<PathBuf>,
    options: PipelineOptions,
}

impl PdfiumEngine {
    /// `lib_path` may name the shared library itself or the directory holding
    /// it. Without it the system library is used.
    pub fn new(lib_path: Option<PathBuf>, options: PipelineOptions) -> Self {
        if options.do_ocr {
            warn!("pdfium engine has no OCR; scanned pages will yield no text");
        }
        if options.do_table_structure {
            warn!("pdfium engine has no table recognition; tables will be empty");
        }
        Self { lib_path, options }
    }

    fn bind(&self) -> Result<Pdfium, ExtractError> {
        let bindings = match &self.lib_path {
            Some(path) if path.is_file() => Pdfium::bind_to_library(path),
            Some(dir) => {
                Pdfium::bind_to_library(&Pdfium::pdfium_platform_library_name_at_path(dir))
            }
            None => Pdfium::bind_to_system_library(),
        }
        .map_err(|e| ExtractError::EngineUnavailable {
            engine: self.name().to_string(),
            detail: format!("{:?}", e),
        })?;
        Ok(Pdfium::new(bindings))
    }
}

impl ConversionEngine for PdfiumEngine {
    fn name(&self) -> &str {
        "pdfium"
    }

    fn convert(&self, pdf_path: &Path) -> Result<ConvertedDocument, ExtractError> {
        let pdfium = self.bind()?;

        let document = pdfium.load_pdf_from_file(pdf_path, None).map_err(|e| {
            let err_str = format!("{:?}", e);
            let detail = if err_str.to_lowercase().contains("password") {
                "document is encrypted and requires a password".to_string()
            } else {
                err_str
            };
            ExtractError::InputRejected {
                path: pdf_path.to_path_buf(),
                detail,
            }
        })?;

        let title = document
            .metadata()
            .get(PdfDocumentMetadataTagType::Title)
            .map(|t| t.value().to_string())
            .filter(|v| !v.is_empty());
        let name = title.unwrap_or_else(|| {
            pdf_path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default()
        });

        let mut builder = DocumentBuilder::new(name);
        let pages = document.pages();
        info!("PDF loaded: {} pages", pages.len());

        for (index, page) in pages.iter().enumerate() {
            let page_no = index as u32 + 1;
            builder.page(
                page_no,
                Size {
                    width: page.width().value as f64,
                    height: page.height().value as f64,
                },
            );

            let text = page
                .text()
                .map_err(|e| ExtractError::EngineFailed {
                    engine: self.name().to_string(),
                    detail: format!("text layer of page {}: {:?}", page_no, e),
                })?
                .all();
            let paragraphs = split_paragraphs(&text);
            debug!("Page {}: {} paragraphs", page_no, paragraphs.len());
            for paragraph in paragraphs {
                builder.text(DocItemLabel::Text, paragraph, page_no);
            }

            if !self.options.generate_picture_images {
                continue;
            }
            for object in page.objects().iter() {
                let Some(image_object) = object.as_image_object() else {
                    continue;
                };
                let raw = match image_object.get_raw_image() {
                    Ok(raw) => raw,
                    Err(e) => {
                        warn!("Skipping unreadable image on page {}: {:?}", page_no, e);
                        continue;
                    }
                };
                let bbox = object.bounds().ok().map(|b| BoundingBox {
                    l: b.left().value as f64,
                    t: b.top().value as f64,
                    r: b.right().value as f64,
                    b: b.bottom().value as f64,
                    coord_origin: CoordOrigin::BottomLeft,
                });
                let image = ImageRef::from_image(&raw, 72).map_err(|source| {
                    ExtractError::ImageEncoding {
                        self_ref: format!("page {} image", page_no),
                        source,
                    }
                })?;
                debug!(
                    "Page {}: image object {}x{} px",
                    page_no,
                    raw.width(),
                    raw.height()
                );
                builder.picture(Some(image), ProvenanceItem { page_no, bbox });
            }
        }

        Ok(builder.build())
    }
}

/// Paragraphs of a page text layer: runs of non-blank lines.
fn split_paragraphs(text: &str) -> Vec<String> {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in normalized.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line.trim_end());
        }
    }
    if !current.is_empty() {
        paragraphs.push(current.join("\n"));
    }
    paragraphs
}
