//! Shared fixtures: an in-memory conversion engine and a sample document.

#![allow(dead_code)]

use edgequake_docextract::document::{
    DocItemLabel, DocumentBuilder, ImageRef, ProvenanceItem, Size, TableCell, TableData,
};
use edgequake_docextract::{ConversionEngine, ConvertedDocument, ExtractError};
use image::{DynamicImage, Rgba, RgbaImage};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const CAPTION: &str = "Figure 1: Quarterly revenue";

/// Engine that never touches a real PDF.
///
/// Content starting with `%PDF` converts to a fixed document; anything else
/// is rejected the way a real engine rejects a non-PDF. Every path it sees
/// is recorded, along with whether the file existed at that moment.
pub struct StubEngine {
    document: Box<dyn Fn() -> ConvertedDocument + Send + Sync>,
    seen: Mutex<Vec<PathBuf>>,
    delay: Duration,
}

impl StubEngine {
    pub fn new(document: impl Fn() -> ConvertedDocument + Send + Sync + 'static) -> Arc<Self> {
        Self::with_delay(document, Duration::ZERO)
    }

    pub fn with_delay(
        document: impl Fn() -> ConvertedDocument + Send + Sync + 'static,
        delay: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            document: Box::new(document),
            seen: Mutex::new(Vec::new()),
            delay,
        })
    }

    pub fn seen_paths(&self) -> Vec<PathBuf> {
        self.seen.lock().unwrap().clone()
    }
}

impl ConversionEngine for StubEngine {
    fn name(&self) -> &str {
        "stub"
    }

    fn convert(&self, pdf_path: &Path) -> Result<ConvertedDocument, ExtractError> {
        self.seen.lock().unwrap().push(pdf_path.to_path_buf());
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }

        let bytes = std::fs::read(pdf_path).map_err(|e| ExtractError::Internal(e.to_string()))?;
        if !bytes.starts_with(b"%PDF") {
            return Err(ExtractError::InputRejected {
                path: pdf_path.to_path_buf(),
                detail: "File format not allowed".into(),
            });
        }
        Ok((self.document)())
    }
}

pub fn red_square() -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, Rgba([255, 0, 0, 255])))
}

/// One page: a title, a paragraph, a 3×2 table under a header row and a
/// picture with one caption.
pub fn report_document() -> ConvertedDocument {
    let mut b = DocumentBuilder::new("report");
    b.page(
        1,
        Size {
            width: 612.0,
            height: 792.0,
        },
    );
    b.text(DocItemLabel::Title, "Annual Report", 1);
    b.text(
        DocItemLabel::Text,
        "Revenue grew in every quarter of the year.",
        1,
    );

    let mut cells = vec![
        TableCell::new(0, 0, "Quarter").header(),
        TableCell::new(0, 1, "Revenue").header(),
    ];
    for (i, (q, r)) in [("Q1", "10"), ("Q2", "12"), ("Q3", "15")].iter().enumerate() {
        cells.push(TableCell::new(i + 1, 0, *q));
        cells.push(TableCell::new(i + 1, 1, *r));
    }
    b.table(
        TableData {
            table_cells: cells,
            num_rows: 4,
            num_cols: 2,
        },
        1,
    );

    let image = ImageRef::from_image(&red_square(), 72).unwrap();
    let picture = b.picture(
        Some(image),
        ProvenanceItem {
            page_no: 1,
            bbox: None,
        },
    );
    b.caption(&picture, CAPTION, 1);
    b.build()
}

/// Two pages of plain text, nothing else.
pub fn text_only_document() -> ConvertedDocument {
    let mut b = DocumentBuilder::new("notes");
    for page in 1..=2 {
        b.page(
            page,
            Size {
                width: 612.0,
                height: 792.0,
            },
        );
        b.text(DocItemLabel::Text, format!("Notes on page {page}."), page);
    }
    b.build()
}

pub const PDF_BYTES: &[u8] = b"%PDF-1.7\n% stub body\n%%EOF\n";
