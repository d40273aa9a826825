//! Text pass: per-page markdown, chunked.

use super::chunk::RecursiveCharacterSplitter;
use crate::document::ConvertedDocument;
use crate::output::{ChunkMetadata, TextChunk};
use tracing::debug;

/// Chunks of every page's markdown, in page order then chunk order.
///
/// Pages whose markdown is empty contribute nothing.
pub fn extract_text(
    doc: &ConvertedDocument,
    filename: &str,
    splitter: &RecursiveCharacterSplitter,
) -> Vec<TextChunk> {
    let mut chunks = Vec::new();
    for page_no in doc.page_numbers() {
        let markdown = doc.export_to_markdown(Some(page_no));
        if markdown.is_empty() {
            debug!("Page {} has no text", page_no);
            continue;
        }

        let metadata = ChunkMetadata {
            filename: filename.to_string(),
            page_number: page_no,
        };
        let pieces = splitter.split_text(&markdown);
        debug!("Page {} → {} chunks", page_no, pieces.len());
        chunks.extend(pieces.into_iter().map(|content| TextChunk {
            content,
            metadata: metadata.clone(),
        }));
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChunkConfig;
    use crate::document::{DocItemLabel, DocumentBuilder, Size};

    fn letter() -> Size {
        Size {
            width: 612.0,
            height: 792.0,
        }
    }

    #[test]
    fn single_short_page_is_one_chunk() {
        let mut b = DocumentBuilder::new("doc");
        b.page(1, letter());
        b.section_header("Overview", 1, 1);
        b.text(DocItemLabel::Text, "Short body.", 1);
        let doc = b.build();

        let splitter = RecursiveCharacterSplitter::new(ChunkConfig::default());
        let chunks = extract_text(&doc, "report.pdf", &splitter);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, doc.export_to_markdown(Some(1)));
        assert_eq!(chunks[0].metadata.page_number, 1);
        assert_eq!(chunks[0].metadata.filename, "report.pdf");
    }

    #[test]
    fn empty_pages_are_skipped_and_order_follows_pages() {
        let mut b = DocumentBuilder::new("doc");
        b.page(1, letter()).page(2, letter()).page(3, letter());
        b.text(DocItemLabel::Text, "third", 3);
        b.text(DocItemLabel::Text, "first", 1);
        let doc = b.build();

        let splitter = RecursiveCharacterSplitter::new(ChunkConfig::default());
        let chunks = extract_text(&doc, "f.pdf", &splitter);
        let got: Vec<(u32, &str)> = chunks
            .iter()
            .map(|c| (c.metadata.page_number, c.content.as_str()))
            .collect();
        assert_eq!(got, vec![(1, "first"), (3, "third")]);
    }
}
