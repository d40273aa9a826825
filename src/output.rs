//! Extraction results and their JSON wire shapes.
//!
//! ```json
//! {
//!   "text":   [["chunk", {"filename": "a.pdf", "page_number": 1}]],
//!   "tables": [{"data": [{"col": "cell"}], "metadata": {"filename": "a.pdf", "page_number": 1}}],
//!   "images": [{"image_base64": "…", "image_html": "<img …/>", "child_texts": ["…"],
//!               "filename": "a.pdf", "page_number": 1, "is_graph": false,
//!               "image_text": "", "image_text_embedding": "null"}]
//! }
//! ```

use crate::document::TableRow;
use serde::{Deserialize, Serialize};

/// Where a text chunk or table came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub filename: String,
    pub page_number: u32,
}

/// A piece of page markdown. Serialized as `[content, metadata]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(String, ChunkMetadata)", into = "(String, ChunkMetadata)")]
pub struct TextChunk {
    pub content: String,
    pub metadata: ChunkMetadata,
}

impl From<(String, ChunkMetadata)> for TextChunk {
    fn from((content, metadata): (String, ChunkMetadata)) -> Self {
        Self { content, metadata }
    }
}

impl From<TextChunk> for (String, ChunkMetadata) {
    fn from(chunk: TextChunk) -> Self {
        (chunk.content, chunk.metadata)
    }
}

/// One table as row records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRecord {
    pub data: Vec<TableRow>,
    pub metadata: ChunkMetadata,
}

/// One picture, PNG-encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub image_base64: String,
    pub image_html: String,
    pub child_texts: Vec<String>,
    pub filename: String,
    pub page_number: u32,
    /// Always false; graph detection is not performed.
    pub is_graph: bool,
    /// Always empty.
    pub image_text: String,
    /// Always the string `"null"`.
    pub image_text_embedding: String,
}

impl ImageRecord {
    pub fn new(
        image_base64: String,
        child_texts: Vec<String>,
        filename: impl Into<String>,
        page_number: u32,
    ) -> Self {
        let image_html = format!(
            r#"<img src="data:image/png;base64,{}" alt="base64 image"/>"#,
            image_base64
        );
        Self {
            image_base64,
            image_html,
            child_texts,
            filename: filename.into(),
            page_number,
            is_graph: false,
            image_text: String::new(),
            image_text_embedding: "null".to_string(),
        }
    }
}

/// Everything extracted from one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionOutput {
    pub text: Vec<TextChunk>,
    pub tables: Vec<TableRecord>,
    pub images: Vec<ImageRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn meta() -> ChunkMetadata {
        ChunkMetadata {
            filename: "/tmp/upload.pdf".into(),
            page_number: 2,
        }
    }

    #[test]
    fn text_chunk_is_a_pair() {
        let chunk = TextChunk {
            content: "hello".into(),
            metadata: meta(),
        };
        assert_eq!(
            serde_json::to_value(&chunk).unwrap(),
            json!(["hello", {"filename": "/tmp/upload.pdf", "page_number": 2}])
        );
    }

    #[test]
    fn table_rows_keep_column_order() {
        let mut row = TableRow::new();
        row.insert("zeta".into(), "1".into());
        row.insert("alpha".into(), "2".into());
        let record = TableRecord {
            data: vec![row],
            metadata: meta(),
        };
        let text = serde_json::to_string(&record).unwrap();
        assert!(text.find("zeta").unwrap() < text.find("alpha").unwrap());
    }

    #[test]
    fn image_record_placeholders() {
        let record = ImageRecord::new("QUJD".into(), vec!["Figure 1".into()], "a.pdf", 1);
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({
                "image_base64": "QUJD",
                "image_html": "<img src=\"data:image/png;base64,QUJD\" alt=\"base64 image\"/>",
                "child_texts": ["Figure 1"],
                "filename": "a.pdf",
                "page_number": 1,
                "is_graph": false,
                "image_text": "",
                "image_text_embedding": "null"
            })
        );
    }

    #[test]
    fn empty_output_has_three_arrays() {
        assert_eq!(
            serde_json::to_value(ExtractionOutput::default()).unwrap(),
            json!({"text": [], "tables": [], "images": []})
        );
    }
}
