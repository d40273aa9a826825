//! Tables pass: every table as row records.

use crate::document::ConvertedDocument;
use crate::error::ExtractError;
use crate::output::{ChunkMetadata, TableRecord};
use tracing::debug;

/// One record per table, in document inventory order.
///
/// The page number comes from the table's first provenance entry; a table
/// without provenance fails the pass.
pub fn extract_tables(
    doc: &ConvertedDocument,
    filename: &str,
) -> Result<Vec<TableRecord>, ExtractError> {
    doc.tables
        .iter()
        .map(|table| {
            let prov = table
                .prov
                .first()
                .ok_or_else(|| ExtractError::MissingProvenance {
                    self_ref: table.self_ref.clone(),
                })?;
            let data = table.export_rows();
            debug!(
                "Table {} (page {}): {} rows",
                table.self_ref,
                prov.page_no,
                data.len()
            );
            Ok(TableRecord {
                data,
                metadata: ChunkMetadata {
                    filename: filename.to_string(),
                    page_number: prov.page_no,
                },
            })
        })
        .collect()
}
