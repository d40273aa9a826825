//! Table cell structure and its row-oriented export.

use super::{BoundingBox, TableItem};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One exported table row: column name to cell text, in column order.
pub type TableRow = IndexMap<String, String>;

fn one() -> usize {
    1
}

/// A cell, possibly spanning several grid positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BoundingBox>,
    #[serde(default = "one")]
    pub row_span: usize,
    #[serde(default = "one")]
    pub col_span: usize,
    pub start_row_offset_idx: usize,
    pub end_row_offset_idx: usize,
    pub start_col_offset_idx: usize,
    pub end_col_offset_idx: usize,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub column_header: bool,
    #[serde(default)]
    pub row_header: bool,
    #[serde(default)]
    pub row_section: bool,
}

impl TableCell {
    /// An empty 1×1 cell at `(row, col)`.
    pub fn empty(row: usize, col: usize) -> Self {
        Self {
            bbox: None,
            row_span: 1,
            col_span: 1,
            start_row_offset_idx: row,
            end_row_offset_idx: row + 1,
            start_col_offset_idx: col,
            end_col_offset_idx: col + 1,
            text: String::new(),
            column_header: false,
            row_header: false,
            row_section: false,
        }
    }

    /// A 1×1 cell at `(row, col)` holding `text`.
    pub fn new(row: usize, col: usize, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::empty(row, col)
        }
    }

    pub fn header(mut self) -> Self {
        self.column_header = true;
        self
    }
}

/// Cells of a table plus its dimensions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TableData {
    #[serde(default)]
    pub table_cells: Vec<TableCell>,
    #[serde(default)]
    pub num_rows: usize,
    #[serde(default)]
    pub num_cols: usize,
}

impl TableData {
    /// A `num_rows × num_cols` grid with spanning cells copied into every
    /// position they cover. Spans past the table edge are clipped.
    pub fn grid(&self) -> Vec<Vec<TableCell>> {
        let mut grid: Vec<Vec<TableCell>> = (0..self.num_rows)
            .map(|i| (0..self.num_cols).map(|j| TableCell::empty(i, j)).collect())
            .collect();

        for cell in &self.table_cells {
            let rows = cell.start_row_offset_idx.min(self.num_rows)
                ..cell.end_row_offset_idx.min(self.num_rows);
            let cols = cell.start_col_offset_idx.min(self.num_cols)
                ..cell.end_col_offset_idx.min(self.num_cols);
            for i in rows {
                for j in cols.clone() {
                    grid[i][j] = cell.clone();
                }
            }
        }
        grid
    }
}

impl TableItem {
    /// Export as row records.
    ///
    /// Leading rows containing any column-header cell become the header;
    /// multi-row headers are joined per column with `.`. Without a header the
    /// columns are named `"0"`, `"1"`, …. A repeated column name keeps its
    /// first position and takes the value of its last occurrence.
    pub fn export_rows(&self) -> Vec<TableRow> {
        let data = &self.data;
        if data.num_rows == 0 || data.num_cols == 0 {
            return Vec::new();
        }
        let grid = data.grid();

        let num_headers = grid
            .iter()
            .take_while(|row| row.iter().any(|c| c.column_header))
            .count();

        let columns: Vec<String> = if num_headers > 0 {
            let mut columns = vec![String::new(); data.num_cols];
            for row in &grid[..num_headers] {
                for (j, cell) in row.iter().enumerate() {
                    if !columns[j].is_empty() {
                        columns[j].push('.');
                    }
                    columns[j].push_str(&cell.text);
                }
            }
            columns
        } else {
            (0..data.num_cols).map(|j| j.to_string()).collect()
        };

        grid[num_headers..]
            .iter()
            .map(|row| {
                let mut record = TableRow::with_capacity(columns.len());
                for (name, cell) in columns.iter().zip(row) {
                    record.insert(name.clone(), cell.text.clone());
                }
                record
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{ContentLayer, DocItemLabel};

    fn table(num_rows: usize, num_cols: usize, cells: Vec<TableCell>) -> TableItem {
        TableItem {
            self_ref: "#/tables/0".into(),
            parent: None,
            children: Vec::new(),
            content_layer: ContentLayer::Body,
            label: DocItemLabel::Table,
            prov: Vec::new(),
            captions: Vec::new(),
            data: TableData {
                table_cells: cells,
                num_rows,
                num_cols,
            },
        }
    }

    #[test]
    fn header_row_names_columns() {
        let t = table(
            4,
            2,
            vec![
                TableCell::new(0, 0, "Name").header(),
                TableCell::new(0, 1, "Qty").header(),
                TableCell::new(1, 0, "apple"),
                TableCell::new(1, 1, "3"),
                TableCell::new(2, 0, "pear"),
                TableCell::new(2, 1, "5"),
                TableCell::new(3, 0, "fig"),
                TableCell::new(3, 1, "8"),
            ],
        );
        let rows = t.export_rows();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.len() == 2));
        assert_eq!(rows[1]["Name"], "pear");
        assert_eq!(rows[2]["Qty"], "8");
        assert_eq!(rows[0].keys().collect::<Vec<_>>(), vec!["Name", "Qty"]);
    }

    #[test]
    fn no_header_uses_positional_names() {
        let t = table(
            2,
            2,
            vec![
                TableCell::new(0, 0, "a"),
                TableCell::new(0, 1, "b"),
                TableCell::new(1, 0, "c"),
                TableCell::new(1, 1, "d"),
            ],
        );
        let rows = t.export_rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["0"], "a");
        assert_eq!(rows[1]["1"], "d");
    }

    #[test]
    fn multi_row_header_joins_with_dot() {
        let mut spanning = TableCell::new(0, 0, "Fruit").header();
        spanning.end_col_offset_idx = 2;
        spanning.col_span = 2;
        let t = table(
            3,
            2,
            vec![
                spanning,
                TableCell::new(1, 0, "name").header(),
                TableCell::new(1, 1, "qty").header(),
                TableCell::new(2, 0, "kiwi"),
                TableCell::new(2, 1, "2"),
            ],
        );
        let rows = t.export_rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0].keys().collect::<Vec<_>>(),
            vec!["Fruit.name", "Fruit.qty"]
        );
    }

    #[test]
    fn duplicate_column_names_collapse() {
        let t = table(
            2,
            3,
            vec![
                TableCell::new(0, 0, "x").header(),
                TableCell::new(0, 1, "y").header(),
                TableCell::new(0, 2, "x").header(),
                TableCell::new(1, 0, "first"),
                TableCell::new(1, 1, "mid"),
                TableCell::new(1, 2, "last"),
            ],
        );
        let rows = t.export_rows();
        assert_eq!(rows[0].len(), 2);
        assert_eq!(rows[0].keys().collect::<Vec<_>>(), vec!["x", "y"]);
        assert_eq!(rows[0]["x"], "last");
    }

    #[test]
    fn empty_table_exports_nothing() {
        assert!(table(0, 0, Vec::new()).export_rows().is_empty());
        assert!(table(3, 0, Vec::new()).export_rows().is_empty());
    }

    #[test]
    fn grid_fills_spans_and_clips() {
        let mut big = TableCell::new(0, 0, "span");
        big.end_row_offset_idx = 5;
        big.end_col_offset_idx = 2;
        let data = TableData {
            table_cells: vec![big],
            num_rows: 2,
            num_cols: 3,
        };
        let grid = data.grid();
        assert_eq!(grid.len(), 2);
        assert_eq!(grid[1][1].text, "span");
        assert_eq!(grid[1][2].text, "");
    }
}
