//! Markdown export of a converted document.
//!
//! Items become blocks separated by one blank line. List groups render as a
//! single block with one line per item, nested lists indented by four
//! spaces. Captions are emitted before the table or picture they belong to.

use super::{
    ConvertedDocument, DocItemLabel, GroupLabel, NodeItem, RefItem, TableItem, TextItem,
};
use std::collections::HashSet;

const IMAGE_PLACEHOLDER: &str = "<!-- image -->";
const FORMULA_PLACEHOLDER: &str = "<!-- formula-not-decoded -->";
const LIST_INDENT: &str = "    ";

pub(crate) fn render(doc: &ConvertedDocument, page_no: Option<u32>) -> String {
    let mut writer = MarkdownWriter {
        doc,
        page_no,
        blocks: Vec::new(),
        seen: HashSet::new(),
    };
    writer.seen.insert(doc.body.self_ref.as_str());
    writer.visit_children(&doc.body.children);
    writer.blocks.join("\n\n")
}

struct MarkdownWriter<'a> {
    doc: &'a ConvertedDocument,
    page_no: Option<u32>,
    blocks: Vec<String>,
    seen: HashSet<&'a str>,
}

impl<'a> MarkdownWriter<'a> {
    fn includes(&self, node: NodeItem<'a>) -> bool {
        node.content_layer() == super::ContentLayer::Body
            && self.page_no.is_none_or(|p| node.is_on_page(p))
    }

    fn visit_children(&mut self, children: &'a [RefItem]) {
        for child in children {
            if let Some(node) = self.doc.resolve(child) {
                if self.seen.insert(node.self_ref()) {
                    self.render_node(node);
                }
            }
        }
    }

    fn render_node(&mut self, node: NodeItem<'a>) {
        match node {
            NodeItem::Group(g) if g.label.is_list() => {
                let mut lines = Vec::new();
                self.list_lines(&g.children, 0, g.label == GroupLabel::OrderedList, &mut lines);
                if !lines.is_empty() {
                    self.blocks.push(lines.join("\n"));
                }
            }
            NodeItem::Group(g) => self.visit_children(&g.children),
            NodeItem::Text(t) => {
                if self.includes(node) {
                    if let Some(block) = text_block(t) {
                        self.blocks.push(block);
                    }
                }
                self.visit_children(&t.children);
            }
            NodeItem::Table(t) => {
                if self.includes(node) {
                    self.push_captions(&t.captions);
                    if let Some(table) = table_block(t) {
                        self.blocks.push(table);
                    }
                }
                self.visit_children(&t.children);
            }
            NodeItem::Picture(p) => {
                if self.includes(node) {
                    self.push_captions(&p.captions);
                    self.blocks.push(IMAGE_PLACEHOLDER.to_string());
                }
            }
        }
    }

    fn push_captions(&mut self, captions: &'a [RefItem]) {
        let mut parts = Vec::new();
        for caption in captions {
            if let Some(node @ NodeItem::Text(t)) = self.doc.resolve(caption) {
                if self.seen.insert(node.self_ref()) && self.includes(node) && !t.text.is_empty() {
                    parts.push(escape_text(&t.text));
                }
            }
        }
        if !parts.is_empty() {
            self.blocks.push(parts.join(" "));
        }
    }

    fn list_lines(
        &mut self,
        children: &'a [RefItem],
        depth: usize,
        ordered: bool,
        lines: &mut Vec<String>,
    ) {
        let mut counter = 0;
        for child in children {
            let Some(node) = self.doc.resolve(child) else {
                continue;
            };
            if !self.seen.insert(node.self_ref()) {
                continue;
            }
            match node {
                NodeItem::Text(t) if t.label == DocItemLabel::ListItem => {
                    if self.includes(node) && !t.text.is_empty() {
                        counter += 1;
                        let marker = if ordered || t.enumerated.unwrap_or(false) {
                            format!("{counter}.")
                        } else {
                            "-".to_string()
                        };
                        lines.push(format!(
                            "{}{} {}",
                            LIST_INDENT.repeat(depth),
                            marker,
                            escape_text(&t.text)
                        ));
                    }
                    self.nested_lists(&t.children, depth + 1, lines);
                }
                // sublist as a sibling of its parent item
                NodeItem::Group(g) if g.label.is_list() => {
                    self.list_lines(
                        &g.children,
                        depth + 1,
                        g.label == GroupLabel::OrderedList,
                        lines,
                    );
                }
                other => self.render_into_lines(other, lines),
            }
        }
    }

    fn nested_lists(&mut self, children: &'a [RefItem], depth: usize, lines: &mut Vec<String>) {
        for child in children {
            let Some(node) = self.doc.resolve(child) else {
                continue;
            };
            if !self.seen.insert(node.self_ref()) {
                continue;
            }
            match node {
                NodeItem::Group(g) if g.label.is_list() => {
                    self.list_lines(&g.children, depth, g.label == GroupLabel::OrderedList, lines);
                }
                other => self.render_into_lines(other, lines),
            }
        }
    }

    fn render_into_lines(&mut self, node: NodeItem<'a>, lines: &mut Vec<String>) {
        let mark = self.blocks.len();
        self.render_node(node);
        lines.extend(self.blocks.drain(mark..));
    }
}

fn text_block(item: &TextItem) -> Option<String> {
    let text = item.text.as_str();
    if text.is_empty() && item.label != DocItemLabel::Formula {
        return None;
    }
    let block = match item.label {
        DocItemLabel::Title => format!("# {}", escape_text(text)),
        DocItemLabel::SectionHeader => format!(
            "{} {}",
            "#".repeat(item.level.unwrap_or(1) as usize + 1),
            escape_text(text)
        ),
        DocItemLabel::ListItem => format!("- {}", escape_text(text)),
        DocItemLabel::CheckboxSelected => format!("- [x] {}", escape_text(text)),
        DocItemLabel::CheckboxUnselected => format!("- [ ] {}", escape_text(text)),
        DocItemLabel::Code => format!("```\n{}\n```", text),
        DocItemLabel::Formula if text.is_empty() => FORMULA_PLACEHOLDER.to_string(),
        DocItemLabel::Formula => format!("$${}$$", text),
        DocItemLabel::PageHeader | DocItemLabel::PageFooter => return None,
        _ => escape_text(text),
    };
    Some(block)
}

/// GitHub pipe table; the first grid row is the header. Tables with fewer
/// than two rows render nothing.
fn table_block(table: &TableItem) -> Option<String> {
    let rows: Vec<Vec<String>> = table
        .data
        .grid()
        .iter()
        .map(|row| row.iter().map(|c| c.text.replace('\n', " ")).collect())
        .collect();
    if rows.len() < 2 || rows[0].is_empty() {
        return None;
    }

    let num_cols = rows[0].len();
    let widths: Vec<usize> = (0..num_cols)
        .map(|j| {
            rows.iter()
                .map(|r| r.get(j).map_or(0, |c| c.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let format_row = |row: &[String]| {
        let cells: Vec<String> = widths
            .iter()
            .enumerate()
            .map(|(j, w)| {
                let text = row.get(j).map(String::as_str).unwrap_or("");
                let pad = w.saturating_sub(text.chars().count());
                format!("{}{}", text, " ".repeat(pad))
            })
            .collect();
        format!("| {} |", cells.join(" | "))
    };

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(format_row(&rows[0]));
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(w + 2)).collect();
    lines.push(format!("|{}|", rule.join("|")));
    for row in &rows[1..] {
        lines.push(format_row(row));
    }
    Some(lines.join("\n"))
}

/// Prose escaping: HTML special characters, then markdown underscores.
/// Code and formula text is left as is.
fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use crate::document::{
        ConvertedDocument, DocItemLabel, DocumentBuilder, ProvenanceItem, Size, TableCell,
        TableData,
    };
    use serde_json::json;

    fn letter() -> Size {
        Size {
            width: 612.0,
            height: 792.0,
        }
    }

    #[test]
    fn headings_and_paragraphs() {
        let mut b = DocumentBuilder::new("doc");
        b.page(1, letter());
        b.text(DocItemLabel::Title, "Annual report", 1);
        b.section_header("Results", 1, 1);
        b.text(DocItemLabel::Text, "Revenue grew in snake_case land.", 1);
        let doc = b.build();

        assert_eq!(
            doc.export_to_markdown(Some(1)),
            "# Annual report\n\n## Results\n\nRevenue grew in snake\\_case land."
        );
    }

    #[test]
    fn prose_is_html_escaped_but_code_is_not() {
        let mut b = DocumentBuilder::new("doc");
        b.page(1, letter());
        b.section_header("R&D <2024>", 1, 1);
        b.text(DocItemLabel::Text, "Hello & <b>", 1);
        b.text(DocItemLabel::Code, "if a < b && c > d {}", 1);
        let doc = b.build();

        assert_eq!(
            doc.export_to_markdown(Some(1)),
            "## R&amp;D &lt;2024&gt;\n\nHello &amp; &lt;b&gt;\n\n```\nif a < b && c > d {}\n```"
        );
    }

    #[test]
    fn page_filter_selects_items() {
        let mut b = DocumentBuilder::new("doc");
        b.page(1, letter()).page(2, letter());
        b.text(DocItemLabel::Text, "first page", 1);
        b.text(DocItemLabel::Text, "second page", 2);
        let doc = b.build();

        assert_eq!(doc.export_to_markdown(Some(1)), "first page");
        assert_eq!(doc.export_to_markdown(Some(2)), "second page");
        assert_eq!(doc.export_to_markdown(Some(3)), "");
        assert_eq!(doc.export_to_markdown(None), "first page\n\nsecond page");
    }

    #[test]
    fn table_with_caption_and_picture_placeholder() {
        let mut b = DocumentBuilder::new("doc");
        b.page(1, letter());
        let table = b.table(
            TableData {
                table_cells: vec![
                    TableCell::new(0, 0, "Name").header(),
                    TableCell::new(0, 1, "Qty").header(),
                    TableCell::new(1, 0, "apple"),
                    TableCell::new(1, 1, "12"),
                ],
                num_rows: 2,
                num_cols: 2,
            },
            1,
        );
        b.caption(&table, "Table 1", 1);
        let picture = b.picture(
            None,
            ProvenanceItem {
                page_no: 1,
                bbox: None,
            },
        );
        b.caption(&picture, "Figure 1", 1);
        let doc = b.build();

        assert_eq!(
            doc.export_to_markdown(Some(1)),
            "Table 1\n\n\
             | Name  | Qty |\n\
             |-------|-----|\n\
             | apple | 12  |\n\n\
             Figure 1\n\n\
             <!-- image -->"
        );
    }

    #[test]
    fn lists_render_as_one_block() {
        let doc: ConvertedDocument = serde_json::from_value(json!({
            "body": {"self_ref": "#/body", "children": [
                {"$ref": "#/groups/0"}, {"$ref": "#/texts/3"}
            ]},
            "groups": [
                {"self_ref": "#/groups/0", "label": "ordered_list",
                 "children": [{"$ref": "#/texts/0"}, {"$ref": "#/texts/1"}]},
                {"self_ref": "#/groups/1", "label": "list",
                 "children": [{"$ref": "#/texts/2"}]}
            ],
            "texts": [
                {"self_ref": "#/texts/0", "label": "list_item", "text": "alpha",
                 "prov": [{"page_no": 1}], "children": [{"$ref": "#/groups/1"}]},
                {"self_ref": "#/texts/1", "label": "list_item", "text": "beta",
                 "prov": [{"page_no": 1}]},
                {"self_ref": "#/texts/2", "label": "list_item", "text": "nested",
                 "prov": [{"page_no": 1}]},
                {"self_ref": "#/texts/3", "label": "formula", "text": "",
                 "prov": [{"page_no": 1}]}
            ],
            "pages": {"1": {"page_no": 1, "size": {"width": 1.0, "height": 1.0}}}
        }))
        .unwrap();

        assert_eq!(
            doc.export_to_markdown(Some(1)),
            "1. alpha\n    - nested\n2. beta\n\n<!-- formula-not-decoded -->"
        );
    }

    #[test]
    fn furniture_is_excluded() {
        let doc: ConvertedDocument = serde_json::from_value(json!({
            "body": {"self_ref": "#/body", "children": [{"$ref": "#/texts/0"}, {"$ref": "#/texts/1"}]},
            "texts": [
                {"self_ref": "#/texts/0", "label": "page_header", "content_layer": "furniture",
                 "text": "ACME Corp", "prov": [{"page_no": 1}]},
                {"self_ref": "#/texts/1", "label": "text", "text": "body text",
                 "prov": [{"page_no": 1}]}
            ],
            "pages": {"1": {"page_no": 1}}
        }))
        .unwrap();
        assert_eq!(doc.export_to_markdown(Some(1)), "body text");
    }

    #[test]
    fn single_row_table_renders_nothing() {
        let mut b = DocumentBuilder::new("doc");
        b.page(1, letter());
        b.table(
            TableData {
                table_cells: vec![TableCell::new(0, 0, "lonely")],
                num_rows: 1,
                num_cols: 1,
            },
            1,
        );
        assert_eq!(b.build().export_to_markdown(Some(1)), "");
    }
}
