//! The structured document produced by a conversion engine.
//!
//! The layout follows the docling document JSON: a `body` root, flat
//! inventories of `texts`, `tables`, `pictures` and `groups` linked by
//! JSON-pointer style references (`{"$ref": "#/texts/3"}`), and a `pages`
//! map keyed by 1-based page number. Unknown fields are ignored so newer
//! docling releases deserialize cleanly.
//!
//! ```text
//! body ─┬─ #/texts/0   section_header   (page 1)
//!       ├─ #/groups/0  list ─┬─ #/texts/1 list_item
//!       │                    └─ #/texts/2 list_item
//!       ├─ #/tables/0  ─── #/texts/3 caption
//!       └─ #/pictures/0 ── #/texts/4 caption
//! ```

mod builder;
pub mod markdown;
pub mod table;

pub use builder::DocumentBuilder;
pub use table::{TableCell, TableData, TableRow};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::DynamicImage;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

static RE_CREF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#/(body|groups|texts|tables|pictures)(?:/(\d+))?$").unwrap());

// ── References and provenance ────────────────────────────────────────────

/// A reference to another node of the same document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RefItem {
    #[serde(rename = "$ref")]
    pub cref: String,
}

impl RefItem {
    pub fn new(cref: impl Into<String>) -> Self {
        Self { cref: cref.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CoordOrigin {
    #[default]
    TopLeft,
    BottomLeft,
}

/// Axis-aligned box in page coordinates (points).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub l: f64,
    pub t: f64,
    pub r: f64,
    pub b: f64,
    #[serde(default)]
    pub coord_origin: CoordOrigin,
}

impl BoundingBox {
    /// Same box with the origin moved to the top-left corner of the page.
    pub fn to_top_left_origin(&self, page_height: f64) -> BoundingBox {
        match self.coord_origin {
            CoordOrigin::TopLeft => *self,
            CoordOrigin::BottomLeft => BoundingBox {
                l: self.l,
                t: page_height - self.t,
                r: self.r,
                b: page_height - self.b,
                coord_origin: CoordOrigin::TopLeft,
            },
        }
    }

    /// Rescale from one page size to another (e.g. points to rendered pixels).
    pub fn scale_to_size(&self, old: Size, new: Size) -> BoundingBox {
        let sx = if old.width > 0.0 { new.width / old.width } else { 1.0 };
        let sy = if old.height > 0.0 { new.height / old.height } else { 1.0 };
        BoundingBox {
            l: self.l * sx,
            t: self.t * sy,
            r: self.r * sx,
            b: self.b * sy,
            coord_origin: self.coord_origin,
        }
    }
}

/// Where an item came from in the source PDF.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvenanceItem {
    /// 1-based page number.
    pub page_no: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BoundingBox>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

// ── Labels ───────────────────────────────────────────────────────────────

/// Which part of the page a node belongs to. Only `body` content is exported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentLayer {
    #[default]
    Body,
    Furniture,
    Background,
    Invisible,
    Notes,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocItemLabel {
    Title,
    SectionHeader,
    #[default]
    Text,
    Paragraph,
    ListItem,
    Caption,
    Footnote,
    Code,
    Formula,
    PageHeader,
    PageFooter,
    Reference,
    CheckboxSelected,
    CheckboxUnselected,
    Picture,
    Chart,
    Table,
    DocumentIndex,
    Form,
    KeyValueRegion,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupLabel {
    #[default]
    Unspecified,
    List,
    OrderedList,
    Chapter,
    Section,
    Sheet,
    Slide,
    FormArea,
    KeyValueArea,
    CommentSection,
    Inline,
    PictureArea,
    #[serde(other)]
    Other,
}

impl GroupLabel {
    pub fn is_list(&self) -> bool {
        matches!(self, GroupLabel::List | GroupLabel::OrderedList)
    }
}

fn picture_label() -> DocItemLabel {
    DocItemLabel::Picture
}

fn table_label() -> DocItemLabel {
    DocItemLabel::Table
}

// ── Nodes ────────────────────────────────────────────────────────────────

/// A structural container (body root, list, section). Never exported itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupItem {
    pub self_ref: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<RefItem>,
    #[serde(default)]
    pub children: Vec<RefItem>,
    #[serde(default)]
    pub content_layer: ContentLayer,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub label: GroupLabel,
}

impl GroupItem {
    pub fn root() -> Self {
        Self {
            self_ref: "#/body".to_string(),
            parent: None,
            children: Vec::new(),
            content_layer: ContentLayer::Body,
            name: "_root_".to_string(),
            label: GroupLabel::Unspecified,
        }
    }
}

/// A span of text: heading, paragraph, list item, caption, code, formula.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextItem {
    pub self_ref: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<RefItem>,
    #[serde(default)]
    pub children: Vec<RefItem>,
    #[serde(default)]
    pub content_layer: ContentLayer,
    #[serde(default)]
    pub label: DocItemLabel,
    #[serde(default)]
    pub prov: Vec<ProvenanceItem>,
    #[serde(default)]
    pub orig: String,
    #[serde(default)]
    pub text: String,
    /// Heading depth for section headers (1 = top level).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enumerated: Option<bool>,
}

/// A figure, optionally carrying its bitmap as a data URI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PictureItem {
    pub self_ref: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<RefItem>,
    #[serde(default)]
    pub children: Vec<RefItem>,
    #[serde(default)]
    pub content_layer: ContentLayer,
    #[serde(default = "picture_label")]
    pub label: DocItemLabel,
    #[serde(default)]
    pub prov: Vec<ProvenanceItem>,
    #[serde(default)]
    pub captions: Vec<RefItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageRef>,
}

/// A table with its recovered cell structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableItem {
    pub self_ref: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<RefItem>,
    #[serde(default)]
    pub children: Vec<RefItem>,
    #[serde(default)]
    pub content_layer: ContentLayer,
    #[serde(default = "table_label")]
    pub label: DocItemLabel,
    #[serde(default)]
    pub prov: Vec<ProvenanceItem>,
    #[serde(default)]
    pub captions: Vec<RefItem>,
    #[serde(default)]
    pub data: TableData,
}

/// A page of the source PDF.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageItem {
    pub page_no: u32,
    #[serde(default)]
    pub size: Size,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageRef>,
}

// ── Images ───────────────────────────────────────────────────────────────

/// Bitmap attached to a picture or page. `uri` is a data URI or a file path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRef {
    #[serde(default)]
    pub mimetype: String,
    #[serde(default = "default_dpi")]
    pub dpi: u32,
    #[serde(default)]
    pub size: Size,
    pub uri: String,
}

fn default_dpi() -> u32 {
    72
}

#[derive(Debug, Error)]
pub enum ImageRefError {
    #[error("malformed data URI")]
    DataUri,

    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("cannot decode image: {0}")]
    Decode(#[from] image::ImageError),
}

impl ImageRef {
    /// Embed an image as a PNG data URI.
    pub fn from_image(img: &DynamicImage, dpi: u32) -> Result<Self, image::ImageError> {
        let b64 = crate::pipeline::images::encode_png_base64(img)?;
        Ok(Self {
            mimetype: "image/png".to_string(),
            dpi,
            size: Size {
                width: img.width() as f64,
                height: img.height() as f64,
            },
            uri: format!("data:image/png;base64,{}", b64),
        })
    }

    /// Decode the referenced bitmap.
    ///
    /// `Ok(None)` for URI schemes that are not resolved locally (http etc.).
    pub fn load(&self) -> Result<Option<DynamicImage>, ImageRefError> {
        if let Some(rest) = self.uri.strip_prefix("data:") {
            let (_, payload) = rest.split_once(',').ok_or(ImageRefError::DataUri)?;
            let bytes = STANDARD.decode(payload.trim())?;
            return Ok(Some(image::load_from_memory(&bytes)?));
        }
        if self.uri.contains("://") && !self.uri.starts_with("file://") {
            return Ok(None);
        }
        let path = self.uri.strip_prefix("file://").unwrap_or(&self.uri);
        Ok(Some(image::open(path)?))
    }
}

impl PictureItem {
    /// The picture's bitmap: the embedded image if present, else the page
    /// image cropped to the first provenance box.
    pub fn get_image(&self, doc: &ConvertedDocument) -> Result<Option<DynamicImage>, ImageRefError> {
        if let Some(image) = &self.image {
            if let Some(img) = image.load()? {
                return Ok(Some(img));
            }
        }

        let Some(prov) = self.prov.first() else {
            return Ok(None);
        };
        let Some(bbox) = prov.bbox else {
            return Ok(None);
        };
        let Some(page) = doc.pages.get(&prov.page_no) else {
            return Ok(None);
        };
        let Some(page_image) = &page.image else {
            return Ok(None);
        };
        let Some(rendered) = page_image.load()? else {
            return Ok(None);
        };

        let pixel_size = Size {
            width: rendered.width() as f64,
            height: rendered.height() as f64,
        };
        let crop = bbox
            .to_top_left_origin(page.size.height)
            .scale_to_size(page.size, pixel_size);

        let x = crop.l.round().max(0.0) as u32;
        let y = crop.t.round().max(0.0) as u32;
        let w = (crop.r.round() - crop.l.round()).max(0.0) as u32;
        let h = (crop.b.round() - crop.t.round()).max(0.0) as u32;
        Ok(Some(rendered.crop_imm(x, y, w, h)))
    }
}

// ── Document ─────────────────────────────────────────────────────────────

fn default_body() -> GroupItem {
    GroupItem::root()
}

/// A converted PDF.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvertedDocument {
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_body")]
    pub body: GroupItem,
    #[serde(default)]
    pub groups: Vec<GroupItem>,
    #[serde(default)]
    pub texts: Vec<TextItem>,
    #[serde(default)]
    pub pictures: Vec<PictureItem>,
    #[serde(default)]
    pub tables: Vec<TableItem>,
    /// Keyed by 1-based page number; iteration is in page order.
    #[serde(default)]
    pub pages: BTreeMap<u32, PageItem>,
}

/// A borrowed view of any node in the document tree.
#[derive(Debug, Clone, Copy)]
pub enum NodeItem<'a> {
    Group(&'a GroupItem),
    Text(&'a TextItem),
    Table(&'a TableItem),
    Picture(&'a PictureItem),
}

impl<'a> NodeItem<'a> {
    pub fn self_ref(&self) -> &'a str {
        match self {
            NodeItem::Group(g) => &g.self_ref,
            NodeItem::Text(t) => &t.self_ref,
            NodeItem::Table(t) => &t.self_ref,
            NodeItem::Picture(p) => &p.self_ref,
        }
    }

    pub fn children(&self) -> &'a [RefItem] {
        match self {
            NodeItem::Group(g) => &g.children,
            NodeItem::Text(t) => &t.children,
            NodeItem::Table(t) => &t.children,
            NodeItem::Picture(p) => &p.children,
        }
    }

    pub fn content_layer(&self) -> ContentLayer {
        match self {
            NodeItem::Group(g) => g.content_layer,
            NodeItem::Text(t) => t.content_layer,
            NodeItem::Table(t) => t.content_layer,
            NodeItem::Picture(p) => p.content_layer,
        }
    }

    /// Provenance entries. Groups have none.
    pub fn prov(&self) -> &'a [ProvenanceItem] {
        match self {
            NodeItem::Group(_) => &[],
            NodeItem::Text(t) => &t.prov,
            NodeItem::Table(t) => &t.prov,
            NodeItem::Picture(p) => &p.prov,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, NodeItem::Group(_))
    }

    /// True when any provenance entry points at `page_no`.
    pub fn is_on_page(&self, page_no: u32) -> bool {
        self.prov().iter().any(|p| p.page_no == page_no)
    }
}

impl ConvertedDocument {
    /// Parse docling JSON output.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Page numbers in ascending order.
    pub fn page_numbers(&self) -> impl Iterator<Item = u32> + '_ {
        self.pages.keys().copied()
    }

    pub fn num_pages(&self) -> usize {
        self.pages.len()
    }

    /// Resolve a reference. Unknown or out-of-range references give `None`.
    pub fn resolve(&self, item: &RefItem) -> Option<NodeItem<'_>> {
        let caps = RE_CREF.captures(&item.cref)?;
        let index = match caps.get(2) {
            Some(m) => Some(m.as_str().parse::<usize>().ok()?),
            None => None,
        };
        match (&caps[1], index) {
            ("body", None) => Some(NodeItem::Group(&self.body)),
            ("groups", Some(i)) => self.groups.get(i).map(NodeItem::Group),
            ("texts", Some(i)) => self.texts.get(i).map(NodeItem::Text),
            ("tables", Some(i)) => self.tables.get(i).map(NodeItem::Table),
            ("pictures", Some(i)) => self.pictures.get(i).map(NodeItem::Picture),
            _ => None,
        }
    }

    /// Content items in reading order with their nesting level.
    ///
    /// Depth-first from the body, parent before children. Groups are walked
    /// through but not yielded, picture children are not visited, and only
    /// `body`-layer items are yielded. The level is the tree depth below the
    /// body, groups included, so body children are at level 1.
    pub fn iterate_items(&self) -> Vec<(NodeItem<'_>, usize)> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        self.walk(NodeItem::Group(&self.body), 0, &mut seen, &mut out);
        out
    }

    fn walk<'a>(
        &'a self,
        node: NodeItem<'a>,
        level: usize,
        seen: &mut HashSet<&'a str>,
        out: &mut Vec<(NodeItem<'a>, usize)>,
    ) {
        if !seen.insert(node.self_ref()) {
            return;
        }
        if !node.is_group() && node.content_layer() == ContentLayer::Body {
            out.push((node, level));
        }
        if matches!(node, NodeItem::Picture(_)) {
            return;
        }
        for child in node.children() {
            if let Some(child) = self.resolve(child) {
                self.walk(child, level + 1, seen, out);
            }
        }
    }

    /// Render the document, or a single page of it, as markdown.
    pub fn export_to_markdown(&self, page_no: Option<u32>) -> String {
        markdown::render(self, page_no)
    }
}
