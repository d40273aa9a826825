use super::{
    ContentLayer, ConvertedDocument, DocItemLabel, GroupItem, ImageRef, PageItem, PictureItem,
    ProvenanceItem, RefItem, Size, TableData, TableItem, TextItem,
};

/// Assembles a [`ConvertedDocument`] item by item.
///
/// Items are appended to the body in call order, except captions, which are
/// attached to the table or picture they describe.
#[derive(Debug)]
pub struct DocumentBuilder {
    doc: ConvertedDocument,
}

impl DocumentBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            doc: ConvertedDocument {
                name: name.into(),
                body: GroupItem::root(),
                groups: Vec::new(),
                texts: Vec::new(),
                pictures: Vec::new(),
                tables: Vec::new(),
                pages: Default::default(),
            },
        }
    }

    /// Register a page. Calling again for the same number replaces it.
    pub fn page(&mut self, page_no: u32, size: Size) -> &mut Self {
        self.doc.pages.insert(
            page_no,
            PageItem {
                page_no,
                size,
                image: None,
            },
        );
        self
    }

    pub fn text(&mut self, label: DocItemLabel, text: impl Into<String>, page_no: u32) -> RefItem {
        let item = self.text_item(label, text.into(), page_no, Some(RefItem::new("#/body")));
        self.doc.body.children.push(item.clone());
        item
    }

    pub fn section_header(&mut self, text: impl Into<String>, level: u32, page_no: u32) -> RefItem {
        let item = self.text(DocItemLabel::SectionHeader, text, page_no);
        if let Some(t) = self.doc.texts.last_mut() {
            t.level = Some(level);
        }
        item
    }

    pub fn picture(&mut self, image: Option<ImageRef>, prov: ProvenanceItem) -> RefItem {
        let self_ref = format!("#/pictures/{}", self.doc.pictures.len());
        self.doc.pictures.push(PictureItem {
            self_ref: self_ref.clone(),
            parent: Some(RefItem::new("#/body")),
            children: Vec::new(),
            content_layer: ContentLayer::Body,
            label: DocItemLabel::Picture,
            prov: vec![prov],
            captions: Vec::new(),
            image,
        });
        let item = RefItem::new(self_ref);
        self.doc.body.children.push(item.clone());
        item
    }

    pub fn table(&mut self, data: TableData, page_no: u32) -> RefItem {
        let self_ref = format!("#/tables/{}", self.doc.tables.len());
        self.doc.tables.push(TableItem {
            self_ref: self_ref.clone(),
            parent: Some(RefItem::new("#/body")),
            children: Vec::new(),
            content_layer: ContentLayer::Body,
            label: DocItemLabel::Table,
            prov: vec![ProvenanceItem {
                page_no,
                bbox: None,
            }],
            captions: Vec::new(),
            data,
        });
        let item = RefItem::new(self_ref);
        self.doc.body.children.push(item.clone());
        item
    }

    /// Attach a caption to a table or picture. Other targets are ignored and
    /// the caption becomes a plain body item.
    pub fn caption(&mut self, target: &RefItem, text: impl Into<String>, page_no: u32) -> RefItem {
        let item = self.text_item(
            DocItemLabel::Caption,
            text.into(),
            page_no,
            Some(target.clone()),
        );

        let attached = if let Some(p) =
            index_of(target, "#/pictures/").and_then(|i| self.doc.pictures.get_mut(i))
        {
            p.children.push(item.clone());
            p.captions.push(item.clone());
            true
        } else if let Some(t) =
            index_of(target, "#/tables/").and_then(|i| self.doc.tables.get_mut(i))
        {
            t.children.push(item.clone());
            t.captions.push(item.clone());
            true
        } else {
            false
        };

        if !attached {
            if let Some(t) = self.doc.texts.last_mut() {
                t.parent = Some(RefItem::new("#/body"));
            }
            self.doc.body.children.push(item.clone());
        }
        item
    }

    pub fn build(self) -> ConvertedDocument {
        self.doc
    }

    fn text_item(
        &mut self,
        label: DocItemLabel,
        text: String,
        page_no: u32,
        parent: Option<RefItem>,
    ) -> RefItem {
        let self_ref = format!("#/texts/{}", self.doc.texts.len());
        self.doc.texts.push(TextItem {
            self_ref: self_ref.clone(),
            parent,
            children: Vec::new(),
            content_layer: ContentLayer::Body,
            label,
            prov: vec![ProvenanceItem {
                page_no,
                bbox: None,
            }],
            orig: text.clone(),
            text,
            level: None,
            enumerated: None,
        });
        RefItem::new(self_ref)
    }
}

fn index_of(item: &RefItem, prefix: &str) -> Option<usize> {
    item.cref.strip_prefix(prefix)?.parse().ok()
}
