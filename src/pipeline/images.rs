//! Images pass: pictures → base64 PNG with their child texts.
//!
//! Pictures are visited in reading order. A picture's child texts are the
//! items of the document's text inventory whose reference appears among the
//! picture's children, listed in inventory order rather than child order.

use crate::document::{ConvertedDocument, NodeItem};
use crate::error::ExtractError;
use crate::output::ImageRecord;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::DynamicImage;
use std::collections::HashSet;
use std::io::Cursor;
use tracing::debug;

/// Encode an image as PNG and base64 (standard alphabet, padded).
pub fn encode_png_base64(img: &DynamicImage) -> Result<String, image::ImageError> {
    // The PNG encoder has no float formats.
    let converted;
    let img = match img {
        DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_) => {
            converted = DynamicImage::ImageRgba8(img.to_rgba8());
            &converted
        }
        _ => img,
    };

    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;

    let b64 = STANDARD.encode(&buf);
    debug!("Encoded image → {} bytes base64", b64.len());
    Ok(b64)
}

/// One record per picture, in reading order.
pub fn extract_images(
    doc: &ConvertedDocument,
    filename: &str,
) -> Result<Vec<ImageRecord>, ExtractError> {
    let mut records = Vec::new();

    for (node, _level) in doc.iterate_items() {
        let NodeItem::Picture(picture) = node else {
            continue;
        };

        let image = picture
            .get_image(doc)
            .map_err(|e| ExtractError::PictureUnavailable {
                self_ref: picture.self_ref.clone(),
                detail: e.to_string(),
            })?
            .ok_or_else(|| ExtractError::PictureUnavailable {
                self_ref: picture.self_ref.clone(),
                detail: "no embedded image and no page image to crop".into(),
            })?;

        let b64 = encode_png_base64(&image).map_err(|source| ExtractError::ImageEncoding {
            self_ref: picture.self_ref.clone(),
            source,
        })?;

        let child_refs: HashSet<&str> = picture.children.iter().map(|c| c.cref.as_str()).collect();
        let child_texts: Vec<String> = doc
            .texts
            .iter()
            .filter(|t| child_refs.contains(t.self_ref.as_str()))
            .map(|t| t.text.clone())
            .collect();

        let prov = picture
            .prov
            .first()
            .ok_or_else(|| ExtractError::MissingProvenance {
                self_ref: picture.self_ref.clone(),
            })?;

        debug!(
            "Picture {} (page {}): {}x{} px, {} child texts",
            picture.self_ref,
            prov.page_no,
            image.width(),
            image.height(),
            child_texts.len()
        );
        records.push(ImageRecord::new(b64, child_texts, filename, prov.page_no));
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocumentBuilder, ImageRef, ProvenanceItem, RefItem, Size};
    use image::{Rgba, RgbaImage};

    fn red_square() -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255])))
    }

    fn prov(page_no: u32) -> ProvenanceItem {
        ProvenanceItem {
            page_no,
            bbox: None,
        }
    }

    #[test]
    fn encode_small_image() {
        let b64 = encode_png_base64(&red_square()).expect("encode should succeed");
        let decoded = STANDARD.decode(&b64).expect("valid base64");
        assert_eq!(&decoded[..8], b"\x89PNG\r\n\x1a\n");
        let back = image::load_from_memory(&decoded).unwrap();
        assert_eq!((back.width(), back.height()), (10, 10));
    }

    #[test]
    fn encode_float_image() {
        let img = DynamicImage::ImageRgb32F(image::Rgb32FImage::new(3, 2));
        assert!(encode_png_base64(&img).is_ok());
    }

    #[test]
    fn picture_with_caption() {
        let mut b = DocumentBuilder::new("doc");
        b.page(2, Size::default());
        let pic = b.picture(Some(ImageRef::from_image(&red_square(), 144).unwrap()), prov(2));
        b.caption(&pic, "Figure 1: revenue", 2);
        let doc = b.build();

        let images = extract_images(&doc, "f.pdf").unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].child_texts, vec!["Figure 1: revenue"]);
        assert_eq!(images[0].page_number, 2);
        assert!(images[0]
            .image_html
            .starts_with("<img src=\"data:image/png;base64,"));
        assert!(!images[0].is_graph);
        assert_eq!(images[0].image_text_embedding, "null");
    }

    #[test]
    fn child_texts_follow_inventory_order() {
        let mut b = DocumentBuilder::new("doc");
        b.page(1, Size::default());
        let pic = b.picture(Some(ImageRef::from_image(&red_square(), 72).unwrap()), prov(1));
        let first = b.caption(&pic, "first in inventory", 1);
        let second = b.caption(&pic, "second in inventory", 1);
        let mut doc = b.build();
        doc.pictures[0].children = vec![second, RefItem::new("#/texts/99"), first];

        let images = extract_images(&doc, "f.pdf").unwrap();
        assert_eq!(
            images[0].child_texts,
            vec!["first in inventory", "second in inventory"]
        );
    }

    #[test]
    fn picture_without_bitmap_fails() {
        let mut b = DocumentBuilder::new("doc");
        b.page(1, Size::default());
        b.picture(None, prov(1));
        let err = extract_images(&b.build(), "f.pdf").unwrap_err();
        assert!(matches!(err, ExtractError::PictureUnavailable { .. }), "got: {err}");
    }

    #[test]
    fn no_pictures_no_records() {
        let doc = DocumentBuilder::new("doc").build();
        assert!(extract_images(&doc, "f.pdf").unwrap().is_empty());
    }
}
