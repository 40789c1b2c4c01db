//! PDF creation from laid-out pages using lopdf

use std::path::Path;

use chrono::{DateTime, FixedOffset};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream, StringFormat};
use tracing::{debug, warn};

use crate::date::{format_pdf_date, now};
use crate::error::Result;
use crate::layout::{PageDimensions, PageLayout};
use crate::outline::Outline;
use crate::pdf::fonts::{FontSet, GlyphUsage};

/// Entries written to the document information dictionary
#[derive(Debug, Clone)]
pub struct DocumentInfo {
    pub title: String,
    pub subject: String,
    pub producer: String,
    pub created: DateTime<FixedOffset>,
}

impl DocumentInfo {
    /// Info for an outline, stamped with the current time
    pub fn for_outline(outline: &Outline) -> Self {
        Self {
            title: outline.title.clone(),
            subject: outline.subtitle.clone(),
            producer: format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            created: now(),
        }
    }
}

/// Encode a text string, using UTF-16BE with a byte order mark when it is
/// not plain ASCII
pub fn text_string(s: &str) -> Object {
    if s.is_ascii() {
        return Object::string_literal(s);
    }

    let mut bytes = vec![0xFE, 0xFF];
    for unit in s.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

/// Build an in-memory document with one page per layout
///
/// An empty `pages` slice still produces a single blank page.
pub fn build_document(
    pages: &[PageLayout],
    fonts: &FontSet,
    info: &DocumentInfo,
    page_size: PageDimensions,
) -> Result<Document> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let blank = [PageLayout::default()];
    let pages = if pages.is_empty() { &blank[..] } else { pages };

    // Encode everything first so embedded fonts know every glyph in use
    let mut usage = GlyphUsage::default();
    let encoded = encode_pages(pages, fonts, &mut usage)?;

    if encoded.replaced > 0 {
        warn!(
            replaced = encoded.replaced,
            face = %fonts.face().describe(),
            "characters not covered by the font were replaced"
        );
    }
    let contents = encoded.contents;

    let font_resources = fonts.add_to_document(&mut doc, &usage)?;
    let resources_id = doc.add_object(dictionary! {
        "Font" => font_resources.to_dictionary(),
    });

    let media_box: Vec<Object> = vec![
        0.into(),
        0.into(),
        page_size.width.pt().into(),
        page_size.height.pt().into(),
    ];

    let mut kids: Vec<Object> = Vec::with_capacity(contents.len());
    for (index, content) in contents.into_iter().enumerate() {
        let runs = content.operations.iter().filter(|op| op.operator == "Tj").count();
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => media_box.clone(),
            "Resources" => resources_id,
            "Contents" => content_id,
        });
        debug!(page = index + 1, runs, "page written");
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let info_id = add_info(&mut doc, info);
    doc.trailer.set("Info", info_id);

    Ok(doc)
}

/// Content streams for a set of pages
struct EncodedPages {
    contents: Vec<Content>,
    /// Characters the face could not draw, across all pages
    replaced: usize,
}

fn encode_pages(
    pages: &[PageLayout],
    fonts: &FontSet,
    usage: &mut GlyphUsage,
) -> Result<EncodedPages> {
    let mut replaced = 0;
    let mut contents = Vec::with_capacity(pages.len());

    for page in pages {
        let mut operations = vec![Operation::new("g", vec![0.into()])];
        for run in &page.runs {
            let encoded = fonts.encode(&run.text, usage)?;
            replaced += encoded.replaced;

            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new(
                "Tf",
                vec![run.role.resource_name().into(), run.size.into()],
            ));
            operations.push(Operation::new(
                "Tm",
                vec![1.into(), 0.into(), 0.into(), 1.into(), run.x.into(), run.y.into()],
            ));
            operations.push(Operation::new("Tj", vec![encoded.to_object(fonts.face())]));
            operations.push(Operation::new("ET", vec![]));
        }
        contents.push(Content { operations });
    }

    Ok(EncodedPages { contents, replaced })
}

fn add_info(doc: &mut Document, info: &DocumentInfo) -> ObjectId {
    doc.add_object(dictionary! {
        "Title" => text_string(&info.title),
        "Subject" => text_string(&info.subject),
        "Producer" => text_string(&info.producer),
        "CreationDate" => Object::string_literal(format_pdf_date(&info.created)),
    })
}

/// Compress and write a document, creating the parent directory if needed
pub fn save_document(doc: &mut Document, output: &Path) -> Result<()> {
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    doc.compress();
    doc.save(output)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::PlacedText;
    use crate::pdf::fonts::{FontFace, FontRole};
    use chrono::TimeZone;

    fn info() -> DocumentInfo {
        DocumentInfo {
            title: "家庭健康中心 APP".to_string(),
            subject: "Manual".to_string(),
            producer: "manual-pdf test".to_string(),
            created: FixedOffset::east_opt(8 * 3600)
                .unwrap()
                .with_ymd_and_hms(2026, 10, 16, 12, 0, 0)
                .unwrap(),
        }
    }

    fn page(texts: &[&str]) -> PageLayout {
        PageLayout {
            runs: texts
                .iter()
                .enumerate()
                .map(|(i, text)| PlacedText {
                    x: 56.7,
                    y: 700.0 - i as f32 * 17.0,
                    role: if i == 0 { FontRole::Heading } else { FontRole::Body },
                    size: 11.0,
                    text: text.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_text_string_ascii_is_literal() {
        assert!(matches!(
            text_string("Manual"),
            Object::String(ref bytes, StringFormat::Literal) if bytes == b"Manual"
        ));
    }

    #[test]
    fn test_text_string_utf16_has_bom() {
        match text_string("健") {
            Object::String(bytes, StringFormat::Hexadecimal) => {
                assert_eq!(bytes, vec![0xFE, 0xFF, 0x50, 0x65]);
            }
            other => panic!("Expected hex string, got {:?}", other),
        }
    }

    #[test]
    fn test_build_document_page_tree() {
        let fonts = FontSet::new(FontFace::Cid);
        let pages = vec![page(&["一、产品概述", "内容"]), page(&["二、快速开始"])];
        let doc = build_document(&pages, &fonts, &info(), PageDimensions::a4()).unwrap();

        assert_eq!(doc.get_pages().len(), 2);

        let first = *doc.get_pages().get(&1).unwrap();
        let content = doc.get_and_decode_page_content(first).unwrap();
        let tj = content.operations.iter().filter(|op| op.operator == "Tj").count();
        assert_eq!(tj, 2);

        let fonts_used: Vec<&str> = content
            .operations
            .iter()
            .filter(|op| op.operator == "Tf")
            .map(|op| std::str::from_utf8(op.operands[0].as_name().unwrap()).unwrap())
            .collect();
        assert_eq!(fonts_used, vec!["F2", "F1"]);
    }

    #[test]
    fn test_build_document_without_pages_has_blank_page() {
        let fonts = FontSet::new(FontFace::Standard);
        let doc = build_document(&[], &fonts, &info(), PageDimensions::a4()).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn test_replacements_are_counted_per_document() {
        let pages = vec![
            page(&["Q: 忘记密码？", "A: 使用"]),
            page(&["support@example.com", "健康"]),
        ];

        // 5 + 2 on the first page, 2 on the second
        let latin = FontSet::new(FontFace::Standard);
        let encoded = encode_pages(&pages, &latin, &mut GlyphUsage::default()).unwrap();
        assert_eq!(encoded.contents.len(), 2);
        assert_eq!(encoded.replaced, 9);

        let cjk = FontSet::new(FontFace::Cid);
        let encoded = encode_pages(&pages, &cjk, &mut GlyphUsage::default()).unwrap();
        assert_eq!(encoded.replaced, 0);
    }

    #[test]
    fn test_info_dictionary() {
        let fonts = FontSet::new(FontFace::Cid);
        let doc = build_document(&[page(&["x"])], &fonts, &info(), PageDimensions::a4()).unwrap();

        let info_id = doc.trailer.get(b"Info").unwrap().as_reference().unwrap();
        let dict = doc.get_dictionary(info_id).unwrap();
        assert_eq!(dict.get(b"Subject").unwrap().as_str().unwrap(), b"Manual");
        assert_eq!(
            dict.get(b"CreationDate").unwrap().as_str().unwrap(),
            b"D:20261016120000+08'00'"
        );
    }

    #[test]
    fn test_save_creates_parent_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        let output = dir.path().join("docs").join("manual.pdf");

        let fonts = FontSet::new(FontFace::Cid);
        let mut doc = build_document(&[page(&["x"])], &fonts, &info(), PageDimensions::a4()).unwrap();
        save_document(&mut doc, &output).unwrap();

        assert!(output.exists());
        let loaded = Document::load(&output).unwrap();
        assert_eq!(loaded.get_pages().len(), 1);
    }
}
