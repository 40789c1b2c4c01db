//! PDF metadata extraction

use std::collections::BTreeSet;
use std::path::Path;

use chrono::{DateTime, FixedOffset};
use lopdf::{Dictionary, Document, Object};

use crate::date::parse_pdf_date;
use crate::error::{Error, Result};

/// Count pages by reading the Count field from the Pages dictionary
fn count_pages_from_catalog(doc: &Document) -> Result<usize> {
    let catalog = doc
        .catalog()
        .map_err(|_| Error::General("No catalog in document".to_string()))?;

    let pages_id = catalog
        .get(b"Pages")
        .and_then(Object::as_reference)
        .map_err(|_| Error::General("Pages is not a reference".to_string()))?;

    let count = doc
        .get_dictionary(pages_id)?
        .get(b"Count")
        .and_then(Object::as_i64)
        .map_err(|_| Error::General("No Count in Pages".to_string()))?;

    usize::try_from(count).map_err(|_| Error::General(format!("Invalid page count: {}", count)))
}

/// PDF metadata
#[derive(Debug, Clone)]
pub struct PdfMetadata {
    /// Number of pages in the PDF
    pub page_count: usize,
    /// Document title (if present)
    pub title: Option<String>,
    /// Document subject (if present)
    pub subject: Option<String>,
    /// Producing application (if present)
    pub producer: Option<String>,
    /// Creation timestamp (if present and well formed)
    pub created: Option<DateTime<FixedOffset>>,
    /// Base font names referenced by the document, sorted
    pub fonts: Vec<String>,
}

/// Decode a PDF text string
///
/// Strings starting with a UTF-16BE byte order mark are decoded as UTF-16;
/// anything else is read byte by byte as Latin-1.
pub fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(b"\xFE\xFF") {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }

    bytes.iter().map(|&b| b as char).collect()
}

fn info_string(info: &Dictionary, key: &[u8]) -> Option<String> {
    info.get(key)
        .and_then(Object::as_str)
        .ok()
        .map(decode_text_string)
}

/// Base font names of every font dictionary in the document
fn collect_font_names(doc: &Document) -> Vec<String> {
    let mut names = BTreeSet::new();
    for object in doc.objects.values() {
        let Object::Dictionary(dict) = object else {
            continue;
        };
        let is_font = dict
            .get(b"Type")
            .and_then(Object::as_name)
            .map(|name| name == b"Font")
            .unwrap_or(false);
        if !is_font {
            continue;
        }
        if let Ok(base_font) = dict.get(b"BaseFont").and_then(Object::as_name) {
            names.insert(String::from_utf8_lossy(base_font).into_owned());
        }
    }
    names.into_iter().collect()
}

/// Extract metadata from a PDF file
pub fn extract_metadata(path: &Path) -> Result<PdfMetadata> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    let doc = Document::load(path)?;

    let page_count = count_pages_from_catalog(&doc)?;
    if page_count == 0 {
        return Err(Error::EmptyPdf(path.to_path_buf()));
    }

    let info = doc
        .trailer
        .get(b"Info")
        .and_then(Object::as_reference)
        .and_then(|id| doc.get_dictionary(id))
        .ok();

    let (title, subject, producer, created) = match info {
        Some(info) => (
            info_string(info, b"Title"),
            info_string(info, b"Subject"),
            info_string(info, b"Producer"),
            info_string(info, b"CreationDate").and_then(|s| parse_pdf_date(&s).ok()),
        ),
        None => (None, None, None, None),
    };

    Ok(PdfMetadata {
        page_count,
        title,
        subject,
        producer,
        created,
        fonts: collect_font_names(&doc),
    })
}

/// Count the number of pages in a PDF file
///
/// This is a quick operation that reads the Count field from the Pages dictionary.
pub fn count_pages(path: &Path) -> Result<usize> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    let doc = Document::load(path)?;
    let page_count = count_pages_from_catalog(&doc)?;

    if page_count == 0 {
        return Err(Error::EmptyPdf(path.to_path_buf()));
    }

    Ok(page_count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_pages_nonexistent_file() {
        let result = count_pages(Path::new("nonexistent.pdf"));
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), Error::FileNotFound(_)));
    }

    #[test]
    fn test_extract_metadata_nonexistent_file() {
        let result = extract_metadata(Path::new("nonexistent.pdf"));
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), Error::FileNotFound(_)));
    }

    #[test]
    fn test_decode_utf16_text_string() {
        let bytes = [0xFE, 0xFF, 0x5B, 0xB6, 0x00, 0x41];
        assert_eq!(decode_text_string(&bytes), "家A");
    }

    #[test]
    fn test_decode_latin1_text_string() {
        assert_eq!(decode_text_string(b"Caf\xE9"), "Café");
    }

    // Round trips with generated documents live in tests/integration.rs
}
