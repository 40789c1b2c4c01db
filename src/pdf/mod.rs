//! PDF writing and inspection module

pub mod create;
pub mod fonts;
pub mod metadata;

// Re-export commonly used items
pub use create::{build_document, save_document, DocumentInfo};
pub use fonts::{FontFace, FontPreference, FontRole, FontSet};
pub use metadata::{count_pages, extract_metadata, PdfMetadata};
