//! One-shot manual generation: resolve fonts, lay out, write

use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::Result;
use crate::layout::{layout_outline, LayoutMetrics};
use crate::outline::Outline;
use crate::pdf::create::{build_document, save_document, DocumentInfo};
use crate::pdf::fonts::{FontPreference, FontSet};

/// Directory the manual is written to, relative to the working directory
pub const DEFAULT_OUTPUT_DIR: &str = "docs";

/// File name of the generated manual
pub const DEFAULT_OUTPUT_FILE: &str = "产品使用说明书.pdf";

/// `docs/产品使用说明书.pdf`
pub fn default_output_path() -> PathBuf {
    Path::new(DEFAULT_OUTPUT_DIR).join(DEFAULT_OUTPUT_FILE)
}

/// Options for generating the manual
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Where the PDF is written
    pub output_path: PathBuf,
    /// TrueType file to embed instead of the CID font
    pub font_file: Option<PathBuf>,
    pub preference: FontPreference,
    pub metrics: LayoutMetrics,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            output_path: default_output_path(),
            font_file: None,
            preference: FontPreference::Auto,
            metrics: LayoutMetrics::default(),
        }
    }
}

/// What was written
#[derive(Debug, Clone)]
pub struct GenerateReport {
    pub output_path: PathBuf,
    pub page_count: usize,
    /// Description of the face the text was drawn with
    pub face: String,
}

/// Generate a PDF for `outline`
///
/// # Example
///
/// ```no_run
/// use manual_pdf::generate::{generate_manual, GenerateOptions};
/// use manual_pdf::outline::Outline;
///
/// let report = generate_manual(&Outline::product_manual(), &GenerateOptions::default())
///     .expect("Failed to generate manual");
/// println!("{} pages", report.page_count);
/// ```
pub fn generate_manual(outline: &Outline, options: &GenerateOptions) -> Result<GenerateReport> {
    let fonts = FontSet::resolve(options.preference, options.font_file.as_deref());
    let face = fonts.face().describe();

    let pages = layout_outline(outline, &options.metrics, &fonts);
    let info = DocumentInfo::for_outline(outline);

    let mut doc = build_document(&pages, &fonts, &info, options.metrics.page)?;
    save_document(&mut doc, &options.output_path)?;

    info!(
        path = %options.output_path.display(),
        pages = pages.len(),
        face = %face,
        "manual written"
    );

    Ok(GenerateReport {
        output_path: options.output_path.clone(),
        page_count: pages.len(),
        face,
    })
}

/// Generate the built-in product manual
pub fn create_manual_pdf(options: &GenerateOptions) -> Result<GenerateReport> {
    generate_manual(&Outline::product_manual(), options)
}
