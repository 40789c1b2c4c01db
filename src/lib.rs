//! Manual PDF Library
//!
//! Renders the Family Health Center user manual into a paginated A4 PDF.
//! This library provides functionality to:
//! - Hold the manual as a flat outline of (title, content) sections
//! - Lay sections out with a vertical cursor, wrapping by character count
//! - Select a font, falling back to `STSong-Light` when a font file is unusable
//! - Write the document with lopdf and read its metadata back
//!
//! # Example
//!
//! ```no_run
//! use manual_pdf::generate::{create_manual_pdf, GenerateOptions};
//! use std::path::PathBuf;
//!
//! let options = GenerateOptions {
//!     output_path: PathBuf::from("manual.pdf"),
//!     ..Default::default()
//! };
//!
//! create_manual_pdf(&options).expect("Failed to generate manual");
//! ```

pub mod error;
pub mod pdf;
pub mod date;
pub mod layout;
pub mod outline;
pub mod generate;

// Re-export commonly used items
pub use error::{Error, Result};
pub use generate::{create_manual_pdf, generate_manual, GenerateOptions, GenerateReport};
pub use outline::{Outline, Section};
