//! Font selection, text encoding and font dictionaries
//!
//! Three faces are supported:
//! - the Adobe-GB1 CID font `STSong-Light`, referenced by name and supplied
//!   by the viewer (the default, covers Simplified Chinese)
//! - the base-14 `Helvetica` / `Helvetica-Bold` pair with WinAnsiEncoding
//! - a TrueType file embedded as a Type0 font with `Identity-H`
//!
//! Loading a font file never aborts generation: on failure we log a warning
//! and fall back to the CID face.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::layout::TextMeasure;

/// What a run of text is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontRole {
    /// Document title and section titles
    Heading,
    /// Subtitle and content lines
    Body,
}

impl FontRole {
    /// Name of the font in the page resources
    pub fn resource_name(self) -> &'static str {
        match self {
            FontRole::Body => "F1",
            FontRole::Heading => "F2",
        }
    }
}

/// Which face the user asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontPreference {
    /// Embedded font file when given, otherwise the CID face
    #[default]
    Auto,
    /// Always the CID face
    Cjk,
    /// Always the Helvetica pair
    Latin,
}

impl FromStr for FontPreference {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(FontPreference::Auto),
            "cjk" => Ok(FontPreference::Cjk),
            "latin" => Ok(FontPreference::Latin),
            other => Err(format!(
                "unknown font preference '{}' (expected auto, cjk or latin)",
                other
            )),
        }
    }
}

impl fmt::Display for FontPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FontPreference::Auto => "auto",
            FontPreference::Cjk => "cjk",
            FontPreference::Latin => "latin",
        };
        f.write_str(name)
    }
}

/// Name of the CID font used by default
pub const CID_FONT_NAME: &str = "STSong-Light";

/// Helvetica widths for characters 32-126, in 1/1000 em
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

/// Helvetica-Bold widths for characters 32-126, in 1/1000 em
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

/// A font program loaded from disk
#[derive(Clone)]
pub struct EmbeddedFont {
    path: PathBuf,
    name: String,
    data: Vec<u8>,
    units_per_em: u16,
}

impl fmt::Debug for EmbeddedFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddedFont")
            .field("path", &self.path)
            .field("name", &self.name)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// One glyph produced by shaping
#[derive(Debug, Clone, PartialEq)]
struct ShapedGlyph {
    id: u16,
    /// Advance in font units
    advance: i32,
    /// Source text of the cluster, empty for the trailing glyphs of a cluster
    text: String,
}

impl EmbeddedFont {
    /// Read and validate a TrueType file
    ///
    /// Only glyf outlines can be written as `FontFile2`, so OpenType files
    /// with CFF outlines are rejected and the caller falls back.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }

        let data = std::fs::read(path)?;
        if data.starts_with(CFF_SFNT_VERSION) {
            return Err(cff_unsupported(path));
        }
        if data.starts_with(COLLECTION_TAG) {
            return Err(Error::Font(format!(
                "font collections cannot be embedded, extract a single .ttf: {}",
                path.display()
            )));
        }

        let units_per_em = {
            let face = rustybuzz::Face::from_slice(&data, 0)
                .ok_or_else(|| Error::Font(format!("not a usable font file: {}", path.display())))?;
            if face.tables().cff.is_some() || face.tables().cff2.is_some() {
                return Err(cff_unsupported(path));
            }
            u16::try_from(face.units_per_em())
                .ok()
                .filter(|&units| units > 0)
                .ok_or_else(|| {
                    Error::Font(format!(
                        "font has invalid units per em ({}): {}",
                        face.units_per_em(),
                        path.display()
                    ))
                })?
        };

        Ok(Self {
            path: path.to_path_buf(),
            name: postscript_safe_name(path),
            data,
            units_per_em,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn face(&self) -> Result<rustybuzz::Face<'_>> {
        rustybuzz::Face::from_slice(&self.data, 0)
            .ok_or_else(|| Error::Font(format!("not a usable font file: {}", self.path.display())))
    }

    fn shape(&self, text: &str) -> Result<Vec<ShapedGlyph>> {
        let face = self.face()?;
        let mut buffer = rustybuzz::UnicodeBuffer::new();
        buffer.push_str(text);
        let output = rustybuzz::shape(&face, &[], buffer);

        let infos = output.glyph_infos();
        let positions = output.glyph_positions();

        let mut glyphs = Vec::with_capacity(infos.len());
        for (i, (info, pos)) in infos.iter().zip(positions).enumerate() {
            let start = info.cluster as usize;
            let first_of_cluster = i == 0 || infos[i - 1].cluster != info.cluster;
            let cluster_text = if first_of_cluster {
                let end = infos[i + 1..]
                    .iter()
                    .map(|next| next.cluster as usize)
                    .find(|&c| c > start)
                    .unwrap_or(text.len());
                text.get(start..end).unwrap_or_default().to_string()
            } else {
                String::new()
            };

            glyphs.push(ShapedGlyph {
                id: u16::try_from(info.glyph_id).unwrap_or(0),
                advance: pos.x_advance,
                text: cluster_text,
            });
        }

        Ok(glyphs)
    }

    /// Advance in 1/1000 em
    fn scaled(&self, units: i32) -> i64 {
        (units as i64 * 1000) / self.units_per_em as i64
    }
}

/// sfnt version of OpenType files with CFF outlines
const CFF_SFNT_VERSION: &[u8] = b"OTTO";

/// Header tag of TrueType collections
const COLLECTION_TAG: &[u8] = b"ttcf";

fn cff_unsupported(path: &Path) -> Error {
    Error::Font(format!(
        "CFF-flavoured OpenType fonts cannot be embedded, use a TrueType (glyf) font: {}",
        path.display()
    ))
}

/// Build a name usable as a PDF name object from the file stem
fn postscript_safe_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name: String = stem
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();

    if name.is_empty() {
        "EmbeddedFont".to_string()
    } else {
        name
    }
}

/// The face the document is drawn with
#[derive(Debug, Clone)]
pub enum FontFace {
    Cid,
    Standard,
    Embedded(EmbeddedFont),
}

impl FontFace {
    /// Short human readable description
    pub fn describe(&self) -> String {
        match self {
            FontFace::Cid => CID_FONT_NAME.to_string(),
            FontFace::Standard => "Helvetica".to_string(),
            FontFace::Embedded(font) => format!("{} (embedded)", font.name()),
        }
    }
}

/// Glyphs used by an embedded face, collected while encoding
#[derive(Debug, Default)]
pub struct GlyphUsage {
    /// glyph id -> (width in 1/1000 em, unicode text)
    glyphs: BTreeMap<u16, (i64, String)>,
}

impl GlyphUsage {
    fn len(&self) -> usize {
        self.glyphs.len()
    }
}

/// Encoded string operand plus the number of characters we could not map
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedText {
    pub bytes: Vec<u8>,
    pub replaced: usize,
}

impl EncodedText {
    /// The operand for `Tj`
    pub fn to_object(&self, face: &FontFace) -> Object {
        let format = match face {
            FontFace::Standard => StringFormat::Literal,
            FontFace::Cid | FontFace::Embedded(_) => StringFormat::Hexadecimal,
        };
        Object::String(self.bytes.clone(), format)
    }
}

/// Object ids of the fonts written into a document
#[derive(Debug, Clone, Copy)]
pub struct FontResources {
    pub body: ObjectId,
    pub heading: ObjectId,
}

impl FontResources {
    /// The `/Font` resource subdictionary
    pub fn to_dictionary(&self) -> Dictionary {
        dictionary! {
            FontRole::Body.resource_name() => self.body,
            FontRole::Heading.resource_name() => self.heading,
        }
    }
}

/// The fonts a document is drawn with
#[derive(Debug, Clone)]
pub struct FontSet {
    face: FontFace,
}

impl FontSet {
    pub fn new(face: FontFace) -> Self {
        Self { face }
    }

    /// Pick the face for a preference, falling back to the CID face when a
    /// font file cannot be used
    pub fn resolve(preference: FontPreference, font_file: Option<&Path>) -> Self {
        let face = match (preference, font_file) {
            (FontPreference::Latin, file) => {
                if let Some(path) = file {
                    info!(path = %path.display(), "ignoring font file with latin preference");
                }
                FontFace::Standard
            }
            (FontPreference::Cjk, file) => {
                if let Some(path) = file {
                    info!(path = %path.display(), "ignoring font file with cjk preference");
                }
                FontFace::Cid
            }
            (FontPreference::Auto, Some(path)) => match EmbeddedFont::load(path) {
                Ok(font) => {
                    debug!(name = font.name(), path = %path.display(), "loaded font file");
                    FontFace::Embedded(font)
                }
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "font file unusable, falling back to {}",
                        CID_FONT_NAME
                    );
                    FontFace::Cid
                }
            },
            (FontPreference::Auto, None) => FontFace::Cid,
        };

        Self::new(face)
    }

    pub fn face(&self) -> &FontFace {
        &self.face
    }

    /// Encode text for the face, recording embedded glyphs in `usage`
    pub fn encode(&self, text: &str, usage: &mut GlyphUsage) -> Result<EncodedText> {
        match &self.face {
            FontFace::Cid => Ok(encode_ucs2(text)),
            FontFace::Standard => Ok(encode_win_ansi(text)),
            FontFace::Embedded(font) => {
                let glyphs = font.shape(text)?;
                let mut bytes = Vec::with_capacity(glyphs.len() * 2);
                let mut replaced = 0;
                for glyph in glyphs {
                    if glyph.id == 0 {
                        replaced += glyph.text.chars().count().max(1);
                    }
                    bytes.extend_from_slice(&glyph.id.to_be_bytes());
                    let entry = usage
                        .glyphs
                        .entry(glyph.id)
                        .or_insert_with(|| (font.scaled(glyph.advance), String::new()));
                    if entry.1.is_empty() && glyph.id != 0 {
                        entry.1 = glyph.text;
                    }
                }
                Ok(EncodedText { bytes, replaced })
            }
        }
    }

    /// Write the font dictionaries into `doc`
    ///
    /// For embedded faces `usage` must hold every glyph drawn in the document.
    pub fn add_to_document(&self, doc: &mut Document, usage: &GlyphUsage) -> Result<FontResources> {
        match &self.face {
            FontFace::Cid => {
                let id = add_cid_font(doc);
                Ok(FontResources { body: id, heading: id })
            }
            FontFace::Standard => {
                let body = add_standard_font(doc, "Helvetica");
                let heading = add_standard_font(doc, "Helvetica-Bold");
                Ok(FontResources { body, heading })
            }
            FontFace::Embedded(font) => {
                let id = add_embedded_font(doc, font, usage)?;
                Ok(FontResources { body: id, heading: id })
            }
        }
    }
}

impl TextMeasure for FontSet {
    fn text_width(&self, role: FontRole, size: f32, text: &str) -> f32 {
        let units: i64 = match &self.face {
            FontFace::Cid => text
                .chars()
                .map(|c| if (' '..='~').contains(&c) { 500 } else { 1000 })
                .sum(),
            FontFace::Standard => {
                let (table, default) = match role {
                    FontRole::Body => (&HELVETICA_WIDTHS, 556),
                    FontRole::Heading => (&HELVETICA_BOLD_WIDTHS, 611),
                };
                text.chars()
                    .map(|c| {
                        let code = c as u32;
                        if (32..=126).contains(&code) {
                            table[(code - 32) as usize] as i64
                        } else {
                            default
                        }
                    })
                    .sum()
            }
            FontFace::Embedded(font) => match font.shape(text) {
                Ok(glyphs) => glyphs.iter().map(|g| font.scaled(g.advance)).sum(),
                Err(_) => 0,
            },
        };

        units as f32 * size / 1000.0
    }
}

/// Big-endian UCS-2, the byte layout `UniGB-UCS2-H` expects
fn encode_ucs2(text: &str) -> EncodedText {
    let mut bytes = Vec::with_capacity(text.len() * 2);
    let mut replaced = 0;
    for c in text.chars() {
        let code = u16::try_from(c as u32).unwrap_or_else(|_| {
            replaced += 1;
            b'?' as u16
        });
        bytes.extend_from_slice(&code.to_be_bytes());
    }
    EncodedText { bytes, replaced }
}

/// WinAnsiEncoding for printable ASCII and Latin-1
fn encode_win_ansi(text: &str) -> EncodedText {
    let mut bytes = Vec::with_capacity(text.len());
    let mut replaced = 0;
    for c in text.chars() {
        let code = c as u32;
        if (0x20..=0x7E).contains(&code) || (0xA0..=0xFF).contains(&code) {
            bytes.push(code as u8);
        } else {
            replaced += 1;
            bytes.push(b'?');
        }
    }
    EncodedText { bytes, replaced }
}

fn add_standard_font(doc: &mut Document, base_font: &str) -> ObjectId {
    doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base_font,
        "Encoding" => "WinAnsiEncoding",
    })
}

/// Reference `STSong-Light` without embedding a font program
fn add_cid_font(doc: &mut Document) -> ObjectId {
    let descriptor_id = doc.add_object(dictionary! {
        "Type" => "FontDescriptor",
        "FontName" => CID_FONT_NAME,
        "Flags" => 6,
        "FontBBox" => vec![(-25).into(), (-254).into(), 1000.into(), 880.into()],
        "ItalicAngle" => 0,
        "Ascent" => 880,
        "Descent" => -120,
        "CapHeight" => 880,
        "StemV" => 93,
    });

    let cid_font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "CIDFontType0",
        "BaseFont" => CID_FONT_NAME,
        "CIDSystemInfo" => dictionary! {
            "Registry" => Object::string_literal("Adobe"),
            "Ordering" => Object::string_literal("GB1"),
            "Supplement" => 2,
        },
        "FontDescriptor" => descriptor_id,
        "DW" => 1000,
        // Proportional and half-width Roman ranges
        "W" => vec![
            1.into(), 95.into(), 500.into(),
            814.into(), 907.into(), 500.into(),
        ],
    });

    doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type0",
        "BaseFont" => CID_FONT_NAME,
        "Encoding" => "UniGB-UCS2-H",
        "DescendantFonts" => vec![cid_font_id.into()],
    })
}

/// Embed a TrueType program as a Type0 font with `Identity-H` encoding
fn add_embedded_font(doc: &mut Document, font: &EmbeddedFont, usage: &GlyphUsage) -> Result<ObjectId> {
    let face = font.face()?;
    let scale = |v: i16| font.scaled(v as i32);
    let bbox = face.global_bounding_box();
    let ascent = scale(face.ascender());
    let descent = scale(face.descender());
    let cap_height = face.capital_height().map(scale).unwrap_or(ascent);

    let font_file_id = doc.add_object(Stream::new(
        dictionary! { "Length1" => font.data.len() as i64 },
        font.data.clone(),
    ));

    let descriptor_id = doc.add_object(dictionary! {
        "Type" => "FontDescriptor",
        "FontName" => font.name(),
        "Flags" => 4,
        "FontBBox" => vec![
            scale(bbox.x_min).into(),
            scale(bbox.y_min).into(),
            scale(bbox.x_max).into(),
            scale(bbox.y_max).into(),
        ],
        "ItalicAngle" => 0,
        "Ascent" => ascent,
        "Descent" => descent,
        "CapHeight" => cap_height,
        "StemV" => 80,
        "FontFile2" => font_file_id,
    });

    let mut widths = Vec::with_capacity(usage.len() * 2);
    for (gid, (width, _)) in &usage.glyphs {
        widths.push(Object::Integer(*gid as i64));
        widths.push(Object::Array(vec![Object::Integer(*width)]));
    }

    let cid_font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "CIDFontType2",
        "BaseFont" => font.name(),
        "CIDSystemInfo" => dictionary! {
            "Registry" => Object::string_literal("Adobe"),
            "Ordering" => Object::string_literal("Identity"),
            "Supplement" => 0,
        },
        "FontDescriptor" => descriptor_id,
        "DW" => 1000,
        "W" => widths,
        "CIDToGIDMap" => "Identity",
    });

    let to_unicode_id = doc.add_object(Stream::new(
        Dictionary::new(),
        to_unicode_cmap(usage).into_bytes(),
    ));

    Ok(doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type0",
        "BaseFont" => font.name(),
        "Encoding" => "Identity-H",
        "DescendantFonts" => vec![cid_font_id.into()],
        "ToUnicode" => to_unicode_id,
    }))
}

/// ToUnicode CMap for the glyphs actually drawn
fn to_unicode_cmap(usage: &GlyphUsage) -> String {
    let entries: Vec<(u16, &str)> = usage
        .glyphs
        .iter()
        .filter(|(_, (_, text))| !text.is_empty())
        .map(|(gid, (_, text))| (*gid, text.as_str()))
        .collect();

    let mut cmap = String::from(
        "/CIDInit /ProcSet findresource begin\n\
         12 dict begin\n\
         begincmap\n\
         /CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
         /CMapName /Adobe-Identity-UCS def\n\
         /CMapType 2 def\n\
         1 begincodespacerange\n\
         <0000> <FFFF>\n\
         endcodespacerange\n",
    );

    // bfchar blocks hold at most 100 entries
    for block in entries.chunks(100) {
        cmap.push_str(&format!("{} beginbfchar\n", block.len()));
        for (gid, text) in block {
            let unicode: String = text.encode_utf16().map(|u| format!("{:04X}", u)).collect();
            cmap.push_str(&format!("<{:04X}> <{}>\n", gid, unicode));
        }
        cmap.push_str("endbfchar\n");
    }

    cmap.push_str(
        "endcmap\n\
         CMapName currentdict /CMap defineresource pop\n\
         end\n\
         end\n",
    );
    cmap
}
