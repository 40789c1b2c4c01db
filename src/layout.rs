//! Page layout calculations
//!
//! Places the outline onto fixed-size pages with a single vertical cursor.
//! Coordinates are in points with the origin at the bottom-left of the page.

use crate::pdf::fonts::FontRole;
use crate::outline::Outline;

/// Simple length type in millimeters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Length(pub f64);

impl Length {
    /// Create a length from millimeters
    pub fn from_mm(mm: f64) -> Self {
        Length(mm)
    }

    /// Create a length from centimeters
    pub fn from_cm(cm: f64) -> Self {
        Length(cm * 10.0)
    }

    /// Get the value in points (1/72 inch)
    pub fn pt(&self) -> f32 {
        (self.0 * 72.0 / 25.4) as f32
    }
}

/// Page dimensions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageDimensions {
    pub width: Length,
    pub height: Length,
}

impl PageDimensions {
    /// A4 size (210mm × 297mm)
    pub fn a4() -> Self {
        Self {
            width: Length::from_mm(210.0),
            height: Length::from_mm(297.0),
        }
    }
}

/// Fixed positions, advances and sizes used when laying out an outline
#[derive(Debug, Clone, Copy)]
pub struct LayoutMetrics {
    pub page: PageDimensions,
    /// Document title baseline, measured down from the top edge
    pub title_offset: Length,
    pub title_size: f32,
    /// Subtitle baseline, measured down from the top edge
    pub subtitle_offset: Length,
    pub subtitle_size: f32,
    /// First body line on page one, measured down from the top edge
    pub body_offset: Length,
    /// Cursor reset on continuation pages, measured down from the top edge
    pub continuation_offset: Length,
    /// A new page starts when the cursor is below this before a section
    pub bottom_threshold: Length,
    pub heading_x: Length,
    pub heading_size: f32,
    pub heading_advance: Length,
    pub content_x: Length,
    pub content_size: f32,
    pub line_advance: Length,
    /// Advance for a section with no content
    pub empty_advance: Length,
}

impl Default for LayoutMetrics {
    fn default() -> Self {
        Self {
            page: PageDimensions::a4(),
            title_offset: Length::from_cm(3.0),
            title_size: 24.0,
            subtitle_offset: Length::from_cm(4.0),
            subtitle_size: 16.0,
            body_offset: Length::from_cm(6.0),
            continuation_offset: Length::from_cm(3.0),
            bottom_threshold: Length::from_cm(5.0),
            heading_x: Length::from_cm(2.0),
            heading_size: 14.0,
            heading_advance: Length::from_cm(0.7),
            content_x: Length::from_cm(2.5),
            content_size: 11.0,
            line_advance: Length::from_cm(0.6),
            empty_advance: Length::from_cm(0.3),
        }
    }
}

/// Content shorter than this many characters stays on one line
pub const WRAP_THRESHOLD: usize = 50;

/// Character count of each wrapped line
pub const WRAP_WIDTH: usize = 45;

/// Split content into lines by raw character count
///
/// Counts Unicode scalar values, not rendered width.
pub fn wrap_content(content: &str) -> Vec<String> {
    if content.is_empty() {
        return Vec::new();
    }

    let chars: Vec<char> = content.chars().collect();
    if chars.len() < WRAP_THRESHOLD {
        return vec![content.to_string()];
    }

    chars
        .chunks(WRAP_WIDTH)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

/// Advance width of text, used only to center titles
pub trait TextMeasure {
    fn text_width(&self, role: FontRole, size: f32, text: &str) -> f32;
}

/// A run of text at a fixed position
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedText {
    pub x: f32,
    pub y: f32,
    pub role: FontRole,
    pub size: f32,
    pub text: String,
}

/// Everything drawn on one page
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PageLayout {
    pub runs: Vec<PlacedText>,
}

/// Lay out the whole outline
///
/// Page breaks are only checked before each section, so a long content
/// block can run past the threshold on its page. The result always holds
/// at least the title page.
pub fn layout_outline(
    outline: &Outline,
    metrics: &LayoutMetrics,
    measure: &dyn TextMeasure,
) -> Vec<PageLayout> {
    let width = metrics.page.width.pt();
    let height = metrics.page.height.pt();

    let mut pages = Vec::new();
    let mut current = PageLayout::default();

    let centered = |role: FontRole, size: f32, text: &str, offset: Length| PlacedText {
        x: (width - measure.text_width(role, size, text)) / 2.0,
        y: height - offset.pt(),
        role,
        size,
        text: text.to_string(),
    };

    if !outline.title.is_empty() {
        current.runs.push(centered(
            FontRole::Heading,
            metrics.title_size,
            &outline.title,
            metrics.title_offset,
        ));
    }
    if !outline.subtitle.is_empty() {
        current.runs.push(centered(
            FontRole::Body,
            metrics.subtitle_size,
            &outline.subtitle,
            metrics.subtitle_offset,
        ));
    }

    let mut y = height - metrics.body_offset.pt();

    for section in &outline.sections {
        if y < metrics.bottom_threshold.pt() {
            pages.push(std::mem::take(&mut current));
            y = height - metrics.continuation_offset.pt();
        }

        if !section.title.is_empty() {
            current.runs.push(PlacedText {
                x: metrics.heading_x.pt(),
                y,
                role: FontRole::Heading,
                size: metrics.heading_size,
                text: section.title.clone(),
            });
            y -= metrics.heading_advance.pt();
        }

        if section.content.is_empty() {
            y -= metrics.empty_advance.pt();
            continue;
        }

        for line in wrap_content(&section.content) {
            current.runs.push(PlacedText {
                x: metrics.content_x.pt(),
                y,
                role: FontRole::Body,
                size: metrics.content_size,
                text: line,
            });
            y -= metrics.line_advance.pt();
        }
    }

    pages.push(current);
    pages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outline::Section;

    /// Every character is half an em wide
    struct HalfEm;

    impl TextMeasure for HalfEm {
        fn text_width(&self, _role: FontRole, size: f32, text: &str) -> f32 {
            text.chars().count() as f32 * size * 0.5
        }
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 0.01
    }

    #[test]
    fn test_length_conversions() {
        assert!(approx(Length::from_mm(25.4).pt(), 72.0));
        assert!(approx(Length::from_cm(2.54).pt(), 72.0));
        assert_eq!(Length::from_cm(0.7), Length::from_mm(7.0));
    }

    #[test]
    fn test_a4_size() {
        let a4 = PageDimensions::a4();
        assert!(approx(a4.width.pt(), 595.2756));
        assert!(approx(a4.height.pt(), 841.8898));
    }

    #[test]
    fn test_wrap_short_content_is_one_line() {
        let text = "输入手机号和密码，点击登录";
        assert_eq!(wrap_content(text), vec![text.to_string()]);
        assert!(wrap_content("").is_empty());
    }

    #[test]
    fn test_wrap_counts_chars_not_bytes() {
        // 49 CJK characters are well over 50 bytes but stay on one line
        let text: String = std::iter::repeat('健').take(49).collect();
        assert_eq!(wrap_content(&text).len(), 1);
    }

    #[test]
    fn test_wrap_long_content_in_chunks() {
        let text: String = std::iter::repeat('a').take(100).collect();
        let lines = wrap_content(&text);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].chars().count(), 45);
        assert_eq!(lines[1].chars().count(), 45);
        assert_eq!(lines[2].chars().count(), 10);

        // Exactly at the threshold wraps too
        let text: String = std::iter::repeat('b').take(50).collect();
        assert_eq!(wrap_content(&text).len(), 2);
    }

    #[test]
    fn test_title_page_is_centered() {
        let metrics = LayoutMetrics::default();
        let outline = Outline::new("ABCD", "xy", vec![]);
        let pages = layout_outline(&outline, &metrics, &HalfEm);

        assert_eq!(pages.len(), 1);
        let title = &pages[0].runs[0];
        assert_eq!(title.role, FontRole::Heading);
        assert!(approx(title.x, (595.2756 - 4.0 * 12.0) / 2.0));
        assert!(approx(title.y, 841.8898 - Length::from_cm(3.0).pt()));

        let subtitle = &pages[0].runs[1];
        assert_eq!(subtitle.role, FontRole::Body);
        assert_eq!(subtitle.size, 16.0);
        assert!(approx(subtitle.y, 841.8898 - Length::from_cm(4.0).pt()));
    }

    #[test]
    fn test_empty_outline_still_has_a_page() {
        let outline = Outline::new("", "", vec![]);
        let pages = layout_outline(&outline, &LayoutMetrics::default(), &HalfEm);
        assert_eq!(pages.len(), 1);
        assert!(pages[0].runs.is_empty());
    }

    #[test]
    fn test_cursor_advances() {
        let metrics = LayoutMetrics::default();
        let outline = Outline::new(
            "",
            "",
            vec![
                Section::new("Title", "content"),
                Section::new("", ""),
                Section::new("Next", ""),
                Section::new("", "last"),
            ],
        );
        let pages = layout_outline(&outline, &metrics, &HalfEm);
        let runs = &pages[0].runs;
        let start = 841.8898 - Length::from_cm(6.0).pt();

        assert!(approx(runs[0].y, start));
        assert!(approx(runs[0].x, Length::from_cm(2.0).pt()));
        assert!(approx(runs[1].y, start - Length::from_cm(0.7).pt()));
        assert!(approx(runs[1].x, Length::from_cm(2.5).pt()));

        // 0.7 + 0.6 for the first section, 0.3 for the spacer
        let next = start - Length::from_cm(1.6).pt();
        assert!(approx(runs[2].y, next));

        // A title without content still takes the empty advance
        let last = next - Length::from_cm(0.7 + 0.3).pt();
        assert!(approx(runs[3].y, last));
    }

    #[test]
    fn test_paginates_when_below_threshold() {
        let metrics = LayoutMetrics::default();
        let sections = (0..60).map(|i| Section::new(format!("S{i}"), "")).collect();
        let outline = Outline::new("T", "", sections);
        let pages = layout_outline(&outline, &metrics, &HalfEm);

        assert!(pages.len() > 1);
        let top = 841.8898 - Length::from_cm(3.0).pt();
        for page in &pages[1..] {
            assert!(approx(page.runs[0].y, top));
        }

        // Sections start above the threshold
        let threshold = Length::from_cm(5.0).pt();
        for page in &pages {
            assert!(page.runs.iter().all(|r| r.y >= threshold));
        }

        let total: usize = pages.iter().map(|p| p.runs.len()).sum();
        assert_eq!(total, 61);
    }

    #[test]
    fn test_long_block_is_not_split_across_pages() {
        let metrics = LayoutMetrics::default();
        let long: String = std::iter::repeat('x').take(45 * 40).collect();
        let outline = Outline::new("", "", vec![Section::new("", long)]);
        let pages = layout_outline(&outline, &metrics, &HalfEm);

        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].runs.len(), 40);
    }

    #[test]
    fn test_product_manual_spans_two_pages() {
        let pages = layout_outline(
            &Outline::product_manual(),
            &LayoutMetrics::default(),
            &HalfEm,
        );
        assert_eq!(pages.len(), 2);
    }
}
