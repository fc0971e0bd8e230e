//! Content and page model handed to the layout engine.

use chrono::NaiveDateTime;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::color::Color;

/// Smallest font size used for layout, in points.
pub const MIN_FONT_SIZE: f64 = 8.0;
/// Largest font size used for layout, in points.
pub const MAX_FONT_SIZE: f64 = 24.0;
/// Smallest page dimension, in points.
pub const MIN_PAGE_DIMENSION: f64 = 200.0;
/// Largest page dimension, in points.
pub const MAX_PAGE_DIMENSION: f64 = 3000.0;
/// A margin may take at most this fraction of its page dimension,
/// so two opposite margins always leave a content area.
pub const MAX_MARGIN_FRACTION: f64 = 0.4;
pub const MIN_LINE_HEIGHT: f64 = 1.0;
pub const MAX_LINE_HEIGHT: f64 = 3.0;

/// Clamp `value` into `[min, max]`, logging when it had to move.
/// NaN is treated as `min`.
pub(crate) fn clamp_logged(
    what: &str,
    value: f64,
    min: f64,
    max: f64,
) -> f64 {
    let clamped = if value.is_nan() {
        min
    } else {
        value.clamp(min, max)
    };
    if clamped != value {
        debug!(
            "{} {} outside [{}, {}], clamped to {}",
            what, value, min, max, clamped
        );
    }
    clamped
}

/// Semantic role of a block.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Heading,
    Paragraph,
    /// Horizontal line. Carries no text.
    Rule,
}

/// One semantic unit of content, as produced by an extractor or
/// built directly by a caller.
///
/// Style fields left as `None` receive kind-specific defaults
/// when the content model is built.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutBlock {
    pub text: String,
    pub kind: BlockKind,
    pub font_size: Option<f64>,
    pub color: Option<Color>,
    pub margin_top: Option<f64>,
    pub margin_bottom: Option<f64>,
}

impl LayoutBlock {
    fn new(kind: BlockKind, text: String) -> Self {
        LayoutBlock {
            text,
            kind,
            font_size: None,
            color: None,
            margin_top: None,
            margin_bottom: None,
        }
    }

    pub fn heading(text: impl Into<String>) -> Self {
        Self::new(BlockKind::Heading, text.into())
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::new(BlockKind::Paragraph, text.into())
    }

    pub fn rule() -> Self {
        Self::new(BlockKind::Rule, String::new())
    }

    pub fn with_font_size(mut self, size: f64) -> Self {
        self.font_size = Some(size);
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_margins(mut self, top: f64, bottom: f64) -> Self {
        self.margin_top = Some(top);
        self.margin_bottom = Some(bottom);
        self
    }
}

/// Page margins in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Margins {
    pub fn uniform(value: f64) -> Self {
        Margins {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }
}

impl Default for Margins {
    fn default() -> Self {
        Margins::uniform(72.0)
    }
}

/// Page size and margins, in points. One per document.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageGeometry {
    pub width: f64,
    pub height: f64,
    pub margins: Margins,
}

impl PageGeometry {
    /// Create a geometry, clamping every value into range.
    pub fn new(width: f64, height: f64, margins: Margins) -> Self {
        PageGeometry {
            width,
            height,
            margins,
        }
        .normalized()
    }

    /// US Letter, 8.5 x 11 in.
    pub fn letter() -> Self {
        PageGeometry {
            width: 612.0,
            height: 792.0,
            margins: Margins::default(),
        }
    }

    /// ISO A4, 210 x 297 mm.
    pub fn a4() -> Self {
        PageGeometry {
            width: 595.0,
            height: 842.0,
            margins: Margins::default(),
        }
    }

    pub fn with_margins(mut self, margins: Margins) -> Self {
        self.margins = margins;
        self.normalized()
    }

    /// Copy of this geometry with the page size clamped to
    /// 200–3000pt and each margin to at most 40% of its
    /// dimension.
    pub fn normalized(&self) -> Self {
        let width = clamp_logged(
            "page width",
            self.width,
            MIN_PAGE_DIMENSION,
            MAX_PAGE_DIMENSION,
        );
        let height = clamp_logged(
            "page height",
            self.height,
            MIN_PAGE_DIMENSION,
            MAX_PAGE_DIMENSION,
        );
        let max_h = width * MAX_MARGIN_FRACTION;
        let max_v = height * MAX_MARGIN_FRACTION;
        PageGeometry {
            width,
            height,
            margins: Margins {
                top: clamp_logged(
                    "top margin",
                    self.margins.top,
                    0.0,
                    max_v,
                ),
                right: clamp_logged(
                    "right margin",
                    self.margins.right,
                    0.0,
                    max_h,
                ),
                bottom: clamp_logged(
                    "bottom margin",
                    self.margins.bottom,
                    0.0,
                    max_v,
                ),
                left: clamp_logged(
                    "left margin",
                    self.margins.left,
                    0.0,
                    max_h,
                ),
            },
        }
    }

    /// Width available for text between the side margins.
    pub fn content_width(&self) -> f64 {
        self.width - self.margins.left - self.margins.right
    }

    /// Height available for text between top and bottom margins.
    pub fn content_height(&self) -> f64 {
        self.height - self.margins.top - self.margins.bottom
    }

    /// Baseline cursor start: the top of the content area.
    pub fn top(&self) -> f64 {
        self.height - self.margins.top
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        PageGeometry::letter()
    }
}

/// Base font size and line spacing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Typography {
    /// Body font size in points.
    pub font_size: f64,
    /// Line height as a multiple of the font size.
    pub line_height: f64,
}

impl Typography {
    pub fn new(font_size: f64, line_height: f64) -> Self {
        Typography {
            font_size,
            line_height,
        }
        .normalized()
    }

    pub fn normalized(&self) -> Self {
        Typography {
            font_size: clamp_font_size(self.font_size),
            line_height: clamp_logged(
                "line height",
                self.line_height,
                MIN_LINE_HEIGHT,
                MAX_LINE_HEIGHT,
            ),
        }
    }

    /// Baseline-to-baseline distance for the body font, in points.
    pub fn line_height_pt(&self) -> f64 {
        self.font_size * self.line_height
    }
}

impl Default for Typography {
    fn default() -> Self {
        Typography {
            font_size: 12.0,
            line_height: 1.4,
        }
    }
}

pub(crate) fn clamp_font_size(size: f64) -> f64 {
    clamp_logged("font size", size, MIN_FONT_SIZE, MAX_FONT_SIZE)
}

/// Document information dictionary entries.
///
/// An Info object is written when any of title, producer or
/// creator is set.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentMeta {
    pub title: Option<String>,
    pub producer: Option<String>,
    pub creator: Option<String>,
    /// Used for CreationDate and ModDate. `None` means now (UTC).
    /// Fix it to get byte-identical output across runs.
    pub timestamp: Option<NaiveDateTime>,
}

impl DocumentMeta {
    pub fn new(title: impl Into<String>) -> Self {
        DocumentMeta {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    /// No Info dictionary at all.
    pub fn none() -> Self {
        DocumentMeta {
            title: None,
            producer: None,
            creator: None,
            timestamp: None,
        }
    }

    pub fn with_producer(mut self, producer: impl Into<String>) -> Self {
        self.producer = Some(producer.into());
        self
    }

    pub fn with_creator(mut self, creator: impl Into<String>) -> Self {
        self.creator = Some(creator.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: NaiveDateTime) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn has_info(&self) -> bool {
        self.title.is_some()
            || self.producer.is_some()
            || self.creator.is_some()
    }
}

impl Default for DocumentMeta {
    fn default() -> Self {
        DocumentMeta {
            title: None,
            producer: Some(format!(
                "textpdf {}",
                env!("CARGO_PKG_VERSION")
            )),
            creator: None,
            timestamp: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geometry_clamps_page_size() {
        let g = PageGeometry::new(50.0, 9000.0, Margins::uniform(10.0));
        assert_eq!(g.width, 200.0);
        assert_eq!(g.height, 3000.0);
    }

    #[test]
    fn geometry_clamps_margins() {
        let g = PageGeometry::new(
            600.0,
            800.0,
            Margins {
                top: 500.0,
                right: -3.0,
                bottom: 10.0,
                left: f64::NAN,
            },
        );
        assert_eq!(g.margins.top, 320.0);
        assert_eq!(g.margins.right, 0.0);
        assert_eq!(g.margins.bottom, 10.0);
        assert_eq!(g.margins.left, 0.0);
        assert!(g.content_width() > 0.0);
        assert!(g.content_height() > 0.0);
    }

    #[test]
    fn typography_clamps() {
        let t = Typography::new(99.0, 0.5);
        assert_eq!(t.font_size, 24.0);
        assert_eq!(t.line_height, 1.0);
        assert_eq!(Typography::default().line_height_pt(), 12.0 * 1.4);
    }

    #[test]
    fn block_builders() {
        let b = LayoutBlock::heading("Title")
            .with_font_size(20.0)
            .with_margins(4.0, 2.0);
        assert_eq!(b.kind, BlockKind::Heading);
        assert_eq!(b.font_size, Some(20.0));
        assert_eq!(b.margin_top, Some(4.0));
        assert_eq!(b.margin_bottom, Some(2.0));
        assert!(LayoutBlock::rule().text.is_empty());
    }

    #[test]
    fn meta_info_presence() {
        assert!(DocumentMeta::default().has_info());
        assert!(!DocumentMeta::none().has_info());
        assert!(DocumentMeta::new("T").has_info());
    }

    #[test]
    fn geometry_deserializes_with_defaults() {
        let g: PageGeometry =
            serde_json::from_str(r#"{"width": 595.0}"#).unwrap();
        assert_eq!(g.width, 595.0);
        assert_eq!(g.height, 792.0);
        assert_eq!(g.margins, Margins::uniform(72.0));
    }
}
