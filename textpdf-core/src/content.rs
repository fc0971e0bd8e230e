//! Resolves semantic blocks into layout-ready items.

use crate::color::Color;
use crate::fonts::FontResource;
use crate::model::{
    clamp_font_size, clamp_logged, BlockKind, LayoutBlock, Typography,
    MAX_PAGE_DIMENSION,
};

/// Heading font size relative to the body size when a heading
/// does not carry its own.
const HEADING_SCALE: f64 = 1.5;
const HEADING_MARGIN_TOP: f64 = 12.0;
const HEADING_MARGIN_BOTTOM: f64 = 6.0;
const PARAGRAPH_MARGIN_TOP: f64 = 0.0;
const PARAGRAPH_MARGIN_BOTTOM: f64 = 6.0;
const RULE_MARGIN: f64 = 6.0;

/// A block with every style value resolved and clamped.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutItem {
    pub text: String,
    pub kind: BlockKind,
    pub font_size: f64,
    pub color: Color,
    pub margin_top: f64,
    pub margin_bottom: f64,
    pub font: FontResource,
}

impl LayoutItem {
    pub fn is_rule(&self) -> bool {
        self.kind == BlockKind::Rule
    }
}

/// Turn blocks into layout items, filling unset values with
/// kind-specific defaults derived from `typography`.
pub fn build_items(
    blocks: &[LayoutBlock],
    typography: &Typography,
) -> Vec<LayoutItem> {
    blocks
        .iter()
        .map(|block| resolve(block, typography))
        .collect()
}

fn resolve(block: &LayoutBlock, typography: &Typography) -> LayoutItem {
    let (size, top, bottom, font) = match block.kind {
        BlockKind::Heading => (
            typography.font_size * HEADING_SCALE,
            HEADING_MARGIN_TOP,
            HEADING_MARGIN_BOTTOM,
            FontResource::Bold,
        ),
        BlockKind::Paragraph => (
            typography.font_size,
            PARAGRAPH_MARGIN_TOP,
            PARAGRAPH_MARGIN_BOTTOM,
            FontResource::Regular,
        ),
        BlockKind::Rule => (
            typography.font_size,
            RULE_MARGIN,
            RULE_MARGIN,
            FontResource::Regular,
        ),
    };

    let margin_top = clamp_margin(block.margin_top.unwrap_or(top));
    let margin_bottom = clamp_margin(block.margin_bottom.unwrap_or(bottom));

    if block.kind == BlockKind::Rule {
        return LayoutItem {
            text: String::new(),
            kind: BlockKind::Rule,
            font_size: clamp_font_size(size),
            color: Color::DEFAULT_TEXT,
            margin_top,
            margin_bottom,
            font,
        };
    }

    LayoutItem {
        text: block.text.clone(),
        kind: block.kind,
        font_size: clamp_font_size(block.font_size.unwrap_or(size)),
        color: block.color.unwrap_or_default(),
        margin_top,
        margin_bottom,
        font,
    }
}

/// Block margins are never negative, NaN or taller than the largest
/// page.
fn clamp_margin(margin: f64) -> f64 {
    clamp_logged("block margin", margin, 0.0, MAX_PAGE_DIMENSION)
}
