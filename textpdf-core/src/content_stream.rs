use std::collections::BTreeSet;

use log::warn;

use crate::color::Color;
use crate::content::LayoutItem;
use crate::fonts::FontResource;
use crate::layout::{wrap_item, LineItem, Page};
use crate::model::{PageGeometry, Typography};
use crate::writer::{encode_win_ansi, escape_pdf_string, EscapeMode};

/// Gray level used to stroke horizontal rules.
const RULE_GRAY: f64 = 0.6;
const RULE_WIDTH: f64 = 1.0;
const EPSILON: f64 = 1e-6;

/// Result of fitting blocks onto a single-stream page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitResult {
    /// All blocks have been placed.
    Stop,
    /// The page is full but blocks remain.
    BoxFull,
    /// Not even the first block fits.
    BoxEmpty,
}

/// Builder for a page content stream.
#[derive(Debug)]
pub struct ContentStream {
    ops: Vec<u8>,
    escape: EscapeMode,
}

impl ContentStream {
    pub fn new(escape: EscapeMode) -> Self {
        ContentStream {
            ops: Vec::new(),
            escape,
        }
    }

    fn push(&mut self, op: &str) {
        self.ops.extend_from_slice(op.as_bytes());
    }

    pub fn begin_text(&mut self) {
        self.push("BT\n");
    }

    pub fn end_text(&mut self) {
        self.push("ET\n");
    }

    pub fn set_font(&mut self, font: FontResource, size: f64) {
        self.push(&format!(
            "/{} {} Tf\n",
            font.pdf_name(),
            format_coord(size)
        ));
    }

    pub fn set_fill_color(&mut self, color: Color) {
        self.push(&format!("{} rg\n", color.operands()));
    }

    /// `Td`: offset from the start of the current line, or from the
    /// origin for the first move after `BT`.
    pub fn move_text(&mut self, x: f64, y: f64) {
        self.push(&format!(
            "{} {} Td\n",
            format_coord(x),
            format_coord(y)
        ));
    }

    pub fn show_text(&mut self, text: &str) {
        let escaped = escape_pdf_string(text, self.escape);
        self.ops.push(b'(');
        self.ops.extend_from_slice(&encode_win_ansi(&escaped));
        self.push(") Tj\n");
    }

    /// Stroke a gray horizontal line from `x1` to `x2` at `y`,
    /// isolated in its own graphics state.
    pub fn horizontal_rule(&mut self, x1: f64, x2: f64, y: f64) {
        let y = format_coord(y);
        self.push(&format!(
            "q\n{} G\n{} w\n{} {} m\n{} {} l\nS\nQ\n",
            format_coord(RULE_GRAY),
            format_coord(RULE_WIDTH),
            format_coord(x1),
            y,
            format_coord(x2),
            y,
        ));
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.ops
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.ops
    }
}

/// Content stream for one page plus what went into it.
#[derive(Debug)]
pub struct PageContent {
    pub data: Vec<u8>,
    pub fonts_used: BTreeSet<FontResource>,
    /// Indices of the blocks with at least one line on the page.
    pub blocks: BTreeSet<usize>,
    /// Lines were left off because they would cross the bottom
    /// margin.
    pub truncated: bool,
}

/// Emit a paginated page. Lines of one block share a text object:
/// the first line is positioned absolutely, later lines move down
/// by their advance.
pub fn emit_page(
    page: &Page,
    geometry: &PageGeometry,
    escape: EscapeMode,
) -> PageContent {
    let mut cs = ContentStream::new(escape);
    let mut fonts_used = BTreeSet::new();
    let mut blocks = BTreeSet::new();
    let mut truncated = false;

    let left = geometry.margins.left;
    let right = geometry.width - geometry.margins.right;
    let bottom = geometry.margins.bottom;
    let mut cursor = geometry.top();
    let mut open_block: Option<usize> = None;

    for (placed, item) in page.items.iter().enumerate() {
        let advance = item.advance();
        if placed > 0 && cursor - advance < bottom - EPSILON {
            warn!(
                "page content crosses bottom margin, dropping {} lines",
                page.items.len() - placed
            );
            truncated = true;
            break;
        }

        match item {
            LineItem::Text(line) => {
                if open_block == Some(line.block) {
                    cs.move_text(0.0, -line.advance);
                } else {
                    if open_block.is_some() {
                        cs.end_text();
                    }
                    cs.begin_text();
                    cs.set_font(line.font, line.font_size);
                    cs.set_fill_color(line.color);
                    cs.move_text(left, cursor - line.font_size);
                    fonts_used.insert(line.font);
                    open_block = Some(line.block);
                }
                cs.show_text(&line.text);
                blocks.insert(line.block);
            }
            LineItem::Blank { .. } => {
                if open_block.take().is_some() {
                    cs.end_text();
                }
            }
            LineItem::Rule {
                margin_top, block, ..
            } => {
                if open_block.take().is_some() {
                    cs.end_text();
                }
                cs.horizontal_rule(left, right, cursor - margin_top);
                blocks.insert(*block);
            }
        }
        cursor -= advance;
    }

    if open_block.is_some() {
        cs.end_text();
    }

    PageContent {
        data: cs.into_bytes(),
        fonts_used,
        blocks,
        truncated,
    }
}

/// Content of a single-stream document.
#[derive(Debug)]
pub struct SingleStreamContent {
    pub data: Vec<u8>,
    pub fonts_used: BTreeSet<FontResource>,
    pub blocks_emitted: usize,
    pub fit: FitResult,
}

/// Emit every item onto one page, each block positioned
/// absolutely below the previous one. Emission stops at the first
/// block that would cross the bottom margin; later blocks are
/// dropped, not moved to a new page.
pub fn emit_single_stream(
    items: &[LayoutItem],
    geometry: &PageGeometry,
    typography: &Typography,
    escape: EscapeMode,
) -> SingleStreamContent {
    let mut cs = ContentStream::new(escape);
    let mut fonts_used = BTreeSet::new();
    let mut blocks_emitted = 0;
    let mut fit = FitResult::Stop;

    let left = geometry.margins.left;
    let right = geometry.width - geometry.margins.right;
    let bottom = geometry.margins.bottom;
    let mut cursor = geometry.top();

    for (index, item) in items.iter().enumerate() {
        if item.is_rule() {
            let y = cursor - item.margin_top;
            if y < bottom - EPSILON {
                fit = overflow(index, items.len());
                break;
            }
            cs.horizontal_rule(left, right, y);
            cursor = y - item.margin_bottom;
            blocks_emitted += 1;
            continue;
        }

        let lines = wrap_item(item, index, geometry, typography);
        if lines.is_empty() {
            blocks_emitted += 1;
            continue;
        }

        let pitch = item.font_size * typography.line_height;
        let text_height = pitch * lines.len() as f64;
        if cursor - item.margin_top - text_height < bottom - EPSILON {
            fit = overflow(index, items.len());
            break;
        }

        cs.begin_text();
        cs.set_font(item.font, item.font_size);
        cs.set_fill_color(item.color);
        cs.move_text(left, cursor - item.margin_top - item.font_size);
        for (i, line) in lines.iter().enumerate() {
            if i > 0 {
                cs.move_text(0.0, -pitch);
            }
            cs.show_text(&line.text);
        }
        cs.end_text();
        fonts_used.insert(item.font);

        cursor -= item.margin_top + text_height + item.margin_bottom;
        blocks_emitted += 1;
    }

    SingleStreamContent {
        data: cs.into_bytes(),
        fonts_used,
        blocks_emitted,
        fit,
    }
}

fn overflow(index: usize, total: usize) -> FitResult {
    warn!(
        "content exceeds page height, truncating {} of {} blocks",
        total - index,
        total
    );
    if index == 0 {
        FitResult::BoxEmpty
    } else {
        FitResult::BoxFull
    }
}

/// Format a coordinate value for PDF content streams.
pub(crate) fn format_coord(v: f64) -> String {
    if v == v.floor() && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        let s = format!("{:.4}", v);
        let s = s.trim_end_matches('0');
        let s = s.trim_end_matches('.');
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_coord_values() {
        assert_eq!(format_coord(72.0), "72");
        assert_eq!(format_coord(-16.8), "-16.8");
        assert_eq!(format_coord(0.6), "0.6");
        assert_eq!(format_coord(1.0 / 3.0), "0.3333");
    }

    #[test]
    fn text_operators() {
        let mut cs = ContentStream::new(EscapeMode::Preserve);
        cs.begin_text();
        cs.set_font(FontResource::Bold, 18.0);
        cs.set_fill_color(Color::from_hex("#f00").unwrap());
        cs.move_text(72.0, 702.0);
        cs.show_text("Hi (there)");
        cs.end_text();
        assert_eq!(
            String::from_utf8_lossy(cs.as_bytes()),
            "BT\n/F2 18 Tf\n1.000 0.000 0.000 rg\n72 702 Td\n\
             (Hi \\(there\\)) Tj\nET\n"
        );
    }

    #[test]
    fn rule_operators() {
        let mut cs = ContentStream::new(EscapeMode::Collapse);
        cs.horizontal_rule(72.0, 540.0, 700.5);
        assert_eq!(
            String::from_utf8_lossy(cs.as_bytes()),
            "q\n0.6 G\n1 w\n72 700.5 m\n540 700.5 l\nS\nQ\n"
        );
    }

    #[test]
    fn show_text_respects_escape_mode() {
        let mut preserve = ContentStream::new(EscapeMode::Preserve);
        preserve.show_text("a\nb");
        assert_eq!(preserve.as_bytes(), b"(a\\nb) Tj\n");

        let mut collapse = ContentStream::new(EscapeMode::Collapse);
        collapse.show_text("a\nb");
        assert_eq!(collapse.as_bytes(), b"(a b) Tj\n");
    }

    #[test]
    fn show_text_encodes_win_ansi() {
        let mut cs = ContentStream::new(EscapeMode::Preserve);
        cs.show_text("caf\u{e9}");
        assert_eq!(cs.as_bytes(), b"(caf\xe9) Tj\n");
    }
}
