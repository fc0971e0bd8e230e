//! Line wrapping and page breaking.
//!
//! Widths are estimated from a character count and the average
//! glyph width factor in [`crate::fonts`], not from font metrics.

use log::debug;

use crate::color::Color;
use crate::content::LayoutItem;
use crate::fonts::{FontResource, AVERAGE_CHAR_WIDTH_FACTOR};
use crate::model::{PageGeometry, Typography};

/// Slack for accumulated floating point error when comparing
/// used height against the content area.
const HEIGHT_EPSILON: f64 = 1e-6;

/// Characters that fit between the side margins at `font_size`.
/// Never less than 1.
pub fn max_chars_per_line(content_width: f64, font_size: f64) -> usize {
    let per_char = font_size * AVERAGE_CHAR_WIDTH_FACTOR;
    if per_char <= 0.0 || !content_width.is_finite() {
        return 1;
    }
    let n = (content_width / per_char).floor();
    if n < 1.0 {
        1
    } else {
        n as usize
    }
}

/// Lines of `line_height` points that fit between the top and
/// bottom margins. Never less than 1.
pub fn lines_per_page(geometry: &PageGeometry, line_height: f64) -> usize {
    if line_height <= 0.0 {
        return 1;
    }
    let n = (geometry.content_height() / line_height).floor();
    if n < 1.0 {
        1
    } else {
        n as usize
    }
}

/// Greedily pack whitespace-separated words into lines of at most
/// `max_chars` characters. A word longer than the limit is split
/// at character boundaries. Empty or blank text yields no lines.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if word_len > max_chars {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let chars: Vec<char> = word.chars().collect();
            let mut chunks = chars.chunks(max_chars).peekable();
            while let Some(chunk) = chunks.next() {
                let piece: String = chunk.iter().collect();
                if chunks.peek().is_some() {
                    lines.push(piece);
                } else {
                    // The tail may still share a line with the
                    // next word.
                    current_len = chunk.len();
                    current = piece;
                }
            }
            continue;
        }

        if current.is_empty() {
            current.push_str(word);
            current_len = word_len;
        } else if current_len + 1 + word_len <= max_chars {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + word_len;
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
            current_len = word_len;
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// One wrapped line of text, carrying the style of its block.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub text: String,
    pub font: FontResource,
    pub font_size: f64,
    pub color: Color,
    /// Vertical space the line consumes, in points.
    pub advance: f64,
    /// Index of the source block.
    pub block: usize,
}

/// A unit of vertical layout.
#[derive(Debug, Clone, PartialEq)]
pub enum LineItem {
    Text(TextLine),
    /// Spacer between consecutive text blocks.
    Blank { advance: f64 },
    /// Horizontal line with space above and below it.
    Rule {
        margin_top: f64,
        margin_bottom: f64,
        block: usize,
    },
}

impl LineItem {
    pub fn advance(&self) -> f64 {
        match self {
            LineItem::Text(line) => line.advance,
            LineItem::Blank { advance } => *advance,
            LineItem::Rule {
                margin_top,
                margin_bottom,
                ..
            } => margin_top + margin_bottom,
        }
    }
}

/// Lines assigned to one page, top to bottom.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub items: Vec<LineItem>,
}

impl Page {
    /// Number of text lines on the page (blank spacers and rules
    /// excluded).
    pub fn text_line_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| matches!(item, LineItem::Text(_)))
            .count()
    }
}

/// Wrap one item into text lines using its own font size.
pub fn wrap_item(
    item: &LayoutItem,
    index: usize,
    geometry: &PageGeometry,
    typography: &Typography,
) -> Vec<TextLine> {
    let max_chars =
        max_chars_per_line(geometry.content_width(), item.font_size);
    let advance = item.font_size * typography.line_height;
    wrap_text(&item.text, max_chars)
        .into_iter()
        .map(|text| TextLine {
            text,
            font: item.font,
            font_size: item.font_size,
            color: item.color,
            advance,
            block: index,
        })
        .collect()
}

/// Flatten items into a sequence of lines for paragraph flow.
/// A blank line separates consecutive text blocks; text blocks
/// with no words produce nothing.
pub fn break_lines(
    items: &[LayoutItem],
    geometry: &PageGeometry,
    typography: &Typography,
) -> Vec<LineItem> {
    let mut lines = Vec::new();
    let mut previous_was_text = false;

    for (index, item) in items.iter().enumerate() {
        if item.is_rule() {
            lines.push(LineItem::Rule {
                margin_top: item.margin_top,
                margin_bottom: item.margin_bottom,
                block: index,
            });
            previous_was_text = false;
            continue;
        }

        let wrapped = wrap_item(item, index, geometry, typography);
        if wrapped.is_empty() {
            continue;
        }
        if previous_was_text {
            lines.push(LineItem::Blank {
                advance: typography.line_height_pt(),
            });
        }
        lines.extend(wrapped.into_iter().map(LineItem::Text));
        previous_was_text = true;
    }

    debug!(
        "broke {} blocks into {} lines",
        items.len(),
        lines.len()
    );
    lines
}

/// Split lines into pages by the height of the content area.
///
/// A line that does not fit on an empty page is placed on a page
/// of its own. Blank spacers are dropped at the top of a page.
/// Always returns at least one page.
pub fn paginate(lines: Vec<LineItem>, geometry: &PageGeometry) -> Vec<Page> {
    let available = geometry.content_height();
    let mut pages = Vec::new();
    let mut current = Page::default();
    let mut used = 0.0;

    for line in lines {
        let is_blank = matches!(line, LineItem::Blank { .. });
        if current.items.is_empty() && is_blank {
            continue;
        }
        let advance = line.advance();
        if !current.items.is_empty()
            && used + advance > available + HEIGHT_EPSILON
        {
            pages.push(std::mem::take(&mut current));
            used = 0.0;
            if is_blank {
                continue;
            }
        }
        used += advance;
        current.items.push(line);
    }

    if !current.items.is_empty() || pages.is_empty() {
        pages.push(current);
    }

    debug!("paginated into {} pages", pages.len());
    pages
}
