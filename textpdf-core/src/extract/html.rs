//! Extraction of layout blocks from a restricted HTML subset.
//!
//! Supported: `h1`–`h6`, `p`, `li`, `blockquote`, `pre`, `hr`, and
//! text directly inside containers such as `div` or `body`. Every
//! block-level tag ends the text collected so far, so sibling
//! containers and paragraphs nested in a `blockquote` stay separate.
//! `<p>` and `<li>` may omit their close tags. Each non-empty line of
//! a `pre` element becomes its own paragraph. Table cells in a row
//! are joined with spaces.
//!
//! Inline `style` attributes may set `color`, `font-size`,
//! `margin-top`, `margin-bottom` and the `margin` shorthand. Color
//! and font size are inherited, margins come from the nearest block.
//! Elements hidden with `display: none`, `visibility: hidden` or the
//! `hidden` attribute are dropped with their content.

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;

use crate::color::Color;
use crate::error::{Error, Result};
use crate::model::{BlockKind, LayoutBlock};

lazy_static! {
    static ref RE_COMMENT: Regex = Regex::new(r"(?s)<!--.*?-->").unwrap();
    static ref RE_DECLARATION: Regex = Regex::new(r"(?s)<[!?][^>]*>").unwrap();
    static ref RE_RAW_ELEMENT: Regex =
        Regex::new(r"(?is)<(?:script|style|head|title)\b.*?</(?:script|style|head|title)\s*>").unwrap();
    static ref RE_TAG: Regex =
        Regex::new(r"<(/?)([a-zA-Z][a-zA-Z0-9]*)\b([^>]*)>").unwrap();
    static ref RE_STYLE_ATTR: Regex =
        Regex::new(r#"(?i)\bstyle\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap();
    static ref RE_QUOTED_VALUE: Regex =
        Regex::new(r#""[^"]*"|'[^']*'"#).unwrap();
    static ref RE_HIDDEN_ATTR: Regex =
        Regex::new(r"(?i)(?:^|\s)hidden(?:\s*=|\s|/|$)").unwrap();
    static ref RE_ENTITY: Regex =
        Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z]+);").unwrap();
    static ref RE_LENGTH: Regex =
        Regex::new(r"(?i)^(-?[0-9]*\.?[0-9]+)\s*(px|pt|em|rem)?$").unwrap();
}

/// Points per CSS pixel.
const PX_TO_PT: f64 = 0.75;
/// Points per `em`, relative to the default body size.
const EM_TO_PT: f64 = 12.0;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link",
    "meta", "source", "track", "wbr",
];

/// Elements whose open and close tags end the current block of text.
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "caption", "dd",
    "div", "dl", "dt", "fieldset", "figcaption", "figure", "footer",
    "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "html",
    "li", "main", "nav", "ol", "p", "pre", "section", "table", "tbody",
    "tfoot", "thead", "tr", "ul",
];

/// Elements that separate words without ending a block.
const SPACED_ELEMENTS: &[&str] = &["td", "th"];

fn is_block(name: &str) -> bool {
    BLOCK_ELEMENTS.contains(&name)
}

/// Style values found in an inline `style` attribute.
#[derive(Debug, Default, Clone, PartialEq)]
struct InlineStyle {
    hidden: bool,
    color: Option<Color>,
    font_size: Option<f64>,
    margin_top: Option<f64>,
    margin_bottom: Option<f64>,
}

impl InlineStyle {
    fn apply(&self, mut block: LayoutBlock) -> LayoutBlock {
        if block.kind != BlockKind::Rule {
            block.color = self.color.or(block.color);
            block.font_size = self.font_size.or(block.font_size);
        }
        block.margin_top = self.margin_top.or(block.margin_top);
        block.margin_bottom = self.margin_bottom.or(block.margin_bottom);
        block
    }
}

/// Extract blocks from markup, in document order.
pub fn html_to_blocks(html: &str) -> Result<Vec<LayoutBlock>> {
    if html.trim().is_empty() {
        return Err(Error::InvalidInput("markup is empty".into()));
    }

    let cleaned = RE_COMMENT.replace_all(html, "");
    let cleaned = RE_DECLARATION.replace_all(&cleaned, "");
    let cleaned = RE_RAW_ELEMENT.replace_all(&cleaned, "");

    let mut walker = BlockWalker::default();
    let mut pos = 0;
    for caps in RE_TAG.captures_iter(&cleaned) {
        let Some(whole) = caps.get(0) else { continue };
        walker.push_text(&cleaned[pos..whole.start()]);
        pos = whole.end();

        let name = caps[2].to_ascii_lowercase();
        let attrs = caps.get(3).map_or("", |m| m.as_str());
        if caps[1].is_empty() {
            walker.open(&name, attrs);
        } else {
            walker.close(&name);
        }
    }
    walker.push_text(&cleaned[pos..]);
    let blocks = walker.finish();

    if blocks.iter().all(|b| b.kind == BlockKind::Rule) {
        return Err(Error::InvalidInput(
            "markup contains no text".into(),
        ));
    }
    debug!("extracted {} blocks from markup", blocks.len());
    Ok(blocks)
}

#[derive(Debug)]
struct OpenElement {
    name: String,
    style: InlineStyle,
    hidden: bool,
}

/// Walks tags in order, collecting text until a block boundary.
#[derive(Debug, Default)]
struct BlockWalker {
    stack: Vec<OpenElement>,
    pending: String,
    blocks: Vec<LayoutBlock>,
}

impl BlockWalker {
    fn hidden(&self) -> bool {
        self.stack.last().is_some_and(|e| e.hidden)
    }

    fn in_pre(&self) -> bool {
        self.stack.iter().any(|e| e.name == "pre")
    }

    fn push_text(&mut self, raw: &str) {
        if !self.hidden() {
            self.pending.push_str(raw);
        }
    }

    fn open(&mut self, name: &str, attrs: &str) {
        if name == "br" {
            let sep = if self.in_pre() { "\n" } else { " " };
            self.push_text(sep);
            return;
        }
        if SPACED_ELEMENTS.contains(&name) {
            self.push_text(" ");
        }
        if is_block(name) {
            self.flush();
            self.close_implied(name);
        }

        let style = parse_style(attrs);
        let hidden = self.hidden() || style.hidden || has_hidden_attr(attrs);
        if hidden && !self.hidden() {
            debug!("dropped hidden <{}> element", name);
        }

        if name == "hr" {
            if !hidden {
                self.blocks.push(style.apply(LayoutBlock::rule()));
            }
            return;
        }
        if VOID_ELEMENTS.contains(&name) || attrs.trim_end().ends_with('/') {
            return;
        }
        self.stack.push(OpenElement {
            name: name.to_string(),
            style,
            hidden,
        });
    }

    /// `<p>` ends at any block element and `<li>` at the next list
    /// item when their close tags are omitted.
    fn close_implied(&mut self, name: &str) {
        while self.stack.last().is_some_and(|e| e.name == "p") {
            self.stack.pop();
        }
        if name == "li" && self.stack.last().is_some_and(|e| e.name == "li") {
            self.stack.pop();
        }
    }

    fn close(&mut self, name: &str) {
        if SPACED_ELEMENTS.contains(&name) {
            self.push_text(" ");
        }
        if is_block(name) {
            self.flush();
        }
        if let Some(at) = self.stack.iter().rposition(|e| e.name == name) {
            self.stack.truncate(at);
        }
    }

    /// Turn the collected text into blocks of the innermost block
    /// element.
    fn flush(&mut self) {
        let raw = std::mem::take(&mut self.pending);
        if raw.trim().is_empty() {
            return;
        }

        let block = self
            .stack
            .iter()
            .rev()
            .find(|e| is_block(&e.name));
        let tag = block.map_or("p", |e| e.name.as_str());

        let mut style = InlineStyle::default();
        for element in &self.stack {
            style.color = element.style.color.or(style.color);
            style.font_size = element.style.font_size.or(style.font_size);
        }
        if let Some(element) = block {
            style.margin_top = element.style.margin_top;
            style.margin_bottom = element.style.margin_bottom;
        }

        let texts: Vec<String> = if tag == "pre" {
            raw.lines().map(visible_text).collect()
        } else {
            vec![visible_text(&raw)]
        };
        for text in texts.into_iter().filter(|t| !t.is_empty()) {
            self.blocks.push(style.apply(text_block(tag, text)));
        }
    }

    fn finish(mut self) -> Vec<LayoutBlock> {
        self.flush();
        self.blocks
    }
}

fn text_block(tag: &str, text: String) -> LayoutBlock {
    match tag {
        "h1" => LayoutBlock::heading(text).with_font_size(24.0),
        "h2" => LayoutBlock::heading(text).with_font_size(20.0),
        "h3" => LayoutBlock::heading(text).with_font_size(18.0),
        "h4" => LayoutBlock::heading(text).with_font_size(16.0),
        "h5" => LayoutBlock::heading(text).with_font_size(14.0),
        "h6" => LayoutBlock::heading(text).with_font_size(12.0),
        "li" => LayoutBlock::paragraph(format!("\u{2022} {}", text)),
        _ => LayoutBlock::paragraph(text),
    }
}

/// Entities decoded, whitespace collapsed.
fn visible_text(raw: &str) -> String {
    decode_entities(raw)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn decode_entities(text: &str) -> String {
    RE_ENTITY
        .replace_all(text, |caps: &regex::Captures| {
            let entity = &caps[1];
            let decoded = if let Some(hex) = entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = entity.strip_prefix('#') {
                dec.parse().ok().and_then(char::from_u32)
            } else {
                named_entity(entity)
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}

fn named_entity(name: &str) -> Option<char> {
    Some(match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => ' ',
        "copy" => '\u{a9}',
        "reg" => '\u{ae}',
        "trade" => '\u{2122}',
        "hellip" => '\u{2026}',
        "mdash" => '\u{2014}',
        "ndash" => '\u{2013}',
        "lsquo" => '\u{2018}',
        "rsquo" => '\u{2019}',
        "ldquo" => '\u{201c}',
        "rdquo" => '\u{201d}',
        "bull" => '\u{2022}',
        "euro" => '\u{20ac}',
        _ => return None,
    })
}

/// The boolean `hidden` attribute, ignoring text inside quoted
/// values such as `class="a hidden b"`.
fn has_hidden_attr(attrs: &str) -> bool {
    RE_HIDDEN_ATTR.is_match(&RE_QUOTED_VALUE.replace_all(attrs, "\"\""))
}

fn parse_style(attrs: &str) -> InlineStyle {
    let mut style = InlineStyle::default();
    let Some(caps) = RE_STYLE_ATTR.captures(attrs) else {
        return style;
    };
    let decls = caps
        .get(1)
        .or_else(|| caps.get(2))
        .map_or("", |m| m.as_str());

    for decl in decls.split(';') {
        let Some((prop, value)) = decl.split_once(':') else {
            continue;
        };
        let prop = prop.trim().to_ascii_lowercase();
        let value = value
            .trim()
            .trim_end_matches("!important")
            .trim();
        match prop.as_str() {
            "display" => {
                style.hidden |= value.eq_ignore_ascii_case("none")
            }
            "visibility" => {
                style.hidden |= value.eq_ignore_ascii_case("hidden")
            }
            "color" => style.color = Color::from_css(value),
            "font-size" => style.font_size = parse_length(value),
            "margin-top" => style.margin_top = parse_length(value),
            "margin-bottom" => {
                style.margin_bottom = parse_length(value)
            }
            "margin" => {
                let parts: Vec<Option<f64>> =
                    value.split_whitespace().map(parse_length).collect();
                let (top, bottom) = match parts.as_slice() {
                    [all] => (*all, *all),
                    [vertical, _] => (*vertical, *vertical),
                    [top, _, bottom] | [top, _, bottom, _] => {
                        (*top, *bottom)
                    }
                    _ => (None, None),
                };
                style.margin_top = top.or(style.margin_top);
                style.margin_bottom = bottom.or(style.margin_bottom);
            }
            _ => {}
        }
    }
    style
}

/// CSS length in points. Bare numbers are pixels.
fn parse_length(value: &str) -> Option<f64> {
    let caps = RE_LENGTH.captures(value.trim())?;
    let number: f64 = caps[1].parse().ok()?;
    let unit = caps.get(2).map(|m| m.as_str().to_ascii_lowercase());
    Some(match unit.as_deref() {
        Some("pt") => number,
        Some("em") | Some("rem") => number * EM_TO_PT,
        _ => number * PX_TO_PT,
    })
}
