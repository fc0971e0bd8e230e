//! Extraction of layout blocks from plain text.

use crate::error::{Error, Result};
use crate::model::LayoutBlock;

/// Longest single line treated as a title.
const MAX_TITLE_CHARS: usize = 80;

/// Split text into paragraphs on blank lines. Lines within a
/// paragraph are joined with spaces. A paragraph made only of
/// three or more `-`, `*` or `_` becomes a rule.
///
/// With `detect_title`, a first paragraph that is one short line
/// becomes a heading.
pub fn text_to_blocks(text: &str, detect_title: bool) -> Result<Vec<LayoutBlock>> {
    if text.trim().is_empty() {
        return Err(Error::InvalidInput("text is empty".into()));
    }

    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    let mut paragraphs: Vec<Vec<&str>> = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in normalized.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                paragraphs.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line.trim());
        }
    }
    if !current.is_empty() {
        paragraphs.push(current);
    }

    let blocks = paragraphs
        .iter()
        .enumerate()
        .map(|(i, lines)| {
            let joined = lines.join(" ");
            if is_rule_line(&joined) {
                LayoutBlock::rule()
            } else if detect_title
                && i == 0
                && lines.len() == 1
                && joined.chars().count() <= MAX_TITLE_CHARS
            {
                LayoutBlock::heading(joined)
            } else {
                LayoutBlock::paragraph(joined)
            }
        })
        .collect();
    Ok(blocks)
}

fn is_rule_line(line: &str) -> bool {
    let compact: String = line.chars().filter(|c| !c.is_whitespace()).collect();
    compact.len() >= 3
        && ["-", "*", "_"]
            .iter()
            .any(|m| compact.chars().all(|c| m.starts_with(c)))
}
