//! Thousands separators for long digit runs in running text.
//!
//! Which runs count as "numbers" is a heuristic, so every rule is
//! a switch on [`GroupingPolicy`]. Nothing in the rendering
//! pipeline calls this; callers opt in.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    static ref RE_DIGITS: Regex = Regex::new(r"[0-9]+").unwrap();
    static ref RE_DATE: Regex =
        Regex::new(r"^\(?[0-9]{1,4}[/.\-][0-9]{1,2}[/.\-][0-9]{1,4}\)?$").unwrap();
    static ref RE_PHONE: Regex =
        Regex::new(r"^\+?[0-9()\-.]*[0-9][0-9()\-.]*$").unwrap();
    /// A country code or a short area/exchange group of a spaced
    /// phone number.
    static ref RE_PHONE_GROUP: Regex =
        Regex::new(r"^(?:\+[0-9]{1,3}|\(?[0-9]{2,3}\)?)$").unwrap();
}

const SENTENCE_PUNCTUATION: [char; 6] = ['.', ',', ';', ':', '!', '?'];

/// Rules for [`group_digits`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupingPolicy {
    pub separator: char,
    /// Runs shorter than this are left alone.
    pub min_digits: usize,
    /// Leave four-digit runs between 1000 and 2999 alone.
    pub skip_years: bool,
    /// Leave tokens shaped like phone numbers alone: a leading
    /// `+`, digits joined by `-`, `(` or `)`, or a run written
    /// next to a short digit group as in `415 555 26710`.
    pub skip_phone_numbers: bool,
    /// Leave `dd/mm/yyyy`, `yyyy-mm-dd` and similar alone.
    pub skip_dates: bool,
}

impl Default for GroupingPolicy {
    fn default() -> Self {
        GroupingPolicy {
            separator: ',',
            min_digits: 5,
            skip_years: true,
            skip_phone_numbers: true,
            skip_dates: true,
        }
    }
}

/// Insert separators into digit runs that the policy treats as
/// plain numbers.
pub fn group_digits(text: &str, policy: &GroupingPolicy) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 4);
    let mut last = 0;
    for m in RE_DIGITS.find_iter(text) {
        out.push_str(&text[last..m.start()]);
        if should_group(text, m.start(), m.end(), policy) {
            out.push_str(&insert_separators(m.as_str(), policy.separator));
        } else {
            out.push_str(m.as_str());
        }
        last = m.end();
    }
    out.push_str(&text[last..]);
    out
}

fn should_group(
    text: &str,
    start: usize,
    end: usize,
    policy: &GroupingPolicy,
) -> bool {
    let run = &text[start..end];
    if run.len() < policy.min_digits.max(2) {
        return false;
    }
    // Zero-padded codes and identifiers.
    if run.starts_with('0') {
        return false;
    }
    if policy.skip_years && run.len() == 4 && matches!(run.as_bytes()[0], b'1' | b'2') {
        return false;
    }

    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    if before.is_some_and(|c| c.is_alphabetic() || c == '_')
        || after.is_some_and(|c| c.is_alphabetic() || c == '_')
    {
        return false;
    }
    // Fractional part of a decimal.
    if before == Some('.') || before == Some(',') {
        let prior = text[..start - 1].chars().next_back();
        if prior.is_some_and(|c| c.is_ascii_digit()) {
            return false;
        }
    }

    let (token_start, token_end) = token_bounds(text, start, end);
    let token = text[token_start..token_end]
        .trim_end_matches(SENTENCE_PUNCTUATION);
    if policy.skip_dates && RE_DATE.is_match(token) {
        return false;
    }
    if policy.skip_phone_numbers && RE_PHONE.is_match(token) {
        if token.starts_with('+') || token.contains(['-', '(', ')']) {
            return false;
        }
        let previous = previous_token(text, token_start);
        let next = next_token(text, token_end);
        if RE_PHONE_GROUP.is_match(previous) || RE_PHONE_GROUP.is_match(next) {
            return false;
        }
    }
    true
}

/// Byte range of the whitespace-delimited token around `start..end`.
fn token_bounds(text: &str, start: usize, end: usize) -> (usize, usize) {
    let token_start = text[..start]
        .rfind(char::is_whitespace)
        .map_or(0, |i| i + text[i..].chars().next().map_or(1, char::len_utf8));
    let token_end = text[end..]
        .find(char::is_whitespace)
        .map_or(text.len(), |i| end + i);
    (token_start, token_end)
}

/// The token before the whitespace ending at `token_start`. Trailing
/// punctuation is kept, so `555, 12345` is not a phone number.
fn previous_token(text: &str, token_start: usize) -> &str {
    let head = text[..token_start].trim_end();
    let start = head
        .rfind(char::is_whitespace)
        .map_or(0, |i| i + head[i..].chars().next().map_or(1, char::len_utf8));
    &head[start..]
}

fn next_token(text: &str, token_end: usize) -> &str {
    let tail = text[token_end..].trim_start();
    let end = tail.find(char::is_whitespace).unwrap_or(tail.len());
    tail[..end].trim_end_matches(SENTENCE_PUNCTUATION)
}

fn insert_separators(digits: &str, separator: char) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(separator);
        }
        out.push(c);
    }
    out
}
