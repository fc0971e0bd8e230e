//! Structural checks on generated PDF bytes.

use crate::error::{Error, Result};

/// Length of one cross-reference entry, end-of-line included.
const XREF_ENTRY_LEN: usize = 20;

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|w| w == needle)
}

fn rfind(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .rposition(|w| w == needle)
}

/// True if a `/Type /Page` entry (not `/Type /Pages`) exists.
fn has_page_type(bytes: &[u8]) -> bool {
    let needle = b"/Type /Page";
    bytes
        .windows(needle.len() + 1)
        .any(|w| &w[..needle.len()] == needle && w[needle.len()] != b's')
}

/// Quick sanity check: header and `%%EOF` markers, the Catalog,
/// Pages and Page types, and `xref`, `trailer`, `startxref` in
/// that order.
pub fn is_well_formed(bytes: &[u8]) -> bool {
    if !bytes.starts_with(b"%PDF-") {
        return false;
    }
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(0, |i| i + 1);
    if !bytes[..end].ends_with(b"%%EOF") {
        return false;
    }
    if find(bytes, b"/Type /Catalog").is_none()
        || find(bytes, b"/Type /Pages").is_none()
        || !has_page_type(bytes)
    {
        return false;
    }
    let xref = find(bytes, b"\nxref");
    let trailer = rfind(bytes, b"trailer");
    let startxref = rfind(bytes, b"startxref");
    match (xref, trailer, startxref) {
        (Some(x), Some(t), Some(s)) => x < t && t < s,
        _ => false,
    }
}

/// Parse a run of ASCII digits starting at `pos`, returning the
/// value and the position after it.
fn parse_number(bytes: &[u8], pos: usize) -> Option<(usize, usize)> {
    let digits = bytes[pos..]
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .count();
    if digits == 0 {
        return None;
    }
    let text = std::str::from_utf8(&bytes[pos..pos + digits]).ok()?;
    Some((text.parse().ok()?, pos + digits))
}

fn skip_whitespace(bytes: &[u8], pos: usize) -> usize {
    pos + bytes[pos..]
        .iter()
        .take_while(|b| b.is_ascii_whitespace())
        .count()
}

fn malformed(msg: impl Into<String>) -> Error {
    Error::Malformed(msg.into())
}

/// Check the cross-reference table against the file: `startxref`
/// must point at the `xref` keyword and every in-use entry must
/// point at its `N 0 obj` token. Returns the number of in-use
/// entries checked.
pub fn verify_xref(bytes: &[u8]) -> Result<usize> {
    let startxref = rfind(bytes, b"startxref")
        .ok_or_else(|| malformed("missing startxref"))?;
    let pos = skip_whitespace(bytes, startxref + b"startxref".len());
    let (xref_offset, _) = parse_number(bytes, pos)
        .ok_or_else(|| malformed("startxref has no offset"))?;

    if !bytes
        .get(xref_offset..)
        .is_some_and(|rest| rest.starts_with(b"xref"))
    {
        return Err(malformed(format!(
            "startxref offset {} does not point at xref",
            xref_offset
        )));
    }

    let pos = skip_whitespace(bytes, xref_offset + b"xref".len());
    let (first, pos) = parse_number(bytes, pos)
        .ok_or_else(|| malformed("xref subsection has no start"))?;
    let pos = skip_whitespace(bytes, pos);
    let (count, pos) = parse_number(bytes, pos)
        .ok_or_else(|| malformed("xref subsection has no count"))?;
    if first != 0 {
        return Err(malformed("xref subsection does not start at 0"));
    }
    let table_start = skip_whitespace(bytes, pos);

    let mut in_use = 0;
    for obj_num in 0..count {
        let start = table_start + obj_num * XREF_ENTRY_LEN;
        let entry = bytes
            .get(start..start + XREF_ENTRY_LEN)
            .ok_or_else(|| malformed("xref table is truncated"))?;
        let kind = entry[17];
        match (obj_num, kind) {
            (0, b'f') => continue,
            (0, _) => {
                return Err(malformed("xref entry 0 is not free"));
            }
            (_, b'f') => continue,
            (_, b'n') => {}
            _ => {
                return Err(malformed(format!(
                    "xref entry {} has bad type",
                    obj_num
                )));
            }
        }
        let (offset, _) = parse_number(entry, 0).ok_or_else(|| {
            malformed(format!("xref entry {} has no offset", obj_num))
        })?;
        let token = format!("{} 0 obj", obj_num);
        if !bytes
            .get(offset..)
            .is_some_and(|rest| rest.starts_with(token.as_bytes()))
        {
            return Err(malformed(format!(
                "xref offset {} for object {} does not point at '{}'",
                offset, obj_num, token
            )));
        }
        in_use += 1;
    }
    Ok(in_use)
}
