use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use crate::objects::{ObjId, PdfObject};

/// PDF version written in the file header.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
pub enum PdfVersion {
    #[serde(rename = "1.3")]
    V1_3,
    #[default]
    #[serde(rename = "1.4")]
    V1_4,
    #[serde(rename = "1.5")]
    V1_5,
    #[serde(rename = "1.6")]
    V1_6,
    #[serde(rename = "1.7")]
    V1_7,
}

impl PdfVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            PdfVersion::V1_3 => "1.3",
            PdfVersion::V1_4 => "1.4",
            PdfVersion::V1_5 => "1.5",
            PdfVersion::V1_6 => "1.6",
            PdfVersion::V1_7 => "1.7",
        }
    }
}

impl fmt::Display for PdfVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How CR, LF and Tab are written inside literal strings.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum EscapeMode {
    /// Keep them as `\r`, `\n`, `\t` escape sequences.
    Preserve,
    /// Replace each one with a single space.
    Collapse,
}

/// Low-level PDF binary writer. Serializes PDF objects to any
/// `Write` target while tracking byte offsets for the xref table.
pub struct PdfWriter<W: Write> {
    writer: W,
    offset: usize,
    xref_entries: Vec<(u32, usize)>,
}

impl<W: Write> PdfWriter<W> {
    pub fn new(writer: W) -> Self {
        PdfWriter {
            writer,
            offset: 0,
            xref_entries: Vec::new(),
        }
    }

    /// Write raw bytes, tracking the byte offset.
    fn write_bytes(&mut self, data: &[u8]) -> io::Result<()> {
        self.writer.write_all(data)?;
        self.offset += data.len();
        Ok(())
    }

    fn write_str(&mut self, s: &str) -> io::Result<()> {
        self.write_bytes(s.as_bytes())
    }

    /// Write the `%PDF-x.y` header and binary comment.
    pub fn write_header(
        &mut self,
        version: PdfVersion,
    ) -> io::Result<()> {
        self.write_str(&format!("%PDF-{}\n", version))?;
        // Binary comment: 4 bytes >= 128 for binary detection.
        self.write_bytes(b"%\xe2\xe3\xcf\xd3\n")?;
        Ok(())
    }

    /// Write an indirect object, recording its byte offset for xref.
    pub fn write_object(
        &mut self,
        id: ObjId,
        obj: &PdfObject,
    ) -> io::Result<()> {
        self.xref_entries.push((id.0, self.offset));
        self.write_str(&format!("{} 0 obj\n", id.0))?;
        self.write_pdf_object(obj)?;
        self.write_str("\nendobj\n")?;
        Ok(())
    }

    fn write_entries(
        &mut self,
        entries: &[(String, PdfObject)],
    ) -> io::Result<()> {
        for (key, val) in entries {
            self.write_str(" /")?;
            self.write_str(key)?;
            self.write_str(" ")?;
            self.write_pdf_object(val)?;
        }
        Ok(())
    }

    /// Serialize a PdfObject to its PDF text representation.
    fn write_pdf_object(
        &mut self,
        obj: &PdfObject,
    ) -> io::Result<()> {
        match obj {
            PdfObject::Integer(n) => {
                self.write_str(&n.to_string())
            }
            PdfObject::Real(f) => {
                self.write_str(&format_real(*f))
            }
            PdfObject::Name(name) => {
                self.write_str("/")?;
                self.write_str(name)
            }
            PdfObject::LiteralString(s) => {
                let escaped =
                    escape_pdf_string(s, EscapeMode::Preserve);
                self.write_str("(")?;
                self.write_bytes(&encode_win_ansi(&escaped))?;
                self.write_str(")")
            }
            PdfObject::Array(items) => {
                self.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.write_str(" ")?;
                    }
                    self.write_pdf_object(item)?;
                }
                self.write_str("]")
            }
            PdfObject::Dictionary(entries) => {
                self.write_str("<<")?;
                self.write_entries(entries)?;
                self.write_str(" >>")
            }
            PdfObject::Stream { dict, data } => {
                self.write_str("<<")?;
                self.write_entries(dict)?;
                self.write_str(" /Length ")?;
                self.write_str(&data.len().to_string())?;
                self.write_str(" >>\nstream\n")?;
                self.write_bytes(data)?;
                self.write_str("\nendstream")
            }
            PdfObject::Reference(id) => {
                self.write_str(&id.to_string())
            }
        }
    }

    /// Write xref table, trailer, startxref, and %%EOF.
    ///
    /// Object numbers must run from 1 without gaps. A missing number
    /// is an `InvalidData` error and nothing past `xref` is written.
    pub fn write_xref_and_trailer(
        &mut self,
        root_id: ObjId,
        info_id: Option<ObjId>,
    ) -> io::Result<()> {
        let xref_offset = self.offset;

        let offsets: BTreeMap<u32, usize> =
            self.xref_entries.iter().copied().collect();
        let max_obj =
            offsets.keys().next_back().copied().unwrap_or(0);
        let size = max_obj + 1;

        self.write_str("xref\n")?;
        self.write_str(&format!("0 {}\n", size))?;

        // Object 0: free list head (exactly 20 bytes).
        self.write_bytes(b"0000000000 65535 f \n")?;

        for obj_num in 1..size {
            let off = offsets.get(&obj_num).ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("object {} was never written", obj_num),
                )
            })?;
            let entry = format!("{:010} 00000 n \n", off);
            self.write_bytes(entry.as_bytes())?;
        }

        self.write_str("trailer\n")?;
        self.write_str(&format!(
            "<< /Size {} /Root {}",
            size, root_id,
        ))?;
        if let Some(info) = info_id {
            self.write_str(&format!(" /Info {}", info))?;
        }
        self.write_str(" >>\n")?;

        self.write_str("startxref\n")?;
        self.write_str(&format!("{}\n", xref_offset))?;
        self.write_str("%%EOF\n")?;

        Ok(())
    }

    /// Object numbers and the offsets recorded for them, in
    /// write order.
    pub fn xref_entries(&self) -> &[(u32, usize)] {
        &self.xref_entries
    }

    /// Return the inner writer, consuming this PdfWriter.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Escape special characters in a PDF literal string.
///
/// Backslash and parentheses are always escaped. CR, LF and Tab
/// are handled according to `mode`.
pub fn escape_pdf_string(s: &str, mode: EscapeMode) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match (c, mode) {
            ('\\', _) => result.push_str("\\\\"),
            ('(', _) => result.push_str("\\("),
            (')', _) => result.push_str("\\)"),
            ('\r', EscapeMode::Preserve) => result.push_str("\\r"),
            ('\n', EscapeMode::Preserve) => result.push_str("\\n"),
            ('\t', EscapeMode::Preserve) => result.push_str("\\t"),
            ('\r' | '\n' | '\t', EscapeMode::Collapse) => {
                result.push(' ')
            }
            _ => result.push(c),
        }
    }
    result
}

/// Encode text as WinAnsiEncoding bytes, the encoding declared on
/// the standard fonts. Characters with no WinAnsi code become `?`.
pub fn encode_win_ansi(s: &str) -> Vec<u8> {
    s.chars().map(win_ansi_byte).collect()
}

fn win_ansi_byte(c: char) -> u8 {
    match c as u32 {
        0x00..=0x7f => c as u8,
        0xa0..=0xff => c as u8,
        _ => match c {
            '€' => 0x80,
            '‚' => 0x82,
            'ƒ' => 0x83,
            '„' => 0x84,
            '…' => 0x85,
            '†' => 0x86,
            '‡' => 0x87,
            'ˆ' => 0x88,
            '‰' => 0x89,
            'Š' => 0x8a,
            '‹' => 0x8b,
            'Œ' => 0x8c,
            'Ž' => 0x8e,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '˜' => 0x98,
            '™' => 0x99,
            'š' => 0x9a,
            '›' => 0x9b,
            'œ' => 0x9c,
            'ž' => 0x9e,
            'Ÿ' => 0x9f,
            _ => b'?',
        },
    }
}

/// Format a float for PDF output: no trailing zeros,
/// no scientific notation.
fn format_real(f: f64) -> String {
    if f == f.floor() && f.abs() < 1e15 {
        format!("{:.1}", f)
    } else {
        let s = format!("{:.6}", f);
        let s = s.trim_end_matches('0');
        let s = s.trim_end_matches('.');
        s.to_string()
    }
}
