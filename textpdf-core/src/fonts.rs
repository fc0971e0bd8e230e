use crate::objects::PdfObject;

/// Average glyph width of Helvetica as a fraction of the font
/// size. Line wrapping uses this single factor instead of
/// per-glyph metrics, so it is an approximation: text heavy in
/// wide glyphs (`W`, `M`) can run past the right margin and text
/// heavy in narrow glyphs wraps early.
pub const AVERAGE_CHAR_WIDTH_FACTOR: f64 = 0.6;

/// The two standard Type1 fonts used by generated documents.
/// Neither is embedded: every PDF viewer ships them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FontResource {
    /// Helvetica, for body text.
    Regular,
    /// Helvetica-Bold, for headings.
    Bold,
}

impl FontResource {
    /// Returns the resource name used in content streams
    /// (e.g. "F1").
    pub fn pdf_name(&self) -> &'static str {
        match self {
            FontResource::Regular => "F1",
            FontResource::Bold => "F2",
        }
    }

    /// Returns the PDF BaseFont name.
    pub fn pdf_base_name(&self) -> &'static str {
        match self {
            FontResource::Regular => "Helvetica",
            FontResource::Bold => "Helvetica-Bold",
        }
    }

    /// The font dictionary written for this resource.
    pub fn to_pdf_object(&self) -> PdfObject {
        PdfObject::dict(vec![
            ("Type", PdfObject::name("Font")),
            ("Subtype", PdfObject::name("Type1")),
            ("BaseFont", PdfObject::name(self.pdf_base_name())),
            ("Encoding", PdfObject::name("WinAnsiEncoding")),
        ])
    }
}
