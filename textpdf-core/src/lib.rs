//! # textpdf
//!
//! Converts plain text or a small HTML subset into PDF bytes using
//! only the standard Helvetica fonts.
//!
//! ```no_run
//! use textpdf_core::{render, DocumentMeta, LayoutBlock, PageGeometry, Typography};
//!
//! fn main() -> textpdf_core::Result<()> {
//!     let blocks = vec![
//!         LayoutBlock::heading("Hello"),
//!         LayoutBlock::paragraph("A paragraph of body text."),
//!     ];
//!     let output = render(
//!         &blocks,
//!         &PageGeometry::letter(),
//!         &Typography::default(),
//!         &DocumentMeta::new("Greeting"),
//!     )?;
//!     output.save("hello.pdf")?;
//!     Ok(())
//! }
//! ```

pub mod color;
pub mod content;
pub mod content_stream;
pub mod document;
pub mod error;
pub mod extract;
pub mod fonts;
pub mod layout;
pub mod model;
pub mod numfmt;
pub mod objects;
pub mod options;
pub mod render;
pub mod validate;
pub mod writer;

pub use color::Color;
pub use content_stream::FitResult;
pub use error::{Error, Result};
pub use extract::{html_to_blocks, text_to_blocks};
pub use model::{BlockKind, DocumentMeta, LayoutBlock, Margins, PageGeometry, Typography};
pub use numfmt::{group_digits, GroupingPolicy};
pub use options::{RenderMode, RenderOptions};
pub use render::{render, render_single_stream, RenderOutput, Renderer};
pub use validate::{is_well_formed, verify_xref};
pub use writer::{EscapeMode, PdfVersion};
