//! Turning markup and plain text into layout blocks.
//!
//! Extractors sit outside the PDF engine: they only produce
//! [`LayoutBlock`](crate::model::LayoutBlock) values.

mod html;
mod text;

pub use html::html_to_blocks;
pub use text::text_to_blocks;
