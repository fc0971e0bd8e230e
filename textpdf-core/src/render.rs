//! Generation entry points.
//!
//! Both layouts run the same pipeline: blocks are resolved into
//! items, laid out into content streams, wired into an object
//! graph, and serialized. Each call owns all of its state.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

use log::{debug, info};

use crate::content::build_items;
use crate::content_stream::{emit_page, emit_single_stream, FitResult};
use crate::document::assemble;
use crate::error::{Error, Result};
use crate::extract;
use crate::layout::{break_lines, paginate};
use crate::model::{DocumentMeta, LayoutBlock, PageGeometry, Typography};
use crate::options::{RenderMode, RenderOptions};

/// Result of one generation call.
#[derive(Debug, Clone)]
pub struct RenderOutput {
    bytes: Vec<u8>,
    /// Pages in the document.
    pub page_count: usize,
    /// Indirect objects in the document.
    pub object_count: usize,
    /// Blocks passed in.
    pub blocks_supplied: usize,
    /// Blocks that made it into the document.
    pub blocks_emitted: usize,
    /// Content was dropped because it did not fit.
    pub truncated: bool,
    pub elapsed: Duration,
}

impl RenderOutput {
    /// The complete PDF file.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Write the PDF to `path`, creating parent directories.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, &self.bytes)?;
        debug!("wrote {} bytes to {}", self.bytes.len(), path.display());
        Ok(())
    }
}

/// Generates PDF documents with a fixed set of options.
///
/// A `Renderer` holds no mutable state, so one instance can serve
/// concurrent calls.
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    options: RenderOptions,
}

impl Renderer {
    pub fn new(options: RenderOptions) -> Self {
        Renderer { options }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Render blocks with the given layout.
    pub fn render(
        &self,
        blocks: &[LayoutBlock],
        mode: RenderMode,
        meta: &DocumentMeta,
    ) -> Result<RenderOutput> {
        let size: usize = blocks.iter().map(|b| b.text.len()).sum();
        self.check_size(size)?;

        let started = Instant::now();
        let geometry = self.options.geometry.normalized();
        let typography = self.options.typography.normalized();
        let escape = self.options.escape_for(mode);
        let meta = self.merge_meta(meta);

        let items = build_items(blocks, &typography);
        let (contents, fonts, blocks_emitted, truncated) = match mode {
            RenderMode::Paginated => {
                let lines = break_lines(&items, &geometry, &typography);
                let pages = paginate(lines, &geometry);
                let mut contents = Vec::with_capacity(pages.len());
                let mut fonts = BTreeSet::new();
                let mut placed = BTreeSet::new();
                let mut truncated = false;
                for page in &pages {
                    let content = emit_page(page, &geometry, escape);
                    fonts.extend(content.fonts_used);
                    placed.extend(content.blocks);
                    truncated |= content.truncated;
                    contents.push(content.data);
                }
                // Blocks with no words have nothing to place.
                let emitted = items
                    .iter()
                    .enumerate()
                    .filter(|(i, item)| {
                        placed.contains(i)
                            || (!item.is_rule()
                                && item.text.trim().is_empty())
                    })
                    .count();
                (contents, fonts, emitted, truncated)
            }
            RenderMode::SingleStream => {
                let content = emit_single_stream(
                    &items,
                    &geometry,
                    &typography,
                    escape,
                );
                let truncated = content.fit != FitResult::Stop;
                (
                    vec![content.data],
                    content.fonts_used,
                    content.blocks_emitted,
                    truncated,
                )
            }
        };

        let page_count = contents.len();
        let doc = assemble(contents, &fonts, &geometry, &meta)?;
        let object_count = doc.graph.len();
        let bytes = doc.to_bytes(self.options.pdf_version)?;
        let elapsed = started.elapsed();

        info!(
            "rendered {} of {} blocks onto {} pages ({} bytes) in {:?}",
            blocks_emitted,
            blocks.len(),
            page_count,
            bytes.len(),
            elapsed
        );

        Ok(RenderOutput {
            bytes,
            page_count,
            object_count,
            blocks_supplied: blocks.len(),
            blocks_emitted,
            truncated,
            elapsed,
        })
    }

    /// Render plain text: blank lines separate paragraphs.
    pub fn render_text(
        &self,
        text: &str,
        mode: RenderMode,
        meta: &DocumentMeta,
    ) -> Result<RenderOutput> {
        self.check_size(text.len())?;
        let blocks = extract::text_to_blocks(text, false)?;
        self.render(&blocks, mode, meta)
    }

    /// Render the supported HTML subset.
    pub fn render_html(
        &self,
        html: &str,
        mode: RenderMode,
        meta: &DocumentMeta,
    ) -> Result<RenderOutput> {
        self.check_size(html.len())?;
        let blocks = extract::html_to_blocks(html)?;
        self.render(&blocks, mode, meta)
    }

    /// Reject input of `size` bytes when it exceeds the configured
    /// ceiling. Callers that extract blocks themselves check the raw
    /// markup or text with this before extraction.
    pub fn check_size(&self, size: usize) -> Result<()> {
        let limit = self.options.max_input_bytes;
        if size > limit {
            return Err(Error::InputTooLarge { size, limit });
        }
        Ok(())
    }

    /// Fill Producer/Creator from the options when the caller's
    /// metadata leaves them unset.
    fn merge_meta(&self, meta: &DocumentMeta) -> DocumentMeta {
        let mut meta = meta.clone();
        if meta.producer.is_none() {
            meta.producer = self.options.producer.clone();
        }
        if meta.creator.is_none() {
            meta.creator = self.options.creator.clone();
        }
        meta
    }
}

/// Paginated paragraph flow: text is wrapped and broken across as
/// many pages as needed.
pub fn render(
    blocks: &[LayoutBlock],
    geometry: &PageGeometry,
    typography: &Typography,
    meta: &DocumentMeta,
) -> Result<RenderOutput> {
    let options = RenderOptions::new()
        .with_geometry(*geometry)
        .with_typography(*typography);
    Renderer::new(options).render(blocks, RenderMode::Paginated, meta)
}

/// Single page, single content stream: blocks that do not fit
/// above the bottom margin are dropped.
pub fn render_single_stream(
    blocks: &[LayoutBlock],
    geometry: &PageGeometry,
) -> Result<RenderOutput> {
    let options = RenderOptions::new().with_geometry(*geometry);
    Renderer::new(options).render(
        blocks,
        RenderMode::SingleStream,
        &DocumentMeta::default(),
    )
}
