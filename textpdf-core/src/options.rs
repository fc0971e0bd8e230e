//! Rendering options and configuration.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{Margins, PageGeometry, Typography};
use crate::writer::{EscapeMode, PdfVersion};

/// Default ceiling on input size: 5 MiB of text or markup.
pub const DEFAULT_MAX_INPUT_BYTES: usize = 5 * 1024 * 1024;

/// How blocks are laid out.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum RenderMode {
    /// Wrap into lines, break lines into as many pages as needed.
    #[default]
    Paginated,
    /// One page, one content stream; content that does not fit is
    /// truncated.
    SingleStream,
}

impl RenderMode {
    /// Escape mode used when none is configured.
    pub fn default_escape(&self) -> EscapeMode {
        match self {
            RenderMode::Paginated => EscapeMode::Preserve,
            RenderMode::SingleStream => EscapeMode::Collapse,
        }
    }
}

/// Options for generating a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Page size and margins
    pub geometry: PageGeometry,

    /// Body font size and line spacing
    pub typography: Typography,

    /// Version written in the file header
    pub pdf_version: PdfVersion,

    /// CR/LF/Tab handling; `None` uses the render mode's default
    pub escape: Option<EscapeMode>,

    /// Inputs larger than this are rejected before layout
    pub max_input_bytes: usize,

    /// Info dictionary Producer entry
    pub producer: Option<String>,

    /// Info dictionary Creator entry
    pub creator: Option<String>,
}

impl RenderOptions {
    /// Create new render options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load options from a JSON file. Missing fields keep their
    /// defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Set the page geometry.
    pub fn with_geometry(mut self, geometry: PageGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    /// Set all four margins.
    pub fn with_margins(mut self, margins: Margins) -> Self {
        self.geometry.margins = margins;
        self
    }

    /// Set typography.
    pub fn with_typography(mut self, typography: Typography) -> Self {
        self.typography = typography;
        self
    }

    /// Set the PDF version.
    pub fn with_version(mut self, version: PdfVersion) -> Self {
        self.pdf_version = version;
        self
    }

    /// Override the escape mode for both render modes.
    pub fn with_escape(mut self, escape: EscapeMode) -> Self {
        self.escape = Some(escape);
        self
    }

    /// Set the input size ceiling.
    pub fn with_max_input_bytes(mut self, limit: usize) -> Self {
        self.max_input_bytes = limit;
        self
    }

    pub fn with_producer(mut self, producer: impl Into<String>) -> Self {
        self.producer = Some(producer.into());
        self
    }

    pub fn with_creator(mut self, creator: impl Into<String>) -> Self {
        self.creator = Some(creator.into());
        self
    }

    /// Escape mode in effect for `mode`.
    pub fn escape_for(&self, mode: RenderMode) -> EscapeMode {
        self.escape.unwrap_or_else(|| mode.default_escape())
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            geometry: PageGeometry::default(),
            typography: Typography::default(),
            pdf_version: PdfVersion::default(),
            escape: None,
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
            producer: None,
            creator: None,
        }
    }
}
