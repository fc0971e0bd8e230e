//! textpdf CLI - plain text and HTML to PDF

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use log::debug;

use textpdf_core::{
    group_digits, html_to_blocks, is_well_formed, text_to_blocks, verify_xref,
    DocumentMeta, GroupingPolicy, LayoutBlock, Margins, PageGeometry,
    RenderMode, RenderOptions, RenderOutput, Renderer,
};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "textpdf")]
#[command(version)]
#[command(about = "Convert plain text and simple HTML to PDF", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a plain text file; blank lines separate paragraphs
    Text {
        /// Input text file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Use a short first line as a heading
        #[arg(long)]
        title_line: bool,

        #[command(flatten)]
        layout: LayoutArgs,
    },

    /// Convert an HTML file (headings, paragraphs, lists, rules)
    Html {
        /// Input HTML file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Put everything on one page, dropping what does not fit
        #[arg(long)]
        single_page: bool,

        #[command(flatten)]
        layout: LayoutArgs,
    },

    /// Check that a PDF is well formed and its xref table is exact
    Check {
        /// PDF file to check
        #[arg(value_name = "PDF")]
        input: PathBuf,
    },
}

#[derive(Args)]
struct LayoutArgs {
    /// Output file (input name with .pdf if not specified)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// JSON file with render options
    #[arg(long, value_name = "JSON")]
    config: Option<PathBuf>,

    /// Paper size
    #[arg(long, value_enum)]
    page_size: Option<PageSize>,

    /// Body font size in points (8-24)
    #[arg(long)]
    font_size: Option<f64>,

    /// Line height as a multiple of the font size (1-3)
    #[arg(long)]
    line_height: Option<f64>,

    /// Margin on every side, in points
    #[arg(long, value_name = "PT")]
    margin: Option<f64>,

    /// Document title
    #[arg(long)]
    title: Option<String>,

    /// Insert thousands separators into long numbers
    #[arg(long)]
    group_digits: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum PageSize {
    /// US Letter, 612 x 792pt
    Letter,
    /// ISO A4, 595 x 842pt
    A4,
}

impl From<PageSize> for PageGeometry {
    fn from(size: PageSize) -> Self {
        match size {
            PageSize::Letter => PageGeometry::letter(),
            PageSize::A4 => PageGeometry::a4(),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(level),
    )
    .init();

    let result = match cli.command {
        Commands::Text {
            input,
            title_line,
            layout,
        } => cmd_text(&input, title_line, &layout),
        Commands::Html {
            input,
            single_page,
            layout,
        } => cmd_html(&input, single_page, &layout),
        Commands::Check { input } => cmd_check(&input),
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn cmd_text(input: &Path, title_line: bool, layout: &LayoutArgs) -> CliResult<()> {
    let renderer = Renderer::new(build_options(layout)?);
    let text = fs::read_to_string(input)?;
    renderer.check_size(text.len())?;
    let blocks = text_to_blocks(&text, title_line)?;
    convert(&renderer, input, blocks, RenderMode::Paginated, layout)
}

fn cmd_html(input: &Path, single_page: bool, layout: &LayoutArgs) -> CliResult<()> {
    let renderer = Renderer::new(build_options(layout)?);
    let html = fs::read_to_string(input)?;
    renderer.check_size(html.len())?;
    let blocks = html_to_blocks(&html)?;
    let mode = if single_page {
        RenderMode::SingleStream
    } else {
        RenderMode::Paginated
    };
    convert(&renderer, input, blocks, mode, layout)
}

fn convert(
    renderer: &Renderer,
    input: &Path,
    mut blocks: Vec<LayoutBlock>,
    mode: RenderMode,
    layout: &LayoutArgs,
) -> CliResult<()> {
    if layout.group_digits {
        let policy = GroupingPolicy::default();
        for block in &mut blocks {
            block.text = group_digits(&block.text, &policy);
        }
    }

    let meta = DocumentMeta {
        title: layout.title.clone(),
        ..Default::default()
    };
    let output = renderer.render(&blocks, mode, &meta)?;

    let path = layout
        .output
        .clone()
        .unwrap_or_else(|| default_output(input));
    output.save(&path)?;
    print_summary(&path, &output);
    Ok(())
}

/// Render options from `--config`, then individual flags on top.
fn build_options(layout: &LayoutArgs) -> CliResult<RenderOptions> {
    let mut options = match &layout.config {
        Some(path) => {
            debug!("loading options from {}", path.display());
            RenderOptions::from_json_file(path)?
        }
        None => RenderOptions::new(),
    };

    if let Some(size) = layout.page_size {
        let margins = options.geometry.margins;
        options.geometry = PageGeometry::from(size).with_margins(margins);
    }
    if let Some(margin) = layout.margin {
        options.geometry.margins = Margins::uniform(margin);
    }
    if let Some(size) = layout.font_size {
        options.typography.font_size = size;
    }
    if let Some(height) = layout.line_height {
        options.typography.line_height = height;
    }
    if options.creator.is_none() {
        options.creator =
            Some(format!("textpdf-cli {}", env!("CARGO_PKG_VERSION")));
    }
    Ok(options)
}

/// `<dir>/<stem>.pdf` next to the input, with the stem reduced to
/// characters that are safe in file names.
fn default_output(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    input.with_file_name(format!("{}.pdf", sanitize_file_stem(&stem)))
}

fn sanitize_file_stem(stem: &str) -> String {
    let cleaned: String = stem
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches(|c| c == '.' || c == '_');
    if cleaned.is_empty() {
        "document".to_string()
    } else {
        cleaned.to_string()
    }
}

fn print_summary(path: &Path, output: &RenderOutput) {
    println!(
        "{} {} ({} pages, {} objects, {} bytes, {:.1?})",
        "Saved to".green(),
        path.display(),
        output.page_count,
        output.object_count,
        output.bytes().len(),
        output.elapsed,
    );
    if output.truncated {
        println!(
            "{} {} of {} blocks did not fit and were dropped",
            "Warning:".yellow().bold(),
            output.blocks_supplied - output.blocks_emitted,
            output.blocks_supplied,
        );
    }
}

fn cmd_check(input: &Path) -> CliResult<()> {
    let bytes = fs::read(input)?;
    if !is_well_formed(&bytes) {
        return Err(format!("{} is not a well-formed PDF", input.display()).into());
    }
    let objects = verify_xref(&bytes)?;
    println!(
        "{} {} ({} objects, {} bytes)",
        "OK".green().bold(),
        input.display(),
        objects,
        bytes.len()
    );
    Ok(())
}
