//! Lumen CLI - render HTML documents to images from the command line
//!
//! Usage:
//!   lumen render page.html -o page.png        Render to a PNG
//!   lumen tree page.html                      Print DOM and box trees
//!   lumen paginate page.html --out-dir pages  Write one PNG per page plus links.json
//!
//! Global options select the viewport (`--width`, `--height`), an engine
//! configuration file (`--config`) and log verbosity (`-v`, `-vv`).

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Args, Parser, Subcommand};
use lumen_common::EngineConfig;
use lumen_engine::{
    FontFamilyMap, FontdueFontMetrics, HtmlContainer, HtmlGenerationStyle, LayoutRestriction, Pager, RasterGraphics,
    replay,
};
use owo_colors::OwoColorize;

/// Lumen - an embeddable HTML/CSS renderer
#[derive(Parser, Debug)]
#[command(name = "lumen")]
#[command(author, version, about, long_about = None)]
#[command(after_help = r#"EXAMPLES:
    # Render a file to PNG at 1024px wide
    lumen --width 1024 render ./index.html -o index.png

    # Shrink the output to the content's natural width
    lumen render --auto-size --html '<p>Hello World</p>' -o hello.png

    # Inspect the box tree
    lumen tree ./index.html

    # A4-ish pages at 96 dpi
    lumen --width 794 --height 1123 paginate ./report.html --out-dir pages
"#)]
struct Cli {
    /// Layout width in pixels
    #[arg(long, global = true, default_value = "800")]
    width: f32,

    /// Viewport or page height in pixels (0: fit the content)
    #[arg(long, global = true, default_value = "0")]
    height: f32,

    /// Engine configuration (JSON)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v: info, -vv: debug, -vvv: trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the document to a PNG image
    Render {
        #[command(flatten)]
        input: Input,

        /// Output PNG path
        #[arg(short, long, value_name = "FILE", default_value = "out.png")]
        output: PathBuf,

        /// Shrink to the content's natural width (up to --width)
        #[arg(long)]
        auto_size: bool,
    },
    /// Print the DOM and box trees
    Tree {
        #[command(flatten)]
        input: Input,

        /// Also print the regenerated HTML with inline computed styles
        #[arg(long)]
        styles: bool,
    },
    /// Split the document into pages
    Paginate {
        #[command(flatten)]
        input: Input,

        /// Directory receiving page-N.png and links.json
        #[arg(long, value_name = "DIR", default_value = "pages")]
        out_dir: PathBuf,
    },
}

#[derive(Args, Debug)]
struct Input {
    /// Path to an HTML file
    #[arg(value_name = "FILE")]
    path: Option<PathBuf>,

    /// Parse HTML string directly instead of a file
    #[arg(long, value_name = "HTML")]
    html: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => EngineConfig::from_path(path).with_context(|| format!("loading {}", path.display()))?,
        None => EngineConfig::default(),
    };
    let fonts = Arc::new(FontFamilyMap::system(&config.default_font_family).with_fallbacks(&config.font_fallbacks));
    if fonts.is_empty() {
        log::warn!("no system fonts found; text is measured approximately and not drawn");
    }

    match &cli.command {
        Command::Render {
            input,
            output,
            auto_size,
        } => {
            let mut container = load(input, config, &fonts)?;
            let restriction = LayoutRestriction {
                max_width: cli.width,
                max_height: cli.height,
                auto_size: *auto_size,
                ..LayoutRestriction::default()
            };
            let (width, height) = container.perform_layout(restriction)?;
            let canvas_height = if cli.height > 0.0 { cli.height } else { height };
            let mut gfx = RasterGraphics::new(
                width.ceil().max(1.0) as u32,
                canvas_height.ceil().max(1.0) as u32,
                Arc::clone(&fonts),
            )?;
            container.perform_paint(&mut gfx, None);
            gfx.save(output)?;
            report(&container);
            println!("Rendered {}x{} to {}", gfx.width(), gfx.height(), output.display());
        }
        Command::Tree { input, styles } => {
            let mut container = load(input, config, &fonts)?;
            let _ = container.perform_layout(LayoutRestriction {
                max_width: cli.width,
                max_height: cli.height,
                ..LayoutRestriction::default()
            })?;
            print_trees(&container, cli.width);
            if *styles {
                println!("\n{}", "=== Inline-styled HTML ===".bold());
                println!("{}", container.get_html(HtmlGenerationStyle::Inline));
            }
            report(&container);
        }
        Command::Paginate { input, out_dir } => {
            let mut container = load(input, config, &fonts)?;
            let page_height = if cli.height > 0.0 { cli.height } else { cli.width * 1.414 };
            paginate(&mut container, &fonts, cli.width, page_height, out_dir)?;
            report(&container);
        }
    }
    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

/// Build a container for the document named by `input`.
fn load(input: &Input, config: EngineConfig, fonts: &Arc<FontFamilyMap>) -> Result<HtmlContainer> {
    let mut container = HtmlContainer::new(config).with_fonts(FontdueFontMetrics::new(Arc::clone(fonts)));
    if let Some(html) = &input.html {
        container.set_html(html);
    } else if let Some(path) = &input.path {
        container
            .load_file(path)
            .with_context(|| format!("reading {}", path.display()))?;
    } else {
        bail!("an HTML file or --html is required");
    }
    Ok(container)
}

fn paginate(
    container: &mut HtmlContainer,
    fonts: &Arc<FontFamilyMap>,
    width: f32,
    height: f32,
    out_dir: &Path,
) -> Result<()> {
    let pager = Pager::new(width, height)?;
    let pages = pager.paginate(container)?;
    fs::create_dir_all(out_dir).with_context(|| format!("creating {}", out_dir.display()))?;

    let mut links = Vec::with_capacity(pages.len());
    for page in &pages {
        let mut gfx = RasterGraphics::new(width.ceil() as u32, height.ceil() as u32, Arc::clone(fonts))?;
        replay(&page.list, container.images(), &mut gfx);
        let path = out_dir.join(format!("page-{}.png", page.index + 1));
        gfx.save(&path)?;
        links.push(serde_json::json!({ "page": page.index, "links": page.links }));
    }
    let links_path = out_dir.join("links.json");
    fs::write(&links_path, serde_json::to_string_pretty(&links)?)
        .with_context(|| format!("writing {}", links_path.display()))?;
    println!("Wrote {} page(s) to {}", pages.len(), out_dir.display());
    Ok(())
}

/// Print DOM and box trees (headless inspection).
fn print_trees(container: &HtmlContainer, width: f32) {
    let dom = container.document();
    println!("{}", "=== DOM Tree ===".bold());
    lumen_dom::print_tree(dom, dom.root(), 0);

    let (actual_width, actual_height) = container.actual_size();
    println!(
        "\n{} {}",
        "=== Box Tree ===".bold(),
        format!("(width {width}, actual {actual_width:.1}x{actual_height:.1})").dimmed()
    );
    print!("{}", container.dump_tree());

    let links = container.links();
    if !links.is_empty() {
        println!("\n{}", "=== Links ===".bold());
        for link in links {
            let rect = link.rects.first().copied().unwrap_or_default();
            println!(
                "  {} at x={:.1} y={:.1} w={:.1} h={:.1}",
                link.href.cyan(),
                rect.x,
                rect.y,
                rect.width,
                rect.height
            );
        }
    }
}

/// Print error events and warnings raised while processing the document.
fn report(container: &HtmlContainer) {
    for event in container.error_events().try_iter() {
        eprintln!("{} {event}", "error:".red().bold());
        if let Some(source) = std::error::Error::source(&event) {
            eprintln!("  {} {source}", "caused by:".dimmed());
        }
    }
    for warning in container.warnings() {
        eprintln!("{} [{}] {}", "warning:".yellow().bold(), warning.component, warning.message);
    }
}
