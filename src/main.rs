use clap::{Args, Parser, Subcommand};
use inkmark::config::{self, ConfigOverrides, RenderConfig};
use inkmark::document::{self, AssembledDocument};
use inkmark::naming::{self, InputSource};
use inkmark::output;
use inkmark::render::{self, CaptureOptions, ChromeBackend};
use inkmark::watermark::{Corner, WatermarkSpec};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Error, Debug)]
enum InputError {
    #[error("cannot read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot read stdin: {0}")]
    Stdin(#[source] io::Error),
    #[error("no input file given and stdin is a terminal")]
    NoInput,
}

fn version_string() -> &'static str {
    let on_tag = env!("INKMARK_ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("INKMARK_GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "inkmark")]
#[command(about = "Render markdown to an image with a watermark")]
#[command(long_about = "\
Render markdown to an image with a watermark

The markdown is converted to HTML, styled, covered with a watermark layer,
and captured by headless Chrome as one full-page image.

Watermark modes:

  tiled (default)   the text is drawn into an SVG tile, rotated about the
                    tile center, and repeated over the whole document
  --no-tile         one mark pinned to a corner of the page (--corner)

Settings are read from ./inkmark.toml (or --config FILE) and overridden by
flags. Run 'inkmark gen-config' to print a documented config file.

Rendering requires a local Chrome or Chromium.")]
#[command(version = version_string())]
struct Cli {
    /// Log pipeline progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render markdown to an image (.png, .jpg, .webp)
    Render(DocumentArgs),
    /// Write the assembled HTML document without rendering it
    Html(DocumentArgs),
    /// Print a stock inkmark.toml with all options documented
    GenConfig,
}

#[derive(Args)]
struct DocumentArgs {
    /// Markdown file. Reads stdin when omitted or `-`
    input: Option<PathBuf>,

    /// Output file
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[command(flatten)]
    settings: SettingsArgs,
}

/// Flags that override `inkmark.toml`.
#[derive(Args)]
struct SettingsArgs {
    /// Config file (default: ./inkmark.toml if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Page width in px
    #[arg(long)]
    width: Option<u32>,

    /// Horizontal page margin in px
    #[arg(long)]
    margin: Option<u32>,

    /// Custom content stylesheet
    #[arg(long)]
    css: Option<PathBuf>,

    /// Do not apply the default content stylesheet
    #[arg(long)]
    no_default_css: bool,

    /// Watermark text (empty disables the watermark)
    #[arg(long)]
    watermark: Option<String>,

    /// Watermark opacity, 0 to 1
    #[arg(long)]
    watermark_opacity: Option<f64>,

    /// Watermark color (any CSS color)
    #[arg(long)]
    watermark_color: Option<String>,

    /// Watermark rotation in degrees
    #[arg(long, allow_negative_numbers = true)]
    watermark_rotate: Option<f64>,

    /// Watermark font family
    #[arg(long)]
    watermark_font: Option<String>,

    /// Watermark font size in px
    #[arg(long)]
    watermark_size: Option<f64>,

    /// Horizontal tile spacing in px
    #[arg(long)]
    watermark_gap_x: Option<f64>,

    /// Vertical tile spacing in px
    #[arg(long)]
    watermark_gap_y: Option<f64>,

    /// Repeat the watermark over the page
    #[arg(long, conflicts_with = "no_tile")]
    tile: bool,

    /// Place a single watermark in a corner
    #[arg(long)]
    no_tile: bool,

    /// Scatter watermark characters slightly
    #[arg(long)]
    jitter: bool,

    /// Seed for the jitter pattern
    #[arg(long)]
    seed: Option<u64>,

    /// Corner for the single watermark
    #[arg(long, value_enum)]
    corner: Option<Corner>,
}

impl SettingsArgs {
    fn overrides(&self) -> ConfigOverrides {
        let tile = match (self.tile, self.no_tile) {
            (_, true) => Some(false),
            (true, false) => Some(true),
            (false, false) => None,
        };
        ConfigOverrides {
            width: self.width,
            margin: self.margin,
            css: self.css.clone(),
            no_default_css: self.no_default_css,
            watermark: self.watermark.clone(),
            opacity: self.watermark_opacity,
            color: self.watermark_color.clone(),
            rotate: self.watermark_rotate,
            font: self.watermark_font.clone(),
            size: self.watermark_size,
            gap_x: self.watermark_gap_x,
            gap_y: self.watermark_gap_y,
            tile,
            jitter: self.jitter,
            seed: self.seed,
            corner: self.corner,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr. `--verbose` wins over `RUST_LOG`; the default is warnings only.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("inkmark=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(command: Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Render(args) => {
            let job = prepare(&args)?;
            let path = args
                .output
                .clone()
                .unwrap_or_else(|| naming::default_output_path(&job.input));
            let format = naming::output_format(&path)?;

            let document = job.build()?;
            let image = render::render_to_file(
                &ChromeBackend::default(),
                &document.html,
                &CaptureOptions::from_config(&job.config),
                format,
                &path,
            )?;
            output::print_render_output(&job.input, &document, &job.watermark, &image);
        }
        Command::Html(args) => {
            let job = prepare(&args)?;
            let document = job.build()?;
            match &args.output {
                Some(path) => {
                    render::write_output(document.html.as_bytes(), path)?;
                    output::print_html_output(&job.input, &document, &job.watermark, path);
                }
                None => print!("{}", document.html),
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }
    Ok(())
}

/// Everything resolved before any document work starts.
struct Job {
    input: InputSource,
    source: String,
    config: RenderConfig,
    watermark: WatermarkSpec,
}

impl Job {
    fn build(&self) -> Result<AssembledDocument, document::DocumentError> {
        let mut rng = match self.config.watermark.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let title = naming::fallback_title(&self.input);
        document::build_document(
            &self.source,
            title.as_deref(),
            &self.config,
            &self.watermark,
            &mut rng,
        )
    }
}

fn prepare(args: &DocumentArgs) -> Result<Job, Box<dyn std::error::Error>> {
    let input = resolve_input(args.input.as_ref())?;
    let working_dir = std::env::current_dir()?;
    let config = config::load_config(
        args.settings.config.as_deref(),
        &working_dir,
        args.settings.overrides(),
    )?;
    let watermark = config.watermark_spec()?;
    let source = read_input(&input)?;
    tracing::debug!(input = %input.label(), bytes = source.len(), "read input");
    Ok(Job {
        input,
        source,
        config,
        watermark,
    })
}

fn resolve_input(path: Option<&PathBuf>) -> Result<InputSource, InputError> {
    match path {
        Some(p) if p.as_os_str() == "-" => Ok(InputSource::Stdin),
        Some(p) => Ok(InputSource::File(p.clone())),
        None if io::stdin().is_terminal() => Err(InputError::NoInput),
        None => Ok(InputSource::Stdin),
    }
}

fn read_input(input: &InputSource) -> Result<String, InputError> {
    match input {
        InputSource::File(path) => {
            std::fs::read_to_string(path).map_err(|source| InputError::Unreadable {
                path: path.clone(),
                source,
            })
        }
        InputSource::Stdin => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .map_err(InputError::Stdin)?;
            Ok(text)
        }
    }
}
