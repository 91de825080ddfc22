//! CLI binary for invention-cards.
//!
//! A thin shim over the library crate: each subcommand maps its flags onto
//! `ExtractionConfig` / `ArtConfig` / `CatalogQuery` and prints results.
//! Catalog rows go to stdout (or `--output`); logs and progress go to stderr.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use invention_cards::codec::{encode_row, header_row};
use invention_cards::pipeline::encode::read_image_file;
use invention_cards::{
    compose_blurb, extract_images, extract_stream, generate_card_images, resolve_model,
    ArtConfig, Catalog, CatalogQuery, ExtractionConfig, ExtractionProgressCallback, OpenAiArtist,
    PageRange, ProgressCallback, Record,
};
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

/// Live progress bar plus one log line per finished page.
struct CliProgressCallback {
    bar: ProgressBar,
    start_times: Mutex<HashMap<usize, Instant>>,
    total: AtomicUsize,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
            total: AtomicUsize::new(0),
            errors: AtomicUsize::new(0),
        })
    }

    fn elapsed_secs(&self, page_num: usize) -> f64 {
        let elapsed_ms = self
            .start_times
            .lock()
            .ok()
            .and_then(|mut t| t.remove(&page_num))
            .map(|t| t.elapsed().as_millis())
            .unwrap_or(0);
        elapsed_ms as f64 / 1000.0
    }
}

impl ExtractionProgressCallback for CliProgressCallback {
    fn on_extraction_start(&self, total_pages: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.total.store(total_pages, Ordering::SeqCst);
        self.bar.set_length(total_pages as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("Extracting");
        self.bar.reset_eta();
    }

    fn on_page_start(&self, page_num: usize) {
        if let Ok(mut t) = self.start_times.lock() {
            t.insert(page_num, Instant::now());
        }
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_complete(&self, page_num: usize, record_count: usize) {
        let secs = self.elapsed_secs(page_num);
        self.bar.println(format!(
            "  {} Page {:>4}  {:<12}  {}",
            green("✓"),
            page_num,
            dim(&format!("{record_count:>2} records")),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_page_error(&self, page_num: usize, error: &str) {
        let secs = self.elapsed_secs(page_num);
        self.errors.fetch_add(1, Ordering::SeqCst);

        let msg: String = match error.char_indices().nth(79) {
            Some((cut, _)) => format!("{}\u{2026}", &error[..cut]),
            None => error.to_string(),
        };
        self.bar.println(format!(
            "  {} Page {:>4}  {}  {}",
            red("✗"),
            page_num,
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_extraction_complete(&self, total_pages: usize, record_count: usize) {
        self.bar.finish_and_clear();
        let failed = self.errors.load(Ordering::SeqCst);
        if failed == 0 {
            eprintln!(
                "{} {} records from {} pages",
                green("✔"),
                bold(&record_count.to_string()),
                total_pages
            );
        } else {
            eprintln!(
                "{} {} records from {} pages  ({} pages failed)",
                cyan("⚠"),
                bold(&record_count.to_string()),
                total_pages,
                red(&failed.to_string()),
            );
        }
    }
}

// ── Arguments ────────────────────────────────────────────────────────────────

const AFTER_HELP: &str = r#"EXAMPLES:
  # Extract pages 12-14 and append rows to the catalog
  cards extract --pdf volume1.pdf --from 12 --to 14 -o inventions.tsv

  # Start a fresh catalog with its header row
  cards extract --pdf volume1.pdf --from 1 --to 400 --header -o inventions.tsv

  # Extract from page images saved as files
  cards scan page-012.jpg page-013.jpg

  # Everything invented in the 1800s
  cards list --catalog inventions.tsv --from_year 1800 --to_year 1899

  # Illustrate one card, replacing nothing
  cards art --catalog inventions.tsv --one telephone

  # Regenerate art for antiquity (new images land on <id>-N.jpg)
  cards art --catalog inventions.tsv --to_year 0 --force

  # Social post for a card
  cards blurb --catalog inventions.tsv --id telephone

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key (chat models and image generation)
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  CARDS_CATALOG           Default catalog path
  RUST_LOG                Log filter (overrides -v / -q)
"#;

/// Build invention cards from scanned encyclopedia pages.
#[derive(Parser, Debug)]
#[command(
    name = "cards",
    version,
    about = "Build invention cards from scanned encyclopedia pages",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "CARDS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "CARDS_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract catalog rows from a page range of a scanned PDF.
    Extract(ExtractArgs),
    /// Extract catalog rows from page images saved as files.
    Scan(ScanArgs),
    /// Print catalog rows, optionally filtered.
    List(ListArgs),
    /// Generate card art for catalog records.
    Art(ArtArgs),
    /// Write a social-media post announcing one card.
    Blurb(BlurbArgs),
}

#[derive(Args, Debug)]
struct ModelArgs {
    /// LLM model ID (default: gpt-4o).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "CARDS_TEMPERATURE", default_value_t = 0.1)]
    temperature: f32,

    /// Max LLM output tokens per call.
    #[arg(long, env = "CARDS_MAX_TOKENS", default_value_t = 4000)]
    max_tokens: usize,
}

#[derive(Args, Debug)]
struct RowOutputArgs {
    /// Append rows to this file instead of printing them.
    #[arg(short, long, env = "CARDS_OUTPUT")]
    output: Option<PathBuf>,

    /// Write the header row first (to a file only when it is empty).
    #[arg(long)]
    header: bool,

    /// Path to a text file replacing the built-in extraction prompt.
    #[arg(long, env = "CARDS_PROMPT")]
    prompt: Option<PathBuf>,

    /// Disable progress bar.
    #[arg(long, env = "CARDS_NO_PROGRESS")]
    no_progress: bool,
}

#[derive(Args, Debug)]
struct ExtractArgs {
    /// Scanned PDF, one image per page.
    #[arg(long, env = "CARDS_PDF")]
    pdf: PathBuf,

    /// First page to process (1-based).
    #[arg(long = "from", alias = "fr")]
    from: usize,

    /// Last page to process (inclusive).
    #[arg(long)]
    to: usize,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "CARDS_PDF_PASSWORD")]
    password: Option<String>,

    #[command(flatten)]
    rows: RowOutputArgs,

    #[command(flatten)]
    model: ModelArgs,
}

#[derive(Args, Debug)]
struct ScanArgs {
    /// Page images (PNG, JPEG, …), processed in the given order.
    #[arg(required = true)]
    images: Vec<PathBuf>,

    #[command(flatten)]
    rows: RowOutputArgs,

    #[command(flatten)]
    model: ModelArgs,
}

#[derive(Args, Debug)]
struct CatalogArgs {
    /// Catalog file (tab-separated, header row first).
    #[arg(long, env = "CARDS_CATALOG", default_value = "inventions.tsv")]
    catalog: PathBuf,
}

#[derive(Args, Debug)]
struct QueryArgs {
    /// Only the record with this id.
    #[arg(long)]
    one: Option<String>,

    /// Earliest year to include; BCE years are negative.
    #[arg(long = "from_year", alias = "from-year", allow_negative_numbers = true)]
    from_year: Option<i64>,

    /// Latest year to include; BCE years are negative.
    #[arg(long = "to_year", alias = "to-year", allow_negative_numbers = true)]
    to_year: Option<i64>,
}

impl From<&QueryArgs> for CatalogQuery {
    fn from(q: &QueryArgs) -> Self {
        CatalogQuery {
            one: q.one.clone(),
            from_year: q.from_year,
            to_year: q.to_year,
        }
    }
}

#[derive(Args, Debug)]
struct ListArgs {
    #[command(flatten)]
    catalog: CatalogArgs,

    #[command(flatten)]
    query: QueryArgs,

    /// Print the header row first.
    #[arg(long)]
    header: bool,
}

#[derive(Args, Debug)]
struct ArtArgs {
    #[command(flatten)]
    catalog: CatalogArgs,

    #[command(flatten)]
    query: QueryArgs,

    /// Regenerate even when <images-dir>/<id>.jpg exists.
    #[arg(long)]
    force: bool,

    /// Directory receiving the images.
    #[arg(long, env = "CARDS_IMAGES_DIR", default_value = "images")]
    images_dir: PathBuf,

    /// API key for the image endpoint.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Image-generation endpoint.
    #[arg(long, env = "CARDS_IMAGE_ENDPOINT")]
    endpoint: Option<String>,

    /// Image model (default: dall-e-3).
    #[arg(long, env = "CARDS_IMAGE_MODEL")]
    image_model: Option<String>,

    /// HTTP timeout per request in seconds.
    #[arg(long, env = "CARDS_HTTP_TIMEOUT", default_value_t = 120)]
    http_timeout: u64,
}

#[derive(Args, Debug)]
struct BlurbArgs {
    #[command(flatten)]
    catalog: CatalogArgs,

    /// Id of the card to announce.
    #[arg(long)]
    id: String,

    #[command(flatten)]
    model: ModelArgs,
}

// ── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // The progress bar replaces INFO logs during extraction.
    let shows_bar = match &cli.command {
        Command::Extract(a) => !a.rows.no_progress,
        Command::Scan(a) => !a.rows.no_progress,
        _ => false,
    };
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || shows_bar {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match &cli.command {
        Command::Extract(args) => run_extract(args, cli.quiet).await,
        Command::Scan(args) => run_scan(args, cli.quiet).await,
        Command::List(args) => run_list(args),
        Command::Art(args) => run_art(args, cli.quiet).await,
        Command::Blurb(args) => run_blurb(args).await,
    }
}

// ── Subcommands ──────────────────────────────────────────────────────────────

async fn run_extract(args: &ExtractArgs, quiet: bool) -> Result<()> {
    let range = PageRange::new(args.from, args.to).context("Invalid page range")?;

    let progress = progress_callback(&args.rows, quiet);
    let mut config = build_config(&args.model, &args.rows, progress.clone()).await?;
    config.password = args.password.clone();

    let mut sink = RowSink::open(args.rows.output.as_deref(), args.rows.header)?;
    let mut pages = extract_stream(&args.pdf, range, &config)
        .await
        .context("Extraction failed")?;

    let (mut page_count, mut record_count) = (0, 0);
    while let Some(page) = pages.next().await {
        let page = match page {
            Ok(page) => page,
            Err(e) => {
                if let Some(ref cb) = progress {
                    cb.on_extraction_complete(page_count, record_count);
                }
                return Err(e).context("Extraction aborted");
            }
        };
        page_count += 1;
        record_count += page.records.len();
        sink.write_records(&page.records)?;
    }

    if let Some(ref cb) = progress {
        cb.on_extraction_complete(page_count, record_count);
    } else if !quiet {
        eprintln!("Extracted {record_count} records from {page_count} pages");
    }
    Ok(())
}

async fn run_scan(args: &ScanArgs, quiet: bool) -> Result<()> {
    let images = args
        .images
        .iter()
        .enumerate()
        .map(|(i, path)| read_image_file(path, i + 1))
        .collect::<Result<Vec<_>, _>>()
        .context("Failed to read page images")?;

    let config = build_config(&args.model, &args.rows, None).await?;
    let model = resolve_model(&config).context("No LLM provider available")?;

    let mut sink = RowSink::open(args.rows.output.as_deref(), args.rows.header)?;
    let output = extract_images(images, &model, &config).await;
    for page in &output.pages {
        sink.write_records(&page.records)?;
    }

    if !quiet {
        eprintln!(
            "Extracted {} records from {}/{} images",
            output.stats.total_records, output.stats.processed_pages, output.stats.total_pages
        );
        for error in output.errors() {
            eprintln!("  {} {}", red("✗"), error);
        }
    }
    Ok(())
}

fn run_list(args: &ListArgs) -> Result<()> {
    let catalog = load_catalog(&args.catalog.catalog)?;
    let records = catalog.select(&CatalogQuery::from(&args.query))?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if args.header {
        writeln!(out, "{}", header_row()).context("Failed to write to stdout")?;
    }
    for record in records {
        writeln!(out, "{}", encode_row(record)).context("Failed to write to stdout")?;
    }
    Ok(())
}

async fn run_art(args: &ArtArgs, quiet: bool) -> Result<()> {
    let catalog = load_catalog(&args.catalog.catalog)?;
    let records = catalog.select(&CatalogQuery::from(&args.query))?;
    if !quiet {
        eprintln!(
            "Loaded {} records; processing {}.",
            catalog.len(),
            records.len()
        );
    }

    let mut builder = ArtConfig::builder()
        .api_key(&args.api_key)
        .images_dir(&args.images_dir)
        .force(args.force)
        .http_timeout_secs(args.http_timeout);
    if let Some(ref endpoint) = args.endpoint {
        builder = builder.endpoint(endpoint);
    }
    if let Some(ref model) = args.image_model {
        builder = builder.model(model);
    }
    let config = builder.build().context("Invalid art configuration")?;
    let artist = OpenAiArtist::new(&config)?;

    let report = generate_card_images(records, &artist, &config).await;

    if !quiet {
        eprintln!(
            "{} {} generated  {} skipped  {} failed",
            if report.failed.is_empty() {
                green("✔")
            } else {
                cyan("⚠")
            },
            bold(&report.generated.len().to_string()),
            dim(&report.skipped.len().to_string()),
            red(&report.failed.len().to_string()),
        );
        for (id, reason) in &report.failed {
            eprintln!("  {} {}  {}", red("✗"), id, dim(reason));
        }
    }
    Ok(())
}

async fn run_blurb(args: &BlurbArgs) -> Result<()> {
    let catalog = load_catalog(&args.catalog.catalog)?;
    let record = catalog.require(&args.id)?;

    let config = ExtractionConfig::builder()
        .temperature(args.model.temperature)
        .max_tokens(args.model.max_tokens)
        .build()
        .context("Invalid configuration")?;
    let config = with_model(config, &args.model);
    let model = resolve_model(&config).context("No LLM provider available")?;

    let blurb = compose_blurb(&model, record)
        .await
        .context("Blurb generation failed")?;
    println!("{blurb}");
    Ok(())
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn progress_callback(rows: &RowOutputArgs, quiet: bool) -> Option<ProgressCallback> {
    if quiet || rows.no_progress {
        return None;
    }
    let cb: ProgressCallback = CliProgressCallback::new();
    Some(cb)
}

/// Map CLI args to `ExtractionConfig`.
async fn build_config(
    model: &ModelArgs,
    rows: &RowOutputArgs,
    progress: Option<ProgressCallback>,
) -> Result<ExtractionConfig> {
    let mut builder = ExtractionConfig::builder()
        .temperature(model.temperature)
        .max_tokens(model.max_tokens);

    if let Some(ref path) = rows.prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read prompt from {:?}", path))?;
        builder = builder.prompt(prompt);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    let config = builder.build().context("Invalid configuration")?;
    Ok(with_model(config, model))
}

fn with_model(mut config: ExtractionConfig, model: &ModelArgs) -> ExtractionConfig {
    config.model = model.model.clone();
    config.provider_name = model.provider.clone();
    config
}

fn load_catalog(path: &Path) -> Result<Catalog> {
    Catalog::load(path).with_context(|| format!("Failed to load catalog {}", path.display()))
}

/// Destination for extracted rows: stdout or a file opened for append.
struct RowSink {
    out: Box<dyn Write>,
    label: String,
}

impl RowSink {
    fn open(path: Option<&Path>, header: bool) -> Result<Self> {
        let (mut out, label, empty): (Box<dyn Write>, String, bool) = match path {
            Some(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .with_context(|| format!("Failed to open {}", path.display()))?;
                let empty = file.metadata().map(|m| m.len() == 0).unwrap_or(false);
                (Box::new(file), path.display().to_string(), empty)
            }
            None => (Box::new(io::stdout()), "stdout".to_string(), true),
        };

        if header && empty {
            writeln!(out, "{}", header_row())
                .with_context(|| format!("Failed to write to {label}"))?;
        }
        Ok(Self { out, label })
    }

    /// Write and flush one page's rows, so an interrupted run keeps them.
    fn write_records(&mut self, records: &[Record]) -> Result<()> {
        for record in records {
            writeln!(self.out, "{}", encode_row(record))
                .with_context(|| format!("Failed to write to {}", self.label))?;
        }
        self.out
            .flush()
            .with_context(|| format!("Failed to write to {}", self.label))
    }
}
