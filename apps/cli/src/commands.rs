//! CLI command definitions, routing, and tracing setup.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use indicatif::{ProgressBar, ProgressStyle};
use sitecrawl_crawler::{CrawlResult, Crawler, ExtractorRegistry, ProgressReporter};
use sitecrawl_shared::{
    AppConfig, CrawlConfig, Record, init_config, load_config, load_config_from, parse_seed_url,
};
use tracing::info;
use url::Url;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// SiteCrawl: crawl a site and collect its articles as JSON.
#[derive(Parser)]
#[command(
    name = "sitecrawl",
    version,
    about = "Crawl a website breadth-first and extract content records as JSON.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Crawl a site from a seed URL and write the records as JSON.
    Crawl {
        /// Seed URL (http or https).
        url: String,

        #[command(flatten)]
        overrides: CrawlOverrides,

        /// Write JSON here instead of stdout.
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Read settings from this file instead of ~/.sitecrawl/sitecrawl.toml.
        #[arg(long, env = "SITECRAWL_CONFIG")]
        config: Option<PathBuf>,
    },

    /// List the built-in extractors.
    Extractors,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Per-run overrides for `[crawl]` settings.
#[derive(Args, Debug, Default)]
pub(crate) struct CrawlOverrides {
    /// Maximum link depth from the seed (0 = seed page only).
    #[arg(short, long)]
    pub depth: Option<u32>,

    /// Maximum number of pages fetched.
    #[arg(long)]
    pub max_pages: Option<usize>,

    /// Per-request timeout in seconds.
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Delay between requests in milliseconds.
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Regex a link's path must match to be followed.
    #[arg(long)]
    pub path_filter: Option<String>,

    /// Glob of paths never to follow (repeatable).
    #[arg(long = "exclude")]
    pub exclude: Vec<String>,

    /// Pages fetched at once.
    #[arg(long)]
    pub concurrency: Option<u32>,

    /// Extractor name, or `auto` to detect from the seed page.
    #[arg(short, long)]
    pub extractor: Option<String>,

    /// Do not fetch record pages for extra fields.
    #[arg(long)]
    pub no_details: bool,
}

impl CrawlOverrides {
    /// Apply flags on top of file/default settings.
    fn apply(self, config: &mut CrawlConfig) {
        if let Some(depth) = self.depth {
            config.max_depth = depth;
        }
        if let Some(max_pages) = self.max_pages {
            config.max_pages = max_pages;
        }
        if let Some(timeout) = self.timeout_secs {
            config.timeout_secs = timeout;
        }
        if let Some(delay) = self.delay_ms {
            config.delay_ms = delay;
        }
        if let Some(filter) = self.path_filter {
            config.path_filter = filter;
        }
        if !self.exclude.is_empty() {
            config.exclude_patterns.extend(self.exclude);
        }
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
        if let Some(extractor) = self.extractor {
            config.extractor = extractor;
        }
        if self.no_details {
            config.follow_details = false;
        }
    }
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show {
        /// Read settings from this file instead of ~/.sitecrawl/sitecrawl.toml.
        #[arg(long, env = "SITECRAWL_CONFIG")]
        config: Option<PathBuf>,
    },
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
///
/// Logs go to stderr so JSON on stdout stays clean.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "sitecrawl=info",
        1 => "sitecrawl=debug",
        _ => "sitecrawl=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Crawl {
            url,
            overrides,
            out,
            config,
        } => cmd_crawl(&url, overrides, out.as_deref(), config.as_deref()).await,
        Command::Extractors => cmd_extractors(),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show { config } => cmd_config_show(config.as_deref()),
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_crawl(
    url: &str,
    overrides: CrawlOverrides,
    out: Option<&Path>,
    config_path: Option<&Path>,
) -> Result<()> {
    let app_config = load_app_config(config_path)?;
    let seed: Url = parse_seed_url(url)?;

    let mut crawl_config = CrawlConfig::from(&app_config);
    overrides.apply(&mut crawl_config);

    info!(
        url = %seed,
        max_depth = crawl_config.max_depth,
        max_pages = crawl_config.max_pages,
        extractor = %crawl_config.extractor,
        "crawling site"
    );

    let crawler = Crawler::new(crawl_config)?;
    let reporter = CliProgress::new();
    let result = crawler.run(&seed, &reporter).await?;

    match out {
        Some(path) => {
            let file = File::create(path)
                .wrap_err_with(|| format!("cannot create {}", path.display()))?;
            write_records(BufWriter::new(file), &result.records)?;
        }
        None => write_records(io::stdout().lock(), &result.records)?,
    }

    print_summary(&result, out);
    Ok(())
}

/// Load the explicit config file if one was given, else the user config.
fn load_app_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    Ok(config)
}

/// Write records as a pretty JSON array.
fn write_records<W: Write>(mut writer: W, records: &[Record]) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, records)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

fn print_summary(result: &CrawlResult, out: Option<&Path>) {
    eprintln!();
    eprintln!("  Crawl finished");
    eprintln!("  Records:   {}", result.records.len());
    eprintln!("  Fetched:   {}", result.pages_fetched);
    eprintln!("  Failed:    {}", result.pages_failed);
    eprintln!(
        "  Extractor: {}",
        result.extractor.as_deref().unwrap_or("none")
    );
    if let Some(path) = out {
        eprintln!("  Output:    {}", path.display());
    }
    eprintln!("  Time:      {:.1}s", result.duration.as_secs_f64());
    eprintln!();
}

fn cmd_extractors() -> Result<()> {
    let registry = ExtractorRegistry::new();
    println!("  {:<14} detect from the first fetched page", "auto");
    for extractor in registry.iter() {
        println!("  {:<14} {}", extractor.name(), extractor.description());
    }
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = load_app_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn page_fetched(&self, url: &str, depth: u32, processed: usize, max_pages: usize) {
        self.spinner
            .set_message(format!("Fetched [{processed}/{max_pages}] depth {depth} {url}"));
    }

    fn page_failed(&self, url: &str, _reason: &str) {
        self.spinner.set_message(format!("Skipped {url}"));
    }

    fn done(&self, _result: &CrawlResult) {
        self.spinner.finish_and_clear();
    }
}
