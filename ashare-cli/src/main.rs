//! ashare CLI: history, realtime, tick, market and cache commands.
//!
//! Commands:
//! - `stock|kline <symbol> <start> <end> [period]`: historical OHLCV envelope
//! - `realtime <code>` / `index_realtime <code>`: latest snapshot
//! - `tick <code>`: most recent minute points
//! - `market`: headline index overview
//! - `cache status` / `cache purge`: inspect or clean the history cache
//!
//! Every command prints exactly one JSON document on stdout and exits 0.
//! Failures are reported in the document; diagnostics go to stderr.

use anyhow::{bail, Context, Result};
use ashare_core::config::FeedConfig;
use ashare_core::data::{EastmoneyProvider, EnvelopeCache, Period};
use ashare_core::domain::ErrorReply;
use ashare_core::service::{HistoryService, RealtimeService};
use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use std::time::SystemTime;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ashare", version, about = "A-share quote shim printing JSON envelopes")]
struct Cli {
    /// Path to a TOML config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Cache directory. Overrides the config file.
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Historical bars for a stock (600000) or index (000001.SH).
    Stock(HistoryArgs),
    /// Alias of `stock`.
    Kline(HistoryArgs),
    /// Realtime snapshot for a stock.
    Realtime { symbol: Option<String> },
    /// Most recent minute points for a stock.
    Tick { symbol: Option<String> },
    /// Overview of the headline indices. A trailing symbol is accepted and ignored.
    Market { symbol: Option<String> },
    /// Realtime snapshot for an index.
    #[command(name = "index_realtime")]
    IndexRealtime { symbol: Option<String> },
    /// History cache maintenance.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(clap::Args)]
struct HistoryArgs {
    symbol: String,
    /// Start date (YYYY-MM-DD).
    start: String,
    /// End date (YYYY-MM-DD).
    end: String,
    /// daily, weekly or monthly. Defaults to daily.
    period: Option<String>,
}

#[derive(Subcommand)]
enum CacheAction {
    /// Report entry count, expired entries and bytes on disk.
    Status,
    /// Delete expired entries.
    Purge,
}

#[derive(Serialize)]
struct PurgeReply {
    success: bool,
    removed: usize,
}

fn main() {
    init_tracing();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            return;
        }
        Err(e) => {
            emit_or_log(&ErrorReply::new(clap_message(&e)));
            return;
        }
    };

    if let Err(e) = run(cli) {
        emit_or_log(&ErrorReply::new(format!("{e:#}")));
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .init();
}

/// First line of a clap error without the `error: ` prefix.
fn clap_message(e: &clap::Error) -> String {
    let rendered = e.to_string();
    let line = rendered.lines().next().unwrap_or_default();
    line.trim_start_matches("error: ").trim().to_string()
}

fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => FeedConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => FeedConfig::default(),
    };
    if let Some(dir) = cli.cache_dir {
        config.cache_dir = dir;
    }

    match cli.command {
        Commands::Stock(args) | Commands::Kline(args) => run_history(&config, args),
        Commands::Realtime { symbol } => {
            let code = required(symbol, "realtime requires a stock code")?;
            let provider = EastmoneyProvider::new(&config.provider)?;
            let mut service = realtime_service(&provider, &config);
            emit(&service.stock_quote(&code))
        }
        Commands::Tick { symbol } => {
            let code = required(symbol, "tick requires a stock code")?;
            let provider = EastmoneyProvider::new(&config.provider)?;
            let service = realtime_service(&provider, &config);
            emit(&service.ticks(&code))
        }
        Commands::IndexRealtime { symbol } => {
            let code = required(symbol, "index_realtime requires an index code")?;
            let provider = EastmoneyProvider::new(&config.provider)?;
            let mut service = realtime_service(&provider, &config);
            emit(&service.index_quote(&code))
        }
        Commands::Market { symbol: _ } => {
            let provider = EastmoneyProvider::new(&config.provider)?;
            let mut service = realtime_service(&provider, &config);
            emit(&service.market())
        }
        Commands::Cache { action } => {
            let cache = EnvelopeCache::new(&config.cache_dir, config.history_ttl());
            match action {
                CacheAction::Status => emit(&cache.stats(SystemTime::now())),
                CacheAction::Purge => {
                    let removed = cache.purge_expired(SystemTime::now());
                    emit(&PurgeReply {
                        success: true,
                        removed,
                    })
                }
            }
        }
    }
}

fn run_history(config: &FeedConfig, args: HistoryArgs) -> Result<()> {
    let period = match args.period.as_deref() {
        Some(raw) => raw.parse::<Period>()?,
        None => Period::default(),
    };

    let provider = EastmoneyProvider::new(&config.provider)?;
    let cache = EnvelopeCache::new(&config.cache_dir, config.history_ttl());
    let service = HistoryService::new(&provider, cache, config.range_policy());
    emit(&service.fetch(&args.symbol, &args.start, &args.end, period))
}

fn realtime_service<'a>(
    provider: &'a EastmoneyProvider,
    config: &FeedConfig,
) -> RealtimeService<'a> {
    RealtimeService::new(provider, config.realtime_ttl(), config.tick_count)
}

fn required(symbol: Option<String>, message: &str) -> Result<String> {
    match symbol {
        Some(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        _ => bail!("{message}"),
    }
}

fn emit<T: Serialize>(value: &T) -> Result<()> {
    write_json(&mut std::io::stdout().lock(), value)
}

/// Write one pretty JSON document. A closed pipe surfaces as an error, not a panic.
fn write_json<W: Write, T: Serialize>(out: &mut W, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize reply")?;
    writeln!(out, "{json}").context("failed to write reply")?;
    out.flush().context("failed to write reply")
}

fn emit_or_log<T: Serialize>(value: &T) {
    if let Err(e) = emit(value) {
        tracing::error!("{e:#}");
    }
}
