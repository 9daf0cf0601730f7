//! QuoteLab CLI: extract, store, and analyze portfolio quotes.
//!
//! Commands:
//! - `run`: extract a portfolio (optionally with history), persist, report
//! - `quote`: extract and persist a single symbol
//! - `history`: print the stored rows of one symbol
//! - `snapshot`: latest stored quote per symbol with summary and movers
//! - `trends`: moving-average trends and rankings from stored history
//! - `health`: database, provider and last-run status

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use quotelab_core::analytics::{
    detect_trends, liquidity_ranking, summarize, top_movers, volatility_ranking, Summary,
    TopMovers,
};
use quotelab_core::extract::ThreadSleeper;
use quotelab_core::{Quote, Symbol};
use quotelab_runner::report::TOP_MOVERS;
use quotelab_runner::{
    build_processor, open_store, save_report, PipelineConfig, PortfolioReport, ProviderKind,
    RunStats,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "quotelab",
    about = "QuoteLab CLI: resilient quote extraction, storage and analytics"
)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
    /// Path to a TOML pipeline config. Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database path (overrides the config).
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Quote provider: yahoo, alpha_vantage or offline (overrides the config).
    #[arg(long, global = true)]
    provider: Option<ProviderKind>,

    /// Offline mode: no network access, synthetic quotes only.
    #[arg(long, global = true, default_value_t = false)]
    offline: bool,

    /// RNG seed for reproducible jitter and synthetic data.
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Log level (trace, debug, info, warn, error). RUST_LOG takes precedence.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract, persist and report a portfolio.
    Run {
        /// Symbols to process. Defaults to the configured portfolio.
        symbols: Vec<String>,

        /// Fetch the daily series per symbol and compute trends from it.
        #[arg(long, default_value_t = false)]
        history: bool,

        /// Write report.json and CSV files under this directory.
        #[arg(long)]
        export_dir: Option<PathBuf>,

        /// Print the full report as JSON instead of the text summary.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Extract and persist the latest quote for one symbol.
    Quote {
        symbol: String,

        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print stored rows for one symbol, oldest first.
    History {
        symbol: String,

        /// Only the most recent N rows.
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Latest stored quote per symbol, with summary and top movers.
    Snapshot {
        /// Also list the N most recently captured rows.
        #[arg(long)]
        recent: Option<usize>,

        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Trend signals and risk/liquidity rankings from stored history.
    Trends {
        /// Symbols to analyze. Defaults to every symbol in the database.
        symbols: Vec<String>,

        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Database, provider and last-run status.
    Health,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.global.log_level);

    let config = load_config(&cli.global)?;
    tracing::debug!(
        database = %config.database.display(),
        provider = ?config.provider,
        "configuration loaded"
    );

    match cli.command {
        Commands::Run {
            symbols,
            history,
            export_dir,
            json,
        } => run_portfolio(&config, symbols, history, export_dir, json),
        Commands::Quote { symbol, json } => run_quote(&config, &symbol, json),
        Commands::History { symbol, limit } => run_history(&config, &symbol, limit),
        Commands::Snapshot { recent, json } => run_snapshot(&config, recent, json),
        Commands::Trends { symbols, json } => run_trends(&config, symbols, json),
        Commands::Health => run_health(&config),
    }
}

fn init_tracing(level: &str) {
    // Logs go to stderr so `--json` output on stdout stays machine-readable.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("quotelab_core={level},quotelab_runner={level},quotelab={level}").into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Config file (or defaults) with command-line overrides applied.
fn load_config(args: &GlobalArgs) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(db) = &args.db {
        config.database = db.clone();
    }
    if let Some(provider) = args.provider {
        config.provider = provider;
    }
    if args.offline {
        config.provider = ProviderKind::Offline;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    config.validate()?;
    Ok(config)
}

fn run_portfolio(
    config: &PipelineConfig,
    symbols: Vec<String>,
    with_history: bool,
    export_dir: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let symbols = if symbols.is_empty() {
        config.portfolio.clone()
    } else {
        symbols
    };
    if symbols.is_empty() {
        bail!("no symbols given and the configured portfolio is empty");
    }

    let store = open_store(config)?;
    let mut processor = build_processor(config, store, Arc::new(ThreadSleeper))?;

    let (report, history) = if with_history {
        let run = processor.process_with_history(&symbols)?;
        let history = run.history.clone();
        (PortfolioReport::from_run(run, Utc::now()), history)
    } else {
        let quotes = processor.process(&symbols)?;
        let stats = processor.last_stats().clone();
        (
            PortfolioReport::build(quotes, &[], Some(stats), Utc::now()),
            Vec::new(),
        )
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if let Some(dir) = export_dir {
        let paths = save_report(&report, &history, &dir)?;
        if !json {
            println!("Report saved to: {}", paths.dir.display());
        }
    }
    Ok(())
}

fn run_quote(config: &PipelineConfig, symbol: &str, json: bool) -> Result<()> {
    let store = open_store(config)?;
    let mut processor = build_processor(config, store, Arc::new(ThreadSleeper))?;
    let quotes = processor.process(&[symbol])?;
    let quote = quotes.first().context("processor returned no quote")?;

    if json {
        println!("{}", serde_json::to_string_pretty(quote)?);
    } else {
        print_quote_table(std::slice::from_ref(quote));
        if processor.last_stats().storage_errors > 0 {
            println!("WARNING: quote could not be saved to {}", config.database.display());
        }
    }
    Ok(())
}

fn run_history(config: &PipelineConfig, symbol: &str, limit: Option<usize>) -> Result<()> {
    let symbol = Symbol::parse(symbol)?;
    let store = open_store(config)?;
    let rows = store.history(&symbol)?;
    if rows.is_empty() {
        println!("No stored quotes for {symbol}.");
        return Ok(());
    }
    let start = limit.map_or(0, |n| rows.len().saturating_sub(n));
    print_quote_table(&rows[start..]);
    Ok(())
}

fn run_snapshot(config: &PipelineConfig, recent: Option<usize>, json: bool) -> Result<()> {
    let store = open_store(config)?;
    let latest = store.query_latest_per_symbol()?;
    let recent_rows = match recent {
        Some(n) => store.query_latest(n)?,
        None => Vec::new(),
    };

    if json {
        let report = PortfolioReport::build(latest, &[], None, Utc::now());
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if latest.is_empty() {
        println!("Database is empty: {}", config.database.display());
        return Ok(());
    }

    println!();
    println!("=== Latest Quotes ===");
    print_quote_table(&latest);
    print_summary(&summarize(&latest));
    print_movers(&top_movers(&latest, TOP_MOVERS));

    if !recent_rows.is_empty() {
        println!("--- Most Recently Captured ---");
        print_quote_table(&recent_rows);
    }
    Ok(())
}

fn run_trends(config: &PipelineConfig, symbols: Vec<String>, json: bool) -> Result<()> {
    let store = open_store(config)?;
    let symbols: Vec<Symbol> = if symbols.is_empty() {
        store
            .query_latest_per_symbol()?
            .into_iter()
            .map(|q| q.symbol)
            .collect()
    } else {
        Symbol::parse_all(&symbols)?
    };

    let mut history: Vec<Quote> = Vec::new();
    for symbol in &symbols {
        history.extend(store.history(symbol)?);
    }
    if history.is_empty() {
        println!("No stored history. Run `quotelab run --history` first.");
        return Ok(());
    }

    let trends = detect_trends(&history);
    let volatility = volatility_ranking(&history);
    let liquidity = liquidity_ranking(&history);

    if json {
        let value = serde_json::json!({
            "trends": trends,
            "volatility": volatility,
            "liquidity": liquidity,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!();
    println!("=== Trend Signals ===");
    println!(
        "{:<10} {:>10} {:>10} {:>10}  {:<20} {:<6}",
        "Symbol", "Price", "MA7", "MA21", "Trend", "Action"
    );
    for t in &trends {
        println!(
            "{:<10} {:>10.2} {:>10} {:>10}  {:<20} {:<6}",
            t.symbol.as_str(),
            t.current_price,
            fmt_opt(t.short_ma),
            fmt_opt(t.long_ma),
            t.classification.label(),
            t.action.to_string()
        );
    }

    println!();
    println!("--- Volatility (std of daily change) ---");
    for v in &volatility {
        println!(
            "{:<10} {:>8}  {}",
            v.symbol.as_str(),
            fmt_opt(v.std_change),
            v.risk.as_str()
        );
    }

    println!();
    println!("--- Liquidity (mean volume) ---");
    for l in &liquidity {
        println!(
            "{:<10} {:>14.0}  {}",
            l.symbol.as_str(),
            l.mean_volume,
            l.liquidity.as_str()
        );
    }
    println!();
    Ok(())
}

fn run_health(config: &PipelineConfig) -> Result<()> {
    let store = open_store(config)?;
    let rows = store.count()?;
    let key_status = match config.provider {
        ProviderKind::AlphaVantage if config.resolve_api_key().is_none() => "missing API key",
        _ => "ok",
    };
    println!("Status:    healthy");
    println!("Database:  {}", config.database.display());
    println!("Rows:      {rows}");
    println!("Provider:  {:?} ({key_status})", config.provider);
    match store.last_run()? {
        Some(run) => {
            println!(
                "Last Run:  {} {} via {} at {}",
                run.operation,
                run.status(),
                run.provider,
                run.finished_at.to_rfc3339()
            );
            println!(
                "           {} symbols ({} real, {} synthetic), {} rows written, {} storage errors, {:.1}s",
                run.symbols,
                run.real,
                run.synthetic,
                run.rows_written,
                run.storage_errors,
                run.elapsed_secs
            );
        }
        None => println!("Last Run:  none recorded"),
    }
    println!("Timestamp: {}", Utc::now().to_rfc3339());
    Ok(())
}

// ─── Output ─────────────────────────────────────────────────────────

fn print_report(report: &PortfolioReport) {
    println!();
    println!("=== Portfolio Run ===");
    print_quote_table(&report.quotes);
    if let Some(stats) = &report.stats {
        print_stats(stats);
    }
    print_summary(&report.summary);
    print_movers(&report.top_movers);

    if report.trends.iter().any(|t| t.long_ma.is_some()) {
        println!("--- Trends ---");
        for t in &report.trends {
            println!(
                "{:<10} {:<20} {}",
                t.symbol.as_str(),
                t.classification.label(),
                t.action
            );
        }
        println!();
    }

    if report.has_synthetic {
        println!("WARNING: some quotes are SYNTHETIC (see the Source column)");
        println!();
    }
}

fn print_quote_table(quotes: &[Quote]) {
    println!(
        "{:<10} {:<28} {:>10} {:>8} {:>12} {:<11} {:<13}",
        "Symbol", "Company", "Price", "Change", "Volume", "Date", "Source"
    );
    for q in quotes {
        println!(
            "{:<10} {:<28} {:>10.2} {:>7.2}% {:>12} {:<11} {:<13}",
            q.symbol.as_str(),
            truncate(&q.company_name, 28),
            q.price,
            q.change_percent,
            q.volume,
            q.observed_date.to_string(),
            q.source.as_str()
        );
    }
    println!();
}

fn print_stats(stats: &RunStats) {
    println!("--- Run ---");
    println!("Symbols:        {}", stats.total);
    println!("Real:           {}", stats.real);
    println!("Synthetic:      {}", stats.synthetic);
    println!("Rows Written:   {}", stats.rows_written);
    if stats.storage_errors > 0 {
        println!("Storage Errors: {}", stats.storage_errors);
    }
    println!("Elapsed:        {:.1}s", stats.elapsed.as_secs_f64());
    println!();
}

fn print_summary(summary: &Summary) {
    println!("--- Summary ---");
    println!("Assets:         {}", summary.total_assets);
    println!("Avg Price:      {}", fmt_opt(summary.average_price));
    println!("Avg Change:     {}%", fmt_opt(summary.average_change));
    println!("Total Volume:   {}", summary.total_volume);
    println!("Total Value:    {:.2}", summary.total_value);
    if let Some(best) = &summary.best {
        println!("Best:           {} ({:+.2}%)", best.symbol, best.change_percent);
    }
    if let Some(worst) = &summary.worst {
        println!("Worst:          {} ({:+.2}%)", worst.symbol, worst.change_percent);
    }
    for rec in &summary.recommendations {
        println!(
            "Signal:         {} {} ({:+.2}%)",
            rec.symbol,
            rec.kind.label(),
            rec.change_percent
        );
    }
    println!();
}

fn print_movers(movers: &TopMovers) {
    if movers.gainers.is_empty() {
        return;
    }
    println!("--- Top Movers ---");
    for p in &movers.gainers {
        println!("  up    {:<10} {:+.2}%", p.symbol.as_str(), p.change_percent);
    }
    for p in &movers.losers {
        println!("  down  {:<10} {:+.2}%", p.symbol.as_str(), p.change_percent);
    }
    println!();
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}"))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}
