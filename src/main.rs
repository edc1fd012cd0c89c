use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, CommandFactory, Parser, Subcommand};
use colored::Colorize;
use dialoguer::Confirm;
use tracing::error;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use emlak_match::config::Settings;
use emlak_match::core::{aggregate, Matcher};
use emlak_match::services::{
    BatchSummary, EngineError, InProcessQueue, JsonCatalog, MatchEngine, MatchRepository,
    MatchStore, MemoryStore, ScoringWorker,
};

#[derive(Parser)]
#[command(name = "emlak-match", version, about = "Property matching engine for the Emlak CRM")]
struct Cli {
    /// Configuration file overriding config/default.toml
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Score one request, or every active request
    Run(RunArgs),
    /// Re-enqueue stale requests and drain the scoring queue
    AutoCheck,
    /// Print global match statistics
    Stats,
}

#[derive(Args)]
struct RunArgs {
    /// Score a single request
    #[arg(long, value_name = "UUID", conflicts_with = "all")]
    request_id: Option<Uuid>,

    /// Score every active request
    #[arg(long)]
    all: bool,
}

type Engine = MatchEngine<MemoryStore, MemoryStore, MemoryStore>;

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let Some(command) = cli.command else {
        let _ = Cli::command().print_help();
        return ExitCode::FAILURE;
    };

    let settings = match load_settings(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{} failed to load configuration: {e}", "error:".red().bold());
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&settings);

    match run(command, settings).await {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            eprintln!("{} {e:#}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

fn load_settings(path: Option<&std::path::Path>) -> Result<Settings, config::ConfigError> {
    match path {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    }
}

fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.logging.level.clone()));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    if settings.logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.init();
    }
}

async fn run(command: Command, settings: Settings) -> anyhow::Result<ExitCode> {
    let catalog = JsonCatalog::open(&settings.data.dir)
        .await
        .with_context(|| format!("opening catalog at `{}`", settings.data.dir))?;

    let store = catalog.store();
    let matcher = Matcher::new(
        settings.scoring.weights.clone().into(),
        settings.matching.tolerance,
    );
    let engine: Arc<Engine> = Arc::new(MatchEngine::new(
        Arc::clone(&store),
        Arc::clone(&store),
        MatchStore::new(Arc::clone(&store), settings.matching.threshold),
        matcher,
        settings.matching.engine_options(),
    ));

    match command {
        Command::Run(args) => match (args.request_id, args.all) {
            (Some(request_id), false) => run_single(&engine, &catalog, request_id, &settings).await,
            (None, true) => run_all(&engine, &catalog).await,
            _ => {
                eprintln!("{} `run` needs either --request-id <UUID> or --all", "error:".red().bold());
                Ok(ExitCode::FAILURE)
            }
        },
        Command::AutoCheck => auto_check(&engine, &catalog).await,
        Command::Stats => stats(&store).await,
    }
}

async fn run_single(
    engine: &Arc<Engine>,
    catalog: &JsonCatalog,
    request_id: Uuid,
    settings: &Settings,
) -> anyhow::Result<ExitCode> {
    let ranked = match engine.score_request(request_id, true).await {
        Ok(ranked) => ranked,
        Err(e @ (EngineError::RequestNotFound(_) | EngineError::RequestNotActive(_))) => {
            eprintln!("{} {e}", "error:".red().bold());
            return Ok(ExitCode::FAILURE);
        }
        Err(e) => return Err(e.into()),
    };

    catalog.flush().await.context("flushing catalog")?;

    println!(
        "request {}: {} candidates, {} ranked, {} persisted",
        request_id,
        ranked.total_candidates,
        ranked.ranked.len(),
        ranked.persisted
    );
    println!();

    if ranked.ranked.is_empty() {
        println!("no feasible listings for this request");
        return Ok(ExitCode::SUCCESS);
    }

    println!(
        "{}",
        format!(
            "{:<36}  {:<12}  {:<28}  {:>6}  {:>14}  {:>9}",
            "listing", "type", "title", "score", "price", "area"
        )
        .bold()
    );
    for candidate in ranked.ranked.iter().take(settings.matching.top_n) {
        println!(
            "{:<36}  {:<12}  {:<28}  {}  {:>14.0}  {:>9.1}",
            candidate.listing_id,
            candidate.category.label(),
            truncate(&candidate.title, 28),
            paint_score(candidate.score()),
            candidate.price,
            candidate.area,
        );
    }

    Ok(ExitCode::SUCCESS)
}

async fn run_all(engine: &Arc<Engine>, catalog: &JsonCatalog) -> anyhow::Result<ExitCode> {
    let progress = |processed: usize, total: usize| {
        eprint!("\rscoring {processed}/{total}");
    };

    let summary = engine.score_all_active(Some(&progress)).await?;
    eprintln!();

    catalog.flush().await.context("flushing catalog")?;

    println!("{}", "batch summary".bold());
    println!("  requests processed:    {}", summary.processed);
    println!("  succeeded / failed:    {} / {}", summary.succeeded(), summary.failed());
    println!("  matches written:       {}", summary.total_matches());
    println!("  requests with matches: {}", summary.requests_with_matches());
    println!("  mean top score:        {:.3}", summary.mean_top_score());

    if !summary.outcomes.is_empty() && confirm_detail() {
        print_batch_detail(&summary);
    }

    // Per-item failures are part of the summary, not a process failure.
    Ok(ExitCode::SUCCESS)
}

fn confirm_detail() -> bool {
    Confirm::new()
        .with_prompt("Show per-request detail?")
        .default(false)
        .interact()
        .unwrap_or(false)
}

fn print_batch_detail(summary: &BatchSummary) {
    println!();
    println!(
        "{}",
        format!("{:<36}  {:>7}  {:>9}  {}", "request", "matches", "top", "error").bold()
    );
    for outcome in &summary.outcomes {
        let top = outcome
            .top_score
            .map_or_else(|| format!("{:>9}", "-"), |s| format!("{s:>9.3}"));
        let error = outcome.error.as_deref().unwrap_or("-");
        println!(
            "{:<36}  {:>7}  {}  {}",
            outcome.request_id,
            outcome.matches,
            top,
            if outcome.error.is_some() {
                error.red().to_string()
            } else {
                error.to_string()
            }
        );
    }
}

async fn auto_check(engine: &Arc<Engine>, catalog: &JsonCatalog) -> anyhow::Result<ExitCode> {
    let (queue, rx) = InProcessQueue::new();

    let summary = engine.auto_check(&queue).await?;
    drop(queue);

    let worker = ScoringWorker::new(Arc::clone(engine), rx);
    let drained = worker.run().await;

    catalog.flush().await.context("flushing catalog")?;

    println!(
        "auto-check: {} active requests scanned, {} enqueued, {} scored",
        summary.scanned,
        summary.enqueued.len(),
        drained
    );

    Ok(ExitCode::SUCCESS)
}

async fn stats(store: &Arc<MemoryStore>) -> anyhow::Result<ExitCode> {
    let matches = store.find_all().await?;
    let stats = aggregate(&matches);

    println!("{}", "match statistics".bold());
    println!("  live matches:        {}", stats.total);
    println!("  high   (>= 0.80):    {}", stats.high);
    println!("  medium (0.50-0.79):  {}", stats.medium);
    println!("  low    (< 0.50):     {}", stats.low);
    println!("  presented:           {}", stats.presented);
    println!("  awaiting review:     {}", stats.fresh);
    println!("  max score:           {:.3}", stats.max_score);
    println!("  mean score:          {:.3}", stats.mean_score);

    Ok(ExitCode::SUCCESS)
}

fn paint_score(score: f64) -> String {
    let cell = format!("{score:>6.3}");
    if score >= 0.8 {
        cell.green().to_string()
    } else if score >= 0.5 {
        cell.yellow().to_string()
    } else {
        cell
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        format!("{text:<width$}")
    } else {
        let cut: String = text.chars().take(width - 1).collect();
        format!("{cut}…")
    }
}
