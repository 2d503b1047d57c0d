//! Screenshot Judge CLI
//!
//! Scores predicted webpage screenshots against their ground truth with a
//! multimodal LLM and summarizes the results.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use screenshot_judge::{
    cache::ResultCache,
    config::Config,
    fetcher::ScoreFetcher,
    images::ImageSource,
    llm::LlmClient,
    metrics::CategoryScores,
    pipeline::{RunReport, run_evaluation, summarize},
    rubric::parse_records,
};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Screenshot Judge - LLM-scored visual similarity of webpage screenshots
#[derive(Parser)]
#[command(name = "screenshot-judge")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score predicted screenshots against ground truth
    Evaluate {
        /// Ground-truth screenshots: a directory, a JSON id-to-path map, or files
        #[arg(long = "ground-truth", num_args = 1.., required = true)]
        ground_truth: Vec<PathBuf>,

        /// Predicted screenshots: a directory, a JSON id-to-path map, or files
        #[arg(long, num_args = 1.., required = true)]
        predicted: Vec<PathBuf>,

        /// Directory for the cache and the summary report
        #[arg(short, long, default_value = "data/vision_eval")]
        output_dir: PathBuf,

        /// API key (overrides LLM_API_KEY and the config file)
        #[arg(long)]
        api_key: Option<String>,

        /// Model name (overrides LLM_MODEL and the config file)
        #[arg(long)]
        model: Option<String>,

        /// Attempts per pair before giving up
        #[arg(long)]
        max_attempts: Option<u32>,

        /// Seconds to wait between attempts
        #[arg(long)]
        retry_delay: Option<u64>,

        /// Discard cached results and score every pair again
        #[arg(long)]
        clear_cache: bool,
    },

    /// Recompute the summary from cached results without new requests
    Summarize {
        #[arg(short, long, default_value = "data/vision_eval")]
        output_dir: PathBuf,
    },

    /// Show per-screenshot rubrics from the cache
    Show {
        #[arg(short, long, default_value = "data/vision_eval")]
        output_dir: PathBuf,

        /// Output as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Test LLM connection
    Test,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Evaluate {
            ground_truth,
            predicted,
            output_dir,
            api_key,
            model,
            max_attempts,
            retry_delay,
            clear_cache,
        } => {
            let mut config = Config::load().context("Failed to load configuration")?;
            if let Some(key) = api_key {
                config.llm.api_key = key;
            }
            if let Some(model) = model {
                config.llm.model = model;
            }
            if let Some(attempts) = max_attempts {
                config.retry.max_attempts = attempts;
            }
            if let Some(delay) = retry_delay {
                config.retry.retry_delay_secs = delay;
            }
            cmd_evaluate(config, ground_truth, predicted, output_dir, clear_cache).await
        }
        Commands::Summarize { output_dir } => cmd_summarize(output_dir),
        Commands::Show { output_dir, json } => cmd_show(output_dir, json),
        Commands::Test => cmd_test().await,
    }
}

async fn cmd_evaluate(
    config: Config,
    ground_truth: Vec<PathBuf>,
    predicted: Vec<PathBuf>,
    output_dir: PathBuf,
    clear_cache: bool,
) -> Result<()> {
    config.validate().context("Invalid configuration")?;

    let ground_truth =
        ImageSource::from_paths(ground_truth).context("Invalid ground-truth source")?;
    let predicted = ImageSource::from_paths(predicted).context("Invalid predicted source")?;

    if clear_cache {
        ResultCache::in_dir(&output_dir)
            .clear()
            .context("Failed to clear cache")?;
    }

    println!("Using model: {}", config.llm.model);
    println!(
        "Retry policy: {} attempt(s), {}s apart",
        config.retry.max_attempts, config.retry.retry_delay_secs
    );

    let fetcher = ScoreFetcher::from_config(&config).context("Failed to create LLM client")?;

    let start = Instant::now();
    let report = run_evaluation(&fetcher, &ground_truth, &predicted, &output_dir)
        .await
        .context("Evaluation failed")?;

    if let Some(stats) = &report.stats {
        println!("\nEvaluation finished in {:.2?}", start.elapsed());
        println!("  Predicted screenshots: {}", stats.total);
        println!("  Already cached:        {}", stats.cached);
        println!("  Newly scored:          {}", stats.fetched);
        println!("  Missing ground truth:  {}", stats.missing_ground_truth);
        println!("  Encoding failures:     {}", stats.encoding_failures);
        println!("  Request failures:      {}", stats.fetch_failures);
        if stats.other_failures > 0 {
            println!("  Other failures:        {}", stats.other_failures);
        }
    }

    print_report(&report);
    Ok(())
}

fn cmd_summarize(output_dir: PathBuf) -> Result<()> {
    let cache = ResultCache::in_dir(&output_dir);
    if !cache.exists() {
        anyhow::bail!(
            "No cached results at '{}'. Run 'evaluate' first.",
            cache.path().display()
        );
    }

    let report = summarize(&output_dir).context("Failed to summarize cached results")?;
    print_report(&report);
    Ok(())
}

fn print_report(report: &RunReport) {
    println!("\nSummary ({} of {} cached results parsed):", report.scored, report.records);
    println!("{}", "─".repeat(50));
    print!("{}", report.summary.to_report());
    println!("{}", "─".repeat(50));
    if report.parse_failures > 0 {
        println!(
            "{} result(s) could not be parsed and were left out.",
            report.parse_failures
        );
    }
    println!("Cache:   {}", report.cache_path.display());
    println!("Summary: {}", report.summary_path.display());
}

fn cmd_show(output_dir: PathBuf, json: bool) -> Result<()> {
    let cache = ResultCache::in_dir(&output_dir);
    if !cache.exists() {
        anyhow::bail!(
            "No cached results at '{}'. Run 'evaluate' first.",
            cache.path().display()
        );
    }

    let records = cache.load().context("Failed to load cache")?;
    let parsed = parse_records(&records);

    if json {
        let json_str =
            serde_json::to_string_pretty(&parsed.rubrics).context("Failed to serialize rubrics")?;
        println!("{}", json_str);
        return Ok(());
    }

    println!(
        "{:<30} {:>8} {:>8} {:>8} {:>8}  scores",
        "image_id", "visual", "color", "text", "ui"
    );
    println!("{}", "─".repeat(90));
    for (image_id, rubric) in &parsed.rubrics {
        let categories = CategoryScores::of(rubric);
        println!(
            "{:<30} {:>8.2} {:>8.2} {:>8.2} {:>8.2}  {}",
            image_id,
            categories.visual_structure,
            categories.color_aesthetic,
            categories.textual_content,
            categories.user_interface,
            rubric
        );
    }
    for failure in &parsed.failures {
        println!("  ! {}", failure);
    }

    Ok(())
}

async fn cmd_test() -> Result<()> {
    println!("Testing LLM connection...\n");

    let config = Config::load().context("Failed to load configuration")?;

    println!("Configuration:");
    println!("  API Base:  {}", config.llm.api_base);
    println!("  Model:     {}", config.llm.model);
    println!(
        "  API Key:   {}...",
        config.llm.api_key.chars().take(8).collect::<String>()
    );
    println!();

    if let Err(e) = config.validate() {
        println!("Configuration error: {}", e);
        return Ok(());
    }

    let client = LlmClient::new(config.llm).context("Failed to create LLM client")?;

    println!("Sending test request...");
    match client.test_connection().await {
        Ok(()) => {
            println!("Connection successful!");
        }
        Err(e) => {
            println!("Connection failed: {}", e);
        }
    }

    Ok(())
}
