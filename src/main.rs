//! # trend_lens
//!
//! Tracks how often strategic technology concepts appear in news headlines.
//! Headlines are collected from a listing page, segmented into words,
//! mapped onto concepts through a synonym table, counted, and charted.
//!
//! ## Features
//!
//! - Collects headlines from configurable pages (36Kr by default)
//! - Three tokenization modes: dictionary segmentation for Chinese, plain
//!   words, and stemmed words with stop-word removal
//! - Two matching policies: exact synonym-table lookup and stemmed keywords
//! - Renders PNG or SVG bar charts, locally or to an S3-compatible bucket
//!   with time-limited signed URLs
//! - Weekly job that chains collection and analysis
//!
//! ## Usage
//!
//! ```sh
//! trend_lens analyze 36kr_headlines.txt --keywords 数字化 人工智能 SaaS
//! trend_lens weekly --output-dir ./weekly
//! ```
//!
//! ## Architecture
//!
//! The analysis is a straight pipeline:
//! 1. **Normalize**: lower-case, strip punctuation, mark separators
//! 2. **Tokenize**: split with the selected strategy
//! 3. **Count**: resolve tokens to concepts and count them
//! 4. **Render**: draw the chart and persist it

use chrono::Local;
use clap::Parser;
use std::error::Error;
use std::path::PathBuf;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod analysis;
mod cli;
mod config;
mod error;
mod models;
mod outputs;
mod pipeline;
mod scrapers;
mod utils;

use cli::{Cli, Command};
use config::AppConfig;
use models::AnalysisReport;
use outputs::chart::{ChartFormat, ChartRenderer};
use pipeline::{run_analysis, run_scrape, run_weekly, AnalyzeRequest};
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("trend_lens starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(?args.config, ?args.command, "Parsed CLI arguments");

    // ---- Load config (once; passed by reference from here on) ----
    let mut config = AppConfig::load(args.config.as_deref())?.with_storage_overrides(
        args.bucket_name,
        args.region,
        args.endpoint,
    );

    match args.command {
        Command::Analyze(analyze) => {
            if !analyze.remote {
                config.chart.format = ChartFormat::from_path(&analyze.output, config.chart.format);
            }
            let renderer = ChartRenderer::new(&config.chart)?;
            let request = AnalyzeRequest {
                input: analyze.input_source(),
                keywords: analyze.keywords.clone(),
                output: analyze.output_target(),
                mode: analyze.mode.unwrap_or(config.analysis.mode),
                policy: analyze.policy.unwrap_or(config.analysis.policy),
            };

            let outcome = run_analysis(&config, &renderer, &request).await;
            let report = match &outcome {
                Ok(report) => report.clone(),
                Err(e) => {
                    error!(error = %e, "Analysis failed");
                    AnalysisReport::failure(e)
                }
            };
            if analyze.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else if let Some(data) = &report.data {
                for (concept, count) in data.analysis_results.iter() {
                    println!("{concept}\t{count}");
                }
                println!("chart: {}", data.chart_url);
            }
            outcome?;
        }
        Command::Scrape { output, upload } => {
            let count = run_scrape(&config, &output, upload).await?;
            println!("Collected {count} headlines into {}", output.display());
        }
        Command::Weekly {
            keywords,
            output_dir,
            upload,
        } => {
            if let Err(e) = ensure_writable_dir(&output_dir).await {
                error!(
                    path = %output_dir.display(),
                    error = %e,
                    "Weekly output directory is not writable (fix perms or choose a different path)"
                );
                return Err(e);
            }
            let keywords = if keywords.is_empty() {
                config.analysis.keywords.clone()
            } else {
                keywords
            };
            let renderer = ChartRenderer::new(&config.chart)?;
            let run = run_weekly(&config, &renderer, &output_dir, keywords, upload).await?;

            let report_json = PathBuf::from(&output_dir).join(&run.date).join("report.json");
            println!("Headlines: {} ({} lines)", run.headlines_file, run.headline_count);
            match &run.report.data {
                Some(data) if run.report.is_success() => println!("Chart: {}", data.chart_url),
                _ => println!("Analysis: {}", run.report.message),
            }
            println!("Report: {}", report_json.display());
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        finished_at = %Local::now().to_rfc3339(),
        "Execution complete"
    );

    Ok(())
}
