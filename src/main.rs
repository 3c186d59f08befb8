mod db;
mod error;
mod models;
mod pipeline;
mod render;
mod scraper;
mod settings;
mod transform;

use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::db::LoadReport;
use crate::pipeline::{Sink, SinkOutcome};
use crate::settings::Settings;

#[derive(Parser)]
#[command(name = "job_etl", about = "Job postings ETL: Adzuna search -> SQLite or HTML")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, clean, and load jobs into one sink
    Run {
        /// Destination for the cleaned batch
        #[arg(short, long, value_enum, default_value_t = Sink::Database)]
        sink: Sink,
        /// Pages to request (default: SCRAPE_NUM_PAGES)
        #[arg(short = 'n', long)]
        pages: Option<u32>,
        /// Location filter (default: SEARCH_LOCATION)
        #[arg(short, long)]
        location: Option<String>,
    },
    /// Fetch only and save raw results to OUTPUT_DIR/jobs_data.json
    Fetch {
        #[arg(short = 'n', long)]
        pages: Option<u32>,
        #[arg(short, long)]
        location: Option<String>,
    },
    /// Show effective settings
    Config,
}

fn init_tracing(default_level: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.to_lowercase().into()),
        )
        .try_init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::from_env().context("Failed to load settings")?;
    init_tracing(&settings.log_level);

    let t0 = Instant::now();

    let result = match cli.command {
        Commands::Run {
            sink,
            pages,
            location,
        } => {
            let settings = settings.with_pages(pages)?.with_location(location);
            println!(
                "Starting job pipeline ({} page(s), sink: {:?})...",
                settings.scrape_num_pages, sink
            );
            let now = chrono::Local::now().naive_local();
            let summary = pipeline::run(&settings, sink, now)
                .await
                .context("Error in pipeline")?;

            println!(
                "Fetched {} jobs, {} after cleaning.",
                summary.fetched, summary.cleaned
            );
            match summary.outcome {
                SinkOutcome::Database(LoadReport::Inserted(n)) => {
                    println!("Loaded {} rows into the jobs table.", n)
                }
                SinkOutcome::Database(LoadReport::Skipped) => println!("No data to load."),
                SinkOutcome::Database(LoadReport::Failed(e)) => {
                    println!("Load failed, nothing was written: {}", e)
                }
                SinkOutcome::Html(path) => println!("Wrote {}", path.display()),
            }
            Ok(())
        }
        Commands::Fetch { pages, location } => {
            let settings = settings.with_pages(pages)?.with_location(location);
            let api = scraper::AdzunaClient::from_settings(&settings)?;
            let (n, path) = pipeline::fetch_only(&api, &settings).await?;
            println!("Saved {} raw jobs to {}", n, path.display());
            Ok(())
        }
        Commands::Config => {
            println!("{}", settings);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
