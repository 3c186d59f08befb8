use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use tracing::info;

use crate::db::{self, LoadReport};
use crate::render::{self, Listing};
use crate::scraper::{self, AdzunaClient, SearchApi, SearchQuery};
use crate::settings::Settings;
use crate::transform;

/// Where a run's cleaned batch goes. One per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Sink {
    /// Append rows to the `jobs` table at DB_URL
    Database,
    /// Write a searchable HTML page to OUTPUT_DIR
    Html,
}

#[derive(Debug)]
pub enum SinkOutcome {
    Database(LoadReport),
    Html(PathBuf),
}

#[derive(Debug)]
pub struct RunSummary {
    pub fetched: usize,
    pub cleaned: usize,
    pub outcome: SinkOutcome,
}

/// Full run against the live search API.
pub async fn run(settings: &Settings, sink: Sink, now: NaiveDateTime) -> Result<RunSummary> {
    // Fail on missing settings before any request goes out.
    let api = AdzunaClient::from_settings(settings)?;
    if sink == Sink::Database {
        settings.database_url()?;
    }
    run_with(&api, settings, sink, now).await
}

/// Fetch, clean, and hand the batch to `sink`.
pub async fn run_with<A: SearchApi>(
    api: &A,
    settings: &Settings,
    sink: Sink,
    now: NaiveDateTime,
) -> Result<RunSummary> {
    let query = SearchQuery::from_settings(settings);
    info!(pages = query.pages, location = ?query.location, ?sink, "Starting job pipeline");

    let raw = scraper::fetch_jobs(api, &query).await;
    let cleaned = transform::clean_jobs(&raw, now.date())?;

    let outcome = match sink {
        Sink::Database => {
            SinkOutcome::Database(db::append_jobs(settings.database_url()?, &cleaned))
        }
        Sink::Html => {
            let listings: Vec<Listing<'_>> = cleaned
                .iter()
                .map(|job| Listing {
                    source: &settings.source_label,
                    job,
                })
                .collect();
            SinkOutcome::Html(render::write_html(&settings.output_dir, &listings, now)?)
        }
    };

    Ok(RunSummary {
        fetched: raw.len(),
        cleaned: cleaned.len(),
        outcome,
    })
}

/// Fetch only and dump the results, exactly as received, to
/// `<output_dir>/jobs_data.json`.
pub async fn fetch_only<A: SearchApi>(api: &A, settings: &Settings) -> Result<(usize, PathBuf)> {
    let query = SearchQuery::from_settings(settings);
    let raw = scraper::fetch_results(api, &query).await;

    let dir = &settings.output_dir;
    std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {:?}", dir))?;
    let path = dir.join("jobs_data.json");
    let json = serde_json::to_string_pretty(&raw)?;
    std::fs::write(&path, json).with_context(|| format!("Failed to write {:?}", path))?;

    info!(path = %path.display(), records = raw.len(), "Saved raw jobs");
    Ok((raw.len(), path))
}
