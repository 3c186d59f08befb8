use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::models::RawJob;
use crate::settings::Settings;

const ADZUNA_BASE_URL: &str = "https://api.adzuna.com/v1/api/jobs";

/// What to ask the search API for.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub location: Option<String>,
    /// Upper bound on page requests, at least 1.
    pub pages: u32,
}

impl SearchQuery {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            location: settings.search_location.clone(),
            pages: settings.scrape_num_pages,
        }
    }
}

/// Outcome of one page request that reached the server.
#[derive(Debug, Clone)]
pub enum PageResponse {
    Results(Vec<Value>),
    Failed { status: u16, body: String },
}

/// A paginated job search endpoint.
///
/// Callers are generic over the implementor and run on one task, so the
/// returned futures carry no `Send` bound.
#[allow(async_fn_in_trait)]
pub trait SearchApi {
    /// Request one 1-based page. `Err` means the request never got a response.
    async fn fetch_page(&self, page: u32, location: Option<&str>) -> Result<PageResponse>;
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Option<Vec<Value>>,
}

pub struct AdzunaClient {
    client: reqwest::Client,
    base_url: String,
    app_id: String,
    app_key: String,
    results_per_page: Option<u32>,
}

impl AdzunaClient {
    pub fn new(app_id: &str, app_key: &str, country: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: format!("{}/{}/search", ADZUNA_BASE_URL, country.trim()),
            app_id: app_id.to_string(),
            app_key: app_key.to_string(),
            results_per_page: None,
        }
    }

    pub fn from_settings(settings: &Settings) -> crate::error::Result<Self> {
        let (id, key) = settings.credentials()?;
        let mut client = Self::new(id, key, &settings.search_country);
        client.results_per_page = settings.results_per_page;
        Ok(client)
    }

    fn page_url(&self, page: u32) -> String {
        format!("{}/{}", self.base_url, page)
    }

    fn query_params(&self, location: Option<&str>) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("app_id", self.app_id.clone()),
            ("app_key", self.app_key.clone()),
        ];
        if let Some(n) = self.results_per_page {
            params.push(("results_per_page", n.to_string()));
        }
        if let Some(loc) = location.filter(|l| !l.trim().is_empty()) {
            params.push(("where", loc.to_string()));
        }
        params
    }
}

impl SearchApi for AdzunaClient {
    async fn fetch_page(&self, page: u32, location: Option<&str>) -> Result<PageResponse> {
        let url = self.page_url(page);
        debug!(%url, page, ?location, "Requesting search page");

        let resp = self
            .client
            .get(&url)
            .query(&self.query_params(location))
            .send()
            .await
            .with_context(|| format!("Request for page {} failed", page))?;

        let status = resp.status();
        if status != StatusCode::OK {
            let body = resp.text().await.unwrap_or_default();
            return Ok(PageResponse::Failed {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: SearchResponse = resp
            .json()
            .await
            .with_context(|| format!("Page {} returned an unreadable body", page))?;
        Ok(PageResponse::Results(parsed.results.unwrap_or_default()))
    }
}

/// Request pages 1..=query.pages in order and collect every result as
/// the server sent it.
///
/// The first failed page ends pagination; whatever was gathered before it
/// is returned.
pub async fn fetch_results<A: SearchApi>(api: &A, query: &SearchQuery) -> Vec<Value> {
    let pb = ProgressBar::new(query.pages as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} pages")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );

    let mut results = Vec::new();

    for page in 1..=query.pages {
        match api.fetch_page(page, query.location.as_deref()).await {
            Ok(PageResponse::Results(batch)) => {
                info!("Fetched {} jobs from page {}", batch.len(), page);
                results.extend(batch);
            }
            Ok(PageResponse::Failed { status, body }) => {
                warn!(
                    page,
                    status,
                    body = %truncate(&body, 200),
                    "Search page failed, stopping pagination"
                );
                break;
            }
            Err(e) => {
                warn!(page, "Search page failed, stopping pagination: {:#}", e);
                break;
            }
        }
        pb.inc(1);
    }

    pb.finish_and_clear();
    info!(total = results.len(), "Fetch finished");
    results
}

/// Like [`fetch_results`], keeping only results that read as job records.
pub async fn fetch_jobs<A: SearchApi>(api: &A, query: &SearchQuery) -> Vec<RawJob> {
    let results = fetch_results(api, query).await;
    let received = results.len();
    let jobs: Vec<RawJob> = results.into_iter().filter_map(RawJob::from_value).collect();
    let skipped = received - jobs.len();
    if skipped > 0 {
        warn!(skipped, "Skipped results that are not job records");
    }
    jobs
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}
