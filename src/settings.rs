use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use config::{Config, Environment};
use serde::Deserialize;

use crate::error::{EtlError, Result};

pub const DEFAULT_SOURCE_LABEL: &str = "Adzuna";

/// Runtime settings, read once at startup and handed to each component.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Adzuna application id.
    #[serde(default)]
    pub app_id: Option<String>,
    /// Adzuna application key.
    #[serde(default)]
    pub app_key: Option<String>,
    /// Relational store location, e.g. `sqlite:///data/jobs.sqlite`.
    #[serde(default)]
    pub db_url: Option<String>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Number of result pages to request per run.
    #[serde(default = "default_pages")]
    pub scrape_num_pages: u32,
    #[serde(default)]
    pub search_location: Option<String>,
    #[serde(default = "default_country")]
    pub search_country: String,
    #[serde(default)]
    pub results_per_page: Option<u32>,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_source_label")]
    pub source_label: String,
}

fn default_log_level() -> String {
    "info".into()
}

fn default_pages() -> u32 {
    1
}

fn default_country() -> String {
    "us".into()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_source_label() -> String {
    DEFAULT_SOURCE_LABEL.into()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_id: None,
            app_key: None,
            db_url: None,
            log_level: default_log_level(),
            scrape_num_pages: default_pages(),
            search_location: None,
            search_country: default_country(),
            results_per_page: None,
            output_dir: default_output_dir(),
            source_label: default_source_label(),
        }
    }
}

impl Settings {
    /// Load from `.env` (if present) and the process environment.
    pub fn from_env() -> Result<Self> {
        // A missing .env file is normal in production.
        let _ = dotenvy::dotenv();
        Self::build(Environment::default())
    }

    /// Load from an explicit variable map instead of the process environment.
    pub fn from_map(vars: HashMap<String, String>) -> Result<Self> {
        Self::build(Environment::default().source(Some(vars)))
    }

    fn build(env: Environment) -> Result<Self> {
        let settings: Settings = Config::builder()
            .add_source(env)
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.scrape_num_pages == 0 {
            return Err(EtlError::InvalidSetting {
                key: "SCRAPE_NUM_PAGES",
                reason: "must be at least 1".into(),
            });
        }
        if self.results_per_page == Some(0) {
            return Err(EtlError::InvalidSetting {
                key: "RESULTS_PER_PAGE",
                reason: "must be at least 1".into(),
            });
        }
        if self.search_country.trim().is_empty() {
            return Err(EtlError::InvalidSetting {
                key: "SEARCH_COUNTRY",
                reason: "must not be empty".into(),
            });
        }
        Ok(())
    }

    /// Application id and key, both required before talking to the API.
    pub fn credentials(&self) -> Result<(&str, &str)> {
        let id = require(self.app_id.as_deref(), "APP_ID")?;
        let key = require(self.app_key.as_deref(), "APP_KEY")?;
        Ok((id, key))
    }

    pub fn database_url(&self) -> Result<&str> {
        require(self.db_url.as_deref(), "DB_URL")
    }

    /// Override the page count, e.g. from a CLI flag.
    pub fn with_pages(mut self, pages: Option<u32>) -> Result<Self> {
        if let Some(n) = pages {
            self.scrape_num_pages = n;
            self.validate()?;
        }
        Ok(self)
    }

    pub fn with_location(mut self, location: Option<String>) -> Self {
        if location.is_some() {
            self.search_location = location;
        }
        self
    }
}

fn require<'a>(value: Option<&'a str>, key: &'static str) -> Result<&'a str> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(EtlError::MissingSetting(key)),
    }
}

fn mask(value: Option<&str>) -> String {
    match value {
        None => "-".into(),
        Some(v) if v.chars().count() <= 4 => "****".into(),
        Some(v) => {
            let tail: String = v.chars().skip(v.chars().count() - 4).collect();
            format!("****{}", tail)
        }
    }
}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "APP_ID:           {}", self.app_id.as_deref().unwrap_or("-"))?;
        writeln!(f, "APP_KEY:          {}", mask(self.app_key.as_deref()))?;
        writeln!(f, "DB_URL:           {}", self.db_url.as_deref().unwrap_or("-"))?;
        writeln!(f, "LOG_LEVEL:        {}", self.log_level)?;
        writeln!(f, "SCRAPE_NUM_PAGES: {}", self.scrape_num_pages)?;
        writeln!(f, "SEARCH_LOCATION:  {}", self.search_location.as_deref().unwrap_or("-"))?;
        writeln!(f, "SEARCH_COUNTRY:   {}", self.search_country)?;
        writeln!(
            f,
            "RESULTS_PER_PAGE: {}",
            self.results_per_page.map(|n| n.to_string()).unwrap_or_else(|| "-".into())
        )?;
        writeln!(f, "OUTPUT_DIR:       {}", self.output_dir.display())?;
        write!(f, "SOURCE_LABEL:     {}", self.source_label)
    }
}
