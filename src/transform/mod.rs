pub mod dates;

use std::collections::HashSet;

use chrono::NaiveDate;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{EtlError, Result};
use crate::models::{CleanJob, RawJob};
use dates::{standardize_date, EPOCH_PLACEHOLDER};

pub const DEFAULT_TITLE: &str = "Unknown Title";
pub const DEFAULT_COMPANY: &str = "Unknown Company";
pub const DEFAULT_LOCATION: &str = "Unknown Location";
pub const DEFAULT_SUMMARY: &str = "No summary provided";

type DedupKey = (String, String, String);

/// Clean one fetched batch: dedup, fill defaults, normalize dates.
///
/// Duplicates are judged on (title, company, location) after defaults are
/// filled in, so absent, empty and blank values collide. The first
/// occurrence wins.
pub fn clean_jobs(raw: &[RawJob], today: NaiveDate) -> Result<Vec<CleanJob>> {
    if raw.is_empty() {
        return Err(EtlError::EmptyBatch);
    }

    log_missing_fields(raw);

    let mut seen: HashSet<DedupKey> = HashSet::with_capacity(raw.len());
    let mut cleaned = Vec::with_capacity(raw.len());

    for job in raw {
        let key = (
            or_default(job.title(), DEFAULT_TITLE),
            or_default(job.company(), DEFAULT_COMPANY),
            or_default(job.location(), DEFAULT_LOCATION),
        );
        if !seen.insert(key.clone()) {
            continue;
        }
        let (title, company, location) = key;
        cleaned.push(CleanJob {
            title,
            company,
            location,
            summary: or_default(job.summary(), DEFAULT_SUMMARY),
            date_posted: clean_date(job.date_posted.as_ref(), today),
            url: job.url(),
        });
    }

    let dropped = raw.len() - cleaned.len();
    info!(
        input = raw.len(),
        output = cleaned.len(),
        duplicates = dropped,
        "Cleaned job batch"
    );
    if let Some(first) = cleaned.first() {
        debug!(?first, "First cleaned record");
    }

    Ok(cleaned)
}

fn or_default(value: Option<String>, default: &str) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => default.to_string(),
    }
}

/// Absent or null dates get the epoch placeholder; anything present goes
/// through the normalizer, which falls back to today.
fn clean_date(value: Option<&Value>, today: NaiveDate) -> String {
    match value {
        None | Some(Value::Null) => EPOCH_PLACEHOLDER.to_string(),
        Some(Value::String(s)) => standardize_date(Some(s), today),
        Some(_) => standardize_date(None, today),
    }
}

fn log_missing_fields(raw: &[RawJob]) {
    let mut counts = [
        ("title", 0usize),
        ("company", 0),
        ("location", 0),
        ("summary", 0),
        ("date_posted", 0),
    ];
    for j in raw {
        let absent = [
            j.title.is_none(),
            j.company.is_none(),
            j.location.is_none(),
            j.summary.is_none(),
            j.date_posted.is_none(),
        ];
        for (slot, is_absent) in counts.iter_mut().zip(absent) {
            slot.1 += usize::from(is_absent);
        }
    }
    for (field, n) in counts {
        if n > 0 {
            debug!(field, records = n, "Field missing, defaults will apply");
        }
    }
}
