use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use tracing::info;

use crate::models::CleanJob;

/// A cleaned job tagged with the site it came from.
#[derive(Debug, Clone, Copy)]
pub struct Listing<'a> {
    pub source: &'a str,
    pub job: &'a CleanJob,
}

const HEAD: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Job Listings</title>
    <style>
        body {
            font-family: 'Segoe UI', Tahoma, Geneva, sans-serif;
            margin: 40px auto;
            max-width: 1200px;
            padding: 0 20px;
            background-color: #f5f7fa;
        }
        .search-container {
            margin: 20px 0;
            padding: 20px;
            background: white;
            border-radius: 8px;
            box-shadow: 0 1px 3px rgba(0,0,0,0.1);
        }
        .search-box {
            width: 100%;
            padding: 10px;
            margin: 10px 0;
            border: 1px solid #ddd;
            border-radius: 4px;
            box-sizing: border-box;
        }
        .filters {
            display: flex;
            flex-wrap: wrap;
            gap: 10px;
            margin-top: 10px;
        }
        .filter-btn {
            padding: 8px 15px;
            background: #1F4E78;
            color: white;
            border: none;
            border-radius: 4px;
            cursor: pointer;
        }
        .filter-btn:hover {
            background: #2c3e50;
        }
        .summary-line {
            color: #666;
        }
        .job-card {
            background: white;
            margin: 15px 0;
            padding: 20px;
            border-radius: 8px;
            box-shadow: 0 1px 3px rgba(0,0,0,0.1);
        }
        .job-title {
            color: #1F4E78;
            font-size: 1.2em;
            margin: 0 0 10px 0;
        }
        .job-meta {
            display: flex;
            flex-wrap: wrap;
            gap: 20px;
            color: #666;
            margin-bottom: 15px;
        }
        .description {
            line-height: 1.6;
            color: #444;
            margin-top: 15px;
        }
        .tag {
            display: inline-block;
            padding: 4px 8px;
            background: #e1ecf4;
            color: #39739d;
            border-radius: 4px;
            font-size: 0.9em;
            margin-top: 15px;
        }
        .apply-link {
            display: inline-block;
            margin: 15px 0 0 10px;
            color: #1F4E78;
            text-decoration: none;
            font-weight: bold;
        }
        .hidden {
            display: none;
        }
    </style>
</head>
<body>
    <h1>Job Listings</h1>
"#;

const SCRIPT: &str = r#"
    <script>
        function searchJobs() {
            const searchText = document.getElementById('searchBox').value.toLowerCase();
            const jobs = document.getElementsByClassName('job-card');

            Array.from(jobs).forEach(job => {
                const text = job.textContent.toLowerCase();
                job.classList.toggle('hidden', !text.includes(searchText));
            });
        }

        function filterBySource(source) {
            const jobs = document.getElementsByClassName('job-card');
            Array.from(jobs).forEach(job => {
                const show = source === '*' || job.dataset.source === source;
                job.classList.toggle('hidden', !show);
            });
        }
    </script>
</body>
</html>
"#;

/// Render listings into one self-contained, searchable HTML document.
pub fn render_html(listings: &[Listing<'_>], generated_at: NaiveDateTime) -> String {
    let mut html = String::with_capacity(HEAD.len() + SCRIPT.len() + listings.len() * 700);
    html.push_str(HEAD);

    html.push_str(
        r#"
    <div class="search-container">
        <input type="text" id="searchBox" class="search-box"
               placeholder="Search by title, company, or location..." onkeyup="searchJobs()">
        <div class="filters">
            <button class="filter-btn" data-filter="*" onclick="filterBySource(this.dataset.filter)">All Jobs</button>
"#,
    );
    for source in distinct_sources(listings) {
        let s = escape_html(source);
        let _ = writeln!(
            html,
            r#"            <button class="filter-btn" data-filter="{s}" onclick="filterBySource(this.dataset.filter)">{s}</button>"#
        );
    }
    let _ = write!(
        html,
        r#"        </div>
        <p class="summary-line">{} jobs &middot; generated {}</p>
    </div>

    <div class="jobs-container">
"#,
        listings.len(),
        generated_at.format("%Y-%m-%d %H:%M:%S"),
    );

    for listing in listings {
        push_card(&mut html, listing);
    }

    html.push_str("    </div>\n");
    html.push_str(SCRIPT);
    html
}

fn push_card(html: &mut String, listing: &Listing<'_>) {
    let job = listing.job;
    let source = escape_html(listing.source);
    let _ = write!(
        html,
        r#"        <div class="job-card" data-source="{source}">
            <h2 class="job-title">{title}</h2>
            <div class="job-meta">
                <span>&#127970; {company}</span>
                <span>&#128205; {location}</span>
                <span>&#128197; Posted: {date}</span>
            </div>
            <div class="description">{summary}</div>
            <span class="tag">{source}</span>
            <a class="apply-link" href="{href}" target="_blank" rel="noopener">Apply Now &rarr;</a>
        </div>
"#,
        title = escape_html(&job.title),
        company = escape_html(&job.company),
        location = escape_html(&job.location),
        date = escape_html(&job.date_posted),
        summary = escape_html(&job.summary),
        href = escape_html(apply_href(job.url.as_deref())),
    );
}

/// Only http(s) links are emitted; anything else points nowhere.
fn apply_href(url: Option<&str>) -> &str {
    match url {
        Some(u) if has_web_scheme(u) => u,
        _ => "#",
    }
}

fn has_web_scheme(url: &str) -> bool {
    let lower = url.get(..8).unwrap_or(url).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Source labels in first-seen order.
fn distinct_sources<'a>(listings: &[Listing<'a>]) -> Vec<&'a str> {
    let mut seen: Vec<&'a str> = Vec::new();
    for l in listings {
        if !seen.contains(&l.source) {
            seen.push(l.source);
        }
    }
    seen
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// `jobs_interactive_<YYYYmmdd_HHMMSS>.html`
pub fn output_file_name(now: NaiveDateTime) -> String {
    format!("jobs_interactive_{}.html", now.format("%Y%m%d_%H%M%S"))
}

/// Render and write the document into `dir`, creating it if needed.
pub fn write_html(dir: &Path, listings: &[Listing<'_>], now: NaiveDateTime) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {:?}", dir))?;
    let path = dir.join(output_file_name(now));
    std::fs::write(&path, render_html(listings, now))
        .with_context(|| format!("Failed to write {:?}", path))?;
    info!(path = %path.display(), cards = listings.len(), "Wrote HTML listing");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap()
    }

    fn job(title: &str) -> CleanJob {
        CleanJob {
            title: title.into(),
            company: "Acme".into(),
            location: "Remote".into(),
            summary: "Ship it".into(),
            date_posted: "2024-01-01".into(),
            url: None,
        }
    }

    #[test]
    fn one_card_per_listing_with_source() {
        let a = job("Backend Engineer");
        let b = job("Frontend Engineer");
        let listings = [
            Listing { source: "RemoteOK", job: &a },
            Listing { source: "WeWorkRemotely", job: &b },
        ];
        let html = render_html(&listings, at());

        assert_eq!(html.matches(r#"<div class="job-card""#).count(), 2);
        assert!(html.contains(r#"<div class="job-card" data-source="RemoteOK">"#));
        assert!(html.contains(r#"<div class="job-card" data-source="WeWorkRemotely">"#));
        assert!(html.contains(r#"data-filter="RemoteOK""#));
        assert!(html.contains(r#"data-filter="WeWorkRemotely""#));
        assert!(html.contains("Backend Engineer"));
        assert!(html.contains("function searchJobs()"));
        assert!(html.contains("function filterBySource(source)"));
    }

    #[test]
    fn filter_buttons_deduplicated() {
        let a = job("a");
        let b = job("b");
        let listings = [
            Listing { source: "Adzuna", job: &a },
            Listing { source: "Adzuna", job: &b },
        ];
        let html = render_html(&listings, at());
        assert_eq!(html.matches(r#"data-filter="Adzuna""#).count(), 1);
        assert_eq!(html.matches(r#"class="job-card""#).count(), 2);
    }

    #[test]
    fn text_is_escaped() {
        let mut j = job("<script>alert('x')</script>");
        j.company = "Smith & \"Sons\"".into();
        let html = render_html(&[Listing { source: "a\"b", job: &j }], at());
        assert!(!html.contains("<script>alert"));
        assert!(html.contains("&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;"));
        assert!(html.contains("Smith &amp; &quot;Sons&quot;"));
        assert!(html.contains(r#"data-source="a&quot;b""#));
    }

    #[test]
    fn apply_link_uses_escaped_url() {
        let mut j = job("a");
        j.url = Some("https://example.com/jobs?id=1&ref=\"x\"".into());
        let html = render_html(&[Listing { source: "Adzuna", job: &j }], at());
        assert!(html.contains(
            r#"<a class="apply-link" href="https://example.com/jobs?id=1&amp;ref=&quot;x&quot;" target="_blank" rel="noopener">"#
        ));
    }

    #[test]
    fn apply_link_falls_back_to_hash() {
        let missing = job("missing");
        let mut scripted = job("scripted");
        scripted.url = Some("javascript:alert(1)".into());
        let mut upper = job("upper");
        upper.url = Some("HTTPS://EXAMPLE.COM/1".into());
        let listings = [
            Listing { source: "Adzuna", job: &missing },
            Listing { source: "Adzuna", job: &scripted },
            Listing { source: "Adzuna", job: &upper },
        ];
        let html = render_html(&listings, at());
        assert_eq!(html.matches(r##"href="#""##).count(), 2);
        assert!(!html.contains("javascript:"));
        assert!(html.contains(r#"href="HTTPS://EXAMPLE.COM/1""#));
    }

    #[test]
    fn empty_document_still_renders() {
        let html = render_html(&[], at());
        assert!(html.contains("0 jobs"));
        assert!(!html.contains(r#"class="job-card""#));
        assert!(html.trim_end().ends_with("</html>"));
    }

    #[test]
    fn timestamped_file() {
        let dir = std::env::temp_dir().join(format!("job_etl_render_{}", std::process::id()));
        let j = job("a");
        let path = write_html(&dir, &[Listing { source: "Adzuna", job: &j }], at()).unwrap();

        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "jobs_interactive_20240102_030405.html"
        );
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains(r#"data-source="Adzuna""#));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
