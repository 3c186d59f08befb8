use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use rusqlite::Connection;
use tracing::{error, info};

use crate::models::CleanJob;

/// Where a `DB_URL` points.
#[derive(Debug, Clone, PartialEq)]
pub enum DbTarget {
    Memory,
    File(PathBuf),
}

/// Accepts `sqlite:///rel/path`, `sqlite:////abs/path`, `sqlite:path`,
/// a bare path, or `:memory:`. Query strings are ignored.
///
/// After `sqlite://` the first `/` separates the empty host from the path,
/// so three slashes mean a relative path and four an absolute one.
pub fn parse_db_url(url: &str) -> Result<DbTarget> {
    let url = url.trim();
    let url = url.split('?').next().unwrap_or(url);

    let path = if let Some(rest) = url.strip_prefix("sqlite://") {
        rest.strip_prefix('/').unwrap_or(rest)
    } else if let Some(rest) = url.strip_prefix("sqlite:") {
        rest
    } else if let Some((scheme, _)) = url.split_once("://") {
        bail!("Unsupported database scheme '{}', only sqlite is available", scheme);
    } else {
        url
    };

    match path {
        "" => bail!("Database URL has no path"),
        ":memory:" => Ok(DbTarget::Memory),
        p => Ok(DbTarget::File(PathBuf::from(p))),
    }
}

pub fn connect(db_url: &str) -> Result<Connection> {
    let conn = match parse_db_url(db_url)? {
        DbTarget::Memory => Connection::open_in_memory()?,
        DbTarget::File(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {:?}", parent))?;
            }
            Connection::open(&path).with_context(|| format!("Failed to open {:?}", path))?
        }
    };
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS jobs (
            id          INTEGER PRIMARY KEY,
            title       TEXT NOT NULL,
            company     TEXT NOT NULL,
            location    TEXT NOT NULL,
            summary     TEXT NOT NULL,
            date_posted TEXT NOT NULL,
            loaded_at   TEXT NOT NULL DEFAULT (datetime('now'))
        );
        ",
    )?;
    Ok(())
}

/// Append every job in one transaction. Returns rows inserted.
pub fn insert_jobs(conn: &Connection, jobs: &[CleanJob]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let mut count = 0;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO jobs (title, company, location, summary, date_posted)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for j in jobs {
            count += stmt.execute(rusqlite::params![
                j.title, j.company, j.location, j.summary, j.date_posted,
            ])?;
        }
    }
    tx.commit()?;
    Ok(count)
}

/// Result of handing a batch to the relational store.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadReport {
    /// Empty batch, no connection was opened.
    Skipped,
    Inserted(usize),
    /// Nothing from the batch was kept.
    Failed(String),
}

/// Append a cleaned batch to the `jobs` table.
///
/// Failures are logged and reported, never returned as errors.
pub fn append_jobs(db_url: &str, jobs: &[CleanJob]) -> LoadReport {
    if jobs.is_empty() {
        info!("No data to load into the database");
        return LoadReport::Skipped;
    }

    info!("Inserting {} rows into the database", jobs.len());
    match load(db_url, jobs) {
        Ok(n) => {
            info!(rows = n, "Data loaded successfully");
            LoadReport::Inserted(n)
        }
        Err(e) => {
            error!("Error loading data into the database: {:#}", e);
            LoadReport::Failed(format!("{:#}", e))
        }
    }
}

fn load(db_url: &str, jobs: &[CleanJob]) -> Result<usize> {
    let conn = connect(db_url)?;
    init_schema(&conn)?;
    insert_jobs(&conn, jobs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn job(title: &str) -> CleanJob {
        CleanJob {
            title: title.into(),
            company: "Acme".into(),
            location: "Remote".into(),
            summary: "No summary provided".into(),
            date_posted: "2024-03-01".into(),
            url: Some("https://example.com/apply".into()),
        }
    }

    fn temp_db(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir()
            .join(format!("job_etl_{}_{}_{}", name, std::process::id(), nanos))
            .join("jobs.sqlite")
    }

    fn count_rows(path: &Path) -> i64 {
        let conn = Connection::open(path).unwrap();
        conn.query_row("SELECT COUNT(*) FROM jobs", [], |r| r.get(0))
            .unwrap()
    }

    #[test]
    fn url_forms() {
        assert_eq!(parse_db_url(":memory:").unwrap(), DbTarget::Memory);
        assert_eq!(parse_db_url("sqlite::memory:").unwrap(), DbTarget::Memory);
        assert_eq!(
            parse_db_url("sqlite:///jobs.db").unwrap(),
            DbTarget::File(PathBuf::from("jobs.db"))
        );
        assert_eq!(
            parse_db_url("sqlite:///data/jobs.sqlite").unwrap(),
            DbTarget::File(PathBuf::from("data/jobs.sqlite"))
        );
        assert_eq!(
            parse_db_url("sqlite:////var/lib/jobs.db").unwrap(),
            DbTarget::File(PathBuf::from("/var/lib/jobs.db"))
        );
        assert_eq!(
            parse_db_url("sqlite://data/jobs.db?mode=rwc").unwrap(),
            DbTarget::File(PathBuf::from("data/jobs.db"))
        );
        assert_eq!(
            parse_db_url("sqlite:jobs.db").unwrap(),
            DbTarget::File(PathBuf::from("jobs.db"))
        );
        assert_eq!(
            parse_db_url(" data/jobs.db ").unwrap(),
            DbTarget::File(PathBuf::from("data/jobs.db"))
        );
        assert!(parse_db_url("postgresql://user:pw@localhost/jobs").is_err());
        assert!(parse_db_url("sqlite://").is_err());
        assert!(parse_db_url("sqlite:///").is_err());
    }

    #[test]
    fn insert_into_memory() {
        let conn = connect(":memory:").unwrap();
        init_schema(&conn).unwrap();
        let n = insert_jobs(&conn, &[job("a"), job("b")]).unwrap();
        assert_eq!(n, 2);

        let titles: Vec<String> = conn
            .prepare("SELECT title FROM jobs ORDER BY id")
            .unwrap()
            .query_map([], |r| r.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(titles, vec!["a", "b"]);
    }

    #[test]
    fn empty_batch_skips_connection() {
        // Unsupported scheme: any attempt to connect would fail.
        let report = append_jobs("postgresql://nowhere/jobs", &[]);
        assert_eq!(report, LoadReport::Skipped);
    }

    #[test]
    fn appends_across_runs() {
        let path = temp_db("append");
        let url = format!("sqlite:///{}", path.display());

        assert_eq!(append_jobs(&url, &[job("a"), job("b")]), LoadReport::Inserted(2));
        assert_eq!(append_jobs(&url, &[job("a")]), LoadReport::Inserted(1));
        assert_eq!(count_rows(&path), 3);

        let conn = Connection::open(&path).unwrap();
        let columns: Vec<String> = conn
            .prepare("SELECT name FROM pragma_table_info('jobs')")
            .unwrap()
            .query_map([], |r| r.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert!(!columns.iter().any(|c| c == "url"));

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn failure_is_reported_not_raised() {
        let report = append_jobs("postgresql://nowhere/jobs", &[job("a")]);
        assert!(matches!(report, LoadReport::Failed(msg) if msg.contains("Unsupported")));
    }

    #[test]
    fn schema_mismatch_keeps_nothing() {
        let path = temp_db("mismatch");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch("CREATE TABLE jobs (id INTEGER PRIMARY KEY, title TEXT);")
                .unwrap();
        }

        let report = append_jobs(path.to_str().unwrap(), &[job("a"), job("b")]);
        assert!(matches!(report, LoadReport::Failed(_)));
        assert_eq!(count_rows(&path), 0);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
