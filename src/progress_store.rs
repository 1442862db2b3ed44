use crate::error::Result;
use crate::job_fetcher::JobRow;
use chrono::{NaiveDate, NaiveDateTime};
use log::info;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

pub const PROGRESS_FILE: &str = "progress.csv";
pub const OUTPUT_FILE: &str = "jobs.csv";
pub const RECOVERY_FILE: &str = "recovery_batch.csv";
pub const ERROR_RECOVERY_FILE: &str = "error_recovery_batch.csv";
pub const QUICK_SAVE_FILE: &str = "quick_save.csv";

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Companies with a progress entry newer than this are skipped on restart.
pub const STALENESS_DAYS: i64 = 30;

/// Reads every row of a store file. A missing file is an empty store.
pub fn load_rows(path: &Path) -> Result<Vec<JobRow>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let mut rdr = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        let row: JobRow = result?;
        rows.push(row);
    }
    Ok(rows)
}

/// Rewrites a store file through a temp-file-then-rename cycle so a crash
/// mid-write never leaves a half-written store behind.
pub fn write_rows_atomic(path: &Path, rows: &[JobRow]) -> Result<()> {
    let tmp_path = path.with_extension("csv.tmp");
    {
        let mut writer = csv::Writer::from_path(&tmp_path)?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
    }
    fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Merges incoming rows into an existing set. Key is (title, company,
/// location); on a duplicate key the later-seen row replaces the earlier
/// one in place, so content is last-write-wins while first-seen order is
/// preserved.
pub fn merge_rows(existing: Vec<JobRow>, incoming: &[JobRow]) -> Vec<JobRow> {
    let mut merged = existing;
    let mut index: HashMap<(String, String, String), usize> = merged
        .iter()
        .enumerate()
        .map(|(i, row)| (owned_key(row), i))
        .collect();

    for row in incoming {
        match index.get(&owned_key(row)) {
            Some(&i) => merged[i] = row.clone(),
            None => {
                index.insert(owned_key(row), merged.len());
                merged.push(row.clone());
            }
        }
    }
    merged
}

/// Read-merge-rewrite a store file in one step.
pub fn merge_into_file(path: &Path, incoming: &[JobRow]) -> Result<()> {
    let existing = load_rows(path)?;
    let merged = merge_rows(existing, incoming);
    write_rows_atomic(path, &merged)?;
    info!("Saved {} rows to {:?}", merged.len(), path);
    Ok(())
}

/// Companies whose newest progress entry is within the staleness window.
/// These are skipped on restart; stale entries leave the company eligible
/// for reprocessing.
pub fn recent_companies(rows: &[JobRow], now: NaiveDateTime) -> HashSet<String> {
    let cutoff = now - chrono::Duration::days(STALENESS_DAYS);
    let mut recent = HashSet::new();
    for row in rows {
        if let Ok(ts) = NaiveDateTime::parse_from_str(&row.last_updated, TIMESTAMP_FORMAT) {
            if ts > cutoff {
                recent.insert(row.company_name.clone());
            }
        }
    }
    recent
}

fn parse_posted(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
                .ok()
                .map(|ts| ts.date())
        })
}

/// Sorts newest posting first. Rows whose date_posted does not parse sort
/// last (kept, not dropped); the sort is stable so ties keep store order.
pub fn sort_by_date_desc(rows: &mut [JobRow]) {
    rows.sort_by(|a, b| {
        match (parse_posted(&a.date_posted), parse_posted(&b.date_posted)) {
            (Some(da), Some(db)) => db.cmp(&da),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        }
    });
}

fn owned_key(row: &JobRow) -> (String, String, String) {
    (
        row.title.clone(),
        row.company.clone(),
        row.location.clone(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Local};

    fn row(title: &str, company: &str, location: &str) -> JobRow {
        JobRow {
            company_name: company.to_string(),
            title: title.to_string(),
            company: company.to_string(),
            location: location.to_string(),
            date_posted: "2026-08-01".to_string(),
            job_url: String::new(),
            site: "linkedin".to_string(),
            last_updated: Local::now().format(TIMESTAMP_FORMAT).to_string(),
        }
    }

    #[test]
    fn merge_is_last_write_wins() {
        let mut first = row("Engineer", "Acme", "Austin, TX");
        first.job_url = "https://example.com/old".to_string();
        let mut second = first.clone();
        second.job_url = "https://example.com/new".to_string();

        let merged = merge_rows(vec![first], &[second.clone()]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].job_url, "https://example.com/new");
    }

    #[test]
    fn merge_keeps_distinct_keys() {
        let merged = merge_rows(
            vec![row("Engineer", "Acme", "Austin, TX")],
            &[
                row("Engineer", "Acme", "Dallas, TX"),
                row("Designer", "Acme", "Austin, TX"),
            ],
        );
        assert_eq!(merged.len(), 3);
    }

    #[test]
    fn roundtrip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(OUTPUT_FILE);
        let rows = vec![row("Engineer", "Acme", "Austin, TX")];
        write_rows_atomic(&path, &rows).unwrap();
        let loaded = load_rows(&path).unwrap();
        assert_eq!(loaded, rows);
        assert!(!dir.path().join("jobs.csv.tmp").exists());
    }

    #[test]
    fn missing_store_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_rows(&dir.path().join(PROGRESS_FILE))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn staleness_window_governs_recency() {
        let now = Local::now().naive_local();
        let mut fresh = row("Engineer", "Acme", "Austin, TX");
        fresh.last_updated = (now - Duration::days(5)).format(TIMESTAMP_FORMAT).to_string();
        let mut stale = row("Engineer", "Beta", "Austin, TX");
        stale.company_name = "Beta".to_string();
        stale.last_updated = (now - Duration::days(45))
            .format(TIMESTAMP_FORMAT)
            .to_string();
        let mut unparseable = row("Engineer", "Gamma", "Austin, TX");
        unparseable.company_name = "Gamma".to_string();
        unparseable.last_updated = "not a timestamp".to_string();

        let recent = recent_companies(&[fresh, stale, unparseable], now);
        assert!(recent.contains("Acme"));
        assert!(!recent.contains("Beta"));
        assert!(!recent.contains("Gamma"));
    }

    #[test]
    fn newest_entry_governs_skip() {
        let now = Local::now().naive_local();
        let mut old = row("Engineer", "Acme", "Austin, TX");
        old.last_updated = (now - Duration::days(60))
            .format(TIMESTAMP_FORMAT)
            .to_string();
        let mut newer = row("Designer", "Acme", "Austin, TX");
        newer.last_updated = (now - Duration::days(2)).format(TIMESTAMP_FORMAT).to_string();

        let recent = recent_companies(&[old, newer], now);
        assert!(recent.contains("Acme"));
    }

    #[test]
    fn sort_puts_unparseable_dates_last() {
        let mut a = row("A", "Acme", "X");
        a.date_posted = "2026-07-01".to_string();
        let mut b = row("B", "Acme", "Y");
        b.date_posted = "garbage".to_string();
        let mut c = row("C", "Acme", "Z");
        c.date_posted = "2026-08-15".to_string();

        let mut rows = vec![a, b, c];
        sort_by_date_desc(&mut rows);
        assert_eq!(rows[0].title, "C");
        assert_eq!(rows[1].title, "A");
        assert_eq!(rows[2].title, "B");
    }
}
