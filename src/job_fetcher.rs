use crate::error::{Result, ScrapeError};
use log::info;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One job posting as persisted to CSV. `company_name` and `last_updated`
/// are tags applied by the driver: `company_name` is always the input-list
/// name (even when the rows came from a fallback lookup), `company` is
/// whatever the job board reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRow {
    pub company_name: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub date_posted: String,
    pub job_url: String,
    pub site: String,
    pub last_updated: String,
}

impl JobRow {
    /// Dedupe identity at every merge point.
    pub fn key(&self) -> (&str, &str, &str) {
        (&self.title, &self.company, &self.location)
    }
}

#[derive(Debug, Clone)]
pub enum FetchTarget {
    /// A resolved job-board company identifier.
    CompanyId(u64),
    /// Free-text search term, scoped by the query's location.
    SearchTerm(String),
}

#[derive(Debug, Clone)]
pub struct FetchQuery {
    pub target: FetchTarget,
    pub location: String,
    pub hours_old: u32,
    pub site: Option<String>,
}

/// Seam to the external scraping service. Zero rows is a legal result in
/// either fetch mode, never an error.
pub trait FetchJobs {
    fn fetch(&self, query: &FetchQuery) -> Result<Vec<JobRow>>;
}

pub struct HttpJobFetcher {
    client: Client,
    base_url: String,
}

impl HttpJobFetcher {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"));

        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .default_headers(headers)
            .build()
            .expect("Failed to build fetch client");

        HttpJobFetcher {
            client,
            base_url: base_url.into(),
        }
    }
}

impl FetchJobs for HttpJobFetcher {
    fn fetch(&self, query: &FetchQuery) -> Result<Vec<JobRow>> {
        let params = query_params(query);

        let resp = self
            .client
            .get(&self.base_url)
            .query(&params)
            .send()
            .map_err(|e| ScrapeError::Fetch(format!("request failed: {}", e)))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ScrapeError::Fetch(format!(
                "service returned status {}",
                status
            )));
        }

        let payload: Vec<serde_json::Value> = resp
            .json()
            .map_err(|e| ScrapeError::Fetch(format!("failed to decode response: {}", e)))?;

        let rows: Vec<JobRow> = payload.iter().map(row_from_json).collect();
        info!("Fetched {} job rows", rows.len());
        Ok(rows)
    }
}

/// Wire shape of the two fetch modes: a resolved identifier goes out as
/// `company_id`, a free-text term as `search_term`; location, posting age
/// and the optional site selector ride along either way.
fn query_params(query: &FetchQuery) -> Vec<(&'static str, String)> {
    let mut params: Vec<(&'static str, String)> = Vec::new();
    match &query.target {
        FetchTarget::CompanyId(id) => params.push(("company_id", id.to_string())),
        FetchTarget::SearchTerm(term) => params.push(("search_term", term.clone())),
    }
    params.push(("location", query.location.clone()));
    params.push(("hours_old", query.hours_old.to_string()));
    if let Some(site) = &query.site {
        params.push(("site_name", site.clone()));
    }
    params
}

/// Maps a service row onto the persisted columns. Long-text fields
/// (description) are dropped here; they are never buffered or written.
fn row_from_json(value: &serde_json::Value) -> JobRow {
    let field = |name: &str| -> String {
        value
            .get(name)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    };
    JobRow {
        company_name: String::new(),
        title: field("title"),
        company: field("company"),
        location: field("location"),
        date_posted: field("date_posted"),
        job_url: field("job_url"),
        site: field("site"),
        last_updated: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_from_json_drops_description() {
        let value = serde_json::json!({
            "title": "Engineer",
            "company": "Acme Corp",
            "location": "Austin, TX",
            "date_posted": "2026-08-01",
            "job_url": "https://example.com/1",
            "site": "linkedin",
            "description": "a very long free-text blob"
        });
        let row = row_from_json(&value);
        assert_eq!(row.title, "Engineer");
        assert_eq!(row.company, "Acme Corp");
        assert_eq!(row.date_posted, "2026-08-01");
        assert!(row.company_name.is_empty());
    }

    #[test]
    fn row_from_json_tolerates_missing_fields() {
        let value = serde_json::json!({ "title": "Engineer" });
        let row = row_from_json(&value);
        assert_eq!(row.title, "Engineer");
        assert_eq!(row.company, "");
        assert_eq!(row.location, "");
    }

    #[test]
    fn search_term_query_carries_term_and_location() {
        let query = FetchQuery {
            target: FetchTarget::SearchTerm("Acme Corp".to_string()),
            location: "Austin, TX".to_string(),
            hours_old: 720,
            site: Some("linkedin".to_string()),
        };
        let params = query_params(&query);
        assert_eq!(
            params,
            vec![
                ("search_term", "Acme Corp".to_string()),
                ("location", "Austin, TX".to_string()),
                ("hours_old", "720".to_string()),
                ("site_name", "linkedin".to_string()),
            ]
        );
    }

    #[test]
    fn company_id_query_carries_identifier() {
        let query = FetchQuery {
            target: FetchTarget::CompanyId(1337),
            location: "Remote".to_string(),
            hours_old: 48,
            site: None,
        };
        let params = query_params(&query);
        assert_eq!(params[0], ("company_id", "1337".to_string()));
        assert!(!params.iter().any(|(k, _)| *k == "site_name"));
    }

    #[test]
    fn dedupe_key_ignores_other_fields() {
        let value = serde_json::json!({
            "title": "Engineer", "company": "Acme", "location": "Austin, TX",
            "job_url": "https://example.com/1"
        });
        let a = row_from_json(&value);
        let mut b = a.clone();
        b.job_url = "https://example.com/2".to_string();
        assert_eq!(a.key(), b.key());
    }
}
