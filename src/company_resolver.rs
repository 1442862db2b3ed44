use crate::error::ResolutionKind;
use crate::error_sink::ErrorSink;
use log::{error, warn};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use std::time::Duration;

pub const DEFAULT_TYPEAHEAD_URL: &str =
    "https://www.linkedin.com/jobs-guest/api/typeaheadHits";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompanyId(pub u64);

/// Maps a company name to the job board's stable identifier. `None` means
/// NotFound; the resolver never raises to its caller. Hard failures
/// (decode, request, unexpected) are logged into the error sink with their
/// tag before `None` is returned, so the driver's fallback logic stays the
/// only retry path. The sink is an explicit parameter; there is no shared
/// output-directory state.
pub trait ResolveCompany {
    fn resolve(&self, name: &str, errors: &ErrorSink) -> Option<CompanyId>;
}

pub struct TypeaheadResolver {
    client: Client,
    base_url: String,
}

impl TypeaheadResolver {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36"));

        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .default_headers(headers)
            .build()
            .expect("Failed to build resolver client");

        TypeaheadResolver {
            client,
            base_url: base_url.into(),
        }
    }

    fn record_failure(&self, errors: &ErrorSink, name: &str, kind: ResolutionKind, msg: &str) {
        error!("{} for company {}: {}", kind.tag(), name, msg);
        errors.record_error(name, &format!("{}: {}", kind.tag(), msg));
    }
}

impl ResolveCompany for TypeaheadResolver {
    fn resolve(&self, name: &str, errors: &ErrorSink) -> Option<CompanyId> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        let url = format!(
            "{}?typeaheadType=COMPANY&query={}",
            self.base_url,
            urlencoding::encode(name)
        );

        let resp = match self.client.get(&url).send() {
            Ok(r) => r,
            Err(e) => {
                self.record_failure(errors, name, ResolutionKind::Request, &e.to_string());
                return None;
            }
        };

        let status = resp.status();
        if !status.is_success() {
            self.record_failure(
                errors,
                name,
                ResolutionKind::Request,
                &format!("status {}", status),
            );
            return None;
        }

        let hits: Vec<serde_json::Value> = match resp.json() {
            Ok(h) => h,
            Err(e) => {
                self.record_failure(errors, name, ResolutionKind::Decode, &e.to_string());
                return None;
            }
        };

        let first = match hits.first() {
            Some(hit) => hit,
            None => {
                warn!("No company found for: {}", name);
                return None;
            }
        };

        // The id field has been seen both as a JSON number and a numeric
        // string.
        let id = first
            .get("id")
            .and_then(|v| v.as_u64().or_else(|| v.as_str()?.parse().ok()));
        match id {
            Some(id) => Some(CompanyId(id)),
            None => {
                self.record_failure(
                    errors,
                    name,
                    ResolutionKind::Unexpected,
                    "typeahead hit has no usable id field",
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_sink::ERROR_FILE;

    #[test]
    fn empty_name_is_not_found_without_error_entry() {
        let dir = tempfile::tempdir().unwrap();
        let sink = ErrorSink::new(dir.path());
        let resolver = TypeaheadResolver::new(DEFAULT_TYPEAHEAD_URL);
        assert!(resolver.resolve("   ", &sink).is_none());
        assert!(!dir.path().join(ERROR_FILE).exists());
    }
}
