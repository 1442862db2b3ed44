use crate::batch::{BatchBuffer, DEFAULT_BATCH_SIZE};
use crate::company_resolver::{CompanyId, ResolveCompany};
use crate::delay_manager;
use crate::error::{Result, ScrapeError};
use crate::error_sink::ErrorSink;
use crate::input_loader::{self, CompanyRecord};
use crate::job_fetcher::{FetchJobs, FetchQuery, FetchTarget, JobRow};
use crate::progress_store::{
    self, ERROR_RECOVERY_FILE, OUTPUT_FILE, PROGRESS_FILE, QUICK_SAVE_FILE, TIMESTAMP_FORMAT,
};
use chrono::Local;
use log::{error, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub input_file: PathBuf,
    pub location: String,
    pub output_dir: PathBuf,
    /// Inclusive 0-based row range over the input file.
    pub start: usize,
    pub end: Option<usize>,
    pub batch_size: usize,
    pub hours_old: u32,
    pub site: Option<String>,
    pub pause_min_secs: u64,
    pub pause_max_secs: u64,
}

impl RunConfig {
    pub fn new(
        input_file: impl Into<PathBuf>,
        location: impl Into<String>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        RunConfig {
            input_file: input_file.into(),
            location: location.into(),
            output_dir: output_dir.into(),
            start: 0,
            end: None,
            batch_size: DEFAULT_BATCH_SIZE,
            hours_old: 720,
            site: Some("linkedin".to_string()),
            pause_min_secs: 1,
            pause_max_secs: 2,
        }
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct RunSummary {
    pub attempted: usize,
    pub skipped_recent: usize,
    pub rows_fetched: usize,
    pub no_jobs: usize,
    pub not_found: usize,
    pub errors: usize,
}

enum CompanyOutcome {
    Rows(Vec<JobRow>),
    NoJobs,
    NotFound,
}

/// Runs the whole pipeline: load, range-check, skip-filter, fetch loop with
/// batched flushes, final cleanup. Per-company failures are logged and the
/// scan continues; only a bad input file or an invalid range aborts, and
/// those abort before anything under the output directory is touched.
pub fn run(
    config: &RunConfig,
    resolver: &dyn ResolveCompany,
    fetcher: &dyn FetchJobs,
) -> Result<RunSummary> {
    let records = input_loader::load_records(&config.input_file)?;
    let total = records.len();
    if total == 0 {
        return Err(ScrapeError::Input(format!(
            "no records found in {}",
            config.input_file.display()
        )));
    }

    let end = match config.end {
        Some(end) if end < total => end,
        _ => total - 1,
    };
    if config.start > end {
        return Err(ScrapeError::InvalidRange {
            start: config.start,
            end,
            total,
        });
    }

    fs::create_dir_all(&config.output_dir)?;
    let progress_rows = progress_store::load_rows(&config.output_dir.join(PROGRESS_FILE))?;
    let recent = progress_store::recent_companies(&progress_rows, Local::now().naive_local());

    let errors = ErrorSink::new(&config.output_dir);
    let mut buffer = BatchBuffer::new(config.batch_size);
    let mut summary = RunSummary::default();

    for idx in config.start..=end {
        let record = &records[idx];
        let company = record.company.trim();
        if company.is_empty() {
            continue;
        }
        if recent.contains(company) {
            info!("Skipping {} (fetched within the last 30 days)", company);
            summary.skipped_recent += 1;
            continue;
        }

        info!("Processing company {}/{}: {}", idx + 1, end + 1, company);
        summary.attempted += 1;

        match fetch_company(config, resolver, fetcher, &errors, record) {
            Ok(CompanyOutcome::Rows(mut rows)) => {
                let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
                for row in &mut rows {
                    row.company_name = company.to_string();
                    row.last_updated = timestamp.clone();
                }
                summary.rows_fetched += rows.len();

                // Bounds data loss to one company if we crash between
                // batch flushes.
                if let Err(e) = progress_store::write_rows_atomic(
                    &config.output_dir.join(QUICK_SAVE_FILE),
                    &rows,
                ) {
                    error!("Quick save failed for {}: {}", company, e);
                }
                buffer.add_rows(rows);
            }
            Ok(CompanyOutcome::NoJobs) => {
                info!("No jobs found for {}", company);
                errors.record_no_jobs(company);
                summary.no_jobs += 1;
            }
            Ok(CompanyOutcome::NotFound) => {
                warn!("No identifier found for company: {}", company);
                summary.not_found += 1;
            }
            Err(e) => {
                error!("Error processing company {}: {}", company, e);
                errors.record_error(company, &e.to_string());
                summary.errors += 1;
            }
        }

        if buffer.company_done() {
            buffer.flush(&config.output_dir);
            delay_manager::batch_pause(config.pause_min_secs, config.pause_max_secs);
        }
    }

    // Partial final batch.
    buffer.flush(&config.output_dir);

    final_cleanup(&config.output_dir);

    info!(
        "Run complete: {} attempted, {} skipped as recent, {} rows fetched, {} with no jobs, {} not found, {} errors",
        summary.attempted,
        summary.skipped_recent,
        summary.rows_fetched,
        summary.no_jobs,
        summary.not_found,
        summary.errors
    );
    Ok(summary)
}

/// Resolve-then-fetch with a single fallback retry. Rows keep whatever the
/// board reports in `company`; the driver tags `company_name` with the
/// input-list name afterwards, fallback or not. A clean NotFound (no hits,
/// no transport failure) lands in neither log; hard lookup failures were
/// already recorded by the resolver.
fn fetch_company(
    config: &RunConfig,
    resolver: &dyn ResolveCompany,
    fetcher: &dyn FetchJobs,
    errors: &ErrorSink,
    record: &CompanyRecord,
) -> Result<CompanyOutcome> {
    let mut resolved_any = false;

    let mut rows = match resolver.resolve(&record.company, errors) {
        Some(id) => {
            resolved_any = true;
            fetcher.fetch(&query_for(config, id))?
        }
        None => Vec::new(),
    };

    if rows.is_empty() {
        if let Some(fallback) = record.fallback_name() {
            info!(
                "No jobs found for {}. Retrying with fallback: {}",
                record.company, fallback
            );
            if let Some(id) = resolver.resolve(fallback, errors) {
                resolved_any = true;
                rows = fetcher.fetch(&query_for(config, id))?;
            }
        }
    }

    if rows.is_empty() {
        if resolved_any {
            Ok(CompanyOutcome::NoJobs)
        } else {
            Ok(CompanyOutcome::NotFound)
        }
    } else {
        Ok(CompanyOutcome::Rows(rows))
    }
}

fn query_for(config: &RunConfig, id: CompanyId) -> FetchQuery {
    FetchQuery {
        target: FetchTarget::CompanyId(id.0),
        location: config.location.clone(),
        hours_old: config.hours_old,
        site: config.site.clone(),
    }
}

/// Reloads the main output, folds in any diverted error-recovery batch,
/// re-applies the dedupe, sorts newest posting first (unparseable dates
/// last), and rewrites the file atomically. Cleanup failures are logged,
/// never fatal: the incremental files already hold the data.
fn final_cleanup(output_dir: &Path) {
    let output_path = output_dir.join(OUTPUT_FILE);
    let mut rows = match progress_store::load_rows(&output_path) {
        Ok(rows) => rows,
        Err(e) => {
            error!("Cleanup skipped, could not read {:?}: {}", output_path, e);
            return;
        }
    };

    let error_recovery_path = output_dir.join(ERROR_RECOVERY_FILE);
    if error_recovery_path.exists() {
        match progress_store::load_rows(&error_recovery_path) {
            Ok(recovered) => {
                info!("Merging {} error-recovery rows", recovered.len());
                // Diverted batches are older than anything merged into the
                // output afterwards, so the output side must win on a
                // duplicate key.
                rows = progress_store::merge_rows(recovered, &rows);
                if let Err(e) = fs::remove_file(&error_recovery_path) {
                    error!("Could not remove error-recovery file: {}", e);
                }
            }
            Err(e) => error!("Could not read error-recovery file: {}", e),
        }
    }

    if rows.is_empty() {
        return;
    }

    rows = progress_store::merge_rows(Vec::new(), &rows);
    progress_store::sort_by_date_desc(&mut rows);
    if let Err(e) = progress_store::write_rows_atomic(&output_path, &rows) {
        error!("Failed to rewrite {:?}: {}", output_path, e);
    }
}
