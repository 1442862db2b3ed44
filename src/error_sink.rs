use log::error;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

pub const ERROR_FILE: &str = "error_records.csv";
pub const NO_JOBS_FILE: &str = "no_jobs_found.csv";

/// Append-only CSV logs for failed companies and empty-result companies.
/// The two files are strictly disjoint: an empty result is a documented
/// outcome, not a failure. Entries are flushed immediately so nothing is
/// lost on crash; a failed sink write is itself only logged (there is no
/// better place left to record it).
pub struct ErrorSink {
    output_dir: PathBuf,
}

impl ErrorSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        ErrorSink {
            output_dir: output_dir.into(),
        }
    }

    pub fn record_error(&self, company: &str, message: &str) {
        let path = self.output_dir.join(ERROR_FILE);
        if let Err(e) = append_record(&path, &["Company", "Error"], &[company, message]) {
            error!("Error saving error record for {}: {}", company, e);
        }
    }

    pub fn record_no_jobs(&self, company: &str) {
        let path = self.output_dir.join(NO_JOBS_FILE);
        if let Err(e) = append_record(&path, &["Company"], &[company]) {
            error!("Error saving no-jobs-found record for {}: {}", company, e);
        }
    }
}

fn append_record(path: &Path, headers: &[&str], record: &[&str]) -> csv::Result<()> {
    let file_exists = path.exists();
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);
    if !file_exists {
        writer.write_record(headers)?;
    }
    writer.write_record(record)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn error_log_appends_with_single_header() {
        let dir = tempfile::tempdir().unwrap();
        let sink = ErrorSink::new(dir.path());
        sink.record_error("Nil Co", "RequestError: connection refused");
        sink.record_error("Nil Co", "RequestError: connection refused");

        let content = fs::read_to_string(dir.path().join(ERROR_FILE)).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Company,Error");
        assert_eq!(lines[1], lines[2]);
    }

    #[test]
    fn no_jobs_log_is_separate_from_error_log() {
        let dir = tempfile::tempdir().unwrap();
        let sink = ErrorSink::new(dir.path());
        sink.record_no_jobs("Quiet Co");

        assert!(dir.path().join(NO_JOBS_FILE).exists());
        assert!(!dir.path().join(ERROR_FILE).exists());

        let content = fs::read_to_string(dir.path().join(NO_JOBS_FILE)).unwrap();
        assert_eq!(content, "Company\nQuiet Co\n");
    }
}
