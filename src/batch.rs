use crate::job_fetcher::JobRow;
use crate::progress_store::{
    self, ERROR_RECOVERY_FILE, OUTPUT_FILE, PROGRESS_FILE, RECOVERY_FILE,
};
use log::{error, info};
use std::path::Path;

pub const DEFAULT_BATCH_SIZE: usize = 40;

/// In-memory buffer of fetched rows between durability flushes. One buffer
/// per run, owned by the driver; companies are counted whether or not they
/// contributed rows so the flush cadence tracks work done, not rows found.
pub struct BatchBuffer {
    rows: Vec<JobRow>,
    companies_since_flush: usize,
    capacity: usize,
}

impl BatchBuffer {
    pub fn new(capacity: usize) -> Self {
        BatchBuffer {
            rows: Vec::new(),
            companies_since_flush: 0,
            capacity,
        }
    }

    pub fn add_rows(&mut self, rows: Vec<JobRow>) {
        self.rows.extend(rows);
    }

    /// Counts one processed company; returns true when the batch is due for
    /// a flush.
    pub fn company_done(&mut self) -> bool {
        self.companies_since_flush += 1;
        self.companies_since_flush >= self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.companies_since_flush == 0
    }

    /// Merges the buffered rows into the progress store and the main output,
    /// rewrites the recovery snapshot with just this batch, and clears the
    /// buffer. A failed main-output merge diverts the batch to the
    /// error-recovery file instead of aborting; the final cleanup pass merges
    /// that file back in.
    pub fn flush(&mut self, output_dir: &Path) {
        if self.is_empty() {
            return;
        }
        let batch: Vec<JobRow> = std::mem::take(&mut self.rows);
        self.companies_since_flush = 0;

        if batch.is_empty() {
            return;
        }
        info!("Flushing batch of {} rows", batch.len());

        if let Err(e) = progress_store::merge_into_file(&output_dir.join(PROGRESS_FILE), &batch) {
            error!("Failed to update progress store: {}", e);
        }

        if let Err(e) = progress_store::merge_into_file(&output_dir.join(OUTPUT_FILE), &batch) {
            error!("Failed to update main output, diverting batch to error recovery: {}", e);
            if let Err(e) =
                progress_store::merge_into_file(&output_dir.join(ERROR_RECOVERY_FILE), &batch)
            {
                error!("Failed to write error recovery batch, rows lost: {}", e);
            }
        }

        if let Err(e) = progress_store::write_rows_atomic(&output_dir.join(RECOVERY_FILE), &batch) {
            error!("Failed to write recovery snapshot: {}", e);
        }
    }
}
