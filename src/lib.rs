pub mod batch;
pub mod company_resolver;
pub mod delay_manager;
pub mod driver;
pub mod error;
pub mod error_sink;
pub mod input_loader;
pub mod job_fetcher;
pub mod logger;
pub mod progress_store;

// Exporting types for convenience
pub use batch::BatchBuffer;
pub use company_resolver::{CompanyId, ResolveCompany, TypeaheadResolver};
pub use driver::{RunConfig, RunSummary};
pub use error::{ResolutionKind, Result, ScrapeError};
pub use error_sink::ErrorSink;
pub use input_loader::CompanyRecord;
pub use job_fetcher::{FetchJobs, FetchQuery, FetchTarget, HttpJobFetcher, JobRow};
