use clap::Parser;
use jobpost_scraper_lib::{driver, logger};
use jobpost_scraper_lib::company_resolver::{TypeaheadResolver, DEFAULT_TYPEAHEAD_URL};
use jobpost_scraper_lib::job_fetcher::HttpJobFetcher;
use log::{error, info};
use std::path::PathBuf;
use std::process::ExitCode;

/// Batch job-posting scraper with sequential processing and resumable
/// progress tracking.
#[derive(Parser, Debug)]
#[command(name = "jobpost-scraper", version)]
struct Args {
    /// Input CSV (or Excel) file containing company names
    csv_file: PathBuf,

    /// Location to search for jobs
    location: String,

    /// Directory to save output files
    output_dir: PathBuf,

    /// Starting row index (0-based, inclusive)
    #[arg(long, default_value_t = 0)]
    start: usize,

    /// Ending row index (0-based, inclusive); defaults to the last row
    #[arg(long)]
    end: Option<usize>,

    /// Companies processed between durability flushes
    #[arg(long, default_value_t = 40)]
    batch_size: usize,

    /// Maximum posting age passed to the fetch service
    #[arg(long, default_value_t = 720)]
    hours_old: u32,

    /// Site selector passed to the fetch service
    #[arg(long, default_value = "linkedin")]
    site: String,

    /// Base URL of the job-fetch service
    #[arg(long)]
    fetch_url: String,

    /// Company typeahead lookup endpoint
    #[arg(long, default_value = DEFAULT_TYPEAHEAD_URL)]
    typeahead_url: String,

    /// Minimum pause between batches, in seconds
    #[arg(long, default_value_t = 1)]
    pause_min: u64,

    /// Maximum pause between batches, in seconds
    #[arg(long, default_value_t = 2)]
    pause_max: u64,
}

fn main() -> ExitCode {
    logger::init();
    let args = Args::parse();
    info!("Starting job-posting scraper...");

    let mut config = driver::RunConfig::new(args.csv_file, args.location, args.output_dir);
    config.start = args.start;
    config.end = args.end;
    config.batch_size = args.batch_size.max(1);
    config.hours_old = args.hours_old;
    config.site = Some(args.site);
    config.pause_min_secs = args.pause_min;
    config.pause_max_secs = args.pause_max;

    let resolver = TypeaheadResolver::new(args.typeahead_url);
    let fetcher = HttpJobFetcher::new(args.fetch_url);

    match driver::run(&config, &resolver, &fetcher) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Run aborted: {}", e);
            ExitCode::FAILURE
        }
    }
}
