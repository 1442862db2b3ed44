use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Classification of a failed company-id lookup. The tag strings match the
/// prefixes written into the error log so a reader can tell a response-format
/// change (Decode) from network/rate trouble (Request) at a glance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionKind {
    Decode,
    Request,
    Unexpected,
}

impl ResolutionKind {
    pub fn tag(&self) -> &'static str {
        match self {
            ResolutionKind::Decode => "DecodeError",
            ResolutionKind::Request => "RequestError",
            ResolutionKind::Unexpected => "UnexpectedError",
        }
    }
}

#[derive(Error, Debug)]
pub enum ScrapeError {
    /// Malformed input file or missing required column. Fatal, pre-loop.
    #[error("input error: {0}")]
    Input(String),

    /// Requested row range does not fit the input file. Fatal, pre-loop.
    #[error("invalid row range: {start}-{end}. Total rows in file: {total}.")]
    InvalidRange {
        start: usize,
        end: usize,
        total: usize,
    },

    /// Company-id lookup failed (decode, request, or unexpected).
    #[error("{}: {1}", .0.tag())]
    Resolution(ResolutionKind, String),

    /// The fetch call itself failed. Zero rows is NOT a fetch error.
    #[error("fetch failed: {0}")]
    Fetch(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ScrapeError {
    /// Fatal errors abort the run before any company is touched; everything
    /// else is caught at the per-company boundary.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ScrapeError::Input(_) | ScrapeError::InvalidRange { .. }
        )
    }
}
