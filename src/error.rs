use thiserror::Error;

/// Invariant violations detected while building or querying a tour.
///
/// Missing inputs are never reported here, derivations that cannot run
/// return `None` instead.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SeriesError {
    #[error("field `{field}` has {actual} values but the time serie has {expected}")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("time serie decreases at index {index} ({previous}s -> {current}s)")]
    TimeNotMonotonic {
        index: usize,
        previous: i64,
        current: i64,
    },

    #[error("invalid segment breakpoints: {0}")]
    InvalidBreakpoints(String),

    #[error("{0} hr zones are configured, at most 10 are supported")]
    TooManyHrZones(usize),

    #[error("hr zone table is empty")]
    EmptyZoneTable,

    #[error("hr zone {0} has no upper bound, only the last zone can be open")]
    OpenHrZone(usize),
}

/// Failures of the GPX and CSV producers.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("gpx: {0}")]
    Gpx(#[from] gpx::errors::GpxError),

    #[error("csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("file contains no track points")]
    NoTrackPoints,
}
