use thiserror::Error;

/// Failures raised by the annealing core.
#[derive(Debug, Error)]
pub enum AnnealError {
    /// Run parameters rejected before any optimisation work starts.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A zero or non-finite vector reached normalisation.
    #[error("numeric degeneracy: cannot normalise a zero-length vector")]
    NumericDegeneracy,

    #[error("run log failure: {0}")]
    Sink(#[from] SinkError),
}

/// Failures of a logging sink. The engine treats these as best-effort.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The receiving end of a channel sink hung up.
    #[error("sink receiver disconnected")]
    Disconnected,
}
