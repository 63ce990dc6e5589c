use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MonitorError {
    #[error("{0}")]
    Validation(String),

    #[error("unparseable progress line: {line}")]
    ParseAnomaly { line: String },

    #[error("Job failed: {0}")]
    StreamFailure(String),

    #[error("Connection closed before the job finished")]
    ConnectionLost,
}

pub type Result<T> = std::result::Result<T, MonitorError>;
