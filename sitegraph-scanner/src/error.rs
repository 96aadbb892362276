use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Protocol '{0}' not supported")]
    UnsupportedScheme(String),

    #[error("Status code {0}")]
    Status(reqwest::StatusCode),

    #[error("Task join error: {0}")]
    JoinError(#[from] tokio::task::JoinError),

    #[error("All fetch workers exited with {0} request(s) outstanding")]
    WorkersExited(usize),
}

pub type Result<T> = std::result::Result<T, ScanError>;
