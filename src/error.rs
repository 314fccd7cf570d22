use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("no ERA5 data available for year {0} (archive starts in 1950)")]
    NoDataAvailable(i32),

    #[error("missing CDS credentials: {0}")]
    MissingCredentials(String),

    #[error("CDS job {job_id} failed: {message}")]
    JobFailed { job_id: String, message: String },

    #[error("unexpected CDS response: {0}")]
    UnexpectedResponse(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),
}
