use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Backend returned {status}: {message}")]
    Backend { status: u16, message: String },

    #[error("Not found")]
    NotFound,

    #[error("No authenticated user")]
    Unauthenticated,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Auth error: {0}")]
    Auth(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Unexpected row shape: {0}")]
    Mapping(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Missing rows and missing sessions are expected outcomes, not faults.
    pub fn is_expected(&self) -> bool {
        matches!(self, AppError::NotFound | AppError::Unauthenticated)
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
