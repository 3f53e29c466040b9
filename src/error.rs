use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid rule #{index}: pattern is empty")]
    InvalidRule { index: usize },
    #[error("engine not ready: no rule table has been built")]
    EngineNotReady,
    #[error("invalid dictionary: {0}")]
    Dictionary(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
