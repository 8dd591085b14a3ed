use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("woox error: {0}")]
    Woox(#[from] woox::WooxError),

    #[error("could not read symbol list {path}: {source}")]
    SymbolFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("pair {0:?} is not in the symbol list")]
    UnknownPair(String),

    #[error("fetch cycle failed ({kind}): {message}")]
    CycleFailed {
        kind: woox::ErrorKind,
        message: String,
    },

    #[error("refresh scheduler stopped before reporting")]
    SchedulerStopped,

    #[error("{0} environment variable is required")]
    MissingEnv(&'static str),

    #[error("invalid arguments: {0}")]
    Args(String),
}
