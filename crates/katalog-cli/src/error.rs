use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] katalog_core::Error),
    #[error(transparent)]
    Fetch(#[from] katalog_core::FetchError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Book not found: {0}")]
    BookNotFound(i64),
    #[error("Missing required field: --{0}")]
    MissingField(&'static str),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Authentication error: {0}")]
    Auth(String),
}
