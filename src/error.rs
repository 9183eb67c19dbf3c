use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CleaningError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Delimited file error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(
        "Input file does not have the expected columns: missing {missing:?} \
         (expected {expected:?}, found {found:?})"
    )]
    MissingHeaders {
        expected: Vec<String>,
        found: Vec<String>,
        missing: Vec<String>,
    },

    #[error("No register configuration for source: {0}")]
    UnknownSource(String),

    #[error("Input not found: {}", .0.display())]
    InputNotFound(PathBuf),
}

pub type Result<T> = std::result::Result<T, CleaningError>;
