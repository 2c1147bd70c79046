use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FormulaError {
    #[error("Dependency missing: {0}")]
    DependencyMissing(String),

    #[error("{script} failed ({status})")]
    ExternalInstallFailure { script: String, status: String },

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Fetch failed: {0}")]
    FetchFailed(String),

    #[error("Invalid formula: {0}")]
    InvalidFormula(String),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Error: {0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, FormulaError>;
