use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("missing input: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("extraction engine unavailable for {}: {reason}", path.display())]
    ExtractionEngineUnavailable { path: PathBuf, reason: String },

    #[error("extraction failed on page {page}: {reason}")]
    ExtractionFailure { page: u32, reason: String },

    #[error("artifact {} is malformed: {reason}", path.display())]
    ArtifactSchema { path: PathBuf, reason: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("embedding request failed: {0}")]
    Embedding(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    pub fn schema(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        PipelineError::ArtifactSchema {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
