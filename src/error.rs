use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid table region: {0}")]
    InvalidRegion(String),

    #[error("invalid page selection: {0}")]
    InvalidPageSelection(String),

    #[error("invalid table area: {0}")]
    InvalidTableArea(String),

    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error("detector failed: {0}")]
    Detector(String),

    #[error("failed to load model: {0}")]
    ModelLoad(String),

    #[error("table on page {page} is too ambiguous (confidence={confidence:.2})")]
    AmbiguousTable { page: u32, confidence: f32 },
}
