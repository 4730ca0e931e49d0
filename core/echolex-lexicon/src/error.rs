use thiserror::Error;

#[derive(Debug, Error)]
pub enum LexiconError {
    #[error("dictionary JSON is malformed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("dictionary archive is invalid: {0}")]
    Archive(String),

    #[error("dictionary contains no usable entries")]
    Empty,
}
