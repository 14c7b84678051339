use thiserror::Error;

#[derive(Debug, Error)]
pub enum IntentError {
    #[error("embed_batch: {keys} owner keys supplied for {texts} texts")]
    BatchLengthMismatch { texts: usize, keys: usize },

    #[error("invalid lifecycle stage: {0}")]
    InvalidStage(String),

    #[error("embedding model failed to load: {0}")]
    ModelLoad(String),

    #[error("embedding inference failed: {0}")]
    Inference(String),

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, IntentError>;
